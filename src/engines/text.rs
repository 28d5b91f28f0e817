//! Plain text, Markdown and HTML transforms.
//!
//! The Markdown dialect is a small, predictable subset: ATX headings,
//! paragraphs, ordered and unordered lists, fenced code blocks, horizontal
//! rules, and the inline forms `**strong**`, `*em*`, `` `code` `` and
//! `[label](href)`. HTML is read back with the same subset in mind.

use async_trait::async_trait;
use encoding_rs::Encoding;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{
    error::EngineError, formats::Category, formats::FormatType, traits::Engine,
    types::TransformRequest,
};

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.+?)\s*#*$").unwrap();
    static ref RULE: Regex = Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"^(?:([-*+])|(\d+)[.)])\s+(.*)$").unwrap();
    static ref INLINE_CODE: Regex = Regex::new(r"`([^`]+)`").unwrap();
    static ref STRONG: Regex = Regex::new(r"\*\*(.+?)\*\*").unwrap();
    static ref EM: Regex = Regex::new(r"\*([^\s*](?:[^*]*[^\s*])?)\*").unwrap();
    static ref LINK: Regex = Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap();

    static ref HTML_SCRIPT: Regex = Regex::new(r"(?is)<(script|style)[^>]*>.*?</(?:script|style)>").unwrap();
    static ref HTML_COMMENT: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref HTML_PRE: Regex = Regex::new(r"(?is)<pre[^>]*>\s*(?:<code[^>]*>)?(.*?)(?:</code>)?\s*</pre>").unwrap();
    static ref HTML_HEADING: Regex = Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>").unwrap();
    static ref HTML_LIST: Regex = Regex::new(r"(?is)<(ul|ol)\b[^>]*>(.*?)</(?:ul|ol)>").unwrap();
    static ref HTML_LIST_ITEM: Regex = Regex::new(r"(?is)<li[^>]*>(.*?)</li>").unwrap();
    static ref HTML_BLOCK: Regex = Regex::new(r"(?is)</?(?:p|div|ul|ol|section|article|header|footer|table|tr|blockquote)\b[^>]*>").unwrap();
    static ref HTML_CELL_END: Regex = Regex::new(r"(?is)</t[dh]>").unwrap();
    static ref HTML_BREAK: Regex = Regex::new(r"(?is)<br\s*/?>").unwrap();
    static ref HTML_RULE: Regex = Regex::new(r"(?is)<hr[^>]*>").unwrap();
    static ref HTML_STRONG: Regex = Regex::new(r"(?is)<(?:strong|b)\b[^>]*>(.*?)</(?:strong|b)>").unwrap();
    static ref HTML_EM: Regex = Regex::new(r"(?is)<(?:em|i)\b[^>]*>(.*?)</(?:em|i)>").unwrap();
    static ref HTML_CODE: Regex = Regex::new(r"(?is)<code[^>]*>(.*?)</code>").unwrap();
    static ref HTML_LINK: Regex = Regex::new(r#"(?is)<a\b[^>]*href=["']([^"']*)["'][^>]*>(.*?)</a>"#).unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"(?s)</?[A-Za-z][^>]*>|<![^>]*>").unwrap();
    static ref HTML_ENTITY: Regex = Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap();
    static ref MARKDOWN_SPECIAL: Regex = Regex::new(r"[\\`*_\[\]]").unwrap();
    static ref MARKDOWN_BLOCK_START: Regex = Regex::new(r"^(\s*)(#|>|[-+]\s|=+\s*$|\d+\.\s)").unwrap();
    static ref BLANK_RUN: Regex = Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").unwrap();
}

/// Converts between plain text, Markdown, HTML and JSON.
#[derive(Debug, Clone, Default)]
pub struct TextEngine;

impl TextEngine {
    pub fn new() -> Self {
        TextEngine
    }
}

#[async_trait]
impl Engine for TextEngine {
    fn category(&self) -> Category {
        Category::Text
    }

    fn name(&self) -> &'static str {
        "text"
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        let text = decode_text(&request.bytes);
        let output = match (request.input, request.output) {
            (FormatType::Markdown | FormatType::PlainText, FormatType::Html) => markdown_to_html(&text),
            (FormatType::Html, FormatType::Markdown) => html_to_markdown(&text),
            (FormatType::PlainText, FormatType::Markdown) => escape_markdown(&text),
            (FormatType::Html, FormatType::PlainText) => html_to_text(&text),
            (FormatType::Markdown, FormatType::PlainText) => text,
            (FormatType::PlainText, FormatType::Json) => serde_json::to_string(&text)?,
            (input, output) => {
                return Err(EngineError::Unsupported(format!(
                    "no text transform from `{input}` to `{output}`"
                )));
            }
        };
        Ok(output.into_bytes())
    }
}

/// Decodes text bytes, honoring a UTF-8 or UTF-16 byte order mark.
///
/// Without a BOM the bytes are read as UTF-8, replacing invalid sequences.
pub fn decode_text(bytes: &[u8]) -> String {
    match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => encoding
            .decode_without_bom_handling(&bytes[bom_length..])
            .0
            .into_owned(),
        None => String::from_utf8_lossy(bytes).into_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

/// Renders Markdown as an HTML fragment.
///
/// # Example
/// ```rust
/// use mimeforge::engines::text::markdown_to_html;
/// assert_eq!(markdown_to_html("# Title"), "<h1>Title</h1>\n");
/// ```
pub fn markdown_to_html(markdown: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list: Option<ListKind> = None;
    let mut code: Option<Vec<&str>> = None;

    for line in markdown.lines() {
        if let Some(block) = code.as_mut() {
            if line.trim_start().starts_with("```") {
                push_code_block(&mut html, block);
                code = None;
            } else {
                block.push(line);
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            flush_paragraph(&mut html, &mut paragraph);
            close_list(&mut html, &mut list);
            code = Some(Vec::new());
        } else if trimmed.is_empty() {
            flush_paragraph(&mut html, &mut paragraph);
            close_list(&mut html, &mut list);
        } else if let Some(caps) = HEADING.captures(trimmed) {
            flush_paragraph(&mut html, &mut paragraph);
            close_list(&mut html, &mut list);
            let level = caps[1].len();
            html.push_str(&format!("<h{level}>{}</h{level}>\n", render_inline(&caps[2])));
        } else if RULE.is_match(trimmed) {
            flush_paragraph(&mut html, &mut paragraph);
            close_list(&mut html, &mut list);
            html.push_str("<hr>\n");
        } else if let Some(caps) = LIST_ITEM.captures(trimmed) {
            flush_paragraph(&mut html, &mut paragraph);
            let kind = if caps.get(1).is_some() {
                ListKind::Unordered
            } else {
                ListKind::Ordered
            };
            if list != Some(kind) {
                close_list(&mut html, &mut list);
                html.push_str(&format!("<{}>\n", kind.tag()));
                list = Some(kind);
            }
            html.push_str(&format!("<li>{}</li>\n", render_inline(&caps[3])));
        } else {
            close_list(&mut html, &mut list);
            paragraph.push(trimmed);
        }
    }

    // unterminated fence runs to the end of the document
    if let Some(block) = code {
        push_code_block(&mut html, &block);
    }
    flush_paragraph(&mut html, &mut paragraph);
    close_list(&mut html, &mut list);
    html
}

fn push_code_block(html: &mut String, lines: &[&str]) {
    html.push_str("<pre><code>");
    for line in lines {
        html.push_str(&escape_html(line));
        html.push('\n');
    }
    html.push_str("</code></pre>\n");
}

fn flush_paragraph(html: &mut String, paragraph: &mut Vec<&str>) {
    if paragraph.is_empty() {
        return;
    }
    let rendered: Vec<String> = paragraph.iter().map(|line| render_inline(line)).collect();
    html.push_str(&format!("<p>{}</p>\n", rendered.join("\n")));
    paragraph.clear();
}

fn close_list(html: &mut String, list: &mut Option<ListKind>) {
    if let Some(kind) = list.take() {
        html.push_str(&format!("</{}>\n", kind.tag()));
    }
}

/// Inline markup; code spans are copied verbatim (escaped) and never styled.
fn render_inline(text: &str) -> String {
    let mut out = String::new();
    let mut last = 0;
    for caps in INLINE_CODE.captures_iter(text) {
        let Some(span) = caps.get(0) else { continue };
        out.push_str(&style_inline(&text[last..span.start()]));
        out.push_str("<code>");
        out.push_str(&escape_html(&caps[1]));
        out.push_str("</code>");
        last = span.end();
    }
    out.push_str(&style_inline(&text[last..]));
    out
}

fn style_inline(text: &str) -> String {
    let escaped = escape_html(text);
    let linked = LINK.replace_all(&escaped, r#"<a href="$2">$1</a>"#);
    let strong = STRONG.replace_all(&linked, "<strong>$1</strong>");
    EM.replace_all(&strong, "<em>$1</em>").into_owned()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Decodes named and numeric character references.
fn unescape_html(text: &str) -> String {
    HTML_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(decimal) = entity.strip_prefix('#') {
                decimal.parse().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Collapses runs of blank lines to one and trims trailing whitespace.
fn tidy(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = lines.join("\n");
    BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

/// Converts an HTML fragment to Markdown.
///
/// # Example
/// ```rust
/// use mimeforge::engines::text::html_to_markdown;
/// let md = html_to_markdown("<h2>Notes</h2><ul><li>one</li><li><b>two</b></li></ul>");
/// assert_eq!(md, "## Notes\n\n- one\n- **two**");
/// ```
pub fn html_to_markdown(html: &str) -> String {
    let text = HTML_SCRIPT.replace_all(html, "");
    let text = HTML_COMMENT.replace_all(&text, "");
    let text = HTML_PRE.replace_all(&text, |caps: &Captures| {
        let body = HTML_TAG.replace_all(&caps[1], "");
        format!("\n\n```\n{}\n```\n\n", body.trim_end_matches('\n'))
    });
    let text = HTML_HEADING.replace_all(&text, |caps: &Captures| {
        let level: usize = caps[1].parse().unwrap_or(1);
        format!("\n\n{} {}\n\n", "#".repeat(level), collapse(&caps[2]))
    });
    let text = HTML_LIST.replace_all(&text, |caps: &Captures| {
        let ordered = caps[1].eq_ignore_ascii_case("ol");
        let mut items = String::from("\n\n");
        for (i, item) in HTML_LIST_ITEM.captures_iter(&caps[2]).enumerate() {
            let marker = if ordered { format!("{}.", i + 1) } else { "-".to_string() };
            items.push_str(&format!("{marker} {}\n", collapse(&item[1])));
        }
        items.push('\n');
        items
    });
    let text = HTML_LIST_ITEM.replace_all(&text, |caps: &Captures| format!("\n- {}\n", collapse(&caps[1])));
    let text = HTML_RULE.replace_all(&text, "\n\n---\n\n");
    let text = HTML_BREAK.replace_all(&text, "\n");
    let text = HTML_BLOCK.replace_all(&text, "\n\n");
    let text = HTML_STRONG.replace_all(&text, "**$1**");
    let text = HTML_EM.replace_all(&text, "*$1*");
    let text = HTML_CODE.replace_all(&text, "`$1`");
    let text = HTML_LINK.replace_all(&text, "[$2]($1)");
    let text = HTML_TAG.replace_all(&text, "");
    tidy(&unescape_html(&text))
}

/// Escapes plain text so Markdown renders it literally.
///
/// # Example
/// ```rust
/// use mimeforge::engines::text::escape_markdown;
/// assert_eq!(escape_markdown("# not a heading\n2 * 3 < 7"), "\\# not a heading\n2 \\* 3 < 7");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            let inline = MARKDOWN_SPECIAL.replace_all(line, r"\$0");
            MARKDOWN_BLOCK_START
                .replace(&inline, |caps: &Captures| {
                    let marker = &caps[2];
                    if marker.starts_with(|c: char| c.is_ascii_digit()) {
                        format!("{}{}", &caps[1], marker.replacen('.', "\\.", 1))
                    } else {
                        format!("{}\\{marker}", &caps[1])
                    }
                })
                .into_owned()
        })
        .collect();
    lines.join("\n").trim_end().to_string()
}

/// Inner HTML of an inline context flattened onto one line.
fn collapse(inner: &str) -> String {
    inner.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extracts the readable text of an HTML fragment.
///
/// # Example
/// ```rust
/// use mimeforge::engines::text::html_to_text;
/// assert_eq!(html_to_text("<p>Fish &amp; chips</p><p>Peas</p>"), "Fish & chips\n\nPeas");
/// ```
pub fn html_to_text(html: &str) -> String {
    let text = HTML_SCRIPT.replace_all(html, "");
    let text = HTML_COMMENT.replace_all(&text, "");
    let text = HTML_BREAK.replace_all(&text, "\n");
    let text = HTML_HEADING.replace_all(&text, "\n\n$2\n\n");
    let text = HTML_LIST_ITEM.replace_all(&text, "\n$1\n");
    let text = HTML_CELL_END.replace_all(&text, "\t");
    let text = HTML_BLOCK.replace_all(&text, "\n\n");
    let text = HTML_TAG.replace_all(&text, "");
    tidy(&unescape_html(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    async fn run(input: FormatType, output: FormatType, text: &str) -> String {
        let bytes = TextEngine::new()
            .transform(TransformRequest::new(text.as_bytes().to_vec(), input, output))
            .await
            .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_markdown_blocks() {
        let html = markdown_to_html(indoc! {"
            # Release notes

            Fixed **two** bugs
            and *one* regression.

            - first
            - second

            1. alpha
            2. beta

            ---
            ```
            let x = a < b;
            ```
        "});
        assert_eq!(
            html,
            indoc! {r#"
                <h1>Release notes</h1>
                <p>Fixed <strong>two</strong> bugs
                and <em>one</em> regression.</p>
                <ul>
                <li>first</li>
                <li>second</li>
                </ul>
                <ol>
                <li>alpha</li>
                <li>beta</li>
                </ol>
                <hr>
                <pre><code>let x = a &lt; b;
                </code></pre>
            "#}
        );
    }

    #[test]
    fn test_markdown_inline() {
        assert_eq!(
            render_inline("see [docs](https://example.com/a?b=1&c=2) and `*raw*`"),
            r#"see <a href="https://example.com/a?b=1&amp;c=2">docs</a> and <code>*raw*</code>"#
        );
        assert_eq!(render_inline("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn test_html_to_markdown() {
        let markdown = html_to_markdown(indoc! {r#"
            <html><head><style>p { color: red }</style></head>
            <body>
              <h1>Title</h1>
              <p>Some <strong>bold</strong> and <em>soft</em> text with <a href="https://x.io">a link</a>.</p>
              <ul>
                <li>one</li>
                <li>two &amp; three</li>
              </ul>
              <ol><li>first</li><li>second</li></ol>
              <pre><code>fn main() {}</code></pre>
            </body></html>
        "#});
        assert_eq!(
            markdown,
            indoc! {"
                # Title

                Some **bold** and *soft* text with [a link](https://x.io).

                - one
                - two & three

                1. first
                2. second

                ```
                fn main() {}
                ```"}
        );
    }

    #[test]
    fn test_html_to_text() {
        let text = html_to_text("<h1>Menu</h1><ul><li>Soup</li><li>Bread &lt;fresh&gt;</li></ul><script>alert(1)</script>");
        assert_eq!(text, "Menu\n\nSoup\n\nBread <fresh>");
    }

    #[test]
    fn test_bare_angle_brackets_are_text() {
        assert_eq!(html_to_text("<p>x < y and y > z</p>"), "x < y and y > z");
        assert_eq!(html_to_markdown("<p>if a < b and c > d</p>"), "if a < b and c > d");
        assert_eq!(html_to_text("<!DOCTYPE html><p>3 <= 4</p>"), "3 <= 4");
    }

    #[test]
    fn test_emphasis_needs_flanking_text() {
        assert_eq!(markdown_to_html("2 * 3 * 4 = 24"), "<p>2 * 3 * 4 = 24</p>\n");
        assert_eq!(markdown_to_html("a *b* c"), "<p>a <em>b</em> c</p>\n");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(
            escape_markdown(indoc! {"
                # tag
                - item
                10. ten
                > quote
                snake_case [x] `y` a\\b
            "}),
            indoc! {r"
                \# tag
                \- item
                10\. ten
                \> quote
                snake\_case \[x\] \`y\` a\\b"}
        );
    }

    #[test]
    fn test_unescape_numeric_entities() {
        assert_eq!(unescape_html("&#65;&#x42;&unknown;"), "AB&unknown;");
    }

    #[test]
    fn test_decode_text_boms() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello"), "hello");
        assert_eq!(decode_text(b"\xFF\xFEh\x00i\x00"), "hi");
        assert_eq!(decode_text(b"\xFE\xFF\x00h\x00i"), "hi");
        assert_eq!(decode_text(b"caf\xC3\xA9"), "café");
        assert_eq!(decode_text(b"bad\xFF"), "bad\u{FFFD}");
    }

    #[tokio::test]
    async fn test_engine_routes() {
        assert_eq!(run(FormatType::Markdown, FormatType::Html, "# Hi").await, "<h1>Hi</h1>\n");
        assert_eq!(run(FormatType::PlainText, FormatType::Html, "hello").await, "<p>hello</p>\n");
        assert_eq!(run(FormatType::Html, FormatType::Markdown, "<h3>Hi</h3>").await, "### Hi");
        assert_eq!(run(FormatType::Html, FormatType::PlainText, "<p>a<br>b</p>").await, "a\nb");
        assert_eq!(run(FormatType::Markdown, FormatType::PlainText, "# keep *as is*").await, "# keep *as is*");
        assert_eq!(run(FormatType::PlainText, FormatType::Markdown, "just text").await, "just text");
        assert_eq!(
            run(FormatType::PlainText, FormatType::Markdown, "if a < b and c > d then swap").await,
            "if a < b and c > d then swap"
        );
        assert_eq!(
            run(FormatType::PlainText, FormatType::Json, "line \"one\"\nline two").await,
            r#""line \"one\"\nline two""#
        );
    }

    #[tokio::test]
    async fn test_engine_rejects_unknown_pair() {
        let result = TextEngine::new()
            .transform(TransformRequest::new(vec![], FormatType::Html, FormatType::Json))
            .await;
        assert!(matches!(result, Err(EngineError::Unsupported(_))));
    }
}
