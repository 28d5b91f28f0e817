//! The conversion matrix: which output formats each input format may become.

use std::collections::{BTreeSet, HashMap};

use lazy_static::lazy_static;

use crate::{error::Error, formats::Category, formats::FormatType};

lazy_static! {
    static ref BUILTIN: FormatCatalog = FormatCatalog::builtin();
}

/// Static table of permitted input → output conversions.
///
/// Lookups preserve the declared output order. Every input maps to at least
/// one output and never to itself.
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    entries: Vec<(FormatType, Vec<FormatType>)>,
    index: HashMap<FormatType, usize>,
}

impl FormatCatalog {
    /// Returns the process-wide built-in catalog.
    pub fn global() -> &'static FormatCatalog {
        &BUILTIN
    }

    fn builtin() -> Self {
        use FormatType::*;
        Self::from_entries_unchecked(vec![
            (Jpeg, vec![Png, Webp, Gif]),
            (Png, vec![Jpeg, Webp, Gif]),
            (Webp, vec![Jpeg, Png, Gif]),
            (Gif, vec![Jpeg, Png, Webp]),
            (Pdf, vec![Docx, PlainText]),
            (Docx, vec![Pdf, PlainText]),
            (Xlsx, vec![Csv, Json]),
            (Csv, vec![Xlsx, Json]),
            (PlainText, vec![Html, Markdown, Json]),
            (Markdown, vec![Html, PlainText]),
            (Html, vec![PlainText, Markdown]),
            (Mp3, vec![Wav, Ogg]),
            (Wav, vec![Mp3, Ogg]),
            (Ogg, vec![Mp3, Wav]),
        ])
    }

    /// Builds a catalog from `(input, outputs)` entries, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCatalog`] when an input is listed twice, has no
    /// outputs, lists itself or a duplicate output, or cannot be routed to an
    /// engine category.
    pub fn from_entries(entries: Vec<(FormatType, Vec<FormatType>)>) -> Result<Self, Error> {
        let catalog = Self::from_entries_unchecked(entries);
        catalog.check_invariants()?;
        Ok(catalog)
    }

    fn from_entries_unchecked(entries: Vec<(FormatType, Vec<FormatType>)>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, (input, _)) in entries.iter().enumerate() {
            index.entry(*input).or_insert(position);
        }
        FormatCatalog { entries, index }
    }

    /// Verifies the catalog invariants.
    pub fn check_invariants(&self) -> Result<(), Error> {
        if self.index.len() != self.entries.len() {
            return Err(Error::InvalidCatalog(
                "an input format is listed more than once".to_string(),
            ));
        }
        for (input, outputs) in &self.entries {
            if outputs.is_empty() {
                return Err(Error::InvalidCatalog(format!("`{input}` has no outputs")));
            }
            if outputs.contains(input) {
                return Err(Error::InvalidCatalog(format!("`{input}` lists itself as an output")));
            }
            let distinct: BTreeSet<_> = outputs.iter().collect();
            if distinct.len() != outputs.len() {
                return Err(Error::InvalidCatalog(format!(
                    "`{input}` lists an output more than once"
                )));
            }
            if input.category() == Category::Unknown {
                return Err(Error::InvalidCatalog(format!(
                    "`{input}` does not belong to any engine category"
                )));
            }
        }
        Ok(())
    }

    /// Returns the permitted outputs for `input`, or an empty slice.
    pub fn outputs(&self, input: FormatType) -> &[FormatType] {
        self.index
            .get(&input)
            .map(|&position| self.entries[position].1.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the permitted output MIME types for an input MIME type.
    ///
    /// Unrecognized input types yield an empty list.
    ///
    /// # Example
    /// ```rust
    /// use mimeforge::FormatCatalog;
    /// let catalog = FormatCatalog::global();
    /// assert_eq!(
    ///     catalog.available_outputs("image/jpeg"),
    ///     vec!["image/png", "image/webp", "image/gif"]
    /// );
    /// assert!(catalog.available_outputs("video/mp4").is_empty());
    /// ```
    pub fn available_outputs(&self, input: &str) -> Vec<&'static str> {
        match FormatType::from_mime(input) {
            Some(format) => self.outputs(format).iter().map(FormatType::mime).collect(),
            None => Vec::new(),
        }
    }

    /// Returns `true` if `output` may be produced from `input`.
    pub fn permits(&self, input: FormatType, output: FormatType) -> bool {
        self.outputs(input).contains(&output)
    }

    /// Returns `true` iff `output` appears in `available_outputs(input)`.
    pub fn validate(&self, input: &str, output: &str) -> bool {
        match (FormatType::from_mime(input), FormatType::from_mime(output)) {
            (Some(input), Some(output)) => self.permits(input, output),
            _ => false,
        }
    }

    /// Iterates over the input formats in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = FormatType> + '_ {
        self.entries.iter().map(|(input, _)| *input)
    }

    /// Iterates over every permitted `(input, output)` pair.
    pub fn pairs(&self) -> impl Iterator<Item = (FormatType, FormatType)> + '_ {
        self.entries
            .iter()
            .flat_map(|(input, outputs)| outputs.iter().map(move |output| (*input, *output)))
    }

    /// Returns every format mentioned by the catalog, sorted by MIME type.
    pub fn all_formats(&self) -> Vec<FormatType> {
        let mut formats: Vec<FormatType> = self
            .entries
            .iter()
            .flat_map(|(input, outputs)| std::iter::once(input).chain(outputs.iter()))
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        formats.sort_by_key(|format| format.mime());
        formats
    }
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{MIME_DOCX, MIME_XLSX};

    #[test]
    fn test_builtin_catalog_satisfies_invariants() {
        FormatCatalog::global().check_invariants().unwrap();
    }

    #[test]
    fn test_outputs_preserve_declared_order() {
        let catalog = FormatCatalog::global();
        assert_eq!(
            catalog.outputs(FormatType::PlainText),
            &[FormatType::Html, FormatType::Markdown, FormatType::Json]
        );
        assert_eq!(
            catalog.available_outputs("application/pdf"),
            vec![MIME_DOCX, "text/plain"]
        );
        assert_eq!(
            catalog.available_outputs("text/csv"),
            vec![MIME_XLSX, "application/json"]
        );
    }

    #[test]
    fn test_output_only_formats_have_no_outputs() {
        let catalog = FormatCatalog::global();
        assert!(catalog.outputs(FormatType::Json).is_empty());
        assert!(catalog.available_outputs("application/json").is_empty());
    }

    #[test]
    fn test_validate() {
        let catalog = FormatCatalog::global();
        assert!(catalog.validate("image/jpeg", "image/gif"));
        assert!(catalog.validate("IMAGE/JPEG", "image/gif"));
        assert!(!catalog.validate("image/jpeg", "image/jpeg"));
        assert!(!catalog.validate("image/jpeg", "audio/wav"));
        assert!(!catalog.validate("video/mp4", "image/png"));
        assert!(!catalog.validate("text/markdown", "application/json"));
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(FormatCatalog::global().pairs().count(), 33);
        assert_eq!(FormatCatalog::global().inputs().count(), 14);
    }

    #[test]
    fn test_all_formats_sorted_by_mime() {
        let formats = FormatCatalog::global().all_formats();
        assert_eq!(formats.len(), 15);
        let mimes: Vec<_> = formats.iter().map(FormatType::mime).collect();
        let mut sorted = mimes.clone();
        sorted.sort();
        assert_eq!(mimes, sorted);
        assert_eq!(mimes.first(), Some(&"application/json"));
    }

    #[test]
    fn test_from_entries_rejects_self_mapping() {
        let result = FormatCatalog::from_entries(vec![(
            FormatType::Png,
            vec![FormatType::Png, FormatType::Gif],
        )]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_from_entries_rejects_empty_outputs() {
        let result = FormatCatalog::from_entries(vec![(FormatType::Png, vec![])]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_from_entries_rejects_duplicate_inputs() {
        let result = FormatCatalog::from_entries(vec![
            (FormatType::Png, vec![FormatType::Gif]),
            (FormatType::Png, vec![FormatType::Jpeg]),
        ]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_from_entries_rejects_unroutable_input() {
        let result =
            FormatCatalog::from_entries(vec![(FormatType::Json, vec![FormatType::Csv])]);
        assert!(matches!(result, Err(Error::InvalidCatalog(_))));
    }

    #[test]
    fn test_from_entries_accepts_custom_table() {
        let catalog =
            FormatCatalog::from_entries(vec![(FormatType::Png, vec![FormatType::Webp])]).unwrap();
        assert!(catalog.permits(FormatType::Png, FormatType::Webp));
        assert!(!catalog.permits(FormatType::Png, FormatType::Gif));
    }
}
