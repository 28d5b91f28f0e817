use async_trait::async_trait;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use mimeforge::engines::raster;
use mimeforge::{
    Category, Converter, ConverterOptions, Engine, EngineError, FormatCatalog, FormatType,
    TransformRequest, engines::default_engines,
};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

/// Stands in for ffmpeg so the matrix does not depend on the host.
struct TaggingAudio;

#[async_trait]
impl Engine for TaggingAudio {
    fn category(&self) -> Category {
        Category::Audio
    }

    fn name(&self) -> &'static str {
        "tagging-audio"
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        Ok(format!("{}->{}", request.input.extension(), request.output.extension()).into_bytes())
    }
}

async fn matrix_converter() -> Converter {
    let mut builder = Converter::builder().without_default_engines();
    for engine in default_engines(&ConverterOptions::default()) {
        if engine.category() != Category::Audio {
            builder = builder.engine(engine);
        }
    }
    let converter = builder.engine(Arc::new(TaggingAudio)).build();
    let readiness = converter.initialize().await;
    assert!(readiness.all_ready(), "matrix engines failed: {:?}", readiness.failures());
    converter
}

fn seed_image(format: FormatType) -> Vec<u8> {
    let pixels = ImageBuffer::from_fn(8, 6, |x, y| Rgba([(x * 30) as u8, (y * 40) as u8, 90, 255]));
    raster::encode(&DynamicImage::ImageRgba8(pixels), format, 90).expect("encode seed image")
}

fn seed_docx() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("word/document.xml", options).expect("start document part");
    zip.write_all(
        br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p><w:p><w:r><w:t>Goodbye</w:t></w:r></w:p></w:body></w:document>"#,
    )
    .expect("write document part");
    zip.finish().expect("finish docx").into_inner()
}

async fn write_seeds(converter: &Converter) -> HashMap<FormatType, Vec<u8>> {
    let mut seeds = HashMap::new();
    for format in [FormatType::Jpeg, FormatType::Png, FormatType::Webp, FormatType::Gif] {
        seeds.insert(format, seed_image(format));
    }

    let docx = seed_docx();
    let pdf = converter
        .convert(&docx, FormatType::Docx.mime(), FormatType::Pdf.mime())
        .await
        .expect("seed pdf");
    seeds.insert(FormatType::Docx, docx);
    seeds.insert(FormatType::Pdf, pdf.bytes);

    let csv = b"key,en\nhello,Hello\nbye,Goodbye\n".to_vec();
    let xlsx = converter
        .convert(&csv, FormatType::Csv.mime(), FormatType::Xlsx.mime())
        .await
        .expect("seed xlsx");
    seeds.insert(FormatType::Csv, csv);
    seeds.insert(FormatType::Xlsx, xlsx.bytes);

    seeds.insert(FormatType::PlainText, b"Hello\nGoodbye\n".to_vec());
    seeds.insert(FormatType::Markdown, b"# Hello\n\n- Goodbye\n".to_vec());
    seeds.insert(FormatType::Html, b"<h1>Hello</h1><p>Goodbye</p>".to_vec());

    for format in [FormatType::Mp3, FormatType::Wav, FormatType::Ogg] {
        seeds.insert(format, vec![0u8; 32]);
    }
    seeds
}

fn assert_output(bytes: &[u8], input: FormatType, output: FormatType, case_name: &str) {
    assert!(!bytes.is_empty(), "{case_name}: empty output");
    match output {
        FormatType::Jpeg | FormatType::Png | FormatType::Webp | FormatType::Gif => {
            let expected = match output {
                FormatType::Jpeg => ImageFormat::Jpeg,
                FormatType::Png => ImageFormat::Png,
                FormatType::Webp => ImageFormat::WebP,
                _ => ImageFormat::Gif,
            };
            let sniffed = image::guess_format(bytes)
                .unwrap_or_else(|e| panic!("{case_name}: unrecognized image: {e}"));
            assert_eq!(sniffed, expected, "{case_name}: wrong container");
            let decoded = image::load_from_memory(bytes)
                .unwrap_or_else(|e| panic!("{case_name}: undecodable image: {e}"));
            assert_eq!((decoded.width(), decoded.height()), (8, 6), "{case_name}: size changed");
        }
        FormatType::Pdf => {
            assert!(bytes.starts_with(b"%PDF-"), "{case_name}: missing PDF header");
        }
        FormatType::Docx => {
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
                .unwrap_or_else(|e| panic!("{case_name}: not a zip: {e}"));
            let mut xml = String::new();
            archive
                .by_name("word/document.xml")
                .unwrap_or_else(|e| panic!("{case_name}: missing document part: {e}"))
                .read_to_string(&mut xml)
                .expect("read document part");
            assert!(xml.contains("Hello"), "{case_name}: text lost");
        }
        FormatType::Xlsx => {
            let archive = zip::ZipArchive::new(Cursor::new(bytes))
                .unwrap_or_else(|e| panic!("{case_name}: not a zip: {e}"));
            assert!(archive.file_names().any(|name| name == "xl/workbook.xml"));
        }
        FormatType::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)
                .unwrap_or_else(|e| panic!("{case_name}: invalid JSON: {e}"));
            assert!(value.is_array() || value.is_string(), "{case_name}: unexpected JSON {value}");
        }
        FormatType::Csv | FormatType::PlainText | FormatType::Markdown | FormatType::Html => {
            let text = std::str::from_utf8(bytes)
                .unwrap_or_else(|e| panic!("{case_name}: not UTF-8: {e}"));
            assert!(text.contains("Hello"), "{case_name}: text lost: {text:?}");
        }
        FormatType::Mp3 | FormatType::Wav | FormatType::Ogg => {
            let expected = format!("{}->{}", input.extension(), output.extension());
            assert_eq!(bytes, expected.as_bytes(), "{case_name}: not routed to audio");
        }
    }
}

#[tokio::test]
async fn conversion_matrix_every_catalog_pair_succeeds() {
    let converter = matrix_converter().await;
    let seeds = write_seeds(&converter).await;
    let catalog = FormatCatalog::global();

    let mut converted = 0;
    for (input, output) in catalog.pairs() {
        let case_name = format!("{} -> {}", input.label(), output.label());
        let seed = seeds
            .get(&input)
            .unwrap_or_else(|| panic!("missing seed for {input}"));

        let result = converter
            .convert(seed, input.mime(), output.mime())
            .await
            .unwrap_or_else(|e| panic!("{case_name}: conversion failed: {e}"));

        assert_eq!(result.format, output, "{case_name}: wrong tag");
        assert_eq!(result.mime(), output.mime());
        assert_eq!(result.file_name, format!("converted.{}", output.extension()));
        assert_output(&result.bytes, input, output, &case_name);
        converted += 1;
    }
    assert_eq!(converted, 33);
}

#[tokio::test]
async fn conversion_matrix_rejects_every_pair_outside_catalog() {
    let converter = matrix_converter().await;
    let catalog = FormatCatalog::global();

    for input in FormatType::ALL {
        for output in FormatType::ALL {
            if catalog.permits(input, output) {
                continue;
            }
            assert!(!converter.validate(input.mime(), output.mime()));
            let err = converter
                .convert(b"ignored", input.mime(), output.mime())
                .await
                .expect_err("pair outside the catalog must fail");
            assert!(err.is_unsupported(), "{input} -> {output}: {err}");
        }
    }
}

#[test]
fn conversion_matrix_every_input_has_outputs_but_not_itself() {
    let converter = Converter::default();
    for input in FormatCatalog::global().inputs() {
        let outputs = converter.available_outputs(input.mime());
        assert!(!outputs.is_empty(), "{input} has no outputs");
        assert!(!outputs.contains(&input.mime()), "{input} maps to itself");
        assert_ne!(input.category(), Category::Unknown);
    }
}
