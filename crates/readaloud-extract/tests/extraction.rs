use readaloud_extract::{
    ContentExtractor, ErrorKind, ExtractError, ExtractResult, ExtractorConfig, Submission,
};
use readaloud_guard::{GuardConfig, StaticResolver, UrlGuard};
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::write::SimpleFileOptions;

fn extractor() -> ContentExtractor {
    let resolver = StaticResolver::new()
        .with_host("example.com", &["93.184.216.34".parse().unwrap()])
        .with_host("sneaky.test", &["93.184.216.34".parse().unwrap(), "10.0.0.1".parse().unwrap()]);
    let guard = UrlGuard::with_resolver(GuardConfig::default(), Arc::new(resolver));
    ContentExtractor::with_guard(ExtractorConfig::default(), guard)
}

fn docx(body_xml: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body_xml
    );
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("[Content_Types].xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer
        .start_file("word/document.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn docx_break_and_tab_survive_upload() {
    let bytes = docx(r#"<w:p><w:r><w:t>Dear reader,</w:t><w:br/><w:t>Name:</w:t><w:tab/><w:t>Ada</w:t></w:r></w:p>"#);
    let result = extractor()
        .extract_submission(Submission::file("letters/letter.docx", bytes))
        .await
        .unwrap();

    assert_eq!(result.text, "Dear reader,\nName:\tAda");
    assert_eq!(result.title.as_deref(), Some("letter.docx"));
    assert_eq!(result.warning, None);
}

#[tokio::test]
async fn docx_is_idempotent() {
    let bytes = docx(r#"<w:p><w:r><w:t>One</w:t></w:r></w:p><w:p><w:r><w:t>Two</w:t></w:r></w:p>"#);
    let extractor = extractor();
    let first = extractor.extract_document("a.docx", bytes.clone()).await.unwrap();
    let second = extractor.extract_document("a.docx", bytes).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.text, "One\nTwo");
}

#[tokio::test]
async fn legacy_word_gets_guidance_not_generic_error() {
    let err = extractor()
        .extract_document("Minutes.DOC", vec![0xd0, 0xcf, 0x11, 0xe0])
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::LegacyWordFormat));
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(err.public_message().contains("save it as .docx"));
}

#[tokio::test]
async fn unknown_extension_lists_supported_set() {
    let err = extractor()
        .extract_document("photo.jpeg", vec![0xff, 0xd8])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(err.public_message().contains(".txt, .md, .pdf, .docx"));
}

#[tokio::test]
async fn corrupt_docx_is_parse_failure() {
    let err = extractor()
        .extract_document("broken.docx", b"PK\x03\x04 truncated".to_vec())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
    assert_eq!(err.public_message(), "Failed to extract text from the file.");
}

#[tokio::test]
async fn article_fetch_refuses_internal_targets() {
    let extractor = extractor();
    for url in [
        "http://localhost:3000/",
        "https://metadata.google.internal/computeMetadata/v1/",
        "http://169.254.169.254/latest/meta-data/",
        "http://10.0.0.1/",
        "http://[fe80::1]/",
        "http://[::ffff:127.0.0.1]/",
        "https://sneaky.test/",
    ] {
        let err = extractor.extract_article(url).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BlockedTarget, "{}", url);
        assert_eq!(err.public_message(), "That address cannot be fetched.");
    }
}

#[tokio::test]
async fn pasted_text_is_trimmed() {
    let extractor = extractor();
    let result = extractor
        .extract_submission(Submission::text("  hello world  \n"))
        .await
        .unwrap();
    assert_eq!(result, ExtractResult::new("hello world"));
    assert_eq!(extractor.extract_plain_text("  hello world  \n").text, "hello world");
}

#[tokio::test]
async fn pasted_text_with_blocked_link_falls_back() {
    let result = extractor()
        .extract_submission(Submission::text("read http://localhost/secret please"))
        .await
        .unwrap();
    assert_eq!(result.text, "read http://localhost/secret please");
    assert!(result.warning.is_some());
}
