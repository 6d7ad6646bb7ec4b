use std::fs;

use salsa_pdfs::{
    renderer::{Renderer, RendererKind, Wkhtmltopdf},
    types::RenderStatus,
};

const PAGE: &str = r#"<html><body><h1>Spring Appeal</h1><img src="https://org.salsalabs.com/missing.png"></body></html>"#;

/*
RUST_LOG=debug cargo test --test render -- --ignored
 */
#[test]
#[ignore = "needs wkhtmltopdf"]
fn wkhtmltopdf_writes_a_pdf() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("page.pdf");

    let renderer = Wkhtmltopdf::locate()?;
    let status = renderer.render(PAGE, &out)?;

    assert!(matches!(status, RenderStatus::Complete | RenderStatus::Degraded(_)));
    assert!(fs::read(&out)?.starts_with(b"%PDF"));
    Ok(())
}

#[test]
#[ignore = "needs chrome"]
fn chrome_writes_a_pdf() -> anyhow::Result<()> {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("page.pdf");

    let renderer = RendererKind::Chrome.create()?;
    assert_eq!(renderer.render(PAGE, &out)?, RenderStatus::Complete);
    assert!(fs::read(&out)?.starts_with(b"%PDF"));
    Ok(())
}
