//! Redact one photo and write the preview and final images next to it.
//!
//! Usage:
//!   cargo run --example redact_file -- <photo> [padding]
//!   RUST_LOG=facemask=debug cargo run --example redact_file -- portrait.jpg 0.3
//!
//! Writes `<stem>_preview.jpg` and `<stem>_redacted.jpg`. Without a
//! landmark backend the central fallback band is redacted; build with
//! `--features rustface` and set `SEETA_MODEL` to detect faces.

use std::path::Path;

use facemask::Redactor;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input_path = args
        .next()
        .unwrap_or_else(|| panic!("usage: redact_file <photo> [padding]"));
    let padding: f32 = args
        .next()
        .map(|p| p.parse().expect("padding must be a number"))
        .unwrap_or(0.35);

    let input = std::fs::read(&input_path)
        .unwrap_or_else(|e| panic!("failed to read {input_path}: {e}"));

    let redactor = Redactor::new(input).unwrap().padding(padding);

    #[cfg(feature = "rustface")]
    let redactor = match std::env::var("SEETA_MODEL") {
        Ok(model) => redactor.landmark_detector(Box::new(
            facemask::RustfaceDetector::from_path(&model)
                .unwrap_or_else(|e| panic!("failed to load {model}: {e}")),
        )),
        Err(_) => redactor,
    };

    let result = redactor.redact().unwrap();

    let path = Path::new(&input_path);
    let stem = path.file_stem().unwrap().to_str().unwrap();
    let dir = path.parent().unwrap_or(Path::new("."));

    let preview_path = dir.join(format!("{stem}_preview.jpg"));
    std::fs::write(&preview_path, &result.preview).unwrap();
    let final_path = dir.join(format!("{stem}_redacted.jpg"));
    std::fs::write(&final_path, &result.final_image).unwrap();

    println!(
        "{input_path} ({width}x{height}): face={face}, region=({x1}, {y1})-({x2}, {y2})",
        width = result.width,
        height = result.height,
        face = result.face_detected,
        x1 = result.rect.x_min,
        y1 = result.rect.y_min,
        x2 = result.rect.x_max,
        y2 = result.rect.y_max,
    );
    println!("  preview: {} ({} bytes)", preview_path.display(), result.preview.len());
    println!("  final:   {} ({} bytes)", final_path.display(), result.final_image.len());
}
