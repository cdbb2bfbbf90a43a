//! Rasterize a saved sketch.

use std::path::PathBuf;

use airsketch_model::document::SketchDocument;
use airsketch_render::export_document;

pub fn run(sketch: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let doc = SketchDocument::load(super::resolve_sketch(sketch.clone()))
        .map_err(|e| anyhow::anyhow!("Failed to load sketch: {e}"))?;

    let written = export_document(&doc, &output)?;
    println!(
        "Rendered {} ({} strokes, {}x{}) to {}",
        doc.name,
        doc.strokes.len(),
        doc.width,
        doc.height,
        written.display()
    );
    Ok(())
}
