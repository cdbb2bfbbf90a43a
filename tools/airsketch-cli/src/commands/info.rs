//! Show sketch statistics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use airsketch_model::document::SketchDocument;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let doc =
        SketchDocument::load(super::resolve_sketch(path)).map_err(|e| anyhow::anyhow!("Failed to load sketch: {e}"))?;

    println!("Sketch: {}", doc.name);
    println!("  Version: {}", doc.version);
    println!("  Created: {}", doc.created_at);
    println!("  Modified: {}", doc.modified_at);
    println!("  Canvas: {}x{}", doc.width, doc.height);
    println!("  Background: {}", doc.background);
    println!();

    println!("Strokes: {}", doc.strokes.len());
    println!("  Points: {}", doc.point_count());
    let total_length: f64 = doc.strokes.iter().map(|s| s.length()).sum();
    println!("  Total length: {total_length:.0}px");

    let mut by_color: BTreeMap<String, usize> = BTreeMap::new();
    for stroke in &doc.strokes {
        *by_color.entry(stroke.color.to_hex()).or_default() += 1;
    }
    for (color, count) in &by_color {
        println!("  {color}: {count}");
    }

    let bounds = doc.strokes.iter().filter_map(|s| s.bounds()).reduce(|a, b| {
        (
            airsketch_model::geometry::Point2D::new(a.0.x.min(b.0.x), a.0.y.min(b.0.y)),
            airsketch_model::geometry::Point2D::new(a.1.x.max(b.1.x), a.1.y.max(b.1.y)),
        )
    });
    if let Some((min, max)) = bounds {
        println!(
            "  Bounds: ({:.0}, {:.0}) to ({:.0}, {:.0})",
            min.x, min.y, max.x, max.y
        );
    }

    Ok(())
}
