//! Write a scripted synthetic recording.

use std::path::PathBuf;

use anyhow::Context;

use airsketch_model::synthetic::Scenario;

pub fn run(output: PathBuf, scenario: Scenario, fps: u32) -> anyhow::Result<()> {
    let recording = scenario.build(fps);
    recording
        .save(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Wrote {} scenario to {}", scenario.name(), output.display());
    println!(
        "  Frames: {} ({} with hands, {:.2}s @ {}fps)",
        recording.frames.len(),
        recording.frames_with_hands(),
        recording.duration_ns() as f64 / 1e9,
        recording.header.fps
    );
    Ok(())
}
