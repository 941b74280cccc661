use std::time::Instant;

use anyhow::{Context, Result};

use photolapse::{TerminalPrompter, TimelapseConfig, TimelapsePipeline};

pub async fn cmd_build(config: TimelapseConfig) -> Result<()> {
    eprintln!("🎞️  Building timelapse in {}", config.paths.root.display());
    eprintln!(
        "   {} fps, {} frames per photo",
        config.video.fps, config.video.hold_frames
    );
    if !config.audio.enabled {
        eprintln!("   Soundtrack: disabled");
    }

    let start = Instant::now();
    let pipeline = TimelapsePipeline::new(config);
    let result = pipeline
        .run(TerminalPrompter::stdio())
        .await
        .context("timelapse build failed")?;

    eprintln!();
    eprintln!("📷 Photos:     {}", result.frames);
    eprintln!("📐 Frame size: {}", result.size);
    if !result.report.prompted.is_empty() {
        eprintln!("📝 New corrections: {}", result.report.prompted.len());
    }
    if let Some(audio) = &result.audio {
        eprintln!("🎵 Duration:   {:.1}s", audio.duration);
    }
    match result.final_output() {
        Some(path) => eprintln!("✅ Output:     {}", path.display()),
        None => eprintln!("⚠️  Nothing was encoded"),
    }
    eprintln!("⏱️  Took {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
