use anyhow::{Context, Result};

use photolapse::{PhotoRecord, TerminalPrompter, TimelapseConfig, TimelapsePipeline};

pub async fn cmd_dates(config: TimelapseConfig, json: bool) -> Result<()> {
    eprintln!("📅 Resolving capture dates in {}", config.paths.photos_dir().display());

    let pipeline = TimelapsePipeline::new(config);
    let prepared = pipeline
        .prepare_timeline(TerminalPrompter::stdio())
        .await
        .context("resolving capture dates")?;

    let report = &prepared.report;
    if report.applied > 0 {
        eprintln!("   Stored corrections applied: {}", report.applied);
    }
    if !report.prompted.is_empty() {
        eprintln!("   New corrections saved: {}", report.prompted.len());
    }
    if !report.unresolved.is_empty() {
        eprintln!(
            "   ⚠️  Duplicates kept as-is: {}",
            report.unresolved.join(", ")
        );
    }

    if json {
        let records: Vec<&PhotoRecord> = prepared.timeline.iter().collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    for (index, record) in prepared.timeline.iter().enumerate() {
        println!(
            "{:>5}  {}  {:<9}  {:>11}  {}",
            index + 1,
            record.captured_at.format("%Y-%m-%d %H:%M:%S"),
            record.source,
            format!("{}x{}", record.width, record.height),
            record.file_name()
        );
    }
    eprintln!(
        "\n📷 {} photos, frame size {}",
        prepared.timeline.len(),
        prepared.size
    );
    Ok(())
}
