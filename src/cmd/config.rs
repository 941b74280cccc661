use anyhow::Result;

use photolapse::TimelapseConfig;

pub fn cmd_config(config: &TimelapseConfig) -> Result<()> {
    eprintln!("⚙️  Effective configuration for {}", config.paths.root.display());
    print!("{}", config.to_toml()?);
    Ok(())
}
