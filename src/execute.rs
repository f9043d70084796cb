use crate::ammo_writer::{AmmoWriter, WriteSummary};
use crate::config::AmmoConfig;
use crate::diagnostics::TracingSink;
use crate::logging;
use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::{debug, info};

pub fn generate_ammo(config_path: &Path) -> Result<WriteSummary> {
    if !config_path.is_file() {
        return Err(anyhow!(format!("file {:?} not found", config_path.to_path_buf())));
    }
    let config = AmmoConfig::from_file(config_path)?;
    logging::init(config.log_level()?, &config.log_date_fmt);
    debug!("configuration file loaded: {:?}", config);

    let records = config
        .request_records()
        .context(format!("while validating {}", config_path.display()))?;
    let sink = TracingSink;
    let summary = AmmoWriter::new(&config.ammo_file)
        .with_sink(&sink)
        .write(&records)
        .context(format!("while writing {}", config.ammo_file.display()))?;
    return Ok(summary);
}

pub fn create_template(config_path: &Path) -> Result<()> {
    let defaults = AmmoConfig::default();
    logging::init(defaults.log_level()?, &defaults.log_date_fmt);
    debug!("trying to create template of configuration file");
    AmmoConfig::write_template(config_path)?;
    info!("template {} created", config_path.display());
    return Ok(());
}
