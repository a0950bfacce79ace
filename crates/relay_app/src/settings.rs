use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use relay_engine::{write_json_atomic, ConfigProvider, PollConfig, RelayError, Settings};
use relay_logging::{relay_debug, relay_info, relay_warn};

/// Read settings; a missing file yields defaults.
pub(crate) fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    match fs::read(path) {
        Ok(data) => {
            relay_debug!("Importing settings from {:?}", path);
            Ok(serde_json::from_slice(&data)?)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            relay_warn!("Settings file {:?} not found, using defaults", path);
            Ok(Settings::default())
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn save_settings(path: &Path, settings: &Settings) -> anyhow::Result<()> {
    relay_info!("Exporting settings to {:?}", path);
    write_json_atomic(path, settings)?;
    Ok(())
}

/// Re-reads the settings file each time a cycle starts.
pub(crate) struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ConfigProvider for SettingsFile {
    fn snapshot(&self) -> Result<PollConfig, RelayError> {
        let settings = load_settings(&self.path).map_err(|err| {
            RelayError::new(relay_engine::FailureKind::Config, format!("{:#}", err))
        })?;
        settings.snapshot()
    }
}
