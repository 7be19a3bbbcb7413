use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use extrulink_link::{InboundConfig, LinkSettings, Mode, ReadErrorPolicy};
use extrulink_telemetry::{EventNotifier, StateStore, Telemetry};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::exit::{config_error, io_error, CliResult};

pub const DEFAULT_CONFIG_PATH: &str = "ExtruderConfig.json";

/// Bridge settings as stored in the JSON config file.
///
/// Every key is optional; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    pub mode: Mode,
    pub tcp_address: String,
    pub sim_mode_pipe: PathBuf,
    pub msg_from_sim_pipe: PathBuf,
    pub msg_to_sim_pipe: PathBuf,
    pub reconnect_delay_ms: u64,
    pub event_capacity: usize,
    pub delimiter: String,
    pub stop_on_read_error: bool,
    pub max_line_length: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let link = LinkSettings::default();
        Self {
            mode: link.mode,
            tcp_address: link.tcp_address,
            sim_mode_pipe: link.sim_pipe,
            msg_from_sim_pipe: link.msg_from_pipe,
            msg_to_sim_pipe: link.msg_to_pipe,
            reconnect_delay_ms: 2000,
            event_capacity: extrulink_telemetry::DEFAULT_EVENT_CAPACITY,
            delimiter: "|".to_string(),
            stop_on_read_error: false,
            max_line_length: extrulink_link::DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

/// Command-line values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<Mode>,
    pub tcp_address: Option<String>,
}

impl BridgeConfig {
    /// Load the config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(io_error(
                    &format!("failed reading {}", path.display()),
                    err,
                ))
            }
        };
        let config: Self = serde_json::from_str(&text)
            .map_err(|err| config_error(&format!("invalid config {}", path.display()), err))?;
        config.validate()?;
        debug!(path = %path.display(), mode = %config.mode, "config loaded");
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(address) = &overrides.tcp_address {
            self.tcp_address = address.clone();
        }
        self
    }

    fn validate(&self) -> CliResult<()> {
        if self.delimiter.is_empty() {
            return Err(config_error("invalid config", "delimiter must not be empty"));
        }
        if self.event_capacity == 0 {
            return Err(config_error(
                "invalid config",
                "eventCapacity must be greater than zero",
            ));
        }
        if self.max_line_length == 0 {
            return Err(config_error(
                "invalid config",
                "maxLineLength must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn link_settings(&self) -> LinkSettings {
        LinkSettings {
            mode: self.mode,
            tcp_address: self.tcp_address.clone(),
            sim_pipe: self.sim_mode_pipe.clone(),
            msg_from_pipe: self.msg_from_sim_pipe.clone(),
            msg_to_pipe: self.msg_to_sim_pipe.clone(),
            inbound: InboundConfig {
                backoff: Duration::from_millis(self.reconnect_delay_ms),
                on_read_error: if self.stop_on_read_error {
                    ReadErrorPolicy::Stop
                } else {
                    ReadErrorPolicy::Reconnect
                },
                delimiter: self.delimiter.clone(),
                max_line_length: self.max_line_length,
            },
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry::new(StateStore::new(), EventNotifier::new(self.event_capacity))
    }
}
