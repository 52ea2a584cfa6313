//! Daemon configuration file support
//!
//! Loads and validates edgecfgd settings from TOML. Every field has a
//! default, so an absent file or an empty section yields a working daemon.
//! Default location: /etc/edgecfgd/edgecfgd.toml

use crate::error::{EdgeError, Result};
use crate::render::VrfStanzaStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Default daemon configuration path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/edgecfgd/edgecfgd.toml";

/// Default intent path.
pub const DEFAULT_INTENT_PATH: &str = "/etc/edgecfgd/intent.toml";

/// How VRF devices get their kernel routing table id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableIdMode {
    /// Ids come from the persisted allocator pool.
    #[default]
    Allocated,
    /// The VRF's VNI doubles as its table id.
    Vni,
}

/// File locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Rendered FRR configuration, replaced every pass
    #[serde(default = "default_frr_config")]
    pub frr_config: PathBuf,

    /// vtysh companion file FRR insists on at startup
    #[serde(default = "default_vtysh_config")]
    pub vtysh_config: PathBuf,

    /// Persisted VRF name to table id map
    #[serde(default = "default_table_map")]
    pub table_map: PathBuf,
}

/// Reload tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadConfig {
    /// Path of frr-reload.py
    #[serde(default = "default_reload_command")]
    pub command: String,

    /// Run the tool in `--test` mode before applying
    #[serde(default)]
    pub validate_before_reload: bool,
}

/// Control loop and kernel reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileConfig {
    /// Seconds between passes
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Upper bound for any single external command
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Prefix length used when assigning a router-id to its VRF device
    #[serde(default = "default_address_prefix_len")]
    pub address_prefix_len: u8,

    #[serde(default)]
    pub table_id_mode: TableIdMode,
}

/// Rendering settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default)]
    pub vrf_stanza_style: VrfStanzaStyle,
}

/// Complete edgecfgd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub reload: ReloadConfig,

    #[serde(default)]
    pub reconcile: ReconcileConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

// Default functions
fn default_frr_config() -> PathBuf {
    PathBuf::from("/etc/frr/frr.conf")
}

fn default_vtysh_config() -> PathBuf {
    PathBuf::from("/etc/frr/vtysh.conf")
}

fn default_table_map() -> PathBuf {
    PathBuf::from("/var/lib/edgecfgd/vrf-tables.json")
}

fn default_reload_command() -> String {
    "/usr/lib/frr/frr-reload.py".to_string()
}

fn default_interval() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    10
}

fn default_address_prefix_len() -> u8 {
    24
}

// Default implementations
impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            frr_config: default_frr_config(),
            vtysh_config: default_vtysh_config(),
            table_map: default_table_map(),
        }
    }
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            command: default_reload_command(),
            validate_before_reload: false,
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            command_timeout_secs: default_command_timeout(),
            address_prefix_len: default_address_prefix_len(),
            table_id_mode: TableIdMode::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config: Self = match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                EdgeError::Config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(EdgeError::Io(e)),
        };

        config.validate()?;
        Ok(config)
    }

    /// Pause between the end of one pass and the start of the next
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.reconcile.interval_secs)
    }

    /// Timeout applied to every external command
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile.command_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.reconcile.interval_secs == 0 {
            return Err(EdgeError::Config("interval_secs must be > 0".to_string()));
        }

        if self.reconcile.command_timeout_secs == 0 {
            return Err(EdgeError::Config(
                "command_timeout_secs must be > 0".to_string(),
            ));
        }

        if !(1..=32).contains(&self.reconcile.address_prefix_len) {
            return Err(EdgeError::Config(
                "address_prefix_len must be 1-32".to_string(),
            ));
        }

        if self.reload.command.trim().is_empty() {
            return Err(EdgeError::Config(
                "reload command must not be empty".to_string(),
            ));
        }

        if self.paths.frr_config.file_name().is_none() {
            return Err(EdgeError::Config(format!(
                "frr_config {} does not name a file",
                self.paths.frr_config.display()
            )));
        }

        Ok(())
    }
}

/// Load and validate the intent document at `path`.
pub fn load_intent(path: impl AsRef<Path>) -> Result<edge_types::GlobalIntent> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        EdgeError::Config(format!("Failed to read intent {}: {}", path.display(), e))
    })?;
    Ok(edge_types::GlobalIntent::from_toml_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.paths.frr_config, PathBuf::from("/etc/frr/frr.conf"));
        assert_eq!(config.paths.vtysh_config, PathBuf::from("/etc/frr/vtysh.conf"));
        assert_eq!(config.reload.command, "/usr/lib/frr/frr-reload.py");
        assert!(!config.reload.validate_before_reload);
        assert_eq!(config.reconcile.table_id_mode, TableIdMode::Allocated);
        assert_eq!(config.render.vrf_stanza_style, VrfStanzaStyle::StaticRoutes);
    }

    #[test]
    fn test_durations() {
        let config = DaemonConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.command_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(DaemonConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = DaemonConfig::default();
        config.reconcile.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_prefix_len() {
        let mut config = DaemonConfig::default();
        config.reconcile.address_prefix_len = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[paths]
frr_config = "/run/frr/frr.conf"

[reconcile]
interval_secs = 5
table_id_mode = "vni"

[render]
vrf_stanza_style = "vni"
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.paths.frr_config, PathBuf::from("/run/frr/frr.conf"));
        assert_eq!(config.reconcile.interval_secs, 5);
        assert_eq!(config.reconcile.table_id_mode, TableIdMode::Vni);
        assert_eq!(config.render.vrf_stanza_style, VrfStanzaStyle::Vni);
        // Unspecified values should use defaults
        assert_eq!(config.paths.vtysh_config, PathBuf::from("/etc/frr/vtysh.conf"));
        assert_eq!(config.reconcile.command_timeout_secs, 10);
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = DaemonConfig::load_or_default("/nonexistent/edgecfgd.toml").unwrap();
        assert_eq!(config.reconcile.interval_secs, 30);
    }

    #[test]
    fn test_load_rejects_unknown_section() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[metrics]\nport = 9000").unwrap();

        assert!(matches!(
            DaemonConfig::load_or_default(file.path()),
            Err(EdgeError::Config(_))
        ));
    }

    #[test]
    fn test_load_rejects_misspelled_key() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[reconcile]\nintervl_secs = 5").unwrap();

        match DaemonConfig::load_or_default(file.path()) {
            Err(EdgeError::Config(message)) => assert!(message.contains("intervl_secs")),
            other => panic!("expected a config error, got {:?}", other.map(|_| ())),
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[render]\nstanza_style = \"vni\"").unwrap();
        assert!(matches!(
            DaemonConfig::load_or_default(file.path()),
            Err(EdgeError::Config(_))
        ));
    }

    #[test]
    fn test_load_intent_reports_validation_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "asn = 64512\n[[evpn]]\nvrf = \"missing\""
        )
        .unwrap();

        assert!(matches!(load_intent(file.path()), Err(EdgeError::Intent(_))));
    }
}
