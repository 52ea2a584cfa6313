//! Rendered configuration output

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{EdgeError, Result};

/// Writes the FRR configuration and keeps its vtysh companion in place.
///
/// The configuration is replaced atomically: a reader (or the reload tool)
/// sees either the previous file or the complete new one.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    config_path: PathBuf,
    vtysh_path: PathBuf,
}

impl ConfigWriter {
    pub fn new(config_path: impl Into<PathBuf>, vtysh_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            vtysh_path: vtysh_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Replace the configuration file with `text`, then make sure the
    /// companion file exists.
    pub fn write(&self, text: &str) -> Result<()> {
        let dir = parent_dir(&self.config_path);

        let mut tmp =
            NamedTempFile::new_in(dir).map_err(|e| EdgeError::write(&self.config_path, e))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| EdgeError::write(&self.config_path, e))?;
        if let Some(perms) = target_permissions(&self.config_path) {
            tmp.as_file()
                .set_permissions(perms)
                .map_err(|e| EdgeError::write(&self.config_path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| EdgeError::write(&self.config_path, e))?;
        tmp.persist(&self.config_path)
            .map_err(|e| EdgeError::write(&self.config_path, e.error))?;
        info!(
            "FRR configuration written to {} ({} bytes)",
            self.config_path.display(),
            text.len()
        );

        self.ensure_companion()
    }

    /// vtysh refuses to start without its configuration file; an empty one
    /// is enough. Existing content is left alone.
    pub fn ensure_companion(&self) -> Result<()> {
        if self.vtysh_path.exists() {
            return Ok(());
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.vtysh_path)
            .map_err(|e| EdgeError::write(&self.vtysh_path, e))?;
        debug!("Created {}", self.vtysh_path.display());
        Ok(())
    }

    /// Current content of the configuration file, if any
    pub fn read_back(&self) -> Option<String> {
        fs::read_to_string(&self.config_path).ok()
    }
}

/// Mode for the replacement file: the current file's, or 0644 when there
/// is none. Temporary files start out 0600, which FRR's `frr` user and the
/// `frrvty` group cannot read.
#[cfg(unix)]
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    Some(
        fs::metadata(path)
            .map(|meta| meta.permissions())
            .unwrap_or_else(|_| fs::Permissions::from_mode(0o644)),
    )
}

#[cfg(not(unix))]
fn target_permissions(path: &Path) -> Option<fs::Permissions> {
    fs::metadata(path).map(|meta| meta.permissions()).ok()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let writer = ConfigWriter::new(dir.path().join("frr.conf"), dir.path().join("vtysh.conf"));

        writer.write("hostname a\n").unwrap();
        writer.write("hostname b\n").unwrap();

        assert_eq!(writer.read_back().unwrap(), "hostname b\n");
        // Only the two target files remain, no temporaries
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_companion_created_once() {
        let dir = TempDir::new().unwrap();
        let vtysh = dir.path().join("vtysh.conf");
        let writer = ConfigWriter::new(dir.path().join("frr.conf"), &vtysh);

        writer.write("!\n").unwrap();
        assert!(vtysh.exists());
        assert_eq!(fs::read_to_string(&vtysh).unwrap(), "");

        fs::write(&vtysh, "service integrated-vtysh-config\n").unwrap();
        writer.write("!\n").unwrap();
        assert_eq!(
            fs::read_to_string(&vtysh).unwrap(),
            "service integrated-vtysh-config\n"
        );
    }

    #[test]
    fn test_missing_directory_is_write_error() {
        let dir = TempDir::new().unwrap();
        let writer = ConfigWriter::new(
            dir.path().join("missing").join("frr.conf"),
            dir.path().join("vtysh.conf"),
        );

        let err = writer.write("!\n").unwrap_err();
        assert!(matches!(err, EdgeError::Write { .. }));
        assert_eq!(err.stage(), "render");
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_is_world_readable() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("frr.conf");
        let writer = ConfigWriter::new(&config, dir.path().join("vtysh.conf"));

        writer.write("hostname a\n").unwrap();

        assert_eq!(mode_of(&config), 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_replacement_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let config = dir.path().join("frr.conf");
        let writer = ConfigWriter::new(&config, dir.path().join("vtysh.conf"));

        fs::write(&config, "hostname old\n").unwrap();
        fs::set_permissions(&config, fs::Permissions::from_mode(0o644)).unwrap();
        writer.write("hostname a\n").unwrap();
        assert_eq!(mode_of(&config), 0o644);

        fs::set_permissions(&config, fs::Permissions::from_mode(0o640)).unwrap();
        writer.write("hostname b\n").unwrap();
        assert_eq!(mode_of(&config), 0o640);
        assert_eq!(writer.read_back().unwrap(), "hostname b\n");
    }
}
