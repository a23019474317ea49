//! Startup requirement validation for ipt-netflow-exporter.
//!
//! Checks that the ipt_NETFLOW stat file is present and readable. Failures
//! are reported but never stop the exporter: the module may be loaded later.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(stat_file: &Path) -> Result<(), ValidationError> {
    info!("Validating runtime requirements...");
    check_stat_file(stat_file)?;
    info!("All runtime requirements validated");
    Ok(())
}

/// Check that the stat file exists and can be opened for reading.
pub fn check_stat_file(path: &Path) -> Result<(), ValidationError> {
    match File::open(path) {
        Ok(_) => {
            info!("Stat file readable: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Stat file {} not found", path.display());
            warn!("   Is the ipt_NETFLOW kernel module loaded? Try: modprobe ipt_NETFLOW");
            Err(ValidationError::ModuleNotLoaded(path.to_path_buf()))
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            error!("Cannot read {} - insufficient permissions", path.display());
            Err(ValidationError::InsufficientPermissions(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
        Err(e) => {
            warn!("Could not open stat file {}: {}", path.display(), e);
            Err(ValidationError::Unreadable(format!("{}: {}", path.display(), e)))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("stat file {} not found, ipt_NETFLOW module not loaded", .0.display())]
    ModuleNotLoaded(PathBuf),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("stat file not readable: {0}")]
    Unreadable(String),
}
