//! Startup requirement validation for herakles-nsd-exporter.
//!
//! This module validates that nsd-control can be found and that the exporter
//! is likely to be allowed to talk to the NSD control channel.

use herakles_nsd_exporter::exec::resolve_binary;
use herakles_nsd_exporter::CollectorConfig;
use nix::unistd::geteuid;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Default control key written by `nsd-control-setup`.
const DEFAULT_CONTROL_KEY: &str = "/etc/nsd/nsd_control.key";

/// Validate all runtime requirements
pub fn validate_requirements(cfg: &CollectorConfig) -> Result<PathBuf, ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    let binary = check_nsd_control(cfg)?;
    if cfg.server.is_none() {
        check_control_key()?;
    }

    info!("✅ All runtime requirements validated");
    Ok(binary)
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        warn!("⚠️  Not running as root - nsd-control may not be able to read its control keys");
        warn!("   Recommendation: Run as root or as the nsd user");
    } else {
        info!("✅ Running as root (uid=0)");
    }
}

/// Check that nsd-control resolves to an executable
fn check_nsd_control(cfg: &CollectorConfig) -> Result<PathBuf, ValidationError> {
    match resolve_binary(&cfg.binary) {
        Ok(path) => {
            info!("✅ nsd-control found at {}", path.display());
            Ok(path)
        }
        Err(e) => {
            error!("❌ {}", e);
            error!("   Install NSD or set nsd.binary / --nsd-control to the full path");
            Err(ValidationError::NsdControlNotFound(e.to_string()))
        }
    }
}

/// Check the local control key is readable
fn check_control_key() -> Result<(), ValidationError> {
    match fs::File::open(DEFAULT_CONTROL_KEY) {
        Ok(_) => {
            info!("✅ Control key readable: {}", DEFAULT_CONTROL_KEY);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", DEFAULT_CONTROL_KEY);
            error!("   nsd-control stats_noreset will fail with this user!");
            error!("");
            error!("   Solutions:");
            error!("   1. Run as root:");
            error!("      sudo systemctl edit herakles-nsd-exporter");
            error!("      [Service]");
            error!("      User=root");
            error!("");
            error!("   2. Add the exporter user to the nsd group");
            Err(ValidationError::InsufficientPermissions(e.to_string()))
        }
        Err(e) => {
            // control-interface may be a unix socket without keys
            debug!("Control key {} not checked: {}", DEFAULT_CONTROL_KEY, e);
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("nsd-control not usable: {0}")]
    NsdControlNotFound(String),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),
}
