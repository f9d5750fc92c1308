//! Configuration management for herakles-nsd-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use herakles_nsd_exporter::collector_config::{parse_duration, DEFAULT_BINARY, DEFAULT_TIMEOUT};
use herakles_nsd_exporter::CollectorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    /// NSD collector settings
    #[serde(default, alias = "collector")]
    pub nsd: CollectorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some("info".into()),
            nsd: CollectorConfig::default(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.port == Some(0) {
        return Err("port must be greater than 0".into());
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address '{}'", bind).into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(format!(
                    "Invalid log_level '{}', expected off/error/warn/info/debug/trace",
                    other
                )
                .into());
            }
        }
    }

    cfg.nsd.validate()?;

    if let Some(file) = cfg.nsd.config_file.as_deref() {
        if !file.exists() {
            return Err(format!("NSD config file not found: {}", file.display()).into());
        }
    }

    // A timeout as long as the interval would let cycles pile up behind each other.
    if cfg.nsd.timeout.as_secs_f64() >= cfg.nsd.update_every as f64 {
        return Err(format!(
            "timeout ({:?}) must be shorter than update_every ({}s)",
            cfg.nsd.timeout, cfg.nsd.update_every
        )
        .into());
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Collector settings
    if let Some(update_every) = args.update_every {
        config.nsd.update_every = update_every;
    }
    if let Some(timeout) = args.timeout.as_deref() {
        config.nsd.timeout = parse_duration(timeout)?;
    }
    if let Some(binary) = &args.nsd_control {
        config.nsd.binary = binary.clone();
    }
    if let Some(file) = &args.nsd_config {
        config.nsd.config_file = Some(file.clone());
    }
    if let Some(server) = &args.server {
        config.nsd.server = Some(server.clone());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    Ok(config)
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = if let Some(p) = path {
        if !p.exists() {
            return Err(format!("Config file not found: {}", p.display()).into());
        }
        p.to_path_buf()
    } else {
        // Try default locations
        let defaults = [
            "/etc/herakles/nsd-exporter.yaml",
            "/etc/herakles/nsd-exporter.yml",
            "/etc/herakles/nsd-exporter.json",
            "/etc/herakles/nsd-exporter.toml",
            "./herakles-nsd-exporter.yaml",
            "./herakles-nsd-exporter.yml",
            "./herakles-nsd-exporter.json",
            "./herakles-nsd-exporter.toml",
        ];

        match defaults.iter().find(|p| Path::new(p).exists()) {
            Some(found) => PathBuf::from(found),
            None => return Ok(Config::default()),
        }
    };

    parse_config_file(&path)
}

/// Parses a config file, choosing the format by extension (YAML by default).
pub fn parse_config_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    println!("{output}");
    Ok(())
}

/// One-line summary of the collector settings for startup logs.
pub fn describe_collector(cfg: &CollectorConfig) -> String {
    let binary = cfg.binary.display().to_string();
    format!(
        "binary={}{} update_every={}s timeout={:?}{}",
        binary,
        if binary == DEFAULT_BINARY { " (PATH)" } else { "" },
        cfg.update_every,
        cfg.timeout,
        if cfg.timeout == DEFAULT_TIMEOUT {
            " (default)"
        } else {
            ""
        }
    )
}
