//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Json => "herakles-nsd-exporter.json",
            ConfigFormat::Toml => "herakles-nsd-exporter.toml",
            ConfigFormat::Yaml => "herakles-nsd-exporter.yaml",
        }),
    };

    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
        ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        ConfigFormat::Yaml => {
            let mut content = serde_yaml::to_string(&config)?;
            if commented {
                content = add_config_comments(content);
            }
            content
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles NSD Exporter Configuration
# ====================================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                   # HTTP port
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable nsd_exporter_* metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# NSD Collector
# -------------
# nsd:
#   update_every: 10           # Polling interval in seconds
#   timeout: 2                 # nsd-control timeout (2, 1.5, "500ms", "2s")
#   binary: nsd-control        # Name on PATH or absolute path
#   config_file: /etc/nsd/nsd.conf   # Passed as -c (optional)
#   server: "127.0.0.1@8952"   # Passed as -s (optional)
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_yaml_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let cfg = crate::config::parse_config_file(&path).unwrap();
        assert_eq!(cfg.port, Some(crate::config::DEFAULT_PORT));
        assert_eq!(cfg.nsd, herakles_nsd_exporter::CollectorConfig::default());
    }

    #[test]
    fn test_generated_toml_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.toml");
        command_config(Some(path.clone()), ConfigFormat::Toml, false).unwrap();

        let cfg = crate::config::parse_config_file(&path).unwrap();
        assert_eq!(cfg.nsd.update_every, 10);
    }
}
