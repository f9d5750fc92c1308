//! Check command implementation.
//!
//! Validates requirements, configuration and runs the collector's startup
//! check once against the real nsd-control.

use anyhow::Context;
use herakles_nsd_exporter::Collector;

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::validate_requirements;

/// Validates system requirements and configuration.
pub async fn command_check(config: &Config) -> anyhow::Result<()> {
    println!("🔍 Herakles NSD Exporter - System Check");
    println!("========================================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📁 Checking runtime requirements...");
    match validate_requirements(&config.nsd) {
        Ok(path) => println!("   ✅ nsd-control: {}", path.display()),
        Err(e) => {
            println!("   ❌ {}", e);
            all_ok = false;
        }
    }

    println!("\n📊 Running one collection...");
    let mut collector = Collector::new(config.nsd.clone());
    let outcome = async {
        collector.init().await.context("init")?;
        collector.check().await.context("check")?;
        anyhow::Ok(collector.cache().len())
    }
    .await;
    match outcome {
        Ok(count) => println!("   ✅ Collected {} metrics", count),
        Err(e) => {
            println!("   ❌ Collection failed: {:#}", e);
            all_ok = false;
        }
    }
    collector.cleanup().await;

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - exporter is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
