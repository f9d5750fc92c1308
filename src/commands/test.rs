//! Test command implementation.
//!
//! Runs a number of collection cycles and displays the results.

use anyhow::Context;
use herakles_nsd_exporter::Collector;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::cli::ConfigFormat;
use crate::config::Config;

/// Tests metrics collection.
pub async fn command_test(
    iterations: usize,
    verbose: bool,
    format: ConfigFormat,
    config: &Config,
) -> anyhow::Result<()> {
    println!("🧪 Herakles NSD Exporter - Test Mode");
    println!("====================================");

    let mut collector = Collector::new(config.nsd.clone());
    collector
        .init()
        .await
        .context("nsd-control initialization")?;

    let mut failures = 0usize;

    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        let result = collector.collect().await;
        let duration = start.elapsed();
        println!(
            "   ⏱️  Collect duration: {:.2}ms",
            duration.as_secs_f64() * 1000.0
        );

        match result {
            Ok(mx) => {
                println!("   📊 Collected: {} metrics", mx.len());
                if let Some(q) = mx.get("num.queries") {
                    println!("   📈 num.queries = {}", q);
                }
                if verbose {
                    let sorted: BTreeMap<&str, i64> =
                        mx.iter().map(|(k, v)| (k.as_str(), *v)).collect();
                    let rendered = match format {
                        ConfigFormat::Json => serde_json::to_string_pretty(&sorted)?,
                        ConfigFormat::Toml => toml::to_string_pretty(&sorted)?,
                        ConfigFormat::Yaml => serde_yaml::to_string(&sorted)?,
                    };
                    println!("{}", rendered);
                }
            }
            Err(e) => {
                failures += 1;
                println!("   ❌ {} ({})", e, e.reason());
            }
        }

        if iteration < iterations {
            tokio::time::sleep(Duration::from_secs(config.nsd.update_every)).await;
        }
    }

    collector.cleanup().await;

    if failures == 0 {
        println!("\n✅ Test completed successfully");
    } else {
        println!("\n⚠️  Test completed with {} failed cycle(s)", failures);
    }
    Ok(())
}
