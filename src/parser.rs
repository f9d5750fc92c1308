//! Parser for `nsd-control stats_noreset` output.
//!
//! The output is one `key=value` pair per line, e.g.
//!
//! ```text
//! server0.queries=1024
//! num.queries=1024
//! time.boot=3612.421370
//! num.type.A=812
//! num.rcode.NOERROR=990
//! zone.master=3
//! ```
//!
//! Lines that do not look like a metric, or whose value is not a
//! non-negative integer, are skipped. Only an entirely unusable response is
//! an error.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::CollectError;
use crate::MetricSet;

static STAT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_.\-]+)\s*=\s*(\S+)$").expect("stat line regex is valid")
});

/// Keys NSD reports as fractional seconds.
const FRACTIONAL_PREFIX: &str = "time.";

/// Parses raw nsd-control output into a [`MetricSet`].
///
/// Lines are decoded one at a time, so a stray non-UTF-8 byte only costs
/// the line it sits on.
pub fn parse_stats(raw: &[u8]) -> Result<MetricSet, CollectError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(CollectError::EmptyOutput);
    }

    let mut mx = MetricSet::new();
    let mut decoded = 0usize;
    let mut first_bad = None;
    for bytes in raw.split(|&b| b == b'\n') {
        let line = match std::str::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => {
                debug!("Skipping non-UTF-8 stats line: {}", e);
                first_bad.get_or_insert(e);
                continue;
            }
        };
        if !line.trim().is_empty() {
            decoded += 1;
        }
        if let Some((key, value)) = parse_line(line) {
            mx.insert(key.to_string(), value);
        }
    }

    if mx.is_empty() {
        return match first_bad {
            Some(e) if decoded == 0 => Err(CollectError::Parse(format!(
                "output is not valid UTF-8: {}",
                e
            ))),
            _ => Err(CollectError::EmptyResult),
        };
    }
    Ok(mx)
}

/// Parses one line, returning `None` for anything that is not a metric.
pub fn parse_line(line: &str) -> Option<(&str, i64)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let Some(caps) = STAT_LINE.captures(line) else {
        debug!("Skipping invalid stats line: {}", line);
        return None;
    };
    let key = caps.get(1)?.as_str();
    let raw = caps.get(2)?.as_str();

    match parse_value(key, raw) {
        Some(v) => Some((key, v)),
        None => {
            debug!("Skipping stats line with bad value: {}={}", key, raw);
            None
        }
    }
}

fn parse_value(key: &str, raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<u64>() {
        return i64::try_from(v).ok();
    }
    if key.starts_with(FRACTIONAL_PREFIX) {
        let f: f64 = raw.parse().ok()?;
        if f.is_finite() && f >= 0.0 && f < i64::MAX as f64 {
            return Some(f.trunc() as i64);
        }
    }
    None
}
