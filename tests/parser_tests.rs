//! Integration tests for the nsd-control stats parser.
//!
//! These tests feed realistic `stats_noreset` output through the public
//! parser and check the resulting MetricSet.

use herakles_nsd_exporter::parser::{parse_line, parse_stats};
use herakles_nsd_exporter::{CollectError, MetricSet};

const SAMPLE: &str = "\
server0.queries=1530
num.queries=1530
time.boot=1234.567891
time.elapsed=10.000123
size.db.disk=0
size.db.mem=4096
size.xfrd.mem=83886080
num.type.A=1200
num.type.AAAA=310
num.type.SOA=20
num.opcode.QUERY=1530
num.class.IN=1530
num.rcode.NOERROR=1490
num.rcode.NXDOMAIN=40
num.udp=1500
num.tcp=30
num.dropped=0
zone.master=3
zone.slave=12
";

#[test]
fn test_sample_output_parses_every_line() {
    let mx = parse_stats(SAMPLE.as_bytes()).unwrap();

    assert_eq!(mx.len(), SAMPLE.lines().count());
    assert_eq!(mx.get("num.queries"), Some(&1530));
    assert_eq!(mx.get("num.rcode.NXDOMAIN"), Some(&40));
    assert_eq!(mx.get("size.xfrd.mem"), Some(&83_886_080));
    assert_eq!(mx.get("zone.slave"), Some(&12));
}

#[test]
fn test_time_values_are_truncated() {
    let mx = parse_stats(SAMPLE.as_bytes()).unwrap();
    assert_eq!(mx.get("time.boot"), Some(&1234));
    assert_eq!(mx.get("time.elapsed"), Some(&10));
}

#[test]
fn test_malformed_lines_are_skipped() {
    let raw = b"server.queries=120\nserver.failures=3\nmalformed_line\n";
    let mx = parse_stats(raw).unwrap();

    let mut expected = MetricSet::new();
    expected.insert("server.queries".to_string(), 120);
    expected.insert("server.failures".to_string(), 3);
    assert_eq!(mx, expected);
}

#[test]
fn test_parsing_is_idempotent() {
    let first = parse_stats(SAMPLE.as_bytes()).unwrap();
    let second = parse_stats(SAMPLE.as_bytes()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_rendered_set_parses_back() {
    let original = parse_stats(SAMPLE.as_bytes()).unwrap();
    let rendered: String = original
        .iter()
        .filter(|(k, _)| !k.starts_with("time."))
        .map(|(k, v)| format!("{}={}\n", k, v))
        .collect();

    let reparsed = parse_stats(rendered.as_bytes()).unwrap();
    for (key, value) in &reparsed {
        assert_eq!(original.get(key), Some(value), "mismatch for {}", key);
    }
    assert_eq!(reparsed.len(), original.len() - 2);
}

#[test]
fn test_crlf_and_padding_tolerated() {
    let mx = parse_stats(b"  num.queries = 7 \r\nnum.tcp=2\r\n").unwrap();
    assert_eq!(mx.get("num.queries"), Some(&7));
    assert_eq!(mx.get("num.tcp"), Some(&2));
}

#[test]
fn test_empty_and_garbage_outputs() {
    assert!(matches!(parse_stats(b""), Err(CollectError::EmptyOutput)));
    assert!(matches!(parse_stats(b" \n\n\t"), Err(CollectError::EmptyOutput)));
    assert!(matches!(
        parse_stats(b"error: could not connect\n"),
        Err(CollectError::EmptyResult)
    ));
    assert!(matches!(
        parse_stats(&[0xff, 0xfe, b'=', b'1']),
        Err(CollectError::Parse(_))
    ));
}

#[test]
fn test_parse_line_rejects_bad_values() {
    assert_eq!(parse_line("num.queries=12"), Some(("num.queries", 12)));
    assert_eq!(parse_line("num.queries=-1"), None);
    assert_eq!(parse_line("num.queries=abc"), None);
    assert_eq!(parse_line("num.queries=99999999999999999999"), None);
    assert_eq!(parse_line("# comment"), None);
    assert_eq!(parse_line("=5"), None);
}

#[test]
fn test_non_utf8_line_does_not_drop_the_cycle() {
    let mx = parse_stats(b"num.queries=120\nnum.tcp=3\nbogus\xff=1\n").unwrap();

    let mut expected = MetricSet::new();
    expected.insert("num.queries".to_string(), 120);
    expected.insert("num.tcp".to_string(), 3);
    assert_eq!(mx, expected);
}
