//! Known NSD counter families.
//!
//! nsd-control only prints `num.rcode.*`, `num.opcode.*`, `num.class.*` and
//! `num.type.*` entries once they are non-zero. Filling the missing members
//! with zero keeps every family complete from the first cycle on.

use crate::MetricSet;

pub const ANSWER_RCODES: &[&str] = &[
    "NOERROR", "FORMERR", "SERVFAIL", "NXDOMAIN", "NOTIMP", "REFUSED", "YXDOMAIN", "YXRRSET",
    "NXRRSET", "NOTAUTH", "NOTZONE", "RCODE11", "RCODE12", "RCODE13", "RCODE14", "RCODE15",
    "BADVERS",
];

pub const QUERY_OPCODES: &[&str] = &["QUERY", "IQUERY", "STATUS", "NOTIFY", "UPDATE", "OTHER"];

pub const QUERY_CLASSES: &[&str] = &["IN", "CS", "CH", "HS"];

pub const QUERY_TYPES: &[&str] = &[
    "A", "NS", "MD", "MF", "CNAME", "SOA", "MB", "MG", "MR", "NULL", "WKS", "PTR", "HINFO",
    "MINFO", "MX", "TXT", "RP", "AFSDB", "X25", "ISDN", "RT", "NSAP", "SIG", "KEY", "PX", "AAAA",
    "LOC", "NXT", "SRV", "NAPTR", "KX", "CERT", "DNAME", "OPT", "APL", "DS", "SSHFP", "IPSECKEY",
    "RRSIG", "NSEC", "DNSKEY", "DHCID", "NSEC3", "NSEC3PARAM", "TLSA", "SMIMEA", "CDS",
    "CDNSKEY", "OPENPGPKEY", "CSYNC", "ZONEMD", "SVCB", "HTTPS", "SPF", "NID", "L32", "L64", "LP",
    "EUI48", "EUI64", "URI", "CAA", "AVC", "DLV", "IXFR", "AXFR", "MAILB", "MAILA", "ANY",
];

/// (prefix, members) for every zero-filled family.
pub const FAMILIES: &[(&str, &[&str])] = &[
    ("num.rcode.", ANSWER_RCODES),
    ("num.opcode.", QUERY_OPCODES),
    ("num.class.", QUERY_CLASSES),
    ("num.type.", QUERY_TYPES),
];

/// Inserts `0` for every known family member absent from `mx`.
pub fn fill_known_dimensions(mx: &mut MetricSet) {
    for (prefix, members) in FAMILIES {
        for member in *members {
            let key = format!("{}{}", prefix, member);
            mx.entry(key).or_insert(0);
        }
    }
}

/// Number of keys [`fill_known_dimensions`] guarantees.
pub fn known_dimension_count() -> usize {
    FAMILIES.iter().map(|(_, members)| members.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_keeps_reported_values() {
        let mut mx = MetricSet::new();
        mx.insert("num.type.A".to_string(), 812);
        mx.insert("num.queries".to_string(), 1024);

        fill_known_dimensions(&mut mx);

        assert_eq!(mx["num.type.A"], 812);
        assert_eq!(mx["num.type.AAAA"], 0);
        assert_eq!(mx["num.rcode.SERVFAIL"], 0);
        assert_eq!(mx["num.opcode.NOTIFY"], 0);
        assert_eq!(mx["num.class.CH"], 0);
        assert_eq!(mx["num.queries"], 1024);
        assert_eq!(mx.len(), known_dimension_count() + 1);
    }

    #[test]
    fn test_fill_is_idempotent() {
        let mut once = MetricSet::new();
        fill_known_dimensions(&mut once);
        let mut twice = once.clone();
        fill_known_dimensions(&mut twice);
        assert_eq!(once, twice);
    }
}
