//! WHOIS response parsing.
//!
//! Responses are free-form `key: value` text whose key names vary between
//! registries. The first recognised occurrence of each field wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::WhoisRecord;

const REGISTRAR_KEYS: &[&str] = &["registrar", "registrar name", "sponsoring registrar"];

const CREATION_KEYS: &[&str] = &[
    "creation date",
    "created date",
    "created on",
    "created",
    "registration date",
    "registered on",
    "domain registration date",
];

const EXPIRATION_KEYS: &[&str] = &[
    "registry expiry date",
    "registrar registration expiration date",
    "expiration date",
    "expiry date",
    "expires on",
    "expires",
    "expire date",
    "paid-till",
    "renewal date",
];

const NAME_SERVER_KEYS: &[&str] = &["name server", "name servers", "nameserver", "nameservers", "nserver"];

/// Splits a line into a lower-cased key and a trimmed value.
fn split_line(line: &str) -> Option<(String, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.starts_with('%') || key.starts_with('#') {
        return None;
    }
    Some((key.to_ascii_lowercase(), value.trim()))
}

/// Normalizes a name server entry: first token, lower-cased, no trailing dot.
fn normalize_name_server(value: &str) -> Option<String> {
    let host = value.split_whitespace().next()?;
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() || !host.contains('.') {
        None
    } else {
        Some(host)
    }
}

/// Parses a raw WHOIS response into a record.
pub fn parse_whois_response(domain: &str, whois_server: &str, raw: &str) -> WhoisRecord {
    let mut record = WhoisRecord {
        domain: domain.to_string(),
        whois_server: whois_server.to_string(),
        ..Default::default()
    };

    let lines: Vec<&str> = raw.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let Some((key, value)) = split_line(line) else {
            continue;
        };

        // Block layout: the value sits on the following indented lines.
        let block_values = || {
            lines[i + 1..]
                .iter()
                .take_while(|l| l.starts_with(char::is_whitespace) && !l.trim().is_empty())
                .map(|l| l.trim())
                .collect::<Vec<_>>()
        };

        let key = key.as_str();
        if REGISTRAR_KEYS.contains(&key) && record.registrar.is_none() {
            let value = if value.is_empty() {
                block_values().first().copied().unwrap_or_default()
            } else {
                value
            };
            if !value.is_empty() {
                record.registrar = Some(value.to_string());
            }
        } else if CREATION_KEYS.contains(&key) && record.creation_date.is_none() {
            record.creation_date = parse_date_string(value);
        } else if EXPIRATION_KEYS.contains(&key) && record.expiration_date.is_none() {
            record.expiration_date = parse_date_string(value);
        } else if NAME_SERVER_KEYS.contains(&key) {
            let values = if value.is_empty() {
                block_values()
            } else {
                vec![value]
            };
            for ns in values.into_iter().filter_map(normalize_name_server) {
                if !record.name_servers.contains(&ns) {
                    record.name_servers.push(ns);
                }
            }
        }
    }

    record
}

/// Attempts to parse a date string in various formats
pub(crate) fn parse_date_string(date_str: &str) -> Option<DateTime<Utc>> {
    let cleaned = date_str
        .trim()
        .trim_end_matches("(UTC)")
        .trim_end_matches("UTC")
        .trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d",
        "%d-%b-%Y",
        "%d-%B-%Y",
        "%Y.%m.%d",
        "%Y/%m/%d",
        "%d.%m.%Y",
        "%d/%m/%Y",
    ];

    for format in &formats {
        if let Ok(naive_dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(naive_dt.and_utc());
        }
        if let Ok(naive_date) = NaiveDate::parse_from_str(cleaned, format) {
            return Some(naive_date.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}
