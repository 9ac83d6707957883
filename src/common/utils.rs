//! Utility functions for garage-bootstrap

use crate::common::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Parse a capacity label.
///
/// The capacity is the leading decimal integer, after optional whitespace
/// and an optional `+`, so `"100G"` is 100 and `"4.5"` is 4. No digits,
/// zero, a negative value or overflow leave it unset.
pub fn parse_capacity(raw: Option<&str>) -> Option<u64> {
    let s = raw?.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse::<u64>().ok().filter(|capacity| *capacity > 0)
}

/// Parse a comma-separated tags label. Absent yields an empty list.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Read a label, treating blank values as absent.
pub fn label<'a>(labels: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    labels
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Format `host:port`, bracketing IPv6 literals.
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Load the admin bearer token from its secret file.
pub fn read_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Credential(format!("cannot read {}: {}", path.display(), e)))?;

    let token = raw.trim();
    if token.is_empty() {
        return Err(Error::Credential(format!("{} is empty", path.display())));
    }

    Ok(token.to_string())
}
