// src/listing/config.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::fetch::normalize_url;

/// Load newsletter root URLs, one per line. Blank lines and `#` comments are
/// skipped. Schemeless lines get `https://`; lines that are not http(s) URLs are
/// skipped with a warning. Duplicates keep their first position.
pub fn load_newsletters(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading newsletters from {}", path.display()))?;
    Ok(parse_newsletters(&content))
}

fn parse_newsletters(s: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (n, line) in s.lines().enumerate() {
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') {
            continue;
        }
        let url = match normalize_url(t) {
            Ok(u) => u,
            Err(e) => {
                warn!(line = n + 1, error = %e, "ignoring newsletters entry");
                continue;
            }
        };
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}
