//! HSTS preload list loader
//!
//! Reads Chromium's `transport_security_state_static.json`. The file is JSON
//! with whole-line `//` comments, so comment lines are dropped before parsing.
//! Chromium's source browser serves it base64-encoded (`?format=TEXT`); such
//! bodies are decoded first.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use base64::Engine;
use serde::Deserialize;

use hs_core::{MatchTier, RuleCollection};

use crate::error::CompileError;

/// Canonical location of the preload list, served base64-encoded.
pub const DEFAULT_PRELOAD_URL: &str = "https://chromium.googlesource.com/chromium/src/net/+/master/http/transport_security_state_static.json?format=TEXT";

const PRELOAD_ORIGIN: &str = "HSTS preload list";

/// Mode value marking an entry whose hosts must be reached over HTTPS.
pub const FORCE_HTTPS_MODE: &str = "force-https";

/// One preload list entry. Pinning-only entries carry no `mode`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreloadEntry {
    pub name: String,
    #[serde(default)]
    pub include_subdomains: bool,
    #[serde(default)]
    pub mode: String,
}

impl PreloadEntry {
    #[inline]
    pub fn requires_https(&self) -> bool {
        self.mode == FORCE_HTTPS_MODE
    }
}

#[derive(Deserialize)]
struct PreloadList {
    #[serde(default)]
    entries: Vec<PreloadEntry>,
}

/// Parse the preload list text into its entries. Accepts the plain file or
/// its base64-encoded form.
pub fn parse_preload_list(text: &str) -> Result<Vec<PreloadEntry>, CompileError> {
    let text = decode_preload_text(text)?;
    let json = strip_comment_lines(&text);
    let list: PreloadList =
        serde_json::from_str(&json).map_err(|e| CompileError::json(PRELOAD_ORIGIN, e))?;
    Ok(list.entries)
}

/// Undo the base64 wrapping of a `?format=TEXT` download.
///
/// Text that already starts like the plain file (a comment or a JSON object)
/// is returned unchanged.
pub fn decode_preload_text(text: &str) -> Result<Cow<'_, str>, CompileError> {
    let head = text.trim_start();
    if head.is_empty() || head.starts_with('{') || head.starts_with("//") {
        return Ok(Cow::Borrowed(text));
    }

    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|source| CompileError::Base64 {
            origin: PRELOAD_ORIGIN.to_string(),
            source,
        })?;
    let decoded = String::from_utf8(bytes).map_err(|source| CompileError::Utf8 {
        origin: PRELOAD_ORIGIN.to_string(),
        source,
    })?;
    Ok(Cow::Owned(decoded))
}

/// Register every HTTPS-only entry as a simple host.
pub fn build_preload_collection(mut entries: Vec<PreloadEntry>) -> RuleCollection {
    entries.sort_by(|a, b| {
        b.include_subdomains
            .cmp(&a.include_subdomains)
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut collection = RuleCollection::new();
    let mut skipped = 0usize;

    for entry in &entries {
        if !entry.requires_https() {
            skipped += 1;
            continue;
        }
        let tier = MatchTier::from_include_subdomains(entry.include_subdomains);
        collection.add_simple_hosts([entry.name.as_str()], tier);
    }

    let stats = collection.stats();
    log::info!(
        "Preload list: {} exact hosts, {} subdomain hosts ({} entries without {})",
        stats.exact_simple,
        stats.subdomain_simple,
        skipped,
        FORCE_HTTPS_MODE
    );

    collection
}

/// Read and build the preload collection from a local file.
pub fn load_preload_file(path: &Path) -> Result<RuleCollection, CompileError> {
    let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    let entries = parse_preload_list(&text)?;
    Ok(build_preload_collection(entries))
}

fn strip_comment_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        if line.trim_start().starts_with("//") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
