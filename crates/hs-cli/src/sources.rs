use std::fs;
use std::path::Path;
use std::time::Duration;

use hs_compiler::{assemble, build_preload_collection, load_rulesets, parse_preload_list, LoadOptions};
use hs_core::RuleCollection;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Load both sources and assemble them. Fails if neither is given.
pub fn build_collection(
    rulesets: Option<&str>,
    preload: Option<&str>,
    options: &LoadOptions,
) -> Result<RuleCollection, String> {
    if rulesets.is_none() && preload.is_none() {
        return Err("No sources specified (use --rulesets and/or --preload)".to_string());
    }

    let rulesets = match rulesets {
        Some(path) => {
            log::info!("Loading rulesets from '{}'", path);
            Some(load_rulesets(Path::new(path), options).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let preload = match preload {
        Some(source) => {
            log::info!("Loading preload list from '{}'", source);
            let text = read_source(source)?;
            let entries = parse_preload_list(&text).map_err(|e| e.to_string())?;
            Some(build_preload_collection(entries))
        }
        None => None,
    };

    Ok(assemble(rulesets, preload, options))
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Read a local file, or fetch an http(s) URL.
fn read_source(source: &str) -> Result<String, String> {
    if !is_remote(source) {
        return fs::read_to_string(source).map_err(|e| format!("Failed to read '{}': {}", source, e));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {}", e))?;
    runtime
        .block_on(fetch_text(source))
        .map_err(|e| format!("Failed to fetch '{}': {}", source, e))
}

async fn fetch_text(url: &str) -> Result<String, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    response.text().await
}
