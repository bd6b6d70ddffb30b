//! httpsify Rule Compiler
//!
//! This crate loads the HSTS preload list and the HTTPS Everywhere rulesets
//! and assembles them into a single `hs_core::RuleCollection`.

pub mod assemble;
pub mod error;
pub mod hsts;
pub mod rulesets;

pub use assemble::{assemble, LoadOptions, Precedence};
pub use error::CompileError;
pub use hsts::{
    build_preload_collection, decode_preload_text, load_preload_file, parse_preload_list,
    PreloadEntry, DEFAULT_PRELOAD_URL,
};
pub use rulesets::{
    load_rulesets, parse_rulesets, parse_xml_ruleset, RuleSource, RulesetFiles, RulesetSource,
};
