//! httpsify Core Library
//!
//! This crate provides the rule matching and rewrite engine that upgrades
//! plaintext `http://` URLs to their `https://` equivalents.
//!
//! # Architecture
//!
//! Rules come from two merged sources: a preload list of hosts that require
//! HTTPS (optionally including all subdomains) and a corpus of host-specific
//! rewrite rulesets. Both are registered into a single [`RuleCollection`],
//! which is built once and then shared read-only across any number of
//! concurrent [`RuleCollection::rewrite`] calls.
//!
//! # Modules
//!
//! - `url`: `http://` URL splitting and hostname canonicalization
//! - `pattern`: Eagerly compiled, backtrack-bounded regular expressions
//! - `rule`: Rule variants and their evaluation semantics
//! - `ruleset`: Target lists paired with one combined rule
//! - `collection`: Hostname-indexed rule collection and lookup
//! - `store`: Refreshable shared handle over a built collection
//! - `types`: Shared type definitions

pub mod collection;
pub mod pattern;
pub mod rule;
pub mod ruleset;
pub mod store;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use collection::{CollectionStats, RuleCollection};
pub use rule::{Exclusion, RegexRewrite, Rule};
pub use ruleset::Ruleset;
pub use store::RuleStore;
pub use types::{MatchTier, RewriteResult};
