//! Assembles the preload list and the rulesets into one collection.

use hs_core::RuleCollection;

/// Which source wins for a host registered by both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precedence {
    /// Preload entries replace ruleset entries
    #[default]
    PreloadWins,
    /// Ruleset entries replace preload entries
    RulesetsWin,
}

/// Options controlling how sources are loaded and combined.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Also load rulesets marked `default_off`
    pub include_disabled: bool,
    pub precedence: Precedence,
}

/// Merge the two source collections. Either may be absent.
pub fn assemble(
    rulesets: Option<RuleCollection>,
    preload: Option<RuleCollection>,
    options: &LoadOptions,
) -> RuleCollection {
    let (base, top) = match options.precedence {
        Precedence::PreloadWins => (rulesets, preload),
        Precedence::RulesetsWin => (preload, rulesets),
    };

    let mut collection = base.unwrap_or_default();
    if let Some(top) = top {
        collection.merge(&top);
    }

    let stats = collection.stats();
    log::info!(
        "Assembled collection: {} simple, {} simple+subdomains, {} custom, {} custom+subdomains (max depth {})",
        stats.exact_simple,
        stats.subdomain_simple,
        stats.exact_custom,
        stats.subdomain_custom,
        stats.max_label_depth
    );

    collection
}
