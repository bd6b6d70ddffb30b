//! Rule Collection
//!
//! Hostname-indexed rules, split two ways: by tier (exact host vs. host plus
//! all subdomains) and by kind (simple scheme upgrade vs. custom rule). This
//! is the hot path - every rewrite goes through [`RuleCollection::rewrite`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::rule::Rule;
use crate::ruleset::Ruleset;
use crate::types::{MatchTier, RewriteResult};
use crate::url::{canonicalize_host, host_suffixes, label_count, split_http_url, truncate_to_labels};

// =============================================================================
// Rule Collection
// =============================================================================

/// The rule index.
///
/// Built single-threaded, then shared read-only. A hostname lives in at most
/// one index per tier; re-registering it in the same tier replaces the
/// previous entry.
#[derive(Debug, Default, Clone)]
pub struct RuleCollection {
    exact_custom: HashMap<String, Arc<Rule>>,
    subdomain_custom: HashMap<String, Arc<Rule>>,
    exact_simple: HashSet<String>,
    subdomain_simple: HashSet<String>,
    max_label_depth: usize,
}

/// Entry counts per index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub exact_simple: usize,
    pub subdomain_simple: usize,
    pub exact_custom: usize,
    pub subdomain_custom: usize,
    pub max_label_depth: usize,
}

impl RuleCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register `rule` for `host`.
    ///
    /// [`Rule::StandardUpgrade`] goes to the simple index of the tier, any
    /// other rule to the custom index.
    pub fn add_rule(&mut self, host: &str, rule: impl Into<Arc<Rule>>, tier: MatchTier) {
        let host = match registrable_host(host) {
            Some(host) => host,
            None => return,
        };
        let rule = rule.into();
        if rule.is_standard() {
            self.insert_simple(host, tier);
        } else {
            self.insert_custom(host, rule, tier);
        }
    }

    /// Register a ruleset's rule under all of its targets.
    pub fn add_ruleset(&mut self, ruleset: Ruleset) {
        for host in &ruleset.exact_targets {
            self.add_rule(host, Arc::clone(&ruleset.rule), MatchTier::Exact);
        }
        for host in &ruleset.subdomain_targets {
            self.add_rule(host, Arc::clone(&ruleset.rule), MatchTier::IncludeSubdomains);
        }
    }

    /// Register hosts that only need the scheme upgrade.
    pub fn add_simple_hosts<I, S>(&mut self, hosts: I, tier: MatchTier)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for host in hosts {
            if let Some(host) = registrable_host(host.as_ref()) {
                self.insert_simple(host, tier);
            }
        }
    }

    /// Copy every entry of `other` into this collection.
    ///
    /// Entries from `other` replace colliding entries here, so merge order
    /// decides which source wins for a host present in both.
    pub fn merge(&mut self, other: &RuleCollection) {
        for (host, rule) in &other.exact_custom {
            self.exact_simple.remove(host);
            self.exact_custom.insert(host.clone(), Arc::clone(rule));
        }
        for (host, rule) in &other.subdomain_custom {
            self.subdomain_simple.remove(host);
            self.subdomain_custom.insert(host.clone(), Arc::clone(rule));
        }
        for host in &other.exact_simple {
            self.exact_custom.remove(host);
            self.exact_simple.insert(host.clone());
        }
        for host in &other.subdomain_simple {
            self.subdomain_custom.remove(host);
            self.subdomain_simple.insert(host.clone());
        }
        self.max_label_depth = self.max_label_depth.max(other.max_label_depth);
    }

    fn insert_simple(&mut self, host: String, tier: MatchTier) {
        self.observe_depth(&host);
        match tier {
            MatchTier::Exact => {
                self.exact_custom.remove(&host);
                self.exact_simple.insert(host);
            }
            MatchTier::IncludeSubdomains => {
                self.subdomain_custom.remove(&host);
                self.subdomain_simple.insert(host);
            }
        }
    }

    fn insert_custom(&mut self, host: String, rule: Arc<Rule>, tier: MatchTier) {
        self.observe_depth(&host);
        match tier {
            MatchTier::Exact => {
                self.exact_simple.remove(&host);
                self.exact_custom.insert(host, rule);
            }
            MatchTier::IncludeSubdomains => {
                self.subdomain_simple.remove(&host);
                self.subdomain_custom.insert(host, rule);
            }
        }
    }

    #[inline]
    fn observe_depth(&mut self, host: &str) {
        self.max_label_depth = self.max_label_depth.max(label_count(host));
    }

    // -------------------------------------------------------------------------
    // Rewriting
    // -------------------------------------------------------------------------

    /// Rewrite `url` using the most specific applicable rule.
    ///
    /// Only `http://` URLs are considered. Exact registrations take priority
    /// over subdomain registrations regardless of depth; among subdomain
    /// registrations the longest registered suffix of the host wins.
    pub fn rewrite<'a>(&self, url: &'a str) -> RewriteResult<'a> {
        let parts = match split_http_url(url) {
            Some(parts) => parts,
            None => return RewriteResult::unmatched(url),
        };
        let host = match canonicalize_host(parts.host) {
            Some(host) => host,
            None => return RewriteResult::unmatched(url),
        };

        // No registered host has more labels than max_label_depth.
        let mut candidate = host.as_str();
        if label_count(candidate) > self.max_label_depth {
            candidate = truncate_to_labels(candidate, self.max_label_depth + 1);
        }

        if let Some(result) = self.apply(candidate, MatchTier::Exact, url) {
            return result;
        }

        for suffix in host_suffixes(candidate) {
            if let Some(result) = self.apply(suffix, MatchTier::IncludeSubdomains, url) {
                return result;
            }
        }

        RewriteResult::unmatched(url)
    }

    #[inline]
    fn apply<'a>(&self, host: &str, tier: MatchTier, url: &'a str) -> Option<RewriteResult<'a>> {
        let (simple, custom) = match tier {
            MatchTier::Exact => (&self.exact_simple, &self.exact_custom),
            MatchTier::IncludeSubdomains => (&self.subdomain_simple, &self.subdomain_custom),
        };
        if simple.contains(host) {
            return Some(Rule::StandardUpgrade.rewrite(url));
        }
        custom.get(host).map(|rule| rule.rewrite(url))
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// Hosts registered for the exact-match scheme upgrade, sorted.
    pub fn simple_hosts(&self) -> Vec<&str> {
        sorted(self.exact_simple.iter().map(String::as_str))
    }

    /// Hosts registered for the scheme upgrade including subdomains, sorted.
    pub fn simple_subdomain_hosts(&self) -> Vec<&str> {
        sorted(self.subdomain_simple.iter().map(String::as_str))
    }

    /// Hosts with an exact-match custom rule, sorted.
    pub fn custom_hosts(&self) -> Vec<&str> {
        sorted(self.exact_custom.keys().map(String::as_str))
    }

    /// Hosts with a custom rule covering subdomains, sorted.
    pub fn custom_subdomain_hosts(&self) -> Vec<&str> {
        sorted(self.subdomain_custom.keys().map(String::as_str))
    }

    /// Largest label count among registered hosts.
    #[inline]
    pub fn max_label_depth(&self) -> usize {
        self.max_label_depth
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            exact_simple: self.exact_simple.len(),
            subdomain_simple: self.subdomain_simple.len(),
            exact_custom: self.exact_custom.len(),
            subdomain_custom: self.subdomain_custom.len(),
            max_label_depth: self.max_label_depth,
        }
    }

    /// Total number of registrations across all indices.
    pub fn len(&self) -> usize {
        self.exact_simple.len()
            + self.subdomain_simple.len()
            + self.exact_custom.len()
            + self.subdomain_custom.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn registrable_host(host: &str) -> Option<String> {
    let canonical = canonicalize_host(host);
    if canonical.is_none() {
        log::warn!("Skipping unregistrable host '{}'", host);
    }
    canonical
}

fn sorted<'a>(hosts: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut hosts: Vec<&str> = hosts.collect();
    hosts.sort_unstable();
    hosts
}
