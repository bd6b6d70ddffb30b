//! Rulesets: one combined rule and the hosts it applies to

use std::sync::Arc;

use crate::rule::Rule;

/// Prefix marking a target that covers all subdomains.
const SUBDOMAIN_TARGET_PREFIX: &str = "*.";

/// A combined rule with its exact and subdomain targets.
#[derive(Debug, Clone)]
pub struct Ruleset {
    /// Hosts matched exactly
    pub exact_targets: Vec<String>,
    /// Hosts matched together with all their subdomains (prefix stripped)
    pub subdomain_targets: Vec<String>,
    /// Rule applied to every target
    pub rule: Arc<Rule>,
}

impl Ruleset {
    /// Split declared targets into exact and subdomain targets.
    ///
    /// `*.example.com` becomes the subdomain target `example.com`; every
    /// other target is exact. Declaration order is kept within each group.
    pub fn new<I, S>(targets: I, rule: Rule) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exact_targets = Vec::new();
        let mut subdomain_targets = Vec::new();

        for target in targets {
            let target = target.as_ref();
            match target.strip_prefix(SUBDOMAIN_TARGET_PREFIX) {
                Some(host) => subdomain_targets.push(host.to_string()),
                None => exact_targets.push(target.to_string()),
            }
        }

        Self {
            exact_targets,
            subdomain_targets,
            rule: Arc::new(rule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_targets() {
        let ruleset = Ruleset::new(
            ["example.com", "*.example.org", "www.example.com", "*.cdn.example.net"],
            Rule::StandardUpgrade,
        );
        assert_eq!(ruleset.exact_targets, ["example.com", "www.example.com"]);
        assert_eq!(ruleset.subdomain_targets, ["example.org", "cdn.example.net"]);
        assert!(ruleset.rule.is_standard());
    }

    #[test]
    fn test_no_targets() {
        let ruleset = Ruleset::new(Vec::<String>::new(), Rule::StandardUpgrade);
        assert!(ruleset.exact_targets.is_empty());
        assert!(ruleset.subdomain_targets.is_empty());
    }
}
