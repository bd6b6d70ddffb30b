//! Rule variants and evaluation
//!
//! Every rule answers one question: given a URL, does it fire, and if so what
//! is the resulting URL. Exclusions fire without rewriting, which is how a
//! rule list lets an exclusion veto the rewrites placed after it.

use crate::pattern::CompiledPattern;
use crate::types::RewriteResult;

/// Scheme prefix replaced by [`Rule::StandardUpgrade`].
const HTTP_SCHEME: &str = "http:";
const HTTPS_SCHEME: &str = "https:";

// =============================================================================
// Rule
// =============================================================================

/// A single rewrite strategy.
#[derive(Debug)]
pub enum Rule {
    /// Replace a leading `http:` with `https:`
    StandardUpgrade,
    /// Regex match with template replacement
    RegexRewrite(RegexRewrite),
    /// Veto: fires on match without rewriting
    Exclusion(Exclusion),
    /// Ordered rules; the first one that fires wins
    List(Vec<Rule>),
}

impl Rule {
    /// Attempt to rewrite `url`.
    pub fn rewrite<'a>(&self, url: &'a str) -> RewriteResult<'a> {
        match self {
            Rule::StandardUpgrade => standard_upgrade(url),
            Rule::RegexRewrite(rule) => rule.rewrite(url),
            Rule::Exclusion(rule) => rule.rewrite(url),
            Rule::List(rules) => {
                for rule in rules {
                    let result = rule.rewrite(url);
                    if result.matched {
                        return result;
                    }
                }
                RewriteResult::unmatched(url)
            }
        }
    }

    /// Build the combined rule of a ruleset.
    ///
    /// Exclusions come first, then rewrites, each group in source order. A
    /// single resulting rule is returned unwrapped.
    pub fn combine<E, R>(exclusions: E, rewrites: R) -> Rule
    where
        E: IntoIterator<Item = Exclusion>,
        R: IntoIterator<Item = Rule>,
    {
        let mut rules: Vec<Rule> = exclusions.into_iter().map(Rule::Exclusion).collect();
        rules.extend(rewrites);

        if rules.len() == 1 {
            if let Some(rule) = rules.pop() {
                return rule;
            }
        }
        Rule::List(rules)
    }

    /// Whether this rule is the plain scheme upgrade.
    #[inline]
    pub fn is_standard(&self) -> bool {
        matches!(self, Rule::StandardUpgrade)
    }
}

impl From<RegexRewrite> for Rule {
    fn from(rule: RegexRewrite) -> Self {
        Rule::RegexRewrite(rule)
    }
}

impl From<Exclusion> for Rule {
    fn from(rule: Exclusion) -> Self {
        Rule::Exclusion(rule)
    }
}

#[inline]
fn standard_upgrade(url: &str) -> RewriteResult<'_> {
    match url.strip_prefix(HTTP_SCHEME) {
        Some(rest) => {
            let mut out = String::with_capacity(url.len() + 1);
            out.push_str(HTTPS_SCHEME);
            out.push_str(rest);
            RewriteResult::rewritten(out)
        }
        None => RewriteResult::unmatched(url),
    }
}

// =============================================================================
// Regex Rewrite
// =============================================================================

/// Rewrites URLs matching `from` using the `to` template.
///
/// `to` follows the rules corpus convention: `$1`..`$99` name capture groups
/// and `$$` is a literal dollar.
#[derive(Debug)]
pub struct RegexRewrite {
    pattern: CompiledPattern,
    template: String,
    expansion: String,
}

impl RegexRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        let pattern = CompiledPattern::compile(from);
        let template = to.into();
        let expansion = normalize_template(&template, pattern.captures_len());
        Self {
            pattern,
            template,
            expansion,
        }
    }

    /// Source pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    /// Replacement template as written in the rule source.
    pub fn template(&self) -> &str {
        &self.template
    }

    fn rewrite<'a>(&self, url: &'a str) -> RewriteResult<'a> {
        if self.pattern.is_match(url) != Some(true) {
            return RewriteResult::unmatched(url);
        }
        match self.pattern.replace_all(url, &self.expansion) {
            Some(replaced) => RewriteResult::rewritten(replaced.into_owned()),
            None => RewriteResult::unmatched(url),
        }
    }
}

/// Translate a `$N` template into explicit `${N}` group references.
///
/// Two digits name a group only when that group exists; otherwise the first
/// digit is the group and the second is literal text. A reference to a group
/// the pattern lacks stays literal, as does a `$` that does not start a group
/// reference.
fn normalize_template(template: &str, captures_len: usize) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let first = match chars.peek().and_then(|c| c.to_digit(10)) {
            Some(digit) => digit as usize,
            None => {
                if chars.peek() == Some(&'$') {
                    chars.next();
                }
                out.push_str("$$");
                continue;
            }
        };
        chars.next();

        let mut group = first;
        if let Some(second) = chars.peek().and_then(|c| c.to_digit(10)) {
            let two_digit = first * 10 + second as usize;
            if first != 0 && two_digit < captures_len {
                group = two_digit;
                chars.next();
            }
        }

        if group >= captures_len {
            out.push_str("$$");
            out.push_str(&group.to_string());
            continue;
        }

        out.push_str("${");
        out.push_str(&group.to_string());
        out.push('}');
    }

    out
}

// =============================================================================
// Exclusion
// =============================================================================

/// Vetoes any later rule for URLs matching its pattern.
///
/// An exclusion whose pattern failed to compile vetoes every URL: not
/// rewriting is preferred over rewriting past a broken exclusion.
#[derive(Debug)]
pub struct Exclusion {
    pattern: CompiledPattern,
}

impl Exclusion {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: CompiledPattern::compile(pattern),
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.source()
    }

    fn rewrite<'a>(&self, url: &'a str) -> RewriteResult<'a> {
        match self.pattern.is_match(url) {
            Some(false) => RewriteResult::unmatched(url),
            Some(true) | None => RewriteResult::vetoed(url),
        }
    }
}
