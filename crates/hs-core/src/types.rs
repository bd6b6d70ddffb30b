//! Core type definitions for httpsify
//!
//! These types are shared by the rule evaluator and the rule collection.

use std::borrow::Cow;

// =============================================================================
// Match Tier
// =============================================================================

/// Which hostnames a registration covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchTier {
    /// Only the registered hostname itself
    Exact,
    /// The registered hostname and every subdomain below it
    IncludeSubdomains,
}

impl MatchTier {
    /// Map a preload-style `include_subdomains` flag to a tier.
    #[inline]
    pub fn from_include_subdomains(include_subdomains: bool) -> Self {
        if include_subdomains {
            Self::IncludeSubdomains
        } else {
            Self::Exact
        }
    }
}

// =============================================================================
// Rewrite Result
// =============================================================================

/// Result of attempting a rewrite.
///
/// `matched` reports whether a rule fired, which is not the same as whether
/// the URL changed: an exclusion fires without changing anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult<'a> {
    /// The rewritten URL, or the input when nothing was rewritten
    pub url: Cow<'a, str>,
    /// Whether a rule fired
    pub matched: bool,
}

impl<'a> RewriteResult<'a> {
    /// No rule fired; the input is returned as-is.
    #[inline]
    pub fn unmatched(url: &'a str) -> Self {
        Self {
            url: Cow::Borrowed(url),
            matched: false,
        }
    }

    /// A rule fired without changing the URL (exclusion veto).
    #[inline]
    pub fn vetoed(url: &'a str) -> Self {
        Self {
            url: Cow::Borrowed(url),
            matched: true,
        }
    }

    /// A rule fired and produced a new URL.
    #[inline]
    pub fn rewritten(url: String) -> Self {
        Self {
            url: Cow::Owned(url),
            matched: true,
        }
    }

    /// Detach the result from the input URL's lifetime.
    pub fn into_owned(self) -> RewriteResult<'static> {
        RewriteResult {
            url: Cow::Owned(self.url.into_owned()),
            matched: self.matched,
        }
    }

    /// Split into `(url, matched)`.
    pub fn into_parts(self) -> (String, bool) {
        (self.url.into_owned(), self.matched)
    }
}
