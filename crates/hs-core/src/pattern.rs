//! Compiled rule patterns
//!
//! Patterns are compiled once, when the owning rule is constructed, and the
//! compiled form is immutable afterwards so it can be shared by any number of
//! concurrent rewrites.
//!
//! Matching is bounded by [`MATCH_TIMEOUT`]. Patterns made only of constructs
//! the linear-time engine supports run inline and cannot exceed it. Patterns
//! that need the backtracking engine (lookaround, backreferences, atomic
//! groups) run on a worker thread that the caller waits on for at most
//! [`MATCH_TIMEOUT`]; an expired wait, like an exceeded
//! [`MATCH_BACKTRACK_LIMIT`], counts as "no match".

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use fancy_regex::{Expr, Regex, RegexBuilder};

/// Wall-clock bound on a single `is_match` or `replace_all` call.
pub const MATCH_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on backtracking steps for a single match attempt.
pub const MATCH_BACKTRACK_LIMIT: usize = 1_000_000;

/// Cap on match workers alive at once, abandoned ones included.
const MAX_MATCH_WORKERS: usize = 64;

static MATCH_WORKERS: AtomicUsize = AtomicUsize::new(0);

/// A source pattern together with its compiled form, if compilation succeeded.
#[derive(Debug)]
pub struct CompiledPattern {
    source: String,
    regex: Option<Arc<Regex>>,
    backtracking: bool,
}

impl CompiledPattern {
    /// Compile `source`. Failures are logged here, once, and leave the
    /// pattern uncompiled.
    pub fn compile(source: impl Into<String>) -> Self {
        let source = source.into();
        let regex = match RegexBuilder::new(&source)
            .backtrack_limit(MATCH_BACKTRACK_LIMIT)
            .build()
        {
            Ok(regex) => Some(Arc::new(regex)),
            Err(err) => {
                log::warn!("Failed to compile pattern '{}': {}", source, err);
                None
            }
        };
        let backtracking = regex.is_some() && needs_backtracking(&source);
        Self {
            source,
            regex,
            backtracking,
        }
    }

    /// The pattern as written in the rule source.
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether compilation succeeded.
    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.regex.is_some()
    }

    /// Whether matching runs on the backtracking engine under a deadline.
    #[inline]
    pub fn is_backtracking(&self) -> bool {
        self.backtracking
    }

    /// Number of capture groups, including the implicit whole-match group.
    pub fn captures_len(&self) -> usize {
        self.regex.as_deref().map_or(0, Regex::captures_len)
    }

    /// Test the pattern against `text`.
    ///
    /// Returns `None` if the pattern never compiled. An aborted or expired
    /// match counts as no match.
    pub fn is_match(&self, text: &str) -> Option<bool> {
        let regex = self.regex.as_ref()?;
        let found = if self.backtracking {
            self.run_bounded(regex, text, |regex, text| regex.is_match(text))
        } else {
            self.settle(regex.is_match(text))
        };
        Some(found.unwrap_or(false))
    }

    /// Replace every match in `text` using an expansion `template`
    /// (`${N}` group references, `$$` for a literal dollar).
    ///
    /// Returns `None` if the pattern never compiled or matching aborted or
    /// expired.
    pub fn replace_all<'t>(&self, text: &'t str, template: &str) -> Option<Cow<'t, str>> {
        let regex = self.regex.as_ref()?;
        if !self.backtracking {
            return self.settle(regex.try_replacen(text, 0, template));
        }

        let template = template.to_owned();
        self.run_bounded(regex, text, move |regex, text| {
            regex
                .try_replacen(text, 0, template.as_str())
                .map(Cow::into_owned)
        })
        .map(Cow::Owned)
    }

    fn settle<T>(&self, result: fancy_regex::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log::debug!("Pattern '{}' aborted: {}", self.source, err);
                None
            }
        }
    }

    /// Run `op` on a worker thread and wait at most [`MATCH_TIMEOUT`].
    ///
    /// A worker that misses the deadline is abandoned; it stops on its own
    /// once the backtrack limit or the input runs out.
    fn run_bounded<T, F>(&self, regex: &Arc<Regex>, text: &str, op: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&Regex, &str) -> fancy_regex::Result<T> + Send + 'static,
    {
        let slot = WorkerSlot::acquire().or_else(|| {
            log::warn!(
                "Pattern '{}' skipped: {} match workers still running",
                self.source,
                MAX_MATCH_WORKERS
            );
            None
        })?;

        let regex = Arc::clone(regex);
        let text = text.to_owned();
        let (tx, rx) = mpsc::sync_channel(1);
        let spawned = thread::Builder::new()
            .name("hs-match".to_string())
            .spawn(move || {
                let result = op(&regex, &text);
                drop(slot);
                let _ = tx.send(result);
            });
        if let Err(err) = spawned {
            log::warn!("Failed to start match worker for '{}': {}", self.source, err);
            return None;
        }

        match rx.recv_timeout(MATCH_TIMEOUT) {
            Ok(result) => self.settle(result),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Pattern '{}' exceeded {:?}, treating as no match",
                    self.source,
                    MATCH_TIMEOUT
                );
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Match worker for '{}' exited without a result", self.source);
                None
            }
        }
    }
}

/// One counted place in [`MATCH_WORKERS`], released on drop.
struct WorkerSlot;

impl WorkerSlot {
    fn acquire() -> Option<Self> {
        let previous = MATCH_WORKERS.fetch_add(1, Ordering::AcqRel);
        if previous >= MAX_MATCH_WORKERS {
            MATCH_WORKERS.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(WorkerSlot)
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        MATCH_WORKERS.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Whether `source` uses a construct only the backtracking engine handles.
fn needs_backtracking(source: &str) -> bool {
    match Expr::parse_tree(source) {
        Ok(tree) => expr_needs_backtracking(&tree.expr),
        Err(_) => true,
    }
}

fn expr_needs_backtracking(expr: &Expr) -> bool {
    match expr {
        Expr::LookAround(..)
        | Expr::Backref(_)
        | Expr::AtomicGroup(_)
        | Expr::KeepOut
        | Expr::ContinueFromPreviousMatchEnd
        | Expr::BackrefExistsCondition(_)
        | Expr::Conditional { .. } => true,
        Expr::Concat(children) | Expr::Alt(children) => {
            children.iter().any(expr_needs_backtracking)
        }
        Expr::Group(child) => expr_needs_backtracking(child),
        Expr::Repeat { child, .. } => expr_needs_backtracking(child),
        _ => false,
    }
}
