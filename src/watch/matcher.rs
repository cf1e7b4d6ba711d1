// src/watch/matcher.rs

//! Path matchers.
//!
//! A [`Matcher`] decides whether a normalized change path is relevant to a
//! command. Besides per-path matching it can answer a static question used to
//! prune watch scope: "can any path that starts with this prefix ever match?"

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use regex_syntax::hir::{Hir, HirKind, Look};
use tracing::debug;

use crate::errors::Result;

/// Decides whether a path matches.
pub trait Matcher: Send + Sync + fmt::Debug + fmt::Display {
    /// Returns whether a path matches.
    fn matches(&self, path: &str) -> bool;

    /// Returns whether no path with this prefix can match.
    ///
    /// False negatives are allowed, false positives are not.
    fn exclude_prefix(&self, prefix: &str) -> bool;
}

/// Regex-backed matcher with an optional inverse mode.
pub struct RegexMatcher {
    regex: Regex,
    inverse: bool,
    /// True when the pattern contains none of `$`, `\z`, `\b` (or any other
    /// end/word look-around). Computed on first use.
    anchor_free: OnceLock<bool>,
}

impl RegexMatcher {
    /// Compile `pattern`. Compile errors surface here and never at match time.
    pub fn new(pattern: &str, inverse: bool) -> Result<Self> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            regex,
            inverse,
            anchor_free: OnceLock::new(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_inverse(&self) -> bool {
        self.inverse
    }

    /// Whether the anchor analysis has already run for this matcher.
    pub fn anchor_analysis_done(&self) -> bool {
        self.anchor_free.get().is_some()
    }

    fn anchor_free(&self) -> bool {
        *self.anchor_free.get_or_init(|| {
            let verdict = pattern_is_anchor_free(self.regex.as_str());
            debug!(
                pattern = %self.regex.as_str(),
                anchor_free = verdict,
                "computed prefix-exclusion verdict"
            );
            verdict
        })
    }
}

impl Matcher for RegexMatcher {
    fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path) != self.inverse
    }

    /// Given a pattern `r` and a prefix `p` that `r` accepts, is there any
    /// string starting with `p` that `r` rejects? Once a regular language
    /// has accepted a prefix, more input can only change that through a
    /// zero-width assertion looking at what follows: end of line, end of
    /// text, or a word boundary. An inverse matcher whose pattern has none of
    /// those can therefore never match anything under `p`.
    fn exclude_prefix(&self, prefix: &str) -> bool {
        if !self.inverse {
            return false;
        }
        if self.regex.as_str().is_empty() || !self.regex.is_match(prefix) {
            return false;
        }
        self.anchor_free()
    }
}

impl fmt::Debug for RegexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegexMatcher")
            .field("pattern", &self.regex.as_str())
            .field("inverse", &self.inverse)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RegexMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.inverse { "Inverted regex" } else { "Regex" };
        write!(f, "{kind} match: {:?}", self.regex.as_str())
    }
}

/// Walk the parsed syntax tree looking for end-of-line, end-of-text, and
/// word-boundary assertions. Start anchors are harmless: they constrain the
/// prefix, not what follows it.
///
/// Every other look-around counts as an anchor, including `\B`, `\<` and
/// `\>`. Some of those could never make a longer path stop matching, but
/// telling them apart is not worth the risk of pruning a live directory.
fn pattern_is_anchor_free(pattern: &str) -> bool {
    let hir = match regex_syntax::parse(pattern) {
        Ok(hir) => hir,
        // The pattern already compiled, so this should not happen; refusing
        // to exclude is always sound.
        Err(_) => return false,
    };

    let mut stack: Vec<&Hir> = vec![&hir];
    while let Some(cur) = stack.pop() {
        match cur.kind() {
            HirKind::Look(look) => {
                if !matches!(look, Look::Start | Look::StartLF | Look::StartCRLF) {
                    return false;
                }
            }
            HirKind::Repetition(rep) => stack.push(&rep.sub),
            HirKind::Capture(cap) => stack.push(&cap.sub),
            HirKind::Concat(subs) | HirKind::Alternation(subs) => stack.extend(subs.iter()),
            // Empty, literals, and classes consume input or nothing at all.
            _ => {}
        }
    }

    true
}
