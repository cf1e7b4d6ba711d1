use std::sync::Arc;

use reflex::errors::ReflexError;
use reflex::watch::{Matcher, RegexMatcher};

#[test]
fn go_suffix_matches_source_but_not_backup() {
    let m = RegexMatcher::new(r"\.go$", false).unwrap();
    assert!(m.matches("main.go"));
    assert!(!m.matches("main.go.bak"));
}

#[test]
fn inverse_flips_every_answer() {
    let m = RegexMatcher::new(r"\.go$", true).unwrap();
    assert!(!m.matches("main.go"));
    assert!(m.matches("main.go.bak"));
    assert!(m.matches("README.md"));
}

#[test]
fn bad_pattern_fails_at_construction() {
    let err = RegexMatcher::new("(unclosed", false).unwrap_err();
    assert!(matches!(err, ReflexError::InvalidPattern(_)));
}

#[test]
fn non_inverse_matcher_never_excludes() {
    let m = RegexMatcher::new("^vendor/", false).unwrap();
    assert!(!m.exclude_prefix("vendor/"));
    assert!(!m.exclude_prefix("src/"));
}

#[test]
fn inverse_anchor_free_pattern_excludes_matching_prefix() {
    let m = RegexMatcher::new("^node_modules/", true).unwrap();
    assert!(m.exclude_prefix("node_modules/"));
    assert!(m.exclude_prefix("node_modules/left-pad/"));
}

#[test]
fn prefix_that_does_not_match_is_not_excluded() {
    let m = RegexMatcher::new("^node_modules/", true).unwrap();
    assert!(!m.exclude_prefix("src/"));
}

#[test]
fn end_anchors_and_word_boundaries_disable_exclusion() {
    for pattern in [r"^build/$", r"^build/.*\.o$", r"^build/\z", r"\bbuild/", r"build/(?m:$)"] {
        let m = RegexMatcher::new(pattern, true).unwrap();
        assert!(!m.exclude_prefix("build/"), "pattern {pattern:?} must not exclude");
    }
}

#[test]
fn every_non_start_assertion_disables_exclusion() {
    // `-\B` can only fail by what follows the prefix, but it is still
    // treated like an end anchor.
    for pattern in [r"^build-\B", r"\<build/", r"build\>", r"\b{end}build/"] {
        let m = RegexMatcher::new(pattern, true).unwrap();
        assert!(!m.exclude_prefix("build-/"), "pattern {pattern:?} must not exclude");
        assert!(!m.exclude_prefix("build/"), "pattern {pattern:?} must not exclude");
    }
}

#[test]
fn start_anchor_alone_keeps_exclusion_sound() {
    let m = RegexMatcher::new(r"(?m)^\.git/", true).unwrap();
    assert!(m.exclude_prefix(".git/"));
    assert!(m.exclude_prefix(".git/objects/"));
}

#[test]
fn empty_pattern_never_excludes() {
    let m = RegexMatcher::new("", true).unwrap();
    assert!(!m.exclude_prefix("anything/"));
}

#[test]
fn anchor_analysis_runs_lazily_and_once() {
    let m = RegexMatcher::new("^target/", true).unwrap();
    assert!(!m.anchor_analysis_done());

    // Prefix does not match: no analysis needed yet.
    assert!(!m.exclude_prefix("src/"));
    assert!(!m.anchor_analysis_done());

    assert!(m.exclude_prefix("target/"));
    assert!(m.anchor_analysis_done());

    // Cached verdict is reused, the prefix check still applies.
    assert!(m.exclude_prefix("target/debug/"));
    assert!(!m.exclude_prefix("docs/"));
}

#[test]
fn concurrent_exclusion_queries_agree() {
    let m: Arc<RegexMatcher> = Arc::new(RegexMatcher::new("^tmp/", true).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let m = Arc::clone(&m);
            std::thread::spawn(move || m.exclude_prefix(&format!("tmp/{i}/")))
        })
        .collect();

    for h in handles {
        assert!(h.join().unwrap());
    }
    assert!(m.anchor_analysis_done());
}

#[test]
fn display_describes_the_matcher() {
    let m = RegexMatcher::new(r"\.rs$", false).unwrap();
    assert_eq!(m.to_string(), r#"Regex match: "\\.rs$""#);

    let m = RegexMatcher::new("^target/", true).unwrap();
    assert_eq!(m.to_string(), r#"Inverted regex match: "^target/""#);
}
