use proptest::prelude::*;
use reflex::watch::{Matcher, RegexMatcher};

/// Anchor-free patterns, each with a prefix it accepts.
const ANCHOR_FREE: &[(&str, &str)] = &[
    ("^node_modules/", "node_modules/"),
    ("^\\.git/", ".git/"),
    ("[a-z]+/", "src/"),
    ("(test|spec)s?/", "tests/"),
    ("^src/[a-z]*", "src/"),
    ("tmp", "build/tmp"),
];

const ANCHORED: &[&str] = &["^src/$", "\\.go$", "\\bsrc/", "^a\\z", "(?m)lib/$"];

fn path_chars() -> impl Strategy<Value = String> {
    "[a-z./_]{0,16}"
}

proptest! {
    /// Whatever an inverse, anchor-free matcher excludes really can never
    /// match: every extension of the prefix is still accepted by the
    /// pattern, so the inverse rejects it.
    #[test]
    fn excluded_prefixes_never_match_any_extension(
        idx in 0..ANCHOR_FREE.len(),
        head in path_chars(),
        suffix in path_chars(),
    ) {
        let (pattern, seed) = ANCHOR_FREE[idx];
        let m = RegexMatcher::new(pattern, true).unwrap();
        let prefix = format!("{seed}{head}");

        prop_assert!(m.exclude_prefix(&prefix));
        let extended = format!("{prefix}{suffix}");
        prop_assert!(!m.matches(&extended));
    }

    #[test]
    fn anchored_patterns_never_exclude(
        idx in 0..ANCHORED.len(),
        prefix in path_chars(),
        inverse in any::<bool>(),
    ) {
        let m = RegexMatcher::new(ANCHORED[idx], inverse).unwrap();
        prop_assert!(!m.exclude_prefix(&prefix));
    }

    #[test]
    fn anchored_patterns_never_exclude_their_own_matches(idx in 0..ANCHORED.len()) {
        let examples = ["src/", "main.go", "src/x", "a", "lib/"];
        let m = RegexMatcher::new(ANCHORED[idx], true).unwrap();
        for example in examples {
            prop_assert!(!m.exclude_prefix(example));
        }
    }
}
