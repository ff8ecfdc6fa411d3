//! Narrow pattern support: `[A-Z]`, `[a-z]` and `[0-9]`, optionally followed
//! by `{n}`. Everything else is copied literally.

use std::sync::LazyLock;

use rand::{Rng, RngCore};
use regex::{Captures, Regex};

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const MAX_REPEAT: usize = 10_000;
const REGEX_SYNTAX: &[char] = &['[', ']', '(', ')', '{', '}', '*', '+', '?', '|', '\\', '^', '$'];

static TOKEN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[(A-Z|a-z|0-9)\](?:\{(\d+)\})?").ok());

/// Result of expanding a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternOutput {
    pub value: String,
    /// The literal remainder still contains regex syntax that was not expanded.
    pub passthrough: bool,
}

/// Replace every supported token with fresh random characters.
///
/// Returns `None` when the pattern cannot be expanded at all (token regex
/// unavailable or a repeat count above the supported maximum).
pub fn generate_pattern(pattern: &str, rng: &mut dyn RngCore) -> Option<PatternOutput> {
    let token = TOKEN.as_ref()?;

    for caps in token.captures_iter(pattern) {
        if let Some(count) = caps.get(2) {
            let count: usize = count.as_str().parse().ok()?;
            if count > MAX_REPEAT {
                return None;
            }
        }
    }

    let passthrough = token
        .split(pattern)
        .any(|literal| literal.contains(REGEX_SYNTAX));

    let value = token
        .replace_all(pattern, |caps: &Captures<'_>| {
            let alphabet = match caps.get(1).map(|class| class.as_str()) {
                Some("A-Z") => UPPER,
                Some("a-z") => LOWER,
                _ => DIGITS,
            };
            let count = caps
                .get(2)
                .and_then(|count| count.as_str().parse::<usize>().ok())
                .unwrap_or(1);
            (0..count)
                .map(|_| char::from(alphabet[rng.random_range(0..alphabet.len())]))
                .collect::<String>()
        })
        .into_owned();

    Some(PatternOutput { value, passthrough })
}
