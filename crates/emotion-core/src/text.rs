//! Text normalisation applied before vectorisation.
//!
//! The same cleaning runs at training time and at inference time, so the
//! vocabulary learned from the corpus lines up with what requests produce.
//!
//! # Steps
//!
//! 1. Lowercase.
//! 2. Drop URLs: `http` followed by at least one non-whitespace character,
//!    up to the next whitespace.
//! 3. Drop every character that is not `a`-`z` or whitespace.
//! 4. Collapse whitespace runs to a single space and trim.

use std::sync::LazyLock;

use regex::Regex;

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+").unwrap());
static NON_LETTER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z\s]").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Normalise free text into lowercase ASCII words separated by single spaces.
///
/// Input: `"I'm SO happy!! https://t.co/x :)"`
/// Output: `"im so happy"`
pub fn normalize_text(s: &str) -> String {
    let lower = s.to_lowercase();
    // URLs go first so their letters don't leak into the word stream.
    let no_urls = URL_REGEX.replace_all(&lower, "");
    let letters = NON_LETTER_REGEX.replace_all(&no_urls, "");
    WHITESPACE_REGEX
        .replace_all(&letters, " ")
        .trim()
        .to_string()
}

/// Split normalised text into word tokens of at least two characters.
///
/// Single-letter words ("i", "a") carry no signal and are skipped, matching
/// the token rule the vectorizer was fitted with.
pub fn tokens(normalized: &str) -> impl Iterator<Item = &str> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2)
}
