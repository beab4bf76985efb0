//! Keyword Matcher — which target phrases a resume does not mention.
//!
//! Matching is case-insensitive. A keyword made only of word characters
//! (alphanumeric or `_`) must appear as a whole word, so "Java" does not match
//! inside "JavaScript". Anything with whitespace or punctuation ("Spring Boot",
//! "C++", "Node.js", "CI/CD") is a plain substring check, because `\b` around
//! punctuation does not mean what a reader expects.

use regex::Regex;

/// Keywords from `keywords` not found in `resume_text`, in input order.
/// Blank keywords are skipped; duplicates are kept.
pub fn find_missing(resume_text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = resume_text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .filter(|k| !contains_phrase(&haystack, k))
        .cloned()
        .collect()
}

/// `haystack` must already be lowercased.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let needle = phrase.trim().to_lowercase();
    if is_single_word(&needle) {
        whole_word(&needle)
            .map(|re| re.is_match(haystack))
            .unwrap_or_else(|| haystack.contains(&needle))
    } else {
        haystack.contains(&needle)
    }
}

fn is_single_word(token: &str) -> bool {
    token.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn whole_word(word: &str) -> Option<Regex> {
    Regex::new(&format!(r"\b{}\b", regex::escape(word))).ok()
}
