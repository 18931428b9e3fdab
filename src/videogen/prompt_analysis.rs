use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::types::{KeywordCount, PromptAnalysis};

const TOP_KEYWORDS: usize = 5;
const MIN_KEYWORD_CHARS: usize = 3;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+(?:'[a-z]+)?").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "and", "with", "for", "from", "into", "onto", "over", "under", "that", "this",
        "these", "those", "there", "their", "its", "are", "was", "were", "has", "have", "had",
        "but", "not", "all", "any", "some", "very", "just", "then", "than", "while", "where",
        "when", "which", "who", "whom", "what", "out", "off", "through", "about", "above",
        "below", "between", "each", "few", "more", "most", "other", "such", "own", "same",
        "can", "will", "should", "would", "could", "his", "her", "hers", "him", "she", "they",
        "them", "our", "your", "you", "video", "scene", "shot",
    ]
    .into_iter()
    .collect()
});

/// Cosmetic keyword summary shown while a video is being generated. Has no
/// influence on what is sent to the provider.
pub fn analyze_prompt(prompt: &str) -> PromptAnalysis {
    let lowered = prompt.to_lowercase();
    let words: Vec<&str> = WORD.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &word in &words {
        if word.chars().count() >= MIN_KEYWORD_CHARS && !STOP_WORDS.contains(word) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut keywords: Vec<KeywordCount> = counts
        .into_iter()
        .map(|(word, count)| KeywordCount {
            word: word.to_string(),
            count,
        })
        .collect();
    keywords.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    keywords.truncate(TOP_KEYWORDS);

    PromptAnalysis {
        word_count: words.len(),
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_ranked_by_frequency_then_alphabetically() {
        let analysis = analyze_prompt(
            "Neon rain falls on a neon city; the city glows while rain drips. A cat watches.",
        );

        let ranked: Vec<(&str, usize)> = analysis
            .keywords
            .iter()
            .map(|k| (k.word.as_str(), k.count))
            .collect();
        assert_eq!(
            ranked,
            vec![("city", 2), ("neon", 2), ("rain", 2), ("cat", 1), ("drips", 1)]
        );
        assert_eq!(analysis.word_count, 16);
    }

    #[test]
    fn test_stop_words_and_short_words_ignored() {
        let analysis = analyze_prompt("The ox and the owl, in a video of the sea");
        let words: Vec<&str> = analysis.keywords.iter().map(|k| k.word.as_str()).collect();
        assert_eq!(words, vec!["owl", "sea"]);
    }

    #[test]
    fn test_empty_prompt() {
        let analysis = analyze_prompt("  ");
        assert_eq!(analysis.word_count, 0);
        assert!(analysis.keywords.is_empty());
    }
}
