//! Keyword extraction and transcript segment scoring

use crate::types::TranscriptSegment;

/// Maximum number of keywords taken from a question
pub const MAX_KEYWORDS: usize = 8;

/// Maximum number of segments returned by [`find_relevant`]
pub const MAX_RELEVANT_SEGMENTS: usize = 3;

/// Points per keyword occurrence
const OCCURRENCE_WEIGHT: usize = 2;

const STOP_WORDS: &[&str] = &[
    // articles and determiners
    "the", "an", "this", "that", "these", "those", "some", "any",
    // prepositions
    "about", "above", "after", "at", "before", "between", "by", "during", "for", "from", "in",
    "into", "of", "off", "on", "onto", "over", "through", "to", "under", "with", "within",
    "without",
    // wh-words
    "what", "when", "where", "which", "who", "whom", "whose", "why", "how",
    // conjunctions
    "and", "but", "nor", "yet", "because", "although", "while", "than", "then",
    // auxiliaries and pronouns common in questions
    "are", "was", "were", "does", "did", "has", "have", "had", "can", "could", "would",
    "should", "will", "you", "your", "they", "them", "their", "there", "its", "our",
];

/// A segment with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMatch<'a> {
    pub segment: &'a TranscriptSegment,
    pub score: usize,
}

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Lowercase, drop everything but word characters and whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Pull up to [`MAX_KEYWORDS`] content words out of a question, in source order
pub fn extract_keywords(question: &str) -> Vec<String> {
    normalize(question)
        .split_whitespace()
        .filter(|w| w.chars().count() > 2 && !is_stop_word(w))
        .take(MAX_KEYWORDS)
        .map(String::from)
        .collect()
}

/// Score a piece of text against lowercase keywords
pub fn score_text(text: &str, keywords: &[String]) -> usize {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|kw| haystack.matches(kw.as_str()).count() * OCCURRENCE_WEIGHT)
        .sum()
}

/// Score every segment, keep the non-zero ones, highest first (ties keep transcript order)
pub fn score_segments<'a>(
    question: &str,
    segments: &'a [TranscriptSegment],
) -> Vec<SegmentMatch<'a>> {
    let keywords = extract_keywords(question);
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<SegmentMatch<'a>> = segments
        .iter()
        .map(|segment| SegmentMatch {
            segment,
            score: score_text(&segment.text, &keywords),
        })
        .filter(|m| m.score > 0)
        .collect();

    // sort_by is stable
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// The most relevant segments for a question, at most [`MAX_RELEVANT_SEGMENTS`]
pub fn find_relevant(question: &str, segments: &[TranscriptSegment]) -> Vec<TranscriptSegment> {
    score_segments(question, segments)
        .into_iter()
        .take(MAX_RELEVANT_SEGMENTS)
        .map(|m| m.segment.clone())
        .collect()
}
