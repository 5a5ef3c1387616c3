//! Question classification: video relatedness, answer shape and general topic

use serde::{Deserialize, Serialize};

use crate::chat::matcher::normalize;

/// Phrases that mark a question as being about the video itself
const VIDEO_KEYWORDS: &[&str] = &[
    "video", "transcript", "mentioned", "mention", "discussed", "discuss", "timestamp",
    "speaker", "presenter", "narrator", "talked about", "talk about", "said", "clip",
    "this part", "at the start", "at the end", "in the beginning",
];

/// Shape of answer the question asks for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TopicCategory {
    Summary,
    Explanation,
    Example,
    Process,
    Default,
}

impl TopicCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicCategory::Summary => "summary",
            TopicCategory::Explanation => "explanation",
            TopicCategory::Example => "example",
            TopicCategory::Process => "process",
            TopicCategory::Default => "default",
        }
    }
}

/// Subject area of a question that is not about the video
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GeneralTopic {
    Technology,
    Business,
    Learning,
    General,
}

impl GeneralTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneralTopic::Technology => "technology",
            GeneralTopic::Business => "business",
            GeneralTopic::Learning => "learning",
            GeneralTopic::General => "general",
        }
    }
}

/// Ordered rules, first hit wins
const TOPIC_RULES: &[(TopicCategory, &[&str])] = &[
    (TopicCategory::Summary, &["summary", "summarize", "main points"]),
    (TopicCategory::Explanation, &["how", "explain", "what is"]),
    (TopicCategory::Example, &["example", "demonstrate", "show me"]),
    (TopicCategory::Process, &["process", "steps", "method"]),
];

const GENERAL_TOPIC_RULES: &[(GeneralTopic, &[&str])] = &[
    (
        GeneralTopic::Technology,
        &[
            "technology", "tech", "software", "programming", "code", "coding", "computer", "ai",
            "artificial intelligence", "machine learning", "algorithm", "data", "app", "digital",
            "internet", "developer",
        ],
    ),
    (
        GeneralTopic::Business,
        &[
            "business", "marketing", "sales", "company", "startup", "finance", "money",
            "investment", "investing", "management", "strategy", "revenue", "customer", "profit",
        ],
    ),
    (
        GeneralTopic::Learning,
        &[
            "learn", "learning", "study", "studying", "education", "course", "teach", "teaching",
            "skill", "skills", "tutorial", "practice", "school",
        ],
    ),
];

/// Words longer than three characters, normalized
fn significant_words(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .map(String::from)
        .collect()
}

/// Does the question talk about the video, its title or anything said in it?
pub fn is_video_related(question: &str, video_title: &str, transcript: &str) -> bool {
    let question_lower = question.to_lowercase();

    if VIDEO_KEYWORDS.iter().any(|kw| question_lower.contains(kw)) {
        return true;
    }

    if significant_words(video_title)
        .iter()
        .any(|w| question_lower.contains(w.as_str()))
    {
        return true;
    }

    let transcript_lower = transcript.to_lowercase();
    significant_words(question)
        .iter()
        .any(|w| transcript_lower.contains(w.as_str()))
}

/// Which answer template family fits the question
pub fn categorize_topic(question: &str) -> TopicCategory {
    let question_lower = question.to_lowercase();

    TOPIC_RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| question_lower.contains(n)))
        .map(|(category, _)| *category)
        .unwrap_or(TopicCategory::Default)
}

/// Which general-knowledge bucket an off-video question falls in
pub fn categorize_general_topic(question: &str) -> GeneralTopic {
    let normalized = normalize(question);
    let words: Vec<&str> = normalized.split_whitespace().collect();

    let hit = |term: &str| {
        if term.contains(' ') {
            normalized.contains(term)
        } else {
            words.contains(&term)
        }
    };

    GENERAL_TOPIC_RULES
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| hit(t)))
        .map(|(topic, _)| *topic)
        .unwrap_or(GeneralTopic::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_question_about_video() {
        let question = "Can you summarize the video?";
        let transcript = "In this talk we summarize the state of async Rust.";

        assert_eq!(categorize_topic(question), TopicCategory::Summary);
        assert!(is_video_related(question, "Async Rust in 2024", transcript));
    }

    #[test]
    fn test_related_through_title() {
        assert!(is_video_related(
            "tell me more about kubernetes",
            "Kubernetes for beginners",
            ""
        ));
    }

    #[test]
    fn test_related_through_transcript() {
        assert!(is_video_related(
            "Why does garbage collection pause?",
            "Untitled",
            "Garbage collection pauses are the main topic here."
        ));
    }

    #[test]
    fn test_unrelated_question() {
        assert!(!is_video_related(
            "What's the capital of France?",
            "Cooking pasta at home",
            "Boil water, add salt, then add the pasta."
        ));
    }

    #[test]
    fn test_short_words_do_not_relate() {
        // "the" and "pan" are too short to count
        assert!(!is_video_related("is the pan hot", "Frying", "the pan"));
    }

    #[test]
    fn test_topic_rule_order() {
        assert_eq!(categorize_topic("Give me the main points"), TopicCategory::Summary);
        assert_eq!(categorize_topic("Explain closures"), TopicCategory::Explanation);
        assert_eq!(categorize_topic("Any example of this?"), TopicCategory::Example);
        assert_eq!(categorize_topic("List the steps"), TopicCategory::Process);
        assert_eq!(categorize_topic("Nice video"), TopicCategory::Default);
        // summary wins over explanation
        assert_eq!(categorize_topic("How would you summarize it?"), TopicCategory::Summary);
        // substring containment: "show" contains "how"
        assert_eq!(categorize_topic("show me a demo"), TopicCategory::Explanation);
    }

    #[test]
    fn test_general_topic() {
        assert_eq!(
            categorize_general_topic("Which programming language should I pick?"),
            GeneralTopic::Technology
        );
        assert_eq!(
            categorize_general_topic("How do I grow revenue at my startup?"),
            GeneralTopic::Business
        );
        assert_eq!(
            categorize_general_topic("What's the best way to study?"),
            GeneralTopic::Learning
        );
        assert_eq!(categorize_general_topic("Explain the weather"), GeneralTopic::General);
        assert_eq!(
            categorize_general_topic("Is artificial intelligence risky?"),
            GeneralTopic::Technology
        );
    }

    #[test]
    fn test_general_topic_priority() {
        // technology checked before business
        assert_eq!(
            categorize_general_topic("software company strategy"),
            GeneralTopic::Technology
        );
    }
}
