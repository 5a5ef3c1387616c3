//! Response composition: remote generation first, local templates as fallback

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chat::classifier::{
    categorize_general_topic, categorize_topic, is_video_related, GeneralTopic,
};
use crate::chat::matcher::{find_relevant, normalize};
use crate::chat::templates::{interpolate, pick, ResponseTemplates};
use crate::format::{format_timestamp, format_transcript_with_timestamps, truncate_excerpt};
use crate::llm::RemoteGenerator;
use crate::types::{ResponseMode, TranscriptSegment, VideoContext};

/// Excerpt length used by brief answers
pub const BRIEF_EXCERPT_CHARS: usize = 80;

/// Second sentences at or above this length are dropped in brief mode
pub const BRIEF_SECOND_SENTENCE_MAX: usize = 100;

/// Transcript characters sent to the remote generator
pub const PROMPT_TRANSCRIPT_CHARS: usize = 4000;

const FILLER_SENTENCES: usize = 2;

/// Frequent words that make poor suggestions
const SUGGESTION_NOISE: &[&str] = &[
    "about", "actually", "really", "going", "thing", "things", "today", "welcome", "everyone",
    "think", "right", "these", "those", "there", "their", "which", "would", "could", "should",
    "because", "where", "while", "other", "being", "something", "video",
];

/// The composer's answer to one question
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedResponse {
    pub content: String,

    /// Cosmetic score shown next to the answer
    pub confidence: f64,
    pub relevant_segments: Vec<TranscriptSegment>,

    /// `M:SS` of the best matching segment
    pub timestamp: Option<String>,
    pub is_video_related: bool,
}

struct QuestionAnalysis {
    is_video_related: bool,
    segments: Vec<TranscriptSegment>,
}

/// Builds answers from the current video context
pub struct ResponseComposer {
    templates: ResponseTemplates,
    remote: Option<Arc<dyn RemoteGenerator>>,
    rng: StdRng,
}

impl ResponseComposer {
    pub fn new(templates: ResponseTemplates) -> Self {
        Self {
            templates,
            remote: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Make template choice and confidence reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteGenerator>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn templates(&self) -> &ResponseTemplates {
        &self.templates
    }

    /// Answer a question. Never fails: remote errors fall back to templates.
    pub async fn generate(
        &mut self,
        question: &str,
        context: &VideoContext,
        mode: ResponseMode,
    ) -> ComposedResponse {
        let analysis = self.analyze(question, context);

        let remote_content = match self.remote.clone() {
            Some(remote) if remote.is_configured() => {
                let prompt = build_prompt(question, context, &analysis.segments, mode);
                match remote.generate(&prompt, mode).await {
                    Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                    Ok(_) => {
                        warn!("Remote generator returned an empty answer, using local templates");
                        None
                    }
                    Err(e) => {
                        warn!("Remote generation failed, using local templates: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let content = match remote_content {
            Some(text) => text,
            None => self.compose_local(question, context, mode, &analysis),
        };

        let content = match mode {
            ResponseMode::Brief => {
                condense_to_brief(&content, &self.templates.importance_keywords)
            }
            ResponseMode::Detailed => content,
        };

        let timestamp = if analysis.is_video_related {
            analysis.segments.first().map(|s| format_timestamp(s.start))
        } else {
            None
        };

        ComposedResponse {
            content,
            confidence: self.confidence(mode),
            relevant_segments: analysis.segments,
            timestamp,
            is_video_related: analysis.is_video_related,
        }
    }

    fn analyze(&self, question: &str, context: &VideoContext) -> QuestionAnalysis {
        let is_related = is_video_related(question, &context.title, &context.transcript);
        let segments = if is_related {
            find_relevant(question, &context.segments)
        } else {
            Vec::new()
        };

        debug!(
            "Question analysis: video_related={}, matched_segments={}",
            is_related,
            segments.len()
        );

        QuestionAnalysis {
            is_video_related: is_related,
            segments,
        }
    }

    fn compose_local(
        &mut self,
        question: &str,
        context: &VideoContext,
        mode: ResponseMode,
        analysis: &QuestionAnalysis,
    ) -> String {
        if !analysis.is_video_related {
            return self.compose_general(categorize_general_topic(question), mode);
        }

        let Some(first) = analysis.segments.first() else {
            let suggestions = suggest_topics(context);
            let template = pick(&mut self.rng, &self.templates.not_found);
            return interpolate(
                template,
                &[
                    ("title", context.title.as_str()),
                    ("suggestions", suggestions.as_str()),
                ],
            );
        };

        let category = categorize_topic(question);
        let timestamp = format_timestamp(first.start);
        let excerpt = truncate_excerpt(&first.text, BRIEF_EXCERPT_CHARS);
        let text = first.text.trim();
        let slots = [
            ("title", context.title.as_str()),
            ("timestamp", timestamp.as_str()),
            ("excerpt", excerpt.as_str()),
            ("text", text),
            ("topic", category.as_str()),
        ];

        match mode {
            ResponseMode::Brief => {
                let template = pick(
                    &mut self.rng,
                    self.templates.video_brief.for_category(category),
                );
                interpolate(template, &slots)
            }
            ResponseMode::Detailed => {
                let template = pick(
                    &mut self.rng,
                    self.templates.video_detailed.for_category(category),
                );
                let mut paragraphs = vec![interpolate(template, &slots)];

                let filler: Vec<&str> = self
                    .templates
                    .detailed_filler
                    .for_category(category)
                    .choose_multiple(&mut self.rng, FILLER_SENTENCES)
                    .map(String::as_str)
                    .collect();
                if !filler.is_empty() {
                    paragraphs.push(filler.join(" "));
                }

                if let Some(second) = analysis.segments.get(1) {
                    let second_timestamp = format_timestamp(second.start);
                    paragraphs.push(interpolate(
                        &self.templates.second_reference,
                        &[
                            ("second_timestamp", second_timestamp.as_str()),
                            ("second_text", second.text.trim()),
                        ],
                    ));
                }

                paragraphs.join("\n\n")
            }
        }
    }

    fn compose_general(&mut self, topic: GeneralTopic, mode: ResponseMode) -> String {
        let slots = [("topic", topic.as_str())];
        match mode {
            ResponseMode::Brief => {
                let template = pick(&mut self.rng, self.templates.general_brief.for_topic(topic));
                interpolate(template, &slots)
            }
            ResponseMode::Detailed => {
                let template =
                    pick(&mut self.rng, self.templates.general_detailed.for_topic(topic));
                format!(
                    "{}\n\n{}",
                    interpolate(template, &slots),
                    self.templates.remote_nudge
                )
            }
        }
    }

    fn confidence(&mut self, mode: ResponseMode) -> f64 {
        match mode {
            ResponseMode::Brief => self.rng.gen_range(0.87..0.95),
            ResponseMode::Detailed => self.rng.gen_range(0.85..0.95),
        }
    }
}

/// Prompt sent to the remote generator
pub fn build_prompt(
    question: &str,
    context: &VideoContext,
    segments: &[TranscriptSegment],
    mode: ResponseMode,
) -> String {
    let mut prompt = format!(
        "You are answering questions about the video \"{}\" ({}).\n",
        context.title, context.url
    );

    if !segments.is_empty() {
        prompt.push_str("\nMost relevant transcript segments:\n");
        prompt.push_str(&format_transcript_with_timestamps(segments));
        prompt.push('\n');
    }

    if !context.transcript.is_empty() {
        prompt.push_str("\nTranscript:\n");
        prompt.push_str(&truncate_excerpt(&context.transcript, PROMPT_TRANSCRIPT_CHARS));
        prompt.push('\n');
    }

    let instruction = match mode {
        ResponseMode::Brief => "Answer in one or two sentences.",
        ResponseMode::Detailed => {
            "Answer thoroughly, cite timestamps in M:SS form where relevant, \
             and say so if the video does not cover the question."
        }
    };

    prompt.push_str(&format!("\n{}\n\nQuestion: {}", instruction, question.trim()));
    prompt
}

fn is_sentence_tail(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '"' | '\'' | ')' | ']' | '\u{201d}' | '\u{2019}')
}

/// Quote state after the `"` at `pos`. An opening quote only counts when a
/// closing one follows, so a stray quote cannot swallow the rest of the text.
fn toggle_quote(in_quote: bool, chars: &[(usize, char)], pos: usize) -> bool {
    if in_quote {
        return false;
    }
    chars[pos + 1..].iter().any(|(_, c)| *c == '"')
}

/// Split prose into sentences. A sentence ends at `.`, `!` or `?` (plus closing
/// quotes) followed by whitespace and a non-lowercase character, or by the end of
/// the text. Terminators inside a matched pair of double quotes do not end a
/// sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i].1;

        if c == '"' {
            in_quote = toggle_quote(in_quote, &chars, i);
            i += 1;
            continue;
        }

        if !matches!(c, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && is_sentence_tail(chars[j].1) {
            if chars[j].1 == '"' {
                in_quote = toggle_quote(in_quote, &chars, j);
            }
            j += 1;
        }

        let mut k = j;
        while k < chars.len() && chars[k].1.is_whitespace() {
            k += 1;
        }

        let at_end = k == chars.len();
        let boundary = !in_quote && (at_end || (k > j && !chars[k].1.is_lowercase()));

        if boundary {
            let end = chars.get(j).map(|(idx, _)| *idx).unwrap_or(text.len());
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = chars.get(k).map(|(idx, _)| *idx).unwrap_or(text.len());
        }
        i = j;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

/// Keep the first sentence, plus a short second one that carries an importance keyword
pub fn condense_to_brief(content: &str, importance_keywords: &[String]) -> String {
    let sentences = split_sentences(content);
    let Some(first) = sentences.first() else {
        return content.trim().to_string();
    };

    let mut brief = first.clone();
    if let Some(second) = sentences.get(1) {
        let lower = second.to_lowercase();
        let important = importance_keywords
            .iter()
            .any(|kw| lower.contains(&kw.to_lowercase()));
        if important && second.chars().count() < BRIEF_SECOND_SENTENCE_MAX {
            brief.push(' ');
            brief.push_str(second);
        }
    }

    brief
}

/// Up to three frequent transcript words, phrased for a "try asking about" hint
pub fn suggest_topics(context: &VideoContext) -> String {
    let normalized = normalize(&context.transcript);
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, word) in normalized.split_whitespace().enumerate() {
        if word.chars().count() <= 4 || SUGGESTION_NOISE.contains(&word) {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(w, (n, first))| (w, n, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    let top: Vec<&str> = ranked.iter().take(3).map(|(w, _, _)| *w).collect();

    match top.as_slice() {
        [] if context.title.trim().is_empty() => "the main topics of the video".to_string(),
        [] => format!("the main ideas in \"{}\"", context.title.trim()),
        [one] => one.to_string(),
        [a, b] => format!("{} or {}", a, b),
        [rest @ .., last] => format!("{}, or {}", rest.join(", "), last),
    }
}
