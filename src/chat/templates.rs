//! Response template tables
//!
//! The composer never carries literal answer text; everything it says comes from
//! a [`ResponseTemplates`] value. The built-in tables can be overridden from TOML,
//! top-level tables that are missing from the file keep their built-in value.

use anyhow::{anyhow, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::chat::classifier::{GeneralTopic, TopicCategory};

/// Templates per answer shape
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicTemplates {
    pub summary: Vec<String>,
    pub explanation: Vec<String>,
    pub example: Vec<String>,
    pub process: Vec<String>,
    pub default: Vec<String>,
}

impl TopicTemplates {
    pub fn for_category(&self, category: TopicCategory) -> &[String] {
        match category {
            TopicCategory::Summary => &self.summary,
            TopicCategory::Explanation => &self.explanation,
            TopicCategory::Example => &self.example,
            TopicCategory::Process => &self.process,
            TopicCategory::Default => &self.default,
        }
    }

    fn all(&self) -> [(&'static str, &[String]); 5] {
        [
            ("summary", self.summary.as_slice()),
            ("explanation", self.explanation.as_slice()),
            ("example", self.example.as_slice()),
            ("process", self.process.as_slice()),
            ("default", self.default.as_slice()),
        ]
    }
}

/// Templates per general-knowledge topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralTemplates {
    pub technology: Vec<String>,
    pub business: Vec<String>,
    pub learning: Vec<String>,
    pub general: Vec<String>,
}

impl GeneralTemplates {
    pub fn for_topic(&self, topic: GeneralTopic) -> &[String] {
        match topic {
            GeneralTopic::Technology => &self.technology,
            GeneralTopic::Business => &self.business,
            GeneralTopic::Learning => &self.learning,
            GeneralTopic::General => &self.general,
        }
    }

    fn all(&self) -> [(&'static str, &[String]); 4] {
        [
            ("technology", self.technology.as_slice()),
            ("business", self.business.as_slice()),
            ("learning", self.learning.as_slice()),
            ("general", self.general.as_slice()),
        ]
    }
}

/// All text the local responder can produce.
///
/// Slots: `{title}`, `{timestamp}`, `{excerpt}`, `{text}`, `{second_timestamp}`,
/// `{second_text}`, `{suggestions}`, `{topic}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResponseTemplates {
    pub greeting: String,
    pub video_brief: TopicTemplates,
    pub video_detailed: TopicTemplates,
    pub detailed_filler: TopicTemplates,
    pub second_reference: String,
    pub not_found: Vec<String>,
    pub general_brief: GeneralTemplates,
    pub general_detailed: GeneralTemplates,
    pub remote_nudge: String,

    /// Words that let a short second sentence survive brief trimming
    pub importance_keywords: Vec<String>,
}

impl ResponseTemplates {
    /// Load templates from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates from {}", path.display()))?;
        let templates = Self::from_toml(&content)
            .with_context(|| format!("Invalid templates file {}", path.display()))?;
        info!("📄 Loaded response templates from: {}", path.display());
        Ok(templates)
    }

    /// Parse and validate templates from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let templates: Self = toml::from_str(content)?;
        templates.validate()?;
        Ok(templates)
    }

    /// Every list must offer at least one choice
    pub fn validate(&self) -> Result<()> {
        let tables = [
            ("video_brief", &self.video_brief),
            ("video_detailed", &self.video_detailed),
            ("detailed_filler", &self.detailed_filler),
        ];
        for (table, templates) in tables {
            for (key, list) in templates.all() {
                if list.is_empty() {
                    return Err(anyhow!("templates table {}.{} is empty", table, key));
                }
            }
        }

        for (table, templates) in [
            ("general_brief", &self.general_brief),
            ("general_detailed", &self.general_detailed),
        ] {
            for (key, list) in templates.all() {
                if list.is_empty() {
                    return Err(anyhow!("templates table {}.{} is empty", table, key));
                }
            }
        }

        if self.not_found.is_empty() {
            return Err(anyhow!("templates list not_found is empty"));
        }

        Ok(())
    }

    pub fn greeting_for(&self, title: &str) -> String {
        interpolate(&self.greeting, &[("title", title)])
    }
}

/// Replace `{name}` slots with values
pub fn interpolate(template: &str, slots: &[(&str, &str)]) -> String {
    slots.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{}}}", name), value)
    })
}

/// Pick one template uniformly; empty lists yield an empty string
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, choices: &'a [String]) -> &'a str {
    if choices.is_empty() {
        return "";
    }
    &choices[rng.gen_range(0..choices.len())]
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ResponseTemplates {
    fn default() -> Self {
        Self {
            greeting: "Hi! I've gone through \"{title}\". Ask me anything about it, \
                       like a summary, an explanation of a concept, or where something is mentioned."
                .to_string(),
            video_brief: TopicTemplates {
                summary: list(&[
                    "The main points come together at {timestamp}, where the video says \"{excerpt}\". This is a key takeaway.",
                    "In short, around {timestamp} the video sums it up as \"{excerpt}\". Worth rewatching that part.",
                ]),
                explanation: list(&[
                    "At {timestamp} the video explains it this way: \"{excerpt}\". The example right after makes it clearer.",
                    "The explanation starts around {timestamp}: \"{excerpt}\". It builds on the earlier section.",
                ]),
                example: list(&[
                    "There's an example at {timestamp}: \"{excerpt}\". It demonstrates the idea in practice.",
                    "Around {timestamp} the video shows this: \"{excerpt}\". A useful illustration to keep in mind.",
                ]),
                process: list(&[
                    "The process is walked through at {timestamp}: \"{excerpt}\". Each step builds on the previous one.",
                    "Starting at {timestamp}, the video lays out the steps: \"{excerpt}\". The order is important here.",
                ]),
                default: list(&[
                    "This comes up at {timestamp}: \"{excerpt}\". That's the most relevant part of the video.",
                    "The video touches on this around {timestamp}: \"{excerpt}\". Jump there for the full context.",
                ]),
            },
            video_detailed: TopicTemplates {
                summary: list(&[
                    "Here's a summary based on the most relevant part of \"{title}\". At {timestamp}, the video says: \"{text}\"",
                ]),
                explanation: list(&[
                    "Let me walk through how \"{title}\" explains this. The key passage is at {timestamp}: \"{text}\"",
                ]),
                example: list(&[
                    "\"{title}\" gives a concrete example at {timestamp}: \"{text}\"",
                ]),
                process: list(&[
                    "Here is how \"{title}\" describes the process, starting at {timestamp}: \"{text}\"",
                ]),
                default: list(&[
                    "Here's what \"{title}\" says about this. At {timestamp}, you'll hear: \"{text}\"",
                ]),
            },
            detailed_filler: TopicTemplates {
                summary: list(&[
                    "This passage captures the core message the rest of the video expands on.",
                    "Most of the surrounding discussion supports this central idea.",
                    "If you only watch one part, this is the section that ties the themes together.",
                ]),
                explanation: list(&[
                    "The speaker frames the concept first and then refines it with details.",
                    "Notice how the explanation moves from the general idea to the specifics.",
                    "The surrounding context helps clarify why this matters.",
                ]),
                example: list(&[
                    "The example grounds the abstract idea in a concrete situation.",
                    "Seeing it applied makes the earlier points easier to follow.",
                    "It's a good model to adapt to your own use case.",
                ]),
                process: list(&[
                    "Each step depends on the one before it, so the order matters.",
                    "The video pauses between steps to point out common mistakes.",
                    "Following along with the timestamps makes the workflow easy to repeat.",
                ]),
                default: list(&[
                    "The surrounding discussion adds useful context to this point.",
                    "This ties into several other themes raised throughout the video.",
                    "It's worth watching a little before and after this moment for the full picture.",
                ]),
            },
            second_reference: "The topic comes up again at {second_timestamp}: \"{second_text}\"".to_string(),
            not_found: list(&[
                "I couldn't find a part of \"{title}\" that covers that directly, try asking about {suggestions}.",
                "That doesn't seem to be covered explicitly in \"{title}\", but you could ask about {suggestions} instead.",
            ]),
            general_brief: GeneralTemplates {
                technology: list(&[
                    "That's a technology question that goes beyond this video's content. Technology topics usually benefit from checking current documentation.",
                ]),
                business: list(&[
                    "That's a business question outside what this video covers. Business answers depend heavily on your specific context.",
                ]),
                learning: list(&[
                    "That's a learning question that isn't covered in this video. Consistent practice is the most important factor in learning anything.",
                ]),
                general: list(&[
                    "That question isn't covered in this video. Try asking something about its content instead.",
                ]),
            },
            general_detailed: GeneralTemplates {
                technology: list(&[
                    "That's a technology question that goes beyond this video. In general, technology topics move quickly, so official documentation, changelogs and hands-on experiments are the most reliable sources. Breaking the problem into smaller parts and testing each one usually leads to a clear answer.",
                ]),
                business: list(&[
                    "That's a business question this video doesn't address. Business decisions generally depend on your market, customers and constraints, so it helps to define the goal, gather data on what has worked for similar companies, and test ideas on a small scale before committing.",
                ]),
                learning: list(&[
                    "That's a learning question outside this video's scope. Effective learning usually combines spaced repetition, active recall and deliberate practice, and explaining a concept in your own words is one of the best ways to check your understanding.",
                ]),
                general: list(&[
                    "That question falls outside what this video covers. I can answer best when the question relates to the video's content, such as its main points, explanations or examples.",
                ]),
            },
            remote_nudge: "For deeper answers to general questions, configure an AI provider API key in the settings.".to_string(),
            importance_keywords: list(&[
                "example", "important", "key", "demonstrates", "shows", "illustrates", "notice", "crucial",
            ]),
        }
    }
}
