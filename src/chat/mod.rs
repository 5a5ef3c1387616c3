//! Question answering over a video transcript
//!
//! Segment matching and question classification feed the response composer,
//! which turns a question plus the current video context into an answer.

pub mod classifier;
pub mod composer;
pub mod context;
pub mod matcher;
pub mod templates;

pub use classifier::{
    categorize_general_topic, categorize_topic, is_video_related, GeneralTopic, TopicCategory,
};
pub use composer::{condense_to_brief, ComposedResponse, ResponseComposer};
pub use context::VideoContextHolder;
pub use matcher::{extract_keywords, find_relevant, score_segments, SegmentMatch};
pub use templates::ResponseTemplates;
