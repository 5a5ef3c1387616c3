//! Video lookup: link parsing, metadata and transcripts

pub mod metadata;
pub mod transcription;
pub mod url;

pub use metadata::{MetadataProvider, SimulatedMetadataProvider, YouTubeMetadataProvider};
pub use transcription::{SimulatedTranscriber, TranscriptionProvider};
pub use self::url::{extract_video_id, watch_url};
