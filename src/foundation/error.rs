use std::path::PathBuf;

/// Convenience result type used across reelsmith.
pub type ReelResult<T> = Result<T, ReelError>;

/// A single background clip could not be used.
///
/// Always recoverable: the normalizer logs it and continues with the remaining clips.
#[derive(thiserror::Error, Debug)]
pub enum ClipLoadError {
    /// The clip path does not exist.
    #[error("clip '{}' not found", path.display())]
    Missing {
        /// Clip path.
        path: PathBuf,
    },

    /// `ffprobe` failed or produced unusable output.
    #[error("failed to probe clip '{}': {reason}", path.display())]
    Probe {
        /// Clip path.
        path: PathBuf,
        /// Probe failure detail.
        reason: String,
    },

    /// The container has no decodable video stream.
    #[error("clip '{}' has no video stream", path.display())]
    NoVideoStream {
        /// Clip path.
        path: PathBuf,
    },

    /// Duration or dimensions are zero, negative or not finite.
    #[error("clip '{}' has unusable geometry: {reason}", path.display())]
    BadGeometry {
        /// Clip path.
        path: PathBuf,
        /// Which value was rejected.
        reason: String,
    },
}

/// One stage of the font fallback chain failed.
///
/// Always recoverable: the renderer falls through to the next stage.
#[derive(thiserror::Error, Debug)]
pub enum FontLoadError {
    /// Configured font file does not exist.
    #[error("font file '{}' not found", path.display())]
    Missing {
        /// Font path.
        path: PathBuf,
    },

    /// Font bytes could not be read or registered.
    #[error("font '{source_name}' is unusable: {reason}")]
    Invalid {
        /// Font path or family name.
        source_name: String,
        /// Failure detail.
        reason: String,
    },

    /// No generic system font matched the query.
    #[error("no system font matched any of {families:?}")]
    NoSystemFont {
        /// Queried family names.
        families: Vec<String>,
    },
}

/// Narration audio could not be bound to the background track.
///
/// Always job-fatal and never retried.
#[derive(thiserror::Error, Debug)]
pub enum AudioSyncError {
    /// Audio file does not exist.
    #[error("audio '{}' not found", path.display())]
    Missing {
        /// Audio path.
        path: PathBuf,
    },

    /// The audio could not be decoded.
    #[error("audio '{}' is unreadable: {reason}", path.display())]
    Unreadable {
        /// Audio path.
        path: PathBuf,
        /// Decoder failure detail.
        reason: String,
    },

    /// Decoded audio has zero, negative or non-finite duration.
    #[error("audio '{}' has unusable duration {duration_s}", path.display())]
    BadDuration {
        /// Audio path.
        path: PathBuf,
        /// Reported duration in seconds.
        duration_s: f64,
    },

    /// The background track to loop has no duration.
    #[error("background track has zero duration; cannot loop to audio length")]
    EmptyTrack,
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A single clip failed to load (normally absorbed by the normalizer).
    #[error("clip load error: {0}")]
    ClipLoad(#[from] ClipLoadError),

    /// No background clip survived normalization.
    #[error("no usable background clips ({attempted} attempted)")]
    NoUsableClips {
        /// Number of clip paths that were tried.
        attempted: usize,
    },

    /// Narration audio could not be reconciled with the background.
    #[error("audio sync error: {0}")]
    AudioSync(#[from] AudioSyncError),

    /// A font stage failed (normally absorbed by the fallback chain).
    #[error("font load error: {0}")]
    FontLoad(#[from] FontLoadError),

    /// Captions are required for this job but the caption file is missing or empty.
    #[error("captions missing: {}", .0.display())]
    MissingCaptions(PathBuf),

    /// The narration collaborator failed to produce audio.
    #[error("narration error: {0}")]
    Narration(String),

    /// Decoding or encoding through `ffmpeg` failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The job observed a cancellation request.
    #[error("job cancelled")]
    Cancelled,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Narration`] value.
    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    /// `true` when the error aborts the whole job.
    ///
    /// Clip and font failures are handled where they occur (skip or fall back); everything
    /// else stops the job that raised it. Sibling jobs are never affected.
    pub fn is_job_fatal(&self) -> bool {
        !matches!(self, Self::ClipLoad(_) | Self::FontLoad(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
