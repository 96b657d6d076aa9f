//! Encoding sinks.
//!
//! Sinks consume composited frames in timeline order.

/// `ffmpeg`-based sink (H.264/AAC MP4 via system `ffmpeg`).
pub mod ffmpeg;
/// Frame sink trait and the in-memory sink.
pub mod sink;
