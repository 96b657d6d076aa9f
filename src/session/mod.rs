//! Job orchestration: one job per (project, language), many jobs per batch.

/// Parallel batch runner.
pub mod batch;
/// Single job pipeline.
pub mod job;
/// Logging setup and per-job log files.
pub mod telemetry;
