use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::config::PathsConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::captions::CaptionSentence;

/// Background clip extensions, matched case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

/// Source caption file inside a project directory.
pub const CAPTIONS_FILE: &str = "captions.txt";

/// Narration audio extensions, in lookup order.
pub const NARRATION_EXTENSIONS: [&str; 3] = ["mp3", "wav", "m4a"];

/// One project directory: background clips plus optional captions and narration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectInputs {
    /// Directory name; used in output, temp and log paths.
    pub name: String,
    /// Project directory.
    pub dir: PathBuf,
    /// Background clips sorted by file name.
    pub videos: Vec<PathBuf>,
}

impl ProjectInputs {
    /// Scan `dir` for background clips.
    pub fn scan(dir: &Path) -> ReelResult<Self> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ReelError::validation(format!("'{}' has no usable project name", dir.display()))
            })?
            .to_string();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to list project directory '{}'", dir.display()))?;

        let mut videos = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("failed to read entry in '{}'", dir.display()))?
                .path();
            if path.is_file() && is_video_file(&path) {
                videos.push(path);
            }
        }
        videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        Ok(Self {
            name,
            dir: dir.to_path_buf(),
            videos,
        })
    }

    /// `captions.txt` in the project directory.
    pub fn captions_path(&self) -> PathBuf {
        self.dir.join(CAPTIONS_FILE)
    }

    /// Pre-localized caption file for `code`, `captions.{code}.txt`.
    pub fn localized_captions_path(&self, code: &str) -> PathBuf {
        self.dir.join(format!("captions.{code}.txt"))
    }

    /// Whether a source caption file exists.
    pub fn has_captions(&self) -> bool {
        self.captions_path().is_file()
    }

    /// Read the source captions, one sentence per non-blank line.
    pub fn read_captions(&self) -> ReelResult<Vec<CaptionSentence>> {
        read_caption_file(&self.captions_path())
    }

    /// Narration files to try for `code`, most specific first.
    pub fn narration_candidates(&self, code: Option<&str>) -> Vec<PathBuf> {
        let mut out = Vec::new();
        if let Some(code) = code {
            out.extend(
                NARRATION_EXTENSIONS
                    .iter()
                    .map(|ext| self.dir.join(format!("narration.{code}.{ext}"))),
            );
        }
        out.extend(
            NARRATION_EXTENSIONS
                .iter()
                .map(|ext| self.dir.join(format!("narration.{ext}"))),
        );
        out
    }
}

/// Read a caption file; missing or wordless files are [`ReelError::MissingCaptions`].
pub fn read_caption_file(path: &Path) -> ReelResult<Vec<CaptionSentence>> {
    if !path.is_file() {
        return Err(ReelError::MissingCaptions(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read captions '{}'", path.display()))?;
    let sentences = CaptionSentence::parse_lines(&text);
    if sentences.is_empty() {
        return Err(ReelError::MissingCaptions(path.to_path_buf()));
    }
    Ok(sentences)
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
}

/// Every project under `root` that has at least one background clip, in name order.
#[tracing::instrument]
pub fn discover_projects(root: &Path) -> ReelResult<Vec<ProjectInputs>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("failed to list videos root '{}'", root.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in '{}'", root.display()))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();

    let mut projects = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let project = ProjectInputs::scan(&dir)?;
        if project.videos.is_empty() {
            tracing::warn!(project = %project.name, "no background clips, skipping project");
            continue;
        }
        projects.push(project);
    }
    tracing::info!(count = projects.len(), "projects discovered");
    Ok(projects)
}

/// Where a job writes its output, scratch files and logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    result_root: PathBuf,
    temp_root: PathBuf,
    log_root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at the configured directories.
    pub fn new(paths: &PathsConfig) -> Self {
        Self {
            result_root: paths.result.clone(),
            temp_root: paths.temp.clone(),
            log_root: paths.logs.clone(),
        }
    }

    /// `{result}/{project}/Output_{language}.mp4`.
    pub fn language_output(&self, project: &str, language: &str) -> PathBuf {
        self.result_root
            .join(project)
            .join(format!("Output_{language}.mp4"))
    }

    /// `{result}/{project}/{project}_final.mp4`.
    pub fn single_output(&self, project: &str) -> PathBuf {
        self.result_root
            .join(project)
            .join(format!("{project}_final.mp4"))
    }

    /// `{temp}/{project}/{code}`; unique per job.
    pub fn temp_dir(&self, project: &str, code: &str) -> PathBuf {
        self.temp_root.join(project).join(code)
    }

    /// Root for per-project log directories.
    pub fn log_root(&self) -> &Path {
        &self.log_root
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/layout.rs"]
mod tests;
