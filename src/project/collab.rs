//! Translation and narration collaborators.
//!
//! Both are consumed through traits so jobs can run against recorded assets, an external
//! command, or test doubles.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{ReelError, ReelResult};
use crate::project::layout::{ProjectInputs, read_caption_file};
use crate::text::locale::Locale;
use crate::timeline::captions::CaptionSentence;

/// Produces captions in a target locale.
pub trait Translator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Translate `sentences` into `target`. Errors are recoverable: callers fall back to
    /// the source sentences.
    fn translate(
        &self,
        project: &ProjectInputs,
        sentences: &[CaptionSentence],
        target: &Locale,
    ) -> ReelResult<Vec<CaptionSentence>>;
}

/// Returns the source sentences unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn name(&self) -> &str {
        "identity"
    }

    fn translate(
        &self,
        _project: &ProjectInputs,
        sentences: &[CaptionSentence],
        _target: &Locale,
    ) -> ReelResult<Vec<CaptionSentence>> {
        Ok(sentences.to_vec())
    }
}

/// Reads `captions.{code}.txt` from the project directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalizedCaptionFiles;

impl Translator for LocalizedCaptionFiles {
    fn name(&self) -> &str {
        "localized-files"
    }

    fn translate(
        &self,
        project: &ProjectInputs,
        _sentences: &[CaptionSentence],
        target: &Locale,
    ) -> ReelResult<Vec<CaptionSentence>> {
        read_caption_file(&project.localized_captions_path(target.code()))
    }
}

/// Translate with `translator`, falling back to `sentences` on failure.
pub fn translate_or_fallback(
    translator: &dyn Translator,
    project: &ProjectInputs,
    sentences: &[CaptionSentence],
    target: &Locale,
) -> Vec<CaptionSentence> {
    match translator.translate(project, sentences, target) {
        Ok(out) if !out.is_empty() => out,
        Ok(_) => {
            tracing::warn!(translator = translator.name(), locale = %target, "translation came back empty, keeping source captions");
            sentences.to_vec()
        }
        Err(e) => {
            tracing::warn!(translator = translator.name(), locale = %target, error = %e, "translation failed, keeping source captions");
            sentences.to_vec()
        }
    }
}

/// Text spoken for a caption list: every word, sentences joined by a space.
pub fn narration_text(sentences: &[CaptionSentence]) -> String {
    sentences
        .iter()
        .map(|s| s.words().join(" "))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Everything a narration source needs for one job.
#[derive(Clone, Copy, Debug)]
pub struct NarrationRequest<'a> {
    /// Project being rendered.
    pub project: &'a ProjectInputs,
    /// Target locale.
    pub locale: &'a Locale,
    /// Voice identifier from the locale table.
    pub voice: &'a str,
    /// Text to speak.
    pub text: &'a str,
    /// Job scratch directory; sources may write their output here.
    pub work_dir: &'a Path,
}

/// Produces a narration audio file for a job.
pub trait NarrationSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Return a path to narration audio for `req`.
    fn narrate(&self, req: &NarrationRequest<'_>) -> ReelResult<PathBuf>;
}

/// Uses narration files already present in the project directory.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrerecordedNarration;

impl NarrationSource for PrerecordedNarration {
    fn name(&self) -> &str {
        "prerecorded"
    }

    fn narrate(&self, req: &NarrationRequest<'_>) -> ReelResult<PathBuf> {
        let candidates = req.project.narration_candidates(Some(req.locale.code()));
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| {
                ReelError::narration(format!(
                    "no narration file for '{}' in '{}'",
                    req.locale,
                    req.project.dir.display()
                ))
            })
    }
}

/// Runs an external speech synthesis program.
///
/// Arguments may contain `{text}`, `{voice}` and `{out}`; the output is
/// `{work_dir}/narration.mp3` and must be larger than `min_bytes`.
#[derive(Clone, Debug)]
pub struct CommandNarration {
    command: Vec<String>,
    min_bytes: u64,
}

impl CommandNarration {
    /// Build from a program-plus-arguments template.
    pub fn new(command: Vec<String>, min_bytes: u64) -> ReelResult<Self> {
        if command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(ReelError::validation("narration command is empty"));
        }
        Ok(Self { command, min_bytes })
    }

    fn expand(&self, req: &NarrationRequest<'_>, out: &Path) -> Vec<String> {
        let out = out.to_string_lossy();
        self.command
            .iter()
            .map(|arg| {
                arg.replace("{text}", req.text)
                    .replace("{voice}", req.voice)
                    .replace("{out}", &out)
            })
            .collect()
    }
}

impl NarrationSource for CommandNarration {
    fn name(&self) -> &str {
        "command"
    }

    #[tracing::instrument(skip_all, fields(program = %self.command[0], voice = req.voice))]
    fn narrate(&self, req: &NarrationRequest<'_>) -> ReelResult<PathBuf> {
        let program = &self.command[0];
        if !is_executable_reachable(program) {
            return Err(ReelError::narration(format!(
                "narration program '{program}' was not found on PATH"
            )));
        }
        std::fs::create_dir_all(req.work_dir).map_err(|e| {
            ReelError::narration(format!(
                "failed to create '{}': {e}",
                req.work_dir.display()
            ))
        })?;
        let out = req.work_dir.join("narration.mp3");
        let args = self.expand(req, &out);

        let output = Command::new(&args[0])
            .args(&args[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| ReelError::narration(format!("failed to run '{program}': {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::narration(format!(
                "'{program}' exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let len = std::fs::metadata(&out).map(|m| m.len()).unwrap_or(0);
        if len <= self.min_bytes {
            return Err(ReelError::narration(format!(
                "'{program}' produced {len} bytes at '{}', expected more than {}",
                out.display(),
                self.min_bytes
            )));
        }
        tracing::debug!(bytes = len, out = %out.display(), "narration synthesized");
        Ok(out)
    }
}

fn is_executable_reachable(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .is_some_and(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
}

/// Tries each source in order and returns the first success.
#[derive(Default)]
pub struct NarrationChain {
    sources: Vec<Box<dyn NarrationSource>>,
}

impl NarrationChain {
    /// Empty chain; always fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    pub fn with(mut self, source: impl NarrationSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// `true` when no source is configured.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl NarrationSource for NarrationChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn narrate(&self, req: &NarrationRequest<'_>) -> ReelResult<PathBuf> {
        let mut failures = Vec::new();
        for source in &self.sources {
            match source.narrate(req) {
                Ok(path) => {
                    tracing::info!(source = source.name(), path = %path.display(), "narration ready");
                    return Ok(path);
                }
                Err(e) => {
                    tracing::debug!(source = source.name(), error = %e, "narration source failed");
                    failures.push(format!("{}: {e}", source.name()));
                }
            }
        }
        Err(ReelError::narration(if failures.is_empty() {
            "no narration source configured".to_string()
        } else {
            failures.join("; ")
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/project/collab.rs"]
mod tests;
