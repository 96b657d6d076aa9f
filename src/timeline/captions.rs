//! Word-by-word caption timing.
//!
//! The job duration is split evenly across sentences, and each sentence's share evenly across
//! its words. Events are contiguous and together cover the whole duration.

use crate::foundation::error::{ReelError, ReelResult};
use crate::text::locale::Locale;

/// One caption sentence split into display words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptionSentence {
    words: Vec<String>,
}

impl CaptionSentence {
    /// Split `text` on whitespace. Returns `None` when there are no words.
    pub fn new(text: &str) -> Option<Self> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return None;
        }
        Some(Self { words })
    }

    /// One sentence per non-blank line.
    pub fn parse_lines(text: &str) -> Vec<Self> {
        text.lines().filter_map(|line| Self::new(line.trim())).collect()
    }

    /// Words in order.
    pub fn words(&self) -> &[String] {
        &self.words
    }
}

/// A word shown on screen for `[start_s, start_s + duration_s)`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WordEvent {
    /// Upper-cased display text.
    pub text: String,
    /// Start time in seconds.
    pub start_s: f64,
    /// Display duration in seconds.
    pub duration_s: f64,
    /// Locale whose script rules render the word.
    #[serde(serialize_with = "serialize_locale")]
    pub locale: Locale,
}

fn serialize_locale<S: serde::Serializer>(locale: &Locale, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(locale.code())
}

impl WordEvent {
    /// End time (exclusive).
    pub fn end_s(&self) -> f64 {
        self.start_s + self.duration_s
    }

    /// Whether the word is on screen at `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_s && t < self.end_s()
    }
}

/// How the duration is shared between words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingPolicy {
    /// Equal share per sentence, then equal share per word within it.
    #[default]
    Uniform,
}

/// Build word events covering `total_s` with the default timing policy.
pub fn build_word_events(
    sentences: &[CaptionSentence],
    total_s: f64,
    locale: &Locale,
) -> ReelResult<Vec<WordEvent>> {
    build_word_events_with(TimingPolicy::default(), sentences, total_s, locale)
}

/// Build word events covering `total_s` under `policy`.
///
/// Sentences without words contribute nothing; zero sentences give an empty timeline.
pub fn build_word_events_with(
    policy: TimingPolicy,
    sentences: &[CaptionSentence],
    total_s: f64,
    locale: &Locale,
) -> ReelResult<Vec<WordEvent>> {
    if !total_s.is_finite() || total_s < 0.0 {
        return Err(ReelError::validation(format!(
            "caption duration must be finite and >= 0, got {total_s}"
        )));
    }
    let sentences: Vec<&CaptionSentence> =
        sentences.iter().filter(|s| !s.words.is_empty()).collect();
    if sentences.is_empty() {
        return Ok(Vec::new());
    }

    let TimingPolicy::Uniform = policy;
    let per_sentence = total_s / sentences.len() as f64;
    let word_count: usize = sentences.iter().map(|s| s.words.len()).sum();

    let mut events = Vec::with_capacity(word_count);
    let mut cursor = 0.0;
    for sentence in &sentences {
        let per_word = per_sentence / sentence.words.len() as f64;
        for word in &sentence.words {
            events.push(WordEvent {
                text: word.to_uppercase(),
                start_s: cursor,
                duration_s: per_word,
                locale: locale.clone(),
            });
            cursor += per_word;
        }
    }

    // Absorb accumulated rounding so the events end exactly at `total_s`.
    if let Some(last) = events.last_mut() {
        last.duration_s = (total_s - last.start_s).max(0.0);
    }
    Ok(events)
}

/// The event on screen at `t`, if any. `events` must be sorted by start time.
pub fn active_event(events: &[WordEvent], t: f64) -> Option<&WordEvent> {
    active_event_index(events, t).map(|idx| &events[idx])
}

/// Position of the event on screen at `t` in `events`, if any.
pub fn active_event_index(events: &[WordEvent], t: f64) -> Option<usize> {
    let idx = events.partition_point(|e| e.start_s <= t).checked_sub(1)?;
    events.get(idx)?.is_active_at(t).then_some(idx)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/captions.rs"]
mod tests;
