use crate::lyrics::LyricLine;
use tracing::{debug, warn};

/// Minimum time a line stays on screen, in seconds.
pub const MIN_LINE_SECONDS: f64 = 2.0;
pub const DEFAULT_CHARS_PER_SECOND: f64 = 15.0;

// Float slack when comparing accumulated time against the total.
const TIME_EPSILON: f64 = 1e-9;

/// A lyric line bound to its display interval in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedCue {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

impl TimedCue {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

fn raw_duration(line: &LyricLine, chars_per_second: f64) -> f64 {
    (line.char_count() as f64 / chars_per_second).max(MIN_LINE_SECONDS)
}

/// Spreads `total_duration` over `lines` in proportion to their reading time.
///
/// Every line wants `max(2s, chars / chars_per_second)`. The wanted durations
/// are scaled so that together they fill `total_duration` exactly. When the
/// audio is shorter than the lyrics need, lines still keep the two second
/// floor and the ones that no longer fit are dropped without a cue.
///
/// Cues are contiguous, start at zero and never end past `total_duration`.
/// The last cue produced always ends exactly at `total_duration`.
pub fn allocate(lines: &[LyricLine], total_duration: f64, chars_per_second: f64) -> Vec<TimedCue> {
    if lines.is_empty() {
        return Vec::new();
    }
    if !total_duration.is_finite() || total_duration <= 0.0 {
        warn!(
            "Cannot place {} lines into a duration of {} seconds",
            lines.len(),
            total_duration
        );
        return Vec::new();
    }

    let chars_per_second = if chars_per_second.is_finite() && chars_per_second > 0.0 {
        chars_per_second
    } else {
        warn!(
            "Invalid reading speed {}; every line gets the {}s minimum",
            chars_per_second, MIN_LINE_SECONDS
        );
        f64::INFINITY
    };

    let raw: Vec<f64> = lines
        .iter()
        .map(|line| raw_duration(line, chars_per_second))
        .collect();
    let raw_total: f64 = raw.iter().sum();
    let scale = if raw_total > 0.0 {
        total_duration / raw_total
    } else {
        1.0
    };
    debug!(
        "Raw reading time {:.2}s for {:.2}s of audio (scale {:.3})",
        raw_total, total_duration, scale
    );

    let last = lines.len() - 1;
    let mut cues = Vec::with_capacity(lines.len());
    let mut current_time = 0.0_f64;

    for (i, (line, raw_secs)) in lines.iter().zip(&raw).enumerate() {
        let start = current_time;
        let scaled = (raw_secs * scale).max(MIN_LINE_SECONDS.min(total_duration));
        let mut end = start + scaled;

        if i == last || end >= total_duration - TIME_EPSILON {
            end = total_duration;
        }

        let cue = TimedCue::new(start, end, line.text());
        debug!("{:>8.2}s +{:.2}s {}", cue.start_seconds, cue.duration(), cue.text);
        cues.push(cue);
        current_time = end;

        if current_time >= total_duration {
            break;
        }
    }

    if cues.len() < lines.len() {
        warn!(
            "Audio too short for all lyrics: {} of {} lines received a cue",
            cues.len(),
            lines.len()
        );
    }
    cues
}
