use crate::ass::{SubtitleStyle, emit_styled};
use crate::lyrics::segment;
use crate::timing::{TimedCue, allocate};
use anyhow::Context;
use clap::ValueEnum;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SubtitleFormat {
    /// Plain numbered cues, millisecond timestamps.
    Srt,
    /// Styled script with fades, centisecond timestamps.
    Ass,
    /// Both of the above, side by side.
    Both,
}

impl SubtitleFormat {
    pub fn extension(self) -> Option<&'static str> {
        match self {
            SubtitleFormat::Srt => Some("srt"),
            SubtitleFormat::Ass => Some("ass"),
            SubtitleFormat::Both => None,
        }
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Whole units (ms, cs, ...) in `seconds`, truncated. The small bias keeps
/// values like 2.3s from landing one unit short through binary rounding.
pub(crate) fn whole_units(seconds: f64, per_second: u64) -> u64 {
    if seconds.is_nan() || seconds <= 0.0 {
        return 0;
    }
    (seconds * per_second as f64 + 1e-6).floor() as u64
}

pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = whole_units(seconds, 1000);
    let ms = total_ms % 1000;
    let total_sec = total_ms / 1000;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

pub fn emit_sequential(cues: &[TimedCue], output_path: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
    let output_path = output_path.as_ref();
    ensure_parent_dir(output_path)?;

    let mut f = BufWriter::new(File::create(output_path)?);
    for (i, cue) in cues.iter().enumerate() {
        writeln!(f, "{}", i + 1)?;
        writeln!(
            f,
            "{} --> {}",
            format_srt_time(cue.start_seconds),
            format_srt_time(cue.end_seconds)
        )?;
        writeln!(f, "{}", cue.text)?;
        writeln!(f)?;
    }
    f.flush()?;

    info!("Wrote {} cues to {}", cues.len(), output_path.display());
    Ok(output_path.to_path_buf())
}

/// Segments `lyrics`, times the lines against `duration` and writes the
/// requested format(s). Returns every file written.
///
/// A single format is written to `output_path` (gaining the format's
/// extension if it has none); `Both` writes `.srt` and `.ass` siblings.
pub fn generate_subtitles(
    lyrics: &str,
    output_path: impl AsRef<Path>,
    duration: f64,
    chars_per_second: f64,
    format: SubtitleFormat,
    style: &SubtitleStyle,
) -> anyhow::Result<Vec<PathBuf>> {
    let output_path = output_path.as_ref();
    info!(
        "Generating subtitles: {} chars of lyrics, {:.1}s of audio",
        lyrics.chars().count(),
        duration
    );

    let lines = segment(lyrics);
    let cues = allocate(&lines, duration, chars_per_second);
    info!("{} lyric lines, {} cues", lines.len(), cues.len());

    let target = |ext: &str| {
        if format == SubtitleFormat::Both || output_path.extension().is_none() {
            output_path.with_extension(ext)
        } else {
            output_path.to_path_buf()
        }
    };

    let mut written = Vec::new();
    if matches!(format, SubtitleFormat::Srt | SubtitleFormat::Both) {
        written.push(emit_sequential(&cues, target("srt"))?);
    }
    if matches!(format, SubtitleFormat::Ass | SubtitleFormat::Both) {
        written.push(emit_styled(&cues, target("ass"), style)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cues() -> Vec<TimedCue> {
        vec![
            TimedCue::new(0.0, 2.0, "a"),
            TimedCue::new(2.0, 5.5, "b"),
            TimedCue::new(5.5, 10.0, "c"),
        ]
    }

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(2.3), "00:00:02,300");
        assert_eq!(format_srt_time(65.5), "00:01:05,500");
        assert_eq!(format_srt_time(3661.123), "01:01:01,123");
        assert_eq!(format_srt_time(0.9999), "00:00:00,999");
        assert_eq!(format_srt_time(90000.0), "25:00:00,000");
        assert_eq!(format_srt_time(-1.0), "00:00:00,000");
    }

    #[test]
    fn writes_numbered_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.srt");
        let returned = emit_sequential(&sample_cues(), &path).unwrap();
        assert_eq!(returned, path);

        let expected = "1\n00:00:00,000 --> 00:00:02,000\na\n\n\
                        2\n00:00:02,000 --> 00:00:05,500\nb\n\n\
                        3\n00:00:05,500 --> 00:00:10,000\nc\n\n";
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn empty_cues_make_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.srt");
        emit_sequential(&[], &path).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 0);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session").join("nested").join("subs.srt");
        emit_sequential(&sample_cues(), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // The target is an existing directory, so it cannot be opened as a file.
        let err = emit_sequential(&sample_cues(), dir.path()).unwrap_err();
        assert!(err.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn generates_both_formats_from_lyrics() {
        let dir = tempfile::tempdir().unwrap();
        let lyrics = "[Intro]\nhello\n\n[Verse 1]\nworld  \n";
        let written = generate_subtitles(
            lyrics,
            dir.path().join("subtitles"),
            10.0,
            15.0,
            SubtitleFormat::Both,
            &SubtitleStyle::default(),
        )
        .unwrap();

        assert_eq!(
            written,
            vec![dir.path().join("subtitles.srt"), dir.path().join("subtitles.ass")]
        );
        let srt = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:05,000\nhello\n\n2\n00:00:05,000 --> 00:00:10,000\nworld\n\n"
        );
        let ass = fs::read_to_string(&written[1]).unwrap();
        assert!(ass.contains("Dialogue: 0,0:00:05.00,0:00:10.00,Default,,0,0,0,,{\\fad(300,300)}world\n"));
    }

    #[test]
    fn single_format_keeps_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lyrics.subs");
        let written = generate_subtitles(
            "one line",
            &path,
            3.0,
            15.0,
            SubtitleFormat::Srt,
            &SubtitleStyle::default(),
        )
        .unwrap();
        assert_eq!(written, vec![path]);
    }

    #[test]
    fn whitespace_lyrics_still_produce_documents() {
        let dir = tempfile::tempdir().unwrap();
        let written = generate_subtitles(
            "  \n\n\t",
            dir.path().join("blank"),
            30.0,
            15.0,
            SubtitleFormat::Both,
            &SubtitleStyle::default(),
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "");
        let ass = fs::read_to_string(&written[1]).unwrap();
        assert!(ass.contains("[Events]"));
        assert!(!ass.contains("Dialogue:"));
    }
}
