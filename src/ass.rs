//! Advanced SubStation Alpha (v4.00+) output.
//!
//! One `Default` style built from [`SubtitleStyle`], one `Dialogue` row per cue.
//! Each row starts with a `\fad` override so lines fade in and out.

use crate::subtitle::{ensure_parent_dir, whole_units};
use crate::timing::TimedCue;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCRIPT_TITLE: &str = "Newsbeat Lyrics";
const STYLE_NAME: &str = "Default";
// Left and right margins are fixed; only the vertical one is configurable.
const MARGIN_H: u32 = 20;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, \
OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";

const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Typography and animation for the styled format.
///
/// Colours are ASS literals (`&HAABBGGRR`) and are passed through untouched.
/// `alignment` uses the numpad grid: 1-3 bottom, 4-6 middle, 7-9 top.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub font_name: String,
    pub font_size: u32,
    pub primary_color: String,
    /// Karaoke highlight colour.
    pub secondary_color: String,
    pub outline_color: String,
    pub back_color: String,
    pub outline: f64,
    pub shadow: f64,
    pub bold: bool,
    pub alignment: u8,
    pub margin_v: u32,
    /// Seconds.
    pub fade_in: f64,
    /// Seconds.
    pub fade_out: f64,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            font_name: "Noto Sans CJK JP".to_string(),
            font_size: 52,
            primary_color: "&H00FFFFFF".to_string(),
            secondary_color: "&H00FF00FF".to_string(),
            outline_color: "&H00000000".to_string(),
            back_color: "&H80000000".to_string(),
            outline: 3.0,
            shadow: 2.0,
            bold: true,
            alignment: 2,
            margin_v: 40,
            fade_in: 0.3,
            fade_out: 0.3,
        }
    }
}

impl SubtitleStyle {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read style file '{}'", path.display()))?;
        let style = serde_json::from_str(&data)
            .with_context(|| format!("invalid style file '{}'", path.display()))?;
        Ok(style)
    }

    fn style_row(&self) -> String {
        // Bold is -1/0 in this format, not 1/0.
        let bold = if self.bold { -1 } else { 0 };
        format!(
            "Style: {name},{font},{size},{primary},{secondary},{outline_c},{back},{bold},0,0,0,\
             100,100,0,0,1,{outline},{shadow},{align},{ml},{mr},{mv},1",
            name = STYLE_NAME,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_color,
            secondary = self.secondary_color,
            outline_c = self.outline_color,
            back = self.back_color,
            outline = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = MARGIN_H,
            mr = MARGIN_H,
            mv = self.margin_v,
        )
    }

    fn fade_tag(&self) -> String {
        format!(
            "{{\\fad({},{})}}",
            fade_millis(self.fade_in),
            fade_millis(self.fade_out)
        )
    }
}

// Whole milliseconds, truncated toward zero with the sign kept.
fn fade_millis(seconds: f64) -> i64 {
    let ms = whole_units(seconds.abs(), 1000) as i64;
    if seconds < 0.0 { -ms } else { ms }
}

pub fn format_ass_time(seconds: f64) -> String {
    let total_cs = whole_units(seconds, 100);
    let cs = total_cs % 100;
    let total_sec = total_cs / 100;
    let s = total_sec % 60;
    let total_min = total_sec / 60;
    let m = total_min % 60;
    let h = total_min / 60;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}

// Raw line breaks would end the Dialogue row early.
fn escape_text(text: &str) -> String {
    text.replace("\r\n", "\\N").replace('\n', "\\N")
}

pub fn emit_styled(
    cues: &[TimedCue],
    output_path: impl AsRef<Path>,
    style: &SubtitleStyle,
) -> anyhow::Result<PathBuf> {
    let output_path = output_path.as_ref();
    ensure_parent_dir(output_path)?;
    debug!(
        "Styled subtitles use font {} ({}px)",
        style.font_name, style.font_size
    );

    let mut f = BufWriter::new(File::create(output_path)?);

    writeln!(f, "[Script Info]")?;
    writeln!(f, "Title: {}", SCRIPT_TITLE)?;
    writeln!(f, "ScriptType: v4.00+")?;
    writeln!(f, "Collisions: Normal")?;
    writeln!(f, "PlayDepth: 0")?;
    writeln!(f, "Timer: 100.0000")?;
    writeln!(f, "WrapStyle: 0")?;
    writeln!(f)?;

    writeln!(f, "[V4+ Styles]")?;
    writeln!(f, "{}", STYLE_FORMAT)?;
    writeln!(f, "{}", style.style_row())?;
    writeln!(f)?;

    writeln!(f, "[Events]")?;
    writeln!(f, "{}", EVENT_FORMAT)?;
    let fade = style.fade_tag();
    for cue in cues {
        writeln!(
            f,
            "Dialogue: 0,{},{},{},,0,0,0,,{}{}",
            format_ass_time(cue.start_seconds),
            format_ass_time(cue.end_seconds),
            STYLE_NAME,
            fade,
            escape_text(&cue.text)
        )?;
    }
    f.flush()?;

    info!("Wrote {} styled cues to {}", cues.len(), output_path.display());
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_cues() -> Vec<TimedCue> {
        vec![
            TimedCue::new(0.0, 2.0, "a"),
            TimedCue::new(2.0, 5.5, "b"),
            TimedCue::new(5.5, 10.0, "c"),
        ]
    }

    fn emit_to_string(cues: &[TimedCue], style: &SubtitleStyle) -> String {
        let dir = tempfile::tempdir().unwrap();
        let path = emit_styled(cues, dir.path().join("out.ass"), style).unwrap();
        fs::read_to_string(path).unwrap()
    }

    fn style_line(doc: &str) -> &str {
        doc.lines().find(|l| l.starts_with("Style: ")).unwrap()
    }

    #[test]
    fn test_format_ass_time() {
        assert_eq!(format_ass_time(0.0), "0:00:00.00");
        assert_eq!(format_ass_time(5.5), "0:00:05.50");
        assert_eq!(format_ass_time(5.559), "0:00:05.55");
        assert_eq!(format_ass_time(61.25), "0:01:01.25");
        assert_eq!(format_ass_time(3600.0 * 12.0 + 1.0), "12:00:01.00");
    }

    #[test]
    fn writes_centisecond_timestamps() {
        let doc = emit_to_string(&sample_cues(), &SubtitleStyle::default());
        let rows: Vec<&str> = doc.lines().filter(|l| l.starts_with("Dialogue:")).collect();
        assert_eq!(
            rows,
            vec![
                "Dialogue: 0,0:00:00.00,0:00:02.00,Default,,0,0,0,,{\\fad(300,300)}a",
                "Dialogue: 0,0:00:02.00,0:00:05.50,Default,,0,0,0,,{\\fad(300,300)}b",
                "Dialogue: 0,0:00:05.50,0:00:10.00,Default,,0,0,0,,{\\fad(300,300)}c",
            ]
        );
    }

    #[test]
    fn default_style_row() {
        let doc = emit_to_string(&[], &SubtitleStyle::default());
        assert_eq!(
            style_line(&doc),
            "Style: Default,Noto Sans CJK JP,52,&H00FFFFFF,&H00FF00FF,&H00000000,&H80000000,\
             -1,0,0,0,100,100,0,0,1,3,2,2,20,20,40,1"
        );
    }

    #[test]
    fn bold_flag_is_minus_one_or_zero() {
        let bold = emit_to_string(&[], &SubtitleStyle::default());
        let fields: Vec<&str> = style_line(&bold).split(',').collect();
        assert_eq!(fields[7], "-1");

        let plain = SubtitleStyle {
            bold: false,
            ..SubtitleStyle::default()
        };
        let doc = emit_to_string(&[], &plain);
        let fields: Vec<&str> = style_line(&doc).split(',').collect();
        assert_eq!(fields[7], "0");
    }

    #[test]
    fn fade_directive_in_milliseconds() {
        let style = SubtitleStyle {
            fade_in: 0.4,
            fade_out: 0.4,
            ..SubtitleStyle::default()
        };
        let doc = emit_to_string(&sample_cues(), &style);
        assert!(doc.contains(",,{\\fad(400,400)}a\n"));

        let style = SubtitleStyle {
            fade_in: 0.25,
            fade_out: 1.0,
            ..SubtitleStyle::default()
        };
        let doc = emit_to_string(&sample_cues(), &style);
        assert!(doc.contains("{\\fad(250,1000)}b"));
    }

    #[test]
    fn negative_fade_keeps_its_sign() {
        let style = SubtitleStyle {
            fade_in: -0.3,
            fade_out: 0.0,
            ..SubtitleStyle::default()
        };
        let doc = emit_to_string(&sample_cues(), &style);
        assert!(doc.contains(",,{\\fad(-300,0)}a\n"));
        assert_eq!(fade_millis(-0.0005), 0);
        assert_eq!(fade_millis(0.29), 290);
    }

    #[test]
    fn empty_cues_keep_all_sections() {
        let doc = emit_to_string(&[], &SubtitleStyle::default());
        let headers: Vec<&str> = doc.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(headers, vec!["[Script Info]", "[V4+ Styles]", "[Events]"]);
        assert_eq!(doc.lines().filter(|l| l.starts_with("Format:")).count(), 2);
        assert!(!doc.contains("Dialogue:"));
        assert!(doc.ends_with(&format!("{}\n", EVENT_FORMAT)));
    }

    #[test]
    fn script_info_is_static() {
        let doc = emit_to_string(&sample_cues(), &SubtitleStyle::default());
        assert!(doc.starts_with(
            "[Script Info]\nTitle: Newsbeat Lyrics\nScriptType: v4.00+\nCollisions: Normal\n\
             PlayDepth: 0\nTimer: 100.0000\nWrapStyle: 0\n\n[V4+ Styles]\n"
        ));
    }

    #[test]
    fn line_breaks_in_text_are_escaped() {
        let cues = vec![TimedCue::new(0.0, 1.0, "first\nsecond")];
        let doc = emit_to_string(&cues, &SubtitleStyle::default());
        assert!(doc.contains("{\\fad(300,300)}first\\Nsecond\n"));
    }

    #[test]
    fn partial_style_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("style.json");
        fs::write(&path, r#"{ "font_size": 56, "bold": false, "back_color": "&HA0000000" }"#).unwrap();

        let style = SubtitleStyle::from_json_file(&path).unwrap();
        assert_eq!(style.font_size, 56);
        assert!(!style.bold);
        assert_eq!(style.back_color, "&HA0000000");
        assert_eq!(style.font_name, "Noto Sans CJK JP");
        assert_eq!(style.fade_in, 0.3);
    }
}
