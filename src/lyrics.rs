use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// Whole-line song structure labels such as "[Chorus]" or "[Verse 1]".
static SECTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[.*\]$").expect("section marker pattern is valid"));

/// One displayable line of lyrics: trimmed, non-empty, never a section marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    text: String,
}

impl LyricLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters, which is what reading speed is measured in.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn is_section_marker(line: &str) -> bool {
    SECTION_MARKER.is_match(line)
}

pub fn segment(raw_text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    for raw in raw_text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if is_section_marker(trimmed) {
            debug!("Skipping section marker {}", trimmed);
            continue;
        }
        lines.push(LyricLine {
            text: trimmed.to_string(),
        });
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[LyricLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text()).collect()
    }

    #[test]
    fn strips_markers_blank_lines_and_whitespace() {
        let lines = segment("[Intro]\nhello\n\n[Verse 1]\nworld  \n");
        assert_eq!(texts(&lines), vec!["hello", "world"]);
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        assert!(segment("").is_empty());
        assert!(segment("   \n\t\n  \r\n").is_empty());
    }

    #[test]
    fn only_whole_line_markers_are_dropped() {
        let lines = segment("[Chorus] la la\nsing [loud]\n  [Bridge]  \n[]\n[unclosed");
        assert_eq!(texts(&lines), vec!["[Chorus] la la", "sing [loud]", "[unclosed"]);
    }

    #[test]
    fn handles_crlf_and_keeps_order() {
        let lines = segment("one\r\ntwo\r\n\r\nthree");
        assert_eq!(texts(&lines), vec!["one", "two", "three"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let lines = segment("ニュースの時間だよ");
        assert_eq!(lines[0].char_count(), 9);
    }
}
