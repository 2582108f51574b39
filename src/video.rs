use crate::audio::probe_duration;
use crate::subtitle::ensure_parent_dir;
use anyhow::Context;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Orientation {
    /// 1080x1920, for Shorts and TikTok.
    Portrait,
    /// 1920x1080.
    Landscape,
}

impl Orientation {
    pub fn frame_size(self) -> (u32, u32) {
        match self {
            Orientation::Portrait => (1080, 1920),
            Orientation::Landscape => (1920, 1080),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub orientation: Orientation,
    pub fps: u32,
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            fps: 30,
            crf: 23,
            preset: "medium".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// Filter arguments treat ':' '\' and quotes specially.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

fn video_filter(cfg: &RenderConfig, subtitles: Option<&Path>) -> String {
    let (w, h) = cfg.orientation.frame_size();
    let mut vf = format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2"
    );
    if let Some(subs) = subtitles {
        vf.push_str(&format!(",subtitles='{}'", escape_filter_path(subs)));
    }
    vf
}

fn ffmpeg_args(
    audio: &Path,
    image: &Path,
    subtitles: Option<&Path>,
    window: Option<&ShortSegment>,
    output: &Path,
    cfg: &RenderConfig,
) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into(), "-loop".into(), "1".into(), "-i".into()];
    args.push(image.to_string_lossy().into_owned());
    if let Some(seg) = window {
        args.extend([
            "-ss".to_string(),
            format!("{:.3}", seg.start),
            "-t".into(),
            format!("{:.3}", seg.duration),
        ]);
    }
    args.push("-i".into());
    args.push(audio.to_string_lossy().into_owned());
    args.extend([
        "-vf".to_string(),
        video_filter(cfg, subtitles),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        cfg.preset.clone(),
        "-crf".into(),
        cfg.crf.to_string(),
        "-tune".into(),
        "stillimage".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        cfg.audio_bitrate.clone(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-r".into(),
        cfg.fps.to_string(),
        "-movflags".into(),
        "+faststart".into(),
        "-shortest".into(),
    ]);
    args.push(output.to_string_lossy().into_owned());
    args
}

fn run_ffmpeg(args: &[String], output: &Path) -> anyhow::Result<()> {
    debug!("ffmpeg {}", args.join(" "));
    let out = Command::new("ffmpeg")
        .args(args)
        .output()
        .context("failed to run ffmpeg")?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        error!("ffmpeg failed to produce {}", output.display());
        anyhow::bail!("ffmpeg failed to produce video: {}", stderr.trim());
    }
    Ok(())
}

/// Loops `image` over `audio` and, when given, burns `subtitles` (SRT or ASS)
/// into the frames.
pub fn render_video(
    audio: &Path,
    image: &Path,
    subtitles: Option<&Path>,
    output: &Path,
    cfg: &RenderConfig,
) -> anyhow::Result<PathBuf> {
    if !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }
    for (what, path) in [("audio", Some(audio)), ("image", Some(image)), ("subtitle", subtitles)] {
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("{} file not found: {}", what, path.display());
            }
        }
    }
    ensure_parent_dir(output)?;

    info!("Rendering video {}", output.display());
    info!("  audio: {}", audio.display());
    info!("  image: {}", image.display());
    if let Some(subs) = subtitles {
        info!("  subtitles: {}", subs.display());
    }

    run_ffmpeg(&ffmpeg_args(audio, image, subtitles, None, output, cfg), output)?;

    if let Ok(meta) = std::fs::metadata(output) {
        info!(
            "Video written to {} ({:.2} MB)",
            output.display(),
            meta.len() as f64 / 1024.0 / 1024.0
        );
    }
    Ok(output.to_path_buf())
}

/// One slice of the song rendered as its own vertical short.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortSegment {
    pub index: usize,
    pub start: f64,
    pub duration: f64,
    pub file_name: String,
}

/// Cuts `total_duration` into `ceil(total / max)` back-to-back slices of at
/// most `max_duration` seconds; the last slice takes the remainder.
pub fn plan_shorts(total_duration: f64, max_duration: f64) -> Vec<ShortSegment> {
    if !(total_duration.is_finite() && max_duration.is_finite())
        || total_duration <= 0.0
        || max_duration <= 0.0
    {
        return Vec::new();
    }
    // Slack so 60.0000001s at a 30s max does not spawn a sliver third part.
    let parts = ((total_duration - 1e-6) / max_duration).ceil().max(1.0) as usize;
    (0..parts)
        .map(|i| {
            let start = i as f64 * max_duration;
            ShortSegment {
                index: i + 1,
                start,
                duration: max_duration.min(total_duration - start),
                file_name: format!("short_{:02}.mp4", i + 1),
            }
        })
        .collect()
}

/// Renders the song as portrait shorts of at most `max_duration` seconds each
/// into `out_dir`. Returns the files in playback order.
pub fn render_shorts(
    audio: &Path,
    image: &Path,
    out_dir: &Path,
    max_duration: f64,
    cfg: &RenderConfig,
) -> anyhow::Result<Vec<PathBuf>> {
    if !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg not found on PATH");
    }
    if !image.is_file() {
        anyhow::bail!("image file not found: {}", image.display());
    }
    let duration = probe_duration(audio)?;
    let plan = plan_shorts(duration, max_duration);
    if plan.is_empty() {
        anyhow::bail!("invalid shorts length {} seconds", max_duration);
    }
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory '{}'", out_dir.display()))?;

    // Shorts are always vertical.
    let cfg = RenderConfig {
        orientation: Orientation::Portrait,
        ..cfg.clone()
    };
    info!(
        "Rendering {} shorts of up to {}s from {:.1}s of audio",
        plan.len(),
        max_duration,
        duration
    );

    let mut written = Vec::with_capacity(plan.len());
    for seg in &plan {
        let output = out_dir.join(&seg.file_name);
        info!(
            "Short {}/{}: {:.1}s - {:.1}s",
            seg.index,
            plan.len(),
            seg.start,
            seg.start + seg.duration
        );
        run_ffmpeg(&ffmpeg_args(audio, image, None, Some(seg), &output, &cfg), &output)?;
        written.push(output);
    }
    info!("{} shorts written to {}", written.len(), out_dir.display());
    Ok(written)
}
