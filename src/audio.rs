use anyhow::Context;
use hound::WavReader;
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

pub fn wav_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to read WAV header of '{}'", path.display()))?;
    let spec = reader.spec();
    let samples = reader.len();
    let frames = samples as f64 / spec.channels as f64;
    let duration = frames / spec.sample_rate as f64;
    Ok(duration)
}

fn parse_probe_duration(json: &[u8]) -> anyhow::Result<f64> {
    let parsed: ProbeOutput = serde_json::from_slice(json).context("ffprobe json parse failed")?;
    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| anyhow::anyhow!("ffprobe reported no duration"))?;
    raw.trim()
        .parse::<f64>()
        .with_context(|| format!("ffprobe duration '{}' is not a number", raw))
}

pub fn ffprobe_duration_seconds(path: &Path) -> anyhow::Result<f64> {
    debug!("Running ffprobe on {}", path.display());
    let out = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .output()
        .context("failed to run ffprobe")?;
    if !out.status.success() {
        anyhow::bail!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    parse_probe_duration(&out.stdout)
}

/// Length of an audio file in seconds. WAV is read directly, anything else
/// goes through ffprobe.
pub fn probe_duration(path: impl AsRef<Path>) -> anyhow::Result<f64> {
    let path = path.as_ref();
    if !path.is_file() {
        anyhow::bail!("audio file not found: {}", path.display());
    }

    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    let duration = if is_wav {
        wav_duration_seconds(path)?
    } else {
        ffprobe_duration_seconds(path)?
    };

    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!(
            "audio '{}' has no usable duration ({})",
            path.display(),
            duration
        );
    }
    info!("Audio {} lasts {:.2} seconds", path.display(), duration);
    Ok(duration)
}
