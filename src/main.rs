mod args;
mod ass;
mod audio;
mod lyrics;
mod news;
mod session;
mod subtitle;
mod timing;
mod video;

use anyhow::Context;
use args::{
    Args, Command, ProduceArgs, RenderArgs, SessionCommand, SubtitleArgs, SubtitleOptions,
    VideoOptions,
};
use ass::SubtitleStyle;
use clap::Parser;
use session::{SessionStatus, SessionStore};
use std::fs;
use std::path::{Path, PathBuf};
use subtitle::{SubtitleFormat, generate_subtitles};
use tracing::{error, info, warn};
use video::{RenderConfig, render_shorts, render_video};

const LYRICS_FILE: &str = "lyrics.txt";
const NEWS_FILE: &str = "news.json";
const MUSIC_FILES: [&str; 2] = ["music.mp3", "music.wav"];
const THUMBNAIL_FILE: &str = "thumbnail.jpg";
const VIDEO_FILE: &str = "video.mp4";
const SHORTS_DIR: &str = "shorts";

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "debug" } else { "info" })
        .init();

    match args.command {
        Command::Subtitles(a) => run_subtitles(a),
        Command::Render(a) => run_render(a),
        Command::Session(c) => run_session(c),
        Command::Produce(a) => run_produce(a),
    }
}

fn load_style(options: &SubtitleOptions) -> anyhow::Result<SubtitleStyle> {
    match &options.style {
        Some(path) => {
            info!("Using subtitle style from {}", path.display());
            SubtitleStyle::from_json_file(path)
        }
        None => Ok(SubtitleStyle::default()),
    }
}

fn render_config(video: &VideoOptions) -> RenderConfig {
    RenderConfig {
        orientation: video.orientation,
        fps: video.fps,
        crf: video.crf,
        ..RenderConfig::default()
    }
}

fn run_subtitles(a: SubtitleArgs) -> anyhow::Result<()> {
    let lyrics = fs::read_to_string(&a.lyrics)
        .with_context(|| format!("failed to read lyrics '{}'", a.lyrics.display()))?;
    let duration = match (a.duration, &a.audio) {
        (Some(d), _) => d,
        (None, Some(path)) => audio::probe_duration(path)?,
        (None, None) => anyhow::bail!("either --audio or --duration is required"),
    };
    let style = load_style(&a.options)?;

    let written = generate_subtitles(&lyrics, &a.out, duration, a.options.cps, a.format, &style)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_render(a: RenderArgs) -> anyhow::Result<()> {
    let out = render_video(
        &a.audio,
        &a.image,
        a.subtitles.as_deref(),
        &a.out,
        &render_config(&a.video),
    )?;
    println!("{}", out.display());
    Ok(())
}

fn run_session(command: SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::New {
            news: news_path,
            lyrics,
            root,
        } => {
            let store = SessionStore::new(root)?;
            let item = news::load_news(&news_path)?;
            let mut session = store.create(&item)?;
            fs::write(
                store.file_path(&session.session_id, NEWS_FILE),
                serde_json::to_string_pretty(&item)?,
            )?;

            if let Some(lyrics) = lyrics {
                let target = store.file_path(&session.session_id, LYRICS_FILE);
                fs::copy(&lyrics, &target)
                    .with_context(|| format!("failed to copy lyrics '{}'", lyrics.display()))?;
                session = store.update(&session.session_id, |s| {
                    s.status = SessionStatus::LyricsGenerated;
                    s.lyrics_file = Some(LYRICS_FILE.to_string());
                })?;
            }
            print_session(&session);
        }
        SessionCommand::List { status, limit, root } => {
            let store = SessionStore::new(root)?;
            let sessions = store.list(status, limit)?;
            info!("{} sessions in {}", sessions.len(), store.root().display());
            for session in sessions {
                println!("{}\n", session);
            }
        }
        SessionCommand::Show { id, root } => {
            let store = SessionStore::new(root)?;
            print_session(&store.load(&id)?);
        }
    }
    Ok(())
}

fn print_session(session: &session::Session) {
    println!("{}", session);
    if let Some(step) = session.next_step() {
        println!("\nNext: {}", step);
    }
}

fn find_music(store: &SessionStore, id: &str) -> Option<(&'static str, PathBuf)> {
    MUSIC_FILES
        .iter()
        .map(|name| (*name, store.file_path(id, name)))
        .find(|(_, path)| path.is_file())
}

fn run_produce(a: ProduceArgs) -> anyhow::Result<()> {
    let store = SessionStore::new(&a.root)?;
    let session = store.load(&a.id)?;
    info!("Producing video for session {} ({})", a.id, session.news_title);

    let Some((music_name, music)) = find_music(&store, &a.id) else {
        error!(
            "No music found; place {} in {}",
            MUSIC_FILES.join(" or "),
            store.session_dir(&a.id).display()
        );
        anyhow::bail!("session {} has no music file", a.id);
    };
    if session.status < SessionStatus::MusicUploaded {
        store.update(&a.id, |s| {
            s.advance_to(SessionStatus::MusicUploaded);
            s.music_file = Some(music_name.to_string());
        })?;
    }

    let lyrics_path = store.file_path(&a.id, LYRICS_FILE);
    let lyrics = fs::read_to_string(&lyrics_path)
        .with_context(|| format!("failed to read lyrics '{}'", lyrics_path.display()))?;
    let duration = audio::probe_duration(&music)?;
    let style = load_style(&a.options)?;

    let written = generate_subtitles(
        &lyrics,
        store.file_path(&a.id, "subtitles"),
        duration,
        a.options.cps,
        a.format,
        &style,
    )?;
    let burn_in = pick_burn_in(&written, a.format)
        .ok_or_else(|| anyhow::anyhow!("no subtitle file was written"))?;

    let image = a
        .image
        .clone()
        .unwrap_or_else(|| store.file_path(&a.id, THUMBNAIL_FILE));
    if !image.is_file() {
        warn!("Pass --image or place {} in the session directory", THUMBNAIL_FILE);
        anyhow::bail!("image not found: {}", image.display());
    }

    let cfg = render_config(&a.video);
    let video = render_video(
        &music,
        &image,
        Some(&burn_in),
        &store.file_path(&a.id, VIDEO_FILE),
        &cfg,
    )?;
    info!("Video ready: {}", video.display());

    let shorts: Vec<String> = match a.shorts {
        Some(max) => {
            let dir = store.session_dir(&a.id).join(SHORTS_DIR);
            render_shorts(&music, &image, &dir, max, &cfg)?
                .iter()
                .filter_map(|p| file_name(p))
                .map(|name| format!("{}/{}", SHORTS_DIR, name))
                .collect()
        }
        None => Vec::new(),
    };

    let subtitle_name = file_name(&burn_in);
    let image_in_session = image.parent() == Some(store.session_dir(&a.id).as_path());
    let session = store.update(&a.id, |s| {
        s.advance_to(SessionStatus::VideoGenerated);
        s.subtitle_file = subtitle_name;
        s.video_file = Some(VIDEO_FILE.to_string());
        if image_in_session {
            s.thumbnail_file = file_name(&image);
        }
        if !shorts.is_empty() {
            s.shorts_files = shorts;
        }
    })?;

    print_session(&session);
    Ok(())
}

// The styled document wins when both formats were written.
fn pick_burn_in(written: &[PathBuf], format: SubtitleFormat) -> Option<PathBuf> {
    let wanted = format.extension().unwrap_or("ass");
    written
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == wanted))
        .or_else(|| written.first())
        .cloned()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
