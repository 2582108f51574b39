use crate::session::{DEFAULT_SESSION_ROOT, SessionStatus};
use crate::subtitle::SubtitleFormat;
use crate::timing::DEFAULT_CHARS_PER_SECOND;
use crate::video::Orientation;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "newsbeat", version, about = "Turn a news song into a subtitled music video")]
pub struct Args {
    /// Log at debug level.
    #[clap(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time lyrics against the audio and write subtitle file(s).
    Subtitles(SubtitleArgs),
    /// Render a still-image music video, optionally with burned-in subtitles.
    Render(RenderArgs),
    /// Create and inspect sessions.
    #[command(subcommand)]
    Session(SessionCommand),
    /// Probe, subtitle and render the video for a session that has its music.
    Produce(ProduceArgs),
}

#[derive(ClapArgs, Debug)]
pub struct SubtitleOptions {
    /// Reading speed used to weight lines, in characters per second.
    #[clap(long, default_value_t = DEFAULT_CHARS_PER_SECOND)]
    pub cps: f64,

    /// JSON file overriding fields of the default subtitle style.
    #[clap(long)]
    pub style: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct SubtitleArgs {
    #[clap(long)]
    pub lyrics: PathBuf,

    /// Audio whose length the subtitles must fit.
    #[clap(long, required_unless_present = "duration", conflicts_with = "duration")]
    pub audio: Option<PathBuf>,

    /// Total duration in seconds, instead of probing --audio.
    #[clap(long)]
    pub duration: Option<f64>,

    #[clap(long, default_value = "subtitles")]
    pub out: PathBuf,

    #[clap(long, value_enum, default_value_t = SubtitleFormat::Both)]
    pub format: SubtitleFormat,

    #[command(flatten)]
    pub options: SubtitleOptions,
}

#[derive(ClapArgs, Debug)]
pub struct VideoOptions {
    #[clap(long, value_enum, default_value_t = Orientation::Portrait)]
    pub orientation: Orientation,

    #[clap(long, default_value_t = 30)]
    pub fps: u32,

    /// x264 quality, lower is better.
    #[clap(long, default_value_t = 23)]
    pub crf: u32,
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    #[clap(long)]
    pub audio: PathBuf,

    #[clap(long)]
    pub image: PathBuf,

    #[clap(long)]
    pub subtitles: Option<PathBuf>,

    #[clap(long, default_value = "video.mp4")]
    pub out: PathBuf,

    #[command(flatten)]
    pub video: VideoOptions,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Start a session from a news JSON file.
    New {
        #[clap(long)]
        news: PathBuf,

        /// Lyrics written for this news item; copied into the session.
        #[clap(long)]
        lyrics: Option<PathBuf>,

        #[clap(long, default_value = DEFAULT_SESSION_ROOT)]
        root: PathBuf,
    },
    /// List sessions, newest first.
    List {
        #[clap(long, value_enum)]
        status: Option<SessionStatus>,

        #[clap(long)]
        limit: Option<usize>,

        #[clap(long, default_value = DEFAULT_SESSION_ROOT)]
        root: PathBuf,
    },
    /// Show one session and its next step.
    Show {
        id: String,

        #[clap(long, default_value = DEFAULT_SESSION_ROOT)]
        root: PathBuf,
    },
}

#[derive(ClapArgs, Debug)]
pub struct ProduceArgs {
    pub id: String,

    #[clap(long, default_value = DEFAULT_SESSION_ROOT)]
    pub root: PathBuf,

    /// Still image for the video; defaults to the session's thumbnail.jpg.
    #[clap(long)]
    pub image: Option<PathBuf>,

    /// Subtitle format to burn in.
    #[clap(long, value_enum, default_value_t = SubtitleFormat::Ass)]
    pub format: SubtitleFormat,

    #[command(flatten)]
    pub options: SubtitleOptions,

    #[command(flatten)]
    pub video: VideoOptions,

    /// Also cut the song into vertical shorts of at most SECS seconds each.
    #[clap(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "30")]
    pub shorts: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn subtitles_with_duration() {
        let args = Args::parse_from([
            "newsbeat", "subtitles", "--lyrics", "lyrics.txt", "--duration", "70", "--format", "srt",
        ]);
        match args.command {
            Command::Subtitles(s) => {
                assert_eq!(s.duration, Some(70.0));
                assert_eq!(s.format, SubtitleFormat::Srt);
                assert_eq!(s.options.cps, DEFAULT_CHARS_PER_SECOND);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn subtitles_need_audio_or_duration() {
        let result = Args::try_parse_from(["newsbeat", "subtitles", "--lyrics", "lyrics.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn session_list_filters_by_status() {
        let args = Args::parse_from([
            "newsbeat", "session", "list", "--status", "music-uploaded", "--limit", "3",
        ]);
        match args.command {
            Command::Session(SessionCommand::List { status, limit, .. }) => {
                assert_eq!(status, Some(SessionStatus::MusicUploaded));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn produce_shorts_length_is_optional() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["newsbeat", "produce", "20260110_143052"];
            argv.extend_from_slice(extra);
            match Args::parse_from(argv).command {
                Command::Produce(p) => p.shorts,
                other => panic!("unexpected command {other:?}"),
            }
        };
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--shorts"]), Some(30.0));
        assert_eq!(parse(&["--shorts", "45"]), Some(45.0));
    }
}
