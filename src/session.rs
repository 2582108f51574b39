//! Flat-file bookkeeping for one news-to-video run.
//!
//! Every session is a directory `<root>/<id>/` holding `metadata.json` next to
//! the artifacts the pipeline produces (lyrics, music, subtitles, video).

use crate::news::NewsItem;
use anyhow::Context;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const DEFAULT_SESSION_ROOT: &str = "output/sessions";
const METADATA_FILE: &str = "metadata.json";

/// Pipeline stage of a session. Variants are ordered by pipeline progress.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    LyricsGenerated,
    MusicUploaded,
    VideoGenerated,
    YoutubeUploaded,
    ShortsUploaded,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Created => "created",
            SessionStatus::LyricsGenerated => "lyrics_generated",
            SessionStatus::MusicUploaded => "music_uploaded",
            SessionStatus::VideoGenerated => "video_generated",
            SessionStatus::YoutubeUploaded => "youtube_uploaded",
            SessionStatus::ShortsUploaded => "shorts_uploaded",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: String,
    pub status: SessionStatus,
    pub news_title: String,
    pub news_source: String,
    pub news_date: String,
    #[serde(default)]
    pub evaluation_score: Option<u32>,
    #[serde(default)]
    pub is_suitable: Option<bool>,

    // File names relative to the session directory.
    #[serde(default)]
    pub lyrics_file: Option<String>,
    #[serde(default)]
    pub music_file: Option<String>,
    #[serde(default)]
    pub subtitle_file: Option<String>,
    #[serde(default)]
    pub thumbnail_file: Option<String>,
    #[serde(default)]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shorts_files: Vec<String>,

    #[serde(default)]
    pub youtube_video_id: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub youtube_shorts_info_file: Option<String>,
}

impl Session {
    /// What the operator should do next, if anything.
    pub fn next_step(&self) -> Option<String> {
        let id = &self.session_id;
        match self.status {
            SessionStatus::Created => Some(format!(
                "Write the lyrics to lyrics.txt in session {id}"
            )),
            SessionStatus::LyricsGenerated => Some(format!(
                "Generate the song from lyrics.txt, save it as music.mp3 in session {id}, \
                 then run: newsbeat produce {id}"
            )),
            SessionStatus::MusicUploaded => Some(format!("Run: newsbeat produce {id}")),
            SessionStatus::VideoGenerated => self
                .video_file
                .as_ref()
                .map(|v| format!("Upload {v} from session {id}")),
            SessionStatus::YoutubeUploaded if self.shorts_files.is_empty() => Some(format!(
                "Optionally run: newsbeat produce {id} --shorts"
            )),
            SessionStatus::YoutubeUploaded => Some(format!("Upload the shorts from session {id}")),
            SessionStatus::ShortsUploaded => None,
        }
    }

    /// Moves the status forward to `status`. A session that is already further
    /// along keeps its status.
    pub fn advance_to(&mut self, status: SessionStatus) {
        if self.status < status {
            self.status = status;
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Session: {}", self.session_id)?;
        writeln!(f, "  status: {}", self.status)?;
        writeln!(f, "  news:   {}", self.news_title)?;
        writeln!(f, "  source: {}", self.news_source)?;
        write!(f, "  date:   {}", self.news_date)?;
        if let Some(score) = self.evaluation_score {
            write!(f, "\n  score:  {}", score)?;
        }
        if let Some(url) = &self.youtube_url {
            write!(f, "\n  video:  {}", url)?;
        }
        Ok(())
    }
}

// `20260110_090000_10` sorts after `20260110_090000_2`; a bare ID counts as 1.
fn id_order(id: &str) -> (&str, u32) {
    let mut parts = id.splitn(3, '_');
    let (Some(_), Some(_), Some(suffix)) = (parts.next(), parts.next(), parts.next()) else {
        return (id, 1);
    };
    match suffix.parse() {
        Ok(n) => (&id[..id.len() - suffix.len() - 1], n),
        Err(_) => (id, 1),
    }
}

pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn new(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create session root '{}'", root.display()))?;
        debug!("Session root: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    pub fn file_path(&self, session_id: &str, file_name: &str) -> PathBuf {
        self.session_dir(session_id).join(file_name)
    }

    pub fn create(&self, news: &NewsItem) -> anyhow::Result<Session> {
        self.create_at(news, Local::now())
    }

    fn create_at(&self, news: &NewsItem, now: DateTime<Local>) -> anyhow::Result<Session> {
        let base_id = now.format("%Y%m%d_%H%M%S").to_string();
        let mut session_id = base_id.clone();
        let mut n = 2;
        while self.session_dir(&session_id).exists() {
            session_id = format!("{}_{}", base_id, n);
            n += 1;
        }
        fs::create_dir_all(self.session_dir(&session_id))?;

        let session = Session {
            session_id,
            created_at: now.to_rfc3339(),
            status: SessionStatus::Created,
            news_title: news.title.clone(),
            news_source: news.source.clone(),
            news_date: news.date.clone(),
            evaluation_score: news.evaluation_score,
            is_suitable: news.is_suitable,
            lyrics_file: None,
            music_file: None,
            subtitle_file: None,
            thumbnail_file: None,
            video_file: None,
            shorts_files: Vec::new(),
            youtube_video_id: None,
            youtube_url: None,
            youtube_shorts_info_file: None,
        };
        self.save(&session)?;
        info!("Created session {}", session.session_id);
        Ok(session)
    }

    pub fn load(&self, session_id: &str) -> anyhow::Result<Session> {
        let path = self.file_path(session_id, METADATA_FILE);
        if !path.exists() {
            anyhow::bail!("session {} not found ({})", session_id, path.display());
        }
        let data = fs::read_to_string(&path)?;
        let session = serde_json::from_str(&data)
            .with_context(|| format!("corrupt session metadata '{}'", path.display()))?;
        Ok(session)
    }

    /// Loads the session, applies `change` and writes it back.
    pub fn update<F>(&self, session_id: &str, change: F) -> anyhow::Result<Session>
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.load(session_id)?;
        let before = session.status;
        change(&mut session);
        if session.status != before {
            info!("Session {}: {} -> {}", session_id, before, session.status);
        }
        self.save(&session)?;
        Ok(session)
    }

    /// Sessions newest first, optionally filtered by status and capped at `limit`.
    pub fn list(
        &self,
        status: Option<SessionStatus>,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<Session>> {
        let mut ids: Vec<String> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(METADATA_FILE).is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();
        ids.sort_unstable_by(|a, b| id_order(b).cmp(&id_order(a)));

        let mut sessions = Vec::new();
        for id in ids {
            if limit.is_some_and(|l| sessions.len() >= l) {
                break;
            }
            match self.load(&id) {
                Ok(session) => {
                    if status.is_none_or(|s| session.status == s) {
                        sessions.push(session);
                    }
                }
                Err(e) => warn!("Skipping unreadable session {}: {:#}", id, e),
            }
        }
        Ok(sessions)
    }

    fn save(&self, session: &Session) -> anyhow::Result<()> {
        let path = self.file_path(&session.session_id, METADATA_FILE);
        let data = serde_json::to_string_pretty(session)?;
        fs::write(&path, data)
            .with_context(|| format!("failed to write session metadata '{}'", path.display()))?;
        debug!("Saved {}", path.display());
        Ok(())
    }
}
