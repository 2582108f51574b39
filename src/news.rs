use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// The news story a song is written about. Arrives already scored and
/// structured; this crate only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    pub date: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub evaluation_score: Option<u32>,
    #[serde(default)]
    pub is_suitable: Option<bool>,
}

impl NewsItem {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("news item has an empty title");
        }
        if self.content.trim().is_empty() {
            anyhow::bail!("news item '{}' has no content", self.title.trim());
        }
        Ok(())
    }
}

pub fn load_news(path: impl AsRef<Path>) -> anyhow::Result<NewsItem> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read news file '{}'", path.display()))?;
    let item: NewsItem = serde_json::from_str(&data)
        .with_context(|| format!("invalid news file '{}'", path.display()))?;
    item.validate()?;
    info!("Loaded news: {}", item.title);
    Ok(item)
}
