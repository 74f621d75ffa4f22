//! Shareable Content
//!
//! Text snippets and file references a user can select and send.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// What a shareable item carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemContent {
    /// Inline text snippet
    Text { body: String },
    /// Reference to a file; the bytes are never read by the simulator
    File { path: PathBuf, mime: String },
}

/// A piece of user content eligible for sharing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareableItem {
    pub id: String,
    /// Display name
    pub name: String,
    pub content: ItemContent,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// How many times the item has been shared
    #[serde(default)]
    pub share_count: u32,
    /// How many times the item has been viewed
    #[serde(default)]
    pub view_count: u32,
}

impl ShareableItem {
    /// Create a text snippet item named after its first line
    ///
    /// # Examples
    ///
    /// ```
    /// use nearshare_core::ShareableItem;
    ///
    /// let item = ShareableItem::text("Meeting at 3pm\nRoom 4");
    /// assert_eq!(item.name, "Meeting at 3pm");
    /// assert_eq!(item.size_bytes, 21);
    /// ```
    pub fn text(body: impl Into<String>) -> Self {
        let body = body.into();
        let name = body
            .lines()
            .next()
            .map(|line| truncate(line, 40))
            .filter(|line| !line.is_empty())
            .unwrap_or_else(|| "Text snippet".to_string());

        Self::new(
            name,
            body.len() as u64,
            ItemContent::Text { body },
        )
    }

    /// Create a file reference item with a known size
    pub fn file(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        Self::new(name, size_bytes, ItemContent::File { path, mime })
    }

    fn new(name: String, size_bytes: u64, content: ItemContent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            content,
            size_bytes,
            created_at: Utc::now(),
            share_count: 0,
            view_count: 0,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.content, ItemContent::Text { .. })
    }

    /// Text to place on the clipboard: the body for snippets, the name for files
    pub fn clipboard_text(&self) -> &str {
        match &self.content {
            ItemContent::Text { body } => body,
            ItemContent::File { .. } => &self.name,
        }
    }

    pub fn record_share(&mut self) {
        self.share_count = self.share_count.saturating_add(1);
    }

    pub fn record_view(&mut self) {
        self.view_count = self.view_count.saturating_add(1);
    }
}

/// Total size of a payload in bytes
pub fn payload_size(items: &[ShareableItem]) -> u64 {
    items.iter().map(|i| i.size_bytes).sum()
}

fn truncate(s: &str, max_chars: usize) -> String {
    let mut chars = s.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
