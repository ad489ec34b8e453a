// SPDX-FileCopyrightText: 2026 Volna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Volna workspace.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a message delivered to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub i64);

/// One pending publish job from the durable queue.
///
/// Items are produced externally when a tag is attached to a media record;
/// the pipeline consumes them in store-assigned sequence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub media_id: i64,
    pub title: String,
    pub teaser: Option<String>,
    /// Stored file path; relative paths are resolved against the media base
    /// directory plus a year/month segment from `occurrence_date`.
    pub path: String,
    /// Target forum thread within the group.
    pub message_thread_id: i64,
    pub tag_id: i64,
    pub tag: String,
    pub occurrence_date: NaiveDate,
    pub issue_date: Option<NaiveDate>,
    pub duration_secs: Option<i64>,
    pub size_bytes: Option<i64>,
}

impl MediaItem {
    /// Resolves the item's local file path.
    ///
    /// Empty and absolute paths are returned as-is; relative paths are
    /// joined under `base/YYYY/MM` derived from the occurrence date.
    pub fn full_local_path(&self, base: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if self.path.is_empty() || path.is_absolute() {
            return path.to_path_buf();
        }
        base.join(format!(
            "{}/{:02}",
            self.occurrence_date.year(),
            self.occurrence_date.month()
        ))
        .join(path)
    }

    /// Normalized hashtag for the item's tag: non-alphanumeric characters
    /// become underscores, prefixed with `#`.
    pub fn hashtag(&self) -> String {
        let normalized: String = self
            .tag
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("#{normalized}")
    }

    /// Base name of the stored path, used as the upload file name.
    pub fn file_name(&self) -> String {
        Path::new(&self.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }
}

/// Opaque reference to a binary already uploaded to the endpoint.
///
/// Exactly two shapes exist; the size class is the only structural
/// difference. Encoded to a storable token by the dedup codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadHandle {
    /// Small-size direct reference.
    Small { id: i64, parts: i32, name: String },
    /// Chunked big-file reference.
    Big { id: i64, parts: i32, name: String },
}

impl UploadHandle {
    pub fn id(&self) -> i64 {
        match self {
            UploadHandle::Small { id, .. } | UploadHandle::Big { id, .. } => *id,
        }
    }

    pub fn parts(&self) -> i32 {
        match self {
            UploadHandle::Small { parts, .. } | UploadHandle::Big { parts, .. } => *parts,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            UploadHandle::Small { name, .. } | UploadHandle::Big { name, .. } => name,
        }
    }

    pub fn is_big(&self) -> bool {
        matches!(self, UploadHandle::Big { .. })
    }
}

/// A message send request: an upload handle plus routing and caption data.
#[derive(Debug, Clone)]
pub struct SendMediaRequest {
    pub message_thread_id: i64,
    pub handle: UploadHandle,
    pub caption: String,
    pub file_name: String,
    pub title: String,
    pub performer: Option<String>,
    pub duration_secs: Option<i64>,
}

/// A forum topic mapped to a tag.
///
/// `created_at` is `None` until the topic has been created at the endpoint;
/// `topics update` publishes pending topics and records the thread id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub message_thread_id: Option<i64>,
    pub name: String,
    pub tag_id: i64,
    pub tag: String,
    pub icon_custom_emoji_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str, date: NaiveDate, tag: &str) -> MediaItem {
        MediaItem {
            media_id: 1,
            title: "title".into(),
            teaser: None,
            path: path.into(),
            message_thread_id: 4,
            tag_id: 2,
            tag: tag.into(),
            occurrence_date: date,
            issue_date: None,
            duration_secs: None,
            size_bytes: None,
        }
    }

    #[test]
    fn relative_path_gains_year_month_segment() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let i = item("lecture.mp3", d, "bg");
        assert_eq!(
            i.full_local_path(Path::new("/srv/audio")),
            PathBuf::from("/srv/audio/2024/03/lecture.mp3")
        );
    }

    #[test]
    fn absolute_path_is_untouched() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let i = item("/mnt/store/lecture.mp3", d, "bg");
        assert_eq!(
            i.full_local_path(Path::new("/srv/audio")),
            PathBuf::from("/mnt/store/lecture.mp3")
        );
    }

    #[test]
    fn empty_path_stays_empty() {
        let d = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let i = item("", d, "bg");
        assert_eq!(i.full_local_path(Path::new("/srv/audio")), PathBuf::new());
    }

    #[test]
    fn hashtag_replaces_separators() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(item("a", d, "srimad bhagavatam").hashtag(), "#srimad_bhagavatam");
        assert_eq!(item("a", d, "bhagavad-gita").hashtag(), "#bhagavad_gita");
        // Non-ASCII alphanumerics pass through unchanged.
        assert_eq!(item("a", d, "шб 1.2").hashtag(), "#шб_1_2");
    }

    #[test]
    fn handle_accessors_cover_both_shapes() {
        let small = UploadHandle::Small {
            id: 7,
            parts: 1,
            name: "x.mp3".into(),
        };
        let big = UploadHandle::Big {
            id: -7,
            parts: 4096,
            name: String::new(),
        };
        assert!(!small.is_big());
        assert!(big.is_big());
        assert_eq!(small.id(), 7);
        assert_eq!(big.parts(), 4096);
        assert_eq!(small.name(), "x.mp3");
    }
}
