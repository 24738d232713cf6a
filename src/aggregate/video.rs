//! Video Aggregate
//!
//! Uploaded or YouTube-hosted videos. Deleting a video only deactivates it;
//! inactive videos behave as missing everywhere.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    DomainError, EngagementSet, EngagementStatistics, NestedCollection, OperationContext,
};

use super::{optional_text, text_matches, Aggregate, Comment, Discussable, Document};

const YOUTUBE_ID_LENGTH: usize = 11;
const YOUTUBE_MARKERS: [&str; 5] = [
    "youtube.com/shorts/",
    "youtu.be/",
    "youtube.com/watch?v=",
    "youtube.com/embed/",
    "youtube.com/v/",
];

/// Extract the video id from a YouTube link
pub fn extract_youtube_id(url: &str) -> Option<String> {
    YOUTUBE_MARKERS.iter().find_map(|marker| {
        let start = url.find(marker)? + marker.len();
        let id: String = url[start..]
            .chars()
            .take_while(|c| !matches!(c, '&' | '?' | '#' | '\n' | '/'))
            .take(YOUTUBE_ID_LENGTH)
            .collect();
        (!id.is_empty()).then_some(id)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoKind {
    #[default]
    Uploaded,
    Youtube,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    #[serde(default)]
    pub version: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: VideoKind,
    /// Location of an uploaded file
    pub src: Option<String>,
    pub youtube_id: Option<String>,
    pub youtube_url: Option<String>,
    pub youtube_channel: Option<String>,
    pub posted_by_id: Option<String>,
    pub posted_by: String,
    pub is_active: bool,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: EngagementSet,
    #[serde(default)]
    pub favorites: EngagementSet,
    #[serde(default)]
    pub comments: NestedCollection<Comment>,
    #[serde(default)]
    pub statistics: EngagementStatistics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Count a play; fails for inactive videos
    pub fn record_play(&mut self) -> Result<u64, DomainError> {
        self.ensure_open()?;
        self.views += 1;
        Ok(self.views)
    }

    pub fn embed_url(&self) -> Option<String> {
        self.youtube_id.as_ref().map(|id| {
            format!(
                "https://www.youtube.com/embed/{}?autoplay=1&controls=1&modestbranding=1&rel=0",
                id
            )
        })
    }

    pub fn thumbnail_url(&self) -> Option<String> {
        self.youtube_id
            .as_ref()
            .map(|id| format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", id))
    }
}

impl Aggregate for Video {
    fn aggregate_type() -> &'static str {
        "Video"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn refresh_statistics(&mut self) -> Result<(), DomainError> {
        self.statistics = EngagementStatistics::recompute(&self.likes, &self.favorites, &self.comments)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), DomainError> {
        match self.kind {
            VideoKind::Uploaded if self.src.is_none() => {
                Err(DomainError::validation("uploaded videos need a src"))
            }
            VideoKind::Youtube if self.youtube_id.is_none() => {
                Err(DomainError::validation("YouTube videos need a valid YouTube URL"))
            }
            _ => Ok(()),
        }
    }
}

impl Discussable for Video {
    fn likes_mut(&mut self) -> &mut EngagementSet {
        &mut self.likes
    }

    fn favorites_mut(&mut self) -> &mut EngagementSet {
        &mut self.favorites
    }

    fn comments(&self) -> &NestedCollection<Comment> {
        &self.comments
    }

    fn comments_mut(&mut self) -> &mut NestedCollection<Comment> {
        &mut self.comments
    }

    fn engagement(&self) -> &EngagementStatistics {
        &self.statistics
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_active {
            Ok(())
        } else {
            Err(DomainError::not_found("Video", self.id))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoDraft {
    #[serde(default)]
    pub kind: VideoKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub src: Option<String>,
    pub youtube_url: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoFilter {
    pub kind: Option<VideoKind>,
    pub search: Option<String>,
}

/// Video with derived playback links
#[derive(Debug, Clone, Serialize)]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    pub is_youtube: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl Document for Video {
    type Draft = VideoDraft;
    type Patch = VideoPatch;
    type Filter = VideoFilter;
    type View = VideoView;

    fn from_draft(
        draft: VideoDraft,
        context: &OperationContext,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let (src, youtube_id, youtube_url) = match draft.kind {
            VideoKind::Uploaded => {
                let src = optional_text(draft.src.as_deref())
                    .ok_or_else(|| DomainError::validation("src is required for uploaded videos"))?;
                (Some(src), None, None)
            }
            VideoKind::Youtube => {
                let url = optional_text(draft.youtube_url.as_deref())
                    .ok_or_else(|| DomainError::validation("YouTube URL is required"))?;
                let id = extract_youtube_id(&url)
                    .ok_or_else(|| DomainError::validation("Invalid YouTube URL format"))?;
                (None, Some(id), Some(url))
            }
        };

        let default_title = match draft.kind {
            VideoKind::Uploaded => "Untitled video",
            VideoKind::Youtube => "YouTube Video",
        };

        Ok(Self {
            id: Uuid::new_v4(),
            version: 0,
            title: optional_text(draft.title.as_deref()).unwrap_or_else(|| default_title.to_string()),
            description: optional_text(draft.description.as_deref()).unwrap_or_default(),
            kind: draft.kind,
            src,
            youtube_id,
            youtube_url,
            youtube_channel: optional_text(draft.channel.as_deref()),
            posted_by_id: context.identity.as_ref().map(|identity| identity.user_id.clone()),
            posted_by: context.actor_name().to_string(),
            is_active: true,
            views: 0,
            likes: EngagementSet::new(),
            favorites: EngagementSet::new(),
            comments: NestedCollection::new(),
            statistics: EngagementStatistics::default(),
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(
        &mut self,
        patch: &VideoPatch,
        _context: &OperationContext,
        _now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_open()?;
        if let Some(title) = &patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = &patch.description {
            self.description = description.trim().to_string();
        }
        Ok(())
    }

    fn matches(&self, filter: &VideoFilter, _now: DateTime<Utc>) -> bool {
        if filter.kind.is_some_and(|kind| kind != self.kind) {
            return false;
        }
        match &filter.search {
            Some(search) => text_matches(search, [self.title.as_str(), self.description.as_str()]),
            None => true,
        }
    }

    fn listing_order(&self, other: &Self) -> Ordering {
        other.created_at.cmp(&self.created_at)
    }

    fn into_view(self, _now: DateTime<Utc>) -> VideoView {
        VideoView {
            is_youtube: self.kind == VideoKind::Youtube,
            embed_url: self.embed_url(),
            thumbnail_url: self.thumbnail_url(),
            video: self,
        }
    }

    fn is_visible(&self) -> bool {
        self.is_active
    }

    fn retire(&mut self) -> bool {
        self.is_active = false;
        true
    }
}

/// Totals over active videos
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VideoSummary {
    pub total_videos: u64,
    pub uploaded_videos: u64,
    pub youtube_videos: u64,
    pub total_likes: u64,
    pub total_views: u64,
}

impl VideoSummary {
    pub fn from_videos<'a>(videos: impl IntoIterator<Item = &'a Video>) -> Self {
        videos
            .into_iter()
            .filter(|video| video.is_active)
            .fold(Self::default(), |mut summary, video| {
                summary.total_videos += 1;
                match video.kind {
                    VideoKind::Uploaded => summary.uploaded_videos += 1,
                    VideoKind::Youtube => summary.youtube_videos += 1,
                }
                summary.total_likes += u64::from(video.statistics.likes_count);
                summary.total_views += video.views;
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn youtube(url: &str) -> Result<Video, DomainError> {
        Video::from_draft(
            VideoDraft {
                kind: VideoKind::Youtube,
                title: None,
                description: None,
                src: None,
                youtube_url: Some(url.to_string()),
                channel: None,
            },
            &OperationContext::default(),
            Utc::now(),
        )
    }

    #[test]
    fn test_extract_youtube_id() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/shorts/abcdefghijkLMN").as_deref(),
            Some("abcdefghijk")
        );
        assert_eq!(extract_youtube_id("https://vimeo.com/123"), None);
    }

    #[test]
    fn test_youtube_draft_requires_valid_url() {
        assert!(matches!(
            youtube("https://example.com/watch"),
            Err(DomainError::Validation(_))
        ));

        let video = youtube("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.title, "YouTube Video");
        assert!(video.validate().is_ok());

        let view = video.into_view(Utc::now());
        assert!(view.is_youtube);
        assert!(view.embed_url.unwrap().contains("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_retired_video_rejects_engagement() {
        let mut video = youtube("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(video.retire());
        assert!(!video.is_visible());

        assert!(matches!(
            video.toggle_like("u1"),
            Err(DomainError::NotFound { kind: "Video", .. })
        ));
        assert!(video.record_play().is_err());
    }

    #[test]
    fn test_likes_are_per_user() {
        let mut video = youtube("https://youtu.be/dQw4w9WgXcQ").unwrap();
        video.toggle_like("u1").unwrap();
        let outcome = video.toggle_like("u1").unwrap();
        assert!(!outcome.new_state);
        assert_eq!(outcome.collection_size, 0);
    }

    #[test]
    fn test_summary_skips_inactive() {
        let mut active = youtube("https://youtu.be/aaaaaaaaaaa").unwrap();
        active.record_play().unwrap();
        active.toggle_like("u1").unwrap();
        active.refresh_statistics().unwrap();
        let mut retired = youtube("https://youtu.be/bbbbbbbbbbb").unwrap();
        retired.retire();

        let summary = VideoSummary::from_videos([&active, &retired]);
        assert_eq!(summary.total_videos, 1);
        assert_eq!(summary.youtube_videos, 1);
        assert_eq!(summary.total_likes, 1);
        assert_eq!(summary.total_views, 1);
    }
}
