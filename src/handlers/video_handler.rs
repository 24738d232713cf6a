//! Video Handler

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::video::VideoSummary;
use crate::aggregate::Video;
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

pub struct VideoHandler {
    repository: Repository<Video>,
}

impl VideoHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Count one play of an active video; returns the new view count
    pub async fn record_play(&self, video_id: Uuid) -> Result<u64, AppError> {
        let (_, views) = self
            .repository
            .mutate(video_id, |video| video.record_play())
            .await?;
        Ok(views)
    }

    pub async fn summary(&self) -> Result<VideoSummary, AppError> {
        let videos = self.repository.list().await?;
        Ok(VideoSummary::from_videos(&videos))
    }
}
