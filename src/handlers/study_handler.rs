//! Study Handler
//!
//! Share counting and reports over Bible studies.

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::study::{popular_tags, StudySummary, TagCount};
use crate::aggregate::Study;
use crate::error::AppError;
use crate::store::{DocumentStore, Repository};

/// Tags returned by [`StudyHandler::popular_tags`] when no limit is given
pub const DEFAULT_TAG_LIMIT: usize = 10;

pub struct StudyHandler {
    repository: Repository<Study>,
}

impl StudyHandler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repository: Repository::new(store),
        }
    }

    /// Count a share; returns the new share count
    pub async fn share(&self, study_id: Uuid) -> Result<u64, AppError> {
        let (_, share_count) = self
            .repository
            .mutate(study_id, |study| Ok(study.share()))
            .await?;

        tracing::debug!(study_id = %study_id, share_count, "Study shared");
        Ok(share_count)
    }

    pub async fn summary(&self) -> Result<StudySummary, AppError> {
        let studies = self.repository.list().await?;
        Ok(StudySummary::from_studies(&studies))
    }

    pub async fn popular_tags(&self, limit: Option<usize>) -> Result<Vec<TagCount>, AppError> {
        let studies = self.repository.list().await?;
        Ok(popular_tags(&studies, limit.unwrap_or(DEFAULT_TAG_LIMIT)))
    }
}
