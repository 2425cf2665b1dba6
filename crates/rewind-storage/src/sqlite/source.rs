//! `FrameSource` 포트 구현.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewind_core::error::CoreError;
use rewind_core::models::calendar::TimeRange;
use rewind_core::models::frame::Frame;
use rewind_core::ports::frame_source::FrameSource;

use super::SqliteStorage;

#[async_trait]
impl FrameSource for SqliteStorage {
    async fn earliest_recorded_at(&self) -> Result<DateTime<Utc>, CoreError> {
        self.first_frame_timestamp()?
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "Frame".to_string(),
                id: "earliest".to_string(),
            })
    }

    async fn has_frames_in(&self, range: TimeRange) -> Result<bool, CoreError> {
        if range.is_empty() {
            return Ok(false);
        }
        self.frame_exists_in(range)
    }

    async fn query_frames(&self, range: TimeRange) -> Result<Vec<Frame>, CoreError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        self.frames_in(range)
    }
}
