//! 녹화 데이터 소스 포트.
//!
//! 구현: `rewind-storage` crate (rusqlite)

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::models::calendar::TimeRange;
use crate::models::frame::Frame;

/// 날짜 단위 프레임 조회 소스
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// 최초 녹화 시각 (녹화가 전혀 없으면 `CoreError::NotFound`)
    async fn earliest_recorded_at(&self) -> Result<DateTime<Utc>, CoreError>;

    /// 범위 안에 프레임이 하나라도 있는지
    async fn has_frames_in(&self, range: TimeRange) -> Result<bool, CoreError>;

    /// 범위 안의 프레임을 시간순(오름차순)으로 조회 (비어 있을 수 있음)
    async fn query_frames(&self, range: TimeRange) -> Result<Vec<Frame>, CoreError>;
}
