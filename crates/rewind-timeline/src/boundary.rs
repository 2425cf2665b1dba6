//! 날짜 경계 가드.
//!
//! 날짜 존재 여부를 질의하고 결과를 캐시한다. 최초 녹화일도 한 번만 조회한다.
//! 조회 실패는 캐시하지 않는다.

use chrono::{DateTime, NaiveDate, Utc};
use rewind_core::error::CoreError;
use rewind_core::models::calendar::DayCalendar;
use rewind_core::ports::frame_source::FrameSource;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 날짜 존재 여부 판정기
pub struct BoundaryGuard {
    source: Arc<dyn FrameSource>,
    calendar: DayCalendar,
    known: HashMap<NaiveDate, bool>,
    earliest: Option<DateTime<Utc>>,
}

impl BoundaryGuard {
    /// 새 가드
    pub fn new(source: Arc<dyn FrameSource>, calendar: DayCalendar) -> Self {
        Self {
            source,
            calendar,
            known: HashMap::new(),
            earliest: None,
        }
    }

    /// 날짜에 프레임이 하나라도 있는지
    pub async fn has_frames(&mut self, date: NaiveDate) -> Result<bool, CoreError> {
        if let Some(&known) = self.known.get(&date) {
            return Ok(known);
        }
        let exists = self
            .source
            .has_frames_in(self.calendar.day_range(date))
            .await?;
        debug!("날짜 존재 확인: {date} → {exists}");
        self.known.insert(date, exists);
        Ok(exists)
    }

    /// 로드 결과로 알게 된 존재 여부 기록
    pub fn record(&mut self, date: NaiveDate, exists: bool) {
        self.known.insert(date, exists);
    }

    /// 캐시된 판정 무효화
    pub fn forget(&mut self, date: NaiveDate) {
        self.known.remove(&date);
    }

    /// 최초 녹화 시각 (첫 성공 후 캐시)
    pub async fn earliest_recorded_at(&mut self) -> Result<DateTime<Utc>, CoreError> {
        if let Some(ts) = self.earliest {
            return Ok(ts);
        }
        let ts = self.source.earliest_recorded_at().await?;
        debug!("최초 녹화 시각: {ts}");
        self.earliest = Some(ts);
        Ok(ts)
    }

    /// 최초 녹화일
    pub async fn earliest_date(&mut self) -> Result<NaiveDate, CoreError> {
        let ts = self.earliest_recorded_at().await?;
        Ok(self.calendar.day_of(ts))
    }

    /// 캐시된 최초 녹화일
    pub fn cached_earliest(&self) -> Option<NaiveDate> {
        self.earliest.map(|ts| self.calendar.day_of(ts))
    }

    /// 달력
    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }
}
