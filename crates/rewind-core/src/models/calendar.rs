//! 달력 날짜와 시간 범위.
//!
//! 타임라인은 프레임(순간)과 날짜(달력 일) 두 단위로 움직인다.
//! 날짜 경계는 고정 UTC 오프셋 기준으로 계산한다.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// 시간 범위 `[start, end]` (양끝 포함)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// 시작 시각
    pub start: DateTime<Utc>,
    /// 종료 시각
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// 새 범위 생성
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 시각이 범위 안에 있는지
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// start > end인 빈 범위인지
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// 달력: 순간을 날짜로, 날짜를 하루 범위로 변환
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCalendar {
    offset: FixedOffset,
}

impl DayCalendar {
    /// 지정 오프셋 달력
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// UTC 달력
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// 시스템 로컬 오프셋 달력 (생성 시점 기준)
    pub fn local() -> Self {
        Self::new(*Local::now().offset())
    }

    /// 설정값(분)으로 달력 생성, None이면 시스템 로컬
    pub fn from_offset_minutes(minutes: Option<i32>) -> Result<Self, CoreError> {
        match minutes {
            None => Ok(Self::local()),
            Some(m) => FixedOffset::east_opt(m * 60)
                .map(Self::new)
                .ok_or_else(|| CoreError::Validation {
                    field: "timeline.utc_offset_minutes".to_string(),
                    message: format!("유효하지 않은 오프셋: {m}"),
                }),
        }
    }

    /// 달력 오프셋
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// 순간이 속한 날짜
    pub fn day_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// 두 순간이 같은 날짜인지
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.day_of(a) == self.day_of(b)
    }

    /// 날짜 00:00:00.000
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        let utc = local - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// 날짜 23:59:59.999
    pub fn day_end(&self, date: NaiveDate) -> DateTime<Utc> {
        self.day_start(date) + Duration::days(1) - Duration::milliseconds(1)
    }

    /// 날짜 전체 범위
    pub fn day_range(&self, date: NaiveDate) -> TimeRange {
        TimeRange::new(self.day_start(date), self.day_end(date))
    }
}
