//! 테스트용 인메모리 프레임 소스.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rewind_core::error::CoreError;
use rewind_core::models::calendar::TimeRange;
use rewind_core::models::frame::Frame;
use rewind_core::ports::frame_source::FrameSource;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) struct MemorySource {
    timestamps: Mutex<Vec<DateTime<Utc>>>,
    failing: AtomicBool,
    query_failing: AtomicBool,
    reversed: AtomicBool,
    has_frames_calls: AtomicUsize,
    query_calls: AtomicUsize,
}

impl MemorySource {
    pub(crate) fn from_timestamps(mut timestamps: Vec<DateTime<Utc>>) -> Self {
        timestamps.sort();
        Self {
            timestamps: Mutex::new(timestamps),
            failing: AtomicBool::new(false),
            query_failing: AtomicBool::new(false),
            reversed: AtomicBool::new(false),
            has_frames_calls: AtomicUsize::new(0),
            query_calls: AtomicUsize::new(0),
        }
    }

    /// 각 날짜 09:00, 09:05, 09:10 (UTC) 세 프레임
    pub(crate) fn with_days(days: &[NaiveDate]) -> Self {
        Self::from_timestamps(days.iter().flat_map(|d| day_frames(*d, 3)).collect())
    }

    pub(crate) fn push(&self, ts: DateTime<Utc>) {
        let mut guard = self.timestamps.lock().unwrap();
        guard.push(ts);
        guard.sort();
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 프레임 조회만 실패 (존재 확인은 정상)
    pub(crate) fn set_query_failing(&self, failing: bool) {
        self.query_failing.store(failing, Ordering::SeqCst);
    }

    /// 정렬되지 않은 결과를 돌려주는 소스 흉내
    pub(crate) fn set_reversed(&self, reversed: bool) {
        self.reversed.store(reversed, Ordering::SeqCst);
    }

    pub(crate) fn has_frames_calls(&self) -> usize {
        self.has_frames_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CoreError::DataSource("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

pub(crate) fn day_frames(date: NaiveDate, n: i64) -> Vec<DateTime<Utc>> {
    let nine = Utc.from_utc_datetime(&date.and_hms_opt(9, 0, 0).unwrap());
    (0..n).map(|i| nine + Duration::minutes(5 * i)).collect()
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn earliest_recorded_at(&self) -> Result<DateTime<Utc>, CoreError> {
        self.check()?;
        self.timestamps
            .lock()
            .unwrap()
            .first()
            .copied()
            .ok_or_else(|| CoreError::NotFound {
                resource_type: "Frame".to_string(),
                id: "earliest".to_string(),
            })
    }

    async fn has_frames_in(&self, range: TimeRange) -> Result<bool, CoreError> {
        self.has_frames_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .timestamps
            .lock()
            .unwrap()
            .iter()
            .any(|ts| range.contains(*ts)))
    }

    async fn query_frames(&self, range: TimeRange) -> Result<Vec<Frame>, CoreError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.query_failing.load(Ordering::SeqCst) {
            return Err(CoreError::DataSource("query timeout".to_string()));
        }
        let mut frames: Vec<Frame> = self
            .timestamps
            .lock()
            .unwrap()
            .iter()
            .filter(|ts| range.contains(**ts))
            .map(|ts| Frame::at(*ts))
            .collect();
        if self.reversed.load(Ordering::SeqCst) {
            frames.reverse();
        }
        Ok(frames)
    }
}
