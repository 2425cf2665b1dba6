//! 날짜별 프레임 LRU 캐시.
//!
//! 한 번 로드한 날짜를 보관해 재방문 시 재조회 없이 점프만 한다.

use chrono::NaiveDate;
use lru::LruCache;
use rewind_core::models::frame::Frame;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// 날짜 → 프레임 시퀀스 캐시
pub struct DayCache {
    inner: LruCache<NaiveDate, Arc<[Frame]>>,
}

impl DayCache {
    /// 새 캐시 (용량 0은 1로 올린다)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
        }
    }

    /// 조회 (최근 사용으로 갱신)
    pub fn get(&mut self, date: NaiveDate) -> Option<Arc<[Frame]>> {
        self.inner.get(&date).cloned()
    }

    /// 저장
    pub fn insert(&mut self, date: NaiveDate, frames: Arc<[Frame]>) {
        if let Some((evicted, _)) = self.inner.push(date, frames) {
            if evicted != date {
                debug!("날짜 캐시 제거: {evicted}");
            }
        }
    }

    /// 제거
    pub fn remove(&mut self, date: NaiveDate) -> Option<Arc<[Frame]>> {
        self.inner.pop(&date)
    }

    /// 포함 여부 (순서 갱신 없음)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.inner.contains(&date)
    }

    /// 보관 중인 날짜 (최근 사용 순)
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.inner.iter().map(|(d, _)| *d).collect()
    }

    /// 보관 중인 날짜 수
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
