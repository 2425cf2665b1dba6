//! 프레임 인덱스 커서.
//!
//! 현재 날짜의 프레임 시퀀스와 그 안의 정수 인덱스를 보관한다.
//! "현재 프레임"은 인덱스에서 파생되므로 둘은 어긋날 수 없다.
//! 날짜 전환 대기 중에는 현재 프레임만 비워 둔다.

use chrono::{DateTime, TimeDelta, Utc};
use rewind_core::models::frame::Frame;
use std::sync::Arc;

/// 프레임 시퀀스 + 인덱스 커서
#[derive(Debug, Clone)]
pub struct FrameIndexCursor {
    frames: Arc<[Frame]>,
    index: usize,
    has_current: bool,
}

impl Default for FrameIndexCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameIndexCursor {
    /// 빈 커서
    pub fn new() -> Self {
        Self {
            frames: Arc::from(Vec::new()),
            index: 0,
            has_current: false,
        }
    }

    /// 작업 시퀀스 교체. 인덱스는 0, 현재 프레임은 첫 프레임(없으면 None)
    pub fn set_frames(&mut self, frames: Arc<[Frame]>) {
        self.has_current = !frames.is_empty();
        self.frames = frames;
        self.index = 0;
    }

    /// 상대 이동. 범위로 클램프하고, 인덱스가 실제로 바뀐 경우에만 현재 프레임 갱신.
    ///
    /// 바뀐 인덱스를 반환한다. 빈 시퀀스면 no-op.
    pub fn move_by(&mut self, delta: i64) -> Option<usize> {
        let last = self.last_index()?;
        let target = (self.index as i64).saturating_add(delta).clamp(0, last as i64) as usize;
        if target == self.index {
            return None;
        }
        self.index = target;
        self.has_current = true;
        Some(target)
    }

    /// 절대 위치 이동 (애니메이션용). 범위로 클램프하고 현재 프레임을 항상 갱신.
    pub fn seek(&mut self, index: usize) -> Option<usize> {
        let last = self.last_index()?;
        self.index = index.min(last);
        self.has_current = true;
        Some(self.index)
    }

    /// 목표 시각과 가장 가까운 프레임으로 이동 (동률이면 앞선 프레임)
    pub fn jump_to(&mut self, target: DateTime<Utc>) -> Option<usize> {
        let index = closest_index(&self.frames, target)?;
        self.index = index;
        self.has_current = true;
        Some(index)
    }

    /// 날짜 전환 대기: 현재 프레임만 비운다 (시퀀스는 유지)
    pub fn clear_current(&mut self) {
        self.has_current = false;
    }

    /// 현재 인덱스 (빈 시퀀스면 None)
    pub fn current_index(&self) -> Option<usize> {
        (!self.frames.is_empty()).then_some(self.index)
    }

    /// 현재 프레임 (전환 대기 중이면 None)
    pub fn current_frame(&self) -> Option<&Frame> {
        if self.has_current {
            self.frames.get(self.index)
        } else {
            None
        }
    }

    /// 작업 시퀀스
    pub fn frames(&self) -> &Arc<[Frame]> {
        &self.frames
    }

    /// 프레임 수
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// 첫 프레임에 있는지
    pub fn is_at_start(&self) -> bool {
        !self.frames.is_empty() && self.index == 0
    }

    /// 마지막 프레임에 있는지
    pub fn is_at_end(&self) -> bool {
        self.last_index() == Some(self.index)
    }

    fn last_index(&self) -> Option<usize> {
        self.frames.len().checked_sub(1)
    }
}

/// 목표 시각과의 절대 차이가 최소인 프레임 인덱스 (선형 탐색, 동률이면 첫 번째)
pub fn closest_index(frames: &[Frame], target: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, TimeDelta)> = None;
    for (i, frame) in frames.iter().enumerate() {
        let diff = (frame.timestamp - target).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}
