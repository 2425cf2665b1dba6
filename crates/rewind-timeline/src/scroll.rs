//! 스크롤 입력 변환.
//!
//! 휠/트랙패드 이벤트를 프레임 인덱스 델타로 바꾼다.
//!
//! - 제외 영역(AI 패널, 오디오 전사 패널, 모달 대화상자) 안의 이벤트는 그대로 통과
//! - 그 외에는 기본 스크롤을 막고 `sign × min(cap, ceil((|Δ|/50)^1.5))` 만큼 이동
//! - 16ms 리딩 엣지 스로틀, 윈도우 안의 후속 이벤트는 버린다
//! - 계산된 델타는 다음 애니메이션 프레임 콜백에서 적용된다

use rewind_core::config::TimelineConfig;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// AI 채팅 패널
pub const AI_PANEL: &str = "ai-panel";
/// 오디오 전사 패널
pub const AUDIO_TRANSCRIPT_PANEL: &str = "audio-transcript-panel";
/// 모달 대화상자
pub const DIALOG: &str = "dialog";

/// 휠 이벤트
#[derive(Debug, Clone)]
pub struct WheelEvent {
    /// 세로 스크롤 델타 (원시값)
    pub delta_y: f64,
    /// 이벤트 대상 요소의 영역 경로 (루트 → 대상)
    pub target_path: Vec<String>,
    /// 이벤트 시각 (단조 밀리초)
    pub timestamp_ms: u64,
}

impl WheelEvent {
    /// 타임라인 본문 위의 이벤트
    pub fn on_timeline(delta_y: f64, timestamp_ms: u64) -> Self {
        Self {
            delta_y,
            target_path: Vec::new(),
            timestamp_ms,
        }
    }

    /// 특정 영역 안의 이벤트
    pub fn within(region: &str, delta_y: f64, timestamp_ms: u64) -> Self {
        Self {
            delta_y,
            target_path: vec![region.to_string()],
            timestamp_ms,
        }
    }
}

/// 이벤트 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDecision {
    /// 제외 영역: 기본 스크롤 유지, 인덱스 변화 없음
    PassThrough,
    /// 타임라인이 제스처를 소유: 기본 스크롤 차단
    Captured {
        /// 큐에 넣은 인덱스 델타 (스로틀로 버려졌거나 0이면 None)
        queued: Option<i64>,
    },
}

impl ScrollDecision {
    /// 기본 스크롤 동작을 막아야 하는지
    pub fn prevents_default(&self) -> bool {
        matches!(self, ScrollDecision::Captured { .. })
    }
}

/// 리딩 엣지 스로틀 (트레일링 호출 없음)
#[derive(Debug, Clone)]
pub struct Throttle {
    interval_ms: u64,
    last_fired_ms: Option<u64>,
}

impl Throttle {
    /// 새 스로틀
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: None,
        }
    }

    /// 지금 실행 가능하면 윈도우를 열고 true
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        let ready = match self.last_fired_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if ready {
            self.last_fired_ms = Some(now_ms);
        }
        ready
    }
}

/// 스크롤 강도 곡선 파라미터
#[derive(Debug, Clone, Copy)]
pub struct ScrollCurve {
    /// 정규화 분모
    pub divisor: f64,
    /// 지수
    pub exponent: f64,
    /// 최대 이동량 (None이면 무제한)
    pub cap: Option<u32>,
    /// 방향 반전. 켜면 부호가 `-sign(raw)` (rewind 웹 타임라인 방향)
    pub invert: bool,
}

impl Default for ScrollCurve {
    fn default() -> Self {
        Self {
            divisor: 50.0,
            exponent: 1.5,
            cap: None,
            invert: false,
        }
    }
}

impl ScrollCurve {
    /// 설정에서 곡선 생성
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self {
            divisor: config.scroll_divisor,
            exponent: config.scroll_exponent,
            cap: config.scroll_cap,
            invert: config.invert_scroll,
        }
    }

    /// 원시 델타 → 인덱스 델타
    ///
    /// 작은 틱은 1~수 프레임, 빠른 플릭은 많은 프레임을 건너뛴다.
    pub fn index_delta(&self, raw: f64) -> i64 {
        if !raw.is_finite() || raw == 0.0 {
            return 0;
        }
        let magnitude = (raw.abs() / self.divisor).powf(self.exponent).ceil();
        let magnitude = match self.cap {
            Some(cap) => magnitude.min(f64::from(cap)),
            None => magnitude,
        };
        // f64 → i64 캐스트는 포화된다
        let magnitude = magnitude as i64;
        let sign = if (raw > 0.0) != self.invert { 1 } else { -1 };
        sign * magnitude
    }
}

/// 스크롤 입력 변환기
#[derive(Debug, Clone)]
pub struct ScrollInputTranslator {
    curve: ScrollCurve,
    throttle: Throttle,
    opt_out: HashSet<String>,
    pending: VecDeque<i64>,
}

impl ScrollInputTranslator {
    /// 새 변환기 (기본 제외 영역 등록)
    pub fn new(curve: ScrollCurve, throttle_ms: u64) -> Self {
        let opt_out = [AI_PANEL, AUDIO_TRANSCRIPT_PANEL, DIALOG]
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            curve,
            throttle: Throttle::new(throttle_ms),
            opt_out,
            pending: VecDeque::new(),
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &TimelineConfig) -> Self {
        Self::new(ScrollCurve::from_config(config), config.throttle_ms)
    }

    /// 제외 영역 등록
    pub fn register_opt_out(&mut self, region: impl Into<String>) {
        self.opt_out.insert(region.into());
    }

    /// 제외 영역 해제
    pub fn unregister_opt_out(&mut self, region: &str) -> bool {
        self.opt_out.remove(region)
    }

    /// 이벤트 대상이 제외 영역 안에 있는지
    pub fn is_within_opt_out(&self, event: &WheelEvent) -> bool {
        event
            .target_path
            .iter()
            .any(|region| self.opt_out.contains(region))
    }

    /// 페이지 전역 가드: 문서 스크롤을 막아야 하는지
    pub fn should_prevent_page_scroll(&self, event: &WheelEvent) -> bool {
        !self.is_within_opt_out(event)
    }

    /// 휠 이벤트 처리. 델타는 즉시 적용하지 않고 큐에 넣는다.
    pub fn handle(&mut self, event: &WheelEvent) -> ScrollDecision {
        if self.is_within_opt_out(event) {
            return ScrollDecision::PassThrough;
        }

        if !self.throttle.try_fire(event.timestamp_ms) {
            return ScrollDecision::Captured { queued: None };
        }

        let delta = self.curve.index_delta(event.delta_y);
        if delta == 0 {
            return ScrollDecision::Captured { queued: None };
        }

        debug!("스크롤 델타 큐잉: raw={}, delta={delta}", event.delta_y);
        self.pending.push_back(delta);
        ScrollDecision::Captured {
            queued: Some(delta),
        }
    }

    /// 애니메이션 프레임 콜백: 대기 중인 델타를 도착 순서대로 꺼낸다
    pub fn take_pending(&mut self) -> Vec<i64> {
        self.pending.drain(..).collect()
    }

    /// 대기 중인 델타가 있는지
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
