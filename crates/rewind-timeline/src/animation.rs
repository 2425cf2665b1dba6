//! 프로그래매틱 프레임 애니메이션.
//!
//! 시작 인덱스에서 목표 인덱스까지 cubic ease-out으로 보간한다.
//! 시각은 호출자가 애니메이션 프레임마다 넘겨준다 (단조 밀리초).

/// 기본 애니메이션 길이 (ms)
pub const DEFAULT_DURATION_MS: u64 = 1000;

/// `1 - (1 - p)^3`
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// 애니메이션 틱 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationStep {
    /// 이번 틱의 인덱스
    pub index: usize,
    /// 마지막 틱 여부
    pub finished: bool,
}

#[derive(Debug, Clone, Copy)]
struct Running {
    from: usize,
    to: usize,
    started_ms: u64,
    duration_ms: u64,
}

/// 애니메이션 스케줄러. 동시에 하나만 실행된다.
#[derive(Debug, Clone, Default)]
pub struct AnimationScheduler {
    running: Option<Running>,
}

impl AnimationScheduler {
    /// 유휴 스케줄러
    pub fn new() -> Self {
        Self::default()
    }

    /// 새 애니메이션 시작. 진행 중인 것은 대체된다.
    pub fn start(&mut self, from: usize, to: usize, now_ms: u64, duration_ms: u64) {
        self.running = Some(Running {
            from,
            to,
            started_ms: now_ms,
            duration_ms,
        });
    }

    /// 한 틱 진행. 실행 중이 아니면 None.
    pub fn tick(&mut self, now_ms: u64) -> Option<AnimationStep> {
        let run = self.running?;

        let progress = if run.duration_ms == 0 {
            1.0
        } else {
            let elapsed = now_ms.saturating_sub(run.started_ms) as f64;
            (elapsed / run.duration_ms as f64).min(1.0)
        };

        let eased = ease_out_cubic(progress);
        let from = run.from as f64;
        let to = run.to as f64;
        let index = (from + (to - from) * eased).round().max(0.0) as usize;

        let finished = progress >= 1.0;
        if finished {
            self.running = None;
            return Some(AnimationStep {
                index: run.to,
                finished,
            });
        }

        Some(AnimationStep { index, finished })
    }

    /// 중단 (현재 인덱스는 호출자가 유지)
    pub fn stop(&mut self) -> bool {
        self.running.take().is_some()
    }

    /// 실행 중인지
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// 진행 중인 애니메이션의 목표 인덱스
    pub fn target(&self) -> Option<usize> {
        self.running.map(|r| r.to)
    }
}
