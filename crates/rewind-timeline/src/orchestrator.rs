//! 타임라인 오케스트레이터.
//!
//! 날짜 커서(거친)와 프레임 커서(세밀)를 함께 소유하는 단일 중재자.
//! 사용자 날짜 변경과 프레임에서 파생된 날짜 보정은 모두
//! [`Orchestrator::request_date_change`] 하나로 들어오며 도착 순서대로 처리된다.
//!
//! 상태 흐름:
//! ```text
//! Idle ─start()→ Loading ─결과→ Ready ─날짜 변경→ CheckingBoundary ─┬→ Loading
//!                          └→ Error ─reload()→ Loading             └→ Ready (캐시)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rewind_core::config::TimelineConfig;
use rewind_core::error::CoreError;
use rewind_core::models::calendar::{DayCalendar, TimeRange};
use rewind_core::models::frame::Frame;
use rewind_core::ports::clock::Clock;
use rewind_core::ports::frame_source::FrameSource;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::animation::AnimationScheduler;
use crate::boundary::BoundaryGuard;
use crate::cursor::FrameIndexCursor;
use crate::day_cache::DayCache;
use crate::fetch::{DateRangeFetchCoordinator, FetchStatus, LoadOutcome};
use crate::scroll::{ScrollDecision, ScrollInputTranslator, WheelEvent};

/// 탐색 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum NavPhase {
    /// 시작 전
    Idle { date: NaiveDate },
    /// 후보 날짜의 데이터 존재 확인 중
    CheckingBoundary { candidate: NaiveDate },
    /// 날짜 프레임 로드 중
    Loading { date: NaiveDate },
    /// 탐색 가능
    Ready { date: NaiveDate },
    /// 로드 실패 (이전 프레임은 유지)
    Error { date: NaiveDate, message: String },
}

/// 날짜 변경 요청 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateChange {
    /// 이미 해당 날짜
    Unchanged,
    /// 데이터 있는 날짜를 찾지 못해 요청 폐기
    Abandoned,
    /// 캐시된 날짜로 즉시 전환 (재조회 없음)
    Jumped {
        date: NaiveDate,
        index: Option<usize>,
    },
    /// 새 날짜 로드 시작
    Loading { date: NaiveDate, request_id: u64 },
}

/// 날짜 진입 시 커서 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    /// 첫 프레임
    Start,
    /// 마지막 프레임 (이전 날짜로 넘어갈 때)
    End,
    /// 관측한 프레임 시각 (프레임 기반 날짜 보정)
    At(DateTime<Utc>),
}

/// 호스트 UI에 노출하는 읽기 전용 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct TimelineSnapshot {
    pub current_date: NaiveDate,
    pub current_index: Option<usize>,
    pub current_frame: Option<Frame>,
    pub frames: Arc<[Frame]>,
    pub loading_status: FetchStatus,
    pub error_message: Option<String>,
    pub time_range: TimeRange,
    pub phase: NavPhase,
}

/// 타임라인 오케스트레이터
pub struct Orchestrator {
    config: TimelineConfig,
    calendar: DayCalendar,
    clock: Arc<dyn Clock>,
    guard: BoundaryGuard,
    fetcher: DateRangeFetchCoordinator,
    outcomes: mpsc::UnboundedReceiver<LoadOutcome>,
    cursor: FrameIndexCursor,
    scroll: ScrollInputTranslator,
    animation: AnimationScheduler,
    days: DayCache,
    current_date: NaiveDate,
    earliest_at: Option<DateTime<Utc>>,
    phase: NavPhase,
    landing: Landing,
    corrections: VecDeque<DateTime<Utc>>,
}

impl Orchestrator {
    /// 설정으로 생성 (달력 오프셋은 설정값, 없으면 시스템 로컬)
    pub fn new(
        config: TimelineConfig,
        source: Arc<dyn FrameSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let calendar = DayCalendar::from_offset_minutes(config.utc_offset_minutes)?;
        Ok(Self::with_calendar(config, source, clock, calendar))
    }

    /// 달력 지정 생성
    pub fn with_calendar(
        config: TimelineConfig,
        source: Arc<dyn FrameSource>,
        clock: Arc<dyn Clock>,
        calendar: DayCalendar,
    ) -> Self {
        let (fetcher, outcomes) = DateRangeFetchCoordinator::new(
            Arc::clone(&source),
            Arc::clone(&clock),
            calendar,
            config.today_safety_margin(),
        );
        let today = calendar.day_of(clock.now());
        Self {
            guard: BoundaryGuard::new(source, calendar),
            fetcher,
            outcomes,
            cursor: FrameIndexCursor::new(),
            scroll: ScrollInputTranslator::from_config(&config),
            animation: AnimationScheduler::new(),
            days: DayCache::new(config.max_cached_days),
            current_date: today,
            earliest_at: None,
            phase: NavPhase::Idle { date: today },
            landing: Landing::Start,
            corrections: VecDeque::new(),
            config,
            calendar,
            clock,
        }
    }

    /// 시작: 최초 녹화 시각을 한 번 조회하고 오늘을 로드한다.
    pub async fn start(&mut self) {
        match self.guard.earliest_recorded_at().await {
            Ok(ts) => {
                info!("최초 녹화 시각: {ts}");
                self.earliest_at = Some(ts);
            }
            Err(CoreError::NotFound { .. }) => info!("녹화 데이터 없음"),
            Err(e) => warn!("최초 녹화 시각 조회 실패: {e}"),
        }

        let today = self.today();
        self.current_date = today;
        self.begin_load(today, Landing::Start);
    }

    /// 오늘 날짜 (달력 기준)
    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(self.clock.now())
    }

    // ============================================================
    // 날짜 변경
    // ============================================================

    /// 날짜 변경 요청. 사용자 입력과 프레임 기반 보정의 단일 진입점.
    ///
    /// 데이터가 없는 날짜면 이동 방향으로 데이터 있는 날짜를 찾고,
    /// 최초 녹화일 이전 또는 오늘 이후로 넘어가면 요청을 폐기한다.
    pub async fn request_date_change(&mut self, new_date: NaiveDate) -> Result<DateChange, CoreError> {
        self.change_date(new_date, Landing::Start).await
    }

    /// 오늘로 이동
    pub async fn jump_today(&mut self) -> Result<DateChange, CoreError> {
        let today = self.today();
        self.request_date_change(today).await
    }

    /// 현재 날짜 재로드 (수동 재시도)
    pub fn reload(&mut self) -> u64 {
        let date = self.current_date;
        info!("{date} 재로드");
        self.days.remove(date);
        self.guard.forget(date);
        self.begin_load(date, Landing::Start)
    }

    async fn change_date(&mut self, new_date: NaiveDate, landing: Landing) -> Result<DateChange, CoreError> {
        if new_date == self.current_date {
            return Ok(DateChange::Unchanged);
        }

        let forward = new_date > self.current_date;
        let Some(target) = self.walk_to_data(new_date, forward).await? else {
            return Ok(DateChange::Abandoned);
        };
        if target == self.current_date {
            return Ok(DateChange::Unchanged);
        }

        self.animation.stop();

        if let Some(frames) = self.days.get(target) {
            // 이미 로드한 날짜: 재조회 없이 점프
            self.fetcher.supersede();
            self.fetcher.mark_ready(target, frames.len());
            self.cursor.set_frames(frames);
            self.current_date = target;
            self.phase = NavPhase::Ready { date: target };
            let index = self.land(target, landing);
            debug!("캐시된 날짜로 전환: {target}, index={index:?}");
            return Ok(DateChange::Jumped {
                date: target,
                index,
            });
        }

        let request_id = self.begin_load(target, landing);
        Ok(DateChange::Loading {
            date: target,
            request_id,
        })
    }

    /// 이동 방향으로 데이터 있는 첫 날짜를 찾는다. 없으면 None.
    async fn walk_to_data(&mut self, start: NaiveDate, forward: bool) -> Result<Option<NaiveDate>, CoreError> {
        let previous_phase = self.phase.clone();
        let earliest = self.guard.cached_earliest();
        let today = self.today();
        let mut candidate = start;

        for _ in 0..=self.config.max_boundary_walk_days {
            if let Some(earliest) = earliest {
                if candidate < earliest {
                    let exceeded = CoreError::BoundaryExceeded {
                        requested: candidate,
                        earliest,
                    };
                    debug!("날짜 변경 폐기: {exceeded}");
                    self.phase = previous_phase;
                    return Ok(None);
                }
            }
            if candidate > today {
                debug!("날짜 변경 폐기: {candidate}는 오늘({today}) 이후");
                self.phase = previous_phase;
                return Ok(None);
            }

            if self.days.contains(candidate) {
                return Ok(Some(candidate));
            }

            self.phase = NavPhase::CheckingBoundary { candidate };
            match self.guard.has_frames(candidate).await {
                Ok(true) => return Ok(Some(candidate)),
                Ok(false) => debug!("{candidate} 데이터 없음, 다음 후보"),
                Err(e) => {
                    // 표시 중인 날짜는 그대로 탐색 가능해야 한다
                    warn!("{candidate} 존재 확인 실패: {e}");
                    self.phase = previous_phase;
                    return Err(CoreError::Fetch {
                        date: candidate,
                        cause: e.to_string(),
                    });
                }
            }

            let next = if forward {
                candidate.succ_opt()
            } else {
                candidate.pred_opt()
            };
            match next {
                Some(next) => candidate = next,
                None => break,
            }
        }

        debug!(
            "날짜 변경 폐기: {start}부터 {}일 내 데이터 없음",
            self.config.max_boundary_walk_days
        );
        self.phase = previous_phase;
        Ok(None)
    }

    fn begin_load(&mut self, date: NaiveDate, landing: Landing) -> u64 {
        self.animation.stop();
        self.cursor.clear_current();
        self.current_date = date;
        self.landing = landing;
        self.phase = NavPhase::Loading { date };
        self.fetcher.load(date).request_id
    }

    fn land(&mut self, date: NaiveDate, landing: Landing) -> Option<usize> {
        match landing {
            Landing::Start => self.cursor.jump_to(self.calendar.day_start(date)),
            Landing::End => self.cursor.seek(usize::MAX),
            Landing::At(ts) => self.cursor.jump_to(ts),
        }
    }

    /// 날짜 전환(로드, 경계 확인) 중이 아닌지
    fn is_settled(&self) -> bool {
        !matches!(
            self.phase,
            NavPhase::Loading { .. } | NavPhase::CheckingBoundary { .. }
        )
    }

    // ============================================================
    // 로드 결과
    // ============================================================

    /// 로드 결과 반영. 오래된 응답이면 false.
    ///
    /// 실패 시 이전 프레임 시퀀스는 그대로 두고 Error 상태로 전환한다.
    pub fn apply_outcome(&mut self, outcome: LoadOutcome) -> bool {
        let date = outcome.date;
        let Some(result) = self.fetcher.resolve(outcome) else {
            return false;
        };

        match result {
            Ok(frames) => {
                self.guard.record(date, !frames.is_empty());
                self.days.insert(date, Arc::clone(&frames));
                self.cursor.set_frames(frames);
                self.phase = NavPhase::Ready { date };
                match self.landing {
                    Landing::Start => {}
                    Landing::End => {
                        self.cursor.seek(usize::MAX);
                    }
                    Landing::At(ts) => {
                        self.cursor.jump_to(ts);
                    }
                }
                self.landing = Landing::Start;
                self.observe_current_frame();
            }
            Err(e) => {
                self.phase = NavPhase::Error {
                    date,
                    message: e.to_string(),
                };
            }
        }
        true
    }

    /// 도착한 결과를 모두 처리 (대기 없음)
    pub async fn pump(&mut self) -> Result<(), CoreError> {
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.apply_outcome(outcome);
        }
        self.settle().await
    }

    /// 진행 중인 로드가 끝날 때까지 대기
    pub async fn wait_for_load(&mut self) -> Result<(), CoreError> {
        while matches!(self.phase, NavPhase::Loading { .. }) {
            let Some(outcome) = self.outcomes.recv().await else {
                return Err(CoreError::Internal("로드 결과 채널 닫힘".to_string()));
            };
            self.apply_outcome(outcome);
        }
        self.settle().await
    }

    // ============================================================
    // 프레임 이동
    // ============================================================

    /// 상대 이동. 마지막/첫 프레임에서 더 나아가면 다음/이전 날짜를 요청한다.
    ///
    /// 날짜 전환 중이거나 현재 프레임이 없으면 무시한다.
    pub async fn move_by(&mut self, delta: i64) -> Result<Option<usize>, CoreError> {
        if delta == 0 {
            return Ok(None);
        }
        if !self.is_settled() {
            debug!("날짜 전환 중 이동 무시: {delta}");
            return Ok(None);
        }
        if self.animation.stop() {
            debug!("수동 이동으로 애니메이션 중단");
        }

        if matches!(self.phase, NavPhase::Ready { .. }) {
            let past_end = delta > 0 && (self.cursor.is_empty() || self.cursor.is_at_end());
            let past_start = delta < 0 && (self.cursor.is_empty() || self.cursor.is_at_start());
            if past_end {
                if let Some(next) = self.current_date.succ_opt() {
                    self.change_date(next, Landing::Start).await?;
                }
                return Ok(None);
            }
            if past_start {
                if let Some(prev) = self.current_date.pred_opt() {
                    self.change_date(prev, Landing::End).await?;
                }
                return Ok(None);
            }
        }

        if self.cursor.current_frame().is_none() {
            return Ok(None);
        }
        let moved = self.cursor.move_by(delta);
        if moved.is_some() {
            self.observe_current_frame();
            self.settle().await?;
        }
        Ok(moved)
    }

    /// 목표 시각과 가장 가까운 프레임으로 이동 (날짜는 바꾸지 않음)
    pub async fn jump_to(&mut self, target: DateTime<Utc>) -> Result<Option<usize>, CoreError> {
        if !self.is_settled() {
            return Ok(None);
        }
        self.animation.stop();
        let index = self.cursor.jump_to(target);
        if index.is_some() {
            self.observe_current_frame();
            self.settle().await?;
        }
        Ok(index)
    }

    /// 목표 인덱스로 애니메이션 시작. 날짜 전환 중이거나 현재 프레임이 없으면 false.
    pub fn animate_to(&mut self, target: usize, duration_ms: Option<u64>, now_ms: u64) -> bool {
        if !self.is_settled() || self.cursor.current_frame().is_none() {
            return false;
        }
        let Some(from) = self.cursor.current_index() else {
            return false;
        };
        let target = target.min(self.cursor.len().saturating_sub(1));
        let duration = duration_ms.unwrap_or(self.config.animation_duration_ms);
        debug!("애니메이션 시작: {from} → {target} ({duration}ms)");
        self.animation.start(from, target, now_ms, duration);
        true
    }

    /// 휠 이벤트 입력. 델타는 다음 애니메이션 프레임에서 적용된다.
    pub fn handle_wheel(&mut self, event: &WheelEvent) -> ScrollDecision {
        self.scroll.handle(event)
    }

    /// 페이지 전역 스크롤 차단 여부
    pub fn should_prevent_page_scroll(&self, event: &WheelEvent) -> bool {
        self.scroll.should_prevent_page_scroll(event)
    }

    /// 애니메이션 프레임 콜백 (디스플레이 리프레시마다)
    ///
    /// 대기 중인 스크롤 델타가 있으면 진행 중인 애니메이션보다 우선한다.
    pub async fn on_animation_frame(&mut self, now_ms: u64) -> Result<(), CoreError> {
        self.pump().await?;

        for delta in self.scroll.take_pending() {
            self.move_by(delta).await?;
        }

        if let Some(step) = self.animation.tick(now_ms) {
            if self.cursor.seek(step.index).is_some() {
                self.observe_current_frame();
            }
            if step.finished {
                debug!("애니메이션 완료: index={}", step.index);
            }
        }

        self.settle().await
    }

    /// 애니메이션 진행 중인지
    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    // ============================================================
    // 프레임 → 날짜 보정
    // ============================================================

    fn observe_current_frame(&mut self) {
        let Some(frame) = self.cursor.current_frame() else {
            return;
        };
        let day = self.calendar.day_of(frame.timestamp);
        if day != self.current_date {
            debug!("프레임 날짜 보정 대기: {} → {day}", self.current_date);
            self.corrections.push_back(frame.timestamp);
        }
    }

    /// 대기 중인 날짜 보정 처리. 날짜만 맞추고 관측한 프레임에 머문다.
    async fn settle(&mut self) -> Result<(), CoreError> {
        while let Some(ts) = self.corrections.pop_front() {
            let day = self.calendar.day_of(ts);
            self.change_date(day, Landing::At(ts)).await?;
        }
        Ok(())
    }

    // ============================================================
    // 조회
    // ============================================================

    /// 읽기 전용 스냅샷
    pub fn snapshot(&self) -> TimelineSnapshot {
        let error_message = match &self.phase {
            NavPhase::Error { message, .. } => Some(message.clone()),
            _ => None,
        };
        TimelineSnapshot {
            current_date: self.current_date,
            current_index: self.cursor.current_index(),
            current_frame: self.cursor.current_frame().cloned(),
            frames: Arc::clone(self.cursor.frames()),
            loading_status: self.fetcher.status(),
            error_message,
            time_range: self.time_range(),
            phase: self.phase.clone(),
        }
    }

    /// 탐색 가능 범위 `[최초 녹화, 지금]` (최초 녹화를 모르면 오늘 자정부터)
    pub fn time_range(&self) -> TimeRange {
        let now = self.clock.now();
        let start = self
            .earliest_at
            .unwrap_or_else(|| self.calendar.day_start(self.calendar.day_of(now)));
        TimeRange::new(start, now)
    }

    /// 로드 상태 구독
    pub fn subscribe_status(&self) -> watch::Receiver<FetchStatus> {
        self.fetcher.subscribe()
    }

    /// 달력
    pub fn calendar(&self) -> DayCalendar {
        self.calendar
    }

    /// 현재 날짜
    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    /// 현재 인덱스
    pub fn current_index(&self) -> Option<usize> {
        self.cursor.current_index()
    }

    /// 현재 프레임
    pub fn current_frame(&self) -> Option<&Frame> {
        self.cursor.current_frame()
    }

    /// 현재 상태
    pub fn phase(&self) -> &NavPhase {
        &self.phase
    }

    /// 캐시된 날짜 (최근 사용 순)
    pub fn cached_dates(&self) -> Vec<NaiveDate> {
        self.days.dates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::AI_PANEL;
    use crate::testing::{day_frames, MemorySource};
    use chrono::{Duration, TimeZone};
    use rewind_core::ports::clock::FixedClock;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn noon(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn orchestrator(source: Arc<MemorySource>) -> Orchestrator {
        Orchestrator::with_calendar(
            TimelineConfig::default(),
            source,
            Arc::new(FixedClock(noon(10))),
            DayCalendar::utc(),
        )
    }

    /// Jan 1, Jan 3, Jan 10(오늘)에 데이터
    async fn started() -> (Orchestrator, Arc<MemorySource>) {
        let source = Arc::new(MemorySource::with_days(&[d(1), d(3), d(10)]));
        let mut orch = orchestrator(source.clone());
        orch.start().await;
        orch.wait_for_load().await.unwrap();
        (orch, source)
    }

    async fn go(orch: &mut Orchestrator, date: NaiveDate) -> DateChange {
        let change = orch.request_date_change(date).await.unwrap();
        orch.wait_for_load().await.unwrap();
        change
    }

    #[tokio::test]
    async fn start_loads_today_and_seeds_range() {
        let (orch, _) = started().await;
        let snap = orch.snapshot();
        assert_eq!(snap.current_date, d(10));
        assert_eq!(snap.current_index, Some(0));
        assert_eq!(snap.frames.len(), 3);
        assert_eq!(snap.phase, NavPhase::Ready { date: d(10) });
        assert_eq!(snap.time_range.start, day_frames(d(1), 1)[0]);
        assert_eq!(snap.time_range.end, noon(10));
        assert!(snap.error_message.is_none());
    }

    #[tokio::test]
    async fn start_on_empty_store_defaults_to_today() {
        let source = Arc::new(MemorySource::from_timestamps(Vec::new()));
        let mut orch = orchestrator(source);
        orch.start().await;
        orch.wait_for_load().await.unwrap();

        let snap = orch.snapshot();
        assert_eq!(snap.current_date, d(10));
        assert!(snap.frames.is_empty());
        assert!(snap.current_frame.is_none());
        assert_eq!(snap.time_range.start, Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn requesting_current_date_is_noop() {
        let (mut orch, source) = started().await;
        let queries = source.query_calls();
        let checks = source.has_frames_calls();
        let before = orch.snapshot();

        assert_eq!(orch.request_date_change(d(10)).await.unwrap(), DateChange::Unchanged);

        assert_eq!(source.query_calls(), queries);
        assert_eq!(source.has_frames_calls(), checks);
        let after = orch.snapshot();
        assert_eq!(after.current_index, before.current_index);
        assert_eq!(after.phase, before.phase);
    }

    #[tokio::test]
    async fn boundary_walk_backward_lands_on_earlier_day() {
        let (mut orch, _) = started().await;
        let change = go(&mut orch, d(2)).await;
        assert!(matches!(change, DateChange::Loading { date, .. } if date == d(1)));
        assert_eq!(orch.current_date(), d(1));
        assert_eq!(orch.current_frame().unwrap().timestamp, day_frames(d(1), 1)[0]);
    }

    #[tokio::test]
    async fn boundary_walk_forward_lands_on_later_day() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(1)).await;
        let change = go(&mut orch, d(2)).await;
        assert!(matches!(change, DateChange::Loading { date, .. } if date == d(3)));
        assert_eq!(orch.current_date(), d(3));
    }

    #[tokio::test]
    async fn walk_past_earliest_is_abandoned() {
        let (mut orch, source) = started().await;
        go(&mut orch, d(1)).await;
        let queries = source.query_calls();

        let earlier = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(orch.request_date_change(earlier).await.unwrap(), DateChange::Abandoned);
        assert_eq!(orch.current_date(), d(1));
        assert_eq!(orch.phase(), &NavPhase::Ready { date: d(1) });
        assert_eq!(source.query_calls(), queries);
    }

    #[tokio::test]
    async fn future_date_is_abandoned() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(3)).await;
        assert_eq!(orch.request_date_change(d(11)).await.unwrap(), DateChange::Abandoned);
        assert_eq!(orch.current_date(), d(3));
    }

    #[tokio::test]
    async fn walk_is_bounded() {
        let source = Arc::new(MemorySource::with_days(&[d(1), d(10)]));
        let config = TimelineConfig {
            max_boundary_walk_days: 2,
            ..TimelineConfig::default()
        };
        let mut orch = Orchestrator::with_calendar(
            config,
            source.clone(),
            Arc::new(FixedClock(noon(10))),
            DayCalendar::utc(),
        );
        // 최초 녹화일을 모르는 상태에서도 걸음 수로 멈춘다
        assert_eq!(orch.request_date_change(d(8)).await.unwrap(), DateChange::Abandoned);
        assert_eq!(source.has_frames_calls(), 3);
    }

    #[tokio::test]
    async fn stale_load_does_not_overwrite_newer() {
        let (mut orch, _) = started().await;

        let a = orch.request_date_change(d(1)).await.unwrap();
        let b = orch.request_date_change(d(3)).await.unwrap();
        assert!(matches!(a, DateChange::Loading { .. }));
        assert!(matches!(b, DateChange::Loading { .. }));

        let mut outcomes = vec![
            orch.outcomes.recv().await.unwrap(),
            orch.outcomes.recv().await.unwrap(),
        ];
        outcomes.sort_by_key(|o| o.request_id);
        let old = outcomes.remove(0);
        let new = outcomes.remove(0);

        assert!(orch.apply_outcome(new));
        assert!(!orch.apply_outcome(old));

        let snap = orch.snapshot();
        assert_eq!(snap.current_date, d(3));
        assert_eq!(snap.frames[0].timestamp, day_frames(d(3), 1)[0]);
        assert_eq!(snap.phase, NavPhase::Ready { date: d(3) });
    }

    #[tokio::test]
    async fn revisit_uses_cache_without_refetch() {
        let (mut orch, source) = started().await;
        go(&mut orch, d(3)).await;
        let queries = source.query_calls();

        let change = orch.request_date_change(d(10)).await.unwrap();
        assert_eq!(
            change,
            DateChange::Jumped {
                date: d(10),
                index: Some(0)
            }
        );
        assert_eq!(source.query_calls(), queries);
        assert_eq!(orch.current_date(), d(10));
        assert_eq!(orch.current_frame().unwrap().timestamp, day_frames(d(10), 1)[0]);
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_frames() {
        let (mut orch, source) = started().await;
        source.set_query_failing(true);

        go(&mut orch, d(3)).await;
        let snap = orch.snapshot();
        assert!(matches!(snap.phase, NavPhase::Error { date, .. } if date == d(3)));
        assert!(snap.error_message.unwrap().contains("query timeout"));
        assert_eq!(snap.current_date, d(3));
        assert!(snap.current_frame.is_none());
        assert_eq!(snap.frames[0].timestamp, day_frames(d(10), 1)[0]);

        // 수동 재시도
        source.set_query_failing(false);
        orch.reload();
        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.phase(), &NavPhase::Ready { date: d(3) });
        assert_eq!(orch.current_frame().unwrap().timestamp, day_frames(d(3), 1)[0]);
    }

    #[tokio::test]
    async fn boundary_check_failure_keeps_current_day_browsable() {
        let (mut orch, source) = started().await;
        go(&mut orch, d(3)).await;
        source.set_failing(true);
        let err = orch.request_date_change(d(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::Fetch { date, .. } if date == d(5)));

        let snap = orch.snapshot();
        assert_eq!(snap.current_date, d(3));
        assert_eq!(snap.current_index, Some(0));
        assert_eq!(snap.phase, NavPhase::Ready { date: d(3) });
        assert_eq!(
            snap.loading_status,
            FetchStatus::Ready { date: d(3), frame_count: 3 }
        );
        assert!(snap.error_message.is_none());

        // 장애가 풀리면 날짜 경계 넘기가 다시 동작
        source.set_failing(false);
        orch.move_by(10).await.unwrap();
        orch.move_by(1).await.unwrap();
        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.current_date(), d(10));
        assert_eq!(orch.current_index(), Some(0));
    }

    #[tokio::test]
    async fn input_during_load_is_ignored() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(1)).await;
        orch.move_by(10).await.unwrap();
        orch.move_by(1).await.unwrap();
        assert_eq!(orch.phase(), &NavPhase::Loading { date: d(3) });

        assert_eq!(orch.move_by(-1).await.unwrap(), None);
        assert_eq!(orch.jump_to(day_frames(d(1), 1)[0]).await.unwrap(), None);
        assert!(!orch.animate_to(0, None, 0));
        assert_eq!(orch.phase(), &NavPhase::Loading { date: d(3) });

        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(0));
        assert_eq!(orch.current_frame().unwrap().timestamp, day_frames(d(3), 1)[0]);
    }

    #[tokio::test]
    async fn wheel_before_outcome_is_dropped() {
        let (mut orch, _) = started().await;
        let change = orch.request_date_change(d(3)).await.unwrap();
        assert!(matches!(change, DateChange::Loading { date, .. } if date == d(3)));
        let outcome = orch.outcomes.recv().await.unwrap();

        // 결과 도착 전 휠 입력
        assert!(orch.handle_wheel(&WheelEvent::on_timeline(60.0, 0)).prevents_default());
        orch.on_animation_frame(0).await.unwrap();
        assert_eq!(orch.phase(), &NavPhase::Loading { date: d(3) });
        assert!(orch.current_frame().is_none());

        assert!(orch.apply_outcome(outcome));
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(0));

        orch.handle_wheel(&WheelEvent::on_timeline(60.0, 100));
        orch.on_animation_frame(100).await.unwrap();
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(2));
    }

    #[tokio::test]
    async fn date_change_during_load_wins_over_pending_outcome() {
        let (mut orch, _) = started().await;
        orch.request_date_change(d(3)).await.unwrap();
        let pending = orch.outcomes.recv().await.unwrap();

        let change = orch.request_date_change(d(10)).await.unwrap();
        assert!(matches!(change, DateChange::Jumped { date, .. } if date == d(10)));
        assert!(!orch.apply_outcome(pending));

        orch.on_animation_frame(0).await.unwrap();
        assert_eq!(orch.current_date(), d(10));
        assert_eq!(orch.phase(), &NavPhase::Ready { date: d(10) });
        assert_eq!(orch.current_index(), Some(0));
    }

    #[tokio::test]
    async fn input_after_fetch_failure_waits_for_reload() {
        let (mut orch, source) = started().await;
        source.set_query_failing(true);
        go(&mut orch, d(3)).await;
        assert!(matches!(orch.phase(), NavPhase::Error { date, .. } if *date == d(3)));

        orch.handle_wheel(&WheelEvent::on_timeline(60.0, 0));
        orch.on_animation_frame(0).await.unwrap();
        assert!(!orch.animate_to(2, None, 0));
        assert!(orch.current_frame().is_none());
        assert_eq!(orch.current_date(), d(3));

        source.set_query_failing(false);
        orch.reload();
        orch.wait_for_load().await.unwrap();
        orch.handle_wheel(&WheelEvent::on_timeline(60.0, 100));
        orch.on_animation_frame(100).await.unwrap();
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(2));
    }

    #[tokio::test]
    async fn reload_picks_up_new_frames() {
        let (mut orch, source) = started().await;
        source.push(day_frames(d(10), 4)[3]);
        orch.reload();
        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.snapshot().frames.len(), 4);
    }

    #[tokio::test]
    async fn scrolling_past_last_frame_loads_next_day() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(1)).await;

        orch.move_by(10).await.unwrap();
        assert_eq!(orch.current_index(), Some(2));

        let change = orch.move_by(1).await.unwrap();
        assert_eq!(change, None);
        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(0));
    }

    #[tokio::test]
    async fn scrolling_before_first_frame_lands_on_previous_day_end() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(3)).await;

        orch.move_by(-1).await.unwrap();
        orch.wait_for_load().await.unwrap();
        assert_eq!(orch.current_date(), d(1));
        assert_eq!(orch.current_index(), Some(2));

        // 캐시 경로도 마지막 프레임에 착지
        orch.move_by(1).await.unwrap();
        assert_eq!(orch.current_date(), d(3));
        assert_eq!(orch.current_index(), Some(0));
        orch.move_by(-1).await.unwrap();
        assert_eq!(orch.current_date(), d(1));
        assert_eq!(orch.current_index(), Some(2));
    }

    #[tokio::test]
    async fn scrolling_past_today_stays_put() {
        let (mut orch, _) = started().await;
        orch.move_by(2).await.unwrap();
        orch.move_by(1).await.unwrap();
        assert_eq!(orch.current_date(), d(10));
        assert_eq!(orch.current_index(), Some(2));
    }

    #[tokio::test]
    async fn wheel_delta_applies_on_next_frame() {
        let (mut orch, _) = started().await;
        let decision = orch.handle_wheel(&WheelEvent::on_timeline(60.0, 0));
        assert!(decision.prevents_default());
        assert_eq!(orch.current_index(), Some(0));

        orch.on_animation_frame(0).await.unwrap();
        assert_eq!(orch.current_index(), Some(2));
    }

    #[tokio::test]
    async fn wheel_in_opt_out_region_never_moves() {
        let (mut orch, _) = started().await;
        let event = WheelEvent::within(AI_PANEL, 500.0, 0);
        assert_eq!(orch.handle_wheel(&event), ScrollDecision::PassThrough);
        assert!(!orch.should_prevent_page_scroll(&event));

        orch.on_animation_frame(16).await.unwrap();
        assert_eq!(orch.current_index(), Some(0));
    }

    #[tokio::test]
    async fn animation_moves_through_intermediate_frames() {
        let source = Arc::new(MemorySource::from_timestamps(day_frames(d(10), 11)));
        let mut orch = orchestrator(source);
        orch.start().await;
        orch.wait_for_load().await.unwrap();

        assert!(orch.animate_to(10, Some(1000), 0));
        let mut seen = Vec::new();
        let mut now = 0;
        while orch.is_animating() {
            orch.on_animation_frame(now).await.unwrap();
            seen.push(orch.current_index().unwrap());
            now += 100;
        }
        assert_eq!(seen.last(), Some(&10));
        assert!(seen.iter().any(|&i| i > 0 && i < 10));
    }

    #[tokio::test]
    async fn manual_scroll_preempts_animation() {
        let source = Arc::new(MemorySource::from_timestamps(day_frames(d(10), 11)));
        let mut orch = orchestrator(source);
        orch.start().await;
        orch.wait_for_load().await.unwrap();

        orch.animate_to(10, Some(1000), 0);
        orch.on_animation_frame(100).await.unwrap();
        let mid = orch.current_index().unwrap();
        assert!(mid > 0 && mid < 10);

        orch.handle_wheel(&WheelEvent::on_timeline(-10.0, 200));
        orch.on_animation_frame(200).await.unwrap();
        assert!(!orch.is_animating());
        assert_eq!(orch.current_index(), Some(mid - 1));
    }

    #[tokio::test]
    async fn animate_on_empty_day_is_rejected() {
        let source = Arc::new(MemorySource::from_timestamps(Vec::new()));
        let mut orch = orchestrator(source);
        orch.start().await;
        orch.wait_for_load().await.unwrap();
        assert!(!orch.animate_to(3, None, 0));
    }

    #[tokio::test]
    async fn frame_on_other_day_corrects_date() {
        let (mut orch, _) = started().await;

        // 날짜 범위를 벗어난 프레임이 섞인 결과
        let request_id = orch.begin_load(d(3), Landing::Start);
        let frames = vec![Frame::at(day_frames(d(1), 1)[0]), Frame::at(day_frames(d(3), 1)[0])];
        orch.apply_outcome(LoadOutcome {
            request_id,
            date: d(3),
            result: Ok(frames),
        });
        orch.settle().await.unwrap();
        orch.wait_for_load().await.unwrap();

        assert_eq!(orch.current_date(), d(1));
        assert_eq!(orch.snapshot().frames.len(), 3);
    }

    #[tokio::test]
    async fn frame_correction_keeps_observed_frame() {
        let (mut orch, _) = started().await;
        let request_id = orch.begin_load(d(3), Landing::Start);
        let stray = day_frames(d(10), 3)[2];
        orch.apply_outcome(LoadOutcome {
            request_id,
            date: d(3),
            result: Ok(vec![Frame::at(day_frames(d(3), 1)[0]), Frame::at(stray)]),
        });
        orch.settle().await.unwrap();
        assert_eq!(orch.current_date(), d(3));

        // 다른 날짜의 프레임으로 이동하면 날짜만 맞추고 그 프레임에 머문다
        assert_eq!(orch.move_by(1).await.unwrap(), Some(1));
        assert_eq!(orch.current_date(), d(10));
        assert_eq!(orch.phase(), &NavPhase::Ready { date: d(10) });
        assert_eq!(orch.current_index(), Some(2));
        assert_eq!(orch.current_frame().unwrap().timestamp, stray);
    }

    #[tokio::test]
    async fn jump_to_nearest_frame_keeps_date() {
        let (mut orch, _) = started().await;
        let target = day_frames(d(10), 3)[2] + Duration::minutes(1);
        assert_eq!(orch.jump_to(target).await.unwrap(), Some(2));
        assert_eq!(orch.current_date(), d(10));
    }

    #[tokio::test]
    async fn jump_today_from_past_day() {
        let (mut orch, _) = started().await;
        go(&mut orch, d(1)).await;
        let change = orch.jump_today().await.unwrap();
        assert!(matches!(change, DateChange::Jumped { date, .. } if date == d(10)));
    }

    #[tokio::test]
    async fn status_channel_tracks_loads() {
        let (mut orch, _) = started().await;
        let mut status = orch.subscribe_status();
        orch.request_date_change(d(3)).await.unwrap();
        assert_eq!(*status.borrow_and_update(), FetchStatus::Loading { date: d(3) });
        orch.wait_for_load().await.unwrap();
        assert!(status.has_changed().unwrap());
        assert_eq!(
            *status.borrow_and_update(),
            FetchStatus::Ready { date: d(3), frame_count: 3 }
        );
    }

    #[tokio::test]
    async fn snapshot_serializes_to_json() {
        let (orch, _) = started().await;
        let json = serde_json::to_value(orch.snapshot()).unwrap();
        assert_eq!(json["current_date"], "2024-01-10");
        assert_eq!(json["current_index"], 0);
        assert_eq!(json["loading_status"]["state"], "ready");
        assert_eq!(json["phase"]["phase"], "ready");
        assert_eq!(json["frames"].as_array().unwrap().len(), 3);
    }
}
