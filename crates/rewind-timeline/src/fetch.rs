//! 날짜 범위 프레임 로드 조정자.
//!
//! 하루 범위를 계산해 프레임을 조회하고, 요청마다 단조 증가 ID를 붙인다.
//! 마지막 요청 ID와 일치하는 응답만 상태에 반영된다 (오래된 응답 폐기).
//!
//! 조회는 별도 tokio 태스크에서 실행되며 결과는 mpsc 채널로 돌아온다.
//! 상태 변화는 `watch` 채널로 구독할 수 있다.

use chrono::{Duration, NaiveDate};
use rewind_core::error::CoreError;
use rewind_core::models::calendar::{DayCalendar, TimeRange};
use rewind_core::models::frame::Frame;
use rewind_core::ports::clock::Clock;
use rewind_core::ports::frame_source::FrameSource;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// 로드 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FetchStatus {
    /// 아직 요청 없음
    Idle,
    /// 조회 중
    Loading {
        /// 대상 날짜
        date: NaiveDate,
    },
    /// 완료
    Ready {
        /// 대상 날짜
        date: NaiveDate,
        /// 로드된 프레임 수
        frame_count: usize,
    },
    /// 실패 (수동 재시도 대기)
    Error {
        /// 대상 날짜
        date: NaiveDate,
        /// 오류 메시지
        message: String,
    },
}

impl FetchStatus {
    /// 조회 중인지
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchStatus::Loading { .. })
    }

    /// 오류 메시지
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FetchStatus::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// 발행된 로드 요청
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    /// 요청 ID
    pub request_id: u64,
    /// 대상 날짜
    pub date: NaiveDate,
    /// 조회 범위
    pub window: TimeRange,
}

/// 조회 태스크가 돌려주는 결과
#[derive(Debug)]
pub struct LoadOutcome {
    /// 요청 ID
    pub request_id: u64,
    /// 대상 날짜
    pub date: NaiveDate,
    /// 조회 결과
    pub result: Result<Vec<Frame>, CoreError>,
}

/// 날짜 단위 로드 조정자
pub struct DateRangeFetchCoordinator {
    source: Arc<dyn FrameSource>,
    clock: Arc<dyn Clock>,
    calendar: DayCalendar,
    safety_margin: Duration,
    latest_request_id: u64,
    outcome_tx: mpsc::UnboundedSender<LoadOutcome>,
    status_tx: watch::Sender<FetchStatus>,
}

impl DateRangeFetchCoordinator {
    /// 새 조정자와 결과 수신 채널
    pub fn new(
        source: Arc<dyn FrameSource>,
        clock: Arc<dyn Clock>,
        calendar: DayCalendar,
        safety_margin: std::time::Duration,
    ) -> (Self, mpsc::UnboundedReceiver<LoadOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (status_tx, _) = watch::channel(FetchStatus::Idle);
        let safety_margin = Duration::from_std(safety_margin).unwrap_or(Duration::minutes(5));
        (
            Self {
                source,
                clock,
                calendar,
                safety_margin,
                latest_request_id: 0,
                outcome_tx,
                status_tx,
            },
            outcome_rx,
        )
    }

    /// 날짜 조회 범위. 오늘이면 상한은 `now - 여유`
    pub fn day_window(&self, date: NaiveDate) -> TimeRange {
        let mut window = self.calendar.day_range(date);
        let now = self.clock.now();
        if self.calendar.day_of(now) == date {
            let cutoff = now - self.safety_margin;
            if cutoff < window.end {
                window.end = cutoff;
            }
        }
        window
    }

    /// 새 요청 ID 발급, 상태를 Loading으로 전환
    pub fn begin(&mut self, date: NaiveDate) -> LoadTicket {
        self.latest_request_id += 1;
        let ticket = LoadTicket {
            request_id: self.latest_request_id,
            date,
            window: self.day_window(date),
        };
        self.status_tx.send_replace(FetchStatus::Loading { date });
        debug!(
            "로드 요청 #{}: {date} ({} ~ {})",
            ticket.request_id, ticket.window.start, ticket.window.end
        );
        ticket
    }

    /// 날짜 로드 시작. 이전 요청은 모두 무효가 된다.
    pub fn load(&mut self, date: NaiveDate) -> LoadTicket {
        let ticket = self.begin(date);
        let source = Arc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = source.query_frames(ticket.window).await;
            let outcome = LoadOutcome {
                request_id: ticket.request_id,
                date: ticket.date,
                result,
            };
            if tx.send(outcome).is_err() {
                debug!("결과 수신자 없음: 요청 #{}", ticket.request_id);
            }
        });
        ticket
    }

    /// 진행 중인 요청 무효화 (캐시에서 바로 전환할 때)
    pub fn supersede(&mut self) {
        self.latest_request_id += 1;
    }

    /// 결과 반영. 오래된 응답이면 None.
    ///
    /// 성공 시 시간순 프레임, 실패 시 `CoreError::Fetch`.
    pub fn resolve(&mut self, outcome: LoadOutcome) -> Option<Result<Arc<[Frame]>, CoreError>> {
        if outcome.request_id != self.latest_request_id {
            debug!(
                "오래된 응답 폐기: #{} (최신 #{})",
                outcome.request_id, self.latest_request_id
            );
            return None;
        }

        let date = outcome.date;
        match outcome.result {
            Ok(mut frames) => {
                if !frames.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
                    warn!("{date} 프레임이 시간순이 아님, 정렬");
                    frames.sort_by_key(|f| f.timestamp);
                }
                info!("{date} 프레임 {}건 로드", frames.len());
                self.status_tx.send_replace(FetchStatus::Ready {
                    date,
                    frame_count: frames.len(),
                });
                Some(Ok(frames.into()))
            }
            Err(e) => {
                warn!("{date} 프레임 로드 실패: {e}");
                let message = e.to_string();
                self.status_tx.send_replace(FetchStatus::Error {
                    date,
                    message: message.clone(),
                });
                Some(Err(CoreError::Fetch {
                    date,
                    cause: message,
                }))
            }
        }
    }

    /// 캐시 적중으로 바로 준비된 날짜 기록
    pub fn mark_ready(&mut self, date: NaiveDate, frame_count: usize) {
        self.status_tx
            .send_replace(FetchStatus::Ready { date, frame_count });
    }

    /// 현재 상태
    pub fn status(&self) -> FetchStatus {
        self.status_tx.borrow().clone()
    }

    /// 상태 구독
    pub fn subscribe(&self) -> watch::Receiver<FetchStatus> {
        self.status_tx.subscribe()
    }

    /// 최신 요청 ID
    pub fn latest_request_id(&self) -> u64 {
        self.latest_request_id
    }
}
