//! 대화형 탐색 세션.
//!
//! stdin 한 줄이 명령 하나다. 리프레시 간격마다 애니메이션 프레임을 돌려
//! 스크롤 델타와 애니메이션을 적용하고, 로드 상태 변화를 로그로 남긴다.

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rewind_core::models::calendar::TimeRange;
use rewind_timeline::fetch::FetchStatus;
use rewind_timeline::scroll::WheelEvent;
use rewind_timeline::{NavPhase, Orchestrator};
use serde::Serialize;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const HELP: &str = "\
명령:
  scroll <delta> [region]   휠 이벤트 (region: ai-panel, audio-transcript-panel, dialog ...)
  move <n>                  프레임 상대 이동
  date <YYYY-MM-DD>         날짜 변경
  jump <HH:MM[:SS]|RFC3339> 가장 가까운 프레임으로 이동
  animate <index> [ms]      인덱스로 애니메이션
  reload                    현재 날짜 재로드
  today                     오늘로 이동
  status                    상태 (JSON)
  frame                     현재 프레임 (JSON)
  quit                      종료";

/// `jump` 대상
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// 절대 시각
    Instant(DateTime<Utc>),
    /// 현재 날짜의 시각
    TimeOfDay(NaiveTime),
}

/// 세션 명령
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Scroll { delta_y: f64, region: Option<String> },
    Move(i64),
    Date(NaiveDate),
    Jump(JumpTarget),
    Animate { index: usize, duration_ms: Option<u64> },
    Reload,
    Today,
    Status,
    Frame,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            bail!("빈 명령");
        };
        let arg = parts.next();

        let command = match name {
            "scroll" | "s" => Command::Scroll {
                delta_y: required(arg, "delta")?.parse()?,
                region: parts.next().map(str::to_string),
            },
            "move" | "m" => Command::Move(required(arg, "n")?.parse()?),
            "date" | "d" => Command::Date(required(arg, "YYYY-MM-DD")?.parse()?),
            "jump" | "j" => Command::Jump(parse_jump(required(arg, "시각")?)?),
            "animate" | "a" => Command::Animate {
                index: required(arg, "index")?.parse()?,
                duration_ms: parts.next().map(str::parse).transpose()?,
            },
            "reload" | "r" => Command::Reload,
            "today" | "t" => Command::Today,
            "status" => Command::Status,
            "frame" | "f" => Command::Frame,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => bail!("알 수 없는 명령: {other}"),
        };
        Ok(command)
    }
}

fn required<'a>(arg: Option<&'a str>, name: &str) -> Result<&'a str> {
    arg.ok_or_else(|| anyhow!("인자 누락: <{name}>"))
}

fn parse_jump(raw: &str) -> Result<JumpTarget> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(JumpTarget::Instant(ts.with_timezone(&Utc)));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map(JumpTarget::TimeOfDay)
        .map_err(|e| anyhow!("시각 파싱 실패 ({raw}): {e}"))
}

/// `status` 출력 (프레임 목록 대신 개수)
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub current_date: NaiveDate,
    pub current_index: Option<usize>,
    pub frame_count: usize,
    pub current_frame_at: Option<DateTime<Utc>>,
    pub app_name: Option<String>,
    pub window_name: Option<String>,
    pub loading_status: FetchStatus,
    pub error_message: Option<String>,
    pub time_range: TimeRange,
    pub phase: NavPhase,
}

/// 명령 실행 결과
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// 출력할 텍스트
    Text(String),
    /// 세션 종료
    Quit,
}

/// 탐색 세션
pub struct Session {
    orchestrator: Orchestrator,
    epoch: Instant,
}

impl Session {
    /// 새 세션
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            epoch: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// 명령 실행
    pub async fn execute(&mut self, command: Command) -> Result<Reply> {
        debug!("명령 실행: {command:?}");
        let now = self.now_ms();
        let orch = &mut self.orchestrator;
        match command {
            Command::Scroll { delta_y, region } => {
                let event = match region {
                    Some(region) => WheelEvent::within(&region, delta_y, now),
                    None => WheelEvent::on_timeline(delta_y, now),
                };
                let decision = orch.handle_wheel(&event);
                return Ok(Reply::Text(format!("{decision:?}")));
            }
            Command::Move(delta) => {
                orch.move_by(delta).await?;
                orch.wait_for_load().await?;
            }
            Command::Date(date) => {
                let change = orch.request_date_change(date).await?;
                orch.wait_for_load().await?;
                info!("날짜 변경 {date}: {change:?}");
            }
            Command::Jump(target) => {
                let instant = match target {
                    JumpTarget::Instant(ts) => ts,
                    JumpTarget::TimeOfDay(time) => {
                        let start = orch.calendar().day_start(orch.current_date());
                        start + (time - NaiveTime::MIN)
                    }
                };
                if orch.jump_to(instant).await?.is_none() {
                    return Ok(Reply::Text("프레임 없음".to_string()));
                }
                orch.wait_for_load().await?;
            }
            Command::Animate { index, duration_ms } => {
                if !orch.animate_to(index, duration_ms, now) {
                    return Ok(Reply::Text("프레임 없음".to_string()));
                }
                return Ok(Reply::Text(format!("애니메이션 → {index}")));
            }
            Command::Reload => {
                orch.reload();
                orch.wait_for_load().await?;
            }
            Command::Today => {
                orch.jump_today().await?;
                orch.wait_for_load().await?;
            }
            Command::Status => {
                return Ok(Reply::Text(serde_json::to_string_pretty(&self.status())?));
            }
            Command::Frame => {
                let text = match self.orchestrator.current_frame() {
                    Some(frame) => serde_json::to_string_pretty(frame)?,
                    None => "null".to_string(),
                };
                return Ok(Reply::Text(text));
            }
            Command::Help => return Ok(Reply::Text(HELP.to_string())),
            Command::Quit => return Ok(Reply::Quit),
        }
        Ok(Reply::Text(self.position_line()))
    }

    /// 애니메이션 프레임 한 번
    pub async fn tick(&mut self) -> Result<()> {
        let now = self.now_ms();
        self.orchestrator.on_animation_frame(now).await?;
        Ok(())
    }

    /// 현재 상태
    pub fn status(&self) -> StatusView {
        let snap = self.orchestrator.snapshot();
        let device = snap.current_frame.as_ref().and_then(|f| f.devices.first());
        StatusView {
            current_date: snap.current_date,
            current_index: snap.current_index,
            frame_count: snap.frames.len(),
            current_frame_at: snap.current_frame.as_ref().map(|f| f.timestamp),
            app_name: device.map(|d| d.metadata.app_name.clone()),
            window_name: device.map(|d| d.metadata.window_name.clone()),
            loading_status: snap.loading_status,
            error_message: snap.error_message,
            time_range: snap.time_range,
            phase: snap.phase,
        }
    }

    /// 한 줄 요약
    pub fn position_line(&self) -> String {
        let status = self.status();
        let index = status
            .current_index
            .map_or_else(|| "-".to_string(), |i| (i + 1).to_string());
        let at = status
            .current_frame_at
            .map_or_else(|| "-".to_string(), |t| t.to_rfc3339());
        let mut line = format!(
            "{} [{}/{}] {}",
            status.current_date, index, status.frame_count, at
        );
        if let Some(app) = status.app_name.filter(|a| !a.is_empty()) {
            line.push_str(&format!(" {app}"));
        }
        if let Some(err) = status.error_message {
            line.push_str(&format!(" (오류: {err}, reload로 재시도)"));
        }
        line
    }

    /// 오케스트레이터
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

/// stdin 명령 루프
pub async fn run(orchestrator: Orchestrator, refresh: Duration) -> Result<()> {
    let mut session = Session::new(orchestrator);
    let mut status = session.orchestrator().subscribe_status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!("{}", session.position_line());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("입력 종료");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match line.parse::<Command>() {
                    Ok(command) => session.execute(command).await,
                    Err(e) => Err(e),
                };
                match reply {
                    Ok(Reply::Text(text)) => println!("{text}"),
                    Ok(Reply::Quit) => break,
                    Err(e) => println!("오류: {e}"),
                }
            }
            _ = ticker.tick() => {
                let before = session.orchestrator().current_index();
                if let Err(e) = session.tick().await {
                    warn!("프레임 갱신 실패: {e}");
                }
                if session.orchestrator().current_index() != before {
                    println!("{}", session.position_line());
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                debug!("로드 상태: {current:?}");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C 수신");
                break;
            }
        }
    }

    Ok(())
}
