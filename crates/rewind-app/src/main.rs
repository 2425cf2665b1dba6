//! # rewind-app
//!
//! rewind 타임라인 바이너리 진입점.
//! 설정 로드, 녹화 DB 연결, 오케스트레이터 와이어링 후 대화형 탐색 세션을 실행한다.

mod session;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rewind_core::config::AppConfig;
use rewind_core::config_manager::ConfigManager;
use rewind_core::ports::clock::SystemClock;
use rewind_storage::sqlite::SqliteStorage;
use rewind_timeline::Orchestrator;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// rewind 타임라인 탐색기
///
/// 녹화된 화면/오디오 기록을 날짜와 프레임 단위로 탐색한다.
#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 녹화 DB 경로 (기본: 설정값 또는 플랫폼 데이터 디렉토리)
    #[arg(long)]
    db: Option<PathBuf>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 시작 날짜 (YYYY-MM-DD, 기본: 오늘)
    #[arg(long, short = 'd')]
    date: Option<NaiveDate>,

    /// 날짜 경계 UTC 오프셋 (분, 기본: 시스템 로컬)
    #[arg(long, allow_negative_numbers = true)]
    utc_offset: Option<i32>,

    /// 스크롤 한 번에 이동할 최대 프레임 수
    #[arg(long)]
    scroll_cap: Option<u32>,

    /// 스크롤 방향 반전
    #[arg(long)]
    invert_scroll: bool,

    /// 애니메이션 프레임 간격 (밀리초)
    #[arg(long, default_value = "16")]
    refresh_ms: u64,
}

/// 녹화 DB 경로 결정 (CLI 인자 → 설정 → 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/dev.rewind.rewind/rewind.db`
/// - Windows: `%APPDATA%\rewind\rewind\data\rewind.db`
/// - Linux: `~/.local/share/rewind/rewind.db`
fn resolve_db_path(cli: Option<PathBuf>, config: &AppConfig) -> PathBuf {
    cli.or_else(|| config.storage.db_path.clone())
        .or_else(|| ConfigManager::data_dir().ok().map(|d| d.join("rewind.db")))
        .unwrap_or_else(|| PathBuf::from("./rewind.db"))
}

/// CLI 인자로 설정 오버라이드
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(offset) = args.utc_offset {
        config.timeline.utc_offset_minutes = Some(offset);
    }
    if let Some(cap) = args.scroll_cap {
        config.timeline.scroll_cap = Some(cap);
    }
    if args.invert_scroll {
        config.timeline.invert_scroll = true;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화 (stdout은 세션 출력용)
    let log_filter = format!(
        "rewind={},rewind_app={},rewind_core={},rewind_storage={},rewind_timeline={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("rewind 시작");

    // 설정 로드
    let config_manager = match args.config.clone() {
        Some(path) => ConfigManager::with_path(path).context("설정 파일 로드 실패")?,
        None => ConfigManager::new().context("설정 관리자 초기화 실패")?,
    };
    info!("설정 파일: {:?}", config_manager.config_path());

    let mut config = config_manager.get();
    apply_overrides(&mut config, &args);
    config.validate().context("설정 검증 실패")?;

    // 녹화 DB
    let db_path = resolve_db_path(args.db.clone(), &config);
    info!("녹화 DB: {}", db_path.display());
    let storage = Arc::new(SqliteStorage::open(&db_path).context("녹화 DB 열기 실패")?);

    // 오케스트레이터
    let mut orchestrator = Orchestrator::new(config.timeline.clone(), storage, Arc::new(SystemClock))
        .context("타임라인 초기화 실패")?;
    orchestrator.start().await;
    orchestrator.wait_for_load().await?;

    if let Some(date) = args.date {
        match orchestrator.request_date_change(date).await {
            Ok(change) => info!("시작 날짜 {date}: {change:?}"),
            Err(e) => warn!("시작 날짜 {date} 이동 실패: {e}"),
        }
        orchestrator.wait_for_load().await?;
    }

    info!("탐색 세션 시작 (help로 명령 확인, Ctrl+C로 종료)");
    session::run(orchestrator, Duration::from_millis(args.refresh_ms.max(1))).await?;

    info!("rewind 종료");
    Ok(())
}
