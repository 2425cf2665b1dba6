//! 타임라인 통합 테스트.
//!
//! 녹화 DB(SQLite 파일) → 오케스트레이터 전체 흐름: 시작 → 날짜 이동 → 스크롤 → 재로드.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rewind_core::config::TimelineConfig;
use rewind_core::config_manager::ConfigManager;
use rewind_core::models::calendar::DayCalendar;
use rewind_core::ports::clock::FixedClock;
use rewind_storage::sqlite::{NewAudioTranscription, NewOcrText, SqliteStorage};
use rewind_timeline::scroll::{WheelEvent, DIALOG};
use rewind_timeline::{DateChange, NavPhase, Orchestrator};
use std::sync::Arc;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
}

/// 하루에 5분 간격 프레임 `n`개 (두 모니터)
fn record_day(storage: &SqliteStorage, day: u32, n: i64) {
    let left = storage.insert_video_chunk(&format!("/rec/{day}-left.mp4"), "monitor_1").unwrap();
    let right = storage.insert_video_chunk(&format!("/rec/{day}-right.mp4"), "monitor_2").unwrap();
    for i in 0..n {
        let ts = at(day, 9, 0) + Duration::minutes(5 * i);
        for chunk in [left, right] {
            let frame_id = storage.insert_frame(chunk, ts).unwrap();
            storage
                .insert_ocr_text(
                    frame_id,
                    &NewOcrText {
                        text: format!("day {day} frame {i}"),
                        app_name: "Terminal".to_string(),
                        window_name: "zsh".to_string(),
                    },
                )
                .unwrap();
        }
    }
}

fn orchestrator(storage: Arc<SqliteStorage>, now: DateTime<Utc>) -> Orchestrator {
    Orchestrator::with_calendar(
        TimelineConfig::default(),
        storage,
        Arc::new(FixedClock(now)),
        DayCalendar::utc(),
    )
}

#[tokio::test]
async fn browse_recorded_days_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SqliteStorage::open(&dir.path().join("rec.db")).unwrap());
    record_day(&storage, 1, 4);
    record_day(&storage, 3, 4);
    record_day(&storage, 5, 2);

    let mut orch = orchestrator(storage.clone(), at(5, 18, 0));
    orch.start().await;
    orch.wait_for_load().await.unwrap();

    let snap = orch.snapshot();
    assert_eq!(snap.current_date, d(5));
    assert_eq!(snap.frames.len(), 2);
    assert_eq!(snap.frames[0].devices.len(), 2);
    assert_eq!(snap.time_range.start, at(1, 9, 0));

    // Jan 4 에는 데이터가 없다 → 뒤로 걸어 Jan 3
    let change = orch.request_date_change(d(4)).await.unwrap();
    assert!(matches!(change, DateChange::Loading { date, .. } if date == d(3)));
    orch.wait_for_load().await.unwrap();
    assert_eq!(orch.current_date(), d(3));

    // 스크롤로 마지막 프레임 넘어가면 다음 날 (Jan 5, 캐시)
    orch.handle_wheel(&WheelEvent::on_timeline(1_000.0, 0));
    orch.on_animation_frame(0).await.unwrap();
    assert_eq!(orch.current_index(), Some(3));
    orch.handle_wheel(&WheelEvent::on_timeline(10.0, 100));
    orch.on_animation_frame(100).await.unwrap();
    assert_eq!(orch.current_date(), d(5));
    assert_eq!(orch.current_index(), Some(0));

    // 대화상자 안 스크롤은 무시
    orch.handle_wheel(&WheelEvent::within(DIALOG, 1_000.0, 200));
    orch.on_animation_frame(200).await.unwrap();
    assert_eq!(orch.current_index(), Some(0));
}

#[tokio::test]
async fn audio_transcripts_attach_to_frames() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    record_day(&storage, 2, 3);
    let audio_chunk = storage.insert_audio_chunk("/rec/mic.wav").unwrap();
    storage
        .insert_audio_transcription(
            audio_chunk,
            &NewAudioTranscription {
                timestamp: at(2, 9, 6),
                transcription: "let's ship it".to_string(),
                device: "MacBook Microphone".to_string(),
                is_input_device: true,
                start_time: Some(1.5),
                end_time: Some(4.0),
            },
        )
        .unwrap();

    let mut orch = orchestrator(storage, at(2, 20, 0));
    orch.start().await;
    orch.wait_for_load().await.unwrap();

    orch.move_by(1).await.unwrap();
    let frame = orch.current_frame().unwrap();
    assert_eq!(frame.timestamp, at(2, 9, 5));
    let audio: Vec<_> = frame.audio().collect();
    assert_eq!(audio.len(), 1);
    assert_eq!(audio[0].transcript_text, "let's ship it");
    assert!((audio[0].duration_secs - 2.5).abs() < 1e-9);
    assert!((audio[0].start_offset_secs - 1.5).abs() < 1e-9);
}

#[tokio::test]
async fn today_excludes_most_recent_minutes() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    // 09:00 ~ 09:20
    record_day(&storage, 8, 5);

    // 09:22 기준: 09:17 이후 프레임은 아직 조회하지 않는다
    let mut orch = orchestrator(storage, at(8, 9, 22));
    orch.start().await;
    orch.wait_for_load().await.unwrap();

    let snap = orch.snapshot();
    assert_eq!(snap.frames.len(), 4);
    assert_eq!(snap.frames.last().unwrap().timestamp, at(8, 9, 15));
}

#[tokio::test]
async fn reload_after_new_recording() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    record_day(&storage, 4, 2);
    let mut orch = orchestrator(storage.clone(), at(4, 23, 0));
    orch.start().await;
    orch.wait_for_load().await.unwrap();
    assert_eq!(orch.snapshot().frames.len(), 2);

    let chunk = storage.insert_video_chunk("/rec/late.mp4", "monitor_1").unwrap();
    storage.insert_frame(chunk, at(4, 21, 0)).unwrap();

    orch.reload();
    orch.wait_for_load().await.unwrap();
    assert_eq!(orch.snapshot().frames.len(), 3);
    assert_eq!(orch.phase(), &NavPhase::Ready { date: d(4) });
}

#[tokio::test]
async fn config_file_drives_orchestrator() {
    let dir = tempfile::tempdir().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
    manager
        .update_with(|c| {
            c.timeline.scroll_cap = Some(1);
            c.timeline.utc_offset_minutes = Some(0);
        })
        .unwrap();

    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    record_day(&storage, 6, 10);

    let config = manager.get();
    let mut orch = Orchestrator::new(
        config.timeline,
        storage,
        Arc::new(FixedClock(at(6, 22, 0))),
    )
    .unwrap();
    orch.start().await;
    orch.wait_for_load().await.unwrap();

    // 상한 1: 큰 플릭도 한 프레임
    orch.handle_wheel(&WheelEvent::on_timeline(5_000.0, 0));
    orch.on_animation_frame(0).await.unwrap();
    assert_eq!(orch.current_index(), Some(1));
}
