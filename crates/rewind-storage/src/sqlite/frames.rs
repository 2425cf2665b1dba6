//! 날짜 범위 프레임 조회.
//!
//! 프레임 행을 캡처 시각으로 묶어 `Frame`(디바이스별 캡처 목록)으로 만들고,
//! 같은 범위의 오디오 전사를 직전 프레임에 붙인다.

use chrono::{DateTime, Utc};
use rewind_core::error::CoreError;
use rewind_core::models::calendar::TimeRange;
use rewind_core::models::frame::{AudioSegment, DeviceFrame, DeviceMetadata, Frame};
use tracing::{debug, warn};

use super::{parse_ts, ts_key, SqliteStorage};

/// 프레임 조회 행
struct FrameRow {
    id: i64,
    timestamp: DateTime<Utc>,
    device_name: String,
    file_path: String,
    ocr_text: String,
    app_name: String,
    window_name: String,
}

/// 오디오 전사 조회 행
struct AudioRow {
    timestamp: DateTime<Utc>,
    segment: AudioSegment,
}

impl SqliteStorage {
    /// 최초 프레임 시각
    pub fn first_frame_timestamp(&self) -> Result<Option<DateTime<Utc>>, CoreError> {
        let conn = self.lock()?;
        let raw: Option<String> = conn
            .query_row("SELECT MIN(timestamp) FROM frames", [], |row| row.get(0))
            .map_err(|e| CoreError::Internal(format!("최초 프레임 조회 실패: {e}")))?;
        Ok(raw.as_deref().and_then(parse_ts))
    }

    /// 범위 내 프레임 존재 여부
    pub fn frame_exists_in(&self, range: TimeRange) -> Result<bool, CoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM frames WHERE timestamp >= ?1 AND timestamp <= ?2)",
            rusqlite::params![ts_key(range.start), ts_key(range.end)],
            |row| row.get(0),
        )
        .map_err(|e| CoreError::Internal(format!("프레임 존재 조회 실패: {e}")))
    }

    /// 범위 내 프레임 조회 (시간 오름차순)
    pub fn frames_in(&self, range: TimeRange) -> Result<Vec<Frame>, CoreError> {
        let rows = self.frame_rows(range)?;
        let audio = self.audio_rows(range)?;

        let mut frames: Vec<Frame> = Vec::new();
        for row in rows {
            let device = DeviceFrame {
                device_id: row.device_name,
                frame_id: row.id.to_string(),
                image: None,
                metadata: DeviceMetadata {
                    file_path: row.file_path,
                    app_name: row.app_name,
                    window_name: row.window_name,
                    ocr_text: row.ocr_text,
                    timestamp: row.timestamp,
                },
                audio: Vec::new(),
            };
            match frames.last_mut() {
                Some(last) if last.timestamp == row.timestamp => last.devices.push(device),
                _ => frames.push(Frame {
                    timestamp: row.timestamp,
                    devices: vec![device],
                }),
            }
        }

        attach_audio(&mut frames, audio);

        debug!(
            "프레임 조회: {} ~ {}, {}건",
            range.start,
            range.end,
            frames.len()
        );
        Ok(frames)
    }

    fn frame_rows(&self, range: TimeRange) -> Result<Vec<FrameRow>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT f.id, f.timestamp, vc.device_name, vc.file_path,
                        COALESCE((SELECT o.text FROM ocr_text o WHERE o.frame_id = f.id LIMIT 1), ''),
                        COALESCE((SELECT o.app_name FROM ocr_text o WHERE o.frame_id = f.id LIMIT 1), ''),
                        COALESCE((SELECT o.window_name FROM ocr_text o WHERE o.frame_id = f.id LIMIT 1), '')
                 FROM frames f
                 JOIN video_chunks vc ON f.video_chunk_id = vc.id
                 WHERE f.timestamp >= ?1 AND f.timestamp <= ?2
                 ORDER BY f.timestamp ASC, vc.device_name ASC, f.id ASC",
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(
                rusqlite::params![ts_key(range.start), ts_key(range.end)],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.map_err(|e| warn!("프레임 행 디코딩 실패, 건너뜀: {e}")).ok())
            .filter_map(
                |(id, raw_ts, device_name, file_path, ocr_text, app_name, window_name)| {
                    let Some(timestamp) = parse_ts(&raw_ts) else {
                        warn!("프레임 {id} 시각 파싱 실패: {raw_ts}");
                        return None;
                    };
                    Some(FrameRow {
                        id,
                        timestamp,
                        device_name,
                        file_path,
                        ocr_text,
                        app_name,
                        window_name,
                    })
                },
            )
            .collect();

        Ok(rows)
    }

    fn audio_rows(&self, range: TimeRange) -> Result<Vec<AudioRow>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT at.timestamp, at.transcription, at.device, at.is_input_device,
                        at.start_time, at.end_time, ac.file_path
                 FROM audio_transcriptions at
                 JOIN audio_chunks ac ON at.audio_chunk_id = ac.id
                 WHERE at.timestamp >= ?1 AND at.timestamp <= ?2
                 ORDER BY at.timestamp ASC, at.id ASC",
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(
                rusqlite::params![ts_key(range.start), ts_key(range.end)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                        row.get::<_, Option<f64>>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .map_err(|e| CoreError::Internal(format!("쿼리 실행 실패: {e}")))?
            .filter_map(|r| r.map_err(|e| warn!("오디오 전사 행 디코딩 실패, 건너뜀: {e}")).ok())
            .filter_map(
                |(raw_ts, transcription, device, is_input, start, end, file_path)| {
                    let timestamp = parse_ts(&raw_ts)?;
                    let start_offset = start.unwrap_or(0.0);
                    let duration = match (start, end) {
                        (Some(s), Some(e)) if e >= s => e - s,
                        _ => 0.0,
                    };
                    Some(AudioRow {
                        timestamp,
                        segment: AudioSegment {
                            device_name: device,
                            is_input,
                            transcript_text: transcription,
                            audio_file_path: file_path,
                            duration_secs: duration,
                            start_offset_secs: start_offset,
                        },
                    })
                },
            )
            .collect();

        Ok(rows)
    }
}

/// 오디오를 시각이 속한 프레임 구간 `[frame, next frame)`에 붙인다.
/// 첫 프레임보다 이른 오디오는 첫 프레임에 붙는다.
fn attach_audio(frames: &mut [Frame], audio: Vec<AudioRow>) {
    if frames.is_empty() {
        return;
    }
    for row in audio {
        let idx = frames
            .partition_point(|f| f.timestamp <= row.timestamp)
            .saturating_sub(1);
        if let Some(device) = frames[idx].devices.first_mut() {
            device.audio.push(row.segment);
        }
    }
}
