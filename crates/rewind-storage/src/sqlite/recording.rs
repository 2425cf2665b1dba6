//! 녹화기 쓰기 경로.
//!
//! 비디오/오디오 청크와 그에 속한 프레임, OCR 텍스트, 오디오 전사를 저장한다.
//! 타임라인은 읽기만 하지만 통합 테스트와 데이터 시딩에 같은 경로를 쓴다.

use chrono::{DateTime, Utc};
use rewind_core::error::CoreError;
use tracing::debug;

use super::{ts_key, SqliteStorage};

/// 새 OCR 결과
#[derive(Debug, Clone)]
pub struct NewOcrText {
    /// 추출 텍스트
    pub text: String,
    /// 활성 앱 이름
    pub app_name: String,
    /// 창 제목
    pub window_name: String,
}

/// 새 오디오 전사
#[derive(Debug, Clone)]
pub struct NewAudioTranscription {
    /// 전사 시각
    pub timestamp: DateTime<Utc>,
    /// 전사 텍스트
    pub transcription: String,
    /// 오디오 디바이스 이름
    pub device: String,
    /// 입력 장치 여부
    pub is_input_device: bool,
    /// 청크 내 시작 오프셋 (초)
    pub start_time: Option<f64>,
    /// 청크 내 종료 오프셋 (초)
    pub end_time: Option<f64>,
}

impl SqliteStorage {
    /// 비디오 청크 저장
    pub fn insert_video_chunk(&self, file_path: &str, device_name: &str) -> Result<i64, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO video_chunks (file_path, device_name) VALUES (?1, ?2)",
            rusqlite::params![file_path, device_name],
        )
        .map_err(|e| CoreError::Internal(format!("비디오 청크 저장 실패: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// 프레임 저장 (청크 내 offset_index는 자동 증가)
    pub fn insert_frame(&self, video_chunk_id: i64, timestamp: DateTime<Utc>) -> Result<i64, CoreError> {
        let conn = self.lock()?;

        let offset_index: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(offset_index), -1) + 1 FROM frames WHERE video_chunk_id = ?1",
                rusqlite::params![video_chunk_id],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Internal(format!("오프셋 조회 실패: {e}")))?;

        conn.execute(
            "INSERT INTO frames (video_chunk_id, offset_index, timestamp) VALUES (?1, ?2, ?3)",
            rusqlite::params![video_chunk_id, offset_index, ts_key(timestamp)],
        )
        .map_err(|e| CoreError::Internal(format!("프레임 저장 실패: {e}")))?;

        let frame_id = conn.last_insert_rowid();
        debug!("프레임 저장: id={frame_id}, chunk={video_chunk_id}, offset={offset_index}");
        Ok(frame_id)
    }

    /// 프레임 OCR 텍스트 저장
    pub fn insert_ocr_text(&self, frame_id: i64, ocr: &NewOcrText) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO ocr_text (frame_id, text, app_name, window_name) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![frame_id, ocr.text, ocr.app_name, ocr.window_name],
        )
        .map_err(|e| CoreError::Internal(format!("OCR 텍스트 저장 실패: {e}")))?;
        Ok(())
    }

    /// 오디오 청크 저장
    pub fn insert_audio_chunk(&self, file_path: &str) -> Result<i64, CoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO audio_chunks (file_path) VALUES (?1)",
            rusqlite::params![file_path],
        )
        .map_err(|e| CoreError::Internal(format!("오디오 청크 저장 실패: {e}")))?;
        Ok(conn.last_insert_rowid())
    }

    /// 오디오 전사 저장
    pub fn insert_audio_transcription(
        &self,
        audio_chunk_id: i64,
        audio: &NewAudioTranscription,
    ) -> Result<i64, CoreError> {
        let conn = self.lock()?;

        let offset_index: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(offset_index), -1) + 1 FROM audio_transcriptions WHERE audio_chunk_id = ?1",
                rusqlite::params![audio_chunk_id],
                |row| row.get(0),
            )
            .map_err(|e| CoreError::Internal(format!("오프셋 조회 실패: {e}")))?;

        conn.execute(
            "INSERT INTO audio_transcriptions
                (audio_chunk_id, offset_index, timestamp, transcription, device, is_input_device, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                audio_chunk_id,
                offset_index,
                ts_key(audio.timestamp),
                audio.transcription,
                audio.device,
                audio.is_input_device,
                audio.start_time,
                audio.end_time,
            ],
        )
        .map_err(|e| CoreError::Internal(format!("오디오 전사 저장 실패: {e}")))?;

        Ok(conn.last_insert_rowid())
    }
}
