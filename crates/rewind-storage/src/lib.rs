//! # rewind-storage
//!
//! 녹화 저장소 어댑터.
//! 녹화기가 기록한 SQLite DB(비디오 청크, 프레임, OCR 텍스트, 오디오 전사)를
//! 날짜 범위 단위로 조회하여 `FrameSource` 포트를 구현한다.
//!
//! ## 모듈
//! - `sqlite`: 녹화 저장소 (FrameSource 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
