//! rewind 도메인 모델.
//!
//! 녹화 데이터(프레임, 오디오)와 타임라인 시간 단위를 정의한다.
//! 데이터 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod calendar;
pub mod frame;
