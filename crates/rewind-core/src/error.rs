//! rewind 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 자체 에러를 `CoreError`로 매핑한다.

use chrono::NaiveDate;
use thiserror::Error;

/// 코어 레이어 에러.
/// 직렬화, 설정, 데이터 소스, 타임라인 탐색 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 ({field}): {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Frame", "EarliestDate")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// 외부 데이터 소스 조회 실패 (DB, 녹화 서버)
    #[error("데이터 소스 에러: {0}")]
    DataSource(String),

    /// 특정 날짜의 프레임 로드 실패
    #[error("{date} 프레임 로드 실패: {cause}")]
    Fetch {
        /// 로드 대상 날짜
        date: NaiveDate,
        /// 실패 원인
        cause: String,
    },

    /// 최초 녹화일 이전으로의 탐색 시도
    #[error("탐색 범위 초과: {requested} < {earliest}")]
    BoundaryExceeded {
        /// 요청된 날짜
        requested: NaiveDate,
        /// 최초 녹화일
        earliest: NaiveDate,
    },

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}
