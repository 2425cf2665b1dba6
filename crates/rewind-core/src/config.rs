//! 애플리케이션 설정 구조체.
//!
//! 타임라인 탐색(스크롤 곡선, 스로틀, 애니메이션, 경계 탐색)과
//! 로컬 저장소 경로 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 타임라인 탐색 설정
    #[serde(default)]
    pub timeline: TimelineConfig,
    /// 로컬 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 타임라인 설정
// ============================================================

/// 타임라인 탐색 설정: 스크롤 변환, 애니메이션, 날짜 경계
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// 스크롤 1회당 최대 인덱스 이동량 (None이면 무제한)
    #[serde(default)]
    pub scroll_cap: Option<u32>,
    /// 스크롤 강도 정규화 분모 (|delta| / divisor)
    #[serde(default = "default_scroll_divisor")]
    pub scroll_divisor: f64,
    /// 스크롤 강도 지수 (초선형 곡선)
    #[serde(default = "default_scroll_exponent")]
    pub scroll_exponent: f64,
    /// 스크롤 스로틀 간격 (밀리초, 디스플레이 1 프레임)
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// 스크롤 방향 반전.
    ///
    /// 기본은 `sign(delta_y)`(아래로 굴리면 다음 프레임). 켜면 `-sign(delta_y)`로
    /// rewind 웹 타임라인과 같은 방향(아래로 굴리면 이전 프레임)이 된다.
    #[serde(default)]
    pub invert_scroll: bool,
    /// 기본 애니메이션 시간 (밀리초)
    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,
    /// 오늘 날짜 조회 시 상한에서 뺄 안전 여유 (초)
    #[serde(default = "default_today_safety_margin_secs")]
    pub today_safety_margin_secs: u64,
    /// 빈 날짜 경계 탐색 최대 일수
    #[serde(default = "default_max_boundary_walk_days")]
    pub max_boundary_walk_days: u32,
    /// 메모리에 유지할 날짜별 프레임 캐시 수
    #[serde(default = "default_max_cached_days")]
    pub max_cached_days: usize,
    /// 달력 날짜 계산용 UTC 오프셋 (분, None이면 시스템 로컬)
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            scroll_cap: None,
            scroll_divisor: default_scroll_divisor(),
            scroll_exponent: default_scroll_exponent(),
            throttle_ms: default_throttle_ms(),
            invert_scroll: false,
            animation_duration_ms: default_animation_duration_ms(),
            today_safety_margin_secs: default_today_safety_margin_secs(),
            max_boundary_walk_days: default_max_boundary_walk_days(),
            max_cached_days: default_max_cached_days(),
            utc_offset_minutes: None,
        }
    }
}

impl TimelineConfig {
    /// 오늘 날짜 조회 상한 여유
    pub fn today_safety_margin(&self) -> Duration {
        Duration::from_secs(self.today_safety_margin_secs)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.scroll_divisor > 0.0) {
            return Err(CoreError::Validation {
                field: "timeline.scroll_divisor".to_string(),
                message: format!("양수여야 합니다 (현재: {})", self.scroll_divisor),
            });
        }
        if !(self.scroll_exponent > 0.0) {
            return Err(CoreError::Validation {
                field: "timeline.scroll_exponent".to_string(),
                message: format!("양수여야 합니다 (현재: {})", self.scroll_exponent),
            });
        }
        if self.max_cached_days == 0 {
            return Err(CoreError::Validation {
                field: "timeline.max_cached_days".to_string(),
                message: "1 이상이어야 합니다".to_string(),
            });
        }
        if let Some(offset) = self.utc_offset_minutes {
            if offset.abs() >= 24 * 60 {
                return Err(CoreError::Validation {
                    field: "timeline.utc_offset_minutes".to_string(),
                    message: format!("±1440분 미만이어야 합니다 (현재: {offset})"),
                });
            }
        }
        Ok(())
    }
}

fn default_scroll_divisor() -> f64 {
    50.0
}

fn default_scroll_exponent() -> f64 {
    1.5
}

fn default_throttle_ms() -> u64 {
    16
}

fn default_animation_duration_ms() -> u64 {
    1_000
}

fn default_today_safety_margin_secs() -> u64 {
    5 * 60
}

fn default_max_boundary_walk_days() -> u32 {
    366
}

fn default_max_cached_days() -> usize {
    7
}

// ============================================================
// 저장소 설정
// ============================================================

/// 로컬 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 녹화 DB 경로 (None이면 플랫폼 기본 데이터 디렉토리)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            timeline: TimelineConfig::default(),
            storage: StorageConfig::default(),
        }
    }

    /// 전체 설정 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        self.timeline.validate()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "timeline": { "scroll_cap": 20 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeline.scroll_cap, Some(20));
        assert_eq!(config.timeline.throttle_ms, 16);
        assert_eq!(config.timeline.max_cached_days, 7);
        assert!(config.storage.db_path.is_none());
    }

    #[test]
    fn empty_json_is_default() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.timeline.scroll_divisor, 50.0);
        assert_eq!(config.timeline.scroll_exponent, 1.5);
    }

    #[test]
    fn validate_rejects_zero_divisor() {
        let mut config = AppConfig::default_config();
        config.timeline.scroll_divisor = 0.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_offset() {
        let mut config = AppConfig::default_config();
        config.timeline.utc_offset_minutes = Some(24 * 60);
        assert!(config.validate().is_err());

        config.timeline.utc_offset_minutes = Some(9 * 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn safety_margin_duration() {
        let config = TimelineConfig::default();
        assert_eq!(config.today_safety_margin(), Duration::from_secs(300));
    }
}
