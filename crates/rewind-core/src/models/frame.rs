//! 프레임(스크린샷 + 오디오) 모델.
//!
//! 녹화기가 남긴 캡처 한 건을 디바이스별 이미지/메타데이터와
//! 그 구간의 오디오 전사 세그먼트로 묶는다. 생성 후 변경되지 않는다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 타임라인 프레임 (식별자 = 캡처 시각)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 캡처 시각
    pub timestamp: DateTime<Utc>,
    /// 디바이스(모니터)별 캡처
    pub devices: Vec<DeviceFrame>,
}

impl Frame {
    /// 디바이스 캡처 없이 시각만 가진 프레임
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            devices: Vec::new(),
        }
    }

    /// 전체 디바이스의 오디오 세그먼트 순회
    pub fn audio(&self) -> impl Iterator<Item = &AudioSegment> {
        self.devices.iter().flat_map(|d| d.audio.iter())
    }
}

/// 디바이스 단위 캡처
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceFrame {
    /// 디바이스 ID (모니터 이름)
    pub device_id: String,
    /// 프레임 ID
    pub frame_id: String,
    /// Base64 인코딩 이미지 (렌더러가 별도로 가져오면 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 캡처 메타데이터
    pub metadata: DeviceMetadata,
    /// 이 프레임 구간의 오디오 세그먼트
    #[serde(default)]
    pub audio: Vec<AudioSegment>,
}

/// 디바이스 캡처 메타데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// 비디오 청크 파일 경로
    pub file_path: String,
    /// 활성 앱 이름
    pub app_name: String,
    /// 창 제목
    pub window_name: String,
    /// OCR 추출 텍스트
    pub ocr_text: String,
    /// 캡처 시각
    pub timestamp: DateTime<Utc>,
}

/// 오디오 전사 세그먼트
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    /// 오디오 디바이스 이름
    pub device_name: String,
    /// 입력 장치(마이크) 여부, false면 출력(스피커)
    pub is_input: bool,
    /// 전사 텍스트
    pub transcript_text: String,
    /// 오디오 청크 파일 경로
    pub audio_file_path: String,
    /// 세그먼트 길이 (초)
    pub duration_secs: f64,
    /// 청크 시작 기준 오프셋 (초)
    pub start_offset_secs: f64,
}
