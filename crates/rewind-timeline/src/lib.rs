//! # rewind-timeline
//!
//! 타임라인 탐색 및 프레임 동기화 엔진.
//! 휠/트랙패드 입력을 프레임 인덱스 이동으로 바꾸고,
//! 프레임 커서(세밀)와 날짜 커서(거친)를 일관되게 유지하며,
//! 날짜별 프레임을 지연 로드한다.
//!
//! ## 모듈
//! - [`boundary`]: 날짜별 프레임 존재 여부 / 최초 녹화일 (세션 캐시)
//! - [`fetch`]: 하루 범위 프레임 로드, 오래된 응답 폐기
//! - [`cursor`]: 프레임 시퀀스 + 인덱스 커서
//! - [`scroll`]: 휠 이벤트 → 인덱스 델타 (강도 곡선, 스로틀, 제외 영역)
//! - [`animation`]: 인덱스 간 ease-out 애니메이션
//! - [`day_cache`]: 로드된 날짜별 프레임 LRU 캐시
//! - [`orchestrator`]: 날짜 변경 상태 머신, 단일 중재자

pub mod animation;
pub mod boundary;
pub mod cursor;
pub mod day_cache;
pub mod fetch;
pub mod orchestrator;
pub mod scroll;

#[cfg(test)]
mod testing;

pub use orchestrator::{DateChange, NavPhase, Orchestrator, TimelineSnapshot};
