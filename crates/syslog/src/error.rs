//! syslog 파이프라인 에러 타입
//!
//! [`SyslogError`]는 수신 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<SyslogError> for LogwellError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use std::path::PathBuf;

use logwell_core::error::{LogwellError, PipelineError};

/// syslog 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum SyslogError {
    /// 연결 치명적 프레이밍 에러
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// 수집기 에러 (바인드, 수신 등)
    #[error("collector error: {source_type}: {reason}")]
    Collector {
        /// 수집 소스 유형 (syslog_udp, syslog_tls)
        source_type: String,
        /// 에러 사유
        reason: String,
    },

    /// TLS 자료 로드 또는 설정 실패
    #[error("tls error: {reason}")]
    Tls {
        /// 에러 사유
        reason: String,
    },

    /// 로그 파일 기록 실패
    #[error("write error: {}: {source}", .path.display())]
    Write {
        /// 대상 파일 경로
        path: PathBuf,
        /// OS 레벨 에러
        #[source]
        source: std::io::Error,
    },

    /// 레코드 직렬화 실패
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 스트림 프레이머의 연결 치명적 에러
///
/// `Display` 출력은 운영 로그에서 grep 가능한 고정 접두어
/// (`malformed-length-prefix`, `buffer-overflow`)를 포함합니다.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// 길이 접두어가 규약을 위반함
    #[error("malformed-length-prefix: {reason}")]
    MalformedPrefix {
        /// 위반 내용
        reason: String,
    },

    /// 수신 버퍼가 상한을 초과함
    #[error("buffer-overflow: {size} bytes buffered (cap {max})")]
    BufferOverflow {
        /// 현재 버퍼 크기
        size: usize,
        /// 버퍼 상한
        max: usize,
    },
}

impl From<SyslogError> for LogwellError {
    fn from(err: SyslogError) -> Self {
        LogwellError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}
