//! 에러 타입 — 도메인별 에러 정의

/// Logwell 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogwellError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 파이프라인 생명주기 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일 읽기 실패
    #[error("failed to read config file {path}: {reason}")]
    FileRead { path: String, reason: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파이프라인 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 이미 실행 중인 컴포넌트를 다시 시작하려 함
    #[error("component is already running")]
    AlreadyRunning,

    /// 실행 중이 아닌 컴포넌트를 정지하려 함
    #[error("component is not running")]
    NotRunning,

    /// 컴포넌트 초기화 실패 (바인드 실패, TLS 자료 로드 실패 등)
    #[error("component init failed: {0}")]
    InitFailed(String),
}
