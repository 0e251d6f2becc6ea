//! 파이프라인 trait — 컴포넌트 생명주기와 레코드 싱크 정의
//!
//! [`Pipeline`] trait은 수신 서버가 구현하는 생명주기 인터페이스입니다.
//! [`MessageSink`]는 두 수신기(UDP, TLS)가 공유하는 유일한 다형성 지점으로,
//! 파싱된 레코드를 중복 제거와 기록으로 라우팅합니다.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::error::LogwellError;
use crate::types::ParsedMessage;

/// dyn-compatible Future 타입 별칭
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 수신 서버가 구현하는 생명주기 trait
///
/// `logwell-daemon`에서 시작/정지하고 상태를 확인하는 데 사용됩니다.
pub trait Pipeline: Send + Sync {
    /// 컴포넌트를 시작합니다.
    ///
    /// 소켓 바인드, 워커 스폰 등을 수행합니다.
    /// 이미 실행 중인 경우 `PipelineError::AlreadyRunning`을 반환합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), LogwellError>> + Send;

    /// 컴포넌트를 정지합니다.
    ///
    /// 새 작업 수락을 멈추고, 진행 중인 프레임이 완료될 짧은 유예 기간을 준 뒤
    /// 리소스를 정리합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), LogwellError>> + Send;

    /// 컴포넌트의 현재 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 컴포넌트 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상 동작 중
    Healthy,
    /// 성능 저하 또는 부분적 장애 (서비스는 계속 동작)
    Degraded(String),
    /// 비정상 — 서비스 불가 상태
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 파싱된 레코드를 받아 처리하는 싱크
///
/// 수신기는 레코드별 에러를 스스로 흡수하므로 반환값이 없습니다.
/// 파이프라인은 직선 구조입니다: 수신 → 파싱 → `submit` → 중복 제거 → 기록.
pub trait MessageSink: Send + Sync {
    /// 레코드 하나를 파이프라인에 제출합니다.
    fn submit(&self, record: ParsedMessage) -> BoxFuture<'_, ()>;
}
