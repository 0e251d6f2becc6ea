//! 수신 서버 — 컴포넌트 조립과 생명주기
//!
//! [`SyslogServer`]는 기록기, 중복 억제기, 활성화된 수신기들을 소유하고
//! core의 [`Pipeline`] trait을 구현합니다. `start`는 소켓을 바인드하고
//! 수신 태스크를 스폰하며, `stop`은 취소 토큰을 전파한 뒤 짧은 유예
//! 기간 안에 태스크가 끝나기를 기다립니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use logwell_core::config::SyslogConfig;
use logwell_core::error::{LogwellError, PipelineError};
use logwell_core::pipeline::{HealthStatus, MessageSink, Pipeline};

use crate::collector::{TlsCollector, TlsConfig, UdpCollector, UdpConfig};
use crate::dedup::MessageDeduplicator;
use crate::error::SyslogError;
use crate::pipeline::MessagePipeline;
use crate::writer::SeverityWriter;

/// 서버 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// syslog 수신 서버
///
/// # 사용 예시
/// ```ignore
/// let mut server = SyslogServerBuilder::new().config(config.syslog).build()?;
/// server.start().await?;
/// // ...
/// server.stop().await?;
/// ```
pub struct SyslogServer {
    config: SyslogConfig,
    state: ServerState,
    cancel: CancellationToken,
    pipeline: Option<Arc<MessagePipeline>>,
    tasks: Vec<JoinHandle<()>>,
    udp_addr: Option<SocketAddr>,
    tls_addr: Option<SocketAddr>,
}

impl SyslogServer {
    /// 현재 상태 이름을 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            ServerState::Initialized => "initialized",
            ServerState::Running => "running",
            ServerState::Stopped => "stopped",
        }
    }

    /// 실행 중인 파이프라인을 반환합니다 (시작 전이면 `None`).
    pub fn pipeline(&self) -> Option<&Arc<MessagePipeline>> {
        self.pipeline.as_ref()
    }

    /// UDP 수신기가 바인드된 주소를 반환합니다.
    pub fn udp_local_addr(&self) -> Option<SocketAddr> {
        self.udp_addr
    }

    /// TLS 수신기가 바인드된 주소를 반환합니다.
    pub fn tls_local_addr(&self) -> Option<SocketAddr> {
        self.tls_addr
    }

    fn udp_config(&self) -> UdpConfig {
        UdpConfig {
            bind_addr: format!("{}:{}", self.config.bind_host, self.config.udp_port),
            ..Default::default()
        }
    }

    fn tls_config(&self) -> TlsConfig {
        TlsConfig {
            bind_addr: format!("{}:{}", self.config.bind_host, self.config.tls_port),
            cert_file: self.config.cert_file.clone().into(),
            key_file: self.config.key_file.clone().into(),
            max_connections: self.config.max_connections,
            read_timeout: Duration::from_secs(self.config.read_timeout_secs),
            max_frame_bytes: self.config.max_frame_bytes,
            max_buffer_bytes: self.config.max_buffer_bytes,
        }
    }
}

impl Pipeline for SyslogServer {
    async fn start(&mut self) -> Result<(), LogwellError> {
        if self.state == ServerState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        info!("starting syslog server");

        let writer = SeverityWriter::open(&self.config.log_dir)
            .await
            .map_err(LogwellError::from)?;
        let dedup = MessageDeduplicator::new(
            Duration::from_secs(self.config.dedup_window_secs),
            self.config.dedup_max_entries,
        );
        let pipeline = Arc::new(MessagePipeline::new(dedup, writer));
        let sink: Arc<dyn MessageSink> = pipeline.clone() as Arc<dyn MessageSink>;

        // 재시작 지원: 토큰은 start마다 새로 만든다
        self.cancel = CancellationToken::new();
        self.udp_addr = None;
        self.tls_addr = None;

        if self.config.enable_udp {
            let mut collector = UdpCollector::bind(
                self.udp_config(),
                Arc::clone(&sink),
                self.cancel.clone(),
            )
            .await
            .map_err(LogwellError::from)?;
            self.udp_addr = Some(collector.local_addr().map_err(LogwellError::from)?);
            self.tasks.push(tokio::spawn(async move {
                if let Err(e) = collector.run().await {
                    error!(error = %e, "UDP collector terminated");
                }
            }));
        }

        if self.config.enable_tls {
            let bound = TlsCollector::bind(
                self.tls_config(),
                Arc::clone(&sink),
                self.cancel.clone(),
            )
            .await;
            let mut collector = match bound {
                Ok(collector) => collector,
                Err(e) => {
                    // 부분 시작 롤백: 이미 스폰된 수신기를 정리한다
                    self.cancel.cancel();
                    for task in self.tasks.drain(..) {
                        task.abort();
                    }
                    self.udp_addr = None;
                    return Err(e.into());
                }
            };
            self.tls_addr = Some(collector.local_addr().map_err(LogwellError::from)?);
            self.tasks.push(tokio::spawn(async move {
                if let Err(e) = collector.run().await {
                    error!(error = %e, "TLS collector terminated");
                }
            }));
        }

        if self.tasks.is_empty() {
            warn!("both receivers disabled, server has nothing to do");
        }

        self.pipeline = Some(pipeline);
        self.state = ServerState::Running;
        info!(
            udp = ?self.udp_addr,
            tls = ?self.tls_addr,
            log_dir = %self.config.log_dir,
            "syslog server started"
        );
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), LogwellError> {
        if self.state != ServerState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping syslog server");
        self.cancel.cancel();

        // 진행 중인 프레임이 마무리될 짧은 유예 기간
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        for mut task in self.tasks.drain(..) {
            if tokio::time::timeout(grace, &mut task).await.is_err() {
                warn!("collector task did not stop within grace period, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        self.state = ServerState::Stopped;
        info!("syslog server stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            ServerState::Running => HealthStatus::Healthy,
            ServerState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            ServerState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// syslog 서버 빌더
pub struct SyslogServerBuilder {
    config: SyslogConfig,
}

impl SyslogServerBuilder {
    /// 기본 설정으로 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: SyslogConfig::default(),
        }
    }

    /// 수신 설정을 지정합니다.
    pub fn config(mut self, config: SyslogConfig) -> Self {
        self.config = config;
        self
    }

    /// 서버를 빌드합니다. 소켓 바인드는 `start`에서 일어납니다.
    pub fn build(self) -> Result<SyslogServer, SyslogError> {
        Ok(SyslogServer {
            config: self.config,
            state: ServerState::Initialized,
            cancel: CancellationToken::new(),
            pipeline: None,
            tasks: Vec::new(),
            udp_addr: None,
            tls_addr: None,
        })
    }
}

impl Default for SyslogServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
