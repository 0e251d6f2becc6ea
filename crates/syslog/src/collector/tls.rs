//! TLS syslog 수신기
//!
//! 스트림 소켓을 소유하고, TLS 핸드셰이크 후 연결마다 태스크를 하나씩
//! 스폰합니다. 각 세션은 자신의 [`OctetCountFramer`] 버퍼를 단독으로
//! 소유합니다. 프레이밍 규약 위반은 연결 치명적이며, 해당 연결만 닫고
//! 수신기는 계속 동작합니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use logwell_core::pipeline::MessageSink;

use crate::error::SyslogError;
use crate::framer::{DEFAULT_MAX_BUFFER, DEFAULT_MAX_FRAME, OctetCountFramer};
use crate::parser::SyslogParser;

/// 세션당 읽기 청크 크기 (바이트)
pub const READ_CHUNK: usize = 8 * 1024;

/// TLS 수신기 설정
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// 바인드 주소 (예: "0.0.0.0:6514")
    pub bind_addr: String,
    /// PEM 서버 인증서 경로
    pub cert_file: PathBuf,
    /// PEM 개인 키 경로
    pub key_file: PathBuf,
    /// 최대 동시 세션 수
    pub max_connections: usize,
    /// 세션 비활성 타임아웃
    pub read_timeout: Duration,
    /// 프레임 최대 크기 (바이트)
    pub max_frame_bytes: usize,
    /// 세션당 수신 버퍼 상한 (바이트)
    pub max_buffer_bytes: usize,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:6514".to_owned(),
            cert_file: PathBuf::from("cert.pem"),
            key_file: PathBuf::from("key.pem"),
            max_connections: 100,
            read_timeout: Duration::from_secs(300),
            max_frame_bytes: DEFAULT_MAX_FRAME,
            max_buffer_bytes: DEFAULT_MAX_BUFFER,
        }
    }
}

/// 세션 루프 파라미터 — 수신기 설정에서 세션 태스크로 넘어가는 부분
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// 세션 비활성 타임아웃
    pub read_timeout: Duration,
    /// 프레임 최대 크기 (바이트)
    pub max_frame_bytes: usize,
    /// 수신 버퍼 상한 (바이트)
    pub max_buffer_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(300),
            max_frame_bytes: DEFAULT_MAX_FRAME,
            max_buffer_bytes: DEFAULT_MAX_BUFFER,
        }
    }
}

impl TlsConfig {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            read_timeout: self.read_timeout,
            max_frame_bytes: self.max_frame_bytes,
            max_buffer_bytes: self.max_buffer_bytes,
        }
    }
}

/// TLS syslog 수신기
pub struct TlsCollector {
    config: TlsConfig,
    listener: TcpListener,
    acceptor: TlsAcceptor,
    sink: Arc<dyn MessageSink>,
    cancel: CancellationToken,
}

impl TlsCollector {
    /// TLS 자료를 로드하고 스트림 소켓을 바인드합니다.
    ///
    /// 인증서/키 로드 실패와 바인드 실패는 시작 시점의 에러로 전파됩니다.
    pub async fn bind(
        config: TlsConfig,
        sink: Arc<dyn MessageSink>,
        cancel: CancellationToken,
    ) -> Result<Self, SyslogError> {
        let tls_config = load_server_config(&config.cert_file, &config.key_file)?;
        let acceptor = TlsAcceptor::from(Arc::new(tls_config));

        let listener = TcpListener::bind(&config.bind_addr).await.map_err(|e| {
            SyslogError::Collector {
                source_type: "syslog_tls".to_owned(),
                reason: format!("failed to bind to {}: {}", config.bind_addr, e),
            }
        })?;

        info!(addr = %config.bind_addr, "TLS syslog collector listening");

        Ok(Self {
            config,
            listener,
            acceptor,
            sink,
            cancel,
        })
    }

    /// 실제로 바인드된 주소를 반환합니다.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, SyslogError> {
        Ok(self.listener.local_addr()?)
    }

    /// 수락 루프를 실행합니다. 취소될 때까지 실행됩니다.
    pub async fn run(&mut self) -> Result<(), SyslogError> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "TCP accept error");
                            return Err(SyslogError::Collector {
                                source_type: "syslog_tls".to_owned(),
                                reason: format!("accept error: {e}"),
                            });
                        }
                    };

                    // 세션 상한: 초과 연결은 수락 직후 닫는다
                    let permit = match semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            warn!(peer = %peer, "session limit reached, closing connection");
                            drop(stream);
                            continue;
                        }
                    };

                    debug!(peer = %peer, "accepted connection");

                    let acceptor = self.acceptor.clone();
                    let sink = Arc::clone(&self.sink);
                    let session = self.config.session_config();
                    let cancel = self.cancel.clone();

                    tokio::spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(tls_stream) => {
                                if let Err(e) =
                                    run_session(tls_stream, peer, sink, session, cancel).await
                                {
                                    debug!(peer = %peer, error = %e, "session closed with error");
                                }
                            }
                            Err(e) => {
                                warn!(peer = %peer, error = %e, "TLS handshake failed");
                            }
                        }
                        drop(permit);
                    });
                }
                _ = self.cancel.cancelled() => {
                    info!("TLS syslog collector received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// 세션 하나의 읽기/프레이밍/제출 루프
///
/// TLS 스트림뿐 아니라 임의의 `AsyncRead`로도 구동할 수 있어
/// 인증서 없이 프레이밍 동작을 검증할 수 있습니다.
pub async fn run_session<S: AsyncRead + Unpin>(
    mut stream: S,
    peer: std::net::SocketAddr,
    sink: Arc<dyn MessageSink>,
    config: SessionConfig,
    cancel: CancellationToken,
) -> Result<(), SyslogError> {
    let parser = SyslogParser::new();
    let mut framer = OctetCountFramer::with_limits(config.max_frame_bytes, config.max_buffer_bytes);
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        tokio::select! {
            result = timeout(config.read_timeout, stream.read(&mut buf)) => {
                match result {
                    Ok(Ok(0)) => {
                        debug!(peer = %peer, "connection closed by peer");
                        break;
                    }
                    Ok(Ok(n)) => {
                        match framer.feed(&buf[..n]) {
                            Ok(frames) => {
                                for frame in frames {
                                    let record = parser.parse(&frame, peer.ip());
                                    sink.submit(record).await;
                                }
                            }
                            Err(e) => {
                                error!(peer = %peer, error = %e, "fatal framing error, closing connection");
                                return Err(e.into());
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        error!(peer = %peer, error = %e, "read error");
                        return Err(e.into());
                    }
                    Err(_) => {
                        debug!(peer = %peer, "read timeout, closing idle connection");
                        break;
                    }
                }
            }
            _ = cancel.cancelled() => {
                debug!(peer = %peer, "session received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}

/// PEM 인증서/키 쌍에서 rustls 서버 설정을 만듭니다.
///
/// 클라이언트 인증서는 요구하지 않습니다 (서버 측 신원 제시만).
fn load_server_config(
    cert_file: &Path,
    key_file: &Path,
) -> Result<rustls::ServerConfig, SyslogError> {
    let cert_data = std::fs::read(cert_file).map_err(|e| SyslogError::Tls {
        reason: format!("failed to read certificate {}: {}", cert_file.display(), e),
    })?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut cert_data.as_slice())
        .collect::<Result<_, _>>()
        .map_err(|e| SyslogError::Tls {
            reason: format!("invalid certificate {}: {}", cert_file.display(), e),
        })?;
    if certs.is_empty() {
        return Err(SyslogError::Tls {
            reason: format!("no certificates found in {}", cert_file.display()),
        });
    }

    let key_data = std::fs::read(key_file).map_err(|e| SyslogError::Tls {
        reason: format!("failed to read private key {}: {}", key_file.display(), e),
    })?;
    let key = rustls_pemfile::private_key(&mut key_data.as_slice())
        .map_err(|e| SyslogError::Tls {
            reason: format!("invalid private key {}: {}", key_file.display(), e),
        })?
        .ok_or_else(|| SyslogError::Tls {
            reason: format!("no private key found in {}", key_file.display()),
        })?;

    rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| SyslogError::Tls {
            reason: format!("failed to build TLS config: {e}"),
        })
}
