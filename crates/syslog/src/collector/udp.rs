//! UDP syslog 수신기
//!
//! 데이터그램 소켓을 소유하고, 데이터그램 하나를 메시지 하나로 취급합니다.
//! 프레이밍은 없습니다. 커널이 자른 초과 데이터그램은 잘린 그대로
//! 처리됩니다.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use logwell_core::pipeline::MessageSink;

use crate::error::SyslogError;
use crate::parser::SyslogParser;

/// UDP 수신기 설정
#[derive(Debug, Clone)]
pub struct UdpConfig {
    /// 바인드 주소 (예: "0.0.0.0:514")
    pub bind_addr: String,
    /// 데이터그램 최대 크기 (바이트)
    pub max_datagram_size: usize,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:514".to_owned(),
            max_datagram_size: 64 * 1024,
        }
    }
}

/// UDP syslog 수신기
///
/// 바인드는 [`UdpCollector::bind`]에서 일어나므로, 바인드 실패는
/// 시작 시점의 에러로 전파되어 프로세스를 비정상 종료시킬 수 있습니다.
pub struct UdpCollector {
    config: UdpConfig,
    socket: UdpSocket,
    parser: SyslogParser,
    sink: Arc<dyn MessageSink>,
    cancel: CancellationToken,
}

impl UdpCollector {
    /// 소켓을 바인드하고 수신기를 생성합니다.
    pub async fn bind(
        config: UdpConfig,
        sink: Arc<dyn MessageSink>,
        cancel: CancellationToken,
    ) -> Result<Self, SyslogError> {
        let socket = UdpSocket::bind(&config.bind_addr).await.map_err(|e| {
            SyslogError::Collector {
                source_type: "syslog_udp".to_owned(),
                reason: format!("failed to bind to {}: {}", config.bind_addr, e),
            }
        })?;

        info!(addr = %config.bind_addr, "UDP syslog collector listening");

        Ok(Self {
            config,
            socket,
            parser: SyslogParser::new(),
            sink,
            cancel,
        })
    }

    /// 실제로 바인드된 주소를 반환합니다 (포트 0 바인드 시 유용).
    pub fn local_addr(&self) -> Result<SocketAddr, SyslogError> {
        Ok(self.socket.local_addr()?)
    }

    /// 수신 루프를 실행합니다. 취소될 때까지 실행됩니다.
    pub async fn run(&mut self) -> Result<(), SyslogError> {
        let mut buf = vec![0u8; self.config.max_datagram_size];

        loop {
            tokio::select! {
                result = self.socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, addr)) => {
                            debug!(bytes = len, peer = %addr, "received datagram");
                            if len == 0 {
                                continue;
                            }

                            let line = String::from_utf8_lossy(&buf[..len]);
                            let record = self.parser.parse(&line, addr.ip());
                            self.sink.submit(record).await;
                        }
                        Err(e) => {
                            error!(error = %e, "UDP recv error");
                            return Err(SyslogError::Collector {
                                source_type: "syslog_udp".to_owned(),
                                reason: format!("recv error: {e}"),
                            });
                        }
                    }
                }
                _ = self.cancel.cancelled() => {
                    info!("UDP syslog collector received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }
}
