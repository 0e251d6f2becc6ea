//! 수신기 모듈 — 두 전송 계층에서 syslog 메시지를 수집합니다.
//!
//! # 수신기
//! - [`UdpCollector`]: UDP 데이터그램 수신 (데이터그램 하나 = 메시지 하나)
//! - [`TlsCollector`]: TLS 스트림 수신 (octet-counted 프레이밍)
//!
//! # 아키텍처
//! 각 수신기는 자체 tokio 태스크에서 실행됩니다. 수신기는 바이트를
//! 디코딩하고 파싱한 레코드를 공유 [`MessageSink`]에 직접 제출합니다.
//! 중간 큐는 없으므로 스트림 연결 하나 안에서는 전송 순서가 보존됩니다.
//!
//! [`MessageSink`]: logwell_core::pipeline::MessageSink

pub mod tls;
pub mod udp;

pub use tls::{SessionConfig, TlsCollector, TlsConfig, run_session};
pub use udp::{UdpCollector, UdpConfig};
