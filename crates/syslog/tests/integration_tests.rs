//! 통합 테스트 — 수신부터 파일 기록까지 전체 흐름 검증
//!
//! UDP 시나리오는 실제 소켓(127.0.0.1, 포트 자동 할당)을 통해,
//! 스트림 시나리오는 TLS 자료 없이 세션 루프를 직접 구동하여 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use logwell_core::config::SyslogConfig;
use logwell_core::pipeline::{MessageSink, Pipeline};
use logwell_core::types::Severity;
use logwell_syslog::collector::tls::{SessionConfig, run_session};
use logwell_syslog::dedup::MessageDeduplicator;
use logwell_syslog::pipeline::MessagePipeline;
use logwell_syslog::server::SyslogServerBuilder;
use logwell_syslog::writer::SeverityWriter;

fn udp_only_config(log_dir: &std::path::Path) -> SyslogConfig {
    SyslogConfig {
        bind_host: "127.0.0.1".to_owned(),
        udp_port: 0,
        log_dir: log_dir.display().to_string(),
        enable_udp: true,
        enable_tls: false,
        shutdown_grace_secs: 1,
        ..Default::default()
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

fn read_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    let contents = std::fs::read_to_string(path).unwrap_or_default();
    contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("invalid JSON line"))
        .collect()
}

/// UDP로 받은 RFC 3164 메시지가 notice.log에 한 줄로 기록된다
#[tokio::test]
async fn udp_rfc3164_message_lands_in_notice_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = SyslogServerBuilder::new()
        .config(udp_only_config(dir.path()))
        .build()
        .unwrap();
    server.start().await.unwrap();
    let addr = server.udp_local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(b"<13>Oct 31 12:00:00 server01 Test message", addr)
        .await
        .unwrap();

    settle().await;
    server.stop().await.unwrap();

    let lines = read_lines(&dir.path().join("notice.log"));
    assert_eq!(lines.len(), 1);
    let record = &lines[0];
    assert_eq!(record["priority"], 13);
    assert_eq!(record["facility"], "user");
    assert_eq!(record["severity"], "notice");
    assert_eq!(record["hostname"], "server01");
    assert_eq!(record["message"], "Test message");
    assert_eq!(record["format"], "RFC3164");
    assert_eq!(record["source_ip"], "127.0.0.1");
}

/// UDP로 받은 RFC 5424 메시지(SD 포함)가 info.log에 기록된다
#[tokio::test]
async fn udp_rfc5424_message_lands_in_info_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = SyslogServerBuilder::new()
        .config(udp_only_config(dir.path()))
        .build()
        .unwrap();
    server.start().await.unwrap();
    let addr = server.udp_local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender
        .send_to(
            b"<14>1 2025-10-31T12:00:00.000Z host1 webapp 99 REQ001 [request@1 method=\"GET\"] Request done",
            addr,
        )
        .await
        .unwrap();

    settle().await;
    server.stop().await.unwrap();

    let lines = read_lines(&dir.path().join("info.log"));
    assert_eq!(lines.len(), 1);
    let record = &lines[0];
    assert_eq!(record["format"], "RFC5424");
    assert_eq!(record["hostname"], "host1");
    assert_eq!(record["message"], "Request done");
}

/// 같은 소스가 같은 페이로드를 다섯 번 보내면 정확히 한 줄만 남는다
#[tokio::test]
async fn duplicate_udp_messages_within_window_write_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = SyslogServerBuilder::new()
        .config(udp_only_config(dir.path()))
        .build()
        .unwrap();
    server.start().await.unwrap();
    let addr = server.udp_local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for _ in 0..5 {
        sender
            .send_to(b"<13>Oct 31 12:00:00 server01 Duplicate test", addr)
            .await
            .unwrap();
    }

    settle().await;

    let pipeline = server.pipeline().unwrap();
    assert_eq!(pipeline.processed_count(), 1);
    assert_eq!(pipeline.suppressed_count(), 4);
    server.stop().await.unwrap();

    let lines = read_lines(&dir.path().join("notice.log"));
    assert_eq!(lines.len(), 1);
}

/// user facility의 severity 0..7 메시지가 각자의 파일로 라우팅된다
#[tokio::test]
async fn eight_priorities_route_to_eight_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = SyslogServerBuilder::new()
        .config(udp_only_config(dir.path()))
        .build()
        .unwrap();
    server.start().await.unwrap();
    let addr = server.udp_local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for priority in 8..16 {
        let line = format!("<{priority}>Oct 31 12:00:00 host severity sweep {priority}");
        sender.send_to(line.as_bytes(), addr).await.unwrap();
    }

    settle().await;
    server.stop().await.unwrap();

    for severity in Severity::ALL {
        let lines = read_lines(&dir.path().join(severity.file_name()));
        assert_eq!(lines.len(), 1, "{} should hold one line", severity.file_name());
        assert_eq!(lines[0]["severity"], severity.as_str());
        assert_eq!(lines[0]["facility"], "user");
    }
}

async fn stream_pipeline(dir: &std::path::Path) -> Arc<MessagePipeline> {
    let writer = SeverityWriter::open(dir).await.unwrap();
    let dedup = MessageDeduplicator::new(Duration::from_secs(600), 1000);
    Arc::new(MessagePipeline::new(dedup, writer))
}

/// 세 번에 나눠 도착한 두 프레임이 두 줄로 기록된다
#[tokio::test]
async fn stream_frames_across_fragments_write_two_lines() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = stream_pipeline(dir.path()).await;
    let sink: Arc<dyn MessageSink> = pipeline.clone() as Arc<dyn MessageSink>;

    let (mut client, server_end) = tokio::io::duplex(4096);
    let peer = "203.0.113.9:45000".parse().unwrap();
    let session = tokio::spawn(run_session(
        server_end,
        peer,
        sink,
        SessionConfig::default(),
        CancellationToken::new(),
    ));

    let body = "<34>Oct 11 22:14:15 server app: Hello World";
    client
        .write_all(body.len().to_string().as_bytes())
        .await
        .unwrap();
    client.write_all(format!(" {body}").as_bytes()).await.unwrap();
    client.write_all(b"5 A").await.unwrap();
    client.write_all(b"BCDE").await.unwrap();
    drop(client);

    session.await.unwrap().unwrap();

    // <34> = auth.critical
    let critical = read_lines(&dir.path().join("critical.log"));
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0]["facility"], "auth");
    assert_eq!(critical[0]["hostname"], "server");
    assert_eq!(critical[0]["message"], "app: Hello World");

    // "ABCDE"는 PRI가 없어 user.notice 기본값
    let notice = read_lines(&dir.path().join("notice.log"));
    assert_eq!(notice.len(), 1);
    assert_eq!(notice[0]["priority"], 13);
    assert_eq!(notice[0]["raw"], "ABCDE");
}

/// 잘못된 길이 접두어는 연결 치명적이며 아무것도 기록되지 않는다
#[tokio::test]
async fn stream_malformed_prefix_closes_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = stream_pipeline(dir.path()).await;
    let sink: Arc<dyn MessageSink> = pipeline.clone() as Arc<dyn MessageSink>;

    let (mut client, server_end) = tokio::io::duplex(1024);
    let peer = "203.0.113.9:45001".parse().unwrap();
    let session = tokio::spawn(run_session(
        server_end,
        peer,
        sink,
        SessionConfig::default(),
        CancellationToken::new(),
    ));

    client.write_all(b"abc Hello").await.unwrap();

    let err = session.await.unwrap().unwrap_err();
    assert!(err.to_string().contains("malformed-length-prefix"));

    assert_eq!(pipeline.processed_count(), 0);
    for severity in Severity::ALL {
        assert!(read_lines(&dir.path().join(severity.file_name())).is_empty());
    }
}

/// UDP와 스트림이 같은 파이프라인을 공유해도 기록이 섞이지 않는다
#[tokio::test]
async fn mixed_transports_share_one_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = stream_pipeline(dir.path()).await;
    let sink: Arc<dyn MessageSink> = pipeline.clone() as Arc<dyn MessageSink>;

    // 스트림 세션 하나
    let (mut client, server_end) = tokio::io::duplex(4096);
    let peer = "203.0.113.10:45002".parse().unwrap();
    let session = tokio::spawn(run_session(
        server_end,
        peer,
        Arc::clone(&sink),
        SessionConfig::default(),
        CancellationToken::new(),
    ));

    // UDP 수신기 하나, 같은 싱크
    let cancel = CancellationToken::new();
    let mut collector = logwell_syslog::collector::udp::UdpCollector::bind(
        logwell_syslog::collector::udp::UdpConfig {
            bind_addr: "127.0.0.1:0".to_owned(),
            ..Default::default()
        },
        Arc::clone(&sink),
        cancel.clone(),
    )
    .await
    .unwrap();
    let udp_addr = collector.local_addr().unwrap();
    let udp_task = tokio::spawn(async move { collector.run().await });

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for i in 0..10 {
        let body = format!("<14>udp message {i}");
        sender.send_to(body.as_bytes(), udp_addr).await.unwrap();

        let framed = format!("<14>stream message {i}");
        client
            .write_all(format!("{} {}", framed.len(), framed).as_bytes())
            .await
            .unwrap();
    }
    drop(client);
    session.await.unwrap().unwrap();

    settle().await;
    cancel.cancel();
    udp_task.await.unwrap().unwrap();

    let lines = read_lines(&dir.path().join("info.log"));
    assert_eq!(lines.len(), 20);
    for line in &lines {
        // 모든 줄이 완전한 JSON 객체여야 한다 (줄 섞임 없음)
        assert!(line["message"].as_str().unwrap().contains("message"));
    }
}

/// 기록된 모든 줄은 유효한 JSON이고 파일 이름과 severity가 일치한다
#[tokio::test]
async fn every_line_is_valid_json_and_matches_its_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut server = SyslogServerBuilder::new()
        .config(udp_only_config(dir.path()))
        .build()
        .unwrap();
    server.start().await.unwrap();
    let addr = server.udp_local_addr().unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for priority in [0u8, 13, 14, 34, 85, 165, 191] {
        let line = format!("<{priority}>1 2025-10-31T12:00:00Z host app - - - sweep {priority}");
        sender.send_to(line.as_bytes(), addr).await.unwrap();
    }
    // 비정형 입력도 하나
    sender.send_to(b"no pri at all", addr).await.unwrap();

    settle().await;
    server.stop().await.unwrap();

    let mut total = 0;
    for severity in Severity::ALL {
        for record in read_lines(&dir.path().join(severity.file_name())) {
            assert_eq!(record["severity"], severity.as_str());
            total += 1;
        }
    }
    assert_eq!(total, 8);
}
