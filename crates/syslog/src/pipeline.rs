//! 레코드 파이프라인 — 중복 제거와 기록을 잇는 싱크
//!
//! [`MessagePipeline`]은 두 수신기가 공유하는 [`MessageSink`] 구현체입니다.
//! 파이프라인은 직선입니다: `submit` → 중복 제거 → 심각도 기록.
//! 레코드 단위 에러는 여기서 흡수되며 상류로 역압을 가하지 않습니다.

use std::sync::atomic::{AtomicU64, Ordering};

use logwell_core::pipeline::{BoxFuture, MessageSink};
use logwell_core::types::ParsedMessage;

use crate::dedup::MessageDeduplicator;
use crate::writer::SeverityWriter;

/// 중복 제거 + 기록 싱크
pub struct MessagePipeline {
    dedup: MessageDeduplicator,
    writer: SeverityWriter,
    processed: AtomicU64,
    write_errors: AtomicU64,
}

impl MessagePipeline {
    /// 새 파이프라인을 생성합니다.
    pub fn new(dedup: MessageDeduplicator, writer: SeverityWriter) -> Self {
        Self {
            dedup,
            writer,
            processed: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// 레코드를 처리합니다: 중복이면 버리고, 아니면 기록합니다.
    pub async fn process(&self, record: ParsedMessage) {
        if !self.dedup.accept(&record) {
            tracing::debug!(
                source_ip = %record.source_ip,
                priority = record.priority,
                "duplicate message suppressed"
            );
            return;
        }

        match self.writer.write(&record).await {
            Ok(()) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // 기록 실패는 레코드 단위: 버리고 계속 진행
                self.write_errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!(error = %e, "failed to write record, dropping");
            }
        }
    }

    /// 기록까지 완료된 레코드 수를 반환합니다.
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// 중복으로 억제된 레코드 수를 반환합니다.
    pub fn suppressed_count(&self) -> u64 {
        self.dedup.suppressed_count()
    }

    /// 기록 실패로 버려진 레코드 수를 반환합니다.
    pub fn write_error_count(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// 내부 기록기를 반환합니다.
    pub fn writer(&self) -> &SeverityWriter {
        &self.writer
    }
}

impl MessageSink for MessagePipeline {
    fn submit(&self, record: ParsedMessage) -> BoxFuture<'_, ()> {
        Box::pin(self.process(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use logwell_core::types::{Facility, Severity, SyslogFormat};

    fn record(priority: u8, message: &str) -> ParsedMessage {
        ParsedMessage {
            priority,
            facility: Facility::from_priority(priority),
            severity: Severity::from_priority(priority),
            timestamp: String::new(),
            hostname: "host".to_owned(),
            message: message.to_owned(),
            source_ip: "10.0.0.1".parse().unwrap(),
            received_at: String::new(),
            format: SyslogFormat::Rfc3164,
            raw: message.to_owned(),
        }
    }

    async fn pipeline_in(dir: &std::path::Path) -> MessagePipeline {
        let writer = SeverityWriter::open(dir).await.unwrap();
        let dedup = MessageDeduplicator::new(Duration::from_secs(600), 1000);
        MessagePipeline::new(dedup, writer)
    }

    #[tokio::test]
    async fn accepted_record_is_written_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path()).await;

        pipeline.process(record(13, "hello")).await;

        assert_eq!(pipeline.processed_count(), 1);
        assert_eq!(pipeline.suppressed_count(), 0);
        let contents = std::fs::read_to_string(dir.path().join("notice.log")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn duplicates_are_dropped_before_the_writer() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline_in(dir.path()).await;

        for _ in 0..5 {
            pipeline.process(record(13, "Duplicate test")).await;
        }

        assert_eq!(pipeline.processed_count(), 1);
        assert_eq!(pipeline.suppressed_count(), 4);
        let contents = std::fs::read_to_string(dir.path().join("notice.log")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn usable_as_dyn_sink() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline: Arc<dyn MessageSink> = Arc::new(pipeline_in(dir.path()).await);
        pipeline.submit(record(14, "through the trait")).await;

        let contents = std::fs::read_to_string(dir.path().join("info.log")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
