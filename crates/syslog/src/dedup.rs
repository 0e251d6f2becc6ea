//! 메시지 중복 억제 — 시간 윈도우 기반 지문 캐시
//!
//! `(source_ip, priority, message)` 세 필드의 안정적 다이제스트를 키로,
//! 같은 메시지가 윈도우 안에서 두 번 이상 기록되지 않도록 합니다.
//! 타임스탬프와 호스트명은 의도적으로 제외되어, 타임스탬프만 바뀌며
//! 반복되는 알림도 하나로 접힙니다.
//!
//! 첫 관측이 기준입니다: 윈도우 안의 중복은 타임스탬프를 갱신하지
//! 않으므로, 중복이 계속 흘러와도 억제 기간이 원래 윈도우 너머로
//! 늘어나지 않습니다.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use logwell_core::types::ParsedMessage;

/// 중복 억제 윈도우 기본값 (600초)
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(600);

/// 지문 맵 최대 엔트리 수 기본값
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

type Fingerprint = [u8; 32];

/// 메시지 중복 억제기
///
/// 단일 mutex로 보호되며, 임계 구역은 해시 + 맵 조회 + 만료 정리뿐입니다.
/// I/O나 suspend 지점이 없습니다.
pub struct MessageDeduplicator {
    window: Duration,
    max_entries: usize,
    seen: Mutex<HashMap<Fingerprint, Instant>>,
    suppressed: AtomicU64,
}

impl MessageDeduplicator {
    /// 윈도우와 엔트리 상한을 지정하여 생성합니다.
    pub fn new(window: Duration, max_entries: usize) -> Self {
        Self {
            window,
            max_entries,
            seen: Mutex::new(HashMap::new()),
            suppressed: AtomicU64::new(0),
        }
    }

    /// 레코드를 기록해야 하면 `true`, 윈도우 안의 중복이면 `false`.
    pub fn accept(&self, record: &ParsedMessage) -> bool {
        let fp = fingerprint(record.source_ip, record.priority, &record.message);
        let now = Instant::now();

        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // 기회적 만료 정리 (매 accept마다)
        seen.retain(|_, first_seen| now.duration_since(*first_seen) <= self.window);

        if seen.contains_key(&fp) {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        // 만료 정리 후에도 상한을 넘으면 가장 오래된 것부터 제거
        if seen.len() >= self.max_entries {
            let evict_count = seen.len() + 1 - self.max_entries;
            let mut by_age: Vec<(Fingerprint, Instant)> =
                seen.iter().map(|(k, v)| (*k, *v)).collect();
            by_age.sort_by_key(|&(_, t)| t);
            for (old_fp, _) in by_age.into_iter().take(evict_count) {
                seen.remove(&old_fp);
            }
        }

        seen.insert(fp, now);
        true
    }

    /// 억제된 레코드 수를 반환합니다.
    pub fn suppressed_count(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }

    /// 현재 추적 중인 지문 수를 반환합니다.
    pub fn tracked(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// 설정된 윈도우를 반환합니다.
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for MessageDeduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_ENTRIES)
    }
}

/// `source_ip || '\0' || priority || '\0' || message`의 SHA-256 다이제스트
fn fingerprint(source_ip: IpAddr, priority: u8, message: &str) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(source_ip.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(priority.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}
