//! The security event ledger.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::keys;
use crate::config::SecuritySettings;
use crate::lock::mutex_lock;
use crate::store::TieredStore;

use super::patterns::is_suspicious_input;
use super::rate_limit::{RateDecision, RateLimiter};

const SOURCE: &str = "security::ledger";

const METRIC_SECURITY_EVENT_TOTAL: &str = "brezza_security_event_total";
const METRIC_SECURITY_PERSIST_FAILURE_TOTAL: &str = "brezza_security_persist_failure_total";

/// Classification of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Attack,
    Suspicious,
    Error,
    Info,
}

impl EventKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Suspicious => "suspicious",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A recorded security event. Appended only, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub source: String,
    pub details: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub severity: Severity,
}

/// Query filter for [`SecurityLedger::events`]. All given fields are ANDed.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub kind: Option<EventKind>,
    pub severity: Option<Severity>,
    /// Keep only the most recent `limit` matches (still chronological).
    pub limit: Option<usize>,
}

/// Overall posture derived from the last hour of events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityStatus {
    Secure,
    Warning,
    Critical,
}

/// Per-kind totals over the retained event sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub attack: usize,
    pub suspicious: usize,
    pub error: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SecurityReport {
    pub status: SecurityStatus,
    pub counts: EventCounts,
    pub tracked_clients: usize,
}

/// Append-only, size-bounded security event log.
///
/// Holds the most recent events in memory (oldest evicted beyond the cap)
/// and persists a smaller tail under `security:events` — the durable tier is
/// intentionally smaller to bound the persisted payload. No public operation
/// propagates an error; the internal failure path is a plain counter, never
/// a recursive `log_event` call.
pub struct SecurityLedger {
    store: Arc<TieredStore>,
    events: Mutex<VecDeque<SecurityEvent>>,
    limiter: RateLimiter,
    memory_limit: usize,
    persisted_limit: usize,
    persist_failures: AtomicU64,
}

impl SecurityLedger {
    /// Open a ledger over `store`, reloading any persisted event tail.
    pub async fn open(store: Arc<TieredStore>, settings: &SecuritySettings) -> Self {
        let restored: Vec<SecurityEvent> = store
            .get(keys::SECURITY_EVENTS)
            .await
            .unwrap_or_default();
        if !restored.is_empty() {
            debug!(
                target_module = SOURCE,
                count = restored.len(),
                "Restored persisted security events"
            );
        }

        Self {
            store,
            events: Mutex::new(VecDeque::from(restored)),
            limiter: RateLimiter::new(
                settings.rate_limit.window,
                settings.rate_limit.max_requests,
            ),
            memory_limit: settings.memory_event_limit,
            persisted_limit: settings.persisted_event_limit,
            persist_failures: AtomicU64::new(0),
        }
    }

    /// Record an event.
    ///
    /// Never raises: a persistence failure only bumps the diagnostic
    /// counter. High and Critical events additionally emit a warning for
    /// operator visibility.
    pub async fn log_event(
        &self,
        kind: EventKind,
        source: impl Into<String>,
        details: Value,
        severity: Severity,
    ) {
        let event = SecurityEvent {
            id: Uuid::new_v4(),
            kind,
            source: source.into(),
            details,
            timestamp: OffsetDateTime::now_utc(),
            severity,
        };

        if severity >= Severity::High {
            warn!(
                target_module = SOURCE,
                event_id = %event.id,
                kind = kind.as_str(),
                source = %event.source,
                severity = ?severity,
                "High-severity security event"
            );
        }
        counter!(METRIC_SECURITY_EVENT_TOTAL, "kind" => kind.as_str()).increment(1);

        let tail: Vec<SecurityEvent> = {
            let mut events = mutex_lock(&self.events, SOURCE, "log_event");
            events.push_back(event);
            while events.len() > self.memory_limit {
                events.pop_front();
            }
            let skip = events.len().saturating_sub(self.persisted_limit);
            events.iter().skip(skip).cloned().collect()
        };

        if !self.store.set(keys::SECURITY_EVENTS, &tail).await {
            // Must not re-enter log_event: the failure path is a counter.
            self.persist_failures.fetch_add(1, Ordering::Relaxed);
            counter!(METRIC_SECURITY_PERSIST_FAILURE_TOTAL).increment(1);
            debug!(target_module = SOURCE, "Event persistence failed");
        }
    }

    /// Entries matching all given filter fields, in chronological order.
    pub fn events(&self, filter: &EventFilter) -> Vec<SecurityEvent> {
        let events = mutex_lock(&self.events, SOURCE, "events");
        let mut matching: Vec<SecurityEvent> = events
            .iter()
            .filter(|event| filter.kind.is_none_or(|kind| event.kind == kind))
            .filter(|event| {
                filter
                    .severity
                    .is_none_or(|severity| event.severity == severity)
            })
            .cloned()
            .collect();

        if let Some(limit) = filter.limit {
            let skip = matching.len().saturating_sub(limit);
            matching.drain(..skip);
        }
        matching
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        mutex_lock(&self.events, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check a request against the configured per-client ceiling.
    pub fn check_rate_limit(&self, client_id: &str) -> RateDecision {
        self.limiter.check(client_id)
    }

    /// Check against an explicit ceiling and window.
    pub fn check_rate_limit_with(
        &self,
        client_id: &str,
        limit: u32,
        window: Duration,
    ) -> RateDecision {
        self.limiter.check_with(client_id, limit, window)
    }

    /// Gate externally supplied content.
    ///
    /// Returns `false` and records exactly one Attack/High event when the
    /// input matches an injection signature.
    pub async fn screen_input(&self, input: &str, source: &str) -> bool {
        if is_suspicious_input(input) {
            self.log_event(
                EventKind::Attack,
                source,
                json!({ "input": input, "reason": "injection signature" }),
                Severity::High,
            )
            .await;
            return false;
        }
        true
    }

    /// Posture rollup over the last hour plus whole-ledger counts.
    pub fn security_status(&self) -> SecurityReport {
        let hour_ago = OffsetDateTime::now_utc() - Duration::from_secs(3600);

        let events = mutex_lock(&self.events, SOURCE, "security_status");
        let mut counts = EventCounts::default();
        let mut recent_critical = 0usize;
        let mut recent_high = 0usize;

        for event in events.iter() {
            match event.kind {
                EventKind::Attack => counts.attack += 1,
                EventKind::Suspicious => counts.suspicious += 1,
                EventKind::Error => counts.error += 1,
                EventKind::Info => counts.info += 1,
            }
            if event.timestamp > hour_ago {
                match event.severity {
                    Severity::Critical => recent_critical += 1,
                    Severity::High => recent_high += 1,
                    _ => {}
                }
            }
        }

        let status = if recent_critical > 0 {
            SecurityStatus::Critical
        } else if recent_high > 3 {
            SecurityStatus::Warning
        } else {
            SecurityStatus::Secure
        };

        SecurityReport {
            status,
            counts,
            tracked_clients: self.limiter.tracked_clients(),
        }
    }

    /// Times event persistence failed since this ledger was opened.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::config::{RateLimitSettings, SecuritySettings};
    use crate::error::MediumError;
    use crate::store::{MemoryMedium, StorageMedium};

    use super::*;

    struct BrokenMedium;

    #[async_trait]
    impl StorageMedium for BrokenMedium {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn read(&self, _key: &str) -> Result<Option<String>, MediumError> {
            Err(MediumError::unavailable("broken", "storage disabled"))
        }

        async fn write(&self, _key: &str, _payload: &str) -> Result<(), MediumError> {
            Err(MediumError::unavailable("broken", "quota exceeded"))
        }

        async fn remove(&self, _key: &str) -> Result<(), MediumError> {
            Err(MediumError::unavailable("broken", "storage disabled"))
        }

        async fn keys(&self, _prefix: &str) -> Result<Vec<String>, MediumError> {
            Err(MediumError::unavailable("broken", "storage disabled"))
        }
    }

    fn settings(memory_limit: usize, persisted_limit: usize) -> SecuritySettings {
        SecuritySettings {
            memory_event_limit: memory_limit,
            persisted_event_limit: persisted_limit,
            rate_limit: RateLimitSettings {
                window: Duration::from_secs(60),
                max_requests: 100,
            },
        }
    }

    fn memory_store() -> Arc<TieredStore> {
        Arc::new(TieredStore::new(vec![Arc::new(MemoryMedium::new())]))
    }

    async fn ledger() -> SecurityLedger {
        SecurityLedger::open(memory_store(), &settings(1000, 100)).await
    }

    #[tokio::test]
    async fn memory_sequence_is_capped_and_oldest_evicts_first() {
        let ledger = SecurityLedger::open(memory_store(), &settings(5, 3)).await;

        for n in 0..7 {
            ledger
                .log_event(
                    EventKind::Info,
                    format!("source-{n}"),
                    json!({}),
                    Severity::Low,
                )
                .await;
        }

        assert_eq!(ledger.len(), 5);
        let sources: Vec<String> = ledger
            .events(&EventFilter::default())
            .into_iter()
            .map(|event| event.source)
            .collect();
        assert_eq!(
            sources,
            vec!["source-2", "source-3", "source-4", "source-5", "source-6"]
        );
    }

    #[tokio::test]
    async fn capacity_never_exceeds_one_thousand() {
        let ledger = ledger().await;

        for n in 0..1001u32 {
            ledger
                .log_event(EventKind::Info, format!("n-{n}"), json!({}), Severity::Low)
                .await;
        }

        assert_eq!(ledger.len(), 1000);
        let events = ledger.events(&EventFilter::default());
        assert!(events.iter().all(|event| event.source != "n-0"));
        assert_eq!(events[0].source, "n-1");
    }

    #[tokio::test]
    async fn filters_are_anded_and_limit_keeps_recent() {
        let ledger = ledger().await;

        ledger
            .log_event(EventKind::Info, "a", json!({}), Severity::Low)
            .await;
        ledger
            .log_event(EventKind::Attack, "b", json!({}), Severity::High)
            .await;
        ledger
            .log_event(EventKind::Attack, "c", json!({}), Severity::Critical)
            .await;
        ledger
            .log_event(EventKind::Error, "d", json!({}), Severity::High)
            .await;

        let attacks = ledger.events(&EventFilter {
            kind: Some(EventKind::Attack),
            ..Default::default()
        });
        assert_eq!(attacks.len(), 2);

        let high_attacks = ledger.events(&EventFilter {
            kind: Some(EventKind::Attack),
            severity: Some(Severity::High),
            ..Default::default()
        });
        assert_eq!(high_attacks.len(), 1);
        assert_eq!(high_attacks[0].source, "b");

        let recent = ledger.events(&EventFilter {
            limit: Some(2),
            ..Default::default()
        });
        assert_eq!(recent.len(), 2);
        // Chronological order preserved after the limit cut.
        assert_eq!(recent[0].source, "c");
        assert_eq!(recent[1].source, "d");
    }

    #[tokio::test]
    async fn screen_input_rejects_and_records_exactly_one_attack() {
        let ledger = ledger().await;

        assert!(!ledger.screen_input("<script>alert(1)</script>", "comment-form").await);

        let events = ledger.events(&EventFilter::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Attack);
        assert_eq!(events[0].severity, Severity::High);
        assert_eq!(events[0].source, "comment-form");
        assert_eq!(
            events[0].details["input"],
            json!("<script>alert(1)</script>")
        );
    }

    #[tokio::test]
    async fn screen_input_accepts_ordinary_content_silently() {
        let ledger = ledger().await;

        assert!(ledger.screen_input("perfectly fine prose", "comment-form").await);
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn status_rolls_up_recent_severity() {
        let ledger = ledger().await;
        assert_eq!(ledger.security_status().status, SecurityStatus::Secure);

        for _ in 0..4 {
            ledger
                .log_event(EventKind::Suspicious, "probe", json!({}), Severity::High)
                .await;
        }
        assert_eq!(ledger.security_status().status, SecurityStatus::Warning);

        ledger
            .log_event(EventKind::Attack, "breach", json!({}), Severity::Critical)
            .await;
        let report = ledger.security_status();
        assert_eq!(report.status, SecurityStatus::Critical);
        assert_eq!(report.counts.suspicious, 4);
        assert_eq!(report.counts.attack, 1);
    }

    #[tokio::test]
    async fn persistence_failure_bumps_counter_without_recursion() {
        let store = Arc::new(TieredStore::new(vec![Arc::new(BrokenMedium)]));
        let ledger = SecurityLedger::open(store, &settings(1000, 100)).await;

        ledger
            .log_event(EventKind::Info, "a", json!({}), Severity::Low)
            .await;

        assert_eq!(ledger.persist_failures(), 1);
        // The failure did not spawn additional Error events.
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn persisted_tail_reloads_on_open() {
        let store = memory_store();

        let first = SecurityLedger::open(store.clone(), &settings(1000, 100)).await;
        first
            .log_event(EventKind::Info, "boot", json!({}), Severity::Low)
            .await;
        first
            .log_event(EventKind::Suspicious, "probe", json!({}), Severity::Medium)
            .await;

        let second = SecurityLedger::open(store, &settings(1000, 100)).await;
        assert_eq!(second.len(), 2);
        let events = second.events(&EventFilter::default());
        assert_eq!(events[0].source, "boot");
        assert_eq!(events[1].source, "probe");
    }

    #[tokio::test]
    async fn rate_limit_delegates_to_the_limiter() {
        let ledger = ledger().await;

        for _ in 0..3 {
            assert!(
                ledger
                    .check_rate_limit_with("client-a", 3, Duration::from_secs(1))
                    .allowed
            );
        }
        assert!(
            !ledger
                .check_rate_limit_with("client-a", 3, Duration::from_secs(1))
                .allowed
        );
    }
}
