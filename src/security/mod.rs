//! Security event ledger, rate limiting, and input screening.
//!
//! The [`SecurityLedger`] records security-relevant events into a bounded
//! in-memory sequence, persists a truncated tail through the tiered store,
//! and answers filtered queries and a status rollup. Anomalies are recorded,
//! not raised: monitoring, not control flow, is how they surface.

mod ledger;
mod patterns;
mod rate_limit;

pub use ledger::{
    EventCounts, EventFilter, EventKind, SecurityEvent, SecurityLedger, SecurityReport,
    SecurityStatus, Severity,
};
pub use patterns::is_suspicious_input;
pub use rate_limit::{RateDecision, RateLimiter};
