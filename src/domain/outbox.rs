use super::subject::SideEffect;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A side effect recorded in the same write as the capture that owes it.
///
/// Stays queued until the subject registry has applied it, so a crash or a
/// registry fault between capture and dispatch is visible and replayable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OutboxEntry {
    pub order_id: String,
    pub effect: SideEffect,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl OutboxEntry {
    pub fn new(order_id: String, effect: SideEffect, now: DateTime<Utc>) -> Self {
        Self {
            order_id,
            effect,
            enqueued_at: now,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn record_failure(&mut self, error: String) {
        self.attempts += 1;
        self.last_error = Some(error);
    }
}
