use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Advisory tracker of API units spent against the daily budget.
/// Costs keep accumulating past the limit; overspend is visible in
/// `usage_percent`, never an error.
pub struct QuotaTracker {
    state: Mutex<QuotaState>,
}

struct QuotaState {
    used: u64,
    limit: u64,
    day: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub usage_percent: f64,
}

impl QuotaTracker {
    pub fn new(limit: u64) -> Self {
        QuotaTracker {
            state: Mutex::new(QuotaState {
                used: 0,
                limit,
                day: Utc::now().date_naive(),
            }),
        }
    }

    pub fn consume(&self, cost: u64) {
        self.consume_at(cost, Utc::now().date_naive());
    }

    fn consume_at(&self, cost: u64, today: NaiveDate) {
        if let Ok(mut state) = self.state.lock() {
            if today != state.day {
                state.used = 0;
                state.day = today;
            }
            state.used += cost;
        }
    }

    pub fn status(&self) -> QuotaStatus {
        match self.state.lock() {
            Ok(state) => QuotaStatus {
                used: state.used,
                limit: state.limit,
                remaining: state.limit.saturating_sub(state.used),
                usage_percent: if state.limit > 0 {
                    state.used as f64 / state.limit as f64 * 100.0
                } else {
                    0.0
                },
            },
            Err(_) => QuotaStatus {
                used: 0,
                limit: 0,
                remaining: 0,
                usage_percent: 0.0,
            },
        }
    }
}
