//! Types for the external delay-prediction service and the session-scoped
//! cache of its answers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One train to predict: the fields the prediction service was trained on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictionQuery {
    pub train_id: String,
    /// Scheduled departure from the current station, 24h "HH:MM".
    pub scheduled_departure_time: String,
    pub trip_date: NaiveDate,
}

/// Predicted lateness for one train, in minutes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub arrival_delay: f64,
    pub departure_delay: f64,
}

/// Per-session store of prediction results, keyed by train.
///
/// Lookups can overlap: a user may ask again for the same train before the
/// previous call returns. Every lookup takes a token, and only the
/// completion holding the newest token for its train may write, so a slow
/// stale response never clobbers a fresher one.
///
/// The session is owned by whoever drives the requests and is dropped (or
/// [`reset`](PredictionSession::reset)) when that view goes away.
#[derive(Debug, Default)]
pub struct PredictionSession {
    next_token: u64,
    latest: HashMap<String, u64>,
    results: HashMap<String, PredictionResult>,
}

impl PredictionSession {
    pub fn new() -> PredictionSession {
        PredictionSession::default()
    }

    /// Register a lookup for `train_id` and get the token its completion
    /// must present. Tokens increase monotonically across the session.
    pub fn begin(&mut self, train_id: &str) -> u64 {
        self.next_token += 1;
        self.latest.insert(train_id.to_string(), self.next_token);
        self.next_token
    }

    /// Store `result` if `token` is still the newest lookup for
    /// `train_id`. Returns whether the result was kept.
    pub fn complete(&mut self, train_id: &str, token: u64, result: PredictionResult) -> bool {
        if self.latest.get(train_id) != Some(&token) {
            return false;
        }
        self.results.insert(train_id.to_string(), result);
        true
    }

    pub fn get(&self, train_id: &str) -> Option<PredictionResult> {
        self.results.get(train_id).copied()
    }

    /// Drop everything, including in-flight tokens, so late completions
    /// from before the reset are discarded.
    pub fn reset(&mut self) {
        self.latest.clear();
        self.results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(arrival_delay: f64) -> PredictionResult {
        PredictionResult {
            arrival_delay,
            departure_delay: arrival_delay / 2.0,
        }
    }

    #[test]
    fn completions_in_order_cache_the_latest() {
        let mut session = PredictionSession::new();

        let first = session.begin("T100");
        assert!(session.complete("T100", first, result(4.0)));

        let second = session.begin("T100");
        assert!(session.complete("T100", second, result(9.0)));

        assert_eq!(session.get("T100"), Some(result(9.0)));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut session = PredictionSession::new();

        let slow = session.begin("T100");
        let fast = session.begin("T100");

        assert!(session.complete("T100", fast, result(9.0)));
        // The earlier request finishes last; its answer must not win.
        assert!(!session.complete("T100", slow, result(4.0)));

        assert_eq!(session.get("T100"), Some(result(9.0)));
    }

    #[test]
    fn trains_do_not_interfere() {
        let mut session = PredictionSession::new();

        let a = session.begin("T100");
        let b = session.begin("T200");

        assert!(session.complete("T200", b, result(2.0)));
        assert!(session.complete("T100", a, result(7.0)));

        assert_eq!(session.get("T100"), Some(result(7.0)));
        assert_eq!(session.get("T200"), Some(result(2.0)));
    }

    #[test]
    fn reset_invalidates_in_flight_tokens() {
        let mut session = PredictionSession::new();

        let token = session.begin("T100");
        session.reset();

        assert!(!session.complete("T100", token, result(4.0)));
        assert_eq!(session.get("T100"), None);
    }
}
