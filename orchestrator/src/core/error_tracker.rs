//! Error counting with a rolling rate window
//!
//! Counters only grow. The single way to zero them is `reset`, which the health
//! monitor calls after a successful recovery.

use chrono::{DateTime, Duration, Utc};
use shared::{component_error, ComponentId, ErrorCount, ErrorKind, ErrorSummary};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
struct CounterEntry {
    count: u64,
    last_seen: DateTime<Utc>,
}

#[derive(Debug)]
pub struct ErrorTracker {
    counters: HashMap<(String, ErrorKind), CounterEntry>,
    /// Timestamps inside the rate window, oldest first
    recent: VecDeque<DateTime<Utc>>,
    window: Duration,
    alert_threshold: u64,
}

impl ErrorTracker {
    pub fn new(window: std::time::Duration, alert_threshold: u64) -> Self {
        Self {
            counters: HashMap::new(),
            recent: VecDeque::new(),
            window: Duration::from_std(window).unwrap_or_else(|_| Duration::minutes(15)),
            alert_threshold,
        }
    }

    /// Count one error. Returns the counter's new value.
    pub fn record(&mut self, context: &str, kind: ErrorKind) -> u64 {
        self.record_at(context, kind, Utc::now())
    }

    pub fn record_at(&mut self, context: &str, kind: ErrorKind, at: DateTime<Utc>) -> u64 {
        let entry = self
            .counters
            .entry((context.to_string(), kind))
            .or_insert(CounterEntry { count: 0, last_seen: at });
        entry.count += 1;
        entry.last_seen = entry.last_seen.max(at);
        let count = entry.count;

        self.recent.push_back(at);
        self.prune(at);

        if count > self.alert_threshold {
            component_error!(
                ComponentId::Orchestrator,
                context = context,
                kind = %kind,
                count = count,
                "🚨 High error frequency: {} {} errors in {}",
                count,
                kind,
                context
            );
        }

        count
    }

    pub fn count(&self, context: &str, kind: ErrorKind) -> u64 {
        self.counters
            .get(&(context.to_string(), kind))
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counters.values().map(|entry| entry.count).sum()
    }

    /// Errors per minute over the rolling window ending at `now`
    pub fn error_rate(&mut self, now: DateTime<Utc>) -> f64 {
        self.prune(now);
        let minutes = self.window.num_milliseconds() as f64 / 60_000.0;
        if minutes <= 0.0 {
            return 0.0;
        }
        self.recent.len() as f64 / minutes
    }

    /// Clear every counter and the rate window
    pub fn reset(&mut self) {
        self.counters.clear();
        self.recent.clear();
    }

    pub fn summary(&mut self, now: DateTime<Utc>) -> ErrorSummary {
        let errors_per_minute = self.error_rate(now);

        let mut counters: Vec<ErrorCount> = self
            .counters
            .iter()
            .map(|((context, kind), entry)| ErrorCount {
                context: context.clone(),
                kind: *kind,
                count: entry.count,
                last_seen: entry.last_seen,
            })
            .collect();
        counters.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.context.cmp(&b.context))
                .then_with(|| a.kind.cmp(&b.kind))
        });

        let alerts = counters
            .iter()
            .filter(|counter| counter.count > self.alert_threshold)
            .cloned()
            .collect();

        ErrorSummary {
            total_errors: self.total(),
            errors_per_minute,
            counters,
            alerts,
        }
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.recent.front().is_some_and(|at| *at < cutoff) {
            self.recent.pop_front();
        }
    }
}
