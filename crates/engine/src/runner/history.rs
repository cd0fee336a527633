//! Bounded execution history.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;
use tabletalk_domain::ExecutionContext;

use super::outcome::ResultEnvelope;
use crate::parser::CommandArgs;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Canonical command name
    pub command: String,
    pub args: CommandArgs,
    pub context: ExecutionContext,
    pub result: ResultEnvelope,
    pub timestamp_ms: i64,
    pub execution_time_ms: u64,
}

impl ExecutionRecord {
    pub fn succeeded(&self) -> bool {
        self.result.success
    }
}

/// Summary over the records currently held.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 0.0 when empty
    pub success_rate: f64,
    pub by_command: BTreeMap<String, usize>,
}

/// FIFO ring buffer; the oldest record is evicted once capacity is reached.
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    records: VecDeque<ExecutionRecord>,
    capacity: usize,
}

impl ExecutionHistory {
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: ExecutionRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ExecutionRecord> {
        self.records.iter()
    }

    /// The `n` newest records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&ExecutionRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).collect()
    }

    pub fn last(&self) -> Option<&ExecutionRecord> {
        self.records.back()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats {
            total: self.records.len(),
            ..HistoryStats::default()
        };
        for record in &self.records {
            if record.succeeded() {
                stats.succeeded += 1;
            }
            *stats.by_command.entry(record.command.clone()).or_default() += 1;
        }
        stats.failed = stats.total - stats.succeeded;
        if stats.total > 0 {
            stats.success_rate = stats.succeeded as f64 / stats.total as f64;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::outcome::OutcomeTag;
    use chrono::Utc;
    use tabletalk_domain::{SessionId, UserId};

    fn record(command: &str, n: i64, tag: OutcomeTag) -> ExecutionRecord {
        ExecutionRecord {
            command: command.to_string(),
            args: CommandArgs::default(),
            context: ExecutionContext::new(UserId::new(), SessionId::new(), Utc::now()),
            result: ResultEnvelope::new(tag, "", format!("/{}", command)),
            timestamp_ms: n,
            execution_time_ms: 0,
        }
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = ExecutionHistory::new(3);
        for n in 0..4 {
            history.push(record("roll", n, OutcomeTag::Success));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().next().unwrap().timestamp_ms, 1);
        assert_eq!(history.last().unwrap().timestamp_ms, 3);
    }

    #[test]
    fn recent_returns_newest_in_order() {
        let mut history = ExecutionHistory::new(10);
        for n in 0..5 {
            history.push(record("roll", n, OutcomeTag::Success));
        }
        let recent: Vec<i64> = history.recent(2).iter().map(|r| r.timestamp_ms).collect();
        assert_eq!(recent, vec![3, 4]);
        assert_eq!(history.recent(50).len(), 5);
    }

    #[test]
    fn zero_capacity_holds_one() {
        let mut history = ExecutionHistory::new(0);
        history.push(record("roll", 1, OutcomeTag::Success));
        history.push(record("roll", 2, OutcomeTag::Success));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn stats_count_per_command() {
        let mut history = ExecutionHistory::new(10);
        history.push(record("roll", 1, OutcomeTag::Success));
        history.push(record("roll", 2, OutcomeTag::CommandFailed));
        history.push(record("talk", 3, OutcomeTag::Success));
        history.push(record("attack", 4, OutcomeTag::ExecutionError));

        let stats = history.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 2);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.success_rate, 0.5);
        assert_eq!(stats.by_command["roll"], 2);

        history.clear();
        assert_eq!(history.stats(), HistoryStats::default());
    }
}
