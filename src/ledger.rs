use crate::models::{Amount, ChangeEvent, DayRecord, HistoryRow, Ledger};
use chrono::{DateTime, Utc};

impl Ledger {
    pub fn increment(&mut self) -> u64 {
        self.increment_at(Utc::now())
    }

    pub fn increment_at(&mut self, now: DateTime<Utc>) -> u64 {
        let total = self.total_count.saturating_add(1);
        self.record_change(now, Amount::Delta(1), total);
        self.total_count = total;
        total
    }

    pub fn decrement(&mut self) -> Option<u64> {
        self.decrement_at(Utc::now())
    }

    /// Returns `None` without touching history when the count is already zero.
    pub fn decrement_at(&mut self, now: DateTime<Utc>) -> Option<u64> {
        if !self.can_decrement() {
            return None;
        }
        let total = self.total_count.saturating_sub(1);
        self.record_change(now, Amount::Delta(-1), total);
        self.total_count = total;
        Some(total)
    }

    pub fn reset(&mut self) {
        self.reset_at(Utc::now());
    }

    /// Zeroes the total and logs a reset for today. Earlier days are kept.
    pub fn reset_at(&mut self, now: DateTime<Utc>) {
        self.record_change(now, Amount::Reset, 0);
        self.total_count = 0;
    }

    pub fn can_decrement(&self) -> bool {
        self.total_count > 0
    }

    pub fn can_reset(&self) -> bool {
        self.total_count > 0
    }

    pub fn today_total(&self) -> u64 {
        self.total_on(&date_key(Utc::now()))
    }

    /// Folded total for `date`, clamped at zero.
    pub fn total_on(&self, date: &str) -> u64 {
        self.history
            .get(date)
            .map(|record| u64::try_from(record.fold()).unwrap_or(0))
            .unwrap_or(0)
    }

    /// One row per logged day, newest first. `running_total` sums the day's
    /// count with every later day in the ledger.
    pub fn history_with_totals(&self) -> Vec<HistoryRow> {
        let mut running = 0i64;
        self.history
            .iter()
            .rev()
            .map(|(date, record)| {
                let daily_count = record.fold();
                running = running.saturating_add(daily_count);
                HistoryRow {
                    date: date.clone(),
                    daily_count,
                    running_total: running,
                }
            })
            .collect()
    }

    fn record_change(&mut self, now: DateTime<Utc>, amount: Amount, total_after: u64) {
        let seed = self.total_count;
        let record = self
            .history
            .entry(date_key(now))
            .or_insert_with(|| DayRecord {
                count: clamp_i64(seed),
                changes: Vec::new(),
            });
        record.count = clamp_i64(total_after);
        record.changes.push(ChangeEvent {
            amount,
            timestamp: now,
        });
    }
}

impl DayRecord {
    /// Sum of deltas in order; a reset restarts the sum from zero.
    pub fn fold(&self) -> i64 {
        self.changes
            .iter()
            .fold(0i64, |total, change| match change.amount {
                Amount::Reset => 0,
                Amount::Delta(value) => total.saturating_add(value),
            })
    }
}

pub fn date_key(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
