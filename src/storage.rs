use crate::errors::StorageError;
use crate::models::{DayRecord, Ledger};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{error, warn};

pub const TOTAL_COUNT_KEY: &str = "totalCount";
pub const HISTORY_KEY: &str = "applicationHistory";

/// String-keyed, string-valued store. Written to disk as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageArea {
    entries: BTreeMap<String, String>,
}

impl StorageArea {
    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove_item(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }
}

pub fn decode_ledger(area: &StorageArea) -> Ledger {
    let total_count = area.get_item(TOTAL_COUNT_KEY).map(parse_count).unwrap_or(0);

    let history = match area.get_item(HISTORY_KEY) {
        Some(raw) => match serde_json::from_str::<BTreeMap<String, DayRecord>>(raw) {
            Ok(history) => history,
            Err(err) => {
                warn!("discarding unreadable {HISTORY_KEY}: {err}");
                BTreeMap::new()
            }
        },
        None => BTreeMap::new(),
    };

    Ledger {
        total_count,
        history,
    }
}

pub fn encode_ledger(ledger: &Ledger, area: &mut StorageArea) -> Result<(), StorageError> {
    let history = serde_json::to_string(&ledger.history)?;
    area.set_item(TOTAL_COUNT_KEY, ledger.total_count.to_string());
    area.set_item(HISTORY_KEY, history);
    Ok(())
}

/// Integer-prefix parse: `" 12abc"` is 12, junk is 0, negatives clamp to 0.
fn parse_count(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if negative || end == 0 {
        return 0;
    }
    digits[..end].parse::<u64>().unwrap_or(u64::MAX)
}

pub async fn read_area(path: &Path) -> StorageArea {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(area) => area,
            Err(err) => {
                error!("failed to parse storage file: {err}");
                StorageArea::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => StorageArea::default(),
        Err(err) => {
            error!("failed to read storage file: {err}");
            StorageArea::default()
        }
    }
}

pub async fn write_area(path: &Path, area: &StorageArea) -> Result<(), StorageError> {
    let payload = serde_json::to_vec_pretty(area)?;
    fs::write(path, payload).await?;
    Ok(())
}

pub async fn load_ledger(path: &Path) -> Ledger {
    decode_ledger(&read_area(path).await)
}

pub async fn persist_ledger(path: &Path, ledger: &Ledger) -> Result<(), StorageError> {
    let mut area = read_area(path).await;
    encode_ledger(ledger, &mut area)?;
    write_area(path, &area).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::path::PathBuf;

    fn unique_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("jobs_applied_{name}_{}_{}.json", std::process::id(), nanos));
        path
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::default();
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 15, 0).unwrap();
        ledger.increment_at(start);
        ledger.increment_at(start + Duration::hours(2));
        ledger.reset_at(start + Duration::days(1));
        ledger.increment_at(start + Duration::days(1));
        ledger
    }

    #[test]
    fn encode_then_decode_reproduces_ledger() {
        let ledger = sample_ledger();
        let mut area = StorageArea::default();
        encode_ledger(&ledger, &mut area).unwrap();

        assert_eq!(area.get_item(TOTAL_COUNT_KEY), Some("1"));
        assert_eq!(decode_ledger(&area), ledger);
    }

    #[test]
    fn history_uses_wire_field_names() {
        let ledger = sample_ledger();
        let mut area = StorageArea::default();
        encode_ledger(&ledger, &mut area).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(area.get_item(HISTORY_KEY).unwrap()).unwrap();
        let day = &value["2026-03-02"];
        assert_eq!(day["count"], 1);
        assert_eq!(day["changes"][0]["amount"], "reset");
        assert_eq!(day["changes"][1]["amount"], 1);
        assert!(day["changes"][1]["timestamp"].is_string());
    }

    #[test]
    fn decodes_browser_written_history() {
        let mut area = StorageArea::default();
        area.set_item(TOTAL_COUNT_KEY, "2");
        area.set_item(
            HISTORY_KEY,
            r#"{"2025-11-03":{"count":2,"changes":[
                {"amount":1,"timestamp":"2025-11-03T14:02:11.512Z"},
                {"amount":1,"timestamp":"2025-11-03T15:40:00.000Z"}]}}"#,
        );

        let ledger = decode_ledger(&area);
        assert_eq!(ledger.total_count, 2);
        assert_eq!(ledger.total_on("2025-11-03"), 2);
    }

    #[test]
    fn empty_area_is_empty_ledger() {
        assert_eq!(decode_ledger(&StorageArea::default()), Ledger::default());
    }

    #[test]
    fn keys_decode_independently() {
        let mut area = StorageArea::default();
        area.set_item(TOTAL_COUNT_KEY, "5");
        area.set_item(HISTORY_KEY, "{not json");
        let ledger = decode_ledger(&area);
        assert_eq!(ledger.total_count, 5);
        assert!(ledger.history.is_empty());

        area.set_item(TOTAL_COUNT_KEY, "many");
        area.set_item(HISTORY_KEY, "{}");
        assert_eq!(decode_ledger(&area).total_count, 0);
    }

    #[test]
    fn count_parse_follows_integer_prefix() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count("  7 apps"), 7);
        assert_eq!(parse_count("+3"), 3);
        assert_eq!(parse_count("-4"), 0);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("x1"), 0);
    }

    #[test]
    fn remove_item_drops_key() {
        let mut area = StorageArea::default();
        area.set_item(TOTAL_COUNT_KEY, "1");
        assert_eq!(area.remove_item(TOTAL_COUNT_KEY), Some("1".to_string()));
        assert_eq!(area.get_item(TOTAL_COUNT_KEY), None);
    }

    #[tokio::test]
    async fn persist_then_load_round_trips_through_file() {
        let path = unique_path("round_trip");
        let ledger = sample_ledger();

        persist_ledger(&path, &ledger).await.unwrap();
        let loaded = load_ledger(&path).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, ledger);
    }

    #[tokio::test]
    async fn persist_keeps_unrelated_keys() {
        let path = unique_path("other_keys");
        let mut area = StorageArea::default();
        area.set_item("theme", "dark");
        write_area(&path, &area).await.unwrap();

        persist_ledger(&path, &sample_ledger()).await.unwrap();
        let stored = read_area(&path).await;
        let _ = std::fs::remove_file(&path);

        assert_eq!(stored.get_item("theme"), Some("dark"));
        assert_eq!(stored.get_item(TOTAL_COUNT_KEY), Some("1"));
    }

    #[tokio::test]
    async fn missing_or_corrupt_file_loads_empty() {
        let missing = unique_path("missing");
        assert_eq!(load_ledger(&missing).await, Ledger::default());

        let corrupt = unique_path("corrupt");
        std::fs::write(&corrupt, b"[1, 2").unwrap();
        let loaded = load_ledger(&corrupt).await;
        let _ = std::fs::remove_file(&corrupt);
        assert_eq!(loaded, Ledger::default());
    }

    #[tokio::test]
    async fn write_into_missing_directory_fails() {
        let mut path = unique_path("no_dir");
        path.push("nested");
        path.push("ledger.json");
        let err = persist_ledger(&path, &Ledger::default()).await.unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }
}
