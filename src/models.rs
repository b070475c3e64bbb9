use chrono::{DateTime, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ledger {
    pub total_count: u64,
    pub history: BTreeMap<String, DayRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DayRecord {
    /// Snapshot of the total after the latest change. Nothing reads it back.
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub changes: Vec<ChangeEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(default)]
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
}

/// A signed delta, or the `"reset"` marker that zeroes a day's fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Delta(i64),
    Reset,
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Delta(0)
    }
}

const RESET_MARKER: &str = "reset";

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Amount::Delta(value) => serializer.serialize_i64(*value),
            Amount::Reset => serializer.serialize_str(RESET_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer amount or \"reset\"")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Amount, E> {
        Ok(Amount::Delta(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Amount, E> {
        i64::try_from(value)
            .map(Amount::Delta)
            .map_err(|_| E::custom("amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Amount, E> {
        if value.fract() == 0.0 && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
            Ok(Amount::Delta(value as i64))
        } else {
            Err(E::custom("amount must be a whole number"))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Amount, E> {
        if value == RESET_MARKER {
            Ok(Amount::Reset)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }

    fn visit_unit<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::Delta(0))
    }

    fn visit_none<E: de::Error>(self) -> Result<Amount, E> {
        Ok(Amount::Delta(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Increment,
    Decrement,
    Reset,
}

impl FromStr for Action {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "increment" => Ok(Action::Increment),
            "decrement" => Ok(Action::Decrement),
            "reset" => Ok(Action::Reset),
            _ => Err("action must be 'increment', 'decrement' or 'reset'".to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Increment => "increment",
            Action::Decrement => "decrement",
            Action::Reset => "reset",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: String,
    pub daily_count: i64,
    pub running_total: i64,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CounterResponse {
    pub date: String,
    pub total_count: u64,
    pub today_total: u64,
    pub can_decrement: bool,
    pub can_reset: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: String,
    pub label: String,
    pub daily_count: i64,
    pub running_total: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}
