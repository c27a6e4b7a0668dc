//! Typed view of a stored game

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::schema::{
    is_known, DATE_FIELD, FEATURE_DIM, HOME_FIELD, LABEL_FIELD, STAT_DIM, STAT_FIELDS,
};
use crate::data::manifest::GameEvent;
use crate::{NbaError, Result};

/// One historical game with every schema field coerced to a number
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub date: NaiveDate,
    /// 1.0 if team1 was at home
    pub home: f32,
    pub won: bool,
    /// Values in `STAT_FIELDS` order
    pub stats: [f32; STAT_DIM],
}

impl GameRecord {
    /// Coerce the attributes of the `index`-th stored event
    pub fn from_event(event: &GameEvent, index: usize) -> Result<Self> {
        let attrs = &event.attributes;
        if index == 0 {
            for name in attrs.keys().filter(|name| !is_known(name)) {
                log::debug!("Ignoring attribute {} outside the feature schema", name);
            }
        }

        let date = parse_date(attrs, index)?;
        let home = numeric(attrs, HOME_FIELD, index)?;
        let won = label(attrs, index)?;

        let mut stats = [0.0f32; STAT_DIM];
        for (slot, field) in stats.iter_mut().zip(STAT_FIELDS.iter()) {
            *slot = numeric(attrs, field, index)?;
        }

        Ok(GameRecord {
            date,
            home,
            won,
            stats,
        })
    }

    /// Training row: home flag followed by the statistics
    pub fn to_row(&self) -> [f32; FEATURE_DIM] {
        let mut row = [0.0f32; FEATURE_DIM];
        row[0] = self.home;
        row[1..].copy_from_slice(&self.stats);
        row
    }

    /// Label as a class value (1 = team1 won)
    pub fn class(&self) -> u8 {
        u8::from(self.won)
    }
}

fn field<'a>(attrs: &'a Map<String, Value>, name: &str, index: usize) -> Result<&'a Value> {
    match attrs.get(name) {
        Some(Value::Null) | None => Err(NbaError::Data(format!(
            "missing value for field {} in record {}",
            name, index
        ))),
        Some(v) => Ok(v),
    }
}

fn non_numeric(name: &str, index: usize, value: &Value) -> NbaError {
    NbaError::Data(format!(
        "non-numeric value for field {} in record {}: {}",
        name, index, value
    ))
}

/// Coerce an attribute to `f32`; numeric strings and booleans are accepted
fn numeric(attrs: &Map<String, Value>, name: &str, index: usize) -> Result<f32> {
    let value = field(attrs, name, index)?;
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    // Finite as f64 can still overflow to inf as f32
    match number.map(|n| n as f32) {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(non_numeric(name, index, value)),
    }
}

fn label(attrs: &Map<String, Value>, index: usize) -> Result<bool> {
    let value = field(attrs, LABEL_FIELD, index)?;
    if let Value::String(s) = value {
        match s.trim() {
            "W" | "w" => return Ok(true),
            "L" | "l" => return Ok(false),
            _ => {}
        }
    }
    // Any numeric value other than 1 is a loss for team1
    numeric(attrs, LABEL_FIELD, index).map(|v| v == 1.0)
}

fn parse_date(attrs: &Map<String, Value>, index: usize) -> Result<NaiveDate> {
    let value = field(attrs, DATE_FIELD, index)?;
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok())
        .ok_or_else(|| {
            NbaError::Data(format!(
                "invalid date for field {} in record {}: {}",
                DATE_FIELD, index, value
            ))
        })
}
