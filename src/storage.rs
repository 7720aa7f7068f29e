use crate::config::atomic_rename;
use crate::model::{clamp_stat, Record};
use serde_json::{Map, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// File name of the single save slot.
pub(crate) const SLOT_FILE: &str = "krookz_pixel_jail_v1.json";

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("could not write save slot {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Handle to the one persisted record.
#[derive(Clone, Debug)]
pub(crate) struct Store {
    path: PathBuf,
}

impl Store {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: anything unreadable falls back to defaults, field by field.
    pub(crate) fn load(&self, now_ms: i64) -> Record {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("save slot {} unreadable: {}", self.path.display(), e);
                } else {
                    tracing::info!("no save slot at {}, starting fresh", self.path.display());
                }
                return Record::fresh(now_ms);
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(obj)) => coerce_record(&obj, now_ms),
            Ok(other) => {
                tracing::warn!("save slot holds a non-object ({}), using defaults", kind(&other));
                Record::fresh(now_ms)
            }
            Err(e) => {
                tracing::warn!("save slot is not valid JSON: {}", e);
                Record::fresh(now_ms)
            }
        }
    }

    pub(crate) fn save(&self, record: &Record) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec(record)?;
        fs::write(&tmp, data).map_err(io_err)?;
        atomic_rename(&tmp, &self.path).map_err(io_err)?;
        tracing::trace!(
            "saved hunger={:.2} rage={:.2} shame={:.2} tick={}",
            record.hunger,
            record.rage,
            record.shame,
            record.last_tick
        );
        Ok(())
    }
}

fn coerce_record(obj: &Map<String, Value>, now_ms: i64) -> Record {
    let base = Record::fresh(now_ms);
    let stat = |key: &str, fallback: f64| {
        obj.get(key)
            .and_then(finite_number)
            .map(clamp_stat)
            .unwrap_or(fallback)
    };

    let last_tick = obj
        .get("lastTick")
        .and_then(|v| v.as_i64().or_else(|| finite_number(v).map(|f| f as i64)))
        .unwrap_or(base.last_tick);

    let day_streak = obj
        .get("dayStreak")
        .and_then(finite_number)
        .filter(|n| *n >= 0.0)
        // `as` saturates at u32::MAX
        .map(|n| n as u32)
        .unwrap_or(base.day_streak);

    let last_fed_day = match obj.get("lastFedDay") {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => base.last_fed_day.clone(),
    };

    Record {
        hunger: stat("hunger", base.hunger),
        rage: stat("rage", base.rage),
        shame: stat("shame", base.shame),
        last_tick,
        day_streak,
        last_fed_day,
    }
}

fn finite_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
