//! The one live inmate for a run: owns the loaded record, the save slot
//! handle and the transient action message. The app loop is its only writer.

use crate::model::{Mood, Record};
use crate::sim::{apply_action, apply_decay, elapsed_minutes, Action};
use crate::storage::{Store, StoreError};
use rand::Rng;

#[derive(Clone, Copy, Debug)]
struct Toast {
    text: &'static str,
    until_ms: i64,
}

pub(crate) struct Session {
    store: Store,
    record: Option<Record>,
    toast: Option<Toast>,
    message_ms: i64,
}

impl Session {
    pub(crate) fn new(store: Store, message_ms: u64) -> Self {
        Self {
            store,
            record: None,
            toast: None,
            message_ms: i64::try_from(message_ms).unwrap_or(i64::MAX),
        }
    }

    /// Load the slot, catch up on decay since the last save, persist.
    pub(crate) fn boot(&mut self, now_ms: i64) -> Result<&Record, StoreError> {
        let loaded = self.store.load(now_ms);
        let decayed = apply_decay(&loaded, now_ms);
        tracing::info!(
            "booted from {}: away {:.1} min, mood {}",
            self.store.path().display(),
            elapsed_minutes(&loaded, now_ms),
            decayed.mood()
        );
        self.store.save(&decayed)?;
        Ok(&*self.record.insert(decayed))
    }

    pub(crate) fn record(&self) -> Option<&Record> {
        self.record.as_ref()
    }

    pub(crate) fn mood(&self) -> Mood {
        self.record.as_ref().map_or(Mood::Booting, Record::mood)
    }

    /// Periodic decay. Returns whether anything was persisted.
    pub(crate) fn tick(&mut self, now_ms: i64) -> Result<bool, StoreError> {
        let Some(current) = self.record.as_ref() else {
            return Ok(false);
        };
        if now_ms <= current.last_tick {
            return Ok(false);
        }
        let next = apply_decay(current, now_ms);
        self.store.save(&next)?;
        tracing::debug!(
            "tick: hunger={:.2} rage={:.2} shame={:.2}",
            next.hunger,
            next.rage,
            next.shame
        );
        self.record = Some(next);
        Ok(true)
    }

    /// Apply an action and persist. `None` while nothing is loaded.
    pub(crate) fn act<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        now_ms: i64,
        today: &str,
        rng: &mut R,
    ) -> Result<Option<&'static str>, StoreError> {
        let Some(current) = self.record.as_ref() else {
            return Ok(None);
        };
        let outcome = apply_action(current, action, now_ms, today, rng);
        self.store.save(&outcome.record)?;
        tracing::info!("{:?} -> {} ({})", action, outcome.record.mood(), outcome.message);
        self.record = Some(outcome.record);
        self.toast = Some(Toast {
            text: outcome.message,
            until_ms: now_ms.saturating_add(self.message_ms),
        });
        Ok(Some(outcome.message))
    }

    pub(crate) fn message(&self, now_ms: i64) -> Option<&'static str> {
        self.toast
            .filter(|t| now_ms < t.until_ms)
            .map(|t| t.text)
    }

    pub(crate) fn expire_message(&mut self, now_ms: i64) {
        if self.toast.is_some_and(|t| now_ms >= t.until_ms) {
            self.toast = None;
        }
    }
}
