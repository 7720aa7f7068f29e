use serde::Serialize;
use std::fmt;

pub(crate) const DEFAULT_HUNGER: f64 = 70.0;
pub(crate) const DEFAULT_RAGE: f64 = 20.0;
pub(crate) const DEFAULT_SHAME: f64 = 50.0;

pub(crate) const STAT_MIN: f64 = 0.0;
pub(crate) const STAT_MAX: f64 = 100.0;

/// Per-minute drift applied by decay.
#[derive(Clone, Copy, Debug)]
pub(crate) struct DecayRates {
    pub(crate) hunger_down: f64,
    pub(crate) rage_up: f64,
    pub(crate) shame_up: f64,
}

pub(crate) const DECAY: DecayRates = DecayRates {
    hunger_down: 0.25,
    rage_up: 0.15,
    shame_up: 0.10,
};

pub(crate) fn clamp_stat(v: f64) -> f64 {
    v.clamp(STAT_MIN, STAT_MAX)
}

/// The inmate's persisted state. Field names on disk are camelCase.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Record {
    pub(crate) hunger: f64,
    pub(crate) rage: f64,
    pub(crate) shame: f64,
    /// Milliseconds since the Unix epoch.
    pub(crate) last_tick: i64,
    pub(crate) day_streak: u32,
    /// `YYYY-MM-DD`, or empty if never fed.
    pub(crate) last_fed_day: String,
}

impl Record {
    pub(crate) fn fresh(now_ms: i64) -> Self {
        Self {
            hunger: DEFAULT_HUNGER,
            rage: DEFAULT_RAGE,
            shame: DEFAULT_SHAME,
            last_tick: now_ms,
            day_streak: 0,
            last_fed_day: String::new(),
        }
    }

    pub(crate) fn mood(&self) -> Mood {
        Mood::classify(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Mood {
    /// No record loaded yet.
    Booting,
    Starving,
    Rioting,
    Spiraling,
    Chillin,
    Plotting,
}

impl Mood {
    /// First match wins; never yields `Booting`.
    pub(crate) fn classify(r: &Record) -> Mood {
        if r.hunger < 20.0 {
            return Mood::Starving;
        }
        if r.rage > 75.0 {
            return Mood::Rioting;
        }
        if r.shame > 75.0 {
            return Mood::Spiraling;
        }
        if r.hunger > 70.0 && r.rage < 30.0 && r.shame < 60.0 {
            return Mood::Chillin;
        }
        Mood::Plotting
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Mood::Booting => "booting",
            Mood::Starving => "starving",
            Mood::Rioting => "rioting",
            Mood::Spiraling => "spiraling",
            Mood::Chillin => "chillin",
            Mood::Plotting => "plotting",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(hunger: f64, rage: f64, shame: f64) -> Record {
        Record {
            hunger,
            rage,
            shame,
            ..Record::fresh(0)
        }
    }

    #[test]
    fn fresh_record_uses_defaults() {
        let r = Record::fresh(1234);
        assert_eq!(r.hunger, 70.0);
        assert_eq!(r.rage, 20.0);
        assert_eq!(r.shame, 50.0);
        assert_eq!(r.last_tick, 1234);
        assert_eq!(r.day_streak, 0);
        assert_eq!(r.last_fed_day, "");
    }

    #[test]
    fn starving_beats_everything() {
        assert_eq!(rec(10.0, 80.0, 90.0).mood(), Mood::Starving);
    }

    #[test]
    fn rage_is_checked_before_shame() {
        assert_eq!(rec(50.0, 80.0, 90.0).mood(), Mood::Rioting);
        assert_eq!(rec(50.0, 75.0, 90.0).mood(), Mood::Spiraling);
    }

    #[test]
    fn chillin_needs_all_three_conditions() {
        assert_eq!(rec(71.0, 29.0, 59.0).mood(), Mood::Chillin);
        assert_eq!(rec(70.0, 29.0, 59.0).mood(), Mood::Plotting);
        assert_eq!(rec(71.0, 30.0, 59.0).mood(), Mood::Plotting);
        assert_eq!(rec(71.0, 29.0, 60.0).mood(), Mood::Plotting);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(rec(20.0, 20.0, 50.0).mood(), Mood::Plotting);
        assert_eq!(rec(19.99, 20.0, 50.0).mood(), Mood::Starving);
    }

    #[test]
    fn defaults_classify_as_plotting() {
        assert_eq!(Record::fresh(0).mood(), Mood::Plotting);
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let v = serde_json::to_value(Record::fresh(5)).unwrap();
        let obj = v.as_object().unwrap();
        for key in ["hunger", "rage", "shame", "lastTick", "dayStreak", "lastFedDay"] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj.len(), 6);
    }

    #[test]
    fn mood_labels() {
        assert_eq!(Mood::Booting.to_string(), "booting");
        assert_eq!(Mood::Spiraling.label(), "spiraling");
    }
}
