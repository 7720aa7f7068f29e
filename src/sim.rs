use crate::model::{clamp_stat, Record, DECAY};
use chrono::{DateTime, TimeZone};
use rand::Rng;
use std::fmt::Display;

const MS_PER_MINUTE: f64 = 60_000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Feed,
    Bribe,
    Escape,
}

#[derive(Clone, Debug)]
pub(crate) struct Outcome {
    pub(crate) record: Record,
    pub(crate) message: &'static str,
}

pub(crate) const MSG_FED: &str = "Contraband snack delivered.";
pub(crate) const MSG_BRIBED: &str = "Guard bribed.";
pub(crate) const MSG_ESCAPED: &str = "Escape: SUCCESS (briefly).";
pub(crate) const MSG_CAUGHT: &str = "Escape: FAILED. Solitary.";

/// Local calendar key, `YYYY-MM-DD`.
pub(crate) fn day_key<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    at.format("%Y-%m-%d").to_string()
}

/// Minutes since the record's last tick, never negative.
pub(crate) fn elapsed_minutes(r: &Record, now_ms: i64) -> f64 {
    let dt = now_ms.saturating_sub(r.last_tick) as f64 / MS_PER_MINUTE;
    dt.max(0.0)
}

pub(crate) fn apply_decay(r: &Record, now_ms: i64) -> Record {
    let mins = elapsed_minutes(r, now_ms);
    Record {
        hunger: clamp_stat(r.hunger - mins * DECAY.hunger_down),
        rage: clamp_stat(r.rage + mins * DECAY.rage_up),
        shame: clamp_stat(r.shame + mins * DECAY.shame_up),
        last_tick: now_ms,
        ..r.clone()
    }
}

pub(crate) fn escape_chance(shame: f64) -> f64 {
    ((100.0 - shame) / 200.0).max(0.05)
}

pub(crate) fn apply_action<R: Rng + ?Sized>(
    r: &Record,
    action: Action,
    now_ms: i64,
    today: &str,
    rng: &mut R,
) -> Outcome {
    let mut next = Record {
        last_tick: now_ms,
        ..r.clone()
    };

    let message = match action {
        Action::Feed => {
            next.hunger = clamp_stat(next.hunger + 22.0);
            next.rage = clamp_stat(next.rage - 10.0);
            next.shame = clamp_stat(next.shame - 6.0);
            // a missed day stalls the streak, it never resets
            if next.last_fed_day != today {
                next.day_streak = next.day_streak.saturating_add(1);
                next.last_fed_day = today.to_string();
            }
            MSG_FED
        }
        Action::Bribe => {
            next.rage = clamp_stat(next.rage - 18.0);
            next.shame = clamp_stat(next.shame + 6.0);
            MSG_BRIBED
        }
        Action::Escape => {
            let chance = escape_chance(next.shame);
            if rng.gen::<f64>() < chance {
                next.rage = clamp_stat(next.rage - 35.0);
                next.shame = clamp_stat(next.shame - 30.0);
                MSG_ESCAPED
            } else {
                next.rage = clamp_stat(next.rage + 12.0);
                next.shame = clamp_stat(next.shame + 10.0);
                MSG_CAUGHT
            }
        }
    };

    Outcome {
        record: next,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rec(hunger: f64, rage: f64, shame: f64) -> Record {
        Record {
            hunger,
            rage,
            shame,
            ..Record::fresh(0)
        }
    }

    fn lucky() -> StepRng {
        StepRng::new(0, 0)
    }

    fn unlucky() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn in_range(r: &Record) -> bool {
        [r.hunger, r.rage, r.shame]
            .iter()
            .all(|v| (0.0..=100.0).contains(v))
    }

    #[test]
    fn decay_one_hour() {
        let r = rec(70.0, 20.0, 50.0);
        let d = apply_decay(&r, 60 * 60_000);
        assert!((d.hunger - 55.0).abs() < 1e-9);
        assert!((d.rage - 29.0).abs() < 1e-9);
        assert!((d.shame - 56.0).abs() < 1e-9);
        assert_eq!(d.last_tick, 60 * 60_000);
    }

    #[test]
    fn decay_with_clock_behind_is_a_no_op_on_stats() {
        let mut r = rec(70.0, 20.0, 50.0);
        r.last_tick = 10_000;
        let d = apply_decay(&r, 5_000);
        assert_eq!(d.hunger, 70.0);
        assert_eq!(d.rage, 20.0);
        assert_eq!(d.shame, 50.0);
        assert_eq!(d.last_tick, 5_000);
        assert_eq!(elapsed_minutes(&r, 5_000), 0.0);
    }

    #[test]
    fn decay_leaves_streak_fields_alone() {
        let mut r = rec(70.0, 20.0, 50.0);
        r.day_streak = 4;
        r.last_fed_day = "2024-03-01".into();
        let d = apply_decay(&r, 123_456);
        assert_eq!(d.day_streak, 4);
        assert_eq!(d.last_fed_day, "2024-03-01");
    }

    #[test]
    fn decay_is_monotone() {
        let r = rec(60.0, 40.0, 40.0);
        let mut prev = r.clone();
        for minute in 1..=200 {
            let d = apply_decay(&r, minute * 60_000);
            assert!(d.hunger <= prev.hunger);
            assert!(d.rage >= prev.rage);
            assert!(d.shame >= prev.shame);
            prev = d;
        }
    }

    #[test]
    fn long_absence_clamps() {
        let r = rec(70.0, 20.0, 50.0);
        let d = apply_decay(&r, 30 * 24 * 60 * 60_000);
        assert_eq!(d.hunger, 0.0);
        assert_eq!(d.rage, 100.0);
        assert_eq!(d.shame, 100.0);
    }

    #[test]
    fn feed_scenario() {
        let r = rec(50.0, 50.0, 50.0);
        let out = apply_action(&r, Action::Feed, 42, "2024-01-01", &mut lucky());
        assert_eq!(out.record.hunger, 72.0);
        assert_eq!(out.record.rage, 40.0);
        assert_eq!(out.record.shame, 44.0);
        assert_eq!(out.record.day_streak, 1);
        assert_eq!(out.record.last_fed_day, "2024-01-01");
        assert_eq!(out.record.last_tick, 42);
        assert_eq!(out.message, MSG_FED);
    }

    #[test]
    fn feeding_twice_in_a_day_counts_once() {
        let r = rec(50.0, 50.0, 50.0);
        let once = apply_action(&r, Action::Feed, 1, "2024-01-01", &mut lucky()).record;
        let twice = apply_action(&once, Action::Feed, 2, "2024-01-01", &mut lucky()).record;
        assert_eq!(twice.day_streak, 1);
        let next_day = apply_action(&twice, Action::Feed, 3, "2024-01-02", &mut lucky()).record;
        assert_eq!(next_day.day_streak, 2);
    }

    #[test]
    fn missed_day_does_not_reset_streak() {
        let mut r = rec(50.0, 50.0, 50.0);
        r.day_streak = 5;
        r.last_fed_day = "2024-01-01".into();
        let out = apply_action(&r, Action::Feed, 1, "2024-01-09", &mut lucky()).record;
        assert_eq!(out.day_streak, 6);
    }

    #[test]
    fn feed_caps_hunger() {
        let out = apply_action(&rec(95.0, 5.0, 3.0), Action::Feed, 1, "d", &mut lucky()).record;
        assert_eq!(out.hunger, 100.0);
        assert_eq!(out.rage, 0.0);
        assert_eq!(out.shame, 0.0);
    }

    #[test]
    fn bribe_trades_rage_for_shame() {
        let out = apply_action(&rec(50.0, 50.0, 50.0), Action::Bribe, 9, "d", &mut lucky());
        assert_eq!(out.record.rage, 32.0);
        assert_eq!(out.record.shame, 56.0);
        assert_eq!(out.record.hunger, 50.0);
        assert_eq!(out.record.day_streak, 0);
        assert_eq!(out.message, MSG_BRIBED);
    }

    #[test]
    fn escape_chance_bounds() {
        assert_eq!(escape_chance(100.0), 0.05);
        assert_eq!(escape_chance(0.0), 0.5);
        assert_eq!(escape_chance(95.0), 0.05);
        assert!((escape_chance(50.0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn escape_success_and_failure() {
        let r = rec(50.0, 50.0, 50.0);
        let win = apply_action(&r, Action::Escape, 1, "d", &mut lucky());
        assert_eq!(win.message, MSG_ESCAPED);
        assert_eq!(win.record.rage, 15.0);
        assert_eq!(win.record.shame, 20.0);

        let lose = apply_action(&r, Action::Escape, 1, "d", &mut unlucky());
        assert_eq!(lose.message, MSG_CAUGHT);
        assert_eq!(lose.record.rage, 62.0);
        assert_eq!(lose.record.shame, 60.0);
    }

    #[test]
    fn stats_stay_in_range_under_any_sequence() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut r = Record::fresh(0);
        let mut now = 0i64;
        for i in 0..2_000 {
            now += rng.gen_range(0..3_600_000);
            r = apply_decay(&r, now);
            assert!(in_range(&r));
            let action = match rng.gen_range(0..3) {
                0 => Action::Feed,
                1 => Action::Bribe,
                _ => Action::Escape,
            };
            let today = format!("day-{}", i / 10);
            r = apply_action(&r, action, now, &today, &mut rng).record;
            assert!(in_range(&r), "out of range after {action:?}: {r:?}");
            assert_eq!(r.last_tick, now);
        }
    }

    #[test]
    fn messages_are_one_cell_per_char() {
        for msg in [MSG_FED, MSG_BRIBED, MSG_ESCAPED, MSG_CAUGHT] {
            assert!(msg.is_ascii(), "{msg:?} has wide glyphs");
        }
    }

    #[test]
    fn day_key_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 5, 23, 59, 0).unwrap();
        assert_eq!(day_key(&at), "2024-01-05");
    }
}
