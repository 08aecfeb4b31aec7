//! "First match wins" resolution rules. Each rule is a named, ordered list of
//! sources so the tie-break order can be tested on its own.

use crate::models::{lap::Lap, stint::Stint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedSource {
    SpeedTrap,
    Intermediate1,
    Intermediate2,
}

impl SpeedSource {
    pub fn read(self, lap: &Lap) -> Option<f64> {
        let value = match self {
            SpeedSource::SpeedTrap => lap.st_speed,
            SpeedSource::Intermediate1 => lap.i1_speed,
            SpeedSource::Intermediate2 => lap.i2_speed,
        };
        value.filter(|speed| speed.is_finite())
    }
}

pub const SPEED_PRIORITY: [SpeedSource; 3] = [
    SpeedSource::SpeedTrap,
    SpeedSource::Intermediate1,
    SpeedSource::Intermediate2,
];

/// Never averaged: the first reading present in `SPEED_PRIORITY` is the speed.
pub fn resolve_speed(lap: &Lap) -> Option<f64> {
    SPEED_PRIORITY.iter().find_map(|source| source.read(lap))
}

/// What to report when no stint range covers the requested lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundFallback {
    /// The most recent stint's tyre.
    LastStint,
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundRule {
    pub fallback: CompoundFallback,
}

/// Tyre currently fitted, given laps completed so far (leaderboard).
pub const CURRENT_TYRE: CompoundRule = CompoundRule {
    fallback: CompoundFallback::LastStint,
};

/// Tyre used on one specific lap (telemetry details).
pub const TYRE_AT_LAP: CompoundRule = CompoundRule {
    fallback: CompoundFallback::Absent,
};

impl CompoundRule {
    /// `stints` belong to a single driver, in any order.
    pub fn resolve(&self, stints: &[&Stint], lap: Option<u32>) -> Option<String> {
        if stints.is_empty() {
            return None;
        }
        let mut ordered = stints.to_vec();
        ordered.sort_by_key(|stint| stint.stint_number.unwrap_or(0));

        let matched = lap.and_then(|lap| ordered.iter().find(|stint| stint.covers(lap)));
        match (matched, self.fallback) {
            (Some(stint), _) => stint.compound.clone(),
            (None, CompoundFallback::LastStint) => {
                ordered.last().and_then(|stint| stint.compound.clone())
            }
            (None, CompoundFallback::Absent) => None,
        }
    }
}
