// core/time.rs
//
// Time units and repetition policy shared by every action.
//
// Usage:
//   let units = TimeUnitConfig::millis();
//   let action = Action::with_time_units(kind, 250.0, units)?;

/// Scale applied to every duration, delay and step delta an action receives.
///
/// Values are multiplied by `units_per_reference` the moment they are set, so
/// actions store time internally in milliseconds. Switching the reference on a
/// config does not touch values already stored in an action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnitConfig {
    units_per_reference: f64,
}

impl TimeUnitConfig {
    /// Durations and deltas are given in seconds.
    pub const SECONDS: f64 = 1000.0;
    /// Durations and deltas are given in milliseconds.
    pub const MILLIS: f64 = 1.0;

    pub fn seconds() -> Self {
        Self { units_per_reference: Self::SECONDS }
    }

    pub fn millis() -> Self {
        Self { units_per_reference: Self::MILLIS }
    }

    pub fn set_time_reference_in_seconds(&mut self) {
        self.units_per_reference = Self::SECONDS;
    }

    pub fn set_time_reference_in_millis(&mut self) {
        self.units_per_reference = Self::MILLIS;
    }

    /// Multiplier from caller units to stored units.
    #[inline]
    pub fn factor(&self) -> f64 {
        self.units_per_reference
    }

    /// Convert a caller-facing value to the stored representation.
    #[inline]
    pub fn scale(&self, value: f64) -> f64 {
        value * self.units_per_reference
    }
}

impl Default for TimeUnitConfig {
    fn default() -> Self {
        Self::seconds()
    }
}

/// How many times an action plays its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPolicy {
    Finite(u32),
    Infinite,
}

impl RepeatPolicy {
    pub fn is_infinite(self) -> bool {
        matches!(self, RepeatPolicy::Infinite)
    }

    /// Finite repeat count, `None` when repeating forever.
    pub fn count(self) -> Option<u32> {
        match self {
            RepeatPolicy::Finite(n) => Some(n),
            RepeatPolicy::Infinite => None,
        }
    }
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        RepeatPolicy::Finite(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_is_default() {
        assert_eq!(TimeUnitConfig::default().factor(), 1000.0);
        assert_eq!(TimeUnitConfig::default().scale(0.5), 500.0);
    }

    #[test]
    fn switching_reference() {
        let mut units = TimeUnitConfig::seconds();
        units.set_time_reference_in_millis();
        assert_eq!(units.scale(250.0), 250.0);
        units.set_time_reference_in_seconds();
        assert_eq!(units.scale(0.25), 250.0);
    }

    #[test]
    fn repeat_policy_count() {
        assert_eq!(RepeatPolicy::default(), RepeatPolicy::Finite(1));
        assert_eq!(RepeatPolicy::Finite(3).count(), Some(3));
        assert_eq!(RepeatPolicy::Infinite.count(), None);
        assert!(RepeatPolicy::Infinite.is_infinite());
    }
}
