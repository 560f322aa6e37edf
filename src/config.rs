//! Federate-wide configuration (analogous to HELICS's `CoreFederateInfo`).

use crate::time::Time;

/// Static configuration for one federate, supplied at construction and
/// updatable afterward through [`crate::federate::FederateState::update_config`].
#[derive(Debug, Clone)]
pub struct FederateConfig {
    pub name: String,
    /// Minimum distinguishable step between two grants; coerced to
    /// [`Time::EPSILON`] if supplied as zero or negative (spec §7d).
    pub time_delta: Time,
    /// Extra delay added to the timestamp of values/messages as they are
    /// revealed to the federate (spec §4.5, §8 property 7).
    pub impact_window: Time,
    /// Local log-level gate; consulted by [`crate::logging::log`].
    pub log_level: u8,
}

impl Default for FederateConfig {
    fn default() -> Self {
        FederateConfig::new("unnamed")
    }
}

impl FederateConfig {
    pub fn new(name: impl Into<String>) -> Self {
        FederateConfig {
            name: name.into(),
            time_delta: Time::EPSILON,
            impact_window: Time::ZERO,
            log_level: 1,
        }
    }

    /// Normalize `time_delta`, mirroring `FederateState::UpdateFederateInfo`.
    pub fn normalized(mut self) -> Self {
        self.time_delta = Time::normalize_delta(self.time_delta);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_normalizes_default_delta() {
        let cfg = FederateConfig::new("f").normalized();
        assert_eq!(cfg.time_delta, Time::EPSILON);
    }
}
