use std::collections::HashSet;
use std::time::Duration;

use crate::check::Check;
use crate::template::RequestTemplate;
use crate::{Error, Result};

pub const DEFAULT_VUS: u64 = 1;
pub const DEFAULT_DURATION: Duration = Duration::from_secs(10);
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a run needs. Owned by the scheduler for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub vus: u64,
    pub duration: Duration,
    pub target: RequestTemplate,
    pub checks: Vec<Check>,
    /// Pause between iterations of one VU.
    pub think_time: Option<Duration>,
    pub progress_interval: Duration,
}

impl RunConfig {
    pub fn new(target: RequestTemplate) -> Self {
        Self {
            vus: DEFAULT_VUS,
            duration: DEFAULT_DURATION,
            target,
            checks: Vec::new(),
            think_time: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_vus(mut self, vus: u64) -> Self {
        self.vus = vus;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    #[must_use]
    pub fn with_think_time(mut self, think_time: Option<Duration>) -> Self {
        self.think_time = think_time;
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vus == 0 {
            return Err(Error::InvalidVus);
        }
        if self.duration.is_zero() {
            return Err(Error::InvalidDuration);
        }
        if self.progress_interval.is_zero() {
            return Err(Error::InvalidProgressInterval);
        }

        let mut seen = HashSet::with_capacity(self.checks.len());
        for check in &self.checks {
            if check.name().trim().is_empty() {
                return Err(Error::InvalidCheck("check name must not be empty".to_string()));
            }
            if !seen.insert(check.name().clone()) {
                return Err(Error::InvalidCheck(format!(
                    "duplicate check name `{}`",
                    check.name()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Predicate;

    fn target() -> RequestTemplate {
        RequestTemplate::get("http://localhost/").unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = RunConfig::new(target());
        assert_eq!(cfg.vus, 1);
        assert_eq!(cfg.duration, Duration::from_secs(10));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_zero_vus_and_duration() {
        assert!(matches!(
            RunConfig::new(target()).with_vus(0).validate(),
            Err(Error::InvalidVus)
        ));
        assert!(matches!(
            RunConfig::new(target())
                .with_duration(Duration::ZERO)
                .validate(),
            Err(Error::InvalidDuration)
        ));
        assert!(matches!(
            RunConfig::new(target())
                .with_progress_interval(Duration::ZERO)
                .validate(),
            Err(Error::InvalidProgressInterval)
        ));
    }

    #[test]
    fn rejects_duplicate_or_empty_check_names() {
        let cfg = RunConfig::new(target())
            .with_check(Check::new("a", Predicate::Success))
            .with_check(Check::new("a", Predicate::Success));
        assert!(matches!(cfg.validate(), Err(Error::InvalidCheck(_))));

        let cfg = RunConfig::new(target()).with_check(Check::new(" ", Predicate::Success));
        assert!(matches!(cfg.validate(), Err(Error::InvalidCheck(_))));
    }
}
