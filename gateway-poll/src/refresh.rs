use std::fmt::{self, Display};
use std::time::Duration;

/// Desired polling cadence of a device.
///
/// Only [`RefreshTime::Every`] can be scheduled. The other two variants are
/// valid answers from a device but tell the poller to leave it alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTime {
    /// The device does not express any preference
    None,
    /// Polling was explicitly turned off
    Disabled,
    /// Poll once per the given (non-zero) period
    Every(Duration),
}

impl RefreshTime {
    /// A zero period means polling is off.
    pub fn from_duration(period: Duration) -> Self {
        if period.is_zero() {
            Self::Disabled
        } else {
            Self::Every(period)
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::from_duration(Duration::from_secs(secs))
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::from_duration(Duration::from_millis(millis))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// The polling period, if this refresh time can be scheduled
    pub fn time(&self) -> Option<Duration> {
        match self {
            Self::Every(period) => Some(*period),
            Self::None | Self::Disabled => None,
        }
    }
}

impl From<Duration> for RefreshTime {
    fn from(period: Duration) -> Self {
        Self::from_duration(period)
    }
}

impl Display for RefreshTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Disabled => f.write_str("disabled"),
            Self::Every(period) if period.subsec_nanos() == 0 => {
                write!(f, "{}s", period.as_secs())
            }
            Self::Every(period) => write!(f, "{}ms", period.as_millis()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_disables_polling() {
        assert_eq!(RefreshTime::from_secs(0), RefreshTime::Disabled);
        assert_eq!(RefreshTime::from(Duration::ZERO), RefreshTime::Disabled);
        assert!(RefreshTime::from_millis(0).is_disabled());
    }

    #[test]
    fn test_only_concrete_periods_have_a_time() {
        assert_eq!(
            RefreshTime::from_secs(5).time(),
            Some(Duration::from_secs(5))
        );
        assert_eq!(RefreshTime::None.time(), None);
        assert_eq!(RefreshTime::Disabled.time(), None);
        assert!(RefreshTime::None.is_none());
    }

    #[test]
    fn test_displays_each_variant() {
        assert_eq!(RefreshTime::None.to_string(), "none");
        assert_eq!(RefreshTime::Disabled.to_string(), "disabled");
        assert_eq!(RefreshTime::from_secs(30).to_string(), "30s");
        assert_eq!(RefreshTime::from_millis(1500).to_string(), "1500ms");
    }
}
