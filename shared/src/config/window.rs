//! Lookback windows.
//!
//! A lookback window `W` restricts collection to items with a timestamp at or
//! after `now - W`.

use super::source::SourceConfigError;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::time::Duration;

/// Default windows: 48 hours, 7 days, 45 days.
pub const DEFAULT_WINDOWS: [Duration; 3] = [
    Duration::from_secs(48 * 60 * 60),
    Duration::from_secs(7 * 24 * 60 * 60),
    Duration::from_secs(45 * 24 * 60 * 60),
];

/// A lookback duration.
///
/// # Example
///
/// ```
/// use shared::config::LookbackWindow;
///
/// let window: LookbackWindow = "48h".parse().unwrap();
/// assert_eq!(window.as_secs_f64(), 172_800.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookbackWindow(Duration);

impl LookbackWindow {
    /// Creates a window from a duration.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns the window length in seconds.
    #[must_use]
    pub fn as_secs_f64(self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Returns true if the window has zero length.
    ///
    /// Rates are not computed over a zero-length window.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns the cut-off instant `now - window`.
    ///
    /// Windows too large to represent saturate at the earliest representable
    /// instant.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.0)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Parses a comma-separated list such as `48h,7d,45d`.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a valid duration or the list is empty.
    pub fn parse_list(value: &str) -> Result<Vec<Self>, SourceConfigError> {
        let windows = value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Self>, _>>()?;

        if windows.is_empty() {
            return Err(SourceConfigError::NoWindows);
        }
        Ok(windows)
    }

    /// Returns the default window list.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_WINDOWS.into_iter().map(Self).collect()
    }
}

impl FromStr for LookbackWindow {
    type Err = SourceConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        humantime::parse_duration(s.trim())
            .map(Self)
            .map_err(|source| SourceConfigError::InvalidWindow {
                value: s.to_string(),
                source,
            })
    }
}

impl std::fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", humantime::format_duration(self.0))
    }
}
