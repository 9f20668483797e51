use crate::error::*;
use chrono::Days;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;
use std::fmt::Formatter;

/// Half-open extraction interval `[from, to)` applied to a window column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: NaiveDateTime,
    to: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Result<Self> {
        if from > to {
            return Err(ReplicationError::configuration(format!(
                "window starts after it ends ({} > {})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// Whole days, midnight to midnight.
    pub fn days(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        Self::new(midnight(from), midnight(to))
    }

    /// The conventional daily run: yesterday up to (excluding) today.
    pub fn yesterday(today: NaiveDate) -> Result<Self> {
        let yesterday = today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| ReplicationError::configuration("date out of range"))?;
        Self::days(yesterday, today)
    }

    pub fn from(&self) -> NaiveDateTime {
        self.from
    }
    pub fn to(&self) -> NaiveDateTime {
        self.to
    }

    #[cfg(test)]
    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        self.from <= instant && instant < self.to
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.from, self.to)
    }
}

pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::default())
}

/// Reads a window-column value from its text rendering.
/// Accepts timestamps (with or without fractional seconds) and bare dates.
#[cfg(test)]
pub fn instant(text: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(midnight)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn boundaries_are_half_open() {
        let window = TimeWindow::days(date("2024-03-01"), date("2024-03-02")).unwrap();
        assert!(window.contains(instant("2024-03-01").unwrap()));
        assert!(window.contains(instant("2024-03-01 23:59:59.999").unwrap()));
        assert!(!window.contains(instant("2024-03-02 00:00:00").unwrap()));
        assert!(!window.contains(instant("2024-02-29 23:59:59").unwrap()));
    }

    #[test]
    fn yesterday_spans_one_day() {
        let window = TimeWindow::yesterday(date("2024-03-01")).unwrap();
        assert_eq!(window.from(), instant("2024-02-29").unwrap());
        assert_eq!(window.to(), instant("2024-03-01").unwrap());
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = TimeWindow::days(date("2024-03-02"), date("2024-03-01")).unwrap_err();
        assert!(matches!(err, ReplicationError::Configuration(_)));
    }

    #[test]
    fn empty_window_contains_nothing() {
        let window = TimeWindow::days(date("2024-03-01"), date("2024-03-01")).unwrap();
        assert!(!window.contains(instant("2024-03-01").unwrap()));
    }

    #[test]
    fn instant_parses_iso_t_separator() {
        assert_eq!(
            instant("2024-03-01T12:30:00"),
            instant("2024-03-01 12:30:00")
        );
        assert!(instant("yesterday").is_none());
    }
}
