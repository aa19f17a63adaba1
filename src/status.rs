//! Derived project lifecycle status
//!
//! A research project's status is never stored. It is recomputed from the
//! sanctioned date range on every read path, and this module is the only
//! implementation of that rule.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle stage of a research project, derived from its date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Upcoming,
    Ongoing,
    Completed,
}

impl ProjectStatus {
    /// Classify a project by its date range against `today`.
    ///
    /// A project missing either date is `Upcoming`; one whose range contains
    /// `today` (boundaries inclusive) is `Ongoing`.
    pub fn derive(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        let (Some(start), Some(end)) = (start, end) else {
            return ProjectStatus::Upcoming;
        };

        if today < start {
            ProjectStatus::Upcoming
        } else if today > end {
            ProjectStatus::Completed
        } else {
            ProjectStatus::Ongoing
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Upcoming => write!(f, "upcoming"),
            ProjectStatus::Ongoing => write!(f, "ongoing"),
            ProjectStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(ProjectStatus::Upcoming),
            "ongoing" => Ok(ProjectStatus::Ongoing),
            "completed" => Ok(ProjectStatus::Completed),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_missing_dates_are_upcoming() {
        let today = d(2024, 6, 15);
        assert_eq!(
            ProjectStatus::derive(None, None, today),
            ProjectStatus::Upcoming
        );
        assert_eq!(
            ProjectStatus::derive(Some(d(2024, 1, 1)), None, today),
            ProjectStatus::Upcoming
        );
        assert_eq!(
            ProjectStatus::derive(None, Some(d(2024, 12, 31)), today),
            ProjectStatus::Upcoming
        );
    }

    #[test]
    fn test_before_start_is_upcoming() {
        let status = ProjectStatus::derive(
            Some(d(2024, 1, 1)),
            Some(d(2024, 12, 31)),
            d(2023, 12, 31),
        );
        assert_eq!(status, ProjectStatus::Upcoming);
    }

    #[test]
    fn test_within_range_is_ongoing() {
        let status = ProjectStatus::derive(
            Some(d(2024, 1, 1)),
            Some(d(2024, 12, 31)),
            d(2024, 6, 15),
        );
        assert_eq!(status, ProjectStatus::Ongoing);
    }

    #[test]
    fn test_after_end_is_completed() {
        let status = ProjectStatus::derive(
            Some(d(2024, 1, 1)),
            Some(d(2024, 12, 31)),
            d(2025, 1, 1),
        );
        assert_eq!(status, ProjectStatus::Completed);
    }

    #[test]
    fn test_boundary_days_are_ongoing() {
        let start = Some(d(2024, 1, 1));
        let end = Some(d(2024, 12, 31));
        assert_eq!(
            ProjectStatus::derive(start, end, d(2024, 1, 1)),
            ProjectStatus::Ongoing
        );
        assert_eq!(
            ProjectStatus::derive(start, end, d(2024, 12, 31)),
            ProjectStatus::Ongoing
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for status in [
            ProjectStatus::Upcoming,
            ProjectStatus::Ongoing,
            ProjectStatus::Completed,
        ] {
            assert_eq!(status.to_string().parse::<ProjectStatus>(), Ok(status));
        }
        assert!("archived".parse::<ProjectStatus>().is_err());
    }
}
