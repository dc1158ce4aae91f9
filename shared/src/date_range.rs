//! Date range helpers for report requests
//!
//! Dashboard ranges are expressed as `last-N-days` slugs and resolved against a
//! reference date into concrete `startDate`/`endDate` report parameters.

use chrono::{Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::errors::{SharedError, SharedResult};
use crate::types::ReportRequest;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A trailing window of whole days, e.g. `last-28-days`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    days: u32,
}

/// Concrete dates for a range, with the preceding window when comparing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDates {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub compare: Option<(NaiveDate, NaiveDate)>,
}

impl DateRange {
    pub fn last_days(days: u32) -> SharedResult<Self> {
        if days == 0 {
            return Err(SharedError::InvalidDateRange { input: "last-0-days".to_string() });
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Resolve against `reference`. The window ends `offset_days` before it.
    ///
    /// Fails with `InvalidDateRange` when a date would fall outside the
    /// supported calendar.
    pub fn resolve(&self, reference: NaiveDate, offset_days: u32, compare: bool) -> SharedResult<RangeDates> {
        let out_of_range = || SharedError::InvalidDateRange {
            input: format!("{self} ending {offset_days} days before {}", format_date(reference)),
        };
        let span = Duration::days(i64::from(self.days) - 1);
        let end_date = reference
            .checked_sub_signed(Duration::days(i64::from(offset_days)))
            .ok_or_else(out_of_range)?;
        let start_date = end_date.checked_sub_signed(span).ok_or_else(out_of_range)?;

        let compare = if compare {
            let compare_end = start_date
                .checked_sub_signed(Duration::days(1))
                .ok_or_else(out_of_range)?;
            let compare_start = compare_end.checked_sub_signed(span).ok_or_else(out_of_range)?;
            Some((compare_start, compare_end))
        } else {
            None
        };

        Ok(RangeDates { start_date, end_date, compare })
    }

    /// Add `startDate`/`endDate` (and compare dates) to a request
    pub fn apply(
        &self,
        request: ReportRequest,
        reference: NaiveDate,
        offset_days: u32,
        compare: bool,
    ) -> SharedResult<ReportRequest> {
        let dates = self.resolve(reference, offset_days, compare)?;
        let mut request = request
            .param("startDate", format_date(dates.start_date))
            .param("endDate", format_date(dates.end_date));
        if let Some((compare_start, compare_end)) = dates.compare {
            request = request
                .param("compareStartDate", format_date(compare_start))
                .param("compareEndDate", format_date(compare_end));
        }
        Ok(request)
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self { days: 28 }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "last-{}-days", self.days)
    }
}

impl FromStr for DateRange {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SharedError::InvalidDateRange { input: s.to_string() };
        let days = s
            .strip_prefix("last-")
            .and_then(|rest| rest.strip_suffix("-days"))
            .ok_or_else(invalid)?
            .parse::<u32>()
            .map_err(|_| invalid())?;
        DateRange::last_days(days).map_err(|_| invalid())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(input: &str) -> SharedResult<NaiveDate> {
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .map_err(|_| SharedError::InvalidDateRange { input: input.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleSlug;
    use assert_matches::assert_matches;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_parse_slug() {
        assert_eq!("last-28-days".parse::<DateRange>().unwrap().days(), 28);
        assert_eq!(DateRange::default().to_string(), "last-28-days");
        assert_matches!("last-0-days".parse::<DateRange>(), Err(SharedError::InvalidDateRange { .. }));
        assert_matches!("28-days".parse::<DateRange>(), Err(SharedError::InvalidDateRange { .. }));
        assert_matches!("last-x-days".parse::<DateRange>(), Err(SharedError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_resolve_with_offset() {
        let range = DateRange::last_days(7).unwrap();
        let dates = range.resolve(date("2024-02-08"), 1, false).unwrap();

        assert_eq!(dates.end_date, date("2024-02-07"));
        assert_eq!(dates.start_date, date("2024-02-01"));
        assert_eq!(dates.compare, None);
    }

    #[test]
    fn test_resolve_compare_window_precedes_range() {
        let range = DateRange::last_days(28).unwrap();
        let dates = range.resolve(date("2024-03-01"), 0, true).unwrap();

        assert_eq!(dates.end_date, date("2024-03-01"));
        assert_eq!(dates.start_date, date("2024-02-03"));
        assert_eq!(dates.compare, Some((date("2024-01-06"), date("2024-02-02"))));
    }

    #[test]
    fn test_apply_sets_parameters() {
        let request = ReportRequest::new(ModuleSlug::SearchConsole, "searchanalytics");
        let request = DateRange::last_days(31)
            .unwrap()
            .apply(request, date("2024-02-01"), 1, false)
            .unwrap();

        assert_eq!(request.parameters["startDate"], "2024-01-01");
        assert_eq!(request.parameters["endDate"], "2024-01-31");
        assert!(!request.parameters.contains_key("compareStartDate"));
    }

    #[test]
    fn test_huge_ranges_are_rejected() {
        let range = "last-4000000000-days".parse::<DateRange>().unwrap();
        assert_matches!(
            range.resolve(date("2024-01-01"), 1, false),
            Err(SharedError::InvalidDateRange { .. })
        );

        let week = DateRange::last_days(7).unwrap();
        assert_matches!(
            week.resolve(date("2024-01-01"), u32::MAX, false),
            Err(SharedError::InvalidDateRange { .. })
        );

        let request = ReportRequest::new(ModuleSlug::SearchConsole, "searchanalytics");
        assert_matches!(
            range.apply(request, date("2024-01-01"), 0, true),
            Err(SharedError::InvalidDateRange { .. })
        );
    }
}
