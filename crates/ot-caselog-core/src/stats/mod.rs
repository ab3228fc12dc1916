//! Dashboard statistics derived from a set of case records.
//!
//! Everything here is a pure function of the records (and, for the monthly
//! count, of the supplied "now").

mod history;

pub use history::*;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AsaGrade, CaseRecord, ANESTHESIA_TECHNIQUES};

/// Shown for "most common" figures when there are no records.
pub const NOT_AVAILABLE: &str = "N/A";

/// One bar/slice of a chart series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistributionEntry {
    pub name: String,
    pub value: u32,
}

impl DistributionEntry {
    fn new(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_cases: u32,
    /// Cases created since the first day of the current month
    pub monthly_case_count: u32,
    /// e.g. "ASA II", or "N/A"
    pub most_common_asa_grade: String,
    pub most_common_technique: String,
    /// Always one entry per ASA grade, in grade order
    pub asa_grade_distribution: Vec<DistributionEntry>,
    /// One entry per reference technique. Custom techniques are not counted here.
    pub technique_distribution: Vec<DistributionEntry>,
}

impl DashboardStats {
    /// Compute statistics against the local wall clock.
    pub fn compute_now(records: &[CaseRecord]) -> Self {
        Self::compute(records, &Local::now())
    }

    /// Compute statistics with an explicit "now" for the monthly cutoff.
    pub fn compute<Tz: TimeZone>(records: &[CaseRecord], now: &DateTime<Tz>) -> Self {
        let cutoff = month_start(now);

        let monthly_case_count = records
            .iter()
            .filter(|record| record.created_at >= cutoff)
            .count();

        let asa_counts = asa_counts(records);
        let technique_counts = technique_counts(records);

        let most_common_asa_grade = if records.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            most_common(AsaGrade::ALL.iter().zip(asa_counts.iter().copied()))
                .map(|grade| grade.label())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        let most_common_technique = most_common(
            technique_counts
                .iter()
                .map(|(technique, count)| (technique, *count)),
        )
        .map(|technique| technique.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let asa_grade_distribution = AsaGrade::ALL
            .iter()
            .zip(asa_counts)
            .map(|(grade, count)| DistributionEntry::new(grade.label(), count))
            .collect();

        let technique_distribution = ANESTHESIA_TECHNIQUES
            .iter()
            .map(|reference| {
                let count = technique_counts
                    .iter()
                    .find(|(technique, _)| technique == reference)
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                DistributionEntry::new(*reference, count)
            })
            .collect();

        Self {
            total_cases: saturating_u32(records.len()),
            monthly_case_count: saturating_u32(monthly_case_count),
            most_common_asa_grade,
            most_common_technique,
            asa_grade_distribution,
            technique_distribution,
        }
    }
}

/// How far past midnight to look for a valid local time, in 15-minute steps.
const MAX_GAP_STEPS: i64 = 4 * 24;

/// First instant of the calendar month containing `now`, in `now`'s time zone.
///
/// When local midnight on the 1st is skipped by a DST transition, the first
/// valid local time after it is used.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first_day = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let midnight = first_day.and_time(chrono::NaiveTime::MIN);
    let tz = now.timezone();

    (0..=MAX_GAP_STEPS)
        .map(|step| midnight + Duration::minutes(15 * step))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| {
            let offset = i64::from(now.offset().fix().local_minus_utc());
            (midnight - Duration::seconds(offset)).and_utc()
        })
}

/// Per-grade counts in [`AsaGrade::ALL`] order.
fn asa_counts(records: &[CaseRecord]) -> [u32; 5] {
    let mut counts = [0u32; 5];
    for record in records {
        if let Some(idx) = AsaGrade::ALL
            .iter()
            .position(|grade| *grade == record.details.asa_grade)
        {
            counts[idx] = counts[idx].saturating_add(1);
        }
    }
    counts
}

/// Technique counts in first-encountered order, custom techniques included.
fn technique_counts(records: &[CaseRecord]) -> Vec<(String, u32)> {
    let mut counts: Vec<(String, u32)> = Vec::new();
    for record in records {
        let technique = record.details.anesthesia_technique.trim();
        match counts.iter_mut().find(|(t, _)| t == technique) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => counts.push((technique.to_string(), 1)),
        }
    }
    counts
}

/// Highest count wins; on a tie the earliest item wins.
fn most_common<T>(items: impl IntoIterator<Item = (T, u32)>) -> Option<T> {
    let mut best: Option<(T, u32)> = None;
    for (item, count) in items {
        if best.as_ref().map_or(true, |(_, top)| count > *top) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{ga_case, spinal_case};
    use chrono::{Duration, FixedOffset};

    fn record(asa: AsaGrade, technique: &str) -> CaseRecord {
        let mut details = ga_case();
        details.asa_grade = asa;
        details.anesthesia_technique = technique.into();
        CaseRecord::new("user-1".into(), details)
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input() {
        let stats = DashboardStats::compute(&[], &fixed_now());
        assert_eq!(stats.total_cases, 0);
        assert_eq!(stats.monthly_case_count, 0);
        assert_eq!(stats.most_common_asa_grade, NOT_AVAILABLE);
        assert_eq!(stats.most_common_technique, NOT_AVAILABLE);
        assert_eq!(stats.asa_grade_distribution.len(), 5);
        assert!(stats.asa_grade_distribution.iter().all(|e| e.value == 0));
        assert_eq!(stats.technique_distribution.len(), ANESTHESIA_TECHNIQUES.len());
    }

    #[test]
    fn test_asa_example() {
        let records = vec![
            record(AsaGrade::I, "GA"),
            record(AsaGrade::I, "GA"),
            record(AsaGrade::III, "Spinal"),
        ];
        let stats = DashboardStats::compute(&records, &fixed_now());

        assert_eq!(stats.most_common_asa_grade, "ASA I");
        let values: Vec<(&str, u32)> = stats
            .asa_grade_distribution
            .iter()
            .map(|e| (e.name.as_str(), e.value))
            .collect();
        assert_eq!(
            values,
            vec![("ASA I", 2), ("ASA II", 0), ("ASA III", 1), ("ASA IV", 0), ("ASA V", 0)]
        );
    }

    #[test]
    fn test_asa_tie_prefers_lower_grade() {
        let records = vec![record(AsaGrade::IV, "GA"), record(AsaGrade::II, "GA")];
        let stats = DashboardStats::compute(&records, &fixed_now());
        assert_eq!(stats.most_common_asa_grade, "ASA II");
    }

    #[test]
    fn test_technique_tie_prefers_first_encountered() {
        let records = vec![
            record(AsaGrade::I, "Epidural"),
            record(AsaGrade::I, "GA"),
            record(AsaGrade::I, "GA"),
            record(AsaGrade::I, "Epidural"),
        ];
        let stats = DashboardStats::compute(&records, &fixed_now());
        assert_eq!(stats.most_common_technique, "Epidural");
    }

    #[test]
    fn test_custom_techniques_excluded_from_distribution() {
        let records = vec![
            record(AsaGrade::II, "TIVA"),
            record(AsaGrade::II, "TIVA"),
            record(AsaGrade::II, "GA"),
        ];
        let stats = DashboardStats::compute(&records, &fixed_now());

        // Counted for "most common"...
        assert_eq!(stats.most_common_technique, "TIVA");
        // ...but absent from the reference distribution
        assert!(stats.technique_distribution.iter().all(|e| e.name != "TIVA"));
        let charted: u32 = stats.technique_distribution.iter().map(|e| e.value).sum();
        assert_eq!(charted, 1);
    }

    #[test]
    fn test_monthly_count_uses_month_start() {
        let now = fixed_now();
        let mut this_month = record(AsaGrade::I, "GA");
        this_month.created_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut last_month = record(AsaGrade::I, "GA");
        last_month.created_at = this_month.created_at - Duration::seconds(1);

        let stats = DashboardStats::compute(&[this_month, last_month], &now);
        assert_eq!(stats.total_cases, 2);
        assert_eq!(stats.monthly_case_count, 1);
    }

    #[test]
    fn test_month_start_respects_time_zone() {
        // 2024-07-01 02:00 at UTC+05:00 is still June 30 in UTC
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 7, 1, 2, 0, 0).unwrap();
        assert_eq!(
            month_start(&now),
            Utc.with_ymd_and_hms(2024, 6, 30, 19, 0, 0).unwrap()
        );
    }

    /// UTC-3 until local midnight on 2024-09-01, then UTC-2 with
    /// 00:00-01:00 skipped.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch_local() -> chrono::NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 9, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> chrono::LocalResult<FixedOffset> {
            let midnight = local.and_hms_opt(0, 0, 0).unwrap();
            self.offset_from_local_datetime(&midnight)
        }

        fn offset_from_local_datetime(
            &self,
            local: &chrono::NaiveDateTime,
        ) -> chrono::LocalResult<FixedOffset> {
            let switch = Self::switch_local();
            if *local < switch {
                chrono::LocalResult::Single(Self::before())
            } else if *local < switch + Duration::hours(1) {
                chrono::LocalResult::None
            } else {
                chrono::LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &chrono::NaiveDateTime) -> FixedOffset {
            // 2024-09-01 00:00 at UTC-3
            if *utc < Self::switch_local() + Duration::hours(3) {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_month_start_skipped_midnight() {
        let now = MidnightGap.with_ymd_and_hms(2024, 9, 15, 12, 0, 0).unwrap();
        // First valid local time is 01:00 at UTC-2
        assert_eq!(
            month_start(&now),
            Utc.with_ymd_and_hms(2024, 9, 1, 3, 0, 0).unwrap()
        );

        let mut case = record(AsaGrade::I, "GA");
        case.created_at = Utc.with_ymd_and_hms(2024, 9, 1, 2, 30, 0).unwrap();
        let stats = DashboardStats::compute(&[case], &now);
        assert_eq!(stats.monthly_case_count, 0);
    }

    #[test]
    fn test_regional_record_counts() {
        let records = vec![
            CaseRecord::new("user-1".into(), spinal_case()),
            CaseRecord::new("user-1".into(), ga_case()),
        ];
        let stats = DashboardStats::compute(&records, &fixed_now());
        let spinal = stats
            .technique_distribution
            .iter()
            .find(|e| e.name == "Spinal")
            .unwrap();
        assert_eq!(spinal.value, 1);
    }
}
