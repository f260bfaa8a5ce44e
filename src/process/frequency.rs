//! Frequency inference over a parsed date index and the annual collapse.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use tracing::debug;

use super::table::{ParsedTable, TableIndex, Timestamp};

/// Step between consecutive index entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily(u32),
    Weekly(u32),
    Monthly(u32),
    Quarterly(u32),
    Annual(u32),
}

impl Frequency {
    /// True only for a plain one-year step.
    pub fn is_annual(&self) -> bool {
        matches!(self, Frequency::Annual(1))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrequencyError {
    #[error("index is already keyed by periods")]
    AlreadyPeriods,
    #[error("row {0} has no resolved date")]
    UnresolvedRow(usize),
}

/// Infer a single regular frequency, if there is one.
///
/// Needs three or more resolved, strictly increasing midnight timestamps.
/// Monthly-or-coarser steps must stay anchored on the same month boundary
/// (first day, or last day of month) throughout.
pub fn infer_frequency(values: &[Timestamp]) -> Option<Frequency> {
    if values.len() < 3 {
        return None;
    }
    let dates = values
        .iter()
        .map(|ts| ts.resolved())
        .collect::<Option<Vec<NaiveDateTime>>>()?;
    if dates.iter().any(|dt| dt.time() != NaiveTime::MIN) {
        return None;
    }
    if dates.windows(2).any(|w| w[0] >= w[1]) {
        return None;
    }
    let days: Vec<NaiveDate> = dates.iter().map(|dt| dt.date()).collect();

    if let Some(step) = month_step(&days) {
        let same_month_of_year = days.iter().all(|d| d.month() == days[0].month());
        return Some(if step % 12 == 0 && same_month_of_year {
            Frequency::Annual(step / 12)
        } else if step % 3 == 0 {
            Frequency::Quarterly(step / 3)
        } else {
            Frequency::Monthly(step)
        });
    }

    let step = uniform_step(days.windows(2).map(|w| (w[1] - w[0]).num_days()))?;
    let step = u32::try_from(step).ok()?;
    Some(if step % 7 == 0 {
        Frequency::Weekly(step / 7)
    } else {
        Frequency::Daily(step)
    })
}

fn month_step(days: &[NaiveDate]) -> Option<u32> {
    let anchored = days.iter().all(|d| d.day() == 1) || days.iter().all(|d| is_month_end(*d));
    if !anchored {
        return None;
    }
    let ordinal = |d: &NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
    let step = uniform_step(days.windows(2).map(|w| ordinal(&w[1]) - ordinal(&w[0])))?;
    u32::try_from(step).ok()
}

fn uniform_step(mut deltas: impl Iterator<Item = i64>) -> Option<i64> {
    let first = deltas.next()?;
    (first > 0 && deltas.all(|d| d == first)).then_some(first)
}

fn is_month_end(d: NaiveDate) -> bool {
    d.succ_opt().map_or(true, |next| next.month() != d.month())
}

/// Re-key a date index by calendar year.
pub fn to_annual_periods(index: &TableIndex) -> Result<TableIndex, FrequencyError> {
    match index {
        TableIndex::AnnualPeriods { .. } => Err(FrequencyError::AlreadyPeriods),
        TableIndex::Dates { name, values } => {
            let years = values
                .iter()
                .enumerate()
                .map(|(row, ts)| {
                    ts.resolved()
                        .map(|dt| dt.year())
                        .ok_or(FrequencyError::UnresolvedRow(row))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TableIndex::AnnualPeriods {
                name: name.clone(),
                years,
            })
        }
    }
}

/// Collapse the index to annual periods when it is confidently annual.
/// Any other outcome hands the table back as it came in.
pub fn try_normalize_frequency(table: ParsedTable) -> ParsedTable {
    let TableIndex::Dates { values, .. } = &table.index else {
        return table;
    };
    let Some(freq) = infer_frequency(values) else {
        debug!(title = %table.title, "no frequency inferred, keeping dates");
        return table;
    };
    if !freq.is_annual() {
        debug!(title = %table.title, ?freq, "not annual, keeping dates");
        return table;
    }
    match to_annual_periods(&table.index) {
        Ok(index) => ParsedTable { index, ..table },
        Err(e) => {
            debug!(title = %table.title, "period conversion failed: {}", e);
            table
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::table::{Cell, Columns};

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::Resolved(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN))
    }

    fn table(values: Vec<Timestamp>) -> ParsedTable {
        let n = values.len();
        ParsedTable {
            title: "t".into(),
            columns: Columns::Single(vec!["X".into()]),
            index: TableIndex::Dates {
                name: Some("Date".into()),
                values,
            },
            rows: vec![vec![Cell::Number(0.0)]; n],
        }
    }

    #[test]
    fn annual_year_starts() {
        let v = [at(2019, 1, 1), at(2020, 1, 1), at(2021, 1, 1)];
        assert_eq!(infer_frequency(&v), Some(Frequency::Annual(1)));
    }

    #[test]
    fn annual_year_ends_and_mid_year_anchors() {
        let ends = [at(2019, 12, 31), at(2020, 12, 31), at(2021, 12, 31)];
        assert_eq!(infer_frequency(&ends), Some(Frequency::Annual(1)));
        let july = [at(2019, 7, 1), at(2020, 7, 1), at(2021, 7, 1)];
        assert_eq!(infer_frequency(&july), Some(Frequency::Annual(1)));
    }

    #[test]
    fn other_regular_steps() {
        let monthly = [at(2020, 1, 1), at(2020, 2, 1), at(2020, 3, 1)];
        assert_eq!(infer_frequency(&monthly), Some(Frequency::Monthly(1)));
        let month_ends = [at(2020, 1, 31), at(2020, 2, 29), at(2020, 3, 31)];
        assert_eq!(infer_frequency(&month_ends), Some(Frequency::Monthly(1)));
        let quarterly = [at(2020, 1, 1), at(2020, 4, 1), at(2020, 7, 1)];
        assert_eq!(infer_frequency(&quarterly), Some(Frequency::Quarterly(1)));
        let daily = [at(2020, 1, 6), at(2020, 1, 7), at(2020, 1, 8)];
        assert_eq!(infer_frequency(&daily), Some(Frequency::Daily(1)));
        let weekly = [at(2020, 1, 6), at(2020, 1, 13), at(2020, 1, 20)];
        assert_eq!(infer_frequency(&weekly), Some(Frequency::Weekly(1)));
        let biennial = [at(2018, 1, 1), at(2020, 1, 1), at(2022, 1, 1)];
        assert_eq!(infer_frequency(&biennial), Some(Frequency::Annual(2)));
    }

    #[test]
    fn nothing_inferred_for_irregular_short_or_unresolved() {
        let irregular = [at(2019, 1, 1), at(2019, 6, 1), at(2021, 1, 1)];
        assert_eq!(infer_frequency(&irregular), None);
        assert_eq!(infer_frequency(&[at(2020, 1, 1), at(2021, 1, 1)]), None);
        let gap = [at(2019, 1, 1), Timestamp::Unresolved, at(2021, 1, 1)];
        assert_eq!(infer_frequency(&gap), None);
        let descending = [at(2021, 1, 1), at(2020, 1, 1), at(2019, 1, 1)];
        assert_eq!(infer_frequency(&descending), None);
    }

    #[test]
    fn annual_table_collapses_and_keeps_name() {
        let t = try_normalize_frequency(table(vec![
            at(2019, 1, 1),
            at(2020, 1, 1),
            at(2021, 1, 1),
        ]));
        assert_eq!(
            t.index,
            TableIndex::AnnualPeriods {
                name: Some("Date".into()),
                years: vec![2019, 2020, 2021],
            }
        );
    }

    #[test]
    fn irregular_table_keeps_dates() {
        let values = vec![at(2019, 1, 1), at(2019, 6, 1), at(2021, 1, 1)];
        let t = try_normalize_frequency(table(values.clone()));
        assert_eq!(
            t.index,
            TableIndex::Dates {
                name: Some("Date".into()),
                values,
            }
        );
    }

    #[test]
    fn biennial_table_keeps_dates() {
        let values = vec![at(2018, 1, 1), at(2020, 1, 1), at(2022, 1, 1)];
        let t = try_normalize_frequency(table(values));
        assert!(matches!(t.index, TableIndex::Dates { .. }));
    }

    #[test]
    fn conversion_rejects_unresolved_rows_and_periods() {
        let idx = TableIndex::Dates {
            name: None,
            values: vec![at(2019, 1, 1), Timestamp::Unresolved],
        };
        assert_eq!(to_annual_periods(&idx), Err(FrequencyError::UnresolvedRow(1)));
        let periods = TableIndex::AnnualPeriods {
            name: None,
            years: vec![2019],
        };
        assert_eq!(to_annual_periods(&periods), Err(FrequencyError::AlreadyPeriods));
    }
}
