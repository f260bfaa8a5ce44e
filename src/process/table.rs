use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

/// Row key of a freshly parsed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Timestamp {
    Resolved(NaiveDateTime),
    /// The index token matched none of the accepted date shapes.
    Unresolved,
}

impl Timestamp {
    pub fn resolved(&self) -> Option<NaiveDateTime> {
        match self {
            Timestamp::Resolved(dt) => Some(*dt),
            Timestamp::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Timestamp::Resolved(_))
    }
}

/// The row index of a table. Either every row is keyed by a point in time or
/// every row is keyed by a calendar year, never a mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableIndex {
    Dates {
        name: Option<String>,
        values: Vec<Timestamp>,
    },
    AnnualPeriods {
        name: Option<String>,
        years: Vec<i32>,
    },
}

impl TableIndex {
    pub fn name(&self) -> Option<&str> {
        match self {
            TableIndex::Dates { name, .. } | TableIndex::AnnualPeriods { name, .. } => {
                name.as_deref()
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TableIndex::Dates { values, .. } => values.len(),
            TableIndex::AnnualPeriods { years, .. } => years.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the key of row `row` the way it is shown to users: `YYYY` for
    /// periods, `YYYY-MM-DD` (plus time when set) for dates.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            TableIndex::Dates { values, .. } => values.get(row).map(|ts| match ts {
                Timestamp::Resolved(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    dt.date().format("%Y-%m-%d").to_string()
                }
                Timestamp::Resolved(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
                Timestamp::Unresolved => "NaT".to_string(),
            }),
            TableIndex::AnnualPeriods { years, .. } => years.get(row).map(|y| y.to_string()),
        }
    }

    /// Calendar year of every row, `None` for unresolved rows.
    pub fn years(&self) -> Vec<Option<i32>> {
        match self {
            TableIndex::Dates { values, .. } => values
                .iter()
                .map(|ts| ts.resolved().map(|dt| dt.year()))
                .collect(),
            TableIndex::AnnualPeriods { years, .. } => years.iter().copied().map(Some).collect(),
        }
    }
}

/// Column labels of a table, excluding the index column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Columns {
    Single(Vec<String>),
    /// `(outer, inner)` pairs, as used by breakpoints exports.
    TwoLevel(Vec<(String, String)>),
}

impl Columns {
    pub fn len(&self) -> usize {
        match self {
            Columns::Single(names) => names.len(),
            Columns::TwoLevel(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn depth(&self) -> usize {
        match self {
            Columns::Single(_) => 1,
            Columns::TwoLevel(_) => 2,
        }
    }

    /// Flat label for column `i`; two-level labels are joined with `/`.
    pub fn flat_name(&self, i: usize) -> Option<String> {
        match self {
            Columns::Single(names) => names.get(i).cloned(),
            Columns::TwoLevel(pairs) => pairs.get(i).map(|(o, n)| format!("{}/{}", o, n)),
        }
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        (0..self.len()).find(|&i| {
            self.flat_name(i).as_deref() == Some(label)
                || matches!(self, Columns::TwoLevel(p) if p[i].1 == label)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// One titled table block of an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTable {
    pub title: String,
    pub columns: Columns,
    pub index: TableIndex,
    /// Row-major cells; every row has exactly `columns.len()` entries.
    pub rows: Vec<Vec<Cell>>,
}

impl ParsedTable {
    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn descriptor(&self) -> String {
        let (rows, cols) = self.shape();
        format!("{} ({} rows x {} cols)", self.title, rows, cols)
            .trim()
            .to_string()
    }

    pub fn column(&self, label: &str) -> Option<Vec<&Cell>> {
        let pos = self.columns.position(label)?;
        Some(self.rows.iter().map(|r| &r[pos]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn midnight(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::Resolved(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn descriptor_reports_shape() {
        let table = ParsedTable {
            title: "Annual Factors".into(),
            columns: Columns::Single(vec!["MF".into(), "SMB".into()]),
            index: TableIndex::AnnualPeriods {
                name: Some("Date".into()),
                years: vec![2019, 2020, 2021],
            },
            rows: vec![vec![Cell::Number(1.0), Cell::Missing]; 3],
        };
        assert_eq!(table.descriptor(), "Annual Factors (3 rows x 2 cols)");
        assert_eq!(table.shape(), (3, 2));
    }

    #[test]
    fn labels_render_dates_and_periods() {
        let dates = TableIndex::Dates {
            name: None,
            values: vec![midnight(2020, 3, 15), Timestamp::Unresolved],
        };
        assert_eq!(dates.label(0).as_deref(), Some("2020-03-15"));
        assert_eq!(dates.label(1).as_deref(), Some("NaT"));
        assert_eq!(dates.years(), vec![Some(2020), None]);

        let periods = TableIndex::AnnualPeriods {
            name: None,
            years: vec![2019],
        };
        assert_eq!(periods.label(0).as_deref(), Some("2019"));
    }

    #[test]
    fn two_level_columns_lookup_by_inner_or_joined_label() {
        let cols = Columns::TwoLevel(vec![
            ("Size".into(), "P20".into()),
            ("Size".into(), "P40".into()),
        ]);
        assert_eq!(cols.depth(), 2);
        assert_eq!(cols.flat_name(1).as_deref(), Some("Size/P40"));
        assert_eq!(cols.position("Size/P20"), Some(0));
        assert_eq!(cols.position("P40"), Some(1));
        assert_eq!(cols.position("P60"), None);
    }
}
