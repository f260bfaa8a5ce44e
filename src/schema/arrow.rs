// src/schema/arrow.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, Int32Array, StringArray, TimestampMicrosecondArray},
    datatypes::{DataType, Field as ArrowField, Schema as ArrowSchema, TimeUnit},
    record_batch::RecordBatch,
};
use std::{collections::HashMap, sync::Arc};

use crate::process::table::{Cell, Columns, ParsedTable, TableIndex};

const DEFAULT_INDEX_NAME: &str = "index";

/// Column type of a data column:
/// - all cells numeric or missing → Float64
/// - anything textual             → Utf8
pub fn infer_column_type<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> DataType {
    let textual = cells.into_iter().any(|c| matches!(c, Cell::Text(_)));
    if textual {
        DataType::Utf8
    } else {
        DataType::Float64
    }
}

fn index_field(index: &TableIndex) -> ArrowField {
    let name = index.name().unwrap_or(DEFAULT_INDEX_NAME);
    match index {
        TableIndex::Dates { .. } => {
            ArrowField::new(name, DataType::Timestamp(TimeUnit::Microsecond, None), true)
        }
        TableIndex::AnnualPeriods { .. } => ArrowField::new(name, DataType::Int32, false)
            .with_metadata(HashMap::from([("period".to_string(), "annual".to_string())])),
    }
}

fn column_field(columns: &Columns, i: usize, ty: DataType) -> ArrowField {
    let name = columns.flat_name(i).unwrap_or_default();
    match columns {
        Columns::Single(_) => ArrowField::new(name, ty, true),
        Columns::TwoLevel(pairs) => {
            let (outer, inner) = &pairs[i];
            ArrowField::new(name, ty, true).with_metadata(HashMap::from([
                ("level_0".to_string(), outer.clone()),
                ("level_1".to_string(), inner.clone()),
            ]))
        }
    }
}

/// Build the ArrowSchema (inside an Arc) for a parsed table: the index
/// column first, then one field per data column.
pub fn build_arrow_schema(table: &ParsedTable) -> Arc<ArrowSchema> {
    let mut fields = Vec::with_capacity(table.columns.len() + 1);
    fields.push(index_field(&table.index));
    for i in 0..table.columns.len() {
        let ty = infer_column_type(table.rows.iter().map(|r| &r[i]));
        fields.push(column_field(&table.columns, i, ty));
    }
    Arc::new(ArrowSchema::new(fields))
}

fn index_array(index: &TableIndex) -> ArrayRef {
    match index {
        TableIndex::Dates { values, .. } => Arc::new(TimestampMicrosecondArray::from(
            values
                .iter()
                .map(|ts| ts.resolved().map(|dt| dt.and_utc().timestamp_micros()))
                .collect::<Vec<_>>(),
        )),
        TableIndex::AnnualPeriods { years, .. } => Arc::new(Int32Array::from(years.clone())),
    }
}

fn column_array(table: &ParsedTable, i: usize, ty: &DataType) -> ArrayRef {
    let cells = table.rows.iter().map(|r| &r[i]);
    match ty {
        DataType::Float64 => Arc::new(cells.map(Cell::as_f64).collect::<Float64Array>()),
        _ => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Number(v) => Some(v.to_string()),
                    Cell::Text(s) => Some(s.clone()),
                    Cell::Missing => None,
                })
                .collect::<StringArray>(),
        ),
    }
}

/// Convert a parsed table into a single RecordBatch.
pub fn to_record_batch(table: &ParsedTable) -> Result<RecordBatch> {
    let schema = build_arrow_schema(table);
    let mut columns = Vec::with_capacity(schema.fields().len());
    columns.push(index_array(&table.index));
    for (i, field) in schema.fields().iter().skip(1).enumerate() {
        columns.push(column_array(table, i, field.data_type()));
    }
    RecordBatch::try_new(schema, columns)
        .with_context(|| format!("building record batch for `{}`", table.title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ParseOptions, process::parse};
    use arrow::array::Array;

    #[test]
    fn annual_table_to_batch() -> Result<()> {
        let raw = "Annual\nYear,Mkt,Note\n2019,1.5,\n2020,,ok\n2021,3.0,\n";
        let ds = parse("x", raw, &ParseOptions::default())?;
        let batch = to_record_batch(ds.get(0).expect("table"))?;

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 3);
        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), "Year");
        assert_eq!(schema.field(0).data_type(), &DataType::Int32);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);

        let mkt = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("float column");
        assert_eq!(mkt.value(0), 1.5);
        assert!(mkt.is_null(1));
        Ok(())
    }

    #[test]
    fn unresolved_dates_become_nulls() -> Result<()> {
        let raw = "Monthly\nDate,X\n2020-01-01,1\nAverage,2\n";
        let ds = parse("x", raw, &ParseOptions::default())?;
        let batch = to_record_batch(ds.get(0).expect("table"))?;

        let idx = batch
            .column(0)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .expect("timestamp index");
        assert!(!idx.is_null(0));
        assert!(idx.is_null(1));
        Ok(())
    }

    #[test]
    fn two_level_names_are_joined_with_metadata() -> Result<()> {
        let raw = "BP\n,Size,Size\nDate,P20,P40\n2020,1,2\n2021,3,4\n";
        let ds = parse("ME_breakpoints", raw, &ParseOptions::default())?;
        let schema = build_arrow_schema(ds.get(0).expect("table"));

        assert_eq!(schema.field(1).name(), "Size/P20");
        assert_eq!(
            schema.field(2).metadata().get("level_1").map(String::as_str),
            Some("P40")
        );
        Ok(())
    }
}
