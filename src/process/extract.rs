use csv::{ReaderBuilder, StringRecord};
use tracing::{trace, warn};

use super::{
    date_parser::parse_index_token,
    table::{Cell, Columns, ParsedTable, TableIndex},
    utils::{clean_str, dedupe_labels, parse_cell},
};
use crate::error::{ParseError, TableParseError};

/// Split a table block into its title line and CSV body, then read the body
/// with `header_depth` header rows (1 or 2). The first column is the index.
///
/// Leading line breaks are skipped, so the title is the first non-empty line
/// rather than whatever precedes the block's first newline. A block with no
/// newline at all (a long one-line note) yields an empty 0x0 table titled
/// with the whole block.
///
/// The returned index is always keyed by dates; see
/// [`super::frequency::try_normalize_frequency`] for the annual collapse.
pub fn extract_table(block: &str, header_depth: usize) -> Result<ParsedTable, ParseError> {
    let block = block.trim_start_matches(['\r', '\n']);
    let Some(title_end) = block.find('\n') else {
        let title = block.trim().to_string();
        warn!(len = title.len(), "table block has no body, keeping it empty");
        return Ok(ParsedTable {
            title,
            columns: Columns::Single(Vec::new()),
            index: TableIndex::Dates {
                name: None,
                values: Vec::new(),
            },
            rows: Vec::new(),
        });
    };
    let title = block[..title_end].trim().to_string();
    let body = &block[title_end + 1..];

    let (columns, index, rows) =
        parse_body(body, header_depth).map_err(|kind| ParseError::Table {
            title: title.clone(),
            kind,
        })?;
    trace!(title = %title, rows = rows.len(), cols = columns.len(), "extracted table");

    Ok(ParsedTable {
        title,
        columns,
        index,
        rows,
    })
}

type Body = (Columns, TableIndex, Vec<Vec<Cell>>);

fn parse_body(body: &str, header_depth: usize) -> Result<Body, TableParseError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut headers: Vec<StringRecord> = Vec::with_capacity(header_depth);
    let mut index = Vec::new();
    let mut rows = Vec::new();
    let mut width = 0;

    for result in rdr.records() {
        let record = result?;
        // whitespace-only line; `,,` is a row of missing values
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if headers.len() < header_depth {
            width = width.max(record.len());
            headers.push(record);
            continue;
        }
        if record.len() > width {
            return Err(TableParseError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: width,
                found: record.len(),
            });
        }
        index.push(parse_index_token(record.get(0).unwrap_or_default()));
        let mut cells: Vec<Cell> = record.iter().skip(1).map(parse_cell).collect();
        cells.resize(width.saturating_sub(1), Cell::Missing);
        rows.push(cells);
    }

    if headers.len() < header_depth {
        return Err(TableParseError::MissingHeader {
            expected: header_depth,
            found: headers.len(),
        });
    }

    let (index_name, columns) = if header_depth >= 2 {
        two_level_header(&headers[0], &headers[1], width)
    } else {
        single_header(&headers[0], width)
    };

    Ok((
        columns,
        TableIndex::Dates {
            name: index_name,
            values: index,
        },
        rows,
    ))
}

fn header_cell(record: &StringRecord, pos: usize) -> String {
    record.get(pos).map(clean_str).unwrap_or_default()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

fn single_header(record: &StringRecord, width: usize) -> (Option<String>, Columns) {
    let names = (1..width)
        .map(|pos| {
            let name = header_cell(record, pos);
            if name.is_empty() {
                format!("Unnamed: {}", pos)
            } else {
                name
            }
        })
        .collect();
    (
        non_empty(header_cell(record, 0)),
        Columns::Single(dedupe_labels(names)),
    )
}

fn two_level_header(
    outer: &StringRecord,
    inner: &StringRecord,
    width: usize,
) -> (Option<String>, Columns) {
    let label = |record: &StringRecord, pos: usize, level: usize| {
        let name = header_cell(record, pos);
        if name.is_empty() {
            format!("Unnamed: {}_level_{}", pos, level)
        } else {
            name
        }
    };
    let outers: Vec<String> = (1..width).map(|pos| label(outer, pos, 0)).collect();
    let inners: Vec<String> = (1..width).map(|pos| label(inner, pos, 1)).collect();

    // a repeat is only a clash when both levels match
    let mut pairs: Vec<(String, String)> = Vec::with_capacity(outers.len());
    for (o, i) in outers.into_iter().zip(inners) {
        let mut candidate = i.clone();
        let mut n = 0;
        while pairs.iter().any(|(po, pi)| *po == o && *pi == candidate) {
            n += 1;
            candidate = format!("{}.{}", i, n);
        }
        pairs.push((o, candidate));
    }

    let index_name = non_empty(header_cell(outer, 0)).or_else(|| non_empty(header_cell(inner, 0)));
    (index_name, Columns::TwoLevel(pairs))
}
