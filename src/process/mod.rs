// src/process/mod.rs
pub mod blocks;
pub mod catalog;
pub mod date_parser;
pub mod extract;
pub mod frequency;
pub mod table;
pub mod utils;

use tracing::{debug, instrument};

use crate::{config::ParseOptions, error::ParseError};
use blocks::BlockKind;
pub use catalog::Dataset;

/// Turn one raw export into a [`Dataset`].
///
/// - Blocks are split on blank lines and classified as narrative or table.
/// - Every table block is read with a one-row header, or two rows when
///   `symbol` is a breakpoints symbol, and its index collapsed to annual
///   periods when the dates are confidently annual.
/// - Tables are numbered from 0 in document order; the description joins the
///   narrative and lists every table with its shape.
///
/// Fails on the first table whose body is not well-formed CSV.
#[instrument(level = "debug", skip(raw, opts), fields(len = raw.len()))]
pub fn parse(symbol: &str, raw: &str, opts: &ParseOptions) -> Result<Dataset, ParseError> {
    let depth = opts.header_depth(symbol);
    let mut narrative = Vec::new();
    let mut tables = Vec::new();

    for block in blocks::classify_blocks(raw, opts.narrative_max_len) {
        match block.kind {
            BlockKind::Narrative => narrative.push(block.normalized()),
            BlockKind::Table => {
                let table = extract::extract_table(block.raw, depth)?;
                tables.push(frequency::try_normalize_frequency(table));
            }
        }
    }

    debug!(
        narrative = narrative.len(),
        tables = tables.len(),
        "parsed document"
    );
    Ok(catalog::assemble(narrative, tables))
}
