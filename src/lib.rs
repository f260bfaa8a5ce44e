//! Reader for the Invespar India factor library.
//!
//! An export is a plain-text document mixing prose notes with titled CSV
//! tables. [`process::parse`] splits it into typed [`ParsedTable`]s and a
//! catalog description; [`FactorLibrary`] adds the HTTP side (download with
//! retries, symbol listing). [`schema`] converts tables to Arrow and Parquet.

pub mod config;
pub mod error;
pub mod fetch;
pub mod process;
pub mod schema;

pub use config::{FetchConfig, ParseOptions};
pub use error::{Error, ParseError, RetrievalError, TableParseError};
pub use fetch::FactorLibrary;
pub use process::{
    parse,
    table::{Cell, Columns, ParsedTable, TableIndex, Timestamp},
    Dataset,
};
