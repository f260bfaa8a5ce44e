use thiserror::Error;

/// Why a table body could not be read.
#[derive(Debug, Error)]
pub enum TableParseError {
    #[error("body has {found} header row(s), {expected} required")]
    MissingHeader { expected: usize, found: usize },
    #[error("line {line}: expected at most {expected} fields, saw {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse table `{title}`: {kind}")]
    Table {
        title: String,
        #[source]
        kind: TableParseError,
    },
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to retrieve {url} after {attempts} attempts")]
    Exhausted { url: String, attempts: usize },
    #[error("body of {url} is not valid UTF-8")]
    Decode { url: String },
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Error returned by [`crate::FactorLibrary::read`], which both fetches and parses.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
