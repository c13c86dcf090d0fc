// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The (term, session) pair does not decode to a known period.
    #[error("unknown term-session: {term}-{session}")]
    InvalidTermCode { term: String, session: String },

    #[error("invalid term code at data row {row}: {source}")]
    InvalidTermCodeAt {
        row: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("no header row starting with `{0}` found")]
    MissingHeader(String),

    #[error("required column `{0}` missing from header")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_term(term: &str, session: &str) -> Self {
        Error::InvalidTermCode {
            term: term.to_string(),
            session: session.to_string(),
        }
    }

    /// True for both the bare and the row-annotated invalid term code.
    pub fn is_invalid_term_code(&self) -> bool {
        match self {
            Error::InvalidTermCode { .. } => true,
            Error::InvalidTermCodeAt { source, .. } => source.is_invalid_term_code(),
            _ => false,
        }
    }
}
