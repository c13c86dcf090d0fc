pub mod aggregate;
pub mod config;
pub mod error;
pub mod files;
pub mod gened;
pub mod ingest;
pub mod sessions;
pub mod term;

pub use aggregate::{Aggregation, AggregatorOptions, ClassKey, ClassRecord, EnrollmentAggregator};
pub use config::Config;
pub use error::{Error, Result};
pub use gened::{GenEd, GenEdLookup, GenEdTable};
pub use ingest::RawEnrollmentRow;
pub use term::{resolve, TermCode};
