pub mod cli;
pub mod config;
pub mod corpus;
mod db;
pub mod descriptor;
pub mod distance;
pub mod engine;
pub mod error;
pub mod face;
pub mod matcher;
mod metrics;
pub mod ranker;
mod server;
pub mod store;
pub mod utils;

pub use config::Opts;
pub use engine::{SigDB, SigDBBuilder};
pub use error::{DimensionMismatch, ExtractionError, SearchError};
