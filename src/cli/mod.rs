mod enroll;
mod extract;
mod identify;
mod info;
mod search;
pub mod server;

pub use enroll::*;
pub use extract::*;
pub use identify::*;
pub use info::*;
pub use search::*;
pub use server::*;

use clap::ValueEnum;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}
