use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::SigDBBuilder;
use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::{Opts, SearchOptions};
use crate::ranker::QueryHit;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: PathBuf,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let image = tokio::fs::read(&self.image).await?;

        let db = SigDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let result = db
            .search(&image, self.search.family, self.search.metric, self.search.count)
            .await?;

        print_result(&result, self.output_format)
    }
}

fn print_result(result: &[QueryHit], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for hit in result {
                println!("{:.4}\t{}\t{}", hit.distance, hit.label, hit.id);
            }
        }
    }
    Ok(())
}
