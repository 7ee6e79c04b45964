use std::path::PathBuf;

use clap::Parser;

use crate::SigDBBuilder;
use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::{DEFAULT_THRESHOLD, Opts};

#[derive(Parser, Debug, Clone)]
pub struct IdentifyCommand {
    /// 人脸图片路径
    pub image: PathBuf,
    /// 距离严格小于该值才视为同一人
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for IdentifyCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let image = tokio::fs::read(&self.image).await?;

        let db = SigDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let found = db.authenticate_face(&image, self.threshold).await?;

        match (self.output_format, found) {
            (OutputFormat::Json, found) => println!("{}", serde_json::to_string_pretty(&found)?),
            (OutputFormat::Table, Some(found)) => {
                println!("{}\t{:.4}", found.identity, found.distance)
            }
            (OutputFormat::Table, None) => println!("没有匹配的身份"),
        }
        Ok(())
    }
}
