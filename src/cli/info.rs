use clap::Parser;

use crate::SigDBBuilder;
use crate::cli::{OutputFormat, SubCommandExtend};
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct InfoCommand {
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for InfoCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = SigDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let stores = db.stores().await?;
        let faces = db.gallery_len().await?;

        if self.output_format == OutputFormat::Json {
            let info = serde_json::json!({ "stores": stores, "faces": faces });
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }

        println!("配置目录: {}", db.conf_dir().path().display());
        for store in &stores {
            match &store.version {
                Some(version) => println!(
                    "{:<10}{:>4} 维\t{} 条记录\t版本 {}",
                    store.family,
                    store.dim,
                    store.len,
                    &version[..12.min(version.len())]
                ),
                None => println!("{:<10}{:>4} 维\t未构建", store.family, store.dim),
            }
        }
        let missing = stores
            .iter()
            .filter(|s| !s.built)
            .map(|s| s.family.as_str())
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            println!("尚未构建的特征库: {}", missing.join(", "));
        }
        println!("已登记人脸: {}", faces);
        Ok(())
    }
}
