use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;

use crate::SigDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct EnrollCommand {
    /// 身份，例如用户名
    pub identity: String,
    /// 人脸图片路径
    #[arg(required_unless_present = "remove")]
    pub image: Option<PathBuf>,
    /// 删除该身份，而不是登记
    #[arg(long, conflicts_with = "image")]
    pub remove: bool,
}

impl SubCommandExtend for EnrollCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let db = SigDBBuilder::new(opts.conf_dir.clone()).open().await?;

        if self.remove {
            if !db.remove_face(&self.identity).await? {
                return Err(anyhow!("身份不存在: {}", self.identity));
            }
            println!("已删除: {}", self.identity);
            return Ok(());
        }

        let path = self.image.as_ref().ok_or_else(|| anyhow!("缺少人脸图片"))?;
        let image = tokio::fs::read(path).await?;
        db.enroll_face(&self.identity, &image).await?;
        println!("已登记: {}", self.identity);
        Ok(())
    }
}
