use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use log::{info, warn};

use crate::SigDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::Opts;
use crate::corpus;
use crate::descriptor::DescriptorFamily;
use crate::utils::pb_style_speed;

#[derive(Parser, Debug, Clone)]
pub struct ExtractCommand {
    /// 图片库目录，子目录名作为图片的类别标签
    pub path: PathBuf,
    /// 需要构建的描述符，可以指定多个，不填则构建全部
    #[arg(short, long, value_enum)]
    pub family: Vec<DescriptorFamily>,
    /// 扫描的文件后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "jpg,jpeg,png,bmp,webp")]
    pub suffix: String,
    /// 提取特征使用的线程数
    #[arg(short, long, default_value_t = num_cpus::get())]
    pub threads: usize,
}

impl SubCommandExtend for ExtractCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build_global()
            .context("初始化线程池失败")?;

        let families = if self.family.is_empty() {
            DescriptorFamily::ALL.to_vec()
        } else {
            self.family.clone()
        };

        let re_suf = corpus::suffix_regex(&self.suffix).context("后缀名格式错误")?;
        let items = corpus::list_items(&self.path, &re_suf);

        let db = SigDBBuilder::new(opts.conf_dir.clone()).open().await?;

        // Ctrl-C 之后在下一张图片之前停止，已有的特征库保持不变
        let cancel = Arc::new(AtomicBool::new(false));
        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到中断信号，正在停止");
                    cancel.store(true, Ordering::Relaxed);
                }
            }
        });

        for family in families {
            let pb = ProgressBar::new(items.len() as u64).with_style(pb_style_speed());
            pb.set_message(format!("正在提取 {} 特征", family));
            let report = db.rebuild(&items, family, &pb, &cancel).await?;
            println!(
                "{}\t共 {} 张\t退化 {} 张\t跳过 {} 张",
                family, report.total, report.degraded, report.skipped
            );
        }

        info!("特征库构建完成");
        Ok(())
    }
}
