use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::descriptor::DescriptorFamily;
use crate::distance::Metric;

static CONF_DIR: LazyLock<String> = LazyLock::new(|| {
    ProjectDirs::from("", "sigsearch", "sigsearch")
        .map(|dirs| dirs.config_dir().to_string_lossy().into_owned())
        .unwrap_or_else(|| ".sigsearch".to_string())
});

fn default_config_dir() -> &'static str {
    CONF_DIR.as_str()
}

/// 人脸识别默认的距离阈值
pub const DEFAULT_THRESHOLD: f64 = 0.6;

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 使用的描述符
    #[arg(short, long, value_enum, default_value_t = DescriptorFamily::Concatenation)]
    pub family: DescriptorFamily,
    /// 距离度量
    #[arg(short, long, value_enum, default_value_t = Metric::Euclidean)]
    pub metric: Metric,
    /// 返回的结果数量
    #[arg(short = 'k', long, value_name = "K", default_value_t = 10)]
    pub count: usize,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "sigsearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// sigsearch 配置文件目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 提取图片库的特征，重新构建特征库
    Extract(ExtractCommand),
    /// 从特征库中搜索相似图片
    Search(SearchCommand),
    /// 登记（或更新）一个身份的人脸
    Enroll(EnrollCommand),
    /// 在已登记的人脸中识别身份
    Identify(IdentifyCommand),
    /// 查看特征库和人脸库状态
    Info(InfoCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回人脸库数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("gallery.db")
    }

    /// 返回特征库所在目录
    pub fn signatures_dir(&self) -> PathBuf {
        self.path.join("signatures")
    }

    /// 返回特征矩阵文件的路径
    pub fn signatures(&self, family: DescriptorFamily) -> PathBuf {
        self.signatures_dir().join(format!("{}.npy", family.key()))
    }

    /// 返回特征库元数据文件的路径
    pub fn signatures_meta(&self, family: DescriptorFamily) -> PathBuf {
        self.signatures_dir().join(format!("{}.json", family.key()))
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Opts::command().debug_assert();
    }

    #[test]
    fn test_paths_are_per_family() {
        let conf = ConfDir::new("/tmp/sig");
        assert_eq!(
            conf.signatures(DescriptorFamily::CoOccurrence),
            Path::new("/tmp/sig/signatures/glcm.npy")
        );
        assert_eq!(
            conf.signatures_meta(DescriptorFamily::Concatenation),
            Path::new("/tmp/sig/signatures/concat.json")
        );
        assert_ne!(
            conf.signatures(DescriptorFamily::IntensityStats),
            conf.signatures(DescriptorFamily::StatisticalTexture)
        );
    }
}
