use std::sync::Arc;

use crate::SigDB;
use crate::cli::server::ServerCommand;
use crate::config::SearchOptions;

/// 应用状态
pub struct AppState {
    /// 特征库与人脸库
    pub db: SigDB,
    /// 默认搜索参数
    pub search: SearchOptions,
    /// 默认人脸识别阈值
    pub threshold: f64,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(db: SigDB, opts: ServerCommand) -> Arc<Self> {
        Arc::new(AppState {
            db,
            search: opts.search,
            threshold: opts.threshold,
            token: opts.token,
        })
    }
}
