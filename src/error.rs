use thiserror::Error;

use crate::descriptor::DescriptorFamily;

/// 特征提取失败：图片无法读取/解码，或者某个统计量无法得到数值结果
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("读取图片失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("解码图片失败: {0}")]
    Decode(#[from] image::ImageError),

    #[error("图片无法计算特征: {0}")]
    Degenerate(&'static str),
}

/// 比较了长度不同的两个向量
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("向量维度不一致: {left} != {right}")]
pub struct DimensionMismatch {
    pub left: usize,
    pub right: usize,
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatch),

    #[error("描述符 {0} 的特征库尚未构建")]
    StoreNotFound(DescriptorFamily),

    #[error("描述符 {0} 的特征库为空")]
    EmptyStore(DescriptorFamily),

    #[error("构建已取消，已处理 {0} 张图片")]
    Cancelled(usize),

    #[error("特征库文件损坏: {0}")]
    CorruptStore(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ReadNpy(#[from] ndarray_npy::ReadNpyError),

    #[error(transparent)]
    WriteNpy(#[from] ndarray_npy::WriteNpyError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
