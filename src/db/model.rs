use sqlx::FromRow;

use crate::error::SearchError;
use crate::matcher::GalleryEntry;

/// 人脸记录
#[derive(Debug, FromRow)]
pub struct FaceRecord {
    /// 身份
    pub identity: String,
    /// 人脸向量，按小端序保存的 f64
    pub encoding: Vec<u8>,
}

/// 将向量编码为数据库中保存的字节
pub fn encode_vector(vector: &[f64]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

impl TryFrom<FaceRecord> for GalleryEntry {
    type Error = SearchError;

    fn try_from(record: FaceRecord) -> Result<Self, Self::Error> {
        let chunks: &[[u8; 8]] = bytemuck::try_cast_slice(&record.encoding).map_err(|_| {
            SearchError::CorruptStore(format!(
                "身份 {} 的人脸向量长度为 {} 字节",
                record.identity,
                record.encoding.len()
            ))
        })?;
        let vector = chunks.iter().copied().map(f64::from_le_bytes).collect();
        Ok(GalleryEntry {
            identity: record.identity,
            vector,
        })
    }
}
