use serde::Serialize;
use utoipa::ToSchema;

use crate::descriptor::FeatureVector;
use crate::distance::Metric;
use crate::error::DimensionMismatch;
use crate::ranker;

/// 一个已登记的身份
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub identity: String,
    pub vector: FeatureVector,
}

/// 已登记的人脸向量，每个身份至多一条
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

/// 识别成功时返回的身份和距离
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Identified {
    pub identity: String,
    pub distance: f64,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由数据库中读出的记录创建，重复的身份以后出现的为准
    pub fn from_entries(entries: impl IntoIterator<Item = GalleryEntry>) -> Self {
        let mut gallery = Self::new();
        for entry in entries {
            gallery.enroll(entry.identity, entry.vector);
        }
        gallery
    }

    /// 登记一个身份，已存在时替换原来的向量并保持其位置
    pub fn enroll(&mut self, identity: impl Into<String>, vector: FeatureVector) {
        let identity = identity.into();
        match self.entries.iter_mut().find(|e| e.identity == identity) {
            Some(entry) => entry.vector = vector,
            None => self.entries.push(GalleryEntry { identity, vector }),
        }
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 1:N 识别：找到欧氏距离最近的身份，距离严格小于 `threshold` 时才算匹配
///
/// 距离相同时取先登记的身份。没有匹配不是错误，返回 `None`。本函数不记录任何指标
pub fn identify(
    gallery: &Gallery,
    query: &[f64],
    threshold: f64,
) -> Result<Option<Identified>, DimensionMismatch> {
    let candidates = gallery.entries.iter().map(|e| e.vector.as_slice());
    let best = ranker::nearest(query, candidates, Metric::Euclidean, 1)?
        .into_iter()
        .next()
        .filter(|&(_, distance)| distance < threshold)
        .map(|(i, distance)| Identified {
            identity: gallery.entries[i].identity.clone(),
            distance,
        });
    Ok(best)
}
