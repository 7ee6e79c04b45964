use std::fs;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indicatif::ProgressBar;
use log::{info, warn};
use ndarray::Array2;
use ndarray_npy::{read_npy, write_npy};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ConfDir;
use crate::corpus::CorpusItem;
use crate::descriptor::{DescriptorFamily, FeatureVector};
use crate::distance::Metric;
use crate::error::{DimensionMismatch, Result, SearchError};
use crate::metrics;
use crate::ranker::{self, QueryResult};

/// 一张图片的特征签名，创建后不可修改
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureRecord {
    pub vector: FeatureVector,
    /// 类别标签
    pub label: String,
    /// 图片标识，用于之后取回原图
    pub id: String,
}

/// 某个描述符在某个图片库快照上的全部签名
///
/// 由一次完整的提取过程创建，之后只读，直到下一次重建整体替换
#[derive(Debug, Clone)]
pub struct SignatureStore {
    family: DescriptorFamily,
    version: String,
    records: Vec<SignatureRecord>,
}

/// 重建结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// 图片总数
    pub total: usize,
    /// 已处理的图片数量，包括失败的图片
    pub processed: usize,
    /// 无法解码、使用全 0 向量代替的图片数量
    pub degraded: usize,
    /// 无法读取而被跳过的图片数量
    pub skipped: usize,
}

/// 特征库元数据，和特征矩阵分开保存
#[derive(Serialize, Deserialize)]
struct StoreMeta {
    family: DescriptorFamily,
    version: String,
    dim: usize,
    labels: Vec<String>,
    ids: Vec<String>,
}

enum Outcome {
    Ok(SignatureRecord, blake3::Hash),
    Degraded(SignatureRecord, blake3::Hash),
    Skipped,
}

impl SignatureStore {
    /// 由已有的签名创建特征库，所有向量的长度必须等于描述符长度
    pub fn new(
        family: DescriptorFamily,
        version: impl Into<String>,
        records: Vec<SignatureRecord>,
    ) -> Result<Self> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != family.len()) {
            let mismatch = DimensionMismatch {
                left: bad.vector.len(),
                right: family.len(),
            };
            return Err(mismatch.into());
        }
        Ok(Self {
            family,
            version: version.into(),
            records,
        })
    }

    pub fn family(&self) -> DescriptorFamily {
        self.family
    }

    /// 图片库快照版本
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dim(&self) -> usize {
        self.family.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SignatureRecord] {
        &self.records
    }

    /// 搜索距离最近的 k 张图片
    pub fn rank(&self, query: &[f64], metric: Metric, k: usize) -> Result<QueryResult> {
        ranker::rank(self, query, metric, k)
    }

    /// 保存到配置目录，先写入临时文件再重命名
    pub fn save(&self, conf_dir: &ConfDir) -> Result<()> {
        fs::create_dir_all(conf_dir.signatures_dir())?;

        let dim = self.dim();
        let flat = self.records.iter().flat_map(|r| r.vector.iter().copied()).collect();
        let matrix = Array2::<f64>::from_shape_vec((self.len(), dim), flat)
            .map_err(|e| SearchError::CorruptStore(e.to_string()))?;
        let meta = StoreMeta {
            family: self.family,
            version: self.version.clone(),
            dim,
            labels: self.records.iter().map(|r| r.label.clone()).collect(),
            ids: self.records.iter().map(|r| r.id.clone()).collect(),
        };

        let npy = conf_dir.signatures(self.family);
        let json = conf_dir.signatures_meta(self.family);
        let npy_tmp = npy.with_extension("npy.tmp");
        let json_tmp = json.with_extension("json.tmp");
        write_npy(&npy_tmp, &matrix)?;
        fs::write(&json_tmp, serde_json::to_vec(&meta)?)?;
        fs::rename(&npy_tmp, &npy)?;
        fs::rename(&json_tmp, &json)?;

        info!("已保存 {} 特征库: {} 条记录, 版本 {}", self.family, self.len(), self.version);
        Ok(())
    }

    /// 从配置目录加载特征库，不存在时返回 [`SearchError::StoreNotFound`]
    pub fn load(conf_dir: &ConfDir, family: DescriptorFamily) -> Result<Self> {
        let npy = conf_dir.signatures(family);
        let json = conf_dir.signatures_meta(family);
        if !npy.exists() || !json.exists() {
            return Err(SearchError::StoreNotFound(family));
        }

        let meta: StoreMeta = serde_json::from_slice(&fs::read(&json)?)?;
        let matrix: Array2<f64> = read_npy(&npy)?;

        if meta.family != family || meta.dim != family.len() {
            return Err(SearchError::CorruptStore(format!(
                "{}: 元数据描述符为 {}，维度为 {}",
                json.display(),
                meta.family,
                meta.dim
            )));
        }
        let rows = matrix.nrows();
        if matrix.ncols() != meta.dim || meta.labels.len() != rows || meta.ids.len() != rows {
            return Err(SearchError::CorruptStore(format!(
                "{}: 矩阵形状 {:?} 与 {} 个标签、{} 个标识不一致",
                npy.display(),
                matrix.dim(),
                meta.labels.len(),
                meta.ids.len()
            )));
        }

        let records = matrix
            .rows()
            .into_iter()
            .zip(meta.labels)
            .zip(meta.ids)
            .map(|((row, label), id)| SignatureRecord {
                vector: row.to_vec(),
                label,
                id,
            })
            .collect();

        info!("已加载 {} 特征库: {} 条记录", family, rows);
        Ok(Self {
            family,
            version: meta.version,
            records,
        })
    }

    /// 检查某个描述符的特征库文件是否存在
    pub fn exists(conf_dir: &ConfDir, family: DescriptorFamily) -> bool {
        conf_dir.signatures(family).exists() && conf_dir.signatures_meta(family).exists()
    }
}

/// 对整个图片库提取特征，构建新的特征库
///
/// 每张图片独立计算，可以并行。无法解码的图片使用全 0 向量并记录日志，
/// 无法读取的图片被跳过。`cancel` 被置位后在下一张图片之前停止，返回
/// [`SearchError::Cancelled`]
pub fn rebuild(
    items: &[CorpusItem],
    family: DescriptorFamily,
    pb: &ProgressBar,
    cancel: &AtomicBool,
) -> Result<(SignatureStore, RebuildReport)> {
    info!("开始构建 {} 特征库，共 {} 张图片", family, items.len());
    pb.set_length(items.len() as u64);
    pb.set_position(0);

    let processed = AtomicUsize::new(0);
    let outcomes = items
        .par_iter()
        .map(|item| {
            if cancel.load(Ordering::Relaxed) {
                return None;
            }
            let outcome = extract_item(item, family, pb);
            processed.fetch_add(1, Ordering::Relaxed);
            pb.inc(1);
            Some(outcome)
        })
        .collect::<Vec<_>>();

    let processed = processed.into_inner();
    if cancel.load(Ordering::Relaxed) {
        warn!("{} 特征库构建已取消", family);
        return Err(SearchError::Cancelled(processed));
    }

    let mut report = RebuildReport {
        total: items.len(),
        processed,
        ..Default::default()
    };
    let mut records = Vec::with_capacity(items.len());
    let mut hasher = blake3::Hasher::new();
    for outcome in outcomes.into_iter().flatten() {
        let (record, hash) = match outcome {
            Outcome::Ok(record, hash) => (record, hash),
            Outcome::Degraded(record, hash) => {
                report.degraded += 1;
                (record, hash)
            }
            Outcome::Skipped => {
                report.skipped += 1;
                continue;
            }
        };
        hasher.update(record.id.as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
        records.push(record);
    }
    let version = hasher.finalize().to_hex().to_string();

    pb.finish_with_message(format!("{} 特征提取完成", family));
    info!(
        "{} 特征库构建完成: 共 {} 张，处理 {} 张，退化 {} 张，跳过 {} 张",
        family, report.total, report.processed, report.degraded, report.skipped
    );

    let store = SignatureStore {
        family,
        version,
        records,
    };
    Ok((store, report))
}

fn extract_item(item: &CorpusItem, family: DescriptorFamily, pb: &ProgressBar) -> Outcome {
    let bytes = match fs::read(&item.path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("读取图片失败，已跳过: {}: {}", item.path.display(), e);
            pb.println(format!("读取图片失败，已跳过: {}: {}", item.path.display(), e));
            return Outcome::Skipped;
        }
    };
    let hash = blake3::hash(&bytes);
    let record = |vector: FeatureVector| SignatureRecord {
        vector,
        label: item.label.clone(),
        id: item.relative.clone(),
    };
    match family.extract_bytes(&bytes) {
        Ok(vector) => Outcome::Ok(record(vector), hash),
        Err(e) => {
            warn!("解码图片失败，使用全 0 向量代替: {}: {}", item.path.display(), e);
            metrics::inc_degraded(family);
            Outcome::Degraded(record(family.zeros()), hash)
        }
    }
}
