use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use anyhow::Result;
use indicatif::ProgressBar;
use log::{debug, info};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::block_in_place;
use utoipa::ToSchema;

use crate::config::ConfDir;
use crate::corpus::CorpusItem;
use crate::db::{Database, crud, init_db};
use crate::descriptor::DescriptorFamily;
use crate::distance::Metric;
use crate::error::{DimensionMismatch, SearchError};
use crate::face::{DescriptorFaceEncoder, FaceEncoder};
use crate::matcher::{self, Gallery, GalleryEntry, Identified};
use crate::metrics;
use crate::ranker::QueryResult;
use crate::store::{self, RebuildReport, SignatureStore};

/// 某个描述符的特征库状态
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreInfo {
    /// 描述符短名
    pub family: String,
    /// 向量维度
    pub dim: usize,
    /// 是否已经构建
    pub built: bool,
    /// 记录数量，未构建时为 0
    pub len: usize,
    /// 图片库快照版本
    pub version: Option<String>,
}

pub struct SigDBBuilder {
    conf_dir: ConfDir,
    encoder: Arc<dyn FaceEncoder>,
    preload: bool,
}

impl SigDBBuilder {
    pub fn new(conf_dir: ConfDir) -> Self {
        Self {
            conf_dir,
            encoder: Arc::new(DescriptorFaceEncoder::default()),
            preload: false,
        }
    }

    /// 设置人脸编码器，默认使用拼接描述符
    pub fn face_encoder(mut self, encoder: impl FaceEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// 打开时加载所有已构建的特征库
    pub fn preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    pub async fn open(self) -> Result<SigDB> {
        let db = init_db(self.conf_dir.database()).await?;
        let sig = SigDB {
            conf_dir: self.conf_dir,
            db,
            encoder: self.encoder,
            stores: RwLock::new(HashMap::new()),
            gallery: RwLock::new(None),
        };
        if self.preload {
            for family in DescriptorFamily::ALL {
                if SignatureStore::exists(&sig.conf_dir, family) {
                    sig.store(family).await?;
                }
            }
        }
        Ok(sig)
    }
}

/// 特征库与人脸库的句柄
///
/// 已加载的特征库只读，多个查询可以同时使用
pub struct SigDB {
    conf_dir: ConfDir,
    db: Database,
    encoder: Arc<dyn FaceEncoder>,
    stores: RwLock<HashMap<DescriptorFamily, Arc<SignatureStore>>>,
    gallery: RwLock<Option<Arc<Gallery>>>,
}

impl SigDB {
    pub fn conf_dir(&self) -> &ConfDir {
        &self.conf_dir
    }

    /// 获取某个描述符的特征库，首次使用时从磁盘加载
    pub async fn store(&self, family: DescriptorFamily) -> Result<Arc<SignatureStore>> {
        if let Some(store) = self.stores.read().await.get(&family) {
            return Ok(store.clone());
        }
        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(&family) {
            return Ok(store.clone());
        }
        let store = Arc::new(block_in_place(|| SignatureStore::load(&self.conf_dir, family))?);
        stores.insert(family, store.clone());
        Ok(store)
    }

    /// 重新构建某个描述符的特征库，完成后替换旧的特征库
    ///
    /// 构建被取消时旧的特征库保持不变
    pub async fn rebuild(
        &self,
        items: &[CorpusItem],
        family: DescriptorFamily,
        pb: &ProgressBar,
        cancel: &AtomicBool,
    ) -> Result<RebuildReport> {
        let (store, report) = block_in_place(|| store::rebuild(items, family, pb, cancel))?;
        block_in_place(|| store.save(&self.conf_dir))?;
        self.stores.write().await.insert(family, Arc::new(store));
        Ok(report)
    }

    /// 搜索与图片最相似的 k 张图片
    pub async fn search(
        &self,
        image: &[u8],
        family: DescriptorFamily,
        metric: Metric,
        k: usize,
    ) -> Result<QueryResult> {
        let store = self.store(family).await?;

        let start = Instant::now();
        let query = block_in_place(|| family.extract_bytes(image)).map_err(SearchError::from)?;
        debug!("提取特征耗时: {:.2}ms", start.elapsed().as_secs_f32() * 1000.);

        let result = block_in_place(|| store.rank(&query, metric, k))?;
        let elapsed = start.elapsed().as_secs_f32();
        debug!("搜索耗时: {:.2}ms, 扫描 {} 条记录", elapsed * 1000., store.len());

        metrics::inc_search(family, metric, elapsed);
        Ok(result)
    }

    /// 所有描述符的特征库状态
    pub async fn stores(&self) -> Result<Vec<StoreInfo>> {
        let mut infos = vec![];
        for family in DescriptorFamily::ALL {
            let info = if SignatureStore::exists(&self.conf_dir, family) {
                let store = self.store(family).await?;
                StoreInfo {
                    family: family.key().to_string(),
                    dim: family.len(),
                    built: true,
                    len: store.len(),
                    version: Some(store.version().to_string()),
                }
            } else {
                StoreInfo {
                    family: family.key().to_string(),
                    dim: family.len(),
                    built: false,
                    len: 0,
                    version: None,
                }
            };
            infos.push(info);
        }
        Ok(infos)
    }

    /// 登记一张人脸，身份已存在时替换
    pub async fn enroll_face(&self, identity: &str, image: &[u8]) -> Result<()> {
        let vector = self.encode_face(image)?;
        crud::save_entry(&self.db, identity, &vector).await.map_err(SearchError::from)?;
        *self.gallery.write().await = None;
        info!("已登记身份: {}", identity);
        Ok(())
    }

    /// 识别一张人脸，没有足够接近的身份时返回 `None`
    pub async fn authenticate_face(
        &self,
        image: &[u8],
        threshold: f64,
    ) -> Result<Option<Identified>> {
        let query = self.encode_face(image)?;
        let gallery = self.gallery().await?;
        let found = matcher::identify(&gallery, &query, threshold).map_err(SearchError::from)?;
        metrics::inc_identify(found.is_some());
        match &found {
            Some(id) => info!("识别成功: {} (d={:.4})", id.identity, id.distance),
            None => info!("没有匹配的身份"),
        }
        Ok(found)
    }

    /// 删除一个身份，返回是否存在
    pub async fn remove_face(&self, identity: &str) -> Result<bool> {
        let removed = crud::delete_entry(&self.db, identity).await.map_err(SearchError::from)?;
        *self.gallery.write().await = None;
        Ok(removed)
    }

    /// 已登记的身份数量
    pub async fn gallery_len(&self) -> Result<usize> {
        Ok(crud::count_entries(&self.db).await.map_err(SearchError::from)? as usize)
    }

    fn encode_face(&self, image: &[u8]) -> Result<Vec<f64>> {
        let vector =
            block_in_place(|| self.encoder.encode_bytes(image)).map_err(SearchError::from)?;
        if vector.len() != self.encoder.dim() {
            let mismatch = DimensionMismatch {
                left: vector.len(),
                right: self.encoder.dim(),
            };
            return Err(SearchError::from(mismatch).into());
        }
        Ok(vector)
    }

    /// 读取人脸库，所有向量的长度必须与当前编码器一致
    async fn gallery(&self) -> Result<Arc<Gallery>> {
        if let Some(gallery) = self.gallery.read().await.as_ref() {
            return Ok(gallery.clone());
        }
        let mut cached = self.gallery.write().await;
        if let Some(gallery) = cached.as_ref() {
            return Ok(gallery.clone());
        }
        let entries = crud::load_all_entries(&self.db)
            .await
            .map_err(SearchError::from)?
            .into_iter()
            .map(GalleryEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let dim = self.encoder.dim();
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dim) {
            let mismatch = DimensionMismatch {
                left: bad.vector.len(),
                right: dim,
            };
            return Err(SearchError::from(mismatch).into());
        }
        debug!("已加载 {} 个身份", entries.len());
        let gallery = Arc::new(Gallery::from_entries(entries));
        *cached = Some(gallery.clone());
        Ok(gallery)
    }
}
