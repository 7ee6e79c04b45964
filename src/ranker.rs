use serde::Serialize;
use utoipa::ToSchema;

use crate::distance::Metric;
use crate::error::{DimensionMismatch, Result, SearchError};
use crate::store::SignatureStore;

/// 一条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct QueryHit {
    /// 图片标识
    pub id: String,
    /// 与查询向量的距离
    pub distance: f64,
    /// 类别标签
    pub label: String,
}

/// 按距离升序排列的搜索结果，长度不超过 K
pub type QueryResult = Vec<QueryHit>;

/// 线性扫描所有候选向量，返回距离最小的 k 个 `(下标, 距离)`
///
/// 距离相同时按候选向量的原始顺序排列，结果完全由输入决定
pub fn nearest<'a, I>(
    query: &[f64],
    candidates: I,
    metric: Metric,
    k: usize,
) -> Result<Vec<(usize, f64)>, DimensionMismatch>
where
    I: IntoIterator<Item = &'a [f64]>,
{
    if k == 0 {
        return Ok(vec![]);
    }
    let mut scored = candidates
        .into_iter()
        .enumerate()
        .map(|(i, v)| metric.distance(query, v).map(|d| (i, d)))
        .collect::<Result<Vec<_>, _>>()?;
    // sort_by 是稳定排序，相同距离保持原顺序
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));
    scored.truncate(k);
    Ok(scored)
}

/// 在特征库中搜索距离最近的 k 张图片
///
/// 查询向量维度与特征库不一致时返回 [`SearchError::DimensionMismatch`]，
/// 特征库为空时返回 [`SearchError::EmptyStore`]，k 为 0 时返回空结果
pub fn rank(
    store: &SignatureStore,
    query: &[f64],
    metric: Metric,
    k: usize,
) -> Result<QueryResult> {
    if query.len() != store.dim() {
        let mismatch = DimensionMismatch {
            left: query.len(),
            right: store.dim(),
        };
        return Err(mismatch.into());
    }
    if store.is_empty() {
        return Err(SearchError::EmptyStore(store.family()));
    }

    let records = store.records();
    let neighbors = nearest(query, records.iter().map(|r| r.vector.as_slice()), metric, k)?;
    Ok(neighbors
        .into_iter()
        .map(|(i, distance)| QueryHit {
            id: records[i].id.clone(),
            distance,
            label: records[i].label.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::descriptor::DescriptorFamily;
    use crate::store::SignatureRecord;

    fn record(id: &str, label: &str, v: [f64; 6]) -> SignatureRecord {
        SignatureRecord {
            vector: v.to_vec(),
            label: label.into(),
            id: id.into(),
        }
    }

    #[fixture]
    fn store() -> SignatureStore {
        SignatureStore::new(
            DescriptorFamily::CoOccurrence,
            "test",
            vec![
                record("a", "cat", [0., 0., 0., 0., 0., 3.]),
                record("b", "cat", [0., 0., 0., 0., 0., 1.]),
                record("c", "dog", [0., 0., 0., 0., 0., 2.]),
                // 与 b 距离相同
                record("d", "dog", [0., 0., 0., 0., 0., 1.]),
            ],
        )
        .unwrap()
    }

    #[rstest]
    fn test_sorted_with_stable_ties(store: SignatureStore) {
        let result = store.rank(&[0.; 6], Metric::Euclidean, 4).unwrap();
        let ids = result.iter().map(|h| h.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, ["b", "d", "c", "a"]);
        assert!(result.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(result[2].label, "dog");
    }

    #[rstest]
    fn test_result_length(store: SignatureStore, #[values(0, 1, 3, 4, 10)] k: usize) {
        for metric in Metric::ALL {
            let result = store.rank(&[1.; 6], metric, k).unwrap();
            assert_eq!(result.len(), k.min(store.len()));
        }
    }

    #[rstest]
    fn test_deterministic(store: SignatureStore) {
        for metric in Metric::ALL {
            let a = store.rank(&[0., 0., 0., 0., 0., 2.], metric, 4).unwrap();
            let b = store.rank(&[0., 0., 0., 0., 0., 2.], metric, 4).unwrap();
            assert_eq!(a, b);
        }
    }

    #[rstest]
    fn test_dimension_mismatch(store: SignatureStore) {
        let err = store.rank(&[0.; 5], Metric::Manhattan, 2).unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch(DimensionMismatch { left: 5, right: 6 })
        ));
    }

    #[test]
    fn test_empty_store() {
        let store = SignatureStore::new(DescriptorFamily::CoOccurrence, "test", vec![]).unwrap();
        let err = store.rank(&[0.; 6], Metric::Manhattan, 2).unwrap_err();
        assert!(matches!(err, SearchError::EmptyStore(DescriptorFamily::CoOccurrence)));
    }

    #[test]
    fn test_nearest_mismatched_candidate() {
        let candidates: [&[f64]; 2] = [&[0., 0.], &[0.]];
        assert!(nearest(&[0., 0.], candidates, Metric::Euclidean, 1).is_err());
    }
}
