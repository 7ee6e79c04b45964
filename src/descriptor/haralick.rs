use ndarray::{Array1, Array2, Axis};

use super::GrayImage;
use super::glcm::cooccurrence;
use crate::error::ExtractionError;

pub const LEN: usize = 13;

/// 0°, 45°, 90°, 135° 四个方向，距离 1
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 1), (1, 0), (1, -1)];

/// Haralick 纹理特征，四个方向分别计算后取平均
///
/// 共生矩阵为对称矩阵，灰度级数量为 `max + 1`。
/// 任何方向都没有像素对时（1x1 图片）返回 [`ExtractionError::Degenerate`]
pub fn extract(image: &GrayImage) -> Result<[f64; LEN], ExtractionError> {
    let levels = image.iter().copied().max().map_or(1, |m| m as usize + 1);
    let mut mean = [0.; LEN];
    for delta in DIRECTIONS {
        let cmat = cooccurrence(image, delta, levels);
        let symmetric = &cmat + &cmat.t();
        let feats = features(&symmetric)?;
        for (m, f) in mean.iter_mut().zip(feats) {
            *m += f / DIRECTIONS.len() as f64;
        }
    }
    Ok(mean)
}

/// 单个共生矩阵的 13 个 Haralick 特征
fn features(cmat: &Array2<u64>) -> Result<[f64; LEN], ExtractionError> {
    let total = cmat.sum();
    if total == 0 {
        return Err(ExtractionError::Degenerate("共生矩阵为空"));
    }
    let n = cmat.nrows();
    let p = cmat.mapv(|v| v as f64 / total as f64);
    let k = Array1::from_iter((0..n).map(|v| v as f64));

    let px = p.sum_axis(Axis(0));
    let py = p.sum_axis(Axis(1));
    let ux = px.dot(&k);
    let uy = py.dot(&k);
    let vx = px.dot(&k.mapv(|v| v * v)) - ux * ux;
    let vy = py.dot(&k.mapv(|v| v * v)) - uy * uy;
    let (sx, sy) = (vx.sqrt(), vy.sqrt());

    let mut p_sum = Array1::<f64>::zeros(2 * n);
    let mut p_diff = Array1::<f64>::zeros(n);
    let (mut asm, mut ij_sum, mut idm) = (0., 0., 0.);
    for ((i, j), &v) in p.indexed_iter() {
        if v == 0. {
            continue;
        }
        p_sum[i + j] += v;
        p_diff[i.abs_diff(j)] += v;
        asm += v * v;
        ij_sum += (i * j) as f64 * v;
        let d = i as f64 - j as f64;
        idm += v / (1. + d * d);
    }

    let contrast: f64 = p_diff.iter().enumerate().map(|(d, v)| (d * d) as f64 * v).sum();
    let correlation = if sx == 0. || sy == 0. { 1. } else { (ij_sum - ux * uy) / sx / sy };
    let sum_avg: f64 = p_sum.iter().enumerate().map(|(s, v)| s as f64 * v).sum();
    let sum_var: f64 =
        p_sum.iter().enumerate().map(|(s, v)| (s * s) as f64 * v).sum::<f64>() - sum_avg * sum_avg;
    let sum_entropy = entropy(p_sum.iter().copied());
    let hxy = entropy(p.iter().copied());
    let diff_var = p_diff.var(0.);
    let diff_entropy = entropy(p_diff.iter().copied());

    let hx = entropy(px.iter().copied());
    let hy = entropy(py.iter().copied());
    let (mut hxy1, mut hxy2) = (0., 0.);
    for ((i, j), &v) in p.indexed_iter() {
        let q = px[i] * py[j];
        if q == 0. {
            continue;
        }
        hxy1 -= v * q.log2();
        hxy2 -= q * q.log2();
    }
    let hmax = hx.max(hy);
    let imc1 = if hmax == 0. { 0. } else { (hxy - hxy1) / hmax };
    let imc2 = (1. - (-2. * (hxy2 - hxy)).exp()).max(0.).sqrt();

    Ok([
        asm,
        contrast,
        correlation,
        vx,
        idm,
        sum_avg,
        sum_var,
        sum_entropy,
        hxy,
        diff_var,
        diff_entropy,
        imc1,
        imc2,
    ])
}

/// 以 2 为底的熵，0 项不参与计算
fn entropy(p: impl Iterator<Item = f64>) -> f64 {
    -p.filter(|&v| v > 0.).map(|v| v * v.log2()).sum::<f64>()
}
