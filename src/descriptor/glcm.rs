use ndarray::Array2;

use super::GrayImage;

pub const LEN: usize = 6;

/// 灰度级数量
const LEVELS: usize = 256;

/// 计算灰度共生矩阵，`p[[i, j]]` 为像素值 i 与其偏移 `(dy, dx)` 处像素值 j 同时出现的次数
///
/// 非对称、未归一化
pub fn cooccurrence(image: &GrayImage, (dy, dx): (isize, isize), levels: usize) -> Array2<u64> {
    let mut p = Array2::zeros((levels, levels));
    let (rows, cols) = image.dim();
    let (rows, cols) = (rows as isize, cols as isize);
    for r in 0isize.max(-dy)..rows.min(rows - dy) {
        for c in 0isize.max(-dx)..cols.min(cols - dx) {
            let i = image[[r as usize, c as usize]] as usize;
            let j = image[[(r + dy) as usize, (c + dx) as usize]] as usize;
            p[[i, j]] += 1;
        }
    }
    p
}

/// 竖直方向（偏移 1）的共生矩阵统计量：
/// contrast, dissimilarity, homogeneity, correlation, energy, ASM
///
/// 没有任何像素对时（例如只有一行的图片）矩阵全为 0，此时除 correlation 外全部为 0，
/// correlation 在方差为 0 时定义为 1
pub fn extract(image: &GrayImage) -> [f64; LEN] {
    let glcm = cooccurrence(image, (1, 0), LEVELS);
    let total = glcm.sum();
    let norm = if total == 0 { 1. } else { total as f64 };

    let (mut contrast, mut dissimilarity, mut homogeneity, mut asm) = (0., 0., 0., 0.);
    let (mut mean_i, mut mean_j) = (0., 0.);
    for ((i, j), &n) in glcm.indexed_iter() {
        if n == 0 {
            continue;
        }
        let p = n as f64 / norm;
        let d = i as f64 - j as f64;
        contrast += p * d * d;
        dissimilarity += p * d.abs();
        homogeneity += p / (1. + d * d);
        asm += p * p;
        mean_i += p * i as f64;
        mean_j += p * j as f64;
    }

    let (mut var_i, mut var_j, mut cov) = (0., 0., 0.);
    for ((i, j), &n) in glcm.indexed_iter() {
        if n == 0 {
            continue;
        }
        let p = n as f64 / norm;
        let di = i as f64 - mean_i;
        let dj = j as f64 - mean_j;
        var_i += p * di * di;
        var_j += p * dj * dj;
        cov += p * di * dj;
    }
    let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
    let correlation = if std_i < 1e-15 || std_j < 1e-15 { 1. } else { cov / (std_i * std_j) };

    [contrast, dissimilarity, homogeneity, correlation, asm.sqrt(), asm]
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_cooccurrence_vertical() {
        let image = array![[0u8, 1], [1, 1], [2, 0]];
        let p = cooccurrence(&image, (1, 0), 3);
        // (0->1) (1->1) (1->2) (1->0)
        assert_eq!(p[[0, 1]], 1);
        assert_eq!(p[[1, 1]], 1);
        assert_eq!(p[[1, 2]], 1);
        assert_eq!(p[[1, 0]], 1);
        assert_eq!(p.sum(), 4);
    }

    #[test]
    fn test_uniform_image() {
        let image = GrayImage::from_elem((8, 8), 100);
        let f = extract(&image);
        assert_eq!(f, [0., 0., 1., 1., 1., 1.]);
    }

    #[test]
    fn test_single_pixel() {
        let image = GrayImage::from_elem((1, 1), 7);
        let f = extract(&image);
        assert_eq!(f, [0., 0., 0., 1., 0., 0.]);
    }

    #[test]
    fn test_stripes() {
        // 水平条纹：每个像素和下方像素的灰度差都是 10
        let image = GrayImage::from_shape_fn((4, 4), |(r, _)| if r % 2 == 0 { 0 } else { 10 });
        let [contrast, dissimilarity, homogeneity, correlation, energy, asm] = extract(&image);
        assert!((contrast - 100.).abs() < 1e-9);
        assert!((dissimilarity - 10.).abs() < 1e-9);
        assert!((homogeneity - 1. / 101.).abs() < 1e-12);
        assert!(correlation < 0.);
        assert!((energy * energy - asm).abs() < 1e-12);
    }
}
