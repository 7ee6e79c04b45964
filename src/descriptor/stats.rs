use super::GrayImage;

pub const LEN: usize = 16;

const BINS: usize = 10;

/// 灰度统计特征：均值、标准差、最小值、最大值、10 级归一化直方图、偏度、峰度
///
/// 标准差为总体标准差；标准差为 0 时偏度和峰度记为 0。结果总是补齐/截断到 16 维
pub fn extract(image: &GrayImage) -> [f64; LEN] {
    let mut features = [0.; LEN];
    let n = image.len();
    if n == 0 {
        return features;
    }

    let mut hist = [0usize; BINS];
    let (mut min, mut max, mut sum) = (u8::MAX, u8::MIN, 0.);
    for &v in image {
        min = min.min(v);
        max = max.max(v);
        sum += v as f64;
        // [0, 256) 等分为 10 份
        hist[v as usize * BINS / 256] += 1;
    }
    let mean = sum / n as f64;
    let var = image.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n as f64;
    let std = var.sqrt();

    let (skewness, kurtosis) = if std > 0. {
        let (s3, s4) = image.iter().fold((0., 0.), |(s3, s4), &v| {
            let z = (v as f64 - mean) / std;
            (s3 + z.powi(3), s4 + z.powi(4))
        });
        (s3 / n as f64, s4 / n as f64)
    } else {
        (0., 0.)
    };

    let values = [mean, std, min as f64, max as f64]
        .into_iter()
        .chain(hist.iter().map(|&h| h as f64 / n as f64))
        .chain([skewness, kurtosis]);
    for (slot, v) in features.iter_mut().zip(values) {
        *slot = v;
    }
    features
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn test_uniform_image() {
        let image = GrayImage::from_elem((3, 3), 200);
        let f = extract(&image);
        assert_eq!(f[..4], [200., 0., 200., 200.]);
        // 200 * 10 / 256 = 7
        assert_eq!(f[4 + 7], 1.);
        assert_eq!(f[4..14].iter().sum::<f64>(), 1.);
        assert_eq!(f[14..], [0., 0.]);
    }

    #[test]
    fn test_histogram_edges() {
        let image = array![[0u8, 25, 26, 255]];
        let f = extract(&image);
        assert_eq!(f[4], 0.5);
        assert_eq!(f[5], 0.25);
        assert_eq!(f[13], 0.25);
    }

    #[test]
    fn test_moments() {
        let image = array![[0u8, 0, 10, 10]];
        let f = extract(&image);
        assert_eq!(f[0], 5.);
        assert_eq!(f[1], 5.);
        // 对称分布，偏度为 0，峰度为 1
        assert_eq!(f[14], 0.);
        assert_eq!(f[15], 1.);
    }
}
