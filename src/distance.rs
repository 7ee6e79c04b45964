use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::DimensionMismatch;

/// 可选的距离度量
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// 曼哈顿距离
    Manhattan,
    /// 欧氏距离
    Euclidean,
    /// 切比雪夫距离
    Chebyshev,
    /// 堪培拉距离
    Canberra,
}

impl Metric {
    pub const ALL: [Metric; 4] =
        [Metric::Manhattan, Metric::Euclidean, Metric::Chebyshev, Metric::Canberra];

    pub fn name(self) -> &'static str {
        match self {
            Self::Manhattan => "manhattan",
            Self::Euclidean => "euclidean",
            Self::Chebyshev => "chebyshev",
            Self::Canberra => "canberra",
        }
    }

    /// 计算两个等长向量之间的距离，长度不同时返回错误而不是截断
    pub fn distance(self, a: &[f64], b: &[f64]) -> Result<f64, DimensionMismatch> {
        if a.len() != b.len() {
            return Err(DimensionMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        Ok(match self {
            Self::Manhattan => manhattan(a, b),
            Self::Euclidean => euclidean(a, b),
            Self::Chebyshev => chebyshev(a, b),
            Self::Canberra => canberra(a, b),
        })
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manhattan" | "cityblock" => Ok(Self::Manhattan),
            "euclidean" => Ok(Self::Euclidean),
            "chebyshev" => Ok(Self::Chebyshev),
            "canberra" => Ok(Self::Canberra),
            _ => Err(format!("未知的距离度量: {}", s)),
        }
    }
}

#[inline]
pub fn manhattan(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

#[inline]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>().sqrt()
}

#[inline]
pub fn chebyshev(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0., f64::max)
}

/// 两个分量都为 0 时该项记为 0
#[inline]
pub fn canberra(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let denom = x.abs() + y.abs();
            if denom == 0. { 0. } else { (x - y).abs() / denom }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: [f64; 4] = [1., -2., 3., 0.];
    const B: [f64; 4] = [4., 2., 3., 0.];

    #[test]
    fn test_known_values() {
        assert_eq!(Metric::Manhattan.distance(&A, &B).unwrap(), 7.);
        assert_eq!(Metric::Euclidean.distance(&A, &B).unwrap(), 5.);
        assert_eq!(Metric::Chebyshev.distance(&A, &B).unwrap(), 4.);
        // 3/5 + 4/4 + 0 + 0
        let d = Metric::Canberra.distance(&A, &B).unwrap();
        assert!((d - 1.6).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_and_non_negative() {
        for metric in Metric::ALL {
            let ab = metric.distance(&A, &B).unwrap();
            let ba = metric.distance(&B, &A).unwrap();
            assert_eq!(ab, ba, "{metric}");
            assert!(ab >= 0., "{metric}");
        }
    }

    #[test]
    fn test_zero_on_identical() {
        for metric in Metric::ALL {
            assert_eq!(metric.distance(&A, &A).unwrap(), 0., "{metric}");
        }
    }

    #[test]
    fn test_canberra_all_zero() {
        let zero = [0.; 16];
        assert_eq!(Metric::Canberra.distance(&zero, &zero).unwrap(), 0.);
    }

    #[test]
    fn test_dimension_mismatch() {
        for metric in Metric::ALL {
            let err = metric.distance(&A, &B[..3]).unwrap_err();
            assert_eq!(err, DimensionMismatch { left: 4, right: 3 });
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("cityblock".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert!("cosine".parse::<Metric>().is_err());
    }
}
