pub mod glcm;
pub mod haralick;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::{metrics, utils};

/// 单通道灰度图，形状为 (rows, cols)
pub type GrayImage = Array2<u8>;

/// 定长特征向量，长度由描述符决定
pub type FeatureVector = Vec<f64>;

/// 描述符种类
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorFamily {
    /// 灰度共生矩阵统计量（6 维）
    #[value(alias = "glcm")]
    CoOccurrence,
    /// Haralick 纹理特征（13 维）
    #[value(alias = "haralick")]
    StatisticalTexture,
    /// 灰度统计特征（16 维）
    #[value(alias = "bit")]
    IntensityStats,
    /// 以上三者依次拼接（35 维）
    #[value(alias = "concat")]
    Concatenation,
}

impl DescriptorFamily {
    pub const ALL: [DescriptorFamily; 4] = [
        DescriptorFamily::CoOccurrence,
        DescriptorFamily::StatisticalTexture,
        DescriptorFamily::IntensityStats,
        DescriptorFamily::Concatenation,
    ];

    /// 特征向量长度
    pub const fn len(self) -> usize {
        match self {
            Self::CoOccurrence => glcm::LEN,
            Self::StatisticalTexture => haralick::LEN,
            Self::IntensityStats => stats::LEN,
            Self::Concatenation => glcm::LEN + haralick::LEN + stats::LEN,
        }
    }

    /// 特征库文件使用的短名
    pub const fn key(self) -> &'static str {
        match self {
            Self::CoOccurrence => "glcm",
            Self::StatisticalTexture => "haralick",
            Self::IntensityStats => "bit",
            Self::Concatenation => "concat",
        }
    }

    /// 计算特征，可能因为图片退化而失败
    pub fn try_extract(self, image: &GrayImage) -> Result<FeatureVector, ExtractionError> {
        let features = match self {
            Self::CoOccurrence => glcm::extract(image).to_vec(),
            Self::StatisticalTexture => haralick::extract(image)?.to_vec(),
            Self::IntensityStats => stats::extract(image).to_vec(),
            Self::Concatenation => {
                let mut features = Vec::with_capacity(self.len());
                for family in [Self::CoOccurrence, Self::StatisticalTexture, Self::IntensityStats] {
                    features.extend(family.extract(image));
                }
                features
            }
        };
        debug_assert_eq!(features.len(), self.len());
        Ok(features)
    }

    /// 计算特征，失败时记录日志并返回全 0 向量
    ///
    /// 拼接描述符中某一部分失败时只有该部分被置 0
    pub fn extract(self, image: &GrayImage) -> FeatureVector {
        self.try_extract(image).unwrap_or_else(|e| {
            warn!("{} 特征提取失败，使用全 0 向量代替: {}", self, e);
            metrics::inc_degraded(self);
            self.zeros()
        })
    }

    /// 解码图片并计算特征，图片无法解码时返回错误
    pub fn extract_bytes(self, bytes: &[u8]) -> Result<FeatureVector, ExtractionError> {
        let image = utils::decode_grayscale(bytes)?;
        Ok(self.extract(&image))
    }

    /// 对应长度的全 0 向量
    pub fn zeros(self) -> FeatureVector {
        vec![0.; self.len()]
    }
}

impl fmt::Display for DescriptorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DescriptorFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "glcm" | "co-occurrence" => Ok(Self::CoOccurrence),
            "haralick" | "statistical-texture" => Ok(Self::StatisticalTexture),
            "bit" | "intensity-stats" => Ok(Self::IntensityStats),
            "concat" | "concatenation" => Ok(Self::Concatenation),
            _ => Err(format!("未知的描述符: {}", s)),
        }
    }
}
