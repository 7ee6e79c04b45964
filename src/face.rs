use crate::descriptor::{DescriptorFamily, FeatureVector};
use crate::error::ExtractionError;
use crate::utils::{self, ColorImage};

/// 人脸编码器，将一张人脸图片转换为定长向量
///
/// 同一个人脸库中的向量必须由同一个编码器产生
pub trait FaceEncoder: Send + Sync {
    /// 编码器输出的向量长度
    fn dim(&self) -> usize;

    fn encode(&self, image: &ColorImage) -> Result<FeatureVector, ExtractionError>;

    /// 解码图片后编码，图片无法解码时返回错误
    fn encode_bytes(&self, bytes: &[u8]) -> Result<FeatureVector, ExtractionError> {
        self.encode(&utils::decode_color(bytes)?)
    }
}

/// 使用纹理描述符作为人脸向量
#[derive(Debug, Clone, Copy)]
pub struct DescriptorFaceEncoder(pub DescriptorFamily);

impl Default for DescriptorFaceEncoder {
    fn default() -> Self {
        Self(DescriptorFamily::Concatenation)
    }
}

impl FaceEncoder for DescriptorFaceEncoder {
    fn dim(&self) -> usize {
        self.0.len()
    }

    fn encode(&self, image: &ColorImage) -> Result<FeatureVector, ExtractionError> {
        Ok(self.0.extract(&utils::rgb_to_gray(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_encoder() {
        let encoder = DescriptorFaceEncoder::default();
        let image = ColorImage::from_shape_fn((8, 8, 3), |(r, c, ch)| (r * 20 + c * 5 + ch) as u8);
        let v = encoder.encode(&image).unwrap();
        assert_eq!(v.len(), encoder.dim());
        assert_eq!(v, encoder.encode(&image).unwrap());
    }

    #[test]
    fn test_encode_garbage() {
        let encoder = DescriptorFaceEncoder(DescriptorFamily::IntensityStats);
        assert!(matches!(encoder.encode_bytes(b"garbage"), Err(ExtractionError::Decode(_))));
    }
}
