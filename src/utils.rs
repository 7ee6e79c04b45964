use std::path::Path;

use image::DynamicImage;
use indicatif::ProgressStyle;
use ndarray::{Array2, Array3, Axis};

use crate::descriptor::GrayImage;
use crate::error::ExtractionError;

/// 彩色图，形状为 (rows, cols, 3)，通道顺序 RGB
pub type ColorImage = Array3<u8>;

pub fn pb_style_speed() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {per_sec} {msg}")
        .expect("failed to build progress style")
}

/// 读取图片并转换为灰度图
pub fn load_grayscale(path: impl AsRef<Path>) -> Result<GrayImage, ExtractionError> {
    let bytes = std::fs::read(path)?;
    decode_grayscale(&bytes)
}

/// 读取彩色图片
pub fn load_color(path: impl AsRef<Path>) -> Result<ColorImage, ExtractionError> {
    let bytes = std::fs::read(path)?;
    decode_color(&bytes)
}

/// 从内存中解码图片并转换为灰度图
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, ExtractionError> {
    match image::load_from_memory(bytes)? {
        // 本身就是 8 位灰度图时直接使用，避免来回转换
        DynamicImage::ImageLuma8(img) => {
            let (w, h) = img.dimensions();
            to_array2(h as usize, w as usize, img.into_raw())
        }
        img => Ok(rgb_to_gray(&to_array3(img)?)),
    }
}

/// 从内存中解码彩色图片
pub fn decode_color(bytes: &[u8]) -> Result<ColorImage, ExtractionError> {
    to_array3(image::load_from_memory(bytes)?)
}

/// RGB 转灰度，使用 BT.601 权重和与 OpenCV 相同的 14 位定点舍入
pub fn rgb_to_gray(image: &ColorImage) -> GrayImage {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    image.map_axis(Axis(2), |px| {
        ((px[0] as u32 * R + px[1] as u32 * G + px[2] as u32 * B + (1 << 13)) >> 14) as u8
    })
}

fn to_array3(img: DynamicImage) -> Result<ColorImage, ExtractionError> {
    let img = img.into_rgb8();
    let (w, h) = img.dimensions();
    Array3::from_shape_vec((h as usize, w as usize, 3), img.into_raw())
        .map_err(|_| ExtractionError::Degenerate("像素数据与图片尺寸不符"))
}

fn to_array2(rows: usize, cols: usize, raw: Vec<u8>) -> Result<Array2<u8>, ExtractionError> {
    Array2::from_shape_vec((rows, cols), raw)
        .map_err(|_| ExtractionError::Degenerate("像素数据与图片尺寸不符"))
}
