//! 画像の正規化
//!
//! 送信・PDF埋め込み用に JPEG/PNG をRGBのJPEGへ再エンコードする。
//! 長辺が上限を超えるときだけ Lanczos3 で縮小し、拡大はしない。
//! 出力バイト列のSHA-256を指紋として持つ。

use crate::error::{InspectionError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use sha2::{Digest, Sha256};
use tracing::debug;

/// 正規化パラメータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    /// 長辺の最大ピクセル数
    pub max_side: u32,
    /// JPEG品質 (1-100)
    pub quality: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            max_side: crate::config::DEFAULT_MAX_IMAGE_SIDE,
            quality: crate::config::DEFAULT_JPEG_QUALITY,
        }
    }
}

/// 正規化済み画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    /// bytes のSHA-256（16進）
    pub hash: String,
    pub width: u32,
    pub height: u32,
}

/// 縮小後の寸法（倍率は1.0で頭打ち、切り捨て、最小1px）
pub fn target_dimensions(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let longer = width.max(height);
    if longer == 0 || longer <= max_side {
        return (width, height);
    }
    let scaled = |v: u32| ((v as u64 * max_side as u64 / longer as u64) as u32).max(1);
    (scaled(width), scaled(height))
}

/// 画像バイト列を正規化する
pub fn normalize_image(bytes: &[u8], options: &ImageOptions) -> Result<NormalizedImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| InspectionError::ImageLoad(format!("デコード失敗: {}", e)))?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let (target_w, target_h) = target_dimensions(width, height, options.max_side);

    let rgb = if (target_w, target_h) != (width, height) {
        debug!("resize {}x{} -> {}x{}", width, height, target_w, target_h);
        image::imageops::resize(&rgb, target_w, target_h, FilterType::Lanczos3)
    } else {
        rgb
    };

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, options.quality.clamp(1, 100));
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|e| InspectionError::ImageLoad(format!("JPEGエンコード失敗: {}", e)))?;

    let hash = sha256_hex(&buf);
    Ok(NormalizedImage {
        bytes: buf,
        hash,
        width: target_w,
        height: target_h,
    })
}

/// SHA-256（16進文字列）
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
