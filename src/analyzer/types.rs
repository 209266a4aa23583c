use crate::imaging::NormalizedImage;
use inspection_ai_common::{extract, InspectionItem};

/// 解析失敗時に raw_text へ入れる前置き
pub const ANALYSIS_ERROR_PREFIX: &str = "Error analyzing this image:";

/// 写真1枚の解析結果
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoOutcome {
    /// プロバイダが応答を返した（構造化の成否は問わない）
    Analyzed {
        image: NormalizedImage,
        response: String,
    },
    /// 読み込み・正規化・プロバイダ呼び出しのいずれかで失敗
    Failed {
        /// 正規化まで済んでいれば画像は残す
        image: Option<NormalizedImage>,
        diagnostic: String,
    },
}

impl PhotoOutcome {
    pub fn failed(image: Option<NormalizedImage>, reason: impl std::fmt::Display) -> Self {
        PhotoOutcome::Failed {
            image,
            diagnostic: format!("{} {}", ANALYSIS_ERROR_PREFIX, reason),
        }
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, PhotoOutcome::Analyzed { .. })
    }

    /// 報告書の1項目へ変換
    pub fn into_item(self, filename: &str) -> InspectionItem {
        match self {
            PhotoOutcome::Analyzed { image, response } => InspectionItem::from_extraction(
                filename,
                Some(image.bytes),
                Some(image.hash),
                extract(&response),
            ),
            PhotoOutcome::Failed { image, diagnostic } => {
                let (bytes, hash) = match image {
                    Some(img) => (Some(img.bytes), Some(img.hash)),
                    None => (None, None),
                };
                InspectionItem::failed(filename, bytes, hash, diagnostic)
            }
        }
    }
}
