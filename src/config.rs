use crate::error::{InspectionError, Result};
use crate::imaging::ImageOptions;
use inspection_ai_common::layout::{MARGIN_SIDE_MM, MARGIN_VERTICAL_MM};
use inspection_ai_common::PdfLayout;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// APIキーの環境変数（設定ファイルより優先）
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_MAX_IMAGE_SIDE: u32 = 1280;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// 入力フォームと同じ許容範囲
pub const MAX_IMAGE_SIDE_RANGE: (u32, u32) = (640, 3000);
pub const JPEG_QUALITY_RANGE: (u8, u8) = (50, 95);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    /// 未指定ならモデル一覧から自動選択
    pub model: Option<String>,
    pub max_image_side: u32,
    pub jpeg_quality: u8,
    pub timeout_seconds: u64,
    pub margin_side_mm: f32,
    pub margin_vertical_mm: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            max_image_side: DEFAULT_MAX_IMAGE_SIDE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            timeout_seconds: 120,
            margin_side_mm: MARGIN_SIDE_MM,
            margin_vertical_mm: MARGIN_VERTICAL_MM,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| InspectionError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("inspection-ai").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(key.trim().to_string());
            }
        }

        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .ok_or(InspectionError::MissingApiKey)
    }

    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_ok()
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(InspectionError::Config("APIキーが空です".into()));
        }
        self.api_key = Some(key);
        self.save()
    }

    /// 数値設定の範囲チェック（プロバイダ呼び出し前に行う）
    pub fn validate(&self) -> Result<()> {
        let (min_side, max_side) = MAX_IMAGE_SIDE_RANGE;
        if !(min_side..=max_side).contains(&self.max_image_side) {
            return Err(InspectionError::Config(format!(
                "最大画像サイズは {}〜{}px で指定してください: {}",
                min_side, max_side, self.max_image_side
            )));
        }

        let (min_q, max_q) = JPEG_QUALITY_RANGE;
        if !(min_q..=max_q).contains(&self.jpeg_quality) {
            return Err(InspectionError::Config(format!(
                "JPEG品質は {}〜{} で指定してください: {}",
                min_q, max_q, self.jpeg_quality
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(InspectionError::Config("タイムアウトは1秒以上にしてください".into()));
        }

        self.pdf_layout().validate()?;
        Ok(())
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            max_side: self.max_image_side,
            quality: self.jpeg_quality,
        }
    }

    pub fn pdf_layout(&self) -> PdfLayout {
        PdfLayout::a4_with_margins(self.margin_side_mm, self.margin_vertical_mm)
    }
}
