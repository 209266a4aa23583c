//! AIプロバイダ
//!
//! 画像付きの所見解析と、テキストのみの総括生成の2種類の呼び出しを持つ。
//! 応答は自由文で、スキーマ準拠は保証されない（抽出は parser 側で行う）。

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;

/// モデル一覧が取れないときに使うモデル
pub const FALLBACK_MODEL: &str = "models/gemini-1.5-flash";

/// 画像を扱えるLLMプロバイダ
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// 報告書に載せるモデルID
    fn model_id(&self) -> &str;

    /// プロンプト + JPEG → 応答テキスト
    async fn analyze_image(&self, prompt: &str, jpeg: &[u8]) -> Result<String>;

    /// プロンプト + コンテキスト（JSON） → 応答テキスト
    async fn summarize(&self, prompt: &str, context: &str) -> Result<String>;
}

/// モデル名を "models/..." 形式にそろえる
pub fn normalize_model_id(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

/// 既定モデルの選択（flash → pro → 先頭）
pub fn pick_default_model(models: &[String]) -> Option<&String> {
    ["flash", "pro"]
        .iter()
        .find_map(|key| models.iter().find(|m| m.to_lowercase().contains(key)))
        .or_else(|| models.first())
}
