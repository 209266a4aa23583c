//! 所見の正規化
//!
//! AIが返す状態コードや所見リストは表記・形がばらつくため、
//! 画面表示用とPDF印字用の形にそろえる。
//! - 状態コード → 4種類の固定ラベル（未知の値も必ずどれかに落ちる）
//! - 所見 → 空でない文字列の列（配列でもスカラーでも受け付ける）

use crate::types::ConditionStatus;
use serde_json::Value;

/// 所見をインライン表示するときの区切り
pub const OBSERVATION_DELIMITER: &str = "; ";

/// 所見が空のときの表示
pub const NO_OBSERVATIONS: &str = "none";

/// 状態コードを正規化する（全域関数）
///
/// 原語（verde/amarelo/vermelho/nao_identificavel）と英語の両方を受け付ける。
/// 大文字小文字と前後の空白は無視する。どれにも当たらなければ
/// `Unrecognized` に元の値を保持したまま入れる。
pub fn normalize_status(raw: &str) -> ConditionStatus {
    let key = raw.trim().to_lowercase().replace(['-', ' '], "_");
    match key.as_str() {
        "verde" | "good" | "green" => ConditionStatus::Good,
        "amarelo" | "fair" | "yellow" => ConditionStatus::Fair,
        "vermelho" | "poor" | "red" => ConditionStatus::Poor,
        "nao_identificavel" | "não_identificável" | "nao_identificável"
        | "não_identificavel" | "non_identifiable" | "nonidentifiable"
        | "not_identifiable" | "unknown" => ConditionStatus::NonIdentifiable,
        _ => ConditionStatus::Unrecognized(raw.to_string()),
    }
}

/// 状態の表示ラベル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLabel {
    pub glyph: &'static str,
    pub label: &'static str,
}

impl StatusLabel {
    pub const GOOD: StatusLabel = StatusLabel { glyph: "🟢", label: "Good" };
    pub const FAIR: StatusLabel = StatusLabel { glyph: "🟡", label: "Fair" };
    pub const POOR: StatusLabel = StatusLabel { glyph: "🔴", label: "Poor" };
    pub const NON_IDENTIFIABLE: StatusLabel = StatusLabel {
        glyph: "⚪",
        label: "Non-identifiable",
    };

    /// 画面表示用（絵文字付き）
    pub fn display(&self) -> String {
        format!("{} {}", self.glyph, self.label)
    }

    /// PDF印字用（組み込みフォントに絵文字が無いのでラベルのみ）
    pub fn print(&self) -> &'static str {
        self.label
    }
}

impl From<&ConditionStatus> for StatusLabel {
    fn from(status: &ConditionStatus) -> Self {
        match status {
            ConditionStatus::Good => StatusLabel::GOOD,
            ConditionStatus::Fair => StatusLabel::FAIR,
            ConditionStatus::Poor => StatusLabel::POOR,
            ConditionStatus::NonIdentifiable | ConditionStatus::Unrecognized(_) => {
                StatusLabel::NON_IDENTIFIABLE
            }
        }
    }
}

/// 所見フィールドを文字列の列にそろえる
///
/// 配列なら各要素を、スカラーなら1要素として扱う。
/// null・空文字は落とし、数値と真偽値は文字列化する。順序は保つ。
pub fn normalize_observations(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// 所見をインライン表示用に連結する（空なら "none"）
pub fn join_observations(observations: &[String]) -> String {
    if observations.is_empty() {
        NO_OBSERVATIONS.to_string()
    } else {
        observations.join(OBSERVATION_DELIMITER)
    }
}
