//! プロンプト生成モジュール
//!
//! - build_finding_prompt: 写真1枚の所見（JSONオブジェクト1つ）
//! - build_summary_prompt: 全写真を通した総括（自由文）
//! - build_summary_context: 総括用に渡す所見一覧（JSON配列）

use crate::types::InspectionItem;
use serde_json::{json, Value};

/// 総括コンテキストに載せる生テキストの上限（文字数）
pub const SUMMARY_RAW_EXCERPT_CHARS: usize = 500;

/// 状態の選択肢（スキーマ上の値）
pub const CONDITION_VALUES: &[&str] = &["verde", "amarelo", "vermelho", "nao_identificavel"];

/// 写真1枚の解析用プロンプト
pub fn build_finding_prompt() -> String {
    let conditions = CONDITION_VALUES.join("|");

    format!(
        r#"You are an expert in visual property inspection analysing ONE photo.

Return ONLY one valid JSON object (no markdown, no text outside the JSON) with this schema:

{{
  "comodo_ou_area": "string (e.g. living room, kitchen, facade, bathroom, garage, outdoor area...)",
  "itens": [
    {{
      "elemento": "string (e.g. wall, floor, ceiling, window, door, countertop, cladding...)",
      "material_acabamento": "string or null",
      "estado_conservacao": "{conditions}",
      "patologias_ou_observacoes": ["string", "..."]
    }}
  ],
  "observacoes_gerais": "string",
  "confianca": 0.0
}}

Rules:
- "estado_conservacao": verde = good, amarelo = fair, vermelho = poor.
- If something cannot be identified with confidence, use "nao_identificavel" and/or null.
- If the room or area cannot be identified, use "nao_identificavel" for "comodo_ou_area".
- "confianca" must be a number between 0 and 1.
- Be objective and technical. Do not invent anything that is not visible."#
    )
}

/// 総括用プロンプト
pub fn build_summary_prompt() -> String {
    r#"You will receive a set of photo analyses (structured JSON, or a fallback with the raw answer).
Write a technical, objective OVERALL SUMMARY with these sections:
- Main Findings (top 5)
- Points of Attention (if any)
- Recommendations (next steps)
- Limitations: visual inspection from photos only, no measurements, no invasive testing

Start each section with its title on its own line and separate paragraphs with a blank line.
Return ONLY text (no JSON)."#
        .to_string()
}

/// 総括用コンテキスト（写真ごとの所見、失敗時は生テキストの抜粋）
pub fn build_summary_context(items: &[InspectionItem]) -> String {
    let compact: Vec<Value> = items
        .iter()
        .map(|item| match item.finding() {
            Some(record) => serde_json::to_value(record).unwrap_or(Value::Null),
            None => json!({
                "erro": true,
                "raw": item.raw_text.chars().take(SUMMARY_RAW_EXCERPT_CHARS).collect::<String>(),
            }),
        })
        .collect();

    Value::Array(compact).to_string()
}
