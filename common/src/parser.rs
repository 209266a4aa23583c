//! AI応答パーサー
//!
//! AIの応答テキストから構造化所見を取り出す。
//! 応答はJSONの前後に説明文やmarkdownが付くことがあるため寛容に扱うが、
//! 取り出せなかったときに値をでっち上げることはしない。

use crate::types::FindingRecord;
use serde_json::Value;

/// 抽出結果
///
/// `raw` は入力テキストそのもの（トリムもしない）。
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub record: Option<FindingRecord>,
    pub raw: String,
}

impl Extraction {
    pub fn ok(&self) -> bool {
        self.record.is_some()
    }
}

/// 応答テキストから所見を抽出する
///
/// 抽出優先順位:
/// 1. トリムした全文をJSONとしてパース
/// 2. 最初の `{` から最後の `}` までをパース
/// 3. 失敗（record = None）
///
/// どの段階でもエラーは返さない。
///
/// # Examples
/// ```
/// use inspection_ai_common::extract;
///
/// let extraction = extract("Segue a análise: {\"comodo_ou_area\": \"sala\"} Fim.");
/// assert!(extraction.ok());
/// assert_eq!(extraction.record.unwrap().area_label, "sala");
/// ```
pub fn extract(text: &str) -> Extraction {
    let trimmed = text.trim();

    let record = parse_record(trimmed).or_else(|| {
        outer_braces(trimmed).and_then(parse_record)
    });

    Extraction {
        record,
        raw: text.to_string(),
    }
}

/// 最初の `{` から最後の `}` まで
fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn parse_record(candidate: &str) -> Option<FindingRecord> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    FindingRecord::from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConditionStatus, ElementFinding};

    const KITCHEN: &str = r#"{"comodo_ou_area":"kitchen","itens":[{"elemento":"wall","material_acabamento":"paint","estado_conservacao":"amarelo","patologias_ou_observacoes":["cracking"]}],"observacoes_gerais":"minor wear","confianca":0.8}"#;

    fn kitchen_record() -> FindingRecord {
        FindingRecord {
            area_label: "kitchen".to_string(),
            elements: vec![ElementFinding {
                element: "wall".to_string(),
                material_or_finish: Some("paint".to_string()),
                condition: ConditionStatus::Fair,
                observations: vec!["cracking".to_string()],
            }],
            general_notes: "minor wear".to_string(),
            confidence: Some(0.8),
        }
    }

    #[test]
    fn test_extract_plain_json() {
        let extraction = extract(KITCHEN);
        assert!(extraction.ok());
        assert_eq!(extraction.record, Some(kitchen_record()));
    }

    #[test]
    fn test_extract_with_whitespace_keeps_raw_untrimmed() {
        let text = format!("\n  {}  \n", KITCHEN);
        let extraction = extract(&text);
        assert!(extraction.ok());
        assert_eq!(extraction.raw, text);
    }

    #[test]
    fn test_extract_with_surrounding_prose() {
        let text = format!("Here is the analysis:\n{}\nLet me know if you need more.", KITCHEN);
        let extraction = extract(&text);
        assert!(extraction.ok());
        assert_eq!(extraction.record, Some(kitchen_record()));
    }

    #[test]
    fn test_extract_markdown_fence() {
        let text = format!("```json\n{}\n```", KITCHEN);
        let extraction = extract(&text);
        assert_eq!(extraction.record, Some(kitchen_record()));
    }

    #[test]
    fn test_extract_no_json() {
        let text = "Sorry, I cannot process this image.";
        let extraction = extract(text);
        assert!(!extraction.ok());
        assert!(extraction.record.is_none());
        assert_eq!(extraction.raw, text);
    }

    #[test]
    fn test_extract_broken_json() {
        let text = r#"Result: {"comodo_ou_area": "sala", "itens": [ }"#;
        let extraction = extract(text);
        assert!(!extraction.ok());
        assert_eq!(extraction.raw, text);
    }

    #[test]
    fn test_extract_reversed_braces() {
        let extraction = extract("} nothing here {");
        assert!(!extraction.ok());
    }

    #[test]
    fn test_extract_two_objects_is_failure() {
        // 最初の { から最後の } までなので、2つのオブジェクトは1つのJSONにならない
        let extraction = extract(r#"{"comodo_ou_area": "a"} and {"comodo_ou_area": "b"}"#);
        assert!(!extraction.ok());
    }

    #[test]
    fn test_extract_top_level_array_is_not_a_record() {
        let extraction = extract(r#"[{"comodo_ou_area": "sala"}]"#);
        // 全文は配列なので不可、中の {..} は抽出できる
        assert!(extraction.ok());
        assert_eq!(extraction.record.unwrap().area_label, "sala");

        assert!(!extract("[1, 2, 3]").ok());
    }

    #[test]
    fn test_extract_empty() {
        let extraction = extract("");
        assert!(!extraction.ok());
        assert_eq!(extraction.raw, "");
    }
}
