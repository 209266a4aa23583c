//! 点検報告書の組み立て
//!
//! 写真ごとの結果・ヘッダ・総括・メタ情報から報告書を1つ作る。
//! I/Oは行わない。失敗した写真も1行として必ず残す。

use crate::error::Result;
use crate::types::InspectionItem;
use serde::{Deserialize, Serialize};

/// 報告書ヘッダ（依頼者・物件住所）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub property_address: Option<String>,
}

impl ReportHeader {
    /// 前後の空白を落とし、空なら未設定にする
    pub fn new(client_name: Option<&str>, property_address: Option<&str>) -> Self {
        Self {
            client_name: clean(client_name),
            property_address: clean(property_address),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.client_name.is_none() && self.property_address.is_none()
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// 実行メタ情報
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    /// 生成日時（"YYYY-MM-DD HH:MM:SS"）
    pub generated_at: String,
    /// 使用したモデルID
    pub model: String,
    pub item_count: usize,
    pub elapsed_seconds: f64,
    /// 生成日時のタイムゾーン表記（例: "UTC-03:00"）
    pub timezone_label: String,
}

/// 点検報告書
///
/// 一度組み立てたら部分的には変更しない。作り直すときは丸ごと置き換える。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub header: ReportHeader,
    pub meta: ReportMeta,
    pub items: Vec<InspectionItem>,
    #[serde(default)]
    pub summary_text: String,
}

impl Report {
    /// 構造化に失敗した写真の数
    pub fn failed_count(&self) -> usize {
        self.items.iter().filter(|item| !item.parse_ok).count()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 報告書を組み立てる
///
/// 写真の順序はそのまま。`meta.item_count` は写真数に合わせる。
pub fn assemble(
    header: ReportHeader,
    items: Vec<InspectionItem>,
    summary_text: impl Into<String>,
    meta: ReportMeta,
) -> Report {
    let header = ReportHeader::new(
        header.client_name.as_deref(),
        header.property_address.as_deref(),
    );
    let meta = ReportMeta {
        item_count: items.len(),
        ..meta
    };

    Report {
        header,
        meta,
        items,
        summary_text: summary_text.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract;

    fn meta() -> ReportMeta {
        ReportMeta {
            generated_at: "2026-10-16 09:30:00".to_string(),
            model: "models/gemini-1.5-flash".to_string(),
            item_count: 0,
            elapsed_seconds: 12.34,
            timezone_label: "UTC-03:00".to_string(),
        }
    }

    #[test]
    fn test_assemble_preserves_order_and_failures() {
        let items = vec![
            InspectionItem::from_extraction("c.jpg", None, None, extract(r#"{"comodo_ou_area": "sala"}"#)),
            InspectionItem::failed("a.jpg", None, None, "Error analyzing this image: quota"),
            InspectionItem::from_extraction("b.jpg", None, None, extract("no json")),
        ];

        let report = assemble(ReportHeader::default(), items, "summary", meta());

        let names: Vec<&str> = report.items.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["c.jpg", "a.jpg", "b.jpg"]);
        assert_eq!(report.meta.item_count, 3);
        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.summary_text, "summary");
    }

    #[test]
    fn test_assemble_cleans_header() {
        let header = ReportHeader {
            client_name: Some("  Maria Souza ".to_string()),
            property_address: Some("   ".to_string()),
        };
        let report = assemble(header, Vec::new(), "", meta());
        assert_eq!(report.header.client_name.as_deref(), Some("Maria Souza"));
        assert_eq!(report.header.property_address, None);
        assert_eq!(report.meta.item_count, 0);
    }

    #[test]
    fn test_report_json_round_trip() {
        let items = vec![InspectionItem::from_extraction(
            "sala.jpg",
            Some(vec![1, 2, 3]),
            Some("abc".to_string()),
            extract(r#"{"comodo_ou_area": "sala", "itens": [{"elemento": "piso", "estado_conservacao": "verde"}]}"#),
        )];
        let report = assemble(ReportHeader::new(Some("Ana"), None), items, "ok", meta());

        let json = report.to_json().unwrap();
        let back = Report::from_json(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(Report::from_json("{\"header\": 1}").is_err());
    }
}
