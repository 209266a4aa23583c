//! 点検結果の型定義
//!
//! CLIと共有される型:
//! - FindingRecord: 写真1枚分の構造化所見（AI応答から復元）
//! - ElementFinding: 部位ごとの所見
//! - InspectionItem: 解析済み写真1枚（失敗時も生テキストを保持）

use crate::normalizer::{normalize_observations, normalize_status};
use crate::parser::Extraction;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// 部位の状態
///
/// `Unrecognized` は表示上は判別不能扱いだが、診断用に元の値を残す。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    Good,
    Fair,
    Poor,
    #[default]
    NonIdentifiable,
    Unrecognized(String),
}

impl ConditionStatus {
    /// AIに指示しているスキーマ上の値
    pub fn wire_value(&self) -> &str {
        match self {
            ConditionStatus::Good => "verde",
            ConditionStatus::Fair => "amarelo",
            ConditionStatus::Poor => "vermelho",
            ConditionStatus::NonIdentifiable => "nao_identificavel",
            ConditionStatus::Unrecognized(raw) => raw,
        }
    }
}

impl Serialize for ConditionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_value())
    }
}

/// 部位ごとの所見
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ElementFinding {
    #[serde(rename = "elemento")]
    pub element: String,

    #[serde(rename = "material_acabamento")]
    pub material_or_finish: Option<String>,

    #[serde(rename = "estado_conservacao")]
    pub condition: ConditionStatus,

    #[serde(rename = "patologias_ou_observacoes")]
    pub observations: Vec<String>,
}

/// 写真1枚分の構造化所見
///
/// シリアライズはAIへ指示したスキーマのキー名で行う。
/// デシリアライズは必ず [`FindingRecord::from_value`] を経由する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct FindingRecord {
    #[serde(rename = "comodo_ou_area")]
    pub area_label: String,

    #[serde(rename = "itens")]
    pub elements: Vec<ElementFinding>,

    #[serde(rename = "observacoes_gerais")]
    pub general_notes: String,

    #[serde(rename = "confianca")]
    pub confidence: Option<f64>,
}

const AREA_KEYS: &[&str] = &["comodo_ou_area", "area", "areaLabel", "area_label"];
const ELEMENTS_KEYS: &[&str] = &["itens", "items", "elements"];
const NOTES_KEYS: &[&str] = &["observacoes_gerais", "notes", "generalNotes", "general_notes"];
const CONFIDENCE_KEYS: &[&str] = &["confianca", "confidence"];
const ELEMENT_KEYS: &[&str] = &["elemento", "element"];
const MATERIAL_KEYS: &[&str] = &["material_acabamento", "material", "materialOrFinish", "material_or_finish"];
const STATUS_KEYS: &[&str] = &["estado_conservacao", "status", "conditionStatus", "condition_status"];
const OBSERVATION_KEYS: &[&str] = &["patologias_ou_observacoes", "observations"];

impl FindingRecord {
    /// JSON値から所見を組み立てる
    ///
    /// トップレベルがオブジェクトでなければ `None`。
    /// 各フィールドは欠落・null・型違いのとき既定値になる。
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let elements = match field(obj, ELEMENTS_KEYS) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_object())
                .map(ElementFinding::from_object)
                .collect(),
            Some(Value::Object(single)) => vec![ElementFinding::from_object(single)],
            _ => Vec::new(),
        };

        Some(Self {
            area_label: field(obj, AREA_KEYS).and_then(text).unwrap_or_default(),
            elements,
            general_notes: field(obj, NOTES_KEYS).and_then(text).unwrap_or_default(),
            confidence: field(obj, CONFIDENCE_KEYS).and_then(number),
        })
    }

    /// 信頼度が [0,1] に収まっているか（未設定なら true）
    ///
    /// 範囲外の値も表示はそのまま行う。診断ログ用。
    pub fn confidence_in_range(&self) -> bool {
        self.confidence.map_or(true, |c| (0.0..=1.0).contains(&c))
    }
}

impl TryFrom<Value> for FindingRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value).ok_or_else(|| "finding record must be a JSON object".to_string())
    }
}

impl ElementFinding {
    fn from_object(obj: &Map<String, Value>) -> Self {
        let condition = match field(obj, STATUS_KEYS) {
            Some(Value::String(s)) => normalize_status(s),
            Some(other) => ConditionStatus::Unrecognized(other.to_string()),
            None => ConditionStatus::NonIdentifiable,
        };

        Self {
            element: field(obj, ELEMENT_KEYS).and_then(text).unwrap_or_default(),
            material_or_finish: field(obj, MATERIAL_KEYS)
                .and_then(text)
                .filter(|s| !s.trim().is_empty()),
            condition,
            observations: field(obj, OBSERVATION_KEYS)
                .map(normalize_observations)
                .unwrap_or_default(),
        }
    }
}

/// 候補キーのうち最初に見つかった非nullの値
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 解析済み写真1枚
///
/// `structured.is_some() == parse_ok` はコンストラクタで保証する。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionItem {
    pub filename: String,

    /// 正規化済みJPEG（画面表示・PDF埋め込み用）
    #[serde(default, with = "base64_bytes")]
    pub image_bytes: Option<Vec<u8>>,

    /// image_bytes のSHA-256
    #[serde(default)]
    pub image_hash: Option<String>,

    #[serde(default)]
    pub parse_ok: bool,

    #[serde(default)]
    pub structured: Option<FindingRecord>,

    /// AIの応答そのまま（失敗時は診断メッセージ）
    #[serde(default)]
    pub raw_text: String,
}

impl InspectionItem {
    /// 抽出結果から生成
    pub fn from_extraction(
        filename: impl Into<String>,
        image_bytes: Option<Vec<u8>>,
        image_hash: Option<String>,
        extraction: Extraction,
    ) -> Self {
        let parse_ok = extraction.ok();
        Self {
            filename: filename.into(),
            image_bytes,
            image_hash,
            parse_ok,
            structured: extraction.record,
            raw_text: extraction.raw,
        }
    }

    /// プロバイダ呼び出し失敗時のフォールバック
    pub fn failed(
        filename: impl Into<String>,
        image_bytes: Option<Vec<u8>>,
        image_hash: Option<String>,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            image_bytes,
            image_hash,
            parse_ok: false,
            structured: None,
            raw_text: diagnostic.into(),
        }
    }

    /// 表示用に構造化所見を取り出す（parse_ok かつ所見ありのときのみ）
    pub fn finding(&self) -> Option<&FindingRecord> {
        if self.parse_ok {
            self.structured.as_ref()
        } else {
            None
        }
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&STANDARD.encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|e| STANDARD.decode(e).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_wire_keys() {
        let value = json!({
            "comodo_ou_area": "cozinha",
            "itens": [{
                "elemento": "parede",
                "material_acabamento": "pintura",
                "estado_conservacao": "vermelho",
                "patologias_ou_observacoes": ["fissura", "mofo"]
            }],
            "observacoes_gerais": "umidade",
            "confianca": 0.7
        });

        let record = FindingRecord::from_value(&value).unwrap();
        assert_eq!(record.area_label, "cozinha");
        assert_eq!(record.elements.len(), 1);
        assert_eq!(record.elements[0].material_or_finish.as_deref(), Some("pintura"));
        assert_eq!(record.elements[0].condition, ConditionStatus::Poor);
        assert_eq!(record.elements[0].observations, vec!["fissura", "mofo"]);
        assert_eq!(record.confidence, Some(0.7));
    }

    #[test]
    fn test_from_value_defaults() {
        let record = FindingRecord::from_value(&json!({})).unwrap();
        assert_eq!(record, FindingRecord::default());

        let record = FindingRecord::from_value(&json!({
            "itens": [{"elemento": "piso", "material_acabamento": null}],
            "confianca": "n/a"
        }))
        .unwrap();
        assert_eq!(record.elements[0].material_or_finish, None);
        assert_eq!(record.elements[0].condition, ConditionStatus::NonIdentifiable);
        assert!(record.elements[0].observations.is_empty());
        assert_eq!(record.confidence, None);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(FindingRecord::from_value(&json!([1, 2])).is_none());
        assert!(FindingRecord::from_value(&json!("texto")).is_none());
    }

    #[test]
    fn test_status_non_string_is_unrecognized() {
        let record = FindingRecord::from_value(&json!({
            "itens": [{"elemento": "teto", "estado_conservacao": 3}]
        }))
        .unwrap();
        assert_eq!(
            record.elements[0].condition,
            ConditionStatus::Unrecognized("3".to_string())
        );
    }

    #[test]
    fn test_confidence_out_of_range_passes_through() {
        let record = FindingRecord::from_value(&json!({"confianca": 1.8})).unwrap();
        assert_eq!(record.confidence, Some(1.8));
        assert!(!record.confidence_in_range());
    }

    #[test]
    fn test_record_serialize_round_trip() {
        let value = json!({
            "comodo_ou_area": "banheiro",
            "itens": [{
                "elemento": "piso",
                "material_acabamento": "ceramica",
                "estado_conservacao": "roxo",
                "patologias_ou_observacoes": []
            }],
            "observacoes_gerais": "",
            "confianca": null
        });
        let record = FindingRecord::from_value(&value).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_item_serialize_image_as_base64() {
        let item = InspectionItem::failed("a.jpg", Some(vec![0xff, 0xd8, 0xff]), None, "boom");
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"imageBytes\":\"/9j/\""));
        assert!(json.contains("\"rawText\":\"boom\""));

        let back: InspectionItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_failed_item_has_no_finding() {
        let item = InspectionItem::failed("b.jpg", None, None, "timeout");
        assert!(!item.parse_ok);
        assert!(item.finding().is_none());
        assert_eq!(item.raw_text, "timeout");
    }
}
