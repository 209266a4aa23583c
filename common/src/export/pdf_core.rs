//! PDF export core: the ordered block list the PDF writer consumes.
//!
//! Page geometry and glyph output live in the writer; this module only
//! decides which blocks appear, in which order, with which text.

use crate::layout::PdfLayout;
use crate::normalizer::{join_observations, StatusLabel};
use crate::report::Report;
use crate::summary::{segment_summary, SummaryBlock};
use crate::types::{FindingRecord, InspectionItem};

pub const REPORT_TITLE: &str = "Property Inspection Report (AI)";
pub const SUMMARY_TITLE: &str = "Overall Summary";
pub const FALLBACK_NOTICE: &str = "Structuring the answer as JSON failed. Raw answer below:";
pub const TRUNCATION_MARK: &str = "...";

/// 所見表の1行（Element / Material/Finish / Status / Observations）
pub type TableRow = [String; 4];

/// PDFの構造ブロック
#[derive(Debug, Clone, PartialEq)]
pub enum DocBlock<'a> {
    Title(String),
    /// ラベルと値の表（報告書メタ情報）
    MetaTable(Vec<(String, String)>),
    Heading(String),
    /// 埋め込み写真（正規化済みJPEG）
    Image(&'a [u8]),
    /// "Label: value" の1行
    Field { label: String, value: String },
    FindingsTable {
        header: [&'static str; 4],
        column_widths_mm: [f32; 4],
        rows: Vec<TableRow>,
    },
    /// 構造化失敗の注意書き
    Notice(String),
    /// 等幅で印字する生テキスト
    Code(String),
    SectionTitle(String),
    Summary(SummaryBlock),
    Spacer(f32),
    PageBreak,
}

/// 報告書からブロック列を組み立てる
pub fn build_document<'a>(report: &'a Report, layout: &PdfLayout) -> Vec<DocBlock<'a>> {
    let mut blocks = vec![
        DocBlock::Title(REPORT_TITLE.to_string()),
        DocBlock::MetaTable(meta_rows(report)),
        DocBlock::Spacer(6.0),
    ];

    let last = report.items.len().saturating_sub(1);
    for (idx, item) in report.items.iter().enumerate() {
        push_item(&mut blocks, idx, item, layout);
        if idx < last {
            blocks.push(DocBlock::PageBreak);
        }
    }

    // 写真がある場合のみ総括を新しいページから始める
    if !report.items.is_empty() {
        blocks.push(DocBlock::PageBreak);
    }
    blocks.push(DocBlock::SectionTitle(SUMMARY_TITLE.to_string()));
    blocks.extend(segment_summary(&report.summary_text).into_iter().map(DocBlock::Summary));

    blocks
}

fn meta_rows(report: &Report) -> Vec<(String, String)> {
    let meta = &report.meta;
    let generated_at = if meta.timezone_label.is_empty() {
        meta.generated_at.clone()
    } else {
        format!("{} ({})", meta.generated_at, meta.timezone_label)
    };

    let mut rows = vec![
        ("Generated at".to_string(), generated_at),
        ("Model".to_string(), meta.model.clone()),
        ("Photos analyzed".to_string(), meta.item_count.to_string()),
        ("Elapsed time".to_string(), format!("{:.2} s", meta.elapsed_seconds)),
    ];
    if let Some(client) = &report.header.client_name {
        rows.push(("Client".to_string(), client.clone()));
    }
    if let Some(address) = &report.header.property_address {
        rows.push(("Address".to_string(), address.clone()));
    }
    rows
}

fn push_item<'a>(blocks: &mut Vec<DocBlock<'a>>, idx: usize, item: &'a InspectionItem, layout: &PdfLayout) {
    blocks.push(DocBlock::Heading(format!("Photo {}: {}", idx + 1, item.filename)));

    if let Some(bytes) = item.image_bytes.as_deref().filter(|b| !b.is_empty()) {
        blocks.push(DocBlock::Image(bytes));
    }

    match item.finding() {
        Some(record) => push_finding(blocks, record, layout),
        None => {
            blocks.push(DocBlock::Notice(FALLBACK_NOTICE.to_string()));
            blocks.push(DocBlock::Code(truncate_chars(&item.raw_text, layout.raw_text_limit)));
        }
    }
}

fn push_finding(blocks: &mut Vec<DocBlock<'_>>, record: &FindingRecord, layout: &PdfLayout) {
    blocks.push(DocBlock::Field {
        label: "Room/Area".to_string(),
        value: record.area_label.clone(),
    });
    if let Some(confidence) = record.confidence {
        blocks.push(DocBlock::Field {
            label: "Confidence".to_string(),
            value: format_confidence(confidence),
        });
    }
    if !record.general_notes.trim().is_empty() {
        blocks.push(DocBlock::Field {
            label: "General notes".to_string(),
            value: record.general_notes.clone(),
        });
    }

    blocks.push(DocBlock::FindingsTable {
        header: crate::layout::FINDINGS_HEADER,
        column_widths_mm: layout.findings_column_widths_mm(),
        rows: findings_rows(record),
    });
}

/// 所見表の行（印字用ラベル）
pub fn findings_rows(record: &FindingRecord) -> Vec<TableRow> {
    record
        .elements
        .iter()
        .map(|finding| {
            [
                finding.element.clone(),
                finding.material_or_finish.clone().unwrap_or_default(),
                StatusLabel::from(&finding.condition).print().to_string(),
                join_observations(&finding.observations),
            ]
        })
        .collect()
}

/// 信頼度の表示（丸めず、範囲外もそのまま）
pub fn format_confidence(confidence: f64) -> String {
    if confidence == 0.0 {
        // -0.0 も "0"
        return "0".to_string();
    }
    confidence.to_string()
}

/// 文字数で切り詰める（切ったときは "..." を付ける）
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARK),
        None => text.to_string(),
    }
}

/// 組み込みフォント（WinAnsi）で印字できる文字にそろえる
///
/// 記号類はASCIIに寄せ、Latin-1外の文字は '?' にする。
pub fn pdf_safe_text(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => Some('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => Some('-'),
            '\u{2022}' | '\u{25CF}' => Some('-'),
            '\u{2026}' => Some('.'),
            '\t' => Some(' '),
            '\r' => None,
            '\n' => Some('\n'),
            c if c.is_control() => None,
            c if (c as u32) < 0x7F => Some(c),
            c if (0xA0..=0xFF).contains(&(c as u32)) => Some(c),
            _ => Some('?'),
        })
        .collect()
}
