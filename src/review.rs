//! 報告書の画面表示（ターミナル）
//!
//! PDFと同じ順序で並べる。状態は絵文字付きラベルで表示する。

use inspection_ai_common::export::pdf_core::{format_confidence, FALLBACK_NOTICE, SUMMARY_TITLE};
use inspection_ai_common::{
    join_observations, ConditionStatus, FindingRecord, InspectionItem, Report, StatusLabel,
};
use std::fmt::Write as _;

const RULE: &str = "────────────────────────────────────────";

/// 報告書をテキストに整形する
pub fn format_report(report: &Report) -> String {
    let mut out = String::new();
    let meta = &report.meta;

    let _ = writeln!(
        out,
        "Photos: {} | Failed: {} | Time: {:.2} s | Model: {}",
        meta.item_count,
        report.failed_count(),
        meta.elapsed_seconds,
        meta.model
    );
    if !meta.generated_at.is_empty() {
        let _ = writeln!(out, "Generated at: {} {}", meta.generated_at, meta.timezone_label);
    }
    if let Some(client) = &report.header.client_name {
        let _ = writeln!(out, "Client: {}", client);
    }
    if let Some(address) = &report.header.property_address {
        let _ = writeln!(out, "Address: {}", address);
    }

    for (idx, item) in report.items.iter().enumerate() {
        let _ = writeln!(out, "\n{}", RULE);
        let _ = writeln!(out, "Photo {}: {}", idx + 1, item.filename);
        format_item(&mut out, item);
    }

    let _ = writeln!(out, "\n{}", RULE);
    let _ = writeln!(out, "{}", SUMMARY_TITLE);
    if report.summary_text.trim().is_empty() {
        let _ = writeln!(out, "(no summary)");
    } else {
        let _ = writeln!(out, "{}", report.summary_text.trim_end());
    }

    out
}

fn format_item(out: &mut String, item: &InspectionItem) {
    match item.finding() {
        Some(record) => format_finding(out, record),
        None => {
            let _ = writeln!(out, "⚠ {}", FALLBACK_NOTICE);
            let _ = writeln!(out, "{}", item.raw_text.trim_end());
        }
    }
}

fn format_finding(out: &mut String, record: &FindingRecord) {
    let _ = writeln!(out, "Room/Area: {}", record.area_label);
    if let Some(confidence) = record.confidence {
        let _ = writeln!(out, "Confidence: {}", format_confidence(confidence));
    }
    if !record.general_notes.trim().is_empty() {
        let _ = writeln!(out, "General notes: {}", record.general_notes);
    }

    if record.elements.is_empty() {
        let _ = writeln!(out, "(no elements)");
        return;
    }

    for finding in &record.elements {
        let material = finding.material_or_finish.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "  - {} [{}] {}: {}",
            finding.element,
            material,
            status_text(&finding.condition),
            join_observations(&finding.observations)
        );
    }
}

/// 絵文字付きラベル（未知の値は原文を添える）
fn status_text(status: &ConditionStatus) -> String {
    let label = StatusLabel::from(status).display();
    match status {
        ConditionStatus::Unrecognized(raw) => format!("{} ({})", label, raw),
        _ => label,
    }
}
