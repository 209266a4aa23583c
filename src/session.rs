//! セッション状態
//!
//! 直近の報告書を1つだけ持つ。更新は常に丸ごと置き換え。
//! PDF出力に失敗しても報告書は残り、そのまま再出力できる。

use crate::error::{InspectionError, Result};
use crate::export;
use inspection_ai_common::{PdfLayout, Report};
use std::path::Path;

#[derive(Debug, Default)]
pub struct SessionState {
    report: Option<Report>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新しい実行の開始（前回の報告書は破棄して返す）
    pub fn begin_run(&mut self) -> Option<Report> {
        self.report.take()
    }

    /// 実行結果を保存（既存のものと置き換え）
    pub fn store(&mut self, report: Report) -> Option<Report> {
        self.report.replace(report)
    }

    pub fn current(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    pub fn reset(&mut self) {
        self.report = None;
    }

    /// 保持中の報告書をPDFに書き出す
    pub fn export_pdf(&self, layout: &PdfLayout, output_path: &Path) -> Result<()> {
        let report = self.current().ok_or(InspectionError::NoReport)?;
        export::write_pdf(report, layout, output_path)
    }
}
