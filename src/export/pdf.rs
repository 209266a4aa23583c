//! PDF出力（printpdf）
//!
//! common の `build_document` が決めたブロック列を上から順に流し込む。
//! 座標はmm、カーソルは「次に書く行の上端」を表す。
//! 組み込みフォントのみ使うため、文字列は `pdf_safe_text` を通してから書く。

use crate::error::{InspectionError, Result};
use inspection_ai_common::export::pdf_core::{build_document, pdf_safe_text, DocBlock, TableRow};
use inspection_ai_common::layout::{
    line_height_mm, pt_to_mm, px_to_mm, wrap_text, FontMetrics, IMAGE_NATURAL_DPI,
};
use inspection_ai_common::{PdfLayout, Report, SummaryBlock};
use printpdf::*;
use std::path::Path;
use tracing::debug;

const TITLE_SIZE: f32 = 16.0;
const SECTION_SIZE: f32 = 14.0;
const HEADING_SIZE: f32 = 12.0;
const SUMMARY_LABEL_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const TABLE_SIZE: f32 = 9.0;
const CODE_SIZE: f32 = 8.0;

/// ラベル列の幅（メタ情報・フィールド）
const LABEL_COLUMN_MM: f32 = 38.0;
/// 表セルの内側余白
const CELL_PADDING_MM: f32 = 1.5;
const GRID_THICKNESS_PT: f32 = 0.5;

/// 報告書をPDFバイト列にする
pub fn render_pdf(report: &Report, layout: &PdfLayout) -> Result<Vec<u8>> {
    layout.validate()?;
    let blocks = build_document(report, layout);
    debug!("PDFブロック数: {}", blocks.len());

    let mut writer = PdfWriter::new(report_title(report), layout)?;
    for block in &blocks {
        writer.block(block)?;
    }
    writer.finish()
}

/// 報告書をPDFファイルに書き出す
pub fn write_pdf(report: &Report, layout: &PdfLayout, output_path: &Path) -> Result<()> {
    let bytes = render_pdf(report, layout)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output_path, bytes)?;
    Ok(())
}

fn report_title(report: &Report) -> String {
    match &report.header.client_name {
        Some(client) => pdf_safe_text(&format!("Inspection report - {}", client)),
        None => "Inspection report".to_string(),
    }
}

fn pdf_err(context: &str, e: impl std::fmt::Debug) -> InspectionError {
    InspectionError::PdfGeneration(format!("{}: {:?}", context, e))
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
}

#[derive(Clone, Copy)]
enum Face {
    Regular,
    Bold,
    Mono,
}

impl Face {
    fn metrics(self) -> FontMetrics {
        match self {
            Face::Regular => FontMetrics::Helvetica,
            Face::Bold => FontMetrics::HelveticaBold,
            Face::Mono => FontMetrics::Courier,
        }
    }
}

struct PdfWriter<'l> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    layout: &'l PdfLayout,
    /// 次に書く行の上端（ページ下端からのmm）
    cursor_mm: f32,
    page_count: usize,
}

impl<'l> PdfWriter<'l> {
    fn new(title: String, layout: &'l PdfLayout) -> Result<Self> {
        let (doc, page1, layer1) = PdfDocument::new(
            title,
            Mm(layout.page_width_mm),
            Mm(layout.page_height_mm),
            "Layer 1",
        );
        let layer = doc.get_page(page1).get_layer(layer1);

        let fonts = Fonts {
            regular: doc
                .add_builtin_font(BuiltinFont::Helvetica)
                .map_err(|e| pdf_err("フォント追加エラー", e))?,
            bold: doc
                .add_builtin_font(BuiltinFont::HelveticaBold)
                .map_err(|e| pdf_err("フォント追加エラー", e))?,
            mono: doc
                .add_builtin_font(BuiltinFont::Courier)
                .map_err(|e| pdf_err("フォント追加エラー", e))?,
        };

        let writer = Self {
            doc,
            layer,
            fonts,
            layout,
            cursor_mm: layout.page_height_mm - layout.margin_top_mm,
            page_count: 1,
        };
        writer.reset_colors();
        Ok(writer)
    }

    fn finish(self) -> Result<Vec<u8>> {
        debug!("PDFページ数: {}", self.page_count);
        self.doc
            .save_to_bytes()
            .map_err(|e| pdf_err("PDF保存エラー", e))
    }

    // ============================================
    // ページ送り
    // ============================================

    fn top_mm(&self) -> f32 {
        self.layout.page_height_mm - self.layout.margin_top_mm
    }

    fn at_page_top(&self) -> bool {
        (self.cursor_mm - self.top_mm()).abs() < f32::EPSILON
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.layout.page_width_mm),
            Mm(self.layout.page_height_mm),
            "Layer 1",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor_mm = self.top_mm();
        self.page_count += 1;
        self.reset_colors();
    }

    /// 残りが足りなければ改ページ（ページ先頭なら何もしない）
    fn ensure_space(&mut self, height_mm: f32) {
        if self.cursor_mm - height_mm < self.layout.margin_bottom_mm && !self.at_page_top() {
            self.new_page();
        }
    }

    fn advance(&mut self, height_mm: f32) {
        self.cursor_mm -= height_mm;
        if self.cursor_mm < self.layout.margin_bottom_mm {
            self.new_page();
        }
    }

    // ============================================
    // 描画プリミティブ
    // ============================================

    fn reset_colors(&self) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        self.layer.set_outline_color(Color::Rgb(Rgb::new(0.55, 0.55, 0.55, None)));
        self.layer.set_outline_thickness(GRID_THICKNESS_PT);
    }

    fn font(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.fonts.regular,
            Face::Bold => &self.fonts.bold,
            Face::Mono => &self.fonts.mono,
        }
    }

    /// 上端 `top_mm` の行にテキストを置く
    fn put_text(&self, text: &str, size: f32, face: Face, x_mm: f32, top_mm: f32) {
        if text.is_empty() {
            return;
        }
        let baseline = top_mm - pt_to_mm(size);
        self.layer
            .use_text(text, size, Mm(x_mm), Mm(baseline), self.font(face));
    }

    fn line(&self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y2)), false),
            ],
            is_closed: false,
        });
    }

    /// 折り返し済みの行を順に書く（行ごとに改ページ判定）
    fn lines(&mut self, lines: &[String], size: f32, face: Face, x_mm: f32) {
        let lh = line_height_mm(size);
        for line in lines {
            self.ensure_space(lh);
            self.put_text(line, size, face, x_mm, self.cursor_mm);
            self.cursor_mm -= lh;
        }
    }

    fn paragraph(&mut self, text: &str, size: f32, face: Face, indent_mm: f32) {
        let width = self.layout.usable_width_mm() - indent_mm;
        let wrapped = wrap_text(&pdf_safe_text(text), width, size, face.metrics());
        self.lines(&wrapped, size, face, self.layout.margin_left_mm + indent_mm);
    }

    /// ラベル列 + 値（値は折り返す）
    fn label_value(&mut self, label: &str, value: &str, size: f32) {
        let x = self.layout.margin_left_mm;
        let value_width = self.layout.usable_width_mm() - LABEL_COLUMN_MM;
        let wrapped = wrap_text(&pdf_safe_text(value), value_width, size, Face::Regular.metrics());
        let lh = line_height_mm(size);

        self.ensure_space(lh);
        self.put_text(&pdf_safe_text(&format!("{}:", label)), size, Face::Bold, x, self.cursor_mm);
        self.lines(&wrapped, size, Face::Regular, x + LABEL_COLUMN_MM);
    }

    // ============================================
    // ブロック
    // ============================================

    fn block(&mut self, block: &DocBlock<'_>) -> Result<()> {
        match block {
            DocBlock::Title(text) => {
                self.paragraph(text, TITLE_SIZE, Face::Bold, 0.0);
                self.advance(2.0);
            }
            DocBlock::MetaTable(rows) => {
                for (label, value) in rows {
                    self.label_value(label, value, BODY_SIZE);
                }
            }
            DocBlock::Heading(text) => {
                self.ensure_space(line_height_mm(HEADING_SIZE) + 20.0);
                self.paragraph(text, HEADING_SIZE, Face::Bold, 0.0);
                self.advance(2.0);
            }
            DocBlock::Image(bytes) => self.image(bytes)?,
            DocBlock::Field { label, value } => self.label_value(label, value, BODY_SIZE),
            DocBlock::FindingsTable { header, column_widths_mm, rows } => {
                self.advance(2.0);
                self.table(header, column_widths_mm, rows);
                self.advance(2.0);
            }
            DocBlock::Notice(text) => {
                self.layer.set_fill_color(Color::Rgb(Rgb::new(0.7, 0.1, 0.1, None)));
                self.paragraph(text, BODY_SIZE, Face::Bold, 0.0);
                self.reset_colors();
                self.advance(1.0);
            }
            DocBlock::Code(text) => self.paragraph(text, CODE_SIZE, Face::Mono, 0.0),
            DocBlock::SectionTitle(text) => {
                self.paragraph(text, SECTION_SIZE, Face::Bold, 0.0);
                self.advance(3.0);
            }
            DocBlock::Summary(summary) => self.summary(summary),
            DocBlock::Spacer(mm) => self.advance(*mm),
            DocBlock::PageBreak => self.new_page(),
        }
        Ok(())
    }

    /// 写真を埋め込む（壊れた画像は生成失敗として返す）
    fn image(&mut self, bytes: &[u8]) -> Result<()> {
        let decoded = printpdf::image_crate::load_from_memory(bytes)
            .map_err(|e| pdf_err("画像の埋め込みに失敗", e))?
            .to_rgb8();
        let (px_w, px_h) = decoded.dimensions();
        let rgb = printpdf::image_crate::DynamicImage::ImageRgb8(decoded);
        let (w_mm, h_mm) = self.layout.fit_image_mm(px_w, px_h);
        if w_mm <= 0.0 || h_mm <= 0.0 {
            return Ok(());
        }

        self.ensure_space(h_mm);
        let scale = w_mm / px_to_mm(px_w);
        let bottom = self.cursor_mm - h_mm;

        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(self.layout.margin_left_mm)),
                translate_y: Some(Mm(bottom)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_NATURAL_DPI),
                ..Default::default()
            },
        );
        self.cursor_mm = bottom;
        self.advance(3.0);
        Ok(())
    }

    fn table(&mut self, header: &[&str; 4], widths: &[f32; 4], rows: &[TableRow]) {
        let header_cells: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        self.table_row(&header_cells, widths, Face::Bold);

        for row in rows {
            let height = self.row_height(row, widths, Face::Regular);
            if self.cursor_mm - height < self.layout.margin_bottom_mm {
                // 見出し行は改ページ後にも繰り返す
                self.new_page();
                self.table_row(&header_cells, widths, Face::Bold);
            }
            self.table_row(row, widths, Face::Regular);
        }
    }

    fn wrap_cells(&self, cells: &[String], widths: &[f32; 4], face: Face) -> Vec<Vec<String>> {
        let lh = line_height_mm(TABLE_SIZE);
        let max_lines = ((self.layout.usable_height_mm() - 2.0 * CELL_PADDING_MM) / lh).floor().max(1.0) as usize;

        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| {
                let mut lines = wrap_text(
                    &pdf_safe_text(cell),
                    width - 2.0 * CELL_PADDING_MM,
                    TABLE_SIZE,
                    face.metrics(),
                );
                lines.truncate(max_lines);
                lines
            })
            .collect()
    }

    fn row_height(&self, cells: &[String], widths: &[f32; 4], face: Face) -> f32 {
        let wrapped = self.wrap_cells(cells, widths, face);
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        line_count as f32 * line_height_mm(TABLE_SIZE) + 2.0 * CELL_PADDING_MM
    }

    fn table_row(&mut self, cells: &[String], widths: &[f32; 4], face: Face) {
        let height = self.row_height(cells, widths, face);
        self.ensure_space(height);

        let top = self.cursor_mm;
        let bottom = top - height;
        let left = self.layout.margin_left_mm;
        let right = left + widths.iter().sum::<f32>();
        let lh = line_height_mm(TABLE_SIZE);

        let mut x = left;
        for (lines, width) in self.wrap_cells(cells, widths, face).iter().zip(widths.iter()) {
            for (i, line) in lines.iter().enumerate() {
                let line_top = top - CELL_PADDING_MM - i as f32 * lh;
                self.put_text(line, TABLE_SIZE, face, x + CELL_PADDING_MM, line_top);
            }
            x += width;
        }

        // 罫線
        self.line(left, top, right, top);
        self.line(left, bottom, right, bottom);
        let mut x = left;
        self.line(x, top, x, bottom);
        for width in widths {
            x += width;
            self.line(x, top, x, bottom);
        }

        self.cursor_mm = bottom;
    }

    fn summary(&mut self, block: &SummaryBlock) {
        if let Some(label) = &block.label {
            self.ensure_space(line_height_mm(SUMMARY_LABEL_SIZE) + line_height_mm(BODY_SIZE) * 2.0);
            self.paragraph(label, SUMMARY_LABEL_SIZE, Face::Bold, 0.0);
            self.advance(1.0);
        }
        for paragraph in &block.paragraphs {
            self.paragraph(paragraph, BODY_SIZE, Face::Regular, 0.0);
            self.advance(2.0);
        }
    }
}
