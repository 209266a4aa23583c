//! レイアウト設定モジュール
//!
//! mm基準のレイアウト定義（Source of Truth）
//! 点検報告書: A4縦、1写真1セクション、所見表4列

use crate::error::{Error, Result};

// ============================================
// mm基準レイアウト（Source of Truth）
// ============================================

/// A4サイズ（mm）
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

/// 余白既定値（mm）
pub const MARGIN_SIDE_MM: f32 = 20.0;
pub const MARGIN_VERTICAL_MM: f32 = 18.0;

/// 写真の最大表示高さ（mm）
pub const MAX_IMAGE_HEIGHT_MM: f32 = 90.0;

/// 写真の原寸とみなす解像度（これ以上は拡大しない）
pub const IMAGE_NATURAL_DPI: f32 = 96.0;

/// 構造化失敗時に印字する生テキストの上限（文字数）
pub const RAW_TEXT_LIMIT: usize = 2500;

/// 所見表の列幅比率（Element / Material/Finish / Status / Observations）
pub const FINDINGS_COLUMN_RATIOS: [f32; 4] = [0.20, 0.33, 0.14, 0.33];

/// 所見表の見出し
pub const FINDINGS_HEADER: [&str; 4] = ["Element", "Material/Finish", "Status", "Observations"];

// ============================================
// 変換係数
// ============================================

/// pt → mm変換 (1pt = 25.4/72 mm ≈ 0.3528mm)
pub const PT_TO_MM: f32 = 25.4 / 72.0;

/// mm → inch
pub const MM_PER_INCH: f32 = 25.4;

// ============================================
// フォント寸法（組み込みフォント）
// ============================================

/// Helvetica の字幅（AFM、1/1000 em、0x20..=0x7E）
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Helvetica-Bold の字幅（AFM、1/1000 em、0x20..=0x7E）
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// 表にない文字の字幅（数字幅）
const DEFAULT_WIDTH: u16 = 556;

/// Courier は全字 600
const COURIER_WIDTH: u16 = 600;

/// 行送り（フォントサイズ比）
pub const LINE_SPACING: f32 = 1.3;

// ============================================
// レイアウト設定構造体
// ============================================

/// PDFレイアウト設定
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    /// ページ幅（mm）
    pub page_width_mm: f32,
    /// ページ高さ（mm）
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    /// 写真の最大高さ（mm）
    pub max_image_height_mm: f32,
    /// 生テキストの印字上限（文字数）
    pub raw_text_limit: usize,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::a4()
    }
}

impl PdfLayout {
    /// A4縦・既定余白
    pub fn a4() -> Self {
        Self {
            page_width_mm: A4_WIDTH_MM,
            page_height_mm: A4_HEIGHT_MM,
            margin_left_mm: MARGIN_SIDE_MM,
            margin_right_mm: MARGIN_SIDE_MM,
            margin_top_mm: MARGIN_VERTICAL_MM,
            margin_bottom_mm: MARGIN_VERTICAL_MM,
            max_image_height_mm: MAX_IMAGE_HEIGHT_MM,
            raw_text_limit: RAW_TEXT_LIMIT,
        }
    }

    /// 余白を指定したA4
    pub fn a4_with_margins(side_mm: f32, vertical_mm: f32) -> Self {
        Self {
            margin_left_mm: side_mm,
            margin_right_mm: side_mm,
            margin_top_mm: vertical_mm,
            margin_bottom_mm: vertical_mm,
            ..Self::a4()
        }
    }

    /// 余白が印字領域を潰していないか確認
    pub fn validate(&self) -> Result<()> {
        let margins = [
            self.margin_left_mm,
            self.margin_right_mm,
            self.margin_top_mm,
            self.margin_bottom_mm,
        ];
        if margins.iter().any(|m| !m.is_finite() || *m < 0.0) {
            return Err(Error::Config(format!("invalid margins: {:?}", margins)));
        }
        // 見出し・表1行・写真の最小限が入ること
        if self.usable_width_mm() < 60.0 || self.usable_height_mm() < 80.0 {
            return Err(Error::Config(format!(
                "margins leave too little printable area: {:.1}mm x {:.1}mm",
                self.usable_width_mm(),
                self.usable_height_mm()
            )));
        }
        if self.max_image_height_mm <= 0.0 {
            return Err(Error::Config("max image height must be positive".into()));
        }
        Ok(())
    }

    /// 利用可能幅（mm）
    pub fn usable_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }

    /// 利用可能高さ（mm）
    pub fn usable_height_mm(&self) -> f32 {
        self.page_height_mm - self.margin_top_mm - self.margin_bottom_mm
    }

    /// 所見表の列幅（mm）
    pub fn findings_column_widths_mm(&self) -> [f32; 4] {
        let usable = self.usable_width_mm();
        FINDINGS_COLUMN_RATIOS.map(|ratio| usable * ratio)
    }

    /// 写真の表示サイズ（mm）
    ///
    /// 印字幅 × 最大高さの枠に縦横比を保って収める。原寸より大きくはしない。
    pub fn fit_image_mm(&self, width_px: u32, height_px: u32) -> (f32, f32) {
        fit_within(
            width_px,
            height_px,
            self.usable_width_mm(),
            self.max_image_height_mm.min(self.usable_height_mm()),
        )
    }
}

/// 画素寸法を枠（mm）に収める
pub fn fit_within(width_px: u32, height_px: u32, max_width_mm: f32, max_height_mm: f32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let natural_w = px_to_mm(width_px);
    let natural_h = px_to_mm(height_px);
    let scale = (max_width_mm / natural_w)
        .min(max_height_mm / natural_h)
        .min(1.0);
    (natural_w * scale, natural_h * scale)
}

// ============================================
// ヘルパー関数
// ============================================

/// pt → mm 変換
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt * PT_TO_MM
}

/// px → mm 変換（原寸解像度基準）
#[inline]
pub fn px_to_mm(px: u32) -> f32 {
    px as f32 / IMAGE_NATURAL_DPI * MM_PER_INCH
}

/// 行送り（mm）
#[inline]
pub fn line_height_mm(font_size_pt: f32) -> f32 {
    pt_to_mm(font_size_pt) * LINE_SPACING
}

/// 組み込みフォントの字幅
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontMetrics {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl FontMetrics {
    /// 1文字の幅（em）
    pub fn char_width_em(self, c: char) -> f32 {
        let table = match self {
            FontMetrics::Courier => return f32::from(COURIER_WIDTH) / 1000.0,
            FontMetrics::Helvetica => &HELVETICA_WIDTHS,
            FontMetrics::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        // アクセント付きLatin-1は基底文字と同じ幅
        let base = latin1_base(c);
        let width = match base as u32 {
            code @ 0x20..=0x7E => table[(code - 0x20) as usize],
            _ => DEFAULT_WIDTH,
        };
        f32::from(width) / 1000.0
    }
}

fn latin1_base(c: char) -> char {
    match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        '\u{A0}' => ' ',
        c => c,
    }
}

/// 文字列の幅（mm）
pub fn text_width_mm(text: &str, font_size_pt: f32, metrics: FontMetrics) -> f32 {
    let em: f32 = text.chars().map(|c| metrics.char_width_em(c)).sum();
    em * pt_to_mm(font_size_pt)
}

/// 幅に収まるよう折り返す
///
/// 明示的な改行は保ち、単語単位で詰める。1語が幅を超える場合は文字単位で切る。
/// 空行は空文字列として残す。各行には最低1文字入る。
pub fn wrap_text(text: &str, max_width_mm: f32, font_size_pt: f32, metrics: FontMetrics) -> Vec<String> {
    let em_to_mm = pt_to_mm(font_size_pt);
    let char_mm = |c: char| metrics.char_width_em(c) * em_to_mm;
    let space_mm = char_mm(' ');

    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut current = String::new();
        let mut current_mm = 0.0f32;

        for word in source_line.split_whitespace() {
            let mut word_mm: f32 = word.chars().map(char_mm).sum();

            // 長すぎる語は行幅で分割
            let mut word = word.to_string();
            while word_mm > max_width_mm {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_mm = 0.0;
                }
                let mut head_mm = 0.0f32;
                let mut split_at = word.len();
                for (idx, c) in word.char_indices() {
                    let w = char_mm(c);
                    if idx > 0 && head_mm + w > max_width_mm {
                        split_at = idx;
                        break;
                    }
                    head_mm += w;
                }
                let rest = word.split_off(split_at);
                if rest.is_empty() {
                    // 1文字で幅を超える場合はそのまま置く
                    word_mm = head_mm;
                    break;
                }
                lines.push(std::mem::replace(&mut word, rest));
                word_mm = word.chars().map(char_mm).sum();
            }
            if word.is_empty() {
                continue;
            }

            let needed = if current.is_empty() { word_mm } else { current_mm + space_mm + word_mm };
            if needed > max_width_mm && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_mm = 0.0;
            }
            if !current.is_empty() {
                current.push(' ');
                current_mm += space_mm;
            }
            current.push_str(&word);
            current_mm += word_mm;
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        let layout = PdfLayout::a4();
        assert!((layout.usable_width_mm() - 170.0).abs() < 0.01);
        assert!((layout.usable_height_mm() - 261.0).abs() < 0.01);
    }

    #[test]
    fn test_column_ratios_sum_to_one() {
        let total: f32 = FINDINGS_COLUMN_RATIOS.iter().sum();
        assert!((total - 1.0).abs() < 0.001);

        let widths = PdfLayout::a4().findings_column_widths_mm();
        assert!((widths[0] - 34.0).abs() < 0.01);
        assert!((widths.iter().sum::<f32>() - 170.0).abs() < 0.01);
    }

    #[test]
    fn test_conversion() {
        assert!((pt_to_mm(72.0) - 25.4).abs() < 0.001);
        assert!((pt_to_mm(10.0) - 3.528).abs() < 0.001);
        assert!((px_to_mm(96) - 25.4).abs() < 0.001);
    }

    #[test]
    fn test_fit_image_wide_photo_limited_by_width() {
        let layout = PdfLayout::a4();
        let (w, h) = layout.fit_image_mm(1280, 640);
        assert!((w - 170.0).abs() < 0.01);
        assert!((h - 85.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_image_tall_photo_limited_by_height() {
        let layout = PdfLayout::a4();
        let (w, h) = layout.fit_image_mm(960, 1280);
        assert!((h - MAX_IMAGE_HEIGHT_MM).abs() < 0.01);
        assert!((w / h - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_fit_image_never_upscales() {
        let layout = PdfLayout::a4();
        let (w, h) = layout.fit_image_mm(96, 48);
        assert!((w - 25.4).abs() < 0.01);
        assert!((h - 12.7).abs() < 0.01);
        assert_eq!(layout.fit_image_mm(0, 100), (0.0, 0.0));
    }

    #[test]
    fn test_validate_margins() {
        assert!(PdfLayout::a4().validate().is_ok());
        assert!(PdfLayout::a4_with_margins(100.0, 18.0).validate().is_err());
        assert!(PdfLayout::a4_with_margins(-1.0, 18.0).validate().is_err());
    }

    #[test]
    fn test_wrap_text_words() {
        // 10pt Courier: 1文字 = 10 * 0.3528 * 0.6 ≈ 2.117mm → 20mm で9文字
        let lines = wrap_text("wall has a long crack", 20.0, 10.0, FontMetrics::Courier);
        assert_eq!(lines, vec!["wall has", "a long", "crack"]);
    }

    #[test]
    fn test_wrap_text_long_word_and_newlines() {
        let lines = wrap_text("abcdefghijklmnop\n\nxy", 20.0, 10.0, FontMetrics::Courier);
        assert_eq!(lines, vec!["abcdefghi", "jklmnop", "", "xy"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert_eq!(wrap_text("", 50.0, 10.0, FontMetrics::Helvetica), vec![""]);
    }

    #[test]
    fn test_helvetica_widths() {
        assert!((FontMetrics::Helvetica.char_width_em('W') - 0.944).abs() < 0.0001);
        assert!((FontMetrics::Helvetica.char_width_em('i') - 0.222).abs() < 0.0001);
        assert!((FontMetrics::HelveticaBold.char_width_em('m') - 0.889).abs() < 0.0001);
        assert_eq!(
            FontMetrics::Helvetica.char_width_em('ã'),
            FontMetrics::Helvetica.char_width_em('a')
        );
        assert!((FontMetrics::Courier.char_width_em('W') - 0.6).abs() < 0.0001);
        // 12文字の "W" は 9pt で約36mm
        assert!(text_width_mm(&"W".repeat(12), 9.0, FontMetrics::Helvetica) > 35.0);
    }

    #[test]
    fn test_wrap_wide_glyphs_stay_inside_column() {
        // 所見表の Status 列（A4既定: 23.8mm - 余白3mm）
        let width = PdfLayout::a4().findings_column_widths_mm()[2] - 3.0;
        let lines = wrap_text(&"W".repeat(12), width, 9.0, FontMetrics::Helvetica);
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(!line.is_empty());
            assert!(text_width_mm(line, 9.0, FontMetrics::Helvetica) <= width + 0.001);
        }
        assert_eq!(lines.concat(), "W".repeat(12));

        // 細い字は同じ幅にもっと入る
        let narrow = wrap_text(&"i".repeat(12), width, 9.0, FontMetrics::Helvetica);
        assert_eq!(narrow.len(), 1);
    }

    #[test]
    fn test_wrap_keeps_at_least_one_char_per_line() {
        let lines = wrap_text("WW", 0.5, 10.0, FontMetrics::Helvetica);
        assert_eq!(lines, vec!["W", "W"]);
    }
}
