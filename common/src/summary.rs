//! 総括テキストのセクション分割
//!
//! AIの自由文から「Main Findings」などの見出しを大文字小文字無視で探し、
//! ラベル付きブロックに分ける。あくまでベストエフォートで、
//! 正しく分割できる保証はない。見出しが無ければ全文が1ブロックになる。

use lazy_static::lazy_static;
use regex::Regex;

/// 見出しラベルと検出パターン（原語の見出しも同じラベルに寄せる）
const SECTION_MARKERS: &[(&str, &str)] = &[
    ("Main Findings", r"main\s+findings|principais\s+achados"),
    ("Points of Attention", r"points\s+of\s+attention|pontos\s+de\s+aten[çc][ãa]o"),
    ("Recommendations", r"recommendations|recomenda[çc][õo]es"),
    ("Limitations", r"limitations|limita[çc][õo]es"),
];

/// 見出しの検出パターン
struct MarkerPattern {
    label: &'static str,
    /// 行頭の見出し（"## "・"**"・"1." などの前置きを含む）
    line_start: Regex,
    /// 文中のどこでも
    anywhere: Regex,
}

impl MarkerPattern {
    /// 行頭の見出しを優先し、無ければ文中の最初の出現
    fn find(&self, text: &str) -> Option<(usize, usize)> {
        self.line_start
            .find(text)
            .or_else(|| self.anywhere.find(text))
            .map(|m| (m.start(), m.end()))
    }
}

lazy_static! {
    static ref MARKER_PATTERNS: Vec<MarkerPattern> = SECTION_MARKERS
        .iter()
        .map(|&(label, pattern)| MarkerPattern {
            label,
            line_start: Regex::new(&format!(r"(?im)^[ \t#*\d.)\-]*(?:{})", pattern)).unwrap(),
            anywhere: Regex::new(&format!(r"(?i){}", pattern)).unwrap(),
        })
        .collect();
    static ref BLANK_LINE: Regex = Regex::new(r"\n[ \t]*\r?\n").unwrap();
}

/// 総括の1ブロック
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryBlock {
    pub label: Option<String>,
    pub paragraphs: Vec<String>,
}

/// 総括テキストをブロックに分割する
///
/// 常に1つ以上のブロックを返す。
pub fn segment_summary(text: &str) -> Vec<SummaryBlock> {
    let mut found: Vec<(usize, usize, &'static str)> = MARKER_PATTERNS
        .iter()
        .filter_map(|marker| marker.find(text).map(|(start, end)| (start, end, marker.label)))
        .collect();
    found.sort_by_key(|(start, _, _)| *start);

    if found.is_empty() {
        return vec![SummaryBlock {
            label: None,
            paragraphs: split_paragraphs(text),
        }];
    }

    let mut blocks = Vec::new();

    let preamble = trim_heading_tail(&text[..found[0].0]);
    if !preamble.trim().is_empty() {
        blocks.push(SummaryBlock {
            label: None,
            paragraphs: split_paragraphs(preamble),
        });
    }

    for (i, (_, end, label)) in found.iter().enumerate() {
        // 見出し同士が重なった場合は後ろの見出しの開始位置で切る
        let next_start = found.get(i + 1).map_or(text.len(), |(s, _, _)| *s);
        let body = if *end < next_start {
            &text[*end..next_start]
        } else {
            ""
        };
        let body = trim_heading_tail(trim_heading_head(body));
        blocks.push(SummaryBlock {
            label: Some(label.to_string()),
            paragraphs: split_paragraphs(body),
        });
    }

    blocks
}

/// 見出し直後の装飾（":"・"**"・"(top 5)" など）を落とす
fn trim_heading_head(body: &str) -> &str {
    let body = match body.trim_start_matches([' ', '\t']).strip_prefix('(') {
        Some(rest) => rest.split_once(')').map_or(body, |(_, after)| after),
        None => body,
    };
    body.trim_start_matches(|c: char| c == ':' || c == '*' || c == '#' || c.is_whitespace())
}

/// 次の見出しの前置き（"## "・"**"・"1." など）を落とす
fn trim_heading_tail(body: &str) -> &str {
    let trimmed = body.trim_end_matches(|c: char| c == '*' || c == '#' || c.is_whitespace());
    let line_start = trimmed.rfind('\n').map_or(0, |i| i + 1);
    let last_line = &trimmed[line_start..];
    let is_list_marker = !last_line.is_empty()
        && last_line
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == ')');
    if is_list_marker {
        trimmed[..line_start].trim_end()
    } else {
        trimmed
    }
}

/// 空行で段落に分ける
pub fn split_paragraphs(text: &str) -> Vec<String> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_markers_single_block() {
        let blocks = segment_summary("Everything looks fine.\n\nNo major issues.");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].label, None);
        assert_eq!(blocks[0].paragraphs, vec!["Everything looks fine.", "No major issues."]);
    }

    #[test]
    fn test_empty_text_single_empty_block() {
        let blocks = segment_summary("");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].paragraphs.is_empty());
    }

    #[test]
    fn test_markdown_sections() {
        let text = "Overall the property is in fair condition.\n\n\
                    ## Main Findings\n1. Cracks in the kitchen wall\n\n\
                    **Points of attention:** moisture near the bathroom\n\n\
                    ### Recommendations\nHire a structural engineer.\n\n\
                    Limitations: visual inspection only.";
        let blocks = segment_summary(text);
        let labels: Vec<Option<&str>> = blocks.iter().map(|b| b.label.as_deref()).collect();
        assert_eq!(
            labels,
            vec![
                None,
                Some("Main Findings"),
                Some("Points of Attention"),
                Some("Recommendations"),
                Some("Limitations"),
            ]
        );
        assert_eq!(blocks[0].paragraphs, vec!["Overall the property is in fair condition."]);
        assert_eq!(blocks[1].paragraphs, vec!["1. Cracks in the kitchen wall"]);
        assert_eq!(blocks[2].paragraphs, vec!["moisture near the bathroom"]);
        assert_eq!(blocks[4].paragraphs, vec!["visual inspection only."]);
    }

    #[test]
    fn test_portuguese_markers_and_case() {
        let text = "PRINCIPAIS ACHADOS\nInfiltração no teto.\n\nRecomendações: revisar calhas.";
        let blocks = segment_summary(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label.as_deref(), Some("Main Findings"));
        assert_eq!(blocks[0].paragraphs, vec!["Infiltração no teto."]);
        assert_eq!(blocks[1].label.as_deref(), Some("Recommendations"));
        assert_eq!(blocks[1].paragraphs, vec!["revisar calhas."]);
    }

    #[test]
    fn test_marker_word_inside_body_does_not_split() {
        let text = "Main Findings\n- Cracks; see the recommendations below.\n\nRecommendations\n- Repair cracks.";
        let blocks = segment_summary(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].label.as_deref(), Some("Main Findings"));
        assert_eq!(blocks[0].paragraphs, vec!["- Cracks; see the recommendations below."]);
        assert_eq!(blocks[1].label.as_deref(), Some("Recommendations"));
        assert_eq!(blocks[1].paragraphs, vec!["- Repair cracks."]);
    }

    #[test]
    fn test_inline_marker_used_when_no_heading_line() {
        let blocks = segment_summary("Overall fine. Recommendations: clean gutters.");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].paragraphs, vec!["Overall fine."]);
        assert_eq!(blocks[1].label.as_deref(), Some("Recommendations"));
        assert_eq!(blocks[1].paragraphs, vec!["clean gutters."]);
    }

    #[test]
    fn test_top5_annotation_is_dropped() {
        let blocks = segment_summary("Main Findings (top 5):\n- crack");
        assert_eq!(blocks[0].paragraphs, vec!["- crack"]);
    }

    #[test]
    fn test_never_panics_on_odd_input() {
        for text in [
            "limitations",
            "Recommendations Recommendations",
            "main findings\n\n\n",
            "🟢🟡🔴 ⚪ Limitações",
            "((((( main findings ((",
            "1.\n2.\nLimitations",
        ] {
            let blocks = segment_summary(text);
            assert!(!blocks.is_empty(), "no blocks for {:?}", text);
        }
    }
}
