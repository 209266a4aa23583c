pub mod pdf;

pub use pdf::{render_pdf, write_pdf};

use std::path::{Path, PathBuf};

/// 出力先未指定時のPDFファイル名
pub const DEFAULT_PDF_NAME: &str = "inspection_report.pdf";

/// 出力先の決定（フォルダ・拡張子なしならその中に既定名で置く）
pub fn output_path_for_pdf(output: Option<&Path>) -> PathBuf {
    match output {
        None => PathBuf::from(DEFAULT_PDF_NAME),
        Some(path) if path.is_dir() || path.extension().is_none() => path.join(DEFAULT_PDF_NAME),
        Some(path) => path.to_path_buf(),
    }
}
