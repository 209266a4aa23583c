//! Inspection AI Common Library
//!
//! CLIから使う純粋ロジック（I/Oなし）:
//! 所見の抽出・正規化、プロンプト、報告書の組み立て、PDFブロック構成

pub mod types;
pub mod layout;
pub mod error;
pub mod normalizer;
pub mod parser;
pub mod prompts;
pub mod report;
pub mod summary;
pub mod export;

pub use types::{ConditionStatus, ElementFinding, FindingRecord, InspectionItem};
pub use layout::PdfLayout;
pub use error::{Error, Result};
pub use normalizer::{join_observations, normalize_observations, normalize_status, StatusLabel};
pub use parser::{extract, Extraction};
pub use prompts::{build_finding_prompt, build_summary_context, build_summary_prompt};
pub use report::{assemble, Report, ReportHeader, ReportMeta};
pub use summary::{segment_summary, SummaryBlock};
pub use export::pdf_core::{build_document, DocBlock};
