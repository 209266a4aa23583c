//! Export core modules shared by the PDF writer and the review view.

pub mod pdf_core;
