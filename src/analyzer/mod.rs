//! 点検の実行（写真ごとの解析 → 総括 → 報告書）
//!
//! プロバイダ呼び出しは1枚ずつ順番に行う。1枚の失敗で全体は止めない。

mod types;

pub use types::{PhotoOutcome, ANALYSIS_ERROR_PREFIX};

use crate::imaging::{normalize_image, ImageOptions};
use crate::provider::VisionProvider;
use crate::scanner::PhotoInput;
use inspection_ai_common::{
    assemble, build_finding_prompt, build_summary_context, build_summary_prompt, InspectionItem,
    Report, ReportHeader, ReportMeta,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// 総括生成に失敗したときの本文の前置き
pub const SUMMARY_ERROR_PREFIX: &str = "Automatic overall summary could not be generated:";

/// 写真1枚を解析する
pub async fn analyze_photo<P: VisionProvider>(
    provider: &P,
    photo: &PhotoInput,
    options: &ImageOptions,
) -> PhotoOutcome {
    let bytes = match tokio::fs::read(&photo.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("{}: 読み込み失敗: {}", photo.file_name, e);
            return PhotoOutcome::failed(None, e);
        }
    };

    // デコード・縮小・再エンコードはブロッキング用スレッドで
    let options = *options;
    let normalized = tokio::task::spawn_blocking(move || normalize_image(&bytes, &options)).await;
    let image = match normalized {
        Ok(Ok(image)) => image,
        Ok(Err(e)) => {
            warn!("{}: {}", photo.file_name, e);
            return PhotoOutcome::failed(None, e);
        }
        Err(e) => {
            warn!("{}: 画像処理タスク失敗: {}", photo.file_name, e);
            return PhotoOutcome::failed(None, e);
        }
    };
    debug!(
        "{}: {}x{} {} bytes sha256={}",
        photo.file_name,
        image.width,
        image.height,
        image.bytes.len(),
        image.hash
    );

    match provider.analyze_image(&build_finding_prompt(), &image.bytes).await {
        Ok(response) => PhotoOutcome::Analyzed { image, response },
        Err(e) => {
            warn!("{}: AI解析失敗: {}", photo.file_name, e);
            PhotoOutcome::failed(Some(image), e)
        }
    }
}

/// 総括を生成する（失敗時は理由入りの代替文）
pub async fn summarize_items<P: VisionProvider>(provider: &P, items: &[InspectionItem]) -> String {
    if items.is_empty() {
        return String::new();
    }

    let context = build_summary_context(items);
    match provider.summarize(&build_summary_prompt(), &context).await {
        Ok(text) => text,
        Err(e) => {
            warn!("総括生成失敗: {}", e);
            format!("{} {}", SUMMARY_ERROR_PREFIX, e)
        }
    }
}

/// 点検を実行して報告書を作る
///
/// `on_progress(完了数, 総数, ファイル名)` は各写真の処理後に呼ばれる。
pub async fn run_inspection<P, F>(
    provider: &P,
    photos: &[PhotoInput],
    header: ReportHeader,
    options: &ImageOptions,
    on_progress: F,
) -> Report
where
    P: VisionProvider,
    F: Fn(usize, usize, &str),
{
    let started = Instant::now();
    let now = chrono::Local::now();
    let total = photos.len();
    info!("点検開始: {}枚 (model: {})", total, provider.model_id());

    let mut items = Vec::with_capacity(total);
    for (idx, photo) in photos.iter().enumerate() {
        let outcome = analyze_photo(provider, photo, options).await;
        let item = outcome.into_item(&photo.file_name);

        if let Some(record) = item.finding() {
            if !record.confidence_in_range() {
                warn!("{}: confidence が範囲外: {:?}", photo.file_name, record.confidence);
            }
        } else {
            debug!("{}: 構造化失敗（生テキスト表示）", photo.file_name);
        }

        items.push(item);
        on_progress(idx + 1, total, &photo.file_name);
    }

    let summary = summarize_items(provider, &items).await;

    let meta = ReportMeta {
        generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        model: provider.model_id().to_string(),
        item_count: items.len(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
        timezone_label: format!("UTC{}", now.format("%:z")),
    };

    let report = assemble(header, items, summary, meta);
    info!(
        "点検完了: {}枚 (構造化失敗 {}枚, {:.2}s)",
        report.items.len(),
        report.failed_count(),
        report.meta.elapsed_seconds
    );
    report
}
