use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use inspection_ai_common::{Report, ReportHeader};
use inspection_ai_rust::{analyzer, cli, config, error, export, provider, review, scanner, session};
use cli::{Cli, Commands};
use config::Config;
use provider::{GeminiClient, VisionProvider};
use session::SessionState;
use std::io;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Run {
            inputs,
            output,
            client,
            address,
            model,
            max_side,
            quality,
            save_report,
            no_review,
        } => {
            println!("🏠 inspection-ai - 点検報告書作成\n");

            // 設定の上書きと検証（プロバイダ呼び出し前）
            let mut config = config;
            if let Some(side) = max_side {
                config.max_image_side = side;
            }
            if let Some(q) = quality {
                config.jpeg_quality = q;
            }
            config.validate()?;
            let api_key = config.get_api_key()?;

            // 1. 写真の収集
            println!("[1/4] 写真を収集中...");
            let photos = scanner::collect_photos(&inputs)?;
            if photos.is_empty() {
                let joined: Vec<String> = inputs.iter().map(|p| p.display().to_string()).collect();
                return Err(error::InspectionError::NoImagesFound(joined.join(", ")).into());
            }
            println!("✔ {}枚の写真を検出\n", photos.len());

            // 2. モデル決定
            let model = match model.or_else(|| config.model.clone()) {
                Some(model) => model,
                None => resolve_default_model(&api_key, config.timeout_seconds).await,
            };
            let provider = GeminiClient::new(api_key, &model, config.timeout_seconds)?;
            println!("[2/4] AI解析中... (モデル: {})", provider.model_id());

            let bar = ProgressBar::new(photos.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} [{bar:40.green/238}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );

            let mut session = SessionState::new();

            let header = ReportHeader::new(client.as_deref(), address.as_deref());
            let report = analyzer::run_inspection(
                &provider,
                &photos,
                header,
                &config.image_options(),
                |done, total, name| {
                    bar.set_position(done as u64);
                    bar.set_message(format!("{} ({}/{})", name, done, total));
                },
            )
            .await;
            bar.finish_and_clear();
            println!(
                "✔ 解析完了 ({}枚, 構造化失敗 {}枚, {:.2}s)\n",
                report.items.len(),
                report.failed_count(),
                report.meta.elapsed_seconds
            );
            session.store(report);

            let report = session
                .current()
                .context("報告書がありません")?;

            // 3. 報告書JSON保存（PDF生成に失敗しても再出力できるよう先に保存）
            if let Some(path) = &save_report {
                save_report_json(report, path)?;
                println!("✔ 報告書JSON: {}", path.display());
            }

            // 4. PDF生成
            println!("[3/4] PDFを生成中...");
            let output_path = export::output_path_for_pdf(output.as_deref());
            let render_result = session.export_pdf(&config.pdf_layout(), &output_path);
            match &render_result {
                Ok(()) => println!("✔ PDF出力: {}\n", output_path.display()),
                Err(e) => {
                    println!("✘ {}", e);
                    if save_report.is_some() {
                        println!("  `inspection-ai render` で保存済みJSONから再生成できます");
                    }
                    println!();
                }
            }

            if !no_review {
                println!("[4/4] 報告書");
                println!("{}", review::format_report(report));
            }

            render_result?;
            println!("✅ 完了");
        }

        Commands::Render { input, output } => {
            println!("📄 inspection-ai - PDF再生成\n");

            let report = load_report_json(&input)?;
            let output_path = export::output_path_for_pdf(output.as_deref());
            println!("- PDFを生成中... ({}枚)", report.items.len());
            export::write_pdf(&report, &config.pdf_layout(), &output_path)?;
            println!("✔ PDF出力: {}", output_path.display());
        }

        Commands::Show { input } => {
            let report = load_report_json(&input)?;
            println!("{}", review::format_report(&report));
        }

        Commands::Models => {
            let api_key = config.get_api_key()?;
            let models = GeminiClient::list_models(&api_key, config.timeout_seconds).await?;
            if models.is_empty() {
                println!("利用可能なGeminiモデルがありません");
            } else {
                let default = provider::pick_default_model(&models);
                for model in &models {
                    let mark = if Some(model) == default { " (既定)" } else { "" };
                    println!("  {}{}", model, mark);
                }
            }
        }

        Commands::Config {
            set_api_key,
            prompt_api_key,
            model,
            max_side,
            quality,
            show,
        } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if prompt_api_key {
                let key: String = dialoguer::Password::new()
                    .with_prompt("Gemini APIキー")
                    .interact()?;
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if model.is_some() || max_side.is_some() || quality.is_some() {
                if let Some(model) = model {
                    config.model = Some(provider::normalize_model_id(&model));
                }
                if let Some(side) = max_side {
                    config.max_image_side = side;
                }
                if let Some(q) = quality {
                    config.jpeg_quality = q;
                }
                config.validate()?;
                config.save()?;
                println!("✔ 設定を保存しました: {}", Config::config_path()?.display());
            }

            if show {
                println!("設定:");
                println!("  モデル: {}", config.model.as_deref().unwrap_or("(自動選択)"));
                println!("  最大画像サイズ: {}px", config.max_image_side);
                println!("  JPEG品質: {}", config.jpeg_quality);
                println!("  タイムアウト: {}s", config.timeout_seconds);
                println!(
                    "  余白: 左右 {}mm / 上下 {}mm",
                    config.margin_side_mm, config.margin_vertical_mm
                );
                println!("  APIキー: {}", if config.has_api_key() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

/// モデル一覧から既定モデルを選ぶ（取得できなければ固定の既定値）
async fn resolve_default_model(api_key: &str, timeout_seconds: u64) -> String {
    match GeminiClient::list_models(api_key, timeout_seconds).await {
        Ok(models) => match provider::pick_default_model(&models) {
            Some(model) => {
                info!("既定モデルを自動選択: {}", model);
                model.clone()
            }
            None => {
                warn!("Geminiモデルが見つかりません。{} を使用します", provider::FALLBACK_MODEL);
                provider::FALLBACK_MODEL.to_string()
            }
        },
        Err(e) => {
            warn!("モデル一覧の取得に失敗: {}。{} を使用します", e, provider::FALLBACK_MODEL);
            provider::FALLBACK_MODEL.to_string()
        }
    }
}

fn save_report_json(report: &Report, path: &Path) -> error::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report.to_json()?)?;
    Ok(())
}

fn load_report_json(path: &Path) -> error::Result<Report> {
    if !path.is_file() {
        return Err(error::InspectionError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Report::from_json(&content)?)
}
