use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inspection-ai")]
#[command(about = "不動産点検写真AI解析・点検報告書PDF生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真を解析して点検報告書PDFを生成
    Run {
        /// 写真ファイルまたはフォルダ（指定順に処理）
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// 出力PDF（デフォルト: ./inspection_report.pdf）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 依頼者名
        #[arg(long)]
        client: Option<String>,

        /// 物件住所
        #[arg(long)]
        address: Option<String>,

        /// 使用するモデル（未指定なら設定値、なければ自動選択）
        #[arg(short, long)]
        model: Option<String>,

        /// 画像の最大長辺（px, 640〜3000）
        #[arg(long)]
        max_side: Option<u32>,

        /// JPEG品質（50〜95）
        #[arg(long)]
        quality: Option<u8>,

        /// 報告書JSONの保存先（`render` で再出力できる）
        #[arg(long)]
        save_report: Option<PathBuf>,

        /// 完了後に報告書を表示しない
        #[arg(long)]
        no_review: bool,
    },

    /// 保存済みの報告書JSONからPDFを再生成
    Render {
        /// 報告書JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力PDF
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済みの報告書JSONを表示
    Show {
        /// 報告書JSONファイル
        #[arg(required = true)]
        input: PathBuf,
    },

    /// 利用可能なGeminiモデルを一覧表示
    Models,

    /// 設定を表示/編集
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// APIキーを対話入力（画面に表示しない）
        #[arg(long, conflicts_with = "set_api_key")]
        prompt_api_key: bool,

        /// 既定のモデル
        #[arg(long)]
        model: Option<String>,

        /// 画像の最大長辺（px）
        #[arg(long)]
        max_side: Option<u32>,

        /// JPEG品質
        #[arg(long)]
        quality: Option<u8>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
