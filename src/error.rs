use thiserror::Error;

#[derive(Error, Debug)]
pub enum InspectionError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`inspection-ai config --set-api-key YOUR_KEY` で設定するか、GEMINI_API_KEY を指定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("API呼び出しエラー: {0}")]
    ApiCall(String),

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("出力できる報告書がありません")]
    NoReport,

    #[error(transparent)]
    Common(#[from] inspection_ai_common::Error),
}

pub type Result<T> = std::result::Result<T, InspectionError>;
