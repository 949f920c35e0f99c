// バッチ処理のエラー型定義

use super::types::Generation;
use thiserror::Error;

/// 画像変換の失敗（アイテム単位で回復可能）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("画像用のフィルターを作成できませんでした")]
    NoFilterAvailable,

    #[error("空の画像にはフィルターを適用できません ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("フィルターの適用に失敗しました: {message}")]
    FilterFailed { message: String },
}

impl TransformError {
    pub fn filter_failed(message: impl Into<String>) -> Self {
        Self::FilterFailed {
            message: message.into(),
        }
    }
}

/// バッチ実行エンジン全体のエラー型
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("実行中のランがあります (generation: {generation})")]
    RunAlreadyActiveError { generation: Generation },

    #[error("設定エラー: {message}")]
    ConfigurationError { message: String },

    #[error("画像読み込みエラー: {path} - {source}")]
    LoadError {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("タスクエラー: {source}")]
    TaskError {
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("エクスポートエラー: {path} - {source}")]
    ExportError {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl BatchError {
    pub fn run_already_active(generation: Generation) -> Self {
        Self::RunAlreadyActiveError { generation }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn load(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::LoadError {
            path: path.into(),
            source,
        }
    }

    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::TaskError { source }
    }

    pub fn export(path: impl Into<String>, source: anyhow::Error) -> Self {
        Self::ExportError {
            path: path.into(),
            source,
        }
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
