// サービス層 - エンジンの外側で使う設定・表示・書き出し

pub mod config;
pub mod export;
pub mod presentation;

pub use config::BatchConfig;
pub use export::{export_results, output_file_name, SUMMARY_FILE_NAME};
pub use presentation::{ConsolePresenter, PanelState};
