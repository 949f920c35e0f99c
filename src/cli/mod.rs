// CLI層 - コマンドライン引数の定義と処理
// ユーザーインターフェースとバッチエンジンの橋渡し

pub mod args;
pub mod commands;

pub use args::*;
pub use commands::*;
