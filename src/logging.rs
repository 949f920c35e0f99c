// ログ出力の初期化
//
// RUST_LOG が設定されていればそれを優先する。ログは標準エラーへ出力し、
// 標準出力の進捗表示とは混ざらないようにする。

use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// 既定のフィルター指定
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "image_batch=debug"
    } else {
        "image_batch=warn"
    }
}

/// ログを初期化する（2回目以降の呼び出しは何もしない）
pub fn init_logging(verbose: bool) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        let result = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(true)
            .try_init();

        // テストハーネスなどで既に設定済みの場合はそのまま使う
        if result.is_err() {
            tracing::debug!("global subscriber already set");
        }
    });
}
