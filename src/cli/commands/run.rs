use crate::catalog::load_items;
use crate::core::{RunSummary, Strategy};
use crate::engine::{EventDispatcher, RunController};
use crate::image_loader::standard::StandardImageLoader;
use crate::services::{export_results, BatchConfig, ConsolePresenter};
use crate::storage::local::LocalStorageBackend;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

/// run コマンドの引数
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub directory: PathBuf,
    pub strategy: Option<Strategy>,
    pub delay_ms: Option<u64>,
    pub cancel_after_ms: Option<u64>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub max_dimension: Option<u32>,
    pub quiet: bool,
}

impl RunOptions {
    /// 設定ファイルを読み込み、CLI 引数で上書きする
    pub fn resolve_config(&self) -> Result<BatchConfig> {
        let mut config = match &self.config {
            Some(path) => BatchConfig::from_json_file(path)?,
            None => BatchConfig::default(),
        };
        if let Some(strategy) = self.strategy {
            config = config.with_strategy(strategy);
        }
        if let Some(delay_ms) = self.delay_ms {
            config = config.with_transform_delay(Duration::from_millis(delay_ms));
        }
        if let Some(max_dimension) = self.max_dimension {
            config = config.with_max_dimension(max_dimension);
        }
        config.validate()?;
        Ok(config)
    }
}

// tokio のブロッキングスレッド上限の既定値
const DEFAULT_BLOCKING_THREADS: usize = 512;

/// 並列戦略が全アイテムを同時に開始できるブロッキングスレッド上限
///
/// ディレクトリのエントリ数（アイテム数の上限）に、読み込みや書き出しで
/// 使う既定の上限を足す。ディレクトリを読めない場合は既定値のまま。
pub fn blocking_thread_ceiling(directory: &Path) -> usize {
    let entries = std::fs::read_dir(directory)
        .map(|entries| entries.count())
        .unwrap_or(0);
    DEFAULT_BLOCKING_THREADS + entries
}

/// ディレクトリ内の画像を1回のランで処理する
///
/// Ctrl-C または `cancel_after_ms` の経過でランをキャンセルする。
pub async fn execute_run(options: RunOptions) -> Result<RunSummary> {
    if !options.directory.is_dir() {
        anyhow::bail!(
            "対象ディレクトリが存在しません: {}",
            options.directory.display()
        );
    }
    let config = options.resolve_config()?;
    tracing::debug!(?config, "resolved configuration");

    let storage = LocalStorageBackend::new();
    let loader = match config.max_dimension {
        Some(max) => StandardImageLoader::with_max_dimension(max),
        None => StandardImageLoader::new(),
    };
    let directory = options.directory.to_string_lossy().into_owned();
    let store = Arc::new(load_items(&storage, &loader, &directory).await?);

    let presenter = if options.quiet {
        ConsolePresenter::quiet()
    } else {
        ConsolePresenter::new()
    };
    let panel = presenter.panel();
    let dispatcher = EventDispatcher::spawn(presenter, store.clone())
        .context("コーディネータースレッドを起動できません")?;
    let events = dispatcher.sender();

    let controller = RunController::new(
        store,
        Arc::new(config.build_transform()),
        events.clone(),
        Handle::current(),
        config.strategy,
    );
    controller.start()?;

    let cancel_timer = async {
        match options.cancel_after_ms {
            Some(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(cancel_timer);
    let wait = controller.wait();
    tokio::pin!(wait);
    let mut timer_armed = true;
    let mut signal_armed = true;

    let summary = loop {
        tokio::select! {
            result = &mut wait => break result?,
            _ = &mut cancel_timer, if timer_armed => {
                timer_armed = false;
                tracing::info!("cancel timer elapsed");
                controller.cancel();
            }
            signal = tokio::signal::ctrl_c(), if signal_armed => {
                signal_armed = false;
                match signal {
                    Ok(()) => {
                        tracing::info!("interrupt received");
                        controller.cancel();
                    }
                    Err(error) => tracing::warn!(%error, "cannot listen for interrupt"),
                }
            }
        }
    }
    .context("ランが開始されていません")?;

    events.flush().await;

    if let Some(output) = &options.output {
        let dir = output.to_string_lossy().into_owned();
        let written = export_results(&storage, controller.store(), &summary, &dir).await?;
        if !options.quiet {
            println!("📄 {} files written to {}", written.len(), output.display());
        }
    }

    tokio::task::spawn_blocking(move || dispatcher.shutdown())
        .await
        .context("コーディネータースレッドの停止に失敗しました")?
        .map_err(|_| anyhow::anyhow!("表示処理がパニックしました"))?;

    if !options.quiet {
        let panel = panel.lock();
        println!(
            "🏁 {} | done {}, cancelled {}, idle {} | errors {} | {:.2}s",
            panel.status,
            summary.statuses.done,
            summary.statuses.cancelled,
            summary.statuses.idle,
            summary.transform_errors,
            summary.elapsed_ms() as f64 / 1000.0
        );
    }

    Ok(summary)
}
