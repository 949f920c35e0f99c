// 処理結果の書き出し

use crate::core::{BatchError, BatchResult, ItemStatus, RunSummary};
use crate::engine::ItemStore;
use crate::storage::StorageBackend;
use anyhow::Context;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

pub const SUMMARY_FILE_NAME: &str = "run_summary.json";

/// 出力ファイル名 `{index:03}_{stem}.png`
pub fn output_file_name(index: usize, item_name: &str) -> String {
    let stem = Path::new(item_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| item_name.to_string());
    format!("{index:03}_{stem}.png")
}

fn encode_png(image: Arc<DynamicImage>) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("PNG エンコードに失敗しました")?;
    Ok(bytes)
}

/// Done のアイテムを PNG で、サマリーを JSON で書き出す
///
/// 書き出したファイルの識別子を返す。
pub async fn export_results<S>(
    storage: &S,
    store: &ItemStore,
    summary: &RunSummary,
    dir: &str,
) -> BatchResult<Vec<String>>
where
    S: StorageBackend + ?Sized,
{
    let base = Path::new(dir);
    let mut written = Vec::new();

    for (index, record) in store.snapshot().into_iter().enumerate() {
        if record.status() != ItemStatus::Done {
            continue;
        }
        let Some(processed) = record.processed().cloned() else {
            continue;
        };

        let id = base
            .join(output_file_name(index, record.name()))
            .to_string_lossy()
            .into_owned();
        let bytes = tokio::task::spawn_blocking(move || encode_png(processed))
            .await
            .map_err(BatchError::task)?
            .map_err(|source| BatchError::export(&id, source))?;
        storage
            .write_item(&id, bytes)
            .await
            .map_err(|source| BatchError::export(&id, source))?;
        written.push(id);
    }

    let summary_id = base.join(SUMMARY_FILE_NAME).to_string_lossy().into_owned();
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|e| BatchError::export(&summary_id, e.into()))?;
    storage
        .write_item(&summary_id, json)
        .await
        .map_err(|source| BatchError::export(&summary_id, source))?;
    written.push(summary_id);

    tracing::info!(dir, files = written.len(), "results exported");
    Ok(written)
}
