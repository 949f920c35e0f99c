// カタログ - ストレージから画像を読み込み、アイテムストアを構築する

use crate::core::{BatchError, BatchResult, ItemRecord};
use crate::engine::ItemStore;
use crate::image_loader::ImageLoaderBackend;
use crate::storage::StorageBackend;

/// ディレクトリ直下の画像をファイル名順に読み込む
///
/// デコードできないファイルは警告を出してスキップする。
/// ディレクトリ自体を列挙できない場合のみエラーになる。
pub async fn load_items<S, L>(storage: &S, loader: &L, dir: &str) -> BatchResult<ItemStore>
where
    S: StorageBackend + ?Sized,
    L: ImageLoaderBackend + ?Sized,
{
    let mut entries: Vec<_> = storage
        .list_items(dir)
        .await
        .map_err(|source| BatchError::load(dir, source))?
        .into_iter()
        .filter(|item| storage.is_image_file(item))
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let decoded = match storage.read_item(&entry.id).await {
            Ok(data) => loader.load_from_bytes(data).await,
            Err(error) => Err(error),
        };
        match decoded {
            Ok(loaded) => {
                if loaded.was_resized {
                    tracing::debug!(
                        item = %entry.name,
                        original = ?loaded.original_dimensions,
                        "downscaled on load"
                    );
                }
                records.push(ItemRecord::new(entry.name, loaded.image));
            }
            Err(error) => {
                tracing::warn!(item = %entry.id, error = %format!("{error:#}"), "skipping unreadable image");
            }
        }
    }

    tracing::info!(dir, items = records.len(), loader = loader.strategy_name(), "catalog loaded");
    Ok(ItemStore::new(records))
}
