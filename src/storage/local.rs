use super::{StorageBackend, StorageItem};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// ローカルファイルシステム用のストレージバックエンド
#[derive(Debug, Clone, Default)]
pub struct LocalStorageBackend;

impl LocalStorageBackend {
    pub fn new() -> Self {
        Self
    }

    async fn to_storage_item(path: &Path) -> Result<StorageItem> {
        let metadata = tokio::fs::metadata(path)
            .await
            .with_context(|| format!("メタデータを取得できません: {}", path.display()))?;

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = metadata
            .is_file()
            .then(|| path.extension().map(|ext| ext.to_string_lossy().into_owned()))
            .flatten();

        Ok(StorageItem {
            id: path.to_string_lossy().into_owned(),
            name,
            size: metadata.len(),
            is_directory: metadata.is_dir(),
            extension,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>> {
        let mut entries = tokio::fs::read_dir(prefix)
            .await
            .with_context(|| format!("ディレクトリを読み込めません: {prefix}"))?;

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            match Self::to_storage_item(&entry.path()).await {
                Ok(item) => items.push(item),
                Err(error) => tracing::debug!(%error, "skipping unreadable entry"),
            }
        }
        Ok(items)
    }

    async fn read_item(&self, id: &str) -> Result<Vec<u8>> {
        tokio::fs::read(id)
            .await
            .with_context(|| format!("ファイルを読み込めません: {id}"))
    }

    async fn write_item(&self, id: &str, data: Vec<u8>) -> Result<()> {
        let path = Path::new(id);
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("ディレクトリを作成できません: {}", parent.display()))?;
        }
        tokio::fs::write(path, data)
            .await
            .with_context(|| format!("ファイルを書き込めません: {id}"))
    }
}
