use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

pub mod local;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

/// ストレージ内のエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageItem {
    /// 読み込みに使う識別子（ローカルならパス）
    pub id: String,
    /// 表示名（ファイル名）
    pub name: String,
    pub size: u64,
    pub is_directory: bool,
    pub extension: Option<String>,
}

/// 画像の読み出しと結果の書き出しを行うストレージ
#[automock]
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// ディレクトリ直下のエントリを列挙する
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>>;

    async fn read_item(&self, id: &str) -> Result<Vec<u8>>;

    /// データを書き込む（親ディレクトリは必要に応じて作成）
    async fn write_item(&self, id: &str, data: Vec<u8>) -> Result<()>;

    fn is_image_file(&self, item: &StorageItem) -> bool {
        if item.is_directory {
            return false;
        }

        item.extension.as_deref().is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
    }
}

#[async_trait]
impl StorageBackend for Box<dyn StorageBackend> {
    async fn list_items(&self, prefix: &str) -> Result<Vec<StorageItem>> {
        self.as_ref().list_items(prefix).await
    }

    async fn read_item(&self, id: &str) -> Result<Vec<u8>> {
        self.as_ref().read_item(id).await
    }

    async fn write_item(&self, id: &str, data: Vec<u8>) -> Result<()> {
        self.as_ref().write_item(id, data).await
    }

    fn is_image_file(&self, item: &StorageItem) -> bool {
        self.as_ref().is_image_file(item)
    }
}
