// ディレクトリ読み込みから書き出しまでのエンドツーエンドテスト

use image_batch::catalog::load_items;
use image_batch::cli::{execute_run, RunOptions};
use image_batch::image_loader::standard::StandardImageLoader;
use image_batch::services::SUMMARY_FILE_NAME;
use image_batch::storage::local::LocalStorageBackend;
use image_batch::{RunSummary, Strategy};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// テスト用の画像ディレクトリを作成（画像以外のファイルと壊れた画像を含む）
fn setup_album(dir: &Path, count: usize) {
    for i in 0..count {
        image::RgbImage::from_fn(16, 12, |x, y| image::Rgb([(x * 15) as u8, (y * 20) as u8, i as u8 * 30]))
            .save(dir.join(format!("photo_{i:02}.png")))
            .unwrap();
    }
    fs::write(dir.join("notes.txt"), "not an image").unwrap();
    fs::write(dir.join("broken.png"), b"\x89PNG truncated").unwrap();
}

#[tokio::test]
async fn test_catalog_skips_non_images_and_sorts_by_name() {
    let album = TempDir::new().unwrap();
    setup_album(album.path(), 3);

    let store = load_items(
        &LocalStorageBackend::new(),
        &StandardImageLoader::with_max_dimension(8),
        album.path().to_str().unwrap(),
    )
    .await
    .unwrap();

    let names: Vec<String> = store
        .snapshot()
        .iter()
        .map(|record| record.name().to_string())
        .collect();
    assert_eq!(names, vec!["photo_00.png", "photo_01.png", "photo_02.png"]);
    assert_eq!(store.read(0).original().width(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_command_processes_and_exports() {
    for strategy in [Strategy::Concurrent, Strategy::Sequential] {
        let album = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        setup_album(album.path(), 4);

        let summary = execute_run(RunOptions {
            directory: album.path().to_path_buf(),
            strategy: Some(strategy),
            delay_ms: Some(0),
            output: Some(output.path().to_path_buf()),
            quiet: true,
            ..RunOptions::default()
        })
        .await
        .unwrap();

        assert_eq!(summary.strategy, strategy);
        assert_eq!(summary.total_items, 4);
        assert_eq!(summary.statuses.done, 4);
        assert_eq!(summary.transform_errors, 0);

        for i in 0..4 {
            let exported = image::open(output.path().join(format!("{i:03}_photo_{i:02}.png"))).unwrap();
            assert_eq!((exported.width(), exported.height()), (16, 12));
        }

        let json = fs::read_to_string(output.path().join(SUMMARY_FILE_NAME)).unwrap();
        let written: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(written.completed, 4);
        assert!(!written.was_cancelled);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_command_honours_config_file_and_cancel_timer() {
    let album = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    setup_album(album.path(), 5);
    let config_path = album.path().join("batch.json");
    fs::write(
        &config_path,
        r#"{"strategy": "sequential", "transform_delay_ms": 150, "filters": ["noir"]}"#,
    )
    .unwrap();

    let summary = execute_run(RunOptions {
        directory: album.path().to_path_buf(),
        config: Some(config_path),
        cancel_after_ms: Some(200),
        output: Some(output.path().to_path_buf()),
        quiet: true,
        ..RunOptions::default()
    })
    .await
    .unwrap();

    assert_eq!(summary.strategy, Strategy::Sequential);
    assert!(summary.was_cancelled);
    assert!(summary.completed >= 1 && summary.completed < 5);
    assert_eq!(summary.statuses.processing, 0);
    assert!(summary.statuses.cancelled <= 1);

    // 完了したアイテムだけが書き出される
    let exported = fs::read_dir(output.path())
        .unwrap()
        .filter(|entry| {
            entry
                .as_ref()
                .map(|e| e.path().extension().is_some_and(|ext| ext == "png"))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(exported, summary.statuses.done);
}
