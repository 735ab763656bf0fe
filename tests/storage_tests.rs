use tempfile::TempDir;
use webpages_editor::storage::{FsStorage, Storage, StorageError};

fn storage() -> (TempDir, FsStorage) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = FsStorage::new(dir.path());
    (dir, storage)
}

#[tokio::test]
async fn test_write_read_and_list() {
    let (_dir, storage) = storage();

    storage
        .write("index.html", "<h1>Home</h1>")
        .await
        .expect("write index");
    storage
        .write("blog/post.html", "<p>post</p>")
        .await
        .expect("write post");
    storage
        .write("css/site.css", "body {}")
        .await
        .expect("write css");

    assert_eq!(
        storage.read("index.html").await.expect("read"),
        "<h1>Home</h1>"
    );

    let files = storage.list().await.expect("list");
    let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["blog/post.html", "css/site.css", "index.html"]);
    assert_eq!(files[2].size, 13);
}

#[tokio::test]
async fn test_list_creates_missing_root() {
    let (dir, storage) = storage();

    assert!(storage.list().await.expect("list").is_empty());
    assert!(dir.path().join("pages").is_dir());
}

#[tokio::test]
async fn test_list_skips_other_extensions() {
    let (dir, storage) = storage();
    std::fs::create_dir_all(dir.path().join("pages")).expect("create pages");
    std::fs::write(dir.path().join("pages/notes.txt"), "x").expect("write txt");
    storage.write("a.js", "let a").await.expect("write js");

    let files = storage.list().await.expect("list");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "a.js");
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let (_dir, storage) = storage();
    storage.write("gone.html", "bye").await.expect("write");

    storage.delete("gone.html").await.expect("delete");

    assert!(matches!(
        storage.read("gone.html").await,
        Err(StorageError::NotFound(path)) if path == "gone.html"
    ));
    assert!(matches!(
        storage.delete("gone.html").await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_rejects_paths_outside_root() {
    let (_dir, storage) = storage();

    for path in ["../escape.html", "a/../../b.html", "/etc/passwd.html"] {
        assert!(
            matches!(
                storage.write(path, "x").await,
                Err(StorageError::InvalidPath(_))
            ),
            "{} should be rejected",
            path
        );
    }
    assert!(matches!(
        storage.read("  ").await,
        Err(StorageError::MissingPath)
    ));
}

#[tokio::test]
async fn test_rejects_unsupported_extension() {
    let (_dir, storage) = storage();

    assert!(matches!(
        storage.write("script.py", "print()").await,
        Err(StorageError::UnsupportedExtension(_))
    ));
    assert!(matches!(
        storage.write("README", "x").await,
        Err(StorageError::UnsupportedExtension(_))
    ));
    // extension check ignores case
    storage.write("UPPER.HTML", "ok").await.expect("write upper");
}

#[tokio::test]
async fn test_size_limits() {
    let (_dir, storage) = storage();
    let storage = storage.with_limits(10, 4);

    assert!(matches!(
        storage.write("big.html", "01234567890").await,
        Err(StorageError::TooLarge { size: 11, limit: 10 })
    ));
    storage.write("ok.html", "0123456789").await.expect("at limit");

    assert!(matches!(
        storage.upload_asset("logo.png", &[0; 5]).await,
        Err(StorageError::TooLarge { size: 5, limit: 4 })
    ));
}

#[tokio::test]
async fn test_asset_upload_list_delete() {
    let (dir, storage) = storage();

    let info = storage
        .upload_asset("img/logo.png", &[1, 2, 3])
        .await
        .expect("upload");
    assert_eq!(info.path, "img/logo.png");
    assert_eq!(info.size, 3);
    assert!(dir.path().join("assets/img/logo.png").is_file());

    let assets = storage.list_assets().await.expect("list assets");
    assert_eq!(assets.len(), 1);
    // assets never show up as pages
    assert!(storage.list().await.expect("list").is_empty());

    storage.delete_asset("img/logo.png").await.expect("delete");
    assert!(storage.list_assets().await.expect("list").is_empty());
    assert!(matches!(
        storage.upload_asset("../x.png", &[1]).await,
        Err(StorageError::InvalidPath(_))
    ));
}
