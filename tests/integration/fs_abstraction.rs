// tests/integration/fs_abstraction.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use simloop::fs::mock::MockFileSystem;
use simloop::fs::{FileSystem, RealFileSystem};
use simloop::watch::hash::compute_file_hash;
use simloop::watch::patterns::{collect_matching_files, watch_roots, WatchFilter};
use simloop::watch::ContentFilter;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_mock_fs_hashing() {
    let fs = MockFileSystem::new();
    fs.add_file("test.txt", b"hello world".to_vec());

    let hash = compute_file_hash(&fs, &PathBuf::from("test.txt")).unwrap();
    // blake3 hash of "hello world"
    assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
}

#[test]
fn test_real_and_mock_fs_agree_on_hashes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.swift");
    std::fs::write(&path, "struct A {}").unwrap();

    let mock = MockFileSystem::new();
    mock.add_file("/p/a.swift", "struct A {}");

    assert_eq!(
        compute_file_hash(&RealFileSystem, &path).unwrap(),
        compute_file_hash(&mock, Path::new("/p/a.swift")).unwrap()
    );
}

#[test]
fn test_mock_fs_patterns() {
    let fs = MockFileSystem::new();
    fs.add_file("/app/Sources/App.swift", "@main struct App {}");
    fs.add_file("/app/Sources/Views/Home.swift", "struct Home {}");
    fs.add_file("/app/Sources/Views/Home.generated.swift", "// gen");
    fs.add_file("/app/README.md", "# Readme");
    fs.add_file("/app/build/App.o", "binary");

    let filter = WatchFilter::new(
        &strings(&["Sources/**/*.swift"]),
        &strings(&["**/*.generated.swift"]),
    )
    .unwrap();

    let roots = watch_roots(&fs, Path::new("/app"), &strings(&["Sources/**/*.swift"]));
    assert_eq!(roots, vec![PathBuf::from("/app/Sources")]);

    let files = collect_matching_files(&fs, Path::new("/app"), &roots[0], &filter).unwrap();
    assert_eq!(
        files,
        vec![
            PathBuf::from("/app/Sources/App.swift"),
            PathBuf::from("/app/Sources/Views/Home.swift"),
        ]
    );
}

#[test]
fn test_real_fs_collects_matching_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("src/nested")).unwrap();
    std::fs::write(root.join("src/a.swift"), "a").unwrap();
    std::fs::write(root.join("src/nested/b.swift"), "b").unwrap();
    std::fs::write(root.join("src/nested/c.txt"), "c").unwrap();

    let filter = WatchFilter::new(&strings(&["src/**/*.swift"]), &[]).unwrap();
    let roots = watch_roots(&RealFileSystem, root, &strings(&["src/**/*.swift"]));
    assert_eq!(roots, vec![root.join("src")]);

    let files = collect_matching_files(&RealFileSystem, root, &roots[0], &filter).unwrap();
    assert_eq!(files, vec![root.join("src/a.swift"), root.join("src/nested/b.swift")]);
}

#[test]
fn test_content_filter_with_shared_mock() {
    let fs = MockFileSystem::new();
    fs.add_file("/p/src/a.swift", "let a = 1");

    let shared: Arc<dyn FileSystem> = Arc::new(fs.clone());
    let mut filter = ContentFilter::new(shared);
    filter.seed(vec![PathBuf::from("/p/src/a.swift")]);

    // Touch without edit.
    fs.add_file("/p/src/a.swift", "let a = 1");
    assert!(!filter.has_changed(Path::new("/p/src/a.swift")));

    // Directory events carry no content change.
    fs.add_dir("/p/src/Feature");
    assert!(!filter.has_changed(Path::new("/p/src/Feature")));

    fs.add_file("/p/src/a.swift", "let a = 2");
    assert!(filter.has_changed(Path::new("/p/src/a.swift")));
}
