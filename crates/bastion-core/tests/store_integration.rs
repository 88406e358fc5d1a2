// SPDX-License-Identifier: Apache-2.0

//! Integration tests for `FileStore` against real temporary directories.

use std::path::Path;

use bastion_core::{FileError, FileStore};
use tempfile::TempDir;

/// Creates `<tmp>/data` as the store root next to `<tmp>/secret.txt`.
async fn setup() -> (TempDir, FileStore) {
    let tmp = tempfile::tempdir().expect("tempdir");
    let root = tmp.path().join("data");
    std::fs::create_dir_all(root.join("reports")).expect("create root");
    std::fs::write(tmp.path().join("secret.txt"), b"top secret").expect("write secret");

    let store = FileStore::open(&root).await.expect("open store");
    (tmp, store)
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn write_then_read_scenario() {
    let (_tmp, store) = setup().await;

    let outcome = store.write("reports/out.txt", "hello").await.expect("write");
    assert!(!outcome.replaced);
    assert_eq!(outcome.bytes_written, 5);
    assert_eq!(outcome.path, store.root().join("reports").join("out.txt"));

    assert_eq!(
        store.read_to_string("reports/out.txt").await.expect("read"),
        "hello"
    );

    let err = store.read("../secret.txt").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
}

#[tokio::test]
async fn overwrite_reports_replaced() {
    let (_tmp, store) = setup().await;

    store.write("note.txt", "one").await.expect("first write");
    let outcome = store.write("note.txt", "two").await.expect("second write");

    assert!(outcome.replaced);
    assert_eq!(store.read("note.txt").await.expect("read"), b"two");
}

#[tokio::test]
async fn escaping_paths_are_rejected_without_side_effects() {
    let (tmp, store) = setup().await;
    let outside_before = names_in(tmp.path());

    let absolute = tmp.path().join("secret.txt");
    let attempts = [
        "../secret.txt",
        "../escaped.txt",
        "reports/../../secret.txt",
        "reports/../../../etc/passwd",
        "./../data/../secret.txt",
        absolute.to_str().expect("utf-8 path"),
    ];

    for rel in attempts {
        let read = store.read(rel).await;
        assert!(
            matches!(read, Err(FileError::PathEscapesRoot { .. })),
            "read({rel}) should escape, got {read:?}"
        );

        let write = store.write(rel, "pwned").await;
        assert!(
            matches!(write, Err(FileError::PathEscapesRoot { .. })),
            "write({rel}) should escape, got {write:?}"
        );

        let remove = store.remove(rel).await;
        assert!(
            matches!(remove, Err(FileError::PathEscapesRoot { .. })),
            "remove({rel}) should escape, got {remove:?}"
        );
    }

    assert_eq!(names_in(tmp.path()), outside_before);
    assert_eq!(
        std::fs::read(tmp.path().join("secret.txt")).expect("secret"),
        b"top secret"
    );
}

#[tokio::test]
async fn sibling_with_common_prefix_is_outside() {
    let (tmp, store) = setup().await;
    std::fs::create_dir(tmp.path().join("data-evil")).expect("sibling");
    std::fs::write(tmp.path().join("data-evil").join("x.txt"), b"x").expect("write");

    let err = store.read("../data-evil/x.txt").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
}

#[tokio::test]
async fn dot_segments_inside_root_are_allowed() {
    let (_tmp, store) = setup().await;
    store.write("reports/a.txt", "a").await.expect("write");

    let bytes = store.read("./reports/../reports/./a.txt").await.expect("read");
    assert_eq!(bytes, b"a");
}

#[tokio::test]
async fn missing_parent_is_not_found() {
    let (_tmp, store) = setup().await;

    let err = store.write("nope/out.txt", "x").await.expect_err("no parent");
    assert!(matches!(err, FileError::NotFound { .. }));

    let err = store.read("reports/absent.txt").await.expect_err("no file");
    assert!(matches!(err, FileError::NotFound { .. }));
}

#[tokio::test]
async fn directories_are_not_files() {
    let (_tmp, store) = setup().await;

    let err = store.read("reports").await.expect_err("directory");
    assert!(matches!(err, FileError::NotAFile { .. }));

    let err = store.write("reports", "x").await.expect_err("directory");
    assert!(matches!(err, FileError::NotAFile { .. }));
}

#[tokio::test]
async fn list_returns_sorted_regular_files() {
    let (_tmp, store) = setup().await;
    store.write("b.txt", "bb").await.expect("write b");
    store.write("a.txt", "a").await.expect("write a");
    std::fs::write(store.root().join(".c.txt.deadbeef.partial"), b"half").expect("staging");

    let entries = store.list().await.expect("list");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

    assert_eq!(names, ["a.txt", "b.txt"]);
    assert_eq!(entries[1].size, 2);
    assert!(entries[0].modified.is_some());
}

#[tokio::test]
async fn list_dir_lists_subdirectory() {
    let (_tmp, store) = setup().await;
    store.write("reports/q1.txt", "q1").await.expect("write");

    let entries = store.list_dir("reports").await.expect("list");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "q1.txt");

    let err = store.list_dir("..").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
}

#[tokio::test]
async fn remove_deletes_file() {
    let (_tmp, store) = setup().await;
    store.write("gone.txt", "x").await.expect("write");

    store.remove("gone.txt").await.expect("remove");

    let err = store.read("gone.txt").await.expect_err("removed");
    assert!(matches!(err, FileError::NotFound { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_never_interleave() {
    let (_tmp, store) = setup().await;
    let a = vec![b'a'; 256 * 1024];
    let b = vec![b'b'; 256 * 1024];
    store.write("shared.bin", &a).await.expect("seed");

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        let payload = if i % 2 == 0 { a.clone() } else { b.clone() };
        tasks.push(tokio::spawn(async move {
            store.write("shared.bin", payload).await.expect("write");
        }));
    }
    for _ in 0..16 {
        let store = store.clone();
        let (a, b) = (a.clone(), b.clone());
        tasks.push(tokio::spawn(async move {
            let seen = store.read("shared.bin").await.expect("read");
            assert!(seen == a || seen == b, "observed a torn write");
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    let last = store.read("shared.bin").await.expect("final read");
    assert!(last == a || last == b);

    // No staging files are left behind.
    let names = names_in(store.root());
    assert!(names.iter().all(|n| !n.ends_with(".partial")), "{names:?}");
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_out_of_root_is_rejected() {
    use std::os::unix::fs::symlink;

    let (tmp, store) = setup().await;
    let outside = tmp.path().join("outside");
    std::fs::create_dir(&outside).expect("outside dir");
    std::fs::write(outside.join("loot.txt"), b"loot").expect("loot");
    symlink(&outside, store.root().join("link")).expect("dir symlink");
    symlink(tmp.path().join("secret.txt"), store.root().join("secret-link.txt"))
        .expect("file symlink");

    let err = store.read("link/loot.txt").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));

    let err = store.read("secret-link.txt").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));

    let err = store.write("link/new.txt", "x").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
    assert!(!outside.join("new.txt").exists());

    let err = store.write("link/deeper/new.txt", "x").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));

    // Symlinks are not listed.
    let entries = store.list().await.expect("list");
    assert!(entries.iter().all(|e| e.name != "secret-link.txt"));
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_within_root_is_followed() {
    use std::os::unix::fs::symlink;

    let (_tmp, store) = setup().await;
    store.write("reports/real.txt", "real").await.expect("write");
    symlink(
        store.root().join("reports").join("real.txt"),
        store.root().join("alias.txt"),
    )
    .expect("symlink");

    assert_eq!(store.read("alias.txt").await.expect("read"), b"real");
}

#[tokio::test]
async fn long_file_names_can_be_written() {
    let (_tmp, store) = setup().await;
    let name = "n".repeat(230);

    let outcome = store.write(&name, "x").await.expect("write long name");
    assert!(!outcome.replaced);
    assert_eq!(store.read(&name).await.expect("read"), b"x");
    assert_eq!(
        names_in(store.root()),
        [name, "reports".to_string()]
    );
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_symlink_out_of_root_is_rejected() {
    use std::os::unix::fs::symlink;

    let (tmp, store) = setup().await;
    let missing = tmp.path().join("not-yet.txt");
    symlink(&missing, store.root().join("dang")).expect("dangling symlink");
    symlink("../../gone.txt", store.root().join("reports").join("dang-rel"))
        .expect("relative dangling symlink");

    let err = store.read("dang").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));

    let err = store.write("dang", "x").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
    assert!(!missing.exists());
    assert!(
        std::fs::symlink_metadata(store.root().join("dang"))
            .expect("link kept")
            .file_type()
            .is_symlink()
    );

    let err = store.write("reports/dang-rel", "x").await.expect_err("escape");
    assert!(matches!(err, FileError::PathEscapesRoot { .. }));
    assert!(!tmp.path().join("gone.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn dangling_symlink_within_root_is_not_found_on_read() {
    use std::os::unix::fs::symlink;

    let (_tmp, store) = setup().await;
    symlink("reports/later.txt", store.root().join("pending")).expect("symlink");

    let err = store.read("pending").await.expect_err("missing target");
    assert!(matches!(err, FileError::NotFound { .. }));
}
