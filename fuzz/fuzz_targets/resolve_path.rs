// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: 2026 Bastion Contributors

#![no_main]

use std::sync::LazyLock;

use bastion_core::FileStore;
use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;
use tokio::runtime::Runtime;

struct Fixture {
    runtime: Runtime,
    store: FileStore,
    _dir: TempDir,
}

static FIXTURE: LazyLock<Fixture> = LazyLock::new(|| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path().join("root/sub")).expect("root");
    std::fs::write(dir.path().join("outside.txt"), b"x").expect("outside file");
    let store = runtime
        .block_on(FileStore::open(dir.path().join("root")))
        .expect("store");
    Fixture {
        runtime,
        store,
        _dir: dir,
    }
});

fuzz_target!(|data: &[u8]| {
    let Ok(rel) = std::str::from_utf8(data) else {
        return;
    };
    let fixture = &*FIXTURE;
    if let Ok(path) = fixture.runtime.block_on(fixture.store.resolve(rel)) {
        assert!(
            path.starts_with(fixture.store.root()),
            "{rel:?} resolved outside the root"
        );
    }
});
