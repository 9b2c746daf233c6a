// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn digest_ok(content: &'static str) -> impl FnOnce() -> Result<String, StorageError> {
    move || Ok(content.to_string())
}

#[test]
fn missing_cache_writes_and_returns_t_uri() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());
    let t = cache.resolve("file", "localhost", "/a/b.txt", 100.0, digest_ok("hash-a")).unwrap();
    assert_eq!(t, 100.0);
    assert!(cache.cache_path("file", "localhost", "/a/b.txt").exists());
}

#[test]
fn stale_cache_rehashes_and_detects_unchanged_content() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());

    // First write: cache mtime is "now", definitely > t_uri=100.
    cache.resolve("file", "localhost", "/a.txt", 100.0, digest_ok("same-hash")).unwrap();

    // Force the cache file to look older than a later t_uri so branch 5
    // in the oracle algorithm doesn't short-circuit on freshness.
    let cache_path = cache.cache_path("file", "localhost", "/a.txt");
    let ancient = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1);
    std::fs::File::options().write(true).open(&cache_path).unwrap().set_modified(ancient).unwrap();

    let t = cache.resolve("file", "localhost", "/a.txt", 200.0, digest_ok("same-hash")).unwrap();
    assert_eq!(t, 100.0, "unchanged content must report the originally cached time");

    let meta = std::fs::metadata(&cache_path).unwrap();
    let new_mtime = meta.modified().unwrap().duration_since(std::time::UNIX_EPOCH).unwrap().as_secs();
    assert!(new_mtime > 1, "touch must advance the cache file's mtime");
}

#[test]
fn stale_cache_with_changed_content_returns_t_uri_and_rewrites() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());

    cache.resolve("file", "localhost", "/a.txt", 100.0, digest_ok("hash-v1")).unwrap();
    let cache_path = cache.cache_path("file", "localhost", "/a.txt");
    let ancient = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1);
    std::fs::File::options().write(true).open(&cache_path).unwrap().set_modified(ancient).unwrap();

    let t = cache.resolve("file", "localhost", "/a.txt", 200.0, digest_ok("hash-v2")).unwrap();
    assert_eq!(t, 200.0, "changed content must report the fresh uri time");
}

#[test]
fn fresh_cache_short_circuits_without_hashing() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());
    cache.resolve("file", "localhost", "/a.txt", 100.0, digest_ok("hash-v1")).unwrap();

    // Cache file's mtime is "now" > t_uri=100 in every realistic clock,
    // so a digest that panics if invoked should never be called.
    let t = cache
        .resolve("file", "localhost", "/a.txt", 100.0, || -> Result<String, StorageError> {
            panic!("digest must not be computed when the cache is fresh")
        })
        .unwrap();
    assert_eq!(t, 100.0);
}

#[test]
fn corrupt_cache_file_is_treated_as_missing() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());
    let cache_path = cache.cache_path("file", "localhost", "/a.txt");
    std::fs::create_dir_all(cache_path.parent().unwrap()).unwrap();
    std::fs::write(&cache_path, b"not json").unwrap();

    let t = cache.resolve("file", "localhost", "/a.txt", 50.0, digest_ok("hash")).unwrap();
    assert_eq!(t, 50.0);
}

#[test]
fn cache_path_strips_leading_slash_from_abs_path() {
    let dir = tempdir().unwrap();
    let cache = HashCache::new(dir.path());
    let path = cache.cache_path("gs", "bucket", "/some/key");
    assert_eq!(path, dir.path().join("gs").join("bucket").join("some/key"));
}