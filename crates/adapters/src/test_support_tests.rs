// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strata_core::Uri;

#[test]
fn unset_uri_is_not_found() {
    let fake = FakeAdapter::new();
    let uri = Uri::parse("/missing").unwrap();
    assert!(fake.mtime(&uri, None, false).is_err());
}

#[test]
fn set_mtime_is_reported_back() {
    let fake = FakeAdapter::new();
    let uri = Uri::parse("/a.txt").unwrap();
    fake.set_mtime("file://localhost/a.txt", 7.5);
    assert_eq!(fake.mtime(&uri, None, false).unwrap(), 7.5);
}

#[test]
fn rm_then_mtime_is_not_found_and_logged() {
    let fake = FakeAdapter::new();
    let uri = Uri::parse("/a.txt").unwrap();
    fake.set_mtime("file://localhost/a.txt", 1.0);
    fake.rm(&uri, None).unwrap();
    assert!(fake.mtime(&uri, None, false).is_err());
    assert_eq!(fake.rm_log(), vec!["file://localhost/a.txt".to_string()]);
}

#[test]
fn rm_twice_errors_on_second_call() {
    let fake = FakeAdapter::new();
    let uri = Uri::parse("/a.txt").unwrap();
    fake.set_mtime("file://localhost/a.txt", 1.0);
    fake.rm(&uri, None).unwrap();
    assert!(fake.rm(&uri, None).is_err());
}