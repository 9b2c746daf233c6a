// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use strata_core::job::{FileJobBuilder, PhonyJobBuilder};
use strata_core::table::JobTable;

#[test]
fn diamond_dependency_is_shared_not_duplicated() {
    let table = JobTable::new();
    table.register(FileJobBuilder::new(["a"], Vec::<String>::new()).build().unwrap()).unwrap();
    table.register(FileJobBuilder::new(["b"], ["a"]).build().unwrap()).unwrap();
    table.register(FileJobBuilder::new(["c"], ["a"]).build().unwrap()).unwrap();
    table.register(PhonyJobBuilder::new("all", ["b", "c"]).build()).unwrap();
    let metadata = MetadataTable::new();

    let builder = GraphBuilder::new(&table, &metadata, &[]);
    let roots = builder.build(&["all".to_string()]).unwrap();
    assert_eq!(roots.len(), 1);
    let all = &roots[0];
    assert_eq!(all.children.len(), 2);
    let a_via_b = Arc::as_ptr(&all.children[0].children[0]);
    let a_via_c = Arc::as_ptr(&all.children[1].children[0]);
    assert_eq!(a_via_b, a_via_c, "both paths to `a` must resolve to the same node");
}

#[test]
fn direct_cycle_is_rejected() {
    let table = JobTable::new();
    table.register(FileJobBuilder::new(["x"], ["y"]).build().unwrap()).unwrap();
    table.register(FileJobBuilder::new(["y"], ["x"]).build().unwrap()).unwrap();
    let metadata = MetadataTable::new();
    let builder = GraphBuilder::new(&table, &metadata, &[]);
    let err = builder.build(&["x".to_string()]).unwrap_err();
    assert!(matches!(err, EngineError::Cycle(_)));
}

#[test]
fn target_depending_on_itself_is_a_cycle() {
    let table = JobTable::new();
    table.register(FileJobBuilder::new(["x"], ["x"]).build().unwrap()).unwrap();
    let metadata = MetadataTable::new();
    let builder = GraphBuilder::new(&table, &metadata, &[]);
    assert!(builder.build(&["x".to_string()]).is_err());
}

#[test]
fn unresolved_dependency_synthesizes_a_no_rule_leaf_marked_keep() {
    let table = JobTable::new();
    table.register(FileJobBuilder::new(["out"], ["missing.txt"]).build().unwrap()).unwrap();
    let metadata = MetadataTable::new();
    let builder = GraphBuilder::new(&table, &metadata, &[]);
    let roots = builder.build(&["out".to_string()]).unwrap();
    let leaf = &roots[0].children[0];
    assert_eq!(leaf.primary_target(), "missing.txt");
    assert!(metadata.keep("missing.txt"));
}

#[test]
fn cut_target_is_treated_as_external_and_not_traversed() {
    let table = JobTable::new();
    table.register(FileJobBuilder::new(["generated"], Vec::<String>::new()).build().unwrap()).unwrap();
    table.register(FileJobBuilder::new(["out"], ["generated"]).build().unwrap()).unwrap();
    let metadata = MetadataTable::new();
    let cut = vec!["generated".to_string()];
    let builder = GraphBuilder::new(&table, &metadata, &cut);
    let roots = builder.build(&["out".to_string()]).unwrap();
    let leaf = &roots[0].children[0];
    assert!(leaf.children.is_empty());
    assert!(metadata.keep("generated"));
}

#[test]
fn children_are_sorted_by_priority_then_declaration_order() {
    let table = JobTable::new();
    table
        .register(FileJobBuilder::new(["low"], Vec::<String>::new()).priority(5).build().unwrap())
        .unwrap();
    table
        .register(FileJobBuilder::new(["high"], Vec::<String>::new()).priority(-5).build().unwrap())
        .unwrap();
    table
        .register(FileJobBuilder::new(["mid"], Vec::<String>::new()).priority(0).build().unwrap())
        .unwrap();
    table.register(PhonyJobBuilder::new("all", ["low", "high", "mid"]).build()).unwrap();
    let metadata = MetadataTable::new();
    let builder = GraphBuilder::new(&table, &metadata, &[]);
    let roots = builder.build(&["all".to_string()]).unwrap();
    let order: Vec<&str> = roots[0].children.iter().map(|c| c.primary_target()).collect();
    assert_eq!(order, vec!["high", "mid", "low"]);
}