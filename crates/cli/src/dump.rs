// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `-D`/`-P`/`-Q`/`-J`: descriptions, dependencies, and their DOT/JSON
//! renderings. All four operate over every declared job, not just the
//! subset reachable from the invoked roots — they describe the whole
//! manifest, independent of what's being built this run.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::job::Job;

/// One target per line, followed by its description indented with a tab
/// when one was given.
pub fn render_descriptions(jobs: &[Arc<Job>]) -> String {
    let mut rows: Vec<(&str, Option<&str>)> = Vec::new();
    for job in jobs {
        for target in &job.targets {
            rows.push((target.as_str(), job.desc.as_deref()));
        }
    }
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = String::new();
    for (target, desc) in rows {
        out.push_str(target);
        out.push('\n');
        if let Some(desc) = desc {
            for line in desc.lines() {
                out.push('\t');
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

/// One block per job: its targets, then its dependencies indented with a
/// tab, blank line between blocks.
pub fn render_dependencies(jobs: &[Arc<Job>]) -> String {
    let mut sorted: Vec<&Arc<Job>> = jobs.iter().collect();
    sorted.sort_by_key(|job| sorted_targets(job));

    let mut out = String::new();
    for job in sorted {
        for target in &job.targets {
            out.push_str(target);
            out.push('\n');
        }
        for dep in &job.deps_unique {
            out.push('\t');
            out.push_str(dep);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}

#[derive(Serialize)]
struct DependencyEntry {
    targets: Vec<String>,
    deps: Vec<String>,
}

pub fn render_dependencies_json(jobs: &[Arc<Job>]) -> Result<String, serde_json::Error> {
    let mut entries: Vec<DependencyEntry> = jobs
        .iter()
        .map(|job| DependencyEntry { targets: job.targets.clone(), deps: job.deps_unique.clone() })
        .collect();
    entries.sort_by(|a, b| a.targets.cmp(&b.targets));
    serde_json::to_string_pretty(&entries)
}

/// Graphviz DOT: every target and dependency is a node, every job an
/// intermediate "action" node its targets point into and that points out
/// to its dependencies.
pub fn render_dependencies_dot(jobs: &[Arc<Job>]) -> String {
    let mut sorted: Vec<&Arc<Job>> = jobs.iter().collect();
    sorted.sort_by_key(|job| sorted_targets(job));

    let mut node_ids: HashMap<String, String> = HashMap::new();
    let mut next_id = 0usize;

    let mut out = String::new();
    out.push_str("digraph dependencies {\n");
    for (index, job) in sorted.iter().enumerate() {
        let action_node = format!("action_{}", index + 1);
        out.push_str(&format!("  {action_node} [shape=point];\n"));

        let mut targets = job.targets.clone();
        targets.sort();
        for target in &targets {
            let node = node_of(target, &mut node_ids, &mut next_id);
            out.push_str(&format!("  {node} [label={}];\n", dot_escape(target)));
            out.push_str(&format!("  {node} -> {action_node};\n"));
        }

        let mut deps = job.deps_unique.clone();
        deps.sort();
        for dep in &deps {
            let node = node_of(dep, &mut node_ids, &mut next_id);
            out.push_str(&format!("  {node} [label={}];\n", dot_escape(dep)));
            out.push_str(&format!("  {action_node} -> {node};\n"));
        }
    }
    out.push_str("}\n");
    out
}

fn sorted_targets(job: &Job) -> Vec<String> {
    let mut targets = job.targets.clone();
    targets.sort();
    targets
}

fn node_of(name: &str, node_ids: &mut HashMap<String, String>, next_id: &mut usize) -> String {
    if let Some(id) = node_ids.get(name) {
        return id.clone();
    }
    *next_id += 1;
    let id = format!("n{next_id}");
    node_ids.insert(name.to_string(), id.clone());
    id
}

fn dot_escape(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;
