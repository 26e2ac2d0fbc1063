//! CLI output formatting for the catalog pipeline.
//!
//! # Information-First Display
//!
//! Output is **content-centric**: every node is shown by its positional
//! index and display title, with the uid as secondary context in parens.
//! Reading the tree output should feel like reading the catalog itself.
//!
//! # Output Format
//!
//! ## Tree
//!
//! ```text
//! Catalog
//! 001 Sutta Piṭaka (sutta)
//!     001 Middle Discourses (mn)
//!         001 The Root of All Things (mn1) [3 translations]
//! ```
//!
//! ## Build
//!
//! ```text
//! Fetch
//!     41210/41233 requests succeeded (99.9%), 41000 from cache, 23 failed
//!     Publication info missing: 812
//!     Elapsed: 2.4 min
//!
//! Views
//! index → _data/index.json (3 entries)
//! texts → _data/texts.json (18327 entries)
//!
//! Wrote 6 views, 31880 entries
//! ```
//!
//! # Architecture
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::fetch::FetchSummary;
use crate::types::ContentNode;
use crate::views::ViewKind;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format a node header: positional index, title, uid, translation count.
///
/// ```text
/// 001 Middle Discourses (mn)
/// 001 The Root of All Things (mn1) [3 translations]
/// ```
fn node_header(index: usize, node: &ContentNode) -> String {
    let title = node.display_title();
    let mut line = if title == node.uid {
        format!("{} {}", format_index(index), title)
    } else {
        format!("{} {} ({})", format_index(index), title, node.uid)
    };
    let count = node.translations().len();
    if node.detail.is_some() {
        let noun = if count == 1 { "translation" } else { "translations" };
        line.push_str(&format!(" [{count} {noun}]"));
    }
    line
}

// ============================================================================
// Tree
// ============================================================================

/// Outline of the unified tree, optionally cut off below `max_depth`.
pub fn format_tree_output(tree: &[ContentNode], max_depth: Option<usize>) -> Vec<String> {
    let mut lines = vec!["Catalog".to_string()];
    if tree.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
        return lines;
    }
    walk_tree(tree, 0, max_depth, &mut lines);
    lines
}

fn walk_tree(nodes: &[ContentNode], depth: usize, max_depth: Option<usize>, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        lines.push(format!("{}{}", indent(depth), node_header(i + 1, node)));
        if max_depth.is_none_or(|max| depth < max) {
            walk_tree(&node.children, depth + 1, max_depth, lines);
        }
    }
}

pub fn print_tree_output(tree: &[ContentNode], max_depth: Option<usize>) {
    for line in format_tree_output(tree, max_depth) {
        println!("{}", line);
    }
}

// ============================================================================
// Fetch summary
// ============================================================================

pub fn format_fetch_summary(summary: &FetchSummary, elapsed: Option<Duration>) -> Vec<String> {
    let mut lines = vec!["Fetch".to_string(), format!("{}{}", indent(1), summary)];
    if summary.publication_info_misses > 0 {
        let mut line = format!(
            "{}Publication info missing: {}",
            indent(1),
            summary.publication_info_misses
        );
        if summary.publication_info_failures > 0 && summary.failures > 0 {
            let share =
                summary.publication_info_failures as f64 / summary.failures as f64 * 100.0;
            line.push_str(&format!(" ({share:.0}% of failures)"));
        }
        lines.push(line);
    }
    if summary.cache_timestamp_errors > 0 {
        lines.push(format!(
            "{}Cache timestamp errors: {}",
            indent(1),
            summary.cache_timestamp_errors
        ));
    }
    if summary.cache_write_errors > 0 {
        lines.push(format!(
            "{}Cache write errors: {}",
            indent(1),
            summary.cache_write_errors
        ));
    }
    if let Some(elapsed) = elapsed {
        lines.push(format!(
            "{}Elapsed: {:.1} min",
            indent(1),
            elapsed.as_secs_f64() / 60.0
        ));
    }
    lines
}

pub fn print_fetch_summary(summary: &FetchSummary, elapsed: Option<Duration>) {
    for line in format_fetch_summary(summary, elapsed) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// One line per written view plus a total.
pub fn format_build_output(views: &[(ViewKind, usize)], out_dir: &Path) -> Vec<String> {
    let mut lines = vec!["Views".to_string()];
    for (kind, count) in views {
        let noun = if *count == 1 { "entry" } else { "entries" };
        lines.push(format!(
            "{} → {} ({} {})",
            kind.name(),
            out_dir.join(kind.file_name()).display(),
            count,
            noun
        ));
    }
    let total: usize = views.iter().map(|(_, c)| c).sum();
    lines.push(String::new());
    lines.push(format!("Wrote {} views, {} entries", views.len(), total));
    lines
}

pub fn print_build_output(views: &[(ViewKind, usize)], out_dir: &Path) {
    for line in format_build_output(views, out_dir) {
        println!("{}", line);
    }
}
