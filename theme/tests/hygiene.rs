//! Hygiene: source-level budgets for the theme crate.
//!
//! Every pattern below is banned from production sources under `src/`
//! (sibling `*_test.rs` files are skipped). Nothing in this crate may take the
//! page down, so panicking shortcuts are out; errors are logged through the
//! `log` facade, never printed. Budgets only ever go down.

use std::fs;
use std::path::Path;

struct Budget {
    pattern: &'static str,
    max: usize,
    why: &'static str,
}

// Panics: a theme script must never crash the page.
const UNWRAP: Budget = Budget { pattern: ".unwrap()", max: 0, why: "propagate or fall back instead" };
const EXPECT: Budget = Budget { pattern: ".expect(", max: 0, why: "propagate or fall back instead" };
const PANIC: Budget = Budget { pattern: "panic!(", max: 0, why: "absorb and log" };
const UNREACHABLE: Budget = Budget { pattern: "unreachable!(", max: 0, why: "model the case" };
const TODO: Budget = Budget { pattern: "todo!(", max: 0, why: "finish the stub" };
const UNIMPLEMENTED: Budget = Budget { pattern: "unimplemented!(", max: 0, why: "finish the stub" };

// Silent loss: errors must be inspected and logged.
const SILENT_DISCARD: Budget = Budget { pattern: "let _ =", max: 0, why: "match and log the error" };
const DOT_OK: Budget = Budget { pattern: ".ok()", max: 0, why: "match and log the error" };

// Output goes through `log`.
const PRINTLN: Budget = Budget { pattern: "println!(", max: 0, why: "use log::info! and friends" };
const EPRINTLN: Budget = Budget { pattern: "eprintln!(", max: 0, why: "use log::warn! and friends" };
const DBG: Budget = Budget { pattern: "dbg!(", max: 0, why: "remove debugging output" };

const ALLOW_DEAD_CODE: Budget = Budget { pattern: "#[allow(dead_code)]", max: 0, why: "delete the dead code" };

struct SourceFile {
    path: String,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let mut files = Vec::new();
    collect_rs_files(Path::new("src"), &mut files);
    files
}

fn collect_rs_files(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_rs_files(&path, out);
            continue;
        }
        let path_str = path.to_string_lossy().to_string();
        if !path_str.ends_with(".rs") || path_str.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push(SourceFile { path: path_str, content });
        }
    }
}

fn check(budget: &Budget) {
    let files = source_files();
    assert!(!files.is_empty(), "no sources found under src/; run from the crate root");

    let hits: Vec<(String, usize)> = files
        .iter()
        .filter_map(|file| {
            let count = file.content.lines().filter(|line| line.contains(budget.pattern)).count();
            (count > 0).then(|| (file.path.clone(), count))
        })
        .collect();
    let count: usize = hits.iter().map(|(_, c)| c).sum();
    let listing = hits
        .iter()
        .map(|(path, c)| format!("  {path}: {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    assert!(
        count <= budget.max,
        "`{}` budget exceeded: found {count}, max {} ({}).\n{listing}",
        budget.pattern,
        budget.max,
        budget.why
    );
}

#[test]
fn unwrap_budget() {
    check(&UNWRAP);
}

#[test]
fn expect_budget() {
    check(&EXPECT);
}

#[test]
fn panic_budget() {
    check(&PANIC);
}

#[test]
fn unreachable_budget() {
    check(&UNREACHABLE);
}

#[test]
fn todo_budget() {
    check(&TODO);
}

#[test]
fn unimplemented_budget() {
    check(&UNIMPLEMENTED);
}

#[test]
fn silent_discard_budget() {
    check(&SILENT_DISCARD);
}

#[test]
fn dot_ok_budget() {
    check(&DOT_OK);
}

#[test]
fn print_budget() {
    check(&PRINTLN);
    check(&EPRINTLN);
    check(&DBG);
}

#[test]
fn allow_dead_code_budget() {
    check(&ALLOW_DEAD_CODE);
}
