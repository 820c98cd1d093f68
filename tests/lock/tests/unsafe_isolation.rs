//! Build-graph hygiene: `unsafe` lives only in the C boundary crate.
//!
//! The kernel and host crates declare `#![forbid(unsafe_code)]`; this test
//! keeps that attribute from being dropped and keeps `unsafe` blocks from
//! appearing in either crate.

use std::fs;
use std::path::Path;

use lock_tests::workspace_root;

fn scan(dir: &Path, hits: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan(&path, hits);
        } else if path.extension().is_some_and(|e| e == "rs") {
            let content = fs::read_to_string(&path).unwrap();
            for (line_no, line) in content.lines().enumerate() {
                let trimmed = line.trim();
                if trimmed.starts_with("//") || trimmed.contains("forbid(unsafe_code)") {
                    continue;
                }
                if trimmed.contains("unsafe ") || trimmed.contains("unsafe{") {
                    hits.push(format!("{}:{}: {trimmed}", path.display(), line_no + 1));
                }
            }
        }
    }
}

#[test]
fn safe_crates_forbid_unsafe() {
    let root = workspace_root();
    for krate in ["kernel", "host"] {
        let lib = fs::read_to_string(root.join(krate).join("src/lib.rs")).unwrap();
        assert!(
            lib.contains("#![forbid(unsafe_code)]"),
            "{krate}/src/lib.rs lost #![forbid(unsafe_code)]"
        );
        let mut hits = Vec::new();
        scan(&root.join(krate).join("src"), &mut hits);
        assert!(hits.is_empty(), "unsafe in {krate}: {hits:?}");
    }
}
