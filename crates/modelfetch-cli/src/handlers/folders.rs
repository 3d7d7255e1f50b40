//! `modelfetch folders` - show how folder classes resolve.

use std::fmt::Write as _;

use modelfetch_core::{FolderMap, FolderResolver};

/// Print every folder class and its directories.
pub fn execute(map: &FolderMap) {
    print!("{}", render(map));
}

/// One line per class; the first directory is where downloads land.
pub fn render(resolver: &dyn FolderResolver) -> String {
    let mut out = String::new();
    for class in resolver.known_classes() {
        let dirs = resolver.resolve(&class);
        let Some((first, rest)) = dirs.split_first() else {
            continue;
        };
        let _ = writeln!(out, "{class:<18} {}", first.display());
        for dir in rest {
            let _ = writeln!(out, "{:<18} {} (fallback)", "", dir.display());
        }
    }
    out
}
