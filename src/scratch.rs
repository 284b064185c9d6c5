//! Transient per-page storage for one download run.
//!
//! Each run gets its own directory under the system temp dir (or a caller
//! supplied root), partitioned by page number so workers never contend on
//! the same file. Backing the area with [`tempfile::TempDir`] makes removal
//! a drop-site guarantee: cleanup runs whether the run ends in `Done` or
//! `Failed`, and removal errors are discarded.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A per-run scratch directory holding one PDF artifact per page.
#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create the scratch area. With `root = None` it lives in the system
    /// temp directory.
    pub fn new(root: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("book2pdf-");
        let dir = match root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("Scratch area: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Location of the page artifact for `page`. Derivable from the page
    /// number alone, so fetch, conversion, and assembly need no shared
    /// bookkeeping beyond the registry.
    pub fn page_path(&self, page: u32) -> PathBuf {
        self.dir.path().join(format!("{page}.pdf"))
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_paths_are_partitioned_by_page_number() {
        let scratch = Scratch::new(None).unwrap();
        let a = scratch.page_path(1);
        let b = scratch.page_path(2);
        assert_ne!(a, b);
        assert!(a.starts_with(scratch.path()));
        assert_eq!(a.file_name().unwrap(), "1.pdf");
    }

    #[test]
    fn dropping_removes_the_area() {
        let parent = tempfile::tempdir().unwrap();
        let scratch = Scratch::new(Some(parent.path())).unwrap();
        let area = scratch.path().to_path_buf();
        std::fs::write(scratch.page_path(1), b"stub").unwrap();
        assert!(area.exists());

        drop(scratch);
        assert!(!area.exists());
    }
}
