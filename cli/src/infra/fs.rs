//! Filesystem infrastructure — implements `ProjectFs` on the local disk.

use std::any::Any;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::ProjectFs;
use crate::domain::fingerprint::FingerprintInput;

/// Directory names never copied into an image nor hashed.
const SKIPPED_DIRS: &[&str] = &["__pycache__", ".git", ".mypy_cache", ".pytest_cache"];

/// Production filesystem implementation of `ProjectFs`.
pub struct LocalFs;

impl ProjectFs for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn tree_inputs(&self, root: &Path, dir: &Path) -> Result<Vec<FingerprintInput>> {
        let mut files = Vec::new();
        walk(dir, &mut files)?;
        files
            .into_iter()
            .map(|path| {
                let content =
                    std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                let label = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                Ok(FingerprintInput::new(label, content))
            })
            .collect()
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = Vec::new();
        walk(from, &mut files)?;
        std::fs::create_dir_all(to).with_context(|| format!("creating directory {}", to.display()))?;
        for file in files {
            let rel = file.strip_prefix(from).unwrap_or(&file);
            self.copy_file(&file, &to.join(rel))?;
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::copy(from, to)
            .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        Ok(())
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        std::fs::write(path, content).with_context(|| format!("writing file {}", path.display()))
    }

    fn create_staging(&self, out: &Path) -> Result<(PathBuf, Box<dyn Any>)> {
        let parent = match out.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
        let name = out
            .file_name()
            .map_or_else(|| "out".into(), |n| n.to_string_lossy().into_owned());
        // Same parent as `out`, so the final rename never crosses filesystems.
        let dir = tempfile::Builder::new()
            .prefix(&format!(".{name}.staging-"))
            .tempdir_in(&parent)
            .with_context(|| format!("creating staging directory in {}", parent.display()))?;
        let path = dir.path().to_path_buf();
        Ok((path, Box::new(dir)))
    }

    fn promote(&self, staging: &Path, out: &Path) -> Result<()> {
        std::fs::rename(staging, out)
            .with_context(|| format!("moving {} to {}", staging.display(), out.display()))
    }
}

/// Collect regular files under `dir`, sorted, skipping cache directories.
fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("reading directory {}", dir.display()))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);
    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("inspecting {}", path.display()))?;
        if file_type.is_dir() {
            let skip = entry
                .file_name()
                .to_str()
                .is_some_and(|n| SKIPPED_DIRS.contains(&n));
            if !skip {
                walk(&path, files)?;
            }
        } else if path.extension().is_some_and(|e| e == "pyc") {
            continue;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
