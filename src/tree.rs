//! Recursive source-tree copies for the two builds.
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy `source` to `dest`, which must not exist yet.
///
/// Symlinks are recreated as links rather than followed, so a tree that
/// links outside itself is copied as-is.
pub fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(anyhow!("source root {} is not a directory", source.display()));
    }
    if dest.exists() {
        return Err(anyhow!("copy destination {} already exists", dest.display()));
    }
    // Directory modes are applied last so read-only directories can be filled.
    let mut dir_modes = Vec::new();
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", source.display()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .context("strip source prefix")?;
        let target = dest.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).with_context(|| format!("create {}", target.display()))?;
            let permissions = entry
                .metadata()
                .with_context(|| format!("stat {}", entry.path().display()))?
                .permissions();
            dir_modes.push((target, permissions));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("copy {}", entry.path().display()))?;
        }
    }
    for (dir, permissions) in dir_modes.into_iter().rev() {
        fs::set_permissions(&dir, permissions)
            .with_context(|| format!("chmod {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    let points_to = fs::read_link(link).with_context(|| format!("readlink {}", link.display()))?;
    std::os::unix::fs::symlink(&points_to, target)
        .with_context(|| format!("symlink {}", target.display()))?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    fs::copy(link, target).with_context(|| format!("copy {}", link.display()))?;
    Ok(())
}
