//! Filesystem helpers for staging `node_modules` trees.

use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

use crate::install::{InstallError, InstallResult};

/// Whether `path` is an existing directory, following symlinks.
///
/// Not-found is `Ok(false)`; any other stat failure is fatal.
pub(crate) fn is_dir(path: &Path) -> InstallResult<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InstallError::io("stat", path)(e)),
    }
}

/// Whether `path` exists, following symlinks.
pub(crate) fn exists(path: &Path) -> InstallResult<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(InstallError::io("stat", path)(e)),
    }
}

/// Replace `dst` with a copy of the tree at `src`.
///
/// Symlinks inside the tree (e.g. `node_modules/.bin/*`) are recreated as
/// symlinks rather than followed. An existing `dst` is removed first.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    let root = fs::metadata(src)?;
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", src.display()),
        ));
    }

    remove_path(dst)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            symlink(&fs::read_link(entry.path())?, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Remove whatever is at `path`; a symlink is unlinked, never followed.
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => remove_link_or_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Unlink a file or symlink. Windows directory symlinks need `remove_dir`.
fn remove_link_or_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        #[cfg(windows)]
        Err(_) => fs::remove_dir(path),
        #[cfg(not(windows))]
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
pub(crate) fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
pub(crate) fn symlink(original: &Path, link: &Path) -> io::Result<()> {
    let resolved = link.parent().map(|p| p.join(original));
    if resolved.map(|p| p.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(original, link)
    } else {
        std::os::windows::fs::symlink_file(original, link)
    }
}
