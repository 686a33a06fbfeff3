//! Staging of the working directory's `node_modules` before install.

use std::path::{Path, PathBuf};

use crate::install::{fs, Executable, InstallError, InstallProcess, InstallResult};

/// Module output directory name, in the working directory and in layers.
pub const NODE_MODULES: &str = "node_modules";

/// Prepare `<working_dir>/node_modules` and the next cache layer.
///
/// With a `current_layer` (the previous build's modules layer), its
/// `node_modules` is copied wholesale into `next_layer`; a failed copy is
/// fatal. If the working directory has no `node_modules` of its own (or only
/// a stale symlink), it is seeded from the current layer so the install
/// starts from the cached tree.
///
/// Without a current layer, a `node_modules` symlink left by an earlier run
/// is removed (the link only, never its target) and an empty directory is
/// created if nothing is there.
///
/// Either way `<working_dir>/node_modules` is a real directory on return,
/// never a symlink, and `next_layer` is returned as the staged location.
///
/// The fresh branch does not move the new directory into the layer: the
/// layer is populated after install, by the executor's post-install copy.
///
/// # Example
///
/// ```rust
/// use yarn_install::setup_modules;
///
/// let work = tempfile::tempdir().unwrap();
/// let layer = tempfile::tempdir().unwrap();
///
/// let staged = setup_modules(work.path(), None, layer.path()).unwrap();
/// assert_eq!(staged, layer.path());
/// assert!(work.path().join("node_modules").is_dir());
/// ```
pub fn setup_modules(
    working_dir: &Path,
    current_layer: Option<&Path>,
    next_layer: &Path,
) -> InstallResult<PathBuf> {
    let modules = working_dir.join(NODE_MODULES);
    let stale_link = remove_stale_symlink(&modules)?;

    match current_layer.filter(|p| !p.as_os_str().is_empty()) {
        Some(current) => {
            let cached = current.join(NODE_MODULES);
            let next = next_layer.join(NODE_MODULES);
            tracing::debug!(from = %cached.display(), to = %next.display(), "reusing modules layer");

            fs::copy_tree(&cached, &next).map_err(InstallError::io("copy node_modules to", &next))?;

            if stale_link || !fs::exists(&modules)? {
                fs::copy_tree(&cached, &modules)
                    .map_err(InstallError::io("copy node_modules to", &modules))?;
            }
        }
        None => {
            tracing::debug!(path = %modules.display(), "initializing node_modules");
        }
    }

    std::fs::create_dir_all(&modules).map_err(InstallError::io("create", &modules))?;

    Ok(next_layer.to_path_buf())
}

/// Unlink `path` if it is a symlink. Returns whether one was removed.
fn remove_stale_symlink(path: &Path) -> InstallResult<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(InstallError::io("stat", path)(e)),
    };

    if !meta.file_type().is_symlink() {
        return Ok(false);
    }

    tracing::debug!(path = %path.display(), "removing stale node_modules symlink");
    fs::remove_path(path).map_err(InstallError::io("remove symlink", path))?;
    Ok(true)
}

impl<E: Executable> InstallProcess<E> {
    /// See [`setup_modules`].
    pub fn setup_modules(
        &self,
        working_dir: &Path,
        current_layer: Option<&Path>,
        next_layer: &Path,
    ) -> InstallResult<PathBuf> {
        setup_modules(working_dir, current_layer, next_layer)
    }
}
