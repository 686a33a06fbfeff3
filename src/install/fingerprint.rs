//! Cache fingerprinting: decides whether a previous install can be reused.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tempfile::Builder;

use crate::detection::manifest::{PackageJson, PACKAGE_JSON};
use crate::install::{fs, Executable, InstallError, InstallProcess, InstallResult};

/// Lockfile name; its presence gates fingerprinting.
pub const YARN_LOCK: &str = "yarn.lock";

const SNAPSHOT_PREFIX: &str = "yarn-config-";

/// Outcome of [`InstallProcess::should_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintDecision {
    /// Whether the install has to run.
    pub run: bool,
    /// Fingerprint of the current inputs; `None` when there is no lockfile.
    ///
    /// Returned on reuse as well, so the caller can persist it unchanged.
    pub fingerprint: Option<String>,
}

impl<E: Executable> InstallProcess<E> {
    /// Fingerprint the install inputs and compare with `prior`.
    ///
    /// The fingerprint covers, in order: `yarn.lock`, `package.json`, and a
    /// snapshot of the effective Yarn configuration followed by `NODE_ENV`.
    /// Without a lockfile there is nothing stable to key on, so the install
    /// always runs and no fingerprint is produced.
    ///
    /// # Errors
    ///
    /// - [`InstallError::MissingPrerequisite`] if `package.json` is absent
    /// - [`InstallError::Subprocess`] if `yarn config list` fails (Classic)
    /// - [`InstallError::Io`] for any read or stat failure
    pub async fn should_run(
        &self,
        working_dir: &Path,
        prior: Option<&str>,
    ) -> InstallResult<FingerprintDecision> {
        self.should_run_in(working_dir, prior, &std::env::temp_dir())
            .await
    }

    /// [`should_run`](Self::should_run) with the config snapshot written
    /// under `scratch`.
    pub(crate) async fn should_run_in(
        &self,
        working_dir: &Path,
        prior: Option<&str>,
        scratch: &Path,
    ) -> InstallResult<FingerprintDecision> {
        tracing::info!("Process inputs:");

        let lockfile = working_dir.join(YARN_LOCK);
        if !fs::exists(&lockfile)? {
            tracing::info!("{} -> Not found", YARN_LOCK);
            return Ok(FingerprintDecision {
                run: true,
                fingerprint: None,
            });
        }
        tracing::info!("{} -> Found", YARN_LOCK);

        let manifest = PackageJson::path(working_dir);
        if !fs::exists(&manifest)? {
            return Err(InstallError::MissingPrerequisite {
                name: PACKAGE_JSON.to_string(),
                path: working_dir.to_path_buf(),
            });
        }

        let mut snapshot = self
            .variant
            .config_snapshot(&self.executable, working_dir, &self.env)
            .await?;
        snapshot.extend_from_slice(self.env.node_env().as_bytes());

        // Removed when dropped, on every return path below.
        let mut file = Builder::new()
            .prefix(SNAPSHOT_PREFIX)
            .tempfile_in(scratch)
            .map_err(InstallError::io("create temp file in", scratch))?;
        file.write_all(&snapshot)
            .and_then(|_| file.flush())
            .map_err(InstallError::io("write", file.path()))?;

        let sum = checksum(&[&lockfile, &manifest, file.path()])?;

        let run = prior != Some(sum.as_str());
        tracing::debug!(fingerprint = %sum, ?prior, run, "compared fingerprints");

        Ok(FingerprintDecision {
            run,
            fingerprint: Some(sum),
        })
    }
}

/// SHA-256 over the per-file SHA-256 digests, in order.
///
/// Hashing each file separately keeps the byte boundary between inputs
/// significant: moving bytes from one file to the next changes the result.
fn checksum(paths: &[&Path]) -> InstallResult<String> {
    let mut combined = Sha256::new();
    for path in paths {
        combined.update(sha256_file(path)?.as_bytes());
    }
    Ok(hex::encode(combined.finalize()))
}

fn sha256_file(path: &Path) -> InstallResult<String> {
    let file = File::open(path).map_err(InstallError::io("open", path))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(InstallError::io("read", path))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
