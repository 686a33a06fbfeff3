//! Install execution.
//!
//! This module assembles the variant-specific `yarn install` call and runs
//! it. Note that even when a cached `node_modules` is staged, `yarn install`
//! must still run: it is the only way native extensions get rebuilt.

use std::path::{Path, PathBuf};

use crate::environment::BuildEnvironment;
use crate::install::executable::{run_checked, Execution, OutputMode};
use crate::install::modules::NODE_MODULES;
use crate::install::{fs, Executable, InstallError, InstallProcess, InstallResult};

/// A fully resolved `yarn install` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallInvocation {
    /// Arguments after `yarn`.
    pub args: Vec<String>,
    /// Complete child environment.
    pub env: BuildEnvironment,
    /// Working directory of the call.
    pub dir: PathBuf,
    /// Whether `--offline` was requested.
    pub offline: bool,
}

impl<E: Executable> InstallProcess<E> {
    /// Resolve the install call without running it.
    ///
    /// 1. Environment: the snapshot with `<working_dir>/node_modules/.bin`
    ///    prepended to `PATH`
    /// 2. Offline evidence, per variant (Classic may run
    ///    `yarn config get yarn-offline-mirror`)
    /// 3. Arguments and environment overrides, per variant and phase
    pub async fn invocation(&self, working_dir: &Path, launch: bool) -> InstallResult<InstallInvocation> {
        let mut env = self.env.clone();
        env.prepend_path(&working_dir.join(NODE_MODULES).join(".bin"));

        let offline = self
            .variant
            .offline_available(&self.executable, working_dir, &env)
            .await?;

        let args = self.variant.install_args(launch, offline);
        self.variant.apply_environment(&mut env, launch);

        Ok(InstallInvocation {
            args,
            env,
            dir: working_dir.to_path_buf(),
            offline,
        })
    }

    /// Run `yarn install` and cache the resulting `node_modules`.
    ///
    /// Installer output is streamed to the log. After a successful install,
    /// `<working_dir>/node_modules` is copied to
    /// `<modules_layer>/node_modules`; that copy is best-effort and only
    /// logged on failure.
    ///
    /// # Errors
    ///
    /// - [`InstallError::Subprocess`] if a `yarn` call fails to launch or
    ///   exits nonzero, with its combined output attached
    /// - [`InstallError::Io`] if offline evidence cannot be inspected
    pub async fn execute(&self, working_dir: &Path, modules_layer: &Path, launch: bool) -> InstallResult<()> {
        let invocation = self.invocation(working_dir, launch).await?;
        self.run_invocation(invocation).await?;
        self.cache_modules(working_dir, modules_layer);
        Ok(())
    }

    /// Run a resolved install call, streaming its output.
    pub(crate) async fn run_invocation(&self, invocation: InstallInvocation) -> InstallResult<()> {
        let execution = Execution {
            args: invocation.args,
            env: invocation.env,
            dir: invocation.dir,
            output: OutputMode::Stream,
        };

        tracing::info!("Running '{}'", execution.command_line(self.executable.program()));
        run_checked(&self.executable, execution).await?;
        Ok(())
    }

    /// Copy the installed tree into the layer. Never fails the build.
    pub(crate) fn cache_modules(&self, working_dir: &Path, modules_layer: &Path) {
        let src = working_dir.join(NODE_MODULES);
        let dst = modules_layer.join(NODE_MODULES);

        match fs::copy_tree(&src, &dst) {
            Ok(()) => tracing::info!(layer = %modules_layer.display(), "Cached node_modules"),
            Err(e) => {
                let error = InstallError::io("copy node_modules to", &dst)(e);
                tracing::warn!(%error, "unable to cache node_modules; continuing");
            }
        }
    }
}
