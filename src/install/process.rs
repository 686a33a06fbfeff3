//! The per-build install process.

use crate::environment::BuildEnvironment;
use crate::install::Executable;
use crate::variant::PackageManagerVariant;

/// Everything the fingerprint, staging and install steps share for one build.
///
/// The variant is decided once, before construction, and every
/// variant-specific step dispatches on it. The environment is a snapshot;
/// nothing in the process reads `std::env`.
///
/// # Example
///
/// ```rust
/// use yarn_install::{BuildEnvironment, InstallProcess, PackageManagerVariant, YarnExecutable};
///
/// let process = InstallProcess::new(
///     YarnExecutable::new(),
///     PackageManagerVariant::Modern,
///     BuildEnvironment::from_process(),
/// );
/// assert_eq!(process.variant(), PackageManagerVariant::Modern);
/// ```
#[derive(Debug, Clone)]
pub struct InstallProcess<E> {
    pub(crate) executable: E,
    pub(crate) variant: PackageManagerVariant,
    pub(crate) env: BuildEnvironment,
}

impl<E: Executable> InstallProcess<E> {
    /// Bind an executable, a variant and an environment snapshot.
    pub fn new(executable: E, variant: PackageManagerVariant, env: BuildEnvironment) -> Self {
        Self {
            executable,
            variant,
            env,
        }
    }

    /// The variant this process was built for.
    pub fn variant(&self) -> PackageManagerVariant {
        self.variant
    }

    /// The environment snapshot.
    pub fn environment(&self) -> &BuildEnvironment {
        &self.env
    }

    /// The underlying executable.
    pub fn executable(&self) -> &E {
        &self.executable
    }
}
