//! Fingerprinting, staging and running `yarn install`.
//!
//! An [`InstallProcess`] binds the external tool, the detected variant and
//! an environment snapshot for one build. Its three steps run in order:
//!
//! ```rust,no_run
//! use yarn_install::{classify, BuildEnvironment, InstallProcess, YarnExecutable};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), yarn_install::InstallError> {
//!     let working_dir = Path::new("/workspace");
//!     let layer = Path::new("/layers/node-modules");
//!     let process = InstallProcess::new(
//!         YarnExecutable::new(),
//!         classify(working_dir),
//!         BuildEnvironment::from_process(),
//!     );
//!
//!     let decision = process.should_run(working_dir, None).await?;
//!     if decision.run {
//!         let staged = process.setup_modules(working_dir, None, layer)?;
//!         process.execute(working_dir, &staged, false).await?;
//!     }
//!     Ok(())
//! }
//! ```

mod errors;
pub(crate) mod executable;
mod executor;
mod fingerprint;
pub(crate) mod fs;
pub(crate) mod modules;
mod process;
mod progress;

pub use errors::{InstallError, InstallResult};
pub use executable::{Executable, Execution, ExecutionOutput, OutputMode, YarnExecutable};
pub use executor::InstallInvocation;
pub use fingerprint::{FingerprintDecision, YARN_LOCK};
pub use modules::{setup_modules, NODE_MODULES};
pub use process::InstallProcess;
pub use progress::PipelineStage;
