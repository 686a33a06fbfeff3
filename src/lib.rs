//! # yarn-install
//!
//! Dependency installation for Yarn projects in a layered build.
//!
//! This crate decides which Yarn generation a project uses, whether the
//! previous build's `node_modules` can be reused, and how to run
//! `yarn install` so the result is reproducible, offline when the project
//! vendors its packages, and cached into a reusable layer.
//!
//! ## Features
//!
//! - `detect()` to gate a build on `yarn.lock` and `package.json` and list
//!   what the install requires
//! - `classify()` to tell Classic (Yarn 1) from Modern (Yarn 2+) projects
//! - `InstallProcess` for fingerprinting, staging and installing step by step
//! - `pipeline::run()` to drive one whole build with progress reporting
//!
//! ## Example
//!
//! ```rust,no_run
//! use yarn_install::{detect, pipeline, BuildEnvironment, BuildRequest, InstallOptions, YarnExecutable};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), yarn_install::InstallError> {
//!     let env = BuildEnvironment::from_process();
//!     let plan = detect(Path::new("/workspace"), &env)?;
//!     println!("requires: {:?}", plan.requires);
//!
//!     let request = BuildRequest {
//!         working_dir: "/workspace".into(),
//!         current_layer: Some("/layers/node-modules-previous".into()),
//!         next_layer: "/layers/node-modules".into(),
//!         prior_fingerprint: None,
//!         env,
//!     };
//!     let outcome = pipeline::run(&YarnExecutable::new(), &request, &InstallOptions::default(), |stage| {
//!         println!("{}", stage.description());
//!     })
//!     .await?;
//!     println!("{} install, fingerprint {:?}", outcome.variant.display_name(), outcome.fingerprint);
//!     Ok(())
//! }
//! ```

mod detect;
pub(crate) mod detection;
mod environment;
pub(crate) mod install;
mod options;
pub mod pipeline;
mod variant;

pub use detect::{
    detect, DetectResult, Requirement, RequirementMetadata, PLAN_DEPENDENCY_NODE, PLAN_DEPENDENCY_NODE_MODULES,
    PLAN_DEPENDENCY_YARN,
};
pub use detection::{
    classify, classify_with_policy, find_project_path, read_constraints, ProjectDescriptor, VersionConstraint,
    VersionSource, PACKAGE_JSON,
};
pub use environment::{BuildEnvironment, BP_NODE_PROJECT_PATH, NODE_ENV, PATH};
pub use install::{
    setup_modules, Executable, Execution, ExecutionOutput, FingerprintDecision, InstallError, InstallInvocation,
    InstallProcess, InstallResult, OutputMode, PipelineStage, YarnExecutable, NODE_MODULES, YARN_LOCK,
};
pub use options::{InstallOptions, LegacyPinPolicy};
pub use pipeline::{BuildRequest, PipelineOutcome};
pub use variant::{PackageManagerVariant, YARNRC_YML, YARN_CACHE_DIR, YARN_DIR};
