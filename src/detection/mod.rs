//! Static inspection of the project tree.
//!
//! - `classifier`: Classic vs Modern Yarn from config files and pins
//! - `manifest`: version constraints declared in `package.json`
//! - `project_path`: `BP_NODE_PROJECT_PATH` resolution

pub(crate) mod classifier;
pub(crate) mod manifest;
mod project_path;

pub use classifier::{classify, classify_with_policy};
pub use manifest::{read_constraints, ProjectDescriptor, VersionConstraint, VersionSource, PACKAGE_JSON};
pub use project_path::find_project_path;
