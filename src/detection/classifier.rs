//! Classic vs Modern classification from static project evidence.

use semver::Version;
use std::cmp::Ordering;
use std::path::Path;

use crate::detection::manifest::PackageJson;
use crate::options::LegacyPinPolicy;
use crate::variant::{PackageManagerVariant, YARNRC_YML, YARN_DIR};

/// Classify the project with the default [`LegacyPinPolicy`].
///
/// Evidence is evaluated in order, first match wins:
///
/// 1. `.yarnrc.yml` exists
/// 2. `.yarn/` is a directory
/// 3. `package.json#packageManager` pins `yarn@<version>`
/// 4. otherwise Classic
///
/// Never fails; unreadable files count as absent evidence.
///
/// # Example
///
/// ```rust
/// use yarn_install::{classify, PackageManagerVariant};
///
/// let dir = tempfile::tempdir().unwrap();
/// assert_eq!(classify(dir.path()), PackageManagerVariant::Classic);
///
/// std::fs::write(dir.path().join(".yarnrc.yml"), "").unwrap();
/// assert_eq!(classify(dir.path()), PackageManagerVariant::Modern);
/// ```
pub fn classify(project: &Path) -> PackageManagerVariant {
    classify_with_policy(project, LegacyPinPolicy::default())
}

/// Classify the project, deciding legacy-looking pins with `policy`.
pub fn classify_with_policy(project: &Path, policy: LegacyPinPolicy) -> PackageManagerVariant {
    if project.join(YARNRC_YML).exists() {
        tracing::debug!("{} present", YARNRC_YML);
        return PackageManagerVariant::Modern;
    }

    if project.join(YARN_DIR).is_dir() {
        tracing::debug!("{}/ directory present", YARN_DIR);
        return PackageManagerVariant::Modern;
    }

    let pin = PackageJson::load_lenient(project).and_then(|pkg| pkg.raw_yarn_pin().map(String::from));
    if let Some(version) = pin {
        let variant = classify_pin(&version, policy);
        tracing::debug!(pin = %version, %variant, "classified from packageManager");
        return variant;
    }

    PackageManagerVariant::Classic
}

/// Decide the variant for the version part of a `yarn@<version>` pin.
fn classify_pin(version: &str, policy: LegacyPinPolicy) -> PackageManagerVariant {
    if major_at_least_two(version) {
        return PackageManagerVariant::Modern;
    }

    match policy {
        LegacyPinPolicy::AssumeModern => PackageManagerVariant::Modern,
        LegacyPinPolicy::TrustVersion => PackageManagerVariant::Classic,
    }
}

fn major_at_least_two(version: &str) -> bool {
    if let Ok(parsed) = Version::parse(version) {
        return parsed.major >= 2;
    }

    let major = version
        .split(|c| c == '.' || c == '-')
        .next()
        .unwrap_or_default();
    if major.is_empty() {
        return false;
    }

    match major.parse::<u64>() {
        Ok(n) => n >= 2,
        Err(_) => major.cmp("2") != Ordering::Less,
    }
}
