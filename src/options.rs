//! Install configuration.
//!
//! This module provides the [`InstallOptions`] struct and the
//! [`LegacyPinPolicy`] used by variant classification.

/// How to classify a `packageManager` pin like `yarn@1.22.19`.
///
/// Yarn 1 projects rarely carry a `packageManager` field, so its presence is
/// by default taken as evidence of Modern Yarn even when the pinned major is
/// below 2. This is a heuristic, hence configurable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LegacyPinPolicy {
    /// Any `yarn@` pin means Modern.
    #[default]
    AssumeModern,
    /// Follow the pinned major version: below 2 means Classic.
    TrustVersion,
}

/// Options for a single install pipeline run.
///
/// # Default Behavior
///
/// A build-phase install (`launch: false`, dev dependencies included) with
/// the conservative [`LegacyPinPolicy::AssumeModern`].
///
/// # Example
///
/// ```rust
/// use yarn_install::{InstallOptions, LegacyPinPolicy};
///
/// // Runtime image: production dependencies only
/// let opts = InstallOptions {
///     launch: true,
///     ..Default::default()
/// };
/// assert_eq!(opts.pin_policy, LegacyPinPolicy::AssumeModern);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Install for the launch (runtime) phase.
    ///
    /// When `false`, development dependencies are installed as well: Classic
    /// gets `--production false`, Modern gets `NODE_ENV=development`.
    ///
    /// Default: `false`
    pub launch: bool,

    /// Policy for legacy-looking `packageManager` pins.
    ///
    /// Default: [`LegacyPinPolicy::AssumeModern`]
    pub pin_policy: LegacyPinPolicy,
}
