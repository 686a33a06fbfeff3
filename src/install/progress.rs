//! Progress reporting for the install pipeline.
//!
//! The [`PipelineStage`] enum mirrors the pipeline's state machine; each
//! stage is reported to the caller's callback before it runs.

use crate::variant::PackageManagerVariant;

/// Stages of one pipeline run.
///
/// A run goes `Classifying → ReadingManifest → Fingerprinting`, then either
/// ends at `ReusingCache` or continues `Staging → Installing →
/// CachingModules → Completed`.
///
/// # Example
///
/// ```rust
/// use yarn_install::PipelineStage;
///
/// fn on_progress(stage: PipelineStage) {
///     match &stage {
///         PipelineStage::Installing { variant, offline } => {
///             println!("{} ({}, offline={})", stage.description(), variant.display_name(), offline);
///         }
///         _ => println!("{}", stage.description()),
///     }
/// }
///
/// on_progress(PipelineStage::Classifying);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStage {
    /// Deciding between Classic and Modern.
    Classifying,

    /// Reading version constraints from `package.json`.
    ReadingManifest {
        /// The variant that was selected.
        variant: PackageManagerVariant,
    },

    /// Computing and comparing the cache fingerprint.
    Fingerprinting,

    /// Fingerprints match; the previous layer is reused as-is.
    ReusingCache,

    /// Preparing `node_modules` and the next layer.
    Staging,

    /// Running `yarn install`.
    Installing {
        /// The variant whose grammar is used.
        variant: PackageManagerVariant,
        /// Whether `--offline` was requested.
        offline: bool,
    },

    /// Copying `node_modules` into the layer.
    CachingModules,

    /// The install finished.
    Completed,
}

impl PipelineStage {
    /// Human-readable description of the stage.
    ///
    /// # Example
    ///
    /// ```rust
    /// use yarn_install::PipelineStage;
    ///
    /// assert_eq!(PipelineStage::Fingerprinting.description(), "Checking cache fingerprint");
    /// ```
    pub fn description(&self) -> &'static str {
        match self {
            Self::Classifying => "Detecting Yarn variant",
            Self::ReadingManifest { .. } => "Reading package.json",
            Self::Fingerprinting => "Checking cache fingerprint",
            Self::ReusingCache => "Reusing cached node_modules",
            Self::Staging => "Staging node_modules",
            Self::Installing { .. } => "Installing dependencies",
            Self::CachingModules => "Caching node_modules",
            Self::Completed => "Install complete",
        }
    }

    /// Whether no stage follows this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReusingCache | Self::Completed)
    }
}
