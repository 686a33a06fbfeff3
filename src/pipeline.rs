//! The per-build install pipeline.
//!
//! This module provides [`run`], which drives classification, fingerprinting,
//! staging and the install itself for one build, reporting each stage.

use std::path::PathBuf;

use crate::detection::{classify_with_policy, find_project_path, read_constraints, ProjectDescriptor};
use crate::environment::BuildEnvironment;
use crate::install::{Executable, InstallProcess, InstallResult, PipelineStage};
use crate::options::InstallOptions;
use crate::variant::PackageManagerVariant;

/// Inputs the host supplies for one build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Application root; the project may live in a sub-directory of it
    /// (`BP_NODE_PROJECT_PATH`).
    pub working_dir: PathBuf,
    /// The previous build's modules layer, if it was restored.
    pub current_layer: Option<PathBuf>,
    /// The layer this build populates.
    pub next_layer: PathBuf,
    /// Fingerprint recorded by the previous build.
    pub prior_fingerprint: Option<String>,
    /// Environment snapshot.
    pub env: BuildEnvironment,
}

/// What one pipeline run decided and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    /// The variant the project was classified as.
    pub variant: PackageManagerVariant,
    /// Declared `node` and `yarn` versions.
    pub descriptor: ProjectDescriptor,
    /// Whether `yarn install` ran.
    pub installed: bool,
    /// Fingerprint to persist with the layer.
    pub fingerprint: Option<String>,
    /// The layer that now holds `node_modules`; `None` on reuse.
    pub staged_layer: Option<PathBuf>,
}

/// Run the install pipeline for one build.
///
/// This function:
/// 1. Resolves the project directory and classifies the Yarn variant
/// 2. Reads version constraints from `package.json`
/// 3. Fingerprints the install inputs and compares with the prior build
/// 4. On a match, stops: the previous layer is reused as-is
/// 5. Otherwise stages `node_modules`, runs `yarn install` and caches the
///    result into the next layer
///
/// Every stage is passed to `on_progress` before it runs.
///
/// # Example
///
/// ```rust,no_run
/// use yarn_install::{pipeline, BuildEnvironment, BuildRequest, InstallOptions, YarnExecutable};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let request = BuildRequest {
///         working_dir: "/workspace".into(),
///         current_layer: None,
///         next_layer: "/layers/node-modules".into(),
///         prior_fingerprint: None,
///         env: BuildEnvironment::from_process(),
///     };
///
///     let result = pipeline::run(
///         &YarnExecutable::new(),
///         &request,
///         &InstallOptions::default(),
///         |stage| println!("{}", stage.description()),
///     )
///     .await;
///
///     match result {
///         Ok(outcome) => println!("installed={} fingerprint={:?}", outcome.installed, outcome.fingerprint),
///         Err(e) => eprintln!("install failed: {}", e),
///     }
/// }
/// ```
pub async fn run<E, F>(
    executable: &E,
    request: &BuildRequest,
    options: &InstallOptions,
    on_progress: F,
) -> InstallResult<PipelineOutcome>
where
    E: Executable + Clone,
    F: Fn(PipelineStage) + Send + Sync,
{
    on_progress(PipelineStage::Classifying);
    let project = find_project_path(&request.working_dir, &request.env)?;
    let variant = classify_with_policy(&project, options.pin_policy);
    tracing::info!(variant = %variant, project = %project.display(), "Detected Yarn variant");

    on_progress(PipelineStage::ReadingManifest { variant });
    let descriptor = read_constraints(&project);

    let process = InstallProcess::new(executable.clone(), variant, request.env.clone());

    on_progress(PipelineStage::Fingerprinting);
    let decision = process
        .should_run(&project, request.prior_fingerprint.as_deref())
        .await?;

    if !decision.run {
        on_progress(PipelineStage::ReusingCache);
        tracing::info!("Reusing cached layer");
        return Ok(PipelineOutcome {
            variant,
            descriptor,
            installed: false,
            fingerprint: decision.fingerprint,
            staged_layer: None,
        });
    }

    on_progress(PipelineStage::Staging);
    let staged = process.setup_modules(&project, request.current_layer.as_deref(), &request.next_layer)?;

    let invocation = process.invocation(&project, options.launch).await?;
    on_progress(PipelineStage::Installing {
        variant,
        offline: invocation.offline,
    });
    process.run_invocation(invocation).await?;

    on_progress(PipelineStage::CachingModules);
    process.cache_modules(&project, &staged);

    on_progress(PipelineStage::Completed);
    Ok(PipelineOutcome {
        variant,
        descriptor,
        installed: true,
        fingerprint: decision.fingerprint,
        staged_layer: Some(staged),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{BP_NODE_PROJECT_PATH, NODE_ENV};
    use crate::install::executable::fake::FakeExecutable;
    use crate::install::{NODE_MODULES, YARN_LOCK};
    use crate::options::LegacyPinPolicy;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        work: TempDir,
        next: TempDir,
    }

    impl Fixture {
        fn new(manifest: &str) -> Self {
            let work = TempDir::new().unwrap();
            std::fs::write(work.path().join(YARN_LOCK), "# yarn lockfile v1\n").unwrap();
            std::fs::write(work.path().join("package.json"), manifest).unwrap();
            Self {
                work,
                next: TempDir::new().unwrap(),
            }
        }

        fn request(&self, prior: Option<&str>) -> BuildRequest {
            BuildRequest {
                working_dir: self.work.path().to_path_buf(),
                current_layer: None,
                next_layer: self.next.path().to_path_buf(),
                prior_fingerprint: prior.map(str::to_string),
                env: BuildEnvironment::from_pairs([(NODE_ENV, "production")]),
            }
        }
    }

    async fn run_collecting(
        exec: &FakeExecutable,
        request: &BuildRequest,
        options: &InstallOptions,
    ) -> (InstallResult<PipelineOutcome>, Vec<PipelineStage>) {
        let stages = Mutex::new(Vec::new());
        let result = run(exec, request, options, |stage| stages.lock().unwrap().push(stage)).await;
        (result, stages.into_inner().unwrap())
    }

    #[tokio::test]
    async fn test_fresh_install_stage_order() {
        let fixture = Fixture::new(r#"{"engines": {"node": "20.x"}}"#);
        let exec = FakeExecutable::new().reply("config get", 0, "undefined\n");

        let (result, stages) =
            run_collecting(&exec, &fixture.request(None), &InstallOptions::default()).await;
        let outcome = result.unwrap();

        assert_eq!(
            stages,
            vec![
                PipelineStage::Classifying,
                PipelineStage::ReadingManifest {
                    variant: PackageManagerVariant::Classic
                },
                PipelineStage::Fingerprinting,
                PipelineStage::Staging,
                PipelineStage::Installing {
                    variant: PackageManagerVariant::Classic,
                    offline: false
                },
                PipelineStage::CachingModules,
                PipelineStage::Completed,
            ]
        );
        assert!(stages.last().unwrap().is_terminal());

        assert!(outcome.installed);
        assert_eq!(outcome.variant, PackageManagerVariant::Classic);
        assert_eq!(outcome.descriptor.node.unwrap().version, "20.x");
        assert_eq!(outcome.fingerprint.as_ref().map(String::len), Some(64));
        assert_eq!(outcome.staged_layer.as_deref(), Some(fixture.next.path()));
        assert!(fixture.next.path().join(NODE_MODULES).is_dir());
        assert!(exec.called_with("install --ignore-engines --frozen-lockfile --production false"));
    }

    #[tokio::test]
    async fn test_matching_fingerprint_reuses_cache() {
        let fixture = Fixture::new("{}");
        let exec = FakeExecutable::new();

        let (first, _) = run_collecting(&exec, &fixture.request(None), &InstallOptions::default()).await;
        let fingerprint = first.unwrap().fingerprint.unwrap();

        let exec = FakeExecutable::new();
        let (second, stages) = run_collecting(
            &exec,
            &fixture.request(Some(&fingerprint)),
            &InstallOptions::default(),
        )
        .await;
        let outcome = second.unwrap();

        assert_eq!(stages.last(), Some(&PipelineStage::ReusingCache));
        assert!(!stages.contains(&PipelineStage::Staging));
        assert!(!outcome.installed);
        assert_eq!(outcome.fingerprint.as_deref(), Some(fingerprint.as_str()));
        assert!(outcome.staged_layer.is_none());
        assert!(!exec.called_with("install"));
    }

    #[tokio::test]
    async fn test_modern_project_launch_phase() {
        let fixture = Fixture::new(r#"{"packageManager": "yarn@4.1.0"}"#);
        std::fs::create_dir_all(fixture.work.path().join(".yarn/cache")).unwrap();
        let exec = FakeExecutable::new();
        let options = InstallOptions {
            launch: true,
            ..Default::default()
        };

        let (result, stages) = run_collecting(&exec, &fixture.request(None), &options).await;
        let outcome = result.unwrap();

        assert_eq!(outcome.variant, PackageManagerVariant::Modern);
        assert!(stages.contains(&PipelineStage::Installing {
            variant: PackageManagerVariant::Modern,
            offline: true
        }));
        assert!(exec.called_with("install --immutable --offline"));
        assert!(!exec.called_with("config"));
    }

    #[tokio::test]
    async fn test_pin_policy_is_applied() {
        let fixture = Fixture::new(r#"{"packageManager": "yarn@1.22.19"}"#);
        let options = InstallOptions {
            pin_policy: LegacyPinPolicy::TrustVersion,
            ..Default::default()
        };

        let (result, _) = run_collecting(&FakeExecutable::new(), &fixture.request(None), &options).await;

        assert_eq!(result.unwrap().variant, PackageManagerVariant::Classic);
    }

    #[tokio::test]
    async fn test_project_sub_directory() {
        let work = TempDir::new().unwrap();
        let next = TempDir::new().unwrap();
        let app = work.path().join("frontend");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(app.join(YARN_LOCK), "").unwrap();
        std::fs::write(app.join("package.json"), "{}").unwrap();

        let request = BuildRequest {
            working_dir: work.path().to_path_buf(),
            current_layer: None,
            next_layer: next.path().to_path_buf(),
            prior_fingerprint: None,
            env: BuildEnvironment::from_pairs([(BP_NODE_PROJECT_PATH, "frontend")]),
        };
        let exec = FakeExecutable::new();

        let (result, _) = run_collecting(&exec, &request, &InstallOptions::default()).await;

        assert!(result.unwrap().installed);
        assert!(app.join(NODE_MODULES).is_dir());
        assert!(exec.calls().iter().all(|c| c.dir == app));
    }

    #[tokio::test]
    async fn test_install_failure_stops_before_caching() {
        let fixture = Fixture::new("{}");
        let exec = FakeExecutable::new().reply("install", 1, "error An unexpected error occurred\n");

        let (result, stages) =
            run_collecting(&exec, &fixture.request(None), &InstallOptions::default()).await;

        assert!(result.is_err());
        assert!(matches!(stages.last(), Some(PipelineStage::Installing { .. })));
        assert!(!stages.contains(&PipelineStage::CachingModules));
    }

    #[tokio::test]
    async fn test_missing_manifest_fails_at_fingerprint() {
        let work = TempDir::new().unwrap();
        std::fs::write(work.path().join(YARN_LOCK), "").unwrap();
        let request = BuildRequest {
            working_dir: work.path().to_path_buf(),
            current_layer: None,
            next_layer: work.path().join("layer"),
            prior_fingerprint: None,
            env: BuildEnvironment::default(),
        };

        let (result, stages) =
            run_collecting(&FakeExecutable::new(), &request, &InstallOptions::default()).await;

        assert!(result.is_err());
        assert_eq!(stages.last(), Some(&PipelineStage::Fingerprinting));
    }
}
