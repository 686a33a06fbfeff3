//! Integration tests for the install pipeline.
//!
//! The scripted tests put a fake `yarn` shell script on `PATH`, so they run
//! the real process machinery without a Node.js toolchain.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use yarn_install::{
    pipeline, BuildEnvironment, BuildRequest, Executable, Execution, ExecutionOutput, InstallError, InstallOptions,
    PackageManagerVariant, PipelineStage, NODE_ENV, PATH,
};

/// Records every call and succeeds, creating `node_modules/` on install.
#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

#[async_trait]
impl Executable for Recorder {
    fn program(&self) -> &str {
        "yarn"
    }

    async fn execute(&self, execution: Execution) -> io::Result<ExecutionOutput> {
        if execution.args.first().map(String::as_str) == Some("install") {
            fs::create_dir_all(execution.dir.join("node_modules").join("left-pad"))?;
        }
        self.calls.lock().unwrap().push(execution.args);
        Ok(ExecutionOutput {
            exit_code: Some(0),
            output: String::new(),
        })
    }
}

impl Recorder {
    fn installs(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|args| args[0] == "install").count()
    }
}

fn project(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("yarn.lock"), "# yarn lockfile v1\n").unwrap();
    fs::write(dir.path().join("package.json"), manifest).unwrap();
    dir
}

fn request(work: &Path, current: Option<&Path>, next: &Path, prior: Option<String>, env: BuildEnvironment) -> BuildRequest {
    BuildRequest {
        working_dir: work.to_path_buf(),
        current_layer: current.map(Path::to_path_buf),
        next_layer: next.to_path_buf(),
        prior_fingerprint: prior,
        env,
    }
}

#[tokio::test]
async fn test_second_build_reuses_and_changed_lockfile_reinstalls() {
    let work = project(r#"{"dependencies": {"left-pad": "1.3.0"}}"#);
    let first_layer = TempDir::new().unwrap();
    let exec = Recorder::default();
    let env = BuildEnvironment::from_pairs([(NODE_ENV, "production")]);

    let first = pipeline::run(
        &exec,
        &request(work.path(), None, first_layer.path(), None, env.clone()),
        &InstallOptions::default(),
        |_| {},
    )
    .await
    .unwrap();
    assert!(first.installed);
    assert!(first_layer.path().join("node_modules/left-pad").is_dir());

    let second_layer = TempDir::new().unwrap();
    let second = pipeline::run(
        &exec,
        &request(
            work.path(),
            Some(first_layer.path()),
            second_layer.path(),
            first.fingerprint.clone(),
            env.clone(),
        ),
        &InstallOptions::default(),
        |_| {},
    )
    .await
    .unwrap();
    assert!(!second.installed);
    assert_eq!(second.fingerprint, first.fingerprint);
    assert_eq!(exec.installs(), 1);

    fs::write(work.path().join("yarn.lock"), "# yarn lockfile v1\n\nleft-pad@1.3.0:\n").unwrap();
    let third = pipeline::run(
        &exec,
        &request(
            work.path(),
            Some(first_layer.path()),
            second_layer.path(),
            first.fingerprint.clone(),
            env,
        ),
        &InstallOptions::default(),
        |_| {},
    )
    .await
    .unwrap();
    assert!(third.installed);
    assert_eq!(exec.installs(), 2);
    assert_ne!(third.fingerprint, first.fingerprint);
    assert!(second_layer.path().join("node_modules/left-pad").is_dir());
}

#[tokio::test]
async fn test_node_env_change_invalidates_fingerprint() {
    let work = project("{}");
    let layer = TempDir::new().unwrap();
    let exec = Recorder::default();

    let production = pipeline::run(
        &exec,
        &request(
            work.path(),
            None,
            layer.path(),
            None,
            BuildEnvironment::from_pairs([(NODE_ENV, "production")]),
        ),
        &InstallOptions::default(),
        |_| {},
    )
    .await
    .unwrap();

    let development = pipeline::run(
        &exec,
        &request(
            work.path(),
            None,
            layer.path(),
            production.fingerprint.clone(),
            BuildEnvironment::from_pairs([(NODE_ENV, "development")]),
        ),
        &InstallOptions::default(),
        |_| {},
    )
    .await
    .unwrap();

    assert!(development.installed);
    assert_ne!(development.fingerprint, production.fingerprint);
}

#[tokio::test]
async fn test_no_lockfile_always_installs() {
    let work = TempDir::new().unwrap();
    fs::write(work.path().join("package.json"), "{}").unwrap();
    let layer = TempDir::new().unwrap();
    let stages = Mutex::new(Vec::new());

    let outcome = pipeline::run(
        &Recorder::default(),
        &request(work.path(), None, layer.path(), Some("abc".to_string()), BuildEnvironment::default()),
        &InstallOptions::default(),
        |stage| stages.lock().unwrap().push(stage),
    )
    .await
    .unwrap();

    assert!(outcome.installed);
    assert!(outcome.fingerprint.is_none());
    assert_eq!(stages.into_inner().unwrap().last(), Some(&PipelineStage::Completed));
}

#[cfg(unix)]
mod scripted {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use yarn_install::YarnExecutable;

    /// A `yarn` stand-in that logs its arguments and `NODE_ENV`.
    const FAKE_YARN: &str = r#"#!/bin/sh
echo "$* NODE_ENV=$NODE_ENV" >> "$FAKE_YARN_LOG"
case "$1" in
  config)
    if [ "$2" = "get" ]; then echo "undefined"; else echo "registry: https://registry.yarnpkg.com"; fi
    ;;
  install)
    if [ -n "$FAKE_YARN_FAIL" ]; then echo "error Couldn't find package" >&2; exit 1; fi
    mkdir -p node_modules/.bin node_modules/react
    echo "success Saved lockfile."
    ;;
esac
"#;

    struct Toolchain {
        _bin: TempDir,
        log: PathBuf,
        env: BuildEnvironment,
    }

    fn toolchain() -> Toolchain {
        let bin = TempDir::new().unwrap();
        let script = bin.path().join("yarn");
        fs::write(&script, FAKE_YARN).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let log = bin.path().join("calls.log");
        let path = format!("{}:/usr/bin:/bin", bin.path().display());
        let env = BuildEnvironment::from_pairs([
            (PATH, path.as_str()),
            (NODE_ENV, "production"),
            ("FAKE_YARN_LOG", log.to_str().unwrap()),
        ]);
        Toolchain { _bin: bin, log, env }
    }

    #[tokio::test]
    async fn test_classic_build_runs_real_process() {
        let tools = toolchain();
        let work = project("{}");
        let layer = TempDir::new().unwrap();

        let outcome = pipeline::run(
            &YarnExecutable::new(),
            &request(work.path(), None, layer.path(), None, tools.env.clone()),
            &InstallOptions::default(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(outcome.variant, PackageManagerVariant::Classic);
        assert!(outcome.installed);
        assert!(layer.path().join("node_modules/react").is_dir());

        let log = fs::read_to_string(&tools.log).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            lines,
            vec![
                "config list --silent NODE_ENV=production",
                "config get yarn-offline-mirror NODE_ENV=production",
                "install --ignore-engines --frozen-lockfile --production false NODE_ENV=production",
            ]
        );
    }

    #[tokio::test]
    async fn test_modern_build_sets_development_mode() {
        let tools = toolchain();
        let work = project(r#"{"packageManager": "yarn@4.0.2"}"#);
        fs::write(work.path().join(".yarnrc.yml"), "nodeLinker: node-modules\n").unwrap();
        let layer = TempDir::new().unwrap();

        let outcome = pipeline::run(
            &YarnExecutable::new(),
            &request(work.path(), None, layer.path(), None, tools.env.clone()),
            &InstallOptions::default(),
            |_| {},
        )
        .await
        .unwrap();

        assert_eq!(outcome.variant, PackageManagerVariant::Modern);
        let log = fs::read_to_string(&tools.log).unwrap();
        assert_eq!(log, "install --immutable NODE_ENV=development\n");
    }

    #[tokio::test]
    async fn test_failed_install_reports_output() {
        let mut tools = toolchain();
        tools.env.set("FAKE_YARN_FAIL", "1");
        let work = project("{}");
        let layer = TempDir::new().unwrap();

        let err = pipeline::run(
            &YarnExecutable::new(),
            &request(work.path(), None, layer.path(), None, tools.env.clone()),
            &InstallOptions {
                launch: true,
                ..Default::default()
            },
            |_| {},
        )
        .await
        .unwrap_err();

        match err {
            InstallError::Subprocess {
                command,
                exit_code,
                output,
                ..
            } => {
                assert_eq!(command, "yarn install --ignore-engines --frozen-lockfile");
                assert_eq!(exit_code, Some(1));
                assert!(output.contains("Couldn't find package"));
            }
            other => panic!("Unexpected error type: {:?}", other),
        }
        assert!(!layer.path().join("node_modules").exists());
    }
}
