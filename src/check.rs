//! End-to-end reproducibility check.
//!
//! setup -> pipeline -> build A -> build B -> diff. Any failure before the
//! diff collapses into [`CheckOutcome::Failed`]; the diff tool's exit code is
//! reported as-is.
use crate::context::{BuildContext, CommandToken};
use crate::differ::Differ;
use crate::error::CheckError;
use crate::executor;
use crate::pipeline::Pipeline;
use crate::registry::VariationRegistry;
use crate::tree::copy_tree;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// Exit status for configuration, setup, pipeline and build failures.
pub const FAILURE_EXIT_CODE: i32 = 2;

/// Everything one check run needs, already merged from CLI and config.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// Shell fragment run in each tree root.
    pub build_command: String,
    /// Artifact path relative to the tree root.
    pub artifact: PathBuf,
    pub source_root: PathBuf,
    /// Variation names in application order.
    pub variations: Vec<String>,
    /// Starting environment for both builds.
    pub env: BTreeMap<OsString, OsString>,
}

/// Reject artifact paths that would not resolve inside each build's tree.
///
/// One leading `..` is allowed: it lands in the run's own working directory,
/// next to the trees, where tools like `debuild` drop their output.
pub fn validate_artifact(artifact: &Path) -> Result<(), CheckError> {
    let mut depth: i32 = 0;
    for component in artifact.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                return Err(CheckError::Config(format!(
                    "artifact {} must be relative to the source root",
                    artifact.display()
                )));
            }
            Component::ParentDir => depth -= 1,
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
        }
        if depth < -1 {
            return Err(CheckError::Config(format!(
                "artifact {} escapes the build directory",
                artifact.display()
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Identical,
    /// The diff tool exited non-zero with this code.
    Different(i32),
    Failed,
}

impl CheckOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            CheckOutcome::Identical => 0,
            CheckOutcome::Different(code) => code,
            CheckOutcome::Failed => FAILURE_EXIT_CODE,
        }
    }
}

pub struct Checker<'a> {
    registry: &'a VariationRegistry,
    differ: &'a dyn Differ,
}

impl<'a> Checker<'a> {
    pub fn new(registry: &'a VariationRegistry, differ: &'a dyn Differ) -> Self {
        Self { registry, differ }
    }

    pub fn check(&self, request: &CheckRequest) -> CheckOutcome {
        match self.try_check(request) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(error = %err, "check failed");
                CheckOutcome::Failed
            }
        }
    }

    fn try_check(&self, request: &CheckRequest) -> Result<CheckOutcome, CheckError> {
        validate_artifact(&request.artifact)?;
        let pipeline = Pipeline::new(self.registry, &request.variations)?;
        tracing::info!(variations = ?pipeline.selected(), "selected variations");

        let workdir = tempfile::Builder::new()
            .prefix("reprotest-")
            .tempdir()
            .map_err(|err| CheckError::Setup(format!("create temporary directory: {err}")))?;
        let artifacts = self.build_both(&pipeline, request, workdir.path())?;

        let code = self
            .differ
            .compare(&artifacts.first, &artifacts.second)?;
        if let Err(err) = workdir.close() {
            tracing::warn!(error = %err, "remove temporary directory");
        }
        Ok(match code {
            0 => CheckOutcome::Identical,
            code => CheckOutcome::Different(code),
        })
    }

    fn build_both(
        &self,
        pipeline: &Pipeline<'_>,
        request: &CheckRequest,
        workdir: &Path,
    ) -> Result<CapturedArtifacts, CheckError> {
        let tree_a = workdir.join("tree1");
        let tree_b = workdir.join("tree2");
        for tree in [&tree_a, &tree_b] {
            copy_tree(&request.source_root, tree)
                .map_err(|err| CheckError::Setup(format!("{err:#}")))?;
        }
        tracing::info!(workdir = %workdir.display(), "copied source trees");

        let captured = CapturedArtifacts {
            first: workdir.join("artifact1"),
            second: workdir.join("artifact2"),
        };
        let initial = BuildContext::new(
            vec![CommandToken::raw(request.build_command.clone())],
            request.env.clone(),
            tree_a,
            tree_b,
        );
        pipeline.run(initial, |context| {
            executor::build(&context.a, &request.artifact, &captured.first)?;
            executor::build(&context.b, &request.artifact, &captured.second)?;
            Ok(())
        })?;
        Ok(captured)
    }
}

struct CapturedArtifacts {
    first: PathBuf,
    second: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tool::fake::RecordingRunner;
    use std::cell::RefCell;
    use std::fs;
    use std::sync::Arc;

    /// Byte-compares in-process and remembers every call.
    #[derive(Default)]
    struct FakeDiffer {
        calls: RefCell<Vec<(Vec<u8>, Vec<u8>)>>,
    }

    impl Differ for FakeDiffer {
        fn compare(&self, first: &Path, second: &Path) -> Result<i32, ToolError> {
            let first = fs::read(first).unwrap();
            let second = fs::read(second).unwrap();
            let code = if first == second { 0 } else { 1 };
            self.calls.borrow_mut().push((first, second));
            Ok(code)
        }
    }

    fn shell_available() -> bool {
        which::which(executor::SHELL).is_ok()
    }

    fn registry() -> VariationRegistry {
        VariationRegistry::standard(Arc::new(RecordingRunner::default()))
    }

    fn request(source: &Path, command: &str, variations: &[&str]) -> CheckRequest {
        let mut env = BTreeMap::new();
        if let Some(path) = std::env::var_os("PATH") {
            env.insert("PATH".into(), path);
        }
        CheckRequest {
            build_command: command.to_string(),
            artifact: PathBuf::from("artifact"),
            source_root: source.to_path_buf(),
            variations: variations.iter().map(|name| name.to_string()).collect(),
            env,
        }
    }

    fn source_tree() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("input.txt"), "hello").unwrap();
        temp
    }

    #[test]
    fn identical_builds_without_variations_exit_zero() {
        if !shell_available() {
            return;
        }
        let source = source_tree();
        let registry = registry();
        let differ = FakeDiffer::default();
        let outcome = Checker::new(&registry, &differ)
            .check(&request(source.path(), "cp input.txt artifact", &[]));
        assert_eq!(outcome, CheckOutcome::Identical);
        assert_eq!(outcome.exit_code(), 0);
        let calls = differ.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, b"hello");
    }

    #[test]
    fn captured_environment_difference_is_reported_by_the_differ() {
        if !shell_available() {
            return;
        }
        let source = source_tree();
        let registry = registry();
        let differ = FakeDiffer::default();
        let outcome = Checker::new(&registry, &differ).check(&request(
            source.path(),
            "printf '%s' \"$CAPTURE_ENVIRONMENT\" > artifact",
            &["captures_environment"],
        ));
        assert_eq!(outcome, CheckOutcome::Different(1));
        let calls = differ.calls.borrow();
        assert_eq!(calls[0].0, b"");
        assert_eq!(calls[0].1, b"i_capture_the_environment");
    }

    #[test]
    fn failure_on_side_b_skips_the_differ() {
        if !shell_available() {
            return;
        }
        let source = source_tree();
        let registry = registry();
        let differ = FakeDiffer::default();
        let outcome = Checker::new(&registry, &differ).check(&request(
            source.path(),
            "test -z \"$CAPTURE_ENVIRONMENT\" && cp input.txt artifact",
            &["captures_environment"],
        ));
        assert_eq!(outcome, CheckOutcome::Failed);
        assert_eq!(outcome.exit_code(), FAILURE_EXIT_CODE);
        assert!(differ.calls.borrow().is_empty());
    }

    #[test]
    fn missing_artifact_is_a_build_failure() {
        if !shell_available() {
            return;
        }
        let source = source_tree();
        let registry = registry();
        let differ = FakeDiffer::default();
        let outcome =
            Checker::new(&registry, &differ).check(&request(source.path(), "true", &[]));
        assert_eq!(outcome, CheckOutcome::Failed);
        assert!(differ.calls.borrow().is_empty());
    }

    #[test]
    fn unknown_variation_fails_before_any_work() {
        let source = source_tree();
        let runner = Arc::new(RecordingRunner::default());
        let registry = VariationRegistry::standard(runner.clone());
        let differ = FakeDiffer::default();
        let outcome = Checker::new(&registry, &differ).check(&request(
            source.path(),
            "touch ran && cp input.txt artifact",
            &["fileordering", "cpu"],
        ));
        assert_eq!(outcome, CheckOutcome::Failed);
        assert!(runner.calls().is_empty());
        assert!(!source.path().join("ran").exists());
        assert!(differ.calls.borrow().is_empty());
    }

    #[test]
    fn absolute_artifact_is_rejected_before_building() {
        let source = source_tree();
        let outside = tempfile::tempdir().unwrap();
        let shared = outside.path().join("artifact");
        let registry = registry();
        let differ = FakeDiffer::default();
        let mut request = request(
            source.path(),
            &format!(
                "printf '%s' \"$CAPTURE_ENVIRONMENT\" > artifact && touch '{}'",
                shared.display()
            ),
            &["captures_environment"],
        );
        request.artifact = shared.clone();
        let outcome = Checker::new(&registry, &differ).check(&request);
        assert_eq!(outcome, CheckOutcome::Failed);
        assert!(!shared.exists());
        assert!(differ.calls.borrow().is_empty());
    }

    #[test]
    fn artifact_paths_must_stay_inside_the_run() {
        assert!(validate_artifact(Path::new("dist/app.tar.gz")).is_ok());
        assert!(validate_artifact(Path::new("./out/../app.bin")).is_ok());
        assert!(validate_artifact(Path::new("../pkg_1.0_all.deb")).is_ok());
        assert!(matches!(
            validate_artifact(Path::new("/tmp/app.bin")),
            Err(CheckError::Config(_))
        ));
        assert!(matches!(
            validate_artifact(Path::new("out/../../../etc/passwd")),
            Err(CheckError::Config(_))
        ));
    }

    #[test]
    fn builds_run_in_copies_not_the_source_tree() {
        if !shell_available() {
            return;
        }
        let source = source_tree();
        let registry = registry();
        let differ = FakeDiffer::default();
        let outcome = Checker::new(&registry, &differ).check(&request(
            source.path(),
            "cp input.txt artifact",
            &["home", "timezone"],
        ));
        assert_eq!(outcome, CheckOutcome::Identical);
        assert!(!source.path().join("artifact").exists());
    }

    #[test]
    fn differ_exit_code_is_forwarded_verbatim() {
        assert_eq!(CheckOutcome::Different(1).exit_code(), 1);
        assert_eq!(CheckOutcome::Different(137).exit_code(), 137);
    }
}
