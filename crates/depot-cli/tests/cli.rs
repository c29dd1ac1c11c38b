//! End-to-end tests for the depot CLI binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test context with an isolated depot home
struct TestContext {
    temp_dir: TempDir,
    depot_home: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let depot_home = temp_dir.path().join(".depot");
        Self {
            temp_dir,
            depot_home,
        }
    }

    fn depot_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_depot");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("DEPOT_HOME", &self.depot_home);
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("DEPOT_ADMIN");
        cmd.env_remove("DEPOT_USER");
        cmd.current_dir(self.temp_dir.path());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.depot_cmd()
            .args(args)
            .output()
            .expect("failed to run depot")
    }

    fn admin(&self, args: &[&str]) -> Output {
        let mut full = vec!["--admin"];
        full.extend_from_slice(args);
        let output = self.run(&full);
        assert!(
            output.status.success(),
            "depot {:?} failed: {}",
            args,
            stderr(&output)
        );
        output
    }

    /// Write a file outside the managed store and return its absolute path
    fn artifact(&self, name: &str, contents: &[u8]) -> PathBuf {
        let dir = self.temp_dir.path().join("artifacts");
        std::fs::create_dir_all(&dir).expect("failed to create artifact dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("failed to write artifact");
        path
    }

    fn uploads(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.depot_home.join("uploads")) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are utf-8")
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_version_command() {
    let ctx = TestContext::new();
    let output = ctx.run(&["--version"]);
    assert!(output.status.success());
}

#[test]
fn test_list_creates_catalog_db() {
    let ctx = TestContext::new();
    let output = ctx.run(&["list"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("No applications"));
    assert!(
        ctx.depot_home.join("catalog.db").exists(),
        "catalog.db should be created after running list"
    );
}

#[test]
fn test_changes_require_admin() {
    let ctx = TestContext::new();
    let output = ctx.run(&["app", "add", "Foo"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("FORBIDDEN:"));

    let output = ctx.run(&["list"]);
    assert!(stdout(&output).contains("No applications"));
}

#[test]
fn test_unknown_application_is_not_found() {
    let ctx = TestContext::new();
    let output = ctx.run(&["show", "Nope"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("NOT_FOUND:"));
}

#[test]
fn test_resolve_walks_operating_systems() {
    let ctx = TestContext::new();
    let win = ctx.artifact("foo-setup.exe", b"windows build");
    let linux = ctx.artifact("foo.tar.gz", b"linux build");

    ctx.admin(&["app", "add", "Foo", "--developer", "Acme"]);
    ctx.admin(&[
        "release", "add", "Foo", "--version", "1.0", "--os", "Windows", "--arch", "x64",
        "--path", path_str(&win),
    ]);
    ctx.admin(&[
        "release", "add", "Foo", "--version", "1.0", "--os", "Linux", "--type", "portable",
        "--path", path_str(&linux),
    ]);

    let output = ctx.run(&["resolve", "Foo"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("--os"), "{text}");
    assert!(text.contains("Windows, Linux"), "{text}");

    let output = ctx.run(&["resolve", "Foo", "--os", "Linux"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Portable"), "{text}");
    assert!(text.contains("foo.tar.gz"), "{text}");

    let output = ctx.run(&["resolve", "Foo", "--os", "Windows", "--version", "2.0"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("No release matches"));
}

#[test]
fn test_duplicate_release_is_rejected() {
    let ctx = TestContext::new();
    let file = ctx.artifact("foo.msi", b"installer");
    ctx.admin(&["app", "add", "Foo"]);

    let args = [
        "release", "add", "Foo", "--version", "1.0", "--os", "Windows", "--path",
        path_str(&file),
    ];
    ctx.admin(&args);

    let mut again = vec!["--admin"];
    again.extend_from_slice(&args);
    let output = ctx.run(&again);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("DUPLICATE_RELEASE:"));
}

#[test]
fn test_missing_reference_is_invalid_artifact() {
    let ctx = TestContext::new();
    ctx.admin(&["app", "add", "Foo"]);
    let missing = ctx.temp_dir.path().join("nowhere.zip");

    let output = ctx.run(&[
        "--admin", "release", "add", "Foo", "--version", "1.0", "--path",
        path_str(&missing),
    ]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("INVALID_ARTIFACT:"));
}

#[test]
fn test_source_release_is_filed_under_source_code() {
    let ctx = TestContext::new();
    let file = ctx.artifact("foo-src.zip", b"source");
    ctx.admin(&["app", "add", "Foo"]);
    ctx.admin(&[
        "release", "add", "Foo", "--version", "1.0", "--type", "source", "--os", "Windows",
        "--path", path_str(&file),
    ]);

    let output = ctx.run(&["resolve", "Foo"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Source Code"));
}

#[test]
fn test_download_resolved_release() {
    let ctx = TestContext::new();
    let file = ctx.artifact("bar.exe", b"bar contents");
    ctx.admin(&["app", "add", "Bar"]);
    ctx.admin(&["release", "add", "Bar", "--version", "2", "--path", path_str(&file)]);

    let out = ctx.temp_dir.path().join("downloaded.exe");
    let output = ctx.run(&["download", "Bar", "--out", path_str(&out)]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(std::fs::read(&out).unwrap(), b"bar contents");

    let output = ctx.run(&["show", "Bar"]);
    assert!(stdout(&output).contains("1 downloads"));
}

#[test]
fn test_download_needs_more_input_writes_nothing() {
    let ctx = TestContext::new();
    let a = ctx.artifact("a.exe", b"a");
    let b = ctx.artifact("b.exe", b"b");
    ctx.admin(&["app", "add", "Foo"]);
    ctx.admin(&["release", "add", "Foo", "--version", "1.0", "--path", path_str(&a)]);
    ctx.admin(&["release", "add", "Foo", "--version", "1.1", "--path", path_str(&b)]);

    let out = ctx.temp_dir.path().join("out.exe");
    let output = ctx.run(&["download", "Foo", "--out", path_str(&out)]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--version"));
    assert!(!out.exists());
}

#[test]
fn test_uploaded_file_is_removed_with_its_release() {
    let ctx = TestContext::new();
    let file = ctx.artifact("tool.zip", b"portable tool");
    ctx.admin(&["app", "add", "Tool"]);
    ctx.admin(&[
        "release", "add", "Tool", "--version", "1.0", "--type", "portable", "--file",
        path_str(&file),
    ]);

    let uploads = ctx.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(std::fs::read(&uploads[0]).unwrap(), b"portable tool");

    ctx.admin(&["release", "rm", "1"]);
    assert!(ctx.uploads().is_empty());
    assert!(file.exists(), "the source file is never touched");
}

#[test]
fn test_download_of_upload_uses_original_name() {
    let ctx = TestContext::new();
    let file = ctx.artifact("tool.zip", b"portable tool");
    ctx.admin(&["app", "add", "Tool"]);
    ctx.admin(&[
        "release", "add", "Tool", "--version", "1.0", "--type", "portable", "--file",
        path_str(&file),
    ]);

    let output = ctx.run(&["download", "Tool"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let saved = ctx.temp_dir.path().join("tool.zip");
    assert_eq!(std::fs::read(&saved).unwrap(), b"portable tool");
}

#[test]
fn test_referenced_file_survives_application_delete() {
    let ctx = TestContext::new();
    let file = ctx.artifact("keep.exe", b"keep me");
    ctx.admin(&["app", "add", "Keep"]);
    ctx.admin(&["release", "add", "Keep", "--version", "1", "--path", path_str(&file)]);

    ctx.admin(&["app", "rm", "Keep"]);
    assert!(file.exists());
    let output = ctx.run(&["list"]);
    assert!(stdout(&output).contains("No applications"));
}

#[test]
fn test_reorder_and_edit() {
    let ctx = TestContext::new();
    let a = ctx.artifact("a.exe", b"a");
    let b = ctx.artifact("b.exe", b"b");
    ctx.admin(&["app", "add", "Foo"]);
    ctx.admin(&["release", "add", "Foo", "--version", "1.0", "--path", path_str(&a)]);
    ctx.admin(&["release", "add", "Foo", "--version", "1.1", "--path", path_str(&b)]);

    let output = ctx.run(&["--admin", "release", "reorder", "Foo", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("VALIDATION_ERROR:"));

    ctx.admin(&["release", "reorder", "Foo", "1", "2"]);
    ctx.admin(&["release", "edit", "2", "--notes", "hotfix", "--os", "Windows"]);

    let output = ctx.run(&["resolve", "Foo", "--version", "1.1"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("hotfix"), "{text}");
    assert!(text.contains("Windows"), "{text}");
}

#[test]
fn test_extras() {
    let ctx = TestContext::new();
    let manual = ctx.artifact("manual.pdf", b"read me");
    ctx.admin(&["app", "add", "Foo"]);
    ctx.admin(&[
        "extra", "add", "Foo", "--name", "Manual", "--file", path_str(&manual),
    ]);

    let output = ctx.run(&["extra", "list", "Foo"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Manual"));

    ctx.admin(&["extra", "rm", "1"]);
    let output = ctx.run(&["extra", "list", "Foo"]);
    assert!(stdout(&output).contains("No extras"));
    assert!(ctx.uploads().is_empty());
}
