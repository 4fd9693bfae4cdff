use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn vecsync_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("vecsync");
    path
}

fn setup_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    fs::write(root.join("a.ts"), "export const a = 1;\n").unwrap();
    fs::write(root.join("b.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::write(root.join("node_modules/pkg/c.ts"), "export {};\n").unwrap();
    fs::create_dir_all(root.join("infra")).unwrap();
    fs::write(
        root.join("infra/main.tf"),
        "resource \"aws_s3_bucket\" \"b\" {}\n",
    )
    .unwrap();
    fs::write(root.join("notes.txt"), "plain notes\n").unwrap();

    tmp
}

fn run_vecsync(config_path: Option<&Path>, args: &[&str]) -> (String, String, bool) {
    let binary = vecsync_binary();
    let mut cmd = Command::new(&binary);
    if let Some(config_path) = config_path {
        cmd.arg("--config").arg(config_path);
    }
    let output = cmd
        .args(["--progress", "off"])
        .args(args)
        .env_remove("OPENAI_API_KEY")
        .env_remove("PINECONE_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run vecsync binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("vecsync.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help() {
    let (stdout, _, success) = run_vecsync(None, &["--help"]);
    assert!(success);
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("provision"));
    assert!(stdout.contains("sync"));
}

#[test]
fn test_scan_lists_allowed_files_only() {
    let tree = setup_tree();
    let root = tree.path().to_str().unwrap();

    let (stdout, stderr, success) = run_vecsync(None, &["scan", root]);
    assert!(success, "scan failed: {}", stderr);
    assert!(stdout.contains("a.ts"));
    assert!(stdout.contains("main.tf"));
    assert!(!stdout.contains("b.png"));
    assert!(!stdout.contains("c.ts"));
    assert!(!stdout.contains("notes.txt"));
    assert!(stdout.contains("files: 2"));
}

#[test]
fn test_scan_missing_root_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent");

    let (_, stderr, success) = run_vecsync(None, &["scan", missing.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("absent"));
}

#[test]
fn test_sync_dry_run_needs_no_credentials() {
    let tree = setup_tree();
    let root = tree.path().to_str().unwrap();

    let (stdout, stderr, success) = run_vecsync(None, &["sync", root, "--dry-run"]);
    assert!(success, "dry-run sync failed: {}", stderr);
    assert!(stdout.contains("sync codebase (dry-run)"));
    assert!(stdout.contains("files: 2"));
    assert!(stdout.contains("successful: 2"));
    assert!(stdout.contains("failed: 0"));
}

#[test]
fn test_sync_dry_run_respects_limit_and_index() {
    let tree = setup_tree();
    let root = tree.path().to_str().unwrap();

    let (stdout, _, success) = run_vecsync(
        None,
        &["sync", root, "--dry-run", "--limit", "1", "--index", "docs"],
    );
    assert!(success);
    assert!(stdout.contains("sync docs (dry-run)"));
    assert!(stdout.contains("files: 1"));
}

#[test]
fn test_sync_rejects_zero_concurrency() {
    let tree = setup_tree();
    let root = tree.path().to_str().unwrap();

    let (_, _, success) = run_vecsync(None, &["sync", root, "--dry-run", "--concurrency", "0"]);
    assert!(!success);
}

#[test]
fn test_config_overrides_selector() {
    let tree = setup_tree();
    let config_dir = TempDir::new().unwrap();
    let config = write_config(
        config_dir.path(),
        r#"[selector]
extensions = ["txt"]
file_names = []
"#,
    );

    let (stdout, stderr, success) =
        run_vecsync(Some(&config), &["scan", tree.path().to_str().unwrap()]);
    assert!(success, "scan failed: {}", stderr);
    assert!(stdout.contains("notes.txt"));
    assert!(!stdout.contains("a.ts"));
    assert!(stdout.contains("files: 1"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tree = setup_tree();
    let config_dir = TempDir::new().unwrap();
    let config = write_config(
        config_dir.path(),
        r#"[embedding]
dims = 0
"#,
    );

    let (_, stderr, success) =
        run_vecsync(Some(&config), &["scan", tree.path().to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("embedding.dims"));
}

#[test]
fn test_provision_without_credentials_fails() {
    let (_, stderr, success) = run_vecsync(None, &["provision"]);
    assert!(!success);
    assert!(stderr.contains("PINECONE_API_KEY"));
}

#[test]
fn test_sync_against_disabled_store_aborts() {
    let tree = setup_tree();
    let config_dir = TempDir::new().unwrap();
    let config = write_config(
        config_dir.path(),
        r#"[embedding]
provider = "disabled"

[index]
provider = "disabled"
"#,
    );

    let (stdout, _, success) =
        run_vecsync(Some(&config), &["sync", tree.path().to_str().unwrap()]);
    assert!(!success);
    assert!(!stdout.contains("successful:"));
}
