use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use walkdir::WalkDir;

fn write_text(path: &Path, txt: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, txt).expect("write text");
}

fn seed_project(dir_root: &Path) {
    write_text(&dir_root.join("src/index.ts"), "export * from './classes';\n");
    write_text(
        &dir_root.join("src/classes/animal.ts"),
        "export class Animal { constructor(public name: string) {} }\n",
    );
    write_text(
        &dir_root.join("src/advanced/utility.ts"),
        "type P = Partial<{ a: number }>;\n",
    );
    fs::create_dir_all(dir_root.join("src/empty")).expect("mkdir");
    write_text(
        &dir_root.join("tsconfig.json"),
        "{\n  \"compilerOptions\": { \"target\": \"es2020\" }\n}\n",
    );
}

fn run_save(dir_root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_save"))
        .args(args)
        .current_dir(dir_root)
        .env_remove("RUST_LOG")
        .output()
        .expect("run save")
}

/// Relative path -> file bytes (`None` for directories).
fn snapshot_tree(path_root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(path_root)
        .min_depth(1)
        .into_iter()
        .map(|entry| {
            let entry = entry.expect("walk entry");
            let path_rel = entry
                .path()
                .strip_prefix(path_root)
                .expect("relative")
                .to_path_buf();
            let content = entry
                .file_type()
                .is_file()
                .then(|| fs::read(entry.path()).expect("read file"));
            (path_rel, content)
        })
        .collect()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn save_without_folder_fails_and_creates_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());
    fs::create_dir_all(tmp.path().join("examples")).expect("mkdir examples");

    for args in [&[][..], &[""][..]] {
        let output = run_save(tmp.path(), args);
        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr_of(&output);
        assert!(stderr.contains("Missing folder name"), "stderr: {stderr}");
        assert!(stderr.starts_with('['), "stderr: {stderr}");
        assert_eq!(
            fs::read_dir(tmp.path().join("examples"))
                .expect("read examples")
                .count(),
            0
        );
    }
}

#[test]
fn save_copies_tree_and_config_byte_identical() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());

    let output = run_save(tmp.path(), &["interfaces"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let stdout = stdout_of(&output);
    let line_first = stdout.lines().next().expect("info line");
    assert!(line_first.starts_with('['), "stdout: {stdout}");
    assert!(line_first.contains("interfaces"), "stdout: {stdout}");
    assert!(stdout.contains("Saved example `interfaces`"), "stdout: {stdout}");

    let path_dir_dst = tmp.path().join("examples/interfaces");
    assert_eq!(
        snapshot_tree(&path_dir_dst.join("src")),
        snapshot_tree(&tmp.path().join("src"))
    );
    assert_eq!(
        fs::read(path_dir_dst.join("tsconfig.json")).expect("read copy"),
        fs::read(tmp.path().join("tsconfig.json")).expect("read original")
    );
}

#[test]
fn save_twice_with_same_folder_fails_without_touching_first_copy() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());

    assert!(run_save(tmp.path(), &["classes"]).status.success());
    let path_dir_dst = tmp.path().join("examples/classes");
    let snapshot_before = snapshot_tree(&path_dir_dst);

    write_text(&tmp.path().join("src/index.ts"), "// edited\n");
    write_text(&tmp.path().join("src/new_file.ts"), "new\n");

    let output = run_save(tmp.path(), &["classes"]);
    assert_ne!(output.status.code(), Some(0));
    assert!(
        stderr_of(&output).contains("Destination already exists"),
        "stderr: {}",
        stderr_of(&output)
    );
    assert_eq!(snapshot_tree(&path_dir_dst), snapshot_before);
}

#[test]
fn save_with_missing_source_fails_without_success_line() {
    let tmp = TempDir::new().expect("tempdir");
    write_text(&tmp.path().join("tsconfig.json"), "{}\n");

    let output = run_save(tmp.path(), &["generics"]);
    assert_ne!(output.status.code(), Some(0));
    assert!(!stdout_of(&output).contains("Saved example"));
    assert!(
        stderr_of(&output).contains("Source directory not found"),
        "stderr: {}",
        stderr_of(&output)
    );
    assert!(!tmp.path().join("examples/generics").exists());
}

#[test]
fn save_dry_run_creates_nothing() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());

    let output = run_save(tmp.path(), &["plan", "--dry-run"]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(stdout_of(&output).contains("Dry run"));
    assert!(!tmp.path().join("examples").exists());
}

#[test]
fn save_honors_excludes_root_and_settings_file() {
    let tmp = TempDir::new().expect("tempdir");
    let dir_root = tmp.path().join("project");
    seed_project(&dir_root);
    write_text(&dir_root.join("src/node_modules/dep/index.js"), "dep\n");
    write_text(&dir_root.join("src/debug.log"), "log\n");
    write_text(
        &dir_root.join("snapkit.toml"),
        "examples = \"snapshots\"\nexclude = [\"node_modules\"]\n",
    );

    let output = run_save(
        tmp.path(),
        &["-C", "project", "decorators", "--exclude", "node_modules", "--exclude", "*.log"],
    );
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));

    let path_dir_dst = dir_root.join("snapshots/decorators");
    assert!(path_dir_dst.join("src/classes/animal.ts").is_file());
    assert!(path_dir_dst.join("tsconfig.json").is_file());
    assert!(!path_dir_dst.join("src/node_modules").exists());
    assert!(!path_dir_dst.join("src/debug.log").exists());
    assert!(!dir_root.join("examples").exists());
}

#[test]
fn save_rejects_invalid_settings_file() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());
    write_text(&tmp.path().join("snapkit.toml"), "unknown_key = 1\n");

    let output = run_save(tmp.path(), &["namespaces"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr_of(&output).contains("Invalid settings file"),
        "stderr: {}",
        stderr_of(&output)
    );
    assert!(!tmp.path().join("examples").exists());
}

#[test]
fn save_accepts_whitespace_folder_name_verbatim() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());

    let output = run_save(tmp.path(), &["  "]);
    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(tmp.path().join("examples/  /src/index.ts").is_file());
    assert!(tmp.path().join("examples/  /tsconfig.json").is_file());
}

#[test]
fn save_nested_folder_fails_without_creating_intermediate_dirs() {
    let tmp = TempDir::new().expect("tempdir");
    seed_project(tmp.path());

    let output = run_save(tmp.path(), &["a/b"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!tmp.path().join("examples/a").exists());

    let stderr = stderr_of(&output);
    assert!(stderr.contains("Failed to create"), "stderr: {stderr}");
    assert_eq!(stderr.matches("(os error").count(), 1, "stderr: {stderr}");
}
