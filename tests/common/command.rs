use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with `1.txt` and `2.txt` committed on `master`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_strata_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    write_file(FileSpec::new(
        repository_dir.path().join("1.txt"),
        "one\n".to_string(),
    ));
    write_file(FileSpec::new(
        repository_dir.path().join("2.txt"),
        "two\n".to_string(),
    ));

    strata_add(repository_dir.path(), &["1.txt", "2.txt"]);
    strata_commit(repository_dir.path(), "Initial files")
        .assert()
        .success();

    repository_dir
}

pub fn run_strata_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("strata").expect("Failed to find strata binary");
    cmd.envs(vec![("NO_PAGER", "1")]);
    cmd.env_remove("STRATA_WORK_TREE");
    cmd.env_remove("STRATA_LOG");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn strata_commit(dir: &Path, message: &str) -> Command {
    run_strata_command(dir, &["commit", message])
}

pub fn strata_add(dir: &Path, files: &[&str]) {
    for file in files {
        run_strata_command(dir, &["add", file]).assert().success();
    }
}

/// Write, stage and commit a single file
pub fn commit_file(dir: &Path, file_name: &str, content: &str, message: &str) {
    write_file(FileSpec::new(dir.join(file_name), content.to_string()));
    strata_add(dir, &[file_name]);
    strata_commit(dir, message).assert().success();
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout is not UTF-8")
}

pub fn branch_commit_id(dir: &Path, branch: &str) -> String {
    let ref_path = dir.join(".strata").join("refs").join("heads").join(branch);
    std::fs::read_to_string(ref_path)
        .expect("Failed to read branch ref")
        .trim()
        .to_string()
}

pub fn current_branch(dir: &Path) -> String {
    let head = std::fs::read_to_string(dir.join(".strata").join("HEAD"))
        .expect("Failed to read HEAD");
    head.trim()
        .strip_prefix("ref: refs/heads/")
        .expect("HEAD is not symbolic")
        .to_string()
}

pub fn head_commit_id(dir: &Path) -> String {
    branch_commit_id(dir, &current_branch(dir))
}

/// Commit ids printed by `log`, newest first
pub fn log_commit_ids(dir: &Path) -> Vec<String> {
    stdout_of(&mut run_strata_command(dir, &["log"]))
        .lines()
        .filter_map(|line| line.strip_prefix("commit "))
        .map(str::to_string)
        .collect()
}
