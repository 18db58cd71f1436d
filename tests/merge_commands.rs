use crate::common::command::{
    branch_commit_id, commit_file, current_branch, head_commit_id, init_repository_dir,
    log_commit_ids, run_strata_command, stdout_of, strata_add, strata_commit,
};
use crate::common::file::{FileSpec, read_file, write_file};
use assert_fs::TempDir;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::path::Path;

mod common;

fn checkout(dir: &Path, branch: &str) {
    run_strata_command(dir, &["checkout", branch])
        .assert()
        .success();
}

/// `feature` branches off the initial files and `master` is checked out
#[fixture]
fn branched_repository_dir(init_repository_dir: TempDir) -> TempDir {
    run_strata_command(init_repository_dir.path(), &["branch", "feature"])
        .assert()
        .success();
    init_repository_dir
}

#[rstest]
fn merging_a_descendant_fast_forwards(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    checkout(dir, "feature");
    commit_file(dir, "3.txt", "three\n", "Add 3.txt");
    let feature = head_commit_id(dir);
    checkout(dir, "master");

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .success()
        .stdout("Current branch fast-forwarded.\n");

    assert_eq!(current_branch(dir), "master");
    assert_eq!(head_commit_id(dir), feature);
    assert_eq!(read_file(&dir.join("3.txt")), "three\n");
}

#[rstest]
fn merging_an_ancestor_changes_nothing(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "3.txt", "three\n", "Add 3.txt");
    let head = head_commit_id(dir);

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .success()
        .stdout("Given branch is an ancestor of the current branch.\n");

    assert_eq!(head_commit_id(dir), head);
}

#[rstest]
fn clean_merge_creates_a_merge_commit(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "master.txt", "master\n", "Master work");
    let master = head_commit_id(dir);
    checkout(dir, "feature");
    commit_file(dir, "1.txt", "feature one\n", "Feature edits 1.txt");
    run_strata_command(dir, &["rm", "2.txt"]).assert().success();
    strata_commit(dir, "Feature removes 2.txt").assert().success();
    let feature = head_commit_id(dir);
    checkout(dir, "master");

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .success()
        .stdout("");

    assert_eq!(read_file(&dir.join("1.txt")), "feature one\n");
    assert_eq!(read_file(&dir.join("master.txt")), "master\n");
    assert!(!dir.join("2.txt").exists());
    assert_eq!(branch_commit_id(dir, "feature"), feature);

    let log = stdout_of(&mut run_strata_command(dir, &["log"]));
    let merge_entry = log.split("\n\n").next().unwrap();
    assert!(merge_entry.contains(&format!("Merge: {} {}\n", &feature[..7], &master[..7])));
    assert!(merge_entry.ends_with("Merged feature into master."));
    assert_eq!(log_commit_ids(dir)[1], master);

    run_strata_command(dir, &["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "=== Staged Files ===\n\n=== Removed Files ===\n\n",
        ));
}

#[rstest]
fn diverged_edits_are_committed_with_conflict_markers(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "1.txt", "master one\n", "Master edits 1.txt");
    checkout(dir, "feature");
    commit_file(dir, "1.txt", "feature one\n", "Feature edits 1.txt");
    checkout(dir, "master");

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .success()
        .stdout("Encountered a merge conflict.\n");

    assert_eq!(
        read_file(&dir.join("1.txt")),
        "<<<<<<< HEAD\nmaster one\n=======\nfeature one\n>>>>>>>\n"
    );
    let log = stdout_of(&mut run_strata_command(dir, &["log"]));
    assert!(log.contains("Merged feature into master.\n"));
    assert!(log.lines().nth(2).unwrap().starts_with("Merge: "));
}

#[rstest]
fn deleted_against_modified_conflicts(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "2.txt", "master two\n", "Master edits 2.txt");
    checkout(dir, "feature");
    run_strata_command(dir, &["rm", "2.txt"]).assert().success();
    strata_commit(dir, "Feature removes 2.txt").assert().success();
    checkout(dir, "master");

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .success()
        .stdout("Encountered a merge conflict.\n");

    assert_eq!(
        read_file(&dir.join("2.txt")),
        "<<<<<<< HEAD\nmaster two\n=======\n>>>>>>>\n"
    );
}

#[rstest]
fn merging_the_current_branch_fails(init_repository_dir: TempDir) {
    run_strata_command(init_repository_dir.path(), &["merge", "master"])
        .assert()
        .failure()
        .stdout("Cannot merge a branch with itself.\n");
}

#[rstest]
fn merging_a_missing_branch_fails(init_repository_dir: TempDir) {
    run_strata_command(init_repository_dir.path(), &["merge", "nope"])
        .assert()
        .failure()
        .stdout("A branch with that name does not exist.\n");
}

#[rstest]
fn merge_with_staged_changes_fails(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    write_file(FileSpec::new(dir.join("1.txt"), "staged\n".to_string()));
    strata_add(dir, &["1.txt"]);

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .failure()
        .stdout("You have uncommitted changes.\n");
}

#[rstest]
fn untracked_file_blocks_merge(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    checkout(dir, "feature");
    commit_file(dir, "3.txt", "three\n", "Add 3.txt");
    checkout(dir, "master");
    let head = head_commit_id(dir);
    write_file(FileSpec::new(dir.join("3.txt"), "mine\n".to_string()));

    run_strata_command(dir, &["merge", "feature"])
        .assert()
        .failure()
        .stdout(predicate::str::starts_with(
            "There is an untracked file in the way",
        ));

    assert_eq!(head_commit_id(dir), head);
    assert_eq!(read_file(&dir.join("3.txt")), "mine\n");
}

#[rstest]
fn earlier_merge_parent_is_used_as_split_point(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "master.txt", "m1\n", "Master 1");
    checkout(dir, "feature");
    commit_file(dir, "feature.txt", "f1\n", "Feature 1");
    run_strata_command(dir, &["merge", "master"])
        .assert()
        .success()
        .stdout("");
    checkout(dir, "master");
    commit_file(dir, "master.txt", "m2\n", "Master 2");
    let master = head_commit_id(dir);
    checkout(dir, "feature");

    run_strata_command(dir, &["merge", "master"])
        .assert()
        .success()
        .stdout("");

    assert_eq!(read_file(&dir.join("master.txt")), "m2\n");
    assert_eq!(read_file(&dir.join("feature.txt")), "f1\n");
    assert_eq!(branch_commit_id(dir, "master"), master);
}

#[rstest]
fn re_merging_an_unchanged_branch_runs_a_three_way_merge(branched_repository_dir: TempDir) {
    let dir = branched_repository_dir.path();
    commit_file(dir, "master.txt", "m1\n", "Master 1");
    checkout(dir, "feature");
    commit_file(dir, "feature.txt", "f1\n", "Feature 1");
    run_strata_command(dir, &["merge", "master"])
        .assert()
        .success();
    let merged = head_commit_id(dir);

    // master has not moved since it was merged
    run_strata_command(dir, &["merge", "master"])
        .assert()
        .success()
        .stdout("");

    assert_eq!(head_commit_id(dir), merged);
    assert_eq!(read_file(&dir.join("master.txt")), "m1\n");
    assert_eq!(read_file(&dir.join("feature.txt")), "f1\n");
}
