//! End-to-end scenarios against the real binary.

// Integration tests can use unwrap/expect for cleaner assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn obuild(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("obuild").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn write_cfg(dir: &TempDir, content: &str) {
    fs::write(dir.path().join("obuild.cfg"), content).unwrap();
}

/// Bump a file's mtime well past its current value.
fn touch_newer(path: &Path) {
    let mtime = filetime::FileTime::from_last_modification_time(&fs::metadata(path).unwrap());
    let newer = filetime::FileTime::from_unix_time(mtime.unix_seconds() + 10, 0);
    filetime::set_file_mtime(path, newer).unwrap();
}

const COMPILE_CFG: &str = r#"
rule app main.o [ shell "cat main.o > app && echo linked app" ]
rule %.o %.c [ shell "cat $source > $target && echo compiled $target" ]
"#;

#[test]
fn minimal_compile_builds_through_the_pattern_rule() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, COMPILE_CFG);
    fs::write(dir.path().join("main.c"), "int main;\n").unwrap();

    let output = obuild(&dir).arg("app").output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("compiled main.o"));
    assert!(stdout.contains("linked app"));
    assert_eq!(
        fs::read_to_string(dir.path().join("app")).unwrap(),
        "int main;\n"
    );
}

#[test]
fn unchanged_second_run_executes_no_bodies() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, COMPILE_CFG);
    fs::write(dir.path().join("main.c"), "int main;\n").unwrap();

    obuild(&dir).arg("app").assert().success();

    let output = obuild(&dir).arg("app").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("compiled"), "stdout: {stdout}");
    assert!(!stdout.contains("linked"), "stdout: {stdout}");
}

#[test]
fn touched_source_rebuilds_its_dependents() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, COMPILE_CFG);
    fs::write(dir.path().join("main.c"), "int main;\n").unwrap();

    obuild(&dir).arg("app").assert().success();
    touch_newer(&dir.path().join("main.c"));

    let output = obuild(&dir).arg("app").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("compiled main.o"));
    assert!(stdout.contains("linked app"));
}

#[test]
fn failing_dep_commands_stop_the_parent_body() {
    let dir = TempDir::new().unwrap();
    write_cfg(
        &dir,
        r#"
rule all "a.o b.o" [ shell "echo linked all" ]
rule %.o "" [ shell false ]
"#,
    );

    let output = obuild(&dir).args(["-j", "2", "all"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("linked all"), "stdout: {stdout}");
    assert!(stderr.contains("obuild: command exited with status 1"), "stderr: {stderr}");
}

#[test]
fn actions_run_regardless_of_the_filesystem() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action clean [ shell \"rm -f *.o app\"; echo cleaned ]");
    fs::write(dir.path().join("stale.o"), "junk").unwrap();

    let output = obuild(&dir).arg("clean").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("cleaned"));
    // run again: actions never go "up to date"
    let output = obuild(&dir).arg("clean").output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("cleaned"));
}

#[test]
fn tying_pattern_bodies_are_a_redefinition() {
    let dir = TempDir::new().unwrap();
    // Both patterns match "a.o" with a one-character stem.
    write_cfg(
        &dir,
        r#"
rule %.o "" [ shell true ]
rule a.% "" [ shell true ]
"#,
    );

    let output = obuild(&dir).arg("a.o").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("redefinition of rule 'a.o'"),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn glob_expands_relative_to_the_build_dir() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("src");
    fs::create_dir(&src).unwrap();
    for name in ["a.c", "b.c", "README"] {
        fs::write(src.join(name), name).unwrap();
    }
    write_cfg(&dir, "action show [ echo (glob \"src/*.c\") ]");

    let output = obuild(&dir).arg("show").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut matches: Vec<&str> = stdout.split_whitespace().collect();
    matches.sort_unstable();
    assert_eq!(matches, vec!["./src/a.c", "./src/b.c"]);
}

#[test]
fn default_target_is_used_when_none_is_given() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action default [ echo built default ]");
    let output = obuild(&dir).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("built default"));
}

#[test]
fn eval_snippet_runs_before_the_build_file() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action greet [ echo hello $who ]");
    let output = obuild(&dir)
        .args(["-e", "set who world", "greet"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("hello world"));
}

#[test]
fn invoke_runs_a_nested_build_to_completion() {
    let dir = TempDir::new().unwrap();
    write_cfg(
        &dir,
        r#"
action second [ shell "echo second ran" ]
action first [ invoke second; echo first done ]
"#,
    );
    let output = obuild(&dir).arg("first").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let second = stdout.find("second ran").expect("nested target ran");
    let first = stdout.find("first done").expect("outer body finished");
    assert!(second < first, "nested build must drain first: {stdout}");
}

#[test]
fn extreplace_rewrites_extensions() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action conv [ echo (extreplace \"a.c b.c README\" c o) ]");
    let output = obuild(&dir).arg("conv").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("a.o b.o README"));
}

#[test]
fn getenv_respects_the_ignore_env_flag() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action env [ echo (getenv OBUILD_E2E fallback) ]");

    let output = obuild(&dir)
        .env("OBUILD_E2E", "from-env")
        .arg("env")
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("from-env"));

    let output = obuild(&dir)
        .env("OBUILD_E2E", "from-env")
        .args(["-E", "env"])
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("fallback"));
}

#[test]
fn seeded_job_count_is_visible_to_scripts() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action jobs [ echo jobs=$numjobs ]");
    let output = obuild(&dir).args(["-j", "3", "jobs"]).output().unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("jobs=3"));
}

#[test]
fn empty_build_file_reports_no_targets() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "// nothing here\n");
    let output = obuild(&dir).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("obuild: no targets"));
}

#[test]
fn unknown_target_reports_no_rule() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "action default [ echo ok ]");
    let output = obuild(&dir).arg("nope").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("no rule to run target 'nope'")
    );
}

#[test]
fn missing_dep_names_its_requester() {
    let dir = TempDir::new().unwrap();
    write_cfg(&dir, "rule app ghost.o [ shell true ]");
    let output = obuild(&dir).arg("app").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(
        String::from_utf8_lossy(&output.stderr)
            .contains("no rule to run target 'ghost.o' (needed by 'app')")
    );
}

#[test]
fn missing_build_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = obuild(&dir).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed reading 'obuild.cfg'"));
}

#[test]
fn alternate_build_file_via_flag() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("other.cfg"), "action hi [ echo from other ]").unwrap();
    let output = obuild(&dir).args(["-f", "other.cfg", "hi"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("from other"));
}

#[test]
fn chdir_flag_changes_the_working_directory() {
    let dir = TempDir::new().unwrap();
    let sub = dir.path().join("proj");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("obuild.cfg"), "action here [ echo in proj ]").unwrap();

    let mut cmd = Command::cargo_bin("obuild").unwrap();
    let output = cmd
        .current_dir(dir.path())
        .args(["-C", "proj", "here"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("in proj"));
}

#[test]
fn parallel_dep_commands_all_complete_before_the_parent() {
    let dir = TempDir::new().unwrap();
    write_cfg(
        &dir,
        r#"
rule all "a.stamp b.stamp" [ shell "cat a.stamp b.stamp > all" ]
rule %.stamp "" [ shell "sleep 0.1 && echo $target > $target" ]
"#,
    );
    obuild(&dir).args(["-j", "2", "all"]).assert().success();
    let all = fs::read_to_string(dir.path().join("all")).unwrap();
    assert_eq!(all, "a.stamp\nb.stamp\n");
}
