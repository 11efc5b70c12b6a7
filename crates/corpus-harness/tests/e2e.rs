//! Runs bout en bout avec de vrais process.
//!
//! Le toolchain est simulé par trois scripts shell posés dans un dossier
//! temporaire, aux emplacements par défaut (`c3/c3c`, `bin/luac`, `build/yue`).

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use corpus_harness::{
    Config, CorpusEntry, Harness, HarnessError, ProcessRunner, Report, RunOutcome, ScratchStrategy,
};
use pretty_assertions::assert_eq;

const C3C: &str = r#"[ "$1" = build ] || exit 9
touch build.stamp
"#;

const LUAC: &str = r#"[ "$1" = "-o" ] || exit 9
case "$3" in
  */bad.lua) echo "syntax error in $3" >&2; exit 1 ;;
esac
cp "$3" "$2"
"#;

const YUE: &str = r#"test -f "$1"
if grep -q explode "$1"; then echo "yue: panic" >&2; exit 2; fi
cat "$1" >> processed.log
"#;

fn script(root: &Utf8Path, rel: &str, body: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(&p, format!("#!/bin/sh\nset -e\n{body}")).unwrap();
    fs::set_permissions(&p, fs::Permissions::from_mode(0o755)).unwrap();
}

fn workspace(fixtures: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    script(&root, "c3/c3c", C3C);
    script(&root, "bin/luac", LUAC);
    script(&root, "build/yue", YUE);
    for (name, body) in fixtures {
        let p = root.join("resources").join(name);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }
    (dir, root)
}

#[derive(Debug, PartialEq, Eq)]
enum Seen {
    Ok,
    Compile(Option<i32>),
    Process(Option<i32>),
    Other(String),
}

#[derive(Default)]
struct Recorder {
    outcomes: Vec<(String, Seen)>,
}

impl Report for Recorder {
    fn entry_finished(&mut self, entry: &CorpusEntry, outcome: &RunOutcome) {
        let seen = match outcome {
            RunOutcome::Success => Seen::Ok,
            RunOutcome::Failure(HarnessError::CompileFailed { source, .. }) => {
                Seen::Compile(source.exit_code())
            },
            RunOutcome::Failure(HarnessError::ProcessFailed { source, .. }) => {
                Seen::Process(source.exit_code())
            },
            RunOutcome::Failure(e) => Seen::Other(e.to_string()),
        };
        self.outcomes.push((entry.to_string(), seen));
    }
}

fn run(config: Config) -> (Result<(), HarnessError>, Recorder) {
    let mut rec = Recorder::default();
    let runner = ProcessRunner::new().cwd(config.root.clone()).echo(false);
    let res = Harness::new(config, runner, &mut rec).run();
    (res, rec)
}

#[test]
fn failing_fixture_is_reported_and_the_run_goes_on() {
    let (_dir, root) = workspace(&[("ok.lua", "print('ok')\n"), ("bad.lua", "print(\n")]);

    let (res, rec) = run(Config::with_root(root.clone()));

    res.unwrap();
    assert_eq!(
        rec.outcomes,
        vec![
            ("resources/bad.lua".to_string(), Seen::Compile(Some(1))),
            ("resources/ok.lua".to_string(), Seen::Ok),
        ]
    );
    assert!(root.join("build.stamp").exists());
    assert!(!root.join("out.luac").exists());
    assert_eq!(fs::read_to_string(root.join("processed.log")).unwrap(), "print('ok')\n");
}

#[test]
fn process_failure_keeps_its_own_kind() {
    let (_dir, root) = workspace(&[("a.lua", "explode()\n"), ("b.lua", "print(1)\n")]);

    let (res, rec) = run(Config::with_root(root.clone()));

    res.unwrap();
    assert_eq!(
        rec.outcomes,
        vec![
            ("resources/a.lua".to_string(), Seen::Process(Some(2))),
            ("resources/b.lua".to_string(), Seen::Ok),
        ]
    );
    assert!(!root.join("out.luac").exists());
}

#[test]
fn empty_corpus_only_builds() {
    let (_dir, root) = workspace(&[]);

    let (res, rec) = run(Config::with_root(root.clone()));

    res.unwrap();
    assert!(rec.outcomes.is_empty());
    assert!(root.join("build.stamp").exists());
    assert!(!root.join("processed.log").exists());
}

#[test]
fn broken_build_is_fatal_and_touches_nothing() {
    let (_dir, root) = workspace(&[("ok.lua", "print('ok')\n")]);
    script(&root, "c3/c3c", "echo 'c3c: link error' >&2\nexit 1\n");

    let (res, rec) = run(Config::with_root(root.clone()));

    match res {
        Err(HarnessError::BuildFailed(e)) => {
            assert_eq!(e.exit_code(), Some(1));
            assert!(e.captured_output().contains("link error"));
        },
        other => panic!("attendu BuildFailed, obtenu {other:?}"),
    }
    assert!(rec.outcomes.is_empty());
    assert!(!root.join("processed.log").exists());
}

#[test]
fn missing_build_tool_is_fatal() {
    let (_dir, root) = workspace(&[("ok.lua", "print('ok')\n")]);
    fs::remove_file(root.join("c3/c3c")).unwrap();

    let (res, rec) = run(Config::with_root(root));

    assert!(matches!(res, Err(HarnessError::BuildFailed(_))));
    assert!(rec.outcomes.is_empty());
}

#[test]
fn per_entry_scratch_leaves_the_root_clean() {
    let (_dir, root) =
        workspace(&[("a.lua", "print('a')\n"), ("nested/b.lua", "print('b')\n")]);
    let mut config = Config::with_root(root.clone());
    config.scratch.strategy = ScratchStrategy::PerEntry;

    let (res, rec) = run(config);

    res.unwrap();
    assert_eq!(
        rec.outcomes,
        vec![
            ("resources/a.lua".to_string(), Seen::Ok),
            ("resources/nested/b.lua".to_string(), Seen::Ok),
        ]
    );
    assert!(!root.join("out.luac").exists());
    assert_eq!(
        fs::read_to_string(root.join("processed.log")).unwrap(),
        "print('a')\nprint('b')\n"
    );
}

// ───────────────────────────── Binaire ─────────────────────────────

fn run_binary(root: &Utf8Path) -> std::process::Output {
    fs::write(root.join("corpus.toml"), "").unwrap();
    Command::new(env!("CARGO_BIN_EXE_corpus-harness"))
        .args(["-q", "--color", "never", "-c"])
        .arg(root.join("corpus.toml").as_str())
        .current_dir(root)
        .output()
        .unwrap()
}

#[test]
fn binary_exits_zero_even_when_fixtures_fail() {
    let (_dir, root) = workspace(&[("ok.lua", "print('ok')\n"), ("bad.lua", "print(\n")]);

    let out = run_binary(&root);

    assert_eq!(out.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("FAIL") && stderr.contains("resources/bad.lua"), "{stderr}");
    assert!(stderr.contains("PASS resources/ok.lua"), "{stderr}");
    assert!(!root.join("out.luac").exists());
}

#[test]
fn binary_exits_non_zero_when_the_build_fails() {
    let (_dir, root) = workspace(&[("ok.lua", "print('ok')\n")]);
    script(&root, "c3/c3c", "exit 4\n");

    let out = run_binary(&root);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("échec du build"), "{stderr}");
    assert!(!stderr.contains("PASS"), "{stderr}");
}
