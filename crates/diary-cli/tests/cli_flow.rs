use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// 32 zero bytes, base64. A valid key that opens nothing written by keygen.
const WRONG_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("data").join("diary").join("diary.sqlite3")
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_diary"));
        cmd.args(args)
            .env_clear()
            .env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env("TERM", "dumb")
            .env("NO_COLOR", "1");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run diary")
    }

    fn run_with(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut cmd = self.command(args);
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().expect("run diary")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_success(&output, args);
        stdout(&output)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "diary {:?} failed: {}\n{}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn value_of(stdout: &str, key: &str) -> String {
    let prefix = format!("{}=", key);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(&prefix))
        .unwrap_or_else(|| panic!("no {} in output:\n{}", key, stdout))
        .to_string()
}

fn init_with_key(env: &TestEnv) -> String {
    env.run_ok(&["init", "--backend", "file", "--max-derivations", "2"]);
    let out = env.run_ok(&["keygen"]);
    value_of(&out, "backup_key")
}

/// Run one statement against the store, bypassing the CLI.
fn exec_sql(path: &Path, sql: &str, id: &str) {
    let conn = rusqlite::Connection::open(path).expect("raw connection");
    conn.execute(sql, [id]).expect("execute");
}

fn file_contains(path: &Path, needle: &str) -> bool {
    let bytes = std::fs::read(path).expect("read store");
    bytes
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}

#[test]
fn test_add_list_show_round_trip() {
    let env = TestEnv::new();
    init_with_key(&env);

    let out = env.run_ok(&[
        "add",
        "--title",
        "First day",
        "--content",
        "Dear diary, the lake was calm.",
        "--tag",
        "outdoors",
        "--mood",
        "grateful",
        "--category",
        "travel",
    ]);
    let id = value_of(&out, "id");

    let listed = env.run_ok(&["list"]);
    assert!(listed.contains("First day"));
    assert!(listed.contains(&id[..8]));

    let shown = env.run_ok(&["show", &id[..8]]);
    assert!(shown.contains("Dear diary, the lake was calm."));
    assert!(shown.contains("mood=grateful"));

    let json: serde_json::Value = serde_json::from_str(&env.run_ok(&["list", "--json"])).unwrap();
    assert_eq!(json[0]["status"], "decrypted");
    assert_eq!(json[0]["entry"]["tags"][0], "outdoors");

    assert!(!file_contains(&env.store_path(), "the lake was calm"));
    assert!(!file_contains(&env.store_path(), "First day"));
}

#[test]
fn test_lock_then_unlock_with_backup_key() {
    let env = TestEnv::new();
    let key = init_with_key(&env);
    let out = env.run_ok(&["add", "--title", "Kept", "--content", "Still here"]);
    let id = value_of(&out, "id");

    env.run_ok(&["lock"]);
    let locked = env.run(&["add", "--title", "x", "--content", "y"]);
    assert_eq!(locked.status.code(), Some(5));

    let missing_key = env.run(&["unlock"]);
    assert_eq!(missing_key.status.code(), Some(5));

    let unlocked = env.run_with(&["unlock"], &[("DIARY_KEY", &key)]);
    assert_success(&unlocked, &["unlock"]);
    assert!(env.run_ok(&["show", &id]).contains("Still here"));
}

#[test]
fn test_wrong_key_shows_decryption_error_rows() {
    let env = TestEnv::new();
    init_with_key(&env);
    let out = env.run_ok(&["add", "--title", "Private", "--content", "Hidden"]);
    let id = value_of(&out, "id");

    env.run_ok(&["lock"]);
    let unlocked = env.run_with(&["unlock"], &[("DIARY_KEY", WRONG_KEY)]);
    assert_success(&unlocked, &["unlock"]);

    let listed = env.run_ok(&["list"]);
    assert!(listed.contains("Decryption Error"));
    assert!(!listed.contains("Private"));

    let shown = env.run(&["show", &id]);
    assert_eq!(shown.status.code(), Some(6));
}

#[test]
fn test_malformed_key_is_rejected() {
    let env = TestEnv::new();
    init_with_key(&env);
    env.run_ok(&["lock"]);
    let out = env.run_with(&["unlock"], &[("DIARY_KEY", "not base64!")]);
    assert_eq!(out.status.code(), Some(5));
}

#[test]
fn test_legacy_password_flow() {
    let env = TestEnv::new();
    env.run_ok(&["init", "--backend", "file"]);

    let out = env.run_with(
        &["legacy", "add", "--title", "Old style", "--content", "Password sealed"],
        &[("DIARY_ENTRY_PASSWORD", "correct-horse")],
    );
    assert_success(&out, &["legacy", "add"]);
    let id = value_of(&stdout(&out), "id");
    assert!(!file_contains(&env.store_path(), "Password sealed"));

    let opened = env.run_with(
        &["legacy", "decrypt", &id],
        &[("DIARY_ENTRY_PASSWORD", "correct-horse")],
    );
    assert_success(&opened, &["legacy", "decrypt"]);
    assert!(stdout(&opened).contains("Password sealed"));

    let wrong = env.run_with(
        &["legacy", "decrypt", &id],
        &[("DIARY_ENTRY_PASSWORD", "wrong-horse")],
    );
    assert_eq!(wrong.status.code(), Some(5));

    let no_password = env.run(&["legacy", "decrypt", &id]);
    assert_eq!(no_password.status.code(), Some(4));
}

#[test]
fn test_delete_then_missing() {
    let env = TestEnv::new();
    init_with_key(&env);
    let out = env.run_ok(&["add", "--title", "Gone", "--content", "Soon"]);
    let id = value_of(&out, "id");

    let refused = env.run(&["delete", &id]);
    assert_eq!(refused.status.code(), Some(4));

    env.run_ok(&["delete", &id, "--yes"]);
    let again = env.run(&["delete", &id, "--yes"]);
    assert_eq!(again.status.code(), Some(3));
}

#[test]
fn test_missing_config_is_not_found() {
    let env = TestEnv::new();
    let out = env.run(&["list"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&out.stderr).contains("diary init"));
}

#[test]
fn test_status_json() {
    let env = TestEnv::new();
    init_with_key(&env);
    let json: serde_json::Value =
        serde_json::from_str(&env.run_ok(&["status", "--json"])).unwrap();
    assert_eq!(json["session"], "unlocked");
    assert_eq!(json["session_backend"], "file");
    assert_eq!(json["entries"], 0);

    env.run_ok(&["lock"]);
    let json: serde_json::Value =
        serde_json::from_str(&env.run_ok(&["status", "--json"])).unwrap();
    assert_eq!(json["session"], "signed_out");
}

#[test]
fn test_list_survives_damaged_row() {
    let env = TestEnv::new();
    init_with_key(&env);
    env.run_ok(&["add", "--title", "Intact", "--content", "fine"]);
    let out = env.run_ok(&["add", "--title", "Damaged", "--content", "gone"]);
    let id = value_of(&out, "id");

    exec_sql(
        &env.store_path(),
        "UPDATE entries SET body_json = json_set(body_json, '$.title', 'aa:bb') WHERE id = ?",
        &id,
    );

    let listed = env.run_ok(&["list"]);
    assert!(listed.contains("Intact"));
    assert!(listed.contains("Decryption Error"));

    let json: serde_json::Value = serde_json::from_str(&env.run_ok(&["list", "--json"])).unwrap();
    let statuses: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|view| view["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.contains(&"decrypted"));
    assert!(statuses.contains(&"undecryptable"));
}

#[test]
fn test_unlock_succeeds_when_store_cannot_be_listed() {
    let env = TestEnv::new();
    let key = init_with_key(&env);
    let out = env.run_ok(&["add", "--title", "Kept", "--content", "Still here"]);
    let id = value_of(&out, "id");
    env.run_ok(&["lock"]);

    exec_sql(
        &env.store_path(),
        "UPDATE entries SET id = 'not-a-uuid' WHERE id = ?",
        &id,
    );

    let unlocked = env.run_with(&["unlock"], &[("DIARY_KEY", key.as_str())]);
    assert_success(&unlocked, &["unlock"]);

    // The key was cached: writes work without unlocking again.
    env.run_ok(&["add", "--title", "After", "--content", "unlock"]);
}
