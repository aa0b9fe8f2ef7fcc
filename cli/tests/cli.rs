use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

const DESIRED: &str = "\
compliance_config:
  vcenter:
    ntp:
      servers: [ntp1, ntp2]
  esxi:
    syslog:
      - name: host-01
        loghost: udp://10.0.0.5:514
";

const SNAPSHOT_COMPLIANT: &str = "\
compliance_config:
  vcenter:
    ntp:
      servers: [ntp2, ntp1]
  esxi:
    syslog:
      - name: host-01
        loghost: udp://10.0.0.5:514
";

const SNAPSHOT_DRIFTED: &str = "\
compliance_config:
  vcenter:
    ntp:
      servers: [ntp1]
  esxi:
    syslog:
      - name: host-01
        loghost: udp://10.0.0.9:514
";

struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        TestEnv {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.tmp.path().join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ccheck").unwrap();
        cmd.env("CCHECK_CONFIG_DIR", self.tmp.path())
            .env("RUST_LOG", "warn");
        cmd
    }
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn diff_identical_files_exits_zero() {
    let env = TestEnv::new();
    let a = env.write("a.json", r#"{"servers": ["x", "y"]}"#);
    let b = env.write("b.yaml", "servers: [y, x]\n");
    env.cmd()
        .args(["diff", s(&a), s(&b)])
        .assert()
        .success()
        .stdout(contains(r#""current": null"#));
}

#[test]
fn diff_in_order_reports_drift() {
    let env = TestEnv::new();
    let a = env.write("a.json", r#"{"servers": ["x", "y"]}"#);
    let b = env.write("b.json", r#"{"servers": ["y", "x"]}"#);
    env.cmd()
        .args(["diff", s(&a), s(&b), "--policy", "compare_in_order"])
        .assert()
        .code(2)
        .stdout(contains("servers"));
}

#[test]
fn diff_identity_keyed_yaml_output() {
    let env = TestEnv::new();
    let a = env.write(
        "current.json",
        r#"[{"host": "a", "port": 514}, {"host": "b", "port": 514}]"#,
    );
    let b = env.write("desired.json", r#"[{"host": "b", "port": 1514}]"#);
    env.cmd()
        .args([
            "--output",
            "yaml",
            "diff",
            s(&a),
            s(&b),
            "--policy",
            "identity_keyed",
            "--instance-key",
            "host",
        ])
        .assert()
        .code(2)
        .stdout(contains("port: 1514"));
}

#[test]
fn diff_missing_instance_key_is_an_error() {
    let env = TestEnv::new();
    let a = env.write("a.json", r#"[{"port": 514}]"#);
    let b = env.write("b.json", r#"[{"name": "a"}]"#);
    env.cmd()
        .args(["diff", s(&a), s(&b), "--policy", "identity_keyed"])
        .assert()
        .code(1)
        .stderr(contains("name"));
}

#[test]
fn check_compliant_snapshot() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    let snapshot = env.write("snapshot.yaml", SNAPSHOT_COMPLIANT);
    env.cmd()
        .args(["check", "--snapshot", s(&snapshot), "--desired", s(&desired)])
        .assert()
        .success()
        .stdout(contains(r#""status": "COMPLIANT""#));
}

#[test]
fn check_drifted_snapshot_exits_two() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    let snapshot = env.write("snapshot.yaml", SNAPSHOT_DRIFTED);
    env.cmd()
        .args(["check", "--snapshot", s(&snapshot), "--desired", s(&desired)])
        .assert()
        .code(2)
        .stdout(contains("NON_COMPLIANT"))
        .stdout(contains("10.0.0.9"));
}

#[test]
fn remediate_write_then_check_is_compliant() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    let snapshot = env.write("snapshot.json", "{\"compliance_config\": {\"vcenter\": {\"ntp\": {\"servers\": [\"old\"]}}}}");

    env.cmd()
        .args(["remediate", "--snapshot", s(&snapshot), "--desired", s(&desired), "--write"])
        .assert()
        .success()
        .stdout(contains("SUCCESS"));

    let written = fs::read_to_string(&snapshot).unwrap();
    assert!(written.contains("ntp2"));

    env.cmd()
        .args(["check", "--snapshot", s(&snapshot), "--desired", s(&desired)])
        .assert()
        .success();
}

#[test]
fn remediate_without_write_leaves_snapshot() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    let snapshot = env.write("snapshot.yaml", SNAPSHOT_DRIFTED);

    env.cmd()
        .args(["remediate", "--snapshot", s(&snapshot), "--desired", s(&desired)])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), SNAPSHOT_DRIFTED);
}

#[test]
fn duplicate_identities_block_check_and_remediate() {
    let env = TestEnv::new();
    let config = env.write(
        "keyed.yaml",
        "controls:\n  esxi.syslog:\n    policy: identity_keyed\n",
    );
    let desired = env.write(
        "desired.json",
        r#"{"compliance_config": {"esxi": {"syslog": [{"name": "h1", "v": 1}, {"name": "h1", "v": 2}]}}}"#,
    );
    let snapshot_text = r#"{"compliance_config": {"esxi": {"syslog": [{"name": "h1", "v": 1}]}}}"#;
    let snapshot = env.write("snapshot.json", snapshot_text);

    env.cmd()
        .args(["--config", s(&config), "check", "--snapshot", s(&snapshot), "--desired", s(&desired)])
        .assert()
        .code(1)
        .stdout(contains("ERROR"))
        .stdout(contains("duplicate name"));

    env.cmd()
        .args([
            "--config",
            s(&config),
            "remediate",
            "--snapshot",
            s(&snapshot),
            "--desired",
            s(&desired),
            "--write",
        ])
        .assert()
        .code(2)
        .stdout(contains("FAILED"));
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), snapshot_text);
}

#[test]
fn missing_home_uses_default_settings() {
    let env = TestEnv::new();
    let a = env.write("a.json", "[1, 2]");
    let b = env.write("b.json", "[2, 1]");
    env.cmd()
        .env_remove("CCHECK_CONFIG_DIR")
        .env_remove("HOME")
        .args(["diff", s(&a), s(&b)])
        .assert()
        .success();
}

#[test]
fn controls_listing_applies_overrides() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    let config = env.write(
        "custom.yaml",
        "output: yaml\ncontrols:\n  esxi.syslog:\n    policy: identity_keyed\n",
    );
    env.cmd()
        .args(["--config", s(&config), "controls", "--desired", s(&desired)])
        .assert()
        .success()
        .stdout(contains("name: syslog"))
        .stdout(contains("policy: identity_keyed"))
        .stdout(contains("policy: sort_then_compare"));
}

#[test]
fn settings_from_config_dir_are_used() {
    let env = TestEnv::new();
    env.write("settings.yaml", "default_policy: compare_in_order\n");
    let a = env.write("a.json", "[1, 2]");
    let b = env.write("b.json", "[2, 1]");
    env.cmd().args(["diff", s(&a), s(&b)]).assert().code(2);
}

#[test]
fn missing_input_file_is_an_error() {
    let env = TestEnv::new();
    let desired = env.write("desired.yaml", DESIRED);
    env.cmd()
        .args(["check", "--snapshot", s(&env.path("absent.yaml")), "--desired", s(&desired)])
        .assert()
        .code(1)
        .stderr(contains("failed to read"));
}

#[test]
fn explicit_config_must_exist() {
    let env = TestEnv::new();
    let a = env.write("a.json", "{}");
    env.cmd()
        .args(["--config", s(&env.path("nope.yaml")), "diff", s(&a), s(&a)])
        .assert()
        .code(1)
        .stderr(contains("failed to load settings"));
}

#[test]
fn unknown_policy_is_rejected_by_parser() {
    let env = TestEnv::new();
    let a = env.write("a.json", "{}");
    env.cmd()
        .args(["diff", s(&a), s(&a), "--policy", "fuzzy"])
        .assert()
        .failure()
        .stderr(contains("fuzzy"));
}
