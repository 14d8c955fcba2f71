use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicU64, Ordering};

fn rules_extract_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rules-extract"));
    cmd.env("HOME", home);
    cmd.env_remove("RULES_EXTRACT_CONFIG");
    cmd.env_remove("RULES_EXTRACT_SEARCH_URI");
    cmd.env_remove("RULES_EXTRACT_LANGUAGE");
    cmd.env_remove("RULES_EXTRACT_TIMEOUT_SECS");
    cmd.env_remove("RULES_EXTRACT_COLUMNS");
    cmd.env_remove("RULES_EXTRACT_LAYOUT");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    rules_extract_cmd(home)
        .args(args)
        .output()
        .expect("run rules-extract")
}

fn make_temp_home() -> PathBuf {
    static HOME_SEQ: AtomicU64 = AtomicU64::new(0);
    let seq = HOME_SEQ.fetch_add(1, Ordering::Relaxed);
    let home = std::env::temp_dir().join(format!(
        "rules-extract-exit-test-{}-{seq}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&home);
    std::fs::create_dir_all(&home).expect("create home");
    home
}

#[test]
fn single_dash_help_prints_usage_and_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["-help"]);
    assert_eq!(out.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("-o"), "stdout={stdout}");
    assert!(stdout.contains("-e"), "stdout={stdout}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn help_wins_over_other_flags() {
    let home = make_temp_home();
    let out = run(&home, &["-l", "java", "-h", "-o", "out.xlsx"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(!home.join("out.xlsx").exists());
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_output_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["-l", "java"]);
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("-o"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn malformed_date_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["-d", "2016/09/01", "-o", "out.xlsx"]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn unknown_flag_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["--frobnicate", "-o", "out.xlsx"]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn missing_explicit_config_exits_2() {
    let home = make_temp_home();
    let out = run(
        &home,
        &["--config", "/nonexistent/rules-extract.toml", "-o", "out.xlsx"],
    );
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn invalid_layout_env_exits_2() {
    let home = make_temp_home();
    let out = rules_extract_cmd(&home)
        .env("RULES_EXTRACT_LAYOUT", "grid")
        .args(["-o", "out.xlsx"])
        .output()
        .expect("run rules-extract");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("RULES_EXTRACT_LAYOUT"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn zero_timeout_exits_2() {
    let home = make_temp_home();
    let out = run(&home, &["--timeout", "0", "-o", "out.xlsx"]);
    assert_eq!(out.status.code(), Some(2));
    let _ = std::fs::remove_dir_all(&home);
}
