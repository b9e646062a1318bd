use std::process::{Command, Output};

fn commute(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_commute"))
        .args(args)
        .output()
        .expect("failed to run commute binary")
}

#[test]
fn headless_office_run_completes_the_journey() {
    let output = commute(&["--headless", "--scene", "office", "--moves", "wwwddd"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("> You sit down. Another day begins."));
    assert!(stdout.contains("-- journey complete --"));
    assert!(stdout.contains("finished in office at (4, 1)"));
}

#[test]
fn headless_run_reports_bumps() {
    let output = commute(&["--headless", "--moves", "a"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("bumped Left from (1, 1) into (0, 1)"));
    assert!(stdout.contains("finished in apartment at (1, 1)"));
}

#[test]
fn headless_rejects_unknown_moves() {
    let output = commute(&["--headless", "--moves", "wxyz"]);
    assert!(!output.status.success());
}
