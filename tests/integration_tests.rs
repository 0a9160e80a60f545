use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, diff};

fn ls8() -> Command {
    Command::cargo_bin("ls8").unwrap()
}

fn run_minimal(file: &str) -> assert_cmd::assert::Assert {
    ls8().arg("run").arg(file).arg("--minimal").assert()
}

#[test]
fn runs_without_arguments() {
    ls8().assert().success().stdout(contains("ls8"));
}

#[test]
fn runs_print8() {
    run_minimal("tests/files/print8.ls8")
        .success()
        .stdout(diff("8\n"));
}

#[test]
fn runs_mult() {
    run_minimal("tests/files/mult.ls8")
        .success()
        .stdout(diff("72\n"));
}

#[test]
fn runs_stack() {
    run_minimal("tests/files/stack.ls8")
        .success()
        .stdout(diff("2\n4\n1\n"));
}

#[test]
fn runs_call() {
    run_minimal("tests/files/call.ls8")
        .success()
        .stdout(diff("25\n42\n"));
}

#[test]
fn runs_compare_and_jumps() {
    run_minimal("tests/files/sctest.ls8")
        .success()
        .stdout(diff("1\n2\n3\n"));
}

#[test]
fn runs_path_shortcut() {
    ls8()
        .arg("tests/files/mult.ls8")
        .assert()
        .success()
        .stdout(contains("72"))
        .stdout(contains("Halted"));
}

#[test]
fn fails_on_divide_by_zero() {
    run_minimal("tests/files/divzero.ls8")
        .failure()
        .stdout(diff(""))
        .stderr(contains("division by zero"))
        .stderr(contains("R0 5"))
        .stderr(contains("PC 6"));
}

#[test]
fn stops_at_step_limit() {
    ls8()
        .arg("run")
        .arg("tests/files/loop.ls8")
        .arg("--minimal")
        .arg("--max-steps")
        .arg("100")
        .assert()
        .failure()
        .stderr(contains("did not halt within 100 steps"))
        .stderr(contains("R0").not());
}

#[test]
fn invalid_pop_target_reports_initial_stack_pointer() {
    // POP R9; HLT
    let image = std::env::temp_dir().join(format!("ls8-pop-{}.bin", std::process::id()));
    std::fs::write(&image, [0b0100_0110, 9, 0b0000_0001]).unwrap();
    ls8()
        .arg("run")
        .arg(&image)
        .arg("--minimal")
        .assert()
        .failure()
        .stderr(contains("no such register: R9"))
        .stderr(contains("R7 244"))
        .stderr(contains("PC 0"));
    let _ = std::fs::remove_file(image);
}

#[test]
fn reports_failure_status() {
    ls8()
        .arg("run")
        .arg("tests/files/divzero.ls8")
        .assert()
        .failure()
        .stdout(contains("Failed"));
}

#[test]
fn traces_instructions() {
    run_minimal("tests/files/print8.ls8")
        .success()
        .stderr(diff(""));

    ls8()
        .arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal")
        .arg("--trace")
        .assert()
        .success()
        .stdout(diff("8\n"))
        .stderr(diff(concat!(
            "TRACE: 00 | 82 00 08 | 00 00 00 00 00 00 00 F4 | LDI\n",
            "TRACE: 03 | 47 00 01 | 08 00 00 00 00 00 00 F4 | PRN\n",
            "TRACE: 05 | 01 00 00 | 08 00 00 00 00 00 00 F4 | HLT\n",
        )));
}

#[test]
fn traces_from_environment() {
    ls8()
        .env("LS8_TRACE", "1")
        .arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal")
        .assert()
        .success()
        .stderr(contains("TRACE: 05"));

    ls8()
        .env("LS8_TRACE", "0")
        .arg("run")
        .arg("tests/files/print8.ls8")
        .arg("--minimal")
        .assert()
        .success()
        .stderr(diff(""));
}

#[test]
fn rejects_bad_literal() {
    ls8()
        .arg("check")
        .arg("tests/files/badlit.ls8")
        .assert()
        .failure()
        .stderr(contains("load::bad_lit"));

    run_minimal("tests/files/badlit.ls8")
        .failure()
        .stdout(diff(""));
}

#[test]
fn checks_valid_file() {
    ls8()
        .arg("check")
        .arg("tests/files/sctest.ls8")
        .assert()
        .success()
        .stdout(contains("no errors found"));
}

#[test]
fn rejects_unknown_extension() {
    ls8()
        .arg("run")
        .arg("Cargo.toml")
        .assert()
        .failure()
        .stderr(contains("unknown extension"));
}

#[test]
fn compiles_and_runs_binary_image() {
    let dest = std::env::temp_dir().join(format!("ls8-call-{}.bin", std::process::id()));
    ls8()
        .arg("compile")
        .arg("tests/files/call.ls8")
        .arg(&dest)
        .assert()
        .success()
        .stdout(contains("Saved"));

    let image = std::fs::read(&dest).unwrap();
    assert_eq!(image.len(), 30);
    assert_eq!(&image[..3], &[0b1000_0010, 1, 42]);

    ls8()
        .arg("run")
        .arg(&dest)
        .arg("--minimal")
        .assert()
        .success()
        .stdout(diff("25\n42\n"));
    let _ = std::fs::remove_file(dest);
}
