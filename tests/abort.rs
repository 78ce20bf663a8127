//! The fatal-error hook. Aborting kills the process, so each death test
//! re-runs this binary filtered to a single child test and inspects its
//! exit status and stderr.

use std::env;
use std::process::{Command, Output};

use simd_compress::check::assert_compressed;
use simd_compress::{abort_fn, compress_assert, set_abort_fn, AbortFn, Mask, Vector};

const CHILD: &str = "SIMD_COMPRESS_ABORT_CHILD";

fn in_child() -> bool {
    env::var_os(CHILD).is_some()
}

fn run_child(test: &str) -> Output {
    Command::new(env::current_exe().unwrap())
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(CHILD, "1")
        .output()
        .unwrap()
}

fn assert_died_with(test: &str, needles: &[&str]) -> String {
    let out = run_child(test);
    let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
    assert!(!out.status.success(), "{} exited cleanly:\n{}", test, stderr);
    for needle in needles {
        assert!(stderr.contains(needle), "{:?} not in stderr of {}:\n{}", needle, test, stderr);
    }
    stderr
}

fn first_handler(_file: &str, _line: u32, _message: &str) {}

fn second_handler(_file: &str, _line: u32, _message: &str) {}

fn loud_handler(file: &str, line: u32, message: &str) {
    eprintln!("loud handler saw {}:{}: {}", file, line, message);
}

fn addr(handler: Option<AbortFn>) -> Option<usize> {
    handler.map(|f| f as usize)
}

#[test]
fn handler_chain() {
    let original = set_abort_fn(Some(first_handler));
    assert_eq!(addr(abort_fn()), addr(Some(first_handler)));

    let previous = set_abort_fn(Some(second_handler));
    assert_eq!(addr(previous), addr(Some(first_handler)));
    assert_eq!(addr(abort_fn()), addr(Some(second_handler)));

    assert_eq!(addr(set_abort_fn(original)), addr(Some(second_handler)));
    assert_eq!(addr(abort_fn()), addr(original));
}

#[test]
fn child_default_abort() {
    if in_child() {
        simd_compress::abort!("value was {}", 42);
    }
}

#[test]
fn default_abort_reports_location() {
    assert_died_with("child_default_abort", &["Abort at ", "abort.rs:", ": value was 42"]);
}

#[test]
fn child_custom_abort() {
    if in_child() {
        set_abort_fn(Some(loud_handler));
        simd_compress::abort!("custom {}", "message");
    }
}

#[test]
fn custom_handler_replaces_default_report() {
    let stderr = assert_died_with("child_custom_abort", &["loud handler saw ", ": custom message"]);
    assert!(!stderr.contains("Abort at "), "{}", stderr);
}

#[test]
fn child_failed_assert() {
    if in_child() {
        compress_assert!(1 + 1 == 3);
    }
}

#[test]
fn assert_reports_condition() {
    assert_died_with("child_failed_assert", &["Abort at ", "Assert 1 + 1 == 3"]);
}

#[test]
fn child_count_mismatch() {
    if in_child() {
        let v = Vector::from_array([10u32, 20, 30, 40]);
        assert_compressed(&v, Mask::from_code(0b1010), &[20, 40, 30], 3);
    }
}

#[test]
fn count_mismatch_reports_sizes() {
    assert_died_with("child_count_mismatch", &["Size mismatch for u32x4: expected 2, actual 3"]);
}

#[test]
fn child_lane_mismatch() {
    if in_child() {
        let v = Vector::from_array([1u64, 2]);
        assert_compressed(&v, Mask::all(), &[2, 1], 2);
    }
}

#[test]
fn lane_mismatch_lists_lanes() {
    assert_died_with(
        "child_lane_mismatch",
        &["Mismatch for u64x2", "mask:   11", "expect: [1, 2]", "actual: [2, 1]"],
    );
}
