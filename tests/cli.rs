//! Command-line tests: run the `parseed` binary on temporary files and stdin.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

fn layout_file(src: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(src.as_bytes()).expect("write layout");
    file
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parseed"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run parseed")
}

fn run_stdin(args: &[&str], input: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_parseed"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn parseed");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(input.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn compiles_a_file() {
    let file = layout_file("struct a { uint8 x, } bitfield b { f, }");
    let path = file.path().to_str().expect("utf-8 path");
    let output = run(&[path]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), format!("{}: ok, 1 struct(s), 1 bitfield(s)\n", path));
}

#[test]
fn ast_dump() {
    let file = layout_file("struct a { LE uint16 x, }");
    let output = run(&["--ast", file.path().to_str().expect("utf-8 path")]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "struct a BE\n  x: uint16 LE\n");
}

#[test]
fn token_dump_from_stdin() {
    let output = run_stdin(&["-L"], "struct a { }");
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "KEYWORD:struct\nIDENTIFIER:a\nLCURLY\nRCURLY\nEOF\n");
}

#[test]
fn stdin_dash_and_summary() {
    let output = run_stdin(&["-"], "struct a { }");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "<stdin>: ok, 1 struct(s), 0 bitfield(s)\n");
}

#[test]
fn compile_error_exits_with_status_one() {
    let file = layout_file("struct test {\n    unknown_type x,\n}\n");
    let output = run(&[file.path().to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
    let err = stderr(&output);
    assert!(err.contains("on line 2"), "{}", err);
    assert!(err.contains("    ~~~~~~~~~~~~\n"), "{}", err);
    assert!(err.ends_with("Unknown data type error: \"unknown_type\" in struct test\n"), "{}", err);
}

#[test]
fn lexer_error_with_token_dump() {
    let output = run_stdin(&["--lexer"], "struct $");
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Illegal character error: '$'"));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.pds");
    let output = run(&[missing.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read"));
}

#[test]
fn help_and_unknown_options() {
    let output = run(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("usage: parseed"));

    let output = run(&["--bogus"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown option '--bogus'"));
}
