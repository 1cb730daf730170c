mod common;
use common::run_pipeline;

#[test]
fn minimal() {
    run_pipeline(include_str!("testfiles/minimal.sp"));
}

#[test]
fn shader() {
    run_pipeline(include_str!("testfiles/shader.sp"));
}

#[test]
fn forward() {
    run_pipeline(include_str!("testfiles/forward.sp"));
}

#[test]
fn shadowing() {
    let output = run_pipeline(include_str!("testfiles/shadowing.sp"));
    assert_eq!(output, "float f() { int x = 1; float x = 2.5; return x; }\n");
}

#[test]
fn literals() {
    run_pipeline(include_str!("testfiles/literals.sp"));
}
