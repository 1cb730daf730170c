mod common;
use common::run_pipeline;

#[test]
#[should_panic]
fn fail_missing_semicolon() {
    run_pipeline(include_str!("fails/missing_semicolon.sp"));
}

#[test]
#[should_panic]
fn fail_no_expression() {
    run_pipeline(include_str!("fails/no_expression.sp"));
}

#[test]
#[should_panic]
fn fail_unknown_module() {
    run_pipeline(include_str!("fails/unknown_module.sp"));
}

#[test]
#[should_panic]
fn fail_unknown_name() {
    run_pipeline(include_str!("fails/unknown_name.sp"));
}

#[test]
#[should_panic]
fn fail_duplicate_param() {
    run_pipeline(include_str!("fails/duplicate_param.sp"));
}

#[test]
#[should_panic]
fn fail_return_mismatch() {
    run_pipeline(include_str!("fails/return_mismatch.sp"));
}

#[test]
#[should_panic]
fn fail_arity() {
    run_pipeline(include_str!("fails/arity.sp"));
}

#[test]
#[should_panic]
fn fail_argument_type() {
    run_pipeline(include_str!("fails/argument_type.sp"));
}

#[test]
#[should_panic]
fn fail_recursive_inference() {
    run_pipeline(include_str!("fails/recursive_inference.sp"));
}

#[test]
#[should_panic]
fn fail_unsupported_type() {
    run_pipeline(include_str!("fails/unsupported_type.sp"));
}

#[test]
#[should_panic]
fn fail_unit_let() {
    run_pipeline(include_str!("fails/unit_let.sp"));
}
