// SPDX: CC0-1.0

use calc_notation::{
    evaluate_numeric, sample_function, AngleMode, CalcErr, ErrorKind, LastAnswer, Number, Window,
};
use core::num::NonZeroU16;

fn calc(src: &str, angle: AngleMode) -> Result<Number, CalcErr> {
    evaluate_numeric(src, angle, &mut LastAnswer::default())
}

fn kind(src: &str) -> ErrorKind {
    calc(src, AngleMode::Radians).unwrap_err().kind()
}

fn approx(a: Number, b: Number) -> bool {
    (a - b).abs() < 1e-9
}

fn window(samples: u16) -> Window {
    Window {
        x: -10.0..10.0,
        samples: NonZeroU16::new(samples).unwrap(),
    }
}

#[test]
fn deterministic() {
    for angle in [AngleMode::Degrees, AngleMode::Radians] {
        for src in ["sin(30)+2^3×π", "√(16)·|−3|", "log(1000) - ln(e)"] {
            assert_eq!(calc(src, angle), calc(src, angle));
        }
    }
}

#[test]
fn implicit_multiplication_by_constant() {
    let implicit = calc("2pi", AngleMode::Radians).unwrap();
    let explicit = calc("2*pi", AngleMode::Radians).unwrap();
    assert_eq!(implicit, explicit);
    assert!((implicit - 6.283185).abs() < 1e-6);
    assert_eq!(calc("2(3+1)", AngleMode::Radians).unwrap(), 8.0);
    assert_eq!(calc("(1+1)(2+2)", AngleMode::Radians).unwrap(), 8.0);
}

#[test]
fn angle_mode_changes_trig() {
    assert!(approx(calc("sin(90)", AngleMode::Degrees).unwrap(), 1.0));
    assert!(approx(calc("sin(90)", AngleMode::Radians).unwrap(), 0.8939966636));
    assert!(approx(calc("asin(1)", AngleMode::Degrees).unwrap(), 90.0));
    // explicit conversions are not applied twice
    assert!(approx(calc("sin(rad(90))", AngleMode::Degrees).unwrap(), 1.0));
    assert!(approx(calc("deg(asin(1))", AngleMode::Degrees).unwrap(), 90.0));
}

#[test]
fn inverse_trig_inside_forward_trig_in_degrees() {
    assert!(approx(calc("sin(asin(0.5))", AngleMode::Degrees).unwrap(), 0.5));
    assert!(approx(calc("cos(acos(0.5))", AngleMode::Degrees).unwrap(), 0.5));
    assert!(approx(calc("tan(atan(1))", AngleMode::Degrees).unwrap(), 1.0));
    assert!((calc("asin(sin(30))", AngleMode::Degrees).unwrap() - 30.0).abs() < 1e-6);
}

#[test]
fn glyphs_and_precedence() {
    assert_eq!(calc("4÷2×3^2", AngleMode::Radians).unwrap(), 18.0);
    assert_eq!(calc("2^3^2", AngleMode::Radians).unwrap(), 512.0);
    assert_eq!(calc("-2^2", AngleMode::Radians).unwrap(), 4.0);
    assert_eq!(calc("7 % 3", AngleMode::Radians).unwrap(), 1.0);
    assert_eq!(calc("|−3|+±2", AngleMode::Radians).unwrap(), 1.0);
    assert!(approx(calc("∛(27)", AngleMode::Radians).unwrap(), 3.0));
}

#[test]
fn log_and_ln_are_distinct() {
    assert!(approx(calc("log(100)", AngleMode::Radians).unwrap(), 2.0));
    assert!(approx(calc("ln(e)", AngleMode::Radians).unwrap(), 1.0));
}

#[test]
fn domain_errors() {
    for src in ["1/0", "sqrt(-1)", "fact(-1)", "fact(2.5)", "ln(0)", "asin(2)"] {
        assert_eq!(kind(src), ErrorKind::DomainError, "{src}");
    }
    assert_eq!(calc("fact(5)", AngleMode::Radians).unwrap(), 120.0);

    let tan = calc("tan(90)", AngleMode::Degrees).unwrap_err();
    assert_eq!(tan.kind(), ErrorKind::DomainError);
    assert!(approx(calc("tan(45)", AngleMode::Degrees).unwrap(), 1.0));
}

#[test]
fn other_error_kinds() {
    assert_eq!(kind("x+1"), ErrorKind::UnboundVariable);
    assert_eq!(kind("foo(2)"), ErrorKind::UnknownFunction);
    assert_eq!(kind("sqrt(1, 2)"), ErrorKind::ArityMismatch);
    assert_eq!(kind("2+"), ErrorKind::SyntaxError);
    assert_eq!(kind(""), ErrorKind::SyntaxError);
    assert_eq!(kind("(1"), ErrorKind::SyntaxError);
    assert_eq!(kind("1 = 1"), ErrorKind::SyntaxError);
}

#[test]
fn last_answer_feeds_next_evaluation() {
    let mut ans = LastAnswer::default();
    assert_eq!(evaluate_numeric("ANS", AngleMode::Radians, &mut ans).unwrap(), 0.0);
    assert_eq!(evaluate_numeric("2*3", AngleMode::Radians, &mut ans).unwrap(), 6.0);
    assert_eq!(evaluate_numeric("ANS+1", AngleMode::Radians, &mut ans).unwrap(), 7.0);

    // failures leave the previous answer in place
    assert!(evaluate_numeric("1/0", AngleMode::Radians, &mut ans).is_err());
    assert_eq!(ans.get(), "7");

    evaluate_numeric("-3", AngleMode::Radians, &mut ans).unwrap();
    assert_eq!(evaluate_numeric("2ANS", AngleMode::Radians, &mut ans).unwrap(), -6.0);
}

#[test]
fn sampling_leaves_gaps_at_poles() {
    let ans = LastAnswer::default();
    let curve = sample_function("1/x", "x", &window(21), AngleMode::Radians, &ans).unwrap();
    assert_eq!(curve.samples.len(), 21);
    assert!(curve.excluded >= 1);
    for sample in &curve.samples {
        if sample.x == 0.0 {
            assert_eq!(sample.y, None);
        } else {
            assert!(sample.y.is_some_and(Number::is_finite), "{sample:?}");
        }
    }
    assert_eq!(curve.segments().count(), 2);
}

#[test]
fn sampling_uses_angle_mode_and_answer() {
    let mut ans = LastAnswer::default();
    evaluate_numeric("2", AngleMode::Radians, &mut ans).unwrap();
    let curve = sample_function("ANS x", "x", &window(3), AngleMode::Radians, &ans).unwrap();
    let ys: Vec<_> = curve.samples.iter().map(|s| s.y).collect();
    assert_eq!(ys, vec![Some(-20.0), Some(0.0), Some(20.0)]);

    let curve = sample_function("sin(x)", "x", &window(3), AngleMode::Degrees, &ans).unwrap();
    assert!(approx(curve.samples[2].y.unwrap(), 10.0_f64.to_radians().sin()));
}

#[test]
fn sampling_rejects_other_free_variables() {
    let ans = LastAnswer::default();
    let err = sample_function("x+y", "x", &window(5), AngleMode::Radians, &ans).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnboundVariable);
    let err = sample_function("sqrt(", "x", &window(5), AngleMode::Radians, &ans).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);
}

#[test]
fn sampling_constant_expression() {
    let ans = LastAnswer::default();
    let curve = sample_function("3", "x", &window(4), AngleMode::Radians, &ans).unwrap();
    assert!(curve.samples.iter().all(|s| s.y == Some(3.0)));
    assert_eq!(curve.excluded, 0);
}
