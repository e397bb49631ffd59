// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::{collections::HashMap, sync::OnceLock}; // assumes Number = f64

pub const X: &str = "x";

pub const MAX_FACTORIAL: Number = 170.0;

pub fn idents() -> &'static Idents {
    static IDENTS: OnceLock<Idents> = OnceLock::new();
    IDENTS.get_or_init(standard_idents)
}

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    ret.insert("abs", Ident::Fun(Fun::new(1, abs)));
    ret.insert("sqrt", Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("cbrt", Ident::Fun(Fun::new(1, cbrt)));
    ret.insert("exp", Ident::Fun(Fun::new(1, exp)));
    ret.insert("ln", Ident::Fun(Fun::new(1, ln)));
    ret.insert("log10", Ident::Fun(Fun::new(1, log10)));
    ret.insert("factorial", Ident::Fun(Fun::new(1, factorial)));

    // trig
    ret.insert("sin", Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos", Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan", Ident::Fun(Fun::new(1, tan)));
    ret.insert("asin", Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos", Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan", Ident::Fun(Fun::new(1, arctan)));
    ret.insert("sinh", Ident::Fun(Fun::new(1, sinh)));
    ret.insert("cosh", Ident::Fun(Fun::new(1, cosh)));
    ret.insert("tanh", Ident::Fun(Fun::new(1, tanh)));
    ret.insert("degrees", Ident::Fun(Fun::new(1, degrees)));
    ret.insert("radians", Ident::Fun(Fun::new(1, radians)));

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("tau", Ident::Const(consts::TAU));
    ret.insert("e", Ident::Const(consts::E));
    ret
}

pub fn is_fun(name: &str) -> bool {
    matches!(idents().get(name), Some(Ident::Fun(_)))
}

pub fn is_const(name: &str) -> bool {
    matches!(idents().get(name), Some(Ident::Const(_)))
}

pub fn most_similar(name: &str) -> Option<(&'static str, &'static Ident)> {
    let name = name.to_ascii_lowercase();
    idents()
        .iter()
        .map(|(key, ident)| {
            (
                strsim::normalized_damerau_levenshtein(&name, key),
                (*key, ident),
            )
        })
        // ties go to the alphabetically first name so the choice is stable
        .reduce(|(acc_sim, acc_kv), (elem_sim, elem_kv)| {
            if elem_sim > acc_sim || (elem_sim == acc_sim && elem_kv.0 < acc_kv.0) {
                (elem_sim, elem_kv)
            } else {
                (acc_sim, acc_kv)
            }
        })
        .filter(|(sim, _)| *sim > 0.3)
        .map(|(_, kv)| kv)
}

fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    // arity is checked by the parser
    let mut ret = [Number::NAN; N];
    for (dst, src) in ret.iter_mut().zip(args) {
        *dst = *src;
    }
    ret
}

fn in_range(x: Number, lo: Number, hi: Number, domain: &'static str) -> Result<Number, DomainErrTyp> {
    if (lo..=hi).contains(&x) {
        Ok(x)
    } else {
        Err(DomainErrTyp::OutOfDomain { arg: x, domain })
    }
}

pub fn neg(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(-x)
}

pub fn add(args: &[Number]) -> FunResult {
    let [x, y] = expect_n::<2>(args);
    Ok(x + y)
}

pub fn sub(args: &[Number]) -> FunResult {
    let [x, y] = expect_n::<2>(args);
    Ok(x - y)
}

pub fn mul(args: &[Number]) -> FunResult {
    let [x, y] = expect_n::<2>(args);
    Ok(x * y)
}

pub fn div(args: &[Number]) -> FunResult {
    let [x, y] = expect_n::<2>(args);
    if y == 0.0 {
        return Err(DomainErrTyp::DivByZero);
    }
    Ok(x / y)
}

// Floored modulo: the result takes the sign of the divisor.
pub fn rem(args: &[Number]) -> FunResult {
    let [x, y] = expect_n::<2>(args);
    if y == 0.0 {
        return Err(DomainErrTyp::DivByZero);
    }
    Ok(x - y * (x / y).floor())
}

pub fn pow(args: &[Number]) -> FunResult {
    let [x, exp] = expect_n::<2>(args);
    if x == 0.0 && exp < 0.0 {
        return Err(DomainErrTyp::DivByZero);
    }
    Ok(x.powf(exp))
}

pub fn abs(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.abs())
}

pub fn sqrt(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    in_range(x, 0.0, Number::INFINITY, "[0, inf)").map(Number::sqrt)
}

pub fn cbrt(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.cbrt())
}

pub fn exp(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.exp())
}

pub fn ln(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        return Err(DomainErrTyp::OutOfDomain {
            arg: x,
            domain: "(0, inf)",
        });
    }
    Ok(x.ln())
}

pub fn log10(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    if x <= 0.0 {
        return Err(DomainErrTyp::OutOfDomain {
            arg: x,
            domain: "(0, inf)",
        });
    }
    Ok(x.log10())
}

pub fn factorial(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    if x < 0.0 || x.fract() != 0.0 {
        return Err(DomainErrTyp::NotNatural { arg: x });
    }
    if x > MAX_FACTORIAL {
        return Err(DomainErrTyp::NotFinite);
    }
    let mut acc: Number = 1.0;
    let mut k: Number = 2.0;
    while k <= x {
        acc *= k;
        k += 1.0;
    }
    Ok(acc)
}

pub fn sin(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.sin())
}

pub fn cos(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.cos())
}

pub fn tan(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    // at odd multiples of pi/2 the cosine is only rounding error away from zero
    if x.cos().abs() <= 4.0 * Number::EPSILON * x.abs().max(1.0) {
        return Err(DomainErrTyp::OutOfDomain {
            arg: x,
            domain: "x != pi/2 + k*pi",
        });
    }
    Ok(x.tan())
}

pub fn arcsin(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    in_range(x, -1.0, 1.0, "[-1, 1]").map(Number::asin)
}

pub fn arccos(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    in_range(x, -1.0, 1.0, "[-1, 1]").map(Number::acos)
}

pub fn arctan(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.atan())
}

pub fn sinh(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.sinh())
}

pub fn cosh(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.cosh())
}

pub fn tanh(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.tanh())
}

pub fn degrees(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.to_degrees())
}

pub fn radians(args: &[Number]) -> FunResult {
    let [x] = expect_n::<1>(args);
    Ok(x.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Number]) -> FunResult {
        match idents().get(name) {
            Some(Ident::Fun(fun)) => fun.call(args),
            _ => panic!("'{name}' is not a function"),
        }
    }

    #[test]
    fn log_and_ln_are_distinct() {
        assert!((call("log10", &[1000.0]).unwrap() - 3.0).abs() < 1e-12);
        assert!((call("ln", &[consts::E]).unwrap() - 1.0).abs() < 1e-12);
        assert!(idents().get("log").is_none());
    }

    #[test]
    fn factorial_domain() {
        assert_eq!(call("factorial", &[0.0]).unwrap(), 1.0);
        assert_eq!(call("factorial", &[5.0]).unwrap(), 120.0);
        assert_eq!(
            call("factorial", &[-1.0]).unwrap_err(),
            DomainErrTyp::NotNatural { arg: -1.0 }
        );
        assert_eq!(
            call("factorial", &[2.5]).unwrap_err(),
            DomainErrTyp::NotNatural { arg: 2.5 }
        );
        assert_eq!(
            call("factorial", &[171.0]).unwrap_err(),
            DomainErrTyp::NotFinite
        );
        assert!(call("factorial", &[170.0]).is_ok());
    }

    #[test]
    fn real_only_roots_and_inverse_trig() {
        assert!(call("sqrt", &[-1.0]).is_err());
        assert_eq!(call("sqrt", &[9.0]).unwrap(), 3.0);
        assert!((call("cbrt", &[-8.0]).unwrap() + 2.0).abs() < 1e-12);
        assert!(call("asin", &[1.5]).is_err());
        assert!(call("acos", &[-1.01]).is_err());
        assert!(call("ln", &[0.0]).is_err());
        assert!(call("log10", &[-10.0]).is_err());
    }

    #[test]
    fn tan_is_undefined_at_poles() {
        for deg in [90.0, -90.0, 270.0, 450.0] {
            let x: Number = deg;
            assert!(call("tan", &[x.to_radians()]).is_err(), "{deg}");
        }
        assert!(call("tan", &[consts::FRAC_PI_2]).is_err());
        assert!((call("tan", &[consts::FRAC_PI_4]).unwrap() - 1.0).abs() < 1e-12);
        assert!(call("tan", &[1.5707963]).unwrap() > 1e7);
        assert_eq!(call("tan", &[0.0]).unwrap(), 0.0);
    }

    #[test]
    fn operators_guard_zero_divisors() {
        assert_eq!(div(&[1.0, 0.0]).unwrap_err(), DomainErrTyp::DivByZero);
        assert_eq!(rem(&[1.0, 0.0]).unwrap_err(), DomainErrTyp::DivByZero);
        assert_eq!(pow(&[0.0, -1.0]).unwrap_err(), DomainErrTyp::DivByZero);
        assert_eq!(pow(&[0.0, 0.0]).unwrap(), 1.0);
    }

    #[test]
    fn floored_modulo() {
        assert_eq!(rem(&[7.0, 3.0]).unwrap(), 1.0);
        assert_eq!(rem(&[-7.0, 3.0]).unwrap(), 2.0);
        assert_eq!(rem(&[7.0, -3.0]).unwrap(), -2.0);
    }

    #[test]
    fn non_finite_results_are_rejected() {
        let (_, fun) = OperatorTyp::Pow.fun();
        assert_eq!(fun.call(&[-8.0, 1.0 / 3.0]), Err(DomainErrTyp::NotFinite));
        assert!(call("exp", &[1000.0]).is_err());
    }

    #[test]
    fn suggests_similar_names() {
        assert_eq!(most_similar("sqr").map(|(name, _)| name), Some("sqrt"));
        assert_eq!(most_similar("zzzzzzzzzz").map(|(name, _)| name), None);
        // equally close to "sin" and "sinh"
        assert_eq!(most_similar("sinn").map(|(name, _)| name), Some("sin"));
    }
}
