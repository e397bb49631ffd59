// SPDX: CC0-1.0

// Rewrites calculator notation into the canonical token stream accepted by
// the parser.

use crate::{
    eval::OperatorTyp,
    lex::{Glyph, LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    stdlib, AngleMode,
};
use core::fmt;
use std::{borrow::Cow, sync::Arc};

pub const ANS: &str = "ANS";

const ALIASES: [(&str, &str); 6] = [
    ("log", "log10"),
    ("deg", "degrees"),
    ("rad", "radians"),
    ("arcsin", "asin"),
    ("arccos", "acos"),
    ("arctan", "atan"),
];

const SHORTHANDS: [(&str, &str); 1] = [("fact", "factorial")];

const FORWARD_TRIG: [&str; 3] = ["sin", "cos", "tan"];
const INVERSE_TRIG: [&str; 3] = ["asin", "acos", "atan"];
const CONVERSIONS: [&str; 2] = ["degrees", "radians"];

pub type Rule = fn(&mut Vec<Tok>, AngleMode) -> Result<(), NormErr>;

pub const RULES: [(&str, Rule); 4] = [
    ("glyphs", replace_glyphs),
    ("implicit multiplication", insert_implicit_mul),
    ("angle mode", apply_angle_mode),
    ("shorthand", translate_shorthand),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormErrTyp {
    Lex(LexErrTyp),
    UnmatchedBar,
}

impl fmt::Display for NormErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(err) => write!(f, "{err}"),
            Self::UnmatchedBar => write!(f, "absolute value bar is never closed"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormErr {
    pub typ: NormErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for NormErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

impl From<LexErr> for NormErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: NormErrTyp::Lex(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Debug)]
pub struct Normalized {
    pub src: Arc<String>,
    pub toks: Vec<Tok>,
}

impl fmt::Display for Normalized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tok) in self.toks.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", tok.typ)?;
        }
        Ok(())
    }
}

pub fn normalize(raw: &str, angle: AngleMode, ans: &str) -> Result<Normalized, NormErr> {
    let src = Arc::new(substitute_answer(raw, ans));
    let mut toks = tokenize(&src)?;
    for (_, rule) in RULES {
        rule(&mut toks, angle)?;
    }
    Ok(Normalized { src, toks })
}

// Parenthesized so that a negative answer stays one operand (`2ANS`).
pub fn substitute_answer(raw: &str, ans: &str) -> String {
    raw.replace(ANS, &format!("({ans})"))
}

pub fn tokenize(src: &Arc<String>) -> Result<Vec<Tok>, NormErr> {
    Lexer::new(src)
        .map(|tok| tok.map_err(NormErr::from))
        .collect()
}

fn is_callable(name: &str) -> bool {
    stdlib::is_fun(name) || SHORTHANDS.iter().any(|(from, _)| *from == name)
}

fn ends_value(typ: &TokTyp) -> bool {
    match typ {
        TokTyp::Number(_) | TokTyp::CloseParen => true,
        TokTyp::Ident(name) => !is_callable(name),
        _ => false,
    }
}

fn starts_value(typ: &TokTyp) -> bool {
    matches!(
        typ,
        TokTyp::Number(_) | TokTyp::Ident(_) | TokTyp::OpenParen
    )
}

fn needs_mul(lhs: &TokTyp, rhs: &TokTyp) -> bool {
    match (lhs, rhs) {
        (TokTyp::Number(_), TokTyp::Number(_)) => false,
        // `foo(2)` must stay a call so it can be reported as unknown
        (TokTyp::Ident(name), TokTyp::OpenParen) => {
            !is_callable(name) && (stdlib::is_const(name) || name.chars().count() == 1)
        }
        _ => ends_value(lhs) && starts_value(rhs),
    }
}

fn matching_paren(toks: &[Tok], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, tok) in toks.iter().enumerate().skip(open) {
        match tok.typ {
            TokTyp::OpenParen => depth += 1,
            TokTyp::CloseParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_conversion(tok: &Tok) -> bool {
    tok.typ
        .ident()
        .map_or(false, |name| CONVERSIONS.contains(&name))
}

// inserted tokens carry the span of the trig name they wrap, so only a
// conversion spelled out in the source counts as already converting
fn is_written_conversion(tok: &Tok) -> bool {
    let text = tok.loc.get();
    let spelled = CONVERSIONS.contains(&text)
        || ALIASES
            .iter()
            .any(|(from, to)| *from == text && CONVERSIONS.contains(to));
    spelled && is_conversion(tok)
}

fn is_conversion_call(toks: &[Tok], start: usize, close: usize) -> bool {
    start + 1 < close
        && is_written_conversion(&toks[start])
        && toks[start + 1].typ == TokTyp::OpenParen
        && matching_paren(toks, start + 1) == Some(close - 1)
}

fn ident(name: &'static str) -> TokTyp {
    TokTyp::Ident(Cow::Borrowed(name))
}

// Rule 1: keypad glyphs become operators and identifiers; identifier
// aliases are resolved on whole tokens, so `ln` and `log` never collide.
pub fn replace_glyphs(toks: &mut Vec<Tok>, _: AngleMode) -> Result<(), NormErr> {
    for tok in toks.iter_mut() {
        let typ = match &tok.typ {
            TokTyp::Glyph(glyph) => match glyph {
                Glyph::Divide => TokTyp::Op(OperatorTyp::Div),
                Glyph::Times | Glyph::Dot => TokTyp::Op(OperatorTyp::Mul),
                Glyph::Minus => TokTyp::Op(OperatorTyp::Sub),
                Glyph::Caret => TokTyp::Op(OperatorTyp::Pow),
                Glyph::SquareRoot => ident("sqrt"),
                Glyph::CubeRoot => ident("cbrt"),
                Glyph::Pi => ident("pi"),
                // handled with the shorthands
                Glyph::PlusMinus | Glyph::Bar => continue,
            },
            TokTyp::Ident(name) => {
                let name: &str = name;
                match ALIASES.iter().find(|(from, _)| *from == name) {
                    Some((_, to)) => ident(*to),
                    None => continue,
                }
            }
            _ => continue,
        };
        tok.typ = typ;
    }
    Ok(())
}

// Rule 2: `2x`, `3(4)`, `2pi`, `(1)(2)`, `(1)x` get an explicit `*`.
pub fn insert_implicit_mul(toks: &mut Vec<Tok>, _: AngleMode) -> Result<(), NormErr> {
    let mut out: Vec<Tok> = Vec::with_capacity(toks.len());
    for tok in toks.drain(..) {
        let mul = out
            .last()
            .map_or(false, |prev| needs_mul(&prev.typ, &tok.typ));
        if mul {
            out.push(Tok::synthetic(TokTyp::Op(OperatorTyp::Mul), &tok.loc));
        }
        out.push(tok);
    }
    *toks = out;
    Ok(())
}

// Rule 3: in degree mode, forward trig takes its argument through
// `radians(..)` and inverse trig hands its result through `degrees(..)`,
// unless the user already wrote the conversion.
pub fn apply_angle_mode(toks: &mut Vec<Tok>, angle: AngleMode) -> Result<(), NormErr> {
    if angle == AngleMode::Radians {
        return Ok(());
    }

    let mut i = 0;
    while i < toks.len() {
        let (forward, inverse) = match toks[i].typ.ident() {
            Some(name) => (FORWARD_TRIG.contains(&name), INVERSE_TRIG.contains(&name)),
            None => (false, false),
        };
        let opens_call = matches!(toks.get(i + 1), Some(tok) if tok.typ == TokTyp::OpenParen);
        // unbalanced calls are left alone for the parser to report
        let close = match (opens_call, matching_paren(toks, i + 1)) {
            (true, Some(close)) if forward || inverse => close,
            _ => {
                i += 1;
                continue;
            }
        };
        let loc = toks[i].loc.clone();

        if forward {
            let start = i + 2;
            if start < close && !is_conversion_call(toks, start, close) {
                toks.insert(close, Tok::synthetic(TokTyp::CloseParen, &loc));
                toks.insert(start, Tok::synthetic(TokTyp::OpenParen, &loc));
                toks.insert(start, Tok::synthetic(ident("radians"), &loc));
            }
        } else {
            let wrapped = i >= 2
                && toks[i - 1].typ == TokTyp::OpenParen
                && is_written_conversion(&toks[i - 2])
                && matching_paren(toks, i - 1) == Some(close + 1);
            if !wrapped {
                toks.insert(close + 1, Tok::synthetic(TokTyp::CloseParen, &loc));
                toks.insert(i, Tok::synthetic(TokTyp::OpenParen, &loc));
                toks.insert(i, Tok::synthetic(ident("degrees"), &loc));
                i += 2;
            }
        }
        i += 1;
    }
    Ok(())
}

// Rule 4: `fact` becomes `factorial`, `|x|` becomes `abs(x)` and `±`
// becomes unary negation.
pub fn translate_shorthand(toks: &mut Vec<Tok>, angle: AngleMode) -> Result<(), NormErr> {
    let mut out: Vec<Tok> = Vec::with_capacity(toks.len());
    // paren depth at which each pending bar was opened
    let mut open_bars: Vec<(usize, SubStr)> = Vec::new();
    let mut depth = 0usize;

    for tok in toks.drain(..) {
        let typ = match tok.typ {
            TokTyp::Ident(name) => {
                let expanded = SHORTHANDS.iter().find(|(from, _)| *from == name);
                match expanded {
                    Some((_, to)) => ident(*to),
                    None => TokTyp::Ident(name),
                }
            }
            TokTyp::Glyph(Glyph::PlusMinus) => TokTyp::Op(OperatorTyp::Neg),
            TokTyp::Glyph(Glyph::Bar) => {
                let closes = matches!(open_bars.last(), Some((d, _)) if *d == depth)
                    && out.last().map_or(false, |prev| ends_value(&prev.typ));
                if closes {
                    open_bars.pop();
                    out.push(Tok {
                        typ: TokTyp::CloseParen,
                        loc: tok.loc,
                    });
                } else {
                    out.push(Tok::synthetic(ident("abs"), &tok.loc));
                    out.push(Tok::synthetic(TokTyp::OpenParen, &tok.loc));
                    open_bars.push((depth, tok.loc));
                }
                continue;
            }
            TokTyp::OpenParen => {
                depth += 1;
                TokTyp::OpenParen
            }
            TokTyp::CloseParen => {
                depth = depth.saturating_sub(1);
                TokTyp::CloseParen
            }
            other => other,
        };
        out.push(Tok { typ, loc: tok.loc });
    }

    if let Some((_, loc)) = open_bars.pop() {
        return Err(NormErr {
            typ: NormErrTyp::UnmatchedBar,
            loc,
        });
    }

    *toks = out;
    // bars have just become parentheses: `2|x|` and `|x|y`
    insert_implicit_mul(toks, angle)
}
