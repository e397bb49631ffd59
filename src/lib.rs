// SPDX: CC0-1.0

pub mod eval;
pub mod history;
pub mod lex;
pub mod normalize;
pub mod parse;
pub mod shell;
pub mod stdlib;

use core::{fmt, num::NonZeroU16, ops::Range};
use eval::{EvalErr, EvalErrTyp, Node};
use lex::SubStr;
use normalize::{NormErr, NormErrTyp};
use parse::{ParseErr, ParseErrTyp};

pub type Number = f64;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AngleMode {
    Degrees,
    #[default]
    Radians,
}

impl AngleMode {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Degrees => Self::Radians,
            Self::Radians => Self::Degrees,
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees => write!(f, "degrees"),
            Self::Radians => write!(f, "radians"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LastAnswer(String);

impl Default for LastAnswer {
    fn default() -> Self {
        Self(String::from("0"))
    }
}

impl LastAnswer {
    pub fn get(&self) -> &str {
        &self.0
    }

    pub(crate) fn set(&mut self, val: Number) {
        self.0 = format_number(val);
    }
}

impl fmt::Display for LastAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn format_number(val: Number) -> String {
    if val == 0.0 {
        String::from("0")
    } else {
        val.to_string()
    }
}

#[derive(Clone, Debug)]
pub struct Window {
    pub x: Range<Number>,
    pub samples: NonZeroU16,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            x: -10.0..10.0,
            samples: NonZeroU16::new(1000).unwrap_or(NonZeroU16::MIN),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("x range", &self.x)
            .field("samples", &self.samples)
            .finish()
    }
}

// One point of a sampled curve; `y` is `None` where the function has no
// finite value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub x: Number,
    pub y: Option<Number>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub samples: Vec<Sample>,
    pub excluded: usize,
}

impl Curve {
    pub fn points(&self) -> impl Iterator<Item = (Number, Number)> + '_ {
        self.samples
            .iter()
            .filter_map(|sample| sample.y.map(|y| (sample.x, y)))
    }

    // Runs of consecutive finite samples; a renderer joins points within a
    // segment and leaves gaps between segments.
    pub fn segments(&self) -> impl Iterator<Item = &[Sample]> + '_ {
        self.samples
            .split(|sample| sample.y.is_none())
            .filter(|segment| !segment.is_empty())
    }

    // Vertical axis range over the finite samples, padded by a tenth of its
    // height on each side.
    pub fn y_range(&self) -> Option<Range<Number>> {
        let (min, max) = self
            .points()
            .fold(None, |acc: Option<(Number, Number)>, (_, y)| match acc {
                Some((min, max)) => Some((min.min(y), max.max(y))),
                None => Some((y, y)),
            })?;
        let pad = if max > min { 0.1 * (max - min) } else { 1.0 };
        Some(min - pad..max + pad)
    }
}

// Evaluates `f` at `window.samples` evenly spaced points spanning
// `window.x`, both ends included. `Ok(None)` from `f` marks a gap.
pub fn sample<F, FErr>(mut f: F, window: &Window) -> Result<Curve, FErr>
where
    F: FnMut(Number) -> Result<Option<Number>, FErr>,
{
    let count = window.samples.get();
    let step = if count > 1 {
        (window.x.end - window.x.start) / Number::from(count - 1)
    } else {
        0.0
    };

    let mut curve = Curve {
        samples: Vec::with_capacity(count.into()),
        excluded: 0,
    };
    for i in 0..count {
        let x = window.x.start + step * Number::from(i);
        let y = f(x)?.filter(|y| y.is_finite());
        if y.is_none() {
            curve.excluded += 1;
        }
        curve.samples.push(Sample { x, y });
    }
    Ok(curve)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SyntaxError,
    UnboundVariable,
    DomainError,
    UnknownFunction,
    ArityMismatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SyntaxError => write!(f, "syntax error"),
            Self::UnboundVariable => write!(f, "unbound variable"),
            Self::DomainError => write!(f, "domain error"),
            Self::UnknownFunction => write!(f, "unknown function"),
            Self::ArityMismatch => write!(f, "arity mismatch"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CalcErr {
    Norm(NormErr),
    Parse(ParseErr),
    Eval(EvalErr),
}

impl CalcErr {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Norm(err) => match err.typ {
                NormErrTyp::Lex(_) | NormErrTyp::UnmatchedBar => ErrorKind::SyntaxError,
            },
            Self::Parse(err) => match err.typ {
                ParseErrTyp::UnknownFunction { .. } => ErrorKind::UnknownFunction,
                ParseErrTyp::Arity { .. } => ErrorKind::ArityMismatch,
                ParseErrTyp::Empty
                | ParseErrTyp::ParenMismatch
                | ParseErrTyp::Unexpected(_)
                | ParseErrTyp::UnexpectedEnd
                | ParseErrTyp::MissingCall { .. }
                | ParseErrTyp::TooDeep => ErrorKind::SyntaxError,
            },
            Self::Eval(err) => match err.typ {
                EvalErrTyp::UnboundVariable { .. } => ErrorKind::UnboundVariable,
                EvalErrTyp::ReservedVariable { .. } => ErrorKind::SyntaxError,
                EvalErrTyp::Domain { .. } => ErrorKind::DomainError,
            },
        }
    }

    pub fn loc(&self) -> &SubStr {
        match self {
            Self::Norm(err) => &err.loc,
            Self::Parse(err) => &err.loc,
            Self::Eval(err) => &err.loc,
        }
    }

    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Norm(_) | Self::Parse(_) => "parse",
            Self::Eval(_) => "evaluation",
        }
    }
}

impl fmt::Display for CalcErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Norm(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Eval(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CalcErr {}

impl From<NormErr> for CalcErr {
    fn from(err: NormErr) -> Self {
        Self::Norm(err)
    }
}

impl From<ParseErr> for CalcErr {
    fn from(err: ParseErr) -> Self {
        Self::Parse(err)
    }
}

impl From<EvalErr> for CalcErr {
    fn from(err: EvalErr) -> Self {
        Self::Eval(err)
    }
}

pub fn compile(raw: &str, angle: AngleMode, ans: &LastAnswer) -> Result<Node, CalcErr> {
    let norm = normalize::normalize(raw, angle, ans.get())?;
    let node = parse::parse(norm.toks, stdlib::idents(), &norm.src)?;
    Ok(node)
}

pub fn evaluate_numeric(raw: &str, angle: AngleMode, ans: &mut LastAnswer) -> Result<Number, CalcErr> {
    let node = compile(raw, angle, ans)?;
    let val = eval::eval_numeric(&node)?;
    ans.set(val);
    Ok(val)
}

pub fn sample_function(
    raw: &str,
    var: &str,
    window: &Window,
    angle: AngleMode,
    ans: &LastAnswer,
) -> Result<Curve, CalcErr> {
    let node = compile(raw, angle, ans)?;
    let sampler = eval::compile_sampler(&node, var)?;
    let curve = sample(
        |x| match sampler.call(x) {
            Ok(y) => Ok(Some(y)),
            Err(err) if err.is_domain() => Ok(None),
            Err(err) => Err(err),
        },
        window,
    )?;
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: Number, end: Number, samples: u16) -> Window {
        Window {
            x: start..end,
            samples: NonZeroU16::new(samples).unwrap(),
        }
    }

    #[test]
    fn samples_span_both_ends() {
        let curve = sample(|x| Ok::<_, ()>(Some(x)), &window(-10.0, 10.0, 21)).unwrap();
        assert_eq!(curve.samples.len(), 21);
        assert_eq!(curve.samples[0].x, -10.0);
        assert_eq!(curve.samples[10].x, 0.0);
        assert_eq!(curve.samples[20].x, 10.0);
        assert_eq!(curve.excluded, 0);
    }

    #[test]
    fn single_sample_sits_at_start() {
        let curve = sample(|x| Ok::<_, ()>(Some(x)), &window(2.0, 5.0, 1)).unwrap();
        assert_eq!(curve.samples, vec![Sample { x: 2.0, y: Some(2.0) }]);
    }

    #[test]
    fn non_finite_samples_are_gaps() {
        let curve = sample(
            |x| Ok::<_, ()>(Some(if x == 0.0 { Number::INFINITY } else { x })),
            &window(-2.0, 2.0, 5),
        )
        .unwrap();
        assert_eq!(curve.excluded, 1);
        assert_eq!(curve.samples[2].y, None);
        let segments: Vec<usize> = curve.segments().map(<[Sample]>::len).collect();
        assert_eq!(segments, vec![2, 2]);
    }

    #[test]
    fn sampling_stops_at_first_hard_error() {
        let mut calls = 0;
        let res = sample(
            |x| {
                calls += 1;
                if x > 0.0 {
                    Err("boom")
                } else {
                    Ok(Some(x))
                }
            },
            &window(-1.0, 1.0, 3),
        );
        assert_eq!(res, Err("boom"));
        assert_eq!(calls, 3);
    }

    #[test]
    fn y_range_ignores_gaps() {
        let curve = Curve {
            samples: vec![
                Sample { x: 0.0, y: Some(-1.0) },
                Sample { x: 1.0, y: None },
                Sample { x: 2.0, y: Some(9.0) },
            ],
            excluded: 1,
        };
        assert_eq!(curve.y_range(), Some(-2.0..10.0));
        assert_eq!(Curve::default().y_range(), None);

        let flat = Curve {
            samples: vec![Sample { x: 0.0, y: Some(3.0) }],
            excluded: 0,
        };
        assert_eq!(flat.y_range(), Some(2.0..4.0));
    }

    #[test]
    fn last_answer_formatting() {
        let mut ans = LastAnswer::default();
        assert_eq!(ans.get(), "0");
        ans.set(-0.0);
        assert_eq!(ans.get(), "0");
        ans.set(2.5);
        assert_eq!(ans.get(), "2.5");
        ans.set(-3.0);
        assert_eq!(ans.to_string(), "-3");
    }

    #[test]
    fn error_kinds() {
        let ans = LastAnswer::default();
        let kind = |src: &str| compile(src, AngleMode::Radians, &ans).unwrap_err().kind();
        assert_eq!(kind("2 $"), ErrorKind::SyntaxError);
        assert_eq!(kind("|2"), ErrorKind::SyntaxError);
        assert_eq!(kind("(2"), ErrorKind::SyntaxError);
        assert_eq!(kind("nope(2)"), ErrorKind::UnknownFunction);
        assert_eq!(kind("sin(1, 2)"), ErrorKind::ArityMismatch);
    }

    #[test]
    fn angle_mode_toggles() {
        assert_eq!(AngleMode::default(), AngleMode::Radians);
        assert_eq!(AngleMode::Radians.toggled(), AngleMode::Degrees);
        assert_eq!(AngleMode::Degrees.toggled(), AngleMode::Radians);
    }
}
