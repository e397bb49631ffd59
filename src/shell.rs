// SPDX: CC0-1.0

use crate::{
    eval::{EvalErrTyp, Ident},
    lex::{LexErrTyp, SubStr},
    normalize::{self, NormErrTyp},
    parse::{self, ParseErrTyp},
    stdlib, AngleMode, CalcErr, LastAnswer,
};
use anyhow::Context;
use core::fmt;
use std::{
    io::{self, stdin, BufRead, Write},
    sync::Arc,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Calc,
    SetExpr,
    PrintProg,
    Plot,
    SetWin,
    Angle,
    History,
}

impl Command {
    pub const fn exhaustive() -> &'static [Command] {
        &[
            Self::Help,
            Self::Quit,
            Self::Calc,
            Self::SetExpr,
            Self::Plot,
            Self::SetWin,
            Self::Angle,
            Self::History,
            Self::PrintProg,
        ]
    }

    pub const fn help(&self) -> &'static str {
        match self {
            Self::Help => "display help for each command",
            Self::Quit => "quit the shell",
            Self::Calc => "evaluate an expression (ANS is the previous answer)",
            Self::SetExpr => "set expression to graph",
            Self::PrintProg => "print normalized tokens and syntax tree of the expression",
            Self::Plot => "plot graph of expression that has been set",
            Self::SetWin => "set window parameters",
            Self::Angle => "toggle between degrees and radians",
            Self::History => "list recent calculations, newest first",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Quit => "quit",
            Self::Calc => "calc",
            Self::SetExpr => "set",
            Self::PrintProg => "prog",
            Self::Plot => "plot",
            Self::SetWin => "window",
            Self::Angle => "angle",
            Self::History => "history",
        }
    }
}

impl core::str::FromStr for Command {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::exhaustive()
            .iter()
            .find(|c| c.name() == s)
            .copied()
            .ok_or(())
    }
}

pub fn input<W: Write>(out: W, prompt: impl fmt::Display) -> anyhow::Result<String> {
    fn inner<W: Write>(mut out: W, prompt: impl fmt::Display) -> io::Result<String> {
        write!(out, "{prompt}")?;
        out.flush()?;
        let mut stdin = stdin().lock();
        let mut s = String::new();
        stdin.read_line(&mut s)?;
        Ok(s.trim().to_string())
    }

    let s = inner(out, prompt).context("read from standard input failed")?;
    Ok(s)
}

pub fn read_fromstr<W: Write, T: core::str::FromStr>(
    mut out: W,
    prompt: impl fmt::Display,
    ignore_empty: bool,
) -> anyhow::Result<Result<Option<T>, <T as core::str::FromStr>::Err>>
where
    <T as core::str::FromStr>::Err: fmt::Display,
{
    let input = Arc::new(input(&mut out, prompt)?);
    if ignore_empty && input.is_empty() {
        return Ok(Ok(None));
    }
    match input.parse::<T>() {
        Ok(new) => Ok(Ok(Some(new))),
        Err(err) => {
            writeln!(out)?;
            underline(&mut out, &SubStr::all(input))?;
            writeln!(out, "parse error: {err}")?;
            Ok(Err(err))
        }
    }
}

pub fn underline<W: Write>(mut out: W, span: &SubStr) -> io::Result<()> {
    // NOTE(unicode): columns are chars, which is right for the glyphs we accept
    let (col, width) = span.columns();
    writeln!(out, "{}", span.src())?;
    writeln!(out, "{}{}", " ".repeat(col), "^".repeat(width.max(1)))?;
    Ok(())
}

pub fn dump_program<W: Write>(
    mut out: W,
    expr: &str,
    angle: AngleMode,
    ans: &LastAnswer,
) -> io::Result<()> {
    let norm = match normalize::normalize(expr, angle, ans.get()) {
        Ok(norm) => norm,
        Err(err) => return report(&mut out, &err.into()),
    };

    writeln!(out, "source: {}", norm.src)?;
    writeln!(out, "tokens: ")?;
    if norm.toks.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for tok in &norm.toks {
        writeln!(out, "  {typ}\t{text:?}", typ = tok.typ, text = tok.loc.get())?;
    }

    match parse::parse(norm.toks, stdlib::idents(), &norm.src) {
        Ok(node) => writeln!(out, "tree: {node}"),
        Err(err) => report(&mut out, &err.into()),
    }
}

pub fn expr_undefined<W: Write>(mut out: W) -> io::Result<()> {
    writeln!(out, "error: no expression is defined")
}

pub fn report<W: Write>(mut out: W, err: &CalcErr) -> io::Result<()> {
    writeln!(out)?;
    underline(&mut out, err.loc())?;
    writeln!(out, "{stage} error: {err}", stage = err.stage())?;

    match err {
        CalcErr::Norm(err) => match &err.typ {
            NormErrTyp::Lex(LexErrTyp::InvalidChar) => writeln!(
                out,
                "note: available tokens are numbers, alphabetic identifiers, and symbols +-*/%,()|"
            )?,
            NormErrTyp::Lex(LexErrTyp::Unsupported(chr)) => match chr {
                '<' | '>' => writeln!(out, "note: expected an expression but found an inequality")?,
                '=' => writeln!(out, "note: expected an expression but found an equation")?,
                _ => writeln!(out, "note: use parentheses for grouping")?,
            },
            NormErrTyp::Lex(LexErrTyp::ParseNum(_)) => {
                writeln!(out, "note: parsing as floating point number")?
            }
            NormErrTyp::Lex(LexErrTyp::NumTooLarge) => {}
            NormErrTyp::UnmatchedBar => {
                writeln!(out, "note: absolute value bars must come in pairs")?
            }
        },

        CalcErr::Parse(err) => match &err.typ {
            ParseErrTyp::UnknownFunction { name } => suggest(&mut out, name)?,
            ParseErrTyp::MissingCall { name } => {
                writeln!(out, "note: write '{name}(...)' to call it")?
            }
            ParseErrTyp::Empty
            | ParseErrTyp::ParenMismatch
            | ParseErrTyp::Unexpected(_)
            | ParseErrTyp::UnexpectedEnd
            | ParseErrTyp::Arity { .. }
            | ParseErrTyp::TooDeep => {}
        },

        CalcErr::Eval(err) => match &err.typ {
            EvalErrTyp::UnboundVariable { name } => suggest(&mut out, name)?,
            EvalErrTyp::ReservedVariable { .. } | EvalErrTyp::Domain { .. } => {}
        },
    }

    Ok(())
}

fn suggest<W: Write>(mut out: W, name: &str) -> io::Result<()> {
    if let Some((key, ident)) = stdlib::most_similar(name) {
        let ident_typ = match ident {
            Ident::Const(_) => "constant",
            Ident::Fun(_) => "function",
        };
        writeln!(out, "note: {ident_typ} '{key}' has a similar name")?;
    }
    Ok(())
}
