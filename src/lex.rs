// SPDX: CC0-1.0

use crate::{eval::OperatorTyp, Number};
use core::{fmt, iter::Peekable, num::ParseFloatError, str::CharIndices};
use std::{borrow::Cow, sync::Arc};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize, // in bytes
    len: usize,   // in bytes
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    #[inline]
    pub fn end_of(src: Arc<String>) -> Self {
        let start = src.len();
        Self::new(src, start, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    // Column and width of the span counted in characters, for underlining.
    pub fn columns(&self) -> (usize, usize) {
        let col = self.src[..self.start].chars().count();
        let width = self.get().chars().count();
        (col, width)
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }

    // Smallest span covering both `self` and `other` (same source).
    pub fn join(&self, other: &Self) -> Self {
        let start = self.start.min(other.start);
        let end = (self.start + self.len).max(other.start + other.len);
        Self::new(self.src(), start, end - start)
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

// Calculator keypad glyphs. They only exist between lexing and the first
// normalization rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Glyph {
    Divide,
    Times,
    Dot,
    Minus,
    Caret,
    SquareRoot,
    CubeRoot,
    Pi,
    PlusMinus,
    Bar,
}

impl Glyph {
    pub const fn from_char(chr: char) -> Option<Self> {
        Some(match chr {
            '÷' => Self::Divide,
            '×' => Self::Times,
            '·' => Self::Dot,
            '−' => Self::Minus,
            '^' => Self::Caret,
            '√' => Self::SquareRoot,
            '∛' => Self::CubeRoot,
            'π' => Self::Pi,
            '±' => Self::PlusMinus,
            '|' => Self::Bar,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokTyp {
    Ident(Cow<'static, str>),
    Number(Number),
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,
    Glyph(Glyph),

    // unsupported tokens
    XGreater,
    XLess,
    XEqual,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident(_)
            | Self::Number(_)
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen
            | Self::Glyph(_) => false,

            // unsupported tokens
            Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    pub fn ident(&self) -> Option<&str> {
        match self {
            Self::Ident(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TokTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Number(val) => write!(f, "{val}"),
            Self::Op(op) => write!(f, "{}", op.symbol()),
            Self::Comma => write!(f, ","),
            Self::OpenParen => write!(f, "("),
            Self::CloseParen => write!(f, ")"),
            Self::Glyph(glyph) => write!(f, "{glyph:?}"),
            Self::XGreater => write!(f, ">"),
            Self::XLess => write!(f, "<"),
            Self::XEqual => write!(f, "="),
            Self::XOpenSquareBracket => write!(f, "["),
            Self::XCloseSquareBracket => write!(f, "]"),
            Self::XOpenCurly => write!(f, "{{"),
            Self::XCloseCurly => write!(f, "}}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

impl Tok {
    pub fn synthetic(typ: TokTyp, loc: &SubStr) -> Self {
        Self {
            typ,
            loc: loc.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(char),
    ParseNum(ParseFloatError),
    NumTooLarge,
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(chr) => write!(f, "unsupported character '{chr}'"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::NumTooLarge => write!(f, "number is too large"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for LexErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            has_errored: false,
        }
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn loc(&self, start: usize, len: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, len)
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '-' => TokTyp::Op(OperatorTyp::Sub),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '%' => TokTyp::Op(OperatorTyp::Rem),
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,

            '>' => TokTyp::XGreater,
            '<' => TokTyp::XLess,
            '=' => TokTyp::XEqual,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,
            '{' => TokTyp::XOpenCurly,
            '}' => TokTyp::XCloseCurly,
            _ => TokTyp::Glyph(Glyph::from_char(chr)?),
        };
        self.cur.next(); // consume because we only peeked
        Some(Tok {
            typ,
            loc: self.loc(idx, chr.len_utf8()),
        })
    }

    pub fn consume_by<P>(&mut self, next_idx: usize, predicate: P) -> Option<SubStr>
    where
        P: Fn(char) -> bool,
    {
        let mut loc = self.loc(next_idx, 0);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                loc.shift_right(chr.len_utf8());
                self.cur.next();
            } else {
                break;
            }
        }
        if loc.is_empty() {
            None
        } else {
            Some(loc)
        }
    }

    fn fail(&mut self, typ: LexErrTyp, loc: SubStr) -> Option<Result<Tok, LexErr>> {
        self.has_errored = true;
        Some(Err(LexErr { typ, loc }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;

        if next_chr == '*' {
            // either multiplication or power
            self.cur.next();
            let (typ, len) = if let Some((_, '*')) = self.cur.peek() {
                self.cur.next();
                (OperatorTyp::Pow, 2)
            } else {
                (OperatorTyp::Mul, 1)
            };
            return Some(Ok(Tok {
                typ: TokTyp::Op(typ),
                loc: self.loc(next_idx, len),
            }));
        }

        if let Some(tok) = self.consume_unambiguous() {
            if tok.typ.is_unsupported() {
                return self.fail(LexErrTyp::Unsupported(next_chr), tok.loc);
            }
            return Some(Ok(tok));
        }

        // parse identifiers
        if let Some(loc) = self.consume_by(next_idx, |chr| chr.is_ascii_alphabetic()) {
            let name = Cow::Owned(loc.get().to_string());
            return Some(Ok(Tok {
                typ: TokTyp::Ident(name),
                loc,
            }));
        }

        // parse numbers
        if let Some(loc) = self.consume_by(next_idx, |chr| chr.is_ascii_digit() || chr == '.') {
            return match loc.get().parse::<Number>() {
                Ok(val) if val.is_finite() => Some(Ok(Tok {
                    typ: TokTyp::Number(val),
                    loc,
                })),
                Ok(_) => self.fail(LexErrTyp::NumTooLarge, loc),
                Err(err) => self.fail(LexErrTyp::ParseNum(err), loc),
            };
        }

        let loc = self.loc(next_idx, next_chr.len_utf8());
        self.fail(LexErrTyp::InvalidChar, loc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Result<Vec<TokTyp>, LexErr> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src)
            .map(|tok| tok.map(|tok| tok.typ))
            .collect()
    }

    #[test]
    fn numbers_idents_and_operators() {
        assert_eq!(
            lex("12.5*x ** 2").unwrap(),
            vec![
                TokTyp::Number(12.5),
                TokTyp::Op(OperatorTyp::Mul),
                TokTyp::Ident("x".into()),
                TokTyp::Op(OperatorTyp::Pow),
                TokTyp::Number(2.0),
            ]
        );
    }

    #[test]
    fn identifier_run_stops_at_digit() {
        assert_eq!(
            lex("sqrt4").unwrap(),
            vec![TokTyp::Ident("sqrt".into()), TokTyp::Number(4.0)]
        );
    }

    #[test]
    fn glyphs_are_kept_for_normalization() {
        assert_eq!(
            lex("4÷2×π").unwrap(),
            vec![
                TokTyp::Number(4.0),
                TokTyp::Glyph(Glyph::Divide),
                TokTyp::Number(2.0),
                TokTyp::Glyph(Glyph::Times),
                TokTyp::Glyph(Glyph::Pi),
            ]
        );
    }

    #[test]
    fn glyph_spans_are_byte_accurate() {
        let src = Arc::new(String::from("1÷2"));
        let toks: Vec<Tok> = Lexer::new(&src).collect::<Result<_, _>>().unwrap();
        assert_eq!(toks[1].loc.get(), "÷");
        assert_eq!(toks[2].loc.get(), "2");
        assert_eq!(toks[2].loc.columns(), (2, 1));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = lex("2 $ 3").unwrap_err();
        assert_eq!(err.typ, LexErrTyp::InvalidChar);
        assert_eq!(err.loc.get(), "$");

        let err = lex("x = 3").unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported('='));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(matches!(
            lex("1.2.3").unwrap_err().typ,
            LexErrTyp::ParseNum(_)
        ));
        let huge = "9".repeat(400);
        assert_eq!(lex(&huge).unwrap_err().typ, LexErrTyp::NumTooLarge);
    }

    #[test]
    fn stops_after_error() {
        let src = Arc::new(String::from("$ 1"));
        let mut lexer = Lexer::new(&src);
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }
}
