// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm),
// with the output queue replaced by a stack of syntax trees

use crate::{
    eval::{Associativity, Fun, Ident, Idents, Node, NodeTyp, OperatorTyp},
    lex::{SubStr, Tok, TokTyp},
};
use core::fmt;
use std::sync::Arc;

pub const MAX_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseErrTyp {
    Empty,
    ParenMismatch,
    Unexpected(String),
    UnexpectedEnd,
    MissingCall {
        name: &'static str,
    },
    UnknownFunction {
        name: String,
    },
    Arity {
        name: &'static str,
        arity: usize,
        found: usize,
    },
    TooDeep,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty expression"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::Unexpected(tok) => write!(f, "unexpected '{tok}'"),
            Self::UnexpectedEnd => write!(f, "expression ends where an operand is expected"),
            Self::MissingCall { name } => {
                write!(f, "function '{name}' must be followed by '('")
            }
            Self::UnknownFunction { name } => write!(f, "unknown function '{name}'"),
            Self::Arity { name, arity, found } => write!(
                f,
                "function '{name}' requires {arity} argument{s}, but found {found}",
                s = if *arity == 1 { "" } else { "s" }
            ),
            Self::TooDeep => write!(
                f,
                "expression is too long or nested too deeply (limit {MAX_DEPTH} levels)"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

#[derive(Debug)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun {
        name: &'static str,
        fun: &'static Fun,
    },
    OpenParen,
    CallParen {
        commas: usize,
    },
}

#[derive(Debug)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

#[derive(Debug)]
struct Operand {
    node: Node,
    depth: usize,
}

#[derive(Debug, Default)]
struct Shunt {
    out: Vec<Operand>, // output
    ops: Vec<ShuntOp>, // operator stack
}

impl Shunt {
    fn push_node(&mut self, typ: NodeTyp, loc: SubStr, depth: usize) -> Result<(), ParseErr> {
        if depth > MAX_DEPTH {
            return Err(ParseErr {
                typ: ParseErrTyp::TooDeep,
                loc,
            });
        }
        self.out.push(Operand {
            node: Node { typ, loc },
            depth,
        });
        Ok(())
    }

    fn pop_operand(&mut self, loc: &SubStr) -> Result<Operand, ParseErr> {
        self.out.pop().ok_or_else(|| ParseErr {
            typ: ParseErrTyp::UnexpectedEnd,
            loc: loc.clone(),
        })
    }

    fn apply(&mut self, op: OperatorTyp, loc: SubStr) -> Result<(), ParseErr> {
        if op.arity() == 1 {
            let operand = self.pop_operand(&loc)?;
            let loc = loc.join(&operand.node.loc);
            let typ = NodeTyp::Unary {
                op,
                operand: Box::new(operand.node),
            };
            self.push_node(typ, loc, operand.depth + 1)
        } else {
            let rhs = self.pop_operand(&loc)?;
            let lhs = self.pop_operand(&loc)?;
            let loc = lhs.node.loc.join(&rhs.node.loc);
            let depth = lhs.depth.max(rhs.depth) + 1;
            let typ = NodeTyp::Binary {
                op,
                lhs: Box::new(lhs.node),
                rhs: Box::new(rhs.node),
            };
            self.push_node(typ, loc, depth)
        }
    }

    fn reduce_while<P>(&mut self, pred: P) -> Result<(), ParseErr>
    where
        P: Fn(OperatorTyp) -> bool,
    {
        loop {
            let o2 = match self.ops.last() {
                Some(ShuntOp {
                    typ: ShuntOpTyp::Operator(o2),
                    ..
                }) if pred(*o2) => *o2,
                _ => return Ok(()),
            };
            if let Some(op) = self.ops.pop() {
                self.apply(o2, op.loc)?;
            }
        }
    }

    fn unwind(&mut self) -> Result<Option<ShuntOp>, ParseErr> {
        while let Some(op) = self.ops.pop() {
            match op.typ {
                ShuntOpTyp::Operator(typ) => self.apply(typ, op.loc)?,
                _ => return Ok(Some(op)),
            }
        }
        Ok(None)
    }

    fn finish_call(&mut self, found: usize, close: &SubStr) -> Result<(), ParseErr> {
        let (name, fun, name_loc) = match self.ops.pop() {
            Some(ShuntOp {
                typ: ShuntOpTyp::Fun { name, fun },
                loc,
            }) => (name, fun, loc),
            _ => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc: close.clone(),
                })
            }
        };
        let loc = name_loc.join(close);
        if found != fun.arity {
            return Err(ParseErr {
                typ: ParseErrTyp::Arity {
                    name,
                    arity: fun.arity,
                    found,
                },
                loc,
            });
        }

        let split = self.out.len().checked_sub(found).ok_or_else(|| ParseErr {
            typ: ParseErrTyp::UnexpectedEnd,
            loc: loc.clone(),
        })?;
        let args = self.out.split_off(split);
        let depth = args.iter().map(|arg| arg.depth).max().unwrap_or(0) + 1;
        let typ = NodeTyp::Call {
            name,
            fun,
            args: args.into_iter().map(|arg| arg.node).collect(),
        };
        self.push_node(typ, loc, depth)
    }
}

fn unexpected(tok: &Tok) -> ParseErr {
    ParseErr {
        typ: ParseErrTyp::Unexpected(tok.typ.to_string()),
        loc: tok.loc.clone(),
    }
}

pub fn parse(toks: Vec<Tok>, idents: &'static Idents, src: &Arc<String>) -> Result<Node, ParseErr> {
    let mut shunt = Shunt::default();
    let mut toks = toks.into_iter().peekable();
    // operand and operator positions alternate
    let mut expect_operand = true;
    let mut opened_call = false;

    if toks.peek().is_none() {
        return Err(ParseErr {
            typ: ParseErrTyp::Empty,
            loc: SubStr::all(Arc::clone(src)),
        });
    }

    while let Some(tok) = toks.next() {
        let mut opens_call = false;

        match &tok.typ {
            TokTyp::Number(val) => {
                if !expect_operand {
                    return Err(unexpected(&tok));
                }
                shunt.push_node(NodeTyp::Literal(*val), tok.loc.clone(), 1)?;
                expect_operand = false;
            }

            TokTyp::Ident(name) => {
                if !expect_operand {
                    return Err(unexpected(&tok));
                }
                let calls = matches!(toks.peek(), Some(next) if next.typ == TokTyp::OpenParen);
                match idents.get_key_value(&**name) {
                    Some((key, Ident::Fun(fun))) => {
                        if !calls {
                            return Err(ParseErr {
                                typ: ParseErrTyp::MissingCall { name: *key },
                                loc: tok.loc.clone(),
                            });
                        }
                        shunt.ops.push(ShuntOp {
                            typ: ShuntOpTyp::Fun { name: *key, fun },
                            loc: tok.loc.clone(),
                        });
                    }
                    _ if calls => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::UnknownFunction {
                                name: name.to_string(),
                            },
                            loc: tok.loc.clone(),
                        });
                    }
                    _ => {
                        shunt.push_node(NodeTyp::Variable(name.to_string()), tok.loc.clone(), 1)?;
                        expect_operand = false;
                    }
                }
            }

            TokTyp::Op(o1) => {
                let o1 = *o1;
                if expect_operand {
                    // prefix position
                    match o1 {
                        OperatorTyp::Sub | OperatorTyp::Neg => shunt.ops.push(ShuntOp {
                            typ: ShuntOpTyp::Operator(OperatorTyp::Neg),
                            loc: tok.loc.clone(),
                        }),
                        OperatorTyp::Add => {}
                        _ => return Err(unexpected(&tok)),
                    }
                } else {
                    if o1 == OperatorTyp::Neg {
                        return Err(unexpected(&tok));
                    }
                    shunt.reduce_while(|o2| {
                        (o2.precedence() > o1.precedence())
                            || ((o1.precedence() == o2.precedence())
                                && (o1.associativity() == Associativity::Left))
                    })?;
                    shunt.ops.push(ShuntOp {
                        typ: ShuntOpTyp::Operator(o1),
                        loc: tok.loc.clone(),
                    });
                    expect_operand = true;
                }
            }

            TokTyp::OpenParen => {
                if !expect_operand {
                    return Err(unexpected(&tok));
                }
                let typ = if let Some(ShuntOp {
                    typ: ShuntOpTyp::Fun { .. },
                    ..
                }) = shunt.ops.last()
                {
                    opens_call = true;
                    ShuntOpTyp::CallParen { commas: 0 }
                } else {
                    ShuntOpTyp::OpenParen
                };
                shunt.ops.push(ShuntOp {
                    typ,
                    loc: tok.loc.clone(),
                });
            }

            TokTyp::Comma => {
                if expect_operand {
                    return Err(unexpected(&tok));
                }
                match shunt.unwind()? {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::CallParen { commas },
                        loc,
                    }) => shunt.ops.push(ShuntOp {
                        typ: ShuntOpTyp::CallParen { commas: commas + 1 },
                        loc,
                    }),
                    _ => return Err(unexpected(&tok)),
                }
                expect_operand = true;
            }

            TokTyp::CloseParen => {
                let empty_call = expect_operand && opened_call;
                if expect_operand && !empty_call {
                    return Err(unexpected(&tok));
                }
                match shunt.unwind()? {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::OpenParen,
                        ..
                    }) => {}
                    Some(ShuntOp {
                        typ: ShuntOpTyp::CallParen { commas },
                        ..
                    }) => {
                        let found = if empty_call { 0 } else { commas + 1 };
                        shunt.finish_call(found, &tok.loc)?;
                    }
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc.clone(),
                        })
                    }
                }
                expect_operand = false;
            }

            TokTyp::Glyph(_)
            | TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => return Err(unexpected(&tok)),
        }

        opened_call = opens_call;
    }

    let end = SubStr::end_of(Arc::clone(src));
    if expect_operand {
        return Err(ParseErr {
            typ: ParseErrTyp::UnexpectedEnd,
            loc: end,
        });
    }

    if let Some(op) = shunt.unwind()? {
        return Err(ParseErr {
            typ: ParseErrTyp::ParenMismatch,
            loc: op.loc,
        });
    }

    match (shunt.out.pop(), shunt.out.is_empty()) {
        (Some(root), true) => Ok(root.node),
        _ => Err(ParseErr {
            typ: ParseErrTyp::UnexpectedEnd,
            loc: end,
        }),
    }
}
