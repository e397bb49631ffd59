// SPDX: CC0-1.0

use crate::{lex::SubStr, stdlib, Number};
use core::fmt;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Rem => 3,
            Self::Pow => 4,
            Self::Neg => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Rem => Left,
            Self::Pow => Right,
        }
    }

    pub const fn arity(&self) -> usize {
        match self {
            Self::Neg => 1,
            _ => 2,
        }
    }

    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "**",
        }
    }

    pub const fn fun(&self) -> (&'static str, Fun) {
        match self {
            Self::Neg => ("neg", Fun::new(1, stdlib::neg)),
            Self::Add => ("add", Fun::new(2, stdlib::add)),
            Self::Sub => ("sub", Fun::new(2, stdlib::sub)),
            Self::Mul => ("mul", Fun::new(2, stdlib::mul)),
            Self::Div => ("div", Fun::new(2, stdlib::div)),
            Self::Rem => ("rem", Fun::new(2, stdlib::rem)),
            Self::Pow => ("pow", Fun::new(2, stdlib::pow)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DomainErrTyp {
    DivByZero,
    OutOfDomain { arg: Number, domain: &'static str },
    NotNatural { arg: Number },
    NotFinite,
}

impl fmt::Display for DomainErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivByZero => write!(f, "division by zero"),
            Self::OutOfDomain { arg, domain } => {
                write!(f, "argument {arg} is outside the domain {domain}")
            }
            Self::NotNatural { arg } => {
                write!(f, "argument {arg} is not a non-negative integer")
            }
            Self::NotFinite => write!(f, "result is not a finite real number"),
        }
    }
}

pub type FunResult = Result<Number, DomainErrTyp>;

#[derive(Debug)]
pub struct Fun {
    pub arity: usize,
    pub fun: fn(&[Number]) -> FunResult,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> FunResult) -> Self {
        Self { arity, fun }
    }

    pub fn call(&self, args: &[Number]) -> FunResult {
        let val = (self.fun)(args)?;
        if val.is_finite() {
            Ok(val)
        } else {
            Err(DomainErrTyp::NotFinite)
        }
    }
}

#[derive(Debug)]
pub enum Ident {
    Const(Number),
    Fun(Fun),
}

pub type Idents = HashMap<&'static str, Ident>;

#[derive(Debug)]
pub enum NodeTyp {
    Literal(Number),
    Variable(String),
    Unary {
        op: OperatorTyp,
        operand: Box<Node>,
    },
    Binary {
        op: OperatorTyp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        name: &'static str,
        fun: &'static Fun,
        args: Vec<Node>,
    },
}

#[derive(Debug)]
pub struct Node {
    pub typ: NodeTyp,
    pub loc: SubStr,
}

impl Node {
    // Visits every variable that is not a constant of `idents`.
    pub fn free_variables<'n>(&'n self, idents: &Idents, out: &mut Vec<&'n Node>) {
        match &self.typ {
            NodeTyp::Literal(_) => {}
            NodeTyp::Variable(name) => {
                if !matches!(idents.get(name.as_str()), Some(Ident::Const(_))) {
                    out.push(self);
                }
            }
            NodeTyp::Unary { operand, .. } => operand.free_variables(idents, out),
            NodeTyp::Binary { lhs, rhs, .. } => {
                lhs.free_variables(idents, out);
                rhs.free_variables(idents, out);
            }
            NodeTyp::Call { args, .. } => {
                for arg in args {
                    arg.free_variables(idents, out);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            NodeTyp::Literal(val) => write!(f, "{val}"),
            NodeTyp::Variable(name) => write!(f, "{name}"),
            NodeTyp::Unary { op, operand } => write!(f, "({}{operand})", op.symbol()),
            NodeTyp::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            NodeTyp::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum EvalErrTyp {
    UnboundVariable { name: String },
    ReservedVariable { name: String },
    Domain { name: &'static str, err: DomainErrTyp },
}

impl fmt::Display for EvalErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundVariable { name } => write!(f, "unbound variable '{name}'"),
            Self::ReservedVariable { name } => write!(
                f,
                "'{name}' names a built-in function or constant and cannot be the free variable"
            ),
            Self::Domain { name, err } => write!(f, "'{name}': {err}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub loc: SubStr,
}

impl EvalErr {
    pub const fn is_domain(&self) -> bool {
        matches!(self.typ, EvalErrTyp::Domain { .. })
    }
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typ)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode<'a> {
    Numeric,
    Sampling(&'a str),
}

#[derive(Debug)]
pub enum Evaluated<'n> {
    Value(Number),
    Function(Sampler<'n>),
}

#[derive(Debug, Clone, Copy)]
pub struct Sampler<'n> {
    node: &'n Node,
    var: &'n str,
    idents: &'static Idents,
}

impl Sampler<'_> {
    pub fn variable(&self) -> &str {
        self.var
    }

    pub fn call(&self, x: Number) -> Result<Number, EvalErr> {
        reduce(self.node, self.idents, Some((self.var, x)))
    }
}

pub fn evaluate<'n>(node: &'n Node, mode: Mode<'n>) -> Result<Evaluated<'n>, EvalErr> {
    match mode {
        Mode::Numeric => eval_numeric(node).map(Evaluated::Value),
        Mode::Sampling(var) => compile_sampler(node, var).map(Evaluated::Function),
    }
}

pub fn eval_numeric(node: &Node) -> Result<Number, EvalErr> {
    reduce(node, stdlib::idents(), None)
}

pub fn compile_sampler<'n>(node: &'n Node, var: &'n str) -> Result<Sampler<'n>, EvalErr> {
    let idents = stdlib::idents();
    if idents.contains_key(var) {
        return Err(EvalErr {
            typ: EvalErrTyp::ReservedVariable {
                name: var.to_string(),
            },
            loc: node.loc.clone(),
        });
    }

    let mut free = Vec::new();
    node.free_variables(idents, &mut free);
    if let Some(other) = free
        .into_iter()
        .find(|n| !matches!(&n.typ, NodeTyp::Variable(name) if name == var))
    {
        return Err(unbound(other));
    }

    Ok(Sampler { node, var, idents })
}

fn unbound(node: &Node) -> EvalErr {
    let name = match &node.typ {
        NodeTyp::Variable(name) => name.clone(),
        _ => node.loc.get().to_string(),
    };
    EvalErr {
        typ: EvalErrTyp::UnboundVariable { name },
        loc: node.loc.clone(),
    }
}

fn reduce(node: &Node, idents: &Idents, binding: Option<(&str, Number)>) -> Result<Number, EvalErr> {
    fn apply(node: &Node, name: &'static str, fun: &Fun, args: &[Number]) -> Result<Number, EvalErr> {
        fun.call(args).map_err(|err| EvalErr {
            typ: EvalErrTyp::Domain { name, err },
            loc: node.loc.clone(),
        })
    }

    match &node.typ {
        NodeTyp::Literal(val) => Ok(*val),

        NodeTyp::Variable(name) => match (idents.get(name.as_str()), binding) {
            (Some(Ident::Const(val)), _) => Ok(*val),
            (_, Some((var, val))) if var == name => Ok(val),
            _ => Err(unbound(node)),
        },

        NodeTyp::Unary { op, operand } => {
            let x = reduce(operand, idents, binding)?;
            let (name, fun) = op.fun();
            apply(node, name, &fun, &[x])
        }

        NodeTyp::Binary { op, lhs, rhs } => {
            let x = reduce(lhs, idents, binding)?;
            let y = reduce(rhs, idents, binding)?;
            let (name, fun) = op.fun();
            apply(node, name, &fun, &[x, y])
        }

        NodeTyp::Call { name, fun, args } => {
            let args = args
                .iter()
                .map(|arg| reduce(arg, idents, binding))
                .collect::<Result<Vec<Number>, _>>()?;
            apply(node, name, fun, &args)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize, parse, AngleMode};

    fn build(src: &str) -> Node {
        let norm = normalize::normalize(src, AngleMode::Radians, "0").unwrap();
        parse::parse(norm.toks, stdlib::idents(), &norm.src).unwrap()
    }

    #[test]
    fn numeric_mode_reduces_tree() {
        assert_eq!(eval_numeric(&build("1 + 2 * 3")).unwrap(), 7.0);
        assert_eq!(eval_numeric(&build("abs(-3) + factorial(4)")).unwrap(), 27.0);
    }

    #[test]
    fn constants_resolve_in_numeric_mode() {
        let val = eval_numeric(&build("pi")).unwrap();
        assert_eq!(val, core::f64::consts::PI);
    }

    #[test]
    fn numeric_mode_rejects_variables() {
        let err = eval_numeric(&build("x + 1")).unwrap_err();
        assert_eq!(
            err.typ,
            EvalErrTyp::UnboundVariable {
                name: String::from("x")
            }
        );
        assert_eq!(err.loc.get(), "x");
    }

    #[test]
    fn domain_errors_carry_operator_name() {
        let err = eval_numeric(&build("3 / (1 - 1)")).unwrap_err();
        assert_eq!(
            err.typ,
            EvalErrTyp::Domain {
                name: "div",
                err: DomainErrTyp::DivByZero
            }
        );
        assert!(err.is_domain());
    }

    #[test]
    fn overflow_is_a_domain_error() {
        let err = eval_numeric(&build("10 ** 400")).unwrap_err();
        assert!(matches!(
            err.typ,
            EvalErrTyp::Domain {
                err: DomainErrTyp::NotFinite,
                ..
            }
        ));
    }

    #[test]
    fn sampler_binds_only_its_variable() {
        let node = build("x ** 2 + 1");
        let sampler = compile_sampler(&node, "x").unwrap();
        assert_eq!(sampler.call(3.0).unwrap(), 10.0);
        assert_eq!(sampler.call(-1.0).unwrap(), 2.0);

        let node = build("x + y");
        let err = compile_sampler(&node, "x").unwrap_err();
        assert_eq!(
            err.typ,
            EvalErrTyp::UnboundVariable {
                name: String::from("y")
            }
        );
    }

    #[test]
    fn sampler_rejects_reserved_names() {
        let node = build("2 * e");
        let err = compile_sampler(&node, "e").unwrap_err();
        assert!(matches!(err.typ, EvalErrTyp::ReservedVariable { .. }));
    }

    #[test]
    fn evaluate_dispatches_on_mode() {
        let node = build("2 * 3");
        assert!(matches!(
            evaluate(&node, Mode::Numeric).unwrap(),
            Evaluated::Value(val) if val == 6.0
        ));

        let node = build("2x");
        match evaluate(&node, Mode::Sampling("x")).unwrap() {
            Evaluated::Function(f) => {
                assert_eq!(f.variable(), "x");
                assert_eq!(f.call(4.0).unwrap(), 8.0);
            }
            Evaluated::Value(_) => panic!("expected a function"),
        }
    }

    #[test]
    fn display_is_fully_parenthesized() {
        assert_eq!(build("4÷2×3^2").to_string(), "((4 / 2) * (3 ** 2))");
        assert_eq!(build("-x^2").to_string(), "((-x) ** 2)");
        assert_eq!(build("log(100)").to_string(), "log10(100)");
    }
}
