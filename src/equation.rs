//! Rate Expressions
//!
//! This module holds the symbolic side of a reaction network. Rate laws are written as
//! plain arithmetic text (`"-k * A * E"`), tokenized by `meval` and lifted into a
//! [`RateExpr`] tree once. From there the tree can be:
//!
//! - summed with other contributions ([`RateExpr::add`])
//! - stripped of named constants ([`RateExpr::substitute`])
//! - folded where only numbers remain ([`RateExpr::simplify`])
//! - compiled into a [`CompiledRate`], a flat stack program taking positional arguments
//!
//! Compilation is the point where every remaining symbol must resolve to an argument
//! position. Anything left over is reported as [`EquationError::UnresolvedSymbol`].

use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

use meval::tokenizer::{Operation, Token};
use meval::Expr;
use thiserror::Error;

/// Errors raised while parsing or compiling rate expressions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquationError {
    #[error("Could not parse expression '{expression}': {message}")]
    Parse { expression: String, message: String },
    #[error("Unresolved symbol '{symbol}' in expression '{expression}'")]
    UnresolvedSymbol { symbol: String, expression: String },
    #[error("Unknown function '{name}' with {arity} argument(s)")]
    UnknownFunction { name: String, arity: usize },
    #[error("Unsupported operation in expression: {0}")]
    Unsupported(String),
    #[error("Malformed expression: {0}")]
    Malformed(String),
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            BinaryOp::Pow => a.powf(b),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
        }
    }
}

/// Functions that may appear in a rate law.
///
/// `log` is the natural logarithm, matching the usual convention of symbolic packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sqrt,
    Exp,
    Ln,
    Log10,
    Abs,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Floor,
    Ceil,
    Signum,
    Atan2,
    Min,
    Max,
}

impl Function {
    /// Looks up a function by name and argument count.
    pub fn resolve(name: &str, arity: usize) -> Option<Self> {
        let function = match name {
            "sqrt" => Function::Sqrt,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "log10" => Function::Log10,
            "abs" => Function::Abs,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "signum" | "sign" => Function::Signum,
            "atan2" => Function::Atan2,
            "min" => Function::Min,
            "max" => Function::Max,
            _ => return None,
        };

        let valid = match function {
            Function::Atan2 => arity == 2,
            Function::Min | Function::Max => arity >= 1,
            _ => arity == 1,
        };

        valid.then_some(function)
    }

    fn name(self) -> &'static str {
        match self {
            Function::Sqrt => "sqrt",
            Function::Exp => "exp",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Abs => "abs",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Sinh => "sinh",
            Function::Cosh => "cosh",
            Function::Tanh => "tanh",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Signum => "signum",
            Function::Atan2 => "atan2",
            Function::Min => "min",
            Function::Max => "max",
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        let x = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Function::Sqrt => x.sqrt(),
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Abs => x.abs(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
            Function::Floor => x.floor(),
            Function::Ceil => x.ceil(),
            Function::Signum => x.signum(),
            Function::Atan2 => x.atan2(args.get(1).copied().unwrap_or(f64::NAN)),
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Symbolic rate expression.
#[derive(Debug, Clone, PartialEq)]
pub enum RateExpr {
    Number(f64),
    Symbol(String),
    Neg(Box<RateExpr>),
    Binary(BinaryOp, Box<RateExpr>, Box<RateExpr>),
    Call(Function, Vec<RateExpr>),
}

impl Default for RateExpr {
    fn default() -> Self {
        RateExpr::zero()
    }
}

impl RateExpr {
    /// The additive identity every compositor starts from.
    pub fn zero() -> Self {
        RateExpr::Number(0.0)
    }

    /// Parses a rate law into an expression tree.
    ///
    /// `**` is accepted as an alias of `^`.
    ///
    /// # Arguments
    ///
    /// * `source` - The textual rate law
    ///
    /// # Returns
    ///
    /// The parsed tree, or [`EquationError::Parse`] when the text is not valid arithmetic.
    pub fn parse(source: &str) -> Result<Self, EquationError> {
        let prepared = prepare_expression(source);
        let expr: Expr = prepared.parse().map_err(|e: meval::Error| EquationError::Parse {
            expression: source.to_string(),
            message: e.to_string(),
        })?;

        Self::from_rpn(&expr)
    }

    /// Builds a tree from the reverse polish token stream produced by `meval`.
    fn from_rpn(tokens: &[Token]) -> Result<Self, EquationError> {
        let mut stack: Vec<RateExpr> = Vec::new();

        for token in tokens {
            match token {
                Token::Number(n) => stack.push(RateExpr::Number(*n)),
                Token::Var(name) => stack.push(RateExpr::Symbol(name.clone())),
                Token::Binary(op) => {
                    let rhs = pop_operand(&mut stack)?;
                    let lhs = pop_operand(&mut stack)?;
                    let op = match op {
                        Operation::Plus => BinaryOp::Add,
                        Operation::Minus => BinaryOp::Sub,
                        Operation::Times => BinaryOp::Mul,
                        Operation::Div => BinaryOp::Div,
                        Operation::Rem => BinaryOp::Rem,
                        Operation::Pow => BinaryOp::Pow,
                    };
                    stack.push(RateExpr::Binary(op, Box::new(lhs), Box::new(rhs)));
                }
                Token::Unary(op) => {
                    let operand = pop_operand(&mut stack)?;
                    match op {
                        Operation::Plus => stack.push(operand),
                        Operation::Minus => stack.push(RateExpr::Neg(Box::new(operand))),
                        other => {
                            return Err(EquationError::Unsupported(format!(
                                "unary operator {:?}",
                                other
                            )))
                        }
                    }
                }
                Token::Func(name, arity) => {
                    let arity = arity.unwrap_or(1);
                    let function = Function::resolve(name, arity).ok_or_else(|| {
                        EquationError::UnknownFunction {
                            name: name.clone(),
                            arity,
                        }
                    })?;

                    if stack.len() < arity {
                        return Err(EquationError::Malformed(format!(
                            "function '{}' expects {} argument(s)",
                            name, arity
                        )));
                    }
                    let args = stack.split_off(stack.len() - arity);
                    stack.push(RateExpr::Call(function, args));
                }
                other => {
                    return Err(EquationError::Malformed(format!(
                        "unexpected token {:?}",
                        other
                    )))
                }
            }
        }

        let expr = pop_operand(&mut stack)?;
        if !stack.is_empty() {
            return Err(EquationError::Malformed(
                "dangling operands after parsing".into(),
            ));
        }

        Ok(expr)
    }

    /// Appends another contribution additively.
    ///
    /// Adding onto the literal zero replaces it, so a compositor touched by a single
    /// part carries exactly that part's expression.
    pub fn add(self, other: RateExpr) -> RateExpr {
        match self {
            RateExpr::Number(n) if n == 0.0 => other,
            lhs => RateExpr::Binary(BinaryOp::Add, Box::new(lhs), Box::new(other)),
        }
    }

    /// Returns every free symbol of the expression.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut symbols = BTreeSet::new();
        self.collect_symbols(&mut symbols);
        symbols
    }

    fn collect_symbols(&self, symbols: &mut BTreeSet<String>) {
        match self {
            RateExpr::Number(_) => {}
            RateExpr::Symbol(name) => {
                symbols.insert(name.clone());
            }
            RateExpr::Neg(inner) => inner.collect_symbols(symbols),
            RateExpr::Binary(_, lhs, rhs) => {
                lhs.collect_symbols(symbols);
                rhs.collect_symbols(symbols);
            }
            RateExpr::Call(_, args) => args.iter().for_each(|a| a.collect_symbols(symbols)),
        }
    }

    /// Replaces symbols by numeric literals.
    ///
    /// # Arguments
    ///
    /// * `values` - Mapping of symbol name to the value that replaces it
    pub fn substitute(&self, values: &HashMap<String, f64>) -> RateExpr {
        match self {
            RateExpr::Symbol(name) => match values.get(name) {
                Some(value) => RateExpr::Number(*value),
                None => self.clone(),
            },
            RateExpr::Number(_) => self.clone(),
            RateExpr::Neg(inner) => RateExpr::Neg(Box::new(inner.substitute(values))),
            RateExpr::Binary(op, lhs, rhs) => RateExpr::Binary(
                *op,
                Box::new(lhs.substitute(values)),
                Box::new(rhs.substitute(values)),
            ),
            RateExpr::Call(function, args) => RateExpr::Call(
                *function,
                args.iter().map(|a| a.substitute(values)).collect(),
            ),
        }
    }

    /// Folds numeric subtrees and drops additive and multiplicative identities.
    pub fn simplify(&self) -> RateExpr {
        match self {
            RateExpr::Number(_) | RateExpr::Symbol(_) => self.clone(),
            RateExpr::Neg(inner) => match inner.simplify() {
                RateExpr::Number(n) => RateExpr::Number(-n),
                RateExpr::Neg(inner) => *inner,
                other => RateExpr::Neg(Box::new(other)),
            },
            RateExpr::Binary(op, lhs, rhs) => {
                let lhs = lhs.simplify();
                let rhs = rhs.simplify();

                match (op, &lhs, &rhs) {
                    (_, RateExpr::Number(a), RateExpr::Number(b)) => {
                        RateExpr::Number(op.apply(*a, *b))
                    }
                    (BinaryOp::Add, RateExpr::Number(z), _) if *z == 0.0 => rhs,
                    (BinaryOp::Add | BinaryOp::Sub, _, RateExpr::Number(z)) if *z == 0.0 => lhs,
                    (BinaryOp::Sub, RateExpr::Number(z), _) if *z == 0.0 => {
                        RateExpr::Neg(Box::new(rhs))
                    }
                    (BinaryOp::Mul, RateExpr::Number(z), _)
                    | (BinaryOp::Mul, _, RateExpr::Number(z))
                        if *z == 0.0 =>
                    {
                        RateExpr::zero()
                    }
                    (BinaryOp::Mul, RateExpr::Number(o), _) if *o == 1.0 => rhs,
                    (BinaryOp::Mul | BinaryOp::Div, _, RateExpr::Number(o)) if *o == 1.0 => lhs,
                    _ => RateExpr::Binary(*op, Box::new(lhs), Box::new(rhs)),
                }
            }
            RateExpr::Call(function, args) => {
                let args: Vec<RateExpr> = args.iter().map(|a| a.simplify()).collect();
                let numbers: Option<Vec<f64>> = args
                    .iter()
                    .map(|a| match a {
                        RateExpr::Number(n) => Some(*n),
                        _ => None,
                    })
                    .collect();

                match numbers {
                    Some(values) => RateExpr::Number(function.apply(&values)),
                    None => RateExpr::Call(*function, args),
                }
            }
        }
    }

    /// Compiles the expression into a positional stack program.
    ///
    /// Symbols resolve to the position of their name in `arguments`. The names `pi`
    /// and `e` fall back to the mathematical constants when no argument claims them.
    ///
    /// # Arguments
    ///
    /// * `arguments` - Ordered argument names of the resulting callable
    ///
    /// # Returns
    ///
    /// A [`CompiledRate`], or [`EquationError::UnresolvedSymbol`] for the first unknown name.
    pub fn compile(&self, arguments: &[String]) -> Result<CompiledRate, EquationError> {
        let positions: HashMap<&str, usize> = arguments
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut ops = Vec::new();
        self.emit(&positions, &mut ops).map_err(|e| match e {
            EquationError::UnresolvedSymbol { symbol, .. } => EquationError::UnresolvedSymbol {
                symbol,
                expression: self.to_string(),
            },
            other => other,
        })?;

        Ok(CompiledRate {
            expression: self.clone(),
            stack_depth: max_stack_depth(&ops),
            arity: arguments.len(),
            ops,
        })
    }

    fn emit(
        &self,
        positions: &HashMap<&str, usize>,
        ops: &mut Vec<OpCode>,
    ) -> Result<(), EquationError> {
        match self {
            RateExpr::Number(n) => ops.push(OpCode::LoadConst(*n)),
            RateExpr::Symbol(name) => match positions.get(name.as_str()) {
                Some(&index) => ops.push(OpCode::LoadArg(index)),
                None => match name.as_str() {
                    "pi" => ops.push(OpCode::LoadConst(std::f64::consts::PI)),
                    "e" => ops.push(OpCode::LoadConst(std::f64::consts::E)),
                    _ => {
                        return Err(EquationError::UnresolvedSymbol {
                            symbol: name.clone(),
                            expression: name.clone(),
                        })
                    }
                },
            },
            RateExpr::Neg(inner) => {
                inner.emit(positions, ops)?;
                ops.push(OpCode::Neg);
            }
            RateExpr::Binary(op, lhs, rhs) => {
                lhs.emit(positions, ops)?;
                rhs.emit(positions, ops)?;
                ops.push(OpCode::Binary(*op));
            }
            RateExpr::Call(function, args) => {
                for arg in args {
                    arg.emit(positions, ops)?;
                }
                ops.push(OpCode::Call(*function, args.len()));
            }
        }

        Ok(())
    }
}

impl Display for RateExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateExpr::Number(n) => write!(f, "{}", n),
            RateExpr::Symbol(name) => write!(f, "{}", name),
            RateExpr::Neg(inner) => write!(f, "-({})", inner),
            RateExpr::Binary(op, lhs, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            RateExpr::Call(function, args) => {
                write!(f, "{}(", function.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Instructions of the rate evaluation VM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a literal.
    LoadConst(f64),
    /// Pushes the positional argument at the given index.
    LoadArg(usize),
    /// Pops one value, pushes its negation.
    Neg,
    /// Pops `b` then `a`, pushes `a op b`.
    Binary(BinaryOp),
    /// Pops `n` arguments, pushes the function value.
    Call(Function, usize),
}

/// A rate expression compiled into a callable stack program.
///
/// The callable takes positional arguments in the order handed to [`RateExpr::compile`],
/// for a reaction network that is `(t, value of compositor 1, value of compositor 2, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRate {
    expression: RateExpr,
    ops: Vec<OpCode>,
    stack_depth: usize,
    arity: usize,
}

impl CompiledRate {
    /// The expression this program was compiled from.
    pub fn expression(&self) -> &RateExpr {
        &self.expression
    }

    /// Number of positional arguments expected.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluates the program at the given positional arguments.
    pub fn eval(&self, args: &[f64]) -> f64 {
        let mut stack = Vec::with_capacity(self.stack_depth);
        self.eval_with(args, &mut stack)
    }

    /// Evaluates the program reusing a caller-owned stack buffer.
    ///
    /// Missing arguments read as `NaN`.
    pub fn eval_with(&self, args: &[f64], stack: &mut Vec<f64>) -> f64 {
        stack.clear();

        for op in &self.ops {
            match *op {
                OpCode::LoadConst(value) => stack.push(value),
                OpCode::LoadArg(index) => stack.push(args.get(index).copied().unwrap_or(f64::NAN)),
                OpCode::Neg => {
                    let a = pop_value(stack);
                    stack.push(-a);
                }
                OpCode::Binary(op) => {
                    let b = pop_value(stack);
                    let a = pop_value(stack);
                    stack.push(op.apply(a, b));
                }
                OpCode::Call(function, n) => {
                    let start = stack.len().saturating_sub(n);
                    let value = function.apply(&stack[start..]);
                    stack.truncate(start);
                    stack.push(value);
                }
            }
        }

        pop_value(stack)
    }
}

/// Rewrites notation `meval` does not know into notation it does.
fn prepare_expression(source: &str) -> String {
    source.replace("**", "^")
}

fn pop_operand(stack: &mut Vec<RateExpr>) -> Result<RateExpr, EquationError> {
    stack
        .pop()
        .ok_or_else(|| EquationError::Malformed("missing operand".into()))
}

// Programs are emitted from well-formed trees, so the stack never underflows.
fn pop_value(stack: &mut Vec<f64>) -> f64 {
    stack.pop().unwrap_or(f64::NAN)
}

fn max_stack_depth(ops: &[OpCode]) -> usize {
    let mut depth: usize = 0;
    let mut max_depth = 0;

    for op in ops {
        depth = match op {
            OpCode::LoadConst(_) | OpCode::LoadArg(_) => depth + 1,
            OpCode::Neg => depth,
            OpCode::Binary(_) => depth.saturating_sub(1),
            OpCode::Call(_, n) => depth.saturating_sub(*n) + 1,
        };
        max_depth = max_depth.max(depth);
    }

    max_depth
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn args(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_and_eval() {
        let expr = RateExpr::parse("-k * A * E").unwrap();
        let compiled = expr.compile(&args(&["t", "A", "E", "k"])).unwrap();

        assert_relative_eq!(compiled.eval(&[0.0, 10.0, 1.0, 0.05]), -0.5);
    }

    #[test]
    fn test_symbols() {
        let expr = RateExpr::parse("k1 * A / (Km + A) - k2 * B").unwrap();
        let symbols: Vec<String> = expr.symbols().into_iter().collect();

        assert_eq!(symbols, vec!["A", "B", "Km", "k1", "k2"]);
    }

    #[test]
    fn test_power_alias() {
        let expr = RateExpr::parse("A ** 2").unwrap();
        let compiled = expr.compile(&args(&["t", "A"])).unwrap();

        assert_relative_eq!(compiled.eval(&[0.0, 3.0]), 9.0);
    }

    #[test]
    fn test_functions_and_time() {
        let expr = RateExpr::parse("exp(-t) + max(A, 2, 1) + sqrt(4)").unwrap();
        let compiled = expr.compile(&args(&["t", "A"])).unwrap();

        assert_relative_eq!(compiled.eval(&[0.0, 0.5]), 1.0 + 2.0 + 2.0);
    }

    #[test]
    fn test_substitute_and_simplify() {
        let expr = RateExpr::parse("0 + k * A + 0 * B").unwrap();
        let values = HashMap::from([("k".to_string(), 2.0)]);
        let simplified = expr.substitute(&values).simplify();

        assert_eq!(
            simplified,
            RateExpr::Binary(
                BinaryOp::Mul,
                Box::new(RateExpr::Number(2.0)),
                Box::new(RateExpr::Symbol("A".into()))
            )
        );
    }

    #[test]
    fn test_add_replaces_zero() {
        let first = RateExpr::parse("k * A").unwrap();
        let sum = RateExpr::zero().add(first.clone());
        assert_eq!(sum, first);

        let sum = sum.add(RateExpr::parse("k2").unwrap());
        assert_eq!(sum.to_string(), "((k * A) + k2)");
    }

    #[test]
    fn test_unresolved_symbol() {
        let expr = RateExpr::parse("k * X").unwrap();
        let result = expr.compile(&args(&["t", "A"]));

        assert!(matches!(
            result,
            Err(EquationError::UnresolvedSymbol { symbol, .. }) if symbol == "k"
        ));
    }

    #[test]
    fn test_unknown_function() {
        let result = RateExpr::parse("foo(A)");
        assert!(matches!(
            result,
            Err(EquationError::UnknownFunction { name, arity: 1 }) if name == "foo"
        ));
    }

    #[test]
    fn test_malformed_expression() {
        assert!(matches!(
            RateExpr::parse("k * * A"),
            Err(EquationError::Parse { .. })
        ));
    }

    #[test]
    fn test_only_arithmetic_operators() {
        for law in ["k + A", "k - A", "k * A", "k / A", "k % A", "k ^ A", "-A", "+A"] {
            assert!(RateExpr::parse(law).is_ok(), "{} should parse", law);
        }
        assert!(RateExpr::parse("A!").is_err());
    }

    #[test]
    fn test_builtin_constants() {
        let expr = RateExpr::parse("pi * e").unwrap();
        let compiled = expr.compile(&args(&["t"])).unwrap();

        assert_relative_eq!(
            compiled.eval(&[0.0]),
            std::f64::consts::PI * std::f64::consts::E
        );
    }
}
