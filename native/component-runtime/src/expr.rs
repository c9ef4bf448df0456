//! Restricted Expression Evaluator
//!
//! Evaluates the expressions embedded in template directives and `${...}`
//! interpolations. Expressions see the instance only through a [`Scope`]:
//! declared properties (`this.name`), the transient list item (`this.item`)
//! and methods the component chooses to expose (`this.method(args)`).
//!
//! Supported syntax: string/number/boolean/null literals, member access
//! (`a.b`, `a[0]`, `.length`), unary `! - +`, binary `* / % + -`,
//! relational `< <= > >=`, equality `== != === !==`, logical `&& ||`,
//! the ternary operator, parentheses and backtick template strings.

use crate::error::EvalError;
use crate::value::Value;

/// Read-only view of a component instance.
pub trait Scope {
    /// Value of `this.<name>`, or `None` when the name is not part of the instance.
    fn property(&self, name: &str) -> Option<Value>;

    /// Invoke `this.<name>(args)`.
    fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Template(String),
    This,
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Logical(LogicalOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    LooseEquals,
    LooseNotEquals,
    StrictEquals,
    StrictNotEquals,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEXER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Template(String),
    Ident(String),
    Punct(&'static str),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => Value::Number(*n).to_string(),
            Token::Str(s) => format!("\"{}\"", s),
            Token::Template(s) => format!("`{}`", s),
            Token::Ident(s) => s.clone(),
            Token::Punct(p) => p.to_string(),
        }
    }
}

// Longest operators first so `===` wins over `==`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "!", "<", ">", "+", "-", "*", "/", "%",
    "?", ":", ".", ",", "(", ")", "[", "]",
];

fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                i += 1;
                if i < chars.len() && (chars[i] == '+' || chars[i] == '-') {
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let number = text
                .parse::<f64>()
                .map_err(|_| EvalError::UnexpectedChar { ch: c, offset: start })?;
            tokens.push(Token::Number(number));
            continue;
        }

        if c == '"' || c == '\'' || c == '`' {
            let start = i;
            i += 1;
            let mut raw = String::new();
            loop {
                match chars.get(i) {
                    None => return Err(EvalError::UnterminatedString { offset: start }),
                    Some('\\') => {
                        raw.push('\\');
                        if let Some(next) = chars.get(i + 1) {
                            raw.push(*next);
                        }
                        i += 2;
                    }
                    Some(&q) if q == c => {
                        i += 1;
                        break;
                    }
                    Some(&other) => {
                        raw.push(other);
                        i += 1;
                    }
                }
            }
            tokens.push(if c == '`' {
                Token::Template(raw)
            } else {
                Token::Str(unescape_string(&raw))
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
        match PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            Some(&p) => {
                tokens.push(Token::Punct(p));
                i += p.chars().count();
            }
            None => return Err(EvalError::UnexpectedChar { ch: c, offset: i }),
        }
    }

    Ok(tokens)
}

/// Unescape basic string escape sequences
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════════

/// Nesting allowed through parentheses, brackets, call arguments, ternary
/// branches and prefix operators.
const MAX_NESTING: usize = 64;

/// Composite nodes allowed in one expression. Evaluation recurses once per
/// node, so this also bounds the evaluator's stack.
const MAX_NODES: usize = 512;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    nodes: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            nodes: 0,
        }
    }

    fn nested(&mut self, rule: fn(&mut Self) -> Result<Expr, EvalError>) -> Result<Expr, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::TooDeep { limit: MAX_NESTING });
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn node(&mut self, expr: Expr) -> Result<Expr, EvalError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(EvalError::TooComplex { limit: MAX_NODES });
        }
        Ok(expr)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self, p: &str) -> bool {
        matches!(self.peek(), Some(Token::Punct(q)) if *q == p)
    }

    fn eat(&mut self, p: &str) -> bool {
        if self.peek_punct(p) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: &str) -> Result<(), EvalError> {
        if self.eat(p) {
            return Ok(());
        }
        Err(match self.peek() {
            Some(token) => EvalError::UnexpectedToken {
                found: token.describe(),
                expected: format!("'{}'", p),
            },
            None => EvalError::UnexpectedEnd,
        })
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn conditional(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::ternary)
    }

    fn ternary(&mut self) -> Result<Expr, EvalError> {
        let test = self.logical_or()?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.conditional()?;
        self.expect(":")?;
        let alternate = self.conditional()?;
        self.node(Expr::Conditional(
            Box::new(test),
            Box::new(consequent),
            Box::new(alternate),
        ))
    }

    fn logical_or(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.logical_and()?;
        while self.eat("||") {
            let right = self.logical_and()?;
            left = self.node(Expr::Logical(LogicalOp::Or, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.equality()?;
        while self.eat("&&") {
            let right = self.equality()?;
            left = self.node(Expr::Logical(LogicalOp::And, Box::new(left), Box::new(right)))?;
        }
        Ok(left)
    }

    fn binary_level(
        &mut self,
        ops: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let mut left = next(self)?;
        'outer: loop {
            for (punct, op) in ops {
                if self.eat(punct) {
                    let right = next(self)?;
                    left = self.node(Expr::Binary(*op, Box::new(left), Box::new(right)))?;
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                ("===", BinaryOp::StrictEquals),
                ("!==", BinaryOp::StrictNotEquals),
                ("==", BinaryOp::LooseEquals),
                ("!=", BinaryOp::LooseNotEquals),
            ],
            Self::relational,
        )
    }

    fn relational(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                ("<=", BinaryOp::LessEqual),
                (">=", BinaryOp::GreaterEqual),
                ("<", BinaryOp::Less),
                (">", BinaryOp::Greater),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Subtract)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary_level(
            &[
                ("*", BinaryOp::Multiply),
                ("/", BinaryOp::Divide),
                ("%", BinaryOp::Remainder),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = if self.eat("!") {
            UnaryOp::Not
        } else if self.eat("-") {
            UnaryOp::Negate
        } else if self.eat("+") {
            UnaryOp::Plus
        } else {
            return self.postfix();
        };
        let operand = self.nested(Self::unary)?;
        self.node(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                match self.next() {
                    Some(Token::Ident(name)) => expr = self.node(Expr::Member(Box::new(expr), name))?,
                    Some(other) => {
                        return Err(EvalError::UnexpectedToken {
                            found: other.describe(),
                            expected: "property name".to_string(),
                        })
                    }
                    None => return Err(EvalError::UnexpectedEnd),
                }
            } else if self.eat("[") {
                let index = self.conditional()?;
                self.expect("]")?;
                expr = self.node(Expr::Index(Box::new(expr), Box::new(index)))?;
            } else if self.eat("(") {
                let mut args = Vec::new();
                if !self.eat(")") {
                    loop {
                        args.push(self.conditional()?);
                        if self.eat(")") {
                            break;
                        }
                        self.expect(",")?;
                    }
                }
                expr = self.node(Expr::Call(Box::new(expr), args))?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Template(raw)) => Ok(Expr::Template(raw)),
            Some(Token::Ident(name)) => match name.as_str() {
                "this" => Ok(Expr::This),
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                _ => Err(EvalError::UnknownIdentifier { name }),
            },
            Some(Token::Punct("(")) => {
                let inner = self.conditional()?;
                self.expect(")")?;
                Ok(inner)
            }
            Some(other) => Err(EvalError::UnexpectedToken {
                found: other.describe(),
                expected: "expression".to_string(),
            }),
            None => Err(EvalError::UnexpectedEnd),
        }
    }
}

/// Parse an expression without evaluating it.
pub fn parse(source: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens);
    let expr = parser.conditional()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(EvalError::UnexpectedToken {
            found: token.describe(),
            expected: "end of expression".to_string(),
        }),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVALUATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse and evaluate `source` against `scope`.
pub fn evaluate(source: &str, scope: &dyn Scope) -> Result<Value, EvalError> {
    eval(&parse(source)?, scope)
}

pub fn eval(expr: &Expr, scope: &dyn Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Template(raw) => interpolate(&unescape_string(raw), scope).map(Value::String),
        Expr::This => Err(EvalError::UnexpectedToken {
            found: "this".to_string(),
            expected: "member access on this".to_string(),
        }),
        Expr::Member(object, name) => match object.as_ref() {
            Expr::This => scope
                .property(name)
                .ok_or_else(|| EvalError::UnknownProperty { name: name.clone() }),
            other => member(&eval(other, scope)?, name),
        },
        Expr::Index(object, index) => {
            let target = eval(object, scope)?;
            let key = eval(index, scope)?;
            index_value(&target, &key)
        }
        Expr::Call(callee, args) => match callee.as_ref() {
            Expr::Member(object, name) if matches!(object.as_ref(), Expr::This) => {
                let args = args
                    .iter()
                    .map(|a| eval(a, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                scope.call(name, &args)
            }
            Expr::Member(_, name) => Err(EvalError::NotCallable {
                callee: name.clone(),
            }),
            _ => Err(EvalError::NotCallable {
                callee: "expression".to_string(),
            }),
        },
        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Negate => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Logical(op, left, right) => {
            let left = eval(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => eval(right, scope),
            }
        }
        Expr::Conditional(test, consequent, alternate) => {
            if eval(test, scope)?.is_truthy() {
                eval(consequent, scope)
            } else {
                eval(alternate, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
    }
}

fn member(target: &Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Null => Err(EvalError::NullAccess {
            member: name.to_string(),
        }),
        Value::Object(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
        Value::Array(items) if name == "length" => Ok(Value::from(items.len())),
        Value::String(s) if name == "length" => Ok(Value::from(s.chars().count())),
        _ => Ok(Value::Null),
    }
}

fn index_value(target: &Value, key: &Value) -> Result<Value, EvalError> {
    match (target, key) {
        (Value::Null, _) => Err(EvalError::NullAccess {
            member: key.to_string(),
        }),
        (Value::Array(items), Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => {
            Ok(items.get(*n as usize).cloned().unwrap_or(Value::Null))
        }
        (Value::String(s), Value::Number(n)) if *n >= 0.0 && n.fract() == 0.0 => Ok(s
            .chars()
            .nth(*n as usize)
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Null)),
        (_, key) => member(target, &key.to_string()),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => match (left, right) {
            (Value::String(_), _) | (_, Value::String(_)) => {
                Value::String(format!("{}{}", left, right))
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            let result = match ordering {
                None => false,
                Some(ord) => match op {
                    BinaryOp::Less => ord.is_lt(),
                    BinaryOp::LessEqual => ord.is_le(),
                    BinaryOp::Greater => ord.is_gt(),
                    _ => ord.is_ge(),
                },
            };
            Value::Bool(result)
        }
        BinaryOp::LooseEquals => Value::Bool(left.loose_eq(right)),
        BinaryOp::LooseNotEquals => Value::Bool(!left.loose_eq(right)),
        BinaryOp::StrictEquals => Value::Bool(left.strict_eq(right)),
        BinaryOp::StrictNotEquals => Value::Bool(!left.strict_eq(right)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRING INTERPOLATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Find the `}` that closes an interpolation opened just before `start`,
/// skipping braces inside quoted strings.
fn find_interpolation_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 1;
    let mut in_string: Option<char> = None;
    let mut i = start;

    while i < chars.len() {
        let c = chars[i];
        if let Some(quote) = in_string {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    None
}

/// Replace every `${expr}` in `template` with the string form of its value.
/// Text outside interpolations is copied verbatim.
pub fn interpolate(template: &str, scope: &dyn Scope) -> Result<String, EvalError> {
    let chars: Vec<char> = template.chars().collect();
    let mut result = String::with_capacity(template.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
            let end = find_interpolation_end(&chars, i + 2)
                .ok_or(EvalError::UnterminatedInterpolation { offset: i })?;
            let source: String = chars[i + 2..end].iter().collect();
            let value = evaluate(&source, scope)?;
            result.push_str(&value.to_string());
            i = end + 1;
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapScope {
        props: HashMap<String, Value>,
    }

    impl MapScope {
        fn new(entries: &[(&str, Value)]) -> Self {
            Self {
                props: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
            }
        }
    }

    impl Scope for MapScope {
        fn property(&self, name: &str) -> Option<Value> {
            self.props.get(name).cloned()
        }

        fn call(&self, name: &str, args: &[Value]) -> Result<Value, EvalError> {
            match name {
                "double" => Ok(Value::Number(
                    args.first().map(Value::to_number).unwrap_or(0.0) * 2.0,
                )),
                _ => Err(EvalError::UnknownMethod {
                    name: name.to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_property_access() {
        let scope = MapScope::new(&[("userAge", Value::from(25)), ("isMale", Value::from(true))]);
        assert_eq!(evaluate("this.userAge > 18", &scope), Ok(Value::Bool(true)));
        assert_eq!(evaluate("!this.isMale", &scope), Ok(Value::Bool(false)));
        assert_eq!(
            evaluate("this.missing", &scope),
            Err(EvalError::UnknownProperty {
                name: "missing".to_string()
            })
        );
    }

    #[test]
    fn test_bare_identifiers_are_rejected() {
        let scope = MapScope::new(&[]);
        assert_eq!(
            evaluate("window.alert", &scope),
            Err(EvalError::UnknownIdentifier {
                name: "window".to_string()
            })
        );
    }

    #[test]
    fn test_precedence_and_logic() {
        let scope = MapScope::new(&[("n", Value::from(3))]);
        assert_eq!(evaluate("1 + 2 * 3", &scope), Ok(Value::Number(7.0)));
        assert_eq!(evaluate("(1 + 2) * 3", &scope), Ok(Value::Number(9.0)));
        assert_eq!(
            evaluate("this.n === 3 && 'yes' || 'no'", &scope),
            Ok(Value::from("yes"))
        );
        assert_eq!(
            evaluate("this.n > 5 ? 'big' : this.n > 2 ? 'mid' : 'small'", &scope),
            Ok(Value::from("mid"))
        );
        assert_eq!(evaluate("'3' == this.n", &scope), Ok(Value::Bool(true)));
        assert_eq!(evaluate("'3' === this.n", &scope), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_nested_members_and_methods() {
        let item = Value::from(json!({"name": "A", "tags": ["x", "y"]}));
        let scope = MapScope::new(&[("item", item)]);
        assert_eq!(evaluate("this.item.name", &scope), Ok(Value::from("A")));
        assert_eq!(evaluate("this.item.tags[1]", &scope), Ok(Value::from("y")));
        assert_eq!(evaluate("this.item.tags.length", &scope), Ok(Value::from(2)));
        assert_eq!(evaluate("this.double(21)", &scope), Ok(Value::from(42)));
        assert!(matches!(
            evaluate("this.item.name(1)", &scope),
            Err(EvalError::NotCallable { .. })
        ));
        assert!(matches!(
            evaluate("this.item.missing.deeper", &scope),
            Err(EvalError::NullAccess { .. })
        ));
    }

    #[test]
    fn test_syntax_errors() {
        let scope = MapScope::new(&[]);
        assert_eq!(evaluate("1 +", &scope), Err(EvalError::UnexpectedEnd));
        assert!(matches!(
            evaluate("'open", &scope),
            Err(EvalError::UnterminatedString { .. })
        ));
        assert!(matches!(
            evaluate("1 2", &scope),
            Err(EvalError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            evaluate("this.a = 1", &scope),
            Err(EvalError::UnexpectedChar { ch: '=', .. })
        ));
    }

    #[test]
    fn test_nesting_is_bounded() {
        let scope = MapScope::new(&[]);
        let parens = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(evaluate(&parens, &scope), Err(EvalError::TooDeep { limit: 64 }));

        let negations = format!("{}true", "!".repeat(1000));
        assert_eq!(evaluate(&negations, &scope), Err(EvalError::TooDeep { limit: 64 }));

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&shallow, &scope), Ok(Value::Number(1.0)));
        assert_eq!(evaluate("!!!!true", &scope), Ok(Value::Bool(true)));
    }

    #[test]
    fn test_long_chains_are_bounded() {
        let scope = MapScope::new(&[]);
        let sum = vec!["1"; 2000].join(" + ");
        assert_eq!(evaluate(&sum, &scope), Err(EvalError::TooComplex { limit: 512 }));

        let members = format!("this.a{}", ".b".repeat(1000));
        assert_eq!(parse(&members).err(), Some(EvalError::TooComplex { limit: 512 }));

        let small = vec!["1"; 100].join(" + ");
        assert_eq!(evaluate(&small, &scope), Ok(Value::Number(100.0)));
    }

    #[test]
    fn test_interpolation() {
        let scope = MapScope::new(&[("item", Value::from(json!({"name": "B"})))]);
        assert_eq!(
            interpolate("<strong>${this.item.name}</strong>", &scope),
            Ok("<strong>B</strong>".to_string())
        );
        assert_eq!(
            interpolate("${ '}' + this.item.name }", &scope),
            Ok("}B".to_string())
        );
        assert_eq!(interpolate("cost: $5", &scope), Ok("cost: $5".to_string()));
        assert!(matches!(
            interpolate("${this.item.name", &scope),
            Err(EvalError::UnterminatedInterpolation { offset: 0 })
        ));
    }

    #[test]
    fn test_template_literal_expression() {
        let scope = MapScope::new(&[("name", Value::from("Ann"))]);
        assert_eq!(
            evaluate("`Hi, ${this.name}`", &scope),
            Ok(Value::from("Hi, Ann"))
        );
    }
}
