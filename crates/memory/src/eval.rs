//! Filter and expression evaluator.
//!
//! Criteria, projections, `expr()` values and the tiny SQL subset share one
//! small language:
//!
//! | Form | Example |
//! |------|---------|
//! | literals | `17`, `1.5`, `'text'`, `TRUE`, `NULL`, `[1, 2]` |
//! | fields | `name`, `address.city`, `hobbies[1]`, `$.name`, `` `odd name` `` |
//! | placeholders | `:years`, `?` |
//! | arithmetic | `+ - * / %`, unary `-` |
//! | comparison | `= == != <> < <= > >=`, `LIKE`, `IN`, `BETWEEN`, `IS [NOT] NULL` |
//! | logic | `AND &&`, `OR ||`, `NOT !` |
//! | functions | `lower upper length char_length concat abs ifnull coalesce` |
//!
//! Comparisons use three-valued logic: anything compared with `NULL` is
//! `NULL`, and a filter only matches when it evaluates to true.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use fluentdb_core::{DocPath, PathSegment, Value, Warning};

/// Parse or evaluation failure, reported to callers as a session error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("You have an error in your expression at position {position}: {reason}")]
    Syntax { position: usize, reason: String },

    #[error("Unknown column '{0}'")]
    UnknownColumn(String),

    #[error("No data supplied for placeholder {0}")]
    Unbound(String),

    #[error("FUNCTION {0} does not exist")]
    UnknownFunction(String),

    #[error("Incorrect arguments to {0}")]
    Arguments(String),
}

impl EvalError {
    /// Error code in the MySQL numbering the session reports.
    pub fn code(&self) -> u32 {
        match self {
            EvalError::Syntax { .. } => 1064,
            EvalError::UnknownColumn(_) => 1054,
            EvalError::Unbound(_) => 2031,
            EvalError::UnknownFunction(_) => 1305,
            EvalError::Arguments(_) => 1210,
        }
    }
}

type Result<T> = std::result::Result<T, EvalError>;

// =============================================================================
// Syntax tree
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Field(DocPath),
    Named(String),
    /// Zero-based `?` marker
    Positional(usize),
    Array(Vec<Expr>),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    In {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// One output column of a find, select or SQL select.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: Expr,
    /// Alias, or the expression text when none was given
    pub name: String,
}

/// Parse a complete expression.
pub fn parse(text: &str) -> Result<Expr> {
    let mut parser = Parser::new(text)?;
    let expr = parser.expr(0)?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse `<expr> [AS alias]`.
pub fn parse_projection(text: &str) -> Result<Projection> {
    let mut parser = Parser::new(text)?;
    let projection = parser.projection()?;
    parser.expect_end()?;
    Ok(projection)
}

/// Parse `SELECT <projection>, ...` without a `FROM` clause.
pub fn parse_select(text: &str) -> Result<Vec<Projection>> {
    let mut parser = Parser::new(text)?;
    if !parser.eat_keyword("SELECT") {
        return Err(parser.error("only SELECT statements without FROM are supported"));
    }
    let mut projections = vec![parser.projection()?];
    while parser.peek() == Some(&Token::Comma) {
        parser.advance();
        projections.push(parser.projection()?);
    }
    if parser.is_keyword("FROM") {
        return Err(parser.error("SELECT ... FROM is not supported by this session"));
    }
    parser.expect_end()?;
    Ok(projections)
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    /// `` `backquoted` `` identifier
    Quoted(String),
    Named(String),
    Positional,
    Dollar,
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Op(&'static str),
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    start: usize,
    end: usize,
}

const OPERATORS: [&str; 16] = [
    "==", "!=", "<>", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "=", "<", ">", "!",
];

fn syntax(position: usize, reason: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        position,
        reason: reason.into(),
    }
}

fn tokenize(chars: &[char]) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let token = match c {
            '0'..='9' => {
                let (token, next) = number(chars, i);
                i = next;
                token
            }
            '\'' | '"' => {
                let (text, next) = string(chars, i)?;
                i = next;
                Token::Str(text)
            }
            '`' => {
                let (text, next) = string(chars, i)?;
                i = next;
                Token::Quoted(text)
            }
            ':' => {
                i += 1;
                let name_start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                if i == name_start {
                    return Err(syntax(start, "expected a placeholder name after ':'"));
                }
                Token::Named(chars[name_start..i].iter().collect())
            }
            '?' => {
                i += 1;
                Token::Positional
            }
            '$' => {
                i += 1;
                Token::Dollar
            }
            '.' => {
                i += 1;
                Token::Dot
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            '[' => {
                i += 1;
                Token::LBracket
            }
            ']' => {
                i += 1;
                Token::RBracket
            }
            c if c.is_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                Token::Ident(chars[start..i].iter().collect())
            }
            _ => {
                let op = OPERATORS.iter().find(|op| {
                    op.chars()
                        .enumerate()
                        .all(|(k, oc)| chars.get(i + k) == Some(&oc))
                });
                match op {
                    Some(op) => {
                        i += op.chars().count();
                        Token::Op(op)
                    }
                    None => return Err(syntax(start, format!("unexpected character '{}'", c))),
                }
            }
        };
        tokens.push(Spanned {
            token,
            start,
            end: i,
        });
    }
    Ok(tokens)
}

fn number(chars: &[char], mut i: usize) -> (Token, usize) {
    let start = i;
    let mut float = false;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if chars.get(i) == Some(&'.') && chars.get(i + 1).map_or(false, char::is_ascii_digit) {
        float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if chars.get(j).map_or(false, char::is_ascii_digit) {
            float = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    let text: String = chars[start..i].iter().collect();
    if !float {
        if let Ok(n) = text.parse::<i64>() {
            return (Token::Int(n), i);
        }
    }
    (Token::Float(text.parse::<f64>().unwrap_or(f64::INFINITY)), i)
}

/// Quoted text starting at `start`; honors backslash escapes and doubled
/// quotes.
fn string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' && quote != '`' {
            match chars.get(i + 1) {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('0') => out.push('\0'),
                // kept for LIKE patterns
                Some(wild @ ('%' | '_')) => {
                    out.push('\\');
                    out.push(*wild);
                }
                Some(other) => out.push(*other),
                None => break,
            }
            i += 2;
        } else if c == quote {
            if chars.get(i + 1) == Some(&quote) {
                out.push(quote);
                i += 2;
            } else {
                return Ok((out, i + 1));
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    Err(syntax(
        start + 1,
        format!("unterminated quoted string starting at position {}", start + 1),
    ))
}

// =============================================================================
// Parser
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Like(bool),
    In(bool),
    Between(bool),
    Is,
}

impl Infix {
    fn binding_power(&self) -> (u8, u8) {
        match self {
            Infix::Binary(BinaryOp::Or) => (1, 2),
            Infix::Binary(BinaryOp::And) => (3, 4),
            Infix::Binary(BinaryOp::Add | BinaryOp::Sub) => (9, 10),
            Infix::Binary(BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod) => (11, 12),
            _ => (7, 8),
        }
    }
}

const NOT_BP: u8 = 5;
const UNARY_BP: u8 = 13;

struct Parser {
    chars: Vec<char>,
    tokens: Vec<Spanned>,
    pos: usize,
    positional: usize,
}

impl Parser {
    fn new(text: &str) -> Result<Self> {
        let chars: Vec<char> = text.chars().collect();
        let tokens = tokenize(&chars)?;
        Ok(Self {
            chars,
            tokens,
            pos: 0,
            positional: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.chars.len(), |t| t.start)
    }

    fn error(&self, reason: impl Into<String>) -> EvalError {
        syntax(self.position(), reason)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.keyword_at(0, keyword)
    }

    fn keyword_at(&self, offset: usize, keyword: &str) -> bool {
        matches!(self.peek_at(offset), Some(Token::Ident(s)) if s.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(t) => Err(syntax(
                t.start,
                format!(
                    "unexpected '{}'",
                    self.chars[t.start..t.end].iter().collect::<String>()
                ),
            )),
        }
    }

    fn projection(&mut self) -> Result<Projection> {
        let start = self.position();
        let expr = self.expr(0)?;
        let end = self
            .pos
            .checked_sub(1)
            .and_then(|p| self.tokens.get(p))
            .map_or(start, |t| t.end);
        let name = if self.eat_keyword("AS") {
            match self.advance() {
                Some(Token::Ident(alias) | Token::Quoted(alias)) => alias,
                _ => return Err(self.error("expected an alias after AS")),
            }
        } else {
            self.chars[start..end].iter().collect::<String>().trim().to_string()
        };
        Ok(Projection { expr, name })
    }

    fn expr(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.prefix()?;
        while let Some((infix, width)) = self.infix() {
            let (l_bp, r_bp) = infix.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.pos += width;
            lhs = match infix {
                Infix::Binary(op) => Expr::Binary(op, Box::new(lhs), Box::new(self.expr(r_bp)?)),
                Infix::Like(negated) => Expr::Like {
                    expr: Box::new(lhs),
                    pattern: Box::new(self.expr(r_bp)?),
                    negated,
                },
                Infix::In(negated) => {
                    let list = if self.peek() == Some(&Token::LParen) {
                        self.advance();
                        self.list(Token::RParen, "')'")?
                    } else {
                        vec![self.expr(r_bp)?]
                    };
                    Expr::In {
                        expr: Box::new(lhs),
                        list,
                        negated,
                    }
                }
                Infix::Between(negated) => {
                    let low = self.expr(r_bp)?;
                    if !self.eat_keyword("AND") {
                        return Err(self.error("expected AND in BETWEEN"));
                    }
                    let high = self.expr(r_bp)?;
                    Expr::Between {
                        expr: Box::new(lhs),
                        low: Box::new(low),
                        high: Box::new(high),
                        negated,
                    }
                }
                Infix::Is => {
                    let negated = self.eat_keyword("NOT");
                    if !self.eat_keyword("NULL") {
                        return Err(self.error("expected NULL after IS"));
                    }
                    Expr::IsNull {
                        expr: Box::new(lhs),
                        negated,
                    }
                }
            };
        }
        Ok(lhs)
    }

    /// Infix operator at the cursor and how many tokens it spans.
    fn infix(&self) -> Option<(Infix, usize)> {
        let op = match self.peek()? {
            Token::Op(op) => match *op {
                "||" => BinaryOp::Or,
                "&&" => BinaryOp::And,
                "=" | "==" => BinaryOp::Eq,
                "!=" | "<>" => BinaryOp::Ne,
                "<" => BinaryOp::Lt,
                "<=" => BinaryOp::Le,
                ">" => BinaryOp::Gt,
                ">=" => BinaryOp::Ge,
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "%" => BinaryOp::Mod,
                _ => return None,
            },
            Token::Ident(word) => {
                let word = word.to_ascii_uppercase();
                return match word.as_str() {
                    "OR" => Some((Infix::Binary(BinaryOp::Or), 1)),
                    "AND" => Some((Infix::Binary(BinaryOp::And), 1)),
                    "LIKE" => Some((Infix::Like(false), 1)),
                    "IN" => Some((Infix::In(false), 1)),
                    "BETWEEN" => Some((Infix::Between(false), 1)),
                    "IS" => Some((Infix::Is, 1)),
                    "NOT" if self.keyword_at(1, "LIKE") => Some((Infix::Like(true), 2)),
                    "NOT" if self.keyword_at(1, "IN") => Some((Infix::In(true), 2)),
                    "NOT" if self.keyword_at(1, "BETWEEN") => Some((Infix::Between(true), 2)),
                    _ => None,
                };
            }
            _ => return None,
        };
        Some((Infix::Binary(op), 1))
    }

    fn prefix(&mut self) -> Result<Expr> {
        let position = self.position();
        let Some(token) = self.advance() else {
            return Err(syntax(position, "unexpected end of expression"));
        };
        match token {
            Token::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::Named(name) => Ok(Expr::Named(name)),
            Token::Positional => {
                self.positional += 1;
                Ok(Expr::Positional(self.positional - 1))
            }
            Token::Op("-") => Ok(Expr::Neg(Box::new(self.expr(UNARY_BP)?))),
            Token::Op("+") => self.expr(UNARY_BP),
            Token::Op("!") => Ok(Expr::Not(Box::new(self.expr(UNARY_BP)?))),
            Token::LParen => {
                let inner = self.expr(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::Array(self.list(Token::RBracket, "']'")?)),
            Token::Dollar => {
                if !matches!(self.peek(), Some(Token::Dot | Token::LBracket)) {
                    return Err(syntax(position, "expected a path after '$'"));
                }
                Ok(Expr::Field(self.path(Vec::new())?))
            }
            Token::Quoted(name) => Ok(Expr::Field(self.path(vec![PathSegment::Key(name)])?)),
            Token::Ident(word) => match word.to_ascii_uppercase().as_str() {
                "TRUE" => Ok(Expr::Literal(Value::Bool(true))),
                "FALSE" => Ok(Expr::Literal(Value::Bool(false))),
                "NULL" => Ok(Expr::Literal(Value::Null)),
                "NOT" => Ok(Expr::Not(Box::new(self.expr(NOT_BP)?))),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.advance();
                    let args = self.list(Token::RParen, "')'")?;
                    Ok(Expr::Call { name: word, args })
                }
                _ => Ok(Expr::Field(self.path(vec![PathSegment::Key(word)])?)),
            },
            other => Err(syntax(position, format!("unexpected token {:?}", other))),
        }
    }

    /// Remaining `.key` and `[n]` segments of a field path.
    fn path(&mut self, mut segments: Vec<PathSegment>) -> Result<DocPath> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(Token::Dot), Some(Token::Ident(key) | Token::Quoted(key))) => {
                    segments.push(PathSegment::Key(key.clone()));
                    self.pos += 2;
                }
                (Some(Token::Dot), _) => return Err(self.error("expected a field name after '.'")),
                (Some(Token::LBracket), Some(Token::Int(n))) if *n >= 0 => {
                    segments.push(PathSegment::Index(*n as usize));
                    self.pos += 2;
                    self.expect(Token::RBracket, "']'")?;
                }
                (Some(Token::LBracket), _) => return Err(self.error("expected an array index")),
                _ => break,
            }
        }
        DocPath::from_segments(segments).ok_or_else(|| self.error("empty document path"))
    }

    /// Comma separated expressions up to `close`; the opener is consumed.
    fn list(&mut self, close: Token, what: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.advance();
            return Ok(items);
        }
        loop {
            items.push(self.expr(0)?);
            match self.peek() {
                Some(Token::Comma) => {
                    self.advance();
                }
                Some(t) if *t == close => {
                    self.advance();
                    return Ok(items);
                }
                _ => return Err(self.error(format!("expected ',' or {}", what))),
            }
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Source of field values for one record.
pub trait Scope {
    fn lookup(&self, path: &DocPath) -> Result<Value>;
}

/// Fields of a document; missing paths read as `NULL`.
pub struct DocumentScope<'a>(pub &'a Value);

impl Scope for DocumentScope<'_> {
    fn lookup(&self, path: &DocPath) -> Result<Value> {
        Ok(self.0.at(path).cloned().unwrap_or(Value::Null))
    }
}

/// Columns of a table row; unknown columns are an error.
pub struct RowScope<'a> {
    pub columns: &'a [String],
    pub values: &'a [Value],
}

impl Scope for RowScope<'_> {
    fn lookup(&self, path: &DocPath) -> Result<Value> {
        let unknown = || EvalError::UnknownColumn(path.to_string());
        let Some(PathSegment::Key(column)) = path.segments().first() else {
            return Err(unknown());
        };
        let index = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .ok_or_else(unknown)?;
        let value = self.values.get(index).cloned().unwrap_or(Value::Null);
        let rest = &path.segments()[1..];
        match DocPath::from_segments(rest.to_vec()) {
            None => Ok(value),
            Some(rest) => Ok(value.at(&rest).cloned().unwrap_or(Value::Null)),
        }
    }
}

/// No record: every field reference is unknown.
pub struct EmptyScope;

impl Scope for EmptyScope {
    fn lookup(&self, path: &DocPath) -> Result<Value> {
        Err(EvalError::UnknownColumn(path.to_string()))
    }
}

/// Bound values plus the warnings raised while evaluating.
pub struct Env<'a> {
    named: &'a BTreeMap<String, Value>,
    positional: &'a [Value],
    pub warnings: Vec<Warning>,
}

impl<'a> Env<'a> {
    pub fn new(named: &'a BTreeMap<String, Value>, positional: &'a [Value]) -> Self {
        Self {
            named,
            positional,
            warnings: Vec::new(),
        }
    }

    fn warn(&mut self, code: u32, message: impl Into<String>) {
        self.warnings.push(Warning::warning(code, message));
    }
}

/// Evaluate `expr` against one record.
pub fn eval(expr: &Expr, scope: &dyn Scope, env: &mut Env<'_>) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Field(path) => scope.lookup(path),
        Expr::Named(name) => env
            .named
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Unbound(format!(":{}", name))),
        Expr::Positional(i) => env
            .positional
            .get(*i)
            .cloned()
            .ok_or_else(|| EvalError::Unbound(format!("#{}", i + 1))),
        Expr::Array(items) => items
            .iter()
            .map(|e| eval(e, scope, env))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Expr::Not(inner) => {
            let v = eval(inner, scope, env)?;
            Ok(truthy(&v).map_or(Value::Null, |b| Value::Bool(!b)))
        }
        Expr::Neg(inner) => {
            let v = eval(inner, scope, env)?;
            Ok(match to_number(&v, env) {
                None => Value::Null,
                Some(Num::Int(i)) => i
                    .checked_neg()
                    .map_or(Value::Float(-(i as f64)), Value::Int),
                Some(Num::Float(f)) => Value::Float(-f),
            })
        }
        Expr::Binary(BinaryOp::And, l, r) => {
            let a = truthy(&eval(l, scope, env)?);
            if a == Some(false) {
                return Ok(Value::Bool(false));
            }
            let b = truthy(&eval(r, scope, env)?);
            Ok(match (a, b) {
                (_, Some(false)) => Value::Bool(false),
                (Some(true), Some(true)) => Value::Bool(true),
                _ => Value::Null,
            })
        }
        Expr::Binary(BinaryOp::Or, l, r) => {
            let a = truthy(&eval(l, scope, env)?);
            if a == Some(true) {
                return Ok(Value::Bool(true));
            }
            let b = truthy(&eval(r, scope, env)?);
            Ok(match (a, b) {
                (_, Some(true)) => Value::Bool(true),
                (Some(false), Some(false)) => Value::Bool(false),
                _ => Value::Null,
            })
        }
        Expr::Binary(op, l, r) => {
            let a = eval(l, scope, env)?;
            let b = eval(r, scope, env)?;
            Ok(binary(*op, &a, &b, env))
        }
        Expr::Like {
            expr,
            pattern,
            negated,
        } => {
            let text = text_of(&eval(expr, scope, env)?);
            let pattern = text_of(&eval(pattern, scope, env)?);
            Ok(match (text, pattern) {
                (Some(t), Some(p)) => Value::Bool(like(&t, &p) != *negated),
                _ => Value::Null,
            })
        }
        Expr::In {
            expr,
            list,
            negated,
        } => {
            let needle = eval(expr, scope, env)?;
            if needle.is_null() {
                return Ok(Value::Null);
            }
            let mut saw_null = false;
            for item in list {
                let candidate = eval(item, scope, env)?;
                let members = match candidate {
                    Value::Array(members) => members,
                    other => vec![other],
                };
                for member in &members {
                    match values_equal(&needle, member, env) {
                        Some(true) => return Ok(Value::Bool(!negated)),
                        Some(false) => {}
                        None => saw_null = true,
                    }
                }
            }
            Ok(if saw_null {
                Value::Null
            } else {
                Value::Bool(*negated)
            })
        }
        Expr::Between {
            expr,
            low,
            high,
            negated,
        } => {
            let v = eval(expr, scope, env)?;
            let low = eval(low, scope, env)?;
            let high = eval(high, scope, env)?;
            let above = compare(&v, &low, env);
            let below = compare(&v, &high, env);
            Ok(match (above, below) {
                (Some(a), Some(b)) => {
                    Value::Bool((a != Ordering::Less && b != Ordering::Greater) != *negated)
                }
                _ => Value::Null,
            })
        }
        Expr::IsNull { expr, negated } => {
            let v = eval(expr, scope, env)?;
            Ok(Value::Bool(v.is_null() != *negated))
        }
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|e| eval(e, scope, env))
                .collect::<Result<Vec<_>>>()?;
            call(name, args, env)
        }
    }
}

/// Whether `expr` holds for the record. `NULL` does not match.
pub fn matches(expr: &Expr, scope: &dyn Scope, env: &mut Env<'_>) -> Result<bool> {
    Ok(truthy(&eval(expr, scope, env)?) == Some(true))
}

/// Resolve every `Value::Expr` nested in `value`.
pub fn resolve(value: &Value, scope: &dyn Scope, env: &mut Env<'_>) -> Result<Value> {
    match value {
        Value::Expr(e) => eval(&parse(e.text())?, scope, env),
        Value::Array(items) => items
            .iter()
            .map(|v| resolve(v, scope, env))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Value::Object(fields) => {
            let mut out = BTreeMap::new();
            for (k, v) in fields {
                out.insert(k.clone(), resolve(v, scope, env)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

/// SQL truth value; `None` for `NULL`.
pub fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::String(s) => Some(matches!(parse_number(s), Some(n) if !n.is_zero())),
        _ => Some(true),
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Num::Int(i) => i == 0,
            Num::Float(f) => f == 0.0,
        }
    }

    fn cmp(self, other: Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

fn parse_number(text: &str) -> Option<Num> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Num::Int(i));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Num::Float)
}

fn to_number(value: &Value, env: &mut Env<'_>) -> Option<Num> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::String(s) => Some(parse_number(s).unwrap_or_else(|| {
            env.warn(1292, format!("Truncated incorrect DOUBLE value: '{}'", s));
            Num::Int(0)
        })),
        other => {
            env.warn(1292, format!("Truncated incorrect DOUBLE value: '{}'", other));
            Some(Num::Int(0))
        }
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_) | Value::Bytes(_))
}

fn compare(a: &Value, b: &Value, env: &mut Env<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ if is_composite(a) || is_composite(b) => None,
        _ => {
            let x = to_number(a, env)?;
            let y = to_number(b, env)?;
            x.cmp(y)
        }
    }
}

fn values_equal(a: &Value, b: &Value, env: &mut Env<'_>) -> Option<bool> {
    match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        _ if is_composite(a) || is_composite(b) => Some(a == b),
        _ => compare(a, b, env).map(|o| o == Ordering::Equal),
    }
}

fn binary(op: BinaryOp, a: &Value, b: &Value, env: &mut Env<'_>) -> Value {
    let ordered = |o: Option<Ordering>, test: fn(Ordering) -> bool| {
        o.map_or(Value::Null, |o| Value::Bool(test(o)))
    };
    match op {
        BinaryOp::Eq => values_equal(a, b, env).map_or(Value::Null, Value::Bool),
        BinaryOp::Ne => values_equal(a, b, env).map_or(Value::Null, |e| Value::Bool(!e)),
        BinaryOp::Lt => ordered(compare(a, b, env), Ordering::is_lt),
        BinaryOp::Le => ordered(compare(a, b, env), Ordering::is_le),
        BinaryOp::Gt => ordered(compare(a, b, env), Ordering::is_gt),
        BinaryOp::Ge => ordered(compare(a, b, env), Ordering::is_ge),
        _ => arithmetic(op, a, b, env),
    }
}

fn arithmetic(op: BinaryOp, a: &Value, b: &Value, env: &mut Env<'_>) -> Value {
    let x = to_number(a, env);
    let y = to_number(b, env);
    let (Some(x), Some(y)) = (x, y) else {
        return Value::Null;
    };
    let int_or_float = |int_op: fn(i64, i64) -> Option<i64>, float_op: fn(f64, f64) -> f64| {
        match (x, y) {
            (Num::Int(p), Num::Int(q)) => int_op(p, q)
                .map_or_else(|| Value::Float(float_op(p as f64, q as f64)), Value::Int),
            _ => Value::Float(float_op(x.as_f64(), y.as_f64())),
        }
    };
    match op {
        BinaryOp::Add => int_or_float(i64::checked_add, |p, q| p + q),
        BinaryOp::Sub => int_or_float(i64::checked_sub, |p, q| p - q),
        BinaryOp::Mul => int_or_float(i64::checked_mul, |p, q| p * q),
        BinaryOp::Div | BinaryOp::Mod if y.is_zero() => {
            env.warn(1365, "Division by 0");
            Value::Null
        }
        BinaryOp::Div => Value::Float(x.as_f64() / y.as_f64()),
        BinaryOp::Mod => int_or_float(i64::checked_rem, |p, q| p % q),
        _ => Value::Null,
    }
}

/// Text form used by `LIKE` and the string functions.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LikeToken {
    AnyRun,
    AnyOne,
    Literal(char),
}

/// `LIKE` matching: `%` any run, `_` one character, `\` escapes.
///
/// Two-pointer scan that backtracks only to the latest `%`, so matching
/// stays within `text.len() * pattern.len()` steps.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        tokens.push(match c {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyOne,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            c => LikeToken::Literal(c),
        });
    }

    let (mut t, mut p) = (0, 0);
    // pattern index after the latest `%`, and the text index it resumes at
    let mut resume: Option<(usize, usize)> = None;
    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::AnyRun) => {
                p += 1;
                resume = Some((p, t));
            }
            Some(LikeToken::AnyOne) => {
                t += 1;
                p += 1;
            }
            Some(LikeToken::Literal(c)) if *c == text[t] => {
                t += 1;
                p += 1;
            }
            _ => match resume {
                Some((after, from)) => {
                    p = after;
                    t = from + 1;
                    resume = Some((after, from + 1));
                }
                None => return false,
            },
        }
    }
    tokens[p..].iter().all(|k| *k == LikeToken::AnyRun)
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::Arguments(name.to_string()))
    }
}

fn call(name: &str, args: Vec<Value>, env: &mut Env<'_>) -> Result<Value> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "lower" | "upper" => {
            arity(name, &args, 1)?;
            Ok(text_of(&args[0]).map_or(Value::Null, |s| {
                Value::String(if lower == "lower" {
                    s.to_lowercase()
                } else {
                    s.to_uppercase()
                })
            }))
        }
        "length" | "char_length" => {
            arity(name, &args, 1)?;
            Ok(text_of(&args[0]).map_or(Value::Null, |s| {
                let n = if lower == "length" {
                    s.len()
                } else {
                    s.chars().count()
                };
                Value::Int(n as i64)
            }))
        }
        "concat" => {
            if args.is_empty() {
                return Err(EvalError::Arguments(name.to_string()));
            }
            let parts: Option<Vec<String>> = args.iter().map(text_of).collect();
            Ok(parts.map_or(Value::Null, |p| Value::String(p.concat())))
        }
        "abs" => {
            arity(name, &args, 1)?;
            Ok(match to_number(&args[0], env) {
                None => Value::Null,
                Some(Num::Int(i)) => i
                    .checked_abs()
                    .map_or(Value::Float((i as f64).abs()), Value::Int),
                Some(Num::Float(f)) => Value::Float(f.abs()),
            })
        }
        "ifnull" => {
            arity(name, &args, 2)?;
            Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(Value::Null))
        }
        "coalesce" => {
            if args.is_empty() {
                return Err(EvalError::Arguments(name.to_string()));
            }
            Ok(args.into_iter().find(|v| !v.is_null()).unwrap_or(Value::Null))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
