//! Pratt parser: turns the lexer's token stream into an AST.
//!
//! The parser keeps two tokens of lookahead (`cur`, `peek`) and dispatches on
//! the current token kind: a prefix rule starts every expression, and infix
//! rules extend it while the next operator binds tighter than the enclosing
//! context. Errors accumulate on the parser; parsing continues with the next
//! statement where possible, so the caller gets the whole error list at once.

use kaze_lexer::Lexer;
use kaze_syntax::ast::{Expr, InfixOp, PrefixOp, Program, Stmt};
use kaze_syntax::error::Error;
use kaze_syntax::token::{Token, TokenKind};

/// Binding powers, weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,      // =
    AndOr,       // && or ||
    Equals,      // == or !=
    LessGreater, // < > <= >=
    Sum,         // + -
    Product,     // * /
    Prefix,      // -x or !x
    Index,       // a[x]
    Call,        // f(x)
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Assign => Precedence::Assign,
        TokenKind::And | TokenKind::Or => Precedence::AndOr,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Le | TokenKind::Ge => Precedence::LessGreater,
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
        TokenKind::LBracket => Precedence::Index,
        TokenKind::LParen => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

fn infix_op(kind: TokenKind) -> Option<InfixOp> {
    Some(match kind {
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Sub,
        TokenKind::Asterisk => InfixOp::Mul,
        TokenKind::Slash => InfixOp::Div,
        TokenKind::Eq => InfixOp::Eq,
        TokenKind::NotEq => InfixOp::NotEq,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        TokenKind::Lt => InfixOp::Lt,
        TokenKind::Gt => InfixOp::Gt,
        TokenKind::Le => InfixOp::Le,
        TokenKind::Ge => InfixOp::Ge,
        _ => return None,
    })
}

/// Recursive-descent Pratt parser over a [`Lexer`].
pub struct Parser {
    lexer: Lexer,
    cur: Token,
    peek: Token,
    errors: Vec<Error>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            cur,
            peek,
            errors: Vec::new(),
        }
    }

    /// Convenience constructor straight from source text.
    pub fn from_source(input: &str) -> Self {
        Self::new(Lexer::new(input))
    }

    /// Errors accumulated so far.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    fn next_token(&mut self) {
        let next = self.lexer.next_token();
        self.cur = std::mem::replace(&mut self.peek, next);
    }

    fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur.kind)
    }

    fn peek_precedence(&self) -> Precedence {
        precedence_of(self.peek.kind)
    }

    /// Advance when the peek token matches, otherwise record an error.
    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(Error::new(format!(
                "expected next token to be {}, got {} instead",
                kind, self.peek.kind
            )));
            false
        }
    }

    /// Parse the whole token stream. The returned program may be partial when
    /// [`Parser::errors`] is non-empty.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                program.statements.push(stmt);
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Var => self.parse_var_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Fun => self.parse_function_definition(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Break => {
                self.skip_optional_semicolon();
                Some(Stmt::Break)
            }
            TokenKind::Continue => {
                self.skip_optional_semicolon();
                Some(Stmt::Continue)
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
    }

    fn parse_var_statement(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.literal.clone();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Stmt::Var { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Stmt> {
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
            return Some(Stmt::Return(None));
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Stmt::Return(Some(value)))
    }

    fn parse_function_definition(&mut self) -> Option<Stmt> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.literal.clone();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let params = self.parse_function_parameters()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_expression();
        Some(Stmt::FunctionDef { name, params, body })
    }

    /// Parses `a, b, c` with the cursor on the first parameter (or already on
    /// the closing paren for an empty list). Leaves the cursor on `)`.
    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut params = Vec::new();
        if self.cur_is(TokenKind::RParen) {
            return Some(params);
        }
        if !self.cur_is(TokenKind::Ident) {
            self.errors.push(Error::new(format!(
                "expected parameter name, got {} instead",
                self.cur.kind
            )));
            return None;
        }
        params.push(self.cur.literal.clone());
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            params.push(self.cur.literal.clone());
        }
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(params)
    }

    fn parse_while_statement(&mut self) -> Option<Stmt> {
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_expression();
        Some(Stmt::While { cond, body })
    }

    fn parse_expression_statement(&mut self) -> Option<Stmt> {
        let expr = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();
        Some(Stmt::Expr(expr))
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;

        // every token with a precedence above Lowest has an infix rule
        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            self.next_token();
            left = self.parse_infix(left)?;
        }

        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Ident => Some(Expr::Ident(self.cur.literal.clone())),
            TokenKind::Int => self.parse_integer_literal(),
            TokenKind::True => Some(Expr::Bool(true)),
            TokenKind::False => Some(Expr::Bool(false)),
            TokenKind::Str => Some(Expr::Str(self.cur.literal.clone())),
            TokenKind::Null => Some(Expr::Null),
            TokenKind::Minus => self.parse_prefix_expression(PrefixOp::Neg),
            TokenKind::Bang => self.parse_prefix_expression(PrefixOp::Not),
            TokenKind::LParen => self.parse_grouped_expression(),
            TokenKind::LBrace => Some(self.parse_block_expression()),
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Hash => self.parse_hash_literal(),
            TokenKind::LBracket => self.parse_array_literal(),
            _ => {
                self.errors.push(Error::new(format!(
                    "no prefix parse function for {} found",
                    self.cur.kind
                )));
                None
            }
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Assign => self.parse_assign_expression(left),
            TokenKind::LParen => self.parse_call_expression(left),
            TokenKind::LBracket => self.parse_index_expression(left),
            kind => {
                let op = infix_op(kind)?;
                let precedence = self.cur_precedence();
                self.next_token();
                let right = self.parse_expression(precedence)?;
                Some(Expr::Infix {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expr> {
        match self.cur.literal.parse::<i64>() {
            Ok(value) => Some(Expr::Int(value)),
            Err(_) => {
                self.errors.push(Error::new(format!(
                    "could not parse {:?} as integer",
                    self.cur.literal
                )));
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self, op: PrefixOp) -> Option<Expr> {
        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expr::Prefix {
            op,
            right: Box::new(right),
        })
    }

    /// Assignment targets are identifiers or index expressions; the value is
    /// parsed at the weakest binding power so `a = b = 1` nests to the right.
    fn parse_assign_expression(&mut self, left: Expr) -> Option<Expr> {
        match left {
            Expr::Ident(_) | Expr::Index { .. } => {}
            other => {
                self.errors.push(Error::new(format!(
                    "unexpected expression on left side of =: {}",
                    other
                )));
                return None;
            }
        }
        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        Some(Expr::Assign {
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expr)
    }

    /// Parses `{ stmt* }` with the cursor on `{`. Leaves the cursor on `}`.
    fn parse_block_expression(&mut self) -> Expr {
        let mut statements = Vec::new();
        self.next_token();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            self.next_token();
        }
        Expr::Block(statements)
    }

    fn parse_if_expression(&mut self) -> Option<Expr> {
        self.next_token();
        let cond = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_expression();

        let mut alternative = None;
        if self.peek_is(TokenKind::Else) {
            self.next_token();
            if self.peek_is(TokenKind::If) {
                // `else if` chains nest as the alternative
                self.next_token();
                alternative = Some(Box::new(self.parse_if_expression()?));
            } else {
                if !self.expect_peek(TokenKind::LBrace) {
                    return None;
                }
                alternative = Some(Box::new(self.parse_block_expression()));
            }
        }

        Some(Expr::If {
            cond: Box::new(cond),
            consequence: Box::new(consequence),
            alternative,
        })
    }

    fn parse_call_expression(&mut self, callee: Expr) -> Option<Expr> {
        self.next_token();
        let args = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expr::Call {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_index_expression(&mut self, left: Expr) -> Option<Expr> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expr::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    /// Comma-separated expressions up to `end`; no trailing comma.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.cur_is(end) {
            return Some(list);
        }
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    /// Same as [`Parser::parse_expression_list`] but a trailing comma before
    /// `end` is allowed (array literals).
    fn parse_expression_list_trailing(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut list = Vec::new();
        if self.cur_is(end) {
            return Some(list);
        }
        list.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if self.peek_is(end) {
                break;
            }
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        self.next_token();
        let elements = self.parse_expression_list_trailing(TokenKind::RBracket)?;
        Some(Expr::Array(elements))
    }

    /// `#{ key: value, ... }`; a trailing comma is a syntax error.
    fn parse_hash_literal(&mut self) -> Option<Expr> {
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let mut pairs = Vec::new();
        if self.peek_is(TokenKind::RBrace) {
            self.next_token();
            return Some(Expr::Hash(pairs));
        }
        loop {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.peek_is(TokenKind::Comma) {
                self.next_token();
                continue;
            }
            break;
        }
        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }
        Some(Expr::Hash(pairs))
    }
}
