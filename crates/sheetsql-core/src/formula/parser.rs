//! Formula expression parser
//!
//! A Pratt parser over the tokens from [`super::lexer`]. Precedence, loosest
//! to tightest: comparisons, `&`, `+ -`, `* /`, `^`, postfix `%`, unary
//! `+ -`. All binary operators are left-associative, so `2^3^2` is `64`
//! and `-2^2` is `4`.

use sheetsql_model::{CellRange, CellRef, ErrorCode};

use super::lexer::{tokenize, Spanned, Token};
use super::EvalError;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
}

/// Parsed formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorCode),
    /// Single cell, optionally qualified with a sheet name
    Reference {
        sheet: Option<String>,
        at: CellRef,
    },
    /// Rectangular block of cells
    Range {
        sheet: Option<String>,
        range: CellRange,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Percent(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Function call; the name is upper-cased
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

const PREFIX_BP: u8 = 70;
const POSTFIX_BP: u8 = 60;

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Pow => (50, 51),
        BinaryOp::Mul | BinaryOp::Div => (40, 41),
        BinaryOp::Add | BinaryOp::Sub => (30, 31),
        BinaryOp::Concat => (20, 21),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            (10, 11)
        }
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Caret => BinaryOp::Pow,
        Token::Amp => BinaryOp::Concat,
        Token::Eq => BinaryOp::Eq,
        Token::Ne => BinaryOp::Ne,
        Token::Lt => BinaryOp::Lt,
        Token::Gt => BinaryOp::Gt,
        Token::Le => BinaryOp::Le,
        Token::Ge => BinaryOp::Ge,
        _ => return None,
    })
}

/// Parse formula text (with or without the leading `=`)
pub fn parse(formula: &str) -> Result<Expr, EvalError> {
    let text = formula.trim();
    let text = text.strip_prefix('=').unwrap_or(text);
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
    };
    let expr = parser.parse_expression(0)?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(parser.error(format!("unexpected {:?} after expression", other))),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .or_else(|| self.tokens.last())
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.position)
            .unwrap_or(0)
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Syntax {
            position: self.position(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), EvalError> {
        if *self.peek() == expected {
            self.next();
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", expected, self.peek())))
        }
    }

    fn parse_expression(&mut self, min_bp: u8) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            if matches!(self.peek(), Token::Percent) && POSTFIX_BP >= min_bp {
                self.next();
                lhs = Expr::Percent(Box::new(lhs));
                continue;
            }

            let Some(op) = binary_op(self.peek()) else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.next();
            let rhs = self.parse_expression(r_bp)?;
            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Minus,
            Token::Plus => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.next();
        let expr = self.parse_expression(PREFIX_BP)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Text(s)),
            Token::Error(code) => Ok(Expr::Error(code)),
            Token::LParen => {
                let expr = self.parse_expression(0)?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Token::QuotedSheet(sheet) => {
                self.expect(Token::Bang)?;
                self.parse_reference(Some(sheet))
            }
            Token::Ident(ident) => match self.peek() {
                Token::LParen => {
                    self.next();
                    self.parse_call(ident.to_ascii_uppercase())
                }
                Token::Bang => {
                    self.next();
                    self.parse_reference(Some(ident))
                }
                _ if ident.eq_ignore_ascii_case("TRUE") => Ok(Expr::Boolean(true)),
                _ if ident.eq_ignore_ascii_case("FALSE") => Ok(Expr::Boolean(false)),
                _ => {
                    self.pos -= 1;
                    self.parse_reference(None)
                }
            },
            Token::Eof => Err(self.error("unexpected end of formula")),
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    fn parse_reference(&mut self, sheet: Option<String>) -> Result<Expr, EvalError> {
        let start = self.cell_ref()?;
        if !matches!(self.peek(), Token::Colon) {
            return Ok(Expr::Reference { sheet, at: start });
        }
        self.next();
        let end = self.cell_ref()?;
        Ok(Expr::Range {
            sheet,
            range: CellRange::new(start, end),
        })
    }

    fn cell_ref(&mut self) -> Result<CellRef, EvalError> {
        match self.peek().clone() {
            Token::Ident(text) => {
                let at = CellRef::parse(&text)
                    .map_err(|_| self.error(format!("unknown name '{}'", text)))?;
                self.next();
                Ok(at)
            }
            other => Err(self.error(format!("expected a cell reference, found {:?}", other))),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, EvalError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Token::RParen) {
            self.next();
            return Ok(Expr::Call { name, args });
        }
        loop {
            args.push(self.parse_expression(0)?);
            match self.next() {
                Token::Comma => continue,
                Token::RParen => break,
                other => {
                    return Err(self.error(format!("expected ',' or ')', found {:?}", other)))
                }
            }
        }
        Ok(Expr::Call { name, args })
    }
}
