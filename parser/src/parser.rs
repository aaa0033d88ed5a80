//! FILENAME: parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that can be evaluated.
//!
//! GRAMMAR:
//!   expression     --> comparison
//!   comparison     --> additive ( ("=" | "<>" | "<" | ">" | "<=" | ">=") additive )?
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> "-" unary | primary
//!   primary        --> NUMBER | STRING | cell_or_range | function_call | "(" expression ")"
//!   cell_or_range  --> cell_ref (":" cell_ref)?
//!   cell_ref       --> COLUMN ROW
//!   function_call  --> IDENTIFIER "(" arguments? ")"
//!   arguments      --> expression ("," expression)*

use crate::ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a formula string into an expression tree.
/// Convenience wrapper around `Parser` for one-shot use.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input and returns the AST.
    /// Handles the optional leading '=' that indicates a formula.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        // Skip the leading '=' if present (formula indicator)
        if self.current_token == Token::Equals {
            self.advance();
        }

        // Handle empty formula
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        // Ensure we consumed all tokens
        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {:?}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Checks if the current token matches the expected token.
    /// If it matches, advances and returns Ok. Otherwise returns an error.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {:?}, found {:?}",
                expected, self.current_token
            )))
        }
    }

    /// Entry point for expression parsing.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_comparison()
    }

    /// Parses an optional single comparison (=, <>, <, >, <=, >=).
    /// Comparisons do not chain: `a < b < c` is rejected by the EOF check
    /// in `parse`, matching the one-comparison-per-expression grammar.
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let left = self.parse_additive()?;

        let op = match &self.current_token {
            Token::Equals => BinaryOperator::Equal,
            Token::NotEqual => BinaryOperator::NotEqual,
            Token::LessThan => BinaryOperator::LessThan,
            Token::GreaterThan => BinaryOperator::GreaterThan,
            Token::LessEqual => BinaryOperator::LessEqual,
            Token::GreaterEqual => BinaryOperator::GreaterEqual,
            _ => return Ok(left),
        };

        self.advance();
        let right = self.parse_additive()?;

        Ok(Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses unary expressions (negation).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::Minus {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_primary()
    }

    /// Parses primary expressions (literals, cell refs, ranges, function
    /// calls, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }

            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            // Identifier: a function call when followed by '(',
            // otherwise a cell reference or range.
            Token::Identifier(name) => {
                self.advance();

                if self.current_token == Token::LParen {
                    return self.parse_function_call(&name);
                }

                let start = self.make_cell_ref(&name)?;

                // Check for a range (cell_ref : cell_ref)
                if self.current_token == Token::Colon {
                    self.advance();
                    let end_name = match self.current_token.clone() {
                        Token::Identifier(n) => {
                            self.advance();
                            n
                        }
                        other => {
                            return Err(ParseError::new(format!(
                                "Expected cell reference after ':', found {:?}",
                                other
                            )));
                        }
                    };
                    let end = self.make_cell_ref(&end_name)?;
                    return Ok(Expression::Range {
                        start: Box::new(start),
                        end: Box::new(end),
                    });
                }

                Ok(start)
            }

            other => Err(ParseError::new(format!(
                "Unexpected token: {:?}",
                other
            ))),
        }
    }

    /// Parses a function call after the name identifier has been consumed.
    /// The current token is the opening parenthesis.
    fn parse_function_call(&mut self, name: &str) -> ParseResult<Expression> {
        let func = BuiltinFunction::from_name(name)
            .ok_or_else(|| ParseError::new(format!("Unknown function: {}", name)))?;

        self.expect(Token::LParen)?;

        let mut args = Vec::new();
        if self.current_token != Token::RParen {
            args.push(self.parse_expression()?);
            while self.current_token == Token::Comma {
                self.advance();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(Token::RParen)?;

        Ok(Expression::FunctionCall { func, args })
    }

    /// Splits an identifier like "AB23" into a CellRef expression.
    /// The column part is one or more letters, the row part one or more
    /// digits; anything else (no digits, letters after digits) is rejected.
    fn make_cell_ref(&self, ident: &str) -> ParseResult<Expression> {
        let letters: String = ident.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let rest = &ident[letters.len()..];

        if letters.is_empty() || rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::new(format!(
                "Invalid cell reference: {}",
                ident
            )));
        }

        let row: u32 = rest
            .parse()
            .map_err(|_| ParseError::new(format!("Invalid row number in: {}", ident)))?;
        if row == 0 {
            return Err(ParseError::new(format!(
                "Row numbers start at 1: {}",
                ident
            )));
        }

        Ok(Expression::CellRef { col: letters, row })
    }
}
