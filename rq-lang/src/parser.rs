use std::{ops::Range, rc::Rc};

use serde_json::Value;

use crate::{
    expression::{AssignOp, Expression, ExpressionKind},
    operators::{AddOrSubtractOp, ComparisonOp, EqualityOp, MultiplyOrDivideOp, UnaryOp},
    syntax_error::SyntaxError,
    tokenizer::{Token, TokenWithRange, Tokenizer},
};

type ParseResult = Result<Expression, SyntaxError>;

/// How many nested assignments and unary operators an expression may
/// contain. Each level of parentheses, brackets or braces uses two.
const MAX_NESTING_DEPTH: usize = 100;

/// Parses a sequence of statements (separated by semicolons) into
/// expressions.
pub fn parse_program<T: AsRef<str>>(source: T) -> Result<Vec<Expression>, SyntaxError> {
    let source_len = source.as_ref().len();
    let tokens = Tokenizer::new(source).remaining_tokens()?;
    let mut parser = Parser {
        tokens,
        index: 0,
        last_end: 0,
        source_len,
        depth: 0,
    };
    let statements = parser.parse_statements(None)?;
    if let Some((token, range)) = parser.next_token() {
        return Err(SyntaxError::UnexpectedToken(token, range));
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<TokenWithRange>,
    index: usize,
    /// End of the most recently consumed token, used to compute the
    /// span of each parsed expression.
    last_end: usize,
    source_len: usize,
    depth: usize,
}

impl Parser {
    fn peek_next_token(&self) -> Option<&Token> {
        self.tokens.get(self.index).map(|(token, _)| token)
    }

    fn next_token_start(&self) -> usize {
        self.tokens
            .get(self.index)
            .map_or(self.source_len, |(_, range)| range.start)
    }

    fn next_token(&mut self) -> Option<TokenWithRange> {
        let token_with_range = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        self.last_end = token_with_range.1.end;
        Some(token_with_range)
    }

    fn next_unwrapped_token(&mut self) -> Result<TokenWithRange, SyntaxError> {
        self.next_token().ok_or(SyntaxError::UnexpectedEndOfInput)
    }

    fn accept_next_token(&mut self, token: &Token) -> bool {
        if self.peek_next_token() == Some(token) {
            self.next_token();
            true
        } else {
            false
        }
    }

    fn expect_next_token(&mut self, expected: Token) -> Result<(), SyntaxError> {
        match self.tokens.get(self.index) {
            Some((token, _)) if *token == expected => {
                self.next_token();
                Ok(())
            }
            Some((_, range)) => Err(SyntaxError::ExpectedToken(expected, range.clone())),
            None => Err(SyntaxError::UnexpectedEndOfInput),
        }
    }

    fn try_next_token<T, F>(&mut self, f: F) -> Option<T>
    where
        F: Fn(&Token) -> Option<T>,
    {
        let result = f(self.peek_next_token()?)?;
        self.next_token();
        Some(result)
    }

    /// Runs `parse` one level deeper, failing if that's too deep.
    fn nested<F>(&mut self, parse: F) -> ParseResult
    where
        F: FnOnce(&mut Self) -> ParseResult,
    {
        if self.depth >= MAX_NESTING_DEPTH {
            let start = self.next_token_start();
            return Err(SyntaxError::NestedTooDeeply(start..start + 1));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn span_from(&self, start: usize) -> Range<usize> {
        start..self.last_end
    }

    fn expect_identifier(&mut self) -> Result<Rc<str>, SyntaxError> {
        match self.next_unwrapped_token()? {
            (Token::Identifier(name), _) => Ok(name),
            (token, range) => Err(SyntaxError::UnexpectedToken(token, range)),
        }
    }

    /// Parses statements until `terminator` (or the end of input, if
    /// `terminator` is `None`). The terminator itself is consumed.
    fn parse_statements(
        &mut self,
        terminator: Option<Token>,
    ) -> Result<Vec<Expression>, SyntaxError> {
        let mut statements = vec![];
        loop {
            while self.accept_next_token(&Token::Semicolon) {}
            if self.peek_next_token() == terminator.as_ref() {
                break;
            }
            statements.push(self.parse_assignment()?);
            if !self.accept_next_token(&Token::Semicolon) {
                break;
            }
        }
        if let Some(terminator) = terminator {
            self.expect_next_token(terminator)?;
        }
        Ok(statements)
    }

    fn parse_arguments(&mut self, terminator: Token) -> Result<Vec<Expression>, SyntaxError> {
        let mut arguments = vec![];
        while !self.accept_next_token(&terminator) {
            arguments.push(self.parse_assignment()?);
            if !self.accept_next_token(&Token::Comma) {
                self.expect_next_token(terminator)?;
                break;
            }
        }
        Ok(arguments)
    }

    fn parse_assignment(&mut self) -> ParseResult {
        self.nested(Self::parse_unnested_assignment)
    }

    fn parse_unnested_assignment(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let target = self.parse_conditional()?;
        let Some(op) = self.try_next_token(|token| match token {
            Token::Equals => Some(AssignOp::Set),
            Token::PlusEquals => Some(AssignOp::Add),
            Token::MinusEquals => Some(AssignOp::Subtract),
            _ => None,
        }) else {
            return Ok(target);
        };
        let target_range = target.range.clone();
        let Some(place) = target.into_place() else {
            return Err(SyntaxError::InvalidAssignmentTarget(target_range));
        };
        let value = self.parse_assignment()?;
        Ok(Expression::new(
            ExpressionKind::Assign(place, op, Box::new(value)),
            self.span_from(start),
        ))
    }

    fn parse_conditional(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let condition = self.parse_logical_or()?;
        if !self.accept_next_token(&Token::QuestionMark) {
            return Ok(condition);
        }
        let then_value = self.parse_assignment()?;
        self.expect_next_token(Token::Colon)?;
        let else_value = self.parse_assignment()?;
        Ok(Expression::new(
            ExpressionKind::Conditional(
                Box::new(condition),
                Box::new(then_value),
                Box::new(else_value),
            ),
            self.span_from(start),
        ))
    }

    fn parse_logical_or(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_logical_and()?;

        while self.accept_next_token(&Token::Or) {
            let second_operand = self.parse_logical_and()?;
            value = Expression::new(
                ExpressionKind::LogicalOr(Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_logical_and(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_equality()?;

        while self.accept_next_token(&Token::And) {
            let second_operand = self.parse_equality()?;
            value = Expression::new(
                ExpressionKind::LogicalAnd(Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_equality(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_comparison()?;

        while let Some(op) = self.try_next_token(EqualityOp::from_token) {
            let second_operand = self.parse_comparison()?;
            value = Expression::new(
                ExpressionKind::Equality(op, Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_comparison(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_add_or_subtract()?;

        while let Some(op) = self.try_next_token(ComparisonOp::from_token) {
            let second_operand = self.parse_add_or_subtract()?;
            value = Expression::new(
                ExpressionKind::Comparison(op, Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_add_or_subtract(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_multiply_or_divide()?;

        while let Some(op) = self.try_next_token(AddOrSubtractOp::from_token) {
            let second_operand = self.parse_multiply_or_divide()?;
            value = Expression::new(
                ExpressionKind::AddOrSubtract(op, Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_multiply_or_divide(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_unary()?;

        while let Some(op) = self.try_next_token(MultiplyOrDivideOp::from_token) {
            let second_operand = self.parse_unary()?;
            value = Expression::new(
                ExpressionKind::MultiplyOrDivide(op, Box::new(value), Box::new(second_operand)),
                self.span_from(start),
            );
        }

        Ok(value)
    }

    fn parse_unary(&mut self) -> ParseResult {
        self.nested(Self::parse_unnested_unary)
    }

    fn parse_unnested_unary(&mut self) -> ParseResult {
        let start = self.next_token_start();
        if let Some(op) = self.try_next_token(UnaryOp::from_token) {
            let operand = self.parse_unary()?;
            return Ok(Expression::new(
                ExpressionKind::Unary(op, Box::new(operand)),
                self.span_from(start),
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> ParseResult {
        let start = self.next_token_start();
        let mut value = self.parse_primary()?;

        loop {
            if self.accept_next_token(&Token::Dot) {
                let name = self.expect_identifier()?;
                value = Expression::new(
                    ExpressionKind::Field(Box::new(value), name),
                    self.span_from(start),
                );
            } else if self.accept_next_token(&Token::LeftBracket) {
                let index = self.parse_assignment()?;
                self.expect_next_token(Token::RightBracket)?;
                value = Expression::new(
                    ExpressionKind::Index(Box::new(value), Box::new(index)),
                    self.span_from(start),
                );
            } else {
                break;
            }
        }

        Ok(value)
    }

    fn parse_object_entries(&mut self) -> Result<Vec<(Rc<str>, Expression)>, SyntaxError> {
        let mut entries = vec![];
        while !self.accept_next_token(&Token::RightBrace) {
            let key = match self.next_unwrapped_token()? {
                (Token::Identifier(name), _) | (Token::StringLiteral(name), _) => name,
                (token, range) => return Err(SyntaxError::UnexpectedToken(token, range)),
            };
            self.expect_next_token(Token::Colon)?;
            entries.push((key, self.parse_assignment()?));
            if !self.accept_next_token(&Token::Comma) {
                self.expect_next_token(Token::RightBrace)?;
                break;
            }
        }
        Ok(entries)
    }

    fn parse_primary(&mut self) -> ParseResult {
        let (token, range) = self.next_unwrapped_token()?;
        let start = range.start;
        let kind = match token {
            Token::NumericLiteral(number) => ExpressionKind::Literal(Value::Number(number)),
            Token::StringLiteral(string) => ExpressionKind::Literal(Value::String(string.to_string())),
            Token::True => ExpressionKind::Literal(Value::Bool(true)),
            Token::False => ExpressionKind::Literal(Value::Bool(false)),
            Token::Null => ExpressionKind::Literal(Value::Null),
            Token::Identifier(name) => {
                if self.accept_next_token(&Token::LeftParen) {
                    ExpressionKind::Call(name, self.parse_arguments(Token::RightParen)?)
                } else {
                    ExpressionKind::Variable(name)
                }
            }
            Token::LeftParen => {
                let mut statements = self.parse_statements(Some(Token::RightParen))?;
                if statements.len() == 1 {
                    if let Some(statement) = statements.pop() {
                        return Ok(statement);
                    }
                }
                ExpressionKind::Sequence(statements)
            }
            Token::LeftBracket => ExpressionKind::Array(self.parse_arguments(Token::RightBracket)?),
            Token::LeftBrace => ExpressionKind::Object(self.parse_object_entries()?),
            Token::Apply => {
                let name = self.expect_identifier()?;
                self.expect_next_token(Token::LeftBrace)?;
                ExpressionKind::Apply(name, self.parse_statements(Some(Token::RightBrace))?)
            }
            token => return Err(SyntaxError::UnexpectedToken(token, range)),
        };
        Ok(Expression::new(kind, self.span_from(start)))
    }
}
