//! Recursive-descent parser for the statement language.
//!
//! Parsing happens in two steps: physical lines are assembled into
//! logical lines (joined while brackets stay open, blank and comment-only
//! lines dropped), then a recursive descent walks the logical lines using
//! their indentation for block structure and their tokens for statements
//! and expressions.

use std::rc::Rc;

use crate::ast::{BinaryOp, Expr, FnDef, Program, Stmt, UnaryOp};
use crate::error::SyntaxError;
use crate::lexer::{lex_line, Spanned, Token};

/// Parse a statement or statement sequence from a string.
pub fn parse(source: &str) -> Result<Program, SyntaxError> {
    let lines = assemble(source)?;
    Parser {
        lines,
        pos: 0,
        cursor: 0,
        fn_depth: 0,
    }
    .parse_program()
}

/// One logical line: physical lines joined while brackets stay open.
struct LogicalLine {
    indent: usize,
    tokens: Vec<Spanned>,
    /// First physical line, 1-based.
    line: usize,
}

fn indent_width(text: &str) -> usize {
    text.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn assemble(source: &str) -> Result<Vec<LogicalLine>, SyntaxError> {
    let mut lines = Vec::new();
    let mut current: Option<LogicalLine> = None;
    let mut depth: i32 = 0;

    for (idx, text) in source.lines().enumerate() {
        let tokens = lex_line(text, idx + 1)?;
        if tokens.is_empty() && current.is_none() {
            continue;
        }
        for t in &tokens {
            match t.token {
                Token::LParen | Token::LBracket => depth += 1,
                // Stray closers end the logical line; the parser reports them.
                Token::RParen | Token::RBracket => depth = (depth - 1).max(0),
                _ => {}
            }
        }
        match current.as_mut() {
            Some(line) => line.tokens.extend(tokens),
            None => {
                current = Some(LogicalLine {
                    indent: indent_width(text),
                    tokens,
                    line: idx + 1,
                });
            }
        }
        if depth == 0 {
            if let Some(line) = current.take() {
                lines.push(line);
            }
        }
    }
    // A bracket group left open at end of input still reaches the parser,
    // which reports the missing closer.
    if let Some(line) = current {
        lines.push(line);
    }
    Ok(lines)
}

struct Parser {
    lines: Vec<LogicalLine>,
    /// Current logical line.
    pos: usize,
    /// Token index within the current logical line.
    cursor: usize,
    /// Nesting depth of `fn` suites, for rejecting stray `return`.
    fn_depth: usize,
}

impl Parser {
    fn parse_program(mut self) -> Result<Program, SyntaxError> {
        if self.lines.is_empty() {
            return Ok(Program::default());
        }
        let indent = self.lines[0].indent;
        let body = self.parse_block(indent)?;
        if let Some(line) = self.lines.get(self.pos) {
            return Err(SyntaxError {
                message: "unindent does not match any outer indentation level".to_string(),
                line: line.line,
                column: line.indent,
            });
        }
        Ok(Program { body })
    }

    /// Parse consecutive statements at exactly `indent`.
    fn parse_block(&mut self, indent: usize) -> Result<Vec<Stmt>, SyntaxError> {
        let mut body = Vec::new();
        while let Some(line) = self.lines.get(self.pos) {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(SyntaxError {
                    message: "unexpected indent".to_string(),
                    line: line.line,
                    column: line.indent,
                });
            }
            body.push(self.parse_stmt()?);
        }
        Ok(body)
    }

    /// Parse the indented suite after a `fn` / `if` / `while` header.
    fn parse_suite(&mut self, header_indent: usize, header_line: usize) -> Result<Vec<Stmt>, SyntaxError> {
        match self.lines.get(self.pos) {
            Some(l) if l.indent > header_indent => {
                let indent = l.indent;
                self.parse_block(indent)
            }
            _ => Err(SyntaxError {
                message: "expected an indented block".to_string(),
                line: header_line,
                column: 0,
            }),
        }
    }

    fn parse_stmt(&mut self) -> Result<Stmt, SyntaxError> {
        self.cursor = 0;
        let indent = self.lines[self.pos].indent;
        let line = self.lines[self.pos].line;
        match self.peek().cloned() {
            Some(Token::Fn) => self.parse_fn(indent, line),
            Some(Token::If) => self.parse_if(indent, line),
            Some(Token::While) => self.parse_while(indent, line),
            Some(Token::Return) => {
                if self.fn_depth == 0 {
                    return Err(self.error_here("'return' outside function"));
                }
                self.advance();
                let value = if self.at_end_of_line() {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.end_of_line()?;
                self.pos += 1;
                Ok(Stmt::Return { value, line })
            }
            _ => {
                if self.at_assignment() {
                    let name = self.expect_name()?;
                    self.expect(&Token::Assign)?;
                    let value = self.parse_expr()?;
                    self.end_of_line()?;
                    self.pos += 1;
                    Ok(Stmt::Assign { name, value, line })
                } else {
                    let value = self.parse_expr()?;
                    self.end_of_line()?;
                    self.pos += 1;
                    Ok(Stmt::Expr { value, line })
                }
            }
        }
    }

    fn at_assignment(&self) -> bool {
        let tokens = &self.lines[self.pos].tokens;
        matches!(
            (
                tokens.get(self.cursor).map(|s| &s.token),
                tokens.get(self.cursor + 1).map(|s| &s.token),
            ),
            (Some(Token::Name(_)), Some(Token::Assign))
        )
    }

    fn parse_fn(&mut self, indent: usize, line: usize) -> Result<Stmt, SyntaxError> {
        self.advance(); // fn
        let name = self.expect_name()?;
        self.expect(&Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.expect_name()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;
        self.expect(&Token::Colon)?;
        self.end_of_line()?;
        self.pos += 1;
        self.fn_depth += 1;
        let body = self.parse_suite(indent, line);
        self.fn_depth -= 1;
        Ok(Stmt::FnDef(Rc::new(FnDef {
            name,
            params,
            body: body?,
            line,
        })))
    }

    fn parse_if(&mut self, indent: usize, line: usize) -> Result<Stmt, SyntaxError> {
        self.advance(); // if
        let cond = self.parse_expr()?;
        self.expect(&Token::Colon)?;
        self.end_of_line()?;
        self.pos += 1;
        let then = self.parse_suite(indent, line)?;
        let mut orelse = Vec::new();
        if let Some(l) = self.lines.get(self.pos) {
            let is_else = l.indent == indent
                && matches!(l.tokens.first().map(|s| &s.token), Some(Token::Else));
            if is_else {
                self.cursor = 0;
                let else_line = l.line;
                self.advance(); // else
                self.expect(&Token::Colon)?;
                self.end_of_line()?;
                self.pos += 1;
                orelse = self.parse_suite(indent, else_line)?;
            }
        }
        Ok(Stmt::If {
            cond,
            then,
            orelse,
            line,
        })
    }

    fn parse_while(&mut self, indent: usize, line: usize) -> Result<Stmt, SyntaxError> {
        self.advance(); // while
        let cond = self.parse_expr()?;
        self.expect(&Token::Colon)?;
        self.end_of_line()?;
        self.pos += 1;
        let body = self.parse_suite(indent, line)?;
        Ok(Stmt::While { cond, body, line })
    }

    // Expressions, lowest precedence first.

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            let line = lhs.line();
            lhs = Expr::Binary {
                op: BinaryOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            let line = lhs.line();
            lhs = Expr::Binary {
                op: BinaryOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, SyntaxError> {
        if let Some(span) = self.eat_spanned(&Token::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                line: span.line,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let lhs = self.parse_arith()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_arith()?;
        let line = lhs.line();
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            line,
        })
    }

    fn parse_arith(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            let line = lhs.line();
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            let line = lhs.line();
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                line,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if let Some(span) = self.eat_spanned(&Token::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                line: span.line,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            if let Some(span) = self.eat_spanned(&Token::LParen) {
                let mut args = Vec::new();
                if !self.check(&Token::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RParen)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    line: span.line,
                };
            } else if let Some(span) = self.eat_spanned(&Token::LBracket) {
                let index = self.parse_expr()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    line: span.line,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let span = match self.advance() {
            Some(span) => span,
            None => return Err(self.error_here("invalid syntax")),
        };
        match span.token {
            Token::Num(value) => Ok(Expr::Num { value, line: span.line }),
            Token::Str(value) => Ok(Expr::Str { value, line: span.line }),
            Token::Name(name) => Ok(Expr::Name { name, line: span.line }),
            Token::True => Ok(Expr::Bool { value: true, line: span.line }),
            Token::False => Ok(Expr::Bool { value: false, line: span.line }),
            Token::Null => Ok(Expr::Null { line: span.line }),
            Token::LParen => {
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::LBracket => {
                let mut items = Vec::new();
                if !self.check(&Token::RBracket) {
                    loop {
                        items.push(self.parse_expr()?);
                        if !self.eat(&Token::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&Token::RBracket)?;
                Ok(Expr::List { items, line: span.line })
            }
            _ => Err(SyntaxError {
                message: "invalid syntax".to_string(),
                line: span.line,
                column: span.column,
            }),
        }
    }

    // Token cursor helpers.

    fn tokens(&self) -> &[Spanned] {
        &self.lines[self.pos].tokens
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens().get(self.cursor).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let span = self.tokens().get(self.cursor).cloned();
        if span.is_some() {
            self.cursor += 1;
        }
        span
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == Some(token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        self.eat_spanned(token).is_some()
    }

    fn eat_spanned(&mut self, token: &Token) -> Option<Spanned> {
        if self.check(token) {
            self.advance()
        } else {
            None
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), SyntaxError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error_here("invalid syntax"))
        }
    }

    fn expect_name(&mut self) -> Result<String, SyntaxError> {
        match self.peek() {
            Some(Token::Name(_)) => match self.advance() {
                Some(Spanned { token: Token::Name(name), .. }) => Ok(name),
                _ => unreachable!(),
            },
            _ => Err(self.error_here("invalid syntax")),
        }
    }

    fn at_end_of_line(&self) -> bool {
        self.cursor >= self.tokens().len()
    }

    fn end_of_line(&mut self) -> Result<(), SyntaxError> {
        if self.at_end_of_line() {
            Ok(())
        } else {
            Err(self.error_here("invalid syntax"))
        }
    }

    /// A syntax error at the current token, or just past the last one.
    fn error_here(&self, message: &str) -> SyntaxError {
        let (line, column) = match self.tokens().get(self.cursor) {
            Some(span) => (span.line, span.column),
            None => match self.tokens().last() {
                Some(span) => (span.line, span.column + 1),
                None => (self.lines[self.pos].line, 0),
            },
        };
        SyntaxError {
            message: message.to_string(),
            line,
            column,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let program = parse("").unwrap();
        assert!(program.body.is_empty());
        assert!(parse("\n\n  # comment\n").unwrap().body.is_empty());
    }

    #[test]
    fn test_parse_expression_statement() {
        let program = parse("1 + 2 * 3\n").unwrap();
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::Expr { value: Expr::Binary { op: BinaryOp::Add, .. }, line: 1 } => {}
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_assignment() {
        let program = parse("x = 1\n").unwrap();
        match &program.body[0] {
            Stmt::Assign { name, .. } => assert_eq!(name, "x"),
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bracket_continuation() {
        // One logical line spread over three physical lines.
        let program = parse("(\n    a\n)\n").unwrap();
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Stmt::Expr { value: Expr::Name { name, line: 2 }, line: 1 } => {
                assert_eq!(name, "a");
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_fn_def() {
        let program = parse("fn add(a, b):\n    return a + b\n").unwrap();
        match &program.body[0] {
            Stmt::FnDef(def) => {
                assert_eq!(def.name, "add");
                assert_eq!(def.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(def.body.len(), 1);
                assert!(matches!(def.body[0], Stmt::Return { line: 2, .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_if_else() {
        let program = parse("if x > 1:\n    a = 1\nelse:\n    a = 2\n").unwrap();
        match &program.body[0] {
            Stmt::If { then, orelse, .. } => {
                assert_eq!(then.len(), 1);
                assert_eq!(orelse.len(), 1);
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_parse_nested_blocks() {
        let source = "fn f(x):\n    if x:\n        return 1\n    return 2\n";
        let program = parse(source).unwrap();
        match &program.body[0] {
            Stmt::FnDef(def) => {
                assert_eq!(def.body.len(), 2);
                assert!(matches!(def.body[0], Stmt::If { .. }));
                assert!(matches!(def.body[1], Stmt::Return { .. }));
            }
            other => panic!("unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_stray_close_paren() {
        let err = parse(")\n").unwrap_err();
        assert_eq!(err.message, "invalid syntax");
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 0);
    }

    #[test]
    fn test_stray_close_paren_inside_fn() {
        let err = parse("fn a():\n    )\n").unwrap_err();
        assert_eq!(err.message, "invalid syntax");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 4);
    }

    #[test]
    fn test_return_outside_function() {
        let err = parse("return 1\n").unwrap_err();
        assert_eq!(err.message, "'return' outside function");
    }

    #[test]
    fn test_missing_block() {
        let err = parse("fn a():\n").unwrap_err();
        assert_eq!(err.message, "expected an indented block");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse("a = 1\n    b = 2\n").unwrap_err();
        assert_eq!(err.message, "unexpected indent");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unclosed_bracket_reports_missing_closer() {
        let err = parse("(1 + 2\n").unwrap_err();
        assert_eq!(err.message, "invalid syntax");
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let err = parse("a b\n").unwrap_err();
        assert_eq!(err.message, "invalid syntax");
        assert_eq!(err.column, 2);
    }
}
