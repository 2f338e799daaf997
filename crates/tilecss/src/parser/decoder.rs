//! Recursive-descent parser and evaluation driver.

use std::path::Path;
use std::sync::Arc;

use tilecss_color::Color;
use tracing::{debug, warn};

use super::error::{ErrorKind, ParseError, Warning};
use super::variables::{Resolver, Variables};
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::expr::{Code, EvalError, Expression, Field, Operator, Value, VarRef};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::logging::targets;
use crate::selector::{CompOp, Filter, FilterValue, Selector, ZoomRange};
use crate::style::{
    validate_property, Block, Declaration, Position, Properties, PropertyKey, Stylesheet, Validity,
};

/// Compiles one or more stylesheet sources into a [`Stylesheet`].
///
/// Sources are parsed in order with [`parse_str`](Self::parse_str),
/// [`parse_named`](Self::parse_named) or [`parse_file`](Self::parse_file);
/// declaration indices and variables carry over between them. After
/// parsing, [`evaluate`](Self::evaluate) resolves every expression.
///
/// ```
/// use tilecss::Decoder;
///
/// let mut decoder = Decoder::new();
/// decoder.parse_str("@w: 2; #roads { line-width: @w * 1.5; }").unwrap();
/// decoder.evaluate().unwrap();
///
/// let rules = decoder.stylesheet().layer_rules("roads", &[]);
/// assert_eq!(rules[0].properties.get_float("line-width"), Some(3.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
    stylesheet: Stylesheet,
    vars: Variables,
    var_values: Properties,
    warnings: Vec<Warning>,
    files_parsed: usize,
    property_index: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Parse `content`, reporting positions against the configured default
    /// filename.
    pub fn parse_str(&mut self, content: &str) -> Result<()> {
        let filename = self.config.default_filename.as_deref().map(Arc::from);
        self.parse_source(filename, content)
    }

    /// Parse `content` as the file `name`.
    pub fn parse_named(&mut self, name: &str, content: &str) -> Result<()> {
        self.parse_source(Some(Arc::from(name)), content)
    }

    /// Read and parse a stylesheet file.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.parse_source(Some(Arc::from(path.display().to_string())), &content)
    }

    fn parse_source(&mut self, filename: Option<Arc<str>>, content: &str) -> Result<()> {
        let file_num = self.files_parsed;
        self.files_parsed += 1;
        debug!(
            target: targets::PARSER,
            file = filename.as_deref().unwrap_or("?"),
            file_num,
            "parsing stylesheet"
        );

        let mut parser = Parser {
            lexer: Lexer::new(content, filename),
            decoder: self,
            file_num,
            stack: Vec::new(),
        };
        let result = parser.top_level();
        // Blocks opened before an error stay in the tree.
        parser.unwind();
        result?;

        debug!(
            target: targets::PARSER,
            blocks = self.stylesheet.root.blocks.len(),
            variables = self.vars.len(),
            declarations = self.property_index,
            "parsed stylesheet"
        );
        Ok(())
    }

    /// Evaluate variables, map properties and every block's declarations.
    ///
    /// On error nothing is changed. Warnings from a previous call are
    /// replaced.
    pub fn evaluate(&mut self) -> Result<()> {
        debug!(target: targets::EVAL, variables = self.vars.len(), "evaluating stylesheet");

        let validate = self.config.validate_properties;
        let mut resolver = Resolver::new(&self.vars, self.config.deferred_eval);
        let mut warnings = Vec::new();

        let var_values = resolver
            .final_values()
            .map_err(|(err, position)| evaluation_error(&err, &position))?;
        let map = evaluate_declarations(
            &mut resolver,
            &self.stylesheet.map.declarations,
            validate,
            &mut warnings,
        )?;
        let mut blocks = Vec::new();
        for block in self.stylesheet.root.walk() {
            blocks.push(evaluate_declarations(
                &mut resolver,
                &block.declarations,
                validate,
                &mut warnings,
            )?);
        }

        self.var_values = var_values;
        self.stylesheet.map.properties = Some(map);
        assign_properties(&mut self.stylesheet.root, &mut blocks.into_iter());
        for warning in &warnings {
            warn!(target: targets::EVAL, "{warning}");
        }
        debug!(target: targets::EVAL, warnings = warnings.len(), "evaluated stylesheet");
        self.warnings = warnings;
        Ok(())
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn into_stylesheet(self) -> Stylesheet {
        self.stylesheet
    }

    /// Final value of every variable, available after [`evaluate`](Self::evaluate).
    pub fn vars(&self) -> &Properties {
        &self.var_values
    }

    /// Property warnings from the last [`evaluate`](Self::evaluate).
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

fn evaluation_error(err: &EvalError, position: &Position) -> ParseError {
    ParseError::new(ErrorKind::Evaluation, err.to_string(), position)
}

fn evaluate_declarations(
    resolver: &mut Resolver<'_>,
    declarations: &[Declaration],
    validate: bool,
    warnings: &mut Vec<Warning>,
) -> std::result::Result<Properties, ParseError> {
    let mut properties = Properties::new();
    for decl in declarations {
        let value = resolver
            .evaluate(&decl.expr)
            .map_err(|err| evaluation_error(&err, &decl.expr.position))?;
        if validate {
            let name = &decl.key.name;
            match validate_property(name, &value) {
                Validity::Valid => {}
                Validity::UnknownProperty => warnings.push(Warning::new(
                    format!("invalid property {name} {value}"),
                    &decl.position,
                )),
                Validity::InvalidValue => warnings.push(Warning::new(
                    format!("invalid property value for {name} {value}"),
                    &decl.position,
                )),
            }
        }
        properties.set(decl.key.clone(), value, decl.position.clone());
    }
    Ok(properties)
}

fn assign_properties(block: &mut Block, values: &mut impl Iterator<Item = Properties>) {
    block.properties = values.next();
    for child in &mut block.blocks {
        assign_properties(child, values);
    }
}

fn starts_selector(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Hash | TokenKind::Attachment | TokenKind::Class | TokenKind::LBracket
    )
}

/// Strip the quotes of a string token.
fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => chars.as_str(),
        _ => text,
    }
}

/// Path of a `url(...)` token.
fn url_path(text: &str) -> &str {
    let inner = text
        .strip_prefix("url(")
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(text)
        .trim();
    unquote(inner)
}

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parser state for a single source.
struct Parser<'d> {
    lexer: Lexer,
    decoder: &'d mut Decoder,
    file_num: usize,
    /// Open rule blocks, innermost last.
    stack: Vec<Block>,
}

impl Parser<'_> {
    fn top_level(&mut self) -> ParseResult<()> {
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Eof => return Ok(()),
                TokenKind::AtKeyword => self.assignment(&tok)?,
                kind if starts_selector(kind) => {
                    self.lexer.backup();
                    self.rule()?;
                }
                TokenKind::Ident if tok.text == "Map" => self.map()?,
                TokenKind::Ident => {
                    return Err(self.error(
                        &tok,
                        format!("only 'Map' identifier expected at top level, got {tok}"),
                    ));
                }
                _ => {
                    return Err(self.error(&tok, format!("unexpected token at top level, got {tok}")));
                }
            }
        }
    }

    /// `@name: <expr-list>;`
    fn assignment(&mut self, tok: &Token) -> ParseResult<()> {
        let name = tok.text.trim_start_matches('@');
        self.expect(TokenKind::Colon)?;
        let index = self.next_index();
        let expr = self.expression_list(index)?;
        self.expect(TokenKind::Semicolon)?;
        self.decoder.vars.assign(name, expr);
        Ok(())
    }

    /// `Map { <declarations> }`. Repeated blocks are merged.
    fn map(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::LBrace)?;
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::RBrace => return Ok(()),
                TokenKind::Ident | TokenKind::Instance => {
                    self.lexer.backup();
                    let decl = self.declaration()?;
                    self.decoder.stylesheet.map.declarations.push(decl);
                }
                kind if starts_selector(kind) => {
                    return Err(self.error(&tok, "nested rules are not allowed in Map"));
                }
                _ => return Err(self.error(&tok, format!("unexpected token {tok}"))),
            }
        }
    }

    fn rule(&mut self) -> ParseResult<()> {
        let selectors = self.selectors()?;
        self.stack.push(Block::with_selectors(selectors));
        self.expect(TokenKind::LBrace)?;
        self.body()?;
        if let Some(block) = self.stack.pop() {
            self.attach(block);
        }
        Ok(())
    }

    fn body(&mut self) -> ParseResult<()> {
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::RBrace => return Ok(()),
                kind if starts_selector(kind) => {
                    self.lexer.backup();
                    self.rule()?;
                }
                TokenKind::Ident | TokenKind::Instance => {
                    self.lexer.backup();
                    let decl = self.declaration()?;
                    match self.stack.last_mut() {
                        Some(block) => block.declarations.push(decl),
                        None => self.decoder.stylesheet.root.declarations.push(decl),
                    }
                }
                _ => return Err(self.error(&tok, format!("unexpected token {tok}"))),
            }
        }
    }

    /// Attach a finished block to the enclosing one.
    fn attach(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(parent) => parent.blocks.push(block),
            None => self.decoder.stylesheet.root.blocks.push(block),
        }
    }

    fn unwind(&mut self) {
        while let Some(block) = self.stack.pop() {
            self.attach(block);
        }
    }

    /// `[instance/]name: <expr-list>` followed by `;` or the closing brace.
    fn declaration(&mut self) -> ParseResult<Declaration> {
        let mut tok = self.lexer.next_token()?;
        let mut instance = String::new();
        if tok.kind == TokenKind::Instance {
            instance = tok.text.trim_end_matches('/').to_string();
            tok = self.lexer.next_token()?;
            if tok.kind != TokenKind::Ident {
                return Err(self.error(
                    &tok,
                    format!("expected property name for instance, found {tok}"),
                ));
            }
        }
        self.expect(TokenKind::Colon)?;

        let mut position = self.position(&tok);
        position.index = self.next_index();
        let expr = self.expression_list(position.index)?;
        self.expect_end_of_statement()?;

        Ok(Declaration {
            key: PropertyKey::with_instance(tok.text, instance),
            expr,
            position,
        })
    }

    fn expect_end_of_statement(&mut self) -> ParseResult<()> {
        if self.lexer.peek()?.kind == TokenKind::RBrace {
            return Ok(());
        }
        self.expect(TokenKind::Semicolon).map(drop)
    }

    fn selectors(&mut self) -> ParseResult<Vec<Selector>> {
        let mut selectors = Vec::new();
        loop {
            let tok = self.lexer.peek()?;
            if !starts_selector(tok.kind) {
                // `#a, #b, {` is accepted.
                if !selectors.is_empty() {
                    return Ok(selectors);
                }
                return Err(self.error(
                    &tok,
                    format!("expected layer, attachment, class or filter, got {tok}"),
                ));
            }
            selectors.push(self.selector()?);
            if self.lexer.next_token()?.kind != TokenKind::Comma {
                self.lexer.backup();
                return Ok(selectors);
            }
        }
    }

    fn selector(&mut self) -> ParseResult<Selector> {
        let mut sel = Selector::new();
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Hash => sel.layer = Some(tok.text[1..].to_string()),
                TokenKind::Attachment => sel.attachment = Some(tok.text[2..].to_string()),
                TokenKind::Class => sel.class = Some(tok.text[1..].to_string()),
                TokenKind::LBracket => self.filter(&mut sel)?,
                _ => {
                    self.lexer.backup();
                    break;
                }
            }
        }
        sel.sort_filters();
        Ok(sel)
    }

    /// The part of a filter after `[`.
    fn filter(&mut self, sel: &mut Selector) -> ParseResult<()> {
        let tok = self.lexer.next_token()?;
        let field = match tok.kind {
            TokenKind::Ident if tok.text == "zoom" => return self.zoom_filter(sel),
            TokenKind::Ident => tok.text.clone(),
            TokenKind::String => unquote(&tok.text).to_string(),
            _ => {
                return Err(self.error(
                    &tok,
                    format!("expected zoom or field name in filter, got '{}'", tok.text),
                ));
            }
        };
        let (op, _) = self.comp()?;

        let tok = self.lexer.next_token()?;
        let value = match tok.kind {
            TokenKind::String => FilterValue::String(unquote(&tok.text).to_string()),
            TokenKind::Number => FilterValue::Number(self.number(&tok)?),
            TokenKind::Ident if tok.text == "null" => FilterValue::Null,
            TokenKind::Ident if tok.text == "true" => FilterValue::Bool(true),
            TokenKind::Ident if tok.text == "false" => FilterValue::Bool(false),
            _ => {
                return Err(self.error(&tok, format!("unexpected value in filter '{}'", tok.text)));
            }
        };
        if op == CompOp::Regex && !matches!(value, FilterValue::String(_)) {
            return Err(self.error(
                &tok,
                format!("regular expression requires a string, got '{}'", tok.text),
            ));
        }
        self.expect(TokenKind::RBracket)?;
        sel.filters.push(Filter::new(field, op, value));
        Ok(())
    }

    fn zoom_filter(&mut self, sel: &mut Selector) -> ParseResult<()> {
        let (op, op_tok) = self.comp()?;
        if op == CompOp::Regex {
            return Err(self.error(&op_tok, "regular expressions are not allowed for zoom levels"));
        }
        let tok = self.lexer.next_token()?;
        if tok.kind != TokenKind::Number {
            return Err(self.error(&tok, format!("zoom requires num, got {tok}")));
        }
        let level: i64 = tok
            .text
            .parse()
            .map_err(|_| self.error(&tok, format!("invalid zoom level {}", tok.text)))?;
        let level = u8::try_from(level)
            .ok()
            .filter(|l| *l <= ZoomRange::MAX_LEVEL)
            .ok_or_else(|| {
                self.error(&tok, format!("zoom level {level} out of range 0-30"))
            })?;
        sel.zoom = sel.zoom.add(op, level);
        self.expect(TokenKind::RBracket).map(drop)
    }

    fn comp(&mut self) -> ParseResult<(CompOp, Token)> {
        let tok = self.lexer.next_token()?;
        match tok.kind {
            TokenKind::Comp => match CompOp::parse(&tok.text) {
                Some(op) => Ok((op, tok)),
                None => Err(self.error(&tok, format!("expected comparison, got '{}'", tok.text))),
            },
            _ => Err(self.error(&tok, format!("expected comparison, got '{}'", tok.text))),
        }
    }

    /// Comma-separated expressions. Function calls may also follow each
    /// other without a comma, as in `stop(0, red) stop(10, blue)`.
    fn expression_list(&mut self, index: usize) -> ParseResult<Expression> {
        let start = self.lexer.peek()?;
        let mut position = self.position(&start);
        position.index = index;
        let mut expr = Expression::new(position);

        self.expr_part(&mut expr)?;
        loop {
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::Comma => self.expr_part(&mut expr)?,
                TokenKind::Function if matches!(expr.codes.last(), Some(Code::FunctionEnd)) => {
                    self.lexer.backup();
                    self.expr_part(&mut expr)?;
                }
                _ => {
                    self.lexer.backup();
                    return Ok(expr);
                }
            }
        }
    }

    /// Sums and differences.
    fn expr_part(&mut self, expr: &mut Expression) -> ParseResult<()> {
        self.mul_expr(expr)?;
        loop {
            let op = match self.lexer.next_token()?.kind {
                TokenKind::Plus => Operator::Add,
                TokenKind::Minus => Operator::Subtract,
                _ => {
                    self.lexer.backup();
                    return Ok(());
                }
            };
            self.mul_expr(expr)?;
            expr.push(Code::Op(op));
        }
    }

    /// Products and quotients.
    fn mul_expr(&mut self, expr: &mut Expression) -> ParseResult<()> {
        self.neg_or_value(expr)?;
        loop {
            let op = match self.lexer.next_token()?.kind {
                TokenKind::Multiply => Operator::Multiply,
                TokenKind::Divide => Operator::Divide,
                _ => {
                    self.lexer.backup();
                    return Ok(());
                }
            };
            self.neg_or_value(expr)?;
            expr.push(Code::Op(op));
        }
    }

    fn neg_or_value(&mut self, expr: &mut Expression) -> ParseResult<()> {
        if self.lexer.next_token()?.kind == TokenKind::Minus {
            self.value(expr)?;
            expr.push(Code::Op(Operator::Negate));
            return Ok(());
        }
        self.lexer.backup();
        self.value(expr)
    }

    fn value(&mut self, expr: &mut Expression) -> ParseResult<()> {
        let tok = self.lexer.next_token()?;
        let value = match tok.kind {
            TokenKind::String => Value::String(unquote(&tok.text).replace("\\\n", "")),
            TokenKind::Number => Value::Number(self.number(&tok)?),
            TokenKind::Percentage => {
                let number = tok.text.trim_end_matches('%');
                let percent = number
                    .parse()
                    .map_err(|_| self.error(&tok, format!("invalid percentage {}", tok.text)))?;
                expr.push(Code::Percent(percent));
                return Ok(());
            }
            TokenKind::Ident => match tok.text.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                keyword => match Color::from_name(keyword) {
                    Some(color) => Value::Color(color),
                    None => Value::String(keyword.to_string()),
                },
            },
            TokenKind::Hash => match Color::parse_hex(&tok.text) {
                Ok(color) => Value::Color(color),
                Err(err) => return Err(self.error(&tok, format!("{err}, got {tok}"))),
            },
            TokenKind::AtKeyword => {
                let name = tok.text.trim_start_matches('@');
                expr.push(Code::Var(VarRef {
                    name: name.to_string(),
                    version: self.decoder.vars.version(name),
                }));
                return Ok(());
            }
            TokenKind::Uri => Value::String(url_path(&tok.text).to_string()),
            TokenKind::LBracket => {
                let name = self.lexer.next_token()?;
                if name.kind != TokenKind::Ident {
                    return Err(self.error(
                        &name,
                        format!("expected identifier in field name, got {name}"),
                    ));
                }
                self.expect(TokenKind::RBracket)?;
                Value::Field(Field::named(&name.text))
            }
            TokenKind::Function => {
                let name = tok.text.trim_end_matches('(');
                expr.push(Code::Function(name.to_string()));
                return self.function_params(expr);
            }
            TokenKind::LParen => {
                self.expr_part(expr)?;
                return self.expect(TokenKind::RParen).map(drop);
            }
            _ => return Err(self.error(&tok, format!("unexpected value {tok}"))),
        };
        expr.push(Code::Value(value));
        Ok(())
    }

    /// Arguments after `name(`, up to and including `)`.
    fn function_params(&mut self, expr: &mut Expression) -> ParseResult<()> {
        if self.lexer.peek()?.kind == TokenKind::RParen {
            self.lexer.next_token()?;
            expr.push(Code::FunctionEnd);
            return Ok(());
        }
        loop {
            self.expr_part(expr)?;
            let tok = self.lexer.next_token()?;
            match tok.kind {
                TokenKind::RParen => {
                    expr.push(Code::FunctionEnd);
                    return Ok(());
                }
                TokenKind::Comma => {}
                _ => {
                    return Err(self.error(
                        &tok,
                        format!("expected end of function or comma, got {tok}"),
                    ));
                }
            }
        }
    }

    fn number(&self, tok: &Token) -> ParseResult<f64> {
        tok.text
            .parse()
            .map_err(|_| self.error(tok, format!("invalid number {}", tok.text)))
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let tok = self.lexer.next_token()?;
        if tok.kind != kind {
            return Err(self.error(&tok, format!("expected {kind:?} found {tok}")));
        }
        Ok(tok)
    }

    fn next_index(&mut self) -> usize {
        let index = self.decoder.property_index;
        self.decoder.property_index += 1;
        index
    }

    fn position(&self, tok: &Token) -> Position {
        Position {
            file_num: self.file_num,
            ..self.lexer.position(tok)
        }
    }

    fn error(&self, tok: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(ErrorKind::Syntax, message, &self.position(tok))
    }
}
