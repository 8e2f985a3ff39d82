mod scanner;
mod symbol_table;
mod token;

pub use scanner::{Scanner, MAX_INTEGER};
pub use symbol_table::{AddSymbolResult, Kind, Symbol, SymbolTable};
pub use token::{Span, Spanned, Token, TokenClass, TokenKind};

use crate::{
  parse_tree::{Rule, TreeWriter},
  source::LineOffsets,
  utils::IdEmitter,
  vm_writer::{Arithmetic, Segment, VmWriter},
  CompileResult,
};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::io::{self, Write};
use tracing::debug;

/// Runtime routine allocating a block of words
const ALLOC: &str = "Memory.alloc";

/// Runtime routines building string constants
const STRING_NEW: &str = "String.new";
const STRING_APPEND_CHAR: &str = "String.appendChar";

/// Runtime routines for the operators the machine lacks
const MULTIPLY: &str = "Math.multiply";
const DIVIDE: &str = "Math.divide";

/// The receiver name reserved in every method
const THIS: &str = "this";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
  Constructor,
  Function,
  Method,
}

/// What a binary operator desugars to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
  Arithmetic(Arithmetic),
  Call(&'static str),
}

fn binary_operator(kind: TokenKind) -> Option<Operator> {
  Some(match kind {
    TokenKind::Plus => Operator::Arithmetic(Arithmetic::Add),
    TokenKind::Minus => Operator::Arithmetic(Arithmetic::Sub),
    TokenKind::Equal => Operator::Arithmetic(Arithmetic::Eq),
    TokenKind::Greater => Operator::Arithmetic(Arithmetic::Gt),
    TokenKind::Less => Operator::Arithmetic(Arithmetic::Lt),
    TokenKind::Amp => Operator::Arithmetic(Arithmetic::And),
    TokenKind::Pipe => Operator::Arithmetic(Arithmetic::Or),
    TokenKind::Star => Operator::Call(MULTIPLY),
    TokenKind::Slash => Operator::Call(DIVIDE),
    _ => return None,
  })
}

fn io_error<FileId>(err: io::Error) -> Diagnostic<FileId> {
  Diagnostic::error().with_message(format!("Unable to write instruction: {}", err))
}

fn tree_error<FileId>(err: io::Error) -> Diagnostic<FileId> {
  Diagnostic::error().with_message(format!("Unable to write parse tree: {}", err))
}

/// The Jack compiler. Parses a single class and emits stack machine
/// instructions in the same pass, no syntax tree is built. The shape of
/// the parse can optionally be written out as xml along the way
pub struct Compiler<'a, W: Write, FileId, T: Write = io::Sink> {
  /// Token stream holding one token of look-ahead
  scanner: Scanner<'a>,

  /// The most recently consumed token
  previous: Token<'a>,

  /// Destination of the generated instructions
  writer: VmWriter<W>,

  /// Class and subroutine level names
  symbols: SymbolTable<'a>,

  /// Name of the class being compiled
  class_name: &'a str,

  /// Source of unique label suffixes for this unit
  labels: IdEmitter,

  /// file id
  file_id: FileId,

  /// Optional xml rendition of the parse
  tree: Option<TreeWriter<T>>,
}

impl<'a, W: Write, FileId: Copy> Compiler<'a, W, FileId> {
  /// Create a new compiler for one compilation unit writing to `out`
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::compiler::Compiler;
  ///
  /// let source = "class Main { function void main() { return; } }";
  ///
  /// let (result, _) = Compiler::new(source, 0, Vec::new()).compile();
  /// let out = String::from_utf8(result.unwrap()).unwrap();
  /// assert_eq!(out, "function Main.main 0\npush constant 0\nreturn\n");
  /// ```
  pub fn new(source: &'a str, file_id: FileId, out: W) -> Self {
    Self {
      scanner: Scanner::new(source),
      previous: Token::new(TokenKind::Error, "", 0, 0),
      writer: VmWriter::new(out),
      symbols: SymbolTable::default(),
      class_name: "",
      labels: IdEmitter::default(),
      file_id,
      tree: None,
    }
  }
}

impl<'a, W: Write, FileId: Copy, T: Write> Compiler<'a, W, FileId, T> {
  /// Create a compiler that also writes its parse tree to `tree`
  pub fn with_tree(source: &'a str, file_id: FileId, out: W, tree: T) -> Self {
    Self {
      scanner: Scanner::new(source),
      previous: Token::new(TokenKind::Error, "", 0, 0),
      writer: VmWriter::new(out),
      symbols: SymbolTable::default(),
      class_name: "",
      labels: IdEmitter::default(),
      file_id,
      tree: Some(TreeWriter::new(tree)),
    }
  }

  /// Compile the unit. The sink is flushed and handed back on success.
  /// On failure everything emitted before the error stays in the sink
  pub fn compile(self) -> (CompileResult<W, FileId>, LineOffsets) {
    let (result, line_offsets) = self.compile_with_tree();
    (result.map(|(out, _)| out), line_offsets)
  }

  /// Compile the unit handing back both sinks. The tree sink is only
  /// present for a compiler made with `with_tree`
  pub fn compile_with_tree(mut self) -> (CompileResult<(W, Option<T>), FileId>, LineOffsets) {
    let result = self.class();

    debug!(
      class = self.class_name,
      instructions = self.writer.written(),
      labels = self.labels.id_count(),
      ok = result.is_ok(),
      "finished class"
    );

    let Compiler {
      scanner,
      writer,
      tree,
      ..
    } = self;

    let closed = writer.close().map_err(io_error);
    let tree = tree
      .map(TreeWriter::finish)
      .transpose()
      .map_err(tree_error);

    let result = result
      .and(closed)
      .and_then(|out| tree.map(|tree| (out, tree)));
    (result, scanner.line_offsets())
  }

  /// Compile `class name { classVarDec* subroutineDec* }`
  fn class(&mut self) -> CompileResult<(), FileId> {
    self.check_lookahead()?;
    self.open(Rule::Class)?;
    self.consume(TokenKind::Class, "Expected 'class' at the start of the file.")?;
    self.class_name = self.identifier("Expected class name.")?;
    debug!(class = self.class_name, "compiling class");

    self.consume(TokenKind::LeftBrace, "Expected '{' after class name.")?;

    while self.check(TokenKind::Static) || self.check(TokenKind::Field) {
      self.class_var_dec()?;
    }

    while matches!(
      self.current().kind(),
      TokenKind::Constructor | TokenKind::Function | TokenKind::Method
    ) {
      self.subroutine()?;
    }

    self.consume(
      TokenKind::RightBrace,
      "Expected subroutine declaration or '}' after class body.",
    )?;
    self.close(Rule::Class)?;
    self.consume(TokenKind::Eof, "Expected end of file after class body.")
  }

  /// Compile a static or field declaration
  fn class_var_dec(&mut self) -> CompileResult<(), FileId> {
    let kind = match self.current().kind() {
      TokenKind::Static => Kind::Static,
      _ => Kind::Field,
    };
    self.open(Rule::ClassVarDec)?;
    self.advance()?;

    let type_ = self.type_()?;
    self.var_names(type_, kind)?;
    self.consume(
      TokenKind::Semicolon,
      "Expected ';' after variable declaration.",
    )?;
    self.close(Rule::ClassVarDec)
  }

  /// Compile a constructor, function or method
  fn subroutine(&mut self) -> CompileResult<(), FileId> {
    let kind = match self.current().kind() {
      TokenKind::Constructor => SubroutineKind::Constructor,
      TokenKind::Function => SubroutineKind::Function,
      _ => SubroutineKind::Method,
    };
    self.open(Rule::SubroutineDec)?;
    self.advance()?;
    self.symbols.start_subroutine();

    if !self.match_kind(TokenKind::Void)? {
      self.type_()?;
    }

    let name = self.identifier("Expected subroutine name.")?;
    debug!(class = self.class_name, subroutine = name, ?kind, "compiling subroutine");

    // the receiver always occupies argument 0
    if kind == SubroutineKind::Method {
      self.symbols.define(THIS, self.class_name, Kind::Argument);
    }

    self.consume(TokenKind::LeftParen, "Expected '(' after subroutine name.")?;
    self.open(Rule::ParameterList)?;
    self.parameter_list()?;
    self.close(Rule::ParameterList)?;
    self.consume(TokenKind::RightParen, "Expected ')' after parameters.")?;

    self.open(Rule::SubroutineBody)?;
    self.consume(TokenKind::LeftBrace, "Expected '{' before subroutine body.")?;

    while self.check(TokenKind::Var) {
      self.var_dec()?;
    }

    let full_name = format!("{}.{}", self.class_name, name);
    let locals = self.symbols.var_count(Kind::Local);
    self.emit_function(&full_name, locals)?;

    match kind {
      SubroutineKind::Constructor => {
        let fields = self.symbols.var_count(Kind::Field);
        self.emit_push(Segment::Constant, fields)?;
        self.emit_call(ALLOC, 1)?;
        self.emit_pop(Segment::Pointer, 0)?;
      },
      SubroutineKind::Method => {
        self.emit_push(Segment::Argument, 0)?;
        self.emit_pop(Segment::Pointer, 0)?;
      },
      SubroutineKind::Function => (),
    }

    self.statements()?;
    self.consume(TokenKind::RightBrace, "Expected '}' after subroutine body.")?;
    self.close(Rule::SubroutineBody)?;
    self.close(Rule::SubroutineDec)
  }

  /// Compile a possibly empty parameter list, not including the parens
  fn parameter_list(&mut self) -> CompileResult<(), FileId> {
    if self.check(TokenKind::RightParen) {
      return Ok(());
    }

    loop {
      let type_ = self.type_()?;
      self.declare(type_, Kind::Argument, "Expected parameter name.")?;

      if !self.match_kind(TokenKind::Comma)? {
        return Ok(());
      }
    }
  }

  /// Compile a `var` declaration
  fn var_dec(&mut self) -> CompileResult<(), FileId> {
    self.open(Rule::VarDec)?;
    self.advance()?;

    let type_ = self.type_()?;
    self.var_names(type_, Kind::Local)?;
    self.consume(
      TokenKind::Semicolon,
      "Expected ';' after variable declaration.",
    )?;
    self.close(Rule::VarDec)
  }

  /// Declare a comma separated list of names sharing a type
  fn var_names(&mut self, type_: &'a str, kind: Kind) -> CompileResult<(), FileId> {
    loop {
      self.declare(type_, kind, "Expected variable name.")?;

      if !self.match_kind(TokenKind::Comma)? {
        return Ok(());
      }
    }
  }

  /// Consume a name and define it in the symbol table
  fn declare(&mut self, type_: &'a str, kind: Kind, message: &str) -> CompileResult<(), FileId> {
    let name = self.identifier(message)?;

    match self.symbols.define(name, type_, kind) {
      AddSymbolResult::Ok => Ok(()),
      AddSymbolResult::DuplicateSymbol => {
        self.error(&format!("'{}' is already declared in this scope.", name))
      },
      AddSymbolResult::TooManySymbols => self.error(&format!(
        "Too many {} variables, at most {} are allowed.",
        kind, MAX_INTEGER
      )),
    }
  }

  /// Consume a type, either primitive or a class name
  fn type_(&mut self) -> CompileResult<&'a str, FileId> {
    match self.current().kind() {
      TokenKind::Int | TokenKind::Char | TokenKind::Boolean | TokenKind::Identifier => {
        self.advance()?;
        Ok(self.previous.str())
      },
      _ => self.error_current("Expected a type."),
    }
  }

  /// Compile statements until one can't start
  fn statements(&mut self) -> CompileResult<(), FileId> {
    self.open(Rule::Statements)?;

    loop {
      match self.current().kind() {
        TokenKind::Let => self.statement(Rule::LetStatement, Self::let_)?,
        TokenKind::If => self.statement(Rule::IfStatement, Self::if_)?,
        TokenKind::While => self.statement(Rule::WhileStatement, Self::while_)?,
        TokenKind::Do => self.statement(Rule::DoStatement, Self::do_)?,
        TokenKind::Return => self.statement(Rule::ReturnStatement, Self::return_)?,
        _ => return self.close(Rule::Statements),
      }
    }
  }

  /// Consume a statement's keyword and compile the rest with `body`
  fn statement(
    &mut self,
    rule: Rule,
    body: fn(&mut Self) -> CompileResult<(), FileId>,
  ) -> CompileResult<(), FileId> {
    self.open(rule)?;
    self.advance()?;
    body(self)?;
    self.close(rule)
  }

  /// Compile `{ statement* }`
  fn block(&mut self) -> CompileResult<(), FileId> {
    self.consume(TokenKind::LeftBrace, "Expected '{' before statements.")?;
    self.statements()?;
    self.consume(TokenKind::RightBrace, "Expected '}' after statements.")
  }

  /// Compile a let statement
  fn let_(&mut self) -> CompileResult<(), FileId> {
    self.identifier("Expected variable name after 'let'.")?;
    let target = self.variable()?;

    if !self.match_kind(TokenKind::LeftBracket)? {
      self.consume(TokenKind::Equal, "Expected '=' after variable name.")?;
      self.expr()?;
      self.consume(TokenKind::Semicolon, "Expected ';' after let statement.")?;
      return self.emit_pop(target.segment(), target.index());
    }

    // the element address is complete before the value is evaluated
    self.emit_push(target.segment(), target.index())?;
    self.expr()?;
    self.consume(TokenKind::RightBracket, "Expected ']' after array index.")?;
    self.emit_arithmetic(Arithmetic::Add)?;

    self.consume(TokenKind::Equal, "Expected '=' after array element.")?;
    self.expr()?;
    self.consume(TokenKind::Semicolon, "Expected ';' after let statement.")?;

    // the value may itself have used pointer 1, so stash it first
    self.emit_pop(Segment::Temp, 0)?;
    self.emit_pop(Segment::Pointer, 1)?;
    self.emit_push(Segment::Temp, 0)?;
    self.emit_pop(Segment::That, 0)
  }

  /// Compile an if statement with an optional else
  fn if_(&mut self) -> CompileResult<(), FileId> {
    let id = self.labels.emit();
    let if_true = format!("IF_TRUE{}", id);
    let if_false = format!("IF_FALSE{}", id);
    let if_end = format!("IF_END{}", id);

    self.consume(TokenKind::LeftParen, "Expected '(' after 'if'.")?;
    self.expr()?;
    self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;

    self.emit_if(&if_true)?;
    self.emit_goto(&if_false)?;
    self.emit_label(&if_true)?;
    self.block()?;
    self.emit_goto(&if_end)?;

    self.emit_label(&if_false)?;
    if self.match_kind(TokenKind::Else)? {
      self.block()?;
    }

    self.emit_label(&if_end)
  }

  /// Compile a while statement
  fn while_(&mut self) -> CompileResult<(), FileId> {
    let id = self.labels.emit();
    let loop_start = format!("WHILE_EXP{}", id);
    let loop_end = format!("WHILE_END{}", id);

    self.emit_label(&loop_start)?;
    self.consume(TokenKind::LeftParen, "Expected '(' after 'while'.")?;
    self.expr()?;
    self.consume(TokenKind::RightParen, "Expected ')' after condition.")?;

    self.emit_arithmetic(Arithmetic::Not)?;
    self.emit_if(&loop_end)?;
    self.block()?;
    self.emit_goto(&loop_start)?;
    self.emit_label(&loop_end)
  }

  /// Compile a do statement, discarding the call's result
  fn do_(&mut self) -> CompileResult<(), FileId> {
    self.identifier("Expected subroutine call after 'do'.")?;
    self.subroutine_call()?;
    self.consume(TokenKind::Semicolon, "Expected ';' after do statement.")?;
    self.emit_pop(Segment::Temp, 0)
  }

  /// Compile a return statement. Every subroutine leaves a value
  fn return_(&mut self) -> CompileResult<(), FileId> {
    if self.check(TokenKind::Semicolon) {
      self.emit_push(Segment::Constant, 0)?;
    } else {
      self.expr()?;
    }

    self.consume(TokenKind::Semicolon, "Expected ';' after return value.")?;
    self.emit_return()
  }

  /// Compile `term (op term)*`. Operators have no precedence and
  /// are applied left to right
  fn expr(&mut self) -> CompileResult<(), FileId> {
    self.open(Rule::Expression)?;
    self.term()?;

    while let Some(operator) = binary_operator(self.current().kind()) {
      self.advance()?;
      self.term()?;

      match operator {
        Operator::Arithmetic(command) => self.emit_arithmetic(command)?,
        Operator::Call(routine) => self.emit_call(routine, 2)?,
      }
    }

    self.close(Rule::Expression)
  }

  /// Compile a single term
  fn term(&mut self) -> CompileResult<(), FileId> {
    self.open(Rule::Term)?;
    self.term_body()?;
    self.close(Rule::Term)
  }

  fn term_body(&mut self) -> CompileResult<(), FileId> {
    match self.current().kind() {
      TokenKind::IntegerConstant => self.advance().and_then(|()| self.integer()),
      TokenKind::StringConstant => self.advance().and_then(|()| self.string()),
      TokenKind::True => {
        self.advance()?;
        self.emit_push(Segment::Constant, 0)?;
        self.emit_arithmetic(Arithmetic::Not)
      },
      TokenKind::False | TokenKind::Null => {
        self.advance()?;
        self.emit_push(Segment::Constant, 0)
      },
      TokenKind::This => {
        self.advance()?;
        self.emit_push(Segment::Pointer, 0)
      },
      TokenKind::LeftParen => {
        self.advance()?;
        self.expr()?;
        self.consume(TokenKind::RightParen, "Expected ')' after expression.")
      },
      TokenKind::Minus => self.advance().and_then(|()| self.unary(Arithmetic::Neg)),
      TokenKind::Tilde => self.advance().and_then(|()| self.unary(Arithmetic::Not)),
      TokenKind::Identifier => self.advance().and_then(|()| self.identifier_term()),
      _ => self.error_current("Expected expression."),
    }
  }

  /// Compile the operand of a unary operator then apply it
  fn unary(&mut self, command: Arithmetic) -> CompileResult<(), FileId> {
    self.term()?;
    self.emit_arithmetic(command)
  }

  /// Push the integer constant just consumed
  fn integer(&mut self) -> CompileResult<(), FileId> {
    match self.previous.str().parse::<u16>() {
      Ok(value) if value <= MAX_INTEGER => self.emit_push(Segment::Constant, value),
      _ => self.error("Integer constant must be between 0 and 32767."),
    }
  }

  /// Build the string constant just consumed one character at a time
  fn string(&mut self) -> CompileResult<(), FileId> {
    let value = self.previous.str();

    let len = match u16::try_from(value.chars().count()) {
      Ok(len) if len <= MAX_INTEGER => len,
      _ => return self.error("String constant is too long."),
    };

    self.emit_push(Segment::Constant, len)?;
    self.emit_call(STRING_NEW, 1)?;

    for c in value.chars() {
      let code = match u16::try_from(u32::from(c)) {
        Ok(code) if code <= MAX_INTEGER => code,
        _ => return self.error(&format!("Character '{}' has no character code.", c)),
      };

      self.emit_push(Segment::Constant, code)?;
      self.emit_call(STRING_APPEND_CHAR, 2)?;
    }

    Ok(())
  }

  /// An identifier starts this term. One more token decides
  /// between array access, call and plain variable
  fn identifier_term(&mut self) -> CompileResult<(), FileId> {
    match self.current().kind() {
      TokenKind::LeftBracket => {
        let array = self.variable()?;
        self.advance()?;

        self.emit_push(array.segment(), array.index())?;
        self.expr()?;
        self.consume(TokenKind::RightBracket, "Expected ']' after array index.")?;
        self.emit_arithmetic(Arithmetic::Add)?;
        self.emit_pop(Segment::Pointer, 1)?;
        self.emit_push(Segment::That, 0)
      },
      TokenKind::Dot | TokenKind::LeftParen => self.subroutine_call(),
      _ => {
        let symbol = self.variable()?;
        self.emit_push(symbol.segment(), symbol.index())
      },
    }
  }

  /// Compile a call whose first name was just consumed
  fn subroutine_call(&mut self) -> CompileResult<(), FileId> {
    let name = self.previous.str();

    match self.current().kind() {
      TokenKind::LeftParen => {
        self.advance()?;
        self.emit_push(Segment::Pointer, 0)?;
        let args = self.expression_list(1)?;

        let target = format!("{}.{}", self.class_name, name);
        self.emit_call(&target, args)
      },
      TokenKind::Dot => {
        self.advance()?;
        let subroutine = self.identifier("Expected subroutine name after '.'.")?;

        // a known variable is the receiver, anything else names a class
        let (target, receiver) = match self.symbols.get(name).copied() {
          Some(symbol) => {
            self.emit_push(symbol.segment(), symbol.index())?;
            (format!("{}.{}", symbol.type_(), subroutine), 1)
          },
          None => (format!("{}.{}", name, subroutine), 0),
        };

        self.consume(TokenKind::LeftParen, "Expected '(' after subroutine name.")?;
        let args = self.expression_list(receiver)?;
        self.emit_call(&target, args)
      },
      _ => self.error_current("Expected '(' or '.' after subroutine name."),
    }
  }

  /// Compile a comma separated list of arguments including the closing
  /// paren. Returns the number of arguments plus the `pushed` ones
  /// already on the stack
  fn expression_list(&mut self, pushed: u16) -> CompileResult<u16, FileId> {
    self.open(Rule::ExpressionList)?;
    let mut count = pushed;

    if !self.check(TokenKind::RightParen) {
      loop {
        if count >= MAX_INTEGER {
          return self.error_current(&format!(
            "Too many arguments, at most {} are allowed.",
            MAX_INTEGER
          ));
        }

        self.expr()?;
        count += 1;

        if !self.match_kind(TokenKind::Comma)? {
          break;
        }
      }
    }

    self.close(Rule::ExpressionList)?;
    self.consume(TokenKind::RightParen, "Expected ')' after arguments.")?;
    Ok(count)
  }

  /// Resolve the identifier just consumed as a variable
  fn variable(&self) -> CompileResult<Symbol<'a>, FileId> {
    let name = self.previous.str();

    match self.symbols.get(name) {
      Some(symbol) => Ok(*symbol),
      None => self.error(&format!("Undefined variable '{}'.", name)),
    }
  }

  /// Start the parse tree element for `rule`
  fn open(&mut self, rule: Rule) -> CompileResult<(), FileId> {
    match &mut self.tree {
      Some(tree) => tree.open(rule).map_err(tree_error),
      None => Ok(()),
    }
  }

  /// End the parse tree element for `rule`
  fn close(&mut self, rule: Rule) -> CompileResult<(), FileId> {
    match &mut self.tree {
      Some(tree) => tree.close(rule).map_err(tree_error),
      None => Ok(()),
    }
  }

  fn emit_push(&mut self, segment: Segment, index: u16) -> CompileResult<(), FileId> {
    self.writer.write_push(segment, index).map_err(io_error)
  }

  fn emit_pop(&mut self, segment: Segment, index: u16) -> CompileResult<(), FileId> {
    self.writer.write_pop(segment, index).map_err(io_error)
  }

  fn emit_arithmetic(&mut self, command: Arithmetic) -> CompileResult<(), FileId> {
    self.writer.write_arithmetic(command).map_err(io_error)
  }

  fn emit_label(&mut self, label: &str) -> CompileResult<(), FileId> {
    self.writer.write_label(label).map_err(io_error)
  }

  fn emit_goto(&mut self, label: &str) -> CompileResult<(), FileId> {
    self.writer.write_goto(label).map_err(io_error)
  }

  fn emit_if(&mut self, label: &str) -> CompileResult<(), FileId> {
    self.writer.write_if(label).map_err(io_error)
  }

  fn emit_call(&mut self, name: &str, args: u16) -> CompileResult<(), FileId> {
    self.writer.write_call(name, args).map_err(io_error)
  }

  fn emit_function(&mut self, name: &str, locals: u16) -> CompileResult<(), FileId> {
    self.writer.write_function(name, locals).map_err(io_error)
  }

  fn emit_return(&mut self) -> CompileResult<(), FileId> {
    self.writer.write_return().map_err(io_error)
  }

  /// The look-ahead token
  #[inline]
  fn current(&self) -> &Token<'a> {
    self.scanner.peek()
  }

  /// Does the provided token kind match the current kind
  #[inline]
  fn check(&self, kind: TokenKind) -> bool {
    self.current().kind() == kind
  }

  /// Does the provided token kind match if so advance
  #[inline]
  fn match_kind(&mut self, kind: TokenKind) -> CompileResult<bool, FileId> {
    if !self.check(kind) {
      return Ok(false);
    }
    self.advance()?;
    Ok(true)
  }

  /// Advance the compiler a token forward
  #[inline]
  fn advance(&mut self) -> CompileResult<(), FileId> {
    self.previous = self.scanner.advance();

    if let Some(tree) = &mut self.tree {
      tree.token(&self.previous).map_err(tree_error)?;
    }

    self.check_lookahead()
  }

  /// Report a lexical error as soon as it becomes the look-ahead
  fn check_lookahead(&self) -> CompileResult<(), FileId> {
    let token = *self.current();

    if token.kind() == TokenKind::Error {
      return self.error_at(token, token.str(), None);
    }

    Ok(())
  }

  /// Consume a token of the given kind
  #[inline]
  fn consume(&mut self, kind: TokenKind, message: &str) -> CompileResult<(), FileId> {
    if self.check(kind) {
      return self.advance();
    }

    self.error_current(message)
  }

  /// Consume an identifier returning its name
  fn identifier(&mut self, message: &str) -> CompileResult<&'a str, FileId> {
    self.consume(TokenKind::Identifier, message)?;
    Ok(self.previous.str())
  }

  /// Indicate an error occurred at the look-ahead token
  fn error_current<R>(&self, message: &str) -> CompileResult<R, FileId> {
    let token = *self.current();
    let found = match token.kind() {
      TokenKind::Eof => "found end of file".to_string(),
      _ => format!("found '{}'", token.str()),
    };

    self.error_at(token, message, Some(found))
  }

  /// Indicate an error occurred at the previous token
  fn error<R>(&self, message: &str) -> CompileResult<R, FileId> {
    self.error_at(self.previous, message, None)
  }

  /// Build the diagnostic for a failed compilation
  fn error_at<R>(
    &self,
    token: Token<'a>,
    message: &str,
    note: Option<String>,
  ) -> CompileResult<R, FileId> {
    let mut label = Label::primary(self.file_id, token.span());
    if let Some(note) = note {
      label = label.with_message(note);
    }

    Err(
      Diagnostic::error()
        .with_message(message)
        .with_labels(vec![label]),
    )
  }
}
