use std::{fmt, ops::Range};

/// A byte range into the source of a compilation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
  pub start: u32,
  pub end: u32,
}

impl From<Span> for Range<usize> {
  fn from(span: Span) -> Self {
    (span.start as usize)..(span.end as usize)
  }
}

/// Anything that covers a region of the source
pub trait Spanned {
  fn start(&self) -> u32;
  fn end(&self) -> u32;

  fn span(&self) -> Span {
    Span {
      start: self.start(),
      end: self.end(),
    }
  }
}

/// A token in the Jack language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
  /// The token kind
  kind: TokenKind,

  /// The text of this token. For string constants this excludes
  /// the quotes, for error tokens this is the error message
  lexeme: &'a str,

  /// the start offset of this token
  start: u32,

  /// The end offset of this token
  end: u32,
}

impl<'a> Token<'a> {
  pub const fn new(kind: TokenKind, lexeme: &'a str, start: u32, end: u32) -> Self {
    Self {
      kind,
      lexeme,
      start,
      end,
    }
  }

  #[inline]
  pub fn str(&self) -> &'a str {
    self.lexeme
  }

  #[inline]
  pub fn kind(&self) -> TokenKind {
    self.kind
  }

  /// The lexical class of this token
  #[inline]
  pub fn class(&self) -> TokenClass {
    self.kind.class()
  }
}

impl<'a> Spanned for Token<'a> {
  fn start(&self) -> u32 {
    self.start
  }

  fn end(&self) -> u32 {
    self.end
  }
}

/// The five lexical classes of the Jack language plus
/// the scanner's meta tokens
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum TokenClass {
  Keyword,
  Symbol,
  Identifier,
  IntegerConstant,
  StringConstant,
  Meta,
}

impl TokenClass {
  /// The element name used when dumping tokens as xml
  pub fn tag(&self) -> &'static str {
    match self {
      TokenClass::Keyword => "keyword",
      TokenClass::Symbol => "symbol",
      TokenClass::Identifier => "identifier",
      TokenClass::IntegerConstant => "integerConstant",
      TokenClass::StringConstant => "stringConstant",
      TokenClass::Meta => "meta",
    }
  }
}

/// Token kinds in the Jack language
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[repr(u8)]
pub enum TokenKind {
  LeftBrace,
  RightBrace,
  LeftParen,
  RightParen,
  LeftBracket,
  RightBracket,
  Dot,
  Comma,
  Semicolon,
  Plus,
  Minus,
  Star,
  Slash,
  Amp,
  Pipe,
  Less,
  Greater,
  Equal,
  Tilde,

  // sequences
  Identifier,
  IntegerConstant,
  StringConstant,

  // declarations
  Class,
  Constructor,
  Function,
  Method,
  Field,
  Static,
  Var,

  // types
  Int,
  Char,
  Boolean,
  Void,

  // keyword constants
  True,
  False,
  Null,
  This,

  // statements
  Let,
  Do,
  If,
  Else,
  While,
  Return,

  // meta
  Error,
  Eof,
}

impl TokenKind {
  /// Identify if the provided identifier is a keyword
  pub fn keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
      "class" => TokenKind::Class,
      "constructor" => TokenKind::Constructor,
      "function" => TokenKind::Function,
      "method" => TokenKind::Method,
      "field" => TokenKind::Field,
      "static" => TokenKind::Static,
      "var" => TokenKind::Var,
      "int" => TokenKind::Int,
      "char" => TokenKind::Char,
      "boolean" => TokenKind::Boolean,
      "void" => TokenKind::Void,
      "true" => TokenKind::True,
      "false" => TokenKind::False,
      "null" => TokenKind::Null,
      "this" => TokenKind::This,
      "let" => TokenKind::Let,
      "do" => TokenKind::Do,
      "if" => TokenKind::If,
      "else" => TokenKind::Else,
      "while" => TokenKind::While,
      "return" => TokenKind::Return,
      _ => return None,
    })
  }

  /// The lexical class this kind belongs to
  pub fn class(&self) -> TokenClass {
    match self {
      TokenKind::LeftBrace
      | TokenKind::RightBrace
      | TokenKind::LeftParen
      | TokenKind::RightParen
      | TokenKind::LeftBracket
      | TokenKind::RightBracket
      | TokenKind::Dot
      | TokenKind::Comma
      | TokenKind::Semicolon
      | TokenKind::Plus
      | TokenKind::Minus
      | TokenKind::Star
      | TokenKind::Slash
      | TokenKind::Amp
      | TokenKind::Pipe
      | TokenKind::Less
      | TokenKind::Greater
      | TokenKind::Equal
      | TokenKind::Tilde => TokenClass::Symbol,
      TokenKind::Identifier => TokenClass::Identifier,
      TokenKind::IntegerConstant => TokenClass::IntegerConstant,
      TokenKind::StringConstant => TokenClass::StringConstant,
      TokenKind::Error | TokenKind::Eof => TokenClass::Meta,
      _ => TokenClass::Keyword,
    }
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      TokenKind::LeftBrace => "{",
      TokenKind::RightBrace => "}",
      TokenKind::LeftParen => "(",
      TokenKind::RightParen => ")",
      TokenKind::LeftBracket => "[",
      TokenKind::RightBracket => "]",
      TokenKind::Dot => ".",
      TokenKind::Comma => ",",
      TokenKind::Semicolon => ";",
      TokenKind::Plus => "+",
      TokenKind::Minus => "-",
      TokenKind::Star => "*",
      TokenKind::Slash => "/",
      TokenKind::Amp => "&",
      TokenKind::Pipe => "|",
      TokenKind::Less => "<",
      TokenKind::Greater => ">",
      TokenKind::Equal => "=",
      TokenKind::Tilde => "~",
      TokenKind::Identifier => "identifier",
      TokenKind::IntegerConstant => "integer constant",
      TokenKind::StringConstant => "string constant",
      TokenKind::Class => "class",
      TokenKind::Constructor => "constructor",
      TokenKind::Function => "function",
      TokenKind::Method => "method",
      TokenKind::Field => "field",
      TokenKind::Static => "static",
      TokenKind::Var => "var",
      TokenKind::Int => "int",
      TokenKind::Char => "char",
      TokenKind::Boolean => "boolean",
      TokenKind::Void => "void",
      TokenKind::True => "true",
      TokenKind::False => "false",
      TokenKind::Null => "null",
      TokenKind::This => "this",
      TokenKind::Let => "let",
      TokenKind::Do => "do",
      TokenKind::If => "if",
      TokenKind::Else => "else",
      TokenKind::While => "while",
      TokenKind::Return => "return",
      TokenKind::Error => "error",
      TokenKind::Eof => "end of file",
    })
  }
}
