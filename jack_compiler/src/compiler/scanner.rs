use std::{iter::Peekable, mem, str::CharIndices};

use super::token::{Token, TokenKind};
use crate::source::LineOffsets;

/// The largest integer constant the language accepts
pub const MAX_INTEGER: u16 = 32767;

/// A scanner for the Jack language. This struct is responsible
/// for taking a source string and tokenizing it. The scanner always
/// holds exactly one token of look-ahead
pub struct Scanner<'a> {
  /// The input source string
  source: &'a str,

  /// A peekable char indices iterator
  char_indices: Peekable<CharIndices<'a>>,

  /// The offsets at which each line starts
  line_offsets: Vec<usize>,

  /// The start of the current token
  start: usize,

  /// The offset of the next unread character
  current: usize,

  /// The next token to be handed out by `advance`
  lookahead: Token<'a>,
}

impl<'a> Scanner<'a> {
  /// Create a new scanner from the provided source string. The first
  /// token is scanned immediately and is available through `peek`
  pub fn new(source: &'a str) -> Scanner<'a> {
    assert!(
      source.len() < u32::MAX as usize,
      "Can only read files less than {} bytes",
      u32::MAX
    );

    let mut line_offsets = Vec::with_capacity(source_line_heuristic_guess(source.len()));
    line_offsets.push(0);

    let mut scanner = Scanner {
      source,
      char_indices: source.char_indices().peekable(),
      line_offsets,
      start: 0,
      current: 0,
      lookahead: Token::new(TokenKind::Eof, "", 0, 0),
    };

    scanner.lookahead = scanner.scan_token();
    scanner
  }

  /// Are there tokens left before the end of the source
  #[inline]
  pub fn has_more(&self) -> bool {
    self.lookahead.kind() != TokenKind::Eof
  }

  /// The look-ahead token, which the next call to `advance` returns
  #[inline]
  pub fn peek(&self) -> &Token<'a> {
    &self.lookahead
  }

  /// Consume the look-ahead token and scan the one after it
  pub fn advance(&mut self) -> Token<'a> {
    let next = self.scan_token();
    mem::replace(&mut self.lookahead, next)
  }

  /// Retrieve this files line offsets after it has
  /// been scanned
  pub fn line_offsets(mut self) -> LineOffsets {
    while self.next().is_some() {}

    self.line_offsets.shrink_to_fit();
    LineOffsets::new(self.line_offsets, self.source.len())
  }

  /// Scan the next token from the source
  fn scan_token(&mut self) -> Token<'a> {
    if let Err(message) = self.skip_white_space() {
      return self.error_token(message);
    }

    self.start = self.current;

    let c = match self.next() {
      Some(c) => c,
      None => return self.make_token(TokenKind::Eof),
    };

    match c {
      '{' => self.make_token(TokenKind::LeftBrace),
      '}' => self.make_token(TokenKind::RightBrace),
      '(' => self.make_token(TokenKind::LeftParen),
      ')' => self.make_token(TokenKind::RightParen),
      '[' => self.make_token(TokenKind::LeftBracket),
      ']' => self.make_token(TokenKind::RightBracket),
      '.' => self.make_token(TokenKind::Dot),
      ',' => self.make_token(TokenKind::Comma),
      ';' => self.make_token(TokenKind::Semicolon),
      '+' => self.make_token(TokenKind::Plus),
      '-' => self.make_token(TokenKind::Minus),
      '*' => self.make_token(TokenKind::Star),
      '/' => self.make_token(TokenKind::Slash),
      '&' => self.make_token(TokenKind::Amp),
      '|' => self.make_token(TokenKind::Pipe),
      '<' => self.make_token(TokenKind::Less),
      '>' => self.make_token(TokenKind::Greater),
      '=' => self.make_token(TokenKind::Equal),
      '~' => self.make_token(TokenKind::Tilde),
      '"' => self.string(),
      _ => {
        if is_digit(c) {
          return self.integer();
        }

        if is_alpha(c) {
          return self.identifier();
        }

        self.error_token("Unexpected character.")
      },
    }
  }

  /// Generate an identifier or keyword token
  fn identifier(&mut self) -> Token<'a> {
    while self.next_if(|c| is_alpha(*c) || is_digit(*c)).is_some() {}

    let kind = TokenKind::keyword(self.current_slice()).unwrap_or(TokenKind::Identifier);
    self.make_token(kind)
  }

  /// Generate an integer constant token
  fn integer(&mut self) -> Token<'a> {
    while self.next_if(|c| is_digit(*c)).is_some() {}

    // 12abc is neither a number nor an identifier
    if self.next_if(|c| is_alpha(*c)).is_some() {
      while self.next_if(|c| is_alpha(*c) || is_digit(*c)).is_some() {}
      return self.error_token("Malformed integer constant.");
    }

    match self.current_slice().parse::<u16>() {
      Ok(value) if value <= MAX_INTEGER => self.make_token(TokenKind::IntegerConstant),
      _ => self.error_token("Integer constant must be between 0 and 32767."),
    }
  }

  /// Generate a string constant token. The lexeme excludes the quotes
  fn string(&mut self) -> Token<'a> {
    loop {
      match self.peek_char() {
        Some('"') => {
          self.next();
          break;
        },
        Some('\n') | None => return self.error_token("Unterminated string."),
        Some(_) => {
          self.next();
        },
      }
    }

    Token::new(
      TokenKind::StringConstant,
      &self.source[self.start + 1..self.current - 1],
      self.start as u32,
      self.current as u32,
    )
  }

  /// Advance through whitespace and comments effectively throwing them away
  fn skip_white_space(&mut self) -> Result<(), &'static str> {
    while let Some(c) = self.peek_char() {
      match c {
        '/' => match self.peek_next() {
          Some('/') => while self.next_if(|c| *c != '\n').is_some() {},
          Some('*') => self.block_comment()?,
          _ => return Ok(()),
        },
        c if c.is_whitespace() => {
          self.next();
        },
        _ => return Ok(()),
      }
    }

    Ok(())
  }

  /// Skip a `/* */` or `/** */` comment which may span several lines
  fn block_comment(&mut self) -> Result<(), &'static str> {
    self.start = self.current;
    self.next();
    self.next();

    loop {
      match self.next() {
        Some('*') => {
          if self.match_char('/') {
            return Ok(());
          }
        },
        Some(_) => (),
        None => return Err("Unterminated block comment."),
      }
    }
  }

  /// Make a token from the current state of the scanner
  fn make_token(&self, kind: TokenKind) -> Token<'a> {
    Token::new(
      kind,
      self.current_slice(),
      self.start as u32,
      self.current as u32,
    )
  }

  /// Make a new error token
  fn error_token(&self, message: &'static str) -> Token<'a> {
    Token::new(
      TokenKind::Error,
      message,
      self.start as u32,
      self.current as u32,
    )
  }

  /// Advance the character iterator if condition is met
  fn next_if(&mut self, f: impl FnOnce(&char) -> bool) -> Option<char> {
    match self.peek_char() {
      Some(c) if f(&c) => self.next(),
      _ => None,
    }
  }

  /// Get the next character, recording line breaks as they pass
  fn next(&mut self) -> Option<char> {
    self.char_indices.next().map(|(index, c)| {
      self.current = index + c.len_utf8();

      if c == '\n' {
        self.line_offsets.push(self.current);
      }

      c
    })
  }

  /// Peek the next character
  fn peek_char(&mut self) -> Option<char> {
    self.char_indices.peek().map(|(_, c)| *c)
  }

  /// Peek the character after the next character
  fn peek_next(&self) -> Option<char> {
    self.source[self.current..].chars().nth(1)
  }

  /// Get the current str slice
  fn current_slice(&self) -> &'a str {
    &self.source[self.start..self.current]
  }

  /// match the next character against an expected
  fn match_char(&mut self, expected: char) -> bool {
    self.next_if(|c| *c == expected).is_some()
  }
}

/// Is the char a decimal digit
fn is_digit(c: char) -> bool {
  c.is_ascii_digit()
}

/// Can the char start an identifier
fn is_alpha(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '_'
}

/// A loose estimate for how many characters are in a typical line
const fn source_line_heuristic_guess(len: usize) -> usize {
  len / 20
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::compiler::token::Spanned;
  use crate::source::LineError;

  fn kinds(source: &str) -> Vec<TokenKind> {
    let mut scanner = Scanner::new(source);
    let mut kinds = vec![];

    while scanner.has_more() {
      kinds.push(scanner.advance().kind());
    }

    kinds
  }

  fn single(source: &str) -> Token<'_> {
    Scanner::new(source).advance()
  }

  #[test]
  fn new() {
    let source = "
    class Main {
      field int x;
    }
    ";

    let scanner = Scanner::new(source);
    let token = scanner.peek();

    assert_eq!(token.start(), 5);
    assert_eq!(token.end(), 10);
    assert_eq!(token.kind(), TokenKind::Class);
    assert_eq!(token.str(), "class");
  }

  #[test]
  fn advance() {
    let source = "let x = \"something\";";

    let mut scanner = Scanner::new(source);
    let asserts = [
      (TokenKind::Let, "let", 0, 3),
      (TokenKind::Identifier, "x", 4, 5),
      (TokenKind::Equal, "=", 6, 7),
      (TokenKind::StringConstant, "something", 8, 19),
      (TokenKind::Semicolon, ";", 19, 20),
      (TokenKind::Eof, "", 20, 20),
    ];

    for (kind, lexeme, start, end) in asserts {
      let token = scanner.advance();
      assert_eq!(token.kind(), kind);
      assert_eq!(token.str(), lexeme);
      assert_eq!(token.start(), start);
      assert_eq!(token.end(), end);
    }
  }

  #[test]
  fn peek_does_not_consume() {
    let mut scanner = Scanner::new("do Main.run();");

    assert_eq!(scanner.peek().kind(), TokenKind::Do);
    assert_eq!(scanner.peek().kind(), TokenKind::Do);
    assert_eq!(scanner.advance().kind(), TokenKind::Do);
    assert_eq!(scanner.peek().kind(), TokenKind::Identifier);
    assert_eq!(scanner.peek().str(), "Main");
  }

  #[test]
  fn peek_across_comments_and_strings() {
    let mut scanner = Scanner::new("/* a */ \"b c\" // d\n12 e");

    assert_eq!(scanner.peek().kind(), TokenKind::StringConstant);
    assert_eq!(scanner.advance().str(), "b c");
    assert_eq!(scanner.peek().str(), "12");
    assert_eq!(scanner.advance().kind(), TokenKind::IntegerConstant);
    assert_eq!(scanner.peek().str(), "e");
    assert_eq!(scanner.advance().kind(), TokenKind::Identifier);
    assert!(!scanner.has_more());
  }

  #[test]
  fn has_more() {
    let mut scanner = Scanner::new("return;");

    assert!(scanner.has_more());
    scanner.advance();
    assert!(scanner.has_more());
    scanner.advance();
    assert!(!scanner.has_more());
  }

  #[test]
  fn empty_string() {
    let mut scanner = Scanner::new("");

    assert!(!scanner.has_more());
    let token_eof = scanner.advance();
    assert_eq!(token_eof.kind(), TokenKind::Eof);
    assert_eq!(token_eof.str(), "");

    // eof is sticky
    assert_eq!(scanner.advance().kind(), TokenKind::Eof);
  }

  #[test]
  fn symbols() {
    assert_eq!(
      kinds("{}()[].,;+-*/&|<>=~"),
      vec![
        TokenKind::LeftBrace,
        TokenKind::RightBrace,
        TokenKind::LeftParen,
        TokenKind::RightParen,
        TokenKind::LeftBracket,
        TokenKind::RightBracket,
        TokenKind::Dot,
        TokenKind::Comma,
        TokenKind::Semicolon,
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Star,
        TokenKind::Slash,
        TokenKind::Amp,
        TokenKind::Pipe,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Equal,
        TokenKind::Tilde,
      ]
    );
  }

  #[test]
  fn symbols_terminate_tokens() {
    let mut scanner = Scanner::new("a[i]=x+12;");
    let asserts = [
      (TokenKind::Identifier, "a"),
      (TokenKind::LeftBracket, "["),
      (TokenKind::Identifier, "i"),
      (TokenKind::RightBracket, "]"),
      (TokenKind::Equal, "="),
      (TokenKind::Identifier, "x"),
      (TokenKind::Plus, "+"),
      (TokenKind::IntegerConstant, "12"),
      (TokenKind::Semicolon, ";"),
    ];

    for (kind, lexeme) in asserts {
      let token = scanner.advance();
      assert_eq!(token.kind(), kind);
      assert_eq!(token.str(), lexeme);
    }
  }

  #[test]
  fn keywords_and_identifiers() {
    assert_eq!(
      kinds("class classy _class do do_it this This"),
      vec![
        TokenKind::Class,
        TokenKind::Identifier,
        TokenKind::Identifier,
        TokenKind::Do,
        TokenKind::Identifier,
        TokenKind::This,
        TokenKind::Identifier,
      ]
    );
  }

  #[test]
  fn comments() {
    let source = "
    // line comment
    /** api
     * comment */
    let /* inline */ x = 1; // trailing
    /* multi
       line */
    ";

    assert_eq!(
      kinds(source),
      vec![
        TokenKind::Let,
        TokenKind::Identifier,
        TokenKind::Equal,
        TokenKind::IntegerConstant,
        TokenKind::Semicolon,
      ]
    );
  }

  #[test]
  fn comment_at_end_of_file() {
    assert_eq!(kinds("x // done"), vec![TokenKind::Identifier]);
    assert_eq!(kinds("x /**/"), vec![TokenKind::Identifier]);
  }

  #[test]
  fn slash_is_still_a_symbol() {
    assert_eq!(
      kinds("a / b"),
      vec![TokenKind::Identifier, TokenKind::Slash, TokenKind::Identifier]
    );
  }

  #[test]
  fn unterminated_block_comment() {
    let mut scanner = Scanner::new("x /* never closed");
    assert_eq!(scanner.advance().kind(), TokenKind::Identifier);

    let token = scanner.advance();
    assert_eq!(token.kind(), TokenKind::Error);
    assert_eq!(token.str(), "Unterminated block comment.");
    assert_eq!(token.start(), 2);
  }

  #[test]
  fn string_constant() {
    let token = single("\"Hello, World!\"");
    assert_eq!(token.kind(), TokenKind::StringConstant);
    assert_eq!(token.str(), "Hello, World!");

    let token = single("\"\"");
    assert_eq!(token.kind(), TokenKind::StringConstant);
    assert_eq!(token.str(), "");

    // comment markers have no meaning inside strings
    let token = single("\"// not a comment\"");
    assert_eq!(token.kind(), TokenKind::StringConstant);
    assert_eq!(token.str(), "// not a comment");
  }

  #[test]
  fn unterminated_string() {
    let token = single("\"no end");
    assert_eq!(token.kind(), TokenKind::Error);
    assert_eq!(token.str(), "Unterminated string.");

    let token = single("\"no end\nlet\"");
    assert_eq!(token.kind(), TokenKind::Error);
    assert_eq!(token.str(), "Unterminated string.");
  }

  #[test]
  fn integer_constant() {
    let token = single("0");
    assert_eq!(token.kind(), TokenKind::IntegerConstant);
    assert_eq!(token.str(), "0");

    let token = single("32767");
    assert_eq!(token.kind(), TokenKind::IntegerConstant);
    assert_eq!(token.str(), "32767");
  }

  #[test]
  fn integer_constant_out_of_range() {
    for source in ["32768", "65535", "65536", "123456789012345678901234567890"] {
      let token = single(source);
      assert_eq!(token.kind(), TokenKind::Error, "{}", source);
      assert_eq!(token.str(), "Integer constant must be between 0 and 32767.");
      assert_eq!(token.end() as usize, source.len());
    }
  }

  #[test]
  fn negative_literal_is_minus_and_magnitude() {
    let mut scanner = Scanner::new("-32769");
    assert_eq!(scanner.advance().kind(), TokenKind::Minus);
    assert_eq!(scanner.advance().kind(), TokenKind::Error);

    let mut scanner = Scanner::new("-32767");
    assert_eq!(scanner.advance().kind(), TokenKind::Minus);
    assert_eq!(scanner.advance().kind(), TokenKind::IntegerConstant);
  }

  #[test]
  fn malformed_integer_constant() {
    let mut scanner = Scanner::new("12ab3 ;");
    let token = scanner.advance();

    assert_eq!(token.kind(), TokenKind::Error);
    assert_eq!(token.str(), "Malformed integer constant.");
    assert_eq!(token.start(), 0);
    assert_eq!(token.end(), 5);
    assert_eq!(scanner.advance().kind(), TokenKind::Semicolon);
  }

  #[test]
  fn unexpected_character() {
    for source in ["#", "!", "@", "'", "$", "é"] {
      let token = single(source);
      assert_eq!(token.kind(), TokenKind::Error, "{}", source);
      assert_eq!(token.str(), "Unexpected character.");
      assert_eq!(token.end() as usize, source.len());
    }
  }

  #[test]
  fn line_offsets() {
    let source = "class Main {\n  field int x;\n}";

    let mut scanner = Scanner::new(source);
    scanner.advance();
    let offsets = scanner.line_offsets();

    assert_eq!(offsets.lines(), 3);
    assert_eq!(offsets.line_range(0), Ok(0..13));
    assert_eq!(offsets.line_range(1), Ok(13..28));
    assert_eq!(offsets.line_range(2), Ok(28..29));
    assert_eq!(offsets.line_range(3), Err(LineError::LineOutOfBounds));
  }

  #[test]
  fn line_offsets_count_comment_lines() {
    let source = "/* one\ntwo\nthree */ x";

    let scanner = Scanner::new(source);
    let offsets = scanner.line_offsets();

    assert_eq!(offsets.lines(), 3);
    assert_eq!(offsets.offset_line(source.len()), Ok(2));
  }
}
