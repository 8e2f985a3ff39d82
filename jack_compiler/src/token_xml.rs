use crate::{
  compiler::{Scanner, Spanned, Token, TokenKind},
  source::LineOffsets,
  CompileResult,
};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use std::io::{self, BufWriter, Write};
use tracing::trace;

/// Escape the characters xml reserves
pub(crate) fn escape(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len());

  for c in text.chars() {
    match c {
      '<' => escaped.push_str("&lt;"),
      '>' => escaped.push_str("&gt;"),
      '&' => escaped.push_str("&amp;"),
      '"' => escaped.push_str("&quot;"),
      _ => escaped.push(c),
    }
  }

  escaped
}

fn write_token<W: Write>(out: &mut W, token: &Token) -> io::Result<()> {
  let tag = token.class().tag();
  writeln!(out, "<{}> {} </{}>", tag, escape(token.str()), tag)
}

fn io_error<F>(err: io::Error) -> Diagnostic<F> {
  Diagnostic::error().with_message(format!("Unable to write token: {}", err))
}

/// Write the token stream of `source` as a flat xml document, one
/// element per token. A lexical error stops the dump with a diagnostic,
/// elements already written are kept
///
/// # Examples
/// ```
/// use jack_compiler::token_xml::write_token_xml;
///
/// let (result, _) = write_token_xml("let x = 1;", 0, Vec::new());
/// let xml = String::from_utf8(result.unwrap()).unwrap();
///
/// assert!(xml.starts_with("<tokens>\n<keyword> let </keyword>\n"));
/// ```
pub fn write_token_xml<W: Write, F: Copy>(
  source: &str,
  file_id: F,
  sink: W,
) -> (CompileResult<W, F>, LineOffsets) {
  let mut scanner = Scanner::new(source);
  let mut out = BufWriter::new(sink);

  let result = dump(&mut scanner, file_id, &mut out);
  let closed = out
    .into_inner()
    .map_err(|err| io_error(err.into_error()));

  (result.and(closed), scanner.line_offsets())
}

fn dump<W: Write, F: Copy>(
  scanner: &mut Scanner,
  file_id: F,
  out: &mut W,
) -> CompileResult<(), F> {
  writeln!(out, "<tokens>").map_err(io_error)?;

  let mut count = 0;
  while scanner.has_more() {
    let token = scanner.advance();

    if token.kind() == TokenKind::Error {
      return Err(
        Diagnostic::error()
          .with_message(token.str())
          .with_labels(vec![Label::primary(file_id, token.span())]),
      );
    }

    write_token(out, &token).map_err(io_error)?;
    count += 1;
  }

  trace!(tokens = count, "dumped tokens");
  writeln!(out, "</tokens>").map_err(io_error)
}
