use crate::{
  compiler::{Compiler, Token, TokenClass},
  source::LineOffsets,
  token_xml::escape,
  CompileResult,
};
use codespan_reporting::diagnostic::Diagnostic;
use std::io::{self, BufWriter, Write};

/// The grammar rules that become an element of the parse tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
  Class,
  ClassVarDec,
  SubroutineDec,
  ParameterList,
  SubroutineBody,
  VarDec,
  Statements,
  LetStatement,
  IfStatement,
  WhileStatement,
  DoStatement,
  ReturnStatement,
  Expression,
  Term,
  ExpressionList,
}

impl Rule {
  /// The element name for this rule
  pub fn tag(self) -> &'static str {
    match self {
      Rule::Class => "class",
      Rule::ClassVarDec => "classVarDec",
      Rule::SubroutineDec => "subroutineDec",
      Rule::ParameterList => "parameterList",
      Rule::SubroutineBody => "subroutineBody",
      Rule::VarDec => "varDec",
      Rule::Statements => "statements",
      Rule::LetStatement => "letStatement",
      Rule::IfStatement => "ifStatement",
      Rule::WhileStatement => "whileStatement",
      Rule::DoStatement => "doStatement",
      Rule::ReturnStatement => "returnStatement",
      Rule::Expression => "expression",
      Rule::Term => "term",
      Rule::ExpressionList => "expressionList",
    }
  }
}

/// Writes the parse tree as nested xml while the compiler runs.
/// Rules open and close elements, consumed tokens are leaves
pub struct TreeWriter<W: Write> {
  out: BufWriter<W>,
  depth: usize,
}

impl<W: Write> TreeWriter<W> {
  pub fn new(sink: W) -> Self {
    Self {
      out: BufWriter::new(sink),
      depth: 0,
    }
  }

  pub fn open(&mut self, rule: Rule) -> io::Result<()> {
    self.indent()?;
    writeln!(self.out, "<{}>", rule.tag())?;
    self.depth += 1;
    Ok(())
  }

  pub fn close(&mut self, rule: Rule) -> io::Result<()> {
    self.depth = self.depth.saturating_sub(1);
    self.indent()?;
    writeln!(self.out, "</{}>", rule.tag())
  }

  /// Write a consumed token. End of file and error tokens have no element
  pub fn token(&mut self, token: &Token) -> io::Result<()> {
    if token.class() == TokenClass::Meta {
      return Ok(());
    }

    let tag = token.class().tag();
    self.indent()?;
    writeln!(self.out, "<{}> {} </{}>", tag, escape(token.str()), tag)
  }

  /// Flush the tree and hand back the sink
  pub fn finish(self) -> io::Result<W> {
    self.out.into_inner().map_err(|err| err.into_error())
  }

  fn indent(&mut self) -> io::Result<()> {
    write!(self.out, "{:width$}", "", width = self.depth * 2)
  }
}

/// Write the parse tree of the class in `source` as xml. The tree comes
/// from the same pass that generates code, so any compile error stops it.
/// Elements already written are kept
///
/// # Examples
/// ```
/// use jack_compiler::parse_tree::write_tree_xml;
///
/// let (result, _) = write_tree_xml("class Main { }", 0, Vec::new());
/// let xml = String::from_utf8(result.unwrap()).unwrap();
///
/// assert_eq!(
///   xml,
///   "<class>\n  <keyword> class </keyword>\n  <identifier> Main </identifier>\n  \
///    <symbol> { </symbol>\n  <symbol> } </symbol>\n</class>\n"
/// );
/// ```
pub fn write_tree_xml<W: Write, F: Copy>(
  source: &str,
  file_id: F,
  sink: W,
) -> (CompileResult<W, F>, LineOffsets) {
  let (result, line_offsets) =
    Compiler::with_tree(source, file_id, io::sink(), sink).compile_with_tree();

  let result = result.and_then(|(_, tree)| {
    tree.ok_or_else(|| Diagnostic::bug().with_message("Parse tree was not recorded."))
  });

  (result, line_offsets)
}
