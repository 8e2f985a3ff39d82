#![deny(clippy::all)]

pub mod compiler;
pub mod parse_tree;
pub mod source;
pub mod token_xml;
mod utils;
pub mod vm_writer;

use codespan_reporting::diagnostic::Diagnostic;
use std::io::Write;

/// The result of compiling a single unit
pub type CompileResult<T, F> = Result<T, Diagnostic<F>>;

/// Compile one class from `source` into `out`
///
/// # Examples
/// ```
/// use jack_compiler::compile;
///
/// let source = "class Main { function int one() { return 1; } }";
/// let (result, _) = compile(source, 0, Vec::new());
///
/// let out = String::from_utf8(result.unwrap()).unwrap();
/// assert_eq!(out, "function Main.one 0\npush constant 1\nreturn\n");
/// ```
pub fn compile<W: Write, F: Copy>(
  source: &str,
  file_id: F,
  out: W,
) -> (CompileResult<W, F>, source::LineOffsets) {
  compiler::Compiler::new(source, file_id, out).compile()
}
