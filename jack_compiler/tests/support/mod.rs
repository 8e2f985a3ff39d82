use codespan_reporting::diagnostic::Diagnostic;
use jack_compiler::compile;
use std::fs;
use std::io;
use std::path::PathBuf;

pub fn fixture_path(path: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("fixture")
    .join(path)
}

pub fn load_source(path: &str) -> io::Result<String> {
  fs::read_to_string(fixture_path(path))
}

/// A compiled fixture. `instructions` holds everything emitted,
/// including the partial output of a failed unit
pub struct Compiled {
  pub source: String,
  pub result: Result<(), Diagnostic<()>>,
  pub instructions: Vec<String>,
}

impl Compiled {
  /// 1 based line of the primary label of the error
  #[allow(dead_code)]
  pub fn error_line(&self) -> Option<usize> {
    let error = self.result.as_ref().err()?;
    let start = error.labels.first()?.range.start;

    Some(self.source[..start].matches('\n').count() + 1)
  }
}

pub fn compile_fixture(path: &str) -> io::Result<Compiled> {
  let source = load_source(path)?;
  let mut buffer = Vec::new();

  let result = compile(&source, (), &mut buffer).0.map(|_| ());
  let instructions = String::from_utf8(buffer)
    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?
    .lines()
    .map(String::from)
    .collect();

  Ok(Compiled {
    source,
    result,
    instructions,
  })
}

#[allow(dead_code)]
pub fn assert_files_compile(paths: &[&str]) -> io::Result<()> {
  for path in paths {
    let compiled = compile_fixture(path)?;

    if let Err(error) = compiled.result {
      panic!("{} failed to compile: {}", path, error.message);
    }
  }

  Ok(())
}

/// Assert each fixture fails with the message on the given line
#[allow(dead_code)]
pub fn assert_files_fail(cases: &[(&str, &str, usize)]) -> io::Result<()> {
  for (path, message, line) in cases {
    let compiled = compile_fixture(path)?;

    match &compiled.result {
      Ok(()) => panic!("{} compiled but was expected to fail", path),
      Err(error) => assert_eq!(&error.message, message, "{}", path),
    }
    assert_eq!(compiled.error_line(), Some(*line), "{}", path);
  }

  Ok(())
}

/// Does `needle` appear as a contiguous run in `instructions`
#[allow(dead_code)]
pub fn contains_sequence(instructions: &[String], needle: &[&str]) -> bool {
  instructions
    .windows(needle.len())
    .any(|window| window.iter().zip(needle).all(|(a, b)| a == b))
}
