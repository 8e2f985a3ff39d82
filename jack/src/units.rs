use anyhow::{bail, Context};
use jack_compiler::compiler::{Scanner, TokenKind};
use std::{
  fs,
  path::{Path, PathBuf},
};

const EXTENSION: &str = "jack";

fn is_unit(path: &Path) -> bool {
  path.is_file() && path.extension().is_some_and(|ext| ext == EXTENSION)
}

/// The units named by `path`, a single `.jack` file or a directory
/// whose direct `.jack` children are taken in sorted order
pub fn collect(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
  if path.is_dir() {
    let entries = fs::read_dir(path)
      .with_context(|| format!("Unable to read directory {}", path.display()))?;

    let mut units = Vec::new();
    for entry in entries {
      let entry = entry.with_context(|| format!("Unable to read directory {}", path.display()))?;
      if is_unit(&entry.path()) {
        units.push(entry.path());
      }
    }

    if units.is_empty() {
      bail!("No .{} files found in {}", EXTENSION, path.display());
    }

    units.sort();
    return Ok(units);
  }

  if !path.exists() {
    bail!("{} does not exist", path.display());
  }

  if !is_unit(path) {
    bail!("{} is not a .{} file", path.display(), EXTENSION);
  }

  Ok(vec![path.to_path_buf()])
}

/// Where the output for `unit` is written
pub fn output_path(unit: &Path, out_dir: Option<&Path>, suffix: &str) -> anyhow::Result<PathBuf> {
  let stem = unit
    .file_stem()
    .with_context(|| format!("{} has no file name", unit.display()))?;
  let name = format!("{}{}", stem.to_string_lossy(), suffix);

  Ok(match out_dir.or_else(|| unit.parent()) {
    Some(dir) => dir.join(name),
    None => PathBuf::from(name),
  })
}

/// The class name a unit declares, if it starts the way a class must
pub fn declared_class(source: &str) -> Option<&str> {
  let mut scanner = Scanner::new(source);

  if scanner.advance().kind() != TokenKind::Class {
    return None;
  }

  let name = scanner.advance();
  match name.kind() {
    TokenKind::Identifier => Some(name.str()),
    _ => None,
  }
}
