use crate::units;
use anyhow::Context;
use clap::ArgMatches;
use codespan_reporting::term::{self, Config};
use jack_compiler::{
  parse_tree::write_tree_xml,
  source::{FileId, JackFiles, LineOffsets},
  token_xml::write_token_xml,
  CompileResult,
};
use std::{
  fs::{self, File},
  io::Write,
  path::{Path, PathBuf},
};
use termcolor::{ColorChoice, StandardStream, WriteColor};
use tracing::{info, warn};

/// How a run of the driver ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Success,
  CompileError,
}

impl Status {
  /// Process exit code for this status
  pub fn code(self) -> i32 {
    match self {
      Status::Success => 0,
      Status::CompileError => 1,
    }
  }
}

/// What the driver produces for each unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Compile,
  Tokens,
  Tree,
}

impl Mode {
  /// Appended to the unit's stem to name its output
  fn suffix(self) -> &'static str {
    match self {
      Mode::Compile => ".vm",
      Mode::Tokens => "T.xml",
      Mode::Tree => ".xml",
    }
  }

  fn run<W: Write>(
    self,
    source: &str,
    file_id: FileId,
    out: W,
  ) -> (CompileResult<W, FileId>, LineOffsets) {
    match self {
      Mode::Compile => jack_compiler::compile(source, file_id, out),
      Mode::Tokens => write_token_xml(source, file_id, out),
      Mode::Tree => write_tree_xml(source, file_id, out),
    }
  }
}

pub fn compile(args: &ArgMatches) -> anyhow::Result<Status> {
  dispatch(args, Mode::Compile, args.get_flag("keep-going"))
}

pub fn tokens(args: &ArgMatches) -> anyhow::Result<Status> {
  dispatch(args, Mode::Tokens, false)
}

pub fn tree(args: &ArgMatches) -> anyhow::Result<Status> {
  dispatch(args, Mode::Tree, false)
}

fn dispatch(args: &ArgMatches, mode: Mode, keep_going: bool) -> anyhow::Result<Status> {
  let path = args
    .get_one::<PathBuf>("path")
    .context("Expected a path to compile")?;
  let out_dir = args.get_one::<PathBuf>("out-dir").map(PathBuf::as_path);

  let mut stderr = StandardStream::stderr(ColorChoice::Auto);
  run(path, out_dir, mode, keep_going, &mut stderr)
}

/// Run every unit under `path` in order. Without `keep_going` the first
/// failing unit ends the run
fn run(
  path: &Path,
  out_dir: Option<&Path>,
  mode: Mode,
  keep_going: bool,
  stderr: &mut dyn WriteColor,
) -> anyhow::Result<Status> {
  let units = units::collect(path)?;

  if let Some(dir) = out_dir {
    fs::create_dir_all(dir)
      .with_context(|| format!("Unable to create output directory {}", dir.display()))?;
  }

  let mut files = JackFiles::default();
  let mut status = Status::Success;

  for unit in &units {
    if !run_unit(&mut files, unit, out_dir, mode, stderr)? {
      status = Status::CompileError;

      if !keep_going {
        break;
      }
    }
  }

  Ok(status)
}

/// Run a single unit writing its output file. Returns whether it succeeded.
/// Diagnostics are rendered to `stderr`
fn run_unit(
  files: &mut JackFiles,
  unit: &Path,
  out_dir: Option<&Path>,
  mode: Mode,
  stderr: &mut dyn WriteColor,
) -> anyhow::Result<bool> {
  let source = fs::read_to_string(unit)
    .with_context(|| format!("Unable to read {}", unit.display()))?;

  if let (Some(class), Some(stem)) = (units::declared_class(&source), unit.file_stem()) {
    if stem.to_string_lossy() != class {
      warn!(unit = %unit.display(), class, "class name does not match file name");
    }
  }

  let output = units::output_path(unit, out_dir, mode.suffix())?;
  let sink = File::create(&output)
    .with_context(|| format!("Unable to create {}", output.display()))?;

  let file_id = files.upsert(unit.display().to_string(), source);
  let (result, line_offsets) = mode.run(files.source_of(file_id)?, file_id, sink);
  files.update_line_offsets(file_id, line_offsets)?;

  match result {
    Ok(_) => {
      info!(unit = %unit.display(), output = %output.display(), "wrote unit");
      Ok(true)
    },
    Err(diagnostic) => {
      term::emit(stderr, &Config::default(), &*files, &diagnostic)?;
      Ok(false)
    },
  }
}
