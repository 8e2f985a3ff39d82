#![deny(clippy::all)]
use clap::{value_parser, Arg, ArgAction, Command};
use std::{io, path::PathBuf, process};
use tracing::Level;

#[cfg(feature = "jemalloc")]
use jemallocator::Jemalloc;

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod cmd;
mod units;

/// Exit status when the driver itself fails
const DRIVER_ERROR: i32 = 2;

fn app() -> Command {
  let path = Arg::new("path")
    .help("A .jack file or a directory of .jack files")
    .required(true)
    .value_parser(value_parser!(PathBuf));

  let out_dir = Arg::new("out-dir")
    .help("Write outputs here instead of next to each input")
    .long("out-dir")
    .value_parser(value_parser!(PathBuf));

  Command::new("jack")
    .about("Compile Jack classes into stack machine code")
    .arg_required_else_help(true)
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .global(true),
    )
    .arg(
      Arg::new("quiet")
        .short('q')
        .long("quiet")
        .action(ArgAction::SetTrue)
        .global(true),
    )
    .subcommand(
      Command::new("compile")
        .about("Compile each class into a .vm file")
        .arg(path.clone())
        .arg(out_dir.clone())
        .arg(
          Arg::new("keep-going")
            .help("Continue with the remaining classes after a failure")
            .long("keep-going")
            .action(ArgAction::SetTrue),
        ),
    )
    .subcommand(
      Command::new("tokens")
        .about("Dump the tokens of each class as xml")
        .arg(path.clone())
        .arg(out_dir.clone()),
    )
    .subcommand(
      Command::new("tree")
        .about("Dump the parse tree of each class as xml")
        .arg(path)
        .arg(out_dir),
    )
}

/// The most detailed level logged for the given flags
fn verbosity(verbose: u8, quiet: bool) -> Level {
  if quiet {
    return Level::ERROR;
  }

  match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

fn main() {
  let matches = app().get_matches();

  tracing_subscriber::fmt()
    .with_max_level(verbosity(
      matches.get_count("verbose"),
      matches.get_flag("quiet"),
    ))
    .with_writer(io::stderr)
    .init();

  let result = match matches.subcommand() {
    Some(("compile", args)) => cmd::compile(args),
    Some(("tokens", args)) => cmd::tokens(args),
    Some(("tree", args)) => cmd::tree(args),
    _ => Err(anyhow::anyhow!("Unimplemented command")),
  };

  match result {
    Ok(status) => process::exit(status.code()),
    Err(err) => {
      eprintln!("error: {:#}", err);
      process::exit(DRIVER_ERROR)
    },
  }
}
