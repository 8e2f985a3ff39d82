use std::{
  fmt,
  io::{self, BufWriter, Write},
};
use tracing::trace;

/// The addressable memory regions of the stack machine
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Segment {
  Constant,
  Argument,
  Local,
  Static,
  This,
  That,
  Pointer,
  Temp,
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Segment::Constant => "constant",
      Segment::Argument => "argument",
      Segment::Local => "local",
      Segment::Static => "static",
      Segment::This => "this",
      Segment::That => "that",
      Segment::Pointer => "pointer",
      Segment::Temp => "temp",
    })
  }
}

/// Stack machine arithmetic and logic commands
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Arithmetic {
  /// Add the top two operands on the stack
  Add,

  /// Subtract the top operand from the one below it
  Sub,

  /// Negate the top operand
  Neg,

  /// Are the top two operands equal
  Eq,

  /// Is the second operand greater than the top
  Gt,

  /// Is the second operand less than the top
  Lt,

  /// Bitwise and of the top two operands
  And,

  /// Bitwise or of the top two operands
  Or,

  /// Bitwise not of the top operand
  Not,
}

impl fmt::Display for Arithmetic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Arithmetic::Add => "add",
      Arithmetic::Sub => "sub",
      Arithmetic::Neg => "neg",
      Arithmetic::Eq => "eq",
      Arithmetic::Gt => "gt",
      Arithmetic::Lt => "lt",
      Arithmetic::And => "and",
      Arithmetic::Or => "or",
      Arithmetic::Not => "not",
    })
  }
}

/// A single stack machine instruction
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Instruction<'a> {
  Push(Segment, u16),
  Pop(Segment, u16),
  Arithmetic(Arithmetic),
  Label(&'a str),
  Goto(&'a str),
  IfGoto(&'a str),
  Call(&'a str, u16),
  Function(&'a str, u16),
  Return,
}

impl<'a> fmt::Display for Instruction<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Instruction::Push(segment, index) => write!(f, "push {} {}", segment, index),
      Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
      Instruction::Arithmetic(command) => write!(f, "{}", command),
      Instruction::Label(label) => write!(f, "label {}", label),
      Instruction::Goto(label) => write!(f, "goto {}", label),
      Instruction::IfGoto(label) => write!(f, "if-goto {}", label),
      Instruction::Call(name, args) => write!(f, "call {} {}", name, args),
      Instruction::Function(name, locals) => write!(f, "function {} {}", name, locals),
      Instruction::Return => f.write_str("return"),
    }
  }
}

/// Writes stack machine instructions as text, one per line. The
/// writer performs no validation of its arguments.
///
/// The sink is buffered. `close` flushes and hands the sink back;
/// dropping the writer on an early exit flushes what was written so far
pub struct VmWriter<W: Write> {
  out: BufWriter<W>,
  written: usize,
}

impl<W: Write> VmWriter<W> {
  pub fn new(out: W) -> Self {
    Self {
      out: BufWriter::new(out),
      written: 0,
    }
  }

  /// Write a single instruction
  pub fn write(&mut self, instruction: Instruction) -> io::Result<()> {
    trace!(%instruction, "emit");
    writeln!(self.out, "{}", instruction)?;
    self.written += 1;
    Ok(())
  }

  pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
    self.write(Instruction::Push(segment, index))
  }

  pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
    self.write(Instruction::Pop(segment, index))
  }

  pub fn write_arithmetic(&mut self, command: Arithmetic) -> io::Result<()> {
    self.write(Instruction::Arithmetic(command))
  }

  pub fn write_label(&mut self, label: &str) -> io::Result<()> {
    self.write(Instruction::Label(label))
  }

  pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
    self.write(Instruction::Goto(label))
  }

  pub fn write_if(&mut self, label: &str) -> io::Result<()> {
    self.write(Instruction::IfGoto(label))
  }

  pub fn write_call(&mut self, name: &str, args: u16) -> io::Result<()> {
    self.write(Instruction::Call(name, args))
  }

  pub fn write_function(&mut self, name: &str, locals: u16) -> io::Result<()> {
    self.write(Instruction::Function(name, locals))
  }

  pub fn write_return(&mut self) -> io::Result<()> {
    self.write(Instruction::Return)
  }

  /// How many instructions have been written so far
  pub fn written(&self) -> usize {
    self.written
  }

  /// Push everything buffered so far to the sink
  pub fn flush(&mut self) -> io::Result<()> {
    self.out.flush()
  }

  /// Flush the buffer and release the sink
  pub fn close(self) -> io::Result<W> {
    self.out.into_inner().map_err(|err| err.into_error())
  }
}
