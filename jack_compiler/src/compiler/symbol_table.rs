use super::scanner::MAX_INTEGER;
use crate::vm_writer::Segment;
use fnv::FnvBuildHasher;
use hashbrown::HashMap;
use std::fmt;

/// The declarative category of a name
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Kind {
  Static,
  Field,
  Argument,
  Local,
}

impl Kind {
  /// The memory segment a name of this kind lives in at runtime
  pub fn segment(self) -> Segment {
    match self {
      Kind::Static => Segment::Static,
      Kind::Field => Segment::This,
      Kind::Argument => Segment::Argument,
      Kind::Local => Segment::Local,
    }
  }

  fn is_class_level(self) -> bool {
    matches!(self, Kind::Static | Kind::Field)
  }

  /// Slot of this kind's counter inside its scope
  fn slot(self) -> usize {
    match self {
      Kind::Static | Kind::Argument => 0,
      Kind::Field | Kind::Local => 1,
    }
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Kind::Static => "static",
      Kind::Field => "field",
      Kind::Argument => "argument",
      Kind::Local => "local",
    })
  }
}

/// Was the symbol successfully added
/// to this table
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AddSymbolResult {
  Ok,
  DuplicateSymbol,

  /// Every index for this kind is already taken
  TooManySymbols,
}

/// The compile time information for a declared name
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Symbol<'a> {
  /// The declared type, a primitive or a class name
  type_: &'a str,

  /// What kind of declaration introduced this symbol
  kind: Kind,

  /// Position within its kind, in declaration order
  index: u16,
}

impl<'a> Symbol<'a> {
  pub fn type_(&self) -> &'a str {
    self.type_
  }

  pub fn kind(&self) -> Kind {
    self.kind
  }

  pub fn index(&self) -> u16 {
    self.index
  }

  /// The memory segment holding this symbol
  pub fn segment(&self) -> Segment {
    self.kind.segment()
  }
}

/// A single level of names with one running counter per kind
#[derive(Default, Debug)]
struct Scope<'a> {
  symbols: HashMap<&'a str, Symbol<'a>, FnvBuildHasher>,
  counts: [u16; 2],
}

impl<'a> Scope<'a> {
  fn define(&mut self, name: &'a str, type_: &'a str, kind: Kind) -> AddSymbolResult {
    if self.symbols.contains_key(name) {
      return AddSymbolResult::DuplicateSymbol;
    }

    let count = &mut self.counts[kind.slot()];
    if *count >= MAX_INTEGER {
      return AddSymbolResult::TooManySymbols;
    }

    self.symbols.insert(
      name,
      Symbol {
        type_,
        kind,
        index: *count,
      },
    );
    *count += 1;

    AddSymbolResult::Ok
  }

  fn clear(&mut self) {
    self.symbols.clear();
    self.counts = [0; 2];
  }
}

/// Names declared in the class being compiled and in the
/// subroutine currently being compiled. Subroutine level
/// names shadow class level ones
#[derive(Default, Debug)]
pub struct SymbolTable<'a> {
  /// static and field declarations
  class: Scope<'a>,

  /// argument and local declarations
  subroutine: Scope<'a>,
}

impl<'a> SymbolTable<'a> {
  /// Begin a new subroutine, forgetting every argument and local
  pub fn start_subroutine(&mut self) {
    self.subroutine.clear();
  }

  /// Define a new symbol assigning it the next index for its kind.
  /// A name already present in the same scope is left untouched.
  /// A kind holds at most 32767 names so its count is itself a valid constant
  pub fn define(&mut self, name: &'a str, type_: &'a str, kind: Kind) -> AddSymbolResult {
    if kind.is_class_level() {
      self.class.define(name, type_, kind)
    } else {
      self.subroutine.define(name, type_, kind)
    }
  }

  /// Retrieve a symbol if it exists in either scope
  pub fn get(&self, name: &str) -> Option<&Symbol<'a>> {
    self
      .subroutine
      .symbols
      .get(name)
      .or_else(|| self.class.symbols.get(name))
  }

  pub fn kind_of(&self, name: &str) -> Option<Kind> {
    self.get(name).map(|symbol| symbol.kind)
  }

  pub fn type_of(&self, name: &str) -> Option<&'a str> {
    self.get(name).map(|symbol| symbol.type_)
  }

  pub fn index_of(&self, name: &str) -> Option<u16> {
    self.get(name).map(|symbol| symbol.index)
  }

  /// How many symbols of this kind are currently defined
  pub fn var_count(&self, kind: Kind) -> u16 {
    if kind.is_class_level() {
      self.class.counts[kind.slot()]
    } else {
      self.subroutine.counts[kind.slot()]
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn segment() {
    assert_eq!(Kind::Static.segment(), Segment::Static);
    assert_eq!(Kind::Field.segment(), Segment::This);
    assert_eq!(Kind::Argument.segment(), Segment::Argument);
    assert_eq!(Kind::Local.segment(), Segment::Local);
  }

  #[test]
  fn define_ok() {
    let mut table = SymbolTable::default();

    assert_eq!(table.define("x", "int", Kind::Field), AddSymbolResult::Ok);
    assert_eq!(table.kind_of("x"), Some(Kind::Field));
    assert_eq!(table.type_of("x"), Some("int"));
    assert_eq!(table.index_of("x"), Some(0));
  }

  #[test]
  fn define_duplicate() {
    let mut table = SymbolTable::default();

    table.define("x", "int", Kind::Field);
    assert_eq!(
      table.define("x", "boolean", Kind::Static),
      AddSymbolResult::DuplicateSymbol
    );

    // the first definition wins and the counter did not move
    assert_eq!(table.kind_of("x"), Some(Kind::Field));
    assert_eq!(table.type_of("x"), Some("int"));
    assert_eq!(table.var_count(Kind::Static), 0);
    assert_eq!(table.var_count(Kind::Field), 1);
  }

  #[test]
  fn define_duplicate_in_subroutine() {
    let mut table = SymbolTable::default();

    table.define("a", "int", Kind::Argument);
    assert_eq!(
      table.define("a", "int", Kind::Local),
      AddSymbolResult::DuplicateSymbol
    );
    assert_eq!(table.var_count(Kind::Local), 0);
  }

  #[test]
  fn indices_are_dense_per_kind() {
    let mut table = SymbolTable::default();
    let names = ["a", "b", "c", "d", "e", "f"];

    for (i, name) in names.iter().enumerate() {
      let kind = if i % 2 == 0 { Kind::Field } else { Kind::Static };
      table.define(name, "int", kind);
    }

    assert_eq!(table.index_of("a"), Some(0));
    assert_eq!(table.index_of("c"), Some(1));
    assert_eq!(table.index_of("e"), Some(2));
    assert_eq!(table.index_of("b"), Some(0));
    assert_eq!(table.index_of("d"), Some(1));
    assert_eq!(table.index_of("f"), Some(2));
    assert_eq!(table.var_count(Kind::Field), 3);
    assert_eq!(table.var_count(Kind::Static), 3);
  }

  #[test]
  fn indices_count_up_from_zero() {
    let names: Vec<String> = (0..50).map(|i| format!("local{}", i)).collect();
    let mut table = SymbolTable::default();

    for name in &names {
      table.define(name, "int", Kind::Local);
    }

    for (i, name) in names.iter().enumerate() {
      assert_eq!(table.index_of(name), Some(i as u16));
    }
    assert_eq!(table.var_count(Kind::Local), 50);
    assert_eq!(table.var_count(Kind::Argument), 0);
  }

  #[test]
  fn kind_is_full() {
    let names: Vec<String> = (0..=MAX_INTEGER).map(|i| format!("v{}", i)).collect();
    let mut table = SymbolTable::default();

    let (last, rest) = names.split_last().expect("Expected names");
    for name in rest {
      assert_eq!(table.define(name, "int", Kind::Local), AddSymbolResult::Ok);
    }
    assert_eq!(table.index_of(&rest[rest.len() - 1]), Some(MAX_INTEGER - 1));
    assert_eq!(table.var_count(Kind::Local), MAX_INTEGER);

    assert_eq!(
      table.define(last, "int", Kind::Local),
      AddSymbolResult::TooManySymbols
    );
    assert_eq!(table.kind_of(last), None);

    // other kinds keep their own room
    assert_eq!(table.define(last, "int", Kind::Argument), AddSymbolResult::Ok);
    assert_eq!(table.index_of(last), Some(0));
  }

  #[test]
  fn unknown_name() {
    let table = SymbolTable::default();

    assert!(table.get("Output").is_none());
    assert_eq!(table.kind_of("Output"), None);
    assert_eq!(table.type_of("Output"), None);
    assert_eq!(table.index_of("Output"), None);
  }

  #[test]
  fn subroutine_shadows_class() {
    let mut table = SymbolTable::default();

    table.define("x", "int", Kind::Field);
    table.define("y", "int", Kind::Field);
    table.define("x", "Point", Kind::Argument);

    assert_eq!(table.kind_of("x"), Some(Kind::Argument));
    assert_eq!(table.type_of("x"), Some("Point"));
    assert_eq!(table.index_of("x"), Some(0));
    assert_eq!(table.kind_of("y"), Some(Kind::Field));
    assert_eq!(table.index_of("y"), Some(1));
  }

  #[test]
  fn start_subroutine() {
    let mut table = SymbolTable::default();

    table.define("count", "int", Kind::Static);
    table.define("size", "int", Kind::Field);
    table.define("size", "int", Kind::Argument);
    table.define("i", "int", Kind::Local);

    let before = (table.get("count").copied(), table.get("size").copied());
    table.start_subroutine();

    assert_eq!(table.get("count").copied(), before.0);
    assert_eq!(table.kind_of("size"), Some(Kind::Field));
    assert_eq!(table.kind_of("i"), None);
    assert_eq!(table.var_count(Kind::Argument), 0);
    assert_eq!(table.var_count(Kind::Local), 0);
    assert_eq!(table.var_count(Kind::Static), 1);
    assert_eq!(table.var_count(Kind::Field), 1);

    // idempotent with respect to the class scope
    table.start_subroutine();
    assert_eq!(table.get("count").copied(), before.0);
    assert_eq!(table.kind_of("size"), Some(Kind::Field));

    // counters restart
    table.define("j", "int", Kind::Local);
    assert_eq!(table.index_of("j"), Some(0));
  }
}
