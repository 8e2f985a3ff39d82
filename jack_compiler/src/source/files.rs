use std::ops::Range;

use codespan_reporting::files;
use fnv::FnvBuildHasher;
use hashbrown::HashMap;

/// A struct for efficiently determine lines for an associated
/// file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LineOffsets {
  /// The offsets where line break occur in the associated file
  offsets: Vec<usize>,

  /// The full length of the file
  len: usize,
}

#[derive(Debug, PartialEq)]
pub enum LineError {
  OffsetOutOfBounds,
  LineOutOfBounds,
}

impl LineOffsets {
  /// Create a new instance of LineOffsets
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::LineOffsets;
  ///
  /// let offsets = LineOffsets::new(vec![0, 10], 20);
  /// ```
  pub fn new(offsets: Vec<usize>, len: usize) -> Self {
    assert!(!offsets.is_empty());
    assert!(*offsets.last().unwrap_or(&0) <= len);

    Self { offsets, len }
  }

  /// Retrieve the total number of lines cataloged
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::LineOffsets;
  ///
  /// let offsets = LineOffsets::new(vec![0, 10], 20);
  /// assert_eq!(offsets.lines(), 2);
  /// ```
  pub fn lines(&self) -> usize {
    self.offsets.len()
  }

  /// What line is the provided offset located at
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::{LineOffsets, LineError};
  ///
  /// let offsets = LineOffsets::new(vec![0, 10], 20);
  /// assert_eq!(offsets.offset_line(0), Ok(0));
  /// assert_eq!(offsets.offset_line(5), Ok(0));
  /// assert_eq!(offsets.offset_line(11), Ok(1));
  /// assert_eq!(offsets.offset_line(20), Ok(1));
  /// assert_eq!(offsets.offset_line(25), Err(LineError::OffsetOutOfBounds));
  /// ```
  pub fn offset_line(&self, offset: usize) -> Result<usize, LineError> {
    if offset > self.len {
      return Err(LineError::OffsetOutOfBounds);
    }

    Ok(match self.offsets.binary_search(&offset) {
      Ok(line) => line,
      Err(line) => line - 1,
    })
  }

  /// Get the offset ranges bounding a line
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::{LineOffsets, LineError};
  ///
  /// let offsets = LineOffsets::new(vec![0, 10], 20);
  /// assert_eq!(offsets.line_range(0), Ok(0..10));
  /// assert_eq!(offsets.line_range(1), Ok(10..20));
  /// assert_eq!(offsets.line_range(2), Err(LineError::LineOutOfBounds));
  /// ```
  pub fn line_range(&self, line: usize) -> Result<Range<usize>, LineError> {
    let lines = self.lines();
    if line >= lines {
      return Err(LineError::LineOutOfBounds);
    }

    if line == lines - 1 {
      Ok(self.offsets[line]..self.len)
    } else {
      Ok(self.offsets[line]..self.offsets[line + 1])
    }
  }
}

/// A compilation unit known to the file database
struct JackFile {
  /// The name of this file
  name: String,

  /// The full source of this file
  source: String,

  /// The line offsets for this file, known once it has been scanned
  line_offsets: Option<LineOffsets>,
}

impl JackFile {
  fn line_offsets(&self) -> Result<&LineOffsets, files::Error> {
    self.line_offsets.as_ref().ok_or(files::Error::FileMissing)
  }
}

/// A unique id to a `JackFile`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(usize);

/// A file database used to render diagnostics for
/// every compilation unit of a run
#[derive(Default)]
pub struct JackFiles {
  /// The files stored in this file database
  files: Vec<JackFile>,

  /// A map between file names and their index
  name_map: HashMap<String, usize, FnvBuildHasher>,
}

impl JackFiles {
  /// Insert or update a file into the file database. Returns the
  /// `FileId` for the new file or updated file.
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::JackFiles;
  ///
  /// let mut files = JackFiles::default();
  /// let id1 = files.upsert("Main.jack", "class Main {}");
  /// let id2 = files.upsert("Square.jack", "class Square {}");
  /// let id3 = files.upsert("Main.jack", "class Main { }");
  ///
  /// assert_ne!(id1, id2);
  /// assert_ne!(id2, id3);
  /// assert_eq!(id1, id3);
  /// ```
  pub fn upsert(&mut self, name: impl Into<String>, source: impl Into<String>) -> FileId {
    let name = name.into();
    let file = JackFile {
      name: name.clone(),
      source: source.into(),
      line_offsets: None,
    };

    match self.name_map.get(&name) {
      Some(id) => {
        self.files[*id] = file;
        FileId(*id)
      },
      None => {
        self.files.push(file);

        let id = self.files.len() - 1;
        self.name_map.insert(name, id);
        FileId(id)
      },
    }
  }

  /// The source of a file previously inserted
  pub fn source_of(&self, id: FileId) -> Result<&str, files::Error> {
    Ok(self.get(id)?.source.as_str())
  }

  /// Update a files line offsets after it has been calculated
  ///
  /// # Examples
  /// ```
  /// use jack_compiler::source::{JackFiles, LineOffsets};
  ///
  /// let mut files = JackFiles::default();
  /// let id = files.upsert("Main.jack", "class Main {}");
  ///
  /// assert!(files.update_line_offsets(id, LineOffsets::new(vec![0], 13)).is_ok());
  /// ```
  pub fn update_line_offsets(
    &mut self,
    id: FileId,
    line_offsets: LineOffsets,
  ) -> Result<(), files::Error> {
    let file = self.get_mut(id)?;
    file.line_offsets = Some(line_offsets);
    Ok(())
  }

  /// Retrieve an immutable file reference from the file database. Return
  /// a file missing error if not found
  fn get(&self, id: FileId) -> Result<&JackFile, files::Error> {
    self.files.get(id.0).ok_or(files::Error::FileMissing)
  }

  /// Retrieve a mutable file reference from the file database. Return
  /// a file missing error if not found
  fn get_mut(&mut self, id: FileId) -> Result<&mut JackFile, files::Error> {
    self.files.get_mut(id.0).ok_or(files::Error::FileMissing)
  }
}

impl<'a> files::Files<'a> for JackFiles {
  type FileId = FileId;
  type Name = &'a str;
  type Source = &'a str;

  fn name(&'a self, id: Self::FileId) -> Result<Self::Name, files::Error> {
    Ok(self.get(id)?.name.as_str())
  }

  fn source(&'a self, id: Self::FileId) -> Result<Self::Source, files::Error> {
    Ok(self.get(id)?.source.as_str())
  }

  fn line_index(&'a self, id: Self::FileId, byte_index: usize) -> Result<usize, files::Error> {
    let file = self.get(id)?;

    match file.line_offsets()?.offset_line(byte_index) {
      Ok(line) => Ok(line),
      Err(_) => Err(files::Error::IndexTooLarge {
        given: byte_index,
        max: file.source.len(),
      }),
    }
  }

  fn line_range(
    &'a self,
    id: Self::FileId,
    line_index: usize,
  ) -> Result<Range<usize>, files::Error> {
    let file = self.get(id)?;

    match file.line_offsets()?.line_range(line_index) {
      Ok(range) => Ok(range),
      Err(_) => Err(files::Error::LineTooLarge {
        given: line_index,
        max: file.line_offsets()?.lines(),
      }),
    }
  }
}
