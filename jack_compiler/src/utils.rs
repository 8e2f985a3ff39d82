/// Hands out monotonically increasing ids
#[derive(Default, Debug)]
pub struct IdEmitter(usize);

impl IdEmitter {
  pub fn emit(&mut self) -> usize {
    let result = self.0;
    self.0 += 1;
    result
  }

  pub fn id_count(&self) -> usize {
    self.0
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn emit() {
    let mut emitter = IdEmitter::default();

    assert_eq!(emitter.emit(), 0);
    assert_eq!(emitter.emit(), 1);
    assert_eq!(emitter.emit(), 2);
    assert_eq!(emitter.id_count(), 3);
  }
}
