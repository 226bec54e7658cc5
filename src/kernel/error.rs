/// Violations of scope discipline caught at a construction boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
  /// A positional index does not fit the scope it is used in.
  IndexOutOfScope { idx: usize, len: usize },
  /// A local environment has a different number of slots than bound names.
  LengthMismatch { expected: usize, found: usize },
  /// A closure, environment or term lives over a scope of the wrong length.
  ScopeMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for ScopeError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ScopeError::IndexOutOfScope { idx, len } => {
        write!(f, "local index {} out of scope of length {}", idx, len)
      },
      ScopeError::LengthMismatch { expected, found } => {
        write!(f, "expected {} bound closures, found {}", expected, found)
      },
      ScopeError::ScopeMismatch { expected, found } => {
        write!(f, "expected scope of length {}, found {}", expected, found)
      },
    }
  }
}

impl std::error::Error for ScopeError {}

pub type ScopeResult<T> = Result<T, ScopeError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_name_the_offending_sizes() {
    let e = ScopeError::IndexOutOfScope { idx: 3, len: 2 };
    assert_eq!(e.to_string(), "local index 3 out of scope of length 2");
    let e = ScopeError::LengthMismatch { expected: 1, found: 0 };
    assert_eq!(e.to_string(), "expected 1 bound closures, found 0");
  }
}
