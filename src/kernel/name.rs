//! Names, name classifications and source positions.

use std::{
  fmt,
  hash::{Hash, Hasher},
  sync::Arc,
};

use rustc_hash::FxHasher;

use crate::cons_list::ConsList;

/// A possibly namespaced name. Cloning is cheap; the hash is computed once
/// at construction.
#[derive(PartialEq, Eq, Debug, PartialOrd, Ord, Clone)]
pub struct Name(pub Arc<NameData>);

#[derive(PartialEq, Eq, Debug, PartialOrd, Ord)]
pub enum NameData {
  /// A name written in the source.
  User(String, u64),
  /// A machine-generated name, disambiguated by a counter.
  Machine(String, i64, u64),
  /// A name inside a namespace; components are stored outermost first.
  Ns(Vec<String>, Name, u64),
}

impl Name {
  pub fn as_data(&self) -> &NameData {
    &self.0
  }

  pub fn get_hash(&self) -> u64 {
    match *self.0 {
      NameData::User(.., h)
      | NameData::Machine(.., h)
      | NameData::Ns(.., h) => h,
    }
  }

  pub fn user(s: impl Into<String>) -> Self {
    let s = s.into();
    let hasher = &mut FxHasher::default();
    (3, &s).hash(hasher);
    Name(Arc::new(NameData::User(s, hasher.finish())))
  }

  pub fn machine(s: impl Into<String>, i: i64) -> Self {
    let s = s.into();
    let hasher = &mut FxHasher::default();
    (5, &s, i).hash(hasher);
    Name(Arc::new(NameData::Machine(s, i, hasher.finish())))
  }

  pub fn ns(ns: Vec<String>, n: Name) -> Self {
    let hasher = &mut FxHasher::default();
    (7, &ns, n.get_hash()).hash(hasher);
    Name(Arc::new(NameData::Ns(ns, n, hasher.finish())))
  }

  /// Whether this is the unqualified user name `s`.
  pub fn is_user(&self, s: &str) -> bool {
    matches!(self.as_data(), NameData::User(n, _) if n == s)
  }
}

impl Hash for Name {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.get_hash().hash(state);
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_data() {
      NameData::User(s, _) => write!(f, "{}", s),
      NameData::Machine(s, i, _) => write!(f, "{{{}:{}}}", s, i),
      NameData::Ns(ns, n, _) => {
        for c in ns {
          write!(f, "{}.", c)?;
        }
        write!(f, "{}", n)
      },
    }
  }
}

/// An ordered list of variable names; index 0 is the innermost binder.
pub type Scope = ConsList<Name>;

/// Builds a scope from names listed innermost first.
pub fn scope_of(names: &[&str]) -> Scope {
  names.iter().map(|n| Name::user(*n)).collect()
}

/// How a global name is classified by the definition store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameType {
  Bound,
  Func,
  DataCon { tag: i32, arity: usize },
  TyCon { tag: i32, arity: usize },
}

impl NameType {
  pub fn is_constructor(&self) -> bool {
    matches!(self, NameType::DataCon { .. } | NameType::TyCon { .. })
  }
}

/// A zero-based (line, column) pair.
pub type FilePos = (u32, u32);

/// A source span. Informational only: never part of equality on values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Fc {
  #[default]
  Empty,
  Real { origin: Arc<str>, start: FilePos, end: FilePos },
  /// A span attached to generated code, pointing at the source it came from.
  Virtual { origin: Arc<str>, start: FilePos, end: FilePos },
}

impl Fc {
  pub fn real(origin: &str, start: FilePos, end: FilePos) -> Self {
    Fc::Real { origin: origin.into(), start, end }
  }

  pub fn is_empty(&self) -> bool {
    matches!(self, Fc::Empty)
  }
}

impl fmt::Display for Fc {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Fc::Empty => write!(f, "<no location>"),
      Fc::Real { origin, start, end } | Fc::Virtual { origin, start, end } => {
        write!(
          f,
          "{}:{}:{}--{}:{}",
          origin,
          start.0 + 1,
          start.1 + 1,
          end.0 + 1,
          end.1 + 1
        )
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rustc_hash::FxHashSet;

  #[test]
  fn equal_names_hash_equal() {
    let a = Name::ns(vec!["Prelude".into()], Name::user("id"));
    let b = Name::ns(vec!["Prelude".into()], Name::user("id"));
    assert_eq!(a, b);
    assert_eq!(a.get_hash(), b.get_hash());
    let set: FxHashSet<Name> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn machine_names_are_distinguished_by_counter() {
    assert_ne!(Name::machine("x", 0), Name::machine("x", 1));
    assert_ne!(Name::user("x"), Name::machine("x", 0));
  }

  #[test]
  fn display_forms() {
    assert_eq!(Name::user("x").to_string(), "x");
    assert_eq!(Name::machine("arg", 4).to_string(), "{arg:4}");
    let n = Name::ns(vec!["Data".into(), "List".into()], Name::user("map"));
    assert_eq!(n.to_string(), "Data.List.map");
    assert!(!n.is_user("map"));
    assert!(Name::user("map").is_user("map"));
  }

  #[test]
  fn scope_of_lists_innermost_first() {
    let s = scope_of(&["x", "y"]);
    assert_eq!(s.len(), 2);
    assert_eq!(s.get(0), Some(&Name::user("x")));
  }

  #[test]
  fn fc_display_is_one_based() {
    assert_eq!(Fc::real("Main.idr", (0, 4), (0, 9)).to_string(), "Main.idr:1:5--1:10");
    assert_eq!(Fc::Empty.to_string(), "<no location>");
  }
}
