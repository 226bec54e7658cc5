//! Environments: the outer bindings of an enclosing term, and the local
//! bindings a closure has accumulated since its own binder.

use crate::cons_list::ConsList;

use super::closure::Closure;
use super::error::{ScopeError, ScopeResult};
use super::name::{Name, Scope};
use super::term::{Binder, Term};

/// Bindings of the enclosing term, one per variable of its scope.
/// Index 0 is the innermost binding.
#[derive(Debug, Clone, Default)]
pub struct Env(ConsList<(Name, Binder<Term>)>);

impl Env {
  pub fn new() -> Self {
    Env(ConsList::Nil)
  }

  /// O(1); the tail is shared.
  pub fn extend(&self, name: Name, binder: Binder<Term>) -> Self {
    Env(self.0.cons((name, binder)))
  }

  pub fn lookup(&self, idx: usize) -> Option<&(Name, Binder<Term>)> {
    self.0.get(idx)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The scope this environment binds.
  pub fn scope(&self) -> Scope {
    self.0.iter().map(|(n, _)| n.clone()).collect()
  }
}

/// Closures for the names bound since a closure's binder, each over the
/// enclosing `free` scope. Slot `i` binds `bound[i]`.
#[derive(Debug, Clone, Default)]
pub struct LocalEnv {
  free: Scope,
  bound: Scope,
  slots: ConsList<Closure>,
}

impl LocalEnv {
  pub fn empty(free: Scope) -> Self {
    LocalEnv { free, bound: ConsList::Nil, slots: ConsList::Nil }
  }

  /// Builds an environment from slots listed innermost first.
  pub fn from_slots(
    free: Scope,
    bound: Scope,
    slots: Vec<Closure>,
  ) -> ScopeResult<Self> {
    if slots.len() != bound.len() {
      return Err(ScopeError::LengthMismatch {
        expected: bound.len(),
        found: slots.len(),
      });
    }
    if let Some(bad) = slots.iter().find(|c| c.scope().len() != free.len()) {
      return Err(ScopeError::ScopeMismatch {
        expected: free.len(),
        found: bad.scope().len(),
      });
    }
    Ok(LocalEnv { free, bound, slots: slots.into_iter().collect() })
  }

  /// Binds one more name. `closure` must live over the free scope.
  pub fn extend(&self, name: Name, closure: Closure) -> Self {
    debug_assert_eq!(closure.scope().len(), self.free.len());
    LocalEnv {
      free: self.free.clone(),
      bound: self.bound.cons(name),
      slots: self.slots.cons(closure),
    }
  }

  pub fn lookup(&self, idx: usize) -> Option<&Closure> {
    self.slots.get(idx)
  }

  pub fn len(&self) -> usize {
    self.slots.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slots.is_empty()
  }

  pub fn free(&self) -> &Scope {
    &self.free
  }

  pub fn bound(&self) -> &Scope {
    &self.bound
  }

  pub fn iter(&self) -> impl Iterator<Item = &Closure> {
    self.slots.iter()
  }

  /// `bound ++ free`: the scope a closure's term is written over.
  pub fn term_scope(&self) -> Scope {
    self.free.prepend_all(&self.bound)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::kernel::name::{Fc, scope_of};
  use crate::kernel::term::{Constant, RigCount};
  use crate::kernel::value::Value;

  fn lit(scope: &Scope, n: i64) -> Closure {
    Closure::forced(scope.clone(), Value::prim(Fc::Empty, Constant::Int(n)))
  }

  #[test]
  fn extend_and_lookup_innermost_first() {
    let free = scope_of(&["a"]);
    let env = LocalEnv::empty(free.clone())
      .extend(Name::user("y"), lit(&free, 1))
      .extend(Name::user("x"), lit(&free, 2));
    assert_eq!(env.len(), 2);
    assert_eq!(env.bound().get(0), Some(&Name::user("x")));
    let first = env.lookup(0).and_then(|c| c.forced_value().cloned());
    assert_eq!(first.map(|v| v.to_string()), Some("2".to_string()));
    assert!(env.lookup(2).is_none());
    let names: Vec<String> = env.term_scope().iter().map(|n| n.to_string()).collect();
    assert_eq!(names, vec!["x", "y", "a"]);
  }

  #[test]
  fn from_slots_checks_lengths() {
    let free = scope_of(&["a"]);
    let err = LocalEnv::from_slots(free.clone(), scope_of(&["x", "y"]), vec![lit(&free, 0)])
      .unwrap_err();
    assert_eq!(err, ScopeError::LengthMismatch { expected: 2, found: 1 });
  }

  #[test]
  fn from_slots_checks_slot_scopes() -> anyhow::Result<()> {
    let free = scope_of(&["a"]);
    let wrong = scope_of(&["a", "b"]);
    let err = LocalEnv::from_slots(free.clone(), scope_of(&["x"]), vec![lit(&wrong, 0)])
      .unwrap_err();
    assert_eq!(err, ScopeError::ScopeMismatch { expected: 1, found: 2 });

    let env = LocalEnv::from_slots(free.clone(), scope_of(&["x"]), vec![lit(&free, 0)])?;
    assert_eq!(env.len(), 1);
    Ok(())
  }

  #[test]
  fn outer_env_tracks_its_scope() {
    let ty = Term::universe(Fc::Empty);
    let binder = Binder::PVTy { fc: Fc::Empty, rig: RigCount::Erased, ty };
    let env = Env::new()
      .extend(Name::user("b"), binder.clone())
      .extend(Name::user("a"), binder);
    assert_eq!(env.len(), 2);
    assert_eq!(env.scope(), scope_of(&["a", "b"]));
    assert_eq!(env.lookup(1).map(|(n, _)| n.clone()), Some(Name::user("b")));
  }
}
