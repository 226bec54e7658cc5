//! Reduction policy.
//!
//! An `EvalOpts` is an immutable value threaded through every evaluation
//! call. Derivations clone; nothing here mutates a policy someone else holds.

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHashSet};
use tracing::trace;

use super::name::Name;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// What a normalisation call may unfold, and how far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOpts {
  /// Only unfold hole (metavariable) solutions.
  pub holes_only: bool,
  /// Only unfold holes in argument positions.
  pub arg_holes_only: bool,
  /// Collapse as-patterns to the matched value.
  pub remove_as: bool,
  /// Metavariables being unfolded on the current call path.
  pub used_metas: FxHashSet<Name>,
  /// Ignore visibility when deciding whether to unfold.
  pub eval_all: bool,
  /// Inline aggressively for the totality checker.
  pub tc_inline: bool,
  /// Remaining recursion depth; `None` is unlimited.
  pub fuel: Option<usize>,
  /// Remaining unfoldings allowed per name.
  pub reduce_limit: FxIndexMap<Name, usize>,
}

impl Default for EvalOpts {
  fn default() -> Self {
    EvalOpts {
      holes_only: false,
      arg_holes_only: false,
      remove_as: true,
      used_metas: FxHashSet::default(),
      eval_all: false,
      tc_inline: false,
      fuel: None,
      reduce_limit: FxIndexMap::default(),
    }
  }
}

impl EvalOpts {
  /// Unfold hole solutions and nothing else.
  pub fn holes() -> Self {
    EvalOpts {
      holes_only: true,
      arg_holes_only: true,
      remove_as: false,
      ..Self::default()
    }
  }

  /// Unfold holes only in argument positions.
  pub fn arg_holes() -> Self {
    EvalOpts { arg_holes_only: true, remove_as: false, ..Self::default() }
  }

  /// Ignore visibility; for diagnostics and the REPL.
  pub fn everything() -> Self {
    EvalOpts { eval_all: true, ..Self::default() }
  }

  /// `arg_holes` with aggressive inlining, for the totality checker.
  pub fn totality() -> Self {
    Self::arg_holes().with_tc_inline(true)
  }

  /// The default policy, but keeping as-patterns intact.
  pub fn lhs() -> Self {
    Self::default().with_remove_as(false)
  }

  pub fn with_tc_inline(&self, tc_inline: bool) -> Self {
    EvalOpts { tc_inline, ..self.clone() }
  }

  pub fn with_remove_as(&self, remove_as: bool) -> Self {
    EvalOpts { remove_as, ..self.clone() }
  }

  pub fn with_fuel(&self, fuel: Option<usize>) -> Self {
    EvalOpts { fuel, ..self.clone() }
  }

  /// Marks `meta` as being unfolded below this point.
  pub fn with_used_meta(&self, meta: Name) -> Self {
    let mut used_metas = self.used_metas.clone();
    used_metas.insert(meta);
    EvalOpts { used_metas, ..self.clone() }
  }

  pub fn with_reduce_limit(&self, name: Name, limit: usize) -> Self {
    let mut reduce_limit = self.reduce_limit.clone();
    reduce_limit.insert(name, limit);
    EvalOpts { reduce_limit, ..self.clone() }
  }

  pub fn is_meta_in_use(&self, meta: &Name) -> bool {
    self.used_metas.contains(meta)
  }

  pub fn reduce_limit_for(&self, name: &Name) -> Option<usize> {
    self.reduce_limit.get(name).copied()
  }

  /// The policy for one level deeper, or `None` if fuel has run out.
  pub fn spend_fuel(&self) -> Option<Self> {
    match self.fuel {
      None => Some(self.clone()),
      Some(0) => {
        trace!("fuel exhausted");
        None
      },
      Some(n) => Some(self.with_fuel(Some(n - 1))),
    }
  }

  /// The policy after unfolding `name` once, or `None` if its cap is spent.
  /// Names without a cap unfold freely.
  pub fn spend_reduction(&self, name: &Name) -> Option<Self> {
    match self.reduce_limit_for(name) {
      None => Some(self.clone()),
      Some(0) => {
        trace!(%name, "reduction limit reached");
        None
      },
      Some(n) => Some(self.with_reduce_limit(name.clone(), n - 1)),
    }
  }
}
