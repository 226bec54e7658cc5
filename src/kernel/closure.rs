//! Closures: suspended computations, forced on demand.
//!
//! A closure of scope `S` is either a term suspended together with the policy
//! and environments needed to evaluate it, or a value that has already been
//! computed. Evaluation itself belongs to the reducer, reached through the
//! [`Reducer`] trait; this module only suspends, memoises and hands back.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use super::env::{Env, LocalEnv};
use super::error::{ScopeError, ScopeResult};
use super::name::Scope;
use super::opts::EvalOpts;
use super::term::Term;
use super::value::{Value, take_child};

/// The evaluator a closure defers to when forced.
pub trait Reducer {
  /// Evaluates `term`, written over `locals.bound() ++ locals.free()`, to weak
  /// head normal form over `locals.free()`.
  fn eval(
    &self,
    opts: &EvalOpts,
    env: &Env,
    locals: &LocalEnv,
    term: &Term,
  ) -> Value;
}

#[derive(Clone)]
pub struct Closure(Arc<ClosureData>);

pub enum ClosureData {
  Suspended {
    opts: EvalOpts,
    locals: LocalEnv,
    env: Env,
    term: Term,
    memo: OnceLock<Value>,
  },
  Forced {
    scope: Scope,
    value: Value,
  },
}

impl Closure {
  pub fn as_data(&self) -> &ClosureData {
    &self.0
  }

  /// Suspends `term` under `locals` and the outer `env`. The outer
  /// environment must bind the closure's free scope, and the term may only
  /// mention `locals.bound() ++ locals.free()`.
  pub fn suspend(
    opts: EvalOpts,
    locals: LocalEnv,
    env: Env,
    term: Term,
  ) -> ScopeResult<Self> {
    if env.len() != locals.free().len() {
      return Err(ScopeError::ScopeMismatch {
        expected: locals.free().len(),
        found: env.len(),
      });
    }
    let len = locals.len() + locals.free().len();
    let needed = term.min_scope_len();
    if needed > len {
      return Err(ScopeError::IndexOutOfScope { idx: needed - 1, len });
    }
    Ok(Closure(Arc::new(ClosureData::Suspended {
      opts,
      locals,
      env,
      term,
      memo: OnceLock::new(),
    })))
  }

  /// Wraps an already computed value. Only its outermost layer is checked
  /// against `scope`.
  pub fn forced(scope: Scope, value: Value) -> Self {
    debug_assert!(value.scope_fits(scope.len()));
    Closure(Arc::new(ClosureData::Forced { scope, value }))
  }

  pub fn scope(&self) -> &Scope {
    match self.as_data() {
      ClosureData::Suspended { locals, .. } => locals.free(),
      ClosureData::Forced { scope, .. } => scope,
    }
  }

  pub fn is_suspended(&self) -> bool {
    matches!(self.as_data(), ClosureData::Suspended { .. })
  }

  /// Whether a suspended closure has been forced and cached its result.
  pub fn is_memoized(&self) -> bool {
    match self.as_data() {
      ClosureData::Suspended { memo, .. } => memo.get().is_some(),
      ClosureData::Forced { .. } => false,
    }
  }

  /// The value of a pre-forced closure.
  pub fn forced_value(&self) -> Option<&Value> {
    match self.as_data() {
      ClosureData::Forced { value, .. } => Some(value),
      ClosureData::Suspended { .. } => None,
    }
  }

  /// The local environment captured by a suspended closure.
  pub fn local_env(&self) -> Option<&LocalEnv> {
    match self.as_data() {
      ClosureData::Suspended { locals, .. } => Some(locals),
      ClosureData::Forced { .. } => None,
    }
  }

  /// Evaluates the closure, caching the result. Forcing again returns the
  /// cached value, so repeated forcing is referentially transparent.
  pub fn force<R: Reducer + ?Sized>(&self, reducer: &R) -> Value {
    match self.as_data() {
      ClosureData::Forced { value, .. } => value.clone(),
      ClosureData::Suspended { opts, locals, env, term, memo } => {
        if let Some(value) = memo.get() {
          trace!("closure memo hit");
          return value.clone();
        }
        trace!(locals = locals.len(), "forcing suspended closure");
        // evaluated outside the cell: a reducer may force this closure again
        let value = reducer.eval(opts, env, locals, term);
        memo.get_or_init(|| value).clone()
      },
    }
  }

  /// Hands the values held only by this closure to `out`, so that dropping a
  /// deep value never recurses through its closures.
  pub(crate) fn release(&mut self, out: &mut Vec<Value>) {
    match Arc::get_mut(&mut self.0) {
      Some(ClosureData::Forced { value, .. }) => take_child(value, out),
      Some(ClosureData::Suspended { memo, .. }) => out.extend(memo.take()),
      None => {},
    }
  }

  /// Scope check that forces nothing: the closure lives over `len`
  /// variables, and a pre-forced value is itself well scoped.
  pub fn is_well_scoped(&self, len: usize) -> bool {
    match self.as_data() {
      ClosureData::Suspended { locals, .. } => locals.free().len() == len,
      ClosureData::Forced { scope, value } => {
        scope.len() == len && value.is_well_scoped(len)
      },
    }
  }
}

impl fmt::Debug for Closure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_data() {
      ClosureData::Suspended { locals, memo, .. } => f
        .debug_struct("Suspended")
        .field("locals", &locals.len())
        .field("memoized", &memo.get().is_some())
        .finish(),
      ClosureData::Forced { value, .. } => {
        f.debug_tuple("Forced").field(value).finish()
      },
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::kernel::name::{Fc, Name, scope_of};
  use crate::kernel::term::{Constant, TermData};
  use crate::kernel::value::NHead;
  use std::sync::atomic::{AtomicUsize, Ordering};

  /// A reducer for the fragment the tests need: locals resolve through the
  /// local environment (or become stuck variables), literals evaluate to
  /// themselves, anything else is a stuck reference. Counts its calls.
  #[derive(Default)]
  pub struct CountingReducer {
    pub calls: AtomicUsize,
  }

  impl Reducer for CountingReducer {
    fn eval(
      &self,
      _opts: &EvalOpts,
      _env: &Env,
      locals: &LocalEnv,
      term: &Term,
    ) -> Value {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match term.as_data() {
        TermData::Local { fc, is_let, idx } => match locals.lookup(*idx) {
          Some(c) => c.force(self),
          None => Value::app(
            fc.clone(),
            NHead::Local { is_let: *is_let, idx: idx - locals.len() },
            vec![],
          ),
        },
        TermData::PrimVal { fc, c } => Value::prim(fc.clone(), c.clone()),
        TermData::Type { fc } => Value::universe(fc.clone()),
        _ => Value::app(
          term.fc().clone(),
          NHead::reference(
            crate::kernel::name::NameType::Func,
            Name::user("stuck"),
          ),
          vec![],
        ),
      }
    }
  }

  fn env_for(scope: &Scope) -> Env {
    use crate::kernel::term::{Binder, RigCount};
    scope.iter().collect::<Vec<_>>().into_iter().rev().fold(Env::new(), |env, n| {
      let ty = Term::universe(Fc::Empty);
      env.extend(n.clone(), Binder::PVTy { fc: Fc::Empty, rig: RigCount::Erased, ty })
    })
  }

  #[test]
  fn forcing_memoizes() -> anyhow::Result<()> {
    let free = scope_of(&["a"]);
    let c = Closure::suspend(
      EvalOpts::default(),
      LocalEnv::empty(free.clone()),
      env_for(&free),
      Term::prim(Fc::Empty, Constant::Int(7)),
    )?;
    let r = CountingReducer::default();
    assert!(!c.is_memoized());
    assert_eq!(c.force(&r).to_string(), "7");
    assert!(c.is_memoized());
    assert_eq!(c.force(&r).to_string(), "7");
    assert_eq!(r.calls.load(Ordering::SeqCst), 1);
    Ok(())
  }

  #[test]
  fn locals_resolve_through_the_local_env() -> anyhow::Result<()> {
    let free = scope_of(&["a"]);
    let bound_val = Closure::forced(free.clone(), Value::prim(Fc::Empty, Constant::Int(3)));
    let locals = LocalEnv::empty(free.clone()).extend(Name::user("x"), bound_val);
    let env = env_for(&free);

    let x = Closure::suspend(EvalOpts::default(), locals.clone(), env.clone(), Term::local(Fc::Empty, 0))?;
    let a = Closure::suspend(EvalOpts::default(), locals, env, Term::local(Fc::Empty, 1))?;
    let r = CountingReducer::default();
    assert_eq!(x.force(&r).to_string(), "3");
    // index 1 skips the bound `x` and lands on the free `a`
    let forced = a.force(&r);
    assert_eq!(forced.to_string(), "!0 [0 closures]");
    assert!(forced.is_well_scoped(1));
    Ok(())
  }

  #[test]
  fn pre_forced_closures_never_call_the_reducer() {
    let c = Closure::forced(Scope::default(), Value::universe(Fc::Empty));
    let r = CountingReducer::default();
    assert_eq!(c.force(&r).to_string(), "Type");
    assert_eq!(r.calls.load(Ordering::SeqCst), 0);
    assert!(!c.is_suspended());
    assert!(!c.is_memoized());
  }

  #[test]
  fn suspend_rejects_ill_scoped_terms() {
    let free = scope_of(&["a"]);
    let err = Closure::suspend(
      EvalOpts::default(),
      LocalEnv::empty(free.clone()),
      env_for(&free),
      Term::local(Fc::Empty, 1),
    )
    .unwrap_err();
    assert_eq!(err, ScopeError::IndexOutOfScope { idx: 1, len: 1 });

    let err = Closure::suspend(
      EvalOpts::default(),
      LocalEnv::empty(free),
      Env::new(),
      Term::universe(Fc::Empty),
    )
    .unwrap_err();
    assert_eq!(err, ScopeError::ScopeMismatch { expected: 1, found: 0 });
  }

  #[test]
  fn closures_and_values_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Closure>();
    assert_send_sync::<Value>();

    let c = Closure::forced(Scope::default(), Value::prim(Fc::Empty, Constant::Int(1)));
    let shared = c.clone();
    let rendered = std::thread::spawn(move || {
      shared.force(&CountingReducer::default()).to_string()
    })
    .join()
    .unwrap();
    assert_eq!(rendered, "1");
  }
}
