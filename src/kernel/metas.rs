//! Blocking-metavariable analysis.
//!
//! Given a stuck value, finds the metavariables whose solution could let
//! reduction make progress. The traversal is purely structural: it never
//! forces a closure and never runs a binder body.

use rustc_hash::FxHashMap;
use tracing::trace;

use super::closure::{Closure, ClosureData};
use super::env::LocalEnv;
use super::name::Fc;
use super::value::{MetaId, NHead, Value, ValueData};

/// Blocking metavariables. The flag is reserved for consumers and is always
/// `false` when produced here.
pub type MetaSet = FxHashMap<MetaId, bool>;

enum Visit<'a> {
  Value(&'a Value),
  Closure(&'a Closure),
  /// The slots of a suspended closure's local environment. Suspended slots
  /// have their own slots inspected only while `nested` is set.
  Locals(&'a LocalEnv, bool),
}

/// The metavariables blocking further reduction of `v`.
pub fn get_metas(v: &Value) -> MetaSet {
  let mut metas = MetaSet::default();
  add_metas(&mut metas, v);
  trace!(count = metas.len(), "collected blocking metavariables");
  metas
}

/// Adds the metavariables blocking `v` to `metas`.
pub fn add_metas(metas: &mut MetaSet, v: &Value) {
  run(metas, vec![Visit::Value(v)]);
}

/// Adds the metavariables reachable from a closure to `metas`.
pub fn add_meta_closure(metas: &mut MetaSet, c: &Closure) {
  run(metas, vec![Visit::Closure(c)]);
}

fn run<'a>(metas: &mut MetaSet, mut work: Vec<Visit<'a>>) {
  while let Some(visit) = work.pop() {
    match visit {
      Visit::Value(v) => push_value(metas, &mut work, v),
      Visit::Closure(c) => match c.as_data() {
        ClosureData::Forced { value, .. } => work.push(Visit::Value(value)),
        // a memoised result is ignored: the answer must not depend on what
        // happened to be forced before
        ClosureData::Suspended { locals, .. } => {
          work.push(Visit::Locals(locals, true))
        },
      },
      Visit::Locals(locals, nested) => {
        for slot in locals.iter() {
          match slot.as_data() {
            ClosureData::Forced { value, .. } => work.push(Visit::Value(value)),
            ClosureData::Suspended { locals, .. } if nested => {
              work.push(Visit::Locals(locals, false))
            },
            ClosureData::Suspended { .. } => {},
          }
        }
      },
    }
  }
}

fn push_args<'a>(work: &mut Vec<Visit<'a>>, args: &'a [(Fc, Closure)]) {
  work.extend(args.iter().map(|(_, c)| Visit::Closure(c)))
}

fn push_value<'a>(metas: &mut MetaSet, work: &mut Vec<Visit<'a>>, v: &'a Value) {
  match v.as_data() {
    // the body is a continuation and stays unevaluated
    ValueData::Bind { binder, .. } => work.push(Visit::Value(binder.ty())),
    ValueData::App { head: NHead::Meta { id, args: meta_args }, args, .. } => {
      metas.entry(id.clone()).or_insert(false);
      work.extend(meta_args.iter().map(Visit::Closure));
      push_args(work, args);
    },
    ValueData::App { args, .. }
    | ValueData::DCon { args, .. }
    | ValueData::TCon { args, .. } => push_args(work, args),
    ValueData::As { as_var, pat, .. } => {
      work.push(Visit::Value(as_var));
      work.push(Visit::Value(pat));
    },
    ValueData::Delayed { ty, .. } => work.push(Visit::Value(ty)),
    ValueData::Delay { ty, arg, .. } => {
      work.push(Visit::Closure(ty));
      work.push(Visit::Closure(arg));
    },
    ValueData::Force { arg, args, .. } => {
      work.push(Visit::Value(arg));
      push_args(work, args);
    },
    ValueData::PrimVal { .. }
    | ValueData::Erased { .. }
    | ValueData::Type { .. } => {},
  }
}
