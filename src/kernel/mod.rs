//! Weak head normal values for the elaborator.
//!
//! Values, closures and environments for normalisation by evaluation, the
//! reduction policy threaded through it, and the analysis that reports which
//! metavariables keep a stuck value from reducing further. Evaluation itself
//! is done by an external reducer, reached through [`closure::Reducer`].

pub mod closure;
pub mod env;
pub mod error;
pub mod metas;
pub mod name;
pub mod opts;
pub mod term;
pub mod value;

pub use closure::{Closure, Reducer};
pub use env::{Env, LocalEnv};
pub use error::{ScopeError, ScopeResult};
pub use metas::{MetaSet, add_meta_closure, add_metas, get_metas};
pub use name::{Fc, Name, NameType, Scope};
pub use opts::EvalOpts;
pub use term::{Binder, Constant, PrimType, Term};
pub use value::{Args, BinderBody, MetaId, NHead, Value, ValueData, nt_con};
