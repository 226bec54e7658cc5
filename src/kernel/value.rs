//! Weak head normal forms.
//!
//! A [`Value`] exposes its outermost constructor or stuck head and leaves
//! everything below it as closures. Binder bodies are continuations: they are
//! only evaluated once a value for the bound name is supplied.

use std::fmt;
use std::sync::{Arc, LazyLock};

use tracing::trace;

use super::closure::Closure;
use super::error::{ScopeError, ScopeResult};
use super::name::{Fc, Name, NameType, Scope};
use super::term::{Binder, Constant, Erasure, LazyReason, PiInfo, PrimType, UseSide};

/// Identity of an unsolved metavariable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetaId {
  pub name: Name,
  /// Disambiguates metavariables sharing a name.
  pub idx: i32,
}

impl fmt::Display for MetaId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "?{}.{}", self.name, self.idx)
  }
}

/// The head of a stuck application.
#[derive(Debug, Clone)]
pub enum NHead {
  /// A bound variable. `is_let` is `Some(true)` for a let-bound alias.
  Local { is_let: Option<bool>, idx: usize },
  /// A global; whether to unfold it is the reducer's call.
  Ref { nt: NameType, name: Name },
  /// An unsolved metavariable and the arguments applied to it so far.
  Meta { id: MetaId, args: Vec<Closure> },
}

impl NHead {
  pub fn local(idx: usize) -> Self {
    NHead::Local { is_let: None, idx }
  }

  /// A local head, checked against the scope it is built in.
  pub fn local_in(
    scope: &Scope,
    idx: usize,
    is_let: Option<bool>,
  ) -> ScopeResult<Self> {
    if idx >= scope.len() {
      return Err(ScopeError::IndexOutOfScope { idx, len: scope.len() });
    }
    Ok(NHead::Local { is_let, idx })
  }

  pub fn reference(nt: NameType, name: Name) -> Self {
    NHead::Ref { nt, name }
  }

  pub fn meta(name: Name, idx: i32, args: Vec<Closure>) -> Self {
    NHead::Meta { id: MetaId { name, idx }, args }
  }

  /// Renders a local head by the name it has in `scope`.
  pub fn display_in(&self, scope: &Scope) -> String {
    match self {
      NHead::Local { idx, .. } => match scope.get(*idx) {
        Some(name) => format!("!{}", name),
        None => self.to_string(),
      },
      _ => self.to_string(),
    }
  }
}

impl fmt::Display for NHead {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NHead::Local { idx, .. } => write!(f, "!{}", idx),
      NHead::Ref { name, .. } => write!(f, "{}", name),
      NHead::Meta { id, args } => {
        write!(f, "{}_[{} closures]", id, args.len())
      },
    }
  }
}

/// The body of a binder: given a closure for the bound name, the body's
/// normal form. Runs only when called.
#[derive(Clone)]
pub struct BinderBody(Arc<dyn Fn(Closure) -> Value + Send + Sync>);

impl BinderBody {
  pub fn new(f: impl Fn(Closure) -> Value + Send + Sync + 'static) -> Self {
    BinderBody(Arc::new(f))
  }

  pub fn instantiate(&self, arg: Closure) -> Value {
    (self.0)(arg)
  }
}

impl fmt::Debug for BinderBody {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "<binder body>")
  }
}

/// Arguments of an application, each with the position it was applied at.
pub type Args = Vec<(Fc, Closure)>;

#[derive(Clone)]
pub struct Value(pub Arc<ValueData>);

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Value({})", self)
  }
}

#[derive(Debug)]
pub enum ValueData {
  Bind { fc: Fc, name: Name, binder: Binder<Value>, body: BinderBody },
  App { fc: Fc, head: NHead, args: Args },
  DCon { fc: Fc, name: Name, tag: i32, arity: usize, args: Args },
  TCon { fc: Fc, name: Name, tag: i32, arity: usize, args: Args },
  As { fc: Fc, side: UseSide, as_var: Value, pat: Value },
  /// The type of a delayed computation.
  Delayed { fc: Fc, reason: LazyReason, ty: Value },
  /// A delayed computation, not yet run.
  Delay { fc: Fc, reason: LazyReason, ty: Closure, arg: Closure },
  /// A force of a delayed value that could not fire, with the arguments
  /// applied to it since.
  Force { fc: Fc, reason: LazyReason, arg: Value, args: Args },
  PrimVal { fc: Fc, c: Constant },
  Erased { fc: Fc, why: Erasure },
  Type { fc: Fc },
}

impl Value {
  pub fn as_data(&self) -> &ValueData {
    &self.0
  }

  pub fn bind(fc: Fc, name: Name, binder: Binder<Value>, body: BinderBody) -> Self {
    Value(Arc::new(ValueData::Bind { fc, name, binder, body }))
  }
  pub fn app(fc: Fc, head: NHead, args: Args) -> Self {
    Value(Arc::new(ValueData::App { fc, head, args }))
  }
  pub fn dcon(fc: Fc, name: Name, tag: i32, arity: usize, args: Args) -> Self {
    Value(Arc::new(ValueData::DCon { fc, name, tag, arity, args }))
  }
  /// A type constructor application as given; see [`nt_con`] for the
  /// canonicalising constructor.
  pub fn tcon(fc: Fc, name: Name, tag: i32, arity: usize, args: Args) -> Self {
    Value(Arc::new(ValueData::TCon { fc, name, tag, arity, args }))
  }
  pub fn as_pattern(fc: Fc, side: UseSide, as_var: Value, pat: Value) -> Self {
    Value(Arc::new(ValueData::As { fc, side, as_var, pat }))
  }
  pub fn delayed(fc: Fc, reason: LazyReason, ty: Value) -> Self {
    Value(Arc::new(ValueData::Delayed { fc, reason, ty }))
  }
  pub fn delay(fc: Fc, reason: LazyReason, ty: Closure, arg: Closure) -> Self {
    Value(Arc::new(ValueData::Delay { fc, reason, ty, arg }))
  }
  pub fn force(fc: Fc, reason: LazyReason, arg: Value, args: Args) -> Self {
    Value(Arc::new(ValueData::Force { fc, reason, arg, args }))
  }
  pub fn prim(fc: Fc, c: Constant) -> Self {
    Value(Arc::new(ValueData::PrimVal { fc, c }))
  }
  pub fn erased(fc: Fc, why: Erasure) -> Self {
    Value(Arc::new(ValueData::Erased { fc, why }))
  }
  pub fn universe(fc: Fc) -> Self {
    Value(Arc::new(ValueData::Type { fc }))
  }

  /// The source position carried by the value.
  pub fn fc(&self) -> &Fc {
    match self.as_data() {
      ValueData::Bind { fc, .. }
      | ValueData::App { fc, .. }
      | ValueData::DCon { fc, .. }
      | ValueData::TCon { fc, .. }
      | ValueData::As { fc, .. }
      | ValueData::Delayed { fc, .. }
      | ValueData::Delay { fc, .. }
      | ValueData::Force { fc, .. }
      | ValueData::PrimVal { fc, .. }
      | ValueData::Erased { fc, .. }
      | ValueData::Type { fc } => fc,
    }
  }

  /// The stuck head, if this is a stuck application.
  pub fn head(&self) -> Option<&NHead> {
    match self.as_data() {
      ValueData::App { head, .. } => Some(head),
      _ => None,
    }
  }

  /// Arguments of an application, constructor or pending force.
  pub fn args(&self) -> &[(Fc, Closure)] {
    match self.as_data() {
      ValueData::App { args, .. }
      | ValueData::DCon { args, .. }
      | ValueData::TCon { args, .. }
      | ValueData::Force { args, .. } => args,
      _ => &[],
    }
  }

  pub fn is_universe(&self) -> bool {
    matches!(self.as_data(), ValueData::Type { .. })
  }

  /// Whether this is a stuck application of the global `name`, or a
  /// constructor called `name`.
  pub fn is_app_of(&self, name: &Name) -> bool {
    match self.as_data() {
      ValueData::App { head: NHead::Ref { name: n, .. }, .. }
      | ValueData::DCon { name: n, .. }
      | ValueData::TCon { name: n, .. } => n == name,
      _ => false,
    }
  }

  /// Whether every local index reachable without forcing is below `len`,
  /// and every closure reachable that way lives over `len` variables.
  pub fn is_well_scoped(&self, len: usize) -> bool {
    let mut work = vec![self];
    let mut closures = Vec::new();
    while let Some(v) = work.pop() {
      if !v.head_fits(len) {
        return false;
      }
      v.push_parts(&mut work, &mut closures);
      for c in closures.drain(..) {
        if c.scope().len() != len {
          return false;
        }
        if let Some(value) = c.forced_value() {
          work.push(value);
        }
      }
    }
    true
  }

  /// The outermost layer of [`Value::is_well_scoped`]: the stuck head and
  /// the scopes of the closures held directly. Nested values are not visited.
  pub(crate) fn scope_fits(&self, len: usize) -> bool {
    let (mut values, mut closures) = (Vec::new(), Vec::new());
    self.push_parts(&mut values, &mut closures);
    self.head_fits(len) && closures.iter().all(|c| c.scope().len() == len)
  }

  fn head_fits(&self, len: usize) -> bool {
    match self.as_data() {
      ValueData::App { head: NHead::Local { idx, .. }, .. } => *idx < len,
      _ => true,
    }
  }

  /// Queues the values and closures this value holds directly.
  fn push_parts<'a>(
    &'a self,
    values: &mut Vec<&'a Value>,
    closures: &mut Vec<&'a Closure>,
  ) {
    match self.as_data() {
      ValueData::Bind { binder, .. } => {
        match binder {
          Binder::Lam { info: PiInfo::DefImplicit(d), .. }
          | Binder::Pi { info: PiInfo::DefImplicit(d), .. }
          | Binder::PVar { info: PiInfo::DefImplicit(d), .. } => values.push(d),
          _ => {},
        }
        values.push(binder.ty());
        values.extend(binder.value());
      },
      ValueData::App { head, args, .. } => {
        if let NHead::Meta { args: meta_args, .. } = head {
          closures.extend(meta_args);
        }
        closures.extend(args.iter().map(|(_, c)| c));
      },
      ValueData::DCon { args, .. } | ValueData::TCon { args, .. } => {
        closures.extend(args.iter().map(|(_, c)| c))
      },
      ValueData::As { as_var, pat, .. } => values.extend([as_var, pat]),
      ValueData::Delayed { ty, .. } => values.push(ty),
      ValueData::Delay { ty, arg, .. } => closures.extend([ty, arg]),
      ValueData::Force { arg, args, .. } => {
        values.push(arg);
        closures.extend(args.iter().map(|(_, c)| c));
      },
      ValueData::PrimVal { .. }
      | ValueData::Erased { .. }
      | ValueData::Type { .. } => {},
    }
  }
}

/// Stands in for children moved out of a value being dropped.
static DETACHED: LazyLock<Value> = LazyLock::new(|| Value::universe(Fc::Empty));

/// Moves `slot` into `out` if this is its last handle.
pub(crate) fn take_child(slot: &mut Value, out: &mut Vec<Value>) {
  if Arc::strong_count(&slot.0) == 1 {
    out.push(std::mem::replace(slot, DETACHED.clone()));
  }
}

impl ValueData {
  /// Moves every uniquely held child value into `out`.
  fn detach(&mut self, out: &mut Vec<Value>) {
    match self {
      ValueData::Bind { binder, .. } => match binder {
        Binder::Lam { info, ty, .. }
        | Binder::Pi { info, ty, .. }
        | Binder::PVar { info, ty, .. } => {
          if let PiInfo::DefImplicit(d) = info {
            take_child(d, out);
          }
          take_child(ty, out);
        },
        Binder::Let { val, ty, .. } | Binder::PLet { val, ty, .. } => {
          take_child(val, out);
          take_child(ty, out);
        },
        Binder::PVTy { ty, .. } => take_child(ty, out),
      },
      ValueData::App { head, args, .. } => {
        if let NHead::Meta { args: meta_args, .. } = head {
          meta_args.iter_mut().for_each(|c| c.release(out));
        }
        args.iter_mut().for_each(|(_, c)| c.release(out));
      },
      ValueData::DCon { args, .. } | ValueData::TCon { args, .. } => {
        args.iter_mut().for_each(|(_, c)| c.release(out))
      },
      ValueData::As { as_var, pat, .. } => {
        take_child(as_var, out);
        take_child(pat, out);
      },
      ValueData::Delayed { ty, .. } => take_child(ty, out),
      ValueData::Delay { ty, arg, .. } => {
        ty.release(out);
        arg.release(out);
      },
      ValueData::Force { arg, args, .. } => {
        take_child(arg, out);
        args.iter_mut().for_each(|(_, c)| c.release(out));
      },
      ValueData::PrimVal { .. }
      | ValueData::Erased { .. }
      | ValueData::Type { .. } => {},
    }
  }
}

// Children are taken apart on an explicit stack; by the time each one is
// dropped it no longer owns anything deep.
impl Drop for ValueData {
  fn drop(&mut self) {
    let mut work = Vec::new();
    self.detach(&mut work);
    while let Some(mut v) = work.pop() {
      if let Some(data) = Arc::get_mut(&mut v.0) {
        data.detach(&mut work);
      }
    }
  }
}

/// Builds a type constructor application, collapsing the nullary `Type` to
/// the universe and nullary primitive type names to their primitive tag.
pub fn nt_con(fc: Fc, name: Name, tag: i32, arity: usize, args: Args) -> Value {
  if arity == 0 && args.is_empty() {
    if name.is_user("Type") {
      trace!("nt_con: Type collapses to the universe");
      return Value::universe(fc);
    }
    if let Some(p) = PrimType::from_name(&name) {
      trace!(prim = p.name(), "nt_con: primitive type name");
      return Value::prim(fc, Constant::PrT(p));
    }
  }
  Value::tcon(fc, name, tag, arity, args)
}

enum Piece<'a> {
  Value(&'a Value),
  Text(&'static str),
  /// ` [n closures]`
  Closures(usize),
}

/// Writes the leading text of `v` and queues the rest, last piece first.
fn render_step<'a>(
  f: &mut fmt::Formatter<'_>,
  work: &mut Vec<Piece<'a>>,
  v: &'a Value,
) -> fmt::Result {
  match v.as_data() {
    ValueData::Bind { name, binder, .. } => {
      let (lead, tail) = match binder {
        Binder::Lam { .. } => ("\\", " => [closure]"),
        Binder::Let { .. } => ("let ", " in [closure]"),
        Binder::Pi { .. } => ("{", "} -> [closure]"),
        Binder::PVar { .. } => ("pat ", " => [closure]"),
        Binder::PLet { .. } => ("plet ", " in [closure]"),
        Binder::PVTy { .. } => ("pty ", " => [closure]"),
      };
      write!(f, "{}{} : ", lead, name)?;
      work.push(Piece::Text(tail));
      if let Some(val) = binder.value() {
        work.push(Piece::Value(val));
        work.push(Piece::Text(" = "));
      }
      work.push(Piece::Value(binder.ty()));
    },
    ValueData::App { head, args, .. } => {
      write!(f, "{} [{} closures]", head, args.len())?
    },
    ValueData::DCon { name, args, .. } | ValueData::TCon { name, args, .. } => {
      write!(f, "{} [{} closures]", name, args.len())?
    },
    ValueData::As { as_var, pat, .. } => {
      work.push(Piece::Value(pat));
      work.push(Piece::Text("@"));
      work.push(Piece::Value(as_var));
    },
    ValueData::Delayed { ty, .. } => {
      f.write_str("%Delayed ")?;
      work.push(Piece::Value(ty));
    },
    ValueData::Delay { .. } => f.write_str("%Delay [closure]")?,
    ValueData::Force { arg, args, .. } => {
      f.write_str("%Force ")?;
      work.push(Piece::Closures(args.len()));
      work.push(Piece::Value(arg));
    },
    ValueData::PrimVal { c, .. } => write!(f, "{}", c)?,
    ValueData::Erased { .. } => f.write_str("[__]")?,
    ValueData::Type { .. } => f.write_str("Type")?,
  }
  Ok(())
}

/// One line, never forcing a closure: bodies and arguments are abbreviated.
impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut work = vec![Piece::Value(self)];
    while let Some(piece) = work.pop() {
      match piece {
        Piece::Value(v) => render_step(f, &mut work, v)?,
        Piece::Text(s) => f.write_str(s)?,
        Piece::Closures(n) => write!(f, " [{} closures]", n)?,
      }
    }
    Ok(())
  }
}
