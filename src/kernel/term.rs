//! Terms handed to the reducer, and the pieces shared between terms and values.
//!
//! Terms are produced by the elaborator and only ever read here: a suspended
//! closure carries one, and the scope checks at closure construction inspect
//! its free local indices.

use std::{fmt, sync::Arc};

use num_bigint::BigInt;

use super::name::{Fc, Name, NameData, NameType};

// ============================================================================
// Constants
// ============================================================================

/// Primitive scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimType {
  Int,
  Integer,
  Bits8,
  Bits16,
  Bits32,
  Bits64,
  String,
  Char,
  Double,
  World,
}

impl PrimType {
  pub const ALL: [PrimType; 10] = [
    PrimType::Int,
    PrimType::Integer,
    PrimType::Bits8,
    PrimType::Bits16,
    PrimType::Bits32,
    PrimType::Bits64,
    PrimType::String,
    PrimType::Char,
    PrimType::Double,
    PrimType::World,
  ];

  /// The canonical source name of the type.
  pub fn name(self) -> &'static str {
    match self {
      PrimType::Int => "Int",
      PrimType::Integer => "Integer",
      PrimType::Bits8 => "Bits8",
      PrimType::Bits16 => "Bits16",
      PrimType::Bits32 => "Bits32",
      PrimType::Bits64 => "Bits64",
      PrimType::String => "String",
      PrimType::Char => "Char",
      PrimType::Double => "Double",
      PrimType::World => "%World",
    }
  }

  /// Recognizes an unqualified primitive type name.
  pub fn from_name(name: &Name) -> Option<Self> {
    match name.as_data() {
      NameData::User(s, _) => Self::ALL.into_iter().find(|p| p.name() == s),
      _ => None,
    }
  }
}

/// A fully evaluated scalar, or the tag of a primitive type.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
  Int(i64),
  Integer(BigInt),
  B8(u8),
  B16(u16),
  B32(u32),
  B64(u64),
  Str(String),
  Char(char),
  Double(f64),
  WorldVal,
  PrT(PrimType),
}

impl fmt::Display for Constant {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Constant::Int(i) => write!(f, "{}", i),
      Constant::Integer(i) => write!(f, "{}", i),
      Constant::B8(i) => write!(f, "{}", i),
      Constant::B16(i) => write!(f, "{}", i),
      Constant::B32(i) => write!(f, "{}", i),
      Constant::B64(i) => write!(f, "{}", i),
      Constant::Str(s) => write!(f, "{:?}", s),
      Constant::Char(c) => write!(f, "{:?}", c),
      Constant::Double(d) => write!(f, "{}", d),
      Constant::WorldVal => write!(f, "%MkWorld"),
      Constant::PrT(t) => write!(f, "{}", t.name()),
    }
  }
}

// ============================================================================
// Binders
// ============================================================================

/// Multiplicity of a bound variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RigCount {
  Erased,
  Linear,
  Unrestricted,
}

/// Plicity of a lambda, pi or pattern variable.
#[derive(Debug, Clone, PartialEq)]
pub enum PiInfo<T> {
  Implicit,
  Explicit,
  AutoImplicit,
  /// Implicit with a default value.
  DefImplicit(T),
}

impl<T> PiInfo<T> {
  pub fn map<U>(&self, f: impl FnOnce(&T) -> U) -> PiInfo<U> {
    match self {
      PiInfo::Implicit => PiInfo::Implicit,
      PiInfo::Explicit => PiInfo::Explicit,
      PiInfo::AutoImplicit => PiInfo::AutoImplicit,
      PiInfo::DefImplicit(t) => PiInfo::DefImplicit(f(t)),
    }
  }
}

/// A binding form, parameterised over what its type (and value) are:
/// terms inside `Term::Bind`, normal forms inside `Value::bind`.
#[derive(Debug, Clone, PartialEq)]
pub enum Binder<T> {
  Lam { fc: Fc, rig: RigCount, info: PiInfo<T>, ty: T },
  Let { fc: Fc, rig: RigCount, val: T, ty: T },
  Pi { fc: Fc, rig: RigCount, info: PiInfo<T>, ty: T },
  /// Pattern variable.
  PVar { fc: Fc, rig: RigCount, info: PiInfo<T>, ty: T },
  /// Let-bound pattern variable.
  PLet { fc: Fc, rig: RigCount, val: T, ty: T },
  /// Type of a pattern variable.
  PVTy { fc: Fc, rig: RigCount, ty: T },
}

impl<T> Binder<T> {
  pub fn ty(&self) -> &T {
    match self {
      Binder::Lam { ty, .. }
      | Binder::Let { ty, .. }
      | Binder::Pi { ty, .. }
      | Binder::PVar { ty, .. }
      | Binder::PLet { ty, .. }
      | Binder::PVTy { ty, .. } => ty,
    }
  }

  /// The bound value of a let-like binder.
  pub fn value(&self) -> Option<&T> {
    match self {
      Binder::Let { val, .. } | Binder::PLet { val, .. } => Some(val),
      _ => None,
    }
  }

  pub fn fc(&self) -> &Fc {
    match self {
      Binder::Lam { fc, .. }
      | Binder::Let { fc, .. }
      | Binder::Pi { fc, .. }
      | Binder::PVar { fc, .. }
      | Binder::PLet { fc, .. }
      | Binder::PVTy { fc, .. } => fc,
    }
  }

  pub fn rig(&self) -> RigCount {
    match self {
      Binder::Lam { rig, .. }
      | Binder::Let { rig, .. }
      | Binder::Pi { rig, .. }
      | Binder::PVar { rig, .. }
      | Binder::PLet { rig, .. }
      | Binder::PVTy { rig, .. } => *rig,
    }
  }

  /// Rebuilds the binder with every carried `T` mapped through `f`.
  pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Binder<U> {
    match self {
      Binder::Lam { fc, rig, info, ty } => {
        Binder::Lam { fc: fc.clone(), rig: *rig, info: info.map(&mut f), ty: f(ty) }
      },
      Binder::Let { fc, rig, val, ty } => {
        Binder::Let { fc: fc.clone(), rig: *rig, val: f(val), ty: f(ty) }
      },
      Binder::Pi { fc, rig, info, ty } => {
        Binder::Pi { fc: fc.clone(), rig: *rig, info: info.map(&mut f), ty: f(ty) }
      },
      Binder::PVar { fc, rig, info, ty } => {
        Binder::PVar { fc: fc.clone(), rig: *rig, info: info.map(&mut f), ty: f(ty) }
      },
      Binder::PLet { fc, rig, val, ty } => {
        Binder::PLet { fc: fc.clone(), rig: *rig, val: f(val), ty: f(ty) }
      },
      Binder::PVTy { fc, rig, ty } => {
        Binder::PVTy { fc: fc.clone(), rig: *rig, ty: f(ty) }
      },
    }
  }
}

// ============================================================================
// Laziness and pattern markers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LazyReason {
  /// Codata.
  Inf,
  Lazy,
  Unknown,
}

/// Which side of an as-pattern is kept once the pattern is simplified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UseSide {
  Left,
  Right,
}

/// Where an erased position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Erasure {
  /// Inserted by the compiler.
  Inserted,
  /// Written by the user as `_`.
  Written,
}

// ============================================================================
// Term
// ============================================================================

/// A term over some scope. Local variables are positional indices into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Term(pub Arc<TermData>);

#[derive(Debug, PartialEq)]
pub enum TermData {
  Local { fc: Fc, is_let: Option<bool>, idx: usize },
  Ref { fc: Fc, nt: NameType, name: Name },
  Meta { fc: Fc, name: Name, idx: i32, args: Vec<Term> },
  /// `scope` lives under one more variable than the binder itself.
  Bind { fc: Fc, name: Name, binder: Binder<Term>, scope: Term },
  App { fc: Fc, fun: Term, arg: Term },
  As { fc: Fc, side: UseSide, as_var: Term, pat: Term },
  Delayed { fc: Fc, reason: LazyReason, ty: Term },
  Delay { fc: Fc, reason: LazyReason, ty: Term, arg: Term },
  Force { fc: Fc, reason: LazyReason, arg: Term },
  PrimVal { fc: Fc, c: Constant },
  Erased { fc: Fc, why: Erasure },
  Type { fc: Fc },
}

impl Term {
  pub fn as_data(&self) -> &TermData {
    &self.0
  }
  pub fn local(fc: Fc, idx: usize) -> Self {
    Term(Arc::new(TermData::Local { fc, is_let: None, idx }))
  }
  pub fn reference(fc: Fc, nt: NameType, name: Name) -> Self {
    Term(Arc::new(TermData::Ref { fc, nt, name }))
  }
  pub fn meta(fc: Fc, name: Name, idx: i32, args: Vec<Term>) -> Self {
    Term(Arc::new(TermData::Meta { fc, name, idx, args }))
  }
  pub fn bind(fc: Fc, name: Name, binder: Binder<Term>, scope: Term) -> Self {
    Term(Arc::new(TermData::Bind { fc, name, binder, scope }))
  }
  pub fn app(fc: Fc, fun: Term, arg: Term) -> Self {
    Term(Arc::new(TermData::App { fc, fun, arg }))
  }
  pub fn as_pattern(fc: Fc, side: UseSide, as_var: Term, pat: Term) -> Self {
    Term(Arc::new(TermData::As { fc, side, as_var, pat }))
  }
  pub fn delayed(fc: Fc, reason: LazyReason, ty: Term) -> Self {
    Term(Arc::new(TermData::Delayed { fc, reason, ty }))
  }
  pub fn delay(fc: Fc, reason: LazyReason, ty: Term, arg: Term) -> Self {
    Term(Arc::new(TermData::Delay { fc, reason, ty, arg }))
  }
  pub fn force(fc: Fc, reason: LazyReason, arg: Term) -> Self {
    Term(Arc::new(TermData::Force { fc, reason, arg }))
  }
  pub fn prim(fc: Fc, c: Constant) -> Self {
    Term(Arc::new(TermData::PrimVal { fc, c }))
  }
  pub fn erased(fc: Fc, why: Erasure) -> Self {
    Term(Arc::new(TermData::Erased { fc, why }))
  }
  pub fn universe(fc: Fc) -> Self {
    Term(Arc::new(TermData::Type { fc }))
  }

  pub fn fc(&self) -> &Fc {
    match self.as_data() {
      TermData::Local { fc, .. }
      | TermData::Ref { fc, .. }
      | TermData::Meta { fc, .. }
      | TermData::Bind { fc, .. }
      | TermData::App { fc, .. }
      | TermData::As { fc, .. }
      | TermData::Delayed { fc, .. }
      | TermData::Delay { fc, .. }
      | TermData::Force { fc, .. }
      | TermData::PrimVal { fc, .. }
      | TermData::Erased { fc, .. }
      | TermData::Type { fc } => fc,
    }
  }

  /// The shortest scope under which every free local index is in range.
  pub fn min_scope_len(&self) -> usize {
    let mut needed = 0;
    let mut work: Vec<(&Term, usize)> = vec![(self, 0)];
    while let Some((t, depth)) = work.pop() {
      match t.as_data() {
        TermData::Local { idx, .. } => {
          if *idx >= depth {
            needed = needed.max(idx - depth + 1);
          }
        },
        TermData::Meta { args, .. } => {
          work.extend(args.iter().map(|a| (a, depth)));
        },
        TermData::Bind { binder, scope, .. } => {
          work.push((binder.ty(), depth));
          if let Some(val) = binder.value() {
            work.push((val, depth));
          }
          match binder {
            Binder::Lam { info: PiInfo::DefImplicit(d), .. }
            | Binder::Pi { info: PiInfo::DefImplicit(d), .. }
            | Binder::PVar { info: PiInfo::DefImplicit(d), .. } => {
              work.push((d, depth))
            },
            _ => {},
          }
          work.push((scope, depth + 1));
        },
        TermData::App { fun, arg, .. } => {
          work.push((fun, depth));
          work.push((arg, depth));
        },
        TermData::As { as_var, pat, .. } => {
          work.push((as_var, depth));
          work.push((pat, depth));
        },
        TermData::Delayed { ty, .. } => work.push((ty, depth)),
        TermData::Delay { ty, arg, .. } => {
          work.push((ty, depth));
          work.push((arg, depth));
        },
        TermData::Force { arg, .. } => work.push((arg, depth)),
        TermData::Ref { .. }
        | TermData::PrimVal { .. }
        | TermData::Erased { .. }
        | TermData::Type { .. } => {},
      }
    }
    needed
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn var(i: usize) -> Term {
    Term::local(Fc::Empty, i)
  }

  fn lam(body: Term) -> Term {
    let binder = Binder::Lam {
      fc: Fc::Empty,
      rig: RigCount::Unrestricted,
      info: PiInfo::Explicit,
      ty: Term::universe(Fc::Empty),
    };
    Term::bind(Fc::Empty, Name::user("x"), binder, body)
  }

  #[test]
  fn recognizes_primitive_type_names() {
    for p in PrimType::ALL {
      assert_eq!(PrimType::from_name(&Name::user(p.name())), Some(p));
    }
    assert_eq!(PrimType::from_name(&Name::user("Nat")), None);
    let qualified = Name::ns(vec!["Prelude".into()], Name::user("Int"));
    assert_eq!(PrimType::from_name(&qualified), None);
  }

  #[test]
  fn closed_terms_need_no_scope() {
    assert_eq!(Term::universe(Fc::Empty).min_scope_len(), 0);
    assert_eq!(lam(var(0)).min_scope_len(), 0);
  }

  #[test]
  fn free_locals_under_binders_are_shifted() {
    // \x => x 2  mentions the outer variable at index 1
    let body = Term::app(Fc::Empty, var(0), var(2));
    assert_eq!(lam(body).min_scope_len(), 2);
    assert_eq!(Term::app(Fc::Empty, var(0), var(4)).min_scope_len(), 5);
  }

  #[test]
  fn let_values_and_meta_arguments_count() {
    let binder = Binder::Let {
      fc: Fc::Empty,
      rig: RigCount::Unrestricted,
      val: var(3),
      ty: Term::universe(Fc::Empty),
    };
    let t = Term::bind(Fc::Empty, Name::user("v"), binder, var(0));
    assert_eq!(t.min_scope_len(), 4);
    let m = Term::meta(Fc::Empty, Name::user("m"), 0, vec![var(1)]);
    assert_eq!(m.min_scope_len(), 2);
  }

  #[test]
  fn binder_accessors_and_map() {
    let b: Binder<u32> = Binder::Let { fc: Fc::Empty, rig: RigCount::Linear, val: 1, ty: 2 };
    assert_eq!(*b.ty(), 2);
    assert_eq!(b.value(), Some(&1));
    assert_eq!(b.rig(), RigCount::Linear);
    let doubled = b.map(|x| x * 2);
    assert_eq!(doubled.value(), Some(&2));
    assert_eq!(*doubled.ty(), 4);
    let pi: Binder<u32> = Binder::Pi {
      fc: Fc::Empty,
      rig: RigCount::Erased,
      info: PiInfo::DefImplicit(7),
      ty: 0,
    };
    assert_eq!(pi.map(|x| x + 1), Binder::Pi {
      fc: Fc::Empty,
      rig: RigCount::Erased,
      info: PiInfo::DefImplicit(8),
      ty: 1,
    });
    assert_eq!(pi.value(), None);
  }

  #[test]
  fn constants_render() {
    assert_eq!(Constant::Int(42).to_string(), "42");
    assert_eq!(Constant::Str("hi".into()).to_string(), "\"hi\"");
    assert_eq!(Constant::PrT(PrimType::World).to_string(), "%World");
    assert_eq!(Constant::Integer(BigInt::from(-7)).to_string(), "-7");
  }
}
