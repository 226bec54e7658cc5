//! Persistent singly-linked list with shared tails.
//!
//! Scopes, outer environments and local environments only ever grow at the
//! front, so a cons list with an `Arc`-shared tail gives O(1) extension while
//! every older version stays valid for the closures that captured it.

use std::sync::Arc;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ConsList<T> {
  Nil,
  Cons(T, Arc<ConsList<T>>, usize),
}

impl<T> Default for ConsList<T> {
  fn default() -> Self {
    ConsList::Nil
  }
}

struct ConsListIter<'a, T>(&'a ConsList<T>);

impl<'a, T> Iterator for ConsListIter<'a, T> {
  type Item = &'a T;
  fn next(&mut self) -> Option<Self::Item> {
    match &self.0 {
      ConsList::Nil => None,
      ConsList::Cons(t, tail, _) => {
        self.0 = tail;
        Some(t)
      },
    }
  }
}

impl<T> ConsList<T> {
  /// Prepends `t`, sharing `self` as the tail.
  #[inline]
  pub fn cons(&self, t: T) -> Self
  where
    T: Clone,
  {
    ConsList::Cons(t, Arc::new(self.clone()), self.len() + 1)
  }

  #[inline]
  pub fn len(&self) -> usize {
    match self {
      Self::Nil => 0,
      Self::Cons(.., len) => *len,
    }
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    matches!(self, Self::Nil)
  }

  #[inline]
  pub fn head(&self) -> Option<&T> {
    match self {
      Self::Nil => None,
      Self::Cons(t, ..) => Some(t),
    }
  }

  #[inline]
  pub fn tail(&self) -> Option<&ConsList<T>> {
    match self {
      Self::Nil => None,
      Self::Cons(_, tail, _) => Some(tail),
    }
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &T> {
    ConsListIter(self)
  }

  /// Positional lookup; index 0 is the most recently prepended element.
  pub fn get(&self, idx: usize) -> Option<&T> {
    if idx >= self.len() {
      return None;
    }
    self.iter().nth(idx)
  }

  /// Prepends every element of `front`, keeping their order, so that
  /// `front[0]` ends up at index 0 of the result.
  pub fn prepend_all(&self, front: &ConsList<T>) -> Self
  where
    T: Clone,
  {
    let items: Vec<&T> = front.iter().collect();
    items.into_iter().rev().fold(self.clone(), |acc, t| acc.cons(t.clone()))
  }

  #[inline]
  pub fn contains(&self, t: &T) -> bool
  where
    T: PartialEq,
  {
    self.iter().any(|x| x == t)
  }

  #[inline]
  pub fn index_of(&self, t: &T) -> Option<usize>
  where
    T: PartialEq,
  {
    self.iter().position(|x| x == t)
  }
}

impl<T: Clone> FromIterator<T> for ConsList<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let items: Vec<T> = iter.into_iter().collect();
    items.into_iter().rev().fold(Self::Nil, |acc, t| acc.cons(t))
  }
}
