//! Presentation-order shuffling with a reversible index mapping.
//!
//! `order[presented] = original`, always a permutation of `0..len`.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{QuizError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shuffled<T> {
  pub presented: Vec<T>,
  pub order: Vec<usize>,
}

/// Fisher-Yates over the index vector; every permutation is equally likely given a fair `rng`.
pub fn shuffle<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Shuffled<T> {
  let mut order: Vec<usize> = (0..items.len()).collect();
  if order.len() > 1 {
    order.shuffle(rng);
  }
  let presented = order.iter().map(|&i| items[i].clone()).collect();
  Shuffled { presented, order }
}

/// Exact inverse of [`shuffle`]: `original[order[p]] = presented[p]`.
pub fn restore_original_order<T: Clone>(presented: &[T], order: &[usize]) -> Result<Vec<T>> {
  if presented.len() != order.len() {
    return Err(QuizError::Validation(format!(
      "shuffle order has {} entries for {} items",
      order.len(),
      presented.len()
    )));
  }
  if !is_permutation(order, presented.len()) {
    return Err(QuizError::Validation("shuffle order is not a permutation".into()));
  }
  let mut slots: Vec<Option<T>> = vec![None; presented.len()];
  for (item, &idx) in presented.iter().zip(order) {
    slots[idx] = Some(item.clone());
  }
  // Every slot is filled: `order` is a permutation of the same length.
  Ok(slots.into_iter().flatten().collect())
}

/// True when every index in `0..len` appears exactly once.
pub fn is_permutation(order: &[usize], len: usize) -> bool {
  if order.len() != len {
    return false;
  }
  let mut seen = vec![false; len];
  for &i in order {
    if i >= len || seen[i] {
      return false;
    }
    seen[i] = true;
  }
  true
}
