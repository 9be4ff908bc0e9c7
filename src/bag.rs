use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

/// Opaque handle correlating a [`Bag::remove`] with an earlier
/// [`Bag::insert`].
///
/// Tokens are handed out in strictly increasing order and are never reused by
/// the bag that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemovalToken(u64);

/// An insertion-ordered multiset with stable removal tokens.
///
/// This is the registry behind every signal's observer list and every
/// composite disposable.
///
/// # Design
///
/// - **SmallVec Optimization**: Uses `SmallVec<[_; 2]>` to avoid heap
///   allocation for the common case of 0-2 items.
/// - **Sorted Tokens**: Items stay in insertion order and tokens grow
///   monotonically, so removal is a binary search rather than a scan.
/// - **Snapshots**: Broadcasting iterates over [`snapshot`](Self::snapshot), a
///   cloned copy of the items, so callbacks may insert into or remove from the
///   bag without disturbing the pass in progress.
///
/// # Examples
///
/// ```rust
/// use rxsignal::bag::Bag;
///
/// let mut bag = Bag::new();
/// let a = bag.insert("a");
/// let b = bag.insert("b");
/// let c = bag.insert("c");
/// assert!(a < b && b < c);
///
/// assert_eq!(bag.remove(b), Some("b"));
/// assert_eq!(bag.remove(b), None);
/// assert_eq!(bag.iter().copied().collect::<Vec<_>>(), vec!["a", "c"]);
/// ```
pub struct Bag<T> {
  next_token: u64,
  items: SmallVec<[(RemovalToken, T); 2]>,
}

impl<T> Default for Bag<T> {
  fn default() -> Self { Self { next_token: 0, items: SmallVec::new() } }
}

impl<T> Bag<T> {
  /// Create an empty bag.
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Append an item and return the token that removes it.
  #[inline]
  pub fn insert(&mut self, item: T) -> RemovalToken {
    let token = RemovalToken(self.next_token);
    self.next_token += 1;
    self.items.push((token, item));
    token
  }

  /// Remove the item inserted under `token`.
  ///
  /// Returns `None` if it was already removed.
  pub fn remove(&mut self, token: RemovalToken) -> Option<T> {
    // Recent subscriptions are the ones most often cancelled.
    if let Some((last, _)) = self.items.last() {
      if *last == token {
        return self.items.pop().map(|(_, item)| item);
      }
    }
    self
      .items
      .binary_search_by_key(&token, |(t, _)| *t)
      .ok()
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, token: RemovalToken) -> bool {
    self.items.binary_search_by_key(&token, |(t, _)| *t).is_ok()
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Iterate over all items in insertion order.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &T> { self.items.iter().map(|(_, item)| item) }

  /// Drain all items in insertion order.
  ///
  /// Tokens issued so far stay consumed: later inserts keep counting upward.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ { self.items.drain(..).map(|(_, item)| item) }
}

impl<T: Clone> Bag<T> {
  /// Copy the current items out for one iteration pass.
  pub fn snapshot(&self) -> SmallVec<[T; 2]> { self.iter().cloned().collect() }
}

impl<T: Debug> Debug for Bag<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_map().entries(self.items.iter().map(|(t, item)| (t, item))).finish()
  }
}

impl<T> IntoIterator for Bag<T> {
  type Item = T;
  type IntoIter = std::iter::Map<smallvec::IntoIter<[(RemovalToken, T); 2]>, fn((RemovalToken, T)) -> T>;

  fn into_iter(self) -> Self::IntoIter {
    fn item<U>((_, item): (RemovalToken, U)) -> U { item }
    self.items.into_iter().map(item as fn((RemovalToken, T)) -> T)
  }
}
