//! A thread-safe list with one list-wide cursor.
//!
//! Every operation of [`SharedList`] is a short critical section under the
//! list's mutex. Insertions signal a "non-empty" condition that blocking
//! consumers wait on, and [`SharedList::close`] wakes them for shutdown.

use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{debug, trace};
use parking_lot::{Condvar, Mutex, MutexGuard};
use snafu::prelude::*;

use crate::error::{ClosedSnafu, Result, TimeoutSnafu};
use crate::list::cursor::{Cursor, CursorMut};
use crate::list::{List, Node};

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Which end of the list a dequeue takes from.
///
/// Producers [`append`](SharedList::append) at the back, so `Front` gives
/// first-in-first-out delivery and `Back` gives last-in-first-out delivery.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum End {
    Front,
    Back,
}

/// A doubly-linked list shared between threads.
///
/// The list keeps a single cursor for all callers: [`first`](Self::first),
/// [`next`](Self::next) and friends move it, and the cursor-relative
/// operations act on it. Each call is atomic on its own, but a multi-step
/// walk with `first`/`next` observes the cursor moves of other threads. To
/// walk the list without interference, hold a [`ListGuard`] from
/// [`lock`](Self::lock) and use a cursor or iterator of your own.
///
/// Navigation returns clones of the elements, since a reference cannot
/// outlive the critical section.
///
/// # Examples
///
/// ```
/// use sync_list::SharedList;
///
/// let list = SharedList::new();
/// list.append("a");
/// list.append("c");
///
/// // The first insertion into an empty list places the cursor.
/// assert_eq!(list.curr(), Some("a"));
/// list.insert_after("b");
///
/// assert_eq!(list.next(), Some("b"));
/// assert_eq!(list.next(), Some("c"));
/// assert_eq!(list.next(), None);
/// assert_eq!(list.count(), 3);
/// ```
pub struct SharedList<T> {
    id: u64,
    inner: Mutex<Inner<T>>,
    non_empty: Condvar,
}

struct Inner<T> {
    list: List<T>,
    // A node of `list`, or its ghost node when no element is current.
    cursor: NonNull<Node<T>>,
    closed: bool,
}

// SAFETY: `cursor` only ever points into `list`, which is owned by `Inner`.
unsafe impl<T: Send> Send for Inner<T> {}

impl<T> Inner<T> {
    fn new(list: List<T>) -> Self {
        let cursor = list.front_node();
        Self {
            list,
            cursor,
            closed: false,
        }
    }

    /// Run `f` with a cursor at the list-wide position, and store back the
    /// position it ends at.
    fn with_cursor<R>(&mut self, f: impl FnOnce(&mut CursorMut<'_, T>) -> R) -> R {
        let mut cursor = CursorMut::new(&mut self.list, self.cursor);
        let result = f(&mut cursor);
        self.cursor = cursor.current;
        result
    }

    fn pop(&mut self, end: End) -> Option<T> {
        self.with_cursor(|cursor| match end {
            End::Front => cursor.pop_front(),
            End::Back => cursor.pop_back(),
        })
    }
}

impl<T> SharedList<T> {
    /// Create an empty list with a detached cursor.
    pub fn new() -> Self {
        Self::from(List::new())
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock()
    }

    /// Returns the number of elements.
    pub fn count(&self) -> usize {
        self.lock_inner().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_inner().list.is_empty()
    }

    /// Move the cursor to the first element and return it, or return `None`
    /// if the list is empty.
    pub fn first(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_inner().with_cursor(|cursor| {
            cursor.move_to_front();
            cursor.current().cloned()
        })
    }

    /// Move the cursor to the last element and return it, or return `None`
    /// if the list is empty.
    pub fn last(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_inner().with_cursor(|cursor| {
            cursor.move_to_back();
            cursor.current().cloned()
        })
    }

    /// Advance the cursor and return the new current element. Returns `None`
    /// and leaves the cursor unchanged if it is on the last element or on no
    /// element.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_inner().with_cursor(|cursor| {
            cursor.move_next().ok()?;
            cursor.current().cloned()
        })
    }

    /// Move the cursor back and return the new current element. Returns
    /// `None` and leaves the cursor unchanged if it is on the first element
    /// or on no element.
    pub fn prev(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_inner().with_cursor(|cursor| {
            cursor.move_prev().ok()?;
            cursor.current().cloned()
        })
    }

    /// Return the element under the cursor without moving it.
    pub fn curr(&self) -> Option<T>
    where
        T: Clone,
    {
        self.lock_inner().with_cursor(|cursor| cursor.current().cloned())
    }

    /// Insert `item` right after the cursor, leaving the cursor in place.
    ///
    /// On an empty list `item` also becomes the current element. With no
    /// current element on a non-empty list, `item` goes to the front.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    /// use std::iter::FromIterator;
    ///
    /// let list = SharedList::from_iter(["a", "b", "c"]);
    /// list.next();
    /// list.insert_after("x");
    ///
    /// assert_eq!(list.curr(), Some("b"));
    /// assert_eq!(Vec::from_iter(list.lock().iter().copied()), vec!["a", "b", "x", "c"]);
    /// ```
    pub fn insert_after(&self, item: T) {
        self.lock_inner()
            .with_cursor(|cursor| cursor.insert_after(item));
        self.non_empty.notify_one();
    }

    /// Insert `item` right before the cursor, leaving the cursor in place.
    ///
    /// On an empty list `item` also becomes the current element. With no
    /// current element on a non-empty list, `item` goes to the back.
    pub fn insert_before(&self, item: T) {
        self.lock_inner()
            .with_cursor(|cursor| cursor.insert_before(item));
        self.non_empty.notify_one();
    }

    /// Add `item` at the back. The cursor only moves if the list was empty.
    pub fn append(&self, item: T) {
        self.lock_inner().with_cursor(|cursor| cursor.push_back(item));
        self.non_empty.notify_one();
    }

    /// Add `item` at the front. The cursor only moves if the list was empty.
    pub fn prepend(&self, item: T) {
        self.lock_inner().with_cursor(|cursor| cursor.push_front(item));
        self.non_empty.notify_one();
    }

    /// Remove and return the element under the cursor, or return `None` if
    /// no element is current.
    ///
    /// The cursor moves to the next element, or to the previous one when the
    /// last element was removed.
    pub fn remove(&self) -> Option<T> {
        self.lock_inner().with_cursor(|cursor| cursor.remove())
    }

    /// Remove and return the last element, or return `None` if the list is
    /// empty. A cursor on the last element moves to the new last element.
    ///
    /// Together with [`append`](Self::append) this gives last-in-first-out
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    ///
    /// let list = SharedList::new();
    /// list.append("first");
    /// list.append("second");
    /// assert_eq!(list.trim(), Some("second"));
    /// assert_eq!(list.trim(), Some("first"));
    /// assert_eq!(list.trim(), None);
    /// ```
    pub fn trim(&self) -> Option<T> {
        self.lock_inner().pop(End::Back)
    }

    /// Remove and return the first element, or return `None` if the list is
    /// empty. A cursor on the first element moves to the next one.
    pub fn pop_front(&self) -> Option<T> {
        self.lock_inner().pop(End::Front)
    }

    /// Remove every element. The cursor detaches.
    pub fn clear(&self) {
        let mut inner = self.lock_inner();
        inner.list.clear();
        inner.cursor = inner.list.ghost_node();
    }

    /// Scan forward from the cursor (inclusive) for an element matching
    /// `predicate`. On a match the cursor moves there and a clone of the
    /// element is returned. Otherwise `None` is returned and the cursor stays.
    ///
    /// The scan does not wrap around, and finds nothing when no element is
    /// current. The comparison argument is whatever the closure captures.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    /// use std::iter::FromIterator;
    ///
    /// let list = SharedList::from_iter(["a", "b", "c"]);
    /// let wanted = "c";
    /// assert_eq!(list.search(|item| *item == wanted), Some("c"));
    /// assert_eq!(list.search(|item| *item == "a"), None);
    /// assert_eq!(list.curr(), Some("c"));
    /// ```
    pub fn search<F>(&self, predicate: F) -> Option<T>
    where
        F: FnMut(&T) -> bool,
        T: Clone,
    {
        self.lock_inner()
            .with_cursor(|cursor| cursor.search(predicate).cloned())
    }

    /// Move every element of `other` to the back of `self`, leaving `other`
    /// empty with no current element.
    ///
    /// If `self` was empty it takes over the cursor of `other`; otherwise its
    /// cursor is unchanged. Concatenating a list onto itself does nothing.
    ///
    /// Both locks are taken in an order fixed per pair of lists, so
    /// `a.concat(&b)` racing `b.concat(&a)` cannot deadlock.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    /// use std::iter::FromIterator;
    ///
    /// let a = SharedList::from_iter(["a1", "a2"]);
    /// let b = SharedList::from_iter(["b1", "b2"]);
    /// a.concat(&b);
    ///
    /// assert_eq!(a.count(), 4);
    /// assert_eq!(b.count(), 0);
    /// assert_eq!(Vec::from_iter(a.lock().iter().copied()), vec!["a1", "a2", "b1", "b2"]);
    /// ```
    pub fn concat(&self, other: &SharedList<T>) {
        if self.id == other.id {
            debug!("list {}: concat with itself ignored", self.id);
            return;
        }
        let (mut dst, mut src) = if self.id < other.id {
            let dst = self.lock_inner();
            (dst, other.lock_inner())
        } else {
            let src = other.lock_inner();
            (self.lock_inner(), src)
        };
        if src.list.is_empty() {
            return;
        }

        let moved = src.list.len();
        let dst_was_empty = dst.list.is_empty();
        let src_cursor = src.cursor;
        let src_ghost = src.list.ghost_node();

        dst.list.append(&mut src.list);
        src.cursor = src_ghost;
        if dst_was_empty {
            dst.cursor = if src_cursor == src_ghost {
                dst.list.ghost_node()
            } else {
                src_cursor
            };
        }
        drop(src);
        drop(dst);

        debug!("list {}: took {} items from list {}", self.id, moved, other.id);
        self.non_empty.notify_all();
    }

    /// Remove an element from `end`, waiting until one is available.
    ///
    /// Returns [`Error::Closed`](crate::Error::Closed) once the list is
    /// closed and has no elements left. Elements added before
    /// [`close`](Self::close) are still delivered.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::thread;
    /// use sync_list::{End, Error, SharedList};
    ///
    /// let queue = Arc::new(SharedList::new());
    /// let consumer = {
    ///     let queue = queue.clone();
    ///     thread::spawn(move || {
    ///         let mut received = Vec::new();
    ///         while let Ok(line) = queue.dequeue(End::Front) {
    ///             received.push(line);
    ///         }
    ///         received
    ///     })
    /// };
    ///
    /// queue.append("first");
    /// queue.append("second");
    /// queue.close();
    ///
    /// assert_eq!(consumer.join().unwrap(), vec!["first", "second"]);
    /// assert!(matches!(queue.dequeue(End::Front), Err(Error::Closed)));
    /// ```
    pub fn dequeue(&self, end: End) -> Result<T> {
        let mut inner = self.lock_inner();
        loop {
            if let Some(item) = inner.pop(end) {
                return Ok(item);
            }
            ensure!(!inner.closed, ClosedSnafu);
            trace!("list {}: waiting for an item", self.id);
            self.non_empty.wait(&mut inner);
        }
    }

    /// Like [`dequeue`](Self::dequeue), but gives up with
    /// [`Error::Timeout`](crate::Error::Timeout) after `timeout`.
    pub fn dequeue_timeout(&self, end: End, timeout: Duration) -> Result<T> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock_inner();
        loop {
            if let Some(item) = inner.pop(end) {
                return Ok(item);
            }
            ensure!(!inner.closed, ClosedSnafu);
            if self.non_empty.wait_until(&mut inner, deadline).timed_out() {
                if let Some(item) = inner.pop(end) {
                    return Ok(item);
                }
                ensure!(!inner.closed, ClosedSnafu);
                return TimeoutSnafu { timeout }.fail();
            }
        }
    }

    /// Remove an element from `end` without waiting.
    pub fn try_dequeue(&self, end: End) -> Option<T> {
        self.lock_inner().pop(end)
    }

    /// Mark the list closed and wake every waiting consumer.
    ///
    /// Closing only affects waiting: inserting into a closed list still
    /// works, and consumers drain what is left before seeing
    /// [`Error::Closed`](crate::Error::Closed).
    pub fn close(&self) {
        self.lock_inner().closed = true;
        debug!("list {}: closed", self.id);
        self.non_empty.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock_inner().closed
    }

    /// Lock the list for a caller-owned traversal.
    ///
    /// The guard dereferences to the underlying [`List`], so the caller can
    /// use its own [`Cursor`] or iterator without disturbing, or being
    /// disturbed by, the list-wide cursor. Every other operation on this list
    /// blocks until the guard is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    /// use std::iter::FromIterator;
    ///
    /// let list = SharedList::from_iter([1, 2, 3]);
    /// list.last();
    ///
    /// let guard = list.lock();
    /// let mut cursor = guard.cursor_front();
    /// assert!(cursor.move_next().is_ok());
    /// assert_eq!(cursor.current(), Some(&2));
    /// assert_eq!(guard.shared_cursor().current(), Some(&3));
    /// ```
    pub fn lock(&self) -> ListGuard<'_, T> {
        ListGuard {
            inner: self.lock_inner(),
        }
    }

    /// Release every element, front to back.
    pub fn free(self) {
        self.free_with(drop)
    }

    /// Release every element, front to back, passing each to `destructor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::SharedList;
    /// use std::iter::FromIterator;
    ///
    /// let list = SharedList::from_iter([String::from("a"), String::from("b")]);
    /// let mut released = Vec::new();
    /// list.free_with(|item| released.push(item));
    /// assert_eq!(released, vec!["a", "b"]);
    /// ```
    pub fn free_with<F>(self, destructor: F)
    where
        F: FnMut(T),
    {
        let id = self.id;
        let mut inner = self.inner.into_inner();
        let released = inner.list.len();
        inner.cursor = inner.list.ghost_node();
        inner.list.drain().for_each(destructor);
        debug!("list {}: freed {} items", id, released);
    }

    /// Take the underlying list out, dropping the list-wide cursor.
    pub fn into_list(self) -> List<T> {
        self.inner.into_inner().list
    }
}

impl<T> Default for SharedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The cursor starts on the first element.
impl<T> From<List<T>> for SharedList<T> {
    fn from(list: List<T>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            inner: Mutex::new(Inner::new(list)),
            non_empty: Condvar::new(),
        }
    }
}

impl<T> FromIterator<T> for SharedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(List::from_iter(iter))
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("SharedList");
        f.field("id", &self.id);
        match self.inner.try_lock() {
            Some(inner) => f
                .field("list", &inner.list)
                .field("closed", &inner.closed)
                .finish(),
            None => f.field("list", &format_args!("<locked>")).finish(),
        }
    }
}

/// A locked [`SharedList`], dereferencing to its [`List`].
///
/// This `struct` is created by [`SharedList::lock`].
pub struct ListGuard<'a, T> {
    inner: MutexGuard<'a, Inner<T>>,
}

impl<'a, T> ListGuard<'a, T> {
    /// A cursor at the list-wide position.
    pub fn shared_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(&self.inner.list, self.inner.cursor)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed
    }
}

impl<'a, T> Deref for ListGuard<'a, T> {
    type Target = List<T>;

    fn deref(&self) -> &List<T> {
        &self.inner.list
    }
}

impl<'a, T: fmt::Debug> fmt::Debug for ListGuard<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListGuard").field(&self.inner.list).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::iter::FromIterator;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use crate::error::Error;
    use crate::list::tests::assert_well_formed;
    use crate::shared::{End, SharedList};

    fn collect<T: Clone>(list: &SharedList<T>) -> Vec<T> {
        list.lock().iter().cloned().collect()
    }

    #[test]
    fn navigation_on_empty_list() {
        let list = SharedList::<i32>::new();
        assert_eq!(list.count(), 0);
        assert_eq!(list.first(), None);
        assert_eq!(list.last(), None);
        assert_eq!(list.next(), None);
        assert_eq!(list.prev(), None);
        assert_eq!(list.curr(), None);
        assert_eq!(list.remove(), None);
        assert_eq!(list.trim(), None);
        assert_eq!(list.search(|_| true), None);
    }

    #[test]
    fn navigation_moves_the_shared_cursor() {
        let list = SharedList::new();
        list.append("a");
        list.append("b");
        list.append("c");
        assert_eq!(list.curr(), Some("a"));
        assert_eq!(list.next(), Some("b"));
        assert_eq!(list.next(), Some("c"));
        assert_eq!(list.next(), None);
        assert_eq!(list.curr(), Some("c"));
        assert_eq!(list.prev(), Some("b"));
        assert_eq!(list.first(), Some("a"));
        assert_eq!(list.prev(), None);
        assert_eq!(list.curr(), Some("a"));
        assert_eq!(list.last(), Some("c"));
    }

    #[test]
    fn insert_relative_to_cursor() {
        let list = SharedList::from_iter(["a", "b", "c"]);
        list.next();
        list.insert_after("x");
        assert_eq!(list.curr(), Some("b"));
        assert_eq!(collect(&list), vec!["a", "b", "x", "c"]);

        let list = SharedList::from_iter(["a", "b", "c"]);
        list.next();
        list.insert_before("x");
        assert_eq!(list.curr(), Some("b"));
        assert_eq!(collect(&list), vec!["a", "x", "b", "c"]);
    }

    #[test]
    fn insert_into_empty_list_places_cursor() {
        let list = SharedList::new();
        list.insert_before(1);
        assert_eq!(list.curr(), Some(1));

        let list = SharedList::new();
        list.prepend(2);
        list.prepend(1);
        assert_eq!(list.curr(), Some(2));
        assert_eq!(collect(&list), vec![1, 2]);
    }

    #[test]
    fn cursor_detaches_only_when_list_empties() {
        let list = SharedList::from_iter([1, 2]);
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.curr(), Some(2));
        assert_eq!(list.trim(), Some(2));
        assert_eq!(list.curr(), None);

        list.prepend(10);
        list.append(20);
        assert_eq!(list.curr(), Some(10));
        list.clear();
        assert_eq!(list.curr(), None);
        assert_eq!(list.next(), None);

        list.insert_after(1);
        assert_eq!(list.curr(), Some(1));
    }

    #[test]
    fn remove_reassigns_cursor_to_a_neighbour() {
        let list = SharedList::from_iter(["a", "b", "c"]);
        list.next();
        assert_eq!(list.remove(), Some("b"));
        assert_eq!(list.curr(), Some("c"));
        assert_eq!(list.remove(), Some("c"));
        assert_eq!(list.curr(), Some("a"));
        assert_eq!(list.remove(), Some("a"));
        assert_eq!(list.curr(), None);
        assert_eq!(list.remove(), None);
        assert_eq!(list.count(), 0);
    }

    #[test]
    fn trim_reassigns_cursor_on_the_tail() {
        let list = SharedList::from_iter(["a", "b", "c"]);
        list.last();
        assert_eq!(list.trim(), Some("c"));
        assert_eq!(list.curr(), Some("b"));
        assert_eq!(list.trim(), Some("b"));
        assert_eq!(list.curr(), Some("a"));
        assert_eq!(list.trim(), Some("a"));
        assert_eq!(list.curr(), None);

        let list = SharedList::from_iter(["a", "b"]);
        assert_eq!(list.trim(), Some("b"));
        assert_eq!(list.curr(), Some("a"));
    }

    #[test]
    fn append_then_trim_round_trips() {
        let list = SharedList::from_iter([1, 2, 3]);
        list.append(42);
        assert_eq!(list.trim(), Some(42));
        assert_eq!(list.count(), 3);
    }

    #[test]
    fn append_then_trim_is_lifo() {
        let list = SharedList::new();
        list.append("first");
        list.append("second");
        assert_eq!(list.trim(), Some("second"));
        assert_eq!(list.trim(), Some("first"));
    }

    #[test]
    fn dequeue_front_is_fifo() {
        let list = SharedList::new();
        list.append("first");
        list.append("second");
        assert_eq!(list.dequeue(End::Front).unwrap(), "first");
        assert_eq!(list.dequeue(End::Front).unwrap(), "second");
        assert_eq!(list.try_dequeue(End::Front), None);
    }

    #[test]
    fn search_scans_forward_from_cursor() {
        let list = SharedList::from_iter(["a", "b", "c"]);
        assert_eq!(list.search(|item| *item == "c"), Some("c"));
        assert_eq!(list.curr(), Some("c"));
        assert_eq!(list.search(|item| *item == "a"), None);
        assert_eq!(list.curr(), Some("c"));
    }

    #[test]
    fn concat_moves_everything() {
        let a = SharedList::from_iter(["a1", "a2"]);
        let b = SharedList::from_iter(["b1", "b2"]);
        b.next();
        a.concat(&b);
        assert_eq!(a.count(), 4);
        assert_eq!(b.count(), 0);
        assert_eq!(collect(&a), vec!["a1", "a2", "b1", "b2"]);
        assert_eq!(a.curr(), Some("a1"));
        assert_eq!(b.curr(), None);
        assert_well_formed(&a.lock());
        assert_well_formed(&b.lock());

        b.append("b3");
        assert_eq!(b.curr(), Some("b3"));
        assert_eq!(collect(&b), vec!["b3"]);
    }

    #[test]
    fn concat_into_empty_list_adopts_cursor() {
        let a = SharedList::new();
        let b = SharedList::from_iter(["b1", "b2"]);
        b.next();
        a.concat(&b);
        assert_eq!(a.curr(), Some("b2"));
        assert_eq!(a.next(), None);
        assert_eq!(a.prev(), Some("b1"));

        let a = SharedList::new();
        let b = SharedList::from_iter(["b1", "b2"]);
        a.concat(&b);
        assert_eq!(a.curr(), Some("b1"));
        assert_eq!(b.curr(), None);
    }

    #[test]
    fn concat_with_itself_or_empty_is_noop() {
        let a = SharedList::from_iter([1, 2]);
        a.concat(&a);
        assert_eq!(collect(&a), vec![1, 2]);

        let empty = SharedList::new();
        a.concat(&empty);
        assert_eq!(collect(&a), vec![1, 2]);
        empty.concat(&a);
        assert_eq!(collect(&empty), vec![1, 2]);
        assert_eq!(empty.curr(), Some(1));
    }

    #[test]
    fn concat_in_both_directions_does_not_deadlock() {
        let a = Arc::new(SharedList::from_iter(0..10));
        let b = Arc::new(SharedList::from_iter(10..20));
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let (a, b) = (a.clone(), b.clone());
                thread::spawn(move || {
                    for _ in 0..1000 {
                        if i == 0 {
                            a.concat(&b);
                        } else {
                            b.concat(&a);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(a.count() + b.count(), 20);
        assert_well_formed(&a.lock());
        assert_well_formed(&b.lock());
    }

    #[test]
    fn count_matches_links_after_mixed_operations() {
        let list = SharedList::new();
        let mut seed = 7_u32;
        for i in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            match (seed >> 16) % 9 {
                0 => list.append(i),
                1 => list.prepend(i),
                2 => list.insert_after(i),
                3 => list.insert_before(i),
                4 => {
                    list.remove();
                }
                5 => {
                    list.trim();
                }
                6 => {
                    list.next();
                }
                7 => {
                    list.prev();
                }
                _ => {
                    list.first();
                }
            }
            let guard = list.lock();
            assert_well_formed(&guard);
            // The cursor never dangles: it is either detached or reachable.
            let cursor = guard.shared_cursor();
            assert_eq!(cursor.is_detached(), guard.is_empty());
            if let Some(current) = cursor.current() {
                assert!(guard.iter().any(|item| std::ptr::eq(item, current)));
            }
        }
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 1000;

        let list = Arc::new(SharedList::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let list = list.clone();
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        list.append((t, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(list.count(), THREADS * PER_THREAD);
        let mut tags = HashSet::new();
        while let Some(tag) = list.try_dequeue(End::Front) {
            assert!(tags.insert(tag));
        }
        assert_eq!(tags.len(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                assert!(tags.contains(&(t, i)));
            }
        }
    }

    #[test]
    fn dequeue_waits_for_a_producer() {
        let list = Arc::new(SharedList::new());
        let consumer = {
            let list = list.clone();
            thread::spawn(move || list.dequeue(End::Front))
        };
        thread::sleep(Duration::from_millis(20));
        list.append("hello");
        assert_eq!(consumer.join().unwrap().unwrap(), "hello");
    }

    #[test]
    fn every_insertion_wakes_a_waiting_consumer() {
        const PATIENCE: Duration = Duration::from_secs(2);

        fn assert_wakes(produce: impl FnOnce(&SharedList<&'static str>)) {
            let list = Arc::new(SharedList::new());
            let consumer = {
                let list = list.clone();
                thread::spawn(move || {
                    let started = Instant::now();
                    let item = list.dequeue_timeout(End::Front, PATIENCE);
                    (item, started.elapsed())
                })
            };
            thread::sleep(Duration::from_millis(20));
            produce(&list);
            let (item, waited) = consumer.join().unwrap();
            assert_eq!(item.unwrap(), "woken");
            assert!(waited < PATIENCE, "consumer slept through the insertion");
        }

        assert_wakes(|list| list.append("woken"));
        assert_wakes(|list| list.prepend("woken"));
        assert_wakes(|list| list.insert_after("woken"));
        assert_wakes(|list| list.insert_before("woken"));
        assert_wakes(|list| list.concat(&SharedList::from_iter(["woken"])));
    }

    #[test]
    fn close_wakes_waiting_consumers() {
        let list = Arc::new(SharedList::<i32>::new());
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let list = list.clone();
                thread::spawn(move || list.dequeue(End::Back))
            })
            .collect();
        thread::sleep(Duration::from_millis(20));
        list.close();
        assert!(list.is_closed());
        for consumer in consumers {
            assert!(matches!(consumer.join().unwrap(), Err(Error::Closed)));
        }
    }

    #[test]
    fn closed_list_delivers_remaining_items() {
        let list = SharedList::new();
        list.append(1);
        list.close();
        assert_eq!(list.dequeue(End::Front).unwrap(), 1);
        assert!(matches!(list.dequeue(End::Front), Err(Error::Closed)));
        assert!(matches!(
            list.dequeue_timeout(End::Front, Duration::from_millis(1)),
            Err(Error::Closed)
        ));
    }

    #[test]
    fn dequeue_timeout_expires() {
        let list = SharedList::<i32>::new();
        let result = list.dequeue_timeout(End::Front, Duration::from_millis(10));
        assert!(matches!(result, Err(Error::Timeout { .. })));

        list.append(3);
        assert_eq!(
            list.dequeue_timeout(End::Front, Duration::from_millis(10))
                .unwrap(),
            3
        );
    }

    #[test]
    fn guard_traversal_leaves_shared_cursor_alone() {
        let list = SharedList::from_iter(["a", "b", "c"]);
        list.next();
        {
            let guard = list.lock();
            let mut cursor = guard.cursor_back();
            assert!(cursor.move_prev().is_ok());
            assert!(cursor.move_prev().is_ok());
            assert_eq!(cursor.current(), Some(&"a"));
            assert_eq!(guard.shared_cursor().current(), Some(&"b"));
            assert!(!guard.is_closed());
        }
        assert_eq!(list.curr(), Some("b"));
    }

    #[test]
    fn free_with_releases_in_order() {
        let list = SharedList::from_iter(vec![String::from("x"), String::from("y")]);
        let mut released = Vec::new();
        list.free_with(|item| released.push(item));
        assert_eq!(released, vec!["x", "y"]);

        SharedList::from_iter(0..3).free();
    }

    #[test]
    fn into_list_keeps_elements() {
        let list = SharedList::from_iter([3, 4]);
        list.prepend(2);
        let list = list.into_list();
        assert_eq!(Vec::from_iter(list), vec![2, 3, 4]);
    }

    #[test]
    fn debug_shows_elements() {
        let list = SharedList::from_iter([1, 2]);
        let shown = format!("{:?}", list);
        assert!(shown.contains("[1, 2]"), "{}", shown);
        let guard = list.lock();
        assert!(format!("{:?}", list).contains("<locked>"));
        drop(guard);
    }
}
