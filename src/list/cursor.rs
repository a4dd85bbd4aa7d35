use crate::list::{List, Node};
use std::fmt;
use std::fmt::Formatter;
use std::ptr::NonNull;

/// A cursor over a `List`.
///
/// A `Cursor` is like an iterator, except that it can freely seek back-and-forth.
///
/// A cursor is either on an element of the list, or *detached* (on no element,
/// which is where the cursor of an empty list always is). Moving never wraps
/// around: [`move_next`](Cursor::move_next) on the last element fails and
/// leaves the cursor where it was.
///
/// # Examples
///
/// ```
/// use sync_list::List;
/// use std::iter::FromIterator;
///
/// let list = List::from_iter(['A', 'B', 'C', 'D']);
///
/// let mut cursor = list.cursor_front();
/// assert_eq!(cursor.current(), Some(&'A'));
///
/// assert!(cursor.move_next().is_ok());
/// assert_eq!(cursor.current(), Some(&'B'));
///
/// let mut cursor = list.cursor_back();
/// assert!(cursor.move_next().is_err());
/// assert_eq!(cursor.current(), Some(&'D'));
///
/// assert!(cursor.move_prev().is_ok());
/// assert_eq!(cursor.current(), Some(&'C'));
/// ```
#[derive(Clone)]
pub struct Cursor<'a, T: 'a> {
    pub(crate) current: NonNull<Node<T>>,
    pub(crate) list: &'a List<T>,
}

/// Only cursors belong to the same list and have the same positions
/// are considered equal.
impl<'a, T: 'a> PartialEq for Cursor<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.list, other.list) && self.current == other.current
    }
}

impl<'a, T: 'a> Eq for Cursor<'a, T> {}

/// A cursor over a `List` with editing operations.
///
/// Insertions next to the cursor leave it in place; removals move it to a
/// neighbouring element so it never refers to a freed node.
///
/// ```compile_fail
/// use sync_list::List;
/// use std::iter::FromIterator;
///
/// let mut list = List::from_iter([1, 2, 3]);
/// let mut cursor = list.cursor_front_mut();
/// println!("{:?}", list.back());
/// println!("{:?}", cursor.current());
/// ```
pub struct CursorMut<'a, T: 'a> {
    pub(crate) current: NonNull<Node<T>>,
    pub(crate) list: &'a mut List<T>,
}

macro_rules! impl_cursor {
    ($CURSOR:ident) => {
        // Private methods
        impl<'a, T: 'a> $CURSOR<'a, T> {
            pub(crate) fn next_node(&self) -> NonNull<Node<T>> {
                // SAFETY: `current.next` is always valid since it is a cyclic list.
                unsafe { self.current.as_ref().next }
            }
            pub(crate) fn prev_node(&self) -> NonNull<Node<T>> {
                // SAFETY: `current.prev` is always valid since it is a cyclic list.
                unsafe { self.current.as_ref().prev }
            }

            /// Find the first node from the cursor (inclusive) up to the back
            /// of the list whose element satisfies `predicate`.
            fn find_forward<F>(&self, mut predicate: F) -> Option<NonNull<Node<T>>>
            where
                F: FnMut(&T) -> bool,
            {
                let ghost = self.list.ghost_node();
                let mut node = self.current;
                while node != ghost {
                    // SAFETY: `node` is a non-ghost node of the list.
                    if predicate(unsafe { Node::element(node) }) {
                        return Some(node);
                    }
                    node = unsafe { node.as_ref().next };
                }
                None
            }
        }

        impl<'a, T: 'a> $CURSOR<'a, T> {
            /// Returns `true` if the `List` is empty. See [`List::is_empty`].
            pub fn is_empty(&self) -> bool {
                self.list.is_empty()
            }

            /// Returns `true` if the cursor is on no element.
            pub fn is_detached(&self) -> bool {
                self.current == self.list.ghost_node()
            }

            /// Move the cursor to the next element, or return an error if the
            /// cursor is detached or already on the last element. On error the
            /// cursor stays put.
            ///
            /// This operation should compute in *O*(*1*) time.
            pub fn move_next(&mut self) -> Result<(), &'static str> {
                if self.is_detached() {
                    return Err("`move_next` on a detached cursor");
                }
                let next = self.next_node();
                if next == self.list.ghost_node() {
                    return Err("`move_next` past the back of the list");
                }
                self.current = next;
                Ok(())
            }

            /// Move the cursor to the previous element, or return an error if
            /// the cursor is detached or already on the first element. On error
            /// the cursor stays put.
            ///
            /// This operation should compute in *O*(*1*) time.
            ///
            /// # Examples
            ///
            /// ```
            /// use sync_list::List;
            /// use std::iter::FromIterator;
            ///
            /// let list = List::from_iter([1, 2, 3]);
            /// let mut cursor = list.cursor_front();
            ///
            /// assert!(cursor.move_prev().is_err());
            /// assert_eq!(cursor.current(), Some(&1));
            /// ```
            pub fn move_prev(&mut self) -> Result<(), &'static str> {
                if self.is_detached() {
                    return Err("`move_prev` on a detached cursor");
                }
                let prev = self.prev_node();
                if prev == self.list.ghost_node() {
                    return Err("`move_prev` past the front of the list");
                }
                self.current = prev;
                Ok(())
            }

            /// Set the cursor to the first element, or detach it if the list
            /// is empty.
            #[inline]
            pub fn move_to_front(&mut self) {
                self.current = self.list.front_node();
            }

            /// Set the cursor to the last element, or detach it if the list
            /// is empty.
            #[inline]
            pub fn move_to_back(&mut self) {
                self.current = self.list.back_node();
            }

            /// Move the cursor off the list.
            #[inline]
            pub fn detach(&mut self) {
                self.current = self.list.ghost_node();
            }
        }

        impl<'a, T: fmt::Debug + 'a> fmt::Debug for $CURSOR<'a, T> {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($CURSOR))
                    .field("list", &self.list)
                    .field("current", &self.current())
                    .finish()
            }
        }
    };
}

impl_cursor!(CursorMut);
impl_cursor!(Cursor);

impl<'a, T: 'a> Cursor<'a, T> {
    pub(crate) fn new(list: &'a List<T>, current: NonNull<Node<T>>) -> Self {
        Self { current, list }
    }

    /// Return an immutable reference to the element under the cursor, or
    /// `None` if the cursor is detached.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2, 3]);
    /// assert_eq!(list.cursor_front().current(), Some(&1));
    /// assert_eq!(list.cursor_back().current(), Some(&3));
    /// assert_eq!(list.cursor_detached().current(), None);
    /// ```
    pub fn current(&self) -> Option<&'a T> {
        if self.is_detached() {
            return None;
        }
        // SAFETY: it is safe because non-ghost nodes must hold a
        // valid element.
        Some(unsafe { Node::element(self.current) })
    }

    /// Scan forward from the cursor (inclusive) for the first element
    /// matching `predicate`. On a match the cursor moves there and the
    /// element is returned; otherwise the cursor stays put.
    ///
    /// The scan never wraps around to elements before the cursor, and a
    /// detached cursor finds nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter(["a", "b", "c"]);
    /// let mut cursor = list.cursor_front();
    ///
    /// assert_eq!(cursor.search(|item| *item == "c"), Some(&"c"));
    /// assert_eq!(cursor.search(|item| *item == "a"), None);
    /// assert_eq!(cursor.current(), Some(&"c"));
    /// ```
    pub fn search<F>(&mut self, predicate: F) -> Option<&'a T>
    where
        F: FnMut(&T) -> bool,
    {
        self.current = self.find_forward(predicate)?;
        self.current()
    }
}

impl<'a, T: 'a> CursorMut<'a, T> {
    pub(crate) fn new(list: &'a mut List<T>, current: NonNull<Node<T>>) -> Self {
        Self { current, list }
    }

    /// Insert `node` between `prev` and `next`. A node inserted into an empty
    /// list becomes the cursor's element.
    ///
    /// It is unsafe because `prev` and `next` must be adjacent nodes of the list.
    unsafe fn attach(&mut self, prev: NonNull<Node<T>>, next: NonNull<Node<T>>, item: T) {
        let was_empty = self.list.is_empty();
        let node = Node::new_detached(item);
        self.list.attach_node(prev, next, node);
        if was_empty {
            self.current = node;
        }
    }

    /// Unlink `node` and move the cursor off it if needed: to its former
    /// next element, or its former previous element if it was the last one.
    ///
    /// It is unsafe because `node` must be a non-ghost node of the list.
    unsafe fn detach_node(&mut self, node: NonNull<Node<T>>) -> T {
        if node == self.current {
            let ghost = self.list.ghost_node();
            let next = node.as_ref().next;
            self.current = if next != ghost {
                next
            } else {
                node.as_ref().prev
            };
        }
        self.list.detach_node(node)
    }
}

// Methods that does not change the linking structure of the list.
impl<'a, T: 'a> CursorMut<'a, T> {
    /// Return an immutable reference to the element under the cursor, or
    /// `None` if the cursor is detached.
    pub fn current(&self) -> Option<&T> {
        if self.is_detached() {
            return None;
        }
        // SAFETY: it is safe because non-ghost nodes must hold a
        // valid element.
        Some(unsafe { Node::element(self.current) })
    }

    /// Return a mutable reference to the element under the cursor, or
    /// `None` if the cursor is detached.
    pub fn current_mut(&mut self) -> Option<&mut T> {
        if self.is_detached() {
            return None;
        }
        // SAFETY: it is safe because non-ghost nodes must hold a
        // valid element.
        Some(unsafe { Node::element_mut(self.current) })
    }

    /// Same as [`Cursor::search`].
    pub fn search<F>(&mut self, predicate: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        self.current = self.find_forward(predicate)?;
        self.current()
    }

    /// Re-borrow the mutable cursor as a short-lived immutable one.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self.list, self.current)
    }

    /// Temporarily view the list via an immutable reference.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter([1, 2, 3]);
    /// let mut cursor = list.cursor_front_mut();
    ///
    /// assert_eq!(cursor.view().back(), Some(&3));
    ///
    /// cursor.insert_before(4);
    /// assert_eq!(Vec::from_iter(list), vec![4, 1, 2, 3]);
    /// ```
    pub fn view(&self) -> &List<T> {
        self.list
    }
}

// Methods that might change the linking structure of the list.
impl<'a, T: 'a> CursorMut<'a, T> {
    /// Add an element first in the list.
    ///
    /// The cursor stays put, unless the list was empty, in which case the
    /// new element becomes the cursor's element.
    pub fn push_front(&mut self, item: T) {
        let ghost = self.list.ghost_node();
        let front = self.list.front_node();
        // SAFETY: the ghost node and the front node are adjacent.
        unsafe { self.attach(ghost, front, item) }
    }

    /// Append an element to the back of a list.
    ///
    /// The cursor stays put, unless the list was empty, in which case the
    /// new element becomes the cursor's element.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::new();
    /// let mut cursor = list.cursor_detached_mut();
    ///
    /// cursor.push_back(1);
    /// cursor.push_back(2);
    /// assert_eq!(cursor.current(), Some(&1));
    ///
    /// assert_eq!(Vec::from_iter(list), vec![1, 2]);
    /// ```
    pub fn push_back(&mut self, item: T) {
        let ghost = self.list.ghost_node();
        let back = self.list.back_node();
        // SAFETY: the back node and the ghost node are adjacent.
        unsafe { self.attach(back, ghost, item) }
    }

    /// Remove the first element and return it, or `None` if the list is
    /// empty. If the cursor was on it, the cursor moves to the next element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let front = self.list.front_node();
        // SAFETY: the list is not empty, so the front node is not the ghost node.
        Some(unsafe { self.detach_node(front) })
    }

    /// Remove the last element and return it, or `None` if the list is
    /// empty. If the cursor was on it, the cursor moves to the new last
    /// element (or detaches when the list becomes empty).
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter([1, 2, 3]);
    /// let mut cursor = list.cursor_back_mut();
    ///
    /// assert_eq!(cursor.pop_back(), Some(3));
    /// assert_eq!(cursor.current(), Some(&2));
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let back = self.list.back_node();
        // SAFETY: the list is not empty, so the back node is not the ghost node.
        Some(unsafe { self.detach_node(back) })
    }

    /// Add an element right after the cursor. The cursor is not moved.
    ///
    /// If the list is empty, the element becomes the only one and the
    /// cursor's element. A detached cursor on a non-empty list sits between
    /// the last and the first element, so the element goes to the front.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter(["a", "b", "c"]);
    /// let mut cursor = list.cursor_front_mut();
    /// assert!(cursor.move_next().is_ok());
    ///
    /// cursor.insert_after("x");
    /// assert_eq!(cursor.current(), Some(&"b"));
    /// assert_eq!(Vec::from_iter(list), vec!["a", "b", "x", "c"]);
    /// ```
    pub fn insert_after(&mut self, item: T) {
        let (prev, next) = (self.current, self.next_node());
        // SAFETY: the current node and its next node are adjacent.
        unsafe { self.attach(prev, next, item) }
    }

    /// Add an element right before the cursor. The cursor is not moved.
    ///
    /// If the list is empty, the element becomes the only one and the
    /// cursor's element. A detached cursor on a non-empty list sits between
    /// the last and the first element, so the element goes to the back.
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter(["a", "b", "c"]);
    /// let mut cursor = list.cursor_front_mut();
    /// assert!(cursor.move_next().is_ok());
    ///
    /// cursor.insert_before("x");
    /// assert_eq!(cursor.current(), Some(&"b"));
    /// assert_eq!(Vec::from_iter(list), vec!["a", "x", "b", "c"]);
    /// ```
    pub fn insert_before(&mut self, item: T) {
        let (prev, next) = (self.prev_node(), self.current);
        // SAFETY: the previous node and the current node are adjacent.
        unsafe { self.attach(prev, next, item) }
    }

    /// Remove the element under the cursor and return it, or return `None`
    /// if the cursor is detached. After removal, the cursor moves to the
    /// next element, or to the previous one if the removed element was the
    /// last; it detaches when the list becomes empty.
    ///
    /// This operation should compute in *O*(*1*) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter(0..5);
    /// let mut cursor = list.cursor_front_mut();
    /// assert!(cursor.move_next().is_ok());
    ///
    /// assert_eq!(cursor.remove(), Some(1)); // becomes [0, 2, 3, 4]
    /// assert_eq!(cursor.current(), Some(&2));
    ///
    /// cursor.move_to_back();
    /// assert_eq!(cursor.remove(), Some(4)); // becomes [0, 2, 3]
    /// assert_eq!(cursor.current(), Some(&3));
    ///
    /// cursor.detach();
    /// assert_eq!(cursor.remove(), None);
    ///
    /// assert_eq!(Vec::from_iter(list), vec![0, 2, 3]);
    /// ```
    pub fn remove(&mut self) -> Option<T> {
        if self.is_detached() {
            return None;
        }
        let current = self.current;
        // SAFETY: `current` is a valid non-ghost node in the list, so it is safe.
        Some(unsafe { self.detach_node(current) })
    }
}

unsafe impl<T: Sync> Send for Cursor<'_, T> {}

unsafe impl<T: Sync> Sync for Cursor<'_, T> {}

unsafe impl<T: Send> Send for CursorMut<'_, T> {}

unsafe impl<T: Sync> Sync for CursorMut<'_, T> {}
