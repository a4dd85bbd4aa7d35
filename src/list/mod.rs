use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use crate::list::cursor::{Cursor, CursorMut};
use crate::list::drain::Drain;
use crate::{IntoIter, Iter, IterMut};

pub mod cursor;
pub mod drain;
pub mod iterator;

/// The `List` is a doubly-linked list with owned nodes, implemented as a cyclic list.
/// It allows inserting, removing elements at any given position in constant time.
/// In compromise, accessing or mutating elements at any position take *O*(*n*) time.
///
/// `List` itself is not synchronized. It is the storage behind
/// [`SharedList`](crate::SharedList), and can be used on its own where a
/// single thread owns the queue.
///
/// The `List` contains:
/// - a pointer `ghost` that points to the ghost node, whose `next` is the
///   first element and whose `prev` is the last element;
/// - a length field `len` indicating the length of the list.
///
/// # Naming Conventions
///
/// - `front..=back`: a closed range of list nodes, both inclusive;
/// - a cursor pointing at the ghost node is *detached*: it is on no element.
pub struct List<T> {
    ghost: NonNull<Node<T>>,
    /// the length of the list
    pub(crate) len: usize,
    _marker: PhantomData<Box<Node<T>>>,
}

pub(crate) struct Node<T> {
    pub(crate) next: NonNull<Node<T>>,
    pub(crate) prev: NonNull<Node<T>>,
    // Uninitialized only in the ghost node.
    element: MaybeUninit<T>,
}

/// Nodes fragment detached from a list, used in list splicing.
///
/// When detached from a list, reading of `front.prev` and `back.next`
/// is invalid.
pub(crate) struct DetachedNodes<T> {
    pub(crate) front: NonNull<Node<T>>,
    pub(crate) back: NonNull<Node<T>>,
    pub(crate) len: usize,
    _marker: PhantomData<Box<Node<T>>>,
}

/// Link `prev` and `next` as adjacent nodes.
///
/// It is unsafe because both nodes must be alive.
pub(crate) unsafe fn connect<T>(prev: NonNull<Node<T>>, next: NonNull<Node<T>>) {
    (*prev.as_ptr()).next = next;
    (*next.as_ptr()).prev = prev;
}

// private methods
impl<T> List<T> {
    pub(crate) fn ghost_node(&self) -> NonNull<Node<T>> {
        self.ghost
    }
    pub(crate) fn front_node(&self) -> NonNull<Node<T>> {
        // SAFETY: `ghost.next` is always valid (either `ghost` itself, or the first element
        // in the list).
        unsafe { self.ghost.as_ref().next }
    }
    pub(crate) fn back_node(&self) -> NonNull<Node<T>> {
        // SAFETY: `ghost.prev` is always valid (either `ghost` itself, or the last element
        // in the list).
        unsafe { self.ghost.as_ref().prev }
    }

    /// Detach a single node `node` from the list, and return its element.
    ///
    /// It is unsafe because it does not check whether `node` belongs to the list,
    /// or whether it is the ghost node.
    ///
    /// If the `node` does not belong to the list, this function call will make
    /// the list ill-formed.
    pub(crate) unsafe fn detach_node(&mut self, node: NonNull<Node<T>>) -> T {
        debug_assert!(node != self.ghost, "Cannot detach the ghost node");
        self.len -= 1;
        connect(node.as_ref().prev, node.as_ref().next);
        Node::into_element(node)
    }

    /// Attach a single node `node` to the list, between `prev` and `next`.
    ///
    /// It is unsafe because it does not check whether `prev` and `next` belongs
    /// to the list, or whether the `prev` and `next` is adjacent (only in
    /// `#[cfg(debug_assertions)]`).
    ///
    /// If the `prev` and `next` does not belong to the list, or they are not
    /// adjacent nodes, this function call will make the list ill-formed.
    pub(crate) unsafe fn attach_node(
        &mut self,
        prev: NonNull<Node<T>>,
        next: NonNull<Node<T>>,
        node: NonNull<Node<T>>,
    ) {
        #[cfg(debug_assertions)]
        assert_adjacent(prev, next);
        connect(prev, node);
        connect(node, next);
        self.len += 1;
    }

    /// Attach a range of detached nodes to the list, between `prev` and `next`.
    ///
    /// It is unsafe because it does not check whether `prev` and `next` belongs
    /// to the list, or whether the `prev` and `next` is adjacent (only in
    /// `#[cfg(debug_assertions)]`).
    pub(crate) unsafe fn attach_nodes(
        &mut self,
        prev: NonNull<Node<T>>,
        next: NonNull<Node<T>>,
        detached: DetachedNodes<T>,
    ) {
        #[cfg(debug_assertions)]
        assert_adjacent(prev, next);
        connect(prev, detached.front);
        connect(detached.back, next);
        self.len += detached.len;
    }

    /// Detach all nodes from the list, and return the detached nodes, or return
    /// `None` if the list is empty.
    ///
    /// It is safe because `self.front_node()..=self.back_node()` is a valid range.
    pub(crate) fn detach_all_nodes(&mut self) -> Option<DetachedNodes<T>> {
        if self.is_empty() {
            return None;
        }
        let detached = DetachedNodes {
            front: self.front_node(),
            back: self.back_node(),
            len: std::mem::replace(&mut self.len, 0),
            _marker: PhantomData,
        };
        // SAFETY: the ghost node is always valid.
        unsafe { connect(self.ghost, self.ghost) };
        Some(detached)
    }
}

impl<T> List<T> {
    /// Create an empty `List`
    ///
    /// # Examples
    /// ```
    /// use sync_list::List;
    /// let list: List<u32> = List::new();
    /// assert!(list.is_empty());
    /// ```
    #[inline]
    pub fn new() -> Self {
        Self {
            ghost: Node::new_ghost(),
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns `true` if the `List` is empty.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.front_node() == self.ghost_node()
    }

    /// Returns the length of the `List`.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_front(2);
    /// list.push_front(1);
    /// list.push_back(3);
    /// assert_eq!(list.len(), 3);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Removes all elements from the `List`.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(*n*) time.
    #[inline]
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Provides a reference to the front element, or `None` if the list is
    /// empty.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.cursor_front().current()
    }

    /// Provides a mutable reference to the front element, or `None` if the list
    /// is empty.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let front = self.front_node();
        if front == self.ghost {
            return None;
        }
        // SAFETY: `front` is a non-ghost node owned by the list.
        Some(unsafe { Node::element_mut(front) })
    }

    /// Provides a reference to the back element, or `None` if the list is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.back(), None);
    ///
    /// list.push_back(1);
    /// assert_eq!(list.back(), Some(&1));
    /// ```
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.cursor_back().current()
    }

    /// Provides a mutable reference to the back element, or `None` if the list
    /// is empty.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let back = self.back_node();
        if back == self.ghost {
            return None;
        }
        // SAFETY: `back` is a non-ghost node owned by the list.
        Some(unsafe { Node::element_mut(back) })
    }

    /// Adds an element first in the list.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    pub fn push_front(&mut self, elt: T) {
        let node = Node::new_detached(elt);
        // SAFETY: the ghost node and the front node are adjacent nodes of the list.
        unsafe { self.attach_node(self.ghost, self.front_node(), node) }
    }

    /// Removes the first element and returns it, or `None` if the list is
    /// empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.pop_front(), None);
    ///
    /// list.push_front(1);
    /// list.push_front(3);
    /// assert_eq!(list.pop_front(), Some(3));
    /// assert_eq!(list.pop_front(), Some(1));
    /// assert_eq!(list.pop_front(), None);
    /// ```
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the front node is not the ghost node.
        Some(unsafe { self.detach_node(self.front_node()) })
    }

    /// Appends an element to the back of a list.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time.
    pub fn push_back(&mut self, elt: T) {
        let node = Node::new_detached(elt);
        // SAFETY: the back node and the ghost node are adjacent nodes of the list.
        unsafe { self.attach_node(self.back_node(), self.ghost, node) }
    }

    /// Removes the last element from a list and returns it, or `None` if
    /// it is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list = List::new();
    /// assert_eq!(list.pop_back(), None);
    /// list.push_back(1);
    /// list.push_back(3);
    /// assert_eq!(list.pop_back(), Some(3));
    /// ```
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        // SAFETY: the list is not empty, so the back node is not the ghost node.
        Some(unsafe { self.detach_node(self.back_node()) })
    }

    /// Provides a cursor at the first element.
    ///
    /// The cursor is detached if the list is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let list = List::from_iter([1, 2, 3]);
    /// let cursor = list.cursor_front();
    /// assert_eq!(cursor.current(), Some(&1));
    /// ```
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.front_node())
    }

    /// Provides a cursor at the last element.
    ///
    /// The cursor is detached if the list is empty.
    pub fn cursor_back(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.back_node())
    }

    /// Provides a detached cursor, pointing at no element.
    pub fn cursor_detached(&self) -> Cursor<'_, T> {
        Cursor::new(self, self.ghost)
    }

    /// Provides a cursor with editing operations at the first element.
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
    /// if let Some(x) = cursor.current_mut() {
    ///     *x *= 5;
    /// }
    /// assert_eq!(cursor.current(), Some(&5));
    /// ```
    pub fn cursor_front_mut(&mut self) -> CursorMut<'_, T> {
        let front = self.front_node();
        CursorMut::new(self, front)
    }

    /// Provides a cursor with editing operations at the last element.
    pub fn cursor_back_mut(&mut self) -> CursorMut<'_, T> {
        let back = self.back_node();
        CursorMut::new(self, back)
    }

    /// Provides a detached cursor with editing operations.
    pub fn cursor_detached_mut(&mut self) -> CursorMut<'_, T> {
        let ghost = self.ghost;
        CursorMut::new(self, ghost)
    }

    /// Provides a forward iterator.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list = List::new();
    ///
    /// list.push_back(0);
    /// list.push_back(1);
    /// list.push_back(2);
    ///
    /// let mut iter = list.iter();
    /// assert_eq!(iter.next(), Some(&0));
    /// assert_eq!(iter.next(), Some(&1));
    /// assert_eq!(iter.next(), Some(&2));
    /// assert_eq!(iter.next(), None);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Provides a forward iterator with mutable references.
    #[inline]
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut::new(self)
    }

    /// Moves all elements from `other` to the end of the list.
    ///
    /// This reuses all the nodes from `other` and moves them into `self`. After
    /// this operation, `other` becomes empty.
    ///
    /// # Complexity
    ///
    /// This operation should compute in *O*(1) time and *O*(1) memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    ///
    /// let mut list1 = List::new();
    /// list1.push_back('a');
    ///
    /// let mut list2 = List::new();
    /// list2.push_back('b');
    /// list2.push_back('c');
    ///
    /// list1.append(&mut list2);
    ///
    /// let mut iter = list1.iter();
    /// assert_eq!(iter.next(), Some(&'a'));
    /// assert_eq!(iter.next(), Some(&'b'));
    /// assert_eq!(iter.next(), Some(&'c'));
    /// assert!(iter.next().is_none());
    ///
    /// assert!(list2.is_empty());
    /// ```
    pub fn append(&mut self, other: &mut Self) {
        if let Some(detached) = other.detach_all_nodes() {
            // `self.back_node()` and `self.ghost_node()` are valid
            // nodes in the list and they are adjacent, so it is safe.
            unsafe { self.attach_nodes(self.back_node(), self.ghost, detached) }
        }
    }

    /// Removes all elements front to back, yielding them by value.
    ///
    /// Elements not consumed by the iterator are dropped when it is.
    ///
    /// # Examples
    ///
    /// ```
    /// use sync_list::List;
    /// use std::iter::FromIterator;
    ///
    /// let mut list = List::from_iter(["a", "b"]);
    /// let mut released = Vec::new();
    /// list.drain().for_each(|item| released.push(item));
    /// assert_eq!(released, vec!["a", "b"]);
    /// assert!(list.is_empty());
    /// ```
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain::new(self)
    }

    /// Returns `true` if the `List` contains an element equal to the given value.
    pub fn contains(&self, x: &T) -> bool
    where
        T: PartialEq<T>,
    {
        self.iter().any(|e| e == x)
    }
}

impl<T: Debug> Debug for List<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other)
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: Hash> Hash for List<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len.hash(state);
        self.iter().for_each(|elt| elt.hash(state));
    }
}

impl<T> Node<T> {
    fn new_ghost() -> NonNull<Node<T>> {
        let ghost = NonNull::from(Box::leak(Box::new(Node {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
            element: MaybeUninit::uninit(),
        })));
        // SAFETY: `ghost` was just allocated, and it links to itself in an empty list.
        unsafe { connect(ghost, ghost) };
        ghost
    }

    /// Create a detached node with given element.
    ///
    /// `node.prev` and `node.next` are dangling until the node is attached.
    pub(crate) fn new_detached(element: T) -> NonNull<Node<T>> {
        NonNull::from(Box::leak(Box::new(Node {
            next: NonNull::dangling(),
            prev: NonNull::dangling(),
            element: MaybeUninit::new(element),
        })))
    }

    /// It is unsafe because `node` must be a live, non-ghost node.
    pub(crate) unsafe fn element<'a>(node: NonNull<Node<T>>) -> &'a T {
        (*node.as_ptr()).element.assume_init_ref()
    }

    /// It is unsafe because `node` must be a live, non-ghost node.
    pub(crate) unsafe fn element_mut<'a>(node: NonNull<Node<T>>) -> &'a mut T {
        (*node.as_ptr()).element.assume_init_mut()
    }

    /// Free a detached non-ghost node and move its element out.
    unsafe fn into_element(node: NonNull<Node<T>>) -> T {
        let node = *Box::from_raw(node.as_ptr());
        node.element.assume_init()
    }
}

#[cfg(debug_assertions)]
fn assert_adjacent<T>(prev: NonNull<Node<T>>, next: NonNull<Node<T>>) {
    unsafe {
        assert_eq!(prev.as_ref().next, next);
        assert_eq!(next.as_ref().prev, prev);
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: the ghost node was leaked from a box in `Node::new_ghost`,
        // and its element is never initialized, so nothing else is dropped.
        unsafe { drop(Box::from_raw(self.ghost.as_ptr())) };
    }
}

unsafe impl<T: Send> Send for List<T> {}

unsafe impl<T: Sync> Sync for List<T> {}

// Ensure that `List` and its read-only iterators are covariant in their type parameters.
#[allow(dead_code)]
fn assert_covariance() {
    fn a<'a>(x: List<&'static str>) -> List<&'a str> {
        x
    }
    fn b<'i, 'a>(x: Iter<'i, &'static str>) -> Iter<'i, &'a str> {
        x
    }
    fn c<'a>(x: IntoIter<&'static str>) -> IntoIter<&'a str> {
        x
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::list::List;
    use std::cell::RefCell;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;
    use std::hash::{Hash, Hasher};
    use std::iter::FromIterator;

    /// Walk the chain both ways and check the links agree with `len`.
    pub(crate) fn assert_well_formed<T>(list: &List<T>) {
        let ghost = list.ghost_node();
        let mut forward = 0;
        let mut node = list.front_node();
        while node != ghost {
            unsafe {
                assert_eq!(node.as_ref().next.as_ref().prev, node);
                node = node.as_ref().next;
            }
            forward += 1;
        }
        let mut backward = 0;
        let mut node = list.back_node();
        while node != ghost {
            unsafe {
                assert_eq!(node.as_ref().prev.as_ref().next, node);
                node = node.as_ref().prev;
            }
            backward += 1;
        }
        assert_eq!(forward, list.len());
        assert_eq!(backward, list.len());
    }

    #[test]
    fn list_create() {
        let mut list = List::<i32>::new();
        assert!(list.is_empty());
        list.push_back(1);
        assert!(!list.is_empty());
        assert_eq!(list.pop_back(), Some(1));
        assert!(list.is_empty());
        assert_well_formed(&list);
    }

    #[test]
    fn list_drop() {
        #[derive(Debug)]
        struct DropChecker<'a, T: Copy> {
            value: T,
            dropped: &'a RefCell<Vec<T>>,
        }
        impl<'a, T: Copy> DropChecker<'a, T> {
            fn new(value: T, dropped: &'a RefCell<Vec<T>>) -> Self {
                Self { value, dropped }
            }
        }
        impl<'a, T: Copy> Drop for DropChecker<'a, T> {
            fn drop(&mut self) {
                self.dropped.borrow_mut().push(self.value);
            }
        }
        let dropped = RefCell::new(Vec::<i32>::new());
        let mut list = List::new();
        list.push_back(DropChecker::new(1, &dropped));
        list.push_back(DropChecker::new(2, &dropped));
        list.push_back(DropChecker::new(3, &dropped));
        drop(list);
        assert_eq!(dropped.borrow().as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn list_push_and_pop() {
        let mut list = List::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert_eq!(list.pop_front(), None);
        assert_eq!(list.pop_back(), None);

        list.push_back(1);
        assert_eq!(list.back(), Some(&1));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());

        list.push_front(1);
        list.push_front(2);
        list.push_back(3);
        assert_well_formed(&list);
        assert_eq!(list.back(), Some(&3));
        assert_eq!(list.front(), Some(&2));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_back(), Some(3));

        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.front(), None);
        assert_eq!(list.back(), None);
        assert!(list.is_empty());
        assert_well_formed(&list);
    }

    #[test]
    fn list_push_back_then_pop_back_is_lifo() {
        let mut list = List::new();
        list.push_back("first");
        list.push_back("second");
        assert_eq!(list.pop_back(), Some("second"));
        assert_eq!(list.pop_back(), Some("first"));
    }

    #[test]
    fn list_front_and_back_mut() {
        let mut list = List::from_iter([1, 2, 3]);
        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;
        assert_eq!(Vec::from_iter(list.iter().copied()), vec![10, 2, 30]);

        let mut empty = List::<i32>::new();
        assert_eq!(empty.front_mut(), None);
        assert_eq!(empty.back_mut(), None);
    }

    #[test]
    fn list_append() {
        fn check(list: &[i32], other: &[i32]) {
            let mut list = List::from_iter(list.iter().copied());
            let mut other_list = List::from_iter(other.iter().copied());
            let expected = Vec::from_iter(list.iter().chain(other_list.iter()).copied());

            list.append(&mut other_list);
            assert!(other_list.is_empty());
            assert_eq!(list.len(), expected.len());
            assert_eq!(Vec::from_iter(list.iter().copied()), expected);
            assert_well_formed(&list);
            assert_well_formed(&other_list);

            // The emptied list is still usable.
            other_list.push_back(42);
            assert_eq!(other_list.pop_front(), Some(42));
        }
        check(&[0, 1], &[2, 3]);
        check(&[], &[2, 3]);
        check(&[0, 1], &[]);
        check(&[], &[]);
        check(&[0], &[1]);
    }

    #[test]
    fn list_clone_eq_and_contains() {
        let list = List::from_iter(["a", "b", "c"]);
        let cloned = list.clone();
        assert_eq!(list, cloned);
        assert!(list.contains(&"b"));
        assert!(!list.contains(&"x"));
        assert_ne!(list, List::from_iter(["a", "b"]));
        assert_eq!(format!("{:?}", list), r#"["a", "b", "c"]"#);
    }

    #[test]
    fn list_hash_follows_elements() {
        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }
        let list = List::from_iter(["a", "b"]);
        assert_eq!(hash_of(&list), hash_of(&list.clone()));
        assert_ne!(hash_of(&list), hash_of(&List::from_iter(["b", "a"])));

        let mut set = HashSet::new();
        assert!(set.insert(list.clone()));
        assert!(!set.insert(list));
    }

    #[test]
    fn list_clear() {
        let mut list = List::from_iter(0..10);
        assert_eq!(list.len(), 10);
        list.clear();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_well_formed(&list);
    }
}
