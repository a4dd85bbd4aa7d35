//! This crate provides a doubly-linked list with owned nodes, and a
//! thread-safe wrapper around it that keeps one cursor for all callers and
//! doubles as a producer/consumer message queue.
//!
//! - [`List`] is the single-threaded core. It is a cyclic list closed by a
//!   payload-less *ghost* node, so inserting or removing next to a known
//!   position takes constant time.
//! - [`SharedList`] puts a [`List`] behind a mutex together with a list-wide
//!   cursor and a "non-empty" condition variable. Every operation is one
//!   short critical section, and consumers can block in
//!   [`SharedList::dequeue`] until a producer appends or the list is closed.
//! - [`talk`] wires two [`SharedList`] queues into a chat pipeline between a
//!   local user and a remote peer.
//!
//! Here is a quick example of the shared list used as a queue.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use sync_list::{End, SharedList};
//!
//! let queue = Arc::new(SharedList::new());
//! let producers: Vec<_> = (0..4)
//!     .map(|id| {
//!         let queue = queue.clone();
//!         thread::spawn(move || {
//!             for n in 0..10 {
//!                 queue.append((id, n));
//!             }
//!         })
//!     })
//!     .collect();
//! for producer in producers {
//!     producer.join().unwrap();
//! }
//!
//! assert_eq!(queue.count(), 40);
//! let mut received = 0;
//! while queue.try_dequeue(End::Front).is_some() {
//!     received += 1;
//! }
//! assert_eq!(received, 40);
//! ```
//!
//! # Memory Layout
//!
//! ```text
//!      ┌──────────────────────────────────────────────────┐
//!      ↓                                                  │
//!  ┌────────┐      ┌────────┐      ┌────────┐      ┌──────┴─┐
//!  │ ghost  │ ───→ │ node 0 │ ───→ │ node 1 │ ───→ │ node 2 │
//!  │  (no   │ ←─── │  item  │ ←─── │  item  │ ←─── │  item  │
//!  │  item) │      └────────┘      └────────┘      └────────┘
//!  └───┬────┘                                           ↑
//!      └────────────────────────────────────────────────┘
//! ```
//!
//! `ghost.next` is the head and `ghost.prev` is the tail; in an empty list
//! both point back at the ghost. A cursor on the ghost node is on no element,
//! which we call *detached*. A detached cursor on a non-empty list sits
//! between the tail and the head, so inserting after it prepends and
//! inserting before it appends.
//!
//! # Cursors
//!
//! [`Cursor`] and [`CursorMut`] are positions owned by their caller. They
//! move with [`move_next`] and [`move_prev`], which fail at the ends instead
//! of wrapping around. [`CursorMut`] also edits the list around its position.
//! Insertions leave the cursor where it is, and removals move it to a
//! neighbour so it never refers to a freed node.
//!
//! ```
//! use sync_list::List;
//! use std::iter::FromIterator;
//!
//! let mut list = List::from_iter([1, 2, 4]);
//! let mut cursor = list.cursor_front_mut();
//!
//! assert!(cursor.move_next().is_ok());
//! cursor.insert_after(3); // becomes [1, 2, 3, 4], still on 2
//! assert_eq!(cursor.current(), Some(&2));
//!
//! assert_eq!(cursor.remove(), Some(2)); // becomes [1, 3, 4], now on 3
//! assert_eq!(cursor.current(), Some(&3));
//!
//! assert_eq!(Vec::from_iter(list), vec![1, 3, 4]);
//! ```
//!
//! The list-wide cursor of a [`SharedList`] is moved by
//! [`first`](SharedList::first), [`next`](SharedList::next) and the other
//! navigation methods. Callers that need a traversal of their own take a
//! [`ListGuard`] with [`SharedList::lock`] and use a [`Cursor`] or an
//! iterator on it.
//!
//! [`Cursor`]: crate::list::cursor::Cursor
//! [`CursorMut`]: crate::list::cursor::CursorMut
//! [`move_next`]: crate::list::cursor::Cursor::move_next
//! [`move_prev`]: crate::list::cursor::Cursor::move_prev

#[doc(inline)]
pub use list::iterator::{IntoIter, Iter, IterMut};
#[doc(inline)]
pub use list::List;

#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use shared::{End, ListGuard, SharedList};

pub mod error;
pub mod list;
pub mod shared;
pub mod talk;
