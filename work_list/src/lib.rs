//! # Work List
//!
//! An ordered container of pending work, shared by the scheduler's sequence
//! and error queues.
//!
//! ## Ordering
//!
//! A list is created either as a strict FIFO (no comparator) or as an
//! ascending list (with comparator):
//!
//! - **FIFO**: every [`WorkList::add`] appends at the tail.
//! - **Ascending**: `add` scans from the head while the existing element
//!   compares `Less` than the new one, and inserts the new element before the
//!   first element that is greater than *or equal to* it. Among equal
//!   elements the most recently added one therefore ends up first. This is
//!   the documented ordering rule, not FIFO among ties.
//!
//! ## Allocation
//!
//! Growth uses fallible reservation, so running out of memory surfaces as
//! [`WorkListError::AllocationFailed`] instead of aborting the process. A
//! list may also be bounded with [`WorkList::with_limit`]; adding to a full
//! list fails with [`WorkListError::Full`].
//!
//! ## Example
//!
//! ```
//! use work_list::WorkList;
//!
//! let mut list = WorkList::ordered(|a: &u32, b: &u32| a.cmp(b)).unwrap();
//! for value in [3, 1, 4, 2] {
//!     list.add(value).unwrap();
//! }
//! assert_eq!(list.extract_first(), Some(1));
//! assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 3, 4]);
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Capacity reserved when a list is allocated
const INITIAL_CAPACITY: usize = 8;

/// Comparator defining ascending order for an ordered list
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Work list errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkListError {
    /// Memory for the list or a new element could not be reserved
    #[error("Work list allocation failed")]
    AllocationFailed,

    /// The list already holds as many items as its limit allows
    #[error("Work list is full ({limit} items)")]
    Full { limit: usize },
}

/// Ordered work list
pub struct WorkList<T> {
    items: VecDeque<T>,
    comparator: Option<Comparator<T>>,
    limit: Option<usize>,
}

impl<T> WorkList<T> {
    /// Allocates a new list, ordered if a comparator is supplied
    pub fn allocate(comparator: Option<Comparator<T>>) -> Result<Self, WorkListError> {
        let mut items = VecDeque::new();
        items
            .try_reserve(INITIAL_CAPACITY)
            .map_err(|_| WorkListError::AllocationFailed)?;
        Ok(Self {
            items,
            comparator,
            limit: None,
        })
    }

    /// Allocates a strict FIFO list
    pub fn fifo() -> Result<Self, WorkListError> {
        Self::allocate(None)
    }

    /// Allocates an ascending list ordered by `comparator`
    pub fn ordered<F>(comparator: F) -> Result<Self, WorkListError>
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self::allocate(Some(Box::new(comparator)))
    }

    /// Bounds the number of items the list will hold
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Checks if the list orders its elements
    pub fn is_ordered(&self) -> bool {
        self.comparator.is_some()
    }

    /// Adds an item according to the list's ordering rule
    ///
    /// On allocation failure the item is dropped and the list is unchanged.
    pub fn add(&mut self, item: T) -> Result<(), WorkListError> {
        if let Some(limit) = self.limit {
            if self.items.len() >= limit {
                return Err(WorkListError::Full { limit });
            }
        }
        self.items
            .try_reserve(1)
            .map_err(|_| WorkListError::AllocationFailed)?;

        let insert_pos = match &self.comparator {
            None => self.items.len(),
            Some(compare) => self
                .items
                .iter()
                .position(|current| compare(current, &item) != Ordering::Less)
                .unwrap_or(self.items.len()),
        };

        self.items.insert(insert_pos, item);
        Ok(())
    }

    /// Returns the first item without removing it
    pub fn peek_first(&self) -> Option<&T> {
        self.items.front()
    }

    /// Returns the first item mutably without removing it
    pub fn peek_first_mut(&mut self) -> Option<&mut T> {
        self.items.front_mut()
    }

    /// Removes and returns the first item
    ///
    /// Returns `None` on an empty list, leaving it untouched.
    pub fn extract_first(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Returns the number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items from first to last
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Releases the list, dropping every remaining item
    ///
    /// Returns how many items were released.
    pub fn free(self) -> usize {
        self.items.len()
    }

    /// Releases the list, handing every remaining item to `destructor` in order
    pub fn free_with<F>(self, mut destructor: F) -> usize
    where
        F: FnMut(T),
    {
        let mut released = 0;
        for item in self.items {
            destructor(item);
            released += 1;
        }
        released
    }
}

impl<T: fmt::Debug> fmt::Debug for WorkList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkList")
            .field("ordered", &self.is_ordered())
            .field("limit", &self.limit)
            .field("items", &self.items)
            .finish()
    }
}
