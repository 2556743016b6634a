#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and benchmarking the listeners package.

use std::cell::RefCell;
use std::rc::Rc;

/// An ordered record of invocations, shared between the test body and the listeners it
/// registers.
///
/// Clones share the same underlying record, so a clone can be moved into each listener while
/// the test keeps one to make assertions against.
///
/// # Example
///
/// ```rust
/// use testing::CallLog;
///
/// let log = CallLog::new();
/// let in_listener = log.clone();
///
/// in_listener.record("first");
/// in_listener.record(format!("second:{}", 2));
///
/// assert_eq!(log.entries(), ["first", "second:2"]);
/// assert_eq!(log.count("first"), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// A copy of all entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Removes and returns all entries, oldest first.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        self.entries.take()
    }

    /// How many entries are equal to `entry`.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|recorded| *recorded == entry)
            .count()
    }

    /// The number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
