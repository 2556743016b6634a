use std::any::type_name;
use std::fmt;

use crate::HandlerPool;

/// Builder for creating an instance of [`HandlerPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`HandlerPool::new()`][1] keeps every recycled handler.
///
/// # Examples
///
/// ```
/// use listeners::HandlerPool;
///
/// let pool = HandlerPool::builder().max_retained(64).build();
/// assert!(pool.is_empty());
/// ```
///
/// [1]: HandlerPool::new
#[must_use]
pub struct HandlerPoolBuilder {
    max_retained: Option<usize>,
}

impl fmt::Debug for HandlerPoolBuilder {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("max_retained", &self.max_retained)
            .finish()
    }
}

impl HandlerPoolBuilder {
    pub(crate) fn new() -> Self {
        Self { max_retained: None }
    }

    /// Sets the maximum number of recycled handlers the pool keeps for reuse.
    ///
    /// Handlers recovered while the pool is already holding this many are dropped instead.
    /// A limit of zero disables reuse entirely. By default, there is no limit.
    pub fn max_retained(mut self, max_retained: usize) -> Self {
        self.max_retained = Some(max_retained);
        self
    }

    /// Builds the handler pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> HandlerPool {
        HandlerPool::new_inner(self.max_retained)
    }
}
