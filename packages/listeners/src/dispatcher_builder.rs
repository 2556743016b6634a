use std::any::type_name;
use std::fmt;
use std::rc::Rc;

use crate::{EventDispatcher, HandlerPool};

/// Builder for creating an instance of [`EventDispatcher`].
///
/// You only need to use this builder if you want the dispatcher to recycle handlers through a
/// specific [`HandlerPool`]. By default, dispatchers share the pool of the current thread.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use listeners::{EventDispatcher, HandlerPool};
///
/// let pool = Rc::new(HandlerPool::builder().max_retained(16).build());
///
/// let ui_events = EventDispatcher::builder().pool(Rc::clone(&pool)).build();
/// let game_events = EventDispatcher::builder().pool(pool).build();
/// # drop((ui_events, game_events));
/// ```
#[must_use]
pub struct EventDispatcherBuilder {
    pool: Option<Rc<HandlerPool>>,
}

impl fmt::Debug for EventDispatcherBuilder {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("pool", &self.pool)
            .finish()
    }
}

impl EventDispatcherBuilder {
    pub(crate) fn new() -> Self {
        Self { pool: None }
    }

    /// Sets the pool that the dispatcher obtains handlers from and returns them to.
    pub fn pool(mut self, pool: Rc<HandlerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Builds the dispatcher with the specified configuration.
    #[must_use]
    pub fn build(self) -> EventDispatcher {
        EventDispatcher::new_inner(self.pool.unwrap_or_else(HandlerPool::thread_local))
    }
}
