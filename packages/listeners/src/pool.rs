use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::{Arg, Call, Callback, Caller, Handler, HandlerPoolBuilder, Payload};

thread_local! {
    static SHARED: Rc<HandlerPool> = Rc::new(HandlerPool::new());
}

/// A free list of [`Handler`] instances, recycled across registrations.
///
/// Every registration needs a handler and every removal gives one back. The pool keeps the
/// returned handlers, with their references cleared, and reinitializes them for the next
/// registration instead of allocating a new one.
///
/// Dispatchers use the pool of the current thread ([`HandlerPool::thread_local()`]) unless
/// configured otherwise via [`EventDispatcherBuilder::pool()`][1]. Handlers are generic and
/// keep no state between uses, so any number of dispatchers can share one pool.
///
/// # Example
///
/// ```
/// use listeners::{Callback, Caller, HandlerPool};
///
/// let pool = HandlerPool::new();
///
/// let first = pool.create(Caller::none(), Callback::new(|_| {}), None, false);
/// pool.recover(&first);
/// assert_eq!(pool.len(), 1);
///
/// // The recovered instance is reused.
/// let second = pool.create(Caller::none(), Callback::new(|_| {}), None, false);
/// assert!(std::rc::Rc::ptr_eq(&first, &second));
/// assert!(pool.is_empty());
/// ```
///
/// # Thread safety
///
/// The pool is single-threaded. Each thread has its own shared instance.
///
/// [1]: crate::EventDispatcherBuilder::pool
pub struct HandlerPool {
    free: RefCell<Vec<Rc<Handler>>>,

    // The id to assign to the next handler handed out. Never zero.
    next_id: Cell<u32>,

    max_retained: Option<usize>,
}

impl HandlerPool {
    pub(crate) fn new_inner(max_retained: Option<usize>) -> Self {
        Self {
            free: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            max_retained,
        }
    }

    /// Creates a new [`HandlerPool`] with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`HandlerPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    pub fn builder() -> HandlerPoolBuilder {
        HandlerPoolBuilder::new()
    }

    /// The pool shared by all dispatchers on the current thread.
    #[must_use]
    pub fn thread_local() -> Rc<Self> {
        SHARED.with(Rc::clone)
    }

    /// Obtains an active handler bound to the given caller, method and fixed arguments.
    ///
    /// A previously recovered handler is reused if one is available, otherwise a new one is
    /// allocated. Either way, the returned handler has a fresh non-zero id.
    #[must_use]
    pub fn create(
        &self,
        caller: Caller,
        method: Callback,
        args: Option<Vec<Arg>>,
        once: bool,
    ) -> Rc<Handler> {
        let id = self.allocate_id();
        let recycled = self.free.borrow_mut().pop();
        let handler = recycled.unwrap_or_else(|| Rc::new(Handler::new()));

        handler.set_to(id, caller, method, args.map(Rc::from), once);
        handler
    }

    /// Returns a handler to the pool.
    ///
    /// The handler's caller, method and fixed arguments are released immediately and its id
    /// becomes zero. Recovering a handler that is not active does nothing, so a handler can
    /// never end up in the free list twice.
    pub fn recover(&self, handler: &Rc<Handler>) {
        if !handler.is_active() {
            return;
        }

        handler.clear();

        let mut free = self.free.borrow_mut();

        if self.max_retained.is_some_and(|max| free.len() >= max) {
            debug!(
                retained = free.len(),
                "handler pool is full; dropping recovered handler"
            );
            return;
        }

        free.push(Rc::clone(handler));
    }

    /// Invokes the handler with its fixed arguments only.
    ///
    /// A fire-once handler is recovered after the call, unless the callback itself already
    /// caused it to be recovered (or recovered and reused). Pooled handlers are not invoked.
    pub fn run(&self, handler: &Rc<Handler>) {
        self.invoke(handler, None);
    }

    /// Invokes the handler with its fixed arguments followed by the values of `payload`.
    ///
    /// Fire-once handlers are recovered after the call, as with [`run()`][Self::run].
    pub fn run_with(&self, handler: &Rc<Handler>, payload: &Payload) {
        self.invoke(handler, Some(payload));
    }

    /// The number of recycled handlers available for reuse.
    #[must_use]
    pub fn len(&self) -> usize {
        self.free.borrow().len()
    }

    /// Whether there are no recycled handlers available for reuse.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.borrow().is_empty()
    }

    /// Drops all recycled handlers, releasing their memory.
    ///
    /// Active handlers are not affected.
    pub fn clear(&self) {
        let free = self.free.take();
        drop(free);
    }

    fn invoke(&self, handler: &Rc<Handler>, payload: Option<&Payload>) {
        let id = handler.id();

        let Some((caller, method, fixed)) = handler.snapshot() else {
            return;
        };

        let merged: Vec<Arg>;
        let args: &[Arg] = match (fixed.as_deref(), payload) {
            (None, None) => &[],
            (Some(fixed), None) => fixed,
            (None, Some(payload)) => payload.values(),
            (Some(fixed), Some(payload)) => {
                merged = fixed.iter().chain(payload.values()).cloned().collect();
                &merged
            }
        };

        method.invoke(&Call::new(&caller, args));

        // The callback may have removed this handler, in which case it may also have been
        // handed out again for an unrelated registration.
        if handler.id() == id && handler.is_once() {
            self.recover(handler);
        }
    }

    fn allocate_id(&self) -> u32 {
        let id = self.next_id.get();

        let next = match id.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.next_id.set(next);

        id
    }
}

impl Default for HandlerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerPool {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("free", &self.free.borrow().len())
            .field("next_id", &self.next_id.get())
            .field("max_retained", &self.max_retained)
            .finish()
    }
}
