use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt};
use tracing::{debug, trace};

use crate::{Arg, Callback, Caller, EventDispatcherBuilder, Handler, HandlerPool, Payload};

/// Listener slots of an event type with more than one listener, in registration order.
///
/// `None` marks a removed listener that has not been compacted away yet. The vector is shared
/// with any dispatch pass in progress, which compacts it when it ends.
type Slots = Rc<RefCell<Vec<Option<Rc<Handler>>>>>;

/// The listeners registered for one event type.
///
/// A lone listener is stored directly; the slot vector is only allocated when a second
/// listener arrives.
#[derive(Clone, Default)]
enum Entry {
    /// Placeholder while an entry is being rewritten. Never stored in the registry.
    #[default]
    Empty,

    Single(Rc<Handler>),

    Many(Slots),
}

impl Entry {
    fn push(&mut self, handler: Rc<Handler>) {
        *self = match mem::take(self) {
            Self::Empty => Self::Single(handler),
            Self::Single(existing) => {
                Self::Many(Rc::new(RefCell::new(vec![Some(existing), Some(handler)])))
            }
            Self::Many(slots) => {
                slots.borrow_mut().push(Some(handler));
                Self::Many(slots)
            }
        };
    }

    fn live_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Single(_) => 1,
            Self::Many(slots) => slots.borrow().iter().flatten().count(),
        }
    }

    /// Takes every handler out of the entry. Shared slots are left as tombstones for a dispatch
    /// pass in progress to compact.
    fn take_handlers(self) -> Vec<Rc<Handler>> {
        match self {
            Self::Empty => Vec::new(),
            Self::Single(handler) => vec![handler],
            Self::Many(slots) => {
                let mut slots = slots.borrow_mut();
                slots.iter_mut().filter_map(Option::take).collect()
            }
        }
    }
}

/// Dispatches named events to the listeners registered for them.
///
/// Listeners are registered for an event type (a string) and invoked synchronously, in
/// registration order, whenever an event of that type is raised via [`event()`][1] or
/// [`event_with()`][2].
///
/// All methods take `&self`, so listeners can reach the dispatcher through an [`Rc`] and
/// register or remove listeners while an event is being dispatched. See the
/// [crate documentation][crate] for how such changes affect the dispatch in progress.
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use listeners::{Callback, Caller, EventDispatcher};
///
/// let dispatcher = EventDispatcher::new();
/// let clicks = Rc::new(Cell::new(0));
///
/// let on_click = Callback::new({
///     let clicks = Rc::clone(&clicks);
///     move |_| clicks.set(clicks.get() + 1)
/// });
///
/// dispatcher
///     .on("click", Caller::none(), on_click.clone(), None)
///     .once("click", Caller::none(), Callback::new(|_| println!("first click!")), None);
///
/// assert!(dispatcher.event("click"));
/// assert!(dispatcher.event("click"));
/// assert_eq!(clicks.get(), 2);
///
/// dispatcher.off("click", &Caller::none(), &on_click);
/// assert!(!dispatcher.has_listener("click"));
/// assert!(!dispatcher.event("click"));
/// ```
///
/// # Thread safety
///
/// This type is single-threaded.
///
/// [1]: Self::event
/// [2]: Self::event_with
pub struct EventDispatcher {
    entries: RefCell<HashMap<String, Entry>>,
    pool: Rc<HandlerPool>,
}

impl EventDispatcher {
    pub(crate) fn new_inner(pool: Rc<HandlerPool>) -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            pool,
        }
    }

    /// Creates a dispatcher that uses the handler pool of the current thread.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`EventDispatcher`].
    pub fn builder() -> EventDispatcherBuilder {
        EventDispatcherBuilder::new()
    }

    /// The pool this dispatcher obtains handlers from.
    #[must_use]
    pub fn pool(&self) -> &Rc<HandlerPool> {
        &self.pool
    }

    /// Whether any listener is registered for `event_type`.
    #[must_use]
    pub fn has_listener(&self, event_type: &str) -> bool {
        self.entries.borrow().contains_key(event_type)
    }

    /// The number of listeners registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.entries
            .borrow()
            .get(event_type)
            .map_or(0, Entry::live_count)
    }

    /// Registers a listener for `event_type`.
    ///
    /// If the same `(caller, callback)` pair is already registered for this event type, the
    /// existing registration is removed first, so the pair is never invoked twice per event.
    /// The new registration goes to the end of the invocation order.
    ///
    /// `args` are passed to the callback ahead of any event payload.
    pub fn on(
        &self,
        event_type: &str,
        caller: Caller,
        callback: Callback,
        args: Option<Vec<Arg>>,
    ) -> &Self {
        self.add(event_type, caller, callback, args, false)
    }

    /// Registers a listener for `event_type` that is removed as part of its first invocation.
    ///
    /// Otherwise identical to [`on()`][Self::on].
    pub fn once(
        &self,
        event_type: &str,
        caller: Caller,
        callback: Callback,
        args: Option<Vec<Arg>>,
    ) -> &Self {
        self.add(event_type, caller, callback, args, true)
    }

    /// Removes the listeners for `event_type` that invoke `callback` on behalf of `caller`.
    ///
    /// With [`Caller::none()`], every listener of this event type that invokes `callback` is
    /// removed, whatever its caller. Removing a listener that is not registered does nothing.
    pub fn off(&self, event_type: &str, caller: &Caller, callback: &Callback) -> &Self {
        let removed = self.remove_where(event_type, |handler| {
            handler.is_selected_by(caller, callback, false)
        });

        trace!(event_type, removed, "listeners removed");
        self
    }

    /// Like [`off()`][Self::off] but only removes listeners registered via
    /// [`once()`][Self::once].
    pub fn off_once(&self, event_type: &str, caller: &Caller, callback: &Callback) -> &Self {
        let removed = self.remove_where(event_type, |handler| {
            handler.is_selected_by(caller, callback, true)
        });

        trace!(event_type, removed, "fire-once listeners removed");
        self
    }

    /// Removes all listeners for `event_type` or, given `None`, all listeners of every type.
    pub fn off_all(&self, event_type: Option<&str>) -> &Self {
        let removed: Vec<Entry> = {
            let mut entries = self.entries.borrow_mut();

            match event_type {
                Some(event_type) => entries.remove(event_type).into_iter().collect(),
                None => mem::take(&mut *entries).into_values().collect(),
            }
        };

        let mut count = 0_usize;

        for entry in removed {
            for handler in entry.take_handlers() {
                self.pool.recover(&handler);
                count = count.wrapping_add(1);
            }
        }

        debug!(event_type, removed = count, "all listeners removed");
        self
    }

    /// Removes every listener registered on behalf of `caller`, across all event types.
    ///
    /// Does nothing for [`Caller::none()`].
    pub fn off_all_caller(&self, caller: &Caller) -> &Self {
        if caller.is_none() {
            return self;
        }

        let event_types: Vec<String> = self.entries.borrow().keys().cloned().collect();

        let removed: usize = event_types
            .iter()
            .map(|event_type| self.remove_where(event_type, |handler| handler.has_caller(caller)))
            .sum();

        debug!(removed, "all listeners of caller removed");
        self
    }

    /// Raises an event, invoking every listener for `event_type` with its fixed arguments.
    ///
    /// Returns `false` if no listener was registered for the event type, `true` otherwise.
    pub fn event(&self, event_type: &str) -> bool {
        self.dispatch(event_type, None)
    }

    /// Raises an event, invoking every listener for `event_type` with its fixed arguments
    /// followed by the values of `payload`.
    ///
    /// Returns `false` if no listener was registered for the event type, `true` otherwise.
    pub fn event_with(&self, event_type: &str, payload: impl Into<Payload>) -> bool {
        let payload = payload.into();
        self.dispatch(event_type, Some(&payload))
    }

    fn add(
        &self,
        event_type: &str,
        caller: Caller,
        callback: Callback,
        args: Option<Vec<Arg>>,
        once: bool,
    ) -> &Self {
        self.remove_where(event_type, |handler| handler.is_bound_to(&caller, &callback));

        let handler = self.pool.create(caller, callback, args, once);

        let mut entries = self.entries.borrow_mut();

        if let Some(entry) = entries.get_mut(event_type) {
            entry.push(handler);
        } else {
            entries.insert(event_type.to_owned(), Entry::Single(handler));
        }

        trace!(event_type, once, "listener registered");
        self
    }

    /// Tombstones and recovers every handler of `event_type` selected by `selects`.
    ///
    /// The entry is removed once it no longer has any live handler. Tombstones in a
    /// multi-listener entry are left for the next dispatch pass to compact.
    fn remove_where(&self, event_type: &str, selects: impl Fn(&Handler) -> bool) -> usize {
        let mut removed = Vec::new();

        {
            let mut entries = self.entries.borrow_mut();

            let now_empty = match entries.get(event_type) {
                None | Some(Entry::Empty) => return 0,
                Some(Entry::Single(handler)) => {
                    if selects(handler.as_ref()) {
                        removed.push(Rc::clone(handler));
                    }

                    !removed.is_empty()
                }
                Some(Entry::Many(slots)) => {
                    let mut slots = slots.borrow_mut();

                    for slot in slots.iter_mut() {
                        if slot.as_deref().is_some_and(&selects) {
                            removed.extend(slot.take());
                        }
                    }

                    slots.iter().all(Option::is_none)
                }
            };

            if now_empty {
                entries.remove(event_type);
            }
        }

        for handler in &removed {
            self.pool.recover(handler);
        }

        removed.len()
    }

    fn dispatch(&self, event_type: &str, payload: Option<&Payload>) -> bool {
        let entry = {
            let mut entries = self.entries.borrow_mut();

            let Some(entry) = entries.get(event_type).cloned() else {
                return false;
            };

            // A lone fire-once listener leaves the registry before it runs.
            if matches!(&entry, Entry::Single(handler) if handler.is_once()) {
                entries.remove(event_type);
            }

            entry
        };

        trace!(event_type, listeners = entry.live_count(), "dispatching event");

        match &entry {
            Entry::Empty => {}
            Entry::Single(handler) => self.invoke(handler, payload),
            Entry::Many(slots) => self.dispatch_many(event_type, slots, payload),
        }

        true
    }

    /// Invokes, in registration order, the handlers that were registered when the pass started.
    ///
    /// Listeners may add, remove or dispatch while the pass runs. A handler removed since the
    /// pass started has been recovered, which changed its id, so it is skipped. Handlers added
    /// since then are not part of the pass. Tombstones are compacted once the pass ends.
    fn dispatch_many(&self, event_type: &str, slots: &Slots, payload: Option<&Payload>) {
        let pass: Vec<(Rc<Handler>, u32)> = slots
            .borrow()
            .iter()
            .flatten()
            .map(|handler| (Rc::clone(handler), handler.id()))
            .collect();

        for (handler, id) in &pass {
            if handler.id() != *id {
                continue;
            }

            // Fire-once handlers leave the slots before they run.
            if handler.is_once() {
                tombstone(slots, handler);
            }

            self.invoke(handler, payload);
        }

        let now_empty = {
            let mut slots = slots.borrow_mut();
            slots.retain(Option::is_some);
            slots.is_empty()
        };

        if !now_empty {
            return;
        }

        let mut entries = self.entries.borrow_mut();

        // Listeners may have replaced the entry during the pass; only drop our own.
        let still_registered = matches!(
            entries.get(event_type),
            Some(Entry::Many(current)) if Rc::ptr_eq(current, slots)
        );

        if still_registered {
            entries.remove(event_type);
        }
    }

    fn invoke(&self, handler: &Rc<Handler>, payload: Option<&Payload>) {
        match payload {
            Some(payload) => self.pool.run_with(handler, payload),
            None => self.pool.run(handler),
        }
    }

    #[cfg(test)]
    fn is_single(&self, event_type: &str) -> bool {
        matches!(self.entries.borrow().get(event_type), Some(Entry::Single(_)))
    }

    /// Length of the slot vector, tombstones included. `None` unless the entry holds many.
    #[cfg(test)]
    fn slot_count(&self, event_type: &str) -> Option<usize> {
        match self.entries.borrow().get(event_type) {
            Some(Entry::Many(slots)) => Some(slots.borrow().len()),
            _ => None,
        }
    }
}

/// Replaces the slot holding `handler` with a tombstone.
fn tombstone(slots: &Slots, handler: &Rc<Handler>) {
    let mut slots = slots.borrow_mut();

    let slot = slots
        .iter_mut()
        .find(|slot| slot.as_ref().is_some_and(|current| Rc::ptr_eq(current, handler)));

    if let Some(slot) = slot {
        *slot = None;
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventDispatcher {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();

        f.debug_struct(type_name::<Self>())
            .field(
                "listeners",
                &entries
                    .iter()
                    .map(|(event_type, entry)| (event_type.as_str(), entry.live_count()))
                    .collect::<Vec<_>>(),
            )
            .field("pool", &self.pool)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(EventDispatcher: Send, Sync);

    fn isolated() -> EventDispatcher {
        EventDispatcher::builder()
            .pool(Rc::new(HandlerPool::new()))
            .build()
    }

    fn counting(counter: &Rc<Cell<usize>>) -> Callback {
        let counter = Rc::clone(counter);
        Callback::new(move |_| counter.set(counter.get() + 1))
    }

    #[test]
    fn single_listener_does_not_allocate_slots() {
        let dispatcher = isolated();

        dispatcher.on("a", Caller::none(), Callback::new(|_| {}), None);

        assert!(dispatcher.is_single("a"));
        assert_eq!(dispatcher.slot_count("a"), None);
    }

    #[test]
    fn second_listener_promotes_to_slots() {
        let dispatcher = isolated();

        dispatcher
            .on("a", Caller::none(), Callback::new(|_| {}), None)
            .on("a", Caller::none(), Callback::new(|_| {}), None);

        assert!(!dispatcher.is_single("a"));
        assert_eq!(dispatcher.slot_count("a"), Some(2));
        assert_eq!(dispatcher.listener_count("a"), 2);
    }

    #[test]
    fn reregistering_single_listener_stays_single() {
        let dispatcher = isolated();
        let owner = Rc::new(());
        let callback = Callback::new(|_| {});

        dispatcher
            .on("a", Caller::of(&owner), callback.clone(), None)
            .on("a", Caller::of(&owner), callback, None);

        assert!(dispatcher.is_single("a"));
        assert_eq!(dispatcher.listener_count("a"), 1);
    }

    #[test]
    fn off_leaves_holes_until_next_dispatch() {
        let dispatcher = isolated();
        let counter = Rc::new(Cell::new(0));
        let first = counting(&counter);
        let second = counting(&counter);
        let third = counting(&counter);

        dispatcher
            .on("a", Caller::none(), first, None)
            .on("a", Caller::none(), second.clone(), None)
            .on("a", Caller::none(), third, None);

        dispatcher.off("a", &Caller::none(), &second);

        assert_eq!(dispatcher.slot_count("a"), Some(3));
        assert_eq!(dispatcher.listener_count("a"), 2);

        assert!(dispatcher.event("a"));
        assert_eq!(counter.get(), 2);
        assert_eq!(dispatcher.slot_count("a"), Some(2));
    }

    #[test]
    fn off_removes_entry_when_no_live_slot_remains() {
        let dispatcher = isolated();
        let first = Callback::new(|_| {});
        let second = Callback::new(|_| {});

        dispatcher
            .on("a", Caller::none(), first.clone(), None)
            .on("a", Caller::none(), second.clone(), None);

        dispatcher.off("a", &Caller::none(), &first);
        assert!(dispatcher.has_listener("a"));

        dispatcher.off("a", &Caller::none(), &second);
        assert!(!dispatcher.has_listener("a"));
        assert!(!dispatcher.event("a"));
    }

    #[test]
    fn once_slots_are_compacted_after_firing() {
        let dispatcher = isolated();
        let counter = Rc::new(Cell::new(0));

        dispatcher
            .on("a", Caller::none(), counting(&counter), None)
            .once("a", Caller::none(), counting(&counter), None)
            .on("a", Caller::none(), counting(&counter), None);

        assert!(dispatcher.event("a"));
        assert_eq!(counter.get(), 3);
        assert_eq!(dispatcher.slot_count("a"), Some(2));

        assert!(dispatcher.event("a"));
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn all_once_slots_fired_removes_entry() {
        let dispatcher = isolated();
        let counter = Rc::new(Cell::new(0));

        dispatcher
            .once("a", Caller::none(), counting(&counter), None)
            .once("a", Caller::none(), counting(&counter), None);

        assert!(dispatcher.event("a"));
        assert_eq!(counter.get(), 2);
        assert!(!dispatcher.has_listener("a"));
        assert!(!dispatcher.event("a"));
    }

    #[test]
    fn removed_handlers_go_back_to_pool() {
        let pool = Rc::new(HandlerPool::new());
        let dispatcher = EventDispatcher::builder().pool(Rc::clone(&pool)).build();
        let callback = Callback::new(|_| {});

        dispatcher
            .on("a", Caller::none(), callback.clone(), None)
            .on("b", Caller::none(), Callback::new(|_| {}), None)
            .once("c", Caller::none(), Callback::new(|_| {}), None);
        assert!(pool.is_empty());

        dispatcher.off("a", &Caller::none(), &callback);
        assert_eq!(pool.len(), 1);

        dispatcher.event("c");
        assert_eq!(pool.len(), 2);

        dispatcher.off_all(None);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn dedupe_recycles_replaced_handler() {
        let pool = Rc::new(HandlerPool::new());
        let dispatcher = EventDispatcher::builder().pool(Rc::clone(&pool)).build();
        let owner = Rc::new(());
        let callback = Callback::new(|_| {});

        dispatcher.on("a", Caller::of(&owner), callback.clone(), None);
        dispatcher.on("a", Caller::of(&owner), callback, None);

        // The old handler was recovered and then immediately reused for the new registration.
        assert!(pool.is_empty());
        assert_eq!(dispatcher.listener_count("a"), 1);
    }

    #[test]
    fn nested_dispatch_of_same_type_is_safe() {
        let dispatcher = Rc::new(isolated());
        let counter = Rc::new(Cell::new(0));
        let depth = Rc::new(Cell::new(0));

        let recursive = Callback::new({
            let dispatcher = Rc::downgrade(&dispatcher);
            let depth = Rc::clone(&depth);
            move |_| {
                if depth.get() == 0 {
                    depth.set(1);
                    dispatcher.upgrade().unwrap().event("a");
                }
            }
        });

        dispatcher
            .on("a", Caller::none(), recursive, None)
            .once("a", Caller::none(), counting(&counter), None)
            .on("a", Caller::none(), counting(&counter), None);

        assert!(dispatcher.event("a"));

        // The inner pass ran the once listener and compacted it away; the outer pass must not
        // run it again.
        assert_eq!(counter.get(), 3);
        assert_eq!(dispatcher.listener_count("a"), 2);
    }
}
