use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::{Arg, Callback, Caller};

/// One registered listener: a caller, a callback and optional fixed arguments.
///
/// Handlers are created and recycled by a [`HandlerPool`][1] and are never constructed directly.
/// While a handler is registered it is *active* and carries a non-zero [`id()`][2]. Once it
/// is returned to the pool, its references are cleared and its id becomes zero, until the pool
/// hands it out again for a new registration.
///
/// Because instances are reused, holding on to an `Rc<Handler>` does not pin down what it
/// refers to. Compare the [`id()`][2] before and after an operation to detect reuse.
///
/// [1]: crate::HandlerPool
/// [2]: Self::id
pub struct Handler {
    binding: RefCell<Binding>,

    // Zero while pooled.
    id: Cell<u32>,
}

#[derive(Default)]
struct Binding {
    caller: Caller,
    method: Option<Callback>,
    args: Option<Rc<[Arg]>>,
    once: bool,
}

impl Handler {
    pub(crate) fn new() -> Self {
        Self {
            binding: RefCell::new(Binding::default()),
            id: Cell::new(0),
        }
    }

    pub(crate) fn set_to(
        &self,
        id: u32,
        caller: Caller,
        method: Callback,
        args: Option<Rc<[Arg]>>,
        once: bool,
    ) {
        debug_assert_ne!(id, 0, "active handlers must have a non-zero id");

        let previous = self.binding.replace(Binding {
            caller,
            method: Some(method),
            args,
            once,
        });
        self.id.set(id);

        // Captures of the old callback may run arbitrary code on drop, so no borrow is held.
        drop(previous);
    }

    /// Clears all references and marks the handler as pooled.
    pub(crate) fn clear(&self) {
        self.id.set(0);
        let previous = self.binding.take();
        drop(previous);
    }

    /// The liveness marker: non-zero while the handler is registered, zero while pooled.
    ///
    /// Each registration receives a new id, so a changed id means the handler was recycled
    /// (and possibly reused) in the meantime.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id.get()
    }

    /// Whether the handler is currently in use by a registration.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.id.get() != 0
    }

    /// Whether the handler removes itself after its first invocation.
    #[must_use]
    pub fn is_once(&self) -> bool {
        self.binding.borrow().once
    }

    /// The caller the handler is bound to. [`Caller::none()`] while pooled.
    #[must_use]
    pub fn caller(&self) -> Caller {
        self.binding.borrow().caller.clone()
    }

    /// The callback the handler invokes. `None` while pooled.
    #[must_use]
    pub fn method(&self) -> Option<Callback> {
        self.binding.borrow().method.clone()
    }

    /// The fixed arguments passed ahead of any payload. `None` if there are none.
    #[must_use]
    pub fn args(&self) -> Option<Rc<[Arg]>> {
        self.binding.borrow().args.clone()
    }

    /// Everything needed to invoke the handler, cloned out so that no borrow is held while the
    /// callback runs. `None` while pooled.
    pub(crate) fn snapshot(&self) -> Option<(Caller, Callback, Option<Rc<[Arg]>>)> {
        let binding = self.binding.borrow();
        let method = binding.method.clone()?;

        Some((binding.caller.clone(), method, binding.args.clone()))
    }

    /// Whether the handler is bound to exactly this `(caller, method)` pair.
    pub(crate) fn is_bound_to(&self, caller: &Caller, method: &Callback) -> bool {
        let binding = self.binding.borrow();

        binding.caller == *caller && binding.method.as_ref() == Some(method)
    }

    pub(crate) fn has_caller(&self, caller: &Caller) -> bool {
        self.binding.borrow().caller == *caller
    }

    /// Whether a removal request for `(caller, method)` applies to this handler.
    ///
    /// A [`Caller::none()`] request applies regardless of the handler's caller. With
    /// `once_only`, only fire-once handlers are selected.
    pub(crate) fn is_selected_by(
        &self,
        caller: &Caller,
        method: &Callback,
        once_only: bool,
    ) -> bool {
        let binding = self.binding.borrow();

        caller.selects(&binding.caller)
            && binding.method.as_ref() == Some(method)
            && (!once_only || binding.once)
    }
}

impl fmt::Debug for Handler {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let binding = self.binding.borrow();

        f.debug_struct(type_name::<Self>())
            .field("id", &self.id.get())
            .field("caller", &binding.caller)
            .field("method", &binding.method)
            .field("args", &binding.args.as_ref().map(|args| args.len()))
            .field("once", &binding.once)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::arg;

    assert_not_impl_any!(Handler: Send, Sync);

    #[test]
    fn new_handler_is_pooled() {
        let handler = Handler::new();

        assert!(!handler.is_active());
        assert_eq!(handler.id(), 0);
        assert!(handler.method().is_none());
        assert!(handler.snapshot().is_none());
    }

    #[test]
    fn set_to_then_clear() {
        let owner = Rc::new(1_u8);
        let callback = Callback::new(|_| {});
        let handler = Handler::new();

        handler.set_to(
            5,
            Caller::of(&owner),
            callback.clone(),
            Some(Rc::from(vec![arg(1_u8)])),
            true,
        );

        assert!(handler.is_active());
        assert_eq!(handler.id(), 5);
        assert!(handler.is_once());
        assert_eq!(handler.caller(), Caller::of(&owner));
        assert_eq!(handler.method(), Some(callback.clone()));
        assert_eq!(handler.args().map(|args| args.len()), Some(1));
        assert!(handler.is_bound_to(&Caller::of(&owner), &callback));

        handler.clear();

        assert!(!handler.is_active());
        assert!(!handler.is_once());
        assert!(handler.caller().is_none());
        assert!(handler.method().is_none());
        assert!(handler.args().is_none());
        assert!(!handler.is_bound_to(&Caller::of(&owner), &callback));
    }

    #[test]
    fn clear_releases_captures() {
        let captured = Rc::new(());
        let callback = Callback::new({
            let captured = Rc::clone(&captured);
            move |_| drop(Rc::clone(&captured))
        });

        let handler = Handler::new();
        handler.set_to(1, Caller::none(), callback, None, false);
        assert_eq!(Rc::strong_count(&captured), 2);

        handler.clear();
        assert_eq!(Rc::strong_count(&captured), 1);
    }

    #[test]
    fn selection_rules() {
        let owner = Rc::new(1_u8);
        let other = Rc::new(2_u8);
        let callback = Callback::new(|_| {});
        let unrelated = Callback::new(|_| {});

        let handler = Handler::new();
        handler.set_to(1, Caller::of(&owner), callback.clone(), None, false);

        assert!(handler.is_selected_by(&Caller::of(&owner), &callback, false));
        assert!(handler.is_selected_by(&Caller::none(), &callback, false));
        assert!(!handler.is_selected_by(&Caller::of(&other), &callback, false));
        assert!(!handler.is_selected_by(&Caller::of(&owner), &unrelated, false));
        assert!(!handler.is_selected_by(&Caller::of(&owner), &callback, true));

        handler.set_to(2, Caller::of(&owner), callback.clone(), None, true);
        assert!(handler.is_selected_by(&Caller::of(&owner), &callback, true));
    }
}
