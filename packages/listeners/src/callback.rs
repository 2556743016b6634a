use std::any::type_name;
use std::fmt;
use std::rc::Rc;

use crate::Call;

/// A function that can be registered as a listener.
///
/// Callbacks are compared by identity, not by behavior: clones of the same callback are equal
/// to each other, while two callbacks created by separate [`Callback::new()`] calls are not.
/// Keep a clone around if you intend to remove the listener later.
///
/// # Example
///
/// ```
/// use listeners::Callback;
///
/// let on_tick = Callback::new(|call| println!("tick with {} arguments", call.len()));
/// let same = on_tick.clone();
/// let different = Callback::new(|call| println!("tick with {} arguments", call.len()));
///
/// assert_eq!(on_tick, same);
/// assert_ne!(on_tick, different);
/// ```
#[derive(Clone)]
pub struct Callback {
    function: Rc<dyn Fn(&Call<'_>)>,
}

impl Callback {
    /// Wraps a function so it can be registered with an [`EventDispatcher`][1].
    ///
    /// [1]: crate::EventDispatcher
    #[must_use]
    pub fn new(function: impl Fn(&Call<'_>) + 'static) -> Self {
        Self {
            function: Rc::new(function),
        }
    }

    pub(crate) fn invoke(&self, call: &Call<'_>) {
        (self.function)(call);
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.function, &other.function)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("function", &Rc::as_ptr(&self.function))
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;

    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Caller;

    assert_not_impl_any!(Callback: Send, Sync);

    #[test]
    fn clones_are_equal() {
        let callback = Callback::new(|_| {});

        assert_eq!(callback, callback.clone());
    }

    #[test]
    fn separately_created_are_not_equal() {
        let a = Callback::new(|_| {});
        let b = Callback::new(|_| {});

        assert_ne!(a, b);
    }

    #[test]
    fn invoke_runs_function() {
        let counter = Rc::new(Cell::new(0));
        let callback = Callback::new({
            let counter = Rc::clone(&counter);
            move |call| counter.set(counter.get() + call.len())
        });

        let caller = Caller::none();
        callback.invoke(&Call::new(&caller, &[]));
        assert_eq!(counter.get(), 0);

        let args = [crate::arg(1_u8), crate::arg(2_u8)];
        callback.invoke(&Call::new(&caller, &args));
        assert_eq!(counter.get(), 2);
    }
}
