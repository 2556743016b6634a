use std::any::{Any, type_name};
use std::fmt;
use std::rc::{Rc, Weak};

/// The object a listener is registered on behalf of.
///
/// A caller is a non-owning reference: registering a listener never keeps the caller alive.
/// The dispatcher uses it for two purposes only:
///
/// * to tell listeners apart - two callers are equal when they point to the same allocation
///   (or when both are [`Caller::none()`]),
/// * to hand the object back to the callback at invocation time via [`Call::caller()`][1].
///
/// # Example
///
/// ```
/// use std::rc::Rc;
///
/// use listeners::Caller;
///
/// let player = Rc::new("player one".to_string());
///
/// let a = Caller::of(&player);
/// let b = Caller::of(&player);
/// assert_eq!(a, b);
/// assert_ne!(a, Caller::none());
///
/// drop(player);
/// assert!(a.upgrade::<String>().is_none());
/// ```
///
/// [1]: crate::Call::caller
#[derive(Clone, Default)]
pub struct Caller {
    target: Option<Weak<dyn Any>>,
}

impl Caller {
    /// A caller that refers to no object.
    ///
    /// Listeners registered with no caller only match removals that also specify no caller
    /// or that match any caller.
    #[must_use]
    pub const fn none() -> Self {
        Self { target: None }
    }

    /// Creates a caller that refers to the object behind `target` without keeping it alive.
    #[must_use]
    pub fn of<T>(target: &Rc<T>) -> Self
    where
        T: Any,
    {
        let target: Weak<T> = Rc::downgrade(target);

        Self {
            target: Some(target),
        }
    }

    /// Whether this is [`Caller::none()`].
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.target.is_none()
    }

    /// Whether the referenced object still exists.
    ///
    /// Always `false` for [`Caller::none()`].
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.target
            .as_ref()
            .is_some_and(|target| target.strong_count() > 0)
    }

    /// Obtains a strong reference to the referenced object, if it still exists and is a `T`.
    #[must_use]
    pub fn upgrade<T>(&self) -> Option<Rc<T>>
    where
        T: Any,
    {
        self.target.as_ref()?.upgrade()?.downcast::<T>().ok()
    }

    /// Whether a removal request naming `self` applies to a listener bound to `other`.
    ///
    /// [`Caller::none()`] acts as a wildcard here.
    pub(crate) fn selects(&self, other: &Self) -> bool {
        self.is_none() || self == other
    }
}

impl PartialEq for Caller {
    fn eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (None, None) => true,
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Caller {}

impl fmt::Debug for Caller {
    #[cfg_attr(test, mutants::skip)] // No API contract for debug output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("target", &self.target.as_ref().map(Weak::as_ptr))
            .field("alive", &self.is_alive())
            .finish()
    }
}
