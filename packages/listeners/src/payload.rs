use std::any::Any;
use std::rc::Rc;
use std::slice;

/// A single argument passed to a listener.
///
/// Arguments are reference-counted so the same value can be handed to any number of listeners
/// without copying. Use [`arg()`] to create one.
pub type Arg = Rc<dyn Any>;

/// Wraps a value as an [`Arg`].
///
/// # Example
///
/// ```
/// use listeners::arg;
///
/// let damage = arg(10_i32);
/// assert_eq!(damage.downcast_ref::<i32>(), Some(&10));
/// ```
#[must_use]
pub fn arg<T>(value: T) -> Arg
where
    T: Any,
{
    Rc::new(value)
}

/// The runtime data passed along with an event, after the fixed arguments of each listener.
///
/// [`Payload::One`] becomes exactly one extra argument. [`Payload::Many`] is spread, each of
/// its values becoming a separate argument. A list that should reach the listener as a single
/// argument must therefore be wrapped, either as `Payload::One(arg(list))` or as a
/// one-element [`Payload::Many`].
///
/// # Example
///
/// ```
/// use listeners::{Payload, arg};
///
/// // Two arguments.
/// let spread = Payload::from(vec![arg(1_u32), arg(2_u32)]);
/// assert_eq!(spread.len(), 2);
///
/// // One argument that happens to be a list.
/// let wrapped = Payload::One(arg(vec![1_u32, 2_u32]));
/// assert_eq!(wrapped.len(), 1);
/// ```
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Payload {
    /// A single argument.
    One(Arg),

    /// Any number of arguments, passed to the listener in order.
    Many(Vec<Arg>),
}

impl Payload {
    /// The payload values in the order they are passed to listeners.
    #[must_use]
    pub fn values(&self) -> &[Arg] {
        match self {
            Self::One(value) => slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// The number of arguments this payload contributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether this payload contributes no arguments.
    ///
    /// Only an empty [`Payload::Many`] is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }
}

impl From<Arg> for Payload {
    fn from(value: Arg) -> Self {
        Self::One(value)
    }
}

impl From<Vec<Arg>> for Payload {
    fn from(values: Vec<Arg>) -> Self {
        Self::Many(values)
    }
}
