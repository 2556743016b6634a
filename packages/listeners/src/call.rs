use std::any::{Any, type_name};
use std::rc::Rc;

use crate::{Arg, Caller, Error, Result};

/// What a listener receives when it is invoked: its caller and the merged argument list.
///
/// The argument list consists of the fixed arguments given at registration time followed by
/// the values of the event payload, if any.
///
/// # Example
///
/// ```
/// use listeners::{Callback, Caller, EventDispatcher, arg};
///
/// let dispatcher = EventDispatcher::new();
///
/// let on_score = Callback::new(|call| {
///     let player = call.arg::<&str>(0).unwrap();
///     let points = call.arg::<u32>(1).unwrap();
///     println!("{player} scored {points}");
///
///     assert!(call.arg::<u32>(2).is_err());
/// });
///
/// dispatcher.on("score", Caller::none(), on_score, Some(vec![arg("alice")]));
/// dispatcher.event_with("score", arg(3_u32));
/// ```
#[derive(Debug)]
pub struct Call<'a> {
    caller: &'a Caller,
    args: &'a [Arg],
}

impl<'a> Call<'a> {
    pub(crate) fn new(caller: &'a Caller, args: &'a [Arg]) -> Self {
        Self { caller, args }
    }

    /// The object the listener was registered for, if it still exists and is a `T`.
    #[must_use]
    pub fn caller<T>(&self) -> Option<Rc<T>>
    where
        T: Any,
    {
        self.caller.upgrade()
    }

    /// The caller handle the listener was registered with.
    #[must_use]
    pub fn caller_ref(&self) -> &'a Caller {
        self.caller
    }

    /// All arguments, fixed arguments first.
    #[must_use]
    pub fn args(&self) -> &'a [Arg] {
        self.args
    }

    /// The number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether the listener received no arguments at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// The argument at `index`, as a `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] if there is no argument at `index` and
    /// [`Error::ArgumentTypeMismatch`] if the argument is not a `T`.
    pub fn arg<T>(&self, index: usize) -> Result<&'a T>
    where
        T: Any,
    {
        let value = self.args.get(index).ok_or(Error::MissingArgument {
            index,
            len: self.args.len(),
        })?;

        (**value)
            .downcast_ref::<T>()
            .ok_or(Error::ArgumentTypeMismatch {
                index,
                expected: type_name::<T>(),
            })
    }
}
