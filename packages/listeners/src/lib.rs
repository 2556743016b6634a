#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Synchronous dispatch of named events to registered listeners.
//!
//! An [`EventDispatcher`] maps event types (plain strings) to an ordered set of listeners.
//! Raising an event invokes every listener for that type, in registration order, before the
//! call returns. There is no queueing and no cross-thread delivery.
//!
//! Each listener is a [`Handler`] that binds three things together:
//!
//! * a [`Caller`] - a non-owning reference to the object the listener acts on behalf of,
//! * a [`Callback`] - the function to invoke, compared by identity,
//! * optional fixed arguments that are passed ahead of any runtime payload.
//!
//! Handlers are recycled through a [`HandlerPool`] so that registering and removing listeners
//! in a steady state does not allocate.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use listeners::{Callback, Caller, EventDispatcher, arg};
//!
//! struct Enemy {
//!     health: Cell<i32>,
//! }
//!
//! let dispatcher = EventDispatcher::new();
//! let enemy = Rc::new(Enemy {
//!     health: Cell::new(100),
//! });
//!
//! let take_damage = Callback::new(|call| {
//!     let enemy = call.caller::<Enemy>().unwrap();
//!     let damage = call.arg::<i32>(0).unwrap();
//!     enemy.health.set(enemy.health.get() - damage);
//! });
//!
//! dispatcher.on("hit", Caller::of(&enemy), take_damage, Some(vec![arg(10)]));
//!
//! assert!(dispatcher.event("hit"));
//! assert_eq!(enemy.health.get(), 90);
//! ```
//!
//! # Listener identity
//!
//! A `(caller, callback)` pair is registered at most once per event type. Registering the same
//! pair again replaces the earlier registration, including its fixed arguments and once-flag.
//! Clone a [`Callback`] to register the same function in several places; two callbacks created
//! by separate calls to [`Callback::new()`] are never equal, even if built from the same closure.
//!
//! # Fire-once listeners
//!
//! Listeners registered via [`EventDispatcher::once()`] are removed as part of their first
//! invocation and their handler goes straight back to the pool.
//!
//! # Mutating the dispatcher from a listener
//!
//! Listeners may register and remove listeners, including for the event type currently being
//! dispatched. Hold the dispatcher in an [`Rc`][std::rc::Rc] (or a weak reference) to reach it
//! from inside a callback. The dispatch pass in progress follows these rules:
//!
//! * listeners added during the pass are not invoked by that pass,
//! * listeners removed during the pass are not invoked by that pass if they had not run yet,
//! * the next dispatch observes every change.
//!
//! Raising the same event type again from a listener starts a nested pass under the same rules.
//!
//! # Payloads
//!
//! [`EventDispatcher::event()`] passes only the fixed arguments of each handler.
//! [`EventDispatcher::event_with()`] appends a [`Payload`]: a single value becomes one extra
//! argument while a list of values is spread into several. To pass one argument that is itself
//! a list, wrap it in a single value.
//!
//! # Thread safety
//!
//! All types in this crate are single-threaded. The default handler pool is shared by all
//! dispatchers on the same thread.

mod call;
mod callback;
mod caller;
mod dispatcher;
mod dispatcher_builder;
mod error;
mod handler;
mod payload;
mod pool;
mod pool_builder;

pub use call::*;
pub use callback::*;
pub use caller::*;
pub use dispatcher::*;
pub use dispatcher_builder::*;
pub use error::*;
pub use handler::*;
pub use payload::*;
pub use pool::*;
pub use pool_builder::*;
