//! Enemies reacting to game events through a shared dispatcher.
//!
//! Demonstrates fixed arguments, runtime payloads, fire-once listeners and listeners that
//! remove themselves from the dispatcher while an event is being dispatched.

use std::cell::Cell;
use std::rc::Rc;

use listeners::{Callback, Caller, EventDispatcher, arg};

struct Enemy {
    name: &'static str,
    health: Cell<i32>,
}

fn main() {
    println!("=== Listeners Game Example ===");

    let dispatcher = Rc::new(EventDispatcher::new());

    let goblin = Rc::new(Enemy {
        name: "goblin",
        health: Cell::new(30),
    });
    let troll = Rc::new(Enemy {
        name: "troll",
        health: Cell::new(100),
    });

    // Fixed argument: base damage. Optional payload: a damage multiplier.
    let take_damage = Callback::new({
        let dispatcher = Rc::downgrade(&dispatcher);
        move |call| {
            let Some(enemy) = call.caller::<Enemy>() else {
                return;
            };

            let base = call.arg::<i32>(0).copied().unwrap_or(0);
            let multiplier = call.arg::<i32>(1).copied().unwrap_or(1);
            enemy.health.set(enemy.health.get() - base * multiplier);

            println!("{} has {} health left", enemy.name, enemy.health.get());

            if enemy.health.get() <= 0 {
                println!("{} is defeated", enemy.name);

                if let Some(dispatcher) = dispatcher.upgrade() {
                    dispatcher.off_all_caller(call.caller_ref());
                }
            }
        }
    });

    dispatcher
        .on(
            "hit",
            Caller::of(&goblin),
            take_damage.clone(),
            Some(vec![arg(10_i32)]),
        )
        .on("hit", Caller::of(&troll), take_damage, Some(vec![arg(10_i32)]))
        .once(
            "hit",
            Caller::none(),
            Callback::new(|_| println!("first blood!")),
            None,
        );

    dispatcher.event("hit");
    dispatcher.event_with("hit", arg(2_i32));

    println!(
        "listeners for 'hit' after two rounds: {}",
        dispatcher.listener_count("hit")
    );

    dispatcher.off_all(None);
    println!("Example completed successfully!");
}
