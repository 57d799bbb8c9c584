//! The dispatching layer on top of a [`Connection`](crate::Connection).


pub use self::bus::{Bus, Subscription};
mod bus;

mod dispatch;

mod standard;
