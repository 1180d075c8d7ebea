//! Playback controller and the observer protocol used to publish its state.

mod controller;
mod observer;
mod ticker;

pub use controller::*;
pub use observer::*;

#[cfg(test)]
mod tests;
