//! Route middleware.

pub mod delay;

pub use delay::{delay_middleware, Delay};
