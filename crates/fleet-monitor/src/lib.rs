#![doc = include_str!("../README.md")]

mod alert;
mod distance;
mod error;
mod policy;
#[cfg(feature = "producer")]
mod producer;
mod sample;
mod session;
mod tracker;

pub use crate::alert::*;
pub use crate::distance::*;
pub use crate::error::*;
pub use crate::policy::*;
#[cfg(feature = "producer")]
pub use crate::producer::*;
pub use crate::sample::*;
pub use crate::session::*;
pub use crate::tracker::*;
