mod cluster;
mod error;
mod gb;
mod jac;
mod modal;
mod network;
mod rank;
mod select;
mod study;

pub mod debug;

pub use cluster::*;
pub use error::*;
pub use gb::*;
pub use jac::*;
pub use modal::*;
pub use network::*;
pub use rank::*;
pub use select::*;
pub use study::*;

#[cfg(test)]
mod tests;
