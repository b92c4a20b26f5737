//! Domain model module declarations.

pub mod breakpoint;
pub mod frame;
pub mod session;
