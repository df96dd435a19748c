//! Type definitions

pub mod assignment;
pub mod request;
pub mod route;

pub use assignment::*;
pub use request::*;
pub use route::*;
