//! Request handlers, one module per resource.

pub mod calls;
pub mod stubs;
pub mod system;
