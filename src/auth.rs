//! Identity domain: identifiers, claims-based principals, and authentication states.

pub mod id;
pub mod principal;
pub mod state;

pub use id::*;
pub use principal::*;
pub use state::*;
