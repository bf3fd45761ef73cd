//! Canonical record model, error taxonomy, and value coercion.

mod coercao;
mod error;
mod types;

pub use coercao::*;
pub use error::*;
pub use types::*;
