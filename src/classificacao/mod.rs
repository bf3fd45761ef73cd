//! Classification: natureza-da-operação resolution and CFOP-mapping
//! application.

mod cfop;
mod natureza;

pub use cfop::*;
pub use natureza::*;
