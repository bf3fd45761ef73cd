//! Boundary with the external extraction service: the retry dispatch
//! queue, reply normalization, and bulk export.

mod exportar;
mod fila;
mod normalizar;

pub use exportar::*;
pub use fila::*;
pub use normalizar::*;
