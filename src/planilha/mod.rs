//! Spreadsheet extraction (invoice rows and the CFOP mapping sheet) plus
//! the fixed export layout.

mod exportar;
mod mapa_cfop;
mod notas;

pub use exportar::*;
pub use mapa_cfop::*;
pub use notas::*;

use calamine::DataType;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::core::{parse_numero, parse_valor};

/// Cell text with Excel float artifacts flattened (`1933023.0` → `"1933023"`).
pub(crate) fn celula_texto(celula: &DataType) -> String {
    match celula {
        DataType::String(s) => s.trim().to_string(),
        DataType::Empty => String::new(),
        outro => outro.to_string().trim().to_string(),
    }
}

/// Cell value as a monetary number. Comma-bearing strings are treated as
/// pt-BR locale numbers; plain strings as dot-decimal.
pub(crate) fn celula_decimal(celula: &DataType) -> Decimal {
    match celula {
        DataType::Float(f) => Decimal::from_f64(*f).unwrap_or(Decimal::ZERO),
        DataType::Int(i) => Decimal::from(*i),
        DataType::String(s) => {
            if s.contains(',') {
                parse_valor(s)
            } else {
                parse_numero(s)
            }
        }
        _ => Decimal::ZERO,
    }
}
