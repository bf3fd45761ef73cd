//! Tolerant coercion of source values: locale-formatted money, loosely
//! formatted dates, and tax ids with punctuation.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

static RE_NAO_DIGITOS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9]").unwrap());

/// Parse pt-BR monetary text into a [`Decimal`] (e.g. `"1.234,56"` → `1234.56`).
///
/// Thousands dots are stripped and the decimal comma becomes a dot. Empty or
/// non-numeric input yields zero, never an error.
pub fn parse_valor(texto: &str) -> Decimal {
    let limpo: String = texto
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if limpo.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(&limpo).unwrap_or(Decimal::ZERO)
}

/// Parse dot-decimal numeric text as found in XML documents
/// (e.g. `"1234.56"`). Absent or malformed input yields zero.
pub fn parse_numero(texto: &str) -> Decimal {
    Decimal::from_str(texto.trim()).unwrap_or(Decimal::ZERO)
}

/// Coerce an arbitrary JSON value into a [`Decimal`].
///
/// Numbers pass through, strings go through [`parse_valor`], everything
/// else (null, booleans, arrays, objects) yields zero.
pub fn coagir_numero(valor: &Value) -> Decimal {
    match valor {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64().and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(s) => parse_valor(s),
        _ => Decimal::ZERO,
    }
}

/// Coerce an arbitrary JSON value into field text.
///
/// Integral numbers render without a fractional part so numeric service
/// codes (`101`) keep their classification-table spelling.
pub fn coagir_texto(valor: &Value) -> String {
    match valor {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Strip formatting from a CNPJ/CPF, keeping digits only.
pub fn normalizar_inscricao(texto: &str) -> String {
    RE_NAO_DIGITOS.replace_all(texto, "").into_owned()
}

/// Normalize a source timestamp into an ISO-8601 string.
///
/// Accepts RFC 3339 with offset (NFe `dhEmi`), naive `YYYY-MM-DDTHH:MM:SS`
/// (NFSe `DataEmissao`), and bare dates. Anything else is returned as-is so
/// a garbled source value is still visible downstream.
pub fn normalizar_data_iso(texto: &str) -> String {
    let texto = texto.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(texto) {
        return dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(texto, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%dT%H:%M:%S").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(texto, "%Y-%m-%d") {
        return d.format("%Y-%m-%dT00:00:00").to_string();
    }
    texto.to_string()
}

/// Build an ISO timestamp from a dd/mm/yyyy reading, with optional time.
///
/// Returns `None` for impossible dates (e.g. 31/02).
pub fn iso_de_dma(dia: u32, mes: u32, ano: i32, hora: Option<(u32, u32, u32)>) -> Option<String> {
    let data = NaiveDate::from_ymd_opt(ano, mes, dia)?;
    let (h, m, s) = hora.unwrap_or((0, 0, 0));
    let dt = data.and_hms_opt(h, m, s)?;
    Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

/// Format an ISO timestamp as a pt-BR display date (`dd/mm/yyyy`).
///
/// Unparseable input passes through unchanged; empty stays empty.
pub fn formatar_data_ptbr(iso: &str) -> String {
    let iso = iso.trim();
    if iso.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return dt.format("%d/%m/%Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%d/%m/%Y").to_string();
    }
    if let Ok(d) = NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        return d.format("%d/%m/%Y").to_string();
    }
    iso.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn valor_com_milhar_e_virgula() {
        assert_eq!(parse_valor("1.234,56"), dec!(1234.56));
        assert_eq!(parse_valor("1.150,00"), dec!(1150.00));
    }

    #[test]
    fn valor_vazio_ou_invalido_vira_zero() {
        assert_eq!(parse_valor(""), Decimal::ZERO);
        assert_eq!(parse_valor("   "), Decimal::ZERO);
        assert_eq!(parse_valor("abc"), Decimal::ZERO);
    }

    #[test]
    fn coercao_json() {
        assert_eq!(coagir_numero(&json!("1.000,50")), dec!(1000.50));
        assert_eq!(coagir_numero(&json!(12.5)), dec!(12.5));
        assert_eq!(coagir_numero(&json!(7)), dec!(7));
        assert_eq!(coagir_numero(&Value::Null), Decimal::ZERO);
        assert_eq!(coagir_numero(&json!({"x": 1})), Decimal::ZERO);
    }

    #[test]
    fn texto_de_codigo_numerico() {
        assert_eq!(coagir_texto(&json!(101)), "101");
        assert_eq!(coagir_texto(&json!("101")), "101");
        assert_eq!(coagir_texto(&Value::Null), "");
    }

    #[test]
    fn inscricao_somente_digitos() {
        assert_eq!(normalizar_inscricao("12.345.678/0001-90"), "12345678000190");
        assert_eq!(normalizar_inscricao(""), "");
    }

    #[test]
    fn data_rfc3339_vira_utc() {
        assert_eq!(
            normalizar_data_iso("2024-05-10T14:30:00-03:00"),
            "2024-05-10T17:30:00.000Z"
        );
    }

    #[test]
    fn data_naive_preservada() {
        assert_eq!(
            normalizar_data_iso("2024-05-10T14:30:00"),
            "2024-05-10T14:30:00"
        );
        assert_eq!(normalizar_data_iso("2024-05-10"), "2024-05-10T00:00:00");
    }

    #[test]
    fn data_ilegivel_passa_adiante() {
        assert_eq!(normalizar_data_iso("10/05/2024?"), "10/05/2024?");
    }

    #[test]
    fn dma_invalido_e_none() {
        assert!(iso_de_dma(31, 2, 2024, None).is_none());
        assert_eq!(
            iso_de_dma(5, 3, 2024, Some((8, 15, 0))).as_deref(),
            Some("2024-03-05T08:15:00")
        );
    }

    #[test]
    fn formato_ptbr() {
        assert_eq!(formatar_data_ptbr("2024-03-05T08:15:00"), "05/03/2024");
        assert_eq!(formatar_data_ptbr(""), "");
        assert_eq!(formatar_data_ptbr("sem data"), "sem data");
    }
}
