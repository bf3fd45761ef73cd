use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Canonical invoice record: the shape every extractor produces and every
/// consumer reads.
///
/// Field names serialize in the external service's camelCase convention
/// (`dataEmissao`, `numeroNota`, `inssRetid`, …). Dates are ISO-8601 strings;
/// when a source date cannot be parsed the raw source text is carried
/// through unchanged. Monetary fields are [`Decimal`] and default to zero;
/// they are never absent and can never be NaN.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotaFiscal {
    /// Operation-nature text or code (primary classification key).
    pub natureza: String,
    /// Emission timestamp, ISO-8601.
    pub data_emissao: String,
    /// Entry timestamp, ISO-8601.
    pub data_entrada: String,
    /// Invoice number (or RPS number when no NFSe number was assigned).
    pub numero_nota: String,
    /// Issuer/taker tax id (CNPJ/CPF), digits only when normalized.
    pub inscricao_federal: String,
    /// Issuer/taker legal name.
    pub razao_social: String,
    /// Raw operation code as found in the source document.
    pub cfop: String,
    /// Resolved operation code (classification output).
    pub cfop_natureza: String,
    /// Target accounting table code.
    pub tabela_ctb: String,
    /// Ledger account code. Populated only from the CFOP mapping,
    /// never from natureza classification.
    pub conta_contabil: String,
    /// Gross amount.
    pub valor_principal: Decimal,
    /// Social-security withholding (INSS).
    pub inss_retid: Decimal,
    /// Municipal-service withholding (ISS).
    pub iss_retid: Decimal,
    /// Federal contribution withholding (PIS).
    pub pis_retid: Decimal,
    /// Federal contribution withholding (COFINS).
    pub cofins_retid: Decimal,
    /// Social-contribution withholding (CSLL).
    pub cs_retid: Decimal,
    /// Income-tax withholding (IR).
    pub ir_retid: Decimal,
    /// Net amount.
    pub valor_liquido: Decimal,
    /// Spreadsheet columns with no mapped field, carried through as-is.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

/// Partial record produced by the free-text extractors.
///
/// Every field is optional; a parser only sets what it actually found.
/// Taker-side identity fields are kept separate here; the response
/// normalizer folds them into [`NotaFiscal`] with taker priority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotaParcial {
    pub natureza: Option<String>,
    pub data_emissao: Option<String>,
    pub numero_nota: Option<String>,
    pub inscricao_federal: Option<String>,
    pub razao_social: Option<String>,
    pub inscricao_federal_tomador: Option<String>,
    pub razao_social_tomador: Option<String>,
    pub cfop: Option<String>,
    pub cfop_natureza: Option<String>,
    pub valor_principal: Option<Decimal>,
    pub valor_liquido: Option<Decimal>,
    pub inss_retid: Option<Decimal>,
    pub ir_retid: Option<Decimal>,
    pub pis_retid: Option<Decimal>,
    pub cofins_retid: Option<Decimal>,
    pub cs_retid: Option<Decimal>,
    pub iss_retid: Option<Decimal>,
}

impl NotaParcial {
    /// True when the parser extracted nothing at all.
    pub fn esta_vazia(&self) -> bool {
        *self == Self::default()
    }
}
