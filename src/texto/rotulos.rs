//! Label-tolerant text scanning shared by the municipality parsers.
//!
//! Labels in OCR-recovered text arrive with inconsistent accents,
//! separators, and line breaks ("Razão Social:", "Razao Social -",
//! "Razéo Social" on one line with the value on the next). The patterns
//! here absorb those variations; values are captured on the label line
//! and, failing that, read from the next non-empty line.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{iso_de_dma, normalizar_inscricao};

/// First dd/mm/yyyy occurrence, with optional hh:mm:ss.
pub(crate) static RE_DATA_HORA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-3]\d/[01]\d/\d{4})(?:\s+(\d{2}:\d{2}:\d{2}))?").unwrap()
});

/// Legal-name labels: "Nome/Razão Social", "Razao Social", OCR slips like
/// "Razéo Social", and "Nome Fantasia".
pub(crate) static RE_RAZAO_SOCIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Nome\s*[/\\\-–]?\s*Raz[ãaáàâäe][o0óòôö]?\s*Social|Raz[ãaáàâäe][o0óòôö]?\s*Social|Nome\s*Fantasia)\s*[:\-–]?\s*([^\r\n]+)",
    )
    .unwrap()
});

/// Tax-id labels in every observed combination; the value class accepts
/// digits with punctuation and may continue on the following line.
pub(crate) static RE_CPF_CNPJ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:CPF\s*[/\\\-–]?\s*CNPJ|CNPJ\s*[/\\\-–]?\s*CPF|CNPJ/CPF|CPF/CNPJ|CNPJ|CPF|CPFCNPJ)\s*[:\-–]?\s*([\d./\-\s]+)",
    )
    .unwrap()
});

pub(crate) static RE_PRESTADOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PRESTADOR DE SERVI[ÇC]OS").unwrap());

pub(crate) static RE_TOMADOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TOMADOR DE SERVI[ÇC]OS").unwrap());

pub(crate) static RE_VALOR_LIQUIDO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VALOR L[IÍ]QUIDO DA NOTA\s*R\$\s*([\d.,]+)").unwrap());

/// Slice the text after the first `inicio` match, stopping at the first
/// `fim` match when one is given. `None` when `inicio` never matches.
pub(crate) fn fatiar_entre<'t>(
    texto: &'t str,
    inicio: &Regex,
    fim: Option<&Regex>,
) -> Option<&'t str> {
    let comeco = inicio.find(texto)?;
    let resto = &texto[comeco.end()..];
    match fim.and_then(|f| f.find(resto)) {
        Some(parada) => Some(&resto[..parada.start()]),
        None => Some(resto),
    }
}

/// Capture the value after a label. When nothing usable follows on the
/// label's own line, the next non-empty line is used instead.
pub(crate) fn capturar_apos_rotulo(texto: &str, rotulo: &Regex) -> Option<String> {
    let capturas = rotulo.captures(texto)?;
    let valor = capturas
        .get(1)
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    if !valor.is_empty() {
        return Some(valor.to_string());
    }
    let inicio = capturas.get(0)?.start();
    texto[inicio..]
        .lines()
        .map(str::trim)
        .filter(|linha| !linha.is_empty())
        .nth(1)
        .map(str::to_string)
}

/// Legal name and normalized tax id from a provider/taker block.
pub(crate) fn extrair_identidade(bloco: &str) -> (Option<String>, Option<String>) {
    let razao = capturar_apos_rotulo(bloco, &RE_RAZAO_SOCIAL);
    let inscricao = capturar_apos_rotulo(bloco, &RE_CPF_CNPJ)
        .map(|doc| normalizar_inscricao(&doc))
        .filter(|doc| !doc.is_empty());
    (razao, inscricao)
}

/// Convert a captured dd/mm/yyyy (+ optional hh:mm:ss) reading into an ISO
/// timestamp, falling back to the raw date text for impossible dates.
pub(crate) fn data_iso_de_captura(data: &str, hora: Option<&str>) -> String {
    let mut partes = data.splitn(3, '/');
    let dia = partes.next().and_then(|p| p.parse().ok());
    let mes = partes.next().and_then(|p| p.parse().ok());
    let ano = partes.next().and_then(|p| p.parse().ok());
    let relogio = hora.and_then(|h| {
        let mut pedacos = h.splitn(3, ':');
        Some((
            pedacos.next()?.parse().ok()?,
            pedacos.next()?.parse().ok()?,
            pedacos.next()?.parse().ok()?,
        ))
    });
    match (dia, mes, ano) {
        (Some(d), Some(m), Some(a)) => {
            iso_de_dma(d, m, a, relogio).unwrap_or_else(|| data.to_string())
        }
        _ => data.to_string(),
    }
}

/// First date/time occurrence anywhere in the text, as an ISO timestamp.
pub(crate) fn primeira_data_hora(texto: &str) -> Option<String> {
    let capturas = RE_DATA_HORA.captures(texto)?;
    let data = capturas.get(1)?.as_str();
    let hora = capturas.get(2).map(|m| m.as_str());
    Some(data_iso_de_captura(data, hora))
}
