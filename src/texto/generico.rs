//! Generic best-effort parser. Runs last and never declines: it returns
//! whatever common labels it can find, possibly nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{NotaParcial, normalizar_inscricao, parse_valor};

use super::rotulos::{RE_VALOR_LIQUIDO, primeira_data_hora};

static RE_NUMERO_NOTA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Nota\s*N[ºo].{0,20}?([0-9]{6,})").unwrap());

static RE_RPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RPS\s*N[ºo]\s*([0-9.]+)").unwrap());

static RE_RAZAO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Nome/Raz[aã]o Social|Raz[aã]o Social):\s*(.+)").unwrap());

static RE_CNPJ: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(CPF/CNPJ|CNPJ/CPF):\s*([\d./\-]+)").unwrap());

static RE_CODIGO_DESCRICAO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{3,6})\s*-\s*([^\n\r]+)").unwrap());

static RE_VALOR_TOTAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VALOR TOTAL(?:\s*DO\s*SERVI[ÇC]O)?\s*=?\s*R\$\s*([\d.,]+)").unwrap()
});

pub(super) fn extrair(texto: &str) -> NotaParcial {
    let mut parcial = NotaParcial::default();

    if let Some(capturas) = RE_NUMERO_NOTA
        .captures(texto)
        .or_else(|| RE_RPS.captures(texto))
    {
        parcial.numero_nota = capturas.get(1).map(|m| m.as_str().to_string());
    }

    if let Some(data) = primeira_data_hora(texto) {
        parcial.data_emissao = Some(data);
    }

    if let Some(capturas) = RE_RAZAO.captures(texto) {
        parcial.razao_social = capturas.get(2).map(|m| m.as_str().trim().to_string());
    }
    if let Some(capturas) = RE_CNPJ.captures(texto) {
        parcial.inscricao_federal = capturas
            .get(2)
            .map(|m| normalizar_inscricao(m.as_str()))
            .filter(|doc| !doc.is_empty());
    }

    if let Some(capturas) = RE_CODIGO_DESCRICAO.captures(texto) {
        parcial.natureza = capturas.get(2).map(|m| m.as_str().trim().to_string());
    }

    if let Some(capturas) = RE_VALOR_LIQUIDO.captures(texto) {
        parcial.valor_liquido = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }
    if let Some(capturas) = RE_VALOR_TOTAL.captures(texto) {
        parcial.valor_principal = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }
    if parcial.valor_principal.is_none() {
        parcial.valor_principal = parcial.valor_liquido;
    }

    parcial
}
