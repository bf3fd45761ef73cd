//! NFS-e text parser for the São Paulo municipality layout.
//!
//! São Paulo notes often surface only the RPS number before an NFSe number
//! is assigned, so the RPS is used as the note number.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{NotaParcial, parse_valor};

use super::rotulos::{
    RE_PRESTADOR, RE_TOMADOR, RE_VALOR_LIQUIDO, extrair_identidade, fatiar_entre,
    primeira_data_hora,
};

static RE_RPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RPS\s*N[ºo]\s*([0-9.]+)").unwrap());

static RE_FIM_TOMADOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)INTERMEDIARIO DE SERVI[ÇC]OS|DISCRIMIN|LOCAL DA PRESTA[ÇC][ÃA]O|OUTRAS INFORM")
        .unwrap()
});

static RE_CODIGO_FIM_DE_LINHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\b([0-9]{4,6})\s*-\s*([^\n\r]+?)\r?$").unwrap());

static RE_COD_SERVICO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(C[óo]digo|Cadig[nm])\s+do\s+Servi[cç]o").unwrap());

static RE_CODIGO_DESCRICAO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{4,6})\s*-\s*([^\n\r]+)").unwrap());

static RE_VALOR_TOTAL_SERVICO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VALOR TOTAL DO SERVI[ÇC]O\s*=\s*R\$\s*([\d.,]+)").unwrap()
});

static RE_VALOR_TOTAL_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)valor Total\s*-\s*R\$\s*([\d.,]+)").unwrap());

static RE_ISS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Valor do ISS\s*\(R\$\)\s*([\d.,]+)").unwrap());

static RE_ISS_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VALOR ISS\(R\$\)\s*([\d.,]+)").unwrap());

pub(super) fn extrair(texto: &str) -> Option<NotaParcial> {
    let minusculo = texto.to_lowercase();
    if !minusculo.contains("prefeitura do municipio de sao paulo")
        && !minusculo.contains("prefeitura do municipio de são paulo")
    {
        return None;
    }

    let mut parcial = NotaParcial::default();

    if let Some(capturas) = RE_RPS.captures(texto) {
        parcial.numero_nota = capturas.get(1).map(|m| m.as_str().to_string());
    }

    parcial.data_emissao = Some(primeira_data_hora(texto).unwrap_or_default());

    if let Some(bloco) = fatiar_entre(texto, &RE_PRESTADOR, Some(&RE_TOMADOR)) {
        let (razao, inscricao) = extrair_identidade(bloco);
        parcial.razao_social = razao;
        parcial.inscricao_federal = inscricao;
    }

    if let Some(bloco) = fatiar_entre(texto, &RE_TOMADOR, Some(&RE_FIM_TOMADOR)) {
        let (razao, inscricao) = extrair_identidade(bloco);
        parcial.razao_social_tomador = razao;
        parcial.inscricao_federal_tomador = inscricao;
    }

    let natureza = RE_CODIGO_FIM_DE_LINHA
        .captures(texto)
        .or_else(|| {
            fatiar_entre(texto, &RE_COD_SERVICO, None)
                .and_then(|bloco| RE_CODIGO_DESCRICAO.captures(bloco))
        })
        .and_then(|capturas| capturas.get(2).map(|m| m.as_str().trim().to_string()));
    if natureza.is_some() {
        parcial.natureza = natureza;
    }

    if let Some(capturas) = RE_VALOR_TOTAL_SERVICO
        .captures(texto)
        .or_else(|| RE_VALOR_TOTAL_ALT.captures(texto))
    {
        parcial.valor_principal = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }
    if let Some(capturas) = RE_VALOR_LIQUIDO.captures(texto) {
        parcial.valor_liquido = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }
    if parcial.valor_liquido.is_none() {
        parcial.valor_liquido = parcial.valor_principal;
    }

    if let Some(capturas) = RE_ISS.captures(texto).or_else(|| RE_ISS_ALT.captures(texto)) {
        parcial.iss_retid = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }

    Some(parcial)
}
