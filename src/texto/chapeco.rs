//! NFS-e text parser for the Chapecó municipality layout.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{NotaParcial, parse_valor};

use super::rotulos::{
    RE_PRESTADOR, RE_TOMADOR, RE_VALOR_LIQUIDO, data_iso_de_captura, extrair_identidade,
    fatiar_entre,
};

static RE_NOTA_SERIE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Nota\s*N[ºo]\s*-\s*S[eé]rie[\s\r\n]+([0-9.]+)\s*-\s*([A-Z0-9]+)").unwrap()
});

static RE_DATA_EMISSAO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Data da Emiss[aã]o:\s*([0-3]\d/[01]\d/\d{4})(?:\s+(\d{2}:\d{2}:\d{2}))?")
        .unwrap()
});

static RE_FIM_TOMADOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)LOCAL DA PRESTA[ÇC][ÃA]O|DISCRIMINA[ÇC][ÃA]O DOS SERVI[ÇC]OS|Situa[çc][aã]o de Tributa[çc][aã]o|Página\s+1\s+de\s+1",
    )
    .unwrap()
});

static RE_COD_SERVICO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)C[óo]digo do Servi[cç]o").unwrap());

static RE_CODIGO_DESCRICAO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{2,6})\s*-\s*([^\n\r]+)").unwrap());

static RE_VALOR_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VALOR TOTAL\s*\(R\$\)\s*([\d.,]+)").unwrap());

static RE_CABECALHO_RETENCOES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)INSS\(R\$\).*IR\(R\$\).*PIS\(R\$\).*COFINS\(R\$\).*CSLL\(R\$\)").unwrap()
});

static RE_NUMEROS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d.,]+)").unwrap());

static RE_ISS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)VALOR ISS\(R\$\)\s*([\d.,]+)").unwrap());

static RE_ISS_ALT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Valor do ISS\s*\(R\$\)\s*([\d.,]+)").unwrap());

pub(super) fn extrair(texto: &str) -> Option<NotaParcial> {
    let minusculo = texto.to_lowercase();
    if !minusculo.contains("município de chapecó") && !minusculo.contains("municipio de chapeco") {
        return None;
    }

    let mut parcial = NotaParcial::default();

    if let Some(capturas) = RE_NOTA_SERIE.captures(texto) {
        parcial.numero_nota = capturas.get(1).map(|m| m.as_str().to_string());
    }

    if let Some(capturas) = RE_DATA_EMISSAO.captures(texto) {
        let data = capturas.get(1).map(|m| m.as_str()).unwrap_or_default();
        let hora = capturas.get(2).map(|m| m.as_str());
        parcial.data_emissao = Some(data_iso_de_captura(data, hora));
    }

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

    // Natureza vem da linha "NNN - descrição" após "Código do Serviço".
    if let Some(bloco) = fatiar_entre(texto, &RE_COD_SERVICO, None) {
        if let Some(capturas) = RE_CODIGO_DESCRICAO.captures(bloco) {
            parcial.natureza = capturas.get(2).map(|m| m.as_str().trim().to_string());
            parcial.cfop = Some(String::new());
            parcial.cfop_natureza = Some(String::new());
        }
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

    // Retenções ficam nas duas linhas seguintes ao cabeçalho INSS/IR/PIS/COFINS/CSLL.
    if let Some(cabecalho) = RE_CABECALHO_RETENCOES.find(texto) {
        let depois = &texto[cabecalho.start()..];
        let linhas: Vec<&str> = depois.lines().skip(1).take(2).collect();
        let juntas = linhas.join(" ");
        let numeros: Vec<&str> = RE_NUMEROS
            .find_iter(&juntas)
            .map(|m| m.as_str())
            .collect();
        if numeros.len() >= 5 {
            parcial.inss_retid = Some(parse_valor(numeros[0]));
            parcial.ir_retid = Some(parse_valor(numeros[1]));
            parcial.pis_retid = Some(parse_valor(numeros[2]));
            parcial.cofins_retid = Some(parse_valor(numeros[3]));
            parcial.cs_retid = Some(parse_valor(numeros[4]));
        }
    }

    if let Some(capturas) = RE_ISS.captures(texto).or_else(|| RE_ISS_ALT.captures(texto)) {
        parcial.iss_retid = capturas.get(1).map(|m| parse_valor(m.as_str()));
    }

    Some(parcial)
}
