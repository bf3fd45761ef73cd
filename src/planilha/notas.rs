//! Invoice rows from the first sheet of a workbook.

use std::io::Cursor;

use calamine::{DataType, Reader, Xlsx, open_workbook_from_rs};

use crate::classificacao::classificar_sobrescrevendo;
use crate::core::{NotaError, NotaFiscal};

use super::{celula_decimal, celula_texto};

/// Named fields a header cell can map to.
enum Campo {
    Natureza,
    DataEmissao,
    DataEntrada,
    NumeroNota,
    InscricaoFederal,
    RazaoSocial,
    CfopNatureza,
    ValorPrincipal,
    InssRetid,
    IssRetid,
    PisRetid,
    CofinsRetid,
    CsRetid,
    IrRetid,
    ValorLiquido,
    TabelaCtb,
}

/// Header synonym table; cell text is lowercased and trimmed before the
/// lookup. Unknown headers return `None` and pass through as extras.
fn campo_da_coluna(cabecalho: &str) -> Option<Campo> {
    match cabecalho {
        "#natureza" | "natureza" => Some(Campo::Natureza),
        "data emissão" | "dataemissao" => Some(Campo::DataEmissao),
        "data entrada" | "dataentrada" => Some(Campo::DataEntrada),
        "numero nota" | "numeronota" => Some(Campo::NumeroNota),
        "inscrição federal" | "inscricaofederal" => Some(Campo::InscricaoFederal),
        "razao social" | "razaosocial" => Some(Campo::RazaoSocial),
        "cfop natureza" | "cfopnatureza" => Some(Campo::CfopNatureza),
        "valor principal" | "valorprincipal" => Some(Campo::ValorPrincipal),
        "inss retid" | "inssretid" => Some(Campo::InssRetid),
        "iss retid" | "issretid" => Some(Campo::IssRetid),
        "pis retid" | "pisretid" => Some(Campo::PisRetid),
        "cofins retid" | "cofinsretid" => Some(Campo::CofinsRetid),
        "cs retid" | "csretid" => Some(Campo::CsRetid),
        "ir retid" | "irretid" => Some(Campo::IrRetid),
        "valor liquido" | "valorliquido" => Some(Campo::ValorLiquido),
        "tabela ctb" | "tabelactb" => Some(Campo::TabelaCtb),
        _ => None,
    }
}

/// Extract invoice rows from the first sheet.
///
/// The first row is the header; each following row yields one draft record,
/// rows with no populated cell are dropped. Classification is applied per
/// row with unconditional overwrite, like the XML path.
pub fn extrair_planilha(dados: &[u8]) -> Result<Vec<NotaFiscal>, NotaError> {
    let mut pasta: Xlsx<_> = open_workbook_from_rs(Cursor::new(dados))
        .map_err(|e| NotaError::Parse(format!("não foi possível abrir a planilha: {e}")))?;

    let nome_aba = pasta
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| NotaError::Parse("planilha sem abas".into()))?;
    let faixa = pasta
        .worksheet_range(&nome_aba)
        .ok_or_else(|| NotaError::Parse(format!("aba '{nome_aba}' inacessível")))?
        .map_err(|e| NotaError::Parse(format!("erro ao ler a aba '{nome_aba}': {e}")))?;

    let mut linhas = faixa.rows();
    let cabecalhos: Vec<String> = linhas
        .next()
        .ok_or_else(|| NotaError::Parse("planilha vazia".into()))?
        .iter()
        .map(celula_texto)
        .collect();

    let mut notas = Vec::new();
    for linha in linhas {
        if let Some(nota) = mapear_linha(&cabecalhos, linha) {
            notas.push(nota);
        }
    }
    Ok(notas)
}

fn mapear_linha(cabecalhos: &[String], linha: &[DataType]) -> Option<NotaFiscal> {
    let mut nota = NotaFiscal::default();
    let mut preenchido = false;

    for (indice, cabecalho) in cabecalhos.iter().enumerate() {
        if cabecalho.is_empty() {
            continue;
        }
        let Some(celula) = linha.get(indice) else {
            continue;
        };
        if matches!(celula, DataType::Empty) {
            continue;
        }
        preenchido = true;

        let normalizado = cabecalho.to_lowercase();
        match campo_da_coluna(normalizado.trim()) {
            Some(Campo::Natureza) => nota.natureza = celula_texto(celula),
            Some(Campo::DataEmissao) => nota.data_emissao = celula_texto(celula),
            Some(Campo::DataEntrada) => nota.data_entrada = celula_texto(celula),
            Some(Campo::NumeroNota) => nota.numero_nota = celula_texto(celula),
            Some(Campo::InscricaoFederal) => nota.inscricao_federal = celula_texto(celula),
            Some(Campo::RazaoSocial) => nota.razao_social = celula_texto(celula),
            Some(Campo::CfopNatureza) => nota.cfop_natureza = celula_texto(celula),
            Some(Campo::ValorPrincipal) => nota.valor_principal = celula_decimal(celula),
            Some(Campo::InssRetid) => nota.inss_retid = celula_decimal(celula),
            Some(Campo::IssRetid) => nota.iss_retid = celula_decimal(celula),
            Some(Campo::PisRetid) => nota.pis_retid = celula_decimal(celula),
            Some(Campo::CofinsRetid) => nota.cofins_retid = celula_decimal(celula),
            Some(Campo::CsRetid) => nota.cs_retid = celula_decimal(celula),
            Some(Campo::IrRetid) => nota.ir_retid = celula_decimal(celula),
            Some(Campo::ValorLiquido) => nota.valor_liquido = celula_decimal(celula),
            Some(Campo::TabelaCtb) => nota.tabela_ctb = celula_texto(celula),
            None => {
                nota.extras.insert(cabecalho.clone(), celula_texto(celula));
            }
        }
    }

    if !preenchido {
        return None;
    }
    classificar_sobrescrevendo(&mut nota);
    Some(nota)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::DataType;
    use rust_decimal_macros::dec;

    fn cabecalhos(nomes: &[&str]) -> Vec<String> {
        nomes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn linha_mapeada_com_sinonimos() {
        let cab = cabecalhos(&["#NATUREZA", "Valor Principal", "Obs"]);
        let linha = vec![
            DataType::String("Serviço de consultoria".into()),
            DataType::String("1.500,00".into()),
            DataType::String("urgente".into()),
        ];
        let nota = mapear_linha(&cab, &linha).unwrap();
        assert_eq!(nota.natureza, "Serviço de consultoria");
        assert_eq!(nota.valor_principal, dec!(1500.00));
        assert_eq!(nota.extras.get("Obs").map(String::as_str), Some("urgente"));
        // overwrite path ran
        assert_eq!(nota.cfop_natureza, "1933034");
        assert_eq!(nota.tabela_ctb, "2014");
    }

    #[test]
    fn linha_vazia_descartada() {
        let cab = cabecalhos(&["natureza", "valor principal"]);
        let linha = vec![DataType::Empty, DataType::Empty];
        assert!(mapear_linha(&cab, &linha).is_none());
    }

    #[test]
    fn numero_em_celula_float() {
        let cab = cabecalhos(&["numero nota", "valor liquido"]);
        let linha = vec![DataType::Float(112.0), DataType::Float(980.5)];
        let nota = mapear_linha(&cab, &linha).unwrap();
        assert_eq!(nota.numero_nota, "112");
        assert_eq!(nota.valor_liquido, dec!(980.5));
    }
}
