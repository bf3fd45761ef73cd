//! CFOP-mapping extraction from the *second* sheet of a workbook.
//!
//! This extractor is attempted before treating an ambiguous workbook as
//! invoice data; any structural failure here is a [`NotaError::Parse`] so
//! the caller can fall back.

use std::io::Cursor;

use calamine::{Reader, Xlsx, open_workbook_from_rs};
use tracing::warn;

use crate::classificacao::{EntradaCfop, MapaCfop};
use crate::core::NotaError;

use super::celula_texto;

const COLUNA_CFOP: &str = "CFOP";
const COLUNA_DESCRICAO: &str = "Descrição CFOP";
const COLUNA_TABELA: &str = "TABELA CTB";
const COLUNA_CONTA: &str = "CONTA CONTÁBIL";

/// Extract the CFOP mapping from the second sheet.
///
/// Column headers must match the four labels literally. Rows without a
/// CFOP value are skipped; rows missing any of the other three fields are
/// rejected individually while the rest proceed.
pub fn extrair_mapa_cfop(dados: &[u8]) -> Result<MapaCfop, NotaError> {
    let mut pasta: Xlsx<_> = open_workbook_from_rs(Cursor::new(dados))
        .map_err(|e| NotaError::Parse(format!("não foi possível abrir a planilha: {e}")))?;

    let nome_aba = pasta
        .sheet_names()
        .get(1)
        .cloned()
        .ok_or_else(|| NotaError::Parse("planilha sem segunda aba de mapeamento CFOP".into()))?;
    let faixa = pasta
        .worksheet_range(&nome_aba)
        .ok_or_else(|| NotaError::Parse(format!("aba '{nome_aba}' inacessível")))?
        .map_err(|e| NotaError::Parse(format!("erro ao ler a aba '{nome_aba}': {e}")))?;

    let mut linhas = faixa.rows();
    let cabecalhos: Vec<String> = linhas
        .next()
        .ok_or_else(|| NotaError::Parse("aba de mapeamento CFOP vazia".into()))?
        .iter()
        .map(celula_texto)
        .collect();

    let posicao = |rotulo: &str| -> Result<usize, NotaError> {
        cabecalhos
            .iter()
            .position(|c| c == rotulo)
            .ok_or_else(|| NotaError::Parse(format!("coluna '{rotulo}' não encontrada")))
    };
    let col_cfop = posicao(COLUNA_CFOP)?;
    let col_descricao = posicao(COLUNA_DESCRICAO)?;
    let col_tabela = posicao(COLUNA_TABELA)?;
    let col_conta = posicao(COLUNA_CONTA)?;

    let mut mapa = MapaCfop::new();
    for linha in linhas {
        let celula = |indice: usize| linha.get(indice).map(celula_texto).unwrap_or_default();
        let cfop = celula(col_cfop);
        if cfop.is_empty() {
            continue;
        }
        let descricao = celula(col_descricao);
        let tabela_ctb = celula(col_tabela);
        let conta_contabil = celula(col_conta);
        if descricao.is_empty() || tabela_ctb.is_empty() || conta_contabil.is_empty() {
            warn!(cfop = %cfop, "linha de mapeamento CFOP incompleta, ignorada");
            continue;
        }
        mapa.insert(
            cfop,
            EntradaCfop {
                descricao,
                tabela_ctb,
                conta_contabil,
            },
        );
    }
    Ok(mapa)
}
