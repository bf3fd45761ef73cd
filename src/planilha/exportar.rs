//! Fixed 16-column layout handed to the spreadsheet-export collaborator.

use crate::core::{NotaFiscal, formatar_data_ptbr};

/// Export column order. The collaborator serializes these verbatim.
pub const COLUNAS_EXPORTACAO: [&str; 16] = [
    "#NATUREZA",
    "Data Emissão",
    "Data Entrada",
    "Numero Nota",
    "Inscrição Federal",
    "Razao Social",
    "CFOP Natureza",
    "Valor Principal",
    "INSS Retid",
    "ISS Retid",
    "PIS Retid",
    "Cofins Retid",
    "CS Retid",
    "IR Retid",
    "Valor Liquido",
    "TABELA CTB",
];

/// Build the export table: header row first, then one row per record.
///
/// Dates are rendered as pt-BR display strings; the resolved operation
/// code falls back to the raw `cfop` when classification produced nothing.
pub fn tabela_exportacao(notas: &[NotaFiscal]) -> Vec<Vec<String>> {
    let mut tabela = Vec::with_capacity(notas.len() + 1);
    tabela.push(COLUNAS_EXPORTACAO.iter().map(|c| c.to_string()).collect());
    for nota in notas {
        tabela.push(linha_exportacao(nota));
    }
    tabela
}

fn linha_exportacao(nota: &NotaFiscal) -> Vec<String> {
    let cfop = if nota.cfop_natureza.is_empty() {
        nota.cfop.clone()
    } else {
        nota.cfop_natureza.clone()
    };
    vec![
        nota.natureza.clone(),
        formatar_data_ptbr(&nota.data_emissao),
        formatar_data_ptbr(&nota.data_entrada),
        nota.numero_nota.clone(),
        nota.inscricao_federal.clone(),
        nota.razao_social.clone(),
        cfop,
        nota.valor_principal.to_string(),
        nota.inss_retid.to_string(),
        nota.iss_retid.to_string(),
        nota.pis_retid.to_string(),
        nota.cofins_retid.to_string(),
        nota.cs_retid.to_string(),
        nota.ir_retid.to_string(),
        nota.valor_liquido.to_string(),
        nota.tabela_ctb.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn cabecalho_e_fallback_de_cfop() {
        let nota = NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            data_emissao: "2024-03-05T08:15:00".into(),
            cfop: "1933034".into(),
            valor_principal: dec!(1500.00),
            ..Default::default()
        };
        let tabela = tabela_exportacao(std::slice::from_ref(&nota));
        assert_eq!(tabela.len(), 2);
        assert_eq!(tabela[0][0], "#NATUREZA");
        assert_eq!(tabela[0].len(), 16);
        assert_eq!(tabela[1][1], "05/03/2024");
        // cfop_natureza empty → raw cfop
        assert_eq!(tabela[1][6], "1933034");
        assert_eq!(tabela[1][7], "1500.00");
    }
}
