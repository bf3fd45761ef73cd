//! User-maintained CFOP → accounting-code mapping and the analysis pass
//! that applies it to extracted records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::NotaFiscal;

use super::natureza::buscar_natureza;

/// One row of the user-maintained CFOP mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntradaCfop {
    pub descricao: String,
    pub tabela_ctb: String,
    pub conta_contabil: String,
}

/// CFOP code → mapping entry, supplied externally and consumed read-only.
pub type MapaCfop = BTreeMap<String, EntradaCfop>;

/// Apply the CFOP mapping to a batch of records.
///
/// Precedence per record:
/// - a natureza-derived `tabela_ctb` wins over the CFOP-mapping one, which
///   only fills a still-empty value;
/// - `conta_contabil` is sourced exclusively from the CFOP mapping;
/// - the lookup tries the record's own `cfop` before its `cfop_natureza`
///   (first non-empty key wins).
pub fn analisar_notas(notas: &mut [NotaFiscal], mapa: &MapaCfop) {
    for nota in notas {
        let mut tabela = nota.tabela_ctb.clone();

        if !nota.natureza.is_empty() && !nota.cfop_natureza.is_empty() {
            if let Some(entrada) = buscar_natureza(&nota.natureza) {
                if !entrada.tabela_ctb.is_empty() {
                    tabela = entrada.tabela_ctb.to_string();
                }
            }
        }

        let entrada_cfop = mapa
            .get(&nota.cfop)
            .or_else(|| mapa.get(&nota.cfop_natureza));
        match entrada_cfop {
            Some(entrada) => {
                if tabela.is_empty() && !entrada.tabela_ctb.is_empty() {
                    tabela = entrada.tabela_ctb.clone();
                }
                nota.conta_contabil = entrada.conta_contabil.clone();
            }
            None => nota.conta_contabil = String::new(),
        }

        nota.tabela_ctb = tabela;
    }
}

/// Analysis counters for a batch of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResumoAnalise {
    pub total: usize,
    /// Records with both `tabela_ctb` and `cfop_natureza` populated.
    pub analisadas: usize,
    pub nao_analisadas: usize,
}

/// Count analyzed vs not-analyzed records.
pub fn resumo_analise(notas: &[NotaFiscal]) -> ResumoAnalise {
    let analisadas = notas
        .iter()
        .filter(|n| !n.tabela_ctb.is_empty() && !n.cfop_natureza.is_empty())
        .count();
    ResumoAnalise {
        total: notas.len(),
        analisadas,
        nao_analisadas: notas.len() - analisadas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapa_teste() -> MapaCfop {
        let mut mapa = MapaCfop::new();
        mapa.insert(
            "1933023".into(),
            EntradaCfop {
                descricao: "Serviço administrativos com retido - dentro do estado".into(),
                tabela_ctb: "2003".into(),
                conta_contabil: "9949".into(),
            },
        );
        mapa.insert(
            "5102".into(),
            EntradaCfop {
                descricao: "Venda de mercadoria".into(),
                tabela_ctb: "1001".into(),
                conta_contabil: "3001".into(),
            },
        );
        mapa
    }

    #[test]
    fn natureza_vence_mapeamento_cfop() {
        let mut notas = vec![NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            cfop: "1933023".into(),
            cfop_natureza: "1933034".into(),
            ..Default::default()
        }];
        analisar_notas(&mut notas, &mapa_teste());
        // tabela from natureza (2014), conta from the CFOP map (9949).
        assert_eq!(notas[0].tabela_ctb, "2014");
        assert_eq!(notas[0].conta_contabil, "9949");
    }

    #[test]
    fn cfop_proprio_antes_do_resolvido() {
        let mut notas = vec![NotaFiscal {
            cfop: "5102".into(),
            cfop_natureza: "1933023".into(),
            ..Default::default()
        }];
        analisar_notas(&mut notas, &mapa_teste());
        assert_eq!(notas[0].tabela_ctb, "1001");
        assert_eq!(notas[0].conta_contabil, "3001");
    }

    #[test]
    fn cfop_resolvido_quando_proprio_vazio() {
        let mut notas = vec![NotaFiscal {
            cfop_natureza: "1933023".into(),
            ..Default::default()
        }];
        analisar_notas(&mut notas, &mapa_teste());
        assert_eq!(notas[0].conta_contabil, "9949");
    }

    #[test]
    fn conta_contabil_nunca_vem_da_natureza() {
        let mut notas = vec![NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            cfop_natureza: "1933034".into(),
            ..Default::default()
        }];
        analisar_notas(&mut notas, &MapaCfop::new());
        assert_eq!(notas[0].tabela_ctb, "2014");
        assert_eq!(notas[0].conta_contabil, "");
    }

    #[test]
    fn contagem_analisadas() {
        let notas = vec![
            NotaFiscal {
                tabela_ctb: "2014".into(),
                cfop_natureza: "1933034".into(),
                ..Default::default()
            },
            NotaFiscal::default(),
        ];
        let resumo = resumo_analise(&notas);
        assert_eq!(resumo.total, 2);
        assert_eq!(resumo.analisadas, 1);
        assert_eq!(resumo.nao_analisadas, 1);
    }
}
