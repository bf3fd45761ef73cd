//! Natureza-da-operação → classification code mapping.
//!
//! The table is defined once at process start and consumed read-only.
//! Entry order matters: the keyword tiers of [`buscar_natureza`] return the
//! first matching entry in table order, so this is a const slice rather
//! than a hash map.

use crate::core::NotaFiscal;

/// One classification entry: description key → operation code + accounting
/// table code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntradaNatureza {
    /// Exact or keyword-bearing description text.
    pub chave: &'static str,
    /// Operation code (CFOP) assigned by this classification.
    pub cfop: &'static str,
    /// Target accounting table code.
    pub tabela_ctb: &'static str,
    /// Human-readable description.
    pub descricao: &'static str,
}

/// Static classification table.
///
/// The medical-with-withholding entry carries the same codes as the
/// administrative-with-withholding entry; that duplication exists in the
/// source table and is kept verbatim.
pub const MAPEAMENTO_NATUREZA: &[EntradaNatureza] = &[
    EntradaNatureza {
        chave: "Serviço de consultoria e gestão - dentro do estado",
        cfop: "1933034",
        tabela_ctb: "2014",
        descricao: "Serviços de consultoria e gestão empresarial",
    },
    EntradaNatureza {
        chave: "Serviço software - fora do Estado",
        cfop: "2933027",
        tabela_ctb: "2007",
        descricao: "Serviços de desenvolvimento de software",
    },
    EntradaNatureza {
        chave: "Serviço honorários advocatícios - fora do Estado",
        cfop: "2933029",
        tabela_ctb: "2009",
        descricao: "Serviços advocatícios e jurídicos",
    },
    EntradaNatureza {
        chave: "Serviço honorários advocatícios com retido - fora do Estado",
        cfop: "2933030",
        tabela_ctb: "2010",
        descricao: "Serviços advocatícios com retenções",
    },
    EntradaNatureza {
        chave: "Serviço administrativos com retido - dentro do estado",
        cfop: "1933023",
        tabela_ctb: "2003",
        descricao: "Serviços administrativos com retenções",
    },
    EntradaNatureza {
        chave: "Serviço honorários contábeis - dentro do estado",
        cfop: "1933032",
        tabela_ctb: "2012",
        descricao: "Serviços contábeis e tributários",
    },
    EntradaNatureza {
        chave: "Serviço hospedagem de websites - fora do Estado",
        cfop: "2933035",
        tabela_ctb: "2015",
        descricao: "Serviços de hospedagem e tecnologia",
    },
    EntradaNatureza {
        chave: "Serviço despesas médicas - dentro do estado",
        cfop: "1933025",
        tabela_ctb: "2005",
        descricao: "Serviços médicos e hospitalares",
    },
    EntradaNatureza {
        chave: "Serviço despesas médicas com retido - dentro do estado",
        cfop: "1933023",
        tabela_ctb: "2003",
        descricao: "Serviços médicos com retenções",
    },
    EntradaNatureza {
        chave: "101",
        cfop: "1933025",
        tabela_ctb: "2005",
        descricao: "Serviços médicos e exames laboratoriais",
    },
    EntradaNatureza {
        chave: "Serviço de consultoria",
        cfop: "1933034",
        tabela_ctb: "2014",
        descricao: "Serviços de consultoria empresarial",
    },
    EntradaNatureza {
        chave: "Serviço de gestão",
        cfop: "1933034",
        tabela_ctb: "2014",
        descricao: "Serviços de gestão empresarial",
    },
    EntradaNatureza {
        chave: "Serviço de software",
        cfop: "2933027",
        tabela_ctb: "2007",
        descricao: "Serviços de desenvolvimento de software",
    },
    EntradaNatureza {
        chave: "Serviço de advocacia",
        cfop: "2933029",
        tabela_ctb: "2009",
        descricao: "Serviços advocatícios",
    },
    EntradaNatureza {
        chave: "Serviço de contabilidade",
        cfop: "1933032",
        tabela_ctb: "2012",
        descricao: "Serviços contábeis",
    },
    EntradaNatureza {
        chave: "Serviço de hospedagem",
        cfop: "2933035",
        tabela_ctb: "2015",
        descricao: "Serviços de hospedagem",
    },
    EntradaNatureza {
        chave: "Serviço médico",
        cfop: "1933025",
        tabela_ctb: "2005",
        descricao: "Serviços médicos",
    },
    EntradaNatureza {
        chave: "Serviço hospitalar",
        cfop: "1933025",
        tabela_ctb: "2005",
        descricao: "Serviços hospitalares",
    },
];

/// Priority keywords, most specific multi-word phrases first. Checked
/// before the generic term fallback.
const PALAVRAS_CHAVE: &[&str] = &[
    "despesas médicas com retido",
    "administrativos com retido",
    "honorários advocatícios com retido",
    "honorários contábeis",
    "consultoria e gestão",
    "software",
    "hospedagem de websites",
];

/// Broad category terms shared between input text and table keys.
const TERMOS_GENERICOS: &[&str] = &[
    "consultoria",
    "gestão",
    "software",
    "advocatícios",
    "contábeis",
    "hospedagem",
    "médicas",
    "administrativos",
];

/// Resolve a natureza text to a classification entry.
///
/// Matching tiers, first hit wins:
/// 1. exact full-string match against a table key;
/// 2. priority keywords: if the input contains one (case-insensitive),
///    the first table key also containing it wins;
/// 3. generic terms: the first table entry sharing any category term with
///    the input wins.
///
/// Empty input and unmatched text return `None`.
pub fn buscar_natureza(natureza: &str) -> Option<&'static EntradaNatureza> {
    if natureza.is_empty() {
        return None;
    }

    if let Some(entrada) = MAPEAMENTO_NATUREZA.iter().find(|e| e.chave == natureza) {
        return Some(entrada);
    }

    let minuscula = natureza.to_lowercase();
    let minuscula = minuscula.trim();

    for palavra in PALAVRAS_CHAVE {
        if minuscula.contains(palavra) {
            if let Some(entrada) = MAPEAMENTO_NATUREZA
                .iter()
                .find(|e| e.chave.to_lowercase().contains(palavra))
            {
                return Some(entrada);
            }
        }
    }

    for entrada in MAPEAMENTO_NATUREZA {
        let chave = entrada.chave.to_lowercase();
        for termo in TERMOS_GENERICOS {
            if chave.contains(termo) && minuscula.contains(termo) {
                return Some(entrada);
            }
        }
    }

    None
}

/// Whether a natureza text resolves to any entry.
pub fn tem_mapeamento(natureza: &str) -> bool {
    buscar_natureza(natureza).is_some()
}

/// Classify a record, unconditionally overwriting `cfop_natureza` and
/// `tabela_ctb` when a mapping is found. This is the structured-extractor
/// path (XML and spreadsheet rows).
pub fn classificar_sobrescrevendo(nota: &mut NotaFiscal) {
    if let Some(entrada) = buscar_natureza(&nota.natureza) {
        nota.cfop_natureza = entrada.cfop.to_string();
        nota.tabela_ctb = entrada.tabela_ctb.to_string();
    }
}

/// Classify a record, filling only classification fields that are still
/// empty. This is the normalizer path; running it twice is idempotent.
pub fn classificar_preenchendo(nota: &mut NotaFiscal) {
    if let Some(entrada) = buscar_natureza(&nota.natureza) {
        if nota.cfop_natureza.is_empty() {
            nota.cfop_natureza = entrada.cfop.to_string();
        }
        if nota.tabela_ctb.is_empty() {
            nota.tabela_ctb = entrada.tabela_ctb.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busca_exata_tem_prioridade() {
        let e = buscar_natureza("Serviço de consultoria e gestão - dentro do estado").unwrap();
        assert_eq!(e.cfop, "1933034");
        assert_eq!(e.tabela_ctb, "2014");
    }

    #[test]
    fn codigo_numerico_101() {
        let e = buscar_natureza("101").unwrap();
        assert_eq!(e.tabela_ctb, "2005");
    }

    #[test]
    fn palavra_chave_caso_insensitivo() {
        let e = buscar_natureza("pagamento de SOFTWARE mensal").unwrap();
        assert_eq!(e.cfop, "2933027");
    }

    #[test]
    fn medicas_com_retido_compartilha_codigos_administrativos() {
        // Near-duplicate in the source table, preserved on purpose: both
        // resolve to 1933023 / 2003.
        let medicas = buscar_natureza("Nota de despesas médicas com retido no mês").unwrap();
        let administrativos =
            buscar_natureza("Serviço administrativos com retido - dentro do estado").unwrap();
        assert_eq!(medicas.cfop, administrativos.cfop);
        assert_eq!(medicas.tabela_ctb, administrativos.tabela_ctb);
    }

    #[test]
    fn termo_generico_fallback() {
        let e = buscar_natureza("despesa com hospedagem").unwrap();
        assert_eq!(e.tabela_ctb, "2015");
    }

    #[test]
    fn sem_correspondencia() {
        assert!(buscar_natureza("").is_none());
        assert!(buscar_natureza("frete rodoviário").is_none());
    }

    #[test]
    fn preenchendo_e_idempotente() {
        let mut nota = NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            tabela_ctb: "9999".into(),
            ..Default::default()
        };
        classificar_preenchendo(&mut nota);
        assert_eq!(nota.tabela_ctb, "9999");
        assert_eq!(nota.cfop_natureza, "1933034");
        let antes = nota.clone();
        classificar_preenchendo(&mut nota);
        assert_eq!(nota, antes);
    }

    #[test]
    fn sobrescrevendo_substitui() {
        let mut nota = NotaFiscal {
            natureza: "Serviço de consultoria".into(),
            cfop_natureza: "0000".into(),
            tabela_ctb: "0000".into(),
            ..Default::default()
        };
        classificar_sobrescrevendo(&mut nota);
        assert_eq!(nota.cfop_natureza, "1933034");
        assert_eq!(nota.tabela_ctb, "2014");
    }
}
