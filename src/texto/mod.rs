//! Free-text extraction for PDF-derived invoice text.
//!
//! An ordered list of per-municipality parsers, each gated on an issuer
//! signature substring, followed by a generic parser that never declines.
//! A parser that declines (or finds nothing) simply hands over to the next
//! one; no error escapes this module.

mod chapeco;
mod generico;
mod rotulos;
mod sao_paulo;

use crate::core::NotaParcial;

/// Municipality parsers in priority order.
const ANALISADORES: &[fn(&str) -> Option<NotaParcial>] = &[sao_paulo::extrair, chapeco::extrair];

/// Parse a block of invoice text into a partial record.
///
/// Returns the first municipality parser's non-empty result; when all
/// decline, the generic parser's best effort (which may be empty).
pub fn extrair_texto(texto: &str) -> NotaParcial {
    for analisador in ANALISADORES {
        if let Some(parcial) = analisador(texto) {
            if !parcial.esta_vazia() {
                return parcial;
            }
        }
    }
    generico::extrair(texto)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const NOTA_CHAPECO: &str = "\
PREFEITURA MUNICIPAL\nMunicípio de Chapecó\n\
Nota Nº - Série\n0000000112 - E\n\
Data da Emissão: 05/03/2024 08:15:00\n\
PRESTADOR DE SERVIÇOS\n\
Razão Social: Clínica Exemplo Ltda\n\
CPF/CNPJ: 11.222.333/0001-44\n\
TOMADOR DE SERVIÇOS\n\
Razão Social: Tomadora Exemplo SA\n\
CNPJ/CPF: 55.666.777/0001-88\n\
DISCRIMINAÇÃO DOS SERVIÇOS\n\
Código do Serviço\n\
101 - Exames laboratoriais\n\
INSS(R$) IR(R$) PIS(R$) COFINS(R$) CSLL(R$)\n\
11,00 15,00 0,65 3,00 1,00\n\
VALOR ISS(R$) 5,00\n\
VALOR TOTAL (R$) 1.000,00\n\
VALOR LÍQUIDO DA NOTA R$ 969,35\n";

    #[test]
    fn chapeco_extrai_campos() {
        let parcial = extrair_texto(NOTA_CHAPECO);
        assert_eq!(parcial.numero_nota.as_deref(), Some("0000000112"));
        assert_eq!(parcial.data_emissao.as_deref(), Some("2024-03-05T08:15:00"));
        assert_eq!(parcial.razao_social.as_deref(), Some("Clínica Exemplo Ltda"));
        assert_eq!(
            parcial.inscricao_federal.as_deref(),
            Some("11222333000144")
        );
        assert_eq!(
            parcial.razao_social_tomador.as_deref(),
            Some("Tomadora Exemplo SA")
        );
        assert_eq!(
            parcial.inscricao_federal_tomador.as_deref(),
            Some("55666777000188")
        );
        assert_eq!(parcial.natureza.as_deref(), Some("Exames laboratoriais"));
        assert_eq!(parcial.valor_principal, Some(dec!(1000.00)));
        assert_eq!(parcial.valor_liquido, Some(dec!(969.35)));
        assert_eq!(parcial.inss_retid, Some(dec!(11.00)));
        assert_eq!(parcial.ir_retid, Some(dec!(15.00)));
        assert_eq!(parcial.pis_retid, Some(dec!(0.65)));
        assert_eq!(parcial.cofins_retid, Some(dec!(3.00)));
        assert_eq!(parcial.cs_retid, Some(dec!(1.00)));
        assert_eq!(parcial.iss_retid, Some(dec!(5.00)));
    }

    const NOTA_SAO_PAULO: &str = "\
PREFEITURA DO MUNICIPIO DE SAO PAULO\nNFS-e\n\
RPS Nº 4321 emitido em 10/01/2024\n\
PRESTADOR DE SERVIÇOS\n\
Nome/Razão Social: Consultoria Paulista Ltda\n\
CPF/CNPJ: 11111111000111\n\
TOMADOR DE SERVIÇOS\n\
Nome/Razão Social: Cliente Paulista SA\n\
CPFCNPJ 22222222000122\n\
DISCRIMINAÇÃO DOS SERVIÇOS\n\
Código do Serviço\n\
17030 - Serviços de administração\n\
VALOR TOTAL DO SERVIÇO = R$ 2.500,00\n";

    #[test]
    fn sao_paulo_usa_rps_e_replica_liquido() {
        let parcial = extrair_texto(NOTA_SAO_PAULO);
        assert_eq!(parcial.numero_nota.as_deref(), Some("4321"));
        assert_eq!(parcial.data_emissao.as_deref(), Some("2024-01-10T00:00:00"));
        assert_eq!(
            parcial.razao_social_tomador.as_deref(),
            Some("Cliente Paulista SA")
        );
        assert_eq!(
            parcial.inscricao_federal_tomador.as_deref(),
            Some("22222222000122")
        );
        assert_eq!(
            parcial.natureza.as_deref(),
            Some("Serviços de administração")
        );
        assert_eq!(parcial.valor_principal, Some(dec!(2500.00)));
        assert_eq!(parcial.valor_liquido, Some(dec!(2500.00)));
    }

    #[test]
    fn texto_sem_assinatura_cai_no_generico() {
        let texto = "Recibo avulso\nRazão Social: Fornecedor Genérico ME\n\
CPF/CNPJ: 99.888.777/0001-66\nVALOR TOTAL R$ 300,00\n";
        let parcial = extrair_texto(texto);
        assert_eq!(
            parcial.razao_social.as_deref(),
            Some("Fornecedor Genérico ME")
        );
        assert_eq!(parcial.valor_principal, Some(dec!(300.00)));
        assert!(parcial.razao_social_tomador.is_none());
    }

    #[test]
    fn texto_vazio_rende_parcial_vazia() {
        assert!(extrair_texto("").esta_vazia());
    }
}
