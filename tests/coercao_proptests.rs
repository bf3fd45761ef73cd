//! Property-based tests for value coercion.

use notafiscal::core::{coagir_numero, normalizar_inscricao, parse_valor};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

/// Format an amount in centavos as pt-BR monetary text with thousands
/// separators ("123456789" → "1.234.567,89").
fn formatar_ptbr(centavos: u64) -> String {
    let inteiro = centavos / 100;
    let fracao = centavos % 100;
    let digitos = inteiro.to_string();
    let mut agrupado = String::new();
    for (posicao, c) in digitos.chars().enumerate() {
        if posicao > 0 && (digitos.len() - posicao) % 3 == 0 {
            agrupado.push('.');
        }
        agrupado.push(c);
    }
    format!("{agrupado},{fracao:02}")
}

proptest! {
    #[test]
    fn moeda_ptbr_faz_ida_e_volta(centavos in 0u64..10_000_000_00) {
        let texto = formatar_ptbr(centavos);
        let esperado = Decimal::new(centavos as i64, 2);
        prop_assert_eq!(parse_valor(&texto), esperado);
    }

    #[test]
    fn parse_valor_nunca_entra_em_panico(texto in "\\PC*") {
        let _ = parse_valor(&texto);
    }

    #[test]
    fn coercao_de_escalares_sempre_produz_numero(f in -1e9f64..1e9f64) {
        // Decimal não tem NaN; a coerção nunca falha nem estoura.
        let _ = coagir_numero(&json!(f));
        let _ = coagir_numero(&json!(f.to_string()));
    }

    #[test]
    fn inscricao_normalizada_so_tem_digitos(texto in "\\PC*") {
        let saida = normalizar_inscricao(&texto);
        prop_assert!(saida.chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn exemplos_fixos_da_coercao() {
    assert_eq!(parse_valor("1.234,56"), Decimal::new(123456, 2));
    assert_eq!(parse_valor(""), Decimal::ZERO);
    assert_eq!(parse_valor("abc"), Decimal::ZERO);
    assert_eq!(coagir_numero(&json!(null)), Decimal::ZERO);
    assert_eq!(coagir_numero(&json!("")), Decimal::ZERO);
}
