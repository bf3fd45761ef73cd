//! Normalization of arbitrary replies from the extraction service.
//!
//! The service wraps its payloads in a handful of envelope shapes; the
//! ordered list in [`normalizar_valor`] is the single place that priority
//! lives. Malformed input degrades to an empty result; nothing here
//! errors, so one bad reply never aborts sibling successes.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::classificacao::classificar_preenchendo;
use crate::core::{NotaFiscal, NotaParcial, coagir_numero, coagir_texto};
use crate::texto::extrair_texto;

use super::fila::RespostaExtracao;

/// Normalize a raw service reply into canonical records.
pub fn normalizar_resposta(resposta: &RespostaExtracao) -> Vec<NotaFiscal> {
    match resposta {
        RespostaExtracao::Json(valor) => normalizar_valor(valor),
        RespostaExtracao::Texto(texto) => normalizar_texto(texto),
    }
}

/// Normalize a textual reply: parsed as JSON when possible, else empty.
pub fn normalizar_texto(texto: &str) -> Vec<NotaFiscal> {
    match serde_json::from_str::<Value>(texto) {
        Ok(valor) => normalizar_valor(&valor),
        Err(_) => Vec::new(),
    }
}

/// Normalize an already-parsed reply.
///
/// Envelope shapes, in priority order, first match wins:
/// 1. array of entries carrying `output` / `message.content` /
///    `message.output` / `content`;
/// 2. `{dados: [...]}`;
/// 3. `{output: …}`;
/// 4. `{message: {content|output}}`;
/// 5. `{content: …}`;
/// 6. a bare object.
pub fn normalizar_valor(dado: &Value) -> Vec<NotaFiscal> {
    if let Value::Array(entradas) = dado {
        return entradas
            .iter()
            .map(desembrulhar_entrada)
            .flat_map(|carga| match carga {
                Value::Array(itens) => itens.iter().collect::<Vec<_>>(),
                unico => vec![unico],
            })
            .filter_map(rotear_carga)
            .collect();
    }

    if let Some(Value::Array(dados)) = dado.get("dados") {
        return dados.iter().filter_map(normalizar_item).collect();
    }

    if let Some(saida) = dado.get("output").filter(|v| e_verdadeiro(v)) {
        return rotear_carga(saida).into_iter().collect();
    }

    if let Some(mensagem) = dado.get("message").filter(|v| v.is_object()) {
        let carga = mensagem
            .get("content")
            .filter(|v| v.is_object() || v.is_array())
            .or_else(|| {
                mensagem
                    .get("output")
                    .filter(|v| v.is_object() || v.is_array())
            })
            .unwrap_or(mensagem);
        return rotear_carga(carga).into_iter().collect();
    }

    if let Some(conteudo) = dado.get("content").filter(|v| v.is_object() || v.is_array()) {
        return rotear_carga(conteudo).into_iter().collect();
    }

    if dado.is_object() {
        return normalizar_item(dado).into_iter().collect();
    }

    Vec::new()
}

/// JavaScript-style truthiness, used where the original shape sniffing
/// keyed on it.
fn e_verdadeiro(valor: &Value) -> bool {
    match valor {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}

/// Unwrap one array entry through the known nestings.
fn desembrulhar_entrada(entrada: &Value) -> &Value {
    let composto = |v: &Value| v.is_object() || v.is_array();
    if !entrada.is_object() {
        return entrada;
    }
    if let Some(saida) = entrada.get("output").filter(|v| composto(v)) {
        return saida;
    }
    if let Some(mensagem) = entrada.get("message").filter(|v| v.is_object()) {
        if let Some(conteudo) = mensagem.get("content").filter(|v| composto(v)) {
            return conteudo;
        }
        if let Some(saida) = mensagem.get("output").filter(|v| composto(v)) {
            return saida;
        }
    }
    if let Some(conteudo) = entrada.get("content").filter(|v| composto(v)) {
        return conteudo;
    }
    entrada
}

/// A payload carrying a `text` string goes through the free-text
/// extractors; anything else is mapped field by field.
fn rotear_carga(carga: &Value) -> Option<NotaFiscal> {
    if let Some(texto) = carga.get("text").and_then(Value::as_str) {
        if texto.is_empty() {
            return None;
        }
        let parcial = extrair_texto(texto);
        return Some(nota_de_parcial(&parcial));
    }
    normalizar_item(carga)
}

/// Per-field normalization of one structured payload: taker-priority
/// identity fields, numeric coercion, then fill-only classification.
fn normalizar_item(item: &Value) -> Option<NotaFiscal> {
    let objeto = item.as_object()?;
    let texto = |chave: &str| objeto.get(chave).map(coagir_texto).unwrap_or_default();
    let numero = |chave: &str| {
        objeto
            .get(chave)
            .map(|v| coagir_numero(v))
            .unwrap_or(Decimal::ZERO)
    };

    let cfop = texto("cfop");
    let mut nota = NotaFiscal {
        natureza: texto("natureza"),
        data_emissao: texto("dataEmissao"),
        data_entrada: texto("dataEntrada"),
        numero_nota: texto("numeroNota"),
        inscricao_federal: ou(texto("inscricaoFederalTomador"), texto("inscricaoFederal")),
        razao_social: ou(texto("razaoSocialTomador"), texto("razaoSocial")),
        cfop_natureza: ou(texto("cfopNatureza"), cfop.clone()),
        cfop,
        tabela_ctb: texto("tabelaCtb"),
        valor_principal: numero("valorPrincipal"),
        inss_retid: numero("inssRetid"),
        iss_retid: numero("issRetid"),
        pis_retid: numero("pisRetid"),
        cofins_retid: numero("cofinsRetid"),
        cs_retid: numero("csRetid"),
        ir_retid: numero("irRetid"),
        valor_liquido: numero("valorLiquido"),
        ..Default::default()
    };
    classificar_preenchendo(&mut nota);
    Some(nota)
}

/// Fold a free-text partial into a canonical record, preferring the
/// taker's identity fields.
fn nota_de_parcial(parcial: &NotaParcial) -> NotaFiscal {
    let nao_vazio = |campo: &Option<String>| campo.clone().filter(|s| !s.is_empty());
    let cfop = parcial.cfop.clone().unwrap_or_default();
    let mut nota = NotaFiscal {
        natureza: parcial.natureza.clone().unwrap_or_default(),
        data_emissao: parcial.data_emissao.clone().unwrap_or_default(),
        numero_nota: parcial.numero_nota.clone().unwrap_or_default(),
        inscricao_federal: nao_vazio(&parcial.inscricao_federal_tomador)
            .or_else(|| nao_vazio(&parcial.inscricao_federal))
            .unwrap_or_default(),
        razao_social: nao_vazio(&parcial.razao_social_tomador)
            .or_else(|| nao_vazio(&parcial.razao_social))
            .unwrap_or_default(),
        cfop_natureza: nao_vazio(&parcial.cfop_natureza).unwrap_or_else(|| cfop.clone()),
        cfop,
        valor_principal: parcial.valor_principal.unwrap_or_default(),
        valor_liquido: parcial.valor_liquido.unwrap_or_default(),
        inss_retid: parcial.inss_retid.unwrap_or_default(),
        ir_retid: parcial.ir_retid.unwrap_or_default(),
        pis_retid: parcial.pis_retid.unwrap_or_default(),
        cofins_retid: parcial.cofins_retid.unwrap_or_default(),
        cs_retid: parcial.cs_retid.unwrap_or_default(),
        iss_retid: parcial.iss_retid.unwrap_or_default(),
        ..Default::default()
    };
    classificar_preenchendo(&mut nota);
    nota
}

fn ou(primeiro: String, segundo: String) -> String {
    if primeiro.is_empty() { segundo } else { primeiro }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn envelope_dados() {
        let notas = normalizar_valor(&json!({
            "dados": [{"natureza": "X", "valorPrincipal": "1.000,50"}]
        }));
        assert_eq!(notas.len(), 1);
        assert_eq!(notas[0].natureza, "X");
        assert_eq!(notas[0].valor_principal, dec!(1000.50));
    }

    #[test]
    fn envelope_lista_com_output() {
        let notas = normalizar_valor(&json!([
            {"output": {"natureza": "Serviço de consultoria", "valorLiquido": 10}},
            {"message": {"content": {"numeroNota": "77"}}}
        ]));
        assert_eq!(notas.len(), 2);
        assert_eq!(notas[0].cfop_natureza, "1933034");
        assert_eq!(notas[1].numero_nota, "77");
    }

    #[test]
    fn texto_roteado_para_extratores() {
        let notas = normalizar_valor(&json!({
            "output": {"text": "Razão Social: Fulano ME\nCPF/CNPJ: 12.345.678/0001-90\nVALOR TOTAL R$ 150,00"}
        }));
        assert_eq!(notas.len(), 1);
        assert_eq!(notas[0].razao_social, "Fulano ME");
        assert_eq!(notas[0].inscricao_federal, "12345678000190");
        assert_eq!(notas[0].valor_principal, dec!(150.00));
    }

    #[test]
    fn tomador_tem_prioridade() {
        let notas = normalizar_valor(&json!({
            "razaoSocial": "Prestador",
            "razaoSocialTomador": "Tomador",
            "inscricaoFederal": "1",
            "inscricaoFederalTomador": "2"
        }));
        assert_eq!(notas[0].razao_social, "Tomador");
        assert_eq!(notas[0].inscricao_federal, "2");
    }

    #[test]
    fn entrada_malformada_rende_vazio() {
        assert!(normalizar_texto("isto não é json").is_empty());
        assert!(normalizar_valor(&json!("string solta")).is_empty());
        assert!(normalizar_valor(&json!(42)).is_empty());
    }

    #[test]
    fn classificacao_preenche_sem_sobrescrever() {
        let notas = normalizar_valor(&json!({
            "natureza": "Serviço de consultoria",
            "tabelaCtb": "1111"
        }));
        assert_eq!(notas[0].tabela_ctb, "1111");
        assert_eq!(notas[0].cfop_natureza, "1933034");
    }
}
