//! Service-invoice (NFSe) field extraction.
//!
//! Identity fields come from the service taker (the paying side), and the
//! entry date mirrors the emission date; NFSe documents carry no separate
//! entry timestamp.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::classificacao::classificar_sobrescrevendo;
use crate::core::{NotaError, NotaFiscal, normalizar_data_iso, parse_numero};

use super::{contem, definir};

#[derive(Default)]
struct CamposNfse {
    natureza: String,
    item_lista: String,
    data_emissao: String,
    numero: String,
    cnpj_tomador: String,
    cpf_tomador: String,
    razao_tomador: String,
    valor_servicos: String,
    valor_inss: String,
    valor_iss: String,
    valor_pis: String,
    valor_cofins: String,
    valor_csll: String,
    valor_ir: String,
    valor_liquido: String,
}

pub(super) fn extrair(xml: &str) -> Result<NotaFiscal, NotaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut campos = CamposNfse::default();
    let mut caminho: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let nome = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                caminho.push(nome);
            }
            Ok(Event::Text(ref e)) => {
                let texto = e.unescape().unwrap_or_default().to_string();
                if !texto.is_empty() {
                    capturar(&mut campos, &caminho, &texto);
                }
            }
            Ok(Event::End(_)) => {
                caminho.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(NotaError::Parse(format!("XML malformado: {e}"))),
            _ => {}
        }
    }

    let inscricao = if campos.cnpj_tomador.is_empty() {
        campos.cpf_tomador
    } else {
        campos.cnpj_tomador
    };
    let emissao = if campos.data_emissao.is_empty() {
        String::new()
    } else {
        normalizar_data_iso(&campos.data_emissao)
    };

    let mut nota = NotaFiscal {
        natureza: campos.natureza,
        data_entrada: emissao.clone(),
        data_emissao: emissao,
        numero_nota: campos.numero,
        inscricao_federal: inscricao,
        razao_social: campos.razao_tomador,
        cfop_natureza: campos.item_lista.clone(),
        cfop: campos.item_lista,
        valor_principal: parse_numero(&campos.valor_servicos),
        inss_retid: parse_numero(&campos.valor_inss),
        iss_retid: parse_numero(&campos.valor_iss),
        pis_retid: parse_numero(&campos.valor_pis),
        cofins_retid: parse_numero(&campos.valor_cofins),
        cs_retid: parse_numero(&campos.valor_csll),
        ir_retid: parse_numero(&campos.valor_ir),
        valor_liquido: parse_numero(&campos.valor_liquido),
        ..Default::default()
    };
    classificar_sobrescrevendo(&mut nota);
    Ok(nota)
}

fn capturar(campos: &mut CamposNfse, caminho: &[String], texto: &str) {
    if !contem(caminho, "InfNfse") {
        return;
    }
    let folha = caminho.last().map(String::as_str).unwrap_or("");
    let em_servico = contem(caminho, "Servico");
    let em_valores = em_servico && contem(caminho, "Valores");
    let em_tomador = contem(caminho, "TomadorServico");

    match folha {
        "NaturezaOperacao" => definir(&mut campos.natureza, texto),
        "DataEmissao" => definir(&mut campos.data_emissao, texto),
        "Numero" if !em_tomador => definir(&mut campos.numero, texto),
        "ItemListaServico" if em_servico => definir(&mut campos.item_lista, texto),
        "Cnpj" if em_tomador => definir(&mut campos.cnpj_tomador, texto),
        "Cpf" if em_tomador => definir(&mut campos.cpf_tomador, texto),
        "RazaoSocial" if em_tomador => definir(&mut campos.razao_tomador, texto),
        _ => {}
    }

    if em_valores {
        match folha {
            "ValorServicos" => definir(&mut campos.valor_servicos, texto),
            "ValorInss" => definir(&mut campos.valor_inss, texto),
            "ValorIss" => definir(&mut campos.valor_iss, texto),
            "ValorPis" => definir(&mut campos.valor_pis, texto),
            "ValorCofins" => definir(&mut campos.valor_cofins, texto),
            "ValorCsll" => definir(&mut campos.valor_csll, texto),
            "ValorIr" => definir(&mut campos.valor_ir, texto),
            "ValorLiquidoNfse" => definir(&mut campos.valor_liquido, texto),
            _ => {}
        }
    }
}
