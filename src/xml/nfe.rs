//! Goods-invoice (NFe) field extraction.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::classificacao::classificar_sobrescrevendo;
use crate::core::{NotaError, NotaFiscal, normalizar_data_iso, parse_numero};

use super::{contem, definir};

#[derive(Default)]
struct CamposNfe {
    natureza: String,
    cfop: String,
    dh_emissao: String,
    dh_saida: String,
    numero: String,
    cnpj_dest: String,
    cpf_dest: String,
    nome_dest: String,
    valor_produtos: String,
    valor_nota: String,
}

pub(super) fn extrair(xml: &str) -> Result<NotaFiscal, NotaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut campos = CamposNfe::default();
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

    let inscricao = if campos.cnpj_dest.is_empty() {
        campos.cpf_dest
    } else {
        campos.cnpj_dest
    };

    let mut nota = NotaFiscal {
        natureza: campos.natureza,
        data_emissao: data_iso(&campos.dh_emissao),
        data_entrada: data_iso(&campos.dh_saida),
        numero_nota: campos.numero,
        inscricao_federal: inscricao,
        razao_social: campos.nome_dest,
        cfop_natureza: campos.cfop.clone(),
        cfop: campos.cfop,
        valor_principal: parse_numero(&campos.valor_produtos),
        valor_liquido: parse_numero(&campos.valor_nota),
        ..Default::default()
    };
    classificar_sobrescrevendo(&mut nota);
    Ok(nota)
}

fn data_iso(texto: &str) -> String {
    if texto.is_empty() {
        String::new()
    } else {
        normalizar_data_iso(texto)
    }
}

fn capturar(campos: &mut CamposNfe, caminho: &[String], texto: &str) {
    if !contem(caminho, "infNFe") {
        return;
    }
    let folha = caminho.last().map(String::as_str).unwrap_or("");
    let em_ide = contem(caminho, "ide");
    let em_dest = contem(caminho, "dest");
    let em_total = contem(caminho, "ICMSTot");

    if em_ide {
        match folha {
            "natOp" => definir(&mut campos.natureza, texto),
            "CFOP" => definir(&mut campos.cfop, texto),
            "dhEmi" => definir(&mut campos.dh_emissao, texto),
            "dhSaiEnt" => definir(&mut campos.dh_saida, texto),
            "nNF" => definir(&mut campos.numero, texto),
            _ => {}
        }
    }
    if em_dest {
        match folha {
            "CNPJ" => definir(&mut campos.cnpj_dest, texto),
            "CPF" => definir(&mut campos.cpf_dest, texto),
            "xNome" => definir(&mut campos.nome_dest, texto),
            _ => {}
        }
    }
    if em_total {
        match folha {
            "vProd" => definir(&mut campos.valor_produtos, texto),
            "vNF" => definir(&mut campos.valor_nota, texto),
            _ => {}
        }
    }
}
