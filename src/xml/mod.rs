//! Structured-format extraction from electronic invoice XML.
//!
//! Two schema families are recognized: goods invoices (NFe, anchored on
//! `infNFe`) and service invoices (NFSe, anchored on `InfNfse`). Detection
//! streams the document until one anchor appears; neither anchor is a
//! [`NotaError::FormatoDesconhecido`].

mod nfe;
mod nfse;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::core::{NotaError, NotaFiscal};

/// XML schema variant of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsquemaXml {
    /// Nota Fiscal Eletrônica (goods).
    Nfe,
    /// Nota Fiscal de Serviços Eletrônica (services).
    Nfse,
}

/// Detect the schema variant by its anchor element.
pub fn detectar_esquema(xml: &str) -> Result<EsquemaXml, NotaError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    b"infNFe" => return Ok(EsquemaXml::Nfe),
                    b"InfNfse" => return Ok(EsquemaXml::Nfse),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(NotaError::Parse(format!("XML malformado: {e}"))),
            _ => {}
        }
    }

    Err(NotaError::FormatoDesconhecido(
        "o arquivo deve ser uma NFe ou NFSe válida".into(),
    ))
}

/// Extract one canonical record from an XML document.
///
/// Exactly one record per document; classification is applied immediately,
/// unconditionally overwriting `cfop_natureza`/`tabela_ctb` when the
/// natureza resolves.
pub fn extrair_xml(xml: &str) -> Result<Vec<NotaFiscal>, NotaError> {
    let nota = match detectar_esquema(xml)? {
        EsquemaXml::Nfe => nfe::extrair(xml)?,
        EsquemaXml::Nfse => nfse::extrair(xml)?,
    };
    Ok(vec![nota])
}

/// First occurrence wins, mirroring document-order selection.
pub(crate) fn definir(campo: &mut String, texto: &str) {
    if campo.is_empty() {
        *campo = texto.to_string();
    }
}

pub(crate) fn contem(caminho: &[String], nome: &str) -> bool {
    caminho.iter().any(|p| p == nome)
}
