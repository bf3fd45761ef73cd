//! File-selection boundary: extension dispatch and batch import with
//! per-file error containment.

use std::path::Path;

use tracing::{info, warn};

use crate::classificacao::MapaCfop;
use crate::core::{NotaError, NotaFiscal};
use crate::planilha::{extrair_mapa_cfop, extrair_planilha};
use crate::xml::extrair_xml;

/// Outcome of processing one named file.
#[derive(Debug)]
pub enum ArquivoProcessado {
    /// Draft records ready for the analysis pass.
    Notas(Vec<NotaFiscal>),
    /// A CFOP-mapping workbook, merged into the active mapping.
    MapaCfop(MapaCfop),
    /// PDFs are never extracted locally; the caller enqueues them.
    PdfPendente,
}

/// Dispatch one file by extension.
///
/// `.xml` goes to the XML extractor; `.xlsx`/`.xls` tries the CFOP-mapping
/// extractor first, falling back to invoice rows when that fails; `.pdf`
/// is reported back for enqueueing.
pub fn processar_arquivo(nome: &str, conteudo: &[u8]) -> Result<ArquivoProcessado, NotaError> {
    let extensao = Path::new(nome)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extensao.as_str() {
        "xml" => {
            let texto = String::from_utf8_lossy(conteudo);
            Ok(ArquivoProcessado::Notas(extrair_xml(&texto)?))
        }
        "xlsx" | "xls" => match extrair_mapa_cfop(conteudo) {
            Ok(mapa) => Ok(ArquivoProcessado::MapaCfop(mapa)),
            Err(motivo) => {
                info!(arquivo = %nome, %motivo, "não é planilha de mapeamento, tratando como notas");
                Ok(ArquivoProcessado::Notas(extrair_planilha(conteudo)?))
            }
        },
        "pdf" => Ok(ArquivoProcessado::PdfPendente),
        _ => Err(NotaError::FormatoDesconhecido(format!(
            "extensão não suportada: {nome}"
        ))),
    }
}

/// Aggregate result of a batch import.
#[derive(Debug, Default)]
pub struct ResumoImportacao {
    /// Draft records loaded from XML and spreadsheet files.
    pub notas: Vec<NotaFiscal>,
    /// CFOP-mapping entries merged from mapping workbooks.
    pub mapa_cfop: MapaCfop,
    /// Names of PDFs awaiting dispatch.
    pub pdfs_pendentes: Vec<String>,
    /// Per-file failures; one bad file never blocks the others.
    pub erros: Vec<(String, NotaError)>,
}

/// Process a batch of named files, containing errors per file.
pub fn processar_lote<'a, I>(arquivos: I) -> ResumoImportacao
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut resumo = ResumoImportacao::default();
    for (nome, conteudo) in arquivos {
        match processar_arquivo(nome, conteudo) {
            Ok(ArquivoProcessado::Notas(notas)) => {
                info!(arquivo = %nome, registros = notas.len(), "notas carregadas");
                resumo.notas.extend(notas);
            }
            Ok(ArquivoProcessado::MapaCfop(mapa)) => {
                info!(arquivo = %nome, entradas = mapa.len(), "mapeamento CFOP atualizado");
                resumo.mapa_cfop.extend(mapa);
            }
            Ok(ArquivoProcessado::PdfPendente) => {
                resumo.pdfs_pendentes.push(nome.to_string());
            }
            Err(erro) => {
                warn!(arquivo = %nome, %erro, "falha ao processar arquivo");
                resumo.erros.push((nome.to_string(), erro));
            }
        }
    }
    resumo
}
