use thiserror::Error;

/// Errors raised while extracting, validating, or dispatching invoice data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotaError {
    /// No recognizable schema anchor found in an XML document.
    #[error("formato não reconhecido: {0}")]
    FormatoDesconhecido(String),

    /// Malformed XML or a spreadsheet missing the expected structure.
    #[error("erro de parse: {0}")]
    Parse(String),

    /// A record or row missing required fields.
    #[error("validação: {0}")]
    Validacao(String),

    /// Connection failure or non-2xx response on an outbound request.
    #[error("erro de rede: {0}")]
    Rede(String),

    /// Per-attempt deadline exceeded. Treated like [`NotaError::Rede`]
    /// for retry purposes.
    #[error("timeout: {0}")]
    Timeout(String),
}
