//! Bulk export of canonical records to a webhook endpoint.
//!
//! This path formats dates as pt-BR display strings rather than ISO; the
//! receiving system expects them that way.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::core::{NotaError, NotaFiscal, formatar_data_ptbr};

use super::fila::{RespostaExtracao, agora_iso};

/// Export endpoint configuration.
#[derive(Debug, Clone)]
pub struct ConfigExportacao {
    pub url: String,
    pub timeout: Duration,
}

impl ConfigExportacao {
    pub fn nova(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CorpoExportacao {
    timestamp: String,
    total_registros: usize,
    dados: Vec<RegistroExportacao>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistroExportacao {
    natureza: String,
    data_emissao: String,
    data_entrada: String,
    numero_nota: String,
    inscricao_federal: String,
    razao_social: String,
    cfop_natureza: String,
    valor_principal: Decimal,
    inss_retid: Decimal,
    iss_retid: Decimal,
    pis_retid: Decimal,
    cofins_retid: Decimal,
    cs_retid: Decimal,
    ir_retid: Decimal,
    valor_liquido: Decimal,
    tabela_ctb: String,
}

impl RegistroExportacao {
    fn de(nota: &NotaFiscal) -> Self {
        let cfop_natureza = if nota.cfop_natureza.is_empty() {
            nota.cfop.clone()
        } else {
            nota.cfop_natureza.clone()
        };
        Self {
            natureza: nota.natureza.clone(),
            data_emissao: formatar_data_ptbr(&nota.data_emissao),
            data_entrada: formatar_data_ptbr(&nota.data_entrada),
            numero_nota: nota.numero_nota.clone(),
            inscricao_federal: nota.inscricao_federal.clone(),
            razao_social: nota.razao_social.clone(),
            cfop_natureza,
            valor_principal: nota.valor_principal,
            inss_retid: nota.inss_retid,
            iss_retid: nota.iss_retid,
            pis_retid: nota.pis_retid,
            cofins_retid: nota.cofins_retid,
            cs_retid: nota.cs_retid,
            ir_retid: nota.ir_retid,
            valor_liquido: nota.valor_liquido,
            tabela_ctb: nota.tabela_ctb.clone(),
        }
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ResultadoExportacao {
    pub mensagem: String,
    pub resposta: RespostaExtracao,
}

/// POST `{timestamp, totalRegistros, dados}` to the configured endpoint.
///
/// # Errors
///
/// [`NotaError::Validacao`] when there is nothing to send or no URL;
/// [`NotaError::Timeout`] after 30 s without a response;
/// [`NotaError::Rede`] on connection failure or a non-2xx reply, carrying
/// the status code and body text.
pub async fn exportar_webhook(
    notas: &[NotaFiscal],
    config: &ConfigExportacao,
) -> Result<ResultadoExportacao, NotaError> {
    if notas.is_empty() {
        return Err(NotaError::Validacao("nenhum dado para enviar".into()));
    }
    if config.url.trim().is_empty() {
        return Err(NotaError::Validacao("URL do webhook não fornecida".into()));
    }

    let corpo = CorpoExportacao {
        timestamp: agora_iso(),
        total_registros: notas.len(),
        dados: notas.iter().map(RegistroExportacao::de).collect(),
    };

    info!(url = %config.url, total = notas.len(), "exportando para webhook");

    let cliente = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| NotaError::Rede(e.to_string()))?;

    let resposta = cliente
        .post(&config.url)
        .json(&corpo)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                NotaError::Timeout(format!(
                    "a requisição demorou mais de {}s para responder",
                    config.timeout.as_secs()
                ))
            } else {
                NotaError::Rede(e.to_string())
            }
        })?;

    let status = resposta.status();
    let corpo_resposta = resposta
        .text()
        .await
        .map_err(|e| NotaError::Rede(e.to_string()))?;
    if !status.is_success() {
        return Err(NotaError::Rede(format!("HTTP {status}: {corpo_resposta}")));
    }

    let resposta = match serde_json::from_str::<Value>(&corpo_resposta) {
        Ok(json) => RespostaExtracao::Json(json),
        Err(_) => RespostaExtracao::Texto(corpo_resposta),
    };

    info!(total = notas.len(), "exportação concluída");
    Ok(ResultadoExportacao {
        mensagem: format!(
            "Dados exportados com sucesso para o webhook. Total de registros: {}",
            notas.len()
        ),
        resposta,
    })
}
