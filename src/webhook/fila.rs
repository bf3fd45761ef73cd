//! Retry dispatch queue for PDF payloads.
//!
//! A single dispatcher task drains the queue one item at a time; the only
//! suspension points are the outbound request and the backoff delay before
//! a retry. Ordering is FIFO except that a retried item re-joins at the
//! front, behind any other item already retrying ahead of it.
//!
//! Observers receive one typed [`EventoFila`] per status transition over an
//! unbounded channel, emitted synchronously at the transition.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::core::NotaError;

/// Current UTC instant as an ISO-8601 string.
pub(crate) fn agora_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A PDF payload handed to the extraction service.
#[derive(Debug, Clone)]
pub struct CargaPdf {
    pub nome: String,
    pub conteudo: Vec<u8>,
    /// Enqueue instant, sent as the `timestamp` form field.
    pub timestamp: String,
}

/// Raw reply from the extraction service: JSON when parseable, otherwise
/// the body text.
#[derive(Debug, Clone)]
pub enum RespostaExtracao {
    Json(Value),
    Texto(String),
}

/// Outbound boundary of the queue. The HTTP implementation is
/// [`TransporteHttp`]; tests substitute scripted transports.
pub trait TransporteExtracao: Send + Sync + 'static {
    fn enviar(
        &self,
        carga: &CargaPdf,
    ) -> impl Future<Output = Result<RespostaExtracao, NotaError>> + Send;
}

/// Queue tuning knobs.
#[derive(Debug, Clone)]
pub struct ConfigFila {
    /// Retry ceiling; a failure with the counter at this value finalizes
    /// the item as failed.
    pub max_tentativas: u32,
    /// Base backoff; the actual delay is this times the attempt number.
    pub atraso_nova_tentativa: Duration,
    /// Per-attempt deadline for the outbound request.
    pub timeout_envio: Duration,
}

impl Default for ConfigFila {
    fn default() -> Self {
        Self {
            max_tentativas: 3,
            atraso_nova_tentativa: Duration::from_secs(2),
            timeout_envio: Duration::from_secs(60),
        }
    }
}

/// Item status, serialized with the telemetry surface's labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusItem {
    #[serde(rename = "pending")]
    Pendente,
    #[serde(rename = "processing")]
    Processando,
    #[serde(rename = "retrying")]
    NovaTentativa,
    #[serde(rename = "completed")]
    Concluida,
    #[serde(rename = "failed")]
    Falha,
}

impl StatusItem {
    pub fn rotulo(&self) -> &'static str {
        match self {
            Self::Pendente => "pending",
            Self::Processando => "processing",
            Self::NovaTentativa => "retrying",
            Self::Concluida => "completed",
            Self::Falha => "failed",
        }
    }
}

/// One status transition of a queued item.
#[derive(Debug, Clone)]
pub struct EventoFila {
    pub id: u64,
    pub arquivo: String,
    pub timestamp: String,
    pub detalhe: DetalheEvento,
}

#[derive(Debug, Clone)]
pub enum DetalheEvento {
    Enfileirado,
    Processando,
    NovaTentativa { tentativa: u32, maximo: u32 },
    Concluida { resposta: RespostaExtracao },
    Falha { erro: String },
}

impl EventoFila {
    pub fn status(&self) -> StatusItem {
        match self.detalhe {
            DetalheEvento::Enfileirado => StatusItem::Pendente,
            DetalheEvento::Processando => StatusItem::Processando,
            DetalheEvento::NovaTentativa { .. } => StatusItem::NovaTentativa,
            DetalheEvento::Concluida { .. } => StatusItem::Concluida,
            DetalheEvento::Falha { .. } => StatusItem::Falha,
        }
    }

    pub fn mensagem(&self) -> String {
        match &self.detalhe {
            DetalheEvento::Enfileirado => format!("PDF adicionado à fila: {}", self.arquivo),
            DetalheEvento::Processando => format!("Processando {}...", self.arquivo),
            DetalheEvento::NovaTentativa { tentativa, maximo } => {
                format!("Tentativa {tentativa}/{maximo} para {}...", self.arquivo)
            }
            DetalheEvento::Concluida { .. } => {
                format!("PDF {} enviado com sucesso!", self.arquivo)
            }
            DetalheEvento::Falha { erro } => {
                format!("Erro ao processar {}: {erro}", self.arquivo)
            }
        }
    }

    /// Flat shape for the append-only progress-message stream.
    pub fn registro(&self) -> RegistroProgresso {
        RegistroProgresso {
            id: self.id,
            status: self.status(),
            mensagem: self.mensagem(),
            timestamp: self.timestamp.clone(),
        }
    }
}

/// Progress-stream entry: `{id, status, message, timestamp}`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistroProgresso {
    pub id: u64,
    pub status: StatusItem,
    #[serde(rename = "message")]
    pub mensagem: String,
    pub timestamp: String,
}

/// Queue snapshot for status displays.
///
/// `concluidas`/`falhas` are cumulative: terminal items leave the live
/// queue immediately, so live filtering would always read zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusFila {
    pub total: usize,
    #[serde(rename = "processing")]
    pub em_processamento: bool,
    #[serde(rename = "pending")]
    pub pendentes: usize,
    #[serde(rename = "completed")]
    pub concluidas: usize,
    #[serde(rename = "failed")]
    pub falhas: usize,
}

struct ItemFila {
    id: u64,
    carga: Arc<CargaPdf>,
    tentativas: u32,
}

struct Estado {
    fila: VecDeque<ItemFila>,
    em_processamento: bool,
    /// Bumped by `limpar()`; scheduled retries from an earlier epoch are
    /// discarded instead of re-joining.
    epoca: u64,
    proximo_id: u64,
    concluidas: usize,
    falhas: usize,
}

struct Nucleo<T> {
    estado: Mutex<Estado>,
    transporte: T,
    config: ConfigFila,
    eventos: mpsc::UnboundedSender<EventoFila>,
}

/// Handle to the dispatch queue. Cheap to clone; all clones share state.
pub struct FilaPdf<T: TransporteExtracao> {
    nucleo: Arc<Nucleo<T>>,
}

impl<T: TransporteExtracao> Clone for FilaPdf<T> {
    fn clone(&self) -> Self {
        Self {
            nucleo: Arc::clone(&self.nucleo),
        }
    }
}

impl<T: TransporteExtracao> FilaPdf<T> {
    /// Create a queue and the receiving end of its event stream.
    pub fn nova(
        transporte: T,
        config: ConfigFila,
    ) -> (Self, mpsc::UnboundedReceiver<EventoFila>) {
        let (eventos, receptor) = mpsc::unbounded_channel();
        let nucleo = Arc::new(Nucleo {
            estado: Mutex::new(Estado {
                fila: VecDeque::new(),
                em_processamento: false,
                epoca: 0,
                proximo_id: 1,
                concluidas: 0,
                falhas: 0,
            }),
            transporte,
            config,
            eventos,
        });
        (Self { nucleo }, receptor)
    }

    /// Submit a PDF. Starts the dispatcher when idle; when active, the item
    /// is picked up in the same run. Must be called within a tokio runtime.
    pub fn enfileirar(&self, nome: impl Into<String>, conteudo: Vec<u8>) -> u64 {
        let carga = Arc::new(CargaPdf {
            nome: nome.into(),
            conteudo,
            timestamp: agora_iso(),
        });
        let iniciar;
        let id;
        {
            let mut estado = self.nucleo.travar();
            id = estado.proximo_id;
            estado.proximo_id += 1;
            self.nucleo.emitir(id, &carga.nome, DetalheEvento::Enfileirado);
            estado.fila.push_back(ItemFila {
                id,
                carga: Arc::clone(&carga),
                tentativas: 0,
            });
            iniciar = !estado.em_processamento;
            if iniciar {
                estado.em_processamento = true;
            }
        }
        info!(id, arquivo = %carga.nome, "PDF adicionado à fila");
        if iniciar {
            Nucleo::despachar(Arc::clone(&self.nucleo));
        }
        id
    }

    /// Snapshot of counters for status displays.
    pub fn status(&self) -> StatusFila {
        let estado = self.nucleo.travar();
        StatusFila {
            total: estado.fila.len(),
            em_processamento: estado.em_processamento,
            pendentes: estado
                .fila
                .iter()
                .filter(|item| item.tentativas == 0)
                .count(),
            concluidas: estado.concluidas,
            falhas: estado.falhas,
        }
    }

    /// Discard all pending items and scheduled-retry bookkeeping.
    ///
    /// A request already in flight cannot be aborted; once it resolves,
    /// its retry (if any) is discarded instead of re-joining.
    pub fn limpar(&self) {
        let mut estado = self.nucleo.travar();
        estado.fila.clear();
        estado.epoca += 1;
        info!("fila de PDFs limpa");
    }

    /// Remove a specific item from the live queue.
    pub fn remover(&self, id: u64) -> bool {
        let mut estado = self.nucleo.travar();
        let antes = estado.fila.len();
        estado.fila.retain(|item| item.id != id);
        estado.fila.len() != antes
    }
}

impl<T: TransporteExtracao> Nucleo<T> {
    fn travar(&self) -> MutexGuard<'_, Estado> {
        self.estado.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emitir(&self, id: u64, arquivo: &str, detalhe: DetalheEvento) {
        let evento = EventoFila {
            id,
            arquivo: arquivo.to_string(),
            timestamp: agora_iso(),
            detalhe,
        };
        // Receptor descartado não é erro: a fila segue sem observadores.
        let _ = self.eventos.send(evento);
    }

    fn despachar(nucleo: Arc<Self>) {
        tokio::spawn(async move {
            nucleo.executar().await;
        });
    }

    async fn executar(self: Arc<Self>) {
        loop {
            let (item, epoca) = {
                let mut estado = self.travar();
                match estado.fila.pop_front() {
                    Some(item) => (item, estado.epoca),
                    None => {
                        estado.em_processamento = false;
                        break;
                    }
                }
            };

            self.emitir(item.id, &item.carga.nome, DetalheEvento::Processando);
            info!(id = item.id, arquivo = %item.carga.nome, tentativa = item.tentativas + 1, "processando PDF");

            let resultado = match tokio::time::timeout(
                self.config.timeout_envio,
                self.transporte.enviar(&item.carga),
            )
            .await
            {
                Ok(resultado) => resultado,
                Err(_) => Err(NotaError::Timeout(format!(
                    "a requisição demorou mais de {}s para responder",
                    self.config.timeout_envio.as_secs()
                ))),
            };

            match resultado {
                Ok(resposta) => {
                    self.travar().concluidas += 1;
                    info!(id = item.id, arquivo = %item.carga.nome, "PDF processado com sucesso");
                    self.emitir(
                        item.id,
                        &item.carga.nome,
                        DetalheEvento::Concluida { resposta },
                    );
                }
                Err(erro) => {
                    if item.tentativas < self.config.max_tentativas {
                        let mut item = item;
                        item.tentativas += 1;
                        warn!(
                            id = item.id,
                            arquivo = %item.carga.nome,
                            tentativa = item.tentativas,
                            maximo = self.config.max_tentativas,
                            erro = %erro,
                            "falha no envio, reagendando"
                        );
                        self.emitir(
                            item.id,
                            &item.carga.nome,
                            DetalheEvento::NovaTentativa {
                                tentativa: item.tentativas,
                                maximo: self.config.max_tentativas,
                            },
                        );
                        let atraso = self.config.atraso_nova_tentativa * item.tentativas;
                        let nucleo = Arc::clone(&self);
                        tokio::spawn(async move {
                            tokio::time::sleep(atraso).await;
                            nucleo.reenfileirar(item, epoca);
                        });
                    } else {
                        self.travar().falhas += 1;
                        error!(
                            id = item.id,
                            arquivo = %item.carga.nome,
                            tentativas = item.tentativas,
                            erro = %erro,
                            "PDF falhou após esgotar as tentativas"
                        );
                        self.emitir(
                            item.id,
                            &item.carga.nome,
                            DetalheEvento::Falha {
                                erro: erro.to_string(),
                            },
                        );
                    }
                }
            }
        }
    }

    /// Re-insert a retried item at the front, behind any item already
    /// retrying ahead of it. Restarts the dispatcher when it went idle.
    fn reenfileirar(self: &Arc<Self>, item: ItemFila, epoca: u64) {
        let iniciar;
        {
            let mut estado = self.travar();
            if estado.epoca != epoca {
                info!(id = item.id, "nova tentativa descartada: fila foi limpa");
                return;
            }
            let posicao = estado
                .fila
                .iter()
                .take_while(|na_frente| na_frente.tentativas > 0)
                .count();
            estado.fila.insert(posicao, item);
            iniciar = !estado.em_processamento;
            if iniciar {
                estado.em_processamento = true;
            }
        }
        if iniciar {
            Nucleo::despachar(Arc::clone(self));
        }
    }
}

/// HTTP transport: multipart POST with `pdf`, `filename`, and `timestamp`
/// fields. The per-attempt timeout is enforced by the queue.
pub struct TransporteHttp {
    cliente: reqwest::Client,
    url: String,
}

impl TransporteHttp {
    pub fn novo(url: impl Into<String>) -> Result<Self, NotaError> {
        let cliente = reqwest::Client::builder()
            .build()
            .map_err(|e| NotaError::Rede(e.to_string()))?;
        Ok(Self {
            cliente,
            url: url.into(),
        })
    }
}

impl TransporteExtracao for TransporteHttp {
    fn enviar(
        &self,
        carga: &CargaPdf,
    ) -> impl Future<Output = Result<RespostaExtracao, NotaError>> + Send {
        async move {
            let parte = reqwest::multipart::Part::bytes(carga.conteudo.clone())
                .file_name(carga.nome.clone());
            let formulario = reqwest::multipart::Form::new()
                .part("pdf", parte)
                .text("filename", carga.nome.clone())
                .text("timestamp", carga.timestamp.clone());

            let resposta = self
                .cliente
                .post(&self.url)
                .multipart(formulario)
                .send()
                .await
                .map_err(|e| NotaError::Rede(e.to_string()))?;

            let status = resposta.status();
            let corpo = resposta
                .text()
                .await
                .map_err(|e| NotaError::Rede(e.to_string()))?;
            if !status.is_success() {
                return Err(NotaError::Rede(format!("HTTP {status}: {corpo}")));
            }

            match serde_json::from_str::<Value>(&corpo) {
                Ok(json) => Ok(RespostaExtracao::Json(json)),
                Err(_) => Ok(RespostaExtracao::Texto(corpo)),
            }
        }
    }
}
