//! One user's document and its lifecycle.
//!
//! ```text
//! Empty ──upload──▶ DocumentLoaded ──first ask──▶ Indexing ──▶ Ready
//!   ▲                    ▲   ▲                       │
//!   │                    │   └──── build failed ─────┘
//!   └──── clear ─────────┴──────── upload (any phase) replaces the document
//! ```
//!
//! Every upload and clear bumps the session epoch. Work that started under an
//! older epoch (an index build, a question) notices on completion and reports
//! [`SessionError::DocumentChanged`] rather than touching the new document.
//! Uploads take a ticket when they start; an upload only commits if no later
//! upload or clear has started since, so the last one issued wins.

use std::sync::Arc;

use docqa_core::Credentials;
use docqa_rag::{Chunk, Document, VectorIndex, is_pdf_upload};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SessionError};
use crate::pipeline::QaPipeline;
use crate::synthesizer::Answer;

/// Opaque identifier of a session.
pub type SessionId = String;

/// Where a session is in its document lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No document.
    Empty,
    /// Text extracted and chunked, index not built yet.
    DocumentLoaded,
    /// Chunks are being embedded.
    Indexing,
    /// Index built; questions and suggestions are served.
    Ready,
}

/// Returned by a successful [`Session::upload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// A snapshot of a session for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub has_document: bool,
    pub filename: Option<String>,
    pub chunk_count: usize,
    pub index_ready: bool,
    pub phase: SessionPhase,
}

/// Result of [`Session::suggest_topics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestions {
    pub suggestions: Vec<String>,
    pub has_document: bool,
}

#[derive(Debug, Default)]
struct SessionState {
    epoch: u64,
    document: Option<Document>,
    chunks: Vec<Chunk>,
    index: Option<Arc<VectorIndex>>,
    /// Epoch of the most recently started index build.
    building: Option<u64>,
    suggestions: Option<Vec<String>>,
    /// Ticket of the most recently started upload or clear.
    latest_upload: u64,
}

impl SessionState {
    fn replace(&mut self, document: Option<Document>, chunks: Vec<Chunk>) {
        self.epoch += 1;
        self.document = document;
        self.chunks = chunks;
        self.index = None;
        self.building = None;
        self.suggestions = None;
    }
}

/// A single document question-answering session.
///
/// All methods take `&self`; a session is shared as `Arc<Session>` and its
/// operations may run concurrently. Questions run against a snapshot of the
/// index without holding the state lock. Index builds are serialized, so
/// concurrent first questions wait for one build instead of starting several.
pub struct Session {
    id: SessionId,
    pipeline: Arc<QaPipeline>,
    state: RwLock<SessionState>,
    build_lock: Mutex<()>,
}

impl Session {
    pub fn new(id: impl Into<SessionId>, pipeline: Arc<QaPipeline>) -> Self {
        Self {
            id: id.into(),
            pipeline,
            state: RwLock::new(SessionState::default()),
            build_lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pipeline(&self) -> &Arc<QaPipeline> {
        &self.pipeline
    }

    /// Load a document, replacing any previous one.
    ///
    /// Extraction and chunking run on the blocking thread pool. On any error
    /// the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`SessionError::UnsupportedContentType`] if the upload is not a PDF
    /// - [`SessionError::Extraction`] if no text can be read from `bytes`
    /// - [`SessionError::EmptyDocument`] if the text yields no chunks
    /// - [`SessionError::DocumentChanged`] if another upload or a clear started
    ///   while this one was extracting
    pub async fn upload(
        &self,
        filename: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> Result<UploadReceipt> {
        if !is_pdf_upload(filename, content_type) {
            warn!(session.id = %self.id, filename, ?content_type, "rejected non-PDF upload");
            return Err(SessionError::UnsupportedContentType {
                filename: filename.to_string(),
                content_type: content_type.map(str::to_string),
            });
        }

        let ticket = {
            let mut state = self.state.write().await;
            state.latest_upload += 1;
            state.latest_upload
        };

        let extractor = Arc::clone(self.pipeline.extractor());
        let chunker = Arc::clone(self.pipeline.chunker());
        let payload = bytes.to_vec();
        let (page_count, text, chunks) = tokio::task::spawn_blocking(move || {
            let extracted = extractor.extract(&payload)?;
            let text = extracted.text();
            let chunks = chunker.chunk(&text);
            Ok::<_, docqa_rag::RagError>((extracted.page_count(), text, chunks))
        })
        .await
        .map_err(|e| {
            error!(session.id = %self.id, error = %e, "extraction task failed");
            SessionError::Extraction(format!("extraction task failed: {e}"))
        })??;

        if chunks.is_empty() {
            warn!(session.id = %self.id, filename, "document produced no chunks");
            return Err(SessionError::EmptyDocument);
        }

        let document = Document {
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            byte_len: bytes.len(),
            page_count,
            text,
        };
        let receipt = UploadReceipt {
            filename: document.filename.clone(),
            page_count: document.page_count,
            chunk_count: chunks.len(),
        };

        let mut state = self.state.write().await;
        if state.latest_upload != ticket {
            warn!(
                session.id = %self.id,
                filename,
                ticket,
                latest = state.latest_upload,
                "newer upload or clear started, discarding this upload"
            );
            return Err(SessionError::DocumentChanged);
        }
        let replaced = state.document.is_some();
        state.replace(Some(document), chunks);
        info!(
            session.id = %self.id,
            filename,
            byte_len = bytes.len(),
            page_count = receipt.page_count,
            chunk_count = receipt.chunk_count,
            replaced,
            epoch = state.epoch,
            "document loaded"
        );

        Ok(receipt)
    }

    /// Current document and index status.
    pub async fn status(&self) -> SessionStatus {
        let state = self.state.read().await;
        SessionStatus {
            has_document: state.document.is_some(),
            filename: state.document.as_ref().map(|d| d.filename.clone()),
            chunk_count: state.chunks.len(),
            index_ready: state.index.is_some(),
            phase: self.phase_of(&state),
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        let state = self.state.read().await;
        self.phase_of(&state)
    }

    fn phase_of(&self, state: &SessionState) -> SessionPhase {
        if state.document.is_none() {
            SessionPhase::Empty
        } else if state.index.is_some() {
            SessionPhase::Ready
        } else if state.building == Some(state.epoch) && self.build_lock.try_lock().is_err() {
            SessionPhase::Indexing
        } else {
            SessionPhase::DocumentLoaded
        }
    }

    /// Answer `question` from the loaded document, building the index first
    /// if this is the first question since the upload.
    ///
    /// An answer of [`NOT_SURE_ANSWER`](crate::NOT_SURE_ANSWER) is a success.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoDocument`] if nothing is loaded
    /// - [`SessionError::EmptyQuestion`] if `question` is blank
    /// - [`SessionError::IndexBuild`] if the lazy build fails
    /// - [`SessionError::Embedding`] / [`SessionError::Generation`] on service failures
    /// - [`SessionError::DocumentChanged`] if the document was replaced or
    ///   cleared before the answer was ready
    pub async fn ask(&self, question: &str, credentials: &Credentials) -> Result<Answer> {
        if self.state.read().await.document.is_none() {
            return Err(SessionError::NoDocument);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(SessionError::EmptyQuestion);
        }

        let (epoch, index) = self.ensure_index(credentials).await?;

        let results = self.pipeline.retriever().retrieve(&index, question, credentials).await?;
        self.check_epoch(epoch).await?;

        let answer = self.pipeline.synthesizer().synthesize(question, &results, credentials).await?;
        self.check_epoch(epoch).await?;

        info!(
            session.id = %self.id,
            retrieved = results.len(),
            sources_used = answer.sources_used,
            "question answered"
        );
        Ok(answer)
    }

    /// Build the index now instead of on the first question.
    ///
    /// Does nothing if the index is already built.
    ///
    /// # Errors
    ///
    /// Same as the build step of [`ask`](Self::ask): [`SessionError::NoDocument`],
    /// [`SessionError::IndexBuild`] or [`SessionError::DocumentChanged`].
    pub async fn build_index(&self, credentials: &Credentials) -> Result<()> {
        self.ensure_index(credentials).await.map(|_| ())
    }

    /// Build the index for the current document if it is not built yet, and
    /// return it with the epoch it belongs to.
    async fn ensure_index(&self, credentials: &Credentials) -> Result<(u64, Arc<VectorIndex>)> {
        {
            let state = self.state.read().await;
            if let Some(index) = &state.index {
                return Ok((state.epoch, Arc::clone(index)));
            }
            if state.document.is_none() {
                return Err(SessionError::NoDocument);
            }
        }

        let _build = self.build_lock.lock().await;

        let (epoch, chunks) = {
            let mut state = self.state.write().await;
            // Another caller may have finished a build while we waited.
            if let Some(index) = &state.index {
                return Ok((state.epoch, Arc::clone(index)));
            }
            if state.document.is_none() {
                return Err(SessionError::NoDocument);
            }
            state.building = Some(state.epoch);
            (state.epoch, state.chunks.clone())
        };

        let chunk_count = chunks.len();
        info!(session.id = %self.id, chunk_count, epoch, "building index");

        let built = VectorIndex::build(
            chunks,
            self.pipeline.embedding_provider().as_ref(),
            credentials,
            self.pipeline.config().rag.embed_batch_size,
        )
        .await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            warn!(
                session.id = %self.id,
                epoch,
                current = state.epoch,
                "document changed during index build"
            );
            return Err(SessionError::DocumentChanged);
        }
        state.building = None;

        match built {
            Ok(index) => {
                let index = Arc::new(index);
                state.index = Some(Arc::clone(&index));
                info!(
                    session.id = %self.id,
                    chunk_count,
                    dimensions = index.dimensions(),
                    "index built"
                );
                Ok((epoch, index))
            }
            Err(e) => {
                error!(session.id = %self.id, error = %e, "index build failed");
                Err(SessionError::IndexBuild(e))
            }
        }
    }

    async fn check_epoch(&self, epoch: u64) -> Result<()> {
        let current = self.state.read().await.epoch;
        if current == epoch {
            Ok(())
        } else {
            debug!(session.id = %self.id, epoch, current, "discarding stale result");
            Err(SessionError::DocumentChanged)
        }
    }

    /// Questions a reader could ask about the loaded document.
    ///
    /// Only served once the index is built; before that the list is empty.
    /// Results are cached until the document changes, unless `force` is set.
    /// Never fails: model errors produce an empty list.
    pub async fn suggest_topics(&self, credentials: &Credentials, force: bool) -> TopicSuggestions {
        let (epoch, index) = {
            let state = self.state.read().await;
            let has_document = state.document.is_some();
            let Some(index) = state.index.clone() else {
                debug!(session.id = %self.id, has_document, "index not ready, no suggestions");
                return TopicSuggestions { suggestions: Vec::new(), has_document };
            };
            if !force {
                if let Some(cached) = &state.suggestions {
                    debug!(
                        session.id = %self.id,
                        count = cached.len(),
                        "serving cached suggestions"
                    );
                    return TopicSuggestions { suggestions: cached.clone(), has_document };
                }
            }
            (state.epoch, index)
        };

        let suggestions = self.pipeline.suggester().suggest(&index, credentials).await;

        let mut state = self.state.write().await;
        if state.epoch != epoch {
            debug!(session.id = %self.id, "document changed while suggesting, dropping them");
            let has_document = state.document.is_some();
            return TopicSuggestions { suggestions: Vec::new(), has_document };
        }
        if !suggestions.is_empty() {
            state.suggestions = Some(suggestions.clone());
        }
        TopicSuggestions { suggestions, has_document: true }
    }

    /// Drop the document, its chunks, index and cached suggestions.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let had_document = state.document.is_some();
        state.latest_upload += 1;
        state.replace(None, Vec::new());
        info!(session.id = %self.id, had_document, epoch = state.epoch, "session cleared");
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish_non_exhaustive()
    }
}
