//! The answer engine: classification, retrieval, escalation, assembly,
//! generation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use deskbot_chunk::SectionChunker;
use deskbot_core::{
    Answer, Chunk, ChatTurn, Chunker, CompletionClient, ConfidenceBand, DeskbotConfig, Document,
    EmbeddingClient, Result, SourceRef, VectorIndex,
};
use deskbot_query::{ContextAssembler, EscalationEvaluator, QueryClassifier, Retriever};

/// System instructions for the answer-generation capability.
const SYSTEM_INSTRUCTIONS: &str = "\
You are a support assistant for a cloud hosting helpdesk.

- Answer from the provided knowledge base context; do not invent details.
- Give step-by-step instructions when the question is procedural.
- Include exact URLs, commands, and error codes from the context.
- If the context does not cover the question, say so and offer to connect \
the user with a support specialist.
- Keep a professional, friendly tone and stay concise.";

/// Message shown to the user when the query is handed to a human.
const HANDOFF_MESSAGE: &str = "I'd like to connect you with one of our support \
specialists who can better assist you with this request. Please hold while I \
transfer you.";

/// Conversation turns forwarded to generation.
const HISTORY_WINDOW: usize = 5;

/// Sources reported back to the caller.
const MAX_SOURCES: usize = 5;

/// Top-level orchestrator over the index, the capability clients, and the
/// query-time stages.
pub struct AnswerEngine<I, E, C> {
    index: Arc<I>,
    embedder: Arc<E>,
    completer: Arc<C>,
    chunker: SectionChunker,
    classifier: QueryClassifier,
    retriever: Retriever<I, E>,
    assembler: ContextAssembler,
    evaluator: EscalationEvaluator,
    config: DeskbotConfig,
}

impl<I, E, C> AnswerEngine<I, E, C>
where
    I: VectorIndex,
    E: EmbeddingClient,
    C: CompletionClient,
{
    /// Build an engine from configuration and the external collaborators.
    ///
    /// Fails fast on unusable configuration (e.g. chunk overlap not
    /// smaller than the chunk size).
    pub fn new(
        config: DeskbotConfig,
        index: Arc<I>,
        embedder: Arc<E>,
        completer: Arc<C>,
    ) -> Result<Self> {
        let chunker = SectionChunker::new(config.chunking.clone())?;
        let classifier = QueryClassifier::new(config.taxonomy.clone());
        let retriever = Retriever::new(
            index.clone(),
            embedder.clone(),
            config.retrieval.clone(),
            config.taxonomy.clone(),
        );
        let assembler = ContextAssembler::new(config.context.clone(), config.taxonomy.clone());
        let evaluator = EscalationEvaluator::new(config.escalation.clone());

        Ok(Self {
            index,
            embedder,
            completer,
            chunker,
            classifier,
            retriever,
            assembler,
            evaluator,
            config,
        })
    }

    /// Ingest one document: chunk, embed, and upsert in batches.
    ///
    /// Empty or whitespace-only documents are skipped with a warning
    /// rather than failed; index and embedding failures propagate.
    pub async fn ingest(&self, doc: &Document) -> Result<Vec<Chunk>> {
        if doc.text.trim().is_empty() {
            warn!(doc_id = %doc.id, "skipping document with empty text");
            return Ok(Vec::new());
        }

        let chunks = self.chunker.chunk(doc)?;
        info!(doc_id = %doc.id, chunks = chunks.len(), "ingesting document");

        for batch in chunks.chunks(self.config.embedding.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedder.embed(&texts).await?;
            self.index.upsert(batch, &embeddings).await?;
        }

        Ok(chunks)
    }

    /// Ingest a set of documents, skipping the empty ones.
    pub async fn ingest_all(&self, docs: &[Document]) -> Result<usize> {
        let mut total = 0;
        for doc in docs {
            total += self.ingest(doc).await?.len();
        }
        Ok(total)
    }

    /// Answer a query, or decide to hand it to a human.
    ///
    /// Escalation is a structured outcome, never an error; only
    /// infrastructure failures (index, capabilities) surface as `Err`.
    pub async fn answer(&self, query_text: &str, history: &[ChatTurn]) -> Result<Answer> {
        let classification = self.classifier.classify(query_text);
        debug!(
            category = %classification.category,
            confidence = classification.confidence,
            "classified query"
        );

        let candidates = self
            .retriever
            .retrieve(query_text, Some(classification.category.as_str()), None)
            .await?;

        let decision = self.evaluator.evaluate(
            query_text,
            &candidates,
            Some(classification.category.as_str()),
        );
        if decision.escalate {
            info!(reason = %decision.reason, "escalating to human agent");
            return Ok(Answer {
                escalate: true,
                reason: Some(decision.reason.to_string()),
                response: Some(HANDOFF_MESSAGE.to_string()),
                confidence: ConfidenceBand::Low,
                sources: Vec::new(),
            });
        }

        let context = self
            .assembler
            .assemble(&candidates, Some(classification.category.as_str()));

        let user_turn = format!(
            "Based on the following knowledge base information, please answer \
             the user's question.\n\nKnowledge Base Context:\n{}\n\nUser Question: {}",
            context.text, query_text
        );

        let window_start = history.len().saturating_sub(HISTORY_WINDOW);
        let response = self
            .completer
            .complete(
                SYSTEM_INSTRUCTIONS,
                &history[window_start..],
                &user_turn,
                &self.config.generation,
            )
            .await?;

        let confidence = confidence_band(&candidates);
        let sources = candidates
            .iter()
            .take(MAX_SOURCES)
            .map(|c| SourceRef {
                chunk_id: c.chunk_id.clone(),
                category: c.meta.category.clone(),
                relevance: c.combined_score,
            })
            .collect();

        Ok(Answer {
            escalate: false,
            reason: Some(decision.reason.to_string()),
            response: Some(response),
            confidence,
            sources,
        })
    }
}

/// Band the mean combined score of the top candidates.
fn confidence_band(candidates: &[deskbot_core::RetrievalCandidate]) -> ConfidenceBand {
    let top = &candidates[..candidates.len().min(3)];
    if top.is_empty() {
        return ConfidenceBand::Low;
    }
    let avg: f32 = top.iter().map(|c| c.combined_score).sum::<f32>() / top.len() as f32;
    if avg > 0.7 {
        ConfidenceBand::High
    } else if avg > 0.4 {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}
