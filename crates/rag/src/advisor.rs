//! Consultation orchestration.
//!
//! The advisor runs evidence retrieval, folds the evidence into the advice
//! prompt and sends it over the caller's chat session. A condition with no
//! retrievable evidence never reaches the model. Pharmacy lookup runs
//! independently of the advice outcome.

use crate::evidence::EvidenceRetriever;
use crate::fetch::HttpPageFetcher;
use crate::pharmacy::PharmacyLocator;
use crate::search::DuckDuckGoSearch;
use crate::types::PharmacyEntry;
use medassist_core::{AppConfig, AppError, AppResult, GenerationSettings};
use medassist_llm::{create_client_with_timeout, ChatSession, LlmClient, LlmRequest, SessionStore};
use medassist_prompt::{build_prompt, load_prompt, BuiltPrompt, PromptDefinition, DEFAULT_ADVICE_PROMPT_ID};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of asking for advice on one condition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AdviceOutcome {
    /// The model answered; `sources` are the pages the evidence came from
    Answered { answer: String, sources: Vec<String> },

    /// Retrieval found nothing, so the model was not consulted
    NoData,

    /// The model call failed
    Failed { message: String },
}

/// Advice plus, when a location was given, the pharmacy lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consultation {
    pub condition: String,
    pub advice: AdviceOutcome,

    /// `None` when no location was given; `Some(empty)` when the lookup found nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pharmacies: Option<Vec<PharmacyEntry>>,
}

/// Medical assistant over one LLM client, holding a chat session per user.
pub struct Advisor {
    llm: Arc<dyn LlmClient>,
    model: String,
    generation: GenerationSettings,
    prompt: PromptDefinition,
    retriever: EvidenceRetriever,
    locator: PharmacyLocator,
    sessions: SessionStore,
}

impl Advisor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        generation: GenerationSettings,
        prompt: PromptDefinition,
        retriever: EvidenceRetriever,
        locator: PharmacyLocator,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            generation,
            prompt,
            retriever,
            locator,
            sessions: SessionStore::new(),
        }
    }

    /// Wire the production search, fetch and LLM backends from configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let search = Arc::new(DuckDuckGoSearch::new(&config.search)?);
        let fetcher = Arc::new(HttpPageFetcher::new(&config.search.user_agent)?);

        let endpoint = config.provider_endpoint(&config.provider);
        let api_key = config.resolve_api_key(&config.provider);
        let llm = create_client_with_timeout(
            &config.provider,
            endpoint.as_deref(),
            api_key.as_deref(),
            config.provider_timeout(&config.provider),
        )
        .map_err(AppError::Config)?;

        let prompt = load_prompt(&config.workspace, DEFAULT_ADVICE_PROMPT_ID)?;

        tracing::debug!(
            provider = llm.provider_name(),
            model = %config.model,
            prompt = %prompt.id,
            "Advisor ready"
        );

        Ok(Self::new(
            llm,
            config.model.clone(),
            config.generation.clone(),
            prompt,
            EvidenceRetriever::new(search.clone(), fetcher, config.retrieval.clone()),
            PharmacyLocator::new(search, config.pharmacy.clone()),
        ))
    }

    pub fn retriever(&self) -> &EvidenceRetriever {
        &self.retriever
    }

    pub fn locator(&self) -> &PharmacyLocator {
        &self.locator
    }

    pub fn session(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.get(session_id)
    }

    /// Advice for `condition` on the session `session_id`.
    pub async fn advise(&mut self, session_id: &str, condition: &str) -> AppResult<AdviceOutcome> {
        let Some((request, sources)) = self.prepare(condition).await? else {
            return Ok(AdviceOutcome::NoData);
        };

        let session = self.sessions.get_or_create(session_id);
        let result = session.send(self.llm.as_ref(), request).await;
        Ok(finish(result.map(|r| r.content), sources))
    }

    /// Like [`advise`](Self::advise), passing answer text to `on_chunk` as it streams in.
    pub async fn advise_streaming<F>(
        &mut self,
        session_id: &str,
        condition: &str,
        on_chunk: F,
    ) -> AppResult<AdviceOutcome>
    where
        F: FnMut(&str) + Send,
    {
        let Some((request, sources)) = self.prepare(condition).await? else {
            return Ok(AdviceOutcome::NoData);
        };

        let session = self.sessions.get_or_create(session_id);
        let result = session
            .send_streaming(self.llm.as_ref(), request, on_chunk)
            .await;
        Ok(finish(result.map(|r| r.content), sources))
    }

    /// Pharmacies near `location`, using the configured retry policy.
    pub async fn find_pharmacies(&self, location: &str) -> Vec<PharmacyEntry> {
        self.locator.locate(location).await
    }

    /// Advice plus a pharmacy lookup when `location` is non-blank.
    pub async fn consult(
        &mut self,
        session_id: &str,
        condition: &str,
        location: Option<&str>,
    ) -> AppResult<Consultation> {
        let advice = self.advise(session_id, condition).await?;
        let pharmacies = self.lookup_optional(location).await;

        Ok(Consultation {
            condition: condition.to_string(),
            advice,
            pharmacies,
        })
    }

    /// Pharmacy lookup for an optional, possibly blank, location.
    pub async fn lookup_optional(&self, location: Option<&str>) -> Option<Vec<PharmacyEntry>> {
        match location.map(str::trim).filter(|l| !l.is_empty()) {
            Some(location) => Some(self.find_pharmacies(location).await),
            None => None,
        }
    }

    /// Discard the chat history of `session_id`. Returns whether it existed.
    pub fn end_session(&mut self, session_id: &str) -> bool {
        self.sessions.end(session_id)
    }

    /// Retrieve evidence and build the model request, or `None` when there is no evidence.
    async fn prepare(&self, condition: &str) -> AppResult<Option<(LlmRequest, Vec<String>)>> {
        if condition.trim().is_empty() {
            return Err(AppError::Other("Condition must not be empty".to_string()));
        }

        let bundle = self.retriever.retrieve(condition).await;
        if bundle.is_empty() {
            tracing::info!(condition = %condition, "No evidence retrieved, skipping model call");
            return Ok(None);
        }

        let (evidence, sources) = bundle.into_parts();
        let mut variables = HashMap::new();
        variables.insert("condition".to_string(), condition.to_string());

        let built = build_prompt(&self.prompt, variables, Some(&evidence))?;
        Ok(Some((self.request_for(built), sources)))
    }

    fn request_for(&self, built: BuiltPrompt) -> LlmRequest {
        let mut request = LlmRequest::new(built.user, &self.model)
            .with_temperature(self.generation.temperature)
            .with_top_p(self.generation.top_p)
            .with_top_k(self.generation.top_k);

        if let Some(max_tokens) = self.generation.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        request
    }
}

fn finish(result: AppResult<String>, sources: Vec<String>) -> AdviceOutcome {
    match result {
        Ok(answer) => AdviceOutcome::Answered { answer, sources },
        Err(e) => {
            tracing::error!(error = %e, "Medical advice generation failed");
            AdviceOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}
