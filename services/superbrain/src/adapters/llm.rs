//! services/superbrain/src/adapters/llm.rs
//!
//! This module contains the adapter for the grounded-chat LLM. It implements
//! the `GenerationService` port from the `core` crate.
//!
//! The persona/style instructions are configuration data (`Persona`), not
//! control flow: the adapter only assembles the structured request into the
//! wire format the API expects.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use student_hub_core::domain::TurnRole;
use student_hub_core::ports::{GenerationRequest, GenerationService, PortError, PortResult};

use crate::config::Persona;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `GenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    persona: Persona,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, persona: Persona) -> Self {
        Self {
            client,
            model,
            persona,
        }
    }

    /// Assembles the system message from the persona preamble and the
    /// grounding text.
    fn system_message(&self, grounding: &str) -> String {
        let grounding = if grounding.is_empty() {
            "No document loaded."
        } else {
            grounding
        };
        format!(
            "{}\n\nCONTEXT FROM THE DOCUMENTS:\n\"{}\"",
            self.persona.preamble, grounding
        )
    }
}

//=========================================================================================
// `GenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl GenerationService for OpenAiChatAdapter {
    /// Sends the grounding preamble plus the ordered turn history and returns
    /// the generated answer.
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String> {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.history.len() + 1);

        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_message(&request.grounding))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );

        for turn in &request.history {
            let message = match turn.role {
                TurnRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
                TurnRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.text.as_str())
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?
                    .into(),
            };
            messages.push(message);
        }

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationFailed(e.to_string()))?;

        // Extract the text content from the first choice in the response.
        if let Some(choice) = response.choices.into_iter().next() {
            if let Some(content) = choice.message.content {
                Ok(content)
            } else {
                Err(PortError::GenerationFailed(
                    "Chat LLM response contained no text content.".to_string(),
                ))
            }
        } else {
            Err(PortError::GenerationFailed(
                "Chat LLM returned no choices in its response.".to_string(),
            ))
        }
    }
}
