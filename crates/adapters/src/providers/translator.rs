//! Translation through the chat model.

use super::openai::{ChatPrompt, OpenAiChatClient};
use cinedex_ports::{BoxFuture, TranslateRequest, TranslatorPort};
use cinedex_shared::{RequestContext, Result};

const TRANSLATOR_SYSTEM: &str = "You are a professional translator.";

/// Translator backed by an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiTranslator {
    openai: OpenAiChatClient,
}

impl OpenAiTranslator {
    /// Translate through an already configured chat client.
    #[must_use]
    pub const fn new(openai: OpenAiChatClient) -> Self {
        Self { openai }
    }
}

impl TranslatorPort for OpenAiTranslator {
    fn translate(
        &self,
        ctx: &RequestContext,
        request: TranslateRequest,
    ) -> BoxFuture<'_, Result<Box<str>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("translator.translate")?;
            if !request.target.needs_translation() || request.text.trim().is_empty() {
                return Ok(request.text);
            }
            let user = format!(
                "Translate the following text to {}. Keep the tone and meaning, \
                 and reply with the translation only:\n\n{}",
                request.target.english_name(),
                request.text
            );
            let translated = self
                .openai
                .complete(
                    &ctx,
                    "translator.translate",
                    ChatPrompt {
                        system: TRANSLATOR_SYSTEM,
                        user,
                        max_tokens: 400,
                        temperature: 0.3,
                        timeout: self.openai.translation_timeout(),
                    },
                )
                .await?;
            Ok(translated.into_boxed_str())
        })
    }
}
