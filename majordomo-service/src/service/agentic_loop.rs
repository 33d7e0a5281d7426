//! The conversation loop: one user turn from the first model call to the
//! final text.
//!
//! A turn binds the catalog, lets the model ask for invocations, dispatches
//! them all, then asks the model (without tools) to word the answer. Provider
//! rejections of malformed tool-call syntax go through the recovery layer.
//! Whatever happens, a finished turn carries some user-visible text.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::AssistantService;
use super::prompts::{
    build_messages, build_system_prompt, sanitize_output, strip_backticks, summary_messages,
};
use super::recovery::{extract_inline_calls, recover_call};
use super::state::{ChatEvent, TurnRequest};
use crate::config::{AssistantConfig, LlmConfig};
use crate::error::{LlmError, ServiceError, ServiceResult};
use crate::llm::{
    ChatMessage, ChatModel, ChatRequest, InvocationRequest, ModelTurn, STREAM_BUFFER, StreamEvent,
};
use crate::tools::ToolDefinition;

const FALLBACK_DONE: &str = "chat-fallback-done";
const FALLBACK_EMPTY: &str = "chat-fallback-empty";
const RECOVERY_FAILED: &str = "chat-recovery-failed";

/// Settings captured once at the start of a turn
struct TurnContext {
    llm: LlmConfig,
    assistant: AssistantConfig,
    model: String,
    max_tokens: u32,
}

impl TurnContext {
    fn request(&self, messages: Vec<ChatMessage>, tools: Option<Vec<ToolDefinition>>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            tools,
            temperature: Some(self.llm.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    fn summary_request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages,
            tools: None,
            temperature: Some(self.llm.summary_temperature),
            max_tokens: Some(self.llm.summary_max_tokens),
        }
    }
}

/// How the final text of a turn gets produced
enum Resolution {
    /// The first model call already answered
    Answered(String),
    /// One more call words the answer
    Pending {
        request: ChatRequest,
        /// Message key used when the call yields no text
        fallback: &'static str,
        /// A failed call ends the turn with an error instead of the fallback
        propagate_errors: bool,
    },
}

fn new_call_id() -> String {
    format!("call_{}", Uuid::new_v4().simple())
}

impl AssistantService {
    /// Answer one turn with a single text
    pub async fn respond(&self, turn: TurnRequest) -> ServiceResult<String> {
        let resolution = self.resolve(&turn).await?;

        let text = match resolution {
            Resolution::Answered(text) => self.or_fallback(&sanitize_output(&text), FALLBACK_EMPTY),
            Resolution::Pending {
                request,
                fallback,
                propagate_errors,
            } => {
                let models = self.models.load_full();
                match models.complete(request).await {
                    Ok(ModelTurn::Answer(text)) | Ok(ModelTurn::Invocations { content: text, .. }) => {
                        self.or_fallback(&sanitize_output(&text), fallback)
                    }
                    Err(e) if propagate_errors => return Err(e.into()),
                    Err(e) => {
                        warn!(error = %e, "Final model call failed, using fallback");
                        self.fixed(fallback)
                    }
                }
            }
        };

        info!(
            conversation_id = ?turn.conversation_id,
            chars = text.chars().count(),
            "Turn answered"
        );
        Ok(text)
    }

    /// Answer one turn as a stream of fragments ending in `Done`
    pub fn respond_stream(self: &Arc<Self>, turn: TurnRequest) -> mpsc::Receiver<ChatEvent> {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let service = Arc::clone(self);

        tokio::spawn(async move {
            service.drive_stream(&turn, &tx).await;
            let _ = tx.send(ChatEvent::Done).await;
        });

        rx
    }

    async fn drive_stream(&self, turn: &TurnRequest, tx: &mpsc::Sender<ChatEvent>) {
        // Dispatches all finish inside resolve, before any text is sent
        let resolution = match self.resolve(turn).await {
            Ok(resolution) => resolution,
            Err(e) => {
                error!(conversation_id = ?turn.conversation_id, error = %e, "Turn failed");
                let _ = tx
                    .send(ChatEvent::Error(e.user_message(&self.i18n, "en")))
                    .await;
                return;
            }
        };

        let (request, fallback, propagate_errors) = match resolution {
            Resolution::Answered(text) => {
                let text = self.or_fallback(&strip_backticks(&text), FALLBACK_EMPTY);
                let _ = tx.send(ChatEvent::Text(text)).await;
                return;
            }
            Resolution::Pending {
                request,
                fallback,
                propagate_errors,
            } => (request, fallback, propagate_errors),
        };

        let models = self.models.load_full();
        let mut events = match models.stream(request).await {
            Ok(events) => events,
            Err(e) if propagate_errors => {
                error!(error = %e, "Model stream failed to start");
                let _ = tx
                    .send(ChatEvent::Error(ServiceError::from(e).user_message(&self.i18n, "en")))
                    .await;
                return;
            }
            Err(e) => {
                warn!(error = %e, "Final model stream failed to start, using fallback");
                let _ = tx.send(ChatEvent::Text(self.fixed(fallback))).await;
                return;
            }
        };

        let mut emitted = false;
        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Content(fragment) => {
                    let fragment = strip_backticks(&fragment);
                    if fragment.is_empty() {
                        continue;
                    }
                    emitted |= !fragment.trim().is_empty();
                    if tx.send(ChatEvent::Text(fragment)).await.is_err() {
                        debug!("Stream receiver dropped");
                        return;
                    }
                }
                StreamEvent::Done => break,
                StreamEvent::Error(message) => {
                    warn!(error = %message, "Model stream failed");
                    if propagate_errors && !emitted {
                        let _ = tx
                            .send(ChatEvent::Error(self.i18n.get("en", "error-llm-unavailable", None)))
                            .await;
                        return;
                    }
                    break;
                }
            }
        }

        if !emitted {
            let _ = tx.send(ChatEvent::Text(self.fixed(fallback))).await;
        }
    }

    /// Run everything up to the call that words the answer
    async fn resolve(&self, turn: &TurnRequest) -> ServiceResult<Resolution> {
        if turn.messages.is_empty() {
            return Err(ServiceError::InvalidRequest {
                message: "messages must not be empty".to_string(),
            });
        }

        let (ctx, messages) = self.turn_context(turn);
        debug!(
            conversation_id = ?turn.conversation_id,
            model = %ctx.model,
            message_count = messages.len(),
            tools_enabled = turn.settings.tools_enabled,
            "Starting turn"
        );

        let tools: Vec<ToolDefinition> = if turn.settings.tools_enabled {
            self.dispatcher
                .catalog(turn.settings.mcp_enabled)
                .iter()
                .map(ToolDefinition::from)
                .collect()
        } else {
            Vec::new()
        };

        if tools.is_empty() {
            return Ok(Resolution::Pending {
                request: ctx.request(messages, None),
                fallback: FALLBACK_EMPTY,
                propagate_errors: true,
            });
        }

        let models = self.models.load_full();
        match models
            .complete(ctx.request(messages.clone(), Some(tools)))
            .await
        {
            Ok(ModelTurn::Invocations { content, calls }) if !calls.is_empty() => {
                Ok(self.follow_up(&ctx, messages, content, calls).await)
            }
            Ok(ModelTurn::Answer(content)) | Ok(ModelTurn::Invocations { content, .. }) => {
                let inline = extract_inline_calls(&content);
                if inline.is_empty() {
                    return Ok(Resolution::Answered(content));
                }
                info!(count = inline.len(), "Answer carries inline capability calls");
                let calls = inline
                    .into_iter()
                    .map(|call| call.into_invocation(new_call_id()))
                    .collect();
                Ok(self.summarize(&ctx, calls).await)
            }
            Err(e) if e.is_tool_syntax() => Ok(self.recover(&ctx, messages, &e).await),
            Err(e) => Err(e.into()),
        }
    }

    fn turn_context(&self, turn: &TurnRequest) -> (TurnContext, Vec<ChatMessage>) {
        let dynamic = self.runtime_config.dynamic();
        let models = self.models.load();

        let model = models.select_model(
            &dynamic.llm,
            turn.settings.model.as_deref(),
            turn.settings.tools_enabled,
            turn.latest_user_text(),
        );
        let system_prompt = build_system_prompt(
            &dynamic.assistant,
            dynamic.assistant.now(),
            turn.settings.custom_instructions.as_deref(),
        );
        let messages = build_messages(turn, system_prompt, dynamic.conversation.max_input_messages);

        let ctx = TurnContext {
            llm: dynamic.llm.clone(),
            assistant: dynamic.assistant.clone(),
            model,
            max_tokens: turn
                .settings
                .max_output_tokens
                .unwrap_or(dynamic.llm.max_output_tokens),
        };
        (ctx, messages)
    }

    /// Dispatch structured calls and hand the results back to the model
    async fn follow_up(
        &self,
        ctx: &TurnContext,
        mut messages: Vec<ChatMessage>,
        content: String,
        calls: Vec<InvocationRequest>,
    ) -> Resolution {
        let results = self.dispatcher.dispatch_all(&calls).await;
        info!(
            count = results.len(),
            failed = results.iter().filter(|r| r.is_error).count(),
            "Dispatched capability calls"
        );

        messages.push(ChatMessage::assistant_with_calls(content, calls));
        messages.extend(
            results
                .iter()
                .map(|r| ChatMessage::tool(&r.call_id, &r.capability_name, &r.payload)),
        );

        Resolution::Pending {
            request: ctx.request(messages, None),
            fallback: FALLBACK_DONE,
            propagate_errors: false,
        }
    }

    /// Dispatch calls salvaged from text and ask for a plain summary
    async fn summarize(&self, ctx: &TurnContext, calls: Vec<InvocationRequest>) -> Resolution {
        let results = self.dispatcher.dispatch_all(&calls).await;

        Resolution::Pending {
            request: ctx.summary_request(summary_messages(&ctx.assistant, &results)),
            fallback: FALLBACK_DONE,
            propagate_errors: false,
        }
    }

    async fn recover(
        &self,
        ctx: &TurnContext,
        messages: Vec<ChatMessage>,
        failure: &LlmError,
    ) -> Resolution {
        warn!(error = %failure, "Provider rejected the model's tool call");

        match recover_call(&failure.salvage_text()) {
            Some(call) => self.summarize(ctx, vec![call.into_invocation(new_call_id())]).await,
            None => {
                info!("Retrying turn without tools");
                Resolution::Pending {
                    request: ctx.request(messages, None),
                    fallback: RECOVERY_FAILED,
                    propagate_errors: false,
                }
            }
        }
    }

    fn fixed(&self, key: &str) -> String {
        self.i18n.get("en", key, None)
    }

    fn or_fallback(&self, text: &str, key: &str) -> String {
        if text.trim().is_empty() {
            self.fixed(key)
        } else {
            text.to_string()
        }
    }
}
