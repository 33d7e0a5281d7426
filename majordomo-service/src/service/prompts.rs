//! System prompt building and message formatting for LLM interactions.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset};
use regex::Regex;

use super::state::{HistoryMessage, InvocationResult, TurnRequest};
use crate::config::AssistantConfig;
use crate::llm::ChatMessage;

const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("../../prompts/system.txt");
const SUMMARY_PROMPT_TEMPLATE: &str = include_str!("../../prompts/summary.txt");

/// Build the system prompt for a turn
pub(crate) fn build_system_prompt(
    assistant: &AssistantConfig,
    now: DateTime<FixedOffset>,
    custom_instructions: Option<&str>,
) -> String {
    let mut prompt = SYSTEM_PROMPT_TEMPLATE
        .replace("{assistant_name}", &assistant.name)
        .replace("{current_date}", &now.format("%Y-%m-%d").to_string())
        .replace("{weekday}", &now.format("%A").to_string())
        .replace("{current_time}", &now.format("%H:%M").to_string())
        .replace("{timezone_label}", &assistant.timezone_label)
        .replace("{utc_offset}", &now.format("%:z").to_string())
        .trim_end()
        .to_string();

    if let Some(instructions) = custom_instructions.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push_str("\n\nUser's personal instructions: ");
        prompt.push_str(instructions);
    }

    prompt
}

fn to_chat_message(message: &HistoryMessage) -> ChatMessage {
    match message.role.as_str() {
        "assistant" | "model" => ChatMessage::assistant(&message.content),
        "system" => ChatMessage::system(&message.content),
        _ => ChatMessage::user(&message.content),
    }
}

/// Keep the last `max_input_messages` prior messages; zero keeps only the newest
fn trim_history(history: &[HistoryMessage], max_input_messages: usize) -> &[HistoryMessage] {
    let keep = max_input_messages.max(1);
    &history[history.len().saturating_sub(keep)..]
}

/// System prompt, bounded history, then the latest message
pub(crate) fn build_messages(
    turn: &TurnRequest,
    system_prompt: String,
    max_input_messages: usize,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(system_prompt)];

    let Some((latest, history)) = turn.messages.split_last() else {
        return messages;
    };

    if turn.settings.memory_enabled {
        messages.extend(
            trim_history(history, max_input_messages)
                .iter()
                .map(to_chat_message),
        );
    }

    messages.push(ChatMessage::user(&latest.content));
    messages
}

/// Messages asking the model to explain raw capability results
pub(crate) fn summary_messages(
    assistant: &AssistantConfig,
    results: &[InvocationResult],
) -> Vec<ChatMessage> {
    let results = results
        .iter()
        .map(|r| format!("Tool: {}\nResult: {}", r.capability_name, r.payload))
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(
            SUMMARY_PROMPT_TEMPLATE
                .replace("{assistant_name}", &assistant.name)
                .trim_end(),
        ),
        ChatMessage::user(format!(
            "{}\n\nPlease summarize this in natural language for the user.",
            results
        )),
    ]
}

static LIST_MARKER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b\d+\.").ok());
// Decimals like 83.12 are left alone
static GLUED_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\.([^\s\d])").ok());
static ITEM_START: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b\d+\.\s").ok());
static ITEM_AFTER_NEWLINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\n(\d+\.\s)").ok());
static FIELD_LABEL: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(\*+\s*)?(Time|Due|Description|Notes|Type):").ok()
});
static EXTRA_BLANK_LINES: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\n{3,}").ok());

/// Remove code formatting from a streamed fragment
pub(crate) fn strip_backticks(text: &str) -> String {
    text.replace('`', "")
}

/// Remove code formatting and put numbered list items on their own lines
pub(crate) fn sanitize_output(text: &str) -> String {
    let text = strip_backticks(text);
    match (
        LIST_MARKER.as_ref(),
        GLUED_MARKER.as_ref(),
        ITEM_START.as_ref(),
        ITEM_AFTER_NEWLINE.as_ref(),
        FIELD_LABEL.as_ref(),
        EXTRA_BLANK_LINES.as_ref(),
    ) {
        (
            Some(list_marker),
            Some(glued),
            Some(item_start),
            Some(after_newline),
            Some(field_label),
            Some(extra_blank),
        ) => {
            if !list_marker.is_match(&text) {
                return text;
            }
            let text = glued.replace_all(&text, "$1. $2");
            let text = break_before_items(item_start, &text);
            let text = after_newline.replace_all(&text, "\n\n$1");
            let text = field_label.replace_all(&text, "\n${1}${2}:");
            let text = extra_blank.replace_all(&text, "\n\n");
            text.trim().to_string()
        }
        _ => text,
    }
}

/// Start each list item on a new line unless it already is
fn break_before_items(item_start: &Regex, text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for m in item_start.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        last = m.start();
    }
    out.push_str(&text[last..]);
    out
}
