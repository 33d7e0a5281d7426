//! Salvages capability calls from model output the provider could not parse.
//!
//! Only used when a provider rejects the model's tool-call syntax, or when a
//! direct answer carries inline `<function=...>` tags. Well-formed calls never
//! pass through here.
//!
//! Patterns are tried in a fixed order and the first match wins:
//! 1. a JSON object `{"name": ..., "arguments": {...}}`
//! 2. `<function=NAME>{...}</function>`
//! 3. `<function=NAME>{...` with a missing or broken closing tag, or `NAME>{...`
//! 4. `<function=NAME></function>` or a bare `<function=NAME>`, with no arguments

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info};

use crate::llm::InvocationRequest;
use crate::tools::RawArguments;

/// Provider spellings of built-in names
const NAME_ALIASES: &[(&str, &str)] = &[
    ("tasks:list", "list_tasks"),
    ("tasks:create", "create_task"),
    ("tasks:complete", "complete_task"),
    ("tasks:update", "update_task"),
    ("tasks:delete", "delete_task"),
    ("tasks:search", "search_tasks"),
    ("calendar:today", "get_calendar_today"),
    ("calendar:events", "get_calendar_events"),
    ("calendar:range", "get_calendar_range"),
    ("calendar:create", "create_calendar_event"),
    ("email:unread", "get_unread_emails_summary"),
    ("email:summarize", "summarize_emails"),
    ("email:send", "send_email"),
    ("email:search", "search_emails"),
    ("notes:save", "take_notes"),
    ("notes:get", "get_notes"),
    ("contacts:add", "add_contact"),
    ("contacts:email", "get_email_address"),
    ("weather:get", "get_weather"),
    ("news:get", "get_news"),
    ("time:now", "get_time_now"),
    ("utils:calculate", "calculate"),
];

/// Patterns are fixed; `None` only if one fails to compile, which disables it
type Pattern = LazyLock<Option<Regex>>;

static JSON_CALL: Pattern = LazyLock::new(|| {
    Regex::new(r#"\{\s*"name"\s*:\s*"([^"]+)"\s*,\s*"arguments"\s*:\s*\{"#).ok()
});

static CLOSED_TAG: Pattern =
    LazyLock::new(|| Regex::new(r"(?s)<function=([\w:.-]+)>\s*(\{.*?\})\s*</function>").ok());

static OPEN_TAG_WITH_BODY: Pattern =
    LazyLock::new(|| Regex::new(r"(?s)<function=([\w:.-]+)>\s*(\{.*)").ok());

static BARE_NAME_WITH_BODY: Pattern =
    LazyLock::new(|| Regex::new(r"(?s)([A-Za-z_][\w:.-]*)>\s*(\{.*)").ok());

static TAG: Pattern = LazyLock::new(|| Regex::new(r"<function=([\w:.-]+)>").ok());

fn captures<'t>(pattern: &Pattern, text: &'t str) -> Option<Captures<'t>> {
    pattern.as_ref()?.captures(text)
}

/// A call reconstructed from malformed output
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredCall {
    pub capability_name: String,
    pub raw_arguments: RawArguments,
}

impl RecoveredCall {
    fn new(name: &str, arguments: &str) -> Self {
        Self {
            capability_name: normalize_name(name),
            raw_arguments: parse_arguments(arguments),
        }
    }

    fn without_arguments(name: &str) -> Self {
        Self {
            capability_name: normalize_name(name),
            raw_arguments: RawArguments::Structured(Value::Object(Default::default())),
        }
    }

    pub fn into_invocation(self, call_id: impl Into<String>) -> InvocationRequest {
        InvocationRequest {
            call_id: call_id.into(),
            capability_name: self.capability_name,
            raw_arguments: self.raw_arguments,
        }
    }
}

/// Map provider spellings to canonical names; `a:b` becomes `b_a`
pub fn normalize_name(name: &str) -> String {
    let name = name.trim();
    if let Some((_, canonical)) = NAME_ALIASES.iter().find(|(alias, _)| *alias == name) {
        return canonical.to_string();
    }
    match name.split(':').collect::<Vec<_>>().as_slice() {
        [category, action] if !category.is_empty() && !action.is_empty() => {
            format!("{}_{}", action, category)
        }
        _ => name.to_string(),
    }
}

/// Reconstruct the intended call from text the provider rejected
pub fn recover_call(text: &str) -> Option<RecoveredCall> {
    let recovered = match_cascade(text).or_else(|| {
        // Error bodies often carry the generation JSON-escaped
        text.contains("\\\"")
            .then(|| match_cascade(&text.replace("\\\"", "\"")))
            .flatten()
    });

    match &recovered {
        Some(call) => info!(
            capability = %call.capability_name,
            args = %call.raw_arguments.preview(200),
            "Recovered malformed capability call"
        ),
        None => debug!("No capability call found in rejected output"),
    }
    recovered
}

fn match_cascade(text: &str) -> Option<RecoveredCall> {
    if let Some(caps) = captures(&JSON_CALL, text) {
        let name = caps.get(1)?.as_str();
        let open = caps.get(0)?.end() - 1;
        let arguments = balanced_prefix(&text[open..]).unwrap_or(&text[open..]);
        return Some(RecoveredCall::new(name, &repair_arguments(arguments)));
    }

    if let Some(caps) = captures(&CLOSED_TAG, text) {
        return Some(RecoveredCall::new(caps.get(1)?.as_str(), caps.get(2)?.as_str()));
    }

    if let Some(caps) = captures(&OPEN_TAG_WITH_BODY, text)
        .or_else(|| captures(&BARE_NAME_WITH_BODY, text))
    {
        let body = caps.get(2)?.as_str();
        return Some(RecoveredCall::new(
            caps.get(1)?.as_str(),
            &repair_arguments(body),
        ));
    }

    captures(&TAG, text)
        .and_then(|caps| caps.get(1))
        .map(|name| RecoveredCall::without_arguments(name.as_str()))
}

/// Every `<function=NAME>` tag in a direct answer, in order of appearance
pub fn extract_inline_calls(content: &str) -> Vec<RecoveredCall> {
    let Some(tag) = TAG.as_ref() else {
        return Vec::new();
    };
    let tags: Vec<_> = tag.captures_iter(content).collect();

    tags.iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            let body_end = tags
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(content.len());

            let body = &content[whole.end()..body_end];
            let body = body.split("</function>").next().unwrap_or("").trim();

            Some(if body.starts_with('{') {
                RecoveredCall::new(name, &repair_arguments(body))
            } else {
                RecoveredCall::without_arguments(name)
            })
        })
        .collect()
}

/// The shortest prefix of `text` (starting at `{`) whose braces balance
fn balanced_prefix(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Best-effort repair of a truncated or sloppily quoted JSON object
fn repair_arguments(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "{}".to_string();
    }

    if let Some(complete) = balanced_prefix(raw) {
        return single_to_double_quotes(complete);
    }

    // Truncated: drop escape debris, then close whatever is still open
    let mut repaired = raw
        .trim_end_matches(|c: char| c == '\'' || c == '\\' || c.is_whitespace())
        .to_string();
    if repaired.matches('"').count() % 2 == 1 {
        repaired.push('"');
    }
    let open = repaired.matches('{').count().saturating_sub(repaired.matches('}').count());
    repaired.push_str(&"}".repeat(open));

    single_to_double_quotes(&repaired)
}

fn single_to_double_quotes(text: &str) -> String {
    if text.contains('\'') && !text.contains('"') {
        text.replace('\'', "\"")
    } else {
        text.to_string()
    }
}

/// Parsed arguments, or the original text so the dispatcher reports the problem
fn parse_arguments(arguments: &str) -> RawArguments {
    if let Ok(value) = serde_json::from_str::<Value>(arguments) {
        return RawArguments::Structured(value);
    }
    if arguments.contains("\\\"")
        && let Ok(value) = serde_json::from_str::<Value>(&arguments.replace("\\\"", "\""))
    {
        return RawArguments::Structured(value);
    }
    RawArguments::Text(arguments.to_string())
}
