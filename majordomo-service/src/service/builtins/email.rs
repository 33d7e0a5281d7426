//! Email capabilities and the daily digest.

use serde_json::{Value, json};
use tracing::debug;

use super::BuiltinContext;
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

const DEFAULT_UNREAD_LIMIT: u64 = 5;
const DEFAULT_SUMMARY_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 50;

/// Digest lookups are capped; counts above this are reported as the cap
const DIGEST_SCAN_LIMIT: usize = 50;

fn limit(args: &Arguments, default: u64) -> usize {
    args.u64("limit").unwrap_or(default).clamp(1, MAX_LIMIT) as usize
}

/// A count, or null when that integration failed
fn count_or_null<T>(name: &str, result: Result<Vec<T>, CapabilityError>) -> Value {
    match result {
        Ok(items) => json!(items.len()),
        Err(e) => {
            debug!(source = %name, error = %e, "Digest source unavailable");
            Value::Null
        }
    }
}

impl BuiltinContext {
    pub(super) async fn get_unread_emails_summary(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let mails = self
            .backends
            .mail
            .unread(limit(args, DEFAULT_UNREAD_LIMIT))
            .await?;
        Ok(CapabilityOutput::Json(json!(mails)))
    }

    pub(super) async fn summarize_emails(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let mails = self
            .backends
            .mail
            .recent(limit(args, DEFAULT_SUMMARY_LIMIT))
            .await?;
        Ok(CapabilityOutput::Json(json!(mails)))
    }

    /// Pending tasks, today's events and unread mail. Each source may fail
    /// independently without failing the digest.
    pub(super) async fn daily_digest(&self) -> Result<CapabilityOutput, CapabilityError> {
        let today = self.runtime_config.dynamic().assistant.now().date_naive();

        let (tasks, events, mails) = tokio::join!(
            self.backends.tasks.list(super::backends::DEFAULT_TASK_LIST),
            self.backends.calendar.events(today, 1),
            self.backends.mail.unread(DIGEST_SCAN_LIMIT),
        );

        Ok(CapabilityOutput::Json(json!({
            "pending_tasks": count_or_null("tasks", tasks),
            "today_events": count_or_null("calendar", events),
            "unread_emails": count_or_null("mail", mails),
        })))
    }

    pub(super) async fn send_email(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let to = args.required_str("to_email")?;
        let subject = args.required_str("subject")?;
        let body = args.required_str("body")?;

        if !to.contains('@') || to.contains(char::is_whitespace) {
            return Err(CapabilityError::argument(format!(
                "'to_email' must be an email address, got '{}'",
                to
            )));
        }

        let id = self.backends.mail.send(to, subject, body).await?;
        Ok(CapabilityOutput::Json(json!({
            "success": true,
            "message": "Email sent",
            "id": id,
        })))
    }

    pub(super) async fn search_emails(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let query = args.required_str("query")?;
        let mails = self
            .backends
            .mail
            .search(query, limit(args, DEFAULT_UNREAD_LIMIT))
            .await?;
        Ok(CapabilityOutput::Json(json!(mails)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;

    use super::super::backends::{MailBackend, MailSummary};
    use super::super::tests::{context_with, json_output, run, unlinked_context};
    use super::super::{Backends, Unlinked};
    use super::*;
    use crate::tools::registry::BuiltinName;

    /// Two unread messages, sending always succeeds
    struct Inbox;

    fn mail(subject: &str) -> MailSummary {
        MailSummary {
            from: "asha@example.com".to_string(),
            subject: subject.to_string(),
            snippet: String::new(),
        }
    }

    #[async_trait]
    impl MailBackend for Inbox {
        async fn unread(&self, limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
            let mut mails = vec![mail("Invoice"), mail("Lunch?")];
            mails.truncate(limit);
            Ok(mails)
        }

        async fn recent(&self, limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
            self.unread(limit).await
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
            Ok(Vec::new())
        }

        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<String, CapabilityError> {
            Ok("msg-1".to_string())
        }
    }

    #[tokio::test]
    async fn test_digest_tolerates_failing_sources() {
        let ctx = context_with(Backends {
            tasks: Arc::new(Unlinked),
            calendar: Arc::new(Unlinked),
            mail: Arc::new(Inbox),
        });

        let digest = json_output(run(&ctx, BuiltinName::DailyDigest, json!({})).await.unwrap());
        assert_eq!(
            digest,
            json!({"pending_tasks": null, "today_events": null, "unread_emails": 2})
        );
    }

    #[tokio::test]
    async fn test_digest_with_nothing_linked_still_succeeds() {
        let ctx = unlinked_context();
        assert!(run(&ctx, BuiltinName::DailyDigest, json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn test_send_email_validates_recipient() {
        let ctx = context_with(Backends {
            tasks: Arc::new(Unlinked),
            calendar: Arc::new(Unlinked),
            mail: Arc::new(Inbox),
        });

        let err = run(
            &ctx,
            BuiltinName::SendEmail,
            json!({"to_email": "Asha", "subject": "Hi", "body": "See you"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");

        let sent = json_output(
            run(
                &ctx,
                BuiltinName::SendEmail,
                json!({"to_email": "asha@example.com", "subject": "Hi", "body": "See you"}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(sent["id"], "msg-1");
    }
}
