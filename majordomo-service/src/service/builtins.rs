//! Built-in capability handlers.
//!
//! Every [`BuiltinName`] maps to exactly one handler through the exhaustive
//! match in [`BuiltinContext::run`]; the handlers themselves live in one file
//! per category.

pub mod backends;
mod calendar;
mod contacts;
mod email;
mod notes;
mod search;
mod tasks;
mod utility;
mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use strum::IntoEnumIterator;

use crate::config::RuntimeConfig;
use crate::db::Database;
use crate::error::{CapabilityError, ServiceError, ServiceResult};
use crate::tools::registry::{BuiltinName, REGISTRY};
use crate::tools::weather::WeatherClient;
use crate::tools::web_search::SearchClient;
use crate::tools::{Arguments, Capability, CapabilityDescriptor, CapabilityOutput};

pub use backends::{CalendarBackend, MailBackend, TaskBackend, Unlinked};

/// Account-backed integrations
#[derive(Clone)]
pub struct Backends {
    pub tasks: Arc<dyn TaskBackend>,
    pub calendar: Arc<dyn CalendarBackend>,
    pub mail: Arc<dyn MailBackend>,
}

impl Backends {
    /// No linked account: every account-backed capability reports not connected
    pub fn unlinked() -> Self {
        Self {
            tasks: Arc::new(Unlinked),
            calendar: Arc::new(Unlinked),
            mail: Arc::new(Unlinked),
        }
    }
}

/// Shared state every built-in handler can reach
pub struct BuiltinContext {
    backends: Backends,
    db: Arc<Database>,
    runtime_config: Arc<RuntimeConfig>,
    weather: WeatherClient,
    search: SearchClient,
}

impl BuiltinContext {
    pub fn new(
        backends: Backends,
        db: Arc<Database>,
        runtime_config: Arc<RuntimeConfig>,
    ) -> ServiceResult<Self> {
        let weather = WeatherClient::new().map_err(|e| ServiceError::Internal {
            message: format!("Failed to create weather client: {}", e),
        })?;
        let search = SearchClient::new().map_err(|e| ServiceError::Internal {
            message: format!("Failed to create search client: {}", e),
        })?;

        Ok(Self {
            backends,
            db,
            runtime_config,
            weather,
            search,
        })
    }

    /// Execute a built-in by name
    pub(crate) async fn run(
        &self,
        name: BuiltinName,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        match name {
            // Tasks
            BuiltinName::CreateTask => self.create_task(args).await,
            BuiltinName::ListTasks => self.list_tasks(args).await,
            BuiltinName::CompleteTask => self.complete_task(args).await,
            BuiltinName::UpdateTask => self.update_task(args).await,
            BuiltinName::DeleteTask => self.delete_task(args).await,
            BuiltinName::SearchTasks => self.search_tasks(args).await,

            // Calendar
            BuiltinName::GetCalendarToday => self.get_calendar_today().await,
            BuiltinName::GetCalendarEvents => self.get_calendar_events(args).await,
            BuiltinName::GetCalendarRange => self.get_calendar_range(args).await,
            BuiltinName::CreateCalendarEvent => self.create_calendar_event(args).await,

            // Email
            BuiltinName::GetUnreadEmailsSummary => self.get_unread_emails_summary(args).await,
            BuiltinName::SummarizeEmails => self.summarize_emails(args).await,
            BuiltinName::DailyDigest => self.daily_digest().await,
            BuiltinName::SendEmail => self.send_email(args).await,
            BuiltinName::SearchEmails => self.search_emails(args).await,

            // Notes
            BuiltinName::TakeNotes => self.take_notes(args),
            BuiltinName::GetNotes => self.get_notes(args),

            // Contacts
            BuiltinName::AddContact => self.add_contact(args),
            BuiltinName::GetEmailAddress => self.get_email_address(args),
            BuiltinName::GetPhoneNumber => self.get_phone_number(args),
            BuiltinName::ListContacts => self.list_contacts(),

            // Weather
            BuiltinName::GetWeather => self.get_weather(args).await,
            BuiltinName::GetForecast => self.get_forecast(args).await,

            // Search
            BuiltinName::WebSearch => self.web_search(args).await,
            BuiltinName::GetNews => self.get_news(args).await,

            // Utilities
            BuiltinName::Calculate => self.calculate(args),
            BuiltinName::GetTimeNow => self.get_time_now(),
            BuiltinName::ConvertCurrency => self.convert_currency(args),
            BuiltinName::ConvertUnits => self.convert_units(args),
        }
    }
}

/// An integration endpoint that is unset fails before any request is made
fn require_endpoint<'a>(url: &'a str, setting: &str) -> Result<&'a str, CapabilityError> {
    if url.trim().is_empty() {
        return Err(CapabilityError::configuration(format!(
            "{} is not configured; set it under Settings",
            setting
        )));
    }
    Ok(url)
}

/// Local storage failures reach the model as backend errors
fn storage_error(error: ServiceError) -> CapabilityError {
    CapabilityError::backend(format!("Local storage failed: {}", error))
}

/// One built-in bound to the shared context
pub struct BuiltinCapability {
    name: BuiltinName,
    ctx: Arc<BuiltinContext>,
}

#[async_trait]
impl Capability for BuiltinCapability {
    fn descriptor(&self) -> CapabilityDescriptor {
        match REGISTRY.get(self.name) {
            Some(metadata) => metadata.descriptor(),
            None => CapabilityDescriptor {
                name: self.name.to_string(),
                description: String::new(),
                parameters: CapabilityDescriptor::empty_parameters(),
            },
        }
    }

    async fn invoke(&self, args: &Arguments) -> Result<CapabilityOutput, CapabilityError> {
        self.ctx.run(self.name, args).await
    }
}

/// Static name → handler table for every built-in
pub struct BuiltinCapabilities {
    table: HashMap<BuiltinName, Arc<dyn Capability>>,
}

impl BuiltinCapabilities {
    pub fn new(ctx: Arc<BuiltinContext>) -> Self {
        let table = BuiltinName::iter()
            .map(|name| {
                let capability: Arc<dyn Capability> = Arc::new(BuiltinCapability {
                    name,
                    ctx: ctx.clone(),
                });
                (name, capability)
            })
            .collect();

        Self { table }
    }

    /// Handler for a bare capability name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        let name: BuiltinName = name.parse().ok()?;
        self.table.get(&name).cloned()
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        REGISTRY.descriptors()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{DynamicConfig, StaticConfig};
    use crate::tools::RawArguments;
    use serde_json::{Value, json};

    pub(crate) fn context_with(backends: Backends) -> Arc<BuiltinContext> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(
            StaticConfig::default(),
            DynamicConfig::default(),
        ));
        Arc::new(BuiltinContext::new(backends, db, runtime_config).unwrap())
    }

    pub(crate) fn unlinked_context() -> Arc<BuiltinContext> {
        context_with(Backends::unlinked())
    }

    fn context_with_config(dynamic: DynamicConfig) -> Arc<BuiltinContext> {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let runtime_config = Arc::new(RuntimeConfig::new(StaticConfig::default(), dynamic));
        Arc::new(BuiltinContext::new(Backends::unlinked(), db, runtime_config).unwrap())
    }

    pub(crate) async fn run(
        ctx: &BuiltinContext,
        name: BuiltinName,
        args: Value,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let args = RawArguments::Structured(args).parse().unwrap();
        ctx.run(name, &args).await
    }

    pub(crate) fn json_output(output: CapabilityOutput) -> Value {
        match output {
            CapabilityOutput::Json(value) => value,
            CapabilityOutput::Text(text) => panic!("expected JSON output, got text: {text}"),
        }
    }

    pub(crate) fn text_output(output: CapabilityOutput) -> String {
        match output {
            CapabilityOutput::Text(text) => text,
            CapabilityOutput::Json(value) => panic!("expected text output, got JSON: {value}"),
        }
    }

    #[test]
    fn test_table_covers_every_builtin() {
        let builtins = BuiltinCapabilities::new(unlinked_context());
        assert_eq!(builtins.len(), BuiltinName::iter().count());

        for descriptor in builtins.descriptors() {
            let handler = builtins.get(&descriptor.name).unwrap();
            assert_eq!(handler.descriptor(), descriptor);
        }
        assert!(builtins.get("mcp_zerodha_get_holdings").is_none());
    }

    #[tokio::test]
    async fn test_unset_integration_endpoints_report_configuration() {
        let mut dynamic = DynamicConfig::default();
        dynamic.integrations.weather_base_url = String::new();
        dynamic.integrations.search_base_url = " ".to_string();
        let ctx = context_with_config(dynamic);

        for (name, args) in [
            (BuiltinName::GetWeather, json!({"city": "Pune"})),
            (BuiltinName::GetForecast, json!({})),
            (BuiltinName::WebSearch, json!({"query": "rust"})),
            (BuiltinName::GetNews, json!({})),
        ] {
            let err = run(&ctx, name, args).await.unwrap_err();
            assert_eq!(err.kind(), "configuration", "{name}");
        }

        let err = run(&ctx, BuiltinName::WebSearch, json!({"query": "rust"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("integrations.search_base_url"));
    }

    #[tokio::test]
    async fn test_unlinked_backends_report_not_connected() {
        let ctx = unlinked_context();

        let err = run(&ctx, BuiltinName::ListTasks, json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "not_connected");
        assert!(err.to_string().contains("Google Tasks not connected"));

        let err = run(&ctx, BuiltinName::GetCalendarToday, json!({}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Settings > Connect Google Account"));
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let ctx = unlinked_context();
        let err = run(&ctx, BuiltinName::CreateTask, json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
        assert!(err.to_string().contains("'title'"));
    }
}
