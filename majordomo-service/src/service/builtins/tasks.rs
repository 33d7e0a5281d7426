//! Task capabilities.

use chrono::NaiveDate;
use serde_json::json;

use super::BuiltinContext;
use super::backends::{DEFAULT_TASK_LIST, NewTask, TaskPatch};
use crate::error::CapabilityError;
use crate::tools::{Arguments, CapabilityOutput};

/// Due dates are calendar days, never free text
pub(super) fn parse_day(key: &str, value: &str) -> Result<NaiveDate, CapabilityError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        CapabilityError::argument(format!(
            "'{}' must be a date in YYYY-MM-DD format, got '{}'",
            key, value
        ))
    })
}

fn optional_day(args: &Arguments, key: &str) -> Result<Option<NaiveDate>, CapabilityError> {
    args.str(key).map(|v| parse_day(key, v)).transpose()
}

fn task_list(args: &Arguments) -> &str {
    args.str("task_list_id").unwrap_or(DEFAULT_TASK_LIST)
}

fn changed(message: &str, id: &str) -> CapabilityOutput {
    CapabilityOutput::Json(json!({
        "success": true,
        "message": message,
        "id": id,
    }))
}

impl BuiltinContext {
    pub(super) async fn create_task(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let title = args.required_str("title")?;
        let task = NewTask {
            task_list_id: task_list(args).to_string(),
            title: title.to_string(),
            due_date: optional_day(args, "due_date")?,
            notes: args.str("notes").map(str::to_string),
        };

        let created = self.backends.tasks.create(task).await?;
        Ok(CapabilityOutput::Json(json!({
            "id": created.id,
            "status": "Task created",
            "title": created.title,
        })))
    }

    pub(super) async fn list_tasks(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let mut tasks = self.backends.tasks.list(task_list(args)).await?;
        if let Some(limit) = args.u64("limit") {
            tasks.truncate(limit as usize);
        }
        Ok(CapabilityOutput::Json(json!(tasks)))
    }

    pub(super) async fn complete_task(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let task_id = args.required_str("task_id")?;
        self.backends
            .tasks
            .complete(task_list(args), task_id)
            .await?;
        Ok(changed("Task completed", task_id))
    }

    pub(super) async fn update_task(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let task_id = args.required_str("task_id")?;
        let patch = TaskPatch {
            title: args.str("title").map(str::to_string),
            notes: args.str("notes").map(str::to_string),
            due_date: optional_day(args, "due_date")?,
        };
        if patch == TaskPatch::default() {
            return Err(CapabilityError::argument(
                "provide at least one of 'title', 'notes' or 'due_date'",
            ));
        }

        self.backends
            .tasks
            .update(task_list(args), task_id, patch)
            .await?;
        Ok(changed("Task updated", task_id))
    }

    pub(super) async fn delete_task(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let task_id = args.required_str("task_id")?;
        self.backends.tasks.delete(task_list(args), task_id).await?;
        Ok(changed("Task deleted", task_id))
    }

    pub(super) async fn search_tasks(
        &self,
        args: &Arguments,
    ) -> Result<CapabilityOutput, CapabilityError> {
        let query = args.required_str("query")?.to_lowercase();
        let matches: Vec<_> = self
            .backends
            .tasks
            .list(task_list(args))
            .await?
            .into_iter()
            .filter(|task| task.title.to_lowercase().contains(&query))
            .collect();
        Ok(CapabilityOutput::Json(json!(matches)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::json;

    use super::super::backends::{TaskBackend, TaskItem};
    use super::super::tests::{context_with, json_output, run};
    use super::super::{Backends, Unlinked};
    use super::*;
    use crate::tools::registry::BuiltinName;

    /// In-memory task list
    #[derive(Default)]
    struct MemoryTasks {
        tasks: Mutex<Vec<TaskItem>>,
    }

    #[async_trait]
    impl TaskBackend for MemoryTasks {
        async fn create(&self, task: NewTask) -> Result<TaskItem, CapabilityError> {
            let mut tasks = self.tasks.lock().unwrap();
            let item = TaskItem {
                id: format!("t{}", tasks.len() + 1),
                title: task.title,
                due: task.due_date.map(|d| d.to_string()),
                notes: task.notes,
            };
            tasks.push(item.clone());
            Ok(item)
        }

        async fn list(&self, _task_list_id: &str) -> Result<Vec<TaskItem>, CapabilityError> {
            Ok(self.tasks.lock().unwrap().clone())
        }

        async fn complete(&self, _task_list_id: &str, task_id: &str) -> Result<(), CapabilityError> {
            self.delete("", task_id).await
        }

        async fn update(
            &self,
            _task_list_id: &str,
            task_id: &str,
            patch: TaskPatch,
        ) -> Result<(), CapabilityError> {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| CapabilityError::backend("no such task"))?;
            if let Some(title) = patch.title {
                task.title = title;
            }
            Ok(())
        }

        async fn delete(&self, _task_list_id: &str, task_id: &str) -> Result<(), CapabilityError> {
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != task_id);
            if tasks.len() == before {
                return Err(CapabilityError::backend("no such task"));
            }
            Ok(())
        }
    }

    fn memory_context() -> Arc<BuiltinContext> {
        context_with(Backends {
            tasks: Arc::new(MemoryTasks::default()),
            calendar: Arc::new(Unlinked),
            mail: Arc::new(Unlinked),
        })
    }

    #[tokio::test]
    async fn test_create_then_search() {
        let ctx = memory_context();

        let created = json_output(
            run(
                &ctx,
                BuiltinName::CreateTask,
                json!({"title": "Buy milk", "due_date": "2026-01-05"}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(created["status"], "Task created");
        assert_eq!(created["title"], "Buy milk");

        run(&ctx, BuiltinName::CreateTask, json!({"title": "Call plumber"}))
            .await
            .unwrap();

        let found = json_output(
            run(&ctx, BuiltinName::SearchTasks, json!({"query": "MILK"}))
                .await
                .unwrap(),
        );
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["due"], "2026-01-05");
    }

    #[tokio::test]
    async fn test_complete_reports_id() {
        let ctx = memory_context();
        run(&ctx, BuiltinName::CreateTask, json!({"title": "Pay rent"}))
            .await
            .unwrap();

        let done = json_output(
            run(&ctx, BuiltinName::CompleteTask, json!({"task_id": "t1"}))
                .await
                .unwrap(),
        );
        assert_eq!(done, json!({"success": true, "message": "Task completed", "id": "t1"}));

        let remaining = json_output(run(&ctx, BuiltinName::ListTasks, json!({})).await.unwrap());
        assert_eq!(remaining, json!([]));
    }

    #[tokio::test]
    async fn test_free_text_due_date_rejected() {
        let ctx = memory_context();
        let err = run(
            &ctx,
            BuiltinName::CreateTask,
            json!({"title": "Dentist", "due_date": "next friday"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }

    #[tokio::test]
    async fn test_update_needs_a_change() {
        let ctx = memory_context();
        let err = run(&ctx, BuiltinName::UpdateTask, json!({"task_id": "t1"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_arguments");
    }
}
