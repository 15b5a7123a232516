//! Task repository

use accord_core::{Task, TaskId, TaskStatus};

use crate::error::Result;
use crate::repository::{Identified, InMemoryRepository};

impl Identified for Task {
    fn id(&self) -> uuid::Uuid {
        self.id
    }

    fn entity_type() -> &'static str {
        "Task"
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskRepository {
    inner: InMemoryRepository<Task>,
}

impl TaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        self.inner.get(id)
    }

    pub fn save(&self, task: Task) -> Result<()> {
        self.inner.save(task)
    }

    pub fn delete(&self, id: TaskId) -> Result<()> {
        self.inner.delete(id)
    }

    pub fn list(&self) -> Vec<Task> {
        self.inner.list()
    }

    pub fn find_by_status(&self, status: TaskStatus) -> Vec<Task> {
        self.inner.list().into_iter().filter(|t| t.status == status).collect()
    }
}
