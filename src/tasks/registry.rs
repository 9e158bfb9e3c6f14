//! Task registry
//!
//! An immutable, ordered list of task definitions built once at startup and
//! passed by reference. Order is a correctness invariant: the database is
//! dumped first because it fixes the snapshot point every blob store refers
//! to, and restore walks the same order.

use std::collections::HashSet;
use std::fmt;

use super::errors::{RegistryError, RegistryResult};
use super::{Task, TaskInit};

/// Well-known task ids in the order they must run.
pub const CANONICAL_ORDER: &[&str] = &[
    "db",
    "repositories",
    "uploads",
    "builds",
    "artifacts",
    "pages",
    "lfs",
    "terraform_state",
    "registry",
    "packages",
    "ci_secure_files",
];

/// Constructs one live task for a run
pub type TaskFactory = Box<dyn Fn(&TaskInit<'_>) -> Box<dyn Task> + Send + Sync>;

/// A registered task type
pub struct TaskDefinition {
    id: String,
    human_name: String,
    factory: TaskFactory,
}

impl TaskDefinition {
    pub fn new<F>(id: impl Into<String>, human_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&TaskInit<'_>) -> Box<dyn Task> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            human_name: human_name.into(),
            factory: Box::new(factory),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn human_name(&self) -> &str {
        &self.human_name
    }

    /// Instantiate the task for one run
    pub fn build(&self, init: &TaskInit<'_>) -> Box<dyn Task> {
        (self.factory)(init)
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("id", &self.id)
            .field("human_name", &self.human_name)
            .finish_non_exhaustive()
    }
}

/// Fixed, ordered collection of task definitions
#[derive(Debug)]
pub struct TaskRegistry {
    definitions: Vec<TaskDefinition>,
}

impl TaskRegistry {
    /// Build a registry, failing on empty or duplicate ids.
    pub fn new(definitions: Vec<TaskDefinition>) -> RegistryResult<Self> {
        let mut seen = HashSet::with_capacity(definitions.len());

        for definition in &definitions {
            if definition.id.is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if !seen.insert(definition.id.as_str()) {
                return Err(RegistryError::DuplicateId(definition.id.clone()));
            }
        }

        Ok(Self { definitions })
    }

    /// Every definition, in registration order
    pub fn all(&self) -> &[TaskDefinition] {
        &self.definitions
    }

    pub fn ids(&self) -> Vec<&str> {
        self.definitions.iter().map(TaskDefinition::id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&TaskDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Lazily instantiate one task per definition, in registration order.
    ///
    /// Nothing is constructed until the iterator is advanced.
    pub fn build_each<'r>(
        &'r self,
        init: TaskInit<'r>,
    ) -> impl Iterator<Item = Box<dyn Task>> + 'r {
        self.definitions.iter().map(move |d| d.build(&init))
    }

    /// Reject registries where a well-known id follows one that must run after it.
    ///
    /// Ids outside [`CANONICAL_ORDER`] are not constrained.
    pub fn ensure_canonical_order(&self) -> RegistryResult<()> {
        let mut last: Option<(usize, &str)> = None;

        for id in self.ids() {
            let Some(rank) = CANONICAL_ORDER.iter().position(|known| *known == id) else {
                continue;
            };

            if let Some((last_rank, last_id)) = last {
                if rank < last_rank {
                    return Err(RegistryError::OutOfOrder {
                        id: id.to_string(),
                        after: last_id.to_string(),
                    });
                }
            }
            last = Some((rank, id));
        }

        Ok(())
    }
}
