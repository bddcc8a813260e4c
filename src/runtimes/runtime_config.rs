use uuid::Uuid;

use super::CheckpointerType;

/// Per-invocation execution options.
///
/// The step budget bounds how many nodes a single run may execute; a graph
/// with a routing cycle cannot spin forever. Exhausting the budget is not a
/// hard error: the run halts with a runner-scoped event in the error channel
/// so callers can inspect how far it got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum number of node executions per run.
    pub max_steps: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { max_steps: 16 }
    }
}

impl RunOptions {
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }
}

/// Application-level runtime configuration carried by a compiled graph.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Instance identifier used when none is supplied explicitly.
    pub instance_id: Option<String>,
    /// Preferred checkpointer backend.
    pub checkpointer: Option<CheckpointerType>,
    /// SQLite database file name, resolved from the environment when unset.
    pub sqlite_db_name: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            instance_id: Some(Uuid::new_v4().to_string()),
            checkpointer: Some(CheckpointerType::InMemory),
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
        }
    }
}

impl RuntimeConfig {
    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if let Some(name) = provided {
            return Some(name);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("STATELOOM_DB_NAME").unwrap_or_else(|_| "stateloom.db".to_string()))
    }

    pub fn new(
        instance_id: Option<String>,
        checkpointer: Option<CheckpointerType>,
        sqlite_db_name: Option<String>,
    ) -> Self {
        Self {
            instance_id,
            checkpointer,
            sqlite_db_name: Self::resolve_sqlite_db_name(sqlite_db_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_options_carry_a_budget() {
        assert_eq!(RunOptions::default().max_steps, 16);
        assert_eq!(RunOptions::default().with_max_steps(3).max_steps, 3);
    }

    #[test]
    fn default_config_generates_an_instance_id() {
        let config = RuntimeConfig::default();
        assert!(config.instance_id.is_some());
        assert!(config.sqlite_db_name.is_some());
    }
}
