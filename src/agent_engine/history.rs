use serde::Serialize;

use crate::grammar::Command;

#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub index: u32,
    pub action_line: String,
    pub command: Command,
    pub observation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Steps taken during one run. Kept in memory only.
#[derive(Debug, Clone, Serialize)]
pub struct StepHistory {
    pub run_id: String,
    entries: Vec<StepRecord>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, record: StepRecord) {
        tracing::debug!(
            run = %self.run_id,
            index = record.index,
            command = record.command.name(),
            "step recorded"
        );
        self.entries.push(record);
    }

    pub fn entries(&self) -> &[StepRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StepHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_get_distinct_ids() {
        assert_ne!(StepHistory::new().run_id, StepHistory::new().run_id);
    }

    #[test]
    fn records_are_kept_in_order() {
        let mut history = StepHistory::new();
        for (i, command) in [Command::Wait(10), Command::Done].into_iter().enumerate() {
            history.push(StepRecord {
                index: i as u32,
                action_line: command.name().to_string(),
                command,
                observation: String::new(),
                timestamp: chrono::Utc::now(),
            });
        }
        let names: Vec<_> = history.entries().iter().map(|r| r.command.name()).collect();
        assert_eq!(names, ["wait", "done"]);
    }
}
