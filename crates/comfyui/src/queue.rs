//! Snapshot of the ComfyUI execution queue (`GET /queue`).

use serde::Deserialize;

/// The running and pending queue lists.
///
/// Each entry is a heterogeneous tuple
/// `[number, prompt_id, prompt, extra_data, outputs_to_execute]`; only
/// the prompt id at index 1 is inspected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub queue_running: Vec<Vec<serde_json::Value>>,
    #[serde(default)]
    pub queue_pending: Vec<Vec<serde_json::Value>>,
}

/// Where a prompt currently sits in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    Running,
    Pending,
    /// In neither list: finished, failed, or never registered.
    Absent,
}

impl QueueSnapshot {
    /// Locate `prompt_id`, checking the running list first.
    pub fn position(&self, prompt_id: &str) -> QueuePosition {
        if contains_prompt(&self.queue_running, prompt_id) {
            QueuePosition::Running
        } else if contains_prompt(&self.queue_pending, prompt_id) {
            QueuePosition::Pending
        } else {
            QueuePosition::Absent
        }
    }
}

/// Whether any entry carries `prompt_id` at index 1.
pub fn contains_prompt(entries: &[Vec<serde_json::Value>], prompt_id: &str) -> bool {
    entries
        .iter()
        .any(|entry| entry.get(1).and_then(|v| v.as_str()) == Some(prompt_id))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(value: serde_json::Value) -> QueueSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn id_at_index_one_matches() {
        let entries = vec![vec![json!("2024-01-01"), json!("abc123"), json!({"1": {}})]];
        assert!(contains_prompt(&entries, "abc123"));
    }

    #[test]
    fn id_at_other_index_does_not_match() {
        let entries = vec![
            vec![json!("abc123"), json!("other"), json!({})],
            vec![json!(0), json!({}), json!("abc123")],
        ];
        assert!(!contains_prompt(&entries, "abc123"));
    }

    #[test]
    fn short_entries_are_skipped() {
        let entries = vec![vec![], vec![json!("abc123")]];
        assert!(!contains_prompt(&entries, "abc123"));
    }

    #[test]
    fn running_takes_precedence() {
        let q = snapshot(json!({
            "queue_running": [[0, "p1", {}, {}, []]],
            "queue_pending": [[1, "p1", {}, {}, []], [2, "p2", {}, {}, []]],
        }));
        assert_eq!(q.position("p1"), QueuePosition::Running);
        assert_eq!(q.position("p2"), QueuePosition::Pending);
        assert_eq!(q.position("p3"), QueuePosition::Absent);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let q = snapshot(json!({}));
        assert_eq!(q.position("anything"), QueuePosition::Absent);
    }
}
