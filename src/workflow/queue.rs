use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One spreadsheet row awaiting review.
///
/// `row_index` is the 1-based position in the raw fetched range, so it
/// addresses the live sheet directly on write-back. Cells are aligned to the
/// batch's shared header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRow {
    pub row_index: usize,
    pub cells: Vec<String>,
}

impl PendingRow {
    /// The cell under the named header column, if the row is wide enough.
    pub fn cell<'a>(&'a self, header: &[String], name: &str) -> Option<&'a str> {
        let idx = header.iter().position(|h| h == name)?;
        self.cells.get(idx).map(String::as_str)
    }
}

/// FIFO work queue for one fetch batch. The engine always operates on the
/// head row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub header: Vec<String>,
    pub rows: Vec<PendingRow>,
}

impl Queue {
    pub fn new(header: Vec<String>, rows: Vec<PendingRow>) -> Self {
        Self { header, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self) -> Option<&PendingRow> {
        self.rows.first()
    }

    /// Remove the head row (after a committed decision or auto-skip).
    pub fn drop_head(&mut self) {
        if !self.rows.is_empty() {
            self.rows.remove(0);
        }
    }

    /// Defer the head row to the tail. A single-row queue drops the row
    /// instead, since rotating it would re-present the same item immediately.
    pub fn rotate_head_to_tail(&mut self) {
        if self.rows.len() <= 1 {
            self.rows.clear();
        } else {
            let head = self.rows.remove(0);
            self.rows.push(head);
        }
    }
}

/// Persisted queue snapshot. Saved whole after every queue mutation so the
/// header and rows can never disagree, and a process restart resumes
/// mid-queue. The batch id identifies one fetch; in-flight work tagged with
/// an older id is discarded rather than applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedQueue {
    pub batch_id: Uuid,
    pub fetched_at: DateTime<Utc>,
    pub queue: Queue,
}

impl CachedQueue {
    pub fn new(queue: Queue) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            fetched_at: Utc::now(),
            queue,
        }
    }
}
