//! Undo/redo snapshot log.
//!
//! The log is a linear sequence of graph snapshots with a cursor on the
//! current one. Snapshots are `Arc`-shared with the store's working graph,
//! so moving the cursor never copies; the store copies-on-write the next
//! time it mutates a shared graph.
//!
//! Gestures use **batching**: the graph is captured when the outermost
//! batch opens, mutations inside it are applied live but not recorded, and
//! closing the batch records one snapshot for the whole gesture. Cancelling
//! hands back the captured graph so the gesture can be reverted.

use crate::graph::FlowGraph;
use std::collections::VecDeque;
use std::sync::Arc;

/// One recorded graph state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub graph: Arc<FlowGraph>,
    pub description: String,
}

/// Append-only, truncating snapshot log with an undo/redo cursor.
#[derive(Debug)]
pub struct History {
    snapshots: VecDeque<Snapshot>,
    cursor: usize,
    /// Maximum retained snapshots (0 = unbounded).
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Graph captured when the outermost batch opened.
    batch_base: Option<Arc<FlowGraph>>,
    /// Description of the first mutation inside the current batch.
    batch_description: Option<String>,
}

impl History {
    pub fn new(initial: Arc<FlowGraph>, max_depth: usize) -> Self {
        let mut history = Self {
            snapshots: VecDeque::new(),
            cursor: 0,
            max_depth,
            batch_depth: 0,
            batch_base: None,
            batch_description: None,
        };
        history.reset(initial);
        history
    }

    /// Discard everything and start over from a single snapshot.
    pub fn reset(&mut self, initial: Arc<FlowGraph>) {
        self.snapshots.clear();
        self.snapshots.push_back(Snapshot {
            graph: initial,
            description: "initial".to_string(),
        });
        self.cursor = 0;
        self.batch_depth = 0;
        self.batch_base = None;
        self.batch_description = None;
    }

    /// Record a committed mutation. Inside a batch this only marks the
    /// batch dirty; the snapshot is taken when the batch closes.
    pub fn record(&mut self, graph: &Arc<FlowGraph>, description: &str) {
        if self.batch_depth > 0 {
            if self.batch_description.is_none() {
                self.batch_description = Some(description.to_string());
            }
            return;
        }
        self.push(Arc::clone(graph), description.to_string());
    }

    fn push(&mut self, graph: Arc<FlowGraph>, description: String) {
        // A fresh mutation after undo discards the redo branch.
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push_back(Snapshot { graph, description });
        self.cursor = self.snapshots.len() - 1;
        self.evict();
    }

    /// Change the retention limit, evicting right away if it shrank.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.evict();
    }

    /// Drop the oldest snapshots past the limit. The current snapshot is
    /// never dropped; once it is the oldest, redo snapshots go instead.
    fn evict(&mut self) {
        if self.max_depth == 0 {
            return;
        }
        while self.snapshots.len() > self.max_depth {
            if self.cursor > 0 {
                self.snapshots.pop_front();
                self.cursor -= 1;
            } else {
                self.snapshots.pop_back();
            }
        }
    }

    /// Step back. Returns the graph to restore, or `None` at the oldest
    /// snapshot or while a batch is open.
    pub fn undo(&mut self) -> Option<Arc<FlowGraph>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(Arc::clone(&self.snapshots[self.cursor].graph))
    }

    /// Step forward. Returns the graph to restore, or `None` at the newest
    /// snapshot or while a batch is open.
    pub fn redo(&mut self) -> Option<Arc<FlowGraph>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(Arc::clone(&self.snapshots[self.cursor].graph))
    }

    pub fn can_undo(&self) -> bool {
        self.batch_depth == 0 && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.batch_depth == 0 && self.cursor + 1 < self.snapshots.len()
    }

    /// Start a batch group. Nested calls only deepen the batch.
    pub fn begin_batch(&mut self, current: &Arc<FlowGraph>) {
        if self.batch_depth == 0 {
            self.batch_base = Some(Arc::clone(current));
            self.batch_description = None;
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and the graph
    /// actually changed, one snapshot is recorded. Returns whether it was.
    pub fn end_batch(&mut self, current: &Arc<FlowGraph>) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }

        let base = self.batch_base.take();
        let description = self.batch_description.take();
        let changed = match &base {
            Some(base) => !Arc::ptr_eq(base, current) && **base != **current,
            None => false,
        };
        if changed {
            let description = description.unwrap_or_else(|| "canvas edit".to_string());
            self.push(Arc::clone(current), description);
        }
        changed
    }

    /// Abort the whole batch (however deeply nested) and return the graph
    /// captured when it opened.
    pub fn cancel_batch(&mut self) -> Option<Arc<FlowGraph>> {
        if self.batch_depth == 0 {
            return None;
        }
        self.batch_depth = 0;
        self.batch_description = None;
        self.batch_base.take()
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Number of retained snapshots, including the current one.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Description of the snapshot under the cursor.
    pub fn current_description(&self) -> Option<&str> {
        self.snapshots
            .get(self.cursor)
            .map(|s| s.description.as_str())
    }
}
