//! Index-addressed append-only log with a head cursor.
//!
//! Entries are never removed. `start` only moves forward, past entries that
//! have been processed; `end` is the number of entries ever pushed.

use serde::{Deserialize, Serialize};

/// A queue entry and whether it has been processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSlot<T> {
    pub item: T,
    pub processed: bool,
}

/// Why a queue entry could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// Index is before `start` or at/after `end`.
    OutOfRange,
    /// Entry was processed already.
    AlreadyProcessed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendLog<T> {
    slots: Vec<QueueSlot<T>>,
    start: u64,
}

impl<T> Default for AppendLog<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            start: 0,
        }
    }
}

impl<T> AppendLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at index `end` and return that index.
    pub fn push(&mut self, item: T) -> u64 {
        let index = self.end();
        self.slots.push(QueueSlot {
            item,
            processed: false,
        });
        index
    }

    /// Index of the oldest unprocessed entry.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Index the next pushed entry will get.
    pub fn end(&self) -> u64 {
        self.slots.len() as u64
    }

    /// `end - start`.
    pub fn len(&self) -> u64 {
        self.end() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end()
    }

    /// Entries in `[start, end)` that are still unprocessed.
    pub fn outstanding(&self) -> usize {
        self.window().filter(|(_, slot)| !slot.processed).count()
    }

    /// The head entry, if any.
    pub fn head(&self) -> Option<(u64, &T)> {
        let slot = self.slots.get(self.start as usize)?;
        Some((self.start, &slot.item))
    }

    /// Any entry ever pushed, processed or not.
    pub fn get(&self, index: u64) -> Option<&QueueSlot<T>> {
        usize::try_from(index).ok().and_then(|i| self.slots.get(i))
    }

    /// Mark the entry at `index` processed and move `start` past every
    /// processed entry at the head.
    pub fn complete(&mut self, index: u64) -> Result<&T, QueueError> {
        if index < self.start || index >= self.end() {
            return Err(QueueError::OutOfRange);
        }
        let i = index as usize;
        if self.slots[i].processed {
            return Err(QueueError::AlreadyProcessed);
        }
        self.slots[i].processed = true;
        while let Some(slot) = self.slots.get(self.start as usize) {
            if !slot.processed {
                break;
            }
            self.start += 1;
        }
        Ok(&self.slots[i].item)
    }

    /// Complete the head entry.
    pub fn pop_head(&mut self) -> Option<(u64, &T)> {
        let index = self.start;
        self.complete(index).ok().map(|item| (index, item))
    }

    /// Iterate `[start, end)` with indices.
    pub fn window(&self) -> impl Iterator<Item = (u64, &QueueSlot<T>)> {
        self.slots
            .iter()
            .enumerate()
            .skip(self.start as usize)
            .map(|(i, slot)| (i as u64, slot))
    }
}
