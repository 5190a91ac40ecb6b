use super::{EditLog, EditRecord};

/// Undo/redo on top of the edit log.
///
/// The log itself is the undo stack: undoing pops its newest record and
/// redoing pushes it back. Only undone records are kept here.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    redo_stack: Vec<EditRecord>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            redo_stack: Vec::new(),
        }
    }

    /// Move the newest record of `log` onto the redo stack
    pub fn undo(&mut self, log: &mut EditLog) -> bool {
        if let Some(record) = log.pop() {
            self.redo_stack.push(record);
            true
        } else {
            false
        }
    }

    /// Move the most recently undone record back into `log`
    pub fn redo(&mut self, log: &mut EditLog) -> bool {
        if let Some(record) = self.redo_stack.pop() {
            log.push(record);
            true
        } else {
            false
        }
    }

    /// Forget undone records. Called whenever a new edit is made.
    pub fn clear_redo(&mut self) {
        self.redo_stack.clear();
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
