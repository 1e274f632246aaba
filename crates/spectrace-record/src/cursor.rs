use spectrace_core::root::Root;

/// Tracks the content root of the most recently observed state.
///
/// Empty until the first state-bearing call. Every distinct value the cursor
/// takes is kept in [`StateCursor::history`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateCursor {
    current: Option<Root>,
    history: Vec<Root>,
}

impl StateCursor {
    /// Creates an empty cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root of the currently valid state, if any state has been seen.
    pub fn current(&self) -> Option<Root> {
        self.current
    }

    /// Checks a state root observed before a call.
    ///
    /// Returns `true` when it differs from the cursor, meaning the state changed
    /// out of band and a load-state step must be recorded. The cursor then
    /// points at `root` either way.
    pub fn observe(&mut self, root: Root) -> bool {
        if self.current == Some(root) {
            return false;
        }
        self.advance(root);
        true
    }

    /// Moves the cursor to `root` after an observed transition.
    pub fn advance(&mut self, root: Root) {
        if self.current != Some(root) {
            self.current = Some(root);
            self.history.push(root);
        }
    }

    /// Sequence of roots the cursor has held, oldest first.
    pub fn history(&self) -> &[Root] {
        &self.history
    }
}
