use serde::{Deserialize, Serialize};

use super::FrameId;
use crate::error::NavigationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Push,
    Pop,
    Replace,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub frame: FrameId,
    /// How this entry last became visible.
    pub transition: TransitionKind,
}

/// Ordered path of frames. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NavigationEntry>", into = "Vec<NavigationEntry>")]
pub struct NavigationStack {
    entries: Vec<NavigationEntry>,
}

impl TryFrom<Vec<NavigationEntry>> for NavigationStack {
    type Error = NavigationError;

    fn try_from(entries: Vec<NavigationEntry>) -> Result<Self, Self::Error> {
        if entries.is_empty() {
            return Err(NavigationError::StackUnderflow);
        }
        Ok(Self { entries })
    }
}

impl From<NavigationStack> for Vec<NavigationEntry> {
    fn from(stack: NavigationStack) -> Self {
        stack.entries
    }
}

impl NavigationStack {
    pub fn new(root: FrameId) -> Self {
        Self {
            entries: vec![NavigationEntry {
                frame: root,
                transition: TransitionKind::Reset,
            }],
        }
    }

    pub fn top(&self) -> &NavigationEntry {
        // Non-empty by construction; pop refuses to remove the last entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&NavigationEntry> {
        self.entries.get(index)
    }

    pub fn push(&mut self, frame: FrameId) {
        self.entries.push(NavigationEntry {
            frame,
            transition: TransitionKind::Push,
        });
    }

    pub fn replace_top(&mut self, frame: FrameId) {
        let last = self.entries.len() - 1;
        self.replace_at(last, frame);
    }

    /// Replace an entry below the top without disturbing what sits above it.
    /// Out-of-range indices are ignored.
    pub fn replace_at(&mut self, index: usize, frame: FrameId) {
        if let Some(entry) = self.entries.get_mut(index) {
            *entry = NavigationEntry {
                frame,
                transition: TransitionKind::Replace,
            };
        }
    }

    /// Remove the top entry. Refuses at depth 1.
    pub fn pop(&mut self) -> Result<NavigationEntry, NavigationError> {
        if self.entries.len() <= 1 {
            return Err(NavigationError::StackUnderflow);
        }
        let removed = self.entries.pop().ok_or(NavigationError::StackUnderflow)?;
        if let Some(exposed) = self.entries.last_mut() {
            exposed.transition = TransitionKind::Pop;
        }
        Ok(removed)
    }

    pub fn reset(&mut self, frame: FrameId) {
        self.entries.clear();
        self.entries.push(NavigationEntry {
            frame,
            transition: TransitionKind::Reset,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializing_an_empty_stack_fails() {
        assert!(serde_json::from_str::<NavigationStack>("[]").is_err());

        let json = r#"[{"frame": "root", "transition": "reset"}]"#;
        let stack: NavigationStack = serde_json::from_str(json).unwrap();
        assert_eq!(stack.top().frame.as_str(), "root");
    }

    #[test]
    fn pop_at_root_underflows_without_mutation() {
        let mut stack = NavigationStack::new(FrameId::from("root"));
        let before = stack.entries().to_vec();
        assert_eq!(stack.pop(), Err(NavigationError::StackUnderflow));
        assert_eq!(stack.entries(), before.as_slice());
    }

    #[test]
    fn pop_marks_exposed_entry() {
        let mut stack = NavigationStack::new(FrameId::from("root"));
        stack.push(FrameId::from("a"));
        let removed = stack.pop().unwrap();
        assert_eq!(removed.frame.as_str(), "a");
        assert_eq!(stack.top().transition, TransitionKind::Pop);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn replace_at_keeps_upper_entries() {
        let mut stack = NavigationStack::new(FrameId::from("root"));
        stack.push(FrameId::from("a"));
        stack.push(FrameId::from("b"));
        stack.replace_at(1, FrameId::from("a2"));
        assert_eq!(stack.get(1).unwrap().frame.as_str(), "a2");
        assert_eq!(stack.top().frame.as_str(), "b");
        stack.replace_at(9, FrameId::from("x"));
        assert_eq!(stack.depth(), 3);
    }

    #[test]
    fn reset_leaves_single_entry() {
        let mut stack = NavigationStack::new(FrameId::from("root"));
        stack.push(FrameId::from("a"));
        stack.push(FrameId::from("b"));
        stack.reset(FrameId::from("home"));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.top().transition, TransitionKind::Reset);
    }
}
