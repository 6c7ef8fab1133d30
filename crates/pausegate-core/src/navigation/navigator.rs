//! Navigation stack operations over a validated catalog.
//!
//! The navigator owns the stack and the variant cursor. Every frame that
//! enters the stack is checked against the catalog first, so the top entry
//! always belongs to exactly one category.

use tracing::debug;

use super::{Catalog, Category, FrameId, NavigationEntry, NavigationStack};
use crate::error::NavigationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Replace the top entry instead of pushing.
    pub replace: bool,
}

impl OpenOptions {
    pub fn push() -> Self {
        Self { replace: false }
    }

    pub fn replace() -> Self {
        Self { replace: true }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    catalog: Catalog,
    stack: NavigationStack,
    cursor: u64,
}

impl Navigator {
    /// Seed the stack with the catalog root.
    pub fn new(catalog: Catalog) -> Self {
        let stack = NavigationStack::new(catalog.root().clone());
        Self {
            catalog,
            stack,
            cursor: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn stack(&self) -> &NavigationStack {
        &self.stack
    }

    pub fn top(&self) -> &NavigationEntry {
        self.stack.top()
    }

    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn category_of(&self, frame: &FrameId) -> Option<Category> {
        self.catalog.category_of(frame)
    }

    /// Category of the visible frame.
    pub fn current_category(&self) -> Category {
        // Frames are validated on entry, so the lookup cannot miss.
        self.catalog
            .category_of(&self.stack.top().frame)
            .unwrap_or(Category::Home)
    }

    /// `sequence[(cursor + offset) mod len]`. Does not move the cursor.
    pub fn next_variant(&self, category: Category, offset: i64) -> Option<&FrameId> {
        self.catalog
            .variant(category, self.cursor as i128 + offset as i128)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn open(&mut self, frame: &FrameId, opts: OpenOptions) -> Result<(), NavigationError> {
        if !self.catalog.contains(frame) {
            return Err(NavigationError::UnknownFrame(frame.clone()));
        }
        if opts.replace {
            self.stack.replace_top(frame.clone());
        } else {
            self.stack.push(frame.clone());
        }
        debug!(frame = %frame, replace = opts.replace, depth = self.stack.depth(), "nav: open");
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), NavigationError> {
        let removed = self.stack.pop()?;
        debug!(frame = %removed.frame, depth = self.stack.depth(), "nav: pop");
        Ok(())
    }

    pub fn reset(&mut self, frame: &FrameId) -> Result<(), NavigationError> {
        if !self.catalog.contains(frame) {
            return Err(NavigationError::UnknownFrame(frame.clone()));
        }
        self.stack.reset(frame.clone());
        debug!(frame = %frame, "nav: reset");
        Ok(())
    }

    /// Reset to the catalog root. Always succeeds.
    pub fn exit(&mut self) {
        let root = self.catalog.root().clone();
        debug!(frame = %root, "nav: exit to root");
        self.stack.reset(root);
    }

    /// Follow a labelled link from the visible frame.
    pub fn follow(&mut self, label: &str) -> Result<(), NavigationError> {
        let top = self.stack.top().frame.clone();
        let link = self
            .catalog
            .link(&top, label)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownLink {
                frame: top.clone(),
                label: label.to_string(),
            })?;
        let target = self
            .next_variant(link.to, 0)
            .cloned()
            .ok_or_else(|| NavigationError::UnknownLink {
                frame: top,
                label: label.to_string(),
            })?;
        self.open(&target, OpenOptions {
            replace: link.replace,
        })
    }

    pub fn advance_cursor(&mut self) {
        self.cursor = self.cursor.wrapping_add(1);
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn replace_at(&mut self, index: usize, frame: &FrameId) -> Result<(), NavigationError> {
        if !self.catalog.contains(frame) {
            return Err(NavigationError::UnknownFrame(frame.clone()));
        }
        self.stack.replace_at(index, frame.clone());
        debug!(frame = %frame, index, "nav: replace in place");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::TransitionKind;

    fn navigator() -> Navigator {
        Navigator::new(Catalog::builtin())
    }

    #[test]
    fn starts_at_root() {
        let nav = navigator();
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.top().frame.as_str(), "1:2");
        assert_eq!(nav.current_category(), Category::Home);
    }

    #[test]
    fn open_unknown_frame_fails_closed() {
        let mut nav = navigator();
        let err = nav.open(&FrameId::from("0:0"), OpenOptions::push()).unwrap_err();
        assert_eq!(err, NavigationError::UnknownFrame(FrameId::from("0:0")));
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.top().frame.as_str(), "1:2");
    }

    #[test]
    fn open_push_and_replace() {
        let mut nav = navigator();
        nav.open(&FrameId::from("4:2"), OpenOptions::push()).unwrap();
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.top().transition, TransitionKind::Push);

        nav.open(&FrameId::from("4:30"), OpenOptions::replace()).unwrap();
        assert_eq!(nav.depth(), 2);
        assert_eq!(nav.top().transition, TransitionKind::Replace);
        assert_eq!(nav.current_category(), Category::Stats);
    }

    #[test]
    fn pop_on_root_reports_underflow() {
        let mut nav = navigator();
        assert_eq!(nav.pop(), Err(NavigationError::StackUnderflow));
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn reset_rejects_unknown_frame() {
        let mut nav = navigator();
        nav.open(&FrameId::from("4:2"), OpenOptions::push()).unwrap();
        assert!(nav.reset(&FrameId::from("nope")).is_err());
        assert_eq!(nav.depth(), 2);
        nav.reset(&FrameId::from("1:14")).unwrap();
        assert_eq!(nav.depth(), 1);
        assert_eq!(nav.top().transition, TransitionKind::Reset);
    }

    #[test]
    fn next_variant_uses_cursor_without_moving_it() {
        let mut nav = navigator();
        assert_eq!(nav.next_variant(Category::Breathing, 0).unwrap().as_str(), "1:33");
        assert_eq!(nav.next_variant(Category::Breathing, 1).unwrap().as_str(), "1:58");
        assert_eq!(nav.cursor(), 0);

        nav.advance_cursor();
        assert_eq!(nav.next_variant(Category::Breathing, 0).unwrap().as_str(), "1:58");
        assert_eq!(nav.next_variant(Category::Delay, 0).unwrap().as_str(), "3:5");

        nav.reset_cursor();
        assert_eq!(nav.cursor(), 0);
    }

    #[test]
    fn follow_resolves_links() {
        let mut nav = navigator();
        nav.follow("settings").unwrap();
        assert_eq!(nav.top().frame.as_str(), "4:2");
        assert_eq!(nav.depth(), 2);

        nav.follow("stats").unwrap();
        assert_eq!(nav.top().frame.as_str(), "4:30");
        assert_eq!(nav.depth(), 2);

        let err = nav.follow("nowhere").unwrap_err();
        assert!(matches!(err, NavigationError::UnknownLink { .. }));
    }
}
