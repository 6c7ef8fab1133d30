mod catalog;
mod navigator;
mod stack;

pub use catalog::{Catalog, Category, FrameDescriptor, FrameId, Link};
pub use navigator::{Navigator, OpenOptions};
pub use stack::{NavigationEntry, NavigationStack, TransitionKind};
