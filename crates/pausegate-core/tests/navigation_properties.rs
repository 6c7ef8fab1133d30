//! Property tests for the navigation graph.

use pausegate_core::error::NavigationError;
use pausegate_core::navigation::{Catalog, Category, FrameId, Navigator, OpenOptions};
use proptest::prelude::*;

/// A catalog with `lens[i]` variants in each category, ids `"{i}:{j}"`.
fn catalog_with(lens: &[usize]) -> Catalog {
    let categories = Category::ALL.iter().zip(lens).enumerate().map(|(i, (&c, &n))| {
        let frames: Vec<FrameId> = (0..n).map(|j| FrameId::new(format!("{i}:{j}"))).collect();
        (c, frames)
    });
    Catalog::new(categories, Vec::new()).unwrap()
}

fn lens() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..7, Category::ALL.len())
}

proptest! {
    #[test]
    fn next_variant_cycles_with_sequence_length(
        lens in lens(),
        advances in 0u32..50,
        k in -1_000i64..1_000,
    ) {
        let mut nav = Navigator::new(catalog_with(&lens));
        for _ in 0..advances {
            nav.advance_cursor();
        }
        for (category, frames) in nav.catalog().categories() {
            let n = frames.len() as i64;
            prop_assert_eq!(
                nav.next_variant(category, k),
                nav.next_variant(category, k + n)
            );
            prop_assert_eq!(
                nav.next_variant(category, k),
                nav.next_variant(category, k - n)
            );
        }
    }

    #[test]
    fn every_variant_belongs_to_its_category(lens in lens(), k in any::<i64>()) {
        let nav = Navigator::new(catalog_with(&lens));
        for category in Category::ALL {
            let frame = nav.next_variant(category, k).unwrap();
            prop_assert_eq!(nav.category_of(frame), Some(category));
        }
    }

    #[test]
    fn pop_at_root_never_mutates(lens in lens(), pushes in 0usize..4) {
        let mut nav = Navigator::new(catalog_with(&lens));
        for _ in 0..pushes {
            let frame = nav.next_variant(Category::Settings, 0).unwrap().clone();
            nav.open(&frame, OpenOptions::push()).unwrap();
        }
        for _ in 0..pushes {
            nav.pop().unwrap();
        }

        let before = nav.stack().clone();
        prop_assert_eq!(nav.pop(), Err(NavigationError::StackUnderflow));
        prop_assert_eq!(nav.stack(), &before);
    }
}
