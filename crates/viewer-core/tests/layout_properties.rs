use doc_model::{Orientation, PageMode, ScrollDirection};
use proptest::prelude::*;
use viewer_core::{compute_spreads, LayoutParams, Size};

fn params(page_mode: PageMode, double_on_first: bool, vertical: bool, width: f32, height: f32) -> LayoutParams {
    LayoutParams {
        page_mode,
        orientation: Orientation::from_size(width, height),
        double_page_on_first_page: double_on_first,
        scroll_direction: if vertical { ScrollDirection::Vertical } else { ScrollDirection::Horizontal },
        viewport: Size::new(width, height),
        page_padding: 20.0,
        zoom_small_documents: true,
    }
}

fn page_mode() -> impl Strategy<Value = PageMode> {
    prop_oneof![Just(PageMode::Single), Just(PageMode::Double), Just(PageMode::Automatic)]
}

proptest! {
    #[test]
    fn spreads_partition_the_page_range(
        page_count in 1u32..400,
        mode in page_mode(),
        double_on_first in any::<bool>(),
        vertical in any::<bool>(),
        width in 100.0f32..2000.0,
        height in 100.0f32..2000.0,
    ) {
        let params = params(mode, double_on_first, vertical, width, height);
        let spreads = compute_spreads(page_count, &params, |page| 0.5 + (page % 3) as f32 * 0.25)
            .expect("layout should succeed");

        let mut expected = 0;
        for (index, spread) in spreads.iter().enumerate() {
            prop_assert_eq!(spread.index, index);
            prop_assert_eq!(spread.pages.first(), expected);
            prop_assert_eq!(spread.page_frames.len(), spread.pages.len());
            expected = spread.pages.last() + 1;
        }
        prop_assert_eq!(expected, page_count);
    }

    #[test]
    fn double_mode_with_solitary_cover(page_count in 1u32..500) {
        let params = params(PageMode::Double, false, false, 1024.0, 768.0);
        let spreads = compute_spreads(page_count, &params, |_| 0.75).expect("layout should succeed");

        prop_assert_eq!(spreads[0].pages.len(), 1);
        let last = spreads.last().expect("at least one spread");
        // The cover stands alone, so pairs cover the remaining pages from 1.
        if page_count > 1 && page_count % 2 == 1 {
            prop_assert_eq!(last.pages.len(), 2);
        } else {
            prop_assert_eq!(last.pages.len(), 1);
        }
        prop_assert!(spreads[1..spreads.len().saturating_sub(1).max(1)].iter().all(|spread| spread.pages.len() == 2));
    }

    #[test]
    fn layout_is_deterministic(
        page_count in 1u32..200,
        mode in page_mode(),
        double_on_first in any::<bool>(),
        width in 100.0f32..2000.0,
        height in 100.0f32..2000.0,
    ) {
        let params = params(mode, double_on_first, false, width, height);
        let aspect = |page: u32| 0.6 + (page % 5) as f32 * 0.1;

        let first = compute_spreads(page_count, &params, aspect).expect("layout should succeed");
        let second = compute_spreads(page_count, &params, aspect).expect("layout should succeed");

        prop_assert_eq!(first, second);
    }

    #[test]
    fn content_stays_inside_its_frame(
        page_count in 1u32..50,
        mode in page_mode(),
        width in 100.0f32..2000.0,
        height in 100.0f32..2000.0,
        aspect in 0.2f32..4.0,
    ) {
        let params = params(mode, false, false, width, height);
        let spreads = compute_spreads(page_count, &params, |_| aspect).expect("layout should succeed");

        for spread in &spreads {
            let content = spread.content_frame;
            let frame = spread.frame;
            prop_assert!(content.x >= frame.x - 0.5);
            prop_assert!(content.y >= frame.y - 0.5);
            prop_assert!(content.x + content.width <= frame.x + frame.width + 0.5);
            prop_assert!(content.y + content.height <= frame.y + frame.height + 0.5);
        }
    }
}
