//! Pagination – distributes layout fragments over pages.
//!
//! Handles:
//! - the content box (paper minus margins)
//! - forced breaks (`page-break-before` / `page-break-after`)
//! - fragments are kept whole unless taller than the content box; those
//!   are cut between text lines so nothing is clipped
//! - gaps are dropped at the top of a page

use std::mem;

use crate::layout::Fragment;
use crate::layout_config::{LayoutConfig, PageItem, PageLayout};

/// Page geometry in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }
}

/// Place fragments onto pages. Always yields at least one (possibly empty)
/// page.
pub fn paginate(fragments: Vec<Fragment>, geometry: &PageGeometry) -> LayoutConfig {
    let mut config = LayoutConfig::new(geometry.width, geometry.height);
    let content_height = geometry.content_height();

    let mut current = PageLayout {
        page_index: 0,
        items: Vec::new(),
    };
    // Whether anything has been placed on `current`.
    let mut used = false;
    let mut y = 0.0f32;

    let pieces = fragments.into_iter().flat_map(|frag| {
        if frag.height > content_height {
            log::debug!(
                "Splitting a {:.1}pt fragment over the {:.1}pt content box",
                frag.height,
                content_height
            );
            split_fragment(frag, content_height)
        } else {
            vec![frag]
        }
    });

    for frag in pieces {
        let start_new_page = used
            && (frag.break_before || y + frag.space_before + frag.height > content_height);
        if start_new_page {
            let next = PageLayout {
                page_index: config.pages.len() + 1,
                items: Vec::new(),
            };
            config.pages.push(mem::replace(&mut current, next));
            used = false;
            y = 0.0;
        }

        if used {
            y += frag.space_before;
        }
        for mut item in frag.items {
            item.translate(geometry.margin_left, geometry.margin_top + y);
            current.items.push(item);
        }
        y += frag.height;
        used = true;
    }

    config.pages.push(current);
    config
}

/// Cut a fragment into slices no taller than `max_height`. A cut moves up to
/// the top of any text line or rule it would cross. Fills and strokes are
/// clipped to every slice they overlap.
fn split_fragment(frag: Fragment, max_height: f32) -> Vec<Fragment> {
    let mut cuts = vec![0.0f32];
    let mut start = 0.0f32;
    while frag.height - start > max_height {
        let limit = start + max_height;
        let cut = frag
            .items
            .iter()
            .filter(|item| !is_box(item))
            .map(PageItem::vertical_span)
            .filter(|&(top, bottom)| top < limit && bottom > limit)
            .map(|(top, _)| top)
            .fold(limit, f32::min);
        // A single line taller than the page is cut through.
        start = if cut > start { cut } else { limit };
        cuts.push(start);
    }
    cuts.push(frag.height);

    let mut slices: Vec<Fragment> = cuts
        .windows(2)
        .enumerate()
        .map(|(i, w)| Fragment {
            height: w[1] - w[0],
            space_before: if i == 0 { frag.space_before } else { 0.0 },
            break_before: i > 0 || frag.break_before,
            items: Vec::new(),
        })
        .collect();
    let inner_cuts = &cuts[1..cuts.len() - 1];

    for item in frag.items {
        let (top, bottom) = item.vertical_span();
        if is_box(&item) {
            for (slice, w) in slices.iter_mut().zip(cuts.windows(2)) {
                if let Some(clipped) = clip_box(&item, w[0], w[1]) {
                    slice.items.push(clipped);
                }
            }
        } else {
            let index = inner_cuts.iter().filter(|&&c| c <= top).count();
            let mut item = item;
            item.translate(0.0, -cuts[index]);
            if bottom - cuts[index] > slices[index].height + 0.5 {
                log::debug!("Item taller than the page is cut at the page edge");
            }
            slices[index].items.push(item);
        }
    }
    slices
}

fn is_box(item: &PageItem) -> bool {
    matches!(item, PageItem::Fill { .. } | PageItem::Stroke { .. })
}

/// Intersect a fill or stroke with `[top, bottom)` and rebase it to `top`.
fn clip_box(item: &PageItem, top: f32, bottom: f32) -> Option<PageItem> {
    let (start, end) = item.vertical_span();
    let (start, end) = (start.max(top), end.min(bottom));
    if end <= start {
        return None;
    }
    let mut clipped = item.clone();
    match &mut clipped {
        PageItem::Fill { y, height, .. } | PageItem::Stroke { y, height, .. } => {
            *y = start - top;
            *height = end - start;
        }
        _ => return None,
    }
    Some(clipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: PageGeometry = PageGeometry {
        width: 595.0,
        height: 842.0,
        margin_top: 36.0,
        margin_right: 36.0,
        margin_bottom: 36.0,
        margin_left: 36.0,
    };

    fn line(text: &str, height: f32) -> Fragment {
        Fragment {
            height,
            space_before: 0.0,
            break_before: false,
            items: vec![
                PageItem::Fill {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height,
                    color: [0.0; 3],
                },
                PageItem::Text {
                    x: 0.0,
                    y: 10.0,
                    text: text.to_string(),
                    font_size: 10.0,
                    family: Default::default(),
                    bold: false,
                    italic: false,
                    underline: false,
                    color: [0.0; 3],
                },
            ],
        }
    }

    #[test]
    fn single_page() {
        let config = paginate(vec![line("a", 20.0), line("b", 20.0)], &A4);
        assert_eq!(config.pages.len(), 1);
        assert_eq!(config.page_text(0), vec!["a", "b"]);
    }

    #[test]
    fn empty_document_has_one_page() {
        let config = paginate(Vec::new(), &A4);
        assert_eq!(config.pages.len(), 1);
        assert!(config.pages[0].items.is_empty());
    }

    #[test]
    fn multiple_pages() {
        // 770pt of content box, 100pt fragments: seven per page.
        let frags = (0..20).map(|i| line(&i.to_string(), 100.0)).collect();
        let config = paginate(frags, &A4);
        assert_eq!(config.pages.len(), 3);
        assert_eq!(config.page_text(1).first(), Some(&"7"));
        assert_eq!(config.pages[2].page_index, 2);
    }

    #[test]
    fn items_are_offset_by_margins() {
        let mut second = line("b", 20.0);
        second.space_before = 5.0;
        let config = paginate(vec![line("a", 20.0), second], &A4);
        let ys: Vec<f32> = config.pages[0]
            .items
            .iter()
            .filter_map(|i| match i {
                PageItem::Fill { x, y, .. } => {
                    assert_eq!(*x, 36.0);
                    Some(*y)
                }
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![36.0, 61.0]);
    }

    #[test]
    fn forced_break_and_dropped_gap() {
        let mut second = line("b", 20.0);
        second.break_before = true;
        second.space_before = 50.0;
        let config = paginate(vec![line("a", 20.0), second], &A4);
        assert_eq!(config.pages.len(), 2);
        match &config.pages[1].items[0] {
            PageItem::Fill { y, .. } => assert_eq!(*y, 36.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn break_on_first_fragment_is_ignored() {
        let mut first = line("a", 20.0);
        first.break_before = true;
        let config = paginate(vec![first], &A4);
        assert_eq!(config.pages.len(), 1);
    }

    #[test]
    fn tall_fragment_is_split_between_lines() {
        // One 2000pt row: a background plus 100 lines of 12pt text.
        let mut row = line("", 2000.0);
        row.items.truncate(1);
        for i in 0..100 {
            row.items.push(PageItem::Text {
                x: 0.0,
                y: 20.0 * i as f32 + 15.0,
                text: i.to_string(),
                font_size: 12.0,
                family: Default::default(),
                bold: false,
                italic: false,
                underline: false,
                color: [0.0; 3],
            });
        }
        let config = paginate(vec![line("before", 20.0), row], &A4);

        assert_eq!(config.pages.len(), 4);
        let texts: Vec<&str> = (0..config.pages.len())
            .flat_map(|i| config.page_text(i))
            .collect();
        let expected: Vec<String> = std::iter::once("before".to_string())
            .chain((0..100).map(|i| i.to_string()))
            .collect();
        assert_eq!(texts, expected);

        for page in &config.pages {
            for item in &page.items {
                let (top, bottom) = item.vertical_span();
                assert!(top >= 36.0 - 0.01, "{item:?} above the content box");
                assert!(bottom <= 842.0 - 36.0 + 0.01, "{item:?} below the content box");
            }
            assert!(page
                .items
                .iter()
                .any(|i| matches!(i, PageItem::Fill { .. })));
        }
    }
}
