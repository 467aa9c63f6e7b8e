//! Spatial gate selecting the text block that counts for a frame
//!
//! Blocks are examined in the order the recognizer returned them and the
//! first one whose box overlaps the sensor region wins. No ranking by overlap,
//! confidence or length is done, so when several blocks qualify the choice
//! follows the recognizer's ordering, which is not stable across calls.

use tracing::trace;

use super::geometry::Rect;
use super::TextBlock;

/// Pick at most one block overlapping `region`
pub fn select(region: &Rect, blocks: Vec<TextBlock>) -> Option<TextBlock> {
    if region.is_degenerate() {
        return None;
    }

    blocks.into_iter().enumerate().find_map(|(index, block)| {
        let bounds = block.bounding_box?;
        if bounds.intersects(region) {
            trace!("Block {} {:?} overlaps target region", index, block.text);
            Some(block)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(text: &str, bounds: Option<Rect>) -> TextBlock {
        TextBlock {
            text: text.to_string(),
            bounding_box: bounds,
        }
    }

    fn region() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 200.0)
    }

    #[test]
    fn test_first_intersecting_block_wins() {
        let blocks = vec![
            block("outside", Some(Rect::new(0.0, 0.0, 50.0, 50.0))),
            block("first", Some(Rect::new(150.0, 150.0, 300.0, 300.0))),
            block("second", Some(Rect::new(110.0, 110.0, 190.0, 190.0))),
        ];

        let selected = select(&region(), blocks).unwrap();
        assert_eq!(selected.text, "first");
    }

    #[test]
    fn test_order_decides_between_qualifying_blocks() {
        let a = block("a", Some(Rect::new(120.0, 120.0, 130.0, 130.0)));
        let b = block("b", Some(Rect::new(140.0, 140.0, 160.0, 160.0)));

        assert_eq!(select(&region(), vec![a.clone(), b.clone()]).unwrap().text, "a");
        assert_eq!(select(&region(), vec![b, a]).unwrap().text, "b");
    }

    #[test]
    fn test_unlocalized_block_never_qualifies() {
        let blocks = vec![
            block("EXIT", None),
            block("also unlocalized", None),
        ];
        assert!(select(&region(), blocks).is_none());

        let blocks = vec![
            block("no box", None),
            block("boxed", Some(Rect::new(150.0, 150.0, 160.0, 160.0))),
        ];
        assert_eq!(select(&region(), blocks).unwrap().text, "boxed");
    }

    #[test]
    fn test_no_blocks_or_degenerate_region() {
        assert!(select(&region(), vec![]).is_none());

        let inverted = Rect::new(200.0, 200.0, 100.0, 100.0);
        let blocks = vec![block("x", Some(Rect::new(0.0, 0.0, 1000.0, 1000.0)))];
        assert!(select(&inverted, blocks).is_none());
    }
}
