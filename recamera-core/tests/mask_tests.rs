//! Integration tests for the privacy-mask engine
//!
//! Example-based tests pin down concrete geometry while the proptest blocks
//! check the list invariants over arbitrary input.

use proptest::prelude::*;
use recamera_core::mask::{DrawGesture, MaskEditor, MaskList, ResizeHandle, MAX_MASKS, MIN_RESIZE_FRACTION};
use recamera_core::{ceil3, round3, Point, RelativeRect, Size};

fn sized(x: u32, y: u32, w: u32, h: u32) -> RelativeRect {
    RelativeRect::new(
        f64::from(x) / 1000.0,
        f64::from(y) / 1000.0,
        f64::from(w) / 1000.0,
        f64::from(h) / 1000.0,
    )
}

#[test]
fn test_pixel_projection_800x600() {
    let mut list = MaskList::new();
    let mask = list.add(RelativeRect::new(0.1, 0.1, 0.2, 0.2)).unwrap();
    let px = mask.to_pixels(Size::new(800.0, 600.0));
    assert!((px.x - 80.0).abs() < 1e-9);
    assert!((px.y - 60.0).abs() < 1e-9);
    assert!((px.right() - 240.0).abs() < 1e-9);
    assert!((px.bottom() - 180.0).abs() < 1e-9);
}

#[test]
fn test_topmost_mask_wins_hit_test() {
    let mut list = MaskList::new();
    let lower = list.add(RelativeRect::new(0.1, 0.1, 0.4, 0.4)).unwrap();
    let upper = list.add(RelativeRect::new(0.3, 0.3, 0.4, 0.4)).unwrap();
    let container = Size::new(1000.0, 1000.0);

    assert_eq!(list.hit_test(Point::new(400.0, 400.0), container), Some(upper.id));
    assert_eq!(list.hit_test(Point::new(150.0, 150.0), container), Some(lower.id));
    assert_eq!(list.hit_test(Point::new(900.0, 100.0), container), None);
}

#[test]
fn test_small_draw_is_discarded() {
    let container = Size::new(800.0, 600.0);
    let mut list = MaskList::new();
    let mut gesture = DrawGesture::begin(Point::new(100.0, 100.0));
    // 4px wide is 0.005 of the width
    gesture.update(Point::new(104.0, 300.0));
    assert!(list.commit_draw(&gesture, container).is_none());
    assert!(list.is_empty());
}

#[test]
fn test_rehydrated_list_continues_ids() {
    let json = r#"{"iEnabled":1,"privacyMask":[
        {"id":4,"iPositionX":0.1,"iPositionY":0.1,"iMaskWidth":0.2,"iMaskHeight":0.2},
        {"id":9,"iPositionX":0.5,"iPositionY":0.5,"iMaskWidth":0.2,"iMaskHeight":0.2}
    ]}"#;
    let mut list: MaskList = serde_json::from_str(json).unwrap();
    assert!(list.is_enabled());
    let added = list.add(RelativeRect::new(0.0, 0.0, 0.1, 0.1)).unwrap();
    assert_eq!(added.id, 10);
}

#[test]
fn test_rehydrated_duplicate_ids_are_reassigned() {
    let json = r#"{"iEnabled":1,"privacyMask":[
        {"id":0,"iPositionX":0.1,"iPositionY":0.1,"iMaskWidth":0.2,"iMaskHeight":0.2},
        {"id":1,"iPositionX":0.4,"iPositionY":0.1,"iMaskWidth":0.2,"iMaskHeight":0.2},
        {"id":1,"iPositionX":0.7,"iPositionY":0.1,"iMaskWidth":0.2,"iMaskHeight":0.2}
    ]}"#;
    let mut list: MaskList = serde_json::from_str(json).unwrap();
    let ids: Vec<_> = list.masks().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);

    let removed = list.remove(2).unwrap();
    assert_eq!(removed.position_x, 0.7);
    assert_eq!(list.get(1).unwrap().position_x, 0.4);
    assert_eq!(list.add(RelativeRect::new(0.0, 0.5, 0.1, 0.1)).unwrap().id, 3);
}

#[test]
fn test_editor_draw_then_drag_flow() {
    let container = Size::new(800.0, 600.0);
    let mut editor = MaskEditor::new(container);
    let list = MaskList::new();

    editor.set_draw_mode(true);
    editor.pointer_down(&list, Point::new(80.0, 60.0));
    let list = editor
        .pointer_move(&list, Point::new(240.0, 180.0))
        .unwrap_or(list);
    let list = editor.pointer_up(&list).unwrap();
    assert_eq!(list.len(), 1);

    editor.set_draw_mode(false);
    editor.pointer_down(&list, Point::new(100.0, 100.0));
    let moved = editor.pointer_move(&list, Point::new(500.0, 100.0)).unwrap();
    let mask = moved.masks()[0];
    assert_eq!(mask.position_x, 0.6);
    assert_eq!(mask.position_y, 0.1);
    // the input snapshot is untouched
    assert_eq!(list.masks()[0].position_x, 0.1);
}

proptest! {
    #[test]
    fn prop_list_never_exceeds_limit(ops in prop::collection::vec((any::<bool>(), 0u32..20), 0..60)) {
        let mut list = MaskList::new();
        for (add, id) in ops {
            if add {
                list.add(RelativeRect::new(0.1, 0.1, 0.2, 0.2));
            } else {
                list.remove(id);
            }
            prop_assert!(list.len() <= MAX_MASKS);
        }
    }

    #[test]
    fn prop_undersized_commit_is_rejected(w in 0u32..10, h in 0u32..1000) {
        let mut list = MaskList::new();
        prop_assert!(list.add(sized(100, 100, w, h)).is_none());
        prop_assert!(list.add(sized(100, 100, h, w)).is_none());
        prop_assert!(list.is_empty());
    }

    #[test]
    fn prop_drag_stays_inside_container(
        w in 10u32..=1000,
        h in 10u32..=1000,
        px in -5000.0f64..5000.0,
        py in -5000.0f64..5000.0,
    ) {
        let container = Size::new(1280.0, 720.0);
        let mut list = MaskList::new();
        let mask = list.add(sized(0, 0, w, h)).unwrap();
        list.drag(mask.id, Point::new(px, py), Point::new(3.0, 7.0), container);

        let moved = list.get(mask.id).unwrap();
        prop_assert!(moved.position_x >= 0.0);
        prop_assert!(moved.position_y >= 0.0);
        prop_assert!(moved.position_x <= round3(1.0 - moved.width) + 1e-9);
        prop_assert!(moved.position_y <= round3(1.0 - moved.height) + 1e-9);
    }

    #[test]
    fn prop_resize_respects_floor(
        handle in 0usize..8,
        dx in -3000.0f64..3000.0,
        dy in -3000.0f64..3000.0,
    ) {
        let container = Size::new(1920.0, 1080.0);
        let min_px = container.shorter_side() * MIN_RESIZE_FRACTION;
        let min_w = ceil3(min_px / container.width);
        let min_h = ceil3(min_px / container.height);

        let mut list = MaskList::new();
        let mask = list.add(RelativeRect::new(0.3, 0.3, 0.2, 0.2)).unwrap();
        list.resize(mask.id, ResizeHandle::ALL[handle], dx, dy, container);

        let resized = list.get(mask.id).unwrap();
        prop_assert!(resized.width >= min_w - 1e-9);
        prop_assert!(resized.height >= min_h - 1e-9);
        prop_assert!(resized.position_x >= 0.0);
        prop_assert!(resized.position_y >= 0.0);
        prop_assert!(resized.position_x + resized.width <= 1.0 + 1e-9);
        prop_assert!(resized.position_y + resized.height <= 1.0 + 1e-9);
    }

    #[test]
    fn prop_geometry_is_resolution_independent(
        x in 0u32..500,
        y in 0u32..500,
        w in 10u32..500,
        h in 10u32..500,
        width in 100.0f64..4000.0,
        height in 100.0f64..4000.0,
    ) {
        let mut list = MaskList::new();
        list.add(sized(x, y, w, h)).unwrap();

        let json = serde_json::to_string(&list).unwrap();
        let restored: MaskList = serde_json::from_str(&json).unwrap();
        let mask = restored.masks()[0];

        let container = Size::new(width, height);
        let back = RelativeRect::from_pixels(mask.to_pixels(container), container);
        prop_assert_eq!(back, mask.rect());
    }
}
