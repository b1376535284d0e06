use scanmark_shared::headless::{HeadlessImage, HeadlessOverlay, HeadlessRaster};
use scanmark_shared::{
    decode_archive_file, encode_archive_file, AffineTransform, Point, RectSelection, RectSelector,
    SelectionExport, Selector, TransformHandle, Viewer, ViewerConfig, ViewerMode,
};

fn rect_selector() -> RectSelector<HeadlessOverlay> {
    RectSelector::new(
        HeadlessOverlay::new(),
        TransformHandle::default(),
        &ViewerConfig::default(),
    )
}

#[test]
fn drag_commit_archive_clear_on_slice_three() {
    let mut selector = rect_selector();
    selector.update_current_slice(3);
    selector.on_pointer_down(Point::new(10.0, 10.0));
    selector.on_pointer_move(Point::new(60.0, 80.0));
    selector.on_pointer_up(Point::new(60.0, 80.0));

    let expected = RectSelection::new(3, 10.0, 10.0, 50.0, 70.0);
    assert_eq!(selector.current_selection(), Some(&expected));

    selector.add_current_selection();
    selector.archive_selections(None);
    selector.clear_selections();

    assert!(selector.selections().is_empty());
    assert_eq!(selector.archive().for_slice(3), &[expected]);
    assert_eq!(selector.archive().len(), 1);
    assert!(selector.has_archived_selections());
}

#[test]
fn scale_then_translate_matrix() {
    let mut transform = AffineTransform::from_array([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
    transform.scale(2.0, 2.0).unwrap();
    transform.translate(5.0, 5.0).unwrap();
    assert_eq!(transform.get(), [2.0, 0.0, 0.0, 2.0, 10.0, 10.0]);
}

#[test]
fn archive_survives_until_explicitly_cleared() {
    let mut selector = rect_selector();
    selector.on_pointer_down(Point::new(0.0, 0.0));
    selector.on_pointer_up(Point::new(20.0, 20.0));
    selector.archive_selections(None);
    selector.clear_selections();
    selector.update_current_slice(9);
    selector.clear_canvas_selection();
    selector.remove_current_selection();
    assert!(selector.has_archived_selections());
    selector.clear_archive();
    assert!(!selector.has_archived_selections());
}

#[test]
fn mid_drag_slice_switch_commits_nothing() {
    let mut selector = rect_selector();
    selector.update_current_slice(1);
    selector.on_pointer_down(Point::new(10.0, 10.0));
    selector.on_pointer_move(Point::new(90.0, 90.0));
    selector.update_current_slice(2);
    selector.on_pointer_up(Point::new(90.0, 90.0));
    assert!(!selector.has_slice_selection());
    assert!(selector.selections().is_empty());
    assert_eq!(selector.current_selection(), None);
}

#[test]
fn zoom_session_then_select_then_export() {
    let mut viewer = Viewer::new(
        ViewerConfig::default(),
        HeadlessOverlay::new(),
        HeadlessRaster::new(400.0, 400.0),
        HeadlessRaster::new(400.0, 400.0),
    )
    .unwrap();
    viewer.set_slice_image(HeadlessImage::new("scan/7"));
    viewer.on_slice_change(7);

    viewer.set_mode(ViewerMode::Zooming);
    assert!(viewer.zoom_in());
    viewer.set_mode(ViewerMode::Selecting);

    viewer.primary_pointer_down(Point::new(200.0, 200.0));
    viewer.primary_pointer_move(Point::new(240.0, 260.0));
    viewer.primary_pointer_up(Point::new(240.0, 260.0));

    let batch = viewer.take_selection_batch();
    assert_eq!(batch, vec![RectSelection::new(7, 200.0, 200.0, 20.0, 30.0)]);

    let json = SelectionExport::new(batch.clone()).to_json().unwrap();
    assert!(json.contains("\"slice_index\":7"));

    let file = encode_archive_file(viewer.selector().archive());
    let restored = decode_archive_file(&file).unwrap();
    assert_eq!(restored.to_vec(), batch);
}

#[test]
fn archive_file_restores_into_a_fresh_scan() {
    let mut viewer = Viewer::new(
        ViewerConfig::default(),
        HeadlessOverlay::new(),
        HeadlessRaster::new(100.0, 100.0),
        HeadlessRaster::new(100.0, 100.0),
    )
    .unwrap();
    viewer.prepare_for_new_scan();
    let saved = vec![
        RectSelection::new(0, 1.0, 1.0, 5.0, 5.0),
        RectSelection::new(0, 10.0, 10.0, 5.0, 5.0),
    ];
    viewer.selector_mut().restore_archive(saved.clone());
    assert_eq!(viewer.selector().archive().for_slice(0), saved.as_slice());
    assert_eq!(viewer.selector().canvas().visible_rects().len(), 2);
    assert!(viewer.selection_status().has_archive);
}

#[test]
fn zoom_buttons_do_nothing_until_zoom_mode() {
    let mut viewer = Viewer::new(
        ViewerConfig::default(),
        HeadlessOverlay::new(),
        HeadlessRaster::new(512.0, 512.0),
        HeadlessRaster::new(512.0, 512.0),
    )
    .unwrap();
    viewer.set_slice_image(HeadlessImage::new("scan/0"));

    assert!(!viewer.zoom_in());
    viewer.primary_pointer_down(Point::new(0.0, 0.0));
    viewer.primary_pointer_move(Point::new(40.0, 40.0));
    viewer.primary_pointer_up(Point::new(40.0, 40.0));
    assert_eq!(
        viewer.selector().selections(),
        vec![RectSelection::new(0, 0.0, 0.0, 40.0, 40.0)]
    );

    viewer.set_mode(ViewerMode::Zooming);
    assert!(viewer.zoom_in());
    viewer.primary_pointer_down(Point::new(100.0, 100.0));
    viewer.primary_pointer_up(Point::new(160.0, 160.0));
    assert_eq!(viewer.selector().selections().len(), 1);
}

#[test]
fn loaded_json_with_bad_rects_only_restores_good_ones() {
    let text = r#"{"selections":[
        {"slice_index":2,"x":0,"y":0,"width":-5,"height":10},
        {"slice_index":2,"x":4,"y":4,"width":12,"height":12},
        {"slice_index":2,"x":4,"y":4,"width":1,"height":1}
    ]}"#;
    let loaded = SelectionExport::from_json(text).unwrap();
    let mut selector = rect_selector();
    selector.restore_archive(loaded.selections);
    assert_eq!(
        selector.archive().to_vec(),
        vec![RectSelection::new(2, 4.0, 4.0, 12.0, 12.0)]
    );
}
