//! Integration tests: filter changes driving canvas rebuilds.

use pretty_assertions::assert_eq;
use sc_core::catalog::Catalog;
use sc_core::config::CanvasConfig;
use sc_core::filter::FilterState;
use sc_core::id::EntityId;
use sc_core::model::Point;
use sc_editor::CanvasEditor;
use sc_editor::history::ActionKind;
use sc_editor::tagging::RecordingTagService;

fn id(s: &str) -> EntityId {
    EntityId::intern(s)
}

fn make_editor() -> CanvasEditor {
    let catalog = Catalog::from_json(include_str!("fixtures/library.json")).unwrap();
    CanvasEditor::new(CanvasConfig::default(), catalog)
}

fn entities(editor: &CanvasEditor) -> Vec<EntityId> {
    let mut out: Vec<EntityId> = editor.state().placements().iter().map(|p| p.entity).collect();
    out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out
}

#[test]
fn bootstrap_show_all_lays_out_every_song_without_history() {
    let mut editor = make_editor();
    let out = editor.bootstrap(FilterState::show_all());
    assert_eq!(out.created, 5);
    assert!(!out.recorded);
    assert_eq!((out.columns, out.rows), (5, 1));
    assert!(!editor.history().can_undo());

    // Title order: Atlantic City, Blue, Case of You, Harvest Moon, Pink Moon.
    let position = |song: &str| {
        editor
            .state()
            .placements_of(id(song))
            .next()
            .map(|p| p.position)
    };
    assert_eq!(position("fx-song-4"), Some(Point::new(24.0, 24.0)));
    assert_eq!(position("fx-song-2"), Some(Point::new(260.0, 24.0)));
    assert_eq!(position("fx-song-5"), Some(Point::new(496.0, 24.0)));
    assert_eq!(position("fx-song-1"), Some(Point::new(732.0, 24.0)));
    assert_eq!(position("fx-song-3"), Some(Point::new(968.0, 24.0)));
}

#[test]
fn bootstrap_without_show_all_is_empty() {
    let mut editor = make_editor();
    let out = editor.bootstrap(FilterState::default());
    assert_eq!(out.created, 0);
    assert!(editor.state().is_empty());
}

#[test]
fn active_tags_intersect() {
    let mut editor = make_editor();
    editor.bootstrap(FilterState::show_all());

    let out = editor
        .set_filter(FilterState::tags(&["fx-tag-a"]))
        .unwrap();
    assert_eq!(out.created, 2);
    assert_eq!(entities(&editor), vec![id("fx-song-1"), id("fx-song-2")]);

    editor
        .set_filter(FilterState::tags(&["fx-tag-a", "fx-tag-b"]))
        .unwrap();
    assert_eq!(entities(&editor), vec![id("fx-song-2")]);

    editor
        .set_filter(FilterState::tags(&["fx-tag-a", "fx-tag-c"]))
        .unwrap();
    assert!(editor.state().is_empty());
}

#[test]
fn composite_tag_filters_like_its_components() {
    let mut plain = make_editor();
    plain.bootstrap(FilterState::tags(&["fx-tag-a", "fx-tag-b"]));

    let mut composite = make_editor();
    composite.bootstrap(FilterState::tags(&["fx-tag-ab"]));

    assert_eq!(entities(&plain), entities(&composite));
    assert_eq!(entities(&composite), vec![id("fx-song-2")]);
}

#[test]
fn unknown_tag_yields_empty_canvas() {
    let mut editor = make_editor();
    editor.bootstrap(FilterState::tags(&["fx-tag-missing"]));
    assert!(editor.state().is_empty());
}

#[test]
fn rebuild_clears_selection_and_is_undoable() {
    let mut editor = make_editor();
    let mut service = RecordingTagService::new();
    editor.bootstrap(FilterState::show_all());
    editor.handle_shortcut(sc_editor::shortcuts::ShortcutAction::SelectAll, &mut service);
    let before = editor.state().snapshot();

    let out = editor
        .set_filter(FilterState::tags(&["fx-tag-b"]))
        .unwrap();
    assert!(out.recorded);
    assert!(out.cleared_selection);
    assert!(editor.state().selection().is_empty());

    let step = editor.undo(&mut service).unwrap();
    assert_eq!(step.kind, ActionKind::Rebuild);
    assert_eq!(editor.state().snapshot(), before);
}

#[test]
fn same_filter_twice_does_not_rebuild() {
    let mut editor = make_editor();
    editor.bootstrap(FilterState::tags(&["fx-tag-a"]));
    assert!(editor.set_filter(FilterState::tags(&["fx-tag-a"])).is_none());
    assert!(!editor.history().can_undo());
}

#[test]
fn applied_labels_feed_the_next_rebuild() {
    let mut editor = make_editor();
    let mut service = RecordingTagService::new();
    editor.bootstrap(FilterState::show_all());

    editor.apply_label(id("fx-tag-c"), &[id("fx-song-4"), id("fx-song-5")], &mut service);
    editor
        .set_filter(FilterState::tags(&["fx-tag-c"]))
        .unwrap();
    assert_eq!(entities(&editor), vec![id("fx-song-4"), id("fx-song-5")]);
}

#[test]
fn deleted_entity_drops_out_of_the_canvas() {
    let mut editor = make_editor();
    editor.bootstrap(FilterState::show_all());
    assert!(editor.entity_deleted(id("fx-song-2")));
    assert_eq!(editor.state().len(), 4);

    editor.set_filter(FilterState::tags(&["fx-tag-a"])).unwrap();
    assert_eq!(entities(&editor), vec![id("fx-song-1")]);
}

#[test]
fn narrow_container_wraps_rows() {
    let mut editor = make_editor();
    // Two 220-wide columns fit: (540 - 48 + 16) / 236 = 2.15.
    editor.set_container_width(540.0);
    let out = editor.bootstrap(FilterState::show_all());
    assert_eq!((out.columns, out.rows), (2, 3));
    let third = editor.state().placements_of(id("fx-song-5")).next().unwrap();
    assert_eq!(third.position, Point::new(24.0, 104.0));
}
