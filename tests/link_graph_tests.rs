//! Light-filter link graph tests
//!
//! Tests for:
//! - Filters on the same light set sharing a group
//! - Filter lists pushed to lights on update
//! - Filter removal, relinking and light recreation
//! - Missing lights: fatal in batch, a warning in interactive
//! - Lights without shaders still satisfy their filters
//! - Batch sessions linking handles that were already dropped

mod common;

use std::sync::Arc;

use common::*;
use retrace::prelude::*;
use retrace::retrace_native::NodeId;

fn light(f: &Fixture, name: &str) -> ObjectHandle {
    f.renderer
        .light(name, &SceneObject::Null, &f.attributes(&[("ai:light", light_shader("point_light"))]))
        .unwrap()
}

fn light_filter(f: &Fixture, name: &str, lights: &[&str]) -> ObjectHandle {
    f.renderer
        .light_filter(
            name,
            &SceneObject::Null,
            &f.attributes(&[
                ("filteredLights", strings(lights)),
                ("ai:lightFilter:filter", filter_shader("light_blocker")),
            ]),
        )
        .unwrap()
}

fn filters_of(f: &Fixture, light: &str) -> Vec<NodeId> {
    let node = f.node(&format!("light:{light}")).unwrap();
    node_array(f.universe(), node, "filters")
}

fn filter_node(f: &Fixture, name: &str) -> NodeId {
    f.node(&format!("lightFilter:{name}")).unwrap()
}

// ============================================================================
// Groups
// ============================================================================

#[test]
fn filters_on_the_same_lights_share_a_group() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let _b = light(&f, "B");
    let _f1 = light_filter(&f, "F1", &["A", "B"]);
    let _f2 = light_filter(&f, "F2", &["B", "A", "B"]);

    assert_eq!(f.renderer.link_graph().group_count(), 1);
    assert_eq!(f.renderer.link_graph().light_count(), 2);

    let report = f.renderer.link_graph().update();
    assert!(report.is_empty());

    let expected = vec![filter_node(&f, "F1"), filter_node(&f, "F2")];
    assert_eq!(filters_of(&f, "A"), expected);
    assert_eq!(filters_of(&f, "B"), expected);
}

#[test]
fn removing_a_filter_keeps_the_others() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let _b = light(&f, "B");
    let f1 = light_filter(&f, "F1", &["A", "B"]);
    let _f2 = light_filter(&f, "F2", &["A", "B"]);
    f.renderer.link_graph().update();

    drop(f1);
    assert!(f.node("lightFilter:F1").is_none());
    assert!(f.renderer.link_graph().update().is_empty());

    let expected = vec![filter_node(&f, "F2")];
    assert_eq!(filters_of(&f, "A"), expected);
    assert_eq!(filters_of(&f, "B"), expected);
    assert_eq!(f.renderer.link_graph().group_count(), 1);
}

#[test]
fn disjoint_light_sets_use_separate_groups() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let _b = light(&f, "B");
    let _f1 = light_filter(&f, "F1", &["A"]);
    let _f2 = light_filter(&f, "F2", &["A", "B"]);
    f.renderer.link_graph().update();

    assert_eq!(f.renderer.link_graph().group_count(), 2);
    let mut on_a = filters_of(&f, "A");
    on_a.sort();
    let mut expected = vec![filter_node(&f, "F1"), filter_node(&f, "F2")];
    expected.sort();
    assert_eq!(on_a, expected);
    assert_eq!(filters_of(&f, "B"), vec![filter_node(&f, "F2")]);
}

// ============================================================================
// Edits
// ============================================================================

#[test]
fn relinking_a_filter_moves_it() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let _b = light(&f, "B");
    let mut f1 = light_filter(&f, "F1", &["A"]);
    f.renderer.link_graph().update();
    assert_eq!(filters_of(&f, "A"), vec![filter_node(&f, "F1")]);

    let relinked = f.attributes(&[
        ("filteredLights", strings(&["B"])),
        ("ai:lightFilter:filter", filter_shader("light_blocker")),
    ]);
    assert!(f1.set_attributes(&relinked));
    f.renderer.link_graph().update();

    assert!(filters_of(&f, "A").is_empty());
    assert_eq!(filters_of(&f, "B"), vec![filter_node(&f, "F1")]);
}

#[test]
fn recreated_light_picks_filters_back_up() {
    let f = Fixture::new(RenderType::Interactive);
    let a = light(&f, "A");
    let _f1 = light_filter(&f, "F1", &["A"]);
    f.renderer.link_graph().update();

    drop(a);
    assert!(f.node("light:A").is_none());
    // The filter still names "A", so the light is reported until it returns.
    let report = f.renderer.link_graph().update();
    assert!(report.is_empty());
    assert_eq!(f.renderer.link_graph().update().missing_lights, vec!["A".to_string()]);

    let _a = light(&f, "A");
    assert!(f.renderer.link_graph().update().is_empty());
    assert_eq!(filters_of(&f, "A"), vec![filter_node(&f, "F1")]);
}

#[test]
fn assigned_filters_follow_linked_ones() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = f
        .renderer
        .light(
            "A",
            &SceneObject::Null,
            &f.attributes(&[
                ("ai:light", light_shader("spot_light")),
                ("ai:lightFilter:barndoor", filter_shader("barndoor")),
            ]),
        )
        .unwrap();
    let _f1 = light_filter(&f, "F1", &["A"]);
    f.renderer.link_graph().update();

    let universe = f.universe();
    let filters = filters_of(&f, "A");
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0], filter_node(&f, "F1"));
    assert!(universe.is(filters[1], "barndoor"));
}

#[test]
fn filter_transform_drives_geometry_matrix() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let mut f1 = light_filter(&f, "F1", &["A"]);
    f1.transform(translate(2.0));

    let universe = f.universe();
    let node = filter_node(&f, "F1");
    assert_eq!(
        universe.get(node, "geometry_matrix").and_then(|m| m.as_matrix()),
        Some(translate(2.0))
    );
}

#[test]
fn filters_without_lights_are_not_linked() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    let _f1 = f
        .renderer
        .light_filter(
            "F1",
            &SceneObject::Null,
            &f.attributes(&[("ai:lightFilter:filter", filter_shader("gobo"))]),
        )
        .unwrap();
    f.renderer.link_graph().update();

    assert!(f.node("lightFilter:F1").is_none());
    assert!(filters_of(&f, "A").is_empty());
    assert_eq!(f.renderer.link_graph().group_count(), 0);
}

// ============================================================================
// Missing lights
// ============================================================================

#[test]
fn missing_light_fails_batch_render() {
    let f = Fixture::new(RenderType::Batch);
    drop(light_filter(&f, "F1", &["ghost"]));

    match f.renderer.render() {
        Err(RetraceError::MissingLight(name)) => assert_eq!(name, "ghost"),
        other => panic!("expected a missing light error, got {other:?}"),
    }
    assert_eq!(f.engine.passes(), 0);
}

#[test]
fn missing_light_only_warns_in_interactive_render() {
    let f = Fixture::new(RenderType::Interactive);
    let _f1 = light_filter(&f, "F1", &["ghost"]);

    f.renderer.render().unwrap();
    f.renderer.pause();
}

#[test]
fn mesh_light_without_geometry_is_not_missing() {
    let f = Fixture::new(RenderType::Batch);
    drop(
        f.renderer
            .light("/lamp", &SceneObject::Null, &f.attributes(&[("ai:light", light_shader("mesh_light"))]))
            .unwrap(),
    );
    drop(light_filter(&f, "/blocker", &["/lamp"]));

    f.renderer.render().unwrap();

    assert!(f.node("light:/lamp").is_none());
    assert!(f.universe().nodes_of_type("mesh_light").is_empty());
}

#[test]
fn light_without_shader_is_not_missing() {
    let f = Fixture::new(RenderType::Batch);
    let _lamp = f.renderer.light("/lamp", &SceneObject::Null, &f.attributes(&[])).unwrap();
    let _blocker = light_filter(&f, "/blocker", &["/lamp"]);

    assert!(f.renderer.link_graph().update().is_empty());
}

// ============================================================================
// Batch retention
// ============================================================================

#[test]
fn batch_links_dropped_handles() {
    let f = Fixture::new(RenderType::Batch);
    drop(light(&f, "A"));
    drop(light_filter(&f, "F1", &["A"]));

    f.renderer.render().unwrap();

    assert_eq!(filters_of(&f, "A"), vec![filter_node(&f, "F1")]);
}

#[test]
fn interactive_graph_does_not_keep_dropped_filters() {
    let f = Fixture::new(RenderType::Interactive);
    let _a = light(&f, "A");
    drop(light_filter(&f, "F1", &["A"]));

    assert!(f.renderer.link_graph().update().is_empty());
    assert!(filters_of(&f, "A").is_empty());
}

#[test]
fn unrendered_batch_renderer_releases_the_universe() {
    let f = Fixture::new(RenderType::Batch);
    drop(light(&f, "A"));
    drop(light_filter(&f, "F1", &["A"]));
    let universe = Arc::downgrade(f.universe());

    drop(f);

    assert_eq!(universe.strong_count(), 0);
}
