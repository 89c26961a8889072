//! Renderer façade tests
//!
//! Tests for:
//! - Options: native parameters, declarations, user data, shaders, logging
//! - Outputs: driver and filter nodes, data mapping, headers
//! - Batch dispatch: camera overrides, status mapping
//! - Camera setup: default camera, render region, shutter, uv camera meshes
//! - Deformation and transform motion blur
//! - Mesh lights
//! - Procedural expansion
//! - Scene description export

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::*;
use retrace::prelude::*;
use retrace::retrace_core::ContentHasher;
use retrace::retrace_core::glam::{IVec2, Vec2};
use retrace::retrace_native::LogFlags;

fn beauty() -> Output {
    Output::new("beauty.exr", "exr", "rgba")
}

fn options(f: &Fixture) -> retrace::retrace_native::NodeId {
    f.universe().options()
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn native_options_are_set_and_reset() {
    let f = Fixture::new(RenderType::Batch);
    let universe = f.universe();

    f.renderer.option("ai:GI_diffuse_depth", Some(&4_i32.into()));
    assert_eq!(universe.get_int(options(&f), "GI_diffuse_depth"), 4);

    f.renderer.option("ai:GI_diffuse_depth", None);
    assert_eq!(universe.get(options(&f), "GI_diffuse_depth"), None);
}

#[test]
fn declared_and_user_options_are_stored() {
    let f = Fixture::new(RenderType::Batch);
    let universe = f.universe();

    f.renderer.option("ai:declare:shot", Some(&"sh010".into()));
    f.renderer.option("user:take", Some(&7_i32.into()));
    assert_eq!(universe.get_str(options(&f), "shot"), "sh010");
    assert_eq!(universe.get_int(options(&f), "user:take"), 7);

    // Declaring over a native option is refused.
    f.renderer.option("ai:declare:AA_samples", Some(&9_i32.into()));
    assert_eq!(universe.get_int(options(&f), "AA_samples"), 1);

    f.renderer.option("user:take", None);
    assert_eq!(universe.get(options(&f), "user:take"), None);
}

#[test]
fn unknown_options_change_nothing() {
    let f = Fixture::new(RenderType::Batch);
    let before = f.universe().param_names(options(&f));

    f.renderer.option("ai:notAnOption", Some(&1_i32.into()));
    f.renderer.option("gl:primitive:solid", Some(&true.into()));
    f.renderer.option("resolution", Some(&Vec2::new(1.0, 1.0).into()));

    assert_eq!(f.universe().param_names(options(&f)), before);
}

#[test]
fn shader_options_connect_roots() {
    let f = Fixture::new(RenderType::Batch);
    let universe = f.universe();
    let fog = ShaderNetwork::single("fog", Shader::new("atmosphere_volume", "ai:shader"));
    let aov = ShaderNetwork::single("write", Shader::new("aov_write_rgb", "ai:shader"));

    f.renderer.option("ai:atmosphere", Some(&fog.into()));
    f.renderer.option("ai:aov_shader:albedo", Some(&aov.into()));

    let atmosphere = universe.get_node(options(&f), "atmosphere").unwrap();
    assert!(universe.is(atmosphere, "atmosphere_volume"));
    let aovs = node_array(universe, options(&f), "aov_shaders");
    assert_eq!(aovs.len(), 1);
    assert!(universe.is(aovs[0], "aov_write_rgb"));

    f.renderer.option("ai:atmosphere", None);
    f.renderer.option("ai:aov_shader:albedo", None);
    assert_eq!(universe.get(options(&f), "atmosphere"), None);
    assert!(node_array(universe, options(&f), "aov_shaders").is_empty());
}

#[test]
fn log_options_update_message_settings() {
    let f = Fixture::new(RenderType::Batch);
    let universe = f.universe();

    f.renderer.option("ai:log:max_warnings", Some(&5_i32.into()));
    f.renderer.option("ai:log:warnings", Some(&false.into()));
    f.renderer.option("ai:console:debug", Some(&true.into()));

    let messages = universe.messages();
    assert_eq!(messages.max_warnings, 5);
    assert!(!messages.log_flags.contains(LogFlags::WARNINGS));
    assert!(messages.console_flags.contains(LogFlags::DEBUG));

    f.renderer.option("ai:log:warnings", None);
    f.renderer.option("ai:log:max_warnings", None);
    let messages = universe.messages();
    assert_eq!(
        messages.log_flags.contains(LogFlags::WARNINGS),
        LogFlags::LOG_DEFAULT.contains(LogFlags::WARNINGS)
    );
    assert_eq!(messages.max_warnings, 100);
}

#[test]
fn seed_defaults_to_frame() -> anyhow::Result<()> {
    let f = Fixture::new(RenderType::Batch);
    f.renderer.option("frame", Some(&12_i32.into()));
    f.renderer.render()?;
    assert_eq!(f.universe().get_int(options(&f), "AA_seed"), 12);

    f.renderer.option("ai:AA_seed", Some(&3_i32.into()));
    f.renderer.render()?;
    assert_eq!(f.universe().get_int(options(&f), "AA_seed"), 3);
    Ok(())
}

// ============================================================================
// Outputs
// ============================================================================

#[test]
fn output_creates_driver_and_filter() {
    let f = Fixture::new(RenderType::Batch);
    let universe = f.universe();
    f.renderer.output(
        "beauty",
        Some(
            &beauty()
                .with_parameter("filter", "box")
                .with_parameter("filterwidth", Vec2::new(2.0, 2.0))
                .with_parameter("half_precision", true)
                .with_parameter("header:artist", "jane")
                .with_parameter("header:take", 3_i32),
        ),
    );

    let driver = f.node("display:beauty").unwrap();
    assert!(universe.is(driver, "driver_exr"));
    assert_eq!(universe.get_str(driver, "filename"), "beauty.exr");
    assert!(universe.get_bool(driver, "half_precision"));
    assert_eq!(
        string_array(universe, driver, "custom_attributes"),
        vec!["string 'artist' jane", "int 'take' 3"]
    );

    let filter = f.node("filter:beauty").unwrap();
    assert!(universe.is(filter, "box_filter"));
    assert!((universe.get_float(filter, "width") - 2.0).abs() < f32::EPSILON);
}

#[test]
fn output_data_is_mapped() {
    let f = Fixture::new(RenderType::Batch);
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.output(
        "diffuse",
        Some(&Output::new("diffuse.exr", "exr", "color diffuse").with_parameter("includeAlpha", true)),
    );
    f.renderer.output(
        "specular",
        Some(&Output::new("specular.exr", "exr", "lpe C<RS>L")),
    );
    f.renderer.render().unwrap();

    assert_eq!(
        f.engine.outputs.lock()[0],
        vec![
            "RGBA RGBA filter:beauty display:beauty",
            "diffuse RGBA filter:diffuse display:diffuse",
            "lpe:specular RGB filter:specular display:specular",
        ]
    );
    assert_eq!(
        string_array(f.universe(), options(&f), "light_path_expressions"),
        vec!["lpe:specular C<RS>L"]
    );
}

#[test]
fn outputs_can_be_removed() {
    let f = Fixture::new(RenderType::Batch);
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.output("beauty", None);

    f.renderer.render().unwrap();
    assert_eq!(f.engine.passes(), 0);
}

#[test]
fn unknown_filter_rejects_output() {
    let f = Fixture::new(RenderType::Batch);
    f.renderer.output("beauty", Some(&beauty().with_parameter("filter", "sinc")));

    assert!(f.node("filter:beauty").is_none());
    f.renderer.render().unwrap();
    assert_eq!(f.engine.passes(), 0);
}

// ============================================================================
// Batch Dispatch
// ============================================================================

#[test]
fn batch_renders_once_per_output_camera() -> anyhow::Result<()> {
    let f = Fixture::new(RenderType::Batch);
    let attributes = f.attributes(&[]);
    let _main = f.renderer.camera("/main", &Camera::default(), &attributes).unwrap();
    let _witness = f.renderer.camera("/witness", &Camera::default(), &attributes).unwrap();
    f.renderer.option("camera", Some(&"/main".into()));

    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.output(
        "witness",
        Some(&Output::new("witness.exr", "exr", "rgba").with_parameter("camera", "/witness")),
    );
    f.renderer.render()?;

    assert_eq!(
        *f.engine.cameras.lock(),
        vec![Some("/main".to_string()), Some("/witness".to_string())]
    );
    let outputs = f.engine.outputs.lock();
    assert_eq!(outputs[0], vec!["RGBA RGBA filter:beauty display:beauty"]);
    assert_eq!(outputs[1], vec!["RGBA RGBA filter:witness display:witness"]);
    Ok(())
}

#[test]
fn missing_camera_uses_default_camera() {
    let f = Fixture::new(RenderType::Batch);
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.render().unwrap();

    assert_eq!(
        *f.engine.cameras.lock(),
        vec![Some("retrace:defaultCamera".to_string())]
    );
    let universe = f.universe();
    assert_eq!(universe.get_int(options(&f), "xres"), 640);
    assert_eq!(universe.get_int(options(&f), "yres"), 480);
}

#[test]
fn engine_status_maps_to_errors() {
    let cases = [
        (RenderStatus::Abort, "RenderAborted"),
        (RenderStatus::NoCamera, "NoCamera"),
        (RenderStatus::BadRenderRegion, "InvalidRenderRegion"),
        (RenderStatus::NoOutputs, "NoOutputs"),
        (RenderStatus::Error, "Native"),
    ];
    for (status, expected) in cases {
        let f = Fixture::with_engine(
            RendererSettings::new(RenderType::Batch),
            MockEngine::with_statuses(vec![status]),
        );
        f.renderer.output("beauty", Some(&beauty()));
        let error = f.renderer.render().unwrap_err();
        assert!(
            format!("{error:?}").starts_with(expected),
            "{status:?} mapped to {error:?}"
        );
    }
}

// ============================================================================
// Cameras
// ============================================================================

#[test]
fn render_region_is_flipped_for_options() {
    let f = Fixture::new(RenderType::Batch);
    let camera = Camera {
        resolution: IVec2::new(100, 50),
        render_region: Some([IVec2::new(10, 5), IVec2::new(60, 45)]),
        ..Camera::default()
    };
    let _camera = f.renderer.camera("/cam", &camera, &f.attributes(&[])).unwrap();
    f.renderer.option("camera", Some(&"/cam".into()));
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.render().unwrap();

    let universe = f.universe();
    let o = options(&f);
    assert_eq!(universe.get_int(o, "xres"), 100);
    assert_eq!(universe.get_int(o, "yres"), 50);
    assert_eq!(universe.get_int(o, "region_min_x"), 10);
    assert_eq!(universe.get_int(o, "region_max_x"), 59);
    assert_eq!(universe.get_int(o, "region_min_y"), 5);
    assert_eq!(universe.get_int(o, "region_max_y"), 44);
}

#[test]
fn empty_render_region_renders_a_single_pixel() {
    let f = Fixture::new(RenderType::Batch);
    let camera = Camera {
        resolution: IVec2::new(100, 50),
        render_region: Some([IVec2::new(10, 10), IVec2::new(10, 20)]),
        ..Camera::default()
    };
    let _camera = f.renderer.camera("/cam", &camera, &f.attributes(&[])).unwrap();
    f.renderer.option("camera", Some(&"/cam".into()));
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.render().unwrap();

    let universe = f.universe();
    let o = options(&f);
    assert_eq!(universe.get_int(o, "region_min_x"), 0);
    assert_eq!(universe.get_int(o, "region_max_x"), 0);
    assert_eq!(universe.get_int(o, "region_min_y"), 49);
    assert_eq!(universe.get_int(o, "region_max_y"), 49);
}

#[test]
fn shutter_collapses_without_motion_sampling() {
    let f = Fixture::new(RenderType::Batch);
    let camera = Camera {
        shutter: Vec2::new(-0.25, 0.25),
        ..Camera::default()
    };
    let _camera = f.renderer.camera("/cam", &camera, &f.attributes(&[])).unwrap();
    f.renderer.option("camera", Some(&"/cam".into()));
    f.renderer.option("sampleMotion", Some(&false.into()));
    f.renderer.output("beauty", Some(&beauty()));
    f.renderer.render().unwrap();

    let universe = f.universe();
    let node = f.node("/cam").unwrap();
    assert!((universe.get_float(node, "shutter_start") + 0.25).abs() < f32::EPSILON);
    assert!((universe.get_float(node, "shutter_end") + 0.25).abs() < f32::EPSILON);
}

fn uv_camera(mesh: &str) -> Camera {
    let mut camera = Camera::default();
    camera.parameters.insert("mesh".to_string(), mesh.into());
    camera
}

#[test]
fn uv_camera_binds_instanced_mesh() {
    let f = Fixture::new(RenderType::Batch);
    let attributes = f.attributes(&[]);
    let mut plane = f.renderer.object("/plane", &mesh(), &attributes).unwrap();
    plane.transform(translate(3.0));
    let _camera = f.renderer.camera("/cam", &uv_camera("/plane"), &attributes).unwrap();
    f.renderer.render().unwrap();

    let universe = f.universe();
    let camera = f.node("/cam").unwrap();
    assert!(universe.is(camera, "uv_camera"));
    let master = universe.get_node(f.node("/plane").unwrap(), "node").unwrap();
    assert_eq!(universe.get_node(camera, "mesh"), Some(master));
    assert_eq!(
        universe.get(camera, "matrix").and_then(|m| m.as_matrix()),
        Some(translate(3.0))
    );
}

#[test]
fn uv_camera_without_mesh_fails() {
    let f = Fixture::new(RenderType::Batch);
    let _camera = f
        .renderer
        .camera("/cam", &uv_camera("/missing"), &f.attributes(&[]))
        .unwrap();

    match f.renderer.render() {
        Err(RetraceError::MissingCameraMesh { camera, mesh }) => {
            assert_eq!(camera, "/cam");
            assert_eq!(mesh, "/missing");
        }
        other => panic!("expected a missing mesh error, got {other:?}"),
    }
}

// ============================================================================
// Motion
// ============================================================================

#[test]
fn deforming_objects_share_a_motion_master() {
    let f = Fixture::new(RenderType::Batch);
    let attributes = f.attributes(&[]);
    let samples = [sphere(1.0), sphere(1.5)];

    let _a = f
        .renderer
        .object_samples("/a", &samples, &[-0.25, 0.25], &attributes)
        .unwrap();
    let _b = f
        .renderer
        .object_samples("/b", &samples, &[-0.25, 0.25], &attributes)
        .unwrap();

    let universe = f.universe();
    assert_eq!(f.objects.count(), 1);
    let master = universe.get_node(f.node("/a").unwrap(), "node").unwrap();
    assert_eq!(universe.get_node(f.node("/b").unwrap(), "node"), Some(master));
    assert_eq!(universe.get_float(master, "motion_start"), -0.25);
    assert_eq!(universe.get_float(master, "motion_end"), 0.25);
}

#[test]
fn uneven_sample_times_are_not_converted() {
    let f = Fixture::new(RenderType::Batch);
    let samples = [sphere(1.0), sphere(1.5), sphere(2.0)];

    let _a = f
        .renderer
        .object_samples("/a", &samples, &[0.0, 0.1, 1.0], &f.attributes(&[]))
        .unwrap();

    assert_eq!(f.objects.count(), 0);
    assert!(f.node("/a").is_none());
}

#[test]
fn transform_samples_set_the_motion_range() {
    let f = Fixture::new(RenderType::Batch);
    let mut object = f.renderer.object("/a", &sphere(1.0), &f.attributes(&[])).unwrap();
    object.transform_samples(&[translate(0.0), translate(1.0)], &[0.0, 1.0]);

    let universe = f.universe();
    let node = f.node("/a").unwrap();
    let matrices: Vec<_> = universe
        .get(node, "matrix")
        .and_then(|m| m.as_array().map(|a| a.iter().filter_map(|v| v.as_matrix()).collect()))
        .unwrap_or_default();
    assert_eq!(matrices, vec![translate(0.0), translate(1.0)]);
    assert_eq!(universe.get_float(node, "motion_start"), 0.0);
    assert_eq!(universe.get_float(node, "motion_end"), 1.0);
}

// ============================================================================
// Mesh Lights
// ============================================================================

#[test]
fn mesh_light_emits_from_its_geometry() {
    let f = Fixture::new(RenderType::Batch);
    let _lamp = f
        .renderer
        .light("/lamp", &mesh(), &f.attributes(&[("ai:light", light_shader("mesh_light"))]))
        .unwrap();

    let universe = f.universe();
    let light = f.node("light:/lamp").unwrap();
    assert!(universe.is(light, "mesh_light"));
    assert_eq!(universe.get_node(light, "mesh"), f.node("/lamp"));
}

#[test]
fn mesh_light_without_geometry_has_no_shader() {
    let f = Fixture::new(RenderType::Interactive);
    let lamp = f
        .renderer
        .light("/lamp", &SceneObject::Null, &f.attributes(&[("ai:light", light_shader("mesh_light"))]))
        .unwrap();

    assert!(f.node("light:/lamp").is_none());
    assert!(f.universe().nodes_of_type("mesh_light").is_empty());
    drop(lamp);
}

// ============================================================================
// Procedurals
// ============================================================================

struct Ring {
    count: usize,
}

impl Procedural for Ring {
    fn render(&self, renderer: &dyn SceneRenderer) {
        let attributes = renderer.attributes(&attribute_map(&[]));
        for i in 0..self.count {
            let mut object = renderer
                .object(&format!("ring{i}"), &sphere(1.0), &attributes)
                .unwrap();
            object.transform(translate(i as f32));
        }

        let light_attributes = renderer.attributes(&attribute_map(&[(
            "ai:light",
            light_shader("point_light"),
        )]));
        renderer.light("ringLight", &SceneObject::Null, &light_attributes);
        let filter_attributes = renderer.attributes(&attribute_map(&[
            ("filteredLights", strings(&["ringLight"])),
            ("ai:lightFilter:filter", filter_shader("light_blocker")),
        ]));
        renderer.light_filter("ringBlocker", &SceneObject::Null, &filter_attributes);

        // Globals belong to the outer session.
        renderer.option("ai:AA_samples", Some(&9_i32.into()));
    }

    fn hash_content(&self, hasher: &mut ContentHasher) {
        hasher.write_str("Ring");
        hasher.write_u64(self.count as u64);
    }
}

#[test]
fn procedural_lists_its_nodes() {
    let f = Fixture::new(RenderType::Batch);
    let ring = SceneObject::Procedural(Arc::new(Ring { count: 2 }));
    let _ring = f.renderer.object("/ring", &ring, &f.attributes(&[])).unwrap();

    let universe = f.universe();
    let master = universe.nodes_of_type("procedural")[0];
    assert_eq!(universe.get_node(f.node("/ring").unwrap(), "node"), Some(master));

    let nodes = node_array(universe, master, "nodes");
    for name in ["ring0", "ring1", "light:ringLight", "lightFilter:ringBlocker"] {
        let node = f.node(name).unwrap();
        assert!(nodes.contains(&node), "{name} missing from procedural nodes");
        assert_eq!(universe.parent(node), Some(master));
    }
    let sphere = universe.nodes_of_type("sphere")[0];
    assert!(nodes.contains(&sphere));
    for node in &nodes {
        assert_eq!(universe.parent(*node), Some(master));
    }

    assert_eq!(universe.get_int(options(&f), "AA_samples"), 1);
}

#[test]
fn procedural_links_its_own_lights() {
    let f = Fixture::new(RenderType::Batch);
    let ring = SceneObject::Procedural(Arc::new(Ring { count: 1 }));
    let _ring = f.renderer.object("/ring", &ring, &f.attributes(&[])).unwrap();

    let universe = f.universe();
    let light = f.node("light:ringLight").unwrap();
    assert_eq!(
        node_array(universe, light, "filters"),
        vec![f.node("lightFilter:ringBlocker").unwrap()]
    );
}

#[test]
fn identical_procedurals_expand_once() {
    let f = Fixture::new(RenderType::Batch);
    let attributes = f.attributes(&[]);
    let _a = f
        .renderer
        .object("/a", &SceneObject::Procedural(Arc::new(Ring { count: 3 })), &attributes)
        .unwrap();
    let _b = f
        .renderer
        .object("/b", &SceneObject::Procedural(Arc::new(Ring { count: 3 })), &attributes)
        .unwrap();

    assert_eq!(f.universe().nodes_of_type("procedural").len(), 1);
    assert_eq!(f.universe().nodes_of_type("ginstance").len(), 2 + 3);
}

#[test]
fn old_native_versions_do_not_instance_procedurals() {
    let mut settings = RendererSettings::new(RenderType::Interactive);
    settings.native_version = NativeVersion::new(5, 0, 1, 3);
    let f = Fixture::with_engine(settings, MockEngine::default());
    let ring = SceneObject::Procedural(Arc::new(Ring { count: 1 }));
    let _ring = f.renderer.object("/ring", &ring, &f.attributes(&[])).unwrap();

    let universe = f.universe();
    let node = f.node("/ring").unwrap();
    assert!(universe.is(node, "procedural"));
    assert!(f.renderer.instance_cache().is_empty());
}

// ============================================================================
// Scene Description
// ============================================================================

#[test]
fn scene_description_writes_the_scene() -> anyhow::Result<()> {
    let mut settings = RendererSettings::new(RenderType::SceneDescription);
    settings.file_name = PathBuf::from("shots/sh010.ass");
    let f = Fixture::with_engine(settings, MockEngine::default());
    f.renderer.output("beauty", Some(&beauty()));

    f.renderer.render()?;

    assert_eq!(*f.engine.written.lock(), vec![PathBuf::from("shots/sh010.ass")]);
    assert_eq!(f.engine.passes(), 0);
    assert_eq!(
        string_array(f.universe(), options(&f), "outputs"),
        vec!["RGBA RGBA filter:beauty display:beauty"]
    );
    Ok(())
}
