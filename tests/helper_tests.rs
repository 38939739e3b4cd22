use std::sync::Arc;

use cascaded_shadows::{Camera, Csm, CsmConfig, CsmHelper, Scene, Vec3};

fn setup(cascades: usize) -> Csm {
    let mut camera = Camera::perspective(45f32.to_radians(), 1.5, 0.5, 600.0);
    camera.position = Vec3::new(-20.0, 15.0, 40.0);
    camera.look_at(Vec3::new(0.0, 0.0, -50.0), Vec3::Y);

    let mut scene = Scene::new();
    let root = scene.create_node("root");

    let mut csm = Csm::new(
        camera.into_shared(),
        scene.into_shared(),
        root,
        CsmConfig::default().with_cascades(cascades).with_max_far(300.0),
    );
    csm.update();
    csm
}

#[test]
fn pool_tracks_cascade_count() {
    let mut csm = setup(3);
    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);
    assert_eq!(helper.visuals().len(), 3);

    csm.set_cascades(5);
    csm.update();
    helper.update(&csm);
    assert_eq!(helper.visuals().len(), 5);

    csm.set_cascades(2);
    csm.update();
    helper.update(&csm);
    assert_eq!(helper.visuals().len(), 2);

    let scene = csm.scene().read();
    let container = scene.node(helper.container()).unwrap();
    assert_eq!(container.children().len(), 2);
}

#[test]
fn container_follows_camera() {
    let csm = setup(2);
    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);

    let camera_world = csm.camera().read().world_matrix;
    let scene = csm.scene().read();
    let helper_world = helper.world_matrix(&scene).unwrap();
    assert!(helper_world.abs_diff_eq(camera_world, 1e-5));
}

#[test]
fn cascade_geometry_reads_far_plane() {
    let csm = setup(3);
    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);

    for (visual, frustum) in helper.visuals().iter().zip(csm.frustums()) {
        let far = frustum.vertices.far;
        assert_eq!(visual.cascade_box.min, far[2]);
        assert!(visual.cascade_box.max.z > far[0].z);
        assert_eq!(visual.cascade_box.max.x, far[0].x);
        assert_eq!(visual.plane.center, (far[0] + far[2]) * 0.5);
        assert_eq!(visual.plane.scale.x, far[0].x - far[2].x);
        assert!(visual.plane.scale.z < 1e-3);
        assert!(visual.plane.opacity < 1.0);
    }

    let main = csm.main_frustum();
    assert_eq!(&helper.frustum_line_positions()[..4], &main.vertices.far);
    assert_eq!(&helper.frustum_line_positions()[4..], &main.vertices.near);
}

#[test]
fn shadow_bounds_sit_on_their_light() {
    let csm = setup(3);
    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);

    let scene = csm.scene().read();
    for (visual, light) in helper.visuals().iter().zip(csm.lights()) {
        let group = scene.node(visual.shadow_group).unwrap();
        assert_eq!(group.parent(), Some(helper.container()));

        let light_world = scene.node(light.node()).unwrap().world_matrix;
        let group_position = group.world_position();
        let light_position = light_world.w_axis.truncate();
        assert!(group_position.distance(light_position) < 1e-2);

        let shadow_camera = &light.shadow.camera;
        assert_eq!(visual.shadow_box.min.z, -shadow_camera.far);
        assert_eq!(visual.shadow_box.max.z, -shadow_camera.near);
        assert_eq!(visual.shadow_box.max.y, shadow_camera.right);
    }
}

#[test]
fn visibility_toggles_apply() {
    let csm = setup(2);
    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);

    helper.display_planes = false;
    helper.update_visibility();
    assert!(helper.visuals().iter().all(|v| v.cascade_box_visible && !v.plane.visible));
    assert!(helper.visuals().iter().all(|v| v.shadow_box_visible));

    helper.display_frustum = false;
    helper.update_visibility();
    assert!(!helper.frustum_lines_visible());
    assert!(helper
        .visuals()
        .iter()
        .all(|v| !v.cascade_box_visible && !v.shadow_box_visible));
}

#[test]
fn dispose_frees_helper_nodes() {
    let csm = setup(3);
    let nodes_before = csm.scene().read().len();

    let mut helper = CsmHelper::new(&csm);
    helper.update(&csm);
    assert_eq!(csm.scene().read().len(), nodes_before + 4);

    let scene = Arc::clone(csm.scene());
    helper.dispose(&mut scene.write());
    assert_eq!(scene.read().len(), nodes_before);
    assert!(helper.visuals().is_empty());
}
