use cascaded_shadows::*;

fn main() {
    let mut camera = Camera::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0);
    camera.position = Vec3::new(0.0, 20.0, 50.0);
    camera.look_at(Vec3::ZERO, Vec3::Y);
    let camera = camera.into_shared();

    let mut scene = Scene::new();
    let root = scene.create_node("root");
    let scene = scene.into_shared();

    let config = CsmConfig::default()
        .with_cascades(4)
        .with_max_far(400.0)
        .with_fade(true);
    let mut csm = Csm::new(camera.clone(), scene.clone(), root, config);

    let ground = Material::new("ground").into_shared();
    csm.setup_material(&ground);

    let mut helper = CsmHelper::new(&csm);

    for frame in 0..3 {
        {
            let mut camera = camera.write();
            camera.position.x = frame as f32 * 15.0;
            camera.update_matrix();
        }
        csm.update();
        helper.update(&csm);

        println!("frame {frame}");
        for i in 0..csm.cascades() {
            if let Some(position) = csm.light_position(i) {
                let window = csm.lights()[i].shadow.camera.width();
                println!("  cascade {i}: light at {position:?}, window {window:.2}");
            }
        }
    }

    let mut breaks = Vec::new();
    csm.get_extended_breaks(&mut breaks);
    println!("breaks: {:?}", csm.breaks());
    println!("extended breaks: {breaks:?}");

    let material = ground.read();
    println!(
        "ground defines: {:?}, cascades uniform: {:?}",
        material.defines,
        material.uniform("CSM_cascades")
    );
    drop(material);

    helper.dispose(&mut scene.write());
    csm.dispose();
    csm.remove();
}
