use cascaded_shadows::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn prepare_csm(cascades: usize, mode: SplitMode) -> (Csm, SharedCamera) {
    let mut camera = Camera::perspective(60f32.to_radians(), 16.0 / 9.0, 0.1, 2000.0);
    camera.position = Vec3::new(0.0, 25.0, 60.0);
    camera.look_at(Vec3::ZERO, Vec3::Y);
    let camera = camera.into_shared();

    let mut scene = Scene::new();
    let root = scene.create_node("root");

    let config = CsmConfig::default()
        .with_cascades(cascades)
        .with_mode(mode)
        .with_max_far(800.0);
    let csm = Csm::new(camera.clone(), scene.into_shared(), root, config);
    (csm, camera)
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("csm_update");
    for &cascades in &[1usize, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("moving_camera", cascades),
            &cascades,
            |b, &cascades| {
                let (mut csm, camera) = prepare_csm(cascades, SplitMode::Practical);
                let mut step = 0.0f32;
                b.iter(|| {
                    step += 0.25;
                    {
                        let mut camera = camera.write();
                        camera.position.x = step.sin() * 40.0;
                        camera.update_matrix();
                    }
                    csm.update();
                    black_box(csm.lights().len());
                })
            },
        );
    }
    group.finish();
}

fn bench_update_frustums(c: &mut Criterion) {
    let mut group = c.benchmark_group("csm_update_frustums");
    for (name, mode) in [
        ("uniform", SplitMode::Uniform),
        ("logarithmic", SplitMode::Logarithmic),
        ("practical", SplitMode::Practical),
    ] {
        group.bench_function(BenchmarkId::new(name, 4), |b| {
            let (mut csm, _camera) = prepare_csm(4, mode);
            b.iter(|| {
                csm.update_frustums();
                black_box(csm.breaks().len());
            })
        });
    }
    group.finish();
}

fn bench_material_sync(c: &mut Criterion) {
    c.bench_function("csm_update_uniforms_64_materials", |b| {
        let (mut csm, _camera) = prepare_csm(4, SplitMode::Practical);
        for i in 0..64 {
            let material = Material::new(format!("material_{i}")).into_shared();
            csm.setup_material(&material);
        }
        b.iter(|| {
            csm.update_uniforms();
            black_box(csm.material_count());
        })
    });
}

criterion_group!(benches, bench_update, bench_update_frustums, bench_material_sync);
criterion_main!(benches);
