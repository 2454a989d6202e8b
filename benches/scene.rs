use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use urb_scene::procgen::city_graph::{generate_city_graph, CityGraphConfig};
use urb_scene::procgen::layout::{derive_buildings, derive_roads, BuildingStyle, RoadStyle};
use urb_scene::simulation::beams::{BeamConfig, BeamSet};
use urb_scene::simulation::vehicles::{VehicleConfig, VehiclePool};

fn graph_generation(c: &mut Criterion) {
    let config = CityGraphConfig::default();
    c.bench_function("generate_city_graph (80 nodes)", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(1);
            black_box(generate_city_graph(&config, &mut rng))
        })
    });

    let mut rng = StdRng::seed_from_u64(1);
    let graph = generate_city_graph(&config, &mut rng);
    c.bench_function("derive layout", |b| {
        b.iter(|| {
            black_box(derive_roads(&graph, &RoadStyle::default()));
            black_box(derive_buildings(&graph, &BuildingStyle::default()));
        })
    });
}

fn frame_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let graph = generate_city_graph(&CityGraphConfig::default(), &mut rng);
    let mut pool = VehiclePool::spawn(
        &graph,
        &VehicleConfig {
            pool_size: 500,
            ..Default::default()
        },
        &mut rng,
    );
    let mut beams = BeamSet::new(BeamConfig::default());
    let mut now = 0.0;

    c.bench_function("vehicles + beams frame (500 agents)", |b| {
        b.iter(|| {
            now += 1.0 / 60.0;
            pool.advance(&graph, 1.0 / 60.0, &mut rng);
            beams.update(now, &pool, &mut rng);
            black_box(beams.visible_len())
        })
    });
}

criterion_group!(benches, graph_generation, frame_update);
criterion_main!(benches);
