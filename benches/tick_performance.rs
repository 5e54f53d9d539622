use criterion::{black_box, criterion_group, criterion_main, Criterion};
use junction_sim::{
    engine::{Engine, TickEngine},
    simulation::{
        IdmParams, PopulationRequest, SignalMap, SignalState, Topology, VehicleClass, Viewport,
    },
};

const DT: f32 = 1.0 / 60.0;

fn busy_request(topology: Topology) -> PopulationRequest {
    topology.road_labels().iter().fold(PopulationRequest::new(topology), |request, road| {
        VehicleClass::ALL
            .iter()
            .fold(request, |request, &class| request.with_vehicles(road, class, 8))
    })
}

fn benchmark_intersection_tick(c: &mut Criterion) {
    let request = busy_request(Topology::FourWay);
    let mut engine =
        Engine::build(&request, Viewport::default(), IdmParams::default(), Some(42));
    let signals = SignalMap::uniform(["North", "South"], SignalState::Green)
        .with("East", SignalState::Red)
        .with("West", SignalState::Red);

    // Let queues form before measuring
    for _ in 0..600 {
        engine.update(&signals, DT);
    }

    c.bench_function("intersection_tick", |b| {
        b.iter(|| {
            engine.update(black_box(&signals), DT);
        })
    });
}

fn benchmark_roundabout_tick(c: &mut Criterion) {
    let request = busy_request(Topology::Roundabout);
    let mut engine =
        Engine::build(&request, Viewport::default(), IdmParams::default(), Some(42));
    let signals = SignalMap::uniform(["North", "East", "Southwest"], SignalState::Green);

    for _ in 0..600 {
        engine.update(&signals, DT);
    }

    c.bench_function("roundabout_tick", |b| {
        b.iter(|| {
            engine.update(black_box(&signals), DT);
        })
    });
}

fn benchmark_population_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("population_scaling");

    for per_class in [1u32, 4, 8].iter() {
        let request = Topology::FourWay
            .road_labels()
            .iter()
            .fold(PopulationRequest::new(Topology::FourWay), |request, road| {
                request
                    .with_vehicles(road, VehicleClass::Car, *per_class)
                    .with_vehicles(road, VehicleClass::TwoWheeler, *per_class)
            });
        let mut engine =
            Engine::build(&request, Viewport::default(), IdmParams::default(), Some(42));
        let signals = SignalMap::uniform(["North", "South", "East", "West"], SignalState::Green);

        group.bench_with_input(
            format!("four_way_{}_per_class", per_class),
            per_class,
            |b, _per_class| {
                b.iter(|| {
                    engine.update(black_box(&signals), DT);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_intersection_tick,
    benchmark_roundabout_tick,
    benchmark_population_scaling
);
criterion_main!(benches);
