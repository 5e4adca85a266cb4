//! Performance benchmarks for VICSEK

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vicsek::grid::SpatialIndex;
use vicsek::{generate_from_config, Config, RunOptions, UpdateMode};

fn config_for(population: usize) -> Config {
    let mut config = Config::default();
    config.population.count = population;
    config.population.domain_length = 100.0;
    config.population.seed = Some(42);
    config
}

fn benchmark_group_step(c: &mut Criterion) {
    let mut bench = c.benchmark_group("group_step");

    for population in [100, 500, 1000].iter() {
        for mode in [UpdateMode::Sequential, UpdateMode::Synchronous] {
            let config = config_for(*population);
            let mut group = match generate_from_config(&config) {
                Ok(group) => group,
                Err(e) => panic!("cannot generate benchmark group: {}", e),
            };
            let options = RunOptions {
                mode,
                ..config.run.options()
            };

            // Warm up
            group.run_with(10, &options);

            bench.bench_with_input(
                BenchmarkId::new(format!("{:?}", mode), population),
                population,
                |b, _| {
                    b.iter(|| {
                        group.step(&options);
                    });
                },
            );
        }
    }

    bench.finish();
}

fn benchmark_neighbor_query(c: &mut Criterion) {
    let config = config_for(1000);
    let group = match generate_from_config(&config) {
        Ok(group) => group,
        Err(e) => panic!("cannot generate benchmark group: {}", e),
    };

    c.bench_function("neighbors_brute_force", |b| {
        b.iter(|| group.neighbors(black_box(0), 10.0, true, true));
    });

    c.bench_function("spatial_index_build", |b| {
        b.iter(|| SpatialIndex::build(group.domain(), black_box(group.agents())));
    });
}

fn benchmark_order_parameter(c: &mut Criterion) {
    let config = config_for(1000);
    let group = match generate_from_config(&config) {
        Ok(group) => group,
        Err(e) => panic!("cannot generate benchmark group: {}", e),
    };

    c.bench_function("order_parameter", |b| {
        b.iter(|| black_box(group.order_parameter()));
    });
}

criterion_group!(
    benches,
    benchmark_group_step,
    benchmark_neighbor_query,
    benchmark_order_parameter,
);
criterion_main!(benches);
