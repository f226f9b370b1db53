//! Benchmarks for toolpath compilation.
//!
//! Compiles MZI chips of increasing size with dense and native-arc output.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use femtowrite_compiler::{CompilerParameters, PgmCompiler};
use femtowrite_designer::{Device, Waveguide, WaveguideParameters};

fn mzi_chip(n: usize) -> Device {
    let params = WaveguideParameters::default();
    let mut device = Device::new("bench");
    for i in 0..n {
        let mut wg = Waveguide::with_id(format!("wg{}", i), params.clone());
        let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
        let y = 1.0 + i as f64 * params.pitch;
        wg.start([-2.0, y, params.depth])
            .and_then(|wg| wg.linear([5.0, 0.0, 0.0]))
            .and_then(|wg| wg.arc_mzi(sign * params.dy_bend()))
            .and_then(|wg| wg.linear_to([60.0, y, params.depth]))
            .expect("valid chip geometry");
        device
            .add(wg.end().expect("finalized waveguide"))
            .expect("unique identifiers");
    }
    device
}

fn bench_compile_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile_device");
    group.sample_size(10);

    for &n in &[2, 8, 32] {
        let device = mzi_chip(n);
        for native_arcs in [false, true] {
            let params = CompilerParameters {
                native_arcs,
                ..CompilerParameters::new("bench")
            };
            let label = if native_arcs { "native_arcs" } else { "dense" };
            group.bench_with_input(BenchmarkId::new(label, n), &device, |b, device| {
                b.iter(|| {
                    let program = PgmCompiler::run(params.clone(), |gc| gc.emit_device(device));
                    black_box(program)
                })
            });
        }
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let device = mzi_chip(8);
    let program = PgmCompiler::run(CompilerParameters::new("bench"), |gc| gc.emit_device(&device))
        .expect("compilable chip");
    c.bench_function("render_pgm", |b| b.iter(|| black_box(program.to_pgm())));
}

criterion_group!(benches, bench_compile_device, bench_render);
criterion_main!(benches);
