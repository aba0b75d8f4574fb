use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use tensor_fuzz_kit::{ByteCursor, DType, FillMode, Profile, ShapeSpec};

fn pseudo_input(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 3)) as u8).collect()
}

fn bench_read_tensor(c: &mut Criterion) {
    let input = pseudo_input(4096);

    let mut group = c.benchmark_group("read_tensor");
    group.throughput(Throughput::Bytes(input.len() as u64));

    for (name, profile) in [
        ("tensorflow", Profile::tensorflow()),
        ("torch", Profile::torch()),
        (
            "random",
            Profile::builder()
                .fill_mode(FillMode::Random { seed: 7 })
                .build()
                .unwrap(),
        ),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut cursor = ByteCursor::new(black_box(&input), &profile);
                while !cursor.is_exhausted() {
                    black_box(cursor.read_tensor());
                }
            })
        });
    }

    group.finish();
}

fn bench_fill(c: &mut Criterion) {
    // [10, 10, 10, 10] f32 tensor, the largest TensorFlow-profile shape.
    let shape = ShapeSpec::new(vec![10, 10, 10, 10]).unwrap();
    let input = pseudo_input(shape.num_elements() * 4);

    let mut group = c.benchmark_group("fill");
    group.throughput(Throughput::Bytes(input.len() as u64));

    let elementwise = Profile::tensorflow();
    group.bench_function("elementwise_f32_10k", |b| {
        b.iter(|| {
            let mut cursor = ByteCursor::new(&input, &elementwise);
            black_box(cursor.read_buffer(shape.clone(), DType::F32));
        })
    });

    let contiguous = Profile::torch();
    group.bench_function("contiguous_f32_10k", |b| {
        b.iter(|| {
            let mut cursor = ByteCursor::new(&input, &contiguous);
            black_box(cursor.read_buffer(shape.clone(), DType::F32));
        })
    });

    group.bench_function("strings_10k", |b| {
        b.iter(|| {
            let mut cursor = ByteCursor::new(&input, &elementwise);
            black_box(cursor.read_buffer(shape.clone(), DType::String));
        })
    });

    group.finish();
}

criterion_group!(benches, bench_read_tensor, bench_fill);
criterion_main!(benches);
