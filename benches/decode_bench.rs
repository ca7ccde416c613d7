use criterion::{black_box, criterion_group, criterion_main, Criterion};
use litematic_decode::{
    BlockDefinition, BlockRegistry, BlockStateDescriptor, DecodedRegion, PackedBitArray,
    RawRegion, RegionDecoder, ResolveCache,
};
use std::time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_registry(palette_len: usize) -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    registry
        .register(BlockDefinition::simple("minecraft:air"))
        .unwrap();
    for i in 1..palette_len {
        registry
            .register(BlockDefinition::simple(format!("bench:block_{}", i)))
            .unwrap();
    }
    registry
}

fn make_raw_region(size: i32, palette_len: usize) -> RawRegion {
    let palette: Vec<BlockStateDescriptor> = (0..palette_len)
        .map(|i| {
            if i == 0 {
                BlockStateDescriptor::new("minecraft:air")
            } else {
                BlockStateDescriptor::new(format!("bench:block_{}", i))
            }
        })
        .collect();
    let bits = litematic_decode::bits_per_entry(palette_len).unwrap();
    let volume = (size * size * size) as u64;
    let mut array = PackedBitArray::new(bits, volume).unwrap();
    let mut counter = 0u32;
    for i in 0..volume {
        counter = counter.wrapping_mul(1103515245).wrapping_add(12345);
        array.set(i, (counter >> 8) % palette_len as u32).unwrap();
    }
    RawRegion::new("bench", (size, size, size), (0, 0, 0), palette, array.to_longs())
}

fn make_decoded(size: i32) -> DecodedRegion {
    let registry = make_registry(16);
    RegionDecoder::new(&registry)
        .decode(&make_raw_region(size, 16))
        .unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────────────

fn bench_bit_array_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("bit_array_get");
    group.measurement_time(Duration::from_secs(3));

    for &bits in &[4u32, 5, 13] {
        let len = 32 * 32 * 32;
        let mut array = PackedBitArray::new(bits, len).unwrap();
        for i in 0..len {
            array.set(i, (i as u32) & array.max_entry_value()).unwrap();
        }
        group.bench_function(&format!("{}_bits", bits), |b| {
            b.iter(|| {
                let mut sum = 0u64;
                for i in 0..len {
                    sum += array.get(i).unwrap() as u64;
                }
                black_box(sum);
            });
        });
    }
    group.finish();
}

fn bench_decode_region(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_region");
    group.measurement_time(Duration::from_secs(3));

    for &(size, palette_len) in &[(16, 2), (32, 16), (32, 300)] {
        let registry = make_registry(palette_len);
        let raw = make_raw_region(size, palette_len);
        group.bench_function(&format!("{}_palette_{}", size, palette_len), |b| {
            b.iter(|| black_box(RegionDecoder::new(&registry).decode(&raw).unwrap()));
        });

        let cache = ResolveCache::new();
        group.bench_function(&format!("{}_palette_{}_cached", size, palette_len), |b| {
            b.iter(|| {
                black_box(
                    RegionDecoder::new(&registry)
                        .with_cache(&cache)
                        .decode(&raw)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

fn bench_point_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_queries");
    group.measurement_time(Duration::from_secs(3));

    let size = 32;
    let region = make_decoded(size);
    group.bench_function("32_get", |b| {
        b.iter(|| {
            let mut sum = 0usize;
            for y in 0..size {
                for z in 0..size {
                    for x in 0..size {
                        if region.get(x, y, z).is_some() {
                            sum += 1;
                        }
                    }
                }
            }
            black_box(sum);
        });
    });
    group.bench_function("32_count_non_air", |b| {
        b.iter(|| black_box(region.count_non_air()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_bit_array_get,
    bench_decode_region,
    bench_point_queries,
);
criterion_main!(benches);
