use bitvec::prelude::{BitVec, Lsb0};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use slack_collections::PackedBitArray;

fn bench_bit_array(c: &mut Criterion) {
    let n = 4096;
    {
        let mut group = c.benchmark_group("BitVec vs PackedBitArray (Add 4096)");
        group.bench_function("bitvec::BitVec", |b| {
            b.iter(|| {
                let mut v: BitVec<u32, Lsb0> = BitVec::new();
                for i in 0..n {
                    v.push(black_box(i % 3 == 0));
                }
                v
            })
        });

        group.bench_function("PackedBitArray", |b| {
            b.iter(|| {
                let mut v: PackedBitArray = PackedBitArray::new();
                for i in 0..n {
                    v.add(black_box(i % 3 == 0));
                }
                v
            })
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("BitVec vs PackedBitArray (Fill range 4096)");
        let mut v_bitvec: BitVec<u32, Lsb0> = BitVec::repeat(false, n);
        let mut v_packed: PackedBitArray = PackedBitArray::with_value(false, n);

        group.bench_function("bitvec::BitVec", |b| {
            b.iter(|| v_bitvec[black_box(3)..black_box(n - 5)].fill(true))
        });

        group.bench_function("PackedBitArray", |b| {
            b.iter(|| v_packed.set_range(black_box(3), black_box(n - 8), true))
        });
        group.finish();
    }

    {
        let mut group = c.benchmark_group("BitVec vs PackedBitArray (Find last one)");
        let mut v_bitvec: BitVec<u32, Lsb0> = BitVec::repeat(false, n);
        let mut v_packed: PackedBitArray = PackedBitArray::with_value(false, n);
        v_bitvec.set(7, true);
        v_packed.set(7, true);

        group.bench_function("bitvec::BitVec", |b| {
            b.iter(|| black_box(&v_bitvec).last_one())
        });

        group.bench_function("PackedBitArray", |b| {
            b.iter(|| black_box(&v_packed).find_last(true))
        });
        group.finish();
    }
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("PackedBitArray remove_at (front vs suffix)");
    let template: PackedBitArray = (0..4096).map(|i| i % 2 == 0).collect();

    group.bench_function("front", |b| {
        b.iter(|| {
            let mut v = template.clone();
            v.remove_at(black_box(0), 32);
            v
        })
    });

    group.bench_function("suffix", |b| {
        b.iter(|| {
            let mut v = template.clone();
            v.remove_at(black_box(4096 - 32), 32);
            v
        })
    });
    group.finish();
}

criterion_group!(benches, bench_bit_array, bench_remove);
criterion_main!(benches);
