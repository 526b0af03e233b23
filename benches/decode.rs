//! Benchmarks for the batch decode pass.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use plc_batch::{decode_set, RegisterSet, ValueKind};

fn word_set(entries: u32) -> RegisterSet {
    let mut set = RegisterSet::new("bench");
    set.add_many("reg", "D0", ValueKind::Int16, entries).unwrap();
    set
}

fn bench_decode_words(c: &mut Criterion) {
    let mut set = word_set(100);
    let buffer = vec![0xA5u8; set.span() as usize * 2];

    c.bench_function("decode 100 int16 entries", |b| {
        b.iter(|| decode_set(black_box(&buffer), &mut set).unwrap())
    });
}

fn bench_decode_mixed(c: &mut Criterion) {
    let mut set = RegisterSet::new("bench");
    for i in 0..20 {
        set.add(format!("f{i}"), &format!("D{}", i * 10), ValueKind::Float32, None)
            .unwrap();
        set.add(format!("n{i}"), &format!("D{}", i * 10 + 4), ValueKind::Int64, None)
            .unwrap();
    }
    let buffer = vec![0x3Fu8; set.span() as usize * 2];

    c.bench_function("decode 40 mixed entries", |b| {
        b.iter(|| decode_set(black_box(&buffer), &mut set).unwrap())
    });
}

fn bench_decode_bits(c: &mut Criterion) {
    let mut set = RegisterSet::new("bench");
    set.add_bits("flag", "M0.0", 64).unwrap();
    let buffer = vec![0x55u8; set.span() as usize * 2];

    c.bench_function("decode 64 bit entries", |b| {
        b.iter(|| decode_set(black_box(&buffer), &mut set).unwrap())
    });
}

criterion_group!(
    benches,
    bench_decode_words,
    bench_decode_mixed,
    bench_decode_bits
);
criterion_main!(benches);
