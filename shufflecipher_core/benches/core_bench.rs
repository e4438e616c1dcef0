use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shufflecipher_core::{
    derive_rng, random_iv, DisplacementMode, DisplacementParams, OperationMode, OutputFormat,
    ShuffleCipher,
};

const BENCH_TEXT: &str = "the quick brown fox jumps over the lazy dog and keeps on running";

fn continuous_cipher() -> ShuffleCipher {
    let mut cipher = ShuffleCipher::new();
    cipher.set_output_format(OutputFormat::Text);
    cipher.set_operation_mode(OperationMode::Continuous);
    cipher.set_key("benchmarking");
    let mut feedback = cipher.feedback();
    feedback.print_messages = false;
    feedback.print_ivs = false;
    cipher.set_feedback(feedback);
    cipher
}

fn bench_key_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("key-schedule");
    let mut cipher = continuous_cipher();
    group.bench_function("set-key", |b| {
        b.iter(|| cipher.set_key(black_box("an unusually long key with repeats and padding")))
    });
    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let mut enc = continuous_cipher();
    group.bench_function("encrypt", |b| {
        b.iter(|| enc.encrypt_text(black_box(BENCH_TEXT)))
    });
    let mut dec = continuous_cipher();
    group.bench_function("decrypt", |b| {
        b.iter(|| dec.decrypt_text(black_box(BENCH_TEXT)))
    });
    group.finish();
}

fn bench_displacement_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("displacement");
    for (label, mode) in [
        ("truncated-binary", DisplacementMode::TruncatedBinary),
        ("binary", DisplacementMode::Binary),
        ("constant", DisplacementMode::Constant),
        ("separate-metacipher", DisplacementMode::SeparateMetaCipher),
    ] {
        let mut cipher = continuous_cipher();
        cipher.set_displacement(DisplacementParams::new(mode, 1, 0xf));
        group.bench_function(label, |b| {
            b.iter(|| cipher.encrypt_text(black_box(BENCH_TEXT)))
        });
    }
    group.finish();
}

fn bench_iv_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("iv");
    let mut cipher = continuous_cipher();
    let iv = random_iv(64, 26, &mut derive_rng(b"bench-iv"));
    group.bench_function("fold-64", |b| {
        b.iter(|| cipher.apply_iv_values(black_box(&iv)).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_key_schedule,
    bench_transform,
    bench_displacement_modes,
    bench_iv_fold
);
criterion_main!(benches);
