//! Performance benchmarks for the analysis engine

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cadenza_dsp::{analyze_performance, compare_performances, AnalysisConfig};

/// 30 seconds of clicks at 100 BPM
fn synthetic_take() -> Vec<f32> {
    let sample_rate = 44100.0_f32;
    let num_samples = (sample_rate * 30.0) as usize;
    let mut samples = vec![0.0f32; num_samples];

    let click_len = (0.03 * sample_rate) as usize;
    let interval = (60.0 / 100.0 * sample_rate) as usize;

    let mut pos = 0;
    while pos < num_samples {
        let end = (pos + click_len).min(num_samples);
        for (i, sample) in samples[pos..end].iter_mut().enumerate() {
            let t = i as f32 / click_len as f32;
            *sample = (-t * 5.0).exp() * 0.8;
        }
        pos += interval;
    }

    samples
}

fn bench_analyze_performance(c: &mut Criterion) {
    let samples = synthetic_take();
    let config = AnalysisConfig::default();

    c.bench_function("analyze_performance_30s", |b| {
        b.iter(|| {
            let _ = analyze_performance(black_box(&samples), black_box(44100), &config);
        });
    });
}

fn bench_compare_performances(c: &mut Criterion) {
    let samples = synthetic_take();
    let config = AnalysisConfig::default();
    let analysis = analyze_performance(&samples, 44100, &config).unwrap();

    c.bench_function("compare_performances_30s", |b| {
        b.iter(|| {
            let _ = compare_performances(black_box(&analysis), black_box(&analysis), &config);
        });
    });
}

criterion_group!(benches, bench_analyze_performance, bench_compare_performances);
criterion_main!(benches);
