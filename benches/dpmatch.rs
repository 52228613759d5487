use criterion::{criterion_group, criterion_main, Criterion};
use dpmatch::{FusionConfig, Matcher, Rgb, RgbImage, StereoConfig};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let value = (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8;
        Rgb::gray(value)
    })
    .unwrap()
}

/// Shifts the image left by `disparity`, clamping at the right border, so
/// stereo matching has a known correspondence to recover.
fn shift_left(img: &RgbImage, disparity: usize) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let sx = (x + disparity).min(img.width() - 1);
        img.pixel(sx, y)
    })
    .unwrap()
}

fn bench_matcher(c: &mut Criterion) {
    let width = 96;
    let height = 64;
    let left = make_image(width, height);
    let right = shift_left(&left, 4);

    let stereo_cfg = StereoConfig {
        weight: 1.0,
        row_range: 4,
        threshold: 60,
        max_disparity: 8,
        ..StereoConfig::default()
    };

    let mut dense = Matcher::with_threads(left.clone(), right.clone(), 4).unwrap();
    c.bench_function("stereo_skip_1", |b| {
        b.iter(|| {
            dense
                .stereo(StereoConfig {
                    skip: 1,
                    ..stereo_cfg
                })
                .unwrap();
            black_box(dense.match_pattern(0).unwrap())
        });
    });

    let mut skipping = Matcher::with_threads(left.clone(), right.clone(), 4).unwrap();
    c.bench_function("stereo_skip_8", |b| {
        b.iter(|| {
            skipping
                .stereo(StereoConfig {
                    skip: 8,
                    ..stereo_cfg
                })
                .unwrap();
            black_box(skipping.match_pattern(0).unwrap())
        });
    });

    let mut fusing = Matcher::with_threads(left, right, 4).unwrap();
    c.bench_function("fusion_skip_8", |b| {
        b.iter(|| {
            fusing.fusion(FusionConfig::default()).unwrap();
            black_box(fusing.match_pattern(0).unwrap())
        });
    });
}

criterion_group!(benches, bench_matcher);
criterion_main!(benches);
