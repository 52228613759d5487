use dpmatch::{Matcher, Rgb, RgbImage, StereoConfig, UNMATCHED};

/// Every scanline carries the same shifted row, so directly solved
/// scanlines all produce the same pattern and interpolation can copy.
fn shifted_pair(height: usize) -> (RgbImage, RgbImage) {
    let input_row = [10u8, 60, 110, 160];
    let refer_row = [60u8, 110, 160, 255];
    let input = RgbImage::from_fn(4, height, |x, _| Rgb::gray(input_row[x])).unwrap();
    let refer = RgbImage::from_fn(4, height, |x, _| Rgb::gray(refer_row[x])).unwrap();
    (input, refer)
}

fn identity_pair(width: usize, height: usize) -> (RgbImage, RgbImage) {
    let img =
        RgbImage::from_fn(width, height, |x, y| Rgb::gray(((x * 40 + y * 13) % 256) as u8))
            .unwrap();
    (img.clone(), img)
}

fn shifted_cfg(skip: i32) -> StereoConfig {
    StereoConfig {
        skip,
        weight: 1.0,
        row_range: 1,
        threshold: 255,
        max_disparity: 2,
    }
}

#[test]
fn copy_rule_fills_intermediate_scanlines() {
    let (input, refer) = shifted_pair(5);
    let mut matcher = Matcher::with_threads(input, refer, 2).unwrap();
    matcher.stereo(shifted_cfg(4)).unwrap();

    // Scanlines 0 and 4 are solved directly and agree, so 1..=3 are filled
    // by the copy rule (neighbor disparity difference 0 < 5).
    let base = matcher.match_pattern(0).unwrap();
    assert_eq!(base, vec![0, 0, 1, 2]);
    for c in 1..5 {
        assert_eq!(matcher.match_pattern(c).unwrap(), base, "scanline {c}");
    }
}

#[test]
fn skip_one_runs_no_refinement() {
    let (input, refer) = shifted_pair(3);
    let mut matcher = Matcher::with_threads(input, refer, 1).unwrap();
    matcher.stereo(shifted_cfg(1)).unwrap();
    for c in 0..3 {
        assert_eq!(matcher.match_pattern(c).unwrap(), vec![0, 0, 1, 2]);
    }
}

#[test]
fn skip_equal_to_height_relies_on_refinement() {
    let (input, refer) = identity_pair(4, 4);
    let mut matcher = Matcher::with_threads(input, refer, 2).unwrap();
    matcher
        .stereo(StereoConfig {
            skip: 4,
            weight: 1.0,
            row_range: 1,
            threshold: 255,
            max_disparity: 3,
        })
        .unwrap();

    // Only scanline 0 is solved by the coarse pass; refinement levels 2 and
    // 1 fill the rest from their solved neighbors.
    for c in 0..4 {
        assert_eq!(matcher.match_pattern(c).unwrap(), vec![0, 1, 2, 3]);
    }
}

#[test]
fn power_of_two_skip_reaches_every_scanline() {
    let (input, refer) = identity_pair(8, 16);
    let mut matcher = Matcher::with_threads(input, refer, 4).unwrap();
    matcher
        .stereo(StereoConfig {
            skip: 8,
            weight: 1.0,
            row_range: 1,
            threshold: 255,
            max_disparity: 3,
        })
        .unwrap();

    for c in 0..16 {
        let pattern = matcher.match_pattern(c).unwrap();
        assert!(
            pattern.iter().all(|&y| y != UNMATCHED),
            "scanline {c} has unmatched entries"
        );
    }
}

#[test]
fn skip_larger_than_height_still_covers_all_scanlines() {
    let (input, refer) = identity_pair(4, 6);
    let mut matcher = Matcher::with_threads(input, refer, 2).unwrap();
    matcher
        .stereo(StereoConfig {
            skip: 32,
            weight: 1.0,
            row_range: 1,
            threshold: 255,
            max_disparity: 3,
        })
        .unwrap();

    for c in 0..6 {
        let pattern = matcher.match_pattern(c).unwrap();
        assert!(pattern.iter().all(|&y| y != UNMATCHED), "scanline {c}");
    }
}
