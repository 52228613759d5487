use dpmatch::{EdgeMap, Rgb, RgbImage, WorkerPool};

fn single_white_pixel(size: usize, px: usize, py: usize) -> RgbImage {
    RgbImage::from_fn(size, size, |x, y| {
        if x == px && y == py {
            Rgb::gray(255)
        } else {
            Rgb::gray(0)
        }
    })
    .unwrap()
}

#[test]
fn white_pixel_lights_up_its_neighborhood() {
    let img = single_white_pixel(8, 4, 4);
    let pool = WorkerPool::new(1).unwrap();
    let edges = EdgeMap::sobel(&pool, &img, 100);

    // Corner taps see the white pixel once in each gradient:
    // k = 3 * (255^2 + 255^2) / 9 -> sqrt = 208.
    for (x, y) in [(3, 3), (5, 3), (3, 5), (5, 5)] {
        assert_eq!(edges.magnitude(x, y), 208, "corner ({x}, {y})");
        assert!(edges.is_edge(x, y));
    }
    // Axis neighbors see it with kernel weight 2 and clamp at 255.
    for (x, y) in [(4, 3), (3, 4), (5, 4), (4, 5)] {
        assert_eq!(edges.magnitude(x, y), 255, "axis ({x}, {y})");
        assert!(edges.is_edge(x, y));
    }
    // The kernels never sample their own center.
    assert_eq!(edges.magnitude(4, 4), 0);
    // Far away everything is flat.
    assert_eq!(edges.magnitude(1, 1), 0);
    assert!(!edges.is_edge(1, 1));
}

#[test]
fn border_rows_and_columns_stay_clear() {
    let img = single_white_pixel(6, 1, 1);
    let pool = WorkerPool::new(2).unwrap();
    let edges = EdgeMap::sobel(&pool, &img, 0);

    for i in 0..6 {
        assert_eq!(edges.magnitude(i, 0), 0);
        assert_eq!(edges.magnitude(i, 5), 0);
        assert_eq!(edges.magnitude(0, i), 0);
        assert_eq!(edges.magnitude(5, i), 0);
        assert!(!edges.is_edge(i, 0));
    }
    // The interior neighborhood of (1, 1) does respond.
    assert!(edges.magnitude(2, 2) > 0);
}

#[test]
fn threshold_gates_the_edge_flag() {
    let img = single_white_pixel(8, 4, 4);
    let pool = WorkerPool::new(1).unwrap();

    let loose = EdgeMap::sobel(&pool, &img, 200);
    assert!(loose.is_edge(3, 3)); // 208 > 200
    assert!(loose.is_edge(4, 3)); // 255 > 200

    let strict = EdgeMap::sobel(&pool, &img, 255);
    for y in 0..8 {
        for x in 0..8 {
            assert!(!strict.is_edge(x, y), "({x}, {y})");
        }
    }
}

#[test]
fn slab_partition_matches_single_worker_result() {
    let img = RgbImage::from_fn(9, 11, |x, y| Rgb {
        r: ((x * 13) ^ (y * 7) ^ (x * y)) as u8,
        g: ((x * 5 + y * 3) % 256) as u8,
        b: ((x + 2 * y) % 256) as u8,
    })
    .unwrap();

    let single = EdgeMap::sobel(&WorkerPool::new(1).unwrap(), &img, 30);
    let pooled = EdgeMap::sobel(&WorkerPool::new(3).unwrap(), &img, 30);

    for y in 0..11 {
        for x in 0..9 {
            assert_eq!(
                single.magnitude(x, y),
                pooled.magnitude(x, y),
                "({x}, {y})"
            );
            assert_eq!(single.is_edge(x, y), pooled.is_edge(x, y));
        }
    }
}
