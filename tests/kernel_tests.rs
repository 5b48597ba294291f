use glam::Vec4;
use mandelbrot_pool::core::{Resolution, View};
use mandelbrot_pool::math::{escape, render_pixel, render_row, unpack, Viewport, MAX_ITERATIONS};

#[cfg(test)]
mod escape_tests {
    use super::*;

    #[test]
    fn counts_stay_in_range_across_the_plane() {
        let vp = Viewport::new(View::new(1.5, -0.5, 0.0), Resolution::new(64, 48));
        for row in 0..48 {
            for col in (0..64).step_by(4) {
                let result = escape(vp.lane_x(col), Vec4::splat(vp.row_y(row)));
                for n in result.counts() {
                    assert!((1..=MAX_ITERATIONS).contains(&n), "count {}", n);
                }
            }
        }
    }

    #[test]
    fn interior_points_hit_the_cap() {
        // Main cardioid and period-2 bulb
        let result = escape(Vec4::new(-0.1, 0.25, -1.0, -0.5), Vec4::new(0.0, 0.0, 0.0, 0.5));
        assert_eq!(result.counts(), [MAX_ITERATIONS; 4]);
        assert_eq!(result.interior(), [true; 4]);
    }

    #[test]
    fn kernel_is_deterministic() {
        let x = Vec4::new(-0.743_643_9, -0.75, 0.3, -1.25);
        let y = Vec4::new(0.131_825_9, 0.1, 0.5, 0.02);
        let a = escape(x, y);
        let b = escape(x, y);
        assert_eq!(a.iterations.to_array().map(f32::to_bits), b.iterations.to_array().map(f32::to_bits));
        assert_eq!(a.m2.to_array().map(f32::to_bits), b.m2.to_array().map(f32::to_bits));
    }
}

#[cfg(test)]
mod row_tests {
    use super::*;

    #[test]
    fn deep_zoom_on_interior_point_is_black() {
        let res = Resolution::new(32, 16);
        let vp = Viewport::new(View::new(0.0001, -0.1, 0.0), res);
        let mut line = vec![0xDEAD_BEEF; 32];
        for row in 0..16 {
            render_row(&vp, row, &mut line);
            assert!(line.iter().all(|&p| p == 0), "row {} not black", row);
        }
    }

    #[test]
    fn escaped_pixels_are_24_bit() {
        let vp = Viewport::new(View::default(), Resolution::new(40, 30));
        let mut line = vec![0; 40];
        for row in 0..30 {
            render_row(&vp, row, &mut line);
            assert!(line.iter().all(|&p| p >> 24 == 0));
        }
    }

    #[test]
    fn far_corner_is_coloured() {
        let vp = Viewport::new(View::default(), Resolution::new(16, 16));
        let corner = render_pixel(&vp, 0, 0);
        assert_ne!(corner, 0);
        let [r, g, b] = unpack(corner);
        assert!(r as u32 + g as u32 + b as u32 > 0);
    }

    #[test]
    fn odd_width_matches_single_pixels() {
        let vp = Viewport::new(View::new(0.5, -0.75, 0.1), Resolution::new(37, 5));
        let mut line = vec![0; 37];
        for row in 0..5 {
            render_row(&vp, row, &mut line);
            for col in 0..37 {
                assert_eq!(line[col as usize], render_pixel(&vp, col, row));
            }
        }
    }

    #[test]
    fn longer_buffer_is_left_untouched_past_width() {
        let vp = Viewport::new(View::default(), Resolution::new(5, 1));
        let mut line = vec![0xFFFF_FFFF; 8];
        render_row(&vp, 0, &mut line);
        assert_eq!(&line[5..], &[0xFFFF_FFFF; 3]);
    }
}
