//! Row-stripe parallelism.
//!
//! With `T` threads, stripe `k` owns scanlines `k, k + T, k + 2T, ...`.
//! Every scanline gets its own RNG seeded from the render seed and the
//! scanline index, so the image does not depend on the thread count.

use ember_core::Color;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use super::buffer::PixelBuffer;
use crate::error::RenderResult;

/// Per-pixel work shared by the render drivers.
pub(crate) trait PixelRenderer: Sync {
    /// Colour for column `x` of scanline `y` (scanline 0 at the bottom).
    fn render_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color;
}

const SCANLINE_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

fn scanline_rng(seed: u64, scanline: u32) -> StdRng {
    StdRng::seed_from_u64(seed ^ (scanline as u64 + 1).wrapping_mul(SCANLINE_SEED_MIX))
}

/// Render every scanline on a dedicated pool of `threads` workers and
/// assemble the image once all stripes are done.
pub(crate) fn render_stripes<R: PixelRenderer>(
    renderer: &R,
    width: u32,
    height: u32,
    threads: usize,
    seed: u64,
    post: impl Fn(Color) -> Color + Sync,
) -> RenderResult<PixelBuffer> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let stride = threads as u32;

    let stripes: Vec<Vec<(u32, Vec<Color>)>> = pool.install(|| {
        (0..stride)
            .into_par_iter()
            .map(|stripe| {
                (stripe..height)
                    .step_by(stride as usize)
                    .map(|y| {
                        let mut rng = scanline_rng(seed, y);
                        let row = (0..width)
                            .map(|x| post(renderer.render_pixel(x, y, &mut rng)))
                            .collect();
                        (y, row)
                    })
                    .collect()
            })
            .collect()
    });

    let mut buffer = PixelBuffer::new(width, height);
    for (y, row) in stripes.into_iter().flatten() {
        buffer.write_scanline(y, &row);
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::gen_f32;

    struct Gradient;

    impl PixelRenderer for Gradient {
        fn render_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
            Color::new(x as f32 / 10.0, y as f32 / 10.0, gen_f32(rng))
        }
    }

    #[test]
    fn test_every_scanline_is_written() {
        let buf = render_stripes(&Gradient, 4, 7, 3, 0, |c| c).unwrap();
        // Top row of the buffer is the last scanline.
        let top = buf.get(2, 0).unwrap();
        assert!((top.r - 0.2).abs() < 1e-6);
        assert!((top.g - 0.6).abs() < 1e-6);
        let bottom = buf.get(3, 6).unwrap();
        assert!((bottom.g - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_thread_count_does_not_change_image() {
        let a = render_stripes(&Gradient, 5, 9, 1, 17, |c| c).unwrap();
        let b = render_stripes(&Gradient, 5, 9, 4, 17, |c| c).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_more_threads_than_rows() {
        let buf = render_stripes(&Gradient, 2, 2, 8, 1, |c| c).unwrap();
        assert_eq!(buf.pixels().len(), 4);
        assert!(buf.pixels().iter().all(|p| p.a == 1.0));
    }
}
