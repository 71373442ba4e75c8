//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{Dimensions, ResizePlan};

/// Calculate the target dimensions for an image bounded by `max_edge`.
///
/// The longer edge is scaled down to `max_edge`; the shorter edge follows
/// the source aspect ratio, rounded down. Images whose longer edge already
/// fits are returned unchanged: this never upscales.
///
/// Callers guarantee `width`, `height` and `max_edge` are all non-zero.
///
/// # Examples
/// ```
/// # use gallery_shrink::imaging::{Dimensions, plan_resize};
/// // 4000x3000 landscape bounded to 1200 → 1200x900
/// let plan = plan_resize(Dimensions::new(4000, 3000), 1200);
/// assert_eq!((plan.target_width, plan.target_height), (1200, 900));
///
/// // 800x1200 portrait already fits → unchanged
/// let plan = plan_resize(Dimensions::new(800, 1200), 1200);
/// assert_eq!((plan.target_width, plan.target_height), (800, 1200));
/// ```
pub fn plan_resize(source: Dimensions, max_edge: u32) -> ResizePlan {
    let Dimensions { width, height } = source;
    let long = source.long_edge();

    if long <= max_edge {
        return ResizePlan {
            target_width: width,
            target_height: height,
        };
    }

    // u64 so `short * max_edge` cannot overflow for any u32 inputs
    let scale_short = |short: u32| -> u32 {
        let scaled = u64::from(short) * u64::from(max_edge) / u64::from(long);
        (scaled as u32).max(1)
    };

    if width >= height {
        ResizePlan {
            target_width: max_edge,
            target_height: scale_short(height),
        }
    } else {
        ResizePlan {
            target_width: scale_short(width),
            target_height: max_edge,
        }
    }
}
