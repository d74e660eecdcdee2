//! Region Geometry for Tile-Aligned Display Updates
//!
//! This module implements the rectangle math the FreeRDS surface needs when
//! relaying dirty regions to the session service: expansion to the 16-pixel
//! tile grid the remote codecs operate on, and clamping to the framebuffer.
//!
//! # Architecture
//!
//! ```text
//! Plotter Region → align_to_tiles (16×16) → clamp_to(fb) → PaintRect message
//! ```
//!
//! Regions are half-open boxes: `(x0, y0)` is the inclusive top-left corner
//! and `(x1, y1)` the exclusive bottom-right corner, matching the bounding
//! boxes the hosting framebuffer library hands to `claim` and `update`.
//!
//! # Usage
//!
//! ```rust
//! use freerds_surface::geometry::Region;
//!
//! let dirty = Region::new(3, 5, 100, 90);
//! let aligned = dirty.align_to_tiles().clamp_to(1024, 768);
//!
//! assert_eq!(aligned, Region::new(0, 0, 112, 96));
//! ```

// =============================================================================
// Types
// =============================================================================

/// Side length of the tile grid used by the remote-side codecs.
///
/// Update rectangles are expanded to this grid before being sent so the
/// service never has to encode a partial tile.
pub const TILE_SIZE: i32 = 16;

/// A half-open rectangular region of the framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    /// Left edge (inclusive)
    pub x0: i32,
    /// Top edge (inclusive)
    pub y0: i32,
    /// Right edge (exclusive)
    pub x1: i32,
    /// Bottom edge (exclusive)
    pub y1: i32,
}

impl Region {
    /// The canonical empty region
    pub const EMPTY: Region = Region {
        x0: 0,
        y0: 0,
        x1: 0,
        y1: 0,
    };

    /// Create a region from its corner coordinates
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Create a region from a top-left corner and a size
    #[inline]
    pub fn from_size(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x + width as i32,
            y1: y + height as i32,
        }
    }

    /// Create a region covering an entire `width` × `height` framebuffer
    #[inline]
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: width as i32,
            y1: height as i32,
        }
    }

    /// Width in pixels, zero for inverted regions
    #[inline]
    pub fn width(&self) -> u32 {
        (self.x1 - self.x0).max(0) as u32
    }

    /// Height in pixels, zero for inverted regions
    #[inline]
    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }

    /// Area in pixels
    #[inline]
    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// True when the region covers no pixels (zero-sized or inverted)
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Check whether `other` lies entirely inside this region
    pub fn contains(&self, other: &Region) -> bool {
        if other.is_empty() {
            return true;
        }
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// Expand the region outward to the 16-pixel tile grid.
    ///
    /// The left and top edges move down to the previous tile boundary, the
    /// right and bottom edges move up to the next one. The result always
    /// contains the input. Negative coordinates round toward negative
    /// infinity, so clamping afterwards still behaves.
    pub fn align_to_tiles(&self) -> Region {
        if self.is_empty() {
            return *self;
        }
        Region {
            x0: self.x0.div_euclid(TILE_SIZE) * TILE_SIZE,
            y0: self.y0.div_euclid(TILE_SIZE) * TILE_SIZE,
            x1: (self.x1 + TILE_SIZE - 1).div_euclid(TILE_SIZE) * TILE_SIZE,
            y1: (self.y1 + TILE_SIZE - 1).div_euclid(TILE_SIZE) * TILE_SIZE,
        }
    }

    /// Intersect the region with a `width` × `height` framebuffer.
    ///
    /// A region entirely outside the framebuffer collapses to empty; callers
    /// skip those instead of sending zero-area paint rectangles.
    pub fn clamp_to(&self, width: u32, height: u32) -> Region {
        Region {
            x0: self.x0.clamp(0, width as i32),
            y0: self.y0.clamp(0, height as i32),
            x1: self.x1.clamp(0, width as i32),
            y1: self.y1.clamp(0, height as i32),
        }
    }

    /// Intersection of two regions (empty when they do not overlap)
    pub fn intersect(&self, other: &Region) -> Region {
        Region {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Bounding box of two regions.
    ///
    /// An empty operand does not widen the result, so accumulating damage
    /// can start from any empty region.
    pub fn union(&self, other: &Region) -> Region {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Region {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Construction and accessors
    // -------------------------------------------------------------------------

    #[test]
    fn test_region_from_size() {
        let region = Region::from_size(10, 20, 100, 50);
        assert_eq!(region, Region::new(10, 20, 110, 70));
        assert_eq!(region.width(), 100);
        assert_eq!(region.height(), 50);
        assert_eq!(region.area(), 5000);
    }

    #[test]
    fn test_region_full_frame() {
        let region = Region::full_frame(1024, 768);
        assert_eq!(region, Region::new(0, 0, 1024, 768));
        assert!(!region.is_empty());
    }

    #[test]
    fn test_region_empty_and_inverted() {
        assert!(Region::new(10, 10, 10, 50).is_empty());
        assert!(Region::new(10, 10, 50, 10).is_empty());
        assert!(Region::new(50, 50, 10, 10).is_empty());
        assert_eq!(Region::new(50, 50, 10, 10).width(), 0);
        assert_eq!(Region::new(50, 50, 10, 10).area(), 0);
    }

    // -------------------------------------------------------------------------
    // Tile alignment
    // -------------------------------------------------------------------------

    #[test]
    fn test_align_expands_to_tile_grid() {
        let region = Region::new(3, 17, 30, 33);
        assert_eq!(region.align_to_tiles(), Region::new(0, 16, 32, 48));
    }

    #[test]
    fn test_align_keeps_aligned_region() {
        let region = Region::new(16, 32, 64, 128);
        assert_eq!(region.align_to_tiles(), region);
    }

    #[test]
    fn test_align_negative_coordinates_floor() {
        // -1 must floor to -16, not round toward zero
        let region = Region::new(-1, -20, 5, 5);
        assert_eq!(region.align_to_tiles(), Region::new(-16, -32, 16, 16));
    }

    #[test]
    fn test_align_single_pixel() {
        let region = Region::new(17, 17, 18, 18);
        assert_eq!(region.align_to_tiles(), Region::new(16, 16, 32, 32));
    }

    #[test]
    fn test_align_empty_stays_empty() {
        let region = Region::new(40, 40, 40, 40);
        assert!(region.align_to_tiles().is_empty());
    }

    // -------------------------------------------------------------------------
    // Clamping
    // -------------------------------------------------------------------------

    #[test]
    fn test_clamp_inside_is_identity() {
        let region = Region::new(100, 100, 200, 200);
        assert_eq!(region.clamp_to(1024, 768), region);
    }

    #[test]
    fn test_clamp_cuts_overhang() {
        let region = Region::new(-16, 700, 1040, 784);
        assert_eq!(region.clamp_to(1024, 768), Region::new(0, 700, 1024, 768));
    }

    #[test]
    fn test_clamp_offscreen_is_empty() {
        let region = Region::new(2000, 10, 2100, 50);
        assert!(region.clamp_to(1024, 768).is_empty());
    }

    #[test]
    fn test_align_then_clamp_is_update_path() {
        // The update path: expand to tiles, then cut at the framebuffer edge.
        let region = Region::new(1000, 750, 1024, 768);
        let sent = region.align_to_tiles().clamp_to(1024, 768);
        assert_eq!(sent, Region::new(992, 736, 1024, 768));
    }

    // -------------------------------------------------------------------------
    // Set operations
    // -------------------------------------------------------------------------

    #[test]
    fn test_intersect_overlapping() {
        let a = Region::new(0, 0, 100, 100);
        let b = Region::new(50, 50, 150, 150);
        assert_eq!(a.intersect(&b), Region::new(50, 50, 100, 100));
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(20, 20, 30, 30);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn test_union_bounding_box() {
        let a = Region::new(0, 0, 10, 10);
        let b = Region::new(20, 20, 30, 30);
        assert_eq!(a.union(&b), Region::new(0, 0, 30, 30));
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = Region::new(5, 5, 25, 25);
        let empty = Region::new(0, 0, 0, 0);
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
    }

    #[test]
    fn test_contains() {
        let outer = Region::new(0, 0, 100, 100);
        assert!(outer.contains(&Region::new(10, 10, 90, 90)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&Region::new(10, 10, 101, 90)));
        // Every region contains the empty region
        assert!(outer.contains(&Region::new(500, 500, 500, 500)));
    }

    // -------------------------------------------------------------------------
    // Property tests
    // -------------------------------------------------------------------------

    fn arbitrary_region() -> impl Strategy<Value = Region> {
        (-64i32..4096, -64i32..4096, 1i32..512, 1i32..512)
            .prop_map(|(x, y, w, h)| Region::new(x, y, x + w, y + h))
    }

    proptest! {
        /// Alignment never shrinks a region and lands every edge on the grid.
        #[test]
        fn test_align_contains_input_and_is_tile_aligned(region in arbitrary_region()) {
            let aligned = region.align_to_tiles();
            prop_assert!(aligned.contains(&region));
            prop_assert_eq!(aligned.x0.rem_euclid(TILE_SIZE), 0);
            prop_assert_eq!(aligned.y0.rem_euclid(TILE_SIZE), 0);
            prop_assert_eq!(aligned.x1.rem_euclid(TILE_SIZE), 0);
            prop_assert_eq!(aligned.y1.rem_euclid(TILE_SIZE), 0);
        }

        /// Clamping keeps the region inside the framebuffer bounds.
        #[test]
        fn test_clamp_stays_in_bounds(region in arbitrary_region()) {
            let clamped = region.clamp_to(1024, 768);
            prop_assert!(clamped.x0 >= 0 && clamped.y0 >= 0);
            prop_assert!(clamped.x1 <= 1024 && clamped.y1 <= 768);
            prop_assert!(Region::full_frame(1024, 768).contains(&clamped));
        }

        /// The full update path yields tile edges except where the border cuts.
        #[test]
        fn test_update_path_edges(region in arbitrary_region()) {
            let sent = region.align_to_tiles().clamp_to(1024, 768);
            if !sent.is_empty() {
                prop_assert!(sent.x0.rem_euclid(TILE_SIZE) == 0);
                prop_assert!(sent.y0.rem_euclid(TILE_SIZE) == 0);
                prop_assert!(sent.x1.rem_euclid(TILE_SIZE) == 0 || sent.x1 == 1024);
                prop_assert!(sent.y1.rem_euclid(TILE_SIZE) == 0 || sent.y1 == 768);
            }
        }
    }
}
