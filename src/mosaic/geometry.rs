//! Canvas regions and quadrant partitioning.

use std::fmt;

/// Axis-aligned rectangle in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn max_x(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn max_y(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.max_x() && y >= self.y && y < self.max_y()
    }

    /// Overlap of two regions, if any.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());

        if x < max_x && y < max_y {
            Some(Region::new(x, y, max_x - x, max_y - y))
        } else {
            None
        }
    }

    /// Top-left corners of the blocks covering this region, row-major.
    ///
    /// Blocks are aligned to the region origin. The last row and column may
    /// extend past the region edge.
    pub fn block_origins(&self, block_size: u32) -> impl Iterator<Item = (u32, u32)> {
        let step = block_size.max(1) as usize;
        let (x0, x1) = (self.x, self.max_x());
        (self.y..self.max_y())
            .step_by(step)
            .flat_map(move |y| (x0..x1).step_by(step).map(move |x| (x, y)))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})-({}, {})",
            self.x,
            self.y,
            self.max_x(),
            self.max_y()
        )
    }
}

/// One of the four canvas partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Position in [`Quadrant::ALL`].
    pub fn index(self) -> usize {
        match self {
            Quadrant::TopLeft => 0,
            Quadrant::TopRight => 1,
            Quadrant::BottomLeft => 2,
            Quadrant::BottomRight => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Quadrant::TopLeft => "top_left",
            Quadrant::TopRight => "top_right",
            Quadrant::BottomLeft => "bottom_left",
            Quadrant::BottomRight => "bottom_right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a `width × height` canvas at its integer midpoint.
///
/// Returns regions indexed like [`Quadrant::ALL`]. The four regions are
/// pairwise disjoint and cover the canvas exactly; for odd sizes the right
/// and bottom quadrants get the extra column or row (101 splits at 50).
pub fn partition(width: u32, height: u32) -> [(Quadrant, Region); 4] {
    let mid_x = width / 2;
    let mid_y = height / 2;

    [
        (Quadrant::TopLeft, Region::new(0, 0, mid_x, mid_y)),
        (
            Quadrant::TopRight,
            Region::new(mid_x, 0, width - mid_x, mid_y),
        ),
        (
            Quadrant::BottomLeft,
            Region::new(0, mid_y, mid_x, height - mid_y),
        ),
        (
            Quadrant::BottomRight,
            Region::new(mid_x, mid_y, width - mid_x, height - mid_y),
        ),
    ]
}
