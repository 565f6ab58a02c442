//! Panel geometry and wiring: logical `(x, y)` to physical LED index.
//!
//! The matrix is a row of identical panels concatenated left to right. Inside
//! a panel the LED strip snakes across rows: even rows run left to right, odd
//! rows right to left. Row 0 is the row where the panel's strip starts.
//!
//! ```text
//! Two 3x2 panels, identity wiring:
//!
//!   LED5  LED4  LED3 | LED11 LED10 LED9     y = 1
//!   LED0  LED1  LED2 | LED6  LED7  LED8     y = 0
//! ```
//!
//! Panels after the first may be mirrored or rotated to compensate for a
//! reversed installation. The mapping is checked to be a bijection before it
//! is used, see [`Topology::validate`] and [`PixelMap`].

use heapless::Vec as HVec;

use crate::error::{Error, Result};

/// Maximum number of panels in one chain
pub const MAX_PANELS: usize = 8;

/// Geometric correction applied to a single panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelTransform {
    #[default]
    Identity,
    /// Mirror about the panel's vertical center line
    MirrorX,
    /// Rotate by 180 degrees about the panel center
    Rotate180,
}

impl PanelTransform {
    /// Map panel-local coordinates through the transform
    #[inline]
    pub const fn apply(self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        match self {
            Self::Identity => (x, y),
            Self::MirrorX => (width - 1 - x, y),
            Self::Rotate180 => (width - 1 - x, height - 1 - y),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::MirrorX => "mirror-x",
            Self::Rotate180 => "rotate-180",
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            "identity" => Some(Self::Identity),
            "mirror-x" => Some(Self::MirrorX),
            "rotate-180" => Some(Self::Rotate180),
            _ => None,
        }
    }
}

/// Static description of the panel chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    panel_width: usize,
    panel_height: usize,
    /// One entry per panel, in wiring order
    panels: HVec<PanelTransform, MAX_PANELS>,
}

impl Default for Topology {
    /// Two 13x9 panels, both wired the same way
    fn default() -> Self {
        let mut panels = HVec::new();
        let _ = panels.push(PanelTransform::Identity);
        let _ = panels.push(PanelTransform::Identity);
        Self {
            panel_width: 13,
            panel_height: 9,
            panels,
        }
    }
}

impl Topology {
    /// Create a chain of panels. The first transform must be identity.
    pub fn new(panel_width: usize, panel_height: usize, transforms: &[PanelTransform]) -> Result<Self> {
        let panels = HVec::from_slice(transforms).map_err(|()| Error::Topology {
            reason: "too many panels",
        })?;
        let topology = Self {
            panel_width,
            panel_height,
            panels,
        };
        topology.check_parameters()?;
        Ok(topology)
    }

    /// Reference layout with the given transform on every panel after the first
    pub fn with_trailing_transform(mut self, transform: PanelTransform) -> Self {
        for panel in self.panels.iter_mut().skip(1) {
            *panel = transform;
        }
        self
    }

    pub const fn panel_width(&self) -> usize {
        self.panel_width
    }

    pub const fn panel_height(&self) -> usize {
        self.panel_height
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn panels(&self) -> &[PanelTransform] {
        &self.panels
    }

    /// LEDs in a single panel
    pub const fn panel_led_count(&self) -> usize {
        self.panel_width * self.panel_height
    }

    /// Logical matrix width
    pub fn width(&self) -> usize {
        self.panel_width * self.panels.len()
    }

    /// Logical matrix height
    pub const fn height(&self) -> usize {
        self.panel_height
    }

    /// Total number of LEDs
    pub fn led_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Physical wire-order index of logical coordinate `(x, y)`.
    ///
    /// `y` counts from the row where the strip starts. Returns `None` outside
    /// the grid.
    pub fn physical_index(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width() || y >= self.height() {
            return None;
        }

        let panel = x / self.panel_width;
        let local_x = x % self.panel_width;
        let transform = *self.panels.get(panel)?;
        let (local_x, local_y) =
            transform.apply(local_x, y, self.panel_width, self.panel_height);

        let row_base = local_y * self.panel_width;
        let index_in_panel = if local_y % 2 == 0 {
            row_base + local_x
        } else {
            row_base + (self.panel_width - 1 - local_x)
        };

        Some(panel * self.panel_led_count() + index_in_panel)
    }

    /// Check that every logical coordinate maps to exactly one LED and
    /// every LED is addressed exactly once.
    pub fn validate(&self) -> Result<()> {
        PixelMap::new(self, false).map(|_| ())
    }

    fn check_parameters(&self) -> Result<()> {
        if self.panel_width == 0 || self.panel_height == 0 {
            return Err(Error::Topology {
                reason: "panel dimensions must be positive",
            });
        }
        if self.panels.is_empty() {
            return Err(Error::Topology {
                reason: "at least one panel is required",
            });
        }
        if self.panels[0] != PanelTransform::Identity {
            return Err(Error::Topology {
                reason: "the first panel defines the orientation and cannot be transformed",
            });
        }
        let led_count = self
            .panel_width
            .checked_mul(self.panels.len())
            .and_then(|width| width.checked_mul(self.panel_height));
        if led_count.is_none_or(|count| count > usize::from(u16::MAX)) {
            return Err(Error::Topology {
                reason: "total LED count must fit in u16",
            });
        }
        Ok(())
    }
}

/// Validated lookup table from source pixel to physical LED index
///
/// Entry `map[row * width + x]` is the physical LED that shows source pixel
/// `(x, row)`. When `flip_vertical` is set the source row counts from the top
/// and the physical row from the bottom: `physical_row = height - 1 - row`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMap {
    width: usize,
    height: usize,
    map: Vec<u16>,
}

impl PixelMap {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(topology: &Topology, flip_vertical: bool) -> Result<Self> {
        topology.check_parameters()?;

        let width = topology.width();
        let height = topology.height();
        let led_count = topology.led_count();

        let mut map = vec![0u16; led_count];
        let mut seen = vec![false; led_count];

        for row in 0..height {
            let y = if flip_vertical { height - 1 - row } else { row };
            for x in 0..width {
                let index = topology
                    .physical_index(x, y)
                    .filter(|&index| index < led_count)
                    .ok_or(Error::Topology {
                        reason: "coordinate maps outside the LED chain",
                    })?;
                if seen[index] {
                    return Err(Error::DuplicateLed { index, x, y });
                }
                seen[index] = true;
                map[row * width + x] = index as u16;
            }
        }

        if let Some(index) = seen.iter().position(|&hit| !hit) {
            return Err(Error::UnmappedLed { index });
        }

        Ok(Self { width, height, map })
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Physical LED for source pixel `(x, row)`
    pub fn get(&self, x: usize, row: usize) -> Option<usize> {
        if x >= self.width || row >= self.height {
            return None;
        }
        self.map.get(row * self.width + x).map(|&index| usize::from(index))
    }

    /// Physical LED indices in source row-major order
    pub fn as_slice(&self) -> &[u16] {
        &self.map
    }
}
