//! Reference calibration pattern.

/// Neutral grey behind the pattern.
const BACKGROUND: [u8; 3] = [128, 128, 128];

/// Gap around bars and blocks, in pixels.
const MARGIN: u32 = 10;

/// Bottom row: red, green, blue, yellow, cyan, magenta, white, black.
const BLOCK_COLORS: [[u8; 3]; 8] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 255, 0],
    [0, 255, 255],
    [255, 0, 255],
    [255, 255, 255],
    [0, 0, 0],
];

/// An RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub pixels: Vec<u8>,
}

impl Bitmap {
    fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = [rgb[0], rgb[1], rgb[2], 255]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// The RGBA value at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[i..i + 3].copy_from_slice(&rgb);
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, mut color: impl FnMut(u32) -> [u8; 3]) {
        for row in y..y.saturating_add(h).min(self.height) {
            for col in x..x.saturating_add(w).min(self.width) {
                self.put(col, row, color(col));
            }
        }
    }
}

/// Gradient bars and colour blocks for judging gamma by eye.
///
/// The top three quarters hold black-to-red, black-to-green and
/// black-to-blue gradients. The bottom quarter holds eight solid blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePattern {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for ReferencePattern {
    fn default() -> Self {
        Self {
            width: 600,
            height: 300,
        }
    }
}

impl ReferencePattern {
    /// Create a pattern of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Draw the pattern.
    pub fn render(&self) -> Bitmap {
        let mut bitmap = Bitmap::filled(self.width, self.height, BACKGROUND);
        let band = self.height / 4;
        let inner = band.saturating_sub(MARGIN * 2);
        let span = self.width.saturating_sub(1).max(1);

        let primaries: [[u8; 3]; 3] = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];
        for (i, primary) in primaries.into_iter().enumerate() {
            let y = band * i as u32 + MARGIN;
            bitmap.fill_rect(0, y, self.width, inner, |x| {
                let level = (u32::from(u8::MAX) * x + span / 2) / span;
                primary.map(|c| (u32::from(c) * level / 255) as u8)
            });
        }

        let block_width = self.width / 8;
        let block_y = band * 3 + MARGIN;
        for (i, color) in BLOCK_COLORS.into_iter().enumerate() {
            let x = block_width * i as u32 + MARGIN;
            bitmap.fill_rect(x, block_y, block_width.saturating_sub(MARGIN * 2), inner, |_| color);
        }

        bitmap
    }
}
