use std::io::{self, Write};

use rayon::prelude::*;

use crate::Color;

/// The render target: a flat buffer of linear colors, row 0 at the top of
/// the image. Each worker thread writes only the rows it owns.
pub struct Screen {
    pub width: usize,
    pub height: usize,
    /// Flat buffer with length of `width * height`
    pub buffer: Box<[Color]>,
}

impl Screen {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![Color::BLACK; width * height].into(),
        }
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<Color> {
        self.buffer.chunks_exact_mut(self.width)
    }

    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<Color> {
        self.buffer.par_chunks_exact_mut(self.width)
    }

    /// Write the buffer as a plain-text P3 raster: `P3`, dimensions, max
    /// channel value, then one scanline per line, top row first. Channels
    /// are clamped to `[0, 1]` before quantization.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        let quantize = |c: f64| {
            debug_assert!(!c.is_nan(), "NaN channel in pixel buffer");
            (255.999 * c.max(0.).min(1.)) as u8
        };
        for row in self.buffer.chunks_exact(self.width) {
            let mut line = String::with_capacity(self.width * 12);
            for pixel in row {
                line.push_str(&format!(
                    "{} {} {} ",
                    quantize(pixel.r),
                    quantize(pixel.g),
                    quantize(pixel.b)
                ));
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
