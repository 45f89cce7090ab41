//! Drawing surface the encoder captures from

use crate::domain::model::Frame;

/// Fixed-size RGBA surface. Frames of any size are scaled to fit.
pub struct DrawingSurface {
    frame: Frame,
}

impl DrawingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: Frame::solid(width.max(1), height.max(1), [0, 0, 0, 255]),
        }
    }

    pub fn width(&self) -> u32 {
        self.frame.width
    }

    pub fn height(&self) -> u32 {
        self.frame.height
    }

    /// Draw `source` over the whole surface (nearest neighbour)
    pub fn draw(&mut self, source: &Frame) {
        let expected = source.width as usize * source.height as usize * 4;
        if expected == 0 || source.pixels.len() != expected {
            return;
        }
        if source.width == self.frame.width && source.height == self.frame.height {
            self.frame.pixels.copy_from_slice(&source.pixels);
            return;
        }

        let (dst_w, dst_h) = (self.frame.width as usize, self.frame.height as usize);
        let (src_w, src_h) = (source.width as usize, source.height as usize);
        for y in 0..dst_h {
            let sy = y * src_h / dst_h;
            let src_row = sy * src_w * 4;
            let dst_row = y * dst_w * 4;
            for x in 0..dst_w {
                let sx = x * src_w / dst_w;
                let src = src_row + sx * 4;
                let dst = dst_row + x * 4;
                self.frame.pixels[dst..dst + 4].copy_from_slice(&source.pixels[src..src + 4]);
            }
        }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}
