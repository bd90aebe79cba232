//! The displayed frame
//!
//! Frames are packed 1-bit pixels, row-major, most significant bit first.
//! A set bit is a light pixel, a clear bit a dark one.

use crate::error::BufferError;

/// Pixel dimensions of the attached panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
}

impl DisplayGeometry {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bytes in one packed frame: `ceil(width * height / 8)`
    pub fn frame_len(&self) -> usize {
        (self.width as usize * self.height as usize).div_ceil(8)
    }
}

impl Default for DisplayGeometry {
    /// The 1.54" 200x200 panel
    fn default() -> Self {
        Self::new(200, 200)
    }
}

/// Owner of the most recently committed frame
///
/// Allocated once with the panel's frame size. The only way to change its
/// contents is [`commit`](ImageBuffer::commit), which swaps in a complete
/// staged frame; there is no way to write into the live frame piecemeal.
#[derive(Debug, Clone)]
pub struct ImageBuffer {
    geometry: DisplayGeometry,
    frame: Box<[u8]>,
    has_frame: bool,
    generation: u64,
}

impl ImageBuffer {
    /// Allocate an all-light buffer for `geometry`
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self {
            geometry,
            frame: vec![0xFF; geometry.frame_len()].into_boxed_slice(),
            has_frame: false,
            generation: 0,
        }
    }

    pub fn geometry(&self) -> DisplayGeometry {
        self.geometry
    }

    pub fn frame_len(&self) -> usize {
        self.frame.len()
    }

    /// Whether any frame has been committed yet
    pub fn has_frame(&self) -> bool {
        self.has_frame
    }

    /// Number of successful commits so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.frame
    }

    /// Replace the frame with `staged`
    ///
    /// The staged bytes must be exactly one frame long; otherwise the
    /// current frame is kept and an error returned.
    pub fn commit(&mut self, staged: Vec<u8>) -> Result<(), BufferError> {
        if staged.len() != self.frame.len() {
            return Err(BufferError::LengthMismatch {
                expected: self.frame.len(),
                actual: staged.len(),
            });
        }

        self.frame = staged.into_boxed_slice();
        self.has_frame = true;
        self.generation += 1;
        Ok(())
    }

    /// Whether the pixel at (`x`, `y`) is light, or `None` outside the panel
    pub fn pixel(&self, x: u32, y: u32) -> Option<bool> {
        if x >= self.geometry.width || y >= self.geometry.height {
            return None;
        }

        let bit = y as usize * self.geometry.width as usize + x as usize;
        let byte = self.frame[bit / 8];
        Some((byte >> (7 - bit % 8)) & 1 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len() {
        assert_eq!(DisplayGeometry::default().frame_len(), 5000);
        assert_eq!(DisplayGeometry::new(250, 122).frame_len(), 3813);
        assert_eq!(DisplayGeometry::new(3, 3).frame_len(), 2);
    }

    #[test]
    fn test_new_buffer_is_blank() {
        let buffer = ImageBuffer::new(DisplayGeometry::default());
        assert!(!buffer.has_frame());
        assert_eq!(buffer.generation(), 0);
        assert!(buffer.as_bytes().iter().all(|b| *b == 0xFF));
    }

    #[test]
    fn test_commit_replaces_frame() {
        let mut buffer = ImageBuffer::new(DisplayGeometry::new(16, 2));
        buffer.commit(vec![0x00, 0x0F, 0xF0, 0xAA]).unwrap();

        assert!(buffer.has_frame());
        assert_eq!(buffer.generation(), 1);
        assert_eq!(buffer.as_bytes(), &[0x00, 0x0F, 0xF0, 0xAA]);
    }

    #[test]
    fn test_wrong_length_commit_keeps_previous_frame() {
        let mut buffer = ImageBuffer::new(DisplayGeometry::new(16, 2));
        buffer.commit(vec![0x12, 0x34, 0x56, 0x78]).unwrap();

        let result = buffer.commit(vec![0x00; 3]);
        assert_eq!(
            result,
            Err(BufferError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(buffer.as_bytes(), &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(buffer.generation(), 1);
    }

    #[test]
    fn test_pixel_is_msb_first_row_major() {
        let mut buffer = ImageBuffer::new(DisplayGeometry::new(8, 2));
        buffer.commit(vec![0b1000_0001, 0b0100_0000]).unwrap();

        assert_eq!(buffer.pixel(0, 0), Some(true));
        assert_eq!(buffer.pixel(1, 0), Some(false));
        assert_eq!(buffer.pixel(7, 0), Some(true));
        assert_eq!(buffer.pixel(1, 1), Some(true));
        assert_eq!(buffer.pixel(0, 1), Some(false));
        assert_eq!(buffer.pixel(8, 0), None);
        assert_eq!(buffer.pixel(0, 2), None);
    }
}
