//! Frame presenters for a host without a panel

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use inkframe_state::{FramePresenter, ImageBuffer, PresentError};
use tracing::{debug, info};

/// Encode a frame as a binary PBM (P4) image
///
/// PBM marks dark pixels with set bits, the opposite of the panel
/// encoding, so every byte is inverted. Rows are padded to whole bytes.
pub fn encode_pbm<W: Write>(frame: &ImageBuffer, out: &mut W) -> std::io::Result<()> {
    let geometry = frame.geometry();
    write!(out, "P4\n{} {}\n", geometry.width, geometry.height)?;

    if geometry.width % 8 == 0 {
        let inverted: Vec<u8> = frame.as_bytes().iter().map(|b| !b).collect();
        return out.write_all(&inverted);
    }

    let row_len = (geometry.width as usize).div_ceil(8);
    let mut row = vec![0u8; row_len];
    for y in 0..geometry.height {
        row.iter_mut().for_each(|b| *b = 0);
        for x in 0..geometry.width {
            if frame.pixel(x, y) == Some(false) {
                row[x as usize / 8] |= 0x80 >> (x % 8);
            }
        }
        out.write_all(&row)?;
    }
    Ok(())
}

/// Writes every presented frame to a PBM file
#[derive(Debug)]
pub struct PbmPresenter {
    path: PathBuf,
}

impl PbmPresenter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FramePresenter for PbmPresenter {
    fn present(&mut self, frame: &ImageBuffer) -> Result<(), PresentError> {
        // Staged beside the target, then renamed into place.
        let staging = self.path.with_extension("pbm.tmp");
        let mut encoded = Vec::with_capacity(frame.frame_len() + 16);
        encode_pbm(frame, &mut encoded)?;
        fs::write(&staging, &encoded)?;
        fs::rename(&staging, &self.path)?;

        info!(path = %self.path.display(), generation = frame.generation(), "frame written");
        Ok(())
    }
}

/// Only logs a summary of each frame
#[derive(Debug, Default)]
pub struct LogPresenter {
    presented: u64,
}

impl LogPresenter {
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl FramePresenter for LogPresenter {
    fn present(&mut self, frame: &ImageBuffer) -> Result<(), PresentError> {
        self.presented += 1;
        let dark = frame
            .as_bytes()
            .iter()
            .map(|b| b.count_zeros() as u64)
            .sum::<u64>();
        let geometry = frame.geometry();
        debug!(
            width = geometry.width,
            height = geometry.height,
            dark_bits = dark,
            "frame summary"
        );
        info!(generation = frame.generation(), "frame presented");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkframe_state::DisplayGeometry;

    fn committed(geometry: DisplayGeometry, bytes: Vec<u8>) -> ImageBuffer {
        let mut buffer = ImageBuffer::new(geometry);
        buffer.commit(bytes).unwrap();
        buffer
    }

    #[test]
    fn test_encode_byte_aligned() {
        let frame = committed(DisplayGeometry::new(16, 2), vec![0xFF, 0x00, 0xF0, 0x0F]);
        let mut out = Vec::new();
        encode_pbm(&frame, &mut out).unwrap();

        let header = b"P4\n16 2\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[0x00, 0xFF, 0x0F, 0xF0]);
    }

    #[test]
    fn test_encode_pads_rows() {
        // 3x2 panel: bits 0-2 are row 0, bits 3-5 row 1
        // row 0 = light, dark, light; row 1 = dark, dark, light
        let frame = committed(DisplayGeometry::new(3, 2), vec![0b1010_0100]);
        let mut out = Vec::new();
        encode_pbm(&frame, &mut out).unwrap();

        let header = b"P4\n3 2\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[0b0100_0000, 0b1100_0000]);
    }

    #[test]
    fn test_log_presenter_counts() {
        let frame = ImageBuffer::new(DisplayGeometry::new(8, 1));
        let mut presenter = LogPresenter::default();
        presenter.present(&frame).unwrap();
        presenter.present(&frame).unwrap();
        assert_eq!(presenter.presented(), 2);
    }
}
