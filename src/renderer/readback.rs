use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use image::RgbaImage;

/// Row pitch for texture-to-buffer copies, rounded up to wgpu's copy alignment.
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Map a `MAP_READ` buffer and copy its first `size` bytes out.
pub fn map_readback_buffer(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    size: u64,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let slice = buffer.slice(0..size);
    let (tx, rx) = crossbeam_channel::bounded(1);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });

    let deadline = Instant::now() + timeout;
    let mapped = loop {
        let _ = device.poll(wgpu::PollType::Poll);
        if let Ok(result) = rx.try_recv() {
            break result;
        }
        if Instant::now() >= deadline {
            buffer.unmap();
            bail!("timed out after {timeout:?} waiting for GPU readback");
        }
        std::thread::sleep(Duration::from_millis(1));
    };
    if let Err(e) = mapped {
        buffer.unmap();
        return Err(anyhow!("failed to map readback buffer: {e}"));
    }

    let view = slice.get_mapped_range();
    let bytes = view.to_vec();
    drop(view);
    buffer.unmap();
    Ok(bytes)
}

/// Strip row padding from a readback into a tightly packed image.
pub fn unpad_rows(data: &[u8], width: u32, height: u32, padded_row: u32) -> Result<RgbaImage> {
    let row = width as usize * 4;
    let padded = padded_row as usize;
    if padded < row || data.len() < padded * height as usize {
        bail!(
            "readback of {} bytes too small for {width}x{height} with row pitch {padded_row}",
            data.len()
        );
    }
    let mut pixels = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(padded).take(height as usize) {
        pixels.extend_from_slice(&chunk[..row]);
    }
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| anyhow!("readback size mismatch for {width}x{height}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_aligned() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(1), 256);
    }

    #[test]
    fn unpadding_drops_row_tails() {
        let padded = 256u32;
        let mut data = vec![0xAAu8; padded as usize * 2];
        data[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let img = unpad_rows(&data, 2, 2, padded).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [5, 6, 7, 8]);
        assert_eq!(img.get_pixel(0, 1).0, [9, 10, 11, 12]);
    }

    #[test]
    fn short_readback_is_an_error() {
        assert!(unpad_rows(&[0; 100], 2, 2, 256).is_err());
    }
}
