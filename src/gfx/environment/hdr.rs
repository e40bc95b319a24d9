// src/gfx/environment/hdr.rs
//! Radiance HDR (.hdr) decoding
//!
//! Decodes RGBE-encoded Radiance panoramas from an in-memory buffer,
//! including new-style RLE scanlines, into linear RGB32F pixels.

use std::io::{BufRead, Cursor, Read};

use crate::error::ViewerError;

/// Decoded HDR image, linear RGB32F, row-major, 3 components per pixel.
#[derive(Debug, Clone)]
pub struct HdrImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl HdrImage {
    pub fn pixel_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    /// Expands to RGBA half floats for texture upload, alpha forced to 1.
    pub fn to_rgba_f16(&self) -> Vec<half::f16> {
        let mut rgba = Vec::with_capacity(self.pixel_count() * 4);
        for pixel in self.data.chunks_exact(3) {
            rgba.push(half::f16::from_f32(pixel[0]));
            rgba.push(half::f16::from_f32(pixel[1]));
            rgba.push(half::f16::from_f32(pixel[2]));
            rgba.push(half::f16::ONE);
        }
        rgba
    }
}

/// Decodes a Radiance HDR buffer.
pub fn decode_hdr(bytes: &[u8]) -> Result<HdrImage, ViewerError> {
    let mut reader = Cursor::new(bytes);
    let (width, height) = parse_header(&mut reader)?;
    let rgbe = read_scanlines(&mut reader, width, height)?;

    let mut data = Vec::with_capacity(rgbe.len() * 3);
    for &[r, g, b, e] in &rgbe {
        let (rf, gf, bf) = rgbe_to_rgb(r, g, b, e);
        data.push(rf);
        data.push(gf);
        data.push(bf);
    }

    Ok(HdrImage {
        width,
        height,
        data,
    })
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<(u32, u32), ViewerError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| ViewerError::HdrDecode(format!("header read failed: {e}")))?;

    if !line.starts_with("#?RADIANCE") && !line.starts_with("#?RGBE") {
        return Err(ViewerError::HdrDecode("missing magic header".to_string()));
    }

    // Header lines up to the blank separator; only the FORMAT line matters.
    let mut format_found = false;
    line.clear();
    while reader
        .read_line(&mut line)
        .map_err(|e| ViewerError::HdrDecode(format!("header read failed: {e}")))?
        > 0
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }
        if let Some(format) = trimmed.strip_prefix("FORMAT=") {
            if format != "32-bit_rle_rgbe" {
                return Err(ViewerError::HdrDecode(format!(
                    "unsupported format: {format}"
                )));
            }
            format_found = true;
        }
        line.clear();
    }
    if !format_found {
        return Err(ViewerError::HdrDecode(
            "missing FORMAT specification".to_string(),
        ));
    }

    // Resolution line, e.g. "-Y 1024 +X 2048".
    line.clear();
    reader
        .read_line(&mut line)
        .map_err(|e| ViewerError::HdrDecode(format!("resolution read failed: {e}")))?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() != 4 || !parts[0].ends_with('Y') || !parts[2].ends_with('X') {
        return Err(ViewerError::HdrDecode(format!(
            "invalid resolution line: {}",
            line.trim()
        )));
    }
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| ViewerError::HdrDecode(format!("invalid height: {}", parts[1])))?;
    let width: u32 = parts[3]
        .parse()
        .map_err(|_| ViewerError::HdrDecode(format!("invalid width: {}", parts[3])))?;
    if width == 0 || height == 0 {
        return Err(ViewerError::HdrDecode(
            "image dimensions cannot be zero".to_string(),
        ));
    }
    Ok((width, height))
}

fn read_scanlines<R: Read>(
    reader: &mut R,
    width: u32,
    height: u32,
) -> Result<Vec<[u8; 4]>, ViewerError> {
    let mut rgbe = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        rgbe.extend(read_scanline(reader, width, y)?);
    }
    Ok(rgbe)
}

fn read_scanline<R: Read>(
    reader: &mut R,
    width: u32,
    y: u32,
) -> Result<Vec<[u8; 4]>, ViewerError> {
    let mut header = [0u8; 4];
    reader
        .read_exact(&mut header)
        .map_err(|e| ViewerError::HdrDecode(format!("truncated scanline at row {y}: {e}")))?;

    // New-style RLE scanlines start with 2, 2, then the width.
    if header[0] == 2
        && header[1] == 2
        && header[2] == ((width >> 8) & 0xFF) as u8
        && header[3] == (width & 0xFF) as u8
    {
        read_rle_scanline(reader, width)
    } else {
        let mut scanline = vec![[0u8; 4]; width as usize];
        scanline[0] = header;
        for pixel in scanline.iter_mut().skip(1) {
            reader
                .read_exact(pixel)
                .map_err(|e| ViewerError::HdrDecode(format!("truncated pixel at row {y}: {e}")))?;
        }
        Ok(scanline)
    }
}

fn read_rle_scanline<R: Read>(reader: &mut R, width: u32) -> Result<Vec<[u8; 4]>, ViewerError> {
    let mut scanline = vec![[0u8; 4]; width as usize];

    // Each RGBE component is run-length coded separately.
    for component in 0..4 {
        let mut pos = 0usize;
        while pos < width as usize {
            let mut run_info = [0u8; 1];
            reader
                .read_exact(&mut run_info)
                .map_err(|e| ViewerError::HdrDecode(format!("truncated RLE run: {e}")))?;

            let run_length = run_info[0];
            if run_length > 128 {
                let repeat = (run_length - 128) as usize;
                if pos + repeat > width as usize {
                    return Err(ViewerError::HdrDecode(
                        "RLE run exceeds scanline width".to_string(),
                    ));
                }
                let mut value = [0u8; 1];
                reader
                    .read_exact(&mut value)
                    .map_err(|e| ViewerError::HdrDecode(format!("truncated RLE value: {e}")))?;
                for i in 0..repeat {
                    scanline[pos + i][component] = value[0];
                }
                pos += repeat;
            } else {
                let copy = run_length as usize;
                if pos + copy > width as usize {
                    return Err(ViewerError::HdrDecode(
                        "literal run exceeds scanline width".to_string(),
                    ));
                }
                for i in 0..copy {
                    let mut value = [0u8; 1];
                    reader.read_exact(&mut value).map_err(|e| {
                        ViewerError::HdrDecode(format!("truncated literal value: {e}"))
                    })?;
                    scanline[pos + i][component] = value[0];
                }
                pos += copy;
            }
        }
    }
    Ok(scanline)
}

/// Shared-exponent RGBE to linear RGB.
#[inline]
fn rgbe_to_rgb(r: u8, g: u8, b: u8, e: u8) -> (f32, f32, f32) {
    if e == 0 {
        (0.0, 0.0, 0.0)
    } else {
        let exp = 2.0f32.powi((e as i32) - 128 - 8);
        ((r as f32) * exp, (g as f32) * exp, (b as f32) * exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_flat(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"#?RADIANCE\n");
        bytes.extend_from_slice(b"FORMAT=32-bit_rle_rgbe\n");
        bytes.extend_from_slice(b"\n");
        bytes.extend_from_slice(format!("-Y {height} +X {width}\n").as_bytes());
        for _ in 0..(width * height) {
            bytes.extend_from_slice(&pixel);
        }
        bytes
    }

    #[test]
    fn test_rgbe_to_rgb_zero_exponent_is_black() {
        assert_eq!(rgbe_to_rgb(255, 255, 255, 0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_rgbe_to_rgb_known_values() {
        // e = 128 gives multiplier 2^-8 = 1/256.
        let (r, _, _) = rgbe_to_rgb(128, 128, 128, 128);
        assert!((r - 0.5).abs() < 1e-6);

        // e = 140 gives multiplier 2^4 = 16.
        let (r, g, b) = rgbe_to_rgb(255, 128, 64, 140);
        assert!((r - 4080.0).abs() < 1e-3);
        assert!((g - 2048.0).abs() < 1e-3);
        assert!((b - 1024.0).abs() < 1e-3);
    }

    #[test]
    fn test_decode_uncompressed_image() {
        let bytes = encode_flat(4, 2, [128, 64, 32, 129]);
        let image = decode_hdr(&bytes).unwrap();
        assert_eq!(image.width, 4);
        assert_eq!(image.height, 2);
        assert_eq!(image.data.len(), 4 * 2 * 3);

        // e = 129 gives multiplier 2^-7 = 1/128.
        assert!((image.data[0] - 1.0).abs() < 1e-6);
        assert!((image.data[1] - 0.5).abs() < 1e-6);
        assert!((image.data[2] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rle_image() {
        // One 4-pixel scanline, each component a single run of length 4.
        let width: u32 = 4;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"#?RADIANCE\n");
        bytes.extend_from_slice(b"FORMAT=32-bit_rle_rgbe\n\n");
        bytes.extend_from_slice(format!("-Y 1 +X {width}\n").as_bytes());
        bytes.extend_from_slice(&[2, 2, 0, width as u8]);
        for value in [128u8, 64, 32, 128] {
            bytes.extend_from_slice(&[128 + 4, value]);
        }

        let image = decode_hdr(&bytes).unwrap();
        assert_eq!(image.pixel_count(), 4);
        for pixel in image.data.chunks_exact(3) {
            assert!((pixel[0] - 0.5).abs() < 1e-6);
            assert!((pixel[1] - 0.25).abs() < 1e-6);
            assert!((pixel[2] - 0.125).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_bad_magic_and_format() {
        assert!(matches!(
            decode_hdr(b"PNG whatever"),
            Err(ViewerError::HdrDecode(_))
        ));

        let bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_xyze\n\n-Y 1 +X 1\n".to_vec();
        assert!(decode_hdr(&bytes).is_err());
    }

    #[test]
    fn test_rejects_truncated_pixels() {
        let mut bytes = encode_flat(2, 2, [10, 10, 10, 130]);
        bytes.truncate(bytes.len() - 6);
        assert!(decode_hdr(&bytes).is_err());
    }

    #[test]
    fn test_to_rgba_f16_appends_alpha() {
        let image = HdrImage {
            width: 1,
            height: 1,
            data: vec![1.0, 0.5, 0.25],
        };
        let rgba = image.to_rgba_f16();
        assert_eq!(rgba.len(), 4);
        assert_eq!(rgba[3], half::f16::ONE);
        assert!((rgba[1].to_f32() - 0.5).abs() < 1e-3);
    }
}
