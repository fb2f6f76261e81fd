//! Fixture helpers shared by the unit tests.

use crate::container::ContainerSink;
use image::{GrayImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn encode_rgb_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

pub fn encode_gray_png(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, _| image::Luma([(x % 256) as u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn encode_gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = GrayImage::from_fn(width, height, |x, y| image::Luma([((x + y) * 9 % 256) as u8]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

pub fn encode_rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Lay out `<root>/output/fetch.json`, `<root>/output/rows.csv` and the
/// `<root>/data/train/` asset folder. Returns `(data_dir, output_dir)`.
pub fn write_dataset(root: &Path, rows: &str) -> (PathBuf, PathBuf) {
    let data_dir = root.join("data");
    let output_dir = root.join("output");
    std::fs::create_dir_all(data_dir.join("train")).unwrap();
    std::fs::create_dir_all(&output_dir).unwrap();

    std::fs::write(
        output_dir.join("fetch.json"),
        r#"{"categories": ["tacos", "burrito"], "index": {"tacos": 0, "burrito": 1}, "file": "rows.csv", "data": "train"}"#,
    )
    .unwrap();
    std::fs::write(output_dir.join("rows.csv"), rows).unwrap();
    (data_dir, output_dir)
}

pub fn write_asset(data_dir: &Path, relative: &str, bytes: &[u8]) {
    let path = data_dir.join("train").join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// In-memory container sink that refuses bytes past `limit`. Clones share the
/// same buffer so tests can look at what was kept.
#[derive(Debug, Clone)]
pub struct LimitedSink {
    bytes: Arc<Mutex<Vec<u8>>>,
    limit: usize,
}

impl LimitedSink {
    pub fn new(limit: usize) -> Self {
        Self { bytes: Arc::default(), limit }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.lock().unwrap().clone()
    }
}

impl Write for LimitedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap();
        let room = self.limit.saturating_sub(bytes.len());
        if room == 0 {
            return Err(std::io::Error::other("no space left on device"));
        }
        let n = buf.len().min(room);
        bytes.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl ContainerSink for LimitedSink {
    fn truncate_to(&mut self, len: u64) -> std::io::Result<()> {
        self.bytes.lock().unwrap().truncate(len as usize);
        Ok(())
    }
}
