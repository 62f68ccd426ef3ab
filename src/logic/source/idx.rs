//! MNIST IDX loader
//!
//! Big-endian IDX format: magic (0x00000803 images / 0x00000801 labels),
//! dimension sizes as u32, then raw u8 data. Pixels are scaled to [0, 1].

use std::fs;
use std::path::Path;

use crate::error::{MonitorError, Result};

pub const IMAGES_FILE: &str = "t10k-images-idx3-ubyte";
pub const LABELS_FILE: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

/// In-memory image dataset
#[derive(Debug, Clone)]
pub struct IdxDataset {
    pub rows: usize,
    pub cols: usize,
    pub images: Vec<Vec<f32>>,
    pub labels: Vec<u8>,
}

impl IdxDataset {
    /// Load the MNIST test split from `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        Self::load(&dir.join(IMAGES_FILE), &dir.join(LABELS_FILE))
    }

    pub fn load(images_path: &Path, labels_path: &Path) -> Result<Self> {
        log::info!("Loading IDX dataset: {}", images_path.display());
        let images = fs::read(images_path)?;
        let labels = fs::read(labels_path)?;
        let dataset = Self::parse(&images, &labels)?;
        log::info!(
            "Loaded {} samples ({}x{})",
            dataset.len(),
            dataset.rows,
            dataset.cols
        );
        Ok(dataset)
    }

    pub fn parse(images: &[u8], labels: &[u8]) -> Result<Self> {
        let mut reader = IdxReader::new(images);
        reader.expect_magic(IMAGES_MAGIC)?;
        let count = reader.read_u32()? as usize;
        let rows = reader.read_u32()? as usize;
        let cols = reader.read_u32()? as usize;
        let total = count
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .ok_or_else(|| MonitorError::Dataset("IDX dimensions overflow".to_string()))?;
        let pixels = reader.take(total)?;

        let mut label_reader = IdxReader::new(labels);
        label_reader.expect_magic(LABELS_MAGIC)?;
        let label_count = label_reader.read_u32()? as usize;
        if label_count != count {
            return Err(MonitorError::Dataset(format!(
                "{} images but {} labels",
                count, label_count
            )));
        }
        let labels = label_reader.take(label_count)?.to_vec();

        let size = rows * cols;
        let images = if size == 0 {
            vec![Vec::new(); count]
        } else {
            pixels
                .chunks_exact(size)
                .map(|img| img.iter().map(|&p| f32::from(p) / 255.0).collect())
                .collect()
        };

        Ok(Self { rows, cols, images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Counts of all pixel values over `bins` equal-width buckets of [0, 1]
    pub fn pixel_histogram(&self, bins: usize) -> Vec<u64> {
        let mut counts = vec![0u64; bins];
        if bins == 0 {
            return counts;
        }
        for &pixel in self.images.iter().flatten() {
            let bin = ((pixel * bins as f32) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        counts
    }
}

/// Column labels for `IdxDataset::pixel_histogram`, e.g. "0.0-0.1"
pub fn pixel_bin_labels(bins: usize) -> Vec<String> {
    let width = 1.0 / bins as f32;
    (0..bins)
        .map(|i| format!("{:.1}-{:.1}", i as f32 * width, (i + 1) as f32 * width))
        .collect()
}

struct IdxReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> IdxReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len).filter(|&end| end <= self.data.len());
        let end = end.ok_or_else(|| {
            MonitorError::Dataset(format!(
                "truncated IDX data: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.data.len()
            ))
        })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn expect_magic(&mut self, magic: u32) -> Result<()> {
        let found = self.read_u32()?;
        if found != magic {
            return Err(MonitorError::Dataset(format!(
                "bad IDX magic {:#010x}, expected {:#010x}",
                found, magic
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn encode(images: &[[u8; 4]], labels: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut img = Vec::new();
        img.extend_from_slice(&IMAGES_MAGIC.to_be_bytes());
        img.extend_from_slice(&(images.len() as u32).to_be_bytes());
        img.extend_from_slice(&2u32.to_be_bytes());
        img.extend_from_slice(&2u32.to_be_bytes());
        for image in images {
            img.extend_from_slice(image);
        }

        let mut lbl = Vec::new();
        lbl.extend_from_slice(&LABELS_MAGIC.to_be_bytes());
        lbl.extend_from_slice(&(labels.len() as u32).to_be_bytes());
        lbl.extend_from_slice(labels);
        (img, lbl)
    }

    #[test]
    fn test_parse_two_images() {
        let (img, lbl) = encode(&[[0, 255, 0, 255], [255, 255, 0, 0]], &[7, 2]);
        let dataset = IdxDataset::parse(&img, &lbl).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!((dataset.rows, dataset.cols), (2, 2));
        assert_eq!(dataset.images[0], vec![0.0, 1.0, 0.0, 1.0]);
        assert_eq!(dataset.labels, vec![7, 2]);
    }

    #[test]
    fn test_pixel_histogram() {
        let (img, lbl) = encode(&[[0, 255, 128, 25]], &[3]);
        let dataset = IdxDataset::parse(&img, &lbl).unwrap();

        assert_eq!(dataset.pixel_histogram(10), vec![2, 0, 0, 0, 0, 1, 0, 0, 0, 1]);
        assert_eq!(dataset.pixel_histogram(2), vec![2, 2]);
        assert!(dataset.pixel_histogram(0).is_empty());
    }

    #[test]
    fn test_pixel_bin_labels() {
        assert_eq!(pixel_bin_labels(2), vec!["0.0-0.5", "0.5-1.0"]);
        assert_eq!(pixel_bin_labels(10)[9], "0.9-1.0");
    }

    #[test]
    fn test_bad_magic() {
        let (mut img, lbl) = encode(&[[0; 4]], &[1]);
        img[3] = 0x01;
        let err = IdxDataset::parse(&img, &lbl).unwrap_err();
        assert!(err.to_string().contains("bad IDX magic"));
    }

    #[test]
    fn test_truncated() {
        let (img, lbl) = encode(&[[0; 4], [1; 4]], &[1, 2]);
        let err = IdxDataset::parse(&img[..img.len() - 1], &lbl).unwrap_err();
        assert!(matches!(err, MonitorError::Dataset(_)));
    }

    #[test]
    fn test_label_count_mismatch() {
        let (img, lbl) = encode(&[[0; 4], [1; 4]], &[1]);
        assert!(IdxDataset::parse(&img, &lbl).is_err());
    }

    #[test]
    fn test_load_dir() {
        let dir = tempdir().unwrap();
        let (img, lbl) = encode(&[[10; 4]], &[4]);
        fs::write(dir.path().join(IMAGES_FILE), img).unwrap();
        fs::write(dir.path().join(LABELS_FILE), lbl).unwrap();

        let dataset = IdxDataset::load_dir(dir.path()).unwrap();
        assert_eq!(dataset.labels, vec![4]);
    }

    #[test]
    fn test_load_dir_missing() {
        let dir = tempdir().unwrap();
        assert!(matches!(IdxDataset::load_dir(dir.path()), Err(MonitorError::Io(_))));
    }
}
