//! Baseline vs. capture comparison

use image::RgbaImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use vrt_core::{ComparisonResult, Dimensions};

use crate::error::{DiffError, Result};
use crate::pixel;

/// A single comparison to run as part of a batch
#[derive(Debug, Clone)]
pub struct DiffJob {
    pub name: String,
    pub baseline_path: PathBuf,
    pub compare_path: PathBuf,
    pub diff_path: PathBuf,
    pub threshold: f64,
}

/// Pixel comparison engine
#[derive(Debug, Clone)]
pub struct DiffEngine {
    workers: usize,
}

impl DiffEngine {
    /// `workers == 0` uses the available parallelism
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            workers
        };
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compare `compare_path` against `baseline_path` and write a diff
    /// image to `diff_path`.
    ///
    /// `threshold` is the per-pixel colour tolerance and also the largest
    /// fraction of differing pixels that still passes. The diff image is
    /// written even when the comparison passes.
    pub fn compare(
        &self,
        name: &str,
        baseline_path: &Path,
        compare_path: &Path,
        diff_path: &Path,
        threshold: f64,
    ) -> Result<ComparisonResult> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(DiffError::InvalidThreshold(threshold));
        }
        for path in [baseline_path, compare_path] {
            if !path.is_file() {
                return Err(DiffError::NotFound(path.to_path_buf()));
            }
        }

        let baseline_bytes = std::fs::read(baseline_path)?;
        let compare_bytes = std::fs::read(compare_path)?;
        let identical = blake3::hash(&baseline_bytes) == blake3::hash(&compare_bytes);

        let baseline = image::load_from_memory(&baseline_bytes)?.to_rgba8();
        let (width, height) = baseline.dimensions();
        let dimensions = Dimensions { width, height };

        let (diff_image, diff_pixels) = if identical {
            debug!("'{}' is byte-identical to its baseline", name);
            (faded_copy(&baseline), 0u64)
        } else {
            let capture = image::load_from_memory(&compare_bytes)?.to_rgba8();
            let (capture_width, capture_height) = capture.dimensions();
            if (capture_width, capture_height) != (width, height) {
                return Err(DiffError::DimensionMismatch {
                    baseline: dimensions,
                    capture: Dimensions {
                        width: capture_width,
                        height: capture_height,
                    },
                });
            }
            classify(&baseline, &capture, threshold)
        };

        write_png(&diff_image, diff_path)?;

        let total = u64::from(width) * u64::from(height);
        let diff_percentage = if total == 0 {
            0.0
        } else {
            diff_pixels as f64 / total as f64
        };

        let result = ComparisonResult::new(
            name,
            baseline_path.to_string_lossy(),
            compare_path.to_string_lossy(),
            diff_percentage,
            threshold,
        )
        .with_diff_path(diff_path.to_string_lossy())
        .with_dimensions(dimensions);

        if !result.passed {
            warn!(
                "Visual change in '{}': {:.4} of pixels differ (threshold {:.4})",
                name, diff_percentage, threshold
            );
        }

        Ok(result)
    }

    /// Run `jobs` on at most `workers` blocking threads.
    ///
    /// Results come back in job order. A job that fails becomes a failed
    /// result; the rest of the batch still runs.
    pub async fn compare_batch(&self, jobs: Vec<DiffJob>) -> Vec<ComparisonResult> {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let permits = Arc::clone(&permits);
            let engine = self.clone();
            let fallback = job.clone();
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await;
                tokio::task::spawn_blocking(move || engine.run_job(&job)).await
            });
            handles.push((fallback, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (job, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(e)) | Err(e) => failed_result(&job, format!("diff worker failed: {}", e)),
            };
            results.push(result);
        }
        results
    }

    fn run_job(&self, job: &DiffJob) -> ComparisonResult {
        match self.compare(
            &job.name,
            &job.baseline_path,
            &job.compare_path,
            &job.diff_path,
            job.threshold,
        ) {
            Ok(result) => result,
            Err(e) => {
                warn!("Comparison failed for '{}' ({}): {}", job.name, e.kind(), e);
                failed_result(job, e.to_string())
            }
        }
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

fn failed_result(job: &DiffJob, error: String) -> ComparisonResult {
    ComparisonResult::failed(
        job.name.clone(),
        job.baseline_path.to_string_lossy(),
        job.compare_path.to_string_lossy(),
        job.threshold,
        error,
    )
}

fn classify(baseline: &RgbaImage, capture: &RgbaImage, tolerance: f64) -> (RgbaImage, u64) {
    let mut diff = RgbaImage::new(baseline.width(), baseline.height());
    let mut count = 0u64;

    for ((x, y, expected), actual) in baseline.enumerate_pixels().zip(capture.pixels()) {
        if pixel::is_different(expected, actual, tolerance) {
            count += 1;
            diff.put_pixel(x, y, pixel::DIFF_COLOR);
        } else {
            diff.put_pixel(x, y, pixel::faded(expected));
        }
    }

    (diff, count)
}

fn faded_copy(baseline: &RgbaImage) -> RgbaImage {
    let mut diff = RgbaImage::new(baseline.width(), baseline.height());
    for (x, y, p) in baseline.enumerate_pixels() {
        diff.put_pixel(x, y, pixel::faded(p));
    }
    diff
}

fn write_png(img: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save_with_format(path, image::ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn save(dir: &TempDir, name: &str, img: &RgbaImage) -> PathBuf {
        let path = dir.path().join(name);
        img.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }

    /// Copy of `img` with the first `n` pixels (row-major) painted black
    fn with_changed(img: &RgbaImage, n: u32) -> RgbaImage {
        let mut out = img.clone();
        for i in 0..n {
            out.put_pixel(i % img.width(), i / img.width(), Rgba([0, 0, 0, 255]));
        }
        out
    }

    #[test]
    fn test_identical_images_pass_with_zero_diff() {
        let dir = TempDir::new().unwrap();
        let img = solid(10, 10, [200, 200, 200, 255]);
        let a = save(&dir, "a.png", &img);
        let b = save(&dir, "b.png", &img);
        let diff = dir.path().join("out/diff.png");

        let result = DiffEngine::new(1).compare("home", &a, &b, &diff, 0.0).unwrap();

        assert_eq!(result.diff_percentage, 0.0);
        assert!(result.passed);
        assert!(diff.exists(), "diff image is always written");
        assert_eq!(
            result.dimensions,
            Some(Dimensions {
                width: 10,
                height: 10
            })
        );
    }

    #[test]
    fn test_same_pixels_different_encoding() {
        let dir = TempDir::new().unwrap();
        let img = solid(4, 4, [10, 20, 30, 255]);
        let a = save(&dir, "a.png", &img);
        // Same pixels, different bytes on disk
        let b = dir.path().join("b.png");
        image::DynamicImage::ImageRgba8(img.clone())
            .to_rgb8()
            .save_with_format(&b, image::ImageFormat::Png)
            .unwrap();

        let result = DiffEngine::new(1)
            .compare("x", &a, &b, &dir.path().join("d.png"), 0.0)
            .unwrap();
        assert_eq!(result.diff_percentage, 0.0);
    }

    #[test]
    fn test_diff_percentage_monotonic() {
        let dir = TempDir::new().unwrap();
        let base = solid(10, 10, [255, 255, 255, 255]);
        let a = save(&dir, "base.png", &base);
        let engine = DiffEngine::new(1);

        let mut last = 0.0;
        for n in [0, 1, 5, 25, 50, 100] {
            let b = save(&dir, &format!("c{}.png", n), &with_changed(&base, n));
            let result = engine
                .compare("m", &a, &b, &dir.path().join(format!("d{}.png", n)), 0.1)
                .unwrap();
            assert!(result.diff_percentage >= last);
            assert_eq!(result.diff_percentage, f64::from(n) / 100.0);
            assert_eq!(result.passed, result.diff_percentage <= 0.1);
            last = result.diff_percentage;
        }
    }

    #[test]
    fn test_dimension_mismatch_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let a = save(&dir, "a.png", &solid(10, 10, [0, 0, 0, 255]));
        let b = save(&dir, "b.png", &solid(12, 10, [0, 0, 0, 255]));

        let err = DiffEngine::new(1)
            .compare("x", &a, &b, &dir.path().join("d.png"), 0.1)
            .unwrap_err();
        assert!(matches!(err, DiffError::DimensionMismatch { .. }));
        assert_eq!(err.kind(), vrt_core::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = TempDir::new().unwrap();
        let a = save(&dir, "a.png", &solid(2, 2, [0, 0, 0, 255]));
        let missing = dir.path().join("missing.png");

        let err = DiffEngine::new(1)
            .compare("x", &a, &missing, &dir.path().join("d.png"), 0.1)
            .unwrap_err();
        assert_eq!(err.kind(), vrt_core::ErrorKind::NotFound);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        let dir = TempDir::new().unwrap();
        let a = save(&dir, "a.png", &solid(2, 2, [0, 0, 0, 255]));
        let err = DiffEngine::new(1)
            .compare("x", &a, &a, &dir.path().join("d.png"), 1.5)
            .unwrap_err();
        assert!(matches!(err, DiffError::InvalidThreshold(_)));
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let base = solid(10, 10, [255, 255, 255, 255]);
        let a = save(&dir, "a.png", &base);
        let changed = save(&dir, "b.png", &with_changed(&base, 50));

        let job = |name: &str, compare: PathBuf| DiffJob {
            name: name.to_string(),
            baseline_path: a.clone(),
            compare_path: compare,
            diff_path: dir.path().join(format!("diff/{}.png", name)),
            threshold: 0.1,
        };

        let results = DiffEngine::new(2)
            .compare_batch(vec![
                job("same", a.clone()),
                job("missing", dir.path().join("nope.png")),
                job("changed", changed.clone()),
            ])
            .await;

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["same", "missing", "changed"]);
        assert!(results[0].passed);
        assert!(results[1].is_error());
        assert!(!results[1].passed);
        assert!(!results[2].passed);
        assert_eq!(results[2].diff_percentage, 0.5);
    }
}
