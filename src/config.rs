//! Configuration for workflow controllers.
//!
//! Every knob a controller needs lives in [`WorkflowConfig`], built via
//! [`WorkflowConfigBuilder`]. The CLI maps its flags (and `FILENODE_*`
//! environment variables) onto the builder; library users set only what they
//! care about and rely on the defaults for the rest.

use crate::error::WorkflowError;
use crate::ops::image::ImageTarget;
use crate::progress::ProgressAnimation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration shared by every run of a [`crate::workflow::Workflow`].
///
/// # Example
/// ```rust
/// use filenode::WorkflowConfig;
///
/// let config = WorkflowConfig::builder()
///     .work_dir("/tmp/filenode")
///     .jpeg_quality(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.jpeg_quality, 60);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Directory the fixed, tool-specific output files are written to.
    /// Default: the current directory.
    pub work_dir: PathBuf,

    /// Progress added per animation tick. Range: (0, 1]. Default: 0.01.
    pub progress_step: f32,

    /// Delay between animation ticks in milliseconds. Default: 30.
    ///
    /// With the default step the bar takes about three seconds to fill,
    /// whatever the real operation does.
    pub progress_tick_ms: u64,

    /// JPEG quality used by the image size reducer. Range: 1–100. Default: 70.
    pub jpeg_quality: u8,

    /// Target format of the image format converter. Default: PNG.
    pub image_target: ImageTarget,

    /// LibreOffice binary used for DOCX → PDF. Default: `soffice` on `PATH`.
    pub soffice: PathBuf,

    /// Bounding box of page thumbnails in pixels. Default: 350 × 500.
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,

    /// Longest edge of image thumbnails in pixels. Default: 320.
    pub image_thumbnail_edge: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            progress_step: 0.01,
            progress_tick_ms: 30,
            jpeg_quality: 70,
            image_target: ImageTarget::default(),
            soffice: PathBuf::from("soffice"),
            thumbnail_width: 350,
            thumbnail_height: 500,
            image_thumbnail_edge: 320,
        }
    }
}

impl WorkflowConfig {
    /// Create a new builder for `WorkflowConfig`.
    pub fn builder() -> WorkflowConfigBuilder {
        WorkflowConfigBuilder {
            config: Self::default(),
        }
    }

    /// The progress animation described by this configuration.
    pub fn animation(&self) -> ProgressAnimation {
        ProgressAnimation::new(
            self.progress_step,
            Duration::from_millis(self.progress_tick_ms),
        )
    }
}

/// Builder for [`WorkflowConfig`].
#[derive(Debug)]
pub struct WorkflowConfigBuilder {
    config: WorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn progress_step(mut self, step: f32) -> Self {
        self.config.progress_step = step;
        self
    }

    pub fn progress_tick_ms(mut self, ms: u64) -> Self {
        self.config.progress_tick_ms = ms;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality;
        self
    }

    pub fn image_target(mut self, target: ImageTarget) -> Self {
        self.config.image_target = target;
        self
    }

    pub fn soffice(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.soffice = path.into();
        self
    }

    pub fn thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.config.thumbnail_width = width.max(16);
        self.config.thumbnail_height = height.max(16);
        self
    }

    pub fn image_thumbnail_edge(mut self, px: u32) -> Self {
        self.config.image_thumbnail_edge = px.max(16);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<WorkflowConfig, WorkflowError> {
        let c = &self.config;
        if !(c.progress_step > 0.0 && c.progress_step <= 1.0) {
            return Err(WorkflowError::InvalidConfig(format!(
                "Progress step must be in (0, 1], got {}",
                c.progress_step
            )));
        }
        if c.progress_tick_ms == 0 {
            return Err(WorkflowError::InvalidConfig(
                "Progress tick must be ≥ 1 ms".into(),
            ));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(WorkflowError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.soffice.as_os_str().is_empty() {
            return Err(WorkflowError::InvalidConfig(
                "Converter path must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_desktop_tool() {
        let c = WorkflowConfig::default();
        assert_eq!(c.jpeg_quality, 70);
        assert_eq!(c.progress_tick_ms, 30);
        assert!((c.progress_step - 0.01).abs() < f32::EPSILON);
        assert_eq!(c.image_target, ImageTarget::Png);
        assert_eq!(c.work_dir, PathBuf::from("."));
        assert_eq!((c.thumbnail_width, c.thumbnail_height), (350, 500));
        assert_eq!(c.image_thumbnail_edge, 320);
    }

    #[test]
    fn builder_rejects_zero_tick() {
        let err = WorkflowConfig::builder().progress_tick_ms(0).build();
        assert!(matches!(err, Err(WorkflowError::InvalidConfig(_))));
    }

    #[test]
    fn builder_rejects_bad_step() {
        assert!(WorkflowConfig::builder().progress_step(0.0).build().is_err());
        assert!(WorkflowConfig::builder().progress_step(1.5).build().is_err());
        assert!(WorkflowConfig::builder().progress_step(f32::NAN).build().is_err());
        assert!(WorkflowConfig::builder().progress_step(1.0).build().is_ok());
    }

    #[test]
    fn builder_rejects_bad_quality() {
        assert!(WorkflowConfig::builder().jpeg_quality(0).build().is_err());
        assert!(WorkflowConfig::builder().jpeg_quality(101).build().is_err());
    }

    #[test]
    fn thumbnail_sizes_are_floored() {
        let c = WorkflowConfig::builder()
            .thumbnail_size(1, 2)
            .build()
            .unwrap();
        assert_eq!((c.thumbnail_width, c.thumbnail_height), (16, 16));
    }

    #[test]
    fn animation_uses_configured_cadence() {
        let c = WorkflowConfig::builder()
            .progress_step(0.25)
            .progress_tick_ms(5)
            .build()
            .unwrap();
        let a = c.animation();
        assert_eq!(a.steps(), 4);
        assert_eq!(a.tick(), Duration::from_millis(5));
    }
}
