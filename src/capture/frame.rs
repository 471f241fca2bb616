//! Reference frame loading
//!
//! Still images are decoded directly. Anything else is treated as a video and
//! a single frame is pulled through GStreamer.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::domain::MediaDimensions;

/// The media file chosen for analysis and the frame zones are drawn on
#[derive(Clone, Debug)]
pub struct ReferenceFrame {
    pub path: PathBuf,
    pub image: RgbaImage,
}

impl ReferenceFrame {
    pub fn dims(&self) -> MediaDimensions {
        MediaDimensions::new(self.image.width(), self.image.height())
    }
}

/// Load the reference frame for `path`
pub fn load_reference_frame(path: &Path) -> Result<ReferenceFrame> {
    let image = if image::ImageFormat::from_path(path).is_ok() {
        image::open(path)
            .with_context(|| format!("Failed to decode image: {}", path.display()))?
            .to_rgba8()
    } else {
        video::extract_frame(path)?
    };

    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Media has no pixels: {}", path.display());
    }

    log::info!(
        "Loaded reference frame {}x{} from {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(ReferenceFrame {
        path: path.to_path_buf(),
        image,
    })
}

#[cfg(feature = "video")]
mod video {
    use std::path::Path;

    use anyhow::{Context, Result};
    use gstreamer as gst;
    use gstreamer::prelude::*;
    use gstreamer_app as gst_app;
    use gstreamer_video as gst_video;
    use image::RgbaImage;

    /// Offset of the frame used as drawing reference
    const SEEK_OFFSET_MS: u64 = 500;

    /// Sets the pipeline back to Null however extraction ends
    struct PipelineGuard(gst::Pipeline);

    impl Drop for PipelineGuard {
        fn drop(&mut self) {
            if let Err(err) = self.0.set_state(gst::State::Null) {
                log::warn!("Failed to stop frame pipeline: {:?}", err);
            }
        }
    }

    fn bus_error(pipeline: &gst::Pipeline) -> Option<String> {
        let bus = pipeline.bus()?;
        while let Some(msg) = bus.pop() {
            if let gst::MessageView::Error(err) = msg.view() {
                return Some(format!(
                    "{} ({})",
                    err.error(),
                    err.debug().unwrap_or_default()
                ));
            }
        }
        None
    }

    pub fn extract_frame(path: &Path) -> Result<RgbaImage> {
        gst::init().context("Failed to initialize GStreamer")?;

        let absolute = path
            .canonicalize()
            .with_context(|| format!("Media file not found: {}", path.display()))?;
        let uri = gst::glib::filename_to_uri(&absolute, None)
            .with_context(|| format!("Invalid media path: {}", absolute.display()))?;

        let description = format!(
            "uridecodebin uri=\"{}\" ! videoconvert ! video/x-raw,format=RGBA ! appsink name=sink sync=false",
            uri
        );
        let pipeline = gst::parse::launch(&description)
            .context("Failed to build frame pipeline")?
            .downcast::<gst::Pipeline>()
            .map_err(|_| anyhow::anyhow!("Frame pipeline is not a pipeline"))?;
        let pipeline = PipelineGuard(pipeline);

        let appsink = pipeline
            .0
            .by_name("sink")
            .and_then(|e| e.downcast::<gst_app::AppSink>().ok())
            .context("Frame pipeline has no appsink")?;

        pipeline
            .0
            .set_state(gst::State::Paused)
            .map_err(|_| match bus_error(&pipeline.0) {
                Some(msg) => anyhow::anyhow!("Cannot open video: {}", msg),
                None => anyhow::anyhow!("Cannot open video: {}", path.display()),
            })?;
        let (result, _, _) = pipeline.0.state(gst::ClockTime::from_seconds(10));
        result.map_err(|_| match bus_error(&pipeline.0) {
            Some(msg) => anyhow::anyhow!("Cannot decode video: {}", msg),
            None => anyhow::anyhow!("Cannot decode video: {}", path.display()),
        })?;

        if let Err(err) = pipeline.0.seek_simple(
            gst::SeekFlags::FLUSH | gst::SeekFlags::ACCURATE,
            gst::ClockTime::from_mseconds(SEEK_OFFSET_MS),
        ) {
            log::warn!("Seek to {} ms failed, using first frame: {}", SEEK_OFFSET_MS, err);
        }

        let sample = appsink
            .pull_preroll()
            .map_err(|_| anyhow::anyhow!("No frame could be decoded from {}", path.display()))?;
        let caps = sample.caps().context("Decoded frame has no caps")?;
        let info = gst_video::VideoInfo::from_caps(caps).context("Unreadable frame caps")?;
        let buffer = sample.buffer().context("Decoded frame has no buffer")?;
        let map = buffer
            .map_readable()
            .map_err(|_| anyhow::anyhow!("Cannot map decoded frame"))?;

        let (width, height) = (info.width(), info.height());
        let stride = info.stride()[0] as usize;
        let row_bytes = width as usize * 4;
        let data = map.as_slice();

        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            let line = data
                .get(start..start + row_bytes)
                .context("Decoded frame is shorter than its caps")?;
            pixels.extend_from_slice(line);
        }

        log::debug!("Extracted {}x{} frame (stride {})", width, height, stride);
        RgbaImage::from_raw(width, height, pixels).context("Frame buffer size mismatch")
    }
}

#[cfg(not(feature = "video"))]
mod video {
    use std::path::Path;

    use anyhow::Result;
    use image::RgbaImage;

    pub fn extract_frame(path: &Path) -> Result<RgbaImage> {
        anyhow::bail!(
            "Video support is disabled in this build: {}",
            path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_still_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        RgbaImage::from_pixel(64, 36, image::Rgba([9, 8, 7, 255]))
            .save(&path)
            .unwrap();

        let frame = load_reference_frame(&path).unwrap();
        assert_eq!(frame.dims(), MediaDimensions::new(64, 36));
        assert_eq!(frame.path, path);
        assert_eq!(frame.image.get_pixel(10, 10).0, [9, 8, 7, 255]);
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_reference_frame(&dir.path().join("nope.png")).is_err());
        assert!(load_reference_frame(&dir.path().join("nope.mp4")).is_err());
    }
}
