//! Geometric types for media-space coordinates and pointer mapping
//!
//! All zone geometry is stored in media space: native pixels of the reference
//! frame, independent of how large the frame is drawn on screen.

use serde::{Deserialize, Serialize};

/// A point in media space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Midpoint of the segment between two points
    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }
}

/// Native resolution of the reference frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for MediaDimensions {
    fn default() -> Self {
        // Placeholder canvas until a video is loaded
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl MediaDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if a point lies inside the frame (edges included)
    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.width as f32 && p.y <= self.height as f32
    }
}

/// How the rendered frame fills its on-screen box
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Frame is stretched to the whole box; each axis scales on its own
    #[default]
    Fill,
    /// Frame keeps its aspect ratio and is centred, leaving letterbox bars
    Contain,
}

/// Pointer position relative to the rendered element's bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayPointer {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayPointer {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Map the pointer into media space
    ///
    /// Returns `None` for a degenerate display box, for a non-finite pointer,
    /// for a pointer outside the box, or in `Contain` mode when the pointer
    /// falls on a letterbox bar. A returned point always lies inside `media`.
    pub fn to_media(self, media: MediaDimensions, fit: FitMode) -> Option<Point> {
        let finite = [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        if media.width == 0 || media.height == 0 {
            return None;
        }
        if self.x < 0.0 || self.y < 0.0 || self.x > self.width || self.y > self.height {
            return None;
        }
        let (mw, mh) = (media.width as f32, media.height as f32);

        let point = match fit {
            FitMode::Fill => Point {
                x: self.x / self.width * mw,
                y: self.y / self.height * mh,
            },
            FitMode::Contain => {
                let scale = (self.width / mw).min(self.height / mh);
                let content_w = mw * scale;
                let content_h = mh * scale;
                let local_x = self.x - (self.width - content_w) * 0.5;
                let local_y = self.y - (self.height - content_h) * 0.5;

                if local_x < 0.0 || local_y < 0.0 || local_x > content_w || local_y > content_h {
                    return None;
                }
                // Rounding at the far edge may overshoot by an ulp
                Point {
                    x: (local_x / scale).min(mw),
                    y: (local_y / scale).min(mh),
                }
            }
        };
        media.contains(point).then_some(point)
    }
}
