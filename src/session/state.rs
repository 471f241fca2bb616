//! Session state: reference frame, zones, drawing machine and live counts

use crate::annotations::drawing::Drawing;
use crate::annotations::store::ZoneStore;
use crate::capture::ReferenceFrame;
use crate::domain::{ClassSelection, CountsState, FitMode, MediaDimensions};
use crate::render::image::OverlayScene;
use crate::report::CountReport;

/// Analysis lifecycle
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Drawing zones; the overlay is the view
    #[default]
    Configuring,
    /// Engine is counting; the live feed replaces the overlay
    Running { feed_url: String },
}

/// Everything the operator edits during a session
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub media: Option<ReferenceFrame>,
    pub fit: FitMode,
    pub drawing: Drawing,
    pub zones: ZoneStore,
    pub selected: ClassSelection,
    pub phase: Phase,
    pub counts: CountsState,
}

impl Session {
    pub fn new(fit: FitMode) -> Self {
        Self {
            fit,
            ..Default::default()
        }
    }

    /// Resolution of the loaded frame, or the placeholder canvas size
    pub fn dims(&self) -> MediaDimensions {
        self.media
            .as_ref()
            .map(ReferenceFrame::dims)
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running { .. })
    }

    /// Replace the reference frame; zones already drawn are kept
    pub fn set_media(&mut self, frame: ReferenceFrame) {
        self.drawing.discard();
        self.media = Some(frame);
    }

    /// Remove every zone and the unfinished shape
    pub fn clear_zones(&mut self) {
        self.zones.clear_all();
        self.drawing.discard();
    }

    pub fn scene(&self) -> OverlayScene<'_> {
        OverlayScene {
            frame: self.media.as_ref().map(|m| &m.image),
            dims: self.dims(),
            zones: self.zones.as_slice(),
            sketch: self.drawing.buffer(),
        }
    }

    pub fn report(&self) -> CountReport {
        CountReport::new(self.zones.as_slice(), self.counts.counts())
    }
}
