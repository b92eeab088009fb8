use crate::foundation::core::{FrameRGBA, SurfaceSize};

/// A display surface the recorder can read pixels from.
///
/// Implementations expose their current contents as an RGBA8 frame; the recorder copies that
/// frame in full on every tick and never writes back.
pub trait CanvasSource {
    /// The current pixel contents.
    fn pixels(&self) -> &FrameRGBA;

    /// The current dimensions.
    fn size(&self) -> SurfaceSize {
        self.pixels().size()
    }
}

impl CanvasSource for FrameRGBA {
    fn pixels(&self) -> &FrameRGBA {
        self
    }
}
