use crate::{
    capture::source::CanvasSource,
    foundation::{
        core::{FrameRGBA, SurfaceSize},
        error::{RecorderError, RecorderResult},
    },
};

/// Opaque RGBA8 surface the encoder reads from.
///
/// Sized once at session start. Every refresh paints the background and copies the full source
/// over it, so the encoder never sees alpha.
#[derive(Clone, Debug)]
pub struct OffscreenBuffer {
    frame: FrameRGBA,
    refreshes: u64,
}

impl OffscreenBuffer {
    /// Allocate a buffer matching `size`, filled with opaque black.
    pub fn new(size: SurfaceSize) -> RecorderResult<Self> {
        let size = SurfaceSize::new(size.width, size.height)?;
        let mut data = vec![0u8; size.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Ok(Self {
            frame: FrameRGBA {
                width: size.width,
                height: size.height,
                data,
                premultiplied: false,
            },
            refreshes: 0,
        })
    }

    /// Paint `background` then composite the whole source over it.
    pub fn refresh_from(
        &mut self,
        source: &dyn CanvasSource,
        background: [u8; 4],
    ) -> RecorderResult<()> {
        let src = source.pixels();
        if src.width != self.frame.width || src.height != self.frame.height {
            return Err(RecorderError::validation(format!(
                "source size changed mid-session: got {}x{}, buffer is {}x{}",
                src.width, src.height, self.frame.width, self.frame.height
            )));
        }
        flatten_to_opaque_rgba8(
            &mut self.frame.data,
            &src.data,
            src.premultiplied,
            background,
        )?;
        self.refreshes += 1;
        Ok(())
    }

    /// Current contents.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Buffer dimensions.
    pub fn size(&self) -> SurfaceSize {
        self.frame.size()
    }

    /// How many times the buffer has been refreshed since allocation.
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> RecorderResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(RecorderError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    // The fill itself is opaque: a translucent background is treated as if drawn over black.
    let bg_a = u16::from(bg_rgba[3]);
    let bg_r = mul_div255(u16::from(bg_rgba[0]), bg_a);
    let bg_g = mul_div255(u16::from(bg_rgba[1]), bg_a);
    let bg_b = mul_div255(u16::from(bg_rgba[2]), bg_a);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;

        let (r, g, b) = if src_is_premul {
            (
                u16::from(s[0]) + mul_div255(bg_r, inv),
                u16::from(s[1]) + mul_div255(bg_g, inv),
                u16::from(s[2]) + mul_div255(bg_b, inv),
            )
        } else {
            (
                mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv),
                mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv),
                mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv),
            )
        };

        d[0] = r.min(255) as u8;
        d[1] = g.min(255) as u8;
        d[2] = b.min(255) as u8;
        d[3] = 255;
    }

    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
