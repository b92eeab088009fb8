use crate::foundation::error::{RecorderError, RecorderResult};

/// Pixel dimensions of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Construct a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> RecorderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RecorderError::validation(
                "surface width/height must be non-zero",
            ));
        }
        Ok(Self { width, height })
    }

    /// Number of bytes in an RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// An RGBA8 pixel surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
    /// Whether `data` carries premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// A fully transparent surface.
    pub fn transparent(size: SurfaceSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            data: vec![0u8; size.rgba_len()],
            premultiplied: true,
        }
    }

    /// Wrap existing bytes, checking the length against the dimensions.
    pub fn from_parts(
        width: u32,
        height: u32,
        data: Vec<u8>,
        premultiplied: bool,
    ) -> RecorderResult<Self> {
        let size = SurfaceSize::new(width, height)?;
        if data.len() != size.rgba_len() {
            return Err(RecorderError::validation(format!(
                "rgba8 buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied,
        })
    }

    /// The surface dimensions.
    pub fn size(&self) -> SurfaceSize {
        SurfaceSize {
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_surfaces_are_rejected() {
        assert!(SurfaceSize::new(0, 4).is_err());
        assert!(SurfaceSize::new(4, 0).is_err());
        assert_eq!(SurfaceSize::new(4, 2).unwrap().rgba_len(), 32);
    }

    #[test]
    fn from_parts_checks_length() {
        assert!(FrameRGBA::from_parts(2, 2, vec![0; 15], false).is_err());
        let f = FrameRGBA::from_parts(2, 2, vec![0; 16], false).unwrap();
        assert_eq!(f.size(), SurfaceSize::new(2, 2).unwrap());
        assert!(!f.premultiplied);
    }
}
