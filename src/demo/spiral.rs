use kurbo::Point;
use vello_cpu::kurbo::Shape as _;

use crate::{
    capture::source::CanvasSource,
    foundation::{
        core::{FrameRGBA, SurfaceSize},
        error::{RecorderError, RecorderResult},
    },
};

const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Tuning knobs for [`SpiralDemo`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SpiralParams {
    /// Number of particles.
    pub particles: usize,
    /// Angular speed of the innermost particles, radians per second.
    pub spin: f64,
    /// Largest particle radius in pixels.
    pub max_dot_radius: f64,
    /// Hue drift in degrees per second.
    pub hue_speed: f64,
    /// Optional backdrop (straight RGBA8). `None` leaves the canvas transparent.
    pub backdrop: Option<[u8; 4]>,
}

impl Default for SpiralParams {
    fn default() -> Self {
        Self {
            particles: 600,
            spin: 1.2,
            max_dot_radius: 4.0,
            hue_speed: 40.0,
            backdrop: None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Particle {
    angle: f64,
    /// Normalized distance from the center, `0..=1`.
    distance: f64,
    hue: f64,
}

/// A particle spiral that animates over time. Used to exercise the recorder.
pub struct SpiralDemo {
    params: SpiralParams,
    width: u16,
    height: u16,
    particles: Vec<Particle>,
    time_s: f64,
    pixmap: vello_cpu::Pixmap,
    frame: FrameRGBA,
}

impl SpiralDemo {
    /// Create a demo canvas of `width`x`height` and render its first frame.
    pub fn new(width: u32, height: u32, params: SpiralParams) -> RecorderResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| RecorderError::validation("demo width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| RecorderError::validation("demo height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(RecorderError::validation(
                "demo width/height must be non-zero",
            ));
        }

        let n = params.particles.max(1);
        let particles = (0..n)
            .map(|i| {
                let t = (i as f64 + 0.5) / n as f64;
                Particle {
                    angle: i as f64 * GOLDEN_ANGLE,
                    distance: t.sqrt(),
                    hue: t * 300.0,
                }
            })
            .collect();

        let mut demo = Self {
            params,
            width: w,
            height: h,
            particles,
            time_s: 0.0,
            pixmap: vello_cpu::Pixmap::new(w, h),
            frame: FrameRGBA::transparent(SurfaceSize { width, height }),
        };
        demo.render();
        Ok(demo)
    }

    /// Seconds of animation elapsed.
    pub fn time(&self) -> f64 {
        self.time_s
    }

    /// Advance the animation by `dt_s` seconds and redraw.
    pub fn advance(&mut self, dt_s: f64) {
        self.time_s += dt_s.max(0.0);
        self.render();
    }

    /// Where `p` sits at the current time.
    fn position(&self, p: &Particle) -> Point {
        let cx = f64::from(self.width) / 2.0;
        let cy = f64::from(self.height) / 2.0;
        let max_r = cx.min(cy) * 0.92;

        // Inner particles turn faster, which winds the field into arms over time.
        let angle = p.angle + self.time_s * self.params.spin * (1.0 - 0.6 * p.distance);
        let pulse = 0.88 + 0.12 * (self.time_s * 2.0 + p.angle).sin();
        let r = p.distance * max_r * pulse;
        Point::new(cx + r * angle.cos(), cy + r * angle.sin())
    }

    fn render(&mut self) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);

        if let Some([r, g, b, a]) = self.params.backdrop {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(self.width),
                f64::from(self.height),
            ));
        }

        for p in &self.particles {
            let pos = self.position(p);
            let radius = 0.6 + self.params.max_dot_radius * p.distance;
            let hue = (p.hue + self.time_s * self.params.hue_speed).rem_euclid(360.0);
            let [r, g, b] = hsl_to_rgb8(hue, 0.8, 0.6);
            let alpha = (110.0 + 145.0 * (1.0 - p.distance)) as u8;

            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, alpha));
            let dot = vello_cpu::kurbo::Circle::new(
                vello_cpu::kurbo::Point::new(pos.x, pos.y),
                radius,
            );
            ctx.fill_path(&dot.to_path(0.1));
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.frame
            .data
            .copy_from_slice(self.pixmap.data_as_u8_slice());
    }
}

impl CanvasSource for SpiralDemo {
    fn pixels(&self) -> &FrameRGBA {
        &self.frame
    }
}

fn hsl_to_rgb8(h_deg: f64, s: f64, l: f64) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h_deg / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r1, g1, b1) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [to_u8(r1), to_u8(g1), to_u8(b1)]
}
