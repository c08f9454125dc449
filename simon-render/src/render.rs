use anyhow::{Context, Result, bail};
use simon_core::{Highlights, Position};
use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Transform};

/// Quarter-circle control point factor for cubic arcs
const KAPPA: f32 = 0.552_284_8;

/// Board edge as a share of the shorter screen side
const BOARD_SCALE: f32 = 0.75;
/// Button radius, gap and centre cutout as shares of the board edge
const BUTTON_SCALE: f32 = 0.475;
const GAP_SCALE: f32 = 0.025;
const CUTOUT_SCALE: f32 = 0.25;

/// (lit, unlit) per position
const COLORS: [([u8; 3], [u8; 3]); 4] = [
    ([0xfe, 0xff, 0xbe], [0x9b, 0x9e, 0x00]),
    ([0xad, 0xda, 0xff], [0x00, 0x46, 0x80]),
    ([0xff, 0xa1, 0xc8], [0x96, 0x00, 0x3e]),
    ([0xaf, 0xff, 0xd2], [0x00, 0x75, 0x33]),
];

pub fn button_color(position: Position, lit: bool) -> [u8; 3] {
    let (on, off) = COLORS[position.index()];
    if lit { on } else { off }
}

/// Geometry of the four quarter-disc buttons around a round cutout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardLayout {
    pub center: (f32, f32),
    pub size: f32,
}

impl BoardLayout {
    pub fn fit(width: u32, height: u32) -> Self {
        Self {
            center: (width as f32 / 2.0, height as f32 / 2.0),
            size: width.min(height) as f32 * BOARD_SCALE,
        }
    }

    fn radius(&self) -> f32 {
        self.size * BUTTON_SCALE
    }

    fn cutout_radius(&self) -> f32 {
        self.size * CUTOUT_SCALE
    }

    /// Which way the button opens from its inner corner.
    fn direction(position: Position) -> (f32, f32) {
        match position {
            Position::TopLeft => (-1.0, -1.0),
            Position::TopRight => (1.0, -1.0),
            Position::BottomLeft => (-1.0, 1.0),
            Position::BottomRight => (1.0, 1.0),
        }
    }

    fn inner_corner(&self, position: Position) -> (f32, f32) {
        let (dx, dy) = Self::direction(position);
        let gap = self.size * GAP_SCALE;
        (self.center.0 + dx * gap, self.center.1 + dy * gap)
    }

    /// The button under a screen point. The cutout and the gaps hit nothing.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<Position> {
        let (cx, cy) = self.center;
        if (x - cx).hypot(y - cy) <= self.cutout_radius() {
            return None;
        }
        Position::ALL.into_iter().find(|&position| {
            let (dx, dy) = Self::direction(position);
            let (ix, iy) = self.inner_corner(position);
            let (u, v) = ((x - ix) * dx, (y - iy) * dy);
            u >= 0.0 && v >= 0.0 && u.hypot(v) <= self.radius()
        })
    }

    fn button_path(&self, position: Position) -> Option<Path> {
        let (dx, dy) = Self::direction(position);
        let (ix, iy) = self.inner_corner(position);
        let r = self.radius();

        let mut pb = PathBuilder::new();
        pb.move_to(ix, iy);
        pb.line_to(ix + dx * r, iy);
        pb.cubic_to(
            ix + dx * r,
            iy + dy * r * KAPPA,
            ix + dx * r * KAPPA,
            iy + dy * r,
            ix,
            iy + dy * r,
        );
        pb.close();
        pb.finish()
    }

    fn cutout_path(&self) -> Option<Path> {
        PathBuilder::from_circle(self.center.0, self.center.1, self.cutout_radius())
    }
}

/// Software renderer for the board.
///
/// Draws into an offscreen premultiplied canvas and copies it into the RGBA
/// frame handed over by the window surface.
pub struct BoardRenderer {
    width: u32,
    height: u32,
    layout: BoardLayout,
    canvas: Pixmap,
    buttons: Vec<Path>,
    cutout: Path,
}

impl BoardRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let layout = BoardLayout::fit(width, height);
        let (buttons, cutout) = Self::build_paths(&layout)?;
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate {width}x{height} canvas"))?;

        Ok(Self {
            width,
            height,
            layout,
            canvas,
            buttons,
            cutout,
        })
    }

    fn build_paths(layout: &BoardLayout) -> Result<(Vec<Path>, Path)> {
        let buttons = Position::ALL
            .into_iter()
            .map(|p| layout.button_path(p))
            .collect::<Option<Vec<_>>>()
            .context("degenerate button geometry")?;
        let cutout = layout.cutout_path().context("degenerate cutout geometry")?;
        Ok((buttons, cutout))
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        *self = Self::new(new_width, new_height)?;
        Ok(())
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Draws the board (or a blank screen when `board` is `None`) into `frame`.
    pub fn render_frame(&mut self, board: Option<&Highlights>, frame: &mut [u8]) -> Result<()> {
        self.canvas.fill(Color::BLACK);

        if let Some(board) = board {
            let mut paint = Paint::default();
            paint.anti_alias = true;

            for (position, path) in Position::ALL.into_iter().zip(&self.buttons) {
                let [r, g, b] = button_color(position, board.is_highlighted(position));
                paint.set_color(Color::from_rgba8(r, g, b, 255));
                self.canvas
                    .fill_path(path, &paint, FillRule::Winding, Transform::identity(), None);
            }

            paint.set_color(Color::BLACK);
            self.canvas.fill_path(
                &self.cutout,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }

        let data = self.canvas.data();
        if frame.len() != data.len() {
            bail!(
                "frame holds {} bytes, canvas {}x{} needs {}",
                frame.len(),
                self.width,
                self.height,
                data.len()
            );
        }
        frame.copy_from_slice(data);
        Ok(())
    }
}
