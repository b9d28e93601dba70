use crate::geom::{Affine, Shape, Vec2};
use crate::scene::{Paint, Rgb, Scene};
use crossterm::{
    cursor,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

/// Canvas pixel; `ink` is false where only the background shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) color: Rgb,
    pub(crate) ink: bool,
}

impl Default for Pixel {
    fn default() -> Self {
        Self {
            color: Rgb::BLACK,
            ink: false,
        }
    }
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn clear(&mut self, p: Pixel) {
        self.px.fill(p);
    }
    pub(crate) fn get(&self, x: u32, y: u32) -> Option<Pixel> {
        (x < self.w && y < self.h).then(|| self.px[self.idx(x, y)])
    }
    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return;
        }
        let i = self.idx(x as u32, y as u32);
        self.px[i] = Pixel { color, ink: true };
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    /// Whether the terminal reports key releases.
    pub(crate) key_release: bool,
    active: bool,
}

impl Terminal {
    /// Zero-sized and already responsible for restoring the terminal, so a
    /// failure anywhere in `begin` still unwinds through `Drop`.
    fn armed(out: io::Stdout) -> Self {
        Self {
            out,
            cols: 0,
            rows: 0,
            prev: CellBuffer::new(0, 0),
            cur: CellBuffer::new(0, 0),
            canvas: PixelCanvas::new(0, 0),
            key_release: false,
            active: true,
        }
    }

    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut term = Self::armed(io::stdout());
        execute!(
            term.out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                term.out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            term.key_release = true;
        }
        log::info!("keyboard release events: {}", term.key_release);

        // Braille: 2×4 pixels per cell
        term.resize_if_needed()?;
        Ok(term)
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.key_release {
            queue!(self.out, PopKeyboardEnhancementFlags)?;
        }
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        log::debug!("terminal resized to {c}x{r}");
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Restores the terminal on early returns and panics.
impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.end();
    }
}

/* -----------------------------
   Scene rasterizer
------------------------------ */

/// Maps logical scene pixels onto the canvas with one uniform scale,
/// centred so the unused axis is letterboxed.
pub(crate) fn fit_transform(scene_w: u32, scene_h: u32, canvas_w: u32, canvas_h: u32) -> Affine {
    if scene_w == 0 || scene_h == 0 {
        return Affine::scaling(0.0, 0.0);
    }
    let s = (canvas_w as f64 / scene_w as f64).min(canvas_h as f64 / scene_h as f64);
    let ox = 0.5 * (canvas_w as f64 - s * scene_w as f64);
    let oy = 0.5 * (canvas_h as f64 - s * scene_h as f64);
    Affine::translation(ox, oy).scaled(s, s)
}

/// Paints the scene items in order, each one opaque over what is below.
pub(crate) fn rasterize(scene: &Scene, canvas: &mut PixelCanvas) {
    canvas.clear(Pixel {
        color: scene.background,
        ink: false,
    });
    let fit = fit_transform(scene.width, scene.height, canvas.w, canvas.h);
    let scale = fit.apply(Vec2::new(1.0, 0.0)).x - fit.apply(Vec2::new(0.0, 0.0)).x;

    for item in &scene.items {
        let shape = item.shape.transformed(fit);
        match item.paint {
            Paint::Fill(color) => fill_shape(canvas, &shape, color),
            Paint::Stroke { color, width } => stroke_shape(canvas, &shape, color, width * scale),
        }
    }
}

/// Nonzero-winding scanline fill, sampled at pixel centres.
pub(crate) fn fill_shape(canvas: &mut PixelCanvas, shape: &Shape, color: Rgb) {
    let Some((lo, hi)) = shape.bounds() else {
        return;
    };
    let y_start = (lo.y - 0.5).ceil().max(0.0) as i64;
    let y_end = (hi.y - 0.5).floor().min(canvas.h as f64 - 1.0) as i64;

    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for y in y_start..=y_end {
        let sy = y as f64 + 0.5;
        crossings.clear();
        for ring in &shape.rings {
            let n = ring.len();
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                // half-open in y so shared vertices count once
                let (winding, upper, lower) = if a.y <= sy && b.y > sy {
                    (1, a, b)
                } else if b.y <= sy && a.y > sy {
                    (-1, b, a)
                } else {
                    continue;
                };
                let t = (sy - upper.y) / (lower.y - upper.y);
                crossings.push((upper.x + t * (lower.x - upper.x), winding));
            }
        }
        crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut winding = 0;
        for w in crossings.windows(2) {
            winding += w[0].1;
            if winding == 0 {
                continue;
            }
            let x_start = (w[0].0 - 0.5).ceil() as i64;
            let x_end = (w[1].0 - 0.5).ceil() as i64;
            for x in x_start.max(0)..x_end.min(canvas.w as i64) {
                canvas.put(x, y, color);
            }
        }
    }
}

/// Outlines every ring with round-capped segments `width` pixels thick.
pub(crate) fn stroke_shape(canvas: &mut PixelCanvas, shape: &Shape, color: Rgb, width: f64) {
    // half a pixel diagonal keeps thin strokes connected
    let r = (0.5 * width).max(std::f64::consts::FRAC_1_SQRT_2);
    for ring in &shape.rings {
        let n = ring.len();
        for i in 0..n {
            stamp_segment(canvas, ring[i], ring[(i + 1) % n], r, color);
        }
    }
}

fn stamp_segment(canvas: &mut PixelCanvas, a: Vec2, b: Vec2, r: f64, color: Rgb) {
    let x0 = (a.x.min(b.x) - r - 0.5).floor().max(0.0) as i64;
    let x1 = (a.x.max(b.x) + r - 0.5).ceil().min(canvas.w as f64 - 1.0) as i64;
    let y0 = (a.y.min(b.y) - r - 0.5).floor().max(0.0) as i64;
    let y1 = (a.y.max(b.y) + r - 0.5).ceil().min(canvas.h as f64 - 1.0) as i64;

    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx * dx + dy * dy;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let t = if len2 > 0.0 {
                (((px - a.x) * dx + (py - a.y) * dy) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (ex, ey) = (px - (a.x + t * dx), py - (a.y + t * dy));
            if ex * ex + ey * ey <= r * r {
                canvas.put(x, y, color);
            }
        }
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

// 4x4 Bayer matrix for ordered dithering (0..15)
const BAYER4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

fn dither_on(brightness: f64, x: u32, y: u32) -> bool {
    let t = (BAYER4[(y & 3) as usize][(x & 3) as usize] as f64 + 0.5) / 16.0;
    brightness.clamp(0.0, 1.0) > t
}

/// With colour, every inked pixel lights its dot and the cell takes the
/// average ink colour. Without it, dots are dithered by luma so fog and
/// fills still read as shades.
pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    enable_color: bool,
    bg: Color,
) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (px0 + dx, py0 + dy);
                    let Some(p) = canvas.get(x, y) else {
                        continue;
                    };
                    if !p.ink {
                        continue;
                    }
                    let lit = if enable_color {
                        p.color != Rgb::BLACK
                    } else {
                        dither_on(p.color.luma(), x, y)
                    };
                    if lit {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.color.r as u32;
                        sum_g += p.color.g as u32;
                        sum_b += p.color.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if enable_color && ink_count > 0 {
                let r = (sum_r / ink_count) as u8;
                let g = (sum_g / ink_count) as u8;
                let b = (sum_b / ink_count) as u8;
                Color::Rgb { r, g, b }
            } else {
                Color::White
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::PathBuilder;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Shape {
        let mut p = PathBuilder::new();
        p.move_to(x0, y0)
            .line_to(x1, y0)
            .line_to(x1, y1)
            .line_to(x0, y1)
            .close();
        p.build()
    }

    fn inked(c: &PixelCanvas) -> usize {
        c.px.iter().filter(|p| p.ink).count()
    }

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn terminal_is_armed_before_any_setup_step() {
        let t = Terminal::armed(io::stdout());
        assert!(t.active);
        assert!(!t.key_release);
        assert_eq!((t.cols, t.rows), (0, 0));
        assert!(t.cur.cells.is_empty() && t.canvas.px.is_empty());
        // no terminal under test: skip the restore sequence
        std::mem::forget(t);
    }

    #[test]
    fn fill_covers_pixel_centres_inside() {
        let mut c = PixelCanvas::new(10, 10);
        fill_shape(&mut c, &square(2.0, 3.0, 6.0, 5.0), RED);
        assert_eq!(inked(&c), 4 * 2);
        assert_eq!(c.get(2, 3).unwrap().color, RED);
        assert!(!c.get(6, 3).unwrap().ink);
        assert!(!c.get(2, 5).unwrap().ink);
    }

    #[test]
    fn fill_is_nonzero_for_overlapping_rings() {
        let mut a = square(0.0, 0.0, 4.0, 4.0);
        a.rings.extend(square(2.0, 0.0, 6.0, 4.0).rings);
        let mut c = PixelCanvas::new(8, 8);
        fill_shape(&mut c, &a, RED);
        // the overlap stays filled, unlike even-odd
        assert!(c.get(3, 1).unwrap().ink);
        assert_eq!(inked(&c), 6 * 4);
    }

    #[test]
    fn fill_clips_to_canvas() {
        let mut c = PixelCanvas::new(4, 4);
        fill_shape(&mut c, &square(-10.0, -10.0, 10.0, 10.0), RED);
        assert_eq!(inked(&c), 16);
    }

    #[test]
    fn stroke_leaves_the_interior_empty() {
        let mut c = PixelCanvas::new(20, 20);
        stroke_shape(&mut c, &square(2.0, 2.0, 18.0, 18.0), RED, 1.0);
        assert!(c.get(2, 10).unwrap().ink);
        assert!(c.get(17, 17).unwrap().ink);
        assert!(!c.get(10, 10).unwrap().ink);
    }

    #[test]
    fn later_items_paint_over_earlier_ones() {
        let mut scene = Scene::new(10, 10, Rgb::BLACK);
        scene.fill(square(0.0, 0.0, 10.0, 10.0), Rgb::GRAY);
        scene.fill(square(0.0, 0.0, 5.0, 10.0), RED);
        let mut c = PixelCanvas::new(10, 10);
        rasterize(&scene, &mut c);
        assert_eq!(c.get(1, 1).unwrap().color, RED);
        assert_eq!(c.get(8, 1).unwrap().color, Rgb::GRAY);
    }

    #[test]
    fn fit_letterboxes_wide_scenes() {
        let t = fit_transform(1280, 720, 200, 200);
        let tl = t.apply(Vec2::new(0.0, 0.0));
        let br = t.apply(Vec2::new(1280.0, 720.0));
        assert!((tl.x - 0.0).abs() < 1e-9 && (br.x - 200.0).abs() < 1e-9);
        assert!((tl.y - 43.75).abs() < 1e-9 && (br.y - 156.25).abs() < 1e-9);
    }

    #[test]
    fn braille_cell_collects_dots_and_average_colour() {
        let mut c = PixelCanvas::new(2, 4);
        c.put(0, 0, Rgb::new(200, 0, 0));
        c.put(1, 3, Rgb::new(100, 0, 0));
        let mut cells = CellBuffer::new(1, 1);
        canvas_to_cells(&c, &mut cells, true, Color::Black);
        let cell = cells.cells[0];
        assert_eq!(cell.ch, '\u{2881}');
        assert_eq!(cell.fg, Color::Rgb { r: 150, g: 0, b: 0 });
    }

    #[test]
    fn monochrome_dithers_by_brightness() {
        let mut c = PixelCanvas::new(4, 4);
        fill_shape(&mut c, &square(0.0, 0.0, 4.0, 4.0), Rgb::gray(0.5));
        let mut cells = CellBuffer::new(2, 1);
        canvas_to_cells(&c, &mut cells, false, Color::Black);
        let dots: u32 = cells
            .cells
            .iter()
            .map(|cell| (cell.ch as u32 - 0x2800).count_ones())
            .sum();
        assert_eq!(dots, 8);
        assert!(cells.cells.iter().all(|cell| cell.fg == Color::White));
    }
}
