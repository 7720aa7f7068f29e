use crate::input::Scene;
use crate::model::{Mood, Record};
use crossterm::{
    cursor, execute, queue,
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
    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn set_bg(&mut self, x: u16, y: u16, bg: Color) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i].bg = bg;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    pub(crate) const CLEAR: Pixel = Pixel {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub(crate) const fn hex(rgb: u32) -> Pixel {
        Pixel {
            r: (rgb >> 16) as u8,
            g: (rgb >> 8) as u8,
            b: rgb as u8,
            a: 255,
        }
    }

    pub(crate) fn color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
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
    pub(crate) fn get(&self, x: u32, y: u32) -> Pixel {
        if x < self.w && y < self.h {
            self.px[self.idx(x, y)]
        } else {
            Pixel::CLEAR
        }
    }
    /// Opaque fill, clipped to the canvas.
    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, p: Pixel) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.w as i32);
        let y1 = (y + h).min(self.h as i32);
        for yy in y0..y1 {
            for xx in x0..x1 {
                let i = self.idx(xx as u32, yy as u32);
                self.px[i] = p;
            }
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;

        // Braille: 2×4 pixels per cell
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
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
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
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

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
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

/// Cell-space rectangle.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Area {
    pub(crate) x: u16,
    pub(crate) y: u16,
    pub(crate) w: u16,
    pub(crate) h: u16,
}

impl Area {
    /// The same region in braille subpixels.
    pub(crate) fn subpixels(self) -> Viewport {
        Viewport {
            x: self.x as i32 * 2,
            y: self.y as i32 * 4,
            w: self.w as i32 * 2,
            h: self.h as i32 * 4,
        }
    }
}

/// Converts inked pixels inside `area` to braille, keeping each cell's background.
pub(crate) fn canvas_to_cells(
    canvas: &PixelCanvas,
    out: &mut CellBuffer,
    area: Area,
    enable_color: bool,
) {
    for cy in area.y..area.y.saturating_add(area.h).min(out.h) {
        for cx in area.x..area.x.saturating_add(area.w).min(out.w) {
            let px0 = cx as u32 * 2;
            let py0 = cy as u32 * 4;

            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let p = canvas.get(px0 + dx, py0 + dy);
                    // threshold: treat alpha as ink
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }
            if ink_count == 0 {
                continue;
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = if enable_color {
                Color::Rgb {
                    r: (sum_r / ink_count) as u8,
                    g: (sum_g / ink_count) as u8,
                    b: (sum_b / ink_count) as u8,
                }
            } else {
                Color::White
            };
            let bg = out.get(cx, cy).map_or(Color::Black, |c| c.bg);
            out.set(cx, cy, Cell { ch, fg, bg });
        }
    }
}

/* -----------------------------
   Jail scene, laid out on a 105×65 unit grid
------------------------------ */

pub(crate) const SCENE_W: f32 = 105.0;
pub(crate) const SCENE_H: f32 = 65.0;
const FLOOR_TOP: f32 = SCENE_H - 18.0;
const BASE_Y: f32 = SCENE_H - 22.0;
const BODY_W: f32 = 14.0;
const BODY_H: f32 = 12.0;

const BAND_A: Pixel = Pixel::hex(0x101826);
const BAND_B: Pixel = Pixel::hex(0x0e1622);
const FLOOR: Pixel = Pixel::hex(0x0a111b);
const BAR: Pixel = Pixel::hex(0x1f2a3a);
const BAR_SHINE: Pixel = Pixel::hex(0x243247);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Viewport {
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) w: i32,
    pub(crate) h: i32,
}

/// Scene units to subpixels, letterboxed and centered in a viewport.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SceneMap {
    ox: f32,
    oy: f32,
    s: f32,
}

impl SceneMap {
    pub(crate) fn fit(vp: Viewport) -> Self {
        let s = (vp.w as f32 / SCENE_W).min(vp.h as f32 / SCENE_H).max(0.1);
        Self {
            ox: vp.x as f32 + (vp.w as f32 - SCENE_W * s) / 2.0,
            oy: vp.y as f32 + (vp.h as f32 - SCENE_H * s) / 2.0,
            s,
        }
    }

    pub(crate) fn to_sub(&self, ux: f32, uy: f32) -> (i32, i32) {
        (
            (self.ox + ux * self.s).round() as i32,
            (self.oy + uy * self.s).round() as i32,
        )
    }

    pub(crate) fn to_unit(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.ox) / self.s, (sy - self.oy) / self.s)
    }

    fn rect(&self, canvas: &mut PixelCanvas, x: f32, y: f32, w: f32, h: f32, p: Pixel) {
        let (x0, y0) = self.to_sub(x, y);
        let (x1, y1) = self.to_sub(x + w, y + h);
        // never let a feature vanish at small sizes
        canvas.fill_rect(x0, y0, (x1 - x0).max(1), (y1 - y0).max(1), p);
    }
}

pub(crate) fn body_color(mood: Mood) -> Pixel {
    match mood {
        Mood::Rioting => Pixel::hex(0xff3b3b),
        Mood::Starving => Pixel::hex(0xffd35a),
        Mood::Spiraling => Pixel::hex(0xc084fc),
        _ => Pixel::hex(0x57d6ff),
    }
}

/// Vertical bob in scene units; cosmetic only.
pub(crate) fn wobble(phase_ms: u64) -> f32 {
    (phase_ms as f64 / 400.0).sin() as f32 * 1.5
}

fn backdrop_at(unit_x: f32, unit_y: f32) -> Option<Pixel> {
    if !(0.0..SCENE_W).contains(&unit_x) || !(0.0..SCENE_H).contains(&unit_y) {
        return None;
    }
    if unit_y >= FLOOR_TOP {
        return Some(FLOOR);
    }
    Some(if (unit_y / 6.0) as i32 % 2 == 0 {
        BAND_A
    } else {
        BAND_B
    })
}

/// Band and floor colors go in cell backgrounds so braille ink stays readable.
pub(crate) fn paint_backdrop(buf: &mut CellBuffer, area: Area, map: &SceneMap) {
    for cy in area.y..area.y.saturating_add(area.h) {
        for cx in area.x..area.x.saturating_add(area.w) {
            let (ux, uy) = map.to_unit(cx as f32 * 2.0 + 1.0, cy as f32 * 4.0 + 2.0);
            if let Some(p) = backdrop_at(ux, uy) {
                buf.set_bg(cx, cy, p.color());
            }
        }
    }
}

fn bar_columns() -> impl Iterator<Item = f32> {
    (1..)
        .map(|i| i as f32 * 10.0)
        .take_while(|x| *x < SCENE_W - 10.0)
}

pub(crate) fn draw_jail(canvas: &mut PixelCanvas, map: &SceneMap, mood: Mood, phase_ms: u64) {
    let bar_h = SCENE_H - 40.0;
    for x in bar_columns() {
        map.rect(canvas, x, 16.0, 2.0, bar_h, BAR);
        map.rect(canvas, x + 2.0, 16.0, 1.0, bar_h, BAR_SHINE);
    }

    let cx = SCENE_W / 2.0;
    let top = BASE_Y - BODY_H + wobble(phase_ms);
    map.rect(canvas, cx - BODY_W / 2.0, top, BODY_W, BODY_H, body_color(mood));

    // eyes and mouth are holes in the body
    map.rect(canvas, cx - 4.0, top + 4.0, 2.0, 2.0, Pixel::CLEAR);
    map.rect(canvas, cx + 2.0, top + 4.0, 2.0, 2.0, Pixel::CLEAR);
    map.rect(canvas, cx - 3.0, top + 8.0, 6.0, 2.0, Pixel::CLEAR);
}

/* -----------------------------
   ASCII fallback
------------------------------ */

fn face_for(mood: Mood) -> [&'static str; 5] {
    let mouth = match mood {
        Mood::Starving => "|   ~~~   |",
        Mood::Rioting => "|  >###<  |",
        Mood::Spiraling => "|   ...   |",
        Mood::Chillin => "|  \\___/  |",
        _ => "|   ___   |",
    };
    let eyes = match mood {
        Mood::Rioting => "|  \\   /  |",
        Mood::Spiraling => "|  @   @  |",
        _ => "|  o   o  |",
    };
    [" _________ ", eyes, "|         |", mouth, "|_________|"]
}

pub(crate) fn draw_jail_ascii(
    buf: &mut CellBuffer,
    area: Area,
    map: &SceneMap,
    mood: Mood,
    phase_ms: u64,
    enable_color: bool,
) {
    let bar_fg = if enable_color { BAR_SHINE.color() } else { Color::DarkGrey };
    for x in bar_columns() {
        let (sx, sy0) = map.to_sub(x + 1.0, 16.0);
        let (_, sy1) = map.to_sub(x + 1.0, SCENE_H - 24.0);
        let cx = (sx / 2) as u16;
        for cy in (sy0 / 4).max(0)..(sy1 / 4).max(0) {
            let cy = cy as u16;
            if cx < area.x + area.w && cy < area.y + area.h {
                put(buf, cx, cy, '║', bar_fg);
            }
        }
    }

    let (sx, sy) = map.to_sub(SCENE_W / 2.0, BASE_Y - BODY_H / 2.0 + wobble(phase_ms));
    let face = face_for(mood);
    let fg = if enable_color { body_color(mood).color() } else { Color::White };
    let x0 = sx / 2 - (face[0].chars().count() as i32) / 2;
    let y0 = sy / 4 - (face.len() as i32) / 2;
    for (i, line) in face.iter().enumerate() {
        let y = y0 + i as i32;
        for (j, ch) in line.chars().enumerate() {
            let x = x0 + j as i32;
            if x >= area.x as i32 && y >= area.y as i32 {
                put(buf, x as u16, y as u16, ch, fg);
            }
        }
    }
}

/* -----------------------------
   Text panel
------------------------------ */

pub(crate) struct Hud<'a> {
    pub(crate) record: Option<&'a Record>,
    pub(crate) mood: Mood,
    pub(crate) message: Option<&'a str>,
    pub(crate) scene: Scene,
    pub(crate) enable_color: bool,
    /// Columns reserved for text, left of the jail.
    pub(crate) panel_w: u16,
}

fn tint(enable_color: bool, rgb: u32) -> Color {
    if enable_color {
        Pixel::hex(rgb).color()
    } else {
        Color::White
    }
}

fn put(buf: &mut CellBuffer, x: u16, y: u16, ch: char, fg: Color) {
    let bg = buf.get(x, y).map_or(Color::Black, |c| c.bg);
    buf.set(x, y, Cell { ch, fg, bg });
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        put(buf, xx, y, ch, fg);
    }
}

pub(crate) fn bar(value01: f64, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f64 + 0.5) as usize;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { '·' });
    }
    s.push(']');
    s
}

pub(crate) fn draw_hud(buf: &mut CellBuffer, hud: &Hud<'_>) {
    let c = hud.enable_color;
    draw_text(buf, 1, 0, "KROOKZ: Pixel Jail", tint(c, 0xdbeafe));

    let Some(r) = hud.record else {
        draw_text(buf, 1, 2, "Loading inmate file…", tint(c, 0x9ca3af));
        return;
    };

    // label (8) + brackets and value (8) must stay inside the panel
    let bar_w = (hud.panel_w as usize).saturating_sub(16).clamp(1, 20);
    for (i, (name, val)) in [("Hunger", r.hunger), ("Rage", r.rage), ("Shame", r.shame)]
        .into_iter()
        .enumerate()
    {
        let y = 2 + i as u16;
        draw_text(buf, 1, y, &format!("{name:<6}"), tint(c, 0x93c5fd));
        let line = format!("{} {:>5.1}", bar(val / 100.0, bar_w), val);
        draw_text(buf, 8, y, &line, tint(c, 0x60a5fa));
    }

    draw_text(buf, 1, 6, &format!("Mood: {}", hud.mood), tint(c, 0xa7f3d0));
    draw_text(
        buf,
        1,
        7,
        &format!("Streak: {} day(s)", r.day_streak),
        tint(c, 0xfcd34d),
    );

    if let Some(msg) = hud.message {
        draw_text(buf, 1, buf.h.saturating_sub(3), msg, tint(c, 0xfca5a5));
    }

    let keys = match hud.scene {
        Scene::Main => "f feed | b bribe | e escape | h help | q quit",
        Scene::Help => "esc/h close | q quit",
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), keys, Color::Grey);
}

pub(crate) const HELP_TEXT: &str = "Your inmate lives behind bars and decays in real time.\n\
Hunger goes down over time; Rage and Shame creep up.\n\n\
F  Feed: +22 hunger, -10 rage, -6 shame.\n\
   The first feed of each day extends the streak.\n\
B  Bribe the guard: -18 rage, +6 shame.\n\
E  Escape: high shame kills your odds (5%..50%).\n\
   Success calms everything; failure means solitary.\n\n\
Ignore it and it spirals. Love it and it plots.";

pub(crate) fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let (w, h) = (buf.w, buf.h);
    let bw = 62.min(w.saturating_sub(4));
    let bh = 16.min(h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;

    let frame = |ch| Cell {
        ch,
        fg: Color::White,
        bg: Color::Black,
    };
    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            let ch = match (x == x0, x == x0 + bw - 1, y == y0, y == y0 + bh - 1) {
                (true, _, true, _) => '┌',
                (_, true, true, _) => '┐',
                (true, _, _, true) => '└',
                (_, true, _, true) => '┘',
                (_, _, true, _) | (_, _, _, true) => '─',
                (true, _, _, _) | (_, true, _, _) => '│',
                _ => ' ',
            };
            buf.set(x, y, frame(ch));
        }
    }

    draw_text(buf, x0 + 2, y0 + 1, title, Color::White);
    for (yy, line) in (y0 + 3..y0 + bh - 1).zip(body.lines()) {
        draw_text(buf, x0 + 2, yy, line, Color::White);
    }
}
