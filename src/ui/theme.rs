//! Colors for the memprof terminal UI.

use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub primary: Color,
    pub accent: Color,
    pub warning: Color,
    pub error: Color,
    pub success: Color,
    pub foreground: Color,
    pub muted: Color,
    pub background: Color,
    pub surface: Color,
}

impl Theme {
    pub const fn dark() -> Self {
        Self {
            primary: Color::from_u32(0x00ffff),
            accent: Color::from_u32(0xffaa22),
            warning: Color::from_u32(0xffdd55),
            error: Color::from_u32(0xff4444),
            success: Color::from_u32(0x00ff00),
            foreground: Color::from_u32(0xeeeeee),
            muted: Color::from_u32(0x888888),
            background: Color::from_u32(0x111111),
            surface: Color::from_u32(0x222222),
        }
    }

    /// A distinct color for the `index`-th sparkline.
    pub fn series(&self, index: usize) -> Color {
        const SERIES: [Color; 4] = [
            Color::from_u32(0x00ffff),
            Color::from_u32(0xffaa22),
            Color::from_u32(0x66ff66),
            Color::from_u32(0xff66cc),
        ];
        SERIES[index % SERIES.len()]
    }

    /// Blend a color toward the background.
    /// factor should be between 0.0 (no change) and 1.0 (background)
    pub fn fade(&self, color: Color, factor: f32) -> Color {
        let factor = factor.clamp(0.0, 1.0);
        match (color, self.background) {
            (Color::Rgb(r, g, b), Color::Rgb(br, bg, bb)) => {
                let mix = |c: u8, base: u8| (c as f32 + (base as f32 - c as f32) * factor) as u8;
                Color::Rgb(mix(r, br), mix(g, bg), mix(b, bb))
            }
            _ => color,
        }
    }
}
