//! Dashboard palette.

use ratatui::style::Color;

use crate::watch::Thresholds;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub title: Color,
    pub label: Color,
    pub text: Color,
    pub muted: Color,
    pub background: Color,
    pub surface: Color,
    pub border: Color,
    pub focus: Color,
    /// Below the remove level.
    pub calm: Color,
    /// Between the two levels.
    pub elevated: Color,
    /// At or above the add level.
    pub hot: Color,
    pub error: Color,
}

impl Theme {
    pub const fn dark() -> Self {
        Self {
            title: Color::from_u32(0x00ffff),
            label: Color::from_u32(0x008888),
            text: Color::from_u32(0xeeeeee),
            muted: Color::from_u32(0x888888),
            background: Color::from_u32(0x111111),
            surface: Color::from_u32(0x222222),
            border: Color::from_u32(0x225555),
            focus: Color::from_u32(0xffaa22),
            calm: Color::from_u32(0x00cc66),
            elevated: Color::from_u32(0xffd700),
            hot: Color::from_u32(0xff5533),
            error: Color::from_u32(0xff0000),
        }
    }

    pub fn cpu(&self, cpu: f64, thresholds: &Thresholds) -> Color {
        if cpu >= thresholds.add_level {
            self.hot
        } else if cpu > thresholds.remove_level {
            self.elevated
        } else {
            self.calm
        }
    }

    /// Alternate row background.
    pub fn stripe(&self, row: usize) -> Color {
        if row % 2 == 0 {
            self.surface
        } else {
            Self::darken(self.surface, 0.4)
        }
    }

    /// Blend towards black, `factor` in 0.0..=1.0.
    pub fn darken(color: Color, factor: f32) -> Color {
        let keep = 1.0 - factor.clamp(0.0, 1.0);
        match color {
            Color::Rgb(r, g, b) => Color::Rgb(
                (r as f32 * keep) as u8,
                (g as f32 * keep) as u8,
                (b as f32 * keep) as u8,
            ),
            _ => color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_colour_follows_thresholds() {
        let theme = Theme::dark();
        let levels = Thresholds::new(50.0, 25.0);
        assert_eq!(theme.cpu(50.0, &levels), theme.hot);
        assert_eq!(theme.cpu(30.0, &levels), theme.elevated);
        assert_eq!(theme.cpu(25.0, &levels), theme.calm);
    }

    #[test]
    fn stripes_alternate() {
        let theme = Theme::dark();
        assert_eq!(theme.stripe(0), theme.surface);
        assert_ne!(theme.stripe(1), theme.surface);
    }

    #[test]
    fn darken_halves() {
        assert_eq!(
            Theme::darken(Color::Rgb(200, 100, 50), 0.5),
            Color::Rgb(100, 50, 25)
        );
        assert_eq!(Theme::darken(Color::Reset, 0.5), Color::Reset);
    }
}
