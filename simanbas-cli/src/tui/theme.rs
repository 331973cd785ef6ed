use ratatui::style::Color;

pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight: Color,
    pub difficulty: Color,
    pub discrimination: Color,
    pub scatter: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::White,
            highlight: Color::Yellow,
            difficulty: Color::Cyan,
            discrimination: Color::Magenta,
            scatter: Color::LightBlue,
            error: Color::Red,
            warning: Color::LightYellow,
            success: Color::LightGreen,
        }
    }
    pub fn light() -> Self {
        Self {
            bg: Color::White,
            fg: Color::Black,
            highlight: Color::Blue,
            difficulty: Color::DarkGray,
            discrimination: Color::Magenta,
            scatter: Color::Blue,
            error: Color::Red,
            warning: Color::Yellow,
            success: Color::Green,
        }
    }
    pub fn nord() -> Self {
        Self {
            bg: Color::Rgb(46, 52, 64),
            fg: Color::Rgb(216, 222, 233),
            highlight: Color::Rgb(136, 192, 208),
            difficulty: Color::Rgb(129, 161, 193),
            discrimination: Color::Rgb(180, 142, 173),
            scatter: Color::Rgb(143, 188, 187),
            error: Color::Rgb(191, 97, 106),
            warning: Color::Rgb(235, 203, 139),
            success: Color::Rgb(163, 190, 140),
        }
    }
    // Okabe-Ito palette
    pub fn colorblind() -> Self {
        Self {
            bg: Color::Black,
            fg: Color::White,
            highlight: Color::Yellow,
            difficulty: Color::Rgb(0x56, 0xB4, 0xE9),
            discrimination: Color::Rgb(0xCC, 0x79, 0xA7),
            scatter: Color::Rgb(0xE6, 0x9F, 0x00),
            error: Color::Rgb(0xD5, 0x5E, 0x00), // vermillion instead of red
            warning: Color::Rgb(0xF0, 0xE4, 0x42),
            success: Color::Rgb(0x00, 0x72, 0xB2), // blue instead of green
        }
    }
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "nord" => Self::nord(),
            "colorblind" => Self::colorblind(),
            _ => Self::dark(),
        }
    }
}
