//! Panel theme.

use common::LogType;

/// Color in RGBA format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// CSS color value.
    pub fn to_css(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.r,
                self.g,
                self.b,
                self.a as f32 / 255.0
            )
        }
    }
}

/// Panel theme.
#[derive(Clone, Debug, PartialEq)]
pub struct UiTheme {
    pub name: &'static str,
    pub is_dark: bool,
    pub colors: ThemeColors,
}

/// Theme colors.
#[derive(Clone, Debug, PartialEq)]
pub struct ThemeColors {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub muted: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub debug: Color,
    pub pinned_background: Color,
}

impl UiTheme {
    pub fn light() -> Self {
        Self {
            name: "Light",
            is_dark: false,
            colors: ThemeColors {
                background: Color::rgb(255, 255, 255),
                foreground: Color::rgb(33, 33, 33),
                border: Color::rgb(218, 220, 224),
                muted: Color::rgb(95, 99, 104),
                error: Color::rgb(234, 67, 53),
                warning: Color::rgb(176, 96, 0),
                info: Color::rgb(66, 133, 244),
                debug: Color::rgb(128, 134, 139),
                pinned_background: Color::rgba(66, 133, 244, 26),
            },
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "Dark",
            is_dark: true,
            colors: ThemeColors {
                background: Color::rgb(32, 33, 36),
                foreground: Color::rgb(232, 234, 237),
                border: Color::rgb(60, 64, 67),
                muted: Color::rgb(154, 160, 166),
                error: Color::rgb(242, 139, 130),
                warning: Color::rgb(253, 214, 99),
                info: Color::rgb(138, 180, 248),
                debug: Color::rgb(154, 160, 166),
                pinned_background: Color::rgba(138, 180, 248, 38),
            },
        }
    }

    pub fn for_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Text color for a log type.
    pub fn color_for(&self, log_type: LogType) -> Color {
        match log_type {
            LogType::Error => self.colors.error,
            LogType::Warn => self.colors.warning,
            LogType::Info => self.colors.info,
            LogType::Debug => self.colors.debug,
            LogType::Log | LogType::Group | LogType::GroupEnd => self.colors.foreground,
        }
    }

    /// CSS custom properties for the panel root.
    pub fn css_variables(&self, font_family: &str, font_size: u32) -> String {
        format!(
            "--fc-bg: {}; --fc-fg: {}; --fc-border: {}; --fc-muted: {}; \
             --fc-error: {}; --fc-warn: {}; --fc-info: {}; --fc-debug: {}; \
             --fc-pinned-bg: {}; --fc-font-family: {}; --fc-font-size: {}px;",
            self.colors.background.to_css(),
            self.colors.foreground.to_css(),
            self.colors.border.to_css(),
            self.colors.muted.to_css(),
            self.colors.error.to_css(),
            self.colors.warning.to_css(),
            self.colors.info.to_css(),
            self.colors.debug.to_css(),
            self.colors.pinned_background.to_css(),
            font_family,
            font_size
        )
    }
}

impl Default for UiTheme {
    fn default() -> Self {
        Self::light()
    }
}
