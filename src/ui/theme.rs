use ratatui::style::Color;

/// Colours the widgets draw with. There is one built-in palette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    /// Typed characters that match the paragraph.
    pub typed_ok: Color,
    pub typed_wrong: Color,
    pub typed_wrong_bg: Color,
    /// Paragraph text not reached yet, and secondary labels.
    pub untyped: Color,
    pub cursor_fg: Color,
    pub cursor_bg: Color,
    pub accent: Color,
    pub border: Color,
    pub focus: Color,
    pub title_fg: Color,
    pub title_bg: Color,
    pub progress: Color,
    pub progress_track: Color,
    pub error: Color,
    pub warning: Color,
    pub success: Color,
}

impl Palette {
    /// Dark slate with a warm cursor, easy on the eyes for long paragraphs.
    pub const SLATE: Palette = Palette {
        bg: Color::Rgb(0x1b, 0x21, 0x29),
        fg: Color::Rgb(0xd8, 0xde, 0xe6),
        typed_ok: Color::Rgb(0x7f, 0xc8, 0xa9),
        typed_wrong: Color::Rgb(0xef, 0x7b, 0x6f),
        typed_wrong_bg: Color::Rgb(0x4a, 0x26, 0x26),
        untyped: Color::Rgb(0x6b, 0x76, 0x85),
        cursor_fg: Color::Rgb(0x1b, 0x21, 0x29),
        cursor_bg: Color::Rgb(0xe8, 0xc1, 0x70),
        accent: Color::Rgb(0x6c, 0xb6, 0xd9),
        border: Color::Rgb(0x3a, 0x43, 0x50),
        focus: Color::Rgb(0xe8, 0xc1, 0x70),
        title_fg: Color::Rgb(0xe8, 0xc1, 0x70),
        title_bg: Color::Rgb(0x25, 0x2d, 0x38),
        progress: Color::Rgb(0x6c, 0xb6, 0xd9),
        progress_track: Color::Rgb(0x2d, 0x36, 0x42),
        error: Color::Rgb(0xef, 0x7b, 0x6f),
        warning: Color::Rgb(0xe8, 0xa3, 0x5a),
        success: Color::Rgb(0x7f, 0xc8, 0xa9),
    };
}

#[derive(Clone, Debug)]
pub struct Theme {
    pub colors: Palette,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: Palette::SLATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_feedback_colours_are_distinct() {
        let p = Theme::default().colors;
        let feedback = [p.typed_ok, p.typed_wrong, p.untyped, p.cursor_bg];
        for (i, a) in feedback.iter().enumerate() {
            for b in &feedback[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_ne!(p.cursor_fg, p.cursor_bg);
        assert_ne!(p.typed_wrong_bg, p.bg);
        assert_ne!(p.progress, p.progress_track);
    }
}
