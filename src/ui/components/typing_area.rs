use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CharStatus {
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

fn char_status(idx: usize, target: &[char], typed: &[char], active: bool) -> CharStatus {
    match typed.get(idx) {
        Some(&ch) if ch == target[idx] => CharStatus::Correct,
        Some(_) => CharStatus::Incorrect,
        None if active && idx == typed.len() => CharStatus::Cursor,
        None => CharStatus::Pending,
    }
}

/// Target paragraph with the typed prefix colored over it.
pub struct TypingArea<'a> {
    target: &'a [char],
    typed: &'a [char],
    active: bool,
    theme: &'a Theme,
}

impl<'a> TypingArea<'a> {
    pub fn new(target: &'a [char], typed: &'a [char], active: bool, theme: &'a Theme) -> Self {
        Self {
            target,
            typed,
            active,
            theme,
        }
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border))
            .style(Style::default().bg(colors.bg));

        if self.target.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Fetching a paragraph...",
                Style::default().fg(colors.untyped),
            )))
            .alignment(Alignment::Center)
            .block(block)
            .render(area, buf);
            return;
        }

        // Runs of equal status share one span.
        let mut spans: Vec<Span> = Vec::new();
        let mut run = String::new();
        let mut run_status = None;
        for (idx, &ch) in self.target.iter().enumerate() {
            let status = char_status(idx, self.target, self.typed, self.active);
            if run_status.is_some_and(|s| s != status) {
                spans.push(Span::styled(std::mem::take(&mut run), self.style(run_status)));
            }
            run_status = Some(status);
            run.push(ch);
        }
        if !run.is_empty() {
            spans.push(Span::styled(run, self.style(run_status)));
        }

        Paragraph::new(Line::from(spans))
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

impl TypingArea<'_> {
    fn style(&self, status: Option<CharStatus>) -> Style {
        let colors = &self.theme.colors;
        match status {
            Some(CharStatus::Correct) => Style::default().fg(colors.typed_ok),
            Some(CharStatus::Incorrect) => Style::default()
                .fg(colors.typed_wrong)
                .bg(colors.typed_wrong_bg)
                .add_modifier(Modifier::UNDERLINED),
            Some(CharStatus::Cursor) => Style::default()
                .fg(colors.cursor_fg)
                .bg(colors.cursor_bg),
            Some(CharStatus::Pending) | None => Style::default().fg(colors.untyped),
        }
    }
}
