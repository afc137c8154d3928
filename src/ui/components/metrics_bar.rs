use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use typedsa::engine::metrics::Metrics;

use crate::ui::theme::Theme;

/// Formats a second count as `m:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Live timer, speed, and accuracy readout with a completion bar.
pub struct MetricsBar<'a> {
    clock_label: &'static str,
    seconds: u32,
    metrics: Metrics,
    ratio: f64,
    theme: &'a Theme,
}

impl<'a> MetricsBar<'a> {
    pub fn new(
        counting_down: bool,
        seconds: u32,
        metrics: Metrics,
        ratio: f64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            clock_label: if counting_down { "Left" } else { "Time" },
            seconds,
            metrics,
            ratio: ratio.clamp(0.0, 1.0),
            theme,
        }
    }
}

impl Widget for MetricsBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered().border_style(Style::default().fg(colors.border));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(inner);

        let label = Style::default().fg(colors.untyped);
        let value = Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD);
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {} ", self.clock_label), label),
            Span::styled(format_clock(self.seconds), value),
            Span::styled("  WPM ", label),
            Span::styled(self.metrics.wpm.to_string(), value),
            Span::styled("  Acc ", label),
            Span::styled(format!("{:.1}%", self.metrics.accuracy), value),
        ]))
        .render(columns[0], buf);

        let bar = columns[1];
        if bar.width == 0 {
            return;
        }
        let filled_width = (self.ratio * bar.width as f64) as u16;
        for x in bar.x..bar.x + bar.width {
            let style = if x < bar.x + filled_width {
                Style::default().fg(colors.bg).bg(colors.progress)
            } else {
                Style::default().fg(colors.fg).bg(colors.progress_track)
            };
            buf[(x, bar.y)].set_style(style);
        }
        let pct = format!("{:.0}%", self.ratio * 100.0);
        let label_x = bar.x + (bar.width.saturating_sub(pct.len() as u16)) / 2;
        buf.set_string(label_x, bar.y, &pct, Style::default().fg(colors.fg));
    }
}
