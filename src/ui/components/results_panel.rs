use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use typedsa::engine::metrics::Metrics;
use typedsa::session::machine::FinishReason;
use typedsa::session::selection::{TimeBudget, Topic};

use crate::ui::components::metrics_bar::format_clock;
use crate::ui::theme::Theme;

pub struct ResultsSummary<'a> {
    pub metrics: Metrics,
    pub reason: Option<FinishReason>,
    pub topic: Option<Topic>,
    pub time_budget: Option<TimeBudget>,
    pub elapsed_secs: u32,
    pub typed_chars: usize,
    pub target_chars: usize,
    pub saved_as: Option<&'a str>,
    pub notice: Option<&'a str>,
}

pub fn reason_text(reason: Option<FinishReason>) -> &'static str {
    match reason {
        Some(FinishReason::BufferComplete) => "Paragraph complete",
        Some(FinishReason::TimeExhausted) => "Time's up",
        Some(FinishReason::ManualStop) => "Stopped",
        None => "Finished",
    }
}

pub struct ResultsPanel<'a> {
    summary: ResultsSummary<'a>,
    theme: &'a Theme,
}

impl<'a> ResultsPanel<'a> {
    pub fn new(summary: ResultsSummary<'a>, theme: &'a Theme) -> Self {
        Self { summary, theme }
    }
}

impl Widget for ResultsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let s = &self.summary;

        let block = Block::bordered()
            .title(format!(" {} ", reason_text(s.reason)))
            .border_style(Style::default().fg(colors.accent))
            .style(Style::default().bg(colors.bg));

        let label = Style::default().fg(colors.untyped);
        let big = Style::default()
            .fg(colors.accent)
            .add_modifier(Modifier::BOLD);
        let plain = Style::default().fg(colors.fg);

        let topic = s.topic.map(|t| t.label()).unwrap_or("-");
        let budget = s.time_budget.map(|b| b.label()).unwrap_or("-");

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("WPM ", label),
                Span::styled(s.metrics.wpm.to_string(), big),
                Span::styled("    Accuracy ", label),
                Span::styled(format!("{:.1}%", s.metrics.accuracy), big),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled("Topic ", label),
                Span::styled(topic, plain),
                Span::styled("   Limit ", label),
                Span::styled(budget, plain),
            ]),
            Line::from(vec![
                Span::styled("Time ", label),
                Span::styled(format_clock(s.elapsed_secs), plain),
                Span::styled("   Typed ", label),
                Span::styled(format!("{}/{}", s.typed_chars, s.target_chars), plain),
            ]),
            Line::from(""),
        ];

        match (s.notice, s.saved_as) {
            (Some(notice), _) => lines.push(Line::from(Span::styled(
                notice,
                Style::default().fg(colors.warning),
            ))),
            (None, Some(user)) => lines.push(Line::from(Span::styled(
                format!("Saved for {user}"),
                Style::default().fg(colors.success),
            ))),
            (None, None) => lines.push(Line::from(Span::styled(
                "Not saved: no user configured",
                label,
            ))),
        }

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}
