use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use typedsa::session::selection::{ALL_TIME_BUDGETS, ALL_TOPICS};

use crate::app::{SetupField, SetupState};
use crate::ui::theme::Theme;

/// Topic and time-limit pickers for the setup screen.
pub struct Selector<'a> {
    setup: &'a SetupState,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> Selector<'a> {
    pub fn new(setup: &'a SetupState, error: Option<&'a str>, theme: &'a Theme) -> Self {
        Self {
            setup,
            error,
            theme,
        }
    }

    fn option_lines<'b>(&self, labels: &[&'b str], selected: usize, focused: bool) -> Vec<Line<'b>> {
        let colors = &self.theme.colors;
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let is_selected = i == selected;
                let indicator = if is_selected { ">" } else { " " };
                let style = if is_selected && focused {
                    Style::default()
                        .fg(colors.accent)
                        .add_modifier(Modifier::BOLD)
                } else if is_selected {
                    Style::default().fg(colors.fg).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(colors.untyped)
                };
                Line::from(Span::styled(format!(" {indicator} {label}"), style))
            })
            .collect()
    }
}

impl Widget for Selector<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border))
            .style(Style::default().bg(colors.bg));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(4),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(vec![
            Line::from(Span::styled(
                "typedsa",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Typing practice on interview topics",
                Style::default().fg(colors.fg),
            )),
        ])
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(layout[1]);

        let topic_focus = self.setup.field == SetupField::Topic;
        let topic_labels: Vec<&str> = ALL_TOPICS.iter().map(|t| t.label()).collect();
        let budget_labels: Vec<&str> = ALL_TIME_BUDGETS.iter().map(|b| b.label()).collect();

        let panes = [
            (
                " Topic ",
                self.option_lines(&topic_labels, self.setup.topic_idx, topic_focus),
                topic_focus,
            ),
            (
                " Time limit ",
                self.option_lines(&budget_labels, self.setup.budget_idx, !topic_focus),
                !topic_focus,
            ),
        ];

        for ((title, lines, focused), rect) in panes.into_iter().zip(columns.iter()) {
            let border = if focused {
                colors.focus
            } else {
                colors.border
            };
            Paragraph::new(lines)
                .block(
                    Block::bordered()
                        .title(title)
                        .border_style(Style::default().fg(border)),
                )
                .render(*rect, buf);
        }

        if let Some(error) = self.error {
            Paragraph::new(Line::from(Span::styled(
                error,
                Style::default().fg(colors.error),
            )))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(layout[2], buf);
        }
    }
}
