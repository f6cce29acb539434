//! UI rendering for the chat view.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::models::Message;
use crate::room::RenderItem;

use super::ChatApp;

/// Height of the compose area: border + input + border.
const COMPOSE_HEIGHT: u16 = 3;

/// Returns status indicator symbol and color based on online state.
fn status_indicator(is_online: bool) -> (&'static str, Color) {
    if is_online {
        ("*", Color::Green)
    } else {
        ("o", Color::Red)
    }
}

/// Main render function.
pub fn render(frame: &mut Frame, app: &ChatApp) {
    let area = frame.area();

    let [header_area, messages_area, typing_area, compose_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(COMPOSE_HEIGHT),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(header_area, frame.buffer_mut(), app);
    render_messages(messages_area, frame.buffer_mut(), app);
    render_typing(typing_area, frame.buffer_mut(), app);
    render_compose(compose_area, frame, app);
    render_status(status_area, frame.buffer_mut(), app);
}

/// Header: room name on the left, online count and user on the right.
fn render_header(area: Rect, buf: &mut Buffer, app: &ChatApp) {
    let title = format!(" #{}", app.session.room_id);
    let right = format!(
        "{} online  {} ",
        app.session.presence().online_count(),
        app.session.local_username
    );

    let padding = (area.width as usize)
        .saturating_sub(title.width())
        .saturating_sub(right.width());

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, Style::default().fg(Color::Cyan)),
    ]);

    Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Messages pane: the conversation snapshot plus recent room notices,
/// pinned to the bottom.
fn render_messages(area: Rect, buf: &mut Buffer, app: &ChatApp) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let width = area.width as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();

    if app.history_pending {
        lines.push(Line::from(Span::styled(
            "Loading history...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    for item in app.session.conversation().snapshot() {
        match item {
            RenderItem::DateSeparator(date) => {
                let label = format!("--- {date} ---");
                let pad = width.saturating_sub(label.width()) / 2;
                lines.push(Line::from(Span::styled(
                    format!("{}{}", " ".repeat(pad), label),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            RenderItem::Message(msg) => {
                push_message_lines(&mut lines, msg, width);
            }
        }
    }

    for notice in app.session.notices() {
        lines.push(Line::from(Span::styled(
            format!("* {notice}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    // Keep the newest lines visible.
    let visible_height = area.height as usize;
    let skip = lines.len().saturating_sub(visible_height);
    for (row, line) in lines.into_iter().skip(skip).enumerate() {
        let y = area.y + row as u16;
        let line_area = Rect::new(area.x, y, area.width, 1);
        Paragraph::new(line).render(line_area, buf);
    }
}

/// Append the render lines for one message.
fn push_message_lines(lines: &mut Vec<Line<'static>>, msg: &Message, width: usize) {
    let sender_style = if msg.sent_by_local_user {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    };

    let prefix = format!("{} {}: ", msg.time, msg.sender_name);
    let prefix_width = prefix.width();

    let body = if msg.deleted {
        "This message was deleted".to_string()
    } else {
        // Media-only messages render with empty text, not a placeholder.
        msg.text.clone().unwrap_or_default()
    };

    let body_style = if msg.deleted {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC)
    } else {
        Style::default().fg(Color::Gray)
    };

    let indent = " ".repeat(prefix_width.min(8));
    let wrap_width = width.saturating_sub(prefix_width).max(10);
    let mut first = true;
    for chunk in wrap_text(&body, wrap_width) {
        if first {
            lines.push(Line::from(vec![
                Span::styled(prefix.clone(), sender_style),
                Span::styled(chunk, body_style),
            ]));
            first = false;
        } else {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(chunk, body_style),
            ]));
        }
    }
    if first {
        // Empty body (media-only): still show the prefix line.
        lines.push(Line::from(Span::styled(prefix.clone(), sender_style)));
    }

    if let Some(ref media) = msg.media {
        if !msg.deleted {
            let kind = if media.is_image() {
                "image"
            } else if media.is_video() {
                "video"
            } else {
                "file"
            };
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(
                    format!("[{kind}] {}", media.name),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::DIM),
                ),
            ]));
        }
    }

    if !msg.reactions.is_empty() {
        let tallies: Vec<String> = msg
            .reactions
            .iter()
            .map(|(reaction, users)| format!("{} {}", reaction, users.len()))
            .collect();
        lines.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(tallies.join("  "), Style::default().fg(Color::Yellow)),
        ]));
    }
}

/// Typing indicator line.
fn render_typing(area: Rect, buf: &mut Buffer, app: &ChatApp) {
    let text = app.session.presence().typing_line().unwrap_or_default();
    Paragraph::new(Line::from(Span::styled(
        format!(" {text}"),
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )))
    .render(area, buf);
}

/// Bordered input box with placeholder and cursor.
fn render_compose(area: Rect, frame: &mut Frame, app: &ChatApp) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let input_area = Rect::new(inner.x, inner.y, inner.width, 1);
    let width = input_area.width.saturating_sub(1) as usize;

    if app.compose.input.is_empty() {
        let placeholder = format!(" Message #{}...", app.session.room_id);
        let truncated: String = placeholder.chars().take(width).collect();
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                truncated,
                Style::default().fg(Color::DarkGray),
            ))),
            input_area,
        );
        frame.set_cursor_position((input_area.x + 1, input_area.y));
    } else {
        let (visible, cursor) = app.compose.display_window(width);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {visible}"),
                Style::default().fg(Color::White),
            ))),
            input_area,
        );
        frame.set_cursor_position((input_area.x + 1 + cursor as u16, input_area.y));
    }
}

/// Status bar: connection state, then hints (or an error/status message).
fn render_status(area: Rect, buf: &mut Buffer, app: &ChatApp) {
    if let Some(ref msg) = app.status_message {
        let style = if app.status_is_error {
            Style::default().fg(Color::Red).bg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Green).bg(Color::DarkGray)
        };
        Paragraph::new(Line::from(Span::styled(format!(" {msg} "), style)))
            .style(Style::default().bg(Color::DarkGray))
            .render(area, buf);
        return;
    }

    let (conn_symbol, conn_color) = status_indicator(app.is_online);
    let connection = Span::styled(
        format!(
            " {} {} ",
            conn_symbol,
            if app.is_online { "Online" } else { "Offline" }
        ),
        Style::default().fg(conn_color),
    );

    let sep_style = Style::default().fg(Color::DarkGray);
    let hints = Span::styled("Enter: send | Ctrl+U: clear | Esc: leave", Style::default().fg(Color::Gray));

    let status_line = Line::from(vec![connection, Span::styled("| ", sep_style), hints]);

    Paragraph::new(status_line)
        .style(Style::default().bg(Color::DarkGray))
        .render(area, buf);
}

/// Simple word-wrapping: split content by newlines first, then wrap long
/// lines. Fit checks use display width, not byte length, so wide glyphs
/// (emoji, CJK) wrap where they render.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || text.is_empty() {
        return vec![];
    }
    let mut result = Vec::new();
    for line in text.lines() {
        if line.width() <= max_width {
            result.push(line.to_string());
        } else {
            let mut current = String::new();
            let mut current_width = 0;
            for word in line.split_whitespace() {
                let word_width = word.width();
                if current.is_empty() {
                    current = word.to_string();
                    current_width = word_width;
                } else if current_width + 1 + word_width <= max_width {
                    current.push(' ');
                    current.push_str(word);
                    current_width += 1 + word_width;
                } else {
                    result.push(current);
                    current = word.to_string();
                    current_width = word_width;
                }
            }
            if !current.is_empty() {
                result.push(current);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_fits_by_display_width() {
        // Four CJK chars are 8 columns even though they fit in byte count.
        let lines = wrap_text("\u{4f60}\u{597d} \u{4e16}\u{754c}", 5);
        assert_eq!(lines, vec!["\u{4f60}\u{597d}", "\u{4e16}\u{754c}"]);
    }

    #[test]
    fn test_wrap_text_ascii_word_boundaries() {
        let lines = wrap_text("one two three", 7);
        assert_eq!(lines, vec!["one two", "three"]);
        assert!(lines.iter().all(|l| l.width() <= 7));
    }

    #[test]
    fn test_wrap_text_keeps_short_lines_intact() {
        assert_eq!(wrap_text("hi\nthere", 10), vec!["hi", "there"]);
        assert!(wrap_text("", 10).is_empty());
    }
}
