use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, ListState, Paragraph, Wrap};

use crate::app::{App, ConfirmState, StatusMessage, View};
use crate::config::InsertMode;
use crate::models::{Segment, Template, TreeItem, VariableType};
use crate::parser::render_segments;

const ICON_FOLDER: &str = "";
const ICON_TEMPLATE: &str = "󰈙";
const SELECTED_MARKER: &str = " ";
const UNSELECTED_MARKER: &str = "  ";
const TREE_BRANCH: &str = "├─ ";
const TREE_LAST: &str = "└─ ";
const TREE_PIPE: &str = "│  ";
const TREE_EMPTY: &str = "   ";

pub(crate) fn render_app(frame: &mut Frame, app: &mut App) {
    match app.view {
        View::List => render_list(frame, app),
        View::Confirm => render_confirm(frame, app),
    }
}

fn render_list(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);

    let search_area = layout[0];
    let list_area = layout[1];
    let help_area = layout[2];

    let search = Paragraph::new(format!("{}|", app.query))
        .block(Block::bordered().title("Search templates"));
    frame.render_widget(search, search_area);

    let title = format!("Templates ({})", app.visible.len());
    let block = Block::bordered().title(title);
    let inner = block.inner(list_area);
    app.tree_area = inner;

    let view_height = inner.height as usize;
    app.list_scroll = scroll_to_show(
        app.list_scroll,
        app.list_state.selected().unwrap_or(0),
        app.tree_items.len(),
        view_height,
    );

    let start = app.list_scroll;
    let end = (start + view_height).min(app.tree_items.len());
    let tree_lines = build_tree_lines(&app.tree_items, &app.visible);
    let visible = &tree_lines[start..end];
    let selected = app.list_state.selected().unwrap_or(0);

    let items: Vec<ListItem> = visible
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let is_selected = start + idx == selected;
            let marker = if is_selected {
                SELECTED_MARKER
            } else {
                UNSELECTED_MARKER
            };
            ListItem::new(format!("{marker}{line}"))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::new().bg(Color::Blue).fg(Color::White))
        .highlight_symbol("");

    let mut state = ListState::default();
    if let Some(selected) = app.list_state.selected() {
        if selected >= start && selected < end {
            state.select(Some(selected - start));
        }
    }
    frame.render_stateful_widget(list, list_area, &mut state);

    let mut help = "↑↓ select  Enter open  Ctrl+A active  Ctrl+D delete  Esc clear/quit".to_string();
    if let Some(message) = fresh(app.list_status.as_ref(), app.status_duration) {
        help.push_str("  |  ");
        help.push_str(&message.text);
    }
    let help = Paragraph::new(help).style(Style::new().fg(Color::DarkGray));
    frame.render_widget(help, help_area);
}

fn render_confirm(frame: &mut Frame, app: &mut App) {
    let insert_mode = app.insert_mode;
    let status_duration = app.status_duration;
    let confirm = match app.confirm.as_mut() {
        Some(confirm) => confirm,
        None => return,
    };

    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Fill(1), Constraint::Length(1)])
        .split(area);

    let content_area = layout[0];
    let status_area = layout[1];

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(content_area);

    let form_area = horizontal[0];
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(horizontal[1]);

    render_fields(frame, confirm, form_area);
    render_inline(frame, confirm, right[0]);
    let rendered = render_segments(confirm.bindings.segments(), &confirm.bindings.values());
    let title = match insert_mode {
        InsertMode::Clipboard => "Output (Enter copies)",
        InsertMode::Stdout => "Output (Enter prints)",
    };
    render_preview(frame, title, &rendered, right[1]);

    let mut status = "Esc back  Tab/↑↓ field  ←→ option  Enter insert  Ctrl+C copy".to_string();
    if let Some(message) = fresh(confirm.status.as_ref(), status_duration) {
        status.push_str("  |  ");
        status.push_str(&message.text);
    }
    let status = Paragraph::new(status).style(Style::new().fg(Color::DarkGray));
    frame.render_widget(status, status_area);
}

fn render_fields(frame: &mut Frame, confirm: &mut ConfirmState, area: Rect) {
    let block = Block::bordered().title("Fields");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let fields = confirm.bindings.fields();
    if fields.is_empty() {
        let empty = Paragraph::new("No fields. Enter inserts the text as is.")
            .style(Style::new().fg(Color::DarkGray))
            .wrap(Wrap { trim: false });
        frame.render_widget(empty, inner);
        return;
    }

    let field_height: u16 = 3;
    let view_capacity = (inner.height / field_height) as usize;
    confirm.field_scroll = scroll_to_show(
        confirm.field_scroll,
        confirm.active_field,
        fields.len(),
        view_capacity,
    );

    let start = confirm.field_scroll;
    let end = (start + view_capacity).min(fields.len());

    for (idx, field) in fields[start..end].iter().enumerate() {
        let is_active = start + idx == confirm.active_field;
        let border_style = if is_active {
            Style::new().fg(Color::Blue)
        } else {
            Style::new().fg(Color::DarkGray)
        };
        let mut value = field.value.clone();
        if is_active {
            value.push('|');
        }
        let mut title = field.label.clone();
        if field.required {
            title.push_str(" *");
        }
        if field.kind == VariableType::Select && !field.options.is_empty() {
            title.push_str(" ←→");
        }
        let field_area = Rect {
            x: inner.x,
            y: inner.y + (idx as u16) * field_height,
            width: inner.width,
            height: field_height,
        };
        let field_block = Block::bordered()
            .title(title)
            .border_style(border_style);
        let paragraph = Paragraph::new(value)
            .block(field_block)
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, field_area);
    }
}

/// The template text with each placeholder shown as its current value.
fn render_inline(frame: &mut Frame, confirm: &ConfirmState, area: Rect) {
    let active = confirm.active_name();
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Vec<Span> = Vec::new();

    for segment in confirm.bindings.segments() {
        match segment {
            Segment::Literal(text) => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    current.push(Span::raw(first.to_string()));
                }
                for part in parts {
                    lines.push(Line::from(std::mem::take(&mut current)));
                    current.push(Span::raw(part.to_string()));
                }
            }
            Segment::Placeholder(name) => {
                let value = confirm.bindings.value(name);
                let shown = if value.is_empty() {
                    format!("{{{name}}}")
                } else {
                    value.to_string()
                };
                let style = if active == Some(name.as_str()) {
                    Style::new()
                        .fg(Color::White)
                        .bg(Color::Blue)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::new().fg(Color::Green)
                };
                current.push(Span::styled(shown, style));
            }
        }
    }
    lines.push(Line::from(current));

    let paragraph = Paragraph::new(lines)
        .block(Block::bordered().title(confirm.template.title.as_str()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_preview(frame: &mut Frame, title: &str, rendered: &str, area: Rect) {
    let paragraph = Paragraph::new(rendered)
        .block(Block::bordered().title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn fresh(message: Option<&StatusMessage>, duration: Duration) -> Option<&StatusMessage> {
    message.filter(|msg| msg.since.elapsed() <= duration)
}

/// First row to draw so that `selected` stays on screen.
fn scroll_to_show(scroll: usize, selected: usize, total: usize, rows: usize) -> usize {
    if total == 0 || rows == 0 {
        return 0;
    }
    let lowest = (selected + 1).saturating_sub(rows);
    scroll.min(total - 1).clamp(lowest, selected)
}

fn build_tree_lines(items: &[TreeItem], templates: &[Template]) -> Vec<String> {
    let mut lines = Vec::with_capacity(items.len());
    let mut branches: Vec<bool> = Vec::new();
    for (index, item) in items.iter().enumerate() {
        branches.truncate(item.depth);
        let is_last = is_last_sibling(items, index);
        let template = item
            .template_id
            .and_then(|id| templates.iter().find(|template| template.id == id));
        let icon = if template.is_some() {
            ICON_TEMPLATE
        } else {
            ICON_FOLDER
        };

        let mut line = String::new();
        for has_next in &branches {
            if *has_next {
                line.push_str(TREE_PIPE);
            } else {
                line.push_str(TREE_EMPTY);
            }
        }

        if is_last {
            line.push_str(TREE_LAST);
        } else {
            line.push_str(TREE_BRANCH);
        }
        line.push_str(icon);
        line.push(' ');
        line.push_str(&item.label);
        if let Some(template) = template {
            line.push_str(&format!(
                "  {}  {} uses",
                template.trigger, template.usage_count
            ));
            if !template.is_active {
                line.push_str("  (inactive)");
            }
        }
        lines.push(line);

        branches.push(!is_last);
    }
    lines
}

/// No later sibling follows before the parent's subtree ends.
fn is_last_sibling(items: &[TreeItem], index: usize) -> bool {
    let depth = items[index].depth;
    items[index + 1..]
        .iter()
        .find(|item| item.depth <= depth)
        .is_none_or(|item| item.depth < depth)
}
