use std::collections::HashSet;
use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::app::{App, Mode, Pending};
use crate::clock::Clock;
use crate::config::CURRENCY;
use crate::dashboard::Summary;
use crate::filter::ProjectFilter;
use crate::form::Field;
use crate::photos;
use crate::store::KeyValueStore;
use crate::task::{Priority, Task, TaskId};
use crate::theme::Palette;

const HELP: &str = "n new  e edit  x done  d delete  r restore  w share  / search  \
f status  p project  t due  s sort  a open-only  D +done  X +trash  T theme  q quit";

pub fn run_app<B, S, C>(terminal: &mut Terminal<B>, app: &mut App<S, C>) -> io::Result<()>
where
    B: Backend,
    S: KeyValueStore,
    C: Clock,
{
    loop {
        let fresh = app.take_fresh();
        terminal.draw(|f| draw(f, app, &fresh))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            handle_key(app, key);
            if app.should_quit {
                return Ok(());
            }
        }
    }
}

pub fn handle_key<S: KeyValueStore, C: Clock>(app: &mut App<S, C>, key: KeyEvent) {
    match app.mode {
        Mode::Browse => browse_key(app, key.code),
        Mode::Search => match key.code {
            KeyCode::Enter | KeyCode::Esc => app.mode = Mode::Browse,
            KeyCode::Backspace => {
                app.criteria.query.pop();
            }
            KeyCode::Char(c) => app.criteria.query.push(c),
            _ => {}
        },
        Mode::Form(field) => form_key(app, field, key.code),
        Mode::Confirm(_) => app.confirm(matches!(key.code, KeyCode::Char('y' | 'Y'))),
    }
}

fn browse_key<S: KeyValueStore, C: Clock>(app: &mut App<S, C>, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Esc => app.clear_selection(),
        KeyCode::Char('n') => app.start_new(),
        KeyCode::Enter | KeyCode::Char('e') => app.start_edit(),
        KeyCode::Char('x') | KeyCode::Char(' ') => app.toggle_done(),
        KeyCode::Char('d') => app.request_delete(),
        KeyCode::Char('r') => app.restore_selected(),
        KeyCode::Char('w') => app.share_selected(),
        KeyCode::Char('/') => app.mode = Mode::Search,
        KeyCode::Char('f') => app.cycle_status(),
        KeyCode::Char('p') => app.cycle_project(),
        KeyCode::Char('t') => app.cycle_date(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('a') => app.toggle_only_active(),
        KeyCode::Char('D') => app.toggle_include_done(),
        KeyCode::Char('X') => app.toggle_include_deleted(),
        KeyCode::Char('T') => app.toggle_theme(),
        _ => {}
    }
}

fn form_key<S: KeyValueStore, C: Clock>(app: &mut App<S, C>, field: Field, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.mode = Mode::Form(field.next()),
        KeyCode::BackTab | KeyCode::Up => app.mode = Mode::Form(field.prev()),
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') if field.is_choice() => {
            app.form.cycle(field)
        }
        KeyCode::Backspace => app.form.pop_char(field),
        KeyCode::Char(c) => app.form.push_char(field, c),
        _ => {}
    }
}

fn draw<S: KeyValueStore, C: Clock>(f: &mut Frame, app: &App<S, C>, fresh: &HashSet<TaskId>) {
    let palette = app.theme.palette();
    let base = Style::default().fg(palette.text).bg(palette.background);
    f.render_widget(Block::default().style(base), f.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[1]);
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(6), Constraint::Length(9)])
        .split(columns[1]);

    let summary = app.summary();
    draw_filters(f, app, &palette, rows[0]);
    draw_list(f, app, fresh, &palette, columns[0]);
    draw_details(f, app.selected_task(), &palette, side[0]);
    draw_dashboard(f, app, &summary, &palette, side[1]);
    draw_status(f, app, &summary, &palette, rows[2]);

    match app.mode {
        Mode::Form(field) => draw_form(f, app, field, &palette),
        Mode::Confirm(pending) => draw_confirm(f, pending, &palette),
        Mode::Browse | Mode::Search => {}
    }
}

fn block(title: impl Into<String>, palette: &Palette, focused: bool) -> Block<'static> {
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(palette.accent)
        } else {
            Style::default().fg(palette.muted)
        })
}

fn draw_filters<S, C>(f: &mut Frame, app: &App<S, C>, palette: &Palette, area: Rect) {
    let c = &app.criteria;
    let project = match &c.project {
        ProjectFilter::All => "all projects".to_string(),
        ProjectFilter::Named(name) => name.clone(),
    };
    let mut spans = vec![
        Span::raw(format!("Show: {}", c.status.label())),
        Span::raw(if c.only_active { " (open only)" } else { "" }),
        Span::raw(format!("  |  {project}  |  {}  |  sort: {}", c.date.label(), c.sort.label())),
        Span::raw("  |  search: "),
        Span::styled(c.query.clone(), Style::default().fg(palette.accent)),
    ];
    if app.mode == Mode::Search {
        spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
    }
    let widget = Paragraph::new(Line::from(spans))
        .block(block("Filters", palette, app.mode == Mode::Search));
    f.render_widget(widget, area);
}

fn draw_list<S: KeyValueStore, C: Clock>(
    f: &mut Frame,
    app: &App<S, C>,
    fresh: &HashSet<TaskId>,
    palette: &Palette,
    area: Rect,
) {
    let today = app.repo.clock().today();
    let view = app.view();
    let items: Vec<ListItem> = if view.is_empty() {
        vec![ListItem::new(Span::styled(
            "No tasks found. Press n to add one.",
            Style::default().fg(palette.muted),
        ))]
    } else {
        view.iter()
            .map(|t| ListItem::new(task_line(t, today, fresh.contains(&t.id), palette)))
            .collect()
    };

    let title = format!("Tasks ({})", view.len());
    let list = List::new(items)
        .block(block(title, palette, app.mode == Mode::Browse))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(app.selected_index());
    f.render_stateful_widget(list, area, &mut state);
}

fn task_line(t: &Task, today: chrono::NaiveDate, fresh: bool, palette: &Palette) -> Line<'static> {
    let (badge, badge_color) = if t.deleted {
        ("trash".to_string(), palette.muted)
    } else if t.done {
        ("done".to_string(), palette.done)
    } else if t.is_overdue(today) {
        ("overdue".to_string(), palette.overdue)
    } else {
        let color = match t.priority {
            Priority::High => palette.high,
            Priority::Normal => palette.text,
            Priority::Low => palette.low,
        };
        (t.priority.to_string(), color)
    };

    let mut title_style = Style::default().fg(palette.text);
    if t.done {
        title_style = title_style.fg(palette.done).add_modifier(Modifier::CROSSED_OUT);
    }
    if fresh {
        title_style = title_style.fg(palette.fresh).add_modifier(Modifier::BOLD);
    }

    let title = if t.title.is_empty() {
        "(untitled)".to_string()
    } else {
        t.title.clone()
    };
    let mut meta = Vec::new();
    if let Some(due) = t.due_date {
        meta.push(format!("due {due}"));
    }
    if !t.project.is_empty() {
        meta.push(t.project.clone());
    }
    if let Some(amount) = t.amount {
        meta.push(format_amount(amount));
    }

    Line::from(vec![
        Span::styled(format!("[{badge:^7}] "), Style::default().fg(badge_color)),
        Span::styled(title, title_style),
        Span::styled(
            if meta.is_empty() {
                String::new()
            } else {
                format!("  ({})", meta.join(", "))
            },
            Style::default().fg(palette.muted),
        ),
    ])
}

fn draw_details(f: &mut Frame, task: Option<&Task>, palette: &Palette, area: Rect) {
    let lines = match task {
        None => vec![Line::from(Span::styled(
            "Select a task to see its details",
            Style::default().fg(palette.muted),
        ))],
        Some(t) => {
            let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
            let date = |d: Option<chrono::NaiveDate>| d.map_or("-".to_string(), |d| d.to_string());
            let responsible = match (t.responsible_name.as_str(), t.responsible_phone.as_str()) {
                ("", "") => "-".to_string(),
                (name, "") => name.to_string(),
                (name, phone) => format!("{name} ({phone})").trim().to_string(),
            };
            let photo_bytes: usize = t.photos.iter().map(|p| photos::decoded_len(p)).sum();
            vec![
                field_line("Title", or_dash(&t.title), palette),
                field_line("Start", date(t.start_date), palette),
                field_line("Due", date(t.due_date), palette),
                field_line("State", t.state_label().to_string(), palette),
                field_line("Priority", t.priority.to_string(), palette),
                field_line("Project", or_dash(&t.project), palette),
                field_line("Responsible", responsible, palette),
                field_line("Repeat", t.repeat.to_string(), palette),
                field_line("Amount", t.amount.map_or("-".to_string(), format_amount), palette),
                field_line(
                    "Photos",
                    format!("{} ({} KiB)", t.photos.len(), photo_bytes / 1024),
                    palette,
                ),
                Line::from(""),
                Line::from(or_dash(&t.description)),
            ]
        }
    };
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block("Details", palette, false));
    f.render_widget(widget, area);
}

fn field_line(label: &str, value: String, palette: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:>12}: "), Style::default().fg(palette.muted)),
        Span::raw(value),
    ])
}

fn draw_dashboard<S, C>(f: &mut Frame, app: &App<S, C>, s: &Summary, palette: &Palette, area: Rect) {
    let on_off = |on: bool| if on { "on" } else { "off" };
    let lines = vec![
        Line::from(format!("Total {} (open {}, done {})", s.total, s.active, s.done)),
        Line::from(vec![
            Span::raw("Overdue open: "),
            Span::styled(s.overdue.to_string(), Style::default().fg(palette.overdue)),
        ]),
        Line::from(format!("Due today: {}   this week: {}", s.due_today, s.due_this_week)),
        Line::from(format!("Open by priority: high {}, normal {}, low {}", s.high, s.normal, s.low)),
        Line::from(format!(
            "Open amount {}   total {}",
            format_amount(s.active_amount),
            format_amount(s.total_amount)
        )),
        Line::from(Span::styled(
            format!(
                "(done {}, trash {})",
                on_off(app.toggles.include_done),
                on_off(app.toggles.include_deleted)
            ),
            Style::default().fg(palette.muted),
        )),
    ];
    f.render_widget(Paragraph::new(lines).block(block("Dashboard", palette, false)), area);
}

fn draw_status<S, C>(f: &mut Frame, app: &App<S, C>, s: &Summary, palette: &Palette, area: Rect) {
    let line = match &app.notice {
        Some(notice) => Line::from(Span::styled(
            notice.text.clone(),
            Style::default().fg(if notice.error { palette.overdue } else { palette.accent }),
        )),
        None => Line::from(vec![
            Span::raw(format!(
                "{} open / {} done / {} total  |  open {}  |  total {}    ",
                s.active,
                s.done,
                s.total,
                format_amount(s.active_amount),
                format_amount(s.total_amount)
            )),
            Span::styled(HELP, Style::default().fg(palette.muted)),
        ]),
    };
    f.render_widget(Paragraph::new(line).block(block("Status", palette, false)), area);
}

fn draw_form<S, C>(f: &mut Frame, app: &App<S, C>, current: Field, palette: &Palette) {
    let area = centered_rect(70, 80, f.area());
    let title = match app.form.editing() {
        Some(id) => format!("Edit task {id}  (Enter save, Esc close, Tab next field)"),
        None => "New task  (Enter save, Esc close, Tab next field)".to_string(),
    };

    let mut lines: Vec<Line> = Field::ALL
        .iter()
        .map(|&field| {
            let focused = field == current;
            let mut value = app.form.value(field);
            if focused {
                value.push_str(if field.is_choice() { "  <space to change>" } else { "_" });
            }
            let style = if focused {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            Line::from(vec![
                Span::styled(format!("{:>12}: ", field.label()), Style::default().fg(palette.muted)),
                Span::styled(value, style),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Dates as YYYY-MM-DD. Separate photo paths with ';'.",
        Style::default().fg(palette.muted),
    )));
    if let Some(notice) = app.notice.as_ref().filter(|n| n.error) {
        lines.push(Line::from(Span::styled(
            notice.text.clone(),
            Style::default().fg(palette.overdue),
        )));
    }

    f.render_widget(Clear, area);
    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block(title, palette, true).style(Style::default().bg(palette.background)));
    f.render_widget(widget, area);
}

fn draw_confirm(f: &mut Frame, pending: Pending, palette: &Palette) {
    let area = centered_rect(50, 20, f.area());
    let question = match pending {
        Pending::Trash(_) => "Move this task to the trash?",
        Pending::Purge(_) => "This task will be deleted for good. Continue?",
    };
    let widget = Paragraph::new(vec![Line::from(question), Line::from(""), Line::from("y / n")])
        .block(block("Confirm", palette, true).style(Style::default().bg(palette.background)));
    f.render_widget(Clear, area);
    f.render_widget(widget, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

pub fn format_amount(value: f64) -> String {
    format!("{value:.2} {CURRENCY}")
}
