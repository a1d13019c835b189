use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, Field};
use crate::calendar::{range, WEEK_LEN};
use crate::dates::{CalendarDay, DateUtilities, Period};
use crate::picker::PickerLayout;
use crate::theme::ThemeConfig;

const FIELD_WIDTH:  u16 = 30;
const FIELD_HEIGHT: u16 = 3;
const CELL_WIDTH:   u16 = 4;
/// Borders plus seven day cells.
const POPOVER_WIDTH: u16 = 2 + CELL_WIDTH * WEEK_LEN as u16;

const WEEKDAYS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Draws the form and returns each field's hit-test layout, in field order.
pub fn draw(f: &mut Frame, app: &App) -> Vec<PickerLayout> {
    let area = f.area();
    let t    = &app.theme;

    f.render_widget(
        Block::default().style(Style::default().bg(t.bg()).fg(t.fg())),
        area,
    );

    // Layout: [ header(2) | form | status_bar(1) ]
    let root = Layout::default().direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    draw_header(f, app, root[0]);

    let inputs = field_rects(root[1], app.fields.len());
    for (i, (field, rect)) in app.fields.iter().zip(&inputs).enumerate() {
        draw_input(f, t, field, *rect, i == app.focus);
    }

    draw_statusbar(f, app, root[2]);

    // Popovers go last so they overlay the fields below them.
    app.fields.iter().zip(inputs).map(|(field, input)| {
        if !field.picker.is_open() {
            return PickerLayout { input, ..Default::default() };
        }
        let weeks  = field.picker.weeks();
        let layout = layout_picker(input, area, &weeks);
        draw_popover(f, t, field, &weeks, &layout);
        layout
    }).collect()
}

fn field_rects(form: Rect, count: usize) -> Vec<Rect> {
    (0..count as u16).map(|i| {
        Rect::new(
            form.x + 2,
            form.y + i * FIELD_HEIGHT,
            FIELD_WIDTH.min(form.width.saturating_sub(2)),
            FIELD_HEIGHT,
        ).intersection(form)
    }).collect()
}

/// Places the popover under `input` (or above it when the screen runs out)
/// and computes where the arrows and day cells land.
pub fn layout_picker(input: Rect, screen: Rect, weeks: &[Vec<CalendarDay>]) -> PickerLayout {
    let h = 4 + weeks.len() as u16;
    let w = POPOVER_WIDTH.min(screen.width);
    let y = if input.bottom() + h <= screen.bottom() {
        input.bottom()
    } else {
        input.y.saturating_sub(h).max(screen.y)
    };
    let x = input.x.min(screen.right().saturating_sub(w));

    let popover = Rect::new(x, y, w, h).intersection(screen);
    let inner   = Block::default().borders(Borders::ALL).inner(popover);

    let cells = weeks.iter().enumerate().flat_map(|(row, week)| {
        week.iter().enumerate().map(move |(col, day)| {
            let cell = Rect::new(
                inner.x + col as u16 * CELL_WIDTH,
                inner.y + 2 + row as u16,
                CELL_WIDTH,
                1,
            );
            (cell.intersection(inner), day.date)
        })
    }).filter(|(r, _)| !r.is_empty()).collect();

    PickerLayout {
        input,
        popover: Some(popover),
        prev:    Rect::new(inner.x + 1, inner.y, 1, 1).intersection(inner),
        next:    Rect::new(inner.right().saturating_sub(2), inner.y, 1, 1).intersection(inner),
        cells,
    }
}

// ─── Header / status ──────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let line = Line::from(vec![
        Span::styled(" Date picker ", Style::default().fg(t.accent()).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" format: {}", app.display_format), Style::default().fg(t.fg_dim())),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_statusbar(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let bar = Paragraph::new(Line::from(vec![
        Span::styled(
            " Tab:next field  Enter/↓:open  ←↓↑→:move  PgUp/PgDn:month  Enter:pick  Esc:close  ^q:quit",
            Style::default().fg(t.fg_dim()),
        ),
        Span::styled(
            format!("  {}", app.status),
            Style::default().fg(t.fg_dim()).add_modifier(Modifier::ITALIC),
        ),
    ])).style(Style::default().bg(t.bg2()));
    f.render_widget(bar, area);
}

// ─── Input box ────────────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, t: &ThemeConfig, field: &Field, area: Rect, focused: bool) {
    let picker   = &field.picker;
    let disabled = picker.is_disabled();
    let border   = if focused && !disabled { t.border_active() } else { t.border() };
    let arrow    = if picker.is_open() { " ▴ " } else { " ▾ " };

    let block = Block::default()
        .title(Title::from(Span::styled(format!(" {} ", field.label), Style::default().fg(t.accent()))))
        .title(Title::from(arrow).alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_type(t.border_type())
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(t.bg()));

    let value = picker.model_value();
    let mut spans = if value.is_empty() {
        vec![Span::styled(picker.placeholder().to_owned(), Style::default().fg(t.fg_dim()))]
    } else if disabled {
        vec![Span::styled(value.to_owned(), Style::default().fg(t.disabled_color()))]
    } else {
        vec![Span::styled(value.to_owned(), Style::default().fg(t.fg()))]
    };
    if focused && !disabled {
        spans.insert(usize::from(!value.is_empty()), Span::styled("█", Style::default().fg(t.fg())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

// ─── Popover ──────────────────────────────────────────────────────────────────

fn draw_popover(
    f:      &mut Frame,
    t:      &ThemeConfig,
    field:  &Field,
    weeks:  &[Vec<CalendarDay>],
    layout: &PickerLayout,
) {
    let Some(rect) = layout.popover else { return };
    f.render_widget(Clear, rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(t.border_type())
        .border_style(Style::default().fg(t.border_active()))
        .style(Style::default().bg(t.popup_bg()));
    let inner = block.inner(rect);
    f.render_widget(block, rect);
    if inner.height == 0 { return; }

    let period = field.picker.period();
    let acc    = Style::default().fg(t.accent()).add_modifier(Modifier::BOLD);
    f.render_widget(
        Paragraph::new(period_title(period)).style(acc).alignment(Alignment::Center),
        Rect { height: 1, ..inner },
    );
    f.render_widget(Paragraph::new("‹").style(acc), layout.prev);
    f.render_widget(Paragraph::new("›").style(acc), layout.next);

    let mut lines: Vec<Line> = vec![];
    let hdrs: Vec<Span> = range(0, WEEK_LEN as i32 - 1).into_iter().map(|i| {
        let style = if i == 0 || i == 6 {
            Style::default().fg(t.weekend_color()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg_dim()).add_modifier(Modifier::BOLD)
        };
        Span::styled(format!(" {} ", WEEKDAYS[i as usize]), style)
    }).collect();
    lines.push(Line::from(hdrs));

    let cursor = field.picker.cursor();
    for week in weeks {
        let spans: Vec<Span> = week.iter().enumerate().map(|(col, day)| {
            Span::styled(format!(" {:2} ", day.date.day()), day_style(t, day, col, day.date == cursor))
        }).collect();
        lines.push(Line::from(spans));
    }

    let body = Rect { y: inner.y + 1, height: inner.height.saturating_sub(1), ..inner };
    f.render_widget(Paragraph::new(lines), body);
}

fn day_style(t: &ThemeConfig, day: &CalendarDay, col: usize, cursor: bool) -> Style {
    let mut style = if day.is_selected {
        let (bg, fg) = t.selected_highlight();
        Style::default().bg(bg).fg(fg).add_modifier(Modifier::BOLD)
    } else if day.is_today {
        let (bg, fg) = t.today_highlight();
        Style::default().bg(bg).fg(fg)
    } else if day.disabled {
        Style::default().fg(t.disabled_color()).add_modifier(Modifier::CROSSED_OUT)
    } else if !day.in_current_month {
        Style::default().fg(t.outside_color())
    } else if col == 0 || col == WEEK_LEN - 1 {
        Style::default().fg(t.weekend_color())
    } else {
        Style::default().fg(t.fg())
    };
    if cursor { style = style.add_modifier(Modifier::REVERSED); }
    style
}

fn period_title(p: Period) -> String {
    format!("{} {}", month_name(p.month + 1), p.year)
}

// ─── Plain-text month (for `dp month`) ───────────────────────────────────────

/// The month as text: `[d]` marks the selected day, `(d)` today, and
/// disabled days print as `-`.
pub fn month_text(
    utils:       &DateUtilities,
    period:      Period,
    value:       &str,
    today:       NaiveDate,
    is_disabled: &dyn Fn(NaiveDate) -> bool,
) -> String {
    let weeks = utils.calendar_weeks(period, value, today, is_disabled);
    let width = CELL_WIDTH as usize * WEEK_LEN;

    let mut out = format!("{:^width$}\n", period_title(period));
    out.push_str(&WEEKDAYS.iter().map(|d| format!(" {d} ")).collect::<String>());
    out.push('\n');
    for week in weeks {
        let row: String = week.iter().map(|d| {
            let n = d.date.day();
            if d.is_selected      { format!("[{n:>2}]") }
            else if d.is_today    { format!("({n:>2})") }
            else if d.disabled    { "  - ".to_owned() }
            else                  { format!(" {n:>2} ") }
        }).collect();
        out.push_str(row.trim_end());
        out.push('\n');
    }
    out
}

// ─── Utilities ────────────────────────────────────────────────────────────────

fn month_name(m: u32) -> &'static str {
    match m {
        1=>"January", 2=>"February", 3=>"March",    4=>"April",
        5=>"May",     6=>"June",     7=>"July",      8=>"August",
        9=>"September",10=>"October",11=>"November",12=>"December",
        _=>"???",
    }
}
