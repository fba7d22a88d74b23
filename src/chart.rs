//! Terminal viewer: team list on the left, the selected team's rating history
//! as a line chart on the right.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph,
};

use crate::engine::{RatingEngine, SummaryRow};
use crate::team::RatingPoint;

const Y_PADDING: f64 = 10.0;

pub struct Viewer {
    rows: Vec<SummaryRow>,
    selected: usize,
    should_quit: bool,
}

impl Viewer {
    pub fn new(engine: &RatingEngine) -> Self {
        Self {
            rows: engine.ranked_summary(),
            selected: 0,
            should_quit: false,
        }
    }

    pub fn selected_team_id(&self) -> Option<u32> {
        self.rows.get(self.selected).map(|r| r.team_id)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.rows.len().saturating_sub(1),
            _ => {}
        }
    }
}

/// Chart coordinates: x is seconds since the epoch, y the rating.
pub fn chart_points(history: &[RatingPoint]) -> Vec<(f64, f64)> {
    history
        .iter()
        .map(|p| (p.date.and_utc().timestamp() as f64, f64::from(p.rating)))
        .collect()
}

/// Axis bounds covering every point, ratings padded for readability.
pub fn chart_bounds(points: &[(f64, f64)]) -> Option<([f64; 2], [f64; 2])> {
    let (first, rest) = points.split_first()?;
    let mut x = [first.0, first.0];
    let mut y = [first.1, first.1];
    for (px, py) in rest {
        x[0] = x[0].min(*px);
        x[1] = x[1].max(*px);
        y[0] = y[0].min(*py);
        y[1] = y[1].max(*py);
    }
    if x[0] == x[1] {
        x[1] += 1.0;
    }
    Some((x, [y[0] - Y_PADDING, y[1] + Y_PADDING]))
}

pub fn run_viewer(engine: &RatingEngine) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut viewer = Viewer::new(engine);
    let res = event_loop(&mut terminal, &mut viewer, engine);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    viewer: &mut Viewer,
    engine: &RatingEngine,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, viewer, engine))?;
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    viewer.on_key(key);
                }
            }
        }
        if viewer.should_quit() {
            return Ok(());
        }
    }
}

pub fn render(frame: &mut Frame, viewer: &Viewer, engine: &RatingEngine) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.size());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(rows[0]);

    render_team_list(frame, columns[0], viewer);
    render_history(frame, columns[1], viewer, engine);

    let footer = Paragraph::new("j/k/↑/↓ Team | Home/End Jump | q/Esc Quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, rows[1]);
}

fn render_team_list(frame: &mut Frame, area: Rect, viewer: &Viewer) {
    let items = viewer
        .rows
        .iter()
        .map(|r| ListItem::new(format!("{:<24.24} {:>5} {:>5}", r.name, r.elo, r.highest_elo)))
        .collect::<Vec<_>>();
    let list = List::new(items)
        .block(Block::default().title("Team  Elo  Peak").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(viewer.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_history(frame: &mut Frame, area: Rect, viewer: &Viewer, engine: &RatingEngine) {
    let team = viewer
        .selected_team_id()
        .and_then(|id| engine.team(id).ok());
    let Some(team) = team else {
        let empty = Paragraph::new("No teams loaded")
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let title = format!("Elo history for {}", team.name);
    let history = team.history();
    let points = chart_points(history);
    let Some((x_bounds, y_bounds)) = chart_bounds(&points) else {
        let empty = Paragraph::new("No matches played")
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let dataset = Dataset::default()
        .name(team.short_name.clone())
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points);

    let x_labels = date_labels(history);
    let y_labels = vec![
        Span::raw(format!("{:.0}", y_bounds[0])),
        Span::raw(format!("{:.0}", (y_bounds[0] + y_bounds[1]) / 2.0)),
        Span::raw(format!("{:.0}", y_bounds[1])),
    ];

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(title).borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .title("Match date")
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Elo rating")
                .bounds(y_bounds)
                .labels(y_labels),
        );
    frame.render_widget(chart, area);
}

fn date_labels(history: &[RatingPoint]) -> Vec<Span<'static>> {
    let fmt = |p: &RatingPoint| Span::raw(p.date.format("%Y-%m-%d").to_string());
    match history {
        [] => Vec::new(),
        [only] => vec![fmt(only)],
        [first, .., last] => vec![fmt(first), fmt(&history[history.len() / 2]), fmt(last)],
    }
}
