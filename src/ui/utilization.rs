use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use crate::models::UtilizationRow;
use crate::ui::components::render_help;
use crate::validation::rows::week_containing;

/// Columns on screen; paging moves by a whole screen.
pub const WEEKS_SHOWN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekCell {
    pub staffed: f64,
    pub actual: f64,
    /// Rounded percentage; `None` when nothing was staffed that week.
    pub percent: Option<i64>,
}

impl WeekCell {
    const EMPTY: WeekCell = WeekCell {
        staffed: 0.0,
        actual: 0.0,
        percent: None,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonRow {
    pub user_id: i32,
    pub user_name: String,
    pub weeks: Vec<WeekCell>,
}

/// Mondays of the weeks shown, starting `offset` weeks from the current one.
pub fn week_columns(today: NaiveDate, offset: i64) -> Vec<NaiveDate> {
    let (monday, _) = week_containing(today);
    let first = monday + Duration::weeks(offset);
    (0..WEEKS_SHOWN as i64)
        .map(|i| first + Duration::weeks(i))
        .collect()
}

/// `Oct 13 - Oct 19`
pub fn week_label(monday: NaiveDate) -> String {
    let sunday = monday + Duration::days(6);
    format!("{} - {}", monday.format("%b %-d"), sunday.format("%b %-d"))
}

/// One row per person with a cell for every week column, sorted by name.
pub fn build_grid(rows: &[UtilizationRow], weeks: &[NaiveDate]) -> Vec<PersonRow> {
    let mut by_user: BTreeMap<i32, (String, BTreeMap<NaiveDate, WeekCell>)> = BTreeMap::new();
    for row in rows {
        let entry = by_user
            .entry(row.user_id)
            .or_insert_with(|| (row.user_name.clone(), BTreeMap::new()));
        entry.1.insert(
            row.week_start,
            WeekCell {
                staffed: row.staffed_hours,
                actual: row.actual_hours,
                percent: row.utilization_pct.map(|p| (p * 100.0).round() as i64),
            },
        );
    }

    let mut grid: Vec<PersonRow> = by_user
        .into_iter()
        .map(|(user_id, (user_name, cells))| PersonRow {
            user_id,
            user_name,
            weeks: weeks
                .iter()
                .map(|w| cells.get(w).copied().unwrap_or(WeekCell::EMPTY))
                .collect(),
        })
        .collect();
    grid.sort_by_key(|p| p.user_name.to_lowercase());
    grid
}

#[derive(Debug, PartialEq)]
pub enum UtilizationAction {
    /// Load the weeks between these two Mondays.
    Load(NaiveDate, NaiveDate),
}

pub struct UtilizationState {
    pub offset: i64,
    pub weeks: Vec<NaiveDate>,
    pub grid: Vec<PersonRow>,
    pub loading: bool,
    pub error: Option<String>,
}

impl UtilizationState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            offset: 0,
            weeks: week_columns(today, 0),
            grid: Vec::new(),
            loading: false,
            error: None,
        }
    }

    /// Range to request for the current columns.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.weeks.first()?, *self.weeks.last()?))
    }

    pub fn loaded(&mut self, rows: &[UtilizationRow]) {
        self.grid = build_grid(rows, &self.weeks);
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, message: String) {
        self.grid.clear();
        self.loading = false;
        self.error = Some(message);
    }

    fn page(&mut self, today: NaiveDate, by: i64) -> Option<UtilizationAction> {
        self.offset += by * WEEKS_SHOWN as i64;
        self.weeks = week_columns(today, self.offset);
        self.loading = true;
        self.range().map(|(start, end)| UtilizationAction::Load(start, end))
    }
}

fn cell_style(percent: Option<i64>) -> Style {
    match percent {
        None => Style::default().fg(Color::DarkGray),
        Some(p) if p >= 100 => Style::default().fg(Color::Green),
        Some(p) if p >= 80 => Style::default().fg(Color::Yellow),
        Some(_) => Style::default().fg(Color::Red),
    }
}

pub fn render_utilization<B: Backend>(f: &mut Frame<B>, state: &UtilizationState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)].as_ref())
        .split(area);

    let mut header = vec!["Person".to_string()];
    header.extend(state.weeks.iter().map(|w| week_label(*w)));

    let rows: Vec<Row> = state
        .grid
        .iter()
        .map(|person| {
            let mut cells = vec![Cell::from(person.user_name.clone())];
            cells.extend(person.weeks.iter().map(|cell| {
                let pct = cell
                    .percent
                    .map(|p| format!("{}%", p))
                    .unwrap_or_else(|| "-".to_string());
                Cell::from(format!("{}/{}h {}", cell.actual, cell.staffed, pct))
                    .style(cell_style(cell.percent))
            }));
            Row::new(cells)
        })
        .collect();

    let title = if state.loading {
        "Utilization Overview (loading...)"
    } else {
        "Utilization Overview"
    };
    let widths = [
        Constraint::Percentage(20),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
    ];
    let table = Table::new(rows)
        .header(
            Row::new(header)
                .style(Style::default().add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().title(title).borders(Borders::ALL))
        .widths(&widths);
    f.render_widget(table, chunks[0]);

    render_help(
        f,
        chunks[1],
        "Left - Previous weeks | Right - Next weeks | actual/staffed hours",
        state.error.as_deref(),
    );
}

pub fn handle_input(state: &mut UtilizationState, key: KeyCode, today: NaiveDate) -> Option<UtilizationAction> {
    match key {
        KeyCode::Left => state.page(today, -1),
        KeyCode::Right => state.page(today, 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(week: NaiveDate, user_id: i32, name: &str, pct: Option<f64>) -> UtilizationRow {
        UtilizationRow {
            week_start: week,
            user_id,
            user_name: name.to_string(),
            project_id: 8,
            staffed_hours: 40.0,
            actual_hours: 30.0,
            utilization_pct: pct,
        }
    }

    #[test]
    fn columns_start_on_this_monday() {
        // 2025-10-15 is a Wednesday.
        let weeks = week_columns(day(2025, 10, 15), 0);
        assert_eq!(weeks.len(), WEEKS_SHOWN);
        assert_eq!(weeks[0], day(2025, 10, 13));
        assert_eq!(weeks[4], day(2025, 11, 10));
        assert_eq!(week_label(weeks[0]), "Oct 13 - Oct 19");
    }

    #[test]
    fn grid_fills_missing_weeks_and_sorts_by_name() {
        let weeks = week_columns(day(2025, 10, 15), 0);
        let rows = vec![
            row(weeks[1], 2, "zoe", Some(0.754)),
            row(weeks[0], 1, "Adam", None),
        ];
        let grid = build_grid(&rows, &weeks);

        assert_eq!(grid[0].user_name, "Adam");
        assert_eq!(grid[0].weeks[0].percent, None);
        assert_eq!(grid[1].weeks[1].percent, Some(75));
        assert_eq!(grid[1].weeks[0], WeekCell::EMPTY);
        assert!(grid.iter().all(|p| p.weeks.len() == WEEKS_SHOWN));
    }

    #[test]
    fn paging_moves_a_whole_screen() {
        let today = day(2025, 10, 15);
        let mut state = UtilizationState::new(today);
        assert_eq!(
            handle_input(&mut state, KeyCode::Right, today),
            Some(UtilizationAction::Load(day(2025, 11, 17), day(2025, 12, 15)))
        );
        handle_input(&mut state, KeyCode::Left, today);
        handle_input(&mut state, KeyCode::Left, today);
        assert_eq!(state.range(), Some((day(2025, 9, 8), day(2025, 10, 6))));
    }
}
