//! Kanban board interface.
//!
//! Four columns, one per status, showing the active project's tasks in
//! board order. Cards can be dragged with the mouse or picked up with Space
//! and carried with the arrow keys; either way the drop goes through a
//! [`DragSession`], so the task store changes once per drop.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, warn};

use crate::board::session::ActiveDrag;
use crate::board::{CardBounds, DragSession, DropOutcome, Gesture, Hover, TaskStore};
use crate::db::{format_due_relative, truncate, Database};
use crate::fields::Status;
use crate::id::{ProjectId, TaskId};
use crate::project::Project;
use crate::task::{validate_title, Task};
use crate::tui::colors::{column_color, priority_color, text_on, DARK_RED, DROP_CYAN, GOLD};
use crate::tui::enums::{DragInput, Mode};
use crate::tui::input::InputField;

/// Rows per card: border, title, details, border.
const CARD_HEIGHT: u16 = 4;

/// A card as last drawn, for mouse hit-testing.
#[derive(Debug, Clone)]
struct CardArea {
    column: Status,
    task_id: TaskId,
    area: Rect,
}

pub struct BoardApp {
    db: Database,
    db_path: PathBuf,
    project_id: ProjectId,
    selected_column: usize,
    selected_card: usize,
    column_scroll_offsets: [usize; 4],
    status_message: String,
    mode: Mode,
    input: InputField,
    show_empty_hint: bool,

    session: DragSession,
    drag_input: Option<DragInput>,
    /// Card under a mouse press that has not moved yet.
    pressed: Option<TaskId>,

    column_areas: [Rect; 4],
    card_areas: Vec<CardArea>,
}

impl BoardApp {
    pub fn new(db: Database, db_path: &Path, project_id: ProjectId, show_empty_hint: bool) -> Self {
        BoardApp {
            db,
            db_path: db_path.to_path_buf(),
            project_id,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; 4],
            status_message: String::new(),
            mode: Mode::Board,
            input: InputField::new(),
            show_empty_hint,
            session: DragSession::new(),
            drag_input: None,
            pressed: None,
            column_areas: [Rect::default(); 4],
            card_areas: Vec::new(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    fn project(&self) -> Option<&Project> {
        self.db.project(&self.project_id)
    }

    fn store(&self) -> Option<&TaskStore> {
        self.project().map(|p| &p.tasks)
    }

    fn selected_status(&self) -> Status {
        Status::from_index(self.selected_column).unwrap_or(Status::Todo)
    }

    /// Task ids of a column as drawn. The card being dragged is left out so
    /// the remaining cards match the indices the resolver works with.
    fn column_ids(&self, column: Status) -> Vec<TaskId> {
        let dragged = self.session.active().map(|a| &a.task_id);
        self.store()
            .map(|store| {
                store
                    .partition(column)
                    .into_iter()
                    .filter(|t| Some(&t.id) != dragged)
                    .map(|t| t.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn selected_task_id(&self) -> Option<TaskId> {
        self.column_ids(self.selected_status())
            .get(self.selected_card)
            .cloned()
    }

    fn clamp_selection(&mut self) {
        let len = self.column_ids(self.selected_status()).len();
        if len == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= len {
            self.selected_card = len - 1;
        }
    }

    fn select_task(&mut self, column: Status, task_id: &TaskId) {
        self.selected_column = column.index();
        self.selected_card = self
            .column_ids(column)
            .iter()
            .position(|id| id == task_id)
            .unwrap_or(0);
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Write the data file. A failure is reported but the change stays in
    /// memory.
    fn persist(&mut self, done: String) {
        if self.db.save_or_warn(&self.db_path) {
            self.set_status_message(done);
        } else {
            self.set_status_message(format!("{done} (not saved: could not write {})", self.db_path.display()));
        }
    }

    /// Run `change` against the project's task store and save if it moved
    /// anything.
    fn change_store<F>(&mut self, task_id: &TaskId, describe: &str, change: F)
    where
        F: FnOnce(&mut TaskStore) -> crate::Result<bool>,
    {
        let Some(project) = self.db.project_mut(&self.project_id) else {
            return;
        };
        match change(&mut project.tasks) {
            Ok(true) => {
                project.touch();
                let status = project.tasks.get(task_id).map(|t| t.status);
                if let Some(status) = status {
                    self.select_task(status, task_id);
                }
                self.persist(describe.to_string());
            }
            Ok(false) => {}
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    // Drag sessions

    fn start_drag(&mut self, task_id: &TaskId, input: DragInput) {
        let Some(project) = self.db.project(&self.project_id) else {
            return;
        };
        match self.session.on_drag_start(&project.tasks, task_id) {
            Ok(()) => {
                self.drag_input = Some(input);
                self.pressed = None;
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn drag_over(&mut self, gesture: &Gesture) -> Option<Hover> {
        let project = self.db.project(&self.project_id)?;
        self.session.on_drag_over(&project.tasks, gesture)
    }

    fn finish_drag(&mut self, gesture: &Gesture) {
        self.drag_input = None;
        let Some(project) = self.db.project_mut(&self.project_id) else {
            self.session.cancel();
            return;
        };
        match self.session.on_drag_end(&mut project.tasks, gesture) {
            Ok(DropOutcome::Moved { task_id, column, index }) => {
                project.touch();
                self.select_task(column, &task_id);
                self.persist(format!("Moved to {} at position {}", column.title(), index + 1));
            }
            Ok(DropOutcome::Unchanged) => self.set_status_message("Card left in place"),
            Ok(DropOutcome::Discarded) => self.set_status_message("Drop cancelled"),
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
        self.clamp_selection();
    }

    fn cancel_drag(&mut self) {
        self.session.cancel();
        self.drag_input = None;
        self.set_status_message("Drag cancelled");
        self.clamp_selection();
    }

    /// Keyboard drags carry an explicit slot around.
    fn nudge_slot(&mut self, columns: isize, rows: isize) {
        let Some(active) = self.session.active() else {
            return;
        };
        let current = active.hover.unwrap_or(Hover {
            column: active.origin,
            index: self.selected_card,
        });
        let column_index = current
            .column
            .index()
            .saturating_add_signed(columns)
            .min(Status::ALL.len() - 1);
        let column = Status::from_index(column_index).unwrap_or(current.column);
        let len = self.column_ids(column).len();
        let index = if column == current.column {
            current.index.saturating_add_signed(rows).min(len)
        } else {
            current.index.min(len)
        };
        self.drag_over(&Gesture::slot(column, index));
    }

    /// Describe what is under a terminal cell.
    fn gesture_at(&self, x: u16, y: u16) -> Gesture {
        let Some(column) = Status::ALL
            .into_iter()
            .find(|s| contains(self.column_areas[s.index()], x, y))
        else {
            return Gesture::outside();
        };
        let cards: Vec<CardBounds> = self
            .card_areas
            .iter()
            .filter(|c| c.column == column)
            .map(|c| CardBounds::new(c.task_id.clone(), i32::from(c.area.y), i32::from(c.area.height)))
            .collect();
        let gesture = match self
            .card_areas
            .iter()
            .find(|c| c.column == column && contains(c.area, x, y))
        {
            Some(card) => Gesture::over_task(card.task_id.clone()),
            None => Gesture::over_column(column),
        };
        gesture.at(i32::from(y)).with_cards(cards)
    }

    fn card_at(&self, x: u16, y: u16) -> Option<&CardArea> {
        self.card_areas.iter().find(|c| contains(c.area, x, y))
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != Mode::Board {
            return;
        }
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(card) = self.card_at(x, y).cloned() {
                    self.select_task(card.column, &card.task_id);
                    self.pressed = Some(card.task_id);
                } else if let Some(column) = Status::ALL
                    .into_iter()
                    .find(|s| contains(self.column_areas[s.index()], x, y))
                {
                    self.selected_column = column.index();
                    self.clamp_selection();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if !self.session.is_dragging() {
                    let Some(task_id) = self.pressed.take() else {
                        return;
                    };
                    self.start_drag(&task_id, DragInput::Mouse);
                }
                if self.drag_input == Some(DragInput::Mouse) {
                    let gesture = self.gesture_at(x, y);
                    self.drag_over(&gesture);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pressed = None;
                if self.drag_input == Some(DragInput::Mouse) {
                    let gesture = self.gesture_at(x, y);
                    self.finish_drag(&gesture);
                }
            }
            _ => {}
        }
    }

    /// Handle one key press. Returns true when the board should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.mode.clone() {
            Mode::AddTask => {
                self.handle_add_key(key);
                false
            }
            Mode::ConfirmDelete(task_id) => {
                if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
                    self.delete_task(&task_id);
                } else {
                    self.set_status_message("Delete cancelled");
                }
                self.mode = Mode::Board;
                false
            }
            Mode::Detail | Mode::Help => {
                self.mode = Mode::Board;
                false
            }
            Mode::Board if self.session.is_dragging() => {
                self.handle_drag_key(key);
                false
            }
            Mode::Board => self.handle_board_key(key),
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_drag(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                let gesture = match self.session.hover() {
                    Some(hover) => Gesture::slot(hover.column, hover.index),
                    None => Gesture::outside(),
                };
                self.finish_drag(&gesture);
            }
            KeyCode::Left => self.nudge_slot(-1, 0),
            KeyCode::Right => self.nudge_slot(1, 0),
            KeyCode::Up => self.nudge_slot(0, -1),
            KeyCode::Down => self.nudge_slot(0, 1),
            _ => {}
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) -> bool {
        self.status_message.clear();
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,

            KeyCode::Char(' ') => {
                if let Some(task_id) = self.selected_task_id() {
                    let slot = Gesture::slot(self.selected_status(), self.selected_card);
                    self.start_drag(&task_id, DragInput::Keyboard);
                    self.drag_over(&slot);
                    self.set_status_message("Arrows: choose slot | Space: drop | Esc: cancel");
                }
            }

            // Reorder within the column
            KeyCode::Up if shift => self.shift_selected(-1),
            KeyCode::Down if shift => self.shift_selected(1),

            // Change column, appending to the end
            KeyCode::Left if ctrl => self.move_selected(-1),
            KeyCode::Right if ctrl => self.move_selected(1),

            KeyCode::Left => {
                if self.selected_column > 0 {
                    self.selected_column -= 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Right => {
                if self.selected_column < Status::ALL.len() - 1 {
                    self.selected_column += 1;
                    self.clamp_selection();
                }
            }
            KeyCode::Up => self.selected_card = self.selected_card.saturating_sub(1),
            KeyCode::Down => {
                let len = self.column_ids(self.selected_status()).len();
                if self.selected_card + 1 < len {
                    self.selected_card += 1;
                }
            }

            KeyCode::Enter => {
                if self.selected_task_id().is_some() {
                    self.mode = Mode::Detail;
                }
            }
            KeyCode::Char('a') => {
                self.input = InputField::new();
                self.mode = Mode::AddTask;
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(task_id) = self.selected_task_id() {
                    self.mode = Mode::ConfirmDelete(task_id);
                }
            }
            KeyCode::Tab => self.cycle_project(1),
            KeyCode::BackTab => self.cycle_project(-1),
            KeyCode::Char('h') | KeyCode::Char('?') => self.mode = Mode::Help,
            _ => {}
        }
        false
    }

    fn handle_add_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Board;
                self.input = InputField::new();
            }
            KeyCode::Enter => {
                if let Err(e) = validate_title(&self.input.value) {
                    self.set_status_message(e.to_string());
                    return;
                }
                let title = self.input.take().trim().to_string();
                self.mode = Mode::Board;
                self.add_task(title);
            }
            KeyCode::Backspace => self.input.handle_backspace(),
            KeyCode::Delete => self.input.handle_delete(),
            KeyCode::Left => self.input.move_cursor_left(),
            KeyCode::Right => self.input.move_cursor_right(),
            KeyCode::Char(c) => self.input.handle_char(c),
            _ => {}
        }
    }

    fn add_task(&mut self, title: String) {
        let column = self.selected_status();
        let Some(project) = self.db.project_mut(&self.project_id) else {
            return;
        };
        let task_id = project.tasks.insert(Task::new(title).with_status(column));
        project.touch();
        debug!(task = %task_id, column = column.id(), "task added from board");
        self.select_task(column, &task_id);
        self.persist(format!("Added to {}", column.title()));
    }

    fn delete_task(&mut self, task_id: &TaskId) {
        let Some(project) = self.db.project_mut(&self.project_id) else {
            return;
        };
        match project.tasks.remove(task_id) {
            Ok(task) => {
                project.touch();
                self.clamp_selection();
                self.persist(format!("Deleted '{}'", task.title));
            }
            Err(e) => self.set_status_message(format!("Error: {e}")),
        }
    }

    fn shift_selected(&mut self, delta: isize) {
        if let Some(task_id) = self.selected_task_id() {
            let label = if delta < 0 { "Moved up" } else { "Moved down" };
            self.change_store(&task_id, label, |store| store.shift(&task_id, delta));
        }
    }

    fn move_selected(&mut self, columns: isize) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        let target = self.selected_column.saturating_add_signed(columns);
        let Some(column) = Status::from_index(target).filter(|_| target != self.selected_column) else {
            return;
        };
        let label = format!("Moved to {}", column.title());
        self.change_store(&task_id, &label, |store| store.move_to_end(&task_id, column));
    }

    fn cycle_project(&mut self, step: isize) {
        let count = self.db.projects.len();
        if count < 2 {
            return;
        }
        let current = self
            .db
            .projects
            .iter()
            .position(|p| p.id == self.project_id)
            .unwrap_or(0);
        let next = (current as isize + step).rem_euclid(count as isize) as usize;
        self.project_id = self.db.projects[next].id.clone();
        self.db.active_project = Some(self.project_id.clone());
        self.selected_column = 0;
        self.selected_card = 0;
        self.column_scroll_offsets = [0; 4];
        let name = self.db.projects[next].name.clone();
        self.persist(format!("Project: {name}"));
    }

    // Rendering

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match &self.mode {
            Mode::Detail => self.render_task_detail_popup(f),
            Mode::AddTask => self.render_add_popup(f),
            Mode::ConfirmDelete(task_id) => self.render_confirm_popup(f, task_id),
            Mode::Help => render_help_popup(f),
            Mode::Board => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let (name, summary) = match self.project() {
            Some(p) => {
                let now = Utc::now();
                let deadline = p
                    .next_deadline(now)
                    .map(|d| format!("  next deadline {}", format_due_relative(Some(d), Local::now().date_naive())))
                    .unwrap_or_default();
                (
                    p.name.clone(),
                    format!(
                        "{}  {} tasks  {:.0}% done  {} members{}",
                        p.status.label(),
                        p.tasks.len(),
                        p.progress(),
                        p.team_members.len(),
                        deadline
                    ),
                )
            }
            None => ("(project missing)".to_string(), String::new()),
        };
        let header = Paragraph::new(Line::from(vec![
            Span::styled(name, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(summary, Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC)),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        self.card_areas.clear();
        for status in Status::ALL {
            let column_area = columns[status.index()];
            self.column_areas[status.index()] = column_area;
            self.render_column(f, column_area, status);
        }
    }

    fn render_column(&mut self, f: &mut Frame, area: Rect, status: Status) {
        let column_index = status.index();
        let is_selected = column_index == self.selected_column;
        let color = column_color(status);
        let ids = self.column_ids(status);
        let hover = self.session.hover().filter(|h| h.column == status);

        let border_style = if is_selected || hover.is_some() {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ({}) ", status.title(), ids.len()))
            .border_style(border_style);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if ids.is_empty() {
            let (text, style) = if hover.is_some() {
                ("▸ Drop here", Style::default().bg(DROP_CYAN).fg(Color::Black))
            } else if self.show_empty_hint {
                ("No tasks", Style::default().fg(Color::DarkGray))
            } else {
                return;
            };
            f.render_widget(Paragraph::new(text).style(style), Rect { height: inner.height.min(1), ..inner });
            return;
        }

        // The drop marker takes a row of its own while hovering here.
        let marker_rows = u16::from(hover.is_some());
        let visible = usize::from(inner.height.saturating_sub(marker_rows) / CARD_HEIGHT).max(1);
        let mut offset = self.column_scroll_offsets[column_index].min(ids.len().saturating_sub(1));
        let focus = match hover {
            Some(h) => Some(h.index.min(ids.len().saturating_sub(1))),
            None if is_selected => Some(self.selected_card),
            None => None,
        };
        if let Some(focus) = focus {
            if focus < offset {
                offset = focus;
            } else if focus >= offset + visible {
                offset = focus + 1 - visible;
            }
        }
        self.column_scroll_offsets[column_index] = offset;

        let Some(project) = self.db.project(&self.project_id) else {
            return;
        };
        let bottom = inner.y + inner.height;
        let mut y = inner.y;
        let mut drawn = 0;
        let mut placeholder_y = None;
        for (card_index, task_id) in ids.iter().enumerate().skip(offset) {
            if placeholder_y.is_none() && hover.is_some_and(|h| h.index == card_index) {
                if y >= bottom {
                    break;
                }
                placeholder_y = Some(y);
                y += 1;
            }
            if y + CARD_HEIGHT > bottom {
                break;
            }
            let Some(task) = project.tasks.get(task_id) else {
                continue;
            };
            let card_area = Rect {
                x: inner.x,
                y,
                width: inner.width,
                height: CARD_HEIGHT,
            };
            let selected = is_selected && card_index == self.selected_card && !self.session.is_dragging();
            render_card(f, card_area, project, task, selected);
            self.card_areas.push(CardArea {
                column: status,
                task_id: task_id.clone(),
                area: card_area,
            });
            y += CARD_HEIGHT;
            drawn += 1;
        }
        if placeholder_y.is_none() && hover.is_some_and(|h| h.index >= offset + drawn) && y < bottom {
            placeholder_y = Some(y);
        }
        if let Some(py) = placeholder_y {
            let line = Rect {
                x: inner.x,
                y: py,
                width: inner.width,
                height: 1,
            };
            f.render_widget(
                Paragraph::new("▸ Drop here").style(Style::default().bg(DROP_CYAN).fg(Color::Black)),
                line,
            );
        }

        if offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{offset} above")).style(Style::default().fg(Color::Cyan));
            f.render_widget(indicator, Rect { height: 1, ..inner });
        }
        let remaining = ids.len().saturating_sub(offset + drawn);
        if remaining > 0 && inner.height > 0 {
            let indicator = Paragraph::new(format!("▼ +{remaining} below")).style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    y: inner.y + inner.height - 1,
                    height: 1,
                    ..inner
                },
            );
        }
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, background) = if let Some(active) = self.session.active() {
            (self.drag_status(active), DROP_CYAN)
        } else if !self.status_message.is_empty() {
            (self.status_message.clone(), column_color(self.selected_status()))
        } else {
            (
                "Space: pick up | Shift+↑↓: reorder | Ctrl+←→: move | a: add | x: delete | Enter: details | Tab: project | h: help | q: quit"
                    .to_string(),
                column_color(self.selected_status()),
            )
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(background).fg(text_on(background)))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn drag_status(&self, active: &ActiveDrag) -> String {
        let title = self
            .store()
            .and_then(|s| s.get(&active.task_id))
            .map(|t| truncate(&t.title, 30))
            .unwrap_or_default();
        match active.hover {
            Some(h) => format!("Dragging '{}' → {} position {}", title, h.column.title(), h.index + 1),
            None => format!("Dragging '{title}' (release over a column to drop)"),
        }
    }

    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(project) = self.project() else {
            return;
        };
        let Some(task) = self.selected_task_id().and_then(|id| project.tasks.get(&id)) else {
            return;
        };
        let area = popup_area(f.area(), 70, 70);
        f.render_widget(Clear, area);

        let today = Local::now().date_naive();
        let assignee = project
            .assignee_of(task)
            .map(|m| format!("{} <{}>", m.name, m.email))
            .unwrap_or_else(|| "Unassigned".to_string());
        let updated = task
            .updated_at
            .map(|u| u.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let lines = vec![
            Line::from(Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD))),
            Line::from(""),
            Line::from(format!("ID:        {}", task.id)),
            Line::from(format!("Status:    {}", task.status.title())),
            Line::from(vec![
                Span::raw("Priority:  "),
                Span::styled(task.priority.label(), Style::default().fg(priority_color(task.priority))),
            ]),
            Line::from(format!("Due:       {}", format_due_relative(task.due, today))),
            Line::from(format!("Assignee:  {assignee}")),
            Line::from(format!(
                "Created:   {}",
                task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )),
            Line::from(format!("Updated:   {updated}")),
            Line::from(""),
            Line::from("Description:"),
            Line::from(task.description.clone().unwrap_or_else(|| "-".to_string())),
        ];
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Task details (any key to close) ")
            .title_alignment(Alignment::Center)
            .border_style(Style::default().fg(column_color(task.status)).add_modifier(Modifier::BOLD));
        f.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(Color::Black)),
            area,
        );
    }

    fn render_add_popup(&self, f: &mut Frame) {
        let area = popup_area(f.area(), 50, 20);
        f.render_widget(Clear, area);
        let mut value = self.input.value.clone();
        let at = value
            .char_indices()
            .nth(self.input.cursor)
            .map(|(i, _)| i)
            .unwrap_or(value.len());
        value.insert(at, '│');
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" New task in {} (Enter to add, Esc to cancel) ", self.selected_status().title()))
            .border_style(Style::default().fg(GOLD));
        f.render_widget(Paragraph::new(value).block(block), area);
    }

    fn render_confirm_popup(&self, f: &mut Frame, task_id: &TaskId) {
        let title = self
            .store()
            .and_then(|s| s.get(task_id))
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let area = popup_area(f.area(), 50, 20);
        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Delete task ")
            .border_style(Style::default().fg(DARK_RED).add_modifier(Modifier::BOLD));
        f.render_widget(
            Paragraph::new(format!("Delete '{title}'? (y/N)"))
                .block(block)
                .wrap(Wrap { trim: true }),
            area,
        );
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }
        if self.session.is_dragging() {
            warn!("board closed during a drag, discarding it");
            self.session.cancel();
        }
        Ok(())
    }
}

fn render_card(f: &mut Frame, area: Rect, project: &Project, task: &Task, selected: bool) {
    let style = if selected {
        let bg = column_color(task.status);
        Style::default().bg(bg).fg(text_on(bg)).add_modifier(Modifier::BOLD)
    } else {
        Style::default().bg(Color::DarkGray)
    };
    let width = usize::from(area.width.saturating_sub(2));
    let assignee = project
        .assignee_of(task)
        .map(|m| m.initials())
        .unwrap_or_else(|| "--".to_string());
    let today = Local::now().date_naive();
    let overdue = task.due.is_some_and(|d| d.with_timezone(&Local).date_naive() < today) && !task.is_done();
    let due_style = if overdue {
        Style::default().fg(DARK_RED).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let lines = vec![
        Line::from(truncate(&task.title, width)),
        Line::from(vec![
            Span::styled("● ", Style::default().fg(priority_color(task.priority))),
            Span::raw(format!("{} · {} · ", task.priority.label(), assignee)),
            Span::styled(format_due_relative(task.due, today), due_style),
        ]),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .style(style),
        area,
    );
}

fn render_help_popup(f: &mut Frame) {
    let area = popup_area(f.area(), 60, 60);
    f.render_widget(Clear, area);
    let lines: Vec<Line> = [
        "←/→ ↑/↓        select column / card",
        "Space          pick up the card, then Space or Enter to drop",
        "  while held   ←/→ change column, ↑/↓ change slot, Esc cancel",
        "Mouse          drag a card onto a column or another card",
        "Shift+↑/↓      move the card up or down in its column",
        "Ctrl+←/→       move the card to the end of the next column",
        "a              add a task to the selected column",
        "x / Del        delete the selected task",
        "Enter          task details",
        "Tab/Shift+Tab  switch project",
        "q / Esc        quit",
    ]
    .into_iter()
    .map(Line::from)
    .collect();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Keys (any key to close) ")
        .border_style(Style::default().fg(GOLD));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = area.width * percent_x / 100;
    let height = (area.height * percent_y / 100).max(3);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height.min(area.height),
    )
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::DragState;
    use ratatui::backend::TestBackend;

    fn app() -> (tempfile::TempDir, BoardApp) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        let mut db = Database::default();
        let mut project = Project::new("Website", "").unwrap();
        for (title, status) in [
            ("Alpha", Status::Todo),
            ("Bravo", Status::Todo),
            ("Charlie", Status::Todo),
            ("Review me", Status::Review),
        ] {
            project.tasks.insert(Task::new(title).with_status(status));
        }
        let id = db.add_project(project);
        let app = BoardApp::new(db, &path, id, true);
        (dir, app)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn titles(app: &BoardApp, column: Status) -> Vec<String> {
        app.store()
            .unwrap()
            .partition(column)
            .iter()
            .map(|t| t.title.clone())
            .collect()
    }

    fn draw(app: &mut BoardApp) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
    }

    fn mouse(kind: MouseEventKind, area: Rect, dy: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: area.x + 2,
            row: area.y + dy,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_keyboard_drag_moves_card_to_next_column() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.session().is_dragging());
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.session().hover().unwrap().column, Status::Review);
        app.handle_key(key(KeyCode::Char(' ')));

        assert_eq!(app.session().state(), &DragState::Idle);
        assert_eq!(titles(&app, Status::Todo), vec!["Bravo", "Charlie"]);
        assert_eq!(titles(&app, Status::Review), vec!["Alpha", "Review me"]);
        assert_eq!(app.selected_column, Status::Review.index());
        assert!(app.db_path.exists());
    }

    #[test]
    fn test_keyboard_drag_reorders_and_escape_cancels() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(titles(&app, Status::Todo), vec!["Bravo", "Charlie", "Alpha"]);

        let before = app.database().clone();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Esc));
        assert!(!app.session().is_dragging());
        assert_eq!(app.database(), &before);
    }

    #[test]
    fn test_drop_in_place_is_unchanged() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(app.status_message(), "Card left in place");
        assert_eq!(titles(&app, Status::Todo), vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[test]
    fn test_mouse_drag_onto_card_in_other_column() {
        let (_dir, mut app) = app();
        draw(&mut app);
        let alpha = app.card_areas[0].clone();
        let review = app
            .card_areas
            .iter()
            .find(|c| c.column == Status::Review)
            .cloned()
            .unwrap();

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), alpha.area, 1));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), review.area, 0));
        assert_eq!(
            app.session().hover(),
            Some(Hover {
                column: Status::Review,
                index: 0
            })
        );
        draw(&mut app);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), review.area, 0));

        assert_eq!(titles(&app, Status::Review), vec!["Alpha", "Review me"]);
        assert_eq!(titles(&app, Status::Todo), vec!["Bravo", "Charlie"]);
    }

    #[test]
    fn test_mouse_release_outside_discards() {
        let (_dir, mut app) = app();
        draw(&mut app);
        let alpha = app.card_areas[0].clone();
        let before = app.database().clone();
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), alpha.area, 1));
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), alpha.area, 2));
        // Row 0 is the header, outside every column.
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::Up(MouseButton::Left),
            column: 5,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(app.status_message(), "Drop cancelled");
        assert_eq!(app.database(), &before);
    }

    #[test]
    fn test_click_without_drag_only_selects() {
        let (_dir, mut app) = app();
        draw(&mut app);
        let charlie = app.card_areas[2].clone();
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), charlie.area, 1));
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), charlie.area, 1));
        assert_eq!(app.selected_card, 2);
        assert!(!app.session().is_dragging());
    }

    #[test]
    fn test_placeholder_rendered_in_hovered_column() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Right));
        let terminal = draw(&mut app);
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Drop here"));
        assert!(text.contains("In Progress (0)"));
    }

    fn row_text(terminal: &Terminal<TestBackend>, area: Rect, y: u16) -> String {
        let buffer = terminal.backend().buffer();
        (area.x..area.x + area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_drop_marker_gets_its_own_row() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Down));
        assert_eq!(
            app.session().hover(),
            Some(Hover {
                column: Status::Todo,
                index: 1
            })
        );
        let terminal = draw(&mut app);

        let todo: Vec<CardArea> = app
            .card_areas
            .iter()
            .filter(|c| c.column == Status::Todo)
            .cloned()
            .collect();
        assert_eq!(todo.len(), 2);
        let (bravo, charlie) = (&todo[0], &todo[1]);
        let marker_y = bravo.area.y + CARD_HEIGHT;
        assert_eq!(charlie.area.y, marker_y + 1);
        assert!(row_text(&terminal, bravo.area, marker_y).contains("Drop here"));
        assert!(row_text(&terminal, bravo.area, bravo.area.y + 1).contains("Bravo"));
        assert!(row_text(&terminal, charlie.area, charlie.area.y + 1).contains("Charlie"));
    }

    #[test]
    fn test_shift_and_ctrl_keys_reorder_and_move() {
        let (_dir, mut app) = app();
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::SHIFT));
        assert_eq!(titles(&app, Status::Todo), vec!["Bravo", "Alpha", "Charlie"]);
        assert_eq!(app.selected_card, 1);

        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL));
        assert_eq!(titles(&app, Status::InProgress), vec!["Alpha"]);
        assert_eq!(app.selected_column, Status::InProgress.index());
    }

    #[test]
    fn test_quick_add_and_delete() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Right));
        app.handle_key(key(KeyCode::Char('a')));
        for c in "Write tests".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(titles(&app, Status::InProgress), vec!["Write tests"]);

        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('y')));
        assert!(titles(&app, Status::InProgress).is_empty());
    }

    #[test]
    fn test_quick_add_rejects_short_title() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char('a')));
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::AddTask);
        assert_eq!(titles(&app, Status::Todo).len(), 3);
    }

    #[test]
    fn test_save_failure_keeps_change_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the data file should be makes the rename fail.
        let path = dir.path().join("projects.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();
        let mut db = Database::default();
        let mut project = Project::new("Website", "").unwrap();
        project.tasks.insert(Task::new("Alpha"));
        let id = db.add_project(project);
        let mut app = BoardApp::new(db, &path, id, true);

        app.handle_key(KeyEvent::new(KeyCode::Right, KeyModifiers::CONTROL));
        assert_eq!(titles(&app, Status::InProgress), vec!["Alpha"]);
        assert!(app.status_message().contains("not saved"));
    }
}
