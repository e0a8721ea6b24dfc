//! Application state and main render loop

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use imshelf_core::{Item, ItemId, ItemType, Media, ShelfError, ShelfRepository};

use crate::form::ItemForm;
use crate::mode::Mode;

/// Sortable table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Type,
    Status,
    DueDate,
}

impl SortColumn {
    /// Column bound to a number key (1-5).
    pub fn from_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(SortColumn::Id),
            '2' => Some(SortColumn::Title),
            '3' => Some(SortColumn::Type),
            '4' => Some(SortColumn::Status),
            '5' => Some(SortColumn::DueDate),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortColumn::Id => "ID",
            SortColumn::Title => "Title",
            SortColumn::Type => "Type",
            SortColumn::Status => "Status",
            SortColumn::DueDate => "Due Date",
        }
    }
}

/// Main application state
pub struct App {
    /// The backing repository; the single source of truth
    repo: ShelfRepository,
    /// Current mode (NORMAL, SEARCH, FORM, ...)
    pub mode: Mode,
    /// Live search filter
    search: String,
    /// Current sort column and direction
    sort_column: SortColumn,
    sort_reverse: bool,
    /// Selected row in the visible (filtered, sorted) table
    selected: usize,
    table_state: TableState,
    /// One-line status or error message
    status_message: Option<String>,
    /// Active add/edit form, when in Form mode
    form: Option<ItemForm>,
    /// Due-date entry buffer for the checkout prompt
    date_buffer: String,
    /// Item awaiting delete confirmation
    pending_delete: Option<ItemId>,
    /// Whether to show the help overlay
    show_help: bool,
}

impl App {
    /// Create the application around an opened repository.
    pub fn new(repo: ShelfRepository) -> Self {
        Self {
            repo,
            mode: Mode::Normal,
            search: String::new(),
            sort_column: SortColumn::Id,
            sort_reverse: false,
            selected: 0,
            table_state: TableState::default(),
            status_message: None,
            form: None,
            date_buffer: String::new(),
            pending_delete: None,
            show_help: false,
        }
    }

    /// The collection as currently displayed: filtered, then sorted.
    fn visible_items(&self) -> Vec<Item> {
        let mut items = filter_items(&self.repo.get_all(), &self.search);
        sort_items(&mut items, self.sort_column, self.sort_reverse);
        items
    }

    fn selected_item(&self) -> Option<Item> {
        self.visible_items().get(self.selected).cloned()
    }

    fn selected_id(&self) -> Option<ItemId> {
        self.selected_item().and_then(|item| item.id)
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_items().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Handle one key press. Returns true when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> bool {
        match self.mode {
            Mode::Normal => self.handle_normal_key(code),
            Mode::Search => {
                self.handle_search_key(code);
                false
            }
            Mode::Form => {
                self.handle_form_key(code);
                false
            }
            Mode::CheckOut => {
                self.handle_checkout_key(code);
                false
            }
            Mode::ConfirmDelete => {
                self.handle_confirm_delete_key(code);
                false
            }
            Mode::Details => {
                self.mode = Mode::Normal;
                false
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> bool {
        self.status_message = None;
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => self.show_help = !self.show_help,
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected += 1;
                self.clamp_selection();
            }
            KeyCode::Char(digit @ '1'..='5') => {
                let column = SortColumn::from_digit(digit).unwrap();
                if self.sort_column == column {
                    self.sort_reverse = !self.sort_reverse;
                } else {
                    self.sort_column = column;
                    self.sort_reverse = false;
                }
            }
            KeyCode::Char('a') => {
                self.form = Some(ItemForm::add(ItemType::Book));
                self.mode = Mode::Form;
            }
            KeyCode::Char('v') => {
                self.form = Some(ItemForm::add(ItemType::Dvd));
                self.mode = Mode::Form;
            }
            KeyCode::Char('e') => match self.selected_item() {
                Some(item) => {
                    self.form = Some(ItemForm::edit(&item));
                    self.mode = Mode::Form;
                }
                None => self.set_status("Select an item to edit"),
            },
            KeyCode::Char('d') => match self.selected_id() {
                Some(id) => {
                    self.pending_delete = Some(id);
                    self.mode = Mode::ConfirmDelete;
                }
                None => self.set_status("Select an item to delete"),
            },
            KeyCode::Char('c') => self.begin_checkout(),
            KeyCode::Char('r') => self.return_selected(),
            KeyCode::Char('s') => match self.repo.save() {
                Ok(()) => self.set_status("Items have been saved to disk"),
                Err(err) => self.set_status(describe_error(&err)),
            },
            KeyCode::Enter => {
                if self.selected_item().is_some() {
                    self.mode = Mode::Details;
                }
            }
            _ => {}
        }
        false
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Enter => self.mode = Mode::Normal,
            KeyCode::Backspace => {
                self.search.pop();
                self.clamp_selection();
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.selected = 0;
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        let Some(form) = self.form.as_mut() else {
            self.mode = Mode::Normal;
            return;
        };
        match code {
            KeyCode::Esc => {
                self.form = None;
                self.mode = Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Backspace => {
                form.focused_mut().value.pop();
            }
            KeyCode::Char(c) => form.focused_mut().value.push(c),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    /// Validate and commit the active form; a rejected submit keeps the
    /// form open with the field error in the status line.
    fn submit_form(&mut self) {
        let Some(form) = self.form.clone() else {
            return;
        };
        let (title, media) = match form.validated_payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.set_status(err.to_string());
                return;
            }
        };

        let result = match form.editing {
            Some(id) => {
                if let Some(item) = self.repo.get_by_id_mut(id) {
                    item.title = title;
                    item.media = media;
                }
                self.repo.save().map(|_| id)
            }
            None => self.repo.add_item(Item::new(title, media)),
        };

        match result {
            Ok(id) => {
                self.set_status(format!("Saved item {id}"));
                self.form = None;
                self.mode = Mode::Normal;
                self.clamp_selection();
            }
            Err(err) => self.set_status(describe_error(&err)),
        }
    }

    fn begin_checkout(&mut self) {
        let Some(item) = self.selected_item() else {
            self.set_status("Select an item to check out");
            return;
        };
        // Reject before prompting for a date
        if item.is_checked_out() {
            self.set_status(format!("'{}' is already checked out", item.title));
            return;
        }
        self.date_buffer.clear();
        self.mode = Mode::CheckOut;
    }

    fn handle_checkout_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.date_buffer.clear();
                self.mode = Mode::Normal;
            }
            KeyCode::Backspace => {
                self.date_buffer.pop();
            }
            KeyCode::Char(c) => self.date_buffer.push(c),
            KeyCode::Enter => self.submit_checkout(),
            _ => {}
        }
    }

    fn submit_checkout(&mut self) {
        let Some(id) = self.selected_id() else {
            self.mode = Mode::Normal;
            return;
        };
        let due_date = self.date_buffer.clone();
        let outcome = match self.repo.get_by_id_mut(id) {
            Some(item) => item.check_out(&due_date),
            None => return,
        };
        match outcome {
            Ok(()) => {
                if let Err(err) = self.repo.save() {
                    self.set_status(describe_error(&err));
                } else {
                    self.set_status("Checked out");
                }
                self.date_buffer.clear();
                self.mode = Mode::Normal;
            }
            // Stay in the prompt so the date can be corrected
            Err(err) => self.set_status(describe_error(&err)),
        }
    }

    fn return_selected(&mut self) {
        let Some(id) = self.selected_id() else {
            self.set_status("Select an item to return");
            return;
        };
        let outcome = match self.repo.get_by_id_mut(id) {
            Some(item) => item.return_item(),
            None => return,
        };
        match outcome {
            Ok(()) => match self.repo.save() {
                Ok(()) => self.set_status("Returned"),
                Err(err) => self.set_status(describe_error(&err)),
            },
            Err(err) => self.set_status(describe_error(&err)),
        }
    }

    fn handle_confirm_delete_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                if let Some(id) = self.pending_delete.take() {
                    match self.repo.delete_item(id) {
                        Ok(()) => self.set_status("Deleted"),
                        Err(err) => self.set_status(describe_error(&err)),
                    }
                    self.clamp_selection();
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.pending_delete = None;
                self.mode = Mode::Normal;
            }
            _ => {}
        }
    }

    /// Render the application
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Status bar at top, table in the middle, message line at bottom
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(size);

        self.render_status_bar(frame, chunks[0]);
        self.render_table(frame, chunks[1]);
        self.render_message_line(frame, chunks[2]);

        match self.mode {
            Mode::Form => self.render_form_overlay(frame, size),
            Mode::CheckOut => self.render_checkout_overlay(frame, size),
            Mode::ConfirmDelete => self.render_confirm_overlay(frame, size),
            Mode::Details => self.render_details_overlay(frame, size),
            _ => {}
        }

        if self.show_help {
            self.render_help_overlay(frame, size);
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let direction = if self.sort_reverse { "desc" } else { "asc" };
        let line = Line::from(vec![
            Span::styled(
                " imshelf ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                self.mode.short_code(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(
                "  {} items  sort: {} ({direction})",
                self.visible_items().len(),
                self.sort_column.label(),
            )),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let items = self.visible_items();

        let header = Row::new(
            ["ID", "Title", "Type", "Status", "Due Date"]
                .into_iter()
                .map(Cell::from),
        )
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = items
            .iter()
            .map(|item| {
                let status = if item.is_checked_out() {
                    Cell::from("Checked Out").style(Style::default().fg(Color::Yellow))
                } else {
                    Cell::from("Available").style(Style::default().fg(Color::Green))
                };
                Row::new(vec![
                    Cell::from(item.id.map(|id| id.to_string()).unwrap_or_default()),
                    Cell::from(item.title.clone()),
                    Cell::from(item.item_type().as_str()),
                    status,
                    Cell::from(
                        item.due_date()
                            .map(|due| due.to_string())
                            .unwrap_or_default(),
                    ),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(20),
                Constraint::Length(6),
                Constraint::Length(13),
                Constraint::Length(12),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Holdings"))
        .row_highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        self.table_state
            .select(if items.is_empty() { None } else { Some(self.selected) });
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_message_line(&self, frame: &mut Frame, area: Rect) {
        let line = match self.mode {
            Mode::Search => Line::from(vec![
                Span::styled("Search: ", Style::default().fg(Color::Cyan)),
                Span::raw(self.search.as_str()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            _ => match &self.status_message {
                Some(message) => Line::from(Span::styled(
                    message.as_str(),
                    Style::default().fg(Color::Yellow),
                )),
                None => Line::from(Span::styled(
                    "a add book  v add dvd  e edit  d delete  c check out  r return  / search  ? help  q quit",
                    Style::default().fg(Color::DarkGray),
                )),
            },
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_form_overlay(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = &self.form else { return };
        let popup = centered_rect(50, 40, area);
        frame.render_widget(Clear, popup);

        let mut lines = Vec::new();
        for (index, field) in form.fields.iter().enumerate() {
            let style = if index == form.focus {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<20}", field.label), style),
                Span::raw(field.value.clone()),
                if index == form.focus {
                    Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK))
                } else {
                    Span::raw("")
                },
            ]));
        }
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "Tab next field  Enter save  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default().borders(Borders::ALL).title(form.title());
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    fn render_checkout_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup);

        let lines = vec![
            Line::from(vec![
                Span::raw("Enter due date (YYYY-MM-DD): "),
                Span::raw(self.date_buffer.clone()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            Line::raw(""),
            Line::from(Span::styled(
                "Enter confirm  Esc cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let block = Block::default().borders(Borders::ALL).title("Check Out");
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    fn render_confirm_overlay(&self, frame: &mut Frame, area: Rect) {
        let title = self
            .pending_delete
            .and_then(|id| self.repo.get_by_id(id).map(|item| item.title.clone()))
            .unwrap_or_default();
        let popup = centered_rect(50, 20, area);
        frame.render_widget(Clear, popup);

        let lines = vec![
            Line::raw(format!("Are you sure you want to delete '{title}'?")),
            Line::raw(""),
            Line::from(Span::styled(
                "y delete  n cancel",
                Style::default().fg(Color::DarkGray),
            )),
        ];
        let block = Block::default().borders(Borders::ALL).title("Delete Item");
        frame.render_widget(
            Paragraph::new(lines).wrap(Wrap { trim: false }).block(block),
            popup,
        );
    }

    fn render_details_overlay(&self, frame: &mut Frame, area: Rect) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let popup = centered_rect(50, 40, area);
        frame.render_widget(Clear, popup);

        let mut lines = vec![
            Line::raw(format!("Title: {}", item.title)),
            Line::raw(format!("Type: {}", item.item_type())),
        ];
        match &item.media {
            Media::Book { author, pages } => {
                lines.push(Line::raw(format!("Author: {author}")));
                lines.push(Line::raw(format!("Pages: {pages}")));
            }
            Media::Dvd {
                duration_minutes,
                rating,
            } => {
                lines.push(Line::raw(format!("Duration: {duration_minutes} minutes")));
                lines.push(Line::raw(format!("Rating: {rating}")));
            }
        }
        let status = if item.is_checked_out() {
            "Checked Out"
        } else {
            "Available"
        };
        lines.push(Line::raw(format!("Status: {status}")));
        lines.push(Line::raw(format!(
            "Due Date: {}",
            item.due_date()
                .map(|due| due.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        )));
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "any key to close",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default().borders(Borders::ALL).title("Item Details");
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }

    fn render_help_overlay(&self, frame: &mut Frame, area: Rect) {
        let popup = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup);

        let lines = vec![
            Line::raw("a        add a book"),
            Line::raw("v        add a DVD"),
            Line::raw("e        edit the selection"),
            Line::raw("d        delete the selection (with confirmation)"),
            Line::raw("c        check the selection out"),
            Line::raw("r        return the selection"),
            Line::raw("Enter    show details for the selection"),
            Line::raw("/        search by id, title, type, or author"),
            Line::raw("1-5      sort by column; again to reverse"),
            Line::raw("s        save to disk"),
            Line::raw("j/k      move the selection"),
            Line::raw("q        quit"),
        ];
        let block = Block::default().borders(Borders::ALL).title("Help");
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Keep items whose id, title, type, or author contains `query`
/// (case-insensitive).
pub(crate) fn filter_items(items: &[Item], query: &str) -> Vec<Item> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            let mut haystack = format!(
                "{} {} {}",
                item.id.map(|id| id.to_string()).unwrap_or_default(),
                item.title,
                item.item_type()
            );
            if let Media::Book { author, .. } = &item.media {
                haystack.push(' ');
                haystack.push_str(author);
            }
            haystack.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}

/// Stable sort by the given column; items without a due date sort last.
pub(crate) fn sort_items(items: &mut [Item], column: SortColumn, reverse: bool) {
    match column {
        SortColumn::Id => items.sort_by_key(|item| item.id.unwrap_or(0)),
        SortColumn::Title => items.sort_by_key(|item| item.title.to_lowercase()),
        SortColumn::Type => items.sort_by_key(|item| item.item_type().as_str()),
        SortColumn::Status => items.sort_by_key(|item| item.is_checked_out()),
        SortColumn::DueDate => {
            items.sort_by_key(|item| (item.due_date().is_none(), item.due_date()))
        }
    }
    if reverse {
        items.reverse();
    }
}

/// Pick the user-facing message for a rejected action.
fn describe_error(err: &ShelfError) -> String {
    match err {
        ShelfError::Validation(inner) => inner.to_string(),
        ShelfError::InvalidState(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<Item> {
        let mut book = Item::book("1984", "George Orwell", 328);
        book.id = Some(1);
        let mut dvd = Item::dvd("Inception", 148, 4);
        dvd.id = Some(2);
        dvd.check_out("2025-01-15").unwrap();
        let mut other = Item::book("animal farm", "George Orwell", 112);
        other.id = Some(3);
        vec![book, dvd, other]
    }

    #[test]
    fn filter_matches_title_type_and_author() {
        let items = sample_items();

        let hits = filter_items(&items, "orwell");
        assert_eq!(hits.len(), 2);

        let hits = filter_items(&items, "dvd");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Inception");

        let hits = filter_items(&items, "INCEPTION");
        assert_eq!(hits.len(), 1);

        assert!(filter_items(&items, "zzz").is_empty());
    }

    #[test]
    fn empty_query_keeps_everything() {
        let items = sample_items();
        assert_eq!(filter_items(&items, "  ").len(), 3);
    }

    #[test]
    fn sort_by_title_is_case_insensitive() {
        let mut items = sample_items();
        sort_items(&mut items, SortColumn::Title, false);
        let titles: Vec<_> = items.iter().map(|item| item.title.as_str()).collect();
        assert_eq!(titles, vec!["1984", "animal farm", "Inception"]);
    }

    #[test]
    fn sort_by_due_date_puts_dateless_items_last() {
        let mut items = sample_items();
        sort_items(&mut items, SortColumn::DueDate, false);
        assert_eq!(items[0].title, "Inception");
        assert!(items[1].due_date().is_none());
    }

    #[test]
    fn reverse_flips_the_order() {
        let mut items = sample_items();
        sort_items(&mut items, SortColumn::Id, true);
        let ids: Vec<_> = items.iter().map(|item| item.id.unwrap()).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
