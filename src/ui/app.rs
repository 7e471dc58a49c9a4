use std::mem;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::warn;

use crate::catalog::CatalogStore;
use crate::command::{Request, Response};
use crate::db::ExportOutcome;
use crate::error::CatalogError;
use crate::models::{BookRecord, NumericField, SortDirection, SortKey};

use super::forms::{input_line, BookField, BookForm, ExportPrompt, RemovePrompt};
use super::helpers::{centered_rect, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// File name suggested by the export prompt.
const DEFAULT_EXPORT_FILE: &str = "library.csv";

/// Which listing the main screen shows. It is re-run against the store after
/// every change, so the UI never holds on to stale rows.
#[derive(Clone, PartialEq, Eq)]
enum View {
    All,
    Search(String),
    Sorted(SortKey, SortDirection),
}

impl View {
    fn request(&self) -> Request {
        match self {
            View::All => Request::ListAll,
            View::Search(query) => Request::Search {
                query: query.clone(),
            },
            View::Sorted(key, direction) => Request::Sort {
                key: *key,
                direction: *direction,
            },
        }
    }

    fn title(&self) -> String {
        match self {
            View::All => "All books".to_string(),
            View::Search(query) => format!("Search: \"{query}\""),
            View::Sorted(key, direction) => format!("Sorted by {}", key.label(*direction)),
        }
    }
}

/// Fine-grained modes layered over the book list.
enum Mode {
    Normal,
    AddingBook(BookForm),
    RemovingBook(RemovePrompt),
    Searching(SearchState),
    Exporting(ExportPrompt),
}

/// State for an active inline search. `previous` is restored on cancel.
struct SearchState {
    query: String,
    previous: View,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Warning,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Warning => Style::default().fg(Color::Yellow),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state for the TUI. The store is the only source of
/// book data; `books` is just the rows currently on screen.
pub struct App {
    store: CatalogStore,
    books: Vec<BookRecord>,
    selected: usize,
    view: View,
    mode: Mode,
    status: Option<StatusMessage>,
    last_export: Option<PathBuf>,
}

impl App {
    pub fn new(store: CatalogStore) -> Result<Self> {
        let mut app = Self {
            store,
            books: Vec::new(),
            selected: 0,
            view: View::All,
            mode: Mode::Normal,
            status: None,
            last_export: None,
        };
        app.reload()?;
        Ok(app)
    }

    /// Hand the store back so the caller can close it explicitly.
    pub fn into_store(self) -> CatalogStore {
        self.store
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::RemovingBook(prompt) => self.handle_remove_book(code, prompt),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::Exporting(prompt) => self.handle_export(code, prompt),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.books.len().saturating_sub(1),
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Mode::AddingBook(BookForm::default());
            }
            KeyCode::Char('-') | KeyCode::Char('d') => {
                self.clear_status();
                return Mode::RemovingBook(RemovePrompt::for_book(self.current_book()));
            }
            KeyCode::Char('/') => {
                self.clear_status();
                let query = match &self.view {
                    View::Search(query) => query.clone(),
                    _ => String::new(),
                };
                return Mode::Searching(SearchState {
                    query,
                    previous: self.view.clone(),
                });
            }
            KeyCode::Char('t') => self.sort_by(SortKey::Title),
            KeyCode::Char('u') => self.sort_by(SortKey::Author),
            KeyCode::Char('i') => self.sort_by(SortKey::Field(NumericField::Id)),
            KeyCode::Char('y') => self.sort_by(SortKey::Field(NumericField::PubYear)),
            KeyCode::Char('r') => {
                self.clear_status();
                self.show(View::All);
            }
            KeyCode::Char('x') => {
                self.clear_status();
                return Mode::Exporting(ExportPrompt::new(DEFAULT_EXPORT_FILE));
            }
            KeyCode::Char('o') => self.open_last_export(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let request = Request::Add {
                    title: form.title.clone(),
                    author: form.author.clone(),
                    pub_year: form.pub_year.clone(),
                };
                match self.store.execute(request) {
                    Ok(Response::Added(book)) => {
                        self.set_status(
                            format!("Book added successfully (ID {}).", book.id),
                            StatusKind::Info,
                        );
                        self.reload_or_report();
                        self.select_book(book.id);
                        return Mode::Normal;
                    }
                    Ok(_) => return Mode::Normal,
                    Err(err) => form.error = Some(surface_error(&err)),
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingBook(form)
    }

    fn handle_remove_book(&mut self, code: KeyCode, mut prompt: RemovePrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Remove cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                prompt.id.pop();
            }
            KeyCode::Enter => {
                let request = Request::Remove {
                    id: prompt.id.clone(),
                };
                match self.store.execute(request) {
                    Ok(_) => {
                        self.set_status("Book removed successfully.", StatusKind::Info);
                        self.reload_or_report();
                        return Mode::Normal;
                    }
                    Err(err) => prompt.error = Some(surface_error(&err)),
                }
            }
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
            }
            _ => {}
        }
        Mode::RemovingBook(prompt)
    }

    /// Results follow the query as it is typed; Enter keeps them, Esc goes
    /// back to whatever was shown before.
    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.show(state.previous);
                return Mode::Normal;
            }
            KeyCode::Enter => {
                let count = self.books.len();
                self.set_status(
                    format!("{count} book(s) match \"{}\".", state.query),
                    StatusKind::Info,
                );
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => return Mode::Searching(state),
        }
        self.show(View::Search(state.query.clone()));
        Mode::Searching(state)
    }

    fn handle_export(&mut self, code: KeyCode, mut prompt: ExportPrompt) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Export cancelled.", StatusKind::Warning);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                prompt.path.pop();
            }
            KeyCode::Enter => {
                let path = prompt.path.trim();
                if path.is_empty() {
                    prompt.error = Some("No file selected.".to_string());
                    return Mode::Exporting(prompt);
                }
                let request = Request::Export {
                    path: PathBuf::from(path),
                };
                match self.store.execute(request) {
                    Ok(Response::Exported(ExportOutcome::Exported { path, rows })) => {
                        self.set_status(
                            format!(
                                "Library database exported to {} ({rows} books). \
                                 Press 'o' to open it.",
                                path.display()
                            ),
                            StatusKind::Info,
                        );
                        self.last_export = Some(path);
                        return Mode::Normal;
                    }
                    Ok(_) => {
                        self.set_status("No books found in the database.", StatusKind::Warning);
                        return Mode::Normal;
                    }
                    Err(err) => prompt.error = Some(surface_error(&err)),
                }
            }
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
            }
            _ => {}
        }
        Mode::Exporting(prompt)
    }

    /// Switch to `key`, or flip the direction when that sort is already shown.
    fn sort_by(&mut self, key: SortKey) {
        let direction = match self.view {
            View::Sorted(current, direction) if current == key => direction.flipped(),
            _ => SortDirection::Ascending,
        };
        self.set_status(
            format!("Sorted by {}.", key.label(direction)),
            StatusKind::Info,
        );
        self.show(View::Sorted(key, direction));
    }

    fn open_last_export(&mut self) {
        let Some(path) = self.last_export.clone() else {
            self.set_status("Nothing exported yet.", StatusKind::Warning);
            return;
        };
        if let Err(err) = open_link(&path) {
            warn!(path = %path.display(), %err, "failed to open export");
            self.set_status(
                format!("Could not open {}: {err}", path.display()),
                StatusKind::Error,
            );
        }
    }

    fn show(&mut self, view: View) {
        self.view = view;
        self.selected = 0;
        self.reload_or_report();
    }

    /// Re-run the current view against the store.
    fn reload(&mut self) -> Result<(), CatalogError> {
        self.books = self
            .store
            .execute(self.view.request())?
            .into_books()
            .unwrap_or_default();
        self.ensure_in_bounds();
        Ok(())
    }

    fn reload_or_report(&mut self) {
        if let Err(err) = self.reload() {
            self.set_status(surface_error(&err), StatusKind::Error);
        }
    }

    fn current_book(&self) -> Option<&BookRecord> {
        self.books.get(self.selected)
    }

    fn select_book(&mut self, id: i64) {
        if let Some(index) = self.books.iter().position(|book| book.id == id) {
            self.selected = index;
        }
    }

    fn move_selection(&mut self, offset: isize) {
        if self.books.is_empty() {
            return;
        }
        let last = self.books.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    fn ensure_in_bounds(&mut self) {
        if self.books.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.books.len() {
            self.selected = self.books.len() - 1;
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_book_list(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, form),
            Mode::RemovingBook(prompt) => self.draw_remove_prompt(frame, area, prompt),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Exporting(prompt) => self.draw_export_prompt(frame, area, prompt),
            Mode::Normal => {}
        }
    }

    /// Block title for the book list: backing file, current view and row count.
    fn list_title(&self) -> String {
        let source = self
            .store
            .path()
            .and_then(|path| path.file_name())
            .map_or_else(|| "in memory".into(), |name| name.to_string_lossy());
        format!(
            " Library Database ({source}): {} ({}) ",
            self.view.title(),
            self.books.len()
        )
    }

    fn draw_book_list(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.list_title());

        if self.books.is_empty() {
            let text = match &self.view {
                View::Search(query) => format!("No books match \"{query}\"."),
                _ => "No books yet. Press '+' to add one.".to_string(),
            };
            let message = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .books
            .iter()
            .map(|book| ListItem::new(book.to_string()))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match &self.mode {
            Mode::Normal => &[
                ("[+]", " Add   "),
                ("[-]", " Remove   "),
                ("[/]", " Search   "),
                ("[t/u/i/y]", " Sort title/author/ID/date   "),
                ("[r]", " All   "),
                ("[x]", " Export   "),
                ("[q]", " Quit"),
            ],
            Mode::AddingBook(_) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::Searching(_) => &[("[Enter]", " Keep results   "), ("[Esc]", " Cancel")],
            Mode::RemovingBook(_) | Mode::Exporting(_) => {
                &[("[Enter]", " Confirm   "), ("[Esc]", " Cancel")]
            }
        };

        Line::from(
            keys.iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(action.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let fields = [BookField::Title, BookField::Author, BookField::PubYear];
        let mut lines: Vec<Line> = fields.iter().map(|field| form.build_line(*field)).collect();
        lines.push(Line::from(""));
        lines.push(hint_or_error(
            form.error.as_deref(),
            "Enter to save • Tab to switch • Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = form.active.label().len() as u16 + 2;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + form.active.row(),
        ));
    }

    fn draw_remove_prompt(&self, frame: &mut Frame, area: Rect, prompt: &RemovePrompt) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Remove Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let target = prompt
            .id
            .parse::<i64>()
            .ok()
            .and_then(|id| self.books.iter().find(|book| book.id == id));
        let summary = match target {
            Some(book) => format!("{} by {}", book.title, book.author),
            None => String::new(),
        };

        let lines = vec![
            input_line("Book ID", &prompt.id, true),
            Line::from(Span::styled(summary, Style::default().fg(Color::Gray))),
            Line::from(""),
            hint_or_error(
                prompt.error.as_deref(),
                "Enter to remove permanently • Esc to cancel",
            ),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + "Book ID: ".len() as u16 + prompt.id.chars().count() as u16,
            inner.y,
        ));
    }

    fn draw_export_prompt(&self, frame: &mut Frame, area: Rect, prompt: &ExportPrompt) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Export to CSV")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            input_line("File", &prompt.path, true),
            Line::from(""),
            hint_or_error(prompt.error.as_deref(), "Enter to export • Esc to cancel"),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position((
            inner.x + "File: ".len() as u16 + prompt.path.chars().count() as u16,
            inner.y,
        ));
    }
}

/// Red error text when present, otherwise a grey usage hint.
fn hint_or_error(error: Option<&str>, hint: &'static str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}
