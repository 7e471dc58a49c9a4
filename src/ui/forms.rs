use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::BookRecord;

/// Render `Label: value`, highlighting the field that has focus and showing a
/// placeholder for empty required inputs.
pub(crate) fn input_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// State of the "Add Book" popup.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) pub_year: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    PubYear,
}

impl BookField {
    /// Label shown in front of the input, also used to place the cursor.
    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::PubYear => "Publication Date",
        }
    }

    /// Row of the field inside the form.
    pub(crate) fn row(self) -> u16 {
        match self {
            BookField::Title => 0,
            BookField::Author => 1,
            BookField::PubYear => 2,
        }
    }
}

impl BookForm {
    /// Move focus forward, wrapping from the year back to the title.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::PubYear,
            BookField::PubYear => BookField::Title,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            BookField::Title => BookField::PubYear,
            BookField::Author => BookField::Title,
            BookField::PubYear => BookField::Author,
        };
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::PubYear => &mut self.pub_year,
        }
    }

    pub(crate) fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::PubYear => &self.pub_year,
        }
    }

    /// Append a character to the active field. The year only takes digits.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let accepted = match self.active {
            BookField::PubYear => ch.is_ascii_digit(),
            BookField::Title | BookField::Author => !ch.is_control(),
        };
        if accepted {
            self.value_mut(self.active).push(ch);
        }
        accepted
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        input_line(field.label(), self.value(field), self.active == field)
    }

    /// Character count of the field, for cursor placement.
    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.value(field).chars().count()
    }
}

/// Single-field popup asking for the id of the book to remove.
#[derive(Default, Clone)]
pub(crate) struct RemovePrompt {
    pub(crate) id: String,
    pub(crate) error: Option<String>,
}

impl RemovePrompt {
    /// Prefill with the highlighted book so removing it is one keystroke.
    pub(crate) fn for_book(book: Option<&BookRecord>) -> Self {
        Self {
            id: book.map(|b| b.id.to_string()).unwrap_or_default(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_digit() {
            self.id.push(ch);
            true
        } else {
            false
        }
    }
}

/// Popup asking where the CSV export should go.
#[derive(Clone)]
pub(crate) struct ExportPrompt {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl ExportPrompt {
    pub(crate) fn new(default_path: &str) -> Self {
        Self {
            path: default_path.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            false
        } else {
            self.path.push(ch);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_field_only_accepts_digits() {
        let mut form = BookForm {
            active: BookField::PubYear,
            ..BookForm::default()
        };
        assert!(form.push_char('1'));
        assert!(!form.push_char('x'));
        assert_eq!(form.pub_year, "1");
    }

    #[test]
    fn focus_cycles_through_fields() {
        let mut form = BookForm::default();
        form.next_field();
        assert!(form.active == BookField::Author);
        form.next_field();
        form.next_field();
        assert!(form.active == BookField::Title);
        form.previous_field();
        assert!(form.active == BookField::PubYear);
    }

    #[test]
    fn remove_prompt_prefills_selected_id() {
        let book = BookRecord {
            id: 12,
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            pub_year: 1965,
        };
        assert_eq!(RemovePrompt::for_book(Some(&book)).id, "12");
        assert_eq!(RemovePrompt::for_book(None).id, "");
    }
}
