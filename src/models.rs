//! Domain models for the catalog. `BookRecord` mirrors a row of the `books`
//! table; `NewBook` and `BookId` are the validated forms of raw user input and
//! are the only way text typed into a form reaches the persistence layer.

use std::fmt;

use crate::error::CatalogError;

/// Leading words ignored by the title sort.
const IGNORED_LEADING_WORDS: &[&str] = &["the", "a", "an"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// One catalog entry as stored in the `books` table.
pub struct BookRecord {
    /// `book_id` column. Assigned as the current maximum plus one.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// `pub_date` column. Always four digits.
    pub pub_year: i64,
}

impl BookRecord {
    /// Key used by the title sort: a leading "the", "a" or "an" is skipped as
    /// long as something follows it.
    pub fn title_sort_key(&self) -> &str {
        title_sort_key(&self.title)
    }
}

impl fmt::Display for BookRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID: {} | Title: {} | Author: {} | Publication Date: {}",
            self.id, self.title, self.author, self.pub_year
        )
    }
}

/// Strip one leading article from `title` for ordering purposes.
pub fn title_sort_key(title: &str) -> &str {
    let trimmed = title.trim_start();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or_default();
    let rest = parts.next().map(str::trim_start).unwrap_or_default();

    if !rest.is_empty()
        && IGNORED_LEADING_WORDS
            .iter()
            .any(|word| first.eq_ignore_ascii_case(word))
    {
        rest
    } else {
        title
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A book that passed input validation but has no id yet. [`NewBook::parse`]
/// is the only way to build one outside this crate:
///
/// ```compile_fail
/// let book = book_catalog::NewBook {
///     title: String::new(),
///     author: String::new(),
///     pub_year: 5,
/// };
/// ```
pub struct NewBook {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) pub_year: i64,
}

impl NewBook {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn pub_year(&self) -> i64 {
        self.pub_year
    }

    /// Validate the three raw form fields. Title and author are trimmed and
    /// must not be blank; the year must be a four digit number.
    pub fn parse(title: &str, author: &str, pub_year: &str) -> Result<Self, CatalogError> {
        let title = title.trim();
        let author = author.trim();
        let year_raw = pub_year.trim();

        if title.is_empty() || author.is_empty() || year_raw.is_empty() {
            return Err(CatalogError::Validation(
                "Please provide all book details.".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            author: author.to_string(),
            pub_year: parse_pub_year(year_raw)?,
        })
    }
}

/// Parse a publication year. The decimal form of the value must be exactly
/// four digits, so "0999", "-999" and "19890" are all rejected.
pub fn parse_pub_year(raw: &str) -> Result<i64, CatalogError> {
    let invalid = || {
        CatalogError::Validation("Publication date must be a valid four-digit number.".to_string())
    };

    let year = raw.trim().parse::<i64>().map_err(|_| invalid())?;
    if (1000..=9999).contains(&year) {
        Ok(year)
    } else {
        Err(invalid())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifier of an existing record, parsed from user input.
pub struct BookId(pub i64);

impl BookId {
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CatalogError::Validation(
                "Please provide the book's ID.".to_string(),
            ));
        }
        raw.parse::<i64>().map(BookId).map_err(|_| {
            CatalogError::Validation(format!("Book ID must be a number, got '{raw}'."))
        })
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// SQL keyword for `ORDER BY` clauses.
    pub(crate) fn sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Numeric columns that can be ordered directly by SQLite.
pub enum NumericField {
    Id,
    PubYear,
}

impl NumericField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            NumericField::Id => "book_id",
            NumericField::PubYear => "pub_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Every ordering the presentation layer can ask for.
pub enum SortKey {
    Title,
    Author,
    Field(NumericField),
}

impl SortKey {
    /// Short label used by the status line and the CLI.
    pub fn label(self, direction: SortDirection) -> &'static str {
        match (self, direction) {
            (SortKey::Title, SortDirection::Ascending) => "title A-Z",
            (SortKey::Title, SortDirection::Descending) => "title Z-A",
            (SortKey::Author, SortDirection::Ascending) => "author A-Z",
            (SortKey::Author, SortDirection::Descending) => "author Z-A",
            (SortKey::Field(NumericField::Id), SortDirection::Ascending) => "ID ascending",
            (SortKey::Field(NumericField::Id), SortDirection::Descending) => "ID descending",
            (SortKey::Field(NumericField::PubYear), SortDirection::Ascending) => {
                "publication date ascending"
            }
            (SortKey::Field(NumericField::PubYear), SortDirection::Descending) => {
                "publication date descending"
            }
        }
    }
}
