//! Book (catalog entry) model and related types

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use validator::Validate;

use crate::error::AppError;

/// Numeric ISBN code, the catalog primary key.
///
/// Both ISBN-10 and ISBN-13 codes are accepted as long as they are purely
/// numeric; hyphens and spaces are stripped when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Isbn(u64);

impl Isbn {
    pub fn new(code: u64) -> Self {
        Isbn(code)
    }
}

/// ISBN-10 codes starting with `0` are padded back to ten digits.
impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:010}", self.0)
    }
}

impl FromStr for Isbn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = normalize_isbn(s);
        if digits.len() != 10 && digits.len() != 13 {
            return Err(AppError::Validation(format!(
                "ISBN must have 10 or 13 digits, got '{}'",
                s
            )));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AppError::Validation(format!("ISBN must be numeric, got '{}'", s)));
        }
        digits
            .parse::<u64>()
            .map(Isbn)
            .map_err(|e| AppError::Validation(format!("Invalid ISBN '{}': {}", s, e)))
    }
}

/// Strip separators from an ISBN as typed or printed
fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Catalog record, one per distinct title/edition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub publication_year: u32,
    /// Copies owned, available and lent
    pub copy_count: u32,
}

/// Add book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    pub isbn: Isbn,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[validate(length(min = 1, message = "Subject must not be empty"))]
    pub subject: String,
    #[validate(range(max = 9999, message = "Publication year is not plausible"))]
    pub publication_year: u32,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub copy_count: u32,
}

impl NewBook {
    /// Trim descriptive fields so blank input fails validation
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            subject: self.subject.trim().to_string(),
            ..self
        }
    }
}

impl From<NewBook> for BookRecord {
    fn from(book: NewBook) -> Self {
        Self {
            isbn: book.isbn,
            title: book.title,
            author: book.author,
            subject: book.subject,
            publication_year: book.publication_year,
            copy_count: book.copy_count,
        }
    }
}

/// Edit book request; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BookUpdate {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, message = "Subject must not be empty"))]
    pub subject: Option<String>,
    #[validate(range(max = 9999, message = "Publication year is not plausible"))]
    pub publication_year: Option<u32>,
    pub copy_count: Option<u32>,
}

impl BookUpdate {
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.map(|s| s.trim().to_string()),
            author: self.author.map(|s| s.trim().to_string()),
            subject: self.subject.map(|s| s.trim().to_string()),
            ..self
        }
    }

    /// Apply the present fields to `record`
    pub fn apply_to(self, record: &mut BookRecord) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(author) = self.author {
            record.author = author;
        }
        if let Some(subject) = self.subject {
            record.subject = subject;
        }
        if let Some(year) = self.publication_year {
            record.publication_year = year;
        }
        if let Some(copies) = self.copy_count {
            record.copy_count = copies;
        }
    }
}
