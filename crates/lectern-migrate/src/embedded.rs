//! Migrations embedded in the binary.
//!
//! Each migration is a numbered `.sql` file embedded via `include_str!`. The
//! names go through the same ordinal parsing and duplicate detection as a
//! migration directory.

/// `(file name, sql)` pairs for the built-in schema history.
pub(crate) static EMBEDDED_MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_initial.sql",
        include_str!("../migrations/001_initial.sql"),
    ),
    (
        "002_decks_and_cards.sql",
        include_str!("../migrations/002_decks_and_cards.sql"),
    ),
    (
        "003_scope_sets.sql",
        include_str!("../migrations/003_scope_sets.sql"),
    ),
    (
        "004_flashcards_and_mistakes.sql",
        include_str!("../migrations/004_flashcards_and_mistakes.sql"),
    ),
];
