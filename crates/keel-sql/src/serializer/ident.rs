use super::{Flavor, Serializer};

use std::fmt;

/// A quoted identifier.
pub(super) struct Ident<'a>(pub(super) &'a Serializer, pub(super) &'a str);

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quote = match self.0.flavor {
            Flavor::Mysql => '`',
            Flavor::Postgresql | Flavor::Sqlite => '"',
        };

        write!(f, "{quote}")?;
        for c in self.1.chars() {
            // Quotes inside the name are doubled
            if c == quote {
                write!(f, "{quote}")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "{quote}")
    }
}
