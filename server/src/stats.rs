use std::collections::HashMap;
use std::fmt;

use msgs::color::TileColor;

/// Point-in-time usage numbers derived from the engine's counters. Never on
/// the wire; the engine logs a summary after every accepted edit.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub color_counts: HashMap<TileColor, u64>,
    pub edit_counts: HashMap<String, u64>,
    pub total_edits: u64,
}

impl Statistics {
    pub(crate) fn derive(
        color_counts: &HashMap<TileColor, u64>,
        edit_counts: &HashMap<String, u64>,
        total_edits: u64,
    ) -> Statistics {
        Statistics {
            color_counts: color_counts.clone(),
            edit_counts: edit_counts.clone(),
            total_edits,
        }
    }

    /// Fraction of all accepted edits that used `color`. Zero before the
    /// first edit.
    pub fn concentration(&self, color: TileColor) -> f64 {
        if self.total_edits == 0 {
            return 0.0;
        }
        *self.color_counts.get(&color).unwrap_or(&0) as f64 / self.total_edits as f64
    }

    /// The user with the most edits and that count. Ties break arbitrarily.
    pub fn top_contributor(&self) -> Option<(&str, u64)> {
        self.edit_counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .map(|(username, count)| (username.as_str(), *count))
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edits: {}", self.total_edits)?;
        for color in TileColor::ALL {
            let count = *self.color_counts.get(&color).unwrap_or(&0);
            if count > 0 {
                write!(f, ", {color}: {count} ({:.2})", self.concentration(color))?;
            }
        }
        if let Some((username, count)) = self.top_contributor() {
            write!(f, ", top contributor: {username} ({count})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reads_in_one_line() {
        let mut color_counts = HashMap::new();
        color_counts.insert(TileColor::Red, 3);
        color_counts.insert(TileColor::Blue, 1);
        let mut edit_counts = HashMap::new();
        edit_counts.insert("alice".to_owned(), 3);
        edit_counts.insert("bob".to_owned(), 1);

        let stats = Statistics::derive(&color_counts, &edit_counts, 4);
        let line = stats.to_string();
        assert!(line.starts_with("edits: 4"));
        assert!(line.contains("red: 3 (0.75)"));
        assert!(line.contains("blue: 1 (0.25)"));
        assert!(line.contains("top contributor: alice (3)"));
    }

    #[test]
    fn empty_statistics_have_no_contributor() {
        let stats = Statistics::derive(&HashMap::new(), &HashMap::new(), 0);
        assert_eq!(stats.top_contributor(), None);
        assert_eq!(stats.concentration(TileColor::Red), 0.0);
        assert_eq!(stats.to_string(), "edits: 0");
    }
}
