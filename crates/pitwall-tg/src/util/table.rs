//! Plain-text tables for monospace chat messages.

use itertools::Itertools;
use std::fmt;

#[derive(Debug, Default)]
pub(crate) struct Table {
    title: Option<String>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn new<I>(header: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            title: None,
            header: header.into_iter().map(Into::into).collect(),
            rows: vec![],
        }
    }

    pub(crate) fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Missing cells are rendered empty, extra cells are dropped.
    pub(crate) fn row<I>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut row = cells
            .into_iter()
            .take(self.header.len())
            .map(|cell| cell.to_string())
            .collect_vec();

        row.resize(self.header.len(), String::new());
        self.rows.push(row);
        self
    }

    fn column_widths(&self) -> Vec<usize> {
        (0..self.header.len())
            .map(|col| {
                std::iter::once(&self.header[col])
                    .chain(self.rows.iter().map(|row| &row[col]))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(cell.chars().count());
    format!("{cell}{}", " ".repeat(padding))
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.column_widths();

        let separator = format!(
            "+{}+",
            widths.iter().map(|width| "-".repeat(width + 2)).join("+")
        );

        let line = |cells: &[String]| {
            let cells = cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| pad(cell, *width))
                .join(" | ");
            format!("| {cells} |")
        };

        if let Some(title) = &self.title {
            // Inner width of the table without the outer borders
            let inner = separator.chars().count().saturating_sub(4);
            writeln!(f, "+{}+", "-".repeat(inner + 2))?;
            writeln!(f, "| {} |", pad(title, inner))?;
        }

        writeln!(f, "{separator}")?;
        writeln!(f, "{}", line(&self.header))?;
        writeln!(f, "{separator}")?;

        for row in &self.rows {
            writeln!(f, "{}", line(row))?;
        }

        write!(f, "{separator}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn renders_with_title() {
        let mut table = Table::new(["#", "User", "Score"]).title("Monza");
        table.row(["1", "lewis", "120"]);
        table.row(["2", "max_verstappen_fan", "7"]);

        expect![[r#"
            +--------------------------------+
            | Monza                          |
            +---+--------------------+-------+
            | # | User               | Score |
            +---+--------------------+-------+
            | 1 | lewis              | 120   |
            | 2 | max_verstappen_fan | 7     |
            +---+--------------------+-------+"#]]
        .assert_eq(&table.to_string());
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(["Name", "Team"]);
        table.row(["Alonso"]);

        expect![[r#"
            +--------+------+
            | Name   | Team |
            +--------+------+
            | Alonso |      |
            +--------+------+"#]]
        .assert_eq(&table.to_string());
    }
}
