/// Character marking an unfilled cell in a solution grid.
pub const EMPTY_CELL: char = '.';

/// Immutable snapshot of a solution grid.
///
/// Rows are stored top to bottom; each row is a sequence of single characters that are
/// either uppercase letters or [`EMPTY_CELL`]. Rows are allowed to differ in length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridModel {
    rows: Vec<Vec<char>>,
}

impl GridModel {
    /// Build a grid from already-split rows.
    pub fn new(rows: Vec<Vec<char>>) -> Self {
        Self { rows }
    }

    /// Build a grid from one string per row.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            rows: lines
                .into_iter()
                .map(|line| line.as_ref().chars().collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Length of the widest row, used as the nominal grid width for layout.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over every cell as `(column, row, char)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| row.iter().enumerate().map(move |(x, &c)| (x, y, c)))
    }
}
