//! Debug rendering of per-zone grids.
//!
//! The ST driver returns zones transposed relative to the datasheet map, so
//! columns are printed with decreasing `x` to match what the sensor sees.

use std::fmt;

/// A square grid of signed per-zone values ready to be printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTable {
    width: usize,
    values: Vec<i32>,
}

impl GridTable {
    /// `values` are row-major and must hold `width * width` entries; extra
    /// values are ignored and missing rows are not printed.
    pub fn new(width: usize, values: Vec<i32>) -> Self {
        Self { width, values }
    }
}

impl fmt::Display for GridTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t        ")?;
        for x in (0..self.width).rev() {
            write!(f, "{x:<5}")?;
        }
        writeln!(f)?;
        for (y, row) in self.values.chunks_exact(self.width.max(1)).take(self.width).enumerate() {
            write!(f, "\t{y:<5}:  ")?;
            for value in row.iter().rev() {
                write!(f, "{value:<5}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_mirrored() {
        let table = GridTable::new(2, vec![1, 2, 3, 4]).to_string();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].trim(), "1    0");
        assert_eq!(lines[1].trim(), "0    :  2    1");
        assert_eq!(lines[2].trim(), "1    :  4    3");
    }

    #[test]
    fn sentinels_render_as_negative_codes() {
        let table = GridTable::new(2, vec![-1, -2, -3, 850]).to_string();
        assert!(table.contains("-2   -1"));
        assert!(table.contains("850  -3"));
    }
}
