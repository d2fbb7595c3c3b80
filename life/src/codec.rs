//! Compact text form of a grid's live cells.
//!
//! Each row becomes one base-36 token: the row's alive bits read as a binary
//! number, column 0 first (most significant). Tokens are joined by commas.
//! Colors are not stored.

use num_bigint::BigUint;

use crate::color::Hsl;
use crate::error::DecodeError;
use crate::grid::{Cell, Grid};

const DELIMITER: &str = ",";
const RADIX: u32 = 36;

/// Encodes the alive/dead pattern of `grid`.
pub fn encode(grid: &Grid) -> String {
    (0..grid.rows())
        .map(|y| {
            let mut row = BigUint::default();
            for x in 0..grid.columns() {
                row <<= 1u32;
                if grid.is_alive(x, y) {
                    row += 1u32;
                }
            }
            row.to_str_radix(RADIX)
        })
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Rebuilds a `columns x rows` grid from [`encode`] output. Live cells are white.
pub fn decode(text: &str, columns: usize, rows: usize) -> Result<Grid, DecodeError> {
    if rows == 0 && text.trim().is_empty() {
        return Ok(Grid::new(columns, 0));
    }

    let tokens: Vec<&str> = text.trim().split(DELIMITER).map(str::trim).collect();
    if tokens.len() != rows {
        return Err(DecodeError::RowCount {
            found: tokens.len(),
            expected: rows,
        });
    }

    let mut bits = vec![vec![false; columns]; rows];
    for (y, token) in tokens.iter().enumerate() {
        let value = parse_row(token, y)?;
        let width = value.bits() as usize;
        if width > columns {
            return Err(DecodeError::RowTooWide {
                row: y,
                bits: width,
                columns,
            });
        }
        for (x, alive) in bits[y].iter_mut().enumerate() {
            *alive = value.bit((columns - 1 - x) as u64);
        }
    }

    Ok(Grid::from_fn(columns, rows, |x, y| {
        if bits[y][x] {
            Cell::Alive(Hsl::WHITE)
        } else {
            Cell::Dead
        }
    }))
}

/// One row token as a number. Digits are validated here so errors can name them.
fn parse_row(token: &str, row: usize) -> Result<BigUint, DecodeError> {
    if token.is_empty() {
        return Err(DecodeError::EmptyToken { row });
    }
    if let Some(digit) = token.chars().find(|c| !c.is_digit(RADIX)) {
        return Err(DecodeError::InvalidDigit { row, digit });
    }
    let lower = token.to_ascii_lowercase();
    BigUint::parse_bytes(lower.as_bytes(), RADIX).ok_or(DecodeError::EmptyToken { row })
}
