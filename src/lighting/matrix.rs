//! Keyboard colour buffer.

use crate::error::{BladeError, Result};
use crate::protocol::{KEYS_PER_ROW, MATRIX_ROW_BYTES, MATRIX_ROWS};

/// 24-bit key colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Per-key colours, 5 rows of 15 keys.
///
/// Changes stay local until the owning driver flushes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMatrix {
    rows: [[Rgb; KEYS_PER_ROW]; MATRIX_ROWS],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorMatrix {
    /// All keys off.
    pub fn new() -> Self {
        Self {
            rows: [[Rgb::BLACK; KEYS_PER_ROW]; MATRIX_ROWS],
        }
    }

    /// Replace one row.
    ///
    /// # Errors
    /// `IndexOutOfRange` when `row` is not below the row count. The buffer
    /// is left unchanged.
    pub fn set_row(&mut self, row: usize, colors: [Rgb; KEYS_PER_ROW]) -> Result<()> {
        *self.row_mut(row)? = colors;
        Ok(())
    }

    /// Replace one row from packed `r, g, b` bytes.
    pub fn set_row_bytes(&mut self, row: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() != MATRIX_ROW_BYTES {
            return Err(BladeError::InvalidInput(format!(
                "Row data must be {} bytes, got {}",
                MATRIX_ROW_BYTES,
                bytes.len()
            )));
        }

        let target = self.row_mut(row)?;
        for (key, rgb) in target.iter_mut().zip(bytes.chunks_exact(3)) {
            *key = Rgb::new(rgb[0], rgb[1], rgb[2]);
        }
        Ok(())
    }

    pub fn set_key(&mut self, row: usize, col: usize, color: Rgb) -> Result<()> {
        let target = self.row_mut(row)?;
        let len = target.len();
        let key = target
            .get_mut(col)
            .ok_or(BladeError::IndexOutOfRange { index: col, len })?;
        *key = color;
        Ok(())
    }

    /// Set every key to one colour.
    pub fn fill(&mut self, color: Rgb) {
        self.rows = [[color; KEYS_PER_ROW]; MATRIX_ROWS];
    }

    pub fn row(&self, row: usize) -> Result<&[Rgb; KEYS_PER_ROW]> {
        self.rows.get(row).ok_or(BladeError::IndexOutOfRange {
            index: row,
            len: MATRIX_ROWS,
        })
    }

    /// Row packed the way the controller expects it.
    pub fn row_bytes(&self, row: usize) -> Result<[u8; MATRIX_ROW_BYTES]> {
        let mut bytes = [0u8; MATRIX_ROW_BYTES];
        for (chunk, key) in bytes.chunks_exact_mut(3).zip(self.row(row)?) {
            chunk.copy_from_slice(&[key.r, key.g, key.b]);
        }
        Ok(bytes)
    }

    fn row_mut(&mut self, row: usize) -> Result<&mut [Rgb; KEYS_PER_ROW]> {
        self.rows.get_mut(row).ok_or(BladeError::IndexOutOfRange {
            index: row,
            len: MATRIX_ROWS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_row_out_of_range() {
        let mut matrix = ColorMatrix::new();
        let result = matrix.set_row(MATRIX_ROWS, [Rgb::new(1, 2, 3); KEYS_PER_ROW]);

        assert!(matches!(
            result,
            Err(BladeError::IndexOutOfRange { index: 5, len: 5 })
        ));
        assert_eq!(matrix, ColorMatrix::new());
    }

    #[test]
    fn test_row_bytes_layout() {
        let mut matrix = ColorMatrix::new();
        let mut colors = [Rgb::BLACK; KEYS_PER_ROW];
        colors[0] = Rgb::new(0xff, 0x00, 0x10);
        colors[14] = Rgb::new(0x01, 0x02, 0x03);
        matrix.set_row(2, colors).unwrap();

        let bytes = matrix.row_bytes(2).unwrap();
        assert_eq!(&bytes[..3], &[0xff, 0x00, 0x10]);
        assert_eq!(&bytes[42..], &[0x01, 0x02, 0x03]);
        assert!(matrix.row_bytes(1).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_set_row_bytes() {
        let mut matrix = ColorMatrix::new();
        let bytes: Vec<u8> = (0..MATRIX_ROW_BYTES as u8).collect();
        matrix.set_row_bytes(4, &bytes).unwrap();

        assert_eq!(matrix.row(4).unwrap()[1], Rgb::new(3, 4, 5));
        assert_eq!(matrix.row_bytes(4).unwrap().to_vec(), bytes);

        assert!(matches!(
            matrix.set_row_bytes(0, &bytes[..10]),
            Err(BladeError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_set_key_and_fill() {
        let mut matrix = ColorMatrix::new();
        matrix.fill(Rgb::new(0, 0, 255));
        matrix.set_key(0, 3, Rgb::new(255, 0, 0)).unwrap();

        assert_eq!(matrix.row(0).unwrap()[3], Rgb::new(255, 0, 0));
        assert_eq!(matrix.row(4).unwrap()[14], Rgb::new(0, 0, 255));
        assert!(matrix.set_key(0, KEYS_PER_ROW, Rgb::BLACK).is_err());
        assert!(matrix.row(MATRIX_ROWS).is_err());
    }

    #[test]
    fn test_rgb_display() {
        assert_eq!(Rgb::from((0x12, 0xab, 0x00)).to_string(), "#12AB00");
    }
}
