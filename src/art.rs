use crate::error::{Result, SearchError};

/// Digit palette indexed by luminance bucket, darkest first.
pub const SHADES: [char; 10] = ['8', '8', '8', '8', '8', '8', '8', '9', '3', '7'];

/// Perceived luminance of an RGB pixel (ITU-R BT.601 weights).
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Average luminance over RGB pixels, `None` for an empty tile.
pub fn average_luminance(pixels: &[[u8; 3]]) -> Option<f64> {
    if pixels.is_empty() {
        return None;
    }
    let sum: f64 = pixels.iter().map(|&[r, g, b]| luminance(r, g, b)).sum();
    Some(sum / pixels.len() as f64)
}

/// Map an average tile luminance in `[0, 255]` to its palette digit.
pub fn shade_for(avg: f64) -> char {
    let level = avg.clamp(0.0, 255.0).floor() as usize;
    SHADES[((level * 10) / 256).min(SHADES.len() - 1)]
}

/// A rectangular-ish grid of digit rows: the textual form of the image.
///
/// Rows concatenate into the search seed; candidates of the same length
/// are folded back using the original row lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitArt {
    rows: Vec<String>,
}

impl DigitArt {
    pub fn from_rows(rows: Vec<String>) -> Result<Self> {
        let rows: Vec<String> = rows.into_iter().filter(|r| !r.is_empty()).collect();
        if rows.is_empty() {
            return Err(SearchError::invalid("digit art has no rows"));
        }
        for (i, row) in rows.iter().enumerate() {
            if let Some(bad) = row.chars().find(|c| !c.is_ascii_digit()) {
                return Err(SearchError::invalid(format!(
                    "row {} contains non-digit '{}'",
                    i + 1,
                    bad
                )));
            }
        }
        Ok(DigitArt { rows })
    }

    /// Parse art text: one row per line, surrounding whitespace and blank
    /// lines ignored.
    pub fn from_text(text: &str) -> Result<Self> {
        Self::from_rows(text.lines().map(|l| l.trim().to_string()).collect())
    }

    /// Build art from per-tile average luminance values, one inner vector
    /// per row.
    pub fn from_luminance(tiles: &[Vec<f64>]) -> Result<Self> {
        Self::from_rows(
            tiles
                .iter()
                .map(|row| row.iter().map(|&l| shade_for(l)).collect())
                .collect(),
        )
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn row_lengths(&self) -> Vec<usize> {
        self.rows.iter().map(String::len).collect()
    }

    /// The concatenated digit string used as the search seed
    pub fn seed(&self) -> String {
        self.rows.concat()
    }

    /// Fold a candidate back into this art's row shape
    pub fn reshape(&self, candidate: &str) -> Result<Vec<String>> {
        let expected: usize = self.row_lengths().iter().sum();
        if candidate.len() != expected {
            return Err(SearchError::invalid(format!(
                "candidate has {} digits, art holds {}",
                candidate.len(),
                expected
            )));
        }

        let mut rows = Vec::with_capacity(self.rows.len());
        let mut offset = 0;
        for len in self.row_lengths() {
            rows.push(candidate[offset..offset + len].to_string());
            offset += len;
        }
        Ok(rows)
    }

    pub fn render(&self, candidate: &str) -> Result<String> {
        Ok(self.reshape(candidate)?.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance() {
        assert!((luminance(100, 150, 200) - 140.75).abs() < 1e-9);
        assert_eq!(average_luminance(&[[0, 0, 0]]), Some(0.0));
        let avg = average_luminance(&[[50, 50, 50], [150, 150, 150]]).unwrap();
        assert!((avg - 100.0).abs() < 1e-9);
        assert_eq!(average_luminance(&[]), None);
    }

    #[test]
    fn test_shade_for() {
        assert_eq!(shade_for(0.0), '8');
        assert_eq!(shade_for(128.0), '8');
        assert_eq!(shade_for(180.0), '9');
        assert_eq!(shade_for(210.0), '3');
        assert_eq!(shade_for(255.0), '7');
        assert_eq!(shade_for(1000.0), '7');
    }

    #[test]
    fn test_from_text_and_seed() {
        let art = DigitArt::from_text("  123\n\n4567 \n89\n").unwrap();
        assert_eq!(art.rows(), &["123", "4567", "89"]);
        assert_eq!(art.seed(), "123456789");
        assert_eq!(art.row_lengths(), vec![3, 4, 2]);
    }

    #[test]
    fn test_rejects_bad_text() {
        assert!(DigitArt::from_text("\n  \n").is_err());
        assert!(DigitArt::from_text("12\n3x4").is_err());
    }

    #[test]
    fn test_reshape_and_render() {
        let art = DigitArt::from_text("88\n88").unwrap();
        assert_eq!(art.reshape("8389").unwrap(), vec!["83", "89"]);
        assert_eq!(art.render("8389").unwrap(), "83\n89");
        assert!(art.reshape("838").is_err());
    }

    #[test]
    fn test_from_luminance() {
        let art = DigitArt::from_luminance(&[vec![128.0, 128.0], vec![128.0, 250.0]]).unwrap();
        assert_eq!(art.rows(), &["88", "87"]);
    }
}
