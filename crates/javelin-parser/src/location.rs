//! Line/column lookup, recomputed on demand from a line-start table.

/// Offsets of line starts in UTF-16 code units. Line terminators are `\n`,
/// `\r`, and `\r\n` (counted once).
#[derive(Debug, Clone)]
pub(crate) struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        let mut offset = 0u32;
        let mut chars = source.chars().peekable();
        while let Some(c) = chars.next() {
            offset += c.len_utf16() as u32;
            match c {
                '\n' => line_starts.push(offset),
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                        offset += 1;
                    }
                    line_starts.push(offset);
                }
                _ => {}
            }
        }
        Self { line_starts }
    }

    /// 1-based line and column for a code-unit offset.
    pub(crate) fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_is_one_based() {
        let index = LineIndex::new("class A {}\n");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(6), (1, 7));
    }

    #[test]
    fn lines_split_on_all_terminators() {
        let index = LineIndex::new("a\nb\rc\r\nd");
        assert_eq!(index.line_col(2), (2, 1)); // b
        assert_eq!(index.line_col(4), (3, 1)); // c
        assert_eq!(index.line_col(7), (4, 1)); // d
    }

    #[test]
    fn offset_at_line_start_maps_to_column_one() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(5), (2, 3));
    }
}
