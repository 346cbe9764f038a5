use lsp_types::{Position, Range};
use serde::{Deserialize, Serialize};

/// Byte range into a source unit. Both ends are byte offsets; `contains`
/// treats the end as inclusive so a cursor sitting right after the last
/// character of an identifier still hits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Convert byte offset to LSP Position
pub fn offset_to_position(source: &str, offset: usize) -> Position {
    let mut line = 0;
    let mut character = 0;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += 1;
        }
    }

    Position {
        line: line as u32,
        character: character as u32,
    }
}

/// Convert LSP Position to byte offset
pub fn position_to_offset(source: &str, position: Position) -> usize {
    let mut current_line = 0;
    let mut current_character = 0;

    for (i, ch) in source.char_indices() {
        if current_line == position.line as usize
            && current_character == position.character as usize
        {
            return i;
        }

        if ch == '\n' {
            current_line += 1;
            current_character = 0;

            // If we're past the target line, the position doesn't exist
            if current_line > position.line as usize {
                return source.len();
            }
        } else {
            current_character += 1;
        }
    }

    source.len()
}

/// Convert a byte span to an LSP range against the unit's source text.
pub fn span_to_range(source: &str, span: Span) -> Range {
    Range {
        start: offset_to_position(source, span.start),
        end: offset_to_position(source, span.end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_position_multiline() {
        let source = "ab\ncd\nef";
        assert_eq!(offset_to_position(source, 0), Position::new(0, 0));
        assert_eq!(offset_to_position(source, 4), Position::new(1, 1));
        assert_eq!(offset_to_position(source, 6), Position::new(2, 0));
    }

    #[test]
    fn test_position_to_offset_round_trip() {
        let source = "one\ntwo\nthree";
        for offset in [0, 3, 4, 8, 12] {
            let pos = offset_to_position(source, offset);
            assert_eq!(position_to_offset(source, pos), offset);
        }
    }

    #[test]
    fn test_position_past_line_end_clamps() {
        let source = "a\nb";
        assert_eq!(position_to_offset(source, Position::new(0, 10)), source.len());
    }

    #[test]
    fn test_span_contains_is_end_inclusive() {
        let span = Span::new(2, 5);
        assert!(span.contains(2));
        assert!(span.contains(5));
        assert!(!span.contains(6));
    }
}
