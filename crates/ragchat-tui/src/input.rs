use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize, // char index
}

impl TextInput {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// The tail of the value that keeps the cursor inside a field `width`
    /// columns wide, and the cursor's display column within it.
    pub fn viewport(&self, width: u16) -> (&str, u16) {
        let width = width.max(1) as usize;
        let before = &self.value[..char_to_byte_index(&self.value, self.cursor)];

        let mut start = 0;
        let mut col = before.width();
        for (idx, ch) in before.char_indices() {
            if col < width {
                break;
            }
            start = idx + ch.len_utf8();
            col -= ch.width().unwrap_or(0);
        }

        (&self.value[start..], col as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_multibyte_text() {
        let mut input = TextInput::new("héllo");
        input.left();
        input.left();
        input.insert('ü');
        assert_eq!(input.value(), "hélülo");
        input.backspace();
        assert_eq!(input.value(), "héllo");
        input.home();
        input.delete();
        assert_eq!(input.value(), "éllo");
        assert_eq!(input.viewport(80).1, 0);
    }

    #[test]
    fn test_viewport_counts_wide_chars() {
        let input = TextInput::new("你好世界");
        assert_eq!(input.viewport(20), ("你好世界", 8));
        assert_eq!(input.viewport(5), ("世界", 4));
    }

    #[test]
    fn test_viewport_scrolls_long_input() {
        let mut input = TextInput::new("abcdefghij");
        assert_eq!(input.viewport(4), ("hij", 3));

        input.home();
        assert_eq!(input.viewport(4), ("abcdefghij", 0));

        input.right();
        input.right();
        assert_eq!(input.viewport(4), ("abcdefghij", 2));
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut input = TextInput::new("ab");
        input.right();
        assert_eq!(input.viewport(80).1, 2);
        input.home();
        input.left();
        assert_eq!(input.viewport(80).1, 0);
        input.clear();
        input.backspace();
        assert_eq!(input.value(), "");
    }
}
