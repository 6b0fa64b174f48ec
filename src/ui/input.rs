//! A single-line editor with command history.

/// The command line being typed, plus every line submitted so far.
#[derive(Debug, Default, Clone)]
pub struct InputLine {
    text: String,
    /// Cursor position in characters.
    cursor: usize,
    history: Vec<String>,
    /// Index into `history` while browsing with up/down.
    recall: Option<usize>,
}

impl InputLine {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.text.remove(at);
    }

    /// Delete the character under the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Step back through history.
    pub fn older(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.recall {
            Some(i) => i.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.recall_entry(Some(index));
    }

    /// Step forward through history, ending on an empty line.
    pub fn newer(&mut self) {
        match self.recall {
            Some(i) if i + 1 < self.history.len() => self.recall_entry(Some(i + 1)),
            Some(_) => self.recall_entry(None),
            None => {}
        }
    }

    fn recall_entry(&mut self, index: Option<usize>) {
        self.recall = index;
        self.text = index
            .and_then(|i| self.history.get(i).cloned())
            .unwrap_or_default();
        self.end();
    }

    /// Take the current line, remembering it unless blank or a repeat.
    pub fn submit(&mut self) -> String {
        let line = std::mem::take(&mut self.text);
        self.cursor = 0;
        self.recall = None;
        let trimmed = line.trim();
        if !trimmed.is_empty() && self.history.last().map(String::as_str) != Some(trimmed) {
            self.history.push(trimmed.to_string());
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> InputLine {
        let mut input = InputLine::default();
        for c in s.chars() {
            input.insert(c);
        }
        input
    }

    #[test]
    fn editing_moves_the_cursor() {
        let mut input = typed("p cpu.usr");
        input.left();
        input.insert('e');
        assert_eq!(input.text(), "p cpu.user");
        input.home();
        input.delete();
        input.insert('d');
        input.home();
        input.insert('p');
        assert_eq!(input.text(), "pd cpu.user");
        input.end();
        input.backspace();
        assert_eq!(input.text(), "pd cpu.use");
        assert_eq!(input.cursor(), 10);
    }

    #[test]
    fn multibyte_characters_edit_cleanly() {
        let mut input = typed("ls é");
        input.backspace();
        assert_eq!(input.text(), "ls ");
        input.insert('ü');
        input.left();
        input.left();
        input.right();
        input.delete();
        assert_eq!(input.text(), "ls ");
    }

    #[test]
    fn history_recall() {
        let mut input = InputLine::default();
        for line in ["s", "ls cpu", "ls cpu", "  ", "e"] {
            for c in line.chars() {
                input.insert(c);
            }
            input.submit();
        }
        input.older();
        assert_eq!(input.text(), "e");
        input.older();
        assert_eq!(input.text(), "ls cpu", "repeats are stored once");
        input.older();
        input.older();
        assert_eq!(input.text(), "s", "recall stops at the oldest entry");
        input.newer();
        assert_eq!(input.text(), "ls cpu");
        input.newer();
        input.newer();
        assert_eq!(input.text(), "", "walking past the newest clears the line");
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn submit_returns_the_line() {
        let mut input = typed(" export diff ");
        assert_eq!(input.submit(), " export diff ");
        assert_eq!(input.text(), "");
        input.older();
        assert_eq!(input.text(), "export diff");
    }
}
