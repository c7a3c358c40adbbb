use crate::recorder::encoder::CommandLine;

/// Commands of the current session, in the order they happened.
#[derive(Debug, Default, Clone)]
pub struct SessionBuffer {
    lines: Vec<CommandLine>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, line: CommandLine) {
        self.lines.push(line);
    }

    pub fn extend(&mut self, lines: impl IntoIterator<Item = CommandLine>) {
        self.lines.extend(lines);
    }

    pub fn lines(&self) -> &[CommandLine] {
        &self.lines
    }

    /// Rendered script lines
    pub fn render(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn take(&mut self) -> SessionBuffer {
        std::mem::take(self)
    }
}
