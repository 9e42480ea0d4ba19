pub const DEFAULT_MAX_CHUNK_CHARS: usize = 24_000;

/// Greedy, order-preserving splitter that packs diff lines into chunks of at
/// most `max_chars` characters (lines joined with `\n`).
///
/// A single line longer than the budget still becomes its own chunk; lines are
/// never split.
#[derive(Debug, Clone, Copy)]
pub struct DiffChunker {
    max_chars: usize,
}

impl Default for DiffChunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_CHARS)
    }
}

impl DiffChunker {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn chunk_lines<'a, I>(&self, lines: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;
        let mut has_lines = false;

        for line in lines {
            let line_chars = line.chars().count();

            if has_lines && current_chars + 1 + line_chars > self.max_chars {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
                has_lines = false;
            }

            if has_lines {
                current.push('\n');
                current_chars += 1;
            }
            current.push_str(line);
            current_chars += line_chars;
            has_lines = true;
        }

        if has_lines {
            chunks.push(current);
        }

        chunks
    }
}
