//! Sentence-aware text chunking.
//!
//! Text is whitespace-normalised, split into sentences, and packed greedily
//! into chunks of at most `chunk_size` characters. Consecutive chunks share
//! trailing sentences worth up to `chunk_overlap` characters. A single
//! sentence longer than `chunk_size` becomes a chunk on its own.

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let sentences = split_sentences(&normalized);
        let lengths: Vec<usize> = sentences.iter().map(|s| s.chars().count()).collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < sentences.len() {
            // Greedy packing; always take at least one sentence
            let mut end = start;
            let mut size = 0;
            while end < sentences.len() {
                let addition = lengths[end] + usize::from(end > start);
                if end > start && size + addition > self.chunk_size {
                    break;
                }
                size += addition;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));

            if end == sentences.len() {
                break;
            }

            let overlap = self.overlap_sentences(&lengths[start..end]);
            start = (end - overlap).max(start + 1);
        }

        chunks
    }

    /// How many trailing sentences of a chunk fit in the overlap budget
    fn overlap_sentences(&self, lengths: &[usize]) -> usize {
        let mut size = 0;
        let mut count = 0;
        for (i, len) in lengths.iter().enumerate().rev() {
            let addition = len + usize::from(i + 1 < lengths.len());
            if size + addition > self.chunk_overlap {
                break;
            }
            size += addition;
            count += 1;
        }
        count
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalised text at `.`, `!` or `?` followed by a space and an
/// uppercase letter. Titles such as `Dr.` and dotted abbreviations such as
/// `e.g.` do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let boundary = {
            let mut rest = text[i + c.len_utf8()..].chars();
            matches!(rest.next(), Some(' ')) && rest.next().is_some_and(char::is_uppercase)
        };
        if !boundary || (c == '.' && is_abbreviation(&text[start..=i])) {
            continue;
        }

        sentences.push(&text[start..=i]);
        // Skip the separating space
        chars.next();
        start = i + c.len_utf8() + 1;
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

fn is_abbreviation(sentence: &str) -> bool {
    let word = sentence.rsplit(' ').next().unwrap_or(sentence);
    let stem = &word[..word.len() - 1];

    let mut chars = stem.chars();
    let title = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), None) if a.is_uppercase() && b.is_lowercase()
    );
    let dotted = stem.contains('.');

    title || dotted
}
