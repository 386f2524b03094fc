//! Line-oriented `KEY=value` config rewriting
//!
//! A file is split into lines (terminators kept), each line is tagged with the
//! first recognized key prefix it starts with, and rewriting substitutes whole
//! tagged lines. Untagged lines come back byte-for-byte in their original
//! order. Matching is a literal prefix test on the raw line: leading
//! whitespace or a leading `#` means the key is not recognized.

/// One line of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigLine<'a> {
    /// The line including its `\n`, if it had one.
    pub raw: &'a str,
    /// The recognized key prefix this line starts with.
    pub key: Option<&'static str>,
}

/// A parsed config file, borrowed from the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument<'a> {
    lines: Vec<ConfigLine<'a>>,
}

impl<'a> ConfigDocument<'a> {
    /// Tag every line of `text` with the first of `keys` it starts with.
    pub fn parse(text: &'a str, keys: &[&'static str]) -> Self {
        let lines = text
            .split_inclusive('\n')
            .map(|raw| ConfigLine {
                raw,
                key: keys.iter().copied().find(|key| raw.starts_with(key)),
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[ConfigLine<'a>] {
        &self.lines
    }

    /// True if at least one line starts with `key`.
    pub fn has_key(&self, key: &str) -> bool {
        self.lines.iter().any(|line| line.key == Some(key))
    }

    /// Rejoin the document, replacing every line tagged with a key from
    /// `replacements` by the paired line. Replacement lines always end with a
    /// newline.
    pub fn render(&self, replacements: &[(&str, &str)]) -> String {
        let mut out = String::new();
        for line in &self.lines {
            let replacement = line.key.and_then(|key| {
                replacements
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, new_line)| *new_line)
            });
            match replacement {
                Some(new_line) => {
                    out.push_str(new_line);
                    out.push('\n');
                }
                None => out.push_str(line.raw),
            }
        }
        out
    }
}

/// Parse and rewrite in one step.
pub fn rewrite_keys(text: &str, replacements: &[(&'static str, &str)]) -> String {
    let keys: Vec<&'static str> = replacements.iter().map(|(key, _)| *key).collect();
    let replacements: Vec<(&str, &str)> = replacements.iter().map(|(k, v)| (*k, *v)).collect();
    ConfigDocument::parse(text, &keys).render(&replacements)
}
