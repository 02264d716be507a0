//! Minimal freedesktop Desktop Entry reading and writing.
//!
//! Only the `[Desktop Entry]` group is handled. That is all an autostart
//! unit needs, and other groups are skipped when parsing.

const GROUP_HEADER: &str = "[Desktop Entry]";

/// Characters that force an `Exec` argument to be double-quoted.
const RESERVED: &[char] = &[
    ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(', ')',
    '`',
];

/// Key/value pairs of a `[Desktop Entry]` group, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesktopEntry {
    fields: Vec<(String, String)>,
}

impl DesktopEntry {
    /// Create an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key, or replace it in place if already present.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key.to_string(), value)),
        }
        self
    }

    /// The unescaped value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Parse the `[Desktop Entry]` group of a file.
    ///
    /// Malformed lines are ignored. Returns `None` if the group is missing.
    pub fn parse(content: &str) -> Option<Self> {
        let mut entry = Self::new();
        let mut in_group = false;
        let mut seen_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_group = line == GROUP_HEADER;
                seen_group |= in_group;
                continue;
            }
            if !in_group {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entry.set(key.trim(), unescape_value(value.trim()));
            }
        }

        seen_group.then_some(entry)
    }

    /// Render the entry as file content, ending with a newline.
    pub fn render(&self) -> String {
        let mut out = String::from(GROUP_HEADER);
        out.push('\n');
        for (key, value) in &self.fields {
            out.push_str(key);
            out.push('=');
            out.push_str(&escape_value(value));
            out.push('\n');
        }
        out
    }

    /// The `Exec` key split into program and arguments.
    pub fn exec_args(&self) -> Option<Vec<String>> {
        self.get("Exec").map(split_exec)
    }
}

/// Build an `Exec` value from a program and its arguments.
pub fn join_exec<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| quote_exec_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_exec_arg(arg: &str) -> String {
    let arg = arg.replace('%', "%%");
    if !arg.is_empty() && !arg.contains(RESERVED) {
        return arg;
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Split an unescaped `Exec` value into arguments, undoing [`join_exec`].
pub fn split_exec(exec: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut in_quotes = false;
    let mut chars = exec.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '%' => {
                if chars.peek() == Some(&'%') {
                    chars.next();
                }
                current.push('%');
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }
    args
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
