// src/strip.rs
//! Streaming HTML-to-text stripper.
//!
//! The document is read as a flat stream of tag/text events (no DOM). Text inside
//! non-visible containers is dropped, block-level tags turn into line breaks, and
//! the result is folded to trimmed, non-empty lines.

/// Containers whose whole content is discarded.
const SKIP_WITH_CONTENT: [&str; 8] = [
    "script", "style", "head", "noscript", "iframe", "object", "svg", "template",
];

/// Tags that start or end a line of text.
const BLOCK_TAGS: [&str; 14] = [
    "p", "div", "li", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr",
];

/// Elements whose body is raw text (markup inside never opens a tag).
const RAW_TEXT: [&str; 2] = ["script", "style"];

/// One lexical unit of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// Opening tag, lowercased name. `self_closing` is set for `<br/>`-style tags.
    Start { name: String, self_closing: bool },
    /// Closing tag, lowercased name.
    End(String),
    /// Character data between tags, entities still encoded.
    Text(&'a str),
}

/// Lenient tokenizer over an HTML string. Never fails; malformed markup
/// degrades to text or is dropped.
pub struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    raw_text: Option<&'static str>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            raw_text: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Consume raw text up to the matching `</name`, case-insensitive.
    fn raw_text_event(&mut self, name: &'static str) -> Option<Event<'a>> {
        self.raw_text = None;
        let rest = self.rest();
        let len = find_close_tag(rest, name).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(Event::Text(&rest[..len]))
    }

    /// Byte offset of the `>` closing a tag that starts at `from`, skipping quoted
    /// attribute values. A quote only opens a value right after `=`.
    fn tag_end(&self, from: usize) -> Option<usize> {
        let bytes = self.src.as_bytes();
        let mut quote: Option<u8> = None;
        let mut after_eq = false;
        for (i, &b) in bytes.iter().enumerate().skip(from) {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'>' => return Some(i),
                None if after_eq && (b == b'"' || b == b'\'') => {
                    quote = Some(b);
                    after_eq = false;
                }
                None if b.is_ascii_whitespace() => {}
                None => after_eq = b == b'=',
            }
        }
        None
    }

    fn tag_name(&self, from: usize) -> &'a str {
        let rest = &self.src[from..];
        let len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>' || c == '\0')
            .unwrap_or(rest.len());
        &rest[..len]
    }

    fn text_until_next_lt(&mut self, skip_first: bool) -> Event<'a> {
        let start = self.pos;
        let search_from = if skip_first { start + 1 } else { start };
        let end = self.src[search_from..]
            .find('<')
            .map(|i| search_from + i)
            .unwrap_or(self.src.len());
        self.pos = end;
        Event::Text(&self.src[start..end])
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pos >= self.src.len() {
                return None;
            }
            if let Some(name) = self.raw_text {
                if let Some(ev) = self.raw_text_event(name) {
                    return Some(ev);
                }
                continue;
            }

            let rest = self.rest();
            if !rest.starts_with('<') {
                return Some(self.text_until_next_lt(false));
            }

            if rest.starts_with("<!--") {
                self.pos = match rest[4..].find("-->") {
                    Some(i) => self.pos + 4 + i + 3,
                    None => self.src.len(),
                };
                continue;
            }

            let second = rest[1..].chars().next();
            match second {
                Some('!') | Some('?') => {
                    // doctype, CDATA marker, processing instruction
                    self.pos = match self.tag_end(self.pos + 2) {
                        Some(end) => end + 1,
                        None => self.src.len(),
                    };
                    continue;
                }
                Some('/') if rest[2..].starts_with(|c: char| c.is_ascii_alphabetic()) => {
                    let name = self.tag_name(self.pos + 2).to_ascii_lowercase();
                    let Some(end) = self.tag_end(self.pos + 2) else {
                        // incomplete trailing tag
                        self.pos = self.src.len();
                        return None;
                    };
                    self.pos = end + 1;
                    return Some(Event::End(name));
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    let name = self.tag_name(self.pos + 1).to_ascii_lowercase();
                    let Some(end) = self.tag_end(self.pos + 1) else {
                        self.pos = self.src.len();
                        return None;
                    };
                    let self_closing = self.src[..end].ends_with('/');
                    self.pos = end + 1;
                    if !self_closing {
                        self.raw_text = RAW_TEXT.iter().copied().find(|t| *t == name);
                    }
                    return Some(Event::Start { name, self_closing });
                }
                // a lone `<` is plain text
                _ => return Some(self.text_until_next_lt(true)),
            }
        }
    }
}

/// Offset of the first `</name` in `hay`, ASCII case-insensitive.
fn find_close_tag(hay: &str, name: &str) -> Option<usize> {
    let bytes = hay.as_bytes();
    let name = name.as_bytes();
    let mut from = 0;
    while let Some(i) = hay[from..].find("</").map(|i| from + i) {
        let start = i + 2;
        if bytes
            .get(start..start + name.len())
            .is_some_and(|cand| cand.eq_ignore_ascii_case(name))
        {
            return Some(i);
        }
        from = start;
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastUnit {
    Nothing,
    Blank,
    Text,
}

/// Accumulates visible text while walking the event stream.
struct Stripper {
    skip_depth: usize,
    out: String,
    last: LastUnit,
}

impl Stripper {
    fn new() -> Self {
        Self {
            skip_depth: 0,
            out: String::new(),
            last: LastUnit::Nothing,
        }
    }

    fn push(&mut self, unit: &str) {
        if unit.is_empty() {
            return;
        }
        self.out.push_str(unit);
        self.last = if unit == " " || unit == "\n" {
            LastUnit::Blank
        } else {
            LastUnit::Text
        };
    }

    fn start(&mut self, name: &str) {
        if SKIP_WITH_CONTENT.contains(&name) {
            self.skip_depth += 1;
        } else if BLOCK_TAGS.contains(&name) && self.skip_depth == 0 && self.last == LastUnit::Text
        {
            self.push("\n");
        }
    }

    fn end(&mut self, name: &str) {
        if SKIP_WITH_CONTENT.contains(&name) {
            self.skip_depth = self.skip_depth.saturating_sub(1);
        } else if BLOCK_TAGS.contains(&name) && self.skip_depth == 0 {
            self.push("\n");
        }
    }

    fn text(&mut self, raw: &str) {
        if self.skip_depth == 0 {
            let decoded = html_escape::decode_html_entities(raw);
            self.push(&decoded);
        }
    }

    fn finish(self) -> String {
        self.out
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}

/// Strip markup from an HTML document, keeping visible text with one line per block.
pub fn strip_html(html: &str) -> String {
    let mut stripper = Stripper::new();
    for ev in Tokenizer::new(html) {
        match ev {
            Event::Start { name, self_closing } => {
                stripper.start(&name);
                if self_closing {
                    stripper.end(&name);
                }
            }
            Event::End(name) => stripper.end(&name),
            Event::Text(t) => stripper.text(t),
        }
    }
    stripper.finish()
}

/// Heuristic used by the fetcher: anything with both angle brackets is treated as markup.
pub fn looks_like_html(body: &str) -> bool {
    body.contains('<') && body.contains('>')
}
