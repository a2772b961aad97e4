//! Key naming for everything this crate writes.
//!
//! Keys are dotted strings `<prefix>.<category>.<identifier>`:
//! - `<prefix>.client-msg.<client_id>`: flying messages of one client
//! - `<prefix>.topic-retained.<topic>`: retained pointer for a topic
//! - `<prefix>.mqtt-msg.<internal_id>`: a stored message body
//! - `<prefix>.client-subs.<client_id>`: subscription marker of one client

const FLYING: &str = "client-msg";
const RETAINED: &str = "topic-retained";
const MESSAGE: &str = "mqtt-msg";
const SUBSCRIPTIONS: &str = "client-subs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn flying(&self, client_id: &str) -> String {
        self.key(FLYING, client_id)
    }

    pub fn retained(&self, topic: &str) -> String {
        self.key(RETAINED, topic)
    }

    pub fn message(&self, internal_id: u64) -> String {
        self.key(MESSAGE, &internal_id.to_string())
    }

    pub fn subscriptions(&self, client_id: &str) -> String {
        self.key(SUBSCRIPTIONS, client_id)
    }

    pub fn retained_pattern(&self) -> String {
        self.pattern(RETAINED)
    }

    pub fn subscriptions_pattern(&self) -> String {
        self.pattern(SUBSCRIPTIONS)
    }

    /// Identifier part of a retained-pointer key, if `key` is one.
    pub fn retained_topic<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.identifier(RETAINED, key)
    }

    /// Identifier part of a subscription-marker key, if `key` is one.
    pub fn subscription_client<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.identifier(SUBSCRIPTIONS, key)
    }

    fn key(&self, category: &str, identifier: &str) -> String {
        format!("{}.{}.{}", self.prefix, category, identifier)
    }

    fn pattern(&self, category: &str) -> String {
        format!("{}.{}.*", escape_glob(&self.prefix), category)
    }

    fn identifier<'a>(&self, category: &str, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?
            .strip_prefix('.')?
            .strip_prefix(category)?
            .strip_prefix('.')
    }
}

/// Escape glob metacharacters so `text` only matches itself.
pub fn escape_glob(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// The literal part of `pattern` before its first metacharacter.
pub fn literal_prefix(pattern: &str) -> &str {
    match pattern.find(['*', '?', '[', '\\']) {
        Some(idx) => &pattern[..idx],
        None => pattern,
    }
}

/// Redis-style glob: `*` matches any run, `?` one character, `\x` a literal x.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    // position of the last `*` and the text index it is currently covering up to
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() {
            match p[pi] {
                '*' => {
                    star = Some((pi, ti));
                    pi += 1;
                    continue;
                }
                '?' => {
                    pi += 1;
                    ti += 1;
                    continue;
                }
                '\\' if pi + 1 < p.len() => {
                    if p[pi + 1] == t[ti] {
                        pi += 2;
                        ti += 1;
                        continue;
                    }
                }
                c => {
                    if c == t[ti] {
                        pi += 1;
                        ti += 1;
                        continue;
                    }
                }
            }
        }

        match star {
            Some((sp, st)) => {
                pi = sp + 1;
                ti = st + 1;
                star = Some((sp, st + 1));
            }
            None => return false,
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
