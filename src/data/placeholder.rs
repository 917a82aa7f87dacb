/// A data-map reference embedded in recorded text: `prefix>key(example)`.
///
/// `prefix` lists the comma-separated base keys that give context for
/// deriving `key`; `example` is a formatting hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    pub base_keys: Vec<String>,
    pub key: String,
    pub example: Option<String>,
}

impl Placeholder {
    /// Parse `raw`, or `None` when it is a plain literal.
    ///
    /// The key runs from the first `>` to the following `(` (or the end of
    /// the string when there is no example). An empty key is a literal.
    pub fn parse(raw: &str) -> Option<Placeholder> {
        let (prefix, rest) = raw.split_once('>')?;

        let (key, example) = match rest.split_once('(') {
            Some((key, tail)) => {
                let example = tail.strip_suffix(')').unwrap_or(tail).trim();
                (key, (!example.is_empty()).then(|| example.to_string()))
            }
            None => (rest, None),
        };

        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        Some(Placeholder {
            base_keys: split_base_keys(prefix),
            key: key.to_string(),
            example,
        })
    }

    /// Base keys joined back into their recorded form, used for grouping.
    pub fn group_key(&self) -> String {
        self.base_keys.join(",")
    }
}

fn split_base_keys(prefix: &str) -> Vec<String> {
    prefix
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Just the key of a placeholder, if `raw` is one.
pub fn placeholder_key(raw: &str) -> Option<String> {
    Placeholder::parse(raw).map(|p| p.key)
}
