use std::fmt;

/// Keys of the alphanumeric pages, in on-screen order.
pub const KEY_LAYOUT: [&str; 44] = [
    "close", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0", "q", "w", "e", "r", "t", "y", "u",
    "i", "o", "p", "a", "s", "d", "f", "g", "h", "j", "k", "l", "z", "x", "c", "v", "b", "n", "m",
    "enter", "shift", "symbol", "space", "backspace", "clear", "refresh",
];

/// Keys of the symbol page, in on-screen order. Some symbols appear twice;
/// the later slot is the one clicked.
pub const SYMBOL_LAYOUT: [&str; 36] = [
    "!", "@", "#", "$", "%", "^", "&", "*", "(", ")", "-", "_", "=", "+", "\\", "|", "{", "}",
    "[", "]", ";", ":", "'", "\"", ",", ".", "<", ">", "$", "~", "`", "!", "@", "#", "/", "?",
];

/// nth-child slot of the first alphanumeric key.
const KEY_SLOT_BASE: usize = 2;
/// nth-child slot of the first symbol key.
const SYMBOL_SLOT_BASE: usize = 3;

/// The three pages an on-screen keyboard switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardPage {
    Lower,
    Upper,
    Special,
}

impl KeyboardPage {
    /// CSS class of the container holding this page's keys.
    pub fn selector(&self) -> &'static str {
        match self {
            KeyboardPage::Lower => ".lower",
            KeyboardPage::Upper => ".upper",
            KeyboardPage::Special => ".special",
        }
    }

    /// Page shown after pressing `key` on this page.
    pub fn after(self, key: &str) -> KeyboardPage {
        match (self, key) {
            (KeyboardPage::Lower, "shift") => KeyboardPage::Upper,
            (KeyboardPage::Upper, "shift") => KeyboardPage::Lower,
            (KeyboardPage::Lower | KeyboardPage::Upper, "symbol") => KeyboardPage::Special,
            (KeyboardPage::Special, "symbol") => KeyboardPage::Lower,
            (page, _) => page,
        }
    }
}

impl fmt::Display for KeyboardPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

pub fn is_symbol(key: &str) -> bool {
    SYMBOL_LAYOUT.contains(&key)
}

/// 1-based nth-child slot of `key` on `page`, if the key exists there.
pub fn slot(key: &str, page: KeyboardPage) -> Option<usize> {
    if page == KeyboardPage::Special {
        if let Some(i) = SYMBOL_LAYOUT.iter().rposition(|k| *k == key) {
            return Some(i + SYMBOL_SLOT_BASE);
        }
    }
    KEY_LAYOUT
        .iter()
        .position(|k| *k == key)
        .map(|i| i + KEY_SLOT_BASE)
}
