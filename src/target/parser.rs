use url::Url;

use crate::browser::driver::{Locator, css_escape};
use crate::error::ReplayError;

/// One step of an iframe chain, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IframeLocator {
    Id(String),
    Name(String),
    Src(String),
}

impl IframeLocator {
    /// Build the CSS locator for this iframe relative to the page currently
    /// loaded in the enclosing context.
    ///
    /// A `src` that resolves to the page's own origin is matched on its
    /// path, query and fragment only, so it survives scheme/host redirects.
    pub fn to_locator(&self, page_url: Option<&Url>) -> Locator {
        match self {
            IframeLocator::Id(id) => Locator::Css(format!("iframe[id=\"{}\"]", css_escape(id))),
            IframeLocator::Name(name) => {
                Locator::Css(format!("iframe[name=\"{}\"]", css_escape(name)))
            }
            IframeLocator::Src(src) => match same_origin_relative(src, page_url) {
                Some(relative) => {
                    Locator::Css(format!("iframe[src$=\"{}\"]", css_escape(&relative)))
                }
                None => Locator::Css(format!("iframe[src=\"{}\"]", css_escape(src))),
            },
        }
    }
}

impl std::fmt::Display for IframeLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IframeLocator::Id(v) => write!(f, "[id={}]", v),
            IframeLocator::Name(v) => write!(f, "[name={}]", v),
            IframeLocator::Src(v) => write!(f, "[src={}]", v),
        }
    }
}

/// Path + query + fragment of `src` when it resolves to the same origin as `page_url`.
pub fn same_origin_relative(src: &str, page_url: Option<&Url>) -> Option<String> {
    let page = page_url?;
    let resolved = page.join(src).ok()?;
    if resolved.origin() != page.origin() {
        return None;
    }

    let mut relative = resolved.path().to_string();
    if let Some(query) = resolved.query() {
        relative.push('?');
        relative.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        relative.push('#');
        relative.push_str(fragment);
    }
    Some(relative)
}

/// A parsed target identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetIdentifier {
    pub iframe_chain: Vec<IframeLocator>,
    /// First recognized locator attribute, used for direct location.
    pub locator: Locator,
    /// The `css=` clause, kept for the broadening retry even when it is not primary.
    pub css_path: Option<String>,
}

const LOCATOR_PREFIXES: [&str; 4] = ["id=", "name=", "linkText=", "css="];

impl TargetIdentifier {
    /// Parse `[id=..][name=..][src=..]` frame segments followed by a
    /// `;`-separated list of `id=`, `name=`, `linkText=` or `css=` clauses.
    pub fn parse(raw: &str) -> Result<Self, ReplayError> {
        let (iframe_chain, remainder) = split_frame_chain(raw.trim());

        let mut locator = None;
        let mut css_path = None;

        for clause in remainder.split(';').map(str::trim) {
            let Some(parsed) = parse_clause(clause) else {
                continue;
            };
            if let Locator::Css(css) = &parsed {
                if css_path.is_none() {
                    css_path = Some(css.clone());
                }
            }
            if locator.is_none() {
                locator = Some(parsed);
            }
        }

        let locator =
            locator.ok_or_else(|| ReplayError::UnsupportedTargetFormat(raw.to_string()))?;

        Ok(TargetIdentifier {
            iframe_chain,
            locator,
            css_path,
        })
    }
}

fn parse_clause(clause: &str) -> Option<Locator> {
    let prefix = LOCATOR_PREFIXES.iter().find(|p| clause.starts_with(*p))?;
    let value = clause[prefix.len()..].trim();
    if value.is_empty() {
        return None;
    }
    let value = value.to_string();
    Some(match *prefix {
        "id=" => Locator::Id(value),
        "name=" => Locator::Name(value),
        "linkText=" => Locator::LinkText(value),
        _ => Locator::Css(value),
    })
}

/// Strip leading bracketed frame segments. Brackets later in the string
/// belong to CSS attribute selectors and are left alone.
fn split_frame_chain(raw: &str) -> (Vec<IframeLocator>, &str) {
    let mut chain = Vec::new();
    let mut rest = raw;

    while let Some(inner_start) = rest.strip_prefix('[') {
        let Some(end) = inner_start.find(']') else {
            break;
        };
        let segment = &inner_start[..end];
        let frame = if let Some(v) = segment.strip_prefix("id=") {
            IframeLocator::Id(v.to_string())
        } else if let Some(v) = segment.strip_prefix("name=") {
            IframeLocator::Name(v.to_string())
        } else if let Some(v) = segment.strip_prefix("src=") {
            IframeLocator::Src(v.to_string())
        } else {
            break;
        };
        chain.push(frame);
        rest = inner_start[end + 1..].trim_start();
    }

    (chain, rest)
}
