//! Collision-free public identifiers derived from free text.
//!
//! Domains and story slugs share one normalization. Allocation probes the
//! store and appends `-{n}` until a free candidate is found. The probe is a
//! pre-check only; the unique constraints in the store remain the authority,
//! so callers retry when an insert fails with [`Error::AlreadyExists`].
//!
//! [`Error::AlreadyExists`]: crate::error::Error::AlreadyExists

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::store::Store;

/// Maximum length of a normalized identifier, before any `-{n}` or suffix.
pub const MAX_IDENTIFIER_LEN: usize = 30;

/// Used when the input normalizes to nothing.
pub const FALLBACK_IDENTIFIER: &str = "my-story";

/// Which uniqueness scope an identifier is allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Domain,
    Slug,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Whether the unsuffixed candidate is free.
    pub available: bool,
    /// The identifier an allocation would return right now.
    pub domain: String,
}

/// Normalizes text into a lowercase, hyphenated, ASCII identifier.
///
/// Whitespace becomes a hyphen, common Latin accents are folded, and any
/// other punctuation is dropped. The result is capped at
/// [`MAX_IDENTIFIER_LEN`] and never ends in a hyphen.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
        } else if let Some(folded) = fold_latin(c) {
            out.push_str(folded);
        }
    }

    let mut out: String = out.chars().take(MAX_IDENTIFIER_LEN).collect();
    while out.ends_with('-') {
        out.pop();
    }

    if out.is_empty() {
        FALLBACK_IDENTIFIER.to_string()
    } else {
        out
    }
}

fn fold_latin(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'č' | 'ć' => "c",
        'ď' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'š' | 'ś' => "s",
        'ť' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ž' | 'ź' | 'ż' => "z",
        'þ' => "th",
        _ => return None,
    };
    Some(folded)
}

/// Appends the platform suffix to a bare name. Input that already contains
/// a dot is treated as fully qualified and returned unchanged.
#[must_use]
pub fn qualify_domain(name: &str, suffix: &str) -> String {
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{name}.{suffix}")
    }
}

pub struct IdentifierAllocator {
    store: Arc<dyn Store>,
    suffix: String,
}

impl IdentifierAllocator {
    pub fn new(store: Arc<dyn Store>, suffix: impl Into<String>) -> Self {
        Self {
            store,
            suffix: suffix.into(),
        }
    }

    /// The `n`th candidate for a normalized base. `n == 0` is the bare base.
    #[must_use]
    pub fn candidate(&self, base: &str, n: u32, scope: Scope) -> String {
        let name = if n == 0 {
            base.to_string()
        } else {
            format!("{base}-{n}")
        };

        match scope {
            Scope::Domain => format!("{name}.{}", self.suffix),
            Scope::Slug => name,
        }
    }

    fn exists(&self, candidate: &str, scope: Scope) -> Result<bool> {
        match scope {
            Scope::Domain => self.store.domain_exists(candidate),
            Scope::Slug => self.store.slug_exists(candidate),
        }
    }

    /// Returns the first candidate not present in the scope.
    pub fn allocate(&self, text: &str, scope: Scope) -> Result<String> {
        let base = normalize(text);
        let mut n = 0;

        loop {
            let candidate = self.candidate(&base, n, scope);
            if !self.exists(&candidate, scope)? {
                tracing::debug!("Allocated {:?} identifier '{}'", scope, candidate);
                return Ok(candidate);
            }
            n += 1;
        }
    }

    pub fn allocate_domain(&self, text: &str) -> Result<String> {
        self.allocate(text, Scope::Domain)
    }

    pub fn allocate_slug(&self, text: &str) -> Result<String> {
        self.allocate(text, Scope::Slug)
    }

    /// Reports whether the text's canonical domain is free, together with
    /// the domain an allocation would hand out now.
    pub fn check_availability(&self, text: &str) -> Result<Availability> {
        let base = normalize(text);
        let canonical = self.candidate(&base, 0, Scope::Domain);
        let available = !self.store.domain_exists(&canonical)?;

        let domain = if available {
            canonical
        } else {
            self.allocate(text, Scope::Domain)?
        };

        Ok(Availability { available, domain })
    }
}
