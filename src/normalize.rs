/// Canonicalizes a display title into the key used for catalog lookups.
///
/// The key is never shown to the user; it only has to make differently
/// spelled copies of the same title collide. "Brütal Legend" and
/// "brutal legend" both map to `brutal legend`.
pub fn simplified_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().to_lowercase().chars() {
        match ch {
            '™' | '®' | '©' | '!' | ',' | '.' | '\'' | '’' | '`' | '[' | ']' | '{' | '}'
            | '(' | ')' | '"' => {}
            '_' | '-' | ':' | ';' => out.push(' '),
            '&' => out.push_str("and"),
            'á' => out.push('a'),
            'é' => out.push('e'),
            'í' => out.push('i'),
            'ó' | 'ö' => out.push('o'),
            'ú' | 'ü' => out.push('u'),
            'ﬁ' => out.push_str("fi"),
            _ => out.push(ch),
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
