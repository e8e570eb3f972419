//! Display-name derivation for field identifiers
//!
//! The UI shows `display_name` next to every port, so the derivation is part
//! of the metadata contract and must stay byte-for-byte stable.

/// Turn a field identifier into a human-readable display name.
///
/// Drops characters outside `[A-Za-z0-9_ ]`, turns underscores into spaces,
/// splits camel case, then title-cases each word.
///
/// ```
/// use toolkit_sdk::naming::to_display_name;
///
/// assert_eq!(to_display_name("userAge_dataInput"), "User Age Data Input");
/// ```
pub fn to_display_name(field_name: &str) -> String {
    let cleaned = field_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == ' ')
        .map(|c| if c == '_' { ' ' } else { c });

    let mut spaced = String::with_capacity(field_name.len() + 4);
    let mut prev: Option<char> = None;
    for c in cleaned {
        if c.is_ascii_uppercase() && prev.is_some_and(|p| p != ' ') {
            spaced.push(' ');
        }
        spaced.push(c);
        prev = Some(c);
    }

    title_case(&spaced)
}

/// Uppercase the first letter of every run of letters, lowercase the rest.
///
/// Digits and spaces both start a new run, so `with123numbers` becomes
/// `With123Numbers`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;
    for c in s.chars() {
        if c.is_ascii_alphabetic() {
            if prev_is_letter {
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c.to_ascii_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}
