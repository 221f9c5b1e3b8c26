//! Pack version and localization reads
//!
//! Locale bundles are plain `key: "value"` text files under `locale/en_us`.
//! The same line format carries the pack version identifier in the root
//! `version.sii` file.

use std::collections::HashMap;

use crate::archive::CombinedView;
use crate::error::Result;

/// English localization key/value bundle
pub type LocaleTable = HashMap<String, String>;

const LOCALE_DIR: &str = "locale/en_us";
const VERSION_FILE: &str = "version.sii";

/// Read the pack version identifier, if present
pub fn read_version(view: &mut CombinedView) -> Result<Option<String>> {
    let Some(data) = view.read_file_opt(VERSION_FILE)? else {
        tracing::warn!(file = VERSION_FILE, "pack version file missing");
        return Ok(None);
    };
    let text = String::from_utf8_lossy(&data);
    Ok(parse_pairs(&text)
        .into_iter()
        .find(|(key, _)| key == "version")
        .map(|(_, value)| value))
}

/// Read every locale file under `locale/en_us` into one table.
///
/// Files that fail to read are logged and skipped; a missing locale
/// directory yields an empty table.
pub fn read_locale(view: &mut CombinedView) -> Result<LocaleTable> {
    let mut table = LocaleTable::new();
    let Some(dir) = view.find_dir(LOCALE_DIR) else {
        tracing::warn!(dir = LOCALE_DIR, "locale directory not found");
        return Ok(table);
    };

    let files: Vec<String> = dir
        .files
        .iter()
        .filter(|name| name.ends_with(".sii"))
        .map(|name| format!("{LOCALE_DIR}/{name}"))
        .collect();

    for path in files {
        match view.read_file_opt(&path)? {
            Some(data) => {
                let text = String::from_utf8_lossy(&data);
                for (key, value) in parse_pairs(&text) {
                    table.insert(key, value);
                }
            }
            None => tracing::warn!(file = %path, "locale file missing"),
        }
    }
    tracing::info!(entries = table.len(), "read locale bundle");
    Ok(table)
}

/// Resolve a record's display name: when a localization key is present and
/// known, the locale entry wins; the key has every `@` stripped first.
#[must_use]
pub fn localized_name(locale: &LocaleTable, name: &str, name_localized: Option<&str>) -> String {
    if let Some(key) = name_localized {
        let key = key.replace('@', "");
        if let Some(value) = locale.get(&key) {
            return value.clone();
        }
        tracing::warn!(key = %key, "missing locale entry");
    }
    name.to_string()
}

/// Parse `key: "value"` lines, ignoring structure and comments
fn parse_pairs(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().trim_matches('"');
        if key.is_empty() || key.contains(' ') || key.contains('{') {
            continue;
        }
        let value = value.trim();
        let Some(value) = first_quoted(value) else {
            continue;
        };
        pairs.push((key.to_string(), value.to_string()));
    }
    pairs
}

fn first_quoted(text: &str) -> Option<&str> {
    let start = text.find('"')? + 1;
    let end = start + text[start..].find('"')?;
    Some(&text[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_parse_quoted_values() {
        let text = r#"
SiiNunit
{
localization_db : .localization
{
	key[]: "value"
	city_springfield: "Springfield"
	landmark_arch: "The Arch"
}
}
"#;
        let pairs = parse_pairs(text);
        assert!(pairs.contains(&("city_springfield".to_string(), "Springfield".to_string())));
        assert!(pairs.contains(&("landmark_arch".to_string(), "The Arch".to_string())));
    }

    #[test]
    fn localized_name_strips_at_signs() {
        let mut locale = LocaleTable::new();
        locale.insert("city_springfield".to_string(), "Springfield".to_string());

        assert_eq!(
            localized_name(&locale, "fallback", Some("@@city_springfield@@")),
            "Springfield"
        );
        assert_eq!(localized_name(&locale, "fallback", Some("@@unknown@@")), "fallback");
        assert_eq!(localized_name(&locale, "fallback", None), "fallback");
    }
}
