//! Localized message catalog for notifications.

use std::sync::OnceLock;

use super::ErrorParams;

const CATALOG_SOURCE: &str = include_str!("messages.toml");

fn catalog() -> &'static toml::Table {
    static CATALOG: OnceLock<toml::Table> = OnceLock::new();
    CATALOG.get_or_init(|| CATALOG_SOURCE.parse().unwrap_or_default())
}

/// Look up the message template for a dotted key like `migration.started`.
pub fn template(key: &str) -> Option<&'static str> {
    let mut parts = key.split('.').peekable();
    let mut table = catalog();
    while let Some(part) = parts.next() {
        let item = table.get(part)?;
        if parts.peek().is_none() {
            return item.as_str();
        }
        table = item.as_table()?;
    }
    None
}

/// Render a message. Unknown keys render as the key itself.
pub fn localize(key: &str, params: Option<&ErrorParams>) -> String {
    let text = template(key).unwrap_or(key);
    match params {
        Some(p) => text.replace("{error}", &p.error),
        None => text.to_string(),
    }
}
