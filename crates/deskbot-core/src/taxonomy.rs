//! Category taxonomy used for query classification and index filtering.
//!
//! The taxonomy is immutable configuration handed to constructors, never a
//! mutable global: alternate taxonomies drop straight into tests and
//! per-tenant deployments.

use serde::{Deserialize, Serialize};

/// One topical category with its keyword bag.
///
/// `name` is the machine form ("password_reset"); `display` is what chunk
/// metadata carries ("Password Reset") and what index filters match on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    /// Machine name, snake_case.
    pub name: String,

    /// Display form used in chunk metadata and context banners.
    pub display: String,

    /// Keywords matched as case-insensitive substrings of the query.
    pub keywords: Vec<String>,
}

impl CategoryDef {
    /// Create a category definition.
    pub fn new(name: &str, display: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            display: display.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered set of categories. Definition order breaks classification ties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    pub categories: Vec<CategoryDef>,
}

impl Taxonomy {
    /// Build a taxonomy from explicit definitions.
    pub fn new(categories: Vec<CategoryDef>) -> Self {
        Self { categories }
    }

    /// Look up a category by machine name.
    pub fn get(&self, name: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Display form for a category name, title-casing unknown names.
    pub fn display_for(&self, name: &str) -> String {
        if let Some(def) = self.get(name) {
            return def.display.clone();
        }
        name.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Taxonomy {
    /// The support-desk taxonomy the assistant ships with.
    fn default() -> Self {
        Self::new(vec![
            CategoryDef::new(
                "password_reset",
                "Password Reset",
                &["password", "reset", "forgot", "login", "selfcare"],
            ),
            CategoryDef::new(
                "disk_storage",
                "Disk Storage",
                &["disk", "storage", "space", "full", "upgrade", "c drive"],
            ),
            CategoryDef::new(
                "rdp_connection",
                "Rdp Connection",
                &["rdp", "remote desktop", "connection", "connect", "disconnect"],
            ),
            CategoryDef::new(
                "quickbooks",
                "Quickbooks",
                &["quickbooks", "qb", "error", "multi-user", "payroll"],
            ),
            CategoryDef::new(
                "email",
                "Email",
                &["email", "outlook", "smtp", "send", "receive"],
            ),
            CategoryDef::new(
                "printer",
                "Printer",
                &["print", "printer", "uniprint", "check printing"],
            ),
            CategoryDef::new(
                "performance",
                "Performance",
                &["slow", "performance", "lag", "freeze", "hang"],
            ),
            CategoryDef::new(
                "user_management",
                "User Management",
                &["user", "add user", "delete user", "permission"],
            ),
            CategoryDef::new(
                "billing",
                "Billing",
                &["billing", "payment", "invoice", "subscription", "pricing"],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_taxonomy_order() {
        let tax = Taxonomy::default();
        assert_eq!(tax.categories[0].name, "password_reset");
        assert_eq!(tax.categories.last().unwrap().name, "billing");
    }

    #[test]
    fn test_display_for_known() {
        let tax = Taxonomy::default();
        assert_eq!(tax.display_for("password_reset"), "Password Reset");
        assert_eq!(tax.display_for("user_management"), "User Management");
    }

    #[test]
    fn test_display_for_unknown_title_cases() {
        let tax = Taxonomy::default();
        assert_eq!(tax.display_for("vpn_setup"), "Vpn Setup");
    }

    #[test]
    fn test_get() {
        let tax = Taxonomy::default();
        assert!(tax.get("quickbooks").is_some());
        assert!(tax.get("nonexistent").is_none());
    }
}
