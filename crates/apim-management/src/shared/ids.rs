//! Identifier helpers.
//!
//! Random ids for new aggregates, name-based ids for entities that a
//! declarative import addresses by key. A derived id only depends on its
//! parts, so importing the same CRD twice resolves to the same plans and pages.

use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Deterministic UUID v5 over `parts` joined with `:`.
pub fn derive_id(parts: &[&str]) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, parts.join(":").as_bytes()).to_string()
}

/// Turn a free-form name into a metadata key (`"Support Email"` becomes `"support-email"`).
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut last_dash = true;
    for c in value.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_id_is_stable() {
        let a = derive_id(&["api-1", "plan", "gold"]);
        let b = derive_id(&["api-1", "plan", "gold"]);
        let c = derive_id(&["api-1", "plan", "silver"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Support Email"), "support-email");
        assert_eq!(slugify("  --Team__Name!! "), "team-name");
        assert_eq!(slugify("email"), "email");
    }
}
