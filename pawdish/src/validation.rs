//! Input checks shared by the create/update request models.
//!
//! Everything here runs before a database connection is acquired, so a rejected request never
//! reaches Postgres.

use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::types::abbrev_uuid;

/// Trimmed `value`, or a `BadRequest` of the form "`label` is required".
pub fn require_text(value: &str, label: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{label} is required"),
        });
    }
    Ok(trimmed.to_string())
}

/// Same as [`require_text`] for optional update fields: `None` passes through untouched.
pub fn require_text_if_present(value: Option<&str>, label: &str) -> Result<Option<String>> {
    value.map(|v| require_text(v, label)).transpose()
}

/// Rejects negative values for counts such as cooking time or servings.
pub fn require_non_negative(value: i32, label: &str) -> Result<()> {
    if value < 0 {
        return Err(Error::BadRequest {
            message: format!("{label} must not be negative"),
        });
    }
    Ok(())
}

/// Lowercase ASCII alphanumerics separated by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 200
        && slug.split('-').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

/// URL-safe slug derived from a title. Non-ASCII characters are dropped, so an all-Japanese
/// title yields an empty string.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Slug for a new article or feature.
///
/// An explicit slug must already be valid. Without one, the slug is derived from the title and
/// falls back to `{kind}-{short id}` when the title has no ASCII alphanumerics.
pub fn resolve_slug(explicit: Option<&str>, title: &str, kind: &str, id: &Uuid) -> Result<String> {
    match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) if is_valid_slug(slug) => Ok(slug.to_string()),
        Some(slug) => Err(Error::BadRequest {
            message: format!("Invalid slug '{slug}': use lowercase letters, digits and single hyphens"),
        }),
        None => {
            let derived = slugify(title);
            if derived.is_empty() {
                Ok(format!("{kind}-{}", abbrev_uuid(id)))
            } else {
                Ok(derived)
            }
        }
    }
}

/// Validates an explicit slug on update.
pub fn validate_slug_if_present(slug: Option<&str>) -> Result<Option<String>> {
    match slug.map(str::trim) {
        None => Ok(None),
        Some(slug) if is_valid_slug(slug) => Ok(Some(slug.to_string())),
        Some(slug) => Err(Error::BadRequest {
            message: format!("Invalid slug '{slug}': use lowercase letters, digits and single hyphens"),
        }),
    }
}

/// Setting keys: `[a-z0-9_.-]+`, at most 100 characters.
pub fn is_valid_setting_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 100
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-'))
}

/// Upload folders: `[a-z0-9-]+`, at most 50 characters.
pub fn is_valid_folder(folder: &str) -> bool {
    !folder.is_empty() && folder.len() <= 50 && folder.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Minimal email shape check; the unique index does the rest.
pub fn validate_email(email: &str) -> Result<String> {
    let email = require_text(email, "Email")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::BadRequest {
            message: "Email address is invalid".to_string(),
        }),
    }
}
