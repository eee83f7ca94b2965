//! Identifiers and the vocabulary of the permission checks.
//!
//! Every entity is keyed by a UUID. Permissions pair a [`Resource`] with an [`Operation`];
//! `*All` operations cover every row (admin content management) while `*Own` operations cover only
//! the caller's own account and payments.

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type RecipeId = Uuid;
pub type ArticleId = Uuid;
pub type FeatureId = Uuid;
pub type FaqId = Uuid;
pub type PaymentId = Uuid;

/// First 8 characters of a UUID, for log fields and span names.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Recipes,
    Articles,
    Features,
    Faqs,
    Settings,
    Analytics,
    Uploads,
    Videos,
    Payments,
}

/// What a denied request would have needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub operation: Operation,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Users => "users",
            Resource::Recipes => "recipes",
            Resource::Articles => "articles",
            Resource::Features => "features",
            Resource::Faqs => "faqs",
            Resource::Settings => "settings",
            Resource::Analytics => "analytics",
            Resource::Uploads => "uploads",
            Resource::Videos => "videos",
            Resource::Payments => "payments",
        };
        write!(f, "{name}")
    }
}
