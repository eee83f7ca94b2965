//! Role-based access control.
//!
//! Admins may do anything. Regular users may read and update their own account and start their
//! own checkout. Handlers declare what they need with the [`RequiresPermission`] extractor:
//!
//! ```ignore
//! async fn delete_recipe(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<resource::Recipes, operation::DeleteAll>,
//!     Path(id): Path<RecipeId>,
//! ) -> Result<StatusCode> { ... }
//! ```

use std::marker::PhantomData;
use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::Error,
    types::{Operation, Permission, Resource},
};

/// Permissions granted to a role, as (resource, operation) pairs. Admin is handled separately.
const USER_PERMISSIONS: &[(Resource, Operation)] = &[
    (Resource::Users, Operation::ReadOwn),
    (Resource::Users, Operation::UpdateOwn),
    (Resource::Payments, Operation::CreateOwn),
    (Resource::Payments, Operation::ReadOwn),
];

pub fn role_has_permission(role: Role, resource: Resource, operation: Operation) -> bool {
    match role {
        Role::Admin => true,
        Role::User => USER_PERMISSIONS.contains(&(resource, operation)),
    }
}

pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    role_has_permission(user.role, resource, operation)
}

/// Does the caller hold `*All` access to `resource`, or only their own entities?
pub fn can_read_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::ReadAll)
}

pub fn check_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<(), Error> {
    if has_permission(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            required: Permission { resource, operation },
            action: operation,
            resource: resource.to_string(),
        })
    }
}

/// Type-level resources for [`RequiresPermission`].
pub mod resource {
    use crate::types::Resource;

    pub trait ResourceMarker {
        const RESOURCE: Resource;
    }

    macro_rules! resources {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl ResourceMarker for $name {
                    const RESOURCE: Resource = Resource::$name;
                }
            )*
        };
    }

    resources!(Users, Recipes, Articles, Features, Faqs, Settings, Analytics, Uploads, Videos, Payments);
}

/// Type-level operations for [`RequiresPermission`].
pub mod operation {
    use crate::types::Operation;

    pub trait OperationMarker {
        const OPERATION: Operation;
    }

    macro_rules! operations {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationMarker for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    operations!(CreateAll, CreateOwn, ReadAll, ReadOwn, UpdateAll, UpdateOwn, DeleteAll);
}

/// Extractor that authenticates the caller and checks a permission before the handler runs.
/// Dereferences to the [`CurrentUser`].
pub struct RequiresPermission<R, O> {
    pub user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

#[cfg(test)]
impl<R, O> RequiresPermission<R, O> {
    /// Skip authentication, for calling handlers directly in tests.
    pub(crate) fn granted(user: CurrentUser) -> Self {
        Self {
            user,
            _marker: PhantomData,
        }
    }
}

impl<R, O> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &CurrentUser {
        &self.user
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: resource::ResourceMarker + Send + Sync,
    O: operation::OperationMarker + Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let user = <CurrentUser as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;
        check_permission(&user, R::RESOURCE, O::OPERATION)?;
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
