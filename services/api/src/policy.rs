//! Authorization policy over the parent/dependent hierarchy
//!
//! A family is a root account plus its direct dependents. Subadmins are
//! dependents with a family-wide view. Rules are evaluated per request from
//! the current database state; nothing here is cached.

use common::error::DatabaseResult;

use crate::{
    models::{Role, User},
    repositories::UserRepository,
};

/// Which owners' ledger rows an actor may read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only the actor's own rows
    OwnerOnly(i64),
    /// The root account and all of its dependents
    Family { root: i64 },
}

/// Id of the top-level account of the actor's family
pub fn family_root_id(user: &User) -> i64 {
    user.parent_id.unwrap_or(user.id)
}

/// A plain account attached to a parent. Subadmins are not dependents.
pub fn is_dependent(user: &User) -> bool {
    user.parent_id.is_some() && user.role == Role::User
}

pub fn visibility(actor: &User) -> Visibility {
    match (actor.role, actor.parent_id) {
        (Role::Subadmin, _) => Visibility::Family {
            root: family_root_id(actor),
        },
        (_, None) => Visibility::Family { root: actor.id },
        _ => Visibility::OwnerOnly(actor.id),
    }
}

/// Dependents only read their own ledger
pub fn can_mutate_ledger(actor: &User) -> bool {
    !is_dependent(actor)
}

/// Whether `actor` may create, edit or delete rows owned by `owner`
pub fn can_modify_owner(actor: &User, owner: &User) -> bool {
    if is_dependent(actor) {
        return false;
    }
    actor.id == owner.id
        || owner.parent_id == Some(actor.id)
        || (actor.role == Role::Subadmin && family_root_id(actor) == family_root_id(owner))
}

/// Account that owns the budgets and categories the actor works with.
/// Dependents and subadmins share their parent's.
pub fn ledger_owner_id(actor: &User) -> i64 {
    family_root_id(actor)
}

/// Root plus dependents, sorted
pub async fn family_ids(users: &UserRepository, root: i64) -> DatabaseResult<Vec<i64>> {
    let mut ids = users.dependent_ids(root).await?;
    ids.push(root);
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Resolve the visible owner-id set of `actor`
pub async fn visible_owner_ids(users: &UserRepository, actor: &User) -> DatabaseResult<Vec<i64>> {
    match visibility(actor) {
        Visibility::OwnerOnly(id) => Ok(vec![id]),
        Visibility::Family { root } => family_ids(users, root).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures::user;

    #[test]
    fn independent_accounts_see_their_family() {
        assert_eq!(
            visibility(&user(1, Role::User, None)),
            Visibility::Family { root: 1 }
        );
        assert_eq!(
            visibility(&user(9, Role::Admin, None)),
            Visibility::Family { root: 9 }
        );
    }

    #[test]
    fn dependent_sees_only_itself() {
        let child = user(2, Role::User, Some(1));
        assert!(is_dependent(&child));
        assert_eq!(visibility(&child), Visibility::OwnerOnly(2));
        assert!(!can_mutate_ledger(&child));
    }

    #[test]
    fn subadmin_sees_the_parent_family() {
        let sub = user(3, Role::Subadmin, Some(1));
        assert!(!is_dependent(&sub));
        assert_eq!(visibility(&sub), Visibility::Family { root: 1 });
        assert_eq!(ledger_owner_id(&sub), 1);
    }

    #[test]
    fn budgets_of_a_dependent_resolve_to_the_parent() {
        assert_eq!(ledger_owner_id(&user(2, Role::User, Some(1))), 1);
        assert_eq!(ledger_owner_id(&user(1, Role::User, None)), 1);
    }

    #[test]
    fn modification_rules() {
        let parent = user(1, Role::User, None);
        let child = user(2, Role::User, Some(1));
        let sub = user(3, Role::Subadmin, Some(1));
        let stranger = user(4, Role::User, None);
        let other_child = user(5, Role::User, Some(4));

        assert!(can_modify_owner(&parent, &parent));
        assert!(can_modify_owner(&parent, &child));
        assert!(can_modify_owner(&sub, &child));
        assert!(can_modify_owner(&sub, &parent));

        assert!(!can_modify_owner(&child, &child));
        assert!(!can_modify_owner(&child, &parent));
        assert!(!can_modify_owner(&stranger, &child));
        assert!(!can_modify_owner(&sub, &other_child));
        assert!(!can_modify_owner(&parent, &other_child));
    }
}
