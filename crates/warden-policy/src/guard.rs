//! Role checks over the call context.

use warden_core::{CallContext, CallerIdentity, Error, OPERATOR_ID, OPERATOR_ROLE, Result, Role};

/// Resolve the caller from the `operator-id` and `operator-role` context fields.
///
/// The role travels as a list of strings; only the first element is read and
/// it must be a decimal integer naming a known role.
pub fn identity(ctx: &CallContext) -> Result<CallerIdentity> {
    let user_id = ctx
        .get(OPERATOR_ID)
        .and_then(|values| values.first())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| no_permission("operator id missing"))?;

    let raw_role = ctx
        .get(OPERATOR_ROLE)
        .ok_or_else(|| no_permission("operator role missing"))?
        .first()
        .ok_or_else(|| no_permission("operator role empty"))?;

    let value: i32 = raw_role
        .parse()
        .map_err(|_| no_permission("operator role is not an integer"))?;
    let role = Role::try_from(value).map_err(|_| no_permission("operator role unknown"))?;

    Ok(CallerIdentity::new(user_id.clone(), role))
}

/// Require an admin caller; returns the caller's user id.
pub fn require_admin(ctx: &CallContext) -> Result<String> {
    let caller = identity(ctx)?;
    check_admin(&caller)?;
    Ok(caller.user_id)
}

/// Require a normal-user caller; returns the caller's user id.
pub fn require_user(ctx: &CallContext) -> Result<String> {
    let caller = identity(ctx)?;
    check_user(&caller)?;
    Ok(caller.user_id)
}

/// Allow admins, or callers whose user id is one of `allowed_ids`.
pub fn require_admin_or_self<S: AsRef<str>>(ctx: &CallContext, allowed_ids: &[S]) -> Result<()> {
    let caller = identity(ctx)?;
    check_admin_or_self(&caller, allowed_ids)
}

pub fn check_admin(caller: &CallerIdentity) -> Result<()> {
    if caller.role != Role::Admin {
        tracing::debug!(user_id = %caller.user_id, role = %caller.role, "admin role required");
        return Err(no_permission("admin role required"));
    }
    Ok(())
}

pub fn check_user(caller: &CallerIdentity) -> Result<()> {
    if caller.role != Role::Normal {
        tracing::debug!(user_id = %caller.user_id, role = %caller.role, "user role required");
        return Err(no_permission("user role required"));
    }
    Ok(())
}

pub fn check_admin_or_self<S: AsRef<str>>(caller: &CallerIdentity, allowed_ids: &[S]) -> Result<()> {
    if caller.is_admin() || allowed_ids.iter().any(|id| id.as_ref() == caller.user_id) {
        return Ok(());
    }
    tracing::debug!(user_id = %caller.user_id, "caller is neither admin nor an allowed user");
    Err(no_permission("caller is neither admin nor the target user"))
}

fn no_permission(reason: &str) -> Error {
    Error::NoPermission(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(id: &str, role: &str) -> CallContext {
        CallContext::new()
            .with_value(OPERATOR_ID, id)
            .with_value(OPERATOR_ROLE, role)
    }

    #[test]
    fn test_identity_from_context() {
        let caller = identity(&ctx("alice", "2")).unwrap();
        assert_eq!(caller, CallerIdentity::new("alice", Role::Admin));
    }

    #[test]
    fn test_identity_reads_first_role_only() {
        let c = ctx("alice", "1").with_value(OPERATOR_ROLE, "2");
        assert_eq!(identity(&c).unwrap().role, Role::Normal);
    }

    #[test]
    fn test_identity_failures_are_no_permission() {
        let cases = vec![
            CallContext::new(),
            CallContext::new().with_value(OPERATOR_ID, "alice"),
            CallContext::new().with_value(OPERATOR_ROLE, "2"),
            ctx("", "2"),
            ctx("alice", "admin"),
            ctx("alice", "0"),
            ctx("alice", "3"),
            ctx("alice", " 2 "),
            ctx("alice", "2\n"),
        ];
        for c in cases {
            assert!(matches!(identity(&c), Err(Error::NoPermission(_))), "{c:?}");
        }

        let mut empty_roles = CallContext::new().with_value(OPERATOR_ID, "alice");
        empty_roles.insert(OPERATOR_ROLE, Vec::new());
        assert!(matches!(identity(&empty_roles), Err(Error::NoPermission(_))));
    }

    #[test]
    fn test_require_admin() {
        assert_eq!(require_admin(&ctx("root", "2")).unwrap(), "root");
        assert!(matches!(require_admin(&ctx("bob", "1")), Err(Error::NoPermission(_))));
    }

    #[test]
    fn test_require_user() {
        assert_eq!(require_user(&ctx("bob", "1")).unwrap(), "bob");
        assert!(matches!(require_user(&ctx("root", "2")), Err(Error::NoPermission(_))));
    }

    #[test]
    fn test_require_admin_or_self() {
        assert!(require_admin_or_self(&ctx("root", "2"), &["someone"]).is_ok());
        assert!(require_admin_or_self(&ctx("bob", "1"), &["alice", "bob"]).is_ok());
        assert!(matches!(
            require_admin_or_self(&ctx("bob", "1"), &["alice"]),
            Err(Error::NoPermission(_))
        ));
        assert!(require_admin_or_self::<&str>(&ctx("bob", "1"), &[]).is_err());
    }
}
