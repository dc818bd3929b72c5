//! Request-user access. The host attaches a [`RequestUser`] to the request
//! data; mutation bodies and resolvers read it back through one accessor
//! instead of repeating the anonymous-user dance everywhere.

use async_graphql::Context;

/// The user attached to the current request, if the host authenticated one.
/// Anonymous sessions are represented by a marker user rather than absence,
/// so accessors can distinguish "no session" from "anonymous session".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestUser {
    pub id: String,
    pub username: String,
    pub anonymous: bool,
}

impl RequestUser {
    pub fn authenticated(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            anonymous: false,
        }
    }

    /// The anonymous-session marker.
    pub fn anonymous() -> Self {
        Self {
            id: String::new(),
            username: "anonymous".to_string(),
            anonymous: true,
        }
    }
}

/// Read the request user off the context. Returns `None` when no user is
/// attached, or when the user is the anonymous marker and `allow_anonymous`
/// is false.
pub fn get_user<'a>(ctx: &Context<'a>, allow_anonymous: bool) -> Option<&'a RequestUser> {
    ctx.data_opt::<RequestUser>()
        .filter(|user| allow_anonymous || !user.anonymous)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_marker() {
        assert!(RequestUser::anonymous().anonymous);
        assert!(!RequestUser::authenticated("1", "ada").anonymous);
    }
}
