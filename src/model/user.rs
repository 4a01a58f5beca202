//! The acting user, as far as search visibility is concerned.

use super::tag::PhotoTag;

/// Visibility rules consulted while evaluating a search.
pub trait Viewer {
    /// Whether unpublished photos may appear in results.
    fn can_view_unpublished(&self) -> bool;

    /// Whether a (possibly unaccepted) tag counts for this viewer.
    fn can_see_tag(&self, tag: &PhotoTag) -> bool;
}

/// Identity and permission flags of the user running a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserContext {
    /// `None` for anonymous visitors.
    pub user_id: Option<u64>,
    pub can_view_unpublished: bool,
    /// Reviewers see every proposed tag.
    pub can_review_tags: bool,
}

impl UserContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: u64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }
}

impl Viewer for UserContext {
    fn can_view_unpublished(&self) -> bool {
        self.can_view_unpublished
    }

    fn can_see_tag(&self, tag: &PhotoTag) -> bool {
        if tag.accepted || self.can_review_tags {
            return true;
        }
        matches!((self.user_id, tag.creator), (Some(user), Some(creator)) if user == creator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_sees_only_accepted_tags() {
        let anon = UserContext::anonymous();
        assert!(anon.can_see_tag(&PhotoTag::accepted("dog")));
        assert!(!anon.can_see_tag(&PhotoTag::proposed("dog", 7)));
        assert!(!anon.can_view_unpublished());
    }

    #[test]
    fn test_submitter_sees_own_proposals() {
        let user = UserContext::user(7);
        assert!(user.can_see_tag(&PhotoTag::proposed("dog", 7)));
        assert!(!user.can_see_tag(&PhotoTag::proposed("dog", 8)));
    }

    #[test]
    fn test_reviewer_sees_all_tags() {
        let reviewer = UserContext {
            user_id: Some(1),
            can_view_unpublished: true,
            can_review_tags: true,
        };
        assert!(reviewer.can_see_tag(&PhotoTag::proposed("dog", 8)));
        assert!(reviewer.can_view_unpublished());
    }
}
