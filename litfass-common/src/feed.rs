//! Feed assembly over already-fetched candidate pools.
//!
//! Assembly is pure: callers fetch the pool, hand in an RNG and get back the
//! requested page. Every request re-assembles and re-shuffles, so page 2 of
//! a follow-up request is not guaranteed disjoint from page 1 of the last
//! one. Known and accepted; clients treat the feed as a stream, not a
//! stable listing.

use crate::{
    model::{
        Id,
        post::{MediaKind, Post},
        story::{Story, StoryMarker},
        user::{UserMarker, UserSummary},
    },
    page::{PageNumber, Pagination, page_slice},
};
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;
use time::UtcDateTime;

/// Bound on the random public-post sample offered to viewers who follow
/// nobody yet.
pub const FALLBACK_POOL_SIZE: i64 = 10;

/// A post dressed with the viewer-specific engagement overlay.
#[derive(Clone, Debug, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub likes_count: i64,
    pub comments_count: i64,
    pub has_liked: bool,
    pub has_saved: bool,
    pub is_own_post: bool,
}

#[derive(Debug, Serialize)]
pub struct FeedPage {
    pub posts: Vec<FeedPost>,
    pub pagination: Pagination,
}

/// Shuffles the candidate pool, pins the viewer's latest post to the top of
/// the first page (unless the pool already contains it), and slices out the
/// requested page.
///
/// The pin only happens while assembling page 1, so totals on later pages
/// do not include it; a consequence of per-request assembly that we keep.
pub fn assemble_post_feed<R>(
    pool: Vec<Post>,
    own_latest: Option<Post>,
    page: PageNumber,
    rng: &mut R,
) -> (Vec<Post>, Pagination)
where
    R: Rng + ?Sized,
{
    let mut posts = pool;
    posts.shuffle(rng);

    if page.is_first()
        && let Some(own) = own_latest
        && !posts.iter().any(|post| post.id == own.id)
    {
        posts.insert(0, own);
    }

    page_slice(posts, page)
}

/// One story inside an author group. The author lives on the group, not on
/// the entry.
#[derive(Clone, Debug, Serialize)]
pub struct StoryFeedEntry {
    pub id: Id<StoryMarker>,
    pub content: Option<String>,
    pub media_key: String,
    pub media_kind: MediaKind,
    pub created_at: UtcDateTime,
    pub expires_at: UtcDateTime,
    pub viewed: bool,
    pub is_own: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuthorStories {
    pub author: UserSummary,
    pub stories: Vec<StoryFeedEntry>,
}

/// Groups a combined story list by author, preserving first-encounter order.
/// Callers pass the viewer's own stories first, so their group leads.
#[must_use]
pub fn group_story_feed(
    stories: Vec<(Story, bool)>,
    viewer: Id<UserMarker>,
) -> Vec<AuthorStories> {
    let mut groups: Vec<AuthorStories> = Vec::new();

    for (story, viewed) in stories {
        let expires_at = story.expires_at();
        let entry = StoryFeedEntry {
            id: story.id,
            content: story.content,
            media_key: story.media_key,
            media_kind: story.media_kind,
            created_at: story.created_at,
            expires_at,
            viewed,
            is_own: story.author.id == viewer,
        };

        let index = groups
            .iter()
            .position(|group| group.author.id == story.author.id);
        let index = match index {
            Some(index) => index,
            None => {
                groups.push(AuthorStories {
                    author: story.author,
                    stories: Vec::new(),
                });
                groups.len() - 1
            }
        };
        groups[index].stories.push(entry);
    }

    groups
}

#[cfg(test)]
mod tests {
    use crate::{
        feed::{assemble_post_feed, group_story_feed},
        model::{
            Id,
            post::{MediaKind, Post},
            story::{Story, StoryDuration},
            user::{UserSummary, Username},
        },
        page::{PAGE_SIZE, PageNumber},
    };
    use rand::{SeedableRng, rngs::StdRng};
    use time::macros::utc_datetime;
    use uuid::Uuid;

    fn user(tag: u128) -> UserSummary {
        UserSummary {
            id: Id::new(Uuid::from_u128(tag)),
            username: Username::new(format!("user{tag}")).unwrap(),
            display_name: format!("User {tag}"),
            avatar_url: None,
        }
    }

    fn post(author: &UserSummary, tag: u128) -> Post {
        Post {
            id: Id::new(Uuid::from_u128(0x1000 + tag)),
            author: author.clone(),
            caption: None,
            location_name: None,
            is_public: true,
            allow_comments: true,
            allow_likes: true,
            created_at: utc_datetime!(2025-06-01 08:00),
            updated_at: utc_datetime!(2025-06-01 08:00),
            media: Vec::new(),
        }
    }

    fn story(author: &UserSummary, tag: u128) -> Story {
        Story {
            id: Id::new(Uuid::from_u128(0x2000 + tag)),
            author: author.clone(),
            content: None,
            media_key: format!("stories/{tag}"),
            media_kind: MediaKind::Image,
            duration: StoryDuration::default(),
            is_public: true,
            created_at: utc_datetime!(2025-06-01 09:00),
        }
    }

    fn ids(posts: &[Post]) -> Vec<Uuid> {
        posts.iter().map(|post| post.id.uuid()).collect()
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let author = user(1);
        let pool: Vec<Post> = (0..7).map(|tag| post(&author, tag)).collect();
        let mut expected = ids(&pool);

        let mut rng = StdRng::seed_from_u64(7);
        let (page, info) = assemble_post_feed(pool, None, PageNumber::FIRST, &mut rng);

        let mut got = ids(&page);
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
        assert_eq!(info.total_items, 7);
    }

    #[test]
    fn own_post_pinned_to_top_of_first_page() {
        let author = user(1);
        let viewer = user(2);
        let pool: Vec<Post> = (0..PAGE_SIZE as u128 + 5).map(|tag| post(&author, tag)).collect();
        let own = post(&viewer, 900);

        let mut rng = StdRng::seed_from_u64(3);
        let (page, info) =
            assemble_post_feed(pool, Some(own.clone()), PageNumber::FIRST, &mut rng);

        assert_eq!(page[0].id, own.id);
        assert_eq!(page.len(), PAGE_SIZE as usize);
        assert_eq!(info.total_items, 16);
    }

    #[test]
    fn own_post_already_in_pool_stays_unique() {
        let viewer = user(2);
        let mut pool: Vec<Post> = (0..5).map(|tag| post(&viewer, tag)).collect();
        let own = pool[3].clone();
        pool.swap(0, 3);

        let mut rng = StdRng::seed_from_u64(11);
        let (page, info) = assemble_post_feed(pool, Some(own.clone()), PageNumber::FIRST, &mut rng);

        let occurrences = page.iter().filter(|post| post.id == own.id).count();
        assert_eq!(occurrences, 1);
        assert_eq!(info.total_items, 5);
    }

    #[test]
    fn later_pages_do_not_pin() {
        let author = user(1);
        let viewer = user(2);
        let pool: Vec<Post> = (0..15).map(|tag| post(&author, tag)).collect();
        let own = post(&viewer, 900);

        let mut rng = StdRng::seed_from_u64(5);
        let (page, info) = assemble_post_feed(pool, Some(own.clone()), PageNumber::new(2), &mut rng);

        assert!(page.iter().all(|post| post.id != own.id));
        assert_eq!(info.total_items, 15);
        assert_eq!(page.len(), 5);
    }

    #[test]
    fn empty_pool_yields_empty_feed() {
        let mut rng = StdRng::seed_from_u64(1);
        let (page, info) = assemble_post_feed(Vec::new(), None, PageNumber::FIRST, &mut rng);

        assert!(page.is_empty());
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
    }

    #[test]
    fn stories_group_by_author_in_encounter_order() {
        let me = user(1);
        let anna = user(2);
        let ben = user(3);

        // Own stories first, then followed authors newest-first across authors.
        let stories = vec![
            (story(&me, 1), false),
            (story(&anna, 2), true),
            (story(&ben, 3), false),
            (story(&anna, 4), false),
        ];

        let groups = group_story_feed(stories, me.id);

        let authors: Vec<_> = groups.iter().map(|group| group.author.id).collect();
        assert_eq!(authors, [me.id, anna.id, ben.id]);

        assert_eq!(groups[0].stories.len(), 1);
        assert!(groups[0].stories[0].is_own);
        assert!(!groups[0].stories[0].viewed);

        assert_eq!(groups[1].stories.len(), 2);
        assert!(groups[1].stories[0].viewed);
        assert!(!groups[1].stories[1].viewed);
        assert!(groups[1].stories.iter().all(|entry| !entry.is_own));
    }

    #[test]
    fn story_entry_expiry_uses_story_duration() {
        let me = user(1);
        let mut one = story(&me, 1);
        one.duration = StoryDuration::new(2).unwrap();

        let groups = group_story_feed(vec![(one.clone(), false)], me.id);

        assert_eq!(groups[0].stories[0].expires_at, one.expires_at());
    }
}
