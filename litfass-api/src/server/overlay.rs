use litfass_common::{
    feed::FeedPost,
    model::{Id, post::Post, user::UserMarker},
};
use litfass_db::client::{DbClient, Result};
use uuid::Uuid;

/// Dresses posts with the viewer-specific engagement overlay: counts,
/// liked/saved membership and ownership. Counts may lag concurrent activity
/// by design; the reads are not transactional with the pool fetch.
pub async fn attach_engagement(
    db: &DbClient,
    viewer: Id<UserMarker>,
    posts: Vec<Post>,
) -> Result<Vec<FeedPost>> {
    let ids: Vec<Uuid> = posts.iter().map(|post| post.id.uuid()).collect();

    let like_counts = db.like_counts(&ids).await?;
    let comment_counts = db.comment_counts(&ids).await?;
    let liked = db.liked_post_ids(viewer, &ids).await?;
    let saved = db.saved_post_ids(viewer, &ids).await?;

    let feed_posts = posts
        .into_iter()
        .map(|post| {
            let id = post.id.uuid();
            FeedPost {
                likes_count: like_counts.get(&id).copied().unwrap_or(0),
                comments_count: comment_counts.get(&id).copied().unwrap_or(0),
                has_liked: liked.contains(&id),
                has_saved: saved.contains(&id),
                is_own_post: post.author.id == viewer,
                post,
            }
        })
        .collect();

    Ok(feed_posts)
}
