use crate::data::{self, Collections, FailureHook, FeedService};
use crate::dummyjson::{CommentUser, Post, User};
use crate::pager::PageCursor;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const UNKNOWN_POSTER: &str = "Unknown Poster";
pub const UNKNOWN_COMMENTER: &str = "Unknown Commenter";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Author {
    Known(User),
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Commenter {
    Known(User),
    /// No canonical user matched; only the embedded reference is left.
    Unknown(CommentUser),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentEntry {
    pub id: i64,
    pub body: String,
    pub commenter: Commenter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostBlock {
    pub post: Post,
    pub author: Author,
    pub comments: Vec<CommentEntry>,
    pub tags: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPage {
    pub cursor: PageCursor,
    pub blocks: Vec<PostBlock>,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub page: RenderPage,
    pub next: PageCursor,
}

pub fn window(posts: &[Post], cursor: PageCursor, page_size: usize) -> &[Post] {
    let bounds = cursor.bounds(page_size);
    if bounds.start >= posts.len() {
        return &[];
    }
    &posts[bounds.start..bounds.end.min(posts.len())]
}

pub fn tags_line(tags: &[String]) -> String {
    format!("Tags: {}", tags.join(", "))
}

/// Joins one window of posts with their authors and comments.
pub fn build_page(cursor: PageCursor, page_size: usize, collections: &Collections) -> RenderPage {
    let blocks = window(&collections.posts, cursor, page_size)
        .iter()
        .map(|post| build_block(post, collections))
        .collect();
    RenderPage { cursor, blocks }
}

fn build_block(post: &Post, collections: &Collections) -> PostBlock {
    let author = match find_user(&collections.users, post.user_id) {
        Some(user) => Author::Known(user.clone()),
        None => Author::Unknown,
    };

    let comments = collections
        .comments
        .iter()
        .filter(|comment| comment.post_id == post.id)
        .map(|comment| CommentEntry {
            id: comment.id,
            body: comment.body.clone(),
            commenter: match find_user(&collections.users, comment.user.id) {
                Some(user) => Commenter::Known(user.clone()),
                None => Commenter::Unknown(comment.user.clone()),
            },
        })
        .collect();

    PostBlock {
        post: post.clone(),
        author,
        comments,
        tags: tags_line(&post.tags),
    }
}

fn find_user(users: &[User], id: i64) -> Option<&User> {
    users.iter().find(|user| user.id == id)
}

/// One load cycle: fetch all three collections, then join the window at
/// `cursor`. The returned outcome carries the cursor for the next cycle.
pub fn load_cycle(
    service: &dyn FeedService,
    cursor: PageCursor,
    page_size: usize,
    hook: &FailureHook,
) -> LoadOutcome {
    let collections = data::fetch_all(service, hook);
    let page = build_page(cursor, page_size, &collections);
    tracing::info!(
        page = cursor.page(),
        posts = collections.posts.len(),
        rendered = page.blocks.len(),
        "load cycle finished"
    );
    LoadOutcome {
        page,
        next: cursor.advance(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockFeedService;
    use crate::dummyjson::Comment;

    fn post(id: i64, user_id: i64, tags: &[&str]) -> Post {
        Post {
            id,
            title: format!("post {id}"),
            body: format!("body {id}"),
            reactions: id * 2,
            user_id,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            first_name: "First".into(),
            last_name: "Last".into(),
            username: username.into(),
            email: format!("{username}@example.com"),
            phone: "+1 555".into(),
            image: format!("https://example.com/{username}.png"),
        }
    }

    fn comment(id: i64, post_id: i64, user_id: i64, username: &str) -> Comment {
        Comment {
            id,
            body: format!("comment {id}"),
            post_id,
            user: CommentUser {
                id: user_id,
                username: username.into(),
                full_name: None,
            },
        }
    }

    #[test]
    fn window_slices_in_order() {
        let posts: Vec<Post> = (1..=12).map(|id| post(id, 1, &[])).collect();
        let ids = |cursor| {
            window(&posts, cursor, 5)
                .iter()
                .map(|post| post.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(PageCursor::first()), vec![1, 2, 3, 4, 5]);
        assert_eq!(ids(PageCursor::at(2)), vec![6, 7, 8, 9, 10]);
        assert_eq!(ids(PageCursor::at(3)), vec![11, 12]);
        assert!(ids(PageCursor::at(4)).is_empty());
    }

    #[test]
    fn authors_come_from_users() {
        let collections = Collections {
            posts: vec![post(1, 7, &[]), post(2, 8, &[])],
            users: vec![user(7, "kate"), user(7, "shadow")],
            comments: vec![],
        };
        let page = build_page(PageCursor::first(), 5, &collections);
        assert_eq!(page.blocks[0].author, Author::Known(user(7, "kate")));
        assert_eq!(page.blocks[1].author, Author::Unknown);
    }

    #[test]
    fn comments_keep_source_order_and_use_canonical_users() {
        let collections = Collections {
            posts: vec![post(1, 7, &[]), post(2, 7, &[])],
            users: vec![user(7, "kate"), user(8, "canonical")],
            comments: vec![
                comment(10, 1, 8, "stale-name"),
                comment(11, 2, 8, "stale-name"),
                comment(12, 1, 99, "ghost"),
                comment(13, 1, 7, "kate"),
            ],
        };
        let page = build_page(PageCursor::first(), 5, &collections);
        let first = &page.blocks[0];
        let ids: Vec<i64> = first.comments.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![10, 12, 13]);
        assert_eq!(first.comments[0].commenter, Commenter::Known(user(8, "canonical")));
        match &first.comments[1].commenter {
            Commenter::Unknown(reference) => assert_eq!(reference.username, "ghost"),
            other => panic!("expected unknown commenter, got {other:?}"),
        }
        assert_eq!(first.comments[1].body, "comment 12");
        assert_eq!(page.blocks[1].comments.len(), 1);
    }

    #[test]
    fn tags_render_comma_joined() {
        let tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(tags_line(&tags), "Tags: a, b, c");
        assert_eq!(tags_line(&[]), "Tags: ");
    }

    #[test]
    fn lone_post_without_users_or_comments() {
        let collections = Collections {
            posts: vec![post(1, 9, &[])],
            ..Default::default()
        };
        let page = build_page(PageCursor::first(), 5, &collections);
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].author, Author::Unknown);
        assert!(page.blocks[0].comments.is_empty());
        assert_eq!(page.blocks[0].tags, "Tags: ");
    }

    #[test]
    fn load_cycle_advances_cursor_past_the_end() {
        let service = MockFeedService::new(Collections {
            posts: vec![post(1, 1, &["x"])],
            users: vec![user(1, "only")],
            comments: vec![],
        });
        let hook = data::logging_hook();
        let first = load_cycle(&service, PageCursor::first(), 5, &hook);
        assert_eq!(first.page.blocks.len(), 1);
        assert_eq!(first.next, PageCursor::at(2));

        let second = load_cycle(&service, first.next, 5, &hook);
        assert!(second.page.blocks.is_empty());
        assert_eq!(second.next, PageCursor::at(3));
        assert_eq!(service.cycles(), 2);
    }
}
