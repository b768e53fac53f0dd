/// A URL submitted for one page of a forum thread.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ForumUrlRow {
    pub host: String,
    pub name: String,
    pub id: i64,
    pub page: i64,
    pub post: Option<i64>,
    pub path_qs: String,
    pub url: String,
    pub date: String,
}

/// A URL submitted for a page that is not a forum thread.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtherUrlRow {
    pub origin: String,
    pub url: String,
    pub date: String,
}
