use std::borrow::Cow;
use std::fmt::Write as _;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use url::Url;

/// Path segments that mark a forum thread URL (XenForo uses `threads`,
/// phpBB/SMF style boards use `topic`).
const THREAD_MARKERS: [&str; 2] = ["threads", "topic"];

const PAGE_PREFIX: &str = "page-";
const POST_PREFIX: &str = "post-";

/// Canonical identity of one page of a forum thread.
///
/// Two values are equal when `(host, name, id, page)` match. The post anchor,
/// thread path and raw path/query are carried along for storage and display
/// but never take part in equality or hashing.
#[derive(Debug, Clone)]
pub struct ForumThread {
    host: String,
    name: String,
    id: i64,
    page: u32,
    post_number: Option<i64>,
    thread_path: String,
    path_qs: String,
}

impl ForumThread {
    /// Decompose a URL into a thread identity.
    ///
    /// Returns `None` for anything that does not look like a thread page:
    /// missing host, no `threads`/`topic` segment, a name segment without a
    /// `name.id` shape, or a page/post marker whose number does not parse.
    /// The post anchor is looked for in the fragment first, then in path
    /// segments other than the marker and name, so `best-post-ever.55` stays
    /// a thread name.
    #[must_use]
    pub fn from_url(url: &Url) -> Option<Self> {
        let host = url.host_str().filter(|h| !h.is_empty())?;
        let raw: Vec<&str> = url.path_segments()?.collect();
        let segments: Vec<Cow<'_, str>> = raw.iter().map(|s| decode(s)).collect();

        let marker = segments.iter().position(|s| is_marker(s))?;
        let name_index = marker + 1;

        let (name, id) = segments.get(name_index)?.rsplit_once('.')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id: i64 = id.trim().parse().ok()?;

        let page = match segments.get(name_index + 1) {
            Some(segment) if segment.contains(PAGE_PREFIX) => {
                strip_number::<u32>(segment, PAGE_PREFIX).filter(|p| *p >= 1)?
            }
            _ => 1,
        };

        // The fragment wins over path segments; the marker and name segments
        // are never anchors (a slug like `best-post-ever.55` is a name).
        let fragment = url.fragment().map(decode);
        let mut anchor = fragment.as_deref().into_iter().chain(
            segments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != marker && *i != name_index)
                .map(|(_, s)| &**s),
        );
        let post_number = match anchor.find(|s| s.contains(POST_PREFIX)) {
            Some(candidate) => Some(strip_number::<i64>(candidate, POST_PREFIX)?),
            None => None,
        };

        let thread_path = format!("/{}", raw[..=name_index].join("/"));
        let path_qs = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };

        Some(Self {
            host: host.to_string(),
            name: name.to_string(),
            id,
            page,
            post_number,
            thread_path,
            path_qs,
        })
    }

    /// Rebuild an identity from the `host` and `path_qs` columns of a stored row.
    #[must_use]
    pub fn from_row(host: &str, path_qs: &str) -> Option<Self> {
        let url = Url::parse(&format!("https://{host}{path_qs}")).ok()?;
        Self::from_url(&url)
    }

    /// Display URL for this thread page, with the post anchor when known.
    #[must_use]
    pub fn url(&self) -> String {
        let mut url = format!("https://{}{}", self.host, self.path_qs);
        if let Some(post) = self.post_number {
            let _ = write!(url, "#{POST_PREFIX}{post}");
        }
        url
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub fn post_number(&self) -> Option<i64> {
        self.post_number
    }

    #[must_use]
    pub fn thread_path(&self) -> &str {
        &self.thread_path
    }

    #[must_use]
    pub fn path_qs(&self) -> &str {
        &self.path_qs
    }

    fn identity(&self) -> (&str, &str, i64, u32) {
        (&self.host, &self.name, self.id, self.page)
    }
}

impl PartialEq for ForumThread {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ForumThread {}

impl Hash for ForumThread {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

fn is_marker(segment: &str) -> bool {
    THREAD_MARKERS.contains(&segment)
}

/// Percent-decode a path segment or fragment, keeping the raw text if it is
/// not valid UTF-8 once decoded.
fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

fn strip_number<T: FromStr>(text: &str, prefix: &str) -> Option<T> {
    text.replace(prefix, "").trim().parse().ok()
}
