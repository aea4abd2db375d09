//! Cursor-pagination helpers.
//!
//! A listing is exhausted by feeding each page's end cursor back into the
//! next request until the page metadata reports no further pages. Pages
//! are appended in server-returned order.

use std::future::Future;

use tracing::debug;

use super::Page;
use crate::types::CuratorError;

/// Fetch every page of a listing.
pub async fn fetch_all<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, CuratorError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, CuratorError>>,
{
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(cursor.take()).await?;
        let fetched = page.nodes.len();
        out.extend(page.nodes);
        debug!(fetched, total = out.len(), "Page fetched");

        if !page.has_next_page {
            break;
        }
        match page.end_cursor {
            Some(c) => cursor = Some(c),
            // has_next_page without a cursor would loop forever on the
            // first page; treat it as exhausted.
            None => break,
        }
    }

    Ok(out)
}

/// Fetch every page of a listing whose parent resource may disappear
/// mid-iteration (e.g. a collection deleted during a long run).
///
/// A `None` page means the parent is gone: the accumulation so far is
/// returned rather than an error, so concurrent deletion never crashes
/// the run.
pub async fn fetch_all_partial<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, CuratorError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Option<Page<T>>, CuratorError>>,
{
    let mut out = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = match fetch_page(cursor.take()).await? {
            Some(page) => page,
            None => {
                debug!(partial = out.len(), "Parent resource vanished mid-pagination");
                return Ok(out);
            }
        };
        let fetched = page.nodes.len();
        out.extend(page.nodes);
        debug!(fetched, total = out.len(), "Page fetched");

        if !page.has_next_page {
            break;
        }
        match page.end_cursor {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    Ok(out)
}
