// src/api/pagination.rs
//! Cursor pagination driver for Notion list endpoints.

use super::PaginatedResponse;
use crate::error::AppError;

/// Drains a cursor-paginated listing into one vector.
///
/// `fetch_batch` is called with the cursor for the next batch (`None` for
/// the first) and must come back with that batch; the loop ends when the
/// API reports no more results or stops handing out cursors.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_batch: F) -> Result<Vec<T>, AppError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<T>, AppError>>,
{
    let mut items = Vec::new();
    let mut cursor = None;

    loop {
        let batch = fetch_batch(cursor).await?;
        items.extend(batch.results);

        if !batch.has_more {
            break;
        }
        match batch.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}
