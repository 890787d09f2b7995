mod admin_service;
mod audit_service;
mod auth_service;
mod category_service;
mod dashboard_service;
mod stream_stat_service;
mod user_service;

pub use admin_service::*;
pub use audit_service::*;
pub use auth_service::*;
pub use category_service::*;
pub use dashboard_service::*;
pub use stream_stat_service::*;
pub use user_service::*;

use pagination::{fetch_page, DataSource, Page, PageRequest};

use crate::db::Database;
use crate::error::{AppError, Result};

/// Run a count + page fetch under the configured query deadline.
pub async fn paginate<S: DataSource>(
    db: &Database,
    source: &S,
    filter: &S::Filter,
    request: PageRequest,
) -> Result<Page<S::Row>> {
    let page = tokio::time::timeout(db.query_timeout, fetch_page(source, filter, request))
        .await
        .map_err(|_| AppError::Timeout)??;

    Ok(page)
}
