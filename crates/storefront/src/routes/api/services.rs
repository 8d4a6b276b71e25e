//! Clinic services API.

use axum::{
    Json,
    extract::{OriginalUri, State},
};
use tracing::instrument;

use dental_com_core::ServiceId;

use super::QueryParams;
use super::pagination::{LimitOffset, LimitOffsetParams, PageUrl, Paginated};
use crate::db::ServiceRepository;
use crate::error::Result;
use crate::models::service::ServiceView;
use crate::state::AppState;

/// Active services, newest first, each with its images.
///
/// GET /api/services/
///
/// # Errors
///
/// Returns `AppError::Database` if a query fails.
#[instrument(skip(state))]
pub async fn list_services(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(params): QueryParams<LimitOffsetParams>,
) -> Result<Json<Paginated<ServiceView>>> {
    let window = LimitOffset::from_params(&params);
    let repo = ServiceRepository::new(state.pool());
    let (services, count) = repo.list_active(Some(window.limit), window.offset).await?;

    let ids: Vec<ServiceId> = services.iter().map(|s| s.id).collect();
    let images = repo.images_for(&ids).await?;
    let views = services
        .iter()
        .map(|service| {
            ServiceView::new(
                service,
                images.get(&service.id).map_or(&[][..], Vec::as_slice),
                state.media_url(),
            )
        })
        .collect();

    let url = PageUrl::new(&state.config().base_url, &uri);
    Ok(Json(window.paginate(views, count, &url)))
}
