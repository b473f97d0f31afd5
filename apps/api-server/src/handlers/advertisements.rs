//! Advertisement collection handlers.
//!
//! Reads honor an optional bearer token; writes require one and are limited to
//! the record's creator.

use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use adboard_core::domain::{
    AdStatus, Advertisement, AdvertisementChanges, AdvertisementFilter, NewAdvertisement, Page,
};
use adboard_shared::PageResponse;
use adboard_shared::dto::{
    AdvertisementListQuery, AdvertisementResponse, CreateAdvertisementRequest, CreatorResponse,
    PatchAdvertisementRequest, ReplaceAdvertisementRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/advertisements
pub async fn list(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<AdvertisementListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = AdvertisementFilter {
        status: parse_field(&query.status, "status", parse_status)?,
        creator: parse_field(&query.creator, "creator", parse_uuid)?,
        created_at_after: parse_field(&query.created_at_after, "created_at_after", parse_timestamp)?,
        created_at_before: parse_field(
            &query.created_at_before,
            "created_at_before",
            parse_timestamp,
        )?,
    };
    let page = Page::new(
        parse_field(&query.limit, "limit", parse_count)?,
        parse_field(&query.offset, "offset", parse_count)?,
    );

    let (items, count) = state
        .advertisements
        .list(identity.requester(), &filter, page)
        .await?;

    Ok(HttpResponse::Ok().json(PageResponse {
        count,
        limit: page.limit,
        offset: page.offset,
        results: render_many(&state, items).await?,
    }))
}

/// GET /api/advertisements/{id}
pub async fn retrieve(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let ad = state
        .advertisements
        .retrieve(identity.requester(), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(render(&state, ad).await?))
}

/// POST /api/advertisements
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateAdvertisementRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let draft = NewAdvertisement {
        title: req.title,
        description: req.description.unwrap_or_default(),
        status: parse_body(&req.status, "status", parse_status)?,
    };

    let ad = state.advertisements.create(identity.user_id, draft).await?;
    Ok(HttpResponse::Created().json(render(&state, ad).await?))
}

/// PUT /api/advertisements/{id}
pub async fn replace(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ReplaceAdvertisementRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = AdvertisementChanges {
        title: Some(req.title),
        description: req.description,
        status: parse_body(&req.status, "status", parse_status)?,
    };

    update(state, identity, path.into_inner(), changes).await
}

/// PATCH /api/advertisements/{id}
pub async fn partial_update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PatchAdvertisementRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let changes = AdvertisementChanges {
        title: req.title,
        description: req.description,
        status: parse_body(&req.status, "status", parse_status)?,
    };

    update(state, identity, path.into_inner(), changes).await
}

async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    id: Uuid,
    changes: AdvertisementChanges,
) -> AppResult<HttpResponse> {
    let ad = state
        .advertisements
        .update(identity.user_id, id, changes)
        .await?;

    Ok(HttpResponse::Ok().json(render(&state, ad).await?))
}

/// DELETE /api/advertisements/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .advertisements
        .delete(identity.user_id, path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

async fn render(state: &AppState, ad: Advertisement) -> AppResult<AdvertisementResponse> {
    let mut rendered = render_many(state, vec![ad]).await?;
    rendered
        .pop()
        .ok_or_else(|| AppError::Internal("rendering produced no advertisement".to_string()))
}

/// Convert records to responses, resolving every distinct creator in one lookup.
async fn render_many(
    state: &AppState,
    ads: Vec<Advertisement>,
) -> AppResult<Vec<AdvertisementResponse>> {
    let mut creator_ids: Vec<Uuid> = ads.iter().map(|ad| ad.creator_id).collect();
    creator_ids.sort_unstable();
    creator_ids.dedup();

    let emails: HashMap<Uuid, String> = state
        .users
        .find_by_ids(&creator_ids)
        .await?
        .into_iter()
        .map(|user| (user.id, user.email))
        .collect();

    Ok(ads
        .into_iter()
        .map(|ad| AdvertisementResponse {
            id: ad.id,
            title: ad.title,
            description: ad.description,
            status: ad.status.to_string(),
            creator: CreatorResponse {
                id: ad.creator_id,
                email: emails.get(&ad.creator_id).cloned().unwrap_or_else(|| {
                    tracing::warn!(
                        advertisement_id = %ad.id,
                        creator_id = %ad.creator_id,
                        "Creator not found while rendering advertisement"
                    );
                    String::new()
                }),
            },
            created_at: ad.created_at,
            updated_at: ad.updated_at,
        })
        .collect())
}

/// Parse an optional input value. An absent or empty value means "not given".
fn parse_field<T, E>(
    raw: &Option<String>,
    field: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> AppResult<Option<T>>
where
    E: std::fmt::Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .map_err(|e| AppError::BadRequest(format!("{field}: {e}"))),
    }
}

/// Parse an optional body value. Only an absent key means "not given"; any
/// present value, empty included, must parse.
fn parse_body<T, E>(
    raw: &Option<String>,
    field: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> AppResult<Option<T>>
where
    E: std::fmt::Display,
{
    raw.as_deref()
        .map(|value| {
            parse(value).map_err(|e| AppError::BadRequest(format!("{field}: {e}")))
        })
        .transpose()
}

fn parse_status(raw: &str) -> Result<AdStatus, String> {
    raw.parse::<AdStatus>().map_err(|e| e.to_string())
}

fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw).map_err(|_| format!("'{raw}' is not a valid user id"))
}

fn parse_count(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| format!("'{raw}' is not a non-negative integer"))
}

/// Accepts RFC 3339, a naive `YYYY-MM-DD HH:MM:SS` (or with `T`) read as UTC,
/// or a bare date meaning midnight UTC.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{raw}' is not a valid date or timestamp"))
}
