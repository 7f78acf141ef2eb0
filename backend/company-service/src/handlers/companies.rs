/// Company handlers - HTTP endpoints for company CRUD
///
/// Every handler takes its [`Authorized`] caller first so that the role
/// allow-list is enforced before the body or query string is parsed.
use actix_web::{
    http::header::{self, HeaderValue},
    web, HttpRequest, HttpResponse,
};
use futures::{stream, StreamExt};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{
    check_company_access, check_company_deletion, is_admin, Authorized, CreateCompany,
    DeleteCompany, ListCompanies, ReadCompany, UpdateCompany,
};
use crate::models::{Company, CompanyRequest};
use crate::services::{page_size, CompanyService};

const EVENT_STREAM: &str = "text/event-stream";

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Maximum number of companies returned (default 50, capped at 500)
    #[serde(rename = "pageSize")]
    pub page_size: Option<usize>,
}

/// List active companies visible to the caller
///
/// Admins see every active company, everyone else only the ones they created.
/// The list is streamed as server-sent events unless the client asks for
/// `application/json`.
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "companies",
    params(ListParams),
    responses(
        (status = 200, description = "Companies as `text/event-stream` or a JSON array", body = [Company]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller lacks a listing role"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_companies(
    caller: Authorized<ListCompanies>,
    req: HttpRequest,
    service: web::Data<CompanyService>,
    query: web::Query<ListParams>,
) -> Result<HttpResponse> {
    let limit = page_size(query.page_size);
    tracing::debug!(user = %caller.name(), admin = is_admin(&caller), limit, "Listing companies");

    let companies = if is_admin(&caller) {
        service.find_all_active(limit).await?
    } else {
        service.find_active_by_user(caller.name(), limit).await?
    };

    if wants_json(&req) {
        return Ok(HttpResponse::Ok().json(companies));
    }

    let events = stream::iter(companies).map(|company| sse_event(&company));

    Ok(HttpResponse::Ok()
        .content_type(EVENT_STREAM)
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(events))
}

/// One `data:` event per company, serialized as the body is polled.
fn sse_event(company: &Company) -> std::result::Result<web::Bytes, serde_json::Error> {
    let json = serde_json::to_string(company)?;
    Ok(web::Bytes::from(format!("data:{}\n\n", json)))
}

/// JSON only when explicitly asked for and event streams are not.
fn wants_json(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value: &HeaderValue| value.to_str().ok())
        .map(|accept| accept.contains("application/json") && !accept.contains(EVENT_STREAM))
        .unwrap_or(false)
}

/// Get a company by id
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 403, description = "Caller lacks a read role or does not own the company"),
        (status = 404, description = "No company with this id"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_company(
    caller: Authorized<ReadCompany>,
    service: web::Data<CompanyService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let company = find_or_404(&service, &id).await?;
    check_company_access(&caller, &company)?;

    Ok(HttpResponse::Ok().json(company))
}

/// Create a company owned by the caller
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "companies",
    request_body = CompanyRequest,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Blank name or malformed body"),
        (status = 403, description = "Caller lacks a create role"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_company(
    caller: Authorized<CreateCompany>,
    service: web::Data<CompanyService>,
    body: web::Json<CompanyRequest>,
) -> Result<HttpResponse> {
    let draft = body.into_inner();
    draft.validate()?;

    let company = service.save(draft, None, caller.name()).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/companies/{}", company.id)))
        .json(company))
}

/// Update a company's name and activation flag
#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = String, Path, description = "Company id")),
    request_body = CompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 400, description = "Blank name or malformed body"),
        (status = 403, description = "Caller lacks a save role or does not own the company"),
        (status = 404, description = "No company with this id"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_company(
    caller: Authorized<UpdateCompany>,
    service: web::Data<CompanyService>,
    id: web::Path<String>,
    body: web::Json<CompanyRequest>,
) -> Result<HttpResponse> {
    let draft = body.into_inner();
    draft.validate()?;

    let existing = find_or_404(&service, &id).await?;
    check_company_access(&caller, &existing)?;

    let company = service.save(draft, Some(existing), caller.name()).await?;
    Ok(HttpResponse::Ok().json(company))
}

/// Delete a company
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deleted"),
        (status = 403, description = "Caller lacks a delete role or does not own the company"),
        (status = 404, description = "No company with this id"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_company(
    caller: Authorized<DeleteCompany>,
    service: web::Data<CompanyService>,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    let company = find_or_404(&service, &id).await?;
    check_company_deletion(&caller, &company)?;

    service.delete_by_id(&company.id).await?;
    Ok(HttpResponse::Ok().finish())
}

async fn find_or_404(service: &CompanyService, id: &str) -> Result<Company> {
    service
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {} not found", id)))
}
