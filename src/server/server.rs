use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::error::ApiError;
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::state::*;
use super::{log_requests, ServerConfig};
use crate::quote::{
    policy, NewComment, NewQuote, QuoteListQuery, QuotePage, QuoteSortField, VoteKind,
    DEFAULT_PAGE_SIZE,
};
use crate::user::{NewPasswordCredentials, PasswordHasher, PublicUser, TokenService, UserRole};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub user: Option<i64>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Deserialize, Debug)]
struct QuoteBody {
    pub content: String,
    pub author: String,
}

#[derive(Deserialize, Debug)]
struct CommentBody {
    pub content: String,
    #[serde(rename = "quoteId")]
    pub quote_id: i64,
}

#[derive(Deserialize, Debug)]
struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    pub verified: Option<bool>,
}

/// A comment with its author expanded to the public identity record.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentWithAuthor {
    id: i64,
    content: String,
    user: Option<PublicUser>,
    quote: i64,
    created_at: DateTime<Utc>,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        user: session.map(|s| s.user_id),
    };
    Json(stats)
}

async fn register(
    State(user_store): State<GuardedUserStore>,
    Json(body): Json<RegisterBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if user_store.get_user_credentials(&body.username)?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let hasher = PasswordHasher::Argon2;
    let salt = hasher.generate_b64_salt();
    let hash = hasher.hash(body.password.as_bytes(), &salt)?;
    user_store.create_user(
        &body.username,
        UserRole::User,
        &NewPasswordCredentials { salt, hash, hasher },
    )?;

    Ok(Json(json!({ "message": "Registration successful" })))
}

async fn login(
    State(user_store): State<GuardedUserStore>,
    State(token_service): State<GuardedTokenService>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let credentials = user_store
        .get_user_credentials(&body.username)?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    let password_matches = credentials.hasher.verify(
        body.password.as_str(),
        credentials.hash.as_str(),
        credentials.salt.as_str(),
    )?;
    if !password_matches {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let token = token_service.issue(credentials.user_id, credentials.role)?;

    let cookie = HeaderValue::from_str(&format!(
        "{}={}; Path=/; HttpOnly",
        COOKIE_SESSION_TOKEN_KEY, token
    ))
    .map_err(|err| ApiError::Internal(err.into()))?;
    let mut response = Json(LoginSuccessResponse { token }).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn list_quotes(
    State(quote_store): State<GuardedQuoteStore>,
    Query(params): Query<ListParams>,
) -> Result<Json<QuotePage>, ApiError> {
    let sort = match params.sort_by.as_deref() {
        None => QuoteSortField::default(),
        Some(name) => QuoteSortField::from_str(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown sort field '{}'", name)))?,
    };

    let query = QuoteListQuery {
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        search: params.search.filter(|s| !s.is_empty()),
        sort,
        verified_only: params.verified.unwrap_or(false),
    };
    Ok(Json(quote_store.list_quotes(&query)?))
}

async fn get_quote(
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match quote_store.get_quote(id)? {
        Some(quote) => Ok(Json(quote).into_response()),
        None => Err(ApiError::NotFound("Quote")),
    }
}

async fn create_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Json(body): Json<QuoteBody>,
) -> Result<Response, ApiError> {
    let quote = quote_store.insert_quote(NewQuote {
        content: body.content,
        author: body.author,
        owner_id: session.user_id,
    })?;
    Ok(Json(quote).into_response())
}

async fn update_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
    Json(body): Json<QuoteBody>,
) -> Result<Response, ApiError> {
    let quote = quote_store
        .get_quote(id)?
        .ok_or(ApiError::NotFound("Quote"))?;
    policy::authorize(policy::QuoteAction::Edit, &quote, session.user_id, session.role)?;

    let updated = quote_store
        .update_quote(id, &body.content, &body.author)?
        .ok_or(ApiError::NotFound("Quote"))?;
    Ok(Json(updated).into_response())
}

async fn delete_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let quote = quote_store
        .get_quote(id)?
        .ok_or(ApiError::NotFound("Quote"))?;
    policy::authorize(
        policy::QuoteAction::Delete,
        &quote,
        session.user_id,
        session.role,
    )?;

    if !quote_store.delete_quote(id)? {
        return Err(ApiError::NotFound("Quote"));
    }
    Ok(Json(json!({ "message": "Quote deleted" })).into_response())
}

async fn toggle_vote(
    session: Session,
    quote_store: GuardedQuoteStore,
    quote_id: i64,
    kind: VoteKind,
) -> Result<Response, ApiError> {
    match quote_store.toggle_vote(quote_id, session.user_id, kind)? {
        Some(quote) => Ok(Json(quote).into_response()),
        None => Err(ApiError::NotFound("Quote")),
    }
}

async fn like_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    toggle_vote(session, quote_store, id, VoteKind::Like).await
}

async fn dislike_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    toggle_vote(session, quote_store, id, VoteKind::Dislike).await
}

async fn verify_quote(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let quote = quote_store
        .get_quote(id)?
        .ok_or(ApiError::NotFound("Quote"))?;
    policy::authorize(
        policy::QuoteAction::Verify,
        &quote,
        session.user_id,
        session.role,
    )?;

    let updated = quote_store
        .toggle_verified(id)?
        .ok_or(ApiError::NotFound("Quote"))?;
    Ok(Json(updated).into_response())
}

async fn create_comment(
    session: Session,
    State(quote_store): State<GuardedQuoteStore>,
    Json(body): Json<CommentBody>,
) -> Result<Response, ApiError> {
    let comment = quote_store.insert_comment(NewComment {
        content: body.content,
        author_id: session.user_id,
        quote_id: body.quote_id,
    })?;
    Ok(Json(comment).into_response())
}

async fn get_quote_comments(
    State(state): State<ServerState>,
    Path(quote_id): Path<i64>,
) -> Result<Json<Vec<CommentWithAuthor>>, ApiError> {
    let comments = state.quote_store.get_quote_comments(quote_id)?;

    let mut expanded = Vec::with_capacity(comments.len());
    for comment in comments {
        let user = state.user_store.get_user(comment.author_id)?;
        expanded.push(CommentWithAuthor {
            id: comment.id,
            content: comment.content,
            user,
            quote: comment.quote_id,
            created_at: comment.created_at,
        });
    }
    Ok(Json(expanded))
}

pub fn make_app(
    config: ServerConfig,
    user_store: GuardedUserStore,
    quote_store: GuardedQuoteStore,
    token_service: TokenService,
) -> Router {
    let state = ServerState {
        config,
        start_time: Instant::now(),
        user_store,
        quote_store,
        token_service: Arc::new(token_service),
    };

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(state.clone());

    let quote_routes: Router = Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route("/{id}", get(get_quote).put(update_quote).delete(delete_quote))
        .route("/{id}/like", post(like_quote))
        .route("/{id}/dislike", post(dislike_quote))
        .route("/{id}/verify", put(verify_quote))
        .with_state(state.clone());

    let comment_routes: Router = Router::new()
        .route("/", post(create_comment))
        .route("/{quote_id}", get(get_quote_comments))
        .with_state(state.clone());

    Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .nest("/auth", auth_routes)
        .nest("/quotes", quote_routes)
        .nest("/comments", comment_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(
    config: ServerConfig,
    user_store: GuardedUserStore,
    quote_store: GuardedQuoteStore,
    token_service: TokenService,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, user_store, quote_store, token_service);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
