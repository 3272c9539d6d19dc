//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and a short result summary.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
  extract::{
    rejection::{FormRejection, JsonRejection},
    Form, Query, State,
  },
  http::{header, HeaderMap, HeaderValue},
  response::{Html, IntoResponse, Response},
  Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::Label;
use crate::error::AppError;
use crate::logic::*;
use crate::pages;
use crate::protocol::*;
use crate::scoring::{answers_from_form, answers_from_list};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "tweetrater_session";
pub const SESSION_HEADER: &str = "x-session-id";

/// Session token from the `x-session-id` header or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
  if let Some(v) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
    if !v.trim().is_empty() {
      return Some(v.trim().to_string());
    }
  }
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
    .map(|(_, value)| value.to_string())
}

/// Existing token, or a freshly minted one (second value is true when minted).
fn session_or_new(headers: &HeaderMap) -> (String, bool) {
  match session_token(headers) {
    Some(t) => (t, false),
    None => (Uuid::new_v4().to_string(), true),
  }
}

fn with_session_cookie(mut resp: Response, token: &str) -> Response {
  let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
  if let Ok(v) = HeaderValue::from_str(&cookie) {
    resp.headers_mut().append(header::SET_COOKIE, v);
  }
  resp
}

/// Parse an optional count parameter: default when absent, 1..=max otherwise.
fn parse_count(field: &'static str, raw: Option<&str>, default: usize, max: usize) -> Result<usize, AppError> {
  let Some(raw) = raw else { return Ok(default) };
  match raw.trim().parse::<usize>() {
    Ok(n) if n >= 1 && n <= max => Ok(n),
    _ => Err(AppError::InvalidInput { field, value: raw.to_string() }),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, sessions: state.challenges.session_count().await })
}

#[instrument(level = "info", skip(state))]
pub async fn http_index(State(state): State<Arc<AppState>>) -> Html<String> {
  Html(pages::index_page(&state.config.route_prefix()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_about(State(state): State<Arc<AppState>>) -> Html<String> {
  Html(pages::about_page(&state.config.route_prefix()))
}

#[instrument(level = "info", skip(state, q), fields(tweet_len = ?q.tweet.as_ref().map(|t| t.len())))]
pub async fn http_get_predict(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PredictQuery>,
) -> Result<Json<PredictOut>, AppError> {
  predict_response(&state, q).await
}

/// Form body first, then the query string (`POST /predict/?tweet=...` with no body).
#[instrument(level = "info", skip_all)]
pub async fn http_post_predict(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PredictQuery>,
  form: Result<Form<PredictQuery>, FormRejection>,
) -> Result<Json<PredictOut>, AppError> {
  let from_body = form.ok().and_then(|Form(f)| f.tweet);
  let tweet = from_body.or(q.tweet);
  predict_response(&state, PredictQuery { tweet }).await
}

async fn predict_response(state: &AppState, q: PredictQuery) -> Result<Json<PredictOut>, AppError> {
  let tweet = q.tweet.ok_or(AppError::InputMissing("tweet"))?;
  let result = do_predict(state, &tweet).await?;
  info!(target: "tweetrater", label = %result.label, confidence = result.confidence, "HTTP prediction served");
  Ok(Json(result.into()))
}

/// Challenge page. Loading it starts a fresh, empty challenge for the caller.
#[instrument(level = "info", skip(state, headers))]
pub async fn http_challenge(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
  let (token, minted) = session_or_new(&headers);
  state.challenges.reset_session(&token).await;
  info!(target: "challenge", %token, minted, "Challenge session reset");
  let cfg = &state.config.challenge;
  let page = Html(pages::challenge_page(
    &state.config.route_prefix(),
    cfg.default_training_samples,
    cfg.default_test_samples,
  ))
  .into_response();
  if minted { with_session_cookie(page, &token) } else { page }
}

#[instrument(level = "info", skip(state, q), fields(rating = ?q.rating, n_samples = ?q.n_samples))]
pub async fn http_get_training(
  State(state): State<Arc<AppState>>,
  Query(q): Query<TrainingQuery>,
) -> Result<Json<TrainingOut>, AppError> {
  let raw_rating = q.rating.as_deref().ok_or(AppError::InputMissing("rating"))?;
  let rating = Label::parse(raw_rating)?;
  let cfg = &state.config.challenge;
  let n = parse_count(
    "n_samples",
    q.n_samples.as_deref(),
    cfg.default_training_samples,
    cfg.max_samples_per_request,
  )?;
  let mut rng = StdRng::from_entropy();
  let training_samples = state.challenges.sample_training(rating, n, &mut rng)?;
  info!(target: "challenge", %rating, n, "HTTP training samples served");
  Ok(Json(TrainingOut { training_samples }))
}

#[instrument(level = "info", skip(state, headers, q), fields(n_tweets = ?q.n_tweets, n_samples = ?q.n_samples))]
pub async fn http_get_test(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Query(q): Query<TestQuery>,
) -> Result<Response, AppError> {
  let (field, raw) = match (&q.n_tweets, &q.n_samples) {
    (Some(v), _) => ("n_tweets", Some(v.as_str())),
    (None, Some(v)) => ("n_samples", Some(v.as_str())),
    (None, None) => ("n_tweets", None),
  };
  let cfg = &state.config.challenge;
  let n = parse_count(field, raw, cfg.default_test_samples, cfg.max_samples_per_request)?;

  let (token, minted) = session_or_new(&headers);
  let mut rng = StdRng::from_entropy();
  let batch = state.challenges.sample_test(&token, n, &mut rng).await?;
  info!(target: "challenge", %token, n, "HTTP test tweets served");

  let out = TestOut {
    test_ids: batch.iter().map(|s| s.id).collect(),
    test_tweets: batch.into_iter().map(|s| s.text).collect(),
  };
  let resp = Json(out).into_response();
  Ok(if minted { with_session_cookie(resp, &token) } else { resp })
}

/// Results page for the challenge form (`user-label-{i}` fields, positional).
#[instrument(level = "info", skip_all)]
pub async fn http_post_results(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Html<String>, AppError> {
  let Form(form) = form.map_err(|e| AppError::MalformedRequest(e.body_text()))?;
  let token = session_token(&headers);
  let session = active_session(&state, token.as_deref()).await?;
  let answers = answers_from_form(&form, &session)?;
  let report = score_answers(&state, &session, &answers)?;
  info!(target: "challenge", model_accuracy = report.model_accuracy, user_accuracy = report.user_accuracy, "HTTP results rendered");
  Ok(Html(pages::results_page(&state.config.route_prefix(), &report)))
}

/// JSON scoring with answers keyed by sample id.
#[instrument(level = "info", skip_all)]
pub async fn http_post_api_results(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  body: Result<Json<ResultsIn>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
  let Json(body) = body.map_err(|e| AppError::MalformedRequest(e.body_text()))?;
  let answers = answers_from_list(&body.into_answers()?)?;
  let token = session_token(&headers);
  let session = active_session(&state, token.as_deref()).await?;
  let report = score_answers(&state, &session, &answers)?;
  Ok(Json(report))
}
