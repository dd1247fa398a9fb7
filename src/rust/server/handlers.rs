use std::collections::BTreeMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::history::{PredictionRecord, UserRef};
use crate::llm::{prompts, section_details};

pub const ROOT_MESSAGE: &str = "Lifeline API is up and running!";

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub email: Option<String>,
    pub uid: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub disease: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SymptomsResponse {
    pub symptoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub run_id: Option<String>,
    pub vocabulary_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsRequest {
    #[serde(default)]
    pub disease: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailsResponse {
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<PredictionRecord>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let bundle = state.bundle.as_deref();
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: bundle.is_some(),
        run_id: bundle.and_then(|b| b.run_id().map(str::to_string)),
        vocabulary_size: bundle.map(|b| b.vocabulary().len()),
    })
}

pub async fn get_symptoms(
    State(state): State<AppState>,
) -> Result<Json<SymptomsResponse>, ApiError> {
    let bundle = state.bundle()?;
    Ok(Json(SymptomsResponse {
        symptoms: bundle.vocabulary().symptoms().to_vec(),
    }))
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let request = json_body(payload)?;
    let bundle = state.bundle()?;

    info!("Prediction requested for {} reported symptoms", request.symptoms.len());
    let prediction = bundle.predict(&request.symptoms)?;

    if let Some(user) = UserRef::resolve(request.email.as_deref(), request.uid.as_deref()) {
        let record = PredictionRecord::new(prediction.disease.clone(), prediction.symptoms.clone());
        if let Err(e) = state.history.append(&user, record).await {
            warn!("Could not record prediction history for {:?}: {}", user, e);
        }
    }

    Ok(Json(PredictResponse {
        disease: prediction.disease,
    }))
}

pub async fn details(
    State(state): State<AppState>,
    payload: Result<Json<DetailsRequest>, JsonRejection>,
) -> Result<Json<DetailsResponse>, ApiError> {
    let request = json_body(payload)?;
    let disease = request.disease.trim();
    if disease.is_empty() {
        return Err(ApiError::InvalidRequest("No disease provided".into()));
    }

    let llm = state.llm()?;
    let text = llm.generate(&prompts::disease_details(disease)).await?;
    Ok(Json(DetailsResponse {
        details: section_details(&text),
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let request = json_body(payload)?;
    let message = request.message.trim();
    if message.is_empty() {
        let body = ChatResponse {
            response: "Please enter a message.".to_string(),
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let llm = state.llm()?;
    let response = llm.generate(&prompts::chat(message)).await?;
    Ok(Json(ChatResponse { response }).into_response())
}

pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let user = UserRef::resolve(query.email.as_deref(), None)
        .ok_or_else(|| ApiError::InvalidRequest("Email is required".into()))?;
    let history = state.history.recent(&user).await?;
    Ok(Json(HistoryResponse { history }))
}
