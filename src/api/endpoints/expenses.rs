//! Expense endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;
use crate::models::Expense;

#[derive(Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

/// `GET /api/expenses`: the clinic's expenses, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
) -> Result<Json<ExpensesResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let expenses = db::get_clinic_expenses(&conn, &clinic.clinic_id)?;
    Ok(Json(ExpensesResponse { expenses }))
}

#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub label: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
}

/// `POST /api/expenses`: record an expense.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Json(body): Json<CreateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    if body.label.trim().is_empty() {
        return Err(ApiError::BadRequest("Label must not be empty".into()));
    }
    if body.amount_cents < 0 {
        return Err(ApiError::BadRequest("Amount must not be negative".into()));
    }

    let expense = Expense {
        id: Uuid::new_v4(),
        clinic_id: clinic.clinic_id,
        label: body.label.trim().to_string(),
        amount_cents: body.amount_cents,
        spent_on: body.spent_on,
        created_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    db::insert_expense(&conn, &expense)?;

    Ok(Json(expense))
}

/// `DELETE /api/expenses/:id`: remove an expense.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(clinic): Extension<ClinicContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest("Invalid expense id".into()))?;

    let conn = ctx.open_db()?;
    db::delete_expense(&conn, &clinic.clinic_id, &id)?;

    Ok(StatusCode::NO_CONTENT)
}
