use crate::errors::AppError;
use crate::ledger::date_key;
use crate::models::{
    Action, ActionRequest, CounterResponse, HistoryEntry, HistoryResponse, Ledger,
};
use crate::state::AppState;
use crate::storage::persist_ledger;
use crate::ui::{day_label, render_index};
use axum::{
    extract::State,
    response::{Html, Redirect},
    Json,
};
use chrono::Utc;
use tracing::{debug, error, info};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let date = date_key(Utc::now());
    let ledger = state.ledger.lock().await;
    Html(render_index(&ledger, &date))
}

pub async fn get_today(State(state): State<AppState>) -> Json<CounterResponse> {
    let date = date_key(Utc::now());
    let ledger = state.ledger.lock().await;
    Json(to_response(&ledger, date))
}

pub async fn get_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let ledger = state.ledger.lock().await;
    Json(to_history(&ledger))
}

pub async fn action(
    State(state): State<AppState>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<CounterResponse>, AppError> {
    let action = payload
        .action
        .trim()
        .parse::<Action>()
        .map_err(AppError::bad_request)?;

    Ok(Json(apply_action(&state, action).await))
}

pub async fn increment(State(state): State<AppState>) -> Redirect {
    apply_action(&state, Action::Increment).await;
    Redirect::to("/")
}

pub async fn decrement(State(state): State<AppState>) -> Redirect {
    apply_action(&state, Action::Decrement).await;
    Redirect::to("/")
}

pub async fn reset(State(state): State<AppState>) -> Redirect {
    apply_action(&state, Action::Reset).await;
    Redirect::to("/")
}

async fn apply_action(state: &AppState, action: Action) -> CounterResponse {
    let now = Utc::now();
    let mut ledger = state.ledger.lock().await;
    let applied = match action {
        Action::Increment => {
            ledger.increment_at(now);
            true
        }
        Action::Decrement => ledger.decrement_at(now).is_some(),
        // Reset is offered only while there is something to clear.
        Action::Reset if ledger.can_reset() => {
            ledger.reset_at(now);
            true
        }
        Action::Reset => false,
    };

    if applied {
        info!(%action, total = ledger.total_count, "applied counter action");
        if let Err(err) = persist_ledger(&state.data_path, &ledger).await {
            error!("failed to persist ledger: {err}");
        }
    } else {
        debug!(%action, "ignored counter action at zero");
    }

    to_response(&ledger, date_key(now))
}

fn to_response(ledger: &Ledger, date: String) -> CounterResponse {
    CounterResponse {
        today_total: ledger.total_on(&date),
        date,
        total_count: ledger.total_count,
        can_decrement: ledger.can_decrement(),
        can_reset: ledger.can_reset(),
    }
}

fn to_history(ledger: &Ledger) -> HistoryResponse {
    let entries = ledger
        .history_with_totals()
        .into_iter()
        .map(|row| HistoryEntry {
            label: day_label(&row.date),
            date: row.date,
            daily_count: row.daily_count,
            running_total: row.running_total,
        })
        .collect();
    HistoryResponse { entries }
}
