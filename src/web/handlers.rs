use super::models::{ApiMessage, VnfRequest, VnfResponse, VnfResponses};
use super::{AppState, WebError, WebResult};
use crate::core::{VnfCommand, VnfError};
use axum::Json;
use axum::extract::{Path, State};
use http::StatusCode;

pub async fn healthcheck() -> Json<ApiMessage> {
    Json(ApiMessage::new("ok"))
}

/// `POST /vnf/:id`
pub async fn create_vnf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VnfRequest>,
) -> WebResult<(StatusCode, Json<ApiMessage>)> {
    let name = request_name(&id, &request)?;

    state
        .mgr
        .dispatch(&name, VnfCommand::Create { attr: request.args })
        .get()
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiMessage::new(format!("VNF {name} created successfully"))),
    ))
}

/// `POST /vnf/update/:id`. The body names the VNF; the path id is informational.
pub async fn update_vnf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VnfRequest>,
) -> WebResult<Json<ApiMessage>> {
    let name = request_name(&id, &request)?;

    state
        .mgr
        .dispatch(&name, VnfCommand::Update { args: request.args })
        .get()
        .await?;

    Ok(Json(ApiMessage::new(format!(
        "VNF {name} updated successfully"
    ))))
}

/// `DELETE /vnf/:id`
pub async fn delete_vnf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<ApiMessage>> {
    state
        .mgr
        .dispatch(
            &id,
            VnfCommand::Delete {
                args: "delete".to_string(),
            },
        )
        .get()
        .await?;

    Ok(Json(ApiMessage::new(format!(
        "VNF {id} deleted successfully"
    ))))
}

/// `GET /vnf/:id`
pub async fn get_vnf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> WebResult<Json<VnfResponse>> {
    let snapshot = state
        .mgr
        .get(&id)?
        .ok_or(VnfError::NotFound { name: id })?;
    Ok(Json(VnfResponse::from(&snapshot)))
}

/// `GET /vnfs`
pub async fn list_vnfs(State(state): State<AppState>) -> WebResult<Json<VnfResponses>> {
    let vnfs = state
        .mgr
        .list()?
        .iter()
        .map(VnfResponse::from)
        .collect();
    Ok(Json(vnfs))
}

fn request_name(id: &str, request: &VnfRequest) -> WebResult<String> {
    let name = if request.name.trim().is_empty() {
        id
    } else {
        request.name.as_str()
    };
    if name.trim().is_empty() {
        return Err(WebError::Input("VNF name must not be empty".to_string()));
    }
    Ok(name.to_string())
}
