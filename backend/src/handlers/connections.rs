use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ConnectionError;
use crate::models::{Connection, ConnectionView};
use crate::services::connections::{
    ConnectionService, ConnectionStats, FriendSuggestion, LandingOutcome, ShareableLink,
};
use crate::services::links::ConnectionLink;

type ApiResult<T> = Result<T, ConnectionError>;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub user_id: String,
    #[serde(default)]
    pub user_name: Option<String>,
}

/// Mint a shareable link (and QR payload) for the caller.
pub async fn create_link(
    State(service): State<ConnectionService>,
    Json(req): Json<CreateLinkRequest>,
) -> ApiResult<Json<ShareableLink>> {
    Ok(Json(service.create_shareable_link(&req.user_id, req.user_name.as_deref())?))
}

#[derive(Debug, Deserialize)]
pub struct ParseLinkRequest {
    pub link: String,
}

/// Decode a link without acting on it. Always succeeds.
pub async fn parse_link(
    State(service): State<ConnectionService>,
    Json(req): Json<ParseLinkRequest>,
) -> Json<ConnectionLink> {
    Json(service.parse_connection_link(&req.link))
}

#[derive(Debug, Deserialize)]
pub struct ResolveLinkRequest {
    pub link: String,
    pub viewer_id: String,
}

/// Landing flow: the viewer opened someone else's link.
pub async fn resolve_link(
    State(service): State<ConnectionService>,
    Json(req): Json<ResolveLinkRequest>,
) -> ApiResult<(StatusCode, Json<LandingOutcome>)> {
    let outcome = service.resolve_connection_link(&req.link, &req.viewer_id).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub requester_id: String,
    pub recipient_id: String,
}

pub async fn send_request(
    State(service): State<ConnectionService>,
    Json(req): Json<SendRequest>,
) -> ApiResult<(StatusCode, Json<Connection>)> {
    let connection = service
        .send_friend_request(&req.requester_id, &req.recipient_id)
        .await?;

    Ok((StatusCode::CREATED, Json(connection)))
}

pub async fn get_connection(
    State(service): State<ConnectionService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    Ok(Json(service.get_connection(id).await?))
}

pub async fn accept_request(
    State(service): State<ConnectionService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    Ok(Json(service.accept_friend_request(id).await?))
}

pub async fn decline_request(
    State(service): State<ConnectionService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Connection>> {
    Ok(Json(service.decline_friend_request(id).await?))
}

/// Pending requests addressed to the user.
pub async fn list_pending(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    Ok(Json(service.list_pending_requests(&user_id).await?))
}

/// Accepted connections on either side.
pub async fn list_friends(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    Ok(Json(service.list_accepted_connections(&user_id).await?))
}

/// Requests the user sent that nobody has answered yet.
pub async fn list_sent(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    Ok(Json(service.list_sent_requests(&user_id).await?))
}

pub async fn list_history(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<ConnectionView>>> {
    Ok(Json(service.list_connection_history(&user_id).await?))
}

pub async fn list_suggestions(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<FriendSuggestion>>> {
    Ok(Json(service.suggest_friends(&user_id).await?))
}

pub async fn get_stats(
    State(service): State<ConnectionService>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ConnectionStats>> {
    Ok(Json(service.connection_stats(&user_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use crate::db::{InMemoryConnectionStore, InMemoryUserDirectory};
    use crate::models::ConnectionStatus;
    use crate::services::links::LinkBuilder;
    use std::sync::Arc;

    fn state() -> State<ConnectionService> {
        State(ConnectionService::new(
            Arc::new(InMemoryConnectionStore::new()),
            Arc::new(InMemoryUserDirectory::with_demo_users()),
            LinkBuilder::new("https://bridger.example").unwrap(),
        ))
    }

    fn status_of(error: ConnectionError) -> StatusCode {
        error.into_response().status()
    }

    #[tokio::test]
    async fn test_create_link_requires_user() {
        let result = create_link(
            state(),
            Json(CreateLinkRequest {
                user_id: "  ".into(),
                user_name: None,
            }),
        )
        .await;

        assert_eq!(status_of(result.unwrap_err()), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_then_resolve_link() {
        let state = state();
        let Json(shared) = create_link(
            State(state.0.clone()),
            Json(CreateLinkRequest {
                user_id: "fox_red_user_123".into(),
                user_name: Some("Fox Red".into()),
            }),
        )
        .await
        .unwrap();

        let Json(parsed) = parse_link(
            State(state.0.clone()),
            Json(ParseLinkRequest {
                link: shared.link.clone(),
            }),
        )
        .await;
        assert_eq!(parsed.user_name.as_deref(), Some("Fox Red"));

        let (status, Json(outcome)) = resolve_link(
            State(state.0.clone()),
            Json(ResolveLinkRequest {
                link: shared.link,
                viewer_id: "whale_deep_user_101".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome.connection.status, ConnectionStatus::Pending);

        let Json(pending) = list_pending(State(state.0.clone()), Path("whale_deep_user_101".into()))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_request_lifecycle_status_codes() {
        let state = state();
        let send = || {
            send_request(
                State(state.0.clone()),
                Json(SendRequest {
                    requester_id: "fox_red_user_123".into(),
                    recipient_id: "whale_deep_user_101".into(),
                }),
            )
        };

        let (status, Json(connection)) = send().await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(status_of(send().await.unwrap_err()), StatusCode::CONFLICT);

        let Json(accepted) = accept_request(State(state.0.clone()), Path(connection.id))
            .await
            .unwrap();
        assert_eq!(accepted.status, ConnectionStatus::Accepted);

        let err = decline_request(State(state.0.clone()), Path(connection.id))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::CONFLICT);

        let err = get_connection(State(state.0.clone()), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);

        let Json(friends) = list_friends(State(state.0.clone()), Path("whale_deep_user_101".into()))
            .await
            .unwrap();
        assert_eq!(friends[0].counterpart_name, "Fox Red");
    }

    #[tokio::test]
    async fn test_self_request_is_bad_request() {
        let err = send_request(
            state(),
            Json(SendRequest {
                requester_id: "fox_red_user_123".into(),
                recipient_id: "fox_red_user_123".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_link_is_bad_request() {
        let err = resolve_link(
            state(),
            Json(ResolveLinkRequest {
                link: "https://bridger.example/connect?code=abc".into(),
                viewer_id: "whale_deep_user_101".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_ids_in_bodies_are_bad_request() {
        let err = send_request(
            state(),
            Json(SendRequest {
                requester_id: "fox_red_user_123".into(),
                recipient_id: "".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);

        let err = resolve_link(
            state(),
            Json(ResolveLinkRequest {
                link: "https://bridger.example/connect?code=abc&user=fox_red_user_123".into(),
                viewer_id: " ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ConnectionError::MissingUserId("viewer_id")));
    }

    #[tokio::test]
    async fn test_per_user_overview_handlers() {
        let state = state();
        let (_, Json(declined)) = send_request(
            State(state.0.clone()),
            Json(SendRequest {
                requester_id: "fox_red_user_123".into(),
                recipient_id: "whale_deep_user_101".into(),
            }),
        )
        .await
        .unwrap();
        decline_request(State(state.0.clone()), Path(declined.id)).await.unwrap();
        send_request(
            State(state.0.clone()),
            Json(SendRequest {
                requester_id: "whale_deep_user_101".into(),
                recipient_id: "fox_red_user_123".into(),
            }),
        )
        .await
        .unwrap();

        let whale = || Path("whale_deep_user_101".to_string());

        let Json(sent) = list_sent(State(state.0.clone()), whale()).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].counterpart_name, "Fox Red");

        let Json(history) = list_history(State(state.0.clone()), whale()).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].connection.status, ConnectionStatus::Declined);

        let Json(suggestions) = list_suggestions(State(state.0.clone()), whale()).await.unwrap();
        assert_eq!(suggestions.len(), 4);
        assert!(suggestions.iter().all(|s| s.user_id != "fox_red_user_123"));

        let Json(stats) = get_stats(State(state.0.clone()), whale()).await.unwrap();
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.sent_requests, 1);
        assert_eq!(stats.declined_connections, 1);
    }
}
