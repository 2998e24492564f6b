//! Profile routes (session-gated)
//!
//! The contract-backed surface: dashboard registration, profile reads and
//! item stacking, plus grant/revoke of read access.

use alloy::primitives::Address;
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::SessionClaims;
use crate::chain::{AccessChange, ChainItem, ChainUserInfo, ItemDraft};
use crate::routes::authenticate;
use crate::routes::respond::{self, query_param, BoxBody};
use crate::server::AppState;
use crate::types::{LightstreamsError, Result};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterAttrs {
    pub profile_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StackItemAttrs {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Permissioned file contract address
    pub meta: Option<String>,
    pub acl: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessAttrs {
    pub item_id: Option<u64>,
    pub to: Option<String>,
}

pub async fn handle(req: Request<Incoming>, state: Arc<AppState>) -> Response<BoxBody> {
    let claims = match authenticate(&state, &req) {
        Ok(claims) => claims,
        Err(e) => return respond::error_response(&e),
    };

    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    let result = match (req.method().clone(), path.as_str()) {
        (Method::POST, "/profile/register") => {
            match respond::parse_json_body::<RegisterAttrs>(req).await {
                Ok(attrs) => register(&state, &claims, &attrs).await,
                Err(e) => Err(e),
            }
        }
        (Method::GET, "/profile/me") => me(&state, &claims).await,
        (Method::GET, "/profile/items") => items(&state, &claims).await,
        (Method::GET, "/profile/item") => item(&state, &claims, query.as_deref()).await,
        (Method::GET, "/profile/find-user") => find_user(&state, query.as_deref()).await,
        (Method::POST, "/profile/stack-item") => {
            match respond::parse_json_body::<StackItemAttrs>(req).await {
                Ok(attrs) => stack_item(&state, &claims, attrs).await,
                Err(e) => Err(e),
            }
        }
        (Method::POST, "/profile/grant-read-access") => {
            match respond::parse_json_body::<AccessAttrs>(req).await {
                Ok(attrs) => access_change(&state, &claims, &attrs, true).await,
                Err(e) => Err(e),
            }
        }
        (Method::POST, "/profile/revoke-access") => {
            match respond::parse_json_body::<AccessAttrs>(req).await {
                Ok(attrs) => access_change(&state, &claims, &attrs, false).await,
                Err(e) => Err(e),
            }
        }
        _ => return respond::json_error(StatusCode::NOT_FOUND, "Profile endpoint not found"),
    };

    match result {
        Ok(response) => response,
        Err(e) => respond::error_response(&e),
    }
}

fn owner_address(claims: &SessionClaims) -> Result<Address> {
    claims.eth_address.parse().map_err(|_| {
        LightstreamsError::Internal(format!("Stored eth address is invalid: {}", claims.eth_address))
    })
}

fn parse_address(value: Option<&str>, field: &str) -> Result<Address> {
    let raw = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LightstreamsError::BadInput(format!("Missing required field: {}", field)))?;
    raw.parse()
        .map_err(|_| LightstreamsError::BadInput(format!("Invalid address in field: {}", field)))
}

/// Register the caller on the dashboard contract
async fn register(
    state: &AppState,
    claims: &SessionClaims,
    attrs: &RegisterAttrs,
) -> Result<Response<BoxBody>> {
    let owner = owner_address(claims)?;
    let profile = parse_address(attrs.profile_address.as_deref(), "profileAddress")?;

    let dashboard = state
        .contracts
        .create_user(owner, &claims.username, profile)
        .await?;

    info!(username = %claims.username, "Registered profile on dashboard");
    Ok(respond::json_data(&serde_json::json!({
        "dashboard": dashboard
    })))
}

/// Dashboard record for the caller
async fn me(state: &AppState, claims: &SessionClaims) -> Result<Response<BoxBody>> {
    let owner = owner_address(claims)?;
    let record: ChainUserInfo = state.contracts.retrieve_user_info(owner).await?;
    Ok(respond::json_data(&record))
}

/// Every item stacked on the caller's profile
///
/// Item ids are assigned contiguously from 1, so the listing walks up to
/// the profile's last id. Slots that read back empty are skipped rather
/// than failing the whole listing.
async fn items(state: &AppState, claims: &SessionClaims) -> Result<Response<BoxBody>> {
    let owner = owner_address(claims)?;
    let profile = profile_of(state, owner).await?;

    let last = state.contracts.last_item_id(profile).await?;
    let mut items = Vec::new();
    for item_id in 1..=last {
        match state.contracts.retrieve_item_by_id(profile, item_id).await {
            Ok(item) => items.push(item),
            Err(LightstreamsError::ItemNotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(respond::json_data(&items))
}

/// Resolve a username to its account address via the dashboard
async fn find_user(state: &AppState, query: Option<&str>) -> Result<Response<BoxBody>> {
    let username = query_param(query, "username")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: username".into()))?;

    let eth_address = state.contracts.find_user(&username).await?;
    Ok(respond::json_data(&serde_json::json!({
        "ethAddress": eth_address
    })))
}

/// One item from the caller's profile, by item_id query parameter
async fn item(
    state: &AppState,
    claims: &SessionClaims,
    query: Option<&str>,
) -> Result<Response<BoxBody>> {
    let item_id: u64 = query_param(query, "item_id")
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: item_id".into()))?
        .parse()
        .map_err(|_| LightstreamsError::BadInput("item_id must be an integer".into()))?;

    let owner = owner_address(claims)?;
    let profile = profile_of(state, owner).await?;

    let item: ChainItem = state.contracts.retrieve_item_by_id(profile, item_id).await?;
    Ok(respond::json_data(&item))
}

/// Stack a new item on the caller's profile
///
/// The password authenticates the transient account unlock for this one
/// transaction; it is never stored.
async fn stack_item(
    state: &AppState,
    claims: &SessionClaims,
    attrs: StackItemAttrs,
) -> Result<Response<BoxBody>> {
    let title = attrs
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: title".into()))?;
    let password = attrs
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: password".into()))?;
    let meta = parse_address(attrs.meta.as_deref(), "meta")?;
    let acl = parse_address(attrs.acl.as_deref(), "acl")?;

    let owner = owner_address(claims)?;
    let profile = profile_of(state, owner).await?;

    let item_id = state
        .contracts
        .stack_item(
            owner,
            &password,
            profile,
            ItemDraft {
                title,
                description: attrs.description.unwrap_or_default(),
                meta,
                acl,
            },
        )
        .await?;

    Ok(respond::json_data(&serde_json::json!({ "itemId": item_id })))
}

/// Grant or revoke read access; the on-chain outcome is surfaced verbatim
async fn access_change(
    state: &AppState,
    claims: &SessionClaims,
    attrs: &AccessAttrs,
    grant: bool,
) -> Result<Response<BoxBody>> {
    let item_id = attrs
        .item_id
        .ok_or_else(|| LightstreamsError::BadInput("Missing required field: itemId".into()))?;
    let to = parse_address(attrs.to.as_deref(), "to")?;
    let owner = owner_address(claims)?;

    let outcome: AccessChange = if grant {
        state.contracts.grant_read_access(owner, item_id, to).await?
    } else {
        state.contracts.revoke_access(owner, item_id, to).await?
    };

    Ok(respond::json_data(&serde_json::json!({ "outcome": outcome })))
}

/// Resolve the caller's profile contract from the dashboard
async fn profile_of(state: &AppState, owner: Address) -> Result<Address> {
    let record = state.contracts.retrieve_user_info(owner).await?;
    if record.profile_address == Address::ZERO {
        return Err(LightstreamsError::ItemNotFound(
            "No profile registered for account".into(),
        ));
    }
    Ok(record.profile_address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Contracts;
    use crate::test_support::{test_state, MockContracts, MockGateway, MOCK_ACCOUNT};
    use uuid::Uuid;

    fn claims() -> SessionClaims {
        SessionClaims {
            sub: Uuid::new_v4(),
            username: "alice".into(),
            eth_address: MOCK_ACCOUNT.into(),
            iat: 0,
            exp: u64::MAX,
        }
    }

    fn beneficiary() -> &'static str {
        "0x00000000000000000000000000000000000000bb"
    }

    #[tokio::test]
    async fn test_grant_then_revoke_restores_permission_set() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let before = contracts.grant_set();

        let attrs = AccessAttrs {
            item_id: Some(3),
            to: Some(beneficiary().into()),
        };
        access_change(&state, &claims(), &attrs, true).await.unwrap();
        assert_ne!(contracts.grant_set(), before);

        access_change(&state, &claims(), &attrs, false).await.unwrap();
        assert_eq!(contracts.grant_set(), before);
    }

    #[tokio::test]
    async fn test_duplicate_grant_outcome_is_surfaced() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));
        let owner: Address = MOCK_ACCOUNT.parse().unwrap();
        let to: Address = beneficiary().parse().unwrap();

        let first = contracts.grant_read_access(owner, 3, to).await.unwrap();
        assert_eq!(first, AccessChange::Applied);

        let second = contracts.grant_read_access(owner, 3, to).await.unwrap();
        assert_eq!(second, AccessChange::Reverted);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_collaborators() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let err = access_change(&state, &claims(), &AccessAttrs::default(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, LightstreamsError::BadInput(_)));

        let err = stack_item(&state, &claims(), StackItemAttrs::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LightstreamsError::BadInput(_)));

        assert_eq!(contracts.call_count(), 0);
    }

    #[tokio::test]
    async fn test_items_walks_up_to_last_id() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let response = items(&state, &claims()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // One resolve call, one last-id call, one read per item
        assert_eq!(contracts.call_count(), 2 + 7);
    }

    #[tokio::test]
    async fn test_find_user_requires_username() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let err = find_user(&state, None).await.unwrap_err();
        assert!(matches!(err, LightstreamsError::BadInput(_)));
        assert_eq!(contracts.call_count(), 0);

        let response = find_user(&state, Some("username=alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_item_is_not_found() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let err = item(&state, &claims(), Some("item_id=404")).await.unwrap_err();
        assert!(matches!(err, LightstreamsError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_stack_item_returns_event_assigned_id() {
        let contracts = Arc::new(MockContracts::default());
        let state = test_state(Arc::new(MockGateway::default()), Arc::clone(&contracts));

        let attrs = StackItemAttrs {
            title: Some("a title".into()),
            description: Some("a description".into()),
            meta: Some(beneficiary().into()),
            acl: Some(beneficiary().into()),
            password: Some("hunter2".into()),
        };
        let response = stack_item(&state, &claims(), attrs).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
