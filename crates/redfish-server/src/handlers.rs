use axum::Json;
use redfish_auth::AuthorizedResource;
use serde_json::Value;

/// Returns the public representation of the authorized resource.
pub async fn get_resource(AuthorizedResource(resource): AuthorizedResource) -> Json<Value> {
    Json(resource.public_view())
}
