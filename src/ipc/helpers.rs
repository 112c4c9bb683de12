use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ipc::error::{err, ok};
use crate::ipc::types::Request;

/// Deserialize the whole `params` object into a typed request body.
pub fn parse_params<T: DeserializeOwned>(req: &Request) -> Result<T, serde_json::Value> {
    serde_json::from_value(req.params.clone()).map_err(|e| {
        tracing::warn!(id = %req.id, method = %req.method, error = %e, "bad params");
        err(&req.id, "bad_params", e.to_string(), None)
    })
}

/// Serialize a computed model into an ok envelope.
pub fn ok_model<T: Serialize>(req: &Request, model: &T) -> serde_json::Value {
    match serde_json::to_value(model) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "serialize_failed", e.to_string(), None),
    }
}

/// Collapse a handler's `Result` into the response envelope.
pub fn respond(result: Result<serde_json::Value, serde_json::Value>) -> serde_json::Value {
    result.unwrap_or_else(|e| e)
}
