use {reqwest::StatusCode, serde::Deserialize, wagroups_store::Error};

/// Error body returned by Twilio on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Map a failed HTTP response onto the store taxonomy.
pub(crate) fn status_error(status: StatusCode, body: &str, resource: &str) -> Error {
    let api: ApiError = serde_json::from_str(body).unwrap_or_default();
    match status {
        StatusCode::NOT_FOUND => Error::not_found(resource),
        StatusCode::CONFLICT => Error::conflict(resource),
        _ => {
            let message = api
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| body.trim().to_string());
            Error::rejected(Some(status.as_u16()), api.code, message)
        },
    }
}

/// Map a transport failure (connect, timeout, body read) onto the store taxonomy.
pub(crate) fn transport_error(context: &str, source: reqwest::Error) -> Error {
    if source.is_connect() || source.is_timeout() {
        Error::unavailable(format!("{context}: {source}"))
    } else {
        Error::external(context, source)
    }
}
