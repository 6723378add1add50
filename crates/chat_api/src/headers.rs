use std::collections::BTreeMap;

use crate::config::ChatApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Build a deterministic header map for chat transport requests.
///
/// The accept header advertises both supported response variants so the
/// backend may answer with either a true event stream or a single-shot
/// JSON body.
pub fn build_headers(config: &ChatApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(
        HEADER_ACCEPT.to_owned(),
        "text/event-stream, application/json".to_owned(),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );

    if let Some(user_agent) = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        headers.insert(HEADER_USER_AGENT.to_owned(), user_agent.to_owned());
    }

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}
