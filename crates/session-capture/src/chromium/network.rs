use crate::CapturedResponse;
use chromiumoxide::cdp::browser_protocol::network::{
    EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    EventResponseReceivedExtraInfo, Headers,
};
use std::collections::HashMap;

type HeaderMap = HashMap<String, String>;

/// Subset of the DevTools network events needed to see the final response
/// headers.
#[derive(Debug)]
pub(super) enum NetworkEvent {
    Response {
        request_id: String,
        url: String,
        headers: HeaderMap,
        has_extra_info: bool,
    },

    /// Raw headers as they came from the network. Only these contain the
    /// `Set-Cookie` header for cross-origin responses.
    ExtraInfo {
        request_id: String,
        headers: HeaderMap,
    },

    /// The request is done, either successfully or not. No more events for
    /// it will follow, except for a late `ExtraInfo` in rare cases.
    Finished { request_id: String },
}

impl NetworkEvent {
    pub(super) fn response(event: &EventResponseReceived) -> Self {
        Self::Response {
            request_id: event.request_id.inner().clone(),
            url: event.response.url.clone(),
            headers: header_map(&event.response.headers),
            has_extra_info: event.has_extra_info,
        }
    }

    pub(super) fn extra_info(event: &EventResponseReceivedExtraInfo) -> Self {
        Self::ExtraInfo {
            request_id: event.request_id.inner().clone(),
            headers: header_map(&event.headers),
        }
    }

    pub(super) fn loading_finished(event: &EventLoadingFinished) -> Self {
        Self::Finished {
            request_id: event.request_id.inner().clone(),
        }
    }

    pub(super) fn loading_failed(event: &EventLoadingFailed) -> Self {
        Self::Finished {
            request_id: event.request_id.inner().clone(),
        }
    }
}

/// Pairs the two events that DevTools sends for a single response. They may
/// arrive in any order.
#[derive(Default)]
pub(super) struct ResponseMerger {
    responses: HashMap<String, CapturedResponse>,
    extra_info: HashMap<String, HeaderMap>,
}

impl ResponseMerger {
    pub(super) fn push(&mut self, event: NetworkEvent) -> Option<CapturedResponse> {
        match event {
            NetworkEvent::Response {
                request_id,
                url,
                headers,
                has_extra_info,
            } => {
                let mut response = CapturedResponse {
                    url,
                    response_headers: headers,
                };

                if !has_extra_info {
                    return Some(response);
                }

                let Some(raw_headers) = self.extra_info.remove(&request_id) else {
                    self.responses.insert(request_id, response);
                    return None;
                };

                response.response_headers.extend(raw_headers);
                Some(response)
            }
            NetworkEvent::ExtraInfo {
                request_id,
                headers,
            } => {
                let Some(mut response) = self.responses.remove(&request_id) else {
                    self.extra_info.insert(request_id, headers);
                    return None;
                };

                response.response_headers.extend(headers);
                Some(response)
            }
            NetworkEvent::Finished { request_id } => {
                self.extra_info.remove(&request_id);

                // The raw headers never came, so the response is emitted as is
                self.responses.remove(&request_id)
            }
        }
    }
}

fn header_map(headers: &Headers) -> HeaderMap {
    let Some(object) = headers.inner().as_object() else {
        return HeaderMap::new();
    };

    object
        .iter()
        .map(|(name, value)| {
            let value = value
                .as_str()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| value.to_string());

            (name.to_ascii_lowercase(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn response(id: &str, has_extra_info: bool) -> NetworkEvent {
        NetworkEvent::Response {
            request_id: id.to_owned(),
            url: format!("https://example.com/{id}"),
            headers: headers(&[("content-type", "application/json")]),
            has_extra_info,
        }
    }

    fn extra_info(id: &str) -> NetworkEvent {
        NetworkEvent::ExtraInfo {
            request_id: id.to_owned(),
            headers: headers(&[("set-cookie", "sid=1; Path=/")]),
        }
    }

    #[test]
    fn response_without_extra_info_is_emitted_right_away() {
        let mut merger = ResponseMerger::default();
        let response = merger.push(response("a", false)).unwrap();
        assert_eq!(response.url, "https://example.com/a");
        assert!(!response.response_headers.contains_key("set-cookie"));
    }

    #[test]
    fn events_are_merged_in_any_order() {
        let mut merger = ResponseMerger::default();

        assert!(merger.push(response("a", true)).is_none());
        assert!(merger.push(extra_info("b")).is_none());

        let a = merger.push(extra_info("a")).unwrap();
        let b = merger.push(response("b", true)).unwrap();

        for merged in [a, b] {
            assert_eq!(merged.response_headers["set-cookie"], "sid=1; Path=/");
            assert_eq!(merged.response_headers["content-type"], "application/json");
        }

        assert!(merger.responses.is_empty());
        assert!(merger.extra_info.is_empty());
    }

    fn finished(id: &str) -> NetworkEvent {
        NetworkEvent::Finished {
            request_id: id.to_owned(),
        }
    }

    #[test]
    fn parked_response_is_emitted_when_loading_finishes() {
        let mut merger = ResponseMerger::default();

        assert!(merger.push(response("a", true)).is_none());

        let a = merger.push(finished("a")).unwrap();
        assert_eq!(a.url, "https://example.com/a");
        assert!(!a.response_headers.contains_key("set-cookie"));

        assert!(merger.responses.is_empty());
    }

    #[test]
    fn finished_requests_leave_nothing_behind() {
        let mut merger = ResponseMerger::default();

        assert!(merger.push(response("a", false)).is_some());
        assert!(merger.push(finished("a")).is_none());

        assert!(merger.push(extra_info("b")).is_none());
        assert!(merger.push(finished("b")).is_none());

        assert!(merger.push(response("c", true)).is_none());
        assert!(merger.push(extra_info("c")).is_some());
        assert!(merger.push(finished("c")).is_none());

        assert!(merger.responses.is_empty());
        assert!(merger.extra_info.is_empty());
    }

    #[test]
    fn header_names_are_lowercased() {
        let raw = Headers::new(serde_json::json!({
            "Set-Cookie": "sid=1",
            "X-Count": 3,
        }));

        let map = header_map(&raw);

        assert_eq!(map["set-cookie"], "sid=1");
        assert_eq!(map["x-count"], "3");
    }
}
