//! In-process mock backend.
//!
//! Routes are registered by method and path pattern (`:name` segments match
//! any single segment). Each route replays a queue of canned responses; the
//! last one repeats forever. Every request is recorded for inspection.
//! Unmatched requests get a 404, like a real server.

use crate::services::transport::{Method, PreparedRequest, RawResponse, Transport};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A canned reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Answer with a status and optional JSON body.
    Reply {
        status: u16,
        body: Option<serde_json::Value>,
        delay: Option<Duration>,
    },
    /// Fail at the transport level (connection refused, timeout...).
    NetworkError(String),
}

impl MockResponse {
    /// 200 with a JSON body.
    pub fn json(body: serde_json::Value) -> Self {
        Self::Reply {
            status: 200,
            body: Some(body),
            delay: None,
        }
    }

    /// Empty response with the given status.
    pub fn status(status: u16) -> Self {
        Self::Reply {
            status,
            body: None,
            delay: None,
        }
    }

    /// Given status with a JSON body.
    pub fn status_json(status: u16, body: serde_json::Value) -> Self {
        Self::Reply {
            status,
            body: Some(body),
            delay: None,
        }
    }

    /// Transport failure.
    pub fn network_error(message: &str) -> Self {
        Self::NetworkError(message.to_string())
    }

    /// Delay the reply, simulating a slow backend.
    pub fn after(self, wait: Duration) -> Self {
        match self {
            Self::Reply { status, body, .. } => Self::Reply {
                status,
                body,
                delay: Some(wait),
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Param,
}

#[derive(Debug)]
struct Route {
    method: Method,
    pattern: String,
    segments: Vec<Segment>,
    responses: VecDeque<MockResponse>,
}

impl Route {
    fn matches(&self, method: &Method, path: &[&str]) -> bool {
        self.method == *method
            && self.segments.len() == path.len()
            && self.segments.iter().zip(path).all(|(seg, part)| match seg {
                Segment::Literal(lit) => lit == part,
                Segment::Param => true,
            })
    }

    fn literal_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    fn next_response(&mut self) -> MockResponse {
        if self.responses.len() > 1 {
            if let Some(response) = self.responses.pop_front() {
                return response;
            }
        }
        self.responses
            .front()
            .cloned()
            .unwrap_or_else(|| MockResponse::status(404))
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    split_path(pattern)
        .into_iter()
        .map(|s| match s.strip_prefix(':') {
            Some(_) => Segment::Param,
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

/// Mock backend implementing [`Transport`].
#[derive(Debug, Default)]
pub struct MockServer {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<PreparedRequest>>,
}

impl MockServer {
    /// Create a server with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route answering every call with `response`.
    ///
    /// Registering the same method and pattern again replaces the route.
    pub fn on(&self, method: Method, pattern: &str, response: MockResponse) -> &Self {
        self.on_sequence(method, pattern, vec![response])
    }

    /// Register a route replaying `responses` in order.
    pub fn on_sequence(
        &self,
        method: Method,
        pattern: &str,
        responses: Vec<MockResponse>,
    ) -> &Self {
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        routes.retain(|r| !(r.method == method && r.pattern == pattern));
        routes.push(Route {
            method,
            pattern: pattern.to_string(),
            segments: parse_pattern(pattern),
            responses: responses.into(),
        });
        self
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Requests received for one method and exact path.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<PreparedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn next_response(&self, method: &Method, path: &str) -> Option<MockResponse> {
        let parts = split_path(path);
        let mut routes = self.routes.lock().unwrap_or_else(|e| e.into_inner());
        let mut best: Option<usize> = None;
        for (index, route) in routes.iter().enumerate() {
            if !route.matches(method, &parts) {
                continue;
            }
            match best {
                Some(b) if routes[b].literal_count() >= route.literal_count() => {}
                _ => best = Some(index),
            }
        }
        best.map(|index| routes[index].next_response())
    }

    /// Mock of the ticks-based server with an empty library.
    pub fn legacy() -> Self {
        let server = Self::new();
        let empty = || json!({ "Items": [], "TotalRecordCount": 0 });

        server
            .on(
                Method::POST,
                "/Users/AuthenticateByName",
                MockResponse::json(json!({
                    "User": { "Id": "mock-user", "Name": "Demo User", "ServerId": "mock" },
                    "AccessToken": "mock-token",
                    "ServerId": "mock"
                })),
            )
            .on(
                Method::GET,
                "/System/Info/Public",
                MockResponse::json(json!({
                    "Id": "mock",
                    "ServerName": "Mock Server",
                    "Version": env!("CARGO_PKG_VERSION")
                })),
            )
            .on(Method::GET, "/Users/:userId/Views", MockResponse::json(empty()))
            .on(Method::GET, "/Users/:userId/Items/Resume", MockResponse::json(empty()))
            .on(Method::GET, "/Users/:userId/Items/Latest", MockResponse::json(json!([])))
            .on(Method::GET, "/Users/:userId/Items", MockResponse::json(empty()))
            .on(Method::GET, "/Users/:userId/Items/:itemId", MockResponse::status(404))
            .on(
                Method::POST,
                "/Users/:userId/FavoriteItems/:itemId",
                MockResponse::json(json!({ "IsFavorite": true })),
            )
            .on(
                Method::DELETE,
                "/Users/:userId/FavoriteItems/:itemId",
                MockResponse::json(json!({ "IsFavorite": false })),
            )
            .on(
                Method::POST,
                "/Users/:userId/PlayedItems/:itemId",
                MockResponse::json(json!({ "Played": true })),
            )
            .on(Method::POST, "/Sessions/Playing/Progress", MockResponse::status(204))
            .on(Method::POST, "/Sessions/Playing/Stopped", MockResponse::status(204));

        server
    }
}

#[async_trait]
impl Transport for MockServer {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse> {
        let response = self.next_response(&request.method, &request.path);
        tracing::debug!("Mock {} -> {:?}", request.endpoint(), response.is_some());
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        match response {
            Some(MockResponse::Reply {
                status,
                body,
                delay,
            }) => {
                if let Some(wait) = delay {
                    tokio::time::sleep(wait).await;
                }
                let body = match body {
                    Some(value) => serde_json::to_vec(&value)?,
                    None => Vec::new(),
                };
                Ok(RawResponse::new(status, body))
            }
            Some(MockResponse::NetworkError(message)) => Err(Error::other(message)),
            None => Ok(RawResponse::new(404, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_segments_win_over_params() {
        let server = MockServer::legacy();
        let resume = server.next_response(&Method::GET, "/Users/u1/Items/Resume");
        match resume {
            Some(MockResponse::Reply { status, body, .. }) => {
                assert_eq!(status, 200);
                assert!(body.unwrap().get("Items").is_some());
            }
            other => panic!("Unexpected response: {:?}", other),
        }

        let detail = server.next_response(&Method::GET, "/Users/u1/Items/abc");
        assert!(matches!(detail, Some(MockResponse::Reply { status: 404, .. })));
    }

    #[test]
    fn test_sequence_repeats_last() {
        let server = MockServer::new();
        server.on_sequence(
            Method::POST,
            "/x",
            vec![MockResponse::status(500), MockResponse::status(200)],
        );
        let statuses: Vec<u16> = (0..3)
            .map(|_| match server.next_response(&Method::POST, "/x") {
                Some(MockResponse::Reply { status, .. }) => status,
                _ => 0,
            })
            .collect();
        assert_eq!(statuses, vec![500, 200, 200]);
    }

    #[test]
    fn test_unknown_route() {
        let server = MockServer::new();
        assert!(server.next_response(&Method::GET, "/nothing").is_none());
    }
}
