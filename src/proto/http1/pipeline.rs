use std::collections::VecDeque;

/// A request written to the stream whose response has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    method: String,
    target: String,
    headers: Vec<(String, Vec<u8>)>,
}

impl PendingRequest {
    pub(crate) fn new(method: &str, target: &str, headers: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            method: method.to_owned(),
            target: target.to_owned(),
            headers,
        }
    }

    /// the request method as written
    pub fn method(&self) -> &str {
        &self.method
    }

    /// the request target as written
    pub fn target(&self) -> &str {
        &self.target
    }

    /// the headers written with the request, in wire order
    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }

    /// responses to HEAD never carry a body, whatever their headers say
    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Requests in flight on one connection, oldest first.
#[derive(Debug, Default)]
pub struct Pipeline {
    queue: VecDeque<PendingRequest>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: PendingRequest) {
        self.queue.push_back(request);
    }

    /// the request the next response answers
    pub fn pop(&mut self) -> Option<PendingRequest> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// drop every record, returning how many there were
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }
}
