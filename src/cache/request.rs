use std::collections::BTreeSet;

use http::Method;

/// What the render cache needs to know about the incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    method: Method,
    has_query: bool,
    has_params: bool,
    authenticated: bool,
    cookies: BTreeSet<String>,
    language: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestContext {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            has_query: false,
            has_params: false,
            authenticated: false,
            cookies: BTreeSet::new(),
            language: None,
        }
    }

    pub fn get() -> Self {
        Self::default()
    }

    pub fn with_query(mut self) -> Self {
        self.has_query = true;
        self
    }

    /// Route parameters beyond the path identifying the entity.
    pub fn with_params(mut self) -> Self {
        self.has_params = true;
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>) -> Self {
        self.cookies.insert(name.into());
        self
    }

    pub fn with_language(mut self, code: impl Into<String>) -> Self {
        self.language = Some(code.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains(name)
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// GET or HEAD without query string or extra route parameters.
    pub fn is_cacheable_shape(&self) -> bool {
        (self.method == Method::GET || self.method == Method::HEAD)
            && !self.has_query
            && !self.has_params
    }

    /// Whether output that consulted auth or these cookies would differ
    /// for this request.
    pub fn is_private(&self, uses_auth: bool, uses_cookies: &BTreeSet<String>) -> bool {
        (uses_auth && self.authenticated) || uses_cookies.iter().any(|name| self.has_cookie(name))
    }
}
