use serde_json::Value;

/// Ordered query over the children of a collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub order_by: Option<String>,
    pub equal_to: Option<String>,
    pub limit_to_first: Option<usize>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }

    pub fn equal_to(mut self, value: impl Into<String>) -> Self {
        self.equal_to = Some(value.into());
        self
    }

    pub fn limit_to_first(mut self, limit: usize) -> Self {
        self.limit_to_first = Some(limit);
        self
    }

    /// Whether a child document passes the equality constraint.
    ///
    /// `equal_to` applies to the `order_by` field; without an ordering field
    /// every child passes.
    pub fn matches(&self, child: &Value) -> bool {
        match (&self.order_by, &self.equal_to) {
            (Some(field), Some(expected)) => {
                child.get(field).and_then(Value::as_str) == Some(expected.as_str())
            }
            _ => true,
        }
    }

    /// Query string parameters, with ordering values JSON-encoded as the
    /// REST interface expects (`orderBy="mac"`).
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(field) = &self.order_by {
            params.push(("orderBy", Value::from(field.as_str()).to_string()));
        }
        if let Some(value) = &self.equal_to {
            params.push(("equalTo", Value::from(value.as_str()).to_string()));
        }
        if let Some(limit) = self.limit_to_first {
            params.push(("limitToFirst", limit.to_string()));
        }
        params
    }
}
