use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// First candidate passed validation.
    Valid,
    /// Retries exhausted, or a follow-up candidate failed validation.
    Invalid,
    /// Passed after at least one regeneration.
    Corrected,
    /// The provider explained instead of writing a query.
    OutOfScope,
}

/// One generate/validate/execute attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryStep {
    pub query: String,
    pub validation_status: ValidationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Explanation text for out-of-scope requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub retry_count: u32,
}

impl QueryStep {
    pub fn executed(
        query: impl Into<String>,
        status: ValidationStatus,
        result: Option<Value>,
        error: Option<String>,
        retry_count: u32,
    ) -> Self {
        Self {
            query: query.into(),
            validation_status: status,
            result,
            error,
            message: None,
            retry_count,
        }
    }

    pub fn invalid(query: impl Into<String>, error: impl Into<String>, retry_count: u32) -> Self {
        Self {
            query: query.into(),
            validation_status: ValidationStatus::Invalid,
            result: None,
            error: Some(error.into()),
            message: None,
            retry_count,
        }
    }

    pub fn out_of_scope(message: impl Into<String>, retry_count: u32) -> Self {
        Self {
            query: String::new(),
            validation_status: ValidationStatus::OutOfScope,
            result: None,
            error: None,
            message: Some(message.into()),
            retry_count,
        }
    }
}

/// Step list plus the primary step's fields at top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AiQueryResponse {
    #[serde(flatten)]
    pub primary: QueryStep,
    pub steps: Vec<QueryStep>,
}

impl AiQueryResponse {
    pub fn from_steps(primary: QueryStep, follow_up: Option<QueryStep>) -> Self {
        let mut steps = vec![primary.clone()];
        steps.extend(follow_up);
        Self { primary, steps }
    }

    /// Envelope for a request that failed before any query was produced.
    pub fn failure(error: impl Into<String>) -> Self {
        Self::from_steps(QueryStep::invalid("", error, 0), None)
    }

    pub fn follow_up(&self) -> Option<&QueryStep> {
        self.steps.get(1)
    }
}
