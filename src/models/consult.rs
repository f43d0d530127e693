use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultRequest {
    pub agency: String,
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultResponse {
    pub name: String,
    pub document: String,
}

/// Record written to the store after a successful consult, keyed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonData {
    pub identifier: String,
    pub agency: String,
    pub account: String,
    pub name: String,
    pub document: String,
}

impl CommonData {
    pub fn new(identifier: &str, request: &ConsultRequest, response: &ConsultResponse) -> Self {
        Self {
            identifier: identifier.to_string(),
            agency: request.agency.clone(),
            account: request.account.clone(),
            name: response.name.clone(),
            document: response.document.clone(),
        }
    }
}
