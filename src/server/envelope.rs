use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Message patterns exposed on the auth queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcPattern {
    #[serde(rename = "ISSUE_ON_LOGIN")]
    IssueOnLogin,
    #[serde(rename = "REFRESH_TOKEN")]
    RefreshToken,
    #[serde(rename = "VERIFY_ACCESS_TOKEN")]
    VerifyAccessToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub pattern: RpcPattern,
    pub correlation_id: Uuid,
    pub reply_to: String,
    pub payload: serde_json::Value,
}

/// Normalized fault crossing the transport. Callers map `status` straight
/// onto an HTTP status and never see internal error subtypes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcFault {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.status)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyEnvelope {
    pub correlation_id: Uuid,
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<RpcFault>,
}

impl ReplyEnvelope {
    pub fn ok(correlation_id: Uuid, data: serde_json::Value) -> Self {
        ReplyEnvelope {
            correlation_id,
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(correlation_id: Uuid, fault: RpcFault) -> Self {
        ReplyEnvelope {
            correlation_id,
            success: false,
            data: None,
            error: Some(fault),
        }
    }

    pub fn into_result(self) -> Result<serde_json::Value, RpcFault> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(fault)) => Err(fault),
            _ => Err(RpcFault {
                status: 500,
                message: "malformed reply envelope".to_owned(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAccessRequest {
    pub access_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}
