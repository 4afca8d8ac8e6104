//! Maps an operation's current status to the HTTP status and body a poller
//! sees. The mapping is a fixed policy table; there is no per-endpoint logic.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::GatewayError;

use super::status::OperationStatus;

pub const ACCEPTED: u16 = 202;
pub const OK: u16 = 200;
pub const NO_CONTENT: u16 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    PushDeploy,
    DeploymentResult,
    ResourceDelete,
}

impl OperationKind {
    pub const ALL: [OperationKind; 3] = [
        OperationKind::PushDeploy,
        OperationKind::DeploymentResult,
        OperationKind::ResourceDelete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::PushDeploy => "push-deploy",
            OperationKind::DeploymentResult => "deployment-result",
            OperationKind::ResourceDelete => "resource-delete",
        }
    }

    /// Whether pollers of this kind may see a provisional 202.
    pub fn has_provisional_status(&self) -> bool {
        POLICY
            .iter()
            .any(|(kind, _, rule)| kind == self && *rule == Rule::Provisional)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    InProgress,
    Succeeded,
    Failed,
    Removed,
}

impl Phase {
    fn of(status: &OperationStatus) -> Self {
        match status {
            OperationStatus::Pending | OperationStatus::Accepted => Phase::InProgress,
            OperationStatus::Succeeded(_) => Phase::Succeeded,
            OperationStatus::Failed(_) => Phase::Failed,
            OperationStatus::Removed => Phase::Removed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    /// 202 with the placeholder body.
    Provisional,
    /// 200; an empty underlying response is replaced by the placeholder body.
    OkWithResult,
    /// Status and body of the underlying terminal response.
    Underlying,
    /// 204, empty body.
    NoContent,
}

const POLICY: &[(OperationKind, Phase, Rule)] = &[
    (OperationKind::PushDeploy, Phase::InProgress, Rule::Provisional),
    (OperationKind::PushDeploy, Phase::Succeeded, Rule::OkWithResult),
    (OperationKind::PushDeploy, Phase::Failed, Rule::Underlying),
    (OperationKind::DeploymentResult, Phase::InProgress, Rule::Provisional),
    (OperationKind::DeploymentResult, Phase::Succeeded, Rule::Underlying),
    (OperationKind::DeploymentResult, Phase::Failed, Rule::Underlying),
    (OperationKind::ResourceDelete, Phase::Removed, Rule::NoContent),
];

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// Body returned while an operation is in flight; a push deploy that finishes
/// without content answers with the same shape.
pub fn placeholder_body(id: &str, status: &OperationStatus) -> Value {
    json!({
        "id": id,
        "status": status.name(),
        "complete": status.is_terminal(),
    })
}

pub fn resolve(
    kind: OperationKind,
    id: &str,
    status: &OperationStatus,
) -> Result<GatewayResponse, GatewayError> {
    let phase = Phase::of(status);
    let rule = POLICY
        .iter()
        .find(|(k, p, _)| *k == kind && *p == phase)
        .map(|(_, _, rule)| *rule)
        .ok_or(GatewayError::NotApplicable {
            kind,
            status: status.name(),
        })?;

    let response = match rule {
        Rule::Provisional => GatewayResponse {
            status: ACCEPTED,
            body: Some(placeholder_body(id, status)),
        },
        Rule::OkWithResult => {
            let body = match status.result() {
                Some(result) if !result.is_no_content() => result.body.clone(),
                _ => Some(placeholder_body(id, status)),
            };
            GatewayResponse { status: OK, body }
        }
        Rule::Underlying => match status.result() {
            Some(result) => GatewayResponse {
                status: result.status,
                body: result.body.clone(),
            },
            None => {
                return Err(GatewayError::NotApplicable {
                    kind,
                    status: status.name(),
                })
            }
        },
        Rule::NoContent => GatewayResponse {
            status: NO_CONTENT,
            body: None,
        },
    };
    Ok(response)
}
