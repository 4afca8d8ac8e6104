//! Machine-readable description of the HTTP operations.
//!
//! Nothing here affects request handling. The raw catalog is rewritten by a
//! list of [`OperationFilter`]s before it is served.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::operation::{gateway, OperationKind};

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
pub const RESERVED_PARAMETER: &str = "arguments";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub required: bool,
    #[serde(rename = "type")]
    pub schema_type: String,
}

impl ParameterDescriptor {
    pub fn new(name: &str, location: ParameterLocation, required: bool, schema_type: &str) -> Self {
        Self {
            name: name.to_string(),
            location,
            required,
            schema_type: schema_type.to_string(),
        }
    }

    pub fn file() -> Self {
        Self::new("file", ParameterLocation::Body, true, "file")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub operation_id: String,
    pub method: String,
    pub path: String,
    pub consumes: Vec<String>,
    pub parameters: Vec<ParameterDescriptor>,
    pub responses: BTreeSet<u16>,
    /// Status policy governing this operation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<OperationKind>,
}

impl OperationDescriptor {
    pub fn new(operation_id: &str, method: &str, path: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            method: method.to_string(),
            path: path.to_string(),
            consumes: vec!["application/json".to_string()],
            parameters: Vec::new(),
            responses: BTreeSet::from([200]),
            kind: None,
        }
    }

    pub fn param(mut self, p: ParameterDescriptor) -> Self {
        self.parameters.push(p);
        self
    }

    pub fn responses(mut self, codes: &[u16]) -> Self {
        self.responses = codes.iter().copied().collect();
        self
    }

    pub fn kind(mut self, kind: OperationKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiDocument {
    pub title: String,
    pub version: String,
    pub schemes: Vec<String>,
    pub operations: Vec<OperationDescriptor>,
}

pub trait OperationFilter: Send + Sync {
    fn apply(&self, op: &mut OperationDescriptor);
}

#[derive(Debug, Clone, Copy)]
enum IdMatch {
    Exact(&'static str),
    Suffix(&'static str),
}

impl IdMatch {
    fn matches(&self, operation_id: &str) -> bool {
        match self {
            IdMatch::Exact(id) => operation_id == *id,
            IdMatch::Suffix(suffix) => operation_id.ends_with(suffix),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    ReplaceFirst,
    InsertFirst,
}

const FILE_UPLOADS: &[(IdMatch, Placement)] = &[
    (IdMatch::Exact("PushDeployment_ZipPushDeploy"), Placement::ReplaceFirst),
    (IdMatch::Suffix("_PutItem"), Placement::InsertFirst),
];

/// Marks upload operations as multipart with a leading `file` parameter.
pub struct FileParamTypes;

impl OperationFilter for FileParamTypes {
    fn apply(&self, op: &mut OperationDescriptor) {
        let Some((_, placement)) = FILE_UPLOADS.iter().find(|(m, _)| m.matches(&op.operation_id)) else {
            return;
        };
        if !op.consumes.iter().any(|c| c == MULTIPART_FORM_DATA) {
            op.consumes.push(MULTIPART_FORM_DATA.to_string());
        }
        match placement {
            Placement::ReplaceFirst if !op.parameters.is_empty() => {
                op.parameters[0] = ParameterDescriptor::file();
            }
            Placement::ReplaceFirst | Placement::InsertFirst => {
                op.parameters.insert(0, ParameterDescriptor::file());
            }
        }
    }
}

/// Drops parameters whose name is reserved in generated client bindings.
pub struct NoReservedParam;

impl OperationFilter for NoReservedParam {
    fn apply(&self, op: &mut OperationDescriptor) {
        op.parameters.retain(|p| p.name != RESERVED_PARAMETER);
    }
}

/// Documents the provisional 202 on operations polled through the gateway.
pub struct ProvisionalStatus;

impl OperationFilter for ProvisionalStatus {
    fn apply(&self, op: &mut OperationDescriptor) {
        if op.kind.is_some_and(|k| k.has_provisional_status()) {
            op.responses.insert(gateway::ACCEPTED);
        }
    }
}

pub fn default_filters() -> Vec<Box<dyn OperationFilter>> {
    vec![
        Box::new(FileParamTypes),
        Box::new(NoReservedParam),
        Box::new(ProvisionalStatus),
    ]
}

/// Operations served by the HTTP layer, before filtering.
pub fn catalog() -> Vec<OperationDescriptor> {
    use ParameterLocation::*;
    vec![
        OperationDescriptor::new("Command_ExecuteCommand", "POST", "/api/command")
            .param(ParameterDescriptor::new("input", Body, true, "CommandInput"))
            .responses(&[200, 400]),
        OperationDescriptor::new("PushDeployment_ZipPushDeploy", "POST", "/api/zipdeploy")
            .param(ParameterDescriptor::new("package", Body, true, "string"))
            .param(ParameterDescriptor::new("isAsync", Query, false, "boolean"))
            .responses(&[200])
            .kind(OperationKind::PushDeploy),
        OperationDescriptor::new("PushDeployment_GetStatus", "GET", "/api/zipdeploy/{id}")
            .param(ParameterDescriptor::new("id", Path, true, "string"))
            .responses(&[200, 404])
            .kind(OperationKind::PushDeploy),
        OperationDescriptor::new("Deployment_GetResult", "GET", "/api/deployments/{id}/result")
            .param(ParameterDescriptor::new("id", Path, true, "string"))
            .responses(&[200, 404])
            .kind(OperationKind::DeploymentResult),
        OperationDescriptor::new("Deployment_Delete", "DELETE", "/api/deployments/{id}")
            .param(ParameterDescriptor::new("id", Path, true, "string"))
            .responses(&[204, 404, 409])
            .kind(OperationKind::ResourceDelete),
    ]
}

pub fn document(mut operations: Vec<OperationDescriptor>, filters: &[Box<dyn OperationFilter>]) -> ApiDocument {
    for op in operations.iter_mut() {
        for filter in filters {
            filter.apply(op);
        }
    }
    ApiDocument {
        title: "kiln".to_string(),
        version: "v1".to_string(),
        schemes: vec!["https".to_string()],
        operations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn find<'a>(doc: &'a ApiDocument, id: &str) -> &'a OperationDescriptor {
        doc.operations.iter().find(|o| o.operation_id == id).unwrap()
    }

    #[test]
    fn push_deploy_first_parameter_becomes_file() {
        let doc = document(catalog(), &default_filters());
        let op = find(&doc, "PushDeployment_ZipPushDeploy");
        assert_eq!(op.parameters[0], ParameterDescriptor::file());
        assert_eq!(op.parameters.len(), 2);
        assert!(op.consumes.iter().any(|c| c == MULTIPART_FORM_DATA));
    }

    #[test]
    fn put_item_operations_get_file_inserted_first() {
        let op = OperationDescriptor::new("Vfs_PutItem", "PUT", "/api/vfs/{path}")
            .param(ParameterDescriptor::new("path", ParameterLocation::Path, true, "string"));
        let doc = document(vec![op], &default_filters());
        let names: Vec<_> = doc.operations[0].parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["file", "path"]);
    }

    #[test]
    fn reserved_parameter_is_removed() {
        let op = OperationDescriptor::new("Command_Run", "POST", "/x")
            .param(ParameterDescriptor::new("arguments", ParameterLocation::Query, false, "string"))
            .param(ParameterDescriptor::new("dir", ParameterLocation::Query, false, "string"));
        let doc = document(vec![op], &default_filters());
        assert_eq!(doc.operations[0].parameters.len(), 1);
        assert_eq!(doc.operations[0].parameters[0].name, "dir");
    }

    #[test]
    fn provisional_status_is_documented_only_where_pollable() {
        let doc = document(catalog(), &default_filters());
        assert!(find(&doc, "PushDeployment_GetStatus").responses.contains(&202));
        assert!(find(&doc, "Deployment_GetResult").responses.contains(&202));
        assert!(!find(&doc, "Deployment_Delete").responses.contains(&202));
        assert!(!find(&doc, "Command_ExecuteCommand").responses.contains(&202));
    }

    #[test]
    fn document_serializes_parameter_location_as_in() {
        let doc = document(catalog(), &default_filters());
        let json = serde_json::to_value(&doc).unwrap();
        let first = &json["operations"][0]["parameters"][0];
        assert_eq!(first["in"], serde_json::json!("body"));
        assert_eq!(json["schemes"], serde_json::json!(["https"]));
    }
}
