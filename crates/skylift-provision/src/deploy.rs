//! Deployment descriptor model
//!
//! A `DeploySpec` is the parsed form of the YAML descriptor that drives a
//! function deployment: the function definition plus the REST endpoints that
//! should front it. The descriptor usually lives in a blob store; this
//! module only models and parses it.

use serde::{Deserialize, Serialize};

use crate::descriptor::{FunctionSpec, MethodBinding};
use crate::error::{ProvisionError, Result};

/// One HTTP method definition on an endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    /// Request model name, if any
    #[serde(default)]
    pub req: String,
    /// Response model name, if any
    #[serde(default)]
    pub res: String,
}

/// One REST endpoint fronting the function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDef {
    #[serde(default)]
    pub version: u32,
    /// Resource path part the methods hang off
    pub resource: String,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl EndpointDef {
    /// Method bindings for plan building; request parameter mappings are
    /// supplied by the caller when the endpoint needs them
    pub fn bindings(&self) -> Vec<MethodBinding> {
        self.methods
            .iter()
            .map(|m| MethodBinding::new(m.name.clone()))
            .collect()
    }
}

/// Parsed deployment descriptor for one function and its endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySpec {
    pub name: String,
    #[serde(rename = "rolename")]
    pub role_name: String,
    pub architecture: String,
    pub runtime: String,
    pub handler: String,
    /// Object key of the code archive in the artifact bucket
    pub filename: String,
    #[serde(default)]
    pub endpoint: Vec<EndpointDef>,
}

impl DeploySpec {
    /// Parse a YAML descriptor
    pub fn from_yaml(text: &str) -> Result<Self> {
        let spec: DeploySpec = serde_yml::from_str(text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Fail-fast descriptor validation
    pub fn validate(&self) -> Result<()> {
        for (value, field) in [
            (&self.name, "function name"),
            (&self.role_name, "role name"),
            (&self.architecture, "architecture"),
            (&self.runtime, "runtime"),
            (&self.handler, "handler"),
            (&self.filename, "code filename"),
        ] {
            if value.trim().is_empty() {
                return Err(ProvisionError::Configuration(format!(
                    "deployment descriptor is missing {field}"
                )));
            }
        }
        for endpoint in &self.endpoint {
            if endpoint.resource.trim().is_empty() {
                return Err(ProvisionError::Configuration(
                    "deployment descriptor endpoint is missing a resource".into(),
                ));
            }
        }
        Ok(())
    }

    /// Build the function descriptor this deployment converges, given the
    /// resolved role ARN and the artifact bucket
    pub fn function_spec(&self, role_arn: &str, code_bucket: &str, publish: bool) -> FunctionSpec {
        FunctionSpec {
            name: self.name.clone(),
            role_arn: role_arn.to_string(),
            architecture: self.architecture.clone(),
            runtime: self.runtime.clone(),
            handler: self.handler.clone(),
            code_bucket: code_bucket.to_string(),
            code_key: self.filename.clone(),
            publish,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
name: ingest
rolename: ingest-exec
architecture: arm64
runtime: provided.al2023
handler: bootstrap
filename: ingest.zip
endpoint:
  - version: 1
    resource: reports
    methods:
      - name: GET
        req: ""
        res: ReportList
      - name: POST
        req: ReportCreate
        res: Report
"#;

    #[test]
    fn parses_full_descriptor() {
        let spec = DeploySpec::from_yaml(DESCRIPTOR).unwrap();

        assert_eq!(spec.name, "ingest");
        assert_eq!(spec.role_name, "ingest-exec");
        assert_eq!(spec.endpoint.len(), 1);
        assert_eq!(spec.endpoint[0].resource, "reports");
        assert_eq!(spec.endpoint[0].methods[1].req, "ReportCreate");
    }

    #[test]
    fn descriptor_without_endpoints_is_valid() {
        let spec = DeploySpec::from_yaml(
            "name: worker\nrolename: worker-exec\narchitecture: x86_64\nruntime: provided.al2023\nhandler: bootstrap\nfilename: worker.zip\n",
        )
        .unwrap();

        assert!(spec.endpoint.is_empty());
    }

    #[test]
    fn missing_required_field_is_a_configuration_error() {
        let err = DeploySpec::from_yaml("name: ingest\nrolename: ingest-exec\n").unwrap_err();
        // Absent YAML keys fail deserialization before validate runs.
        assert!(matches!(
            err,
            ProvisionError::Serialization(_) | ProvisionError::Configuration(_)
        ));
    }

    #[test]
    fn empty_field_is_rejected_by_validation() {
        let text = DESCRIPTOR.replace("handler: bootstrap", "handler: \"\"");
        let err = DeploySpec::from_yaml(&text).unwrap_err();
        assert!(matches!(err, ProvisionError::Configuration(_)));
        assert!(err.to_string().contains("handler"));
    }

    #[test]
    fn bindings_carry_method_names() {
        let spec = DeploySpec::from_yaml(DESCRIPTOR).unwrap();
        let bindings = spec.endpoint[0].bindings();

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "GET");
        assert!(bindings[0].request_parameters.is_empty());
    }

    #[test]
    fn function_spec_combines_descriptor_and_resolved_inputs() {
        let spec = DeploySpec::from_yaml(DESCRIPTOR).unwrap();
        let function =
            spec.function_spec("arn:aws:iam::123456789012:role/ingest-exec", "artifacts", true);

        assert_eq!(function.name, "ingest");
        assert_eq!(function.code_bucket, "artifacts");
        assert_eq!(function.code_key, "ingest.zip");
        assert!(function.publish);
        assert!(!function.dry_run);
    }
}
