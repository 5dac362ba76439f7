//! Parameter and response types for the endpoint catalog.
//!
//! # Design
//! Body types serialize to the JSON (or, for GET, the query string) the
//! backend expects, so field renames mirror the wire names. Path types are
//! consumed only by URL templates and carry no serde derives. Response types
//! are defined independently from the mock server; the integration tests
//! catch schema drift.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where Helm keeps release state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Secret,
    ConfigMap,
    Memory,
}

impl StorageType {
    pub const fn as_str(self) -> &'static str {
        match self {
            StorageType::Secret => "secret",
            StorageType::ConfigMap => "configmap",
            StorageType::Memory => "memory",
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: u64,
    pub project_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseToken {
    pub webhook_token: String,
}

// ---------------------------------------------------------------------------
// Bodies
// ---------------------------------------------------------------------------

/// Email/password pair for registration and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Partial user update; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    #[serde(rename = "rawKubeConfig", skip_serializing_if = "Option::is_none")]
    pub raw_kube_config: Option<String>,
    #[serde(rename = "allowedContexts", skip_serializing_if = "Option::is_none")]
    pub allowed_contexts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvite {
    pub email: String,
}

/// Filters for listing releases; `status_filter` is sent as a repeated key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReleases {
    pub namespace: String,
    pub cluster_id: u64,
    pub storage: StorageType,
    pub limit: u32,
    pub skip: u32,
    #[serde(rename = "byDate")]
    pub by_date: bool,
    #[serde(rename = "statusFilter")]
    pub status_filter: Vec<String>,
}

/// Addresses a release's Helm storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseQuery {
    pub namespace: String,
    pub cluster_id: u64,
    pub storage: StorageType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterQuery {
    pub cluster_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingPods {
    pub cluster_id: u64,
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rollback {
    pub namespace: String,
    pub storage: StorageType,
    pub revision: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeValues {
    pub namespace: String,
    pub storage: StorageType,
    /// Helm values as a YAML document.
    pub values: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchContents {
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployTemplate {
    #[serde(rename = "templateName")]
    pub template_name: String,
    #[serde(rename = "imageURL", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "formValues", skip_serializing_if = "Option::is_none")]
    pub form_values: Option<Value>,
    pub storage: StorageType,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAwsIntegration {
    pub aws_region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws_cluster_id: Option<String>,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionEcr {
    pub ecr_name: String,
    pub aws_integration_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionEks {
    pub eks_name: String,
    pub aws_integration_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEcr {
    pub name: String,
    pub aws_integration_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGcpIntegration {
    pub gcp_region: String,
    pub gcp_key_data: String,
    pub gcp_project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGcr {
    pub gcp_integration_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGke {
    pub gcp_integration_id: u64,
    pub gke_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocr {
    pub do_integration_id: u64,
    pub docr_name: String,
    pub docr_subscription_tier: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoks {
    pub do_integration_id: u64,
    pub doks_name: String,
    pub do_region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyEks {
    pub eks_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyGke {
    pub gke_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyDoks {
    pub doks_name: String,
}

// ---------------------------------------------------------------------------
// Path parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct UserPath {
    pub user_id: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectPath {
    pub project_id: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterPath {
    pub project_id: u64,
    pub cluster_id: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct InvitePath {
    pub project_id: u64,
    pub invite_id: u64,
}

#[derive(Debug, Clone)]
pub struct ReleasePath {
    pub project_id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct RevisionPath {
    pub project_id: u64,
    pub name: String,
    pub revision: u64,
}

/// Release path for actions that address the cluster in the query string.
#[derive(Debug, Clone)]
pub struct ReleaseActionPath {
    pub project_id: u64,
    pub cluster_id: u64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct IngressPath {
    pub project_id: u64,
    pub namespace: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TemplatePath {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct DeployPath {
    pub project_id: u64,
    pub cluster_id: u64,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct UninstallPath {
    pub project_id: u64,
    pub cluster_id: u64,
    pub name: String,
    pub namespace: String,
    pub storage: StorageType,
}

/// A git repository; `repo` is `owner/name`.
#[derive(Debug, Clone)]
pub struct RepoPath {
    pub kind: String,
    pub repo: String,
}

#[derive(Debug, Clone)]
pub struct BranchPath {
    pub kind: String,
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryPath {
    pub project_id: u64,
    pub registry_id: u64,
}

#[derive(Debug, Clone)]
pub struct ImageRepoPath {
    pub project_id: u64,
    pub registry_id: u64,
    pub repo_name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct InfraPath {
    pub project_id: u64,
    pub infra_id: u64,
}
