//! The dashboard's backend operations, declared once as `const` specs.
//!
//! Bind a spec to a client with `ApiClient::endpoint` and invoke it:
//!
//! ```no_run
//! # async fn demo(client: dashboard_api::ApiClient) -> Result<(), dashboard_api::ApiError> {
//! use dashboard_api::catalog;
//! use dashboard_api::types::ProjectPath;
//!
//! let clusters = client
//!     .endpoint(catalog::GET_CLUSTERS)
//!     .call("token", &(), &ProjectPath { project_id: 7 })
//!     .await?;
//! println!("{} clusters", clusters.data.len());
//! # Ok(())
//! # }
//! ```
//!
//! Values interpolated into a path that may contain `/` or other reserved
//! characters go through `encode_segment`; numeric ids do not need it.

use crate::endpoint::{encode_segment, EndpointSpec};
use crate::http::HttpMethod::{Delete, Get, Post, Put};
use crate::types::*;

// ---------------------------------------------------------------------------
// Auth and users
// ---------------------------------------------------------------------------

pub const CHECK_AUTH: EndpointSpec<(), (), User> = EndpointSpec::new(Get, "/api/auth/check");

pub const REGISTER_USER: EndpointSpec<Credentials, (), User> = EndpointSpec::new(Post, "/api/users");

pub const LOG_IN_USER: EndpointSpec<Credentials, (), User> = EndpointSpec::new(Post, "/api/login");

pub const LOG_OUT_USER: EndpointSpec<()> = EndpointSpec::new(Post, "/api/logout");

pub const GET_USER: EndpointSpec<(), UserPath, User> =
    EndpointSpec::computed(Get, |p: &UserPath| format!("/api/users/{}", p.user_id));

pub const UPDATE_USER: EndpointSpec<UpdateUser, UserPath, User> =
    EndpointSpec::computed(Put, |p: &UserPath| format!("/api/users/{}", p.user_id));

// ---------------------------------------------------------------------------
// Projects and invites
// ---------------------------------------------------------------------------

pub const GET_PROJECTS: EndpointSpec<(), UserPath, Vec<Project>> =
    EndpointSpec::computed(Get, |p: &UserPath| format!("/api/users/{}/projects", p.user_id));

pub const CREATE_PROJECT: EndpointSpec<CreateProject, (), Project> = EndpointSpec::new(Post, "/api/projects");

pub const DELETE_PROJECT: EndpointSpec<(), ProjectPath, Project> =
    EndpointSpec::computed(Delete, |p: &ProjectPath| format!("/api/projects/{}", p.project_id));

pub const GET_INVITES: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/invites", p.project_id));

pub const CREATE_INVITE: EndpointSpec<CreateInvite, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/invites", p.project_id));

pub const DELETE_INVITE: EndpointSpec<(), InvitePath> = EndpointSpec::computed(Delete, |p: &InvitePath| {
    format!("/api/projects/{}/invites/{}", p.project_id, p.invite_id)
});

// ---------------------------------------------------------------------------
// Clusters and Kubernetes objects
// ---------------------------------------------------------------------------

pub const GET_CLUSTERS: EndpointSpec<(), ProjectPath, Vec<Cluster>> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/clusters", p.project_id));

pub const DELETE_CLUSTER: EndpointSpec<(), ClusterPath> = EndpointSpec::computed(Delete, |p: &ClusterPath| {
    format!("/api/projects/{}/clusters/{}", p.project_id, p.cluster_id)
});

pub const GET_NAMESPACES: EndpointSpec<ClusterQuery, ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/k8s/namespaces", p.project_id));

pub const GET_MATCHING_PODS: EndpointSpec<MatchingPods, ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/k8s/pods", p.project_id));

pub const GET_INGRESS: EndpointSpec<ClusterQuery, IngressPath> = EndpointSpec::computed(Get, |p: &IngressPath| {
    format!(
        "/api/projects/{}/k8s/{}/ingress/{}",
        p.project_id,
        encode_segment(&p.namespace),
        encode_segment(&p.name)
    )
});

// ---------------------------------------------------------------------------
// Releases
// ---------------------------------------------------------------------------

pub const GET_CHARTS: EndpointSpec<ListReleases, ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/releases", p.project_id));

pub const GET_CHART: EndpointSpec<ReleaseQuery, RevisionPath> = EndpointSpec::computed(Get, |p: &RevisionPath| {
    format!(
        "/api/projects/{}/releases/{}/{}",
        p.project_id,
        encode_segment(&p.name),
        p.revision
    )
});

pub const GET_CHART_COMPONENTS: EndpointSpec<ReleaseQuery, RevisionPath> =
    EndpointSpec::computed(Get, |p: &RevisionPath| {
        format!(
            "/api/projects/{}/releases/{}/{}/components",
            p.project_id,
            encode_segment(&p.name),
            p.revision
        )
    });

pub const GET_CHART_CONTROLLERS: EndpointSpec<ReleaseQuery, RevisionPath> =
    EndpointSpec::computed(Get, |p: &RevisionPath| {
        format!(
            "/api/projects/{}/releases/{}/{}/controllers",
            p.project_id,
            encode_segment(&p.name),
            p.revision
        )
    });

pub const GET_REVISIONS: EndpointSpec<ReleaseQuery, ReleasePath> = EndpointSpec::computed(Get, |p: &ReleasePath| {
    format!("/api/projects/{}/releases/{}/history", p.project_id, encode_segment(&p.name))
});

pub const GET_RELEASE_TOKEN: EndpointSpec<ReleaseQuery, ReleasePath, ReleaseToken> =
    EndpointSpec::computed(Get, |p: &ReleasePath| {
        format!(
            "/api/projects/{}/releases/{}/webhook_token",
            p.project_id,
            encode_segment(&p.name)
        )
    });

pub const ROLLBACK_CHART: EndpointSpec<Rollback, ReleaseActionPath> =
    EndpointSpec::computed(Post, |p: &ReleaseActionPath| {
        format!(
            "/api/projects/{}/releases/{}/rollback?cluster_id={}",
            p.project_id,
            encode_segment(&p.name),
            p.cluster_id
        )
    });

pub const UPGRADE_CHART_VALUES: EndpointSpec<UpgradeValues, ReleaseActionPath> =
    EndpointSpec::computed(Post, |p: &ReleaseActionPath| {
        format!(
            "/api/projects/{}/releases/{}/upgrade?cluster_id={}",
            p.project_id,
            encode_segment(&p.name),
            p.cluster_id
        )
    });

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub const GET_TEMPLATES: EndpointSpec<()> = EndpointSpec::new(Get, "/api/templates");

pub const GET_TEMPLATE_INFO: EndpointSpec<(), TemplatePath> = EndpointSpec::computed(Get, |p: &TemplatePath| {
    format!("/api/templates/{}/{}", encode_segment(&p.name), encode_segment(&p.version))
});

pub const DEPLOY_TEMPLATE: EndpointSpec<DeployTemplate, DeployPath> = EndpointSpec::computed(Post, |p: &DeployPath| {
    format!(
        "/api/projects/{}/deploy/{}/{}?cluster_id={}",
        p.project_id,
        encode_segment(&p.name),
        encode_segment(&p.version),
        p.cluster_id
    )
});

pub const UNINSTALL_TEMPLATE: EndpointSpec<(), UninstallPath> = EndpointSpec::computed(Post, |p: &UninstallPath| {
    format!(
        "/api/projects/{}/deploy/{}?cluster_id={}&namespace={}&storage={}",
        p.project_id,
        encode_segment(&p.name),
        p.cluster_id,
        encode_segment(&p.namespace),
        p.storage.as_str()
    )
});

// ---------------------------------------------------------------------------
// Git repositories
// ---------------------------------------------------------------------------

pub const GET_REPOS: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/repos", p.project_id));

pub const GET_BRANCHES: EndpointSpec<(), RepoPath> = EndpointSpec::computed(Get, |p: &RepoPath| {
    format!("/api/repos/{}/{}/branches", encode_segment(&p.kind), p.repo)
});

pub const GET_BRANCH_CONTENTS: EndpointSpec<BranchContents, BranchPath> =
    EndpointSpec::computed(Get, |p: &BranchPath| {
        format!(
            "/api/repos/{}/{}/{}/contents",
            encode_segment(&p.kind),
            p.repo,
            encode_segment(&p.branch)
        )
    });

pub const GET_GIT_REPOS: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/gitrepos", p.project_id));

pub const LINK_GITHUB_PROJECT: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/oauth/projects/{}/github", p.project_id));

// ---------------------------------------------------------------------------
// Integrations
// ---------------------------------------------------------------------------

pub const GET_CLUSTER_INTEGRATIONS: EndpointSpec<()> = EndpointSpec::new(Get, "/api/integrations/cluster");

pub const GET_REGISTRY_INTEGRATIONS: EndpointSpec<()> = EndpointSpec::new(Get, "/api/integrations/registry");

pub const GET_REPO_INTEGRATIONS: EndpointSpec<()> = EndpointSpec::new(Get, "/api/integrations/repo");

pub const GET_OAUTH_IDS: EndpointSpec<(), ProjectPath> = EndpointSpec::computed(Get, |p: &ProjectPath| {
    format!("/api/projects/{}/integrations/oauth", p.project_id)
});

pub const CREATE_AWS_INTEGRATION: EndpointSpec<CreateAwsIntegration, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/integrations/aws", p.project_id));

pub const CREATE_GCP_INTEGRATION: EndpointSpec<CreateGcpIntegration, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/integrations/gcp", p.project_id));

// ---------------------------------------------------------------------------
// Registries
// ---------------------------------------------------------------------------

pub const GET_PROJECT_REGISTRIES: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/registries", p.project_id));

pub const CREATE_ECR: EndpointSpec<CreateEcr, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/registries", p.project_id));

pub const GET_IMAGE_REPOS: EndpointSpec<(), RegistryPath> = EndpointSpec::computed(Get, |p: &RegistryPath| {
    format!(
        "/api/projects/{}/registries/{}/repositories",
        p.project_id, p.registry_id
    )
});

pub const GET_IMAGE_TAGS: EndpointSpec<(), ImageRepoPath> = EndpointSpec::computed(Get, |p: &ImageRepoPath| {
    format!(
        "/api/projects/{}/registries/{}/repositories/{}",
        p.project_id,
        p.registry_id,
        encode_segment(&p.repo_name)
    )
});

// ---------------------------------------------------------------------------
// Provisioning and infra
// ---------------------------------------------------------------------------

pub const PROVISION_ECR: EndpointSpec<ProvisionEcr, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/ecr", p.project_id));

pub const PROVISION_EKS: EndpointSpec<ProvisionEks, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/eks", p.project_id));

pub const CREATE_GCR: EndpointSpec<CreateGcr, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/gcr", p.project_id));

pub const CREATE_GKE: EndpointSpec<CreateGke, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/gke", p.project_id));

pub const CREATE_DOCR: EndpointSpec<CreateDocr, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/docr", p.project_id));

pub const CREATE_DOKS: EndpointSpec<CreateDoks, ProjectPath> =
    EndpointSpec::computed(Post, |p: &ProjectPath| format!("/api/projects/{}/provision/doks", p.project_id));

pub const GET_INFRA: EndpointSpec<(), ProjectPath> =
    EndpointSpec::computed(Get, |p: &ProjectPath| format!("/api/projects/{}/infra", p.project_id));

pub const DESTROY_EKS: EndpointSpec<DestroyEks, InfraPath> = EndpointSpec::computed(Post, |p: &InfraPath| {
    format!("/api/projects/{}/infra/{}/eks/destroy", p.project_id, p.infra_id)
});

pub const DESTROY_GKE: EndpointSpec<DestroyGke, InfraPath> = EndpointSpec::computed(Post, |p: &InfraPath| {
    format!("/api/projects/{}/infra/{}/gke/destroy", p.project_id, p.infra_id)
});

pub const DESTROY_DOKS: EndpointSpec<DestroyDoks, InfraPath> = EndpointSpec::computed(Post, |p: &InfraPath| {
    format!("/api/projects/{}/infra/{}/doks/destroy", p.project_id, p.infra_id)
});
