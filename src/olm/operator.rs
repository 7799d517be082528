// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::olm as defaults;
use crate::error::{Result, YaksError};
use crate::kubernetes::resources::post_params;
use crate::kubernetes::{check_permission, Collection};
use crate::types::olm::{
    ClusterServiceVersion, OperatorGroup, OperatorGroupSpec, Subscription, SubscriptionConfig,
    SubscriptionSpec, APPROVAL_AUTOMATIC,
};
use k8s_openapi::api::core::v1::EnvVar;
use kube::{
    api::{DeleteParams, ListParams, ObjectMeta},
    Api, Client, ResourceExt,
};
use tracing::{debug, info, instrument};

const OPERATORS_GROUP: &str = "operators.coreos.com";

/// Coordinates of the operator package in OLM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OlmOptions {
    pub operator_name: String,
    pub package: String,
    pub channel: String,
    pub source: String,
    pub source_namespace: String,
    pub starting_csv: String,
    pub global_namespace: String,
}

impl Default for OlmOptions {
    fn default() -> Self {
        OlmOptions {
            operator_name: defaults::OPERATOR_NAME.to_string(),
            package: defaults::PACKAGE.to_string(),
            channel: defaults::CHANNEL.to_string(),
            source: defaults::SOURCE.to_string(),
            source_namespace: defaults::SOURCE_NAMESPACE.to_string(),
            starting_csv: defaults::STARTING_CSV.to_string(),
            global_namespace: defaults::GLOBAL_NAMESPACE.to_string(),
        }
    }
}

impl OlmOptions {
    /// Fill every empty field with its default
    pub fn with_defaults(&self) -> OlmOptions {
        let fallback = OlmOptions::default();
        let pick = |value: &String, default: String| {
            if value.is_empty() {
                default
            } else {
                value.clone()
            }
        };
        OlmOptions {
            operator_name: pick(&self.operator_name, fallback.operator_name),
            package: pick(&self.package, fallback.package),
            channel: pick(&self.channel, fallback.channel),
            source: pick(&self.source, fallback.source),
            source_namespace: pick(&self.source_namespace, fallback.source_namespace),
            starting_csv: pick(&self.starting_csv, fallback.starting_csv),
            global_namespace: pick(&self.global_namespace, fallback.global_namespace),
        }
    }

    /// Namespace holding the subscription
    fn subscription_namespace<'a>(&'a self, namespace: &'a str, global: bool) -> &'a str {
        if global {
            &self.global_namespace
        } else {
            namespace
        }
    }
}

/// Parse `KEY=VALUE` pairs into container environment variables
pub fn parse_env_vars(vars: &[String]) -> Result<Vec<EnvVar>> {
    vars.iter()
        .map(|var| match var.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok(EnvVar {
                name: name.to_string(),
                value: Some(value.to_string()),
                ..Default::default()
            }),
            _ => Err(YaksError::InvalidEnvVar(var.clone())),
        })
        .collect()
}

/// Tell if an OLM CSV or a Subscription is already installed.
/// A subscription alone may indicate an installation in progress.
#[instrument(skip(client, options))]
pub async fn is_operator_installed(
    client: &Client,
    namespace: &str,
    global: bool,
    options: &OlmOptions,
) -> Result<bool> {
    let options = options.with_defaults();
    if find_csv(client, namespace, &options).await?.is_some() {
        return Ok(true);
    }
    Ok(find_subscription(client, namespace, global, &options)
        .await?
        .is_some())
}

/// Check if the current user may install the operator via OLM
#[instrument(skip(client, options))]
pub async fn has_permission_to_install(
    client: &Client,
    namespace: &str,
    global: bool,
    options: &OlmOptions,
) -> Result<bool> {
    let options = options.with_defaults();
    let can = |resource: &'static str, namespace: String, verb: &'static str| {
        let package = options.package.clone();
        async move {
            check_permission(client, OPERATORS_GROUP, resource, &namespace, &package, verb).await
        }
    };

    if !can("clusterserviceversions", namespace.to_string(), "list").await? {
        return Ok(false);
    }

    let target_namespace = options.subscription_namespace(namespace, global).to_string();
    if !can("subscriptions", target_namespace, "create").await? {
        return Ok(false);
    }

    if is_operator_installed(client, namespace, global, &options).await? {
        return Ok(true);
    }

    if !global {
        if !can("operatorgroups", namespace.to_string(), "list").await? {
            return Ok(false);
        }

        if find_operator_group(client, namespace).await?.is_none()
            && !can("operatorgroups", namespace.to_string(), "create").await?
        {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Create a subscription for the OLM package, plus an operator group for
/// namespaced installs when the namespace has none.
///
/// Returns false when the operator is already installed.
#[instrument(skip(client, options, env_vars, collection))]
pub async fn install(
    client: &Client,
    namespace: &str,
    global: bool,
    options: &OlmOptions,
    env_vars: &[String],
    mut collection: Option<&mut Collection>,
) -> Result<bool> {
    let options = options.with_defaults();
    if is_operator_installed(client, namespace, global, &options).await? {
        info!("Operator already installed via OLM");
        return Ok(false);
    }

    let target_namespace = options.subscription_namespace(namespace, global);
    let env = parse_env_vars(env_vars)?;
    let subscription = Subscription {
        metadata: ObjectMeta {
            name: Some(options.package.clone()),
            namespace: Some(target_namespace.to_string()),
            ..Default::default()
        },
        spec: SubscriptionSpec {
            catalog_source: options.source.clone(),
            catalog_source_namespace: options.source_namespace.clone(),
            package: options.package.clone(),
            channel: options.channel.clone(),
            starting_csv: options.starting_csv.clone(),
            install_plan_approval: APPROVAL_AUTOMATIC.to_string(),
            config: (!env.is_empty()).then_some(SubscriptionConfig { env }),
        },
    };

    match collection.as_deref_mut() {
        Some(collection) => collection.add(&subscription)?,
        None => {
            let subscriptions: Api<Subscription> =
                Api::namespaced(client.clone(), target_namespace);
            subscriptions.create(&post_params(), &subscription).await?;
            info!(
                "Subscription {}/{} created",
                target_namespace, options.package
            );
        }
    }

    if !global && find_operator_group(client, namespace).await?.is_none() {
        let group = OperatorGroup {
            metadata: ObjectMeta {
                namespace: Some(namespace.to_string()),
                generate_name: Some(format!("{}-", namespace)),
                ..Default::default()
            },
            spec: OperatorGroupSpec {
                target_namespaces: vec![namespace.to_string()],
            },
        };

        match collection {
            Some(collection) => collection.add(&group)?,
            None => {
                let groups: Api<OperatorGroup> = Api::namespaced(client.clone(), namespace);
                groups.create(&post_params(), &group).await.map_err(|e| {
                    YaksError::Olm(format!(
                        "namespace {} has no operator group defined and current user is not able to create it. \
                         Make sure you have the right roles to install operators from OLM: {}",
                        namespace, e
                    ))
                })?;
                info!("Operator group created in namespace {}", namespace);
            }
        }
    }

    Ok(true)
}

/// Remove the subscription and the CSV of the operator
#[instrument(skip(client, options))]
pub async fn uninstall(
    client: &Client,
    namespace: &str,
    global: bool,
    options: &OlmOptions,
) -> Result<()> {
    let options = options.with_defaults();

    if let Some(subscription) = find_subscription(client, namespace, global, &options).await? {
        let subscription_namespace = subscription
            .namespace()
            .unwrap_or_else(|| options.subscription_namespace(namespace, global).to_string());
        let subscriptions: Api<Subscription> =
            Api::namespaced(client.clone(), &subscription_namespace);
        subscriptions
            .delete(&subscription.name_any(), &DeleteParams::default())
            .await?;
        info!("Subscription {}/{} deleted", subscription_namespace, subscription.name_any());
    }

    if let Some(csv) = find_csv(client, namespace, &options).await? {
        let csvs: Api<ClusterServiceVersion> = Api::namespaced(client.clone(), namespace);
        csvs.delete(&csv.name_any(), &DeleteParams::default()).await?;
        info!("ClusterServiceVersion {}/{} deleted", namespace, csv.name_any());
    }

    Ok(())
}

async fn find_subscription(
    client: &Client,
    namespace: &str,
    global: bool,
    options: &OlmOptions,
) -> Result<Option<Subscription>> {
    let subscriptions: Api<Subscription> = Api::namespaced(
        client.clone(),
        options.subscription_namespace(namespace, global),
    );
    let list = subscriptions.list(&ListParams::default()).await?;

    Ok(list
        .items
        .into_iter()
        .find(|s| s.spec.package == options.package))
}

async fn find_csv(
    client: &Client,
    namespace: &str,
    options: &OlmOptions,
) -> Result<Option<ClusterServiceVersion>> {
    let csvs: Api<ClusterServiceVersion> = Api::namespaced(client.clone(), namespace);
    let list = csvs.list(&ListParams::default()).await?;

    let csv = list
        .items
        .into_iter()
        .find(|csv| csv.name_any().starts_with(&options.operator_name));
    if let Some(csv) = &csv {
        debug!("Found CSV {}", csv.name_any());
    }
    Ok(csv)
}

async fn find_operator_group(client: &Client, namespace: &str) -> Result<Option<OperatorGroup>> {
    let groups: Api<OperatorGroup> = Api::namespaced(client.clone(), namespace);
    let list = groups.list(&ListParams::default()).await?;
    Ok(list.items.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{list_json, status_json, MockService};
    use serde_json::json;

    const CSVS: &str = "/apis/operators.coreos.com/v1alpha1/namespaces/testing/clusterserviceversions";
    const SUBSCRIPTIONS: &str = "/apis/operators.coreos.com/v1alpha1/namespaces/testing/subscriptions";
    const GLOBAL_SUBSCRIPTIONS: &str =
        "/apis/operators.coreos.com/v1alpha1/namespaces/openshift-operators/subscriptions";
    const GROUPS: &str = "/apis/operators.coreos.com/v1/namespaces/testing/operatorgroups";
    const REVIEWS: &str = "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews";

    fn csv_list(names: &[&str]) -> String {
        let items = names
            .iter()
            .map(|name| {
                json!({
                    "apiVersion": "operators.coreos.com/v1alpha1",
                    "kind": "ClusterServiceVersion",
                    "metadata": { "name": name, "namespace": "testing" },
                    "spec": { "displayName": "YAKS Operator" }
                })
            })
            .collect();
        list_json("operators.coreos.com/v1alpha1", "ClusterServiceVersion", items)
    }

    fn subscription_json(package: &str, namespace: &str) -> serde_json::Value {
        json!({
            "apiVersion": "operators.coreos.com/v1alpha1",
            "kind": "Subscription",
            "metadata": { "name": package, "namespace": namespace },
            "spec": {
                "catalogSource": "community-operators",
                "catalogSourceNamespace": "openshift-marketplace",
                "name": package,
                "channel": "alpha"
            }
        })
    }

    fn subscription_list(items: Vec<serde_json::Value>) -> String {
        list_json("operators.coreos.com/v1alpha1", "Subscription", items)
    }

    fn group_list(items: Vec<serde_json::Value>) -> String {
        list_json("operators.coreos.com/v1", "OperatorGroup", items)
    }

    fn group_json() -> serde_json::Value {
        json!({
            "apiVersion": "operators.coreos.com/v1",
            "kind": "OperatorGroup",
            "metadata": { "name": "testing-abcde", "namespace": "testing" },
            "spec": { "targetNamespaces": ["testing"] }
        })
    }

    fn review_json(allowed: bool) -> String {
        json!({
            "apiVersion": "authorization.k8s.io/v1",
            "kind": "SelfSubjectAccessReview",
            "metadata": {},
            "spec": {},
            "status": { "allowed": allowed }
        })
        .to_string()
    }

    #[test]
    fn test_with_defaults_fills_empty_fields() {
        let options = OlmOptions {
            operator_name: String::new(),
            package: "custom".to_string(),
            channel: String::new(),
            source: String::new(),
            source_namespace: String::new(),
            starting_csv: "yaks.v0.4.0".to_string(),
            global_namespace: String::new(),
        }
        .with_defaults();

        assert_eq!(options.operator_name, "yaks-operator");
        assert_eq!(options.package, "custom");
        assert_eq!(options.channel, "alpha");
        assert_eq!(options.source_namespace, "openshift-marketplace");
        assert_eq!(options.starting_csv, "yaks.v0.4.0");
        assert_eq!(options.global_namespace, "openshift-operators");
    }

    #[test]
    fn test_parse_env_vars() {
        let vars = parse_env_vars(&["LOG_LEVEL=debug".to_string(), "EMPTY=".to_string(), "URL=a=b".to_string()])
            .unwrap();

        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0].name, "LOG_LEVEL");
        assert_eq!(vars[0].value.as_deref(), Some("debug"));
        assert_eq!(vars[1].value.as_deref(), Some(""));
        assert_eq!(vars[2].value.as_deref(), Some("a=b"));
    }

    #[test]
    fn test_parse_env_vars_rejects_malformed() {
        assert!(matches!(
            parse_env_vars(&["NOVALUE".to_string()]),
            Err(YaksError::InvalidEnvVar(v)) if v == "NOVALUE"
        ));
        assert!(parse_env_vars(&["=value".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_installed_when_csv_present() {
        let mock = MockService::new().on_get(CSVS, 200, &csv_list(&["yaks-operator.v0.4.0"]));
        let client = mock.clone().into_client();

        let installed = is_operator_installed(&client, "testing", false, &OlmOptions::default())
            .await
            .unwrap();

        assert!(installed);
        assert_eq!(mock.requests(), vec![format!("GET {}", CSVS)]);
    }

    #[tokio::test]
    async fn test_installed_when_global_subscription_present() {
        let client = MockService::new()
            .on_get(CSVS, 200, &csv_list(&["other-operator.v1.0.0"]))
            .on_get(
                GLOBAL_SUBSCRIPTIONS,
                200,
                &subscription_list(vec![subscription_json("yaks", "openshift-operators")]),
            )
            .into_client();

        assert!(is_operator_installed(&client, "testing", true, &OlmOptions::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_not_installed() {
        let client = MockService::new()
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(
                SUBSCRIPTIONS,
                200,
                &subscription_list(vec![subscription_json("camel-k", "testing")]),
            )
            .into_client();

        assert!(!is_operator_installed(&client, "testing", false, &OlmOptions::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_install_creates_subscription_and_group() {
        let mock = MockService::new()
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(SUBSCRIPTIONS, 200, &subscription_list(vec![]))
            .on_post(SUBSCRIPTIONS, 201, &subscription_json("yaks", "testing").to_string())
            .on_get(GROUPS, 200, &group_list(vec![]))
            .on_post(GROUPS, 201, &group_json().to_string());
        let client = mock.clone().into_client();

        let created = install(
            &client,
            "testing",
            false,
            &OlmOptions::default(),
            &["LOG_LEVEL=debug".to_string()],
            None,
        )
        .await
        .unwrap();

        assert!(created);
        assert!(mock.requests().contains(&format!("POST {}", SUBSCRIPTIONS)));
        assert_eq!(mock.requests().last().unwrap(), &format!("POST {}", GROUPS));

        let group: serde_json::Value = serde_json::from_str(&mock.last_body("POST").unwrap()).unwrap();
        assert_eq!(group["metadata"]["generateName"], "testing-");
        assert_eq!(group["spec"]["targetNamespaces"], json!(["testing"]));
    }

    #[tokio::test]
    async fn test_install_subscription_body() {
        let mock = MockService::new()
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(GLOBAL_SUBSCRIPTIONS, 200, &subscription_list(vec![]))
            .on_post(
                GLOBAL_SUBSCRIPTIONS,
                201,
                &subscription_json("yaks", "openshift-operators").to_string(),
            );
        let client = mock.clone().into_client();

        let created = install(
            &client,
            "testing",
            true,
            &OlmOptions::default(),
            &["LOG_LEVEL=debug".to_string()],
            None,
        )
        .await
        .unwrap();

        assert!(created);
        let subscription: serde_json::Value =
            serde_json::from_str(&mock.last_body("POST").unwrap()).unwrap();
        assert_eq!(subscription["metadata"]["namespace"], "openshift-operators");
        assert_eq!(subscription["spec"]["name"], "yaks");
        assert_eq!(subscription["spec"]["installPlanApproval"], "Automatic");
        assert_eq!(subscription["spec"]["config"]["env"][0]["name"], "LOG_LEVEL");
        assert!(subscription["spec"].get("startingCSV").is_none());
        assert!(!mock.requests().iter().any(|r| r.contains("operatorgroups")));
    }

    #[tokio::test]
    async fn test_install_skips_when_installed() {
        let mock = MockService::new().on_get(CSVS, 200, &csv_list(&["yaks-operator.v0.4.0"]));
        let client = mock.clone().into_client();

        let created = install(&client, "testing", false, &OlmOptions::default(), &[], None)
            .await
            .unwrap();

        assert!(!created);
        assert!(!mock.requests().iter().any(|r| r.starts_with("POST")));
    }

    #[tokio::test]
    async fn test_install_collects_resources() {
        let mock = MockService::new()
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(SUBSCRIPTIONS, 200, &subscription_list(vec![]))
            .on_get(GROUPS, 200, &group_list(vec![]));
        let client = mock.clone().into_client();
        let mut collection = Collection::new();

        install(&client, "testing", false, &OlmOptions::default(), &[], Some(&mut collection))
            .await
            .unwrap();

        let kinds: Vec<&str> = collection
            .items()
            .iter()
            .map(|o| o.types.as_ref().unwrap().kind.as_str())
            .collect();
        assert_eq!(kinds, vec!["Subscription", "OperatorGroup"]);
        assert!(!mock.requests().iter().any(|r| r.starts_with("POST")));
    }

    #[tokio::test]
    async fn test_install_reports_missing_group_permission() {
        let client = MockService::new()
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(SUBSCRIPTIONS, 200, &subscription_list(vec![]))
            .on_post(SUBSCRIPTIONS, 201, &subscription_json("yaks", "testing").to_string())
            .on_get(GROUPS, 200, &group_list(vec![]))
            .on_post(GROUPS, 403, &status_json(403, "Forbidden", "operatorgroups is forbidden"))
            .into_client();

        let err = install(&client, "testing", false, &OlmOptions::default(), &[], None)
            .await
            .unwrap_err();

        assert!(matches!(err, YaksError::Olm(msg) if msg.contains("has no operator group defined")));
    }

    #[tokio::test]
    async fn test_permission_denied_on_first_check() {
        let mock = MockService::new().on_post(REVIEWS, 201, &review_json(false));
        let client = mock.clone().into_client();

        let allowed = has_permission_to_install(&client, "testing", false, &OlmOptions::default())
            .await
            .unwrap();

        assert!(!allowed);
        assert_eq!(mock.requests(), vec![format!("POST {}", REVIEWS)]);
    }

    #[tokio::test]
    async fn test_permission_granted_with_existing_group() {
        let client = MockService::new()
            .on_post(REVIEWS, 201, &review_json(true))
            .on_get(CSVS, 200, &csv_list(&[]))
            .on_get(SUBSCRIPTIONS, 200, &subscription_list(vec![]))
            .on_get(GROUPS, 200, &group_list(vec![group_json()]))
            .into_client();

        assert!(has_permission_to_install(&client, "testing", false, &OlmOptions::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_uninstall_deletes_subscription_and_csv() {
        let mock = MockService::new()
            .on_get(
                SUBSCRIPTIONS,
                200,
                &subscription_list(vec![subscription_json("yaks", "testing")]),
            )
            .on_delete(
                &format!("{}/yaks", SUBSCRIPTIONS),
                200,
                &subscription_json("yaks", "testing").to_string(),
            )
            .on_get(CSVS, 200, &csv_list(&["yaks-operator.v0.4.0"]))
            .on_delete(
                &format!("{}/yaks-operator.v0.4.0", CSVS),
                200,
                &status_json(200, "", "deleted").replace("Failure", "Success"),
            );
        let client = mock.clone().into_client();

        uninstall(&client, "testing", false, &OlmOptions::default())
            .await
            .unwrap();

        let deletes: Vec<String> = mock
            .requests()
            .into_iter()
            .filter(|r| r.starts_with("DELETE"))
            .collect();
        assert_eq!(
            deletes,
            vec![
                format!("DELETE {}/yaks", SUBSCRIPTIONS),
                format!("DELETE {}/yaks-operator.v0.4.0", CSVS),
            ]
        );
    }
}
