// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic dump of tests, operator instances and the workloads around them.
//!
//! Objects are printed as YAML documents, pods as a condition and log summary.

use crate::constants::labels;
use crate::error::{is_forbidden, Result};
use crate::kubernetes::to_yaml;
use crate::types::{Instance, Test};
use futures::AsyncBufReadExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, PodCondition};
use kube::{
    api::{ListParams, LogParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::io::Write;
use tracing::{debug, instrument};

const LOG_PAD: &str = "    ";

/// What to include in a dump
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    /// Restrict the dump to a single test
    pub test: Option<String>,
    /// Additional pod label selectors whose logs are included
    pub includes: Vec<String>,
    /// Number of log lines per container, 0 for all
    pub lines: i64,
}

/// Dump a single test and the resources labelled for it
#[instrument(skip(client, out, options))]
pub async fn dump_test(
    client: &Client,
    name: &str,
    namespace: &str,
    out: &mut dyn Write,
    options: &DumpOptions,
) -> Result<()> {
    let tests: Api<Test> = Api::namespaced(client.clone(), namespace);
    let test = tests.get(name).await?;
    writeln!(out, "Found test {}:", test.name_any())?;
    print_object(&test, out)?;

    let operator_namespace = test.operator_namespace().unwrap_or(namespace);
    dump_operator(client, operator_namespace, out, options.lines).await?;

    let selector = test.label_selector();
    debug!("Using selector {}", selector);
    let lp = ListParams::default().labels(&selector);

    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    print_list(&config_maps, &lp, "configmap(s)", out).await?;
    let jobs: Api<Job> = Api::namespaced(client.clone(), namespace);
    print_list(&jobs, &lp, "job(s)", out).await?;

    dump_pods(client, namespace, &selector, out, options.lines).await?;
    for include in &options.includes {
        dump_pods(client, namespace, include, out, options.lines).await?;
    }

    Ok(())
}

/// Dump the operator, all tests and the YAKS workloads of a namespace
#[instrument(skip(client, out, options))]
pub async fn dump_all(
    client: &Client,
    namespace: &str,
    out: &mut dyn Write,
    options: &DumpOptions,
) -> Result<()> {
    dump_operator(client, namespace, out, options.lines).await?;

    let tests: Api<Test> = Api::namespaced(client.clone(), namespace);
    print_list(&tests, &ListParams::default(), "test(s)", out).await?;

    let lp = ListParams::default().labels(labels::DEFAULT_APP_SELECTOR);
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), namespace);
    print_list(&config_maps, &lp, "configmap(s)", out).await?;
    let deployments: Api<Deployment> = Api::namespaced(client.clone(), namespace);
    print_list(&deployments, &lp, "deployment(s)", out).await?;
    let jobs: Api<Job> = Api::namespaced(client.clone(), namespace);
    print_list(&jobs, &lp, "job(s)", out).await?;

    dump_pods(client, namespace, labels::DEFAULT_APP_SELECTOR, out, options.lines).await?;
    for include in &options.includes {
        dump_pods(client, namespace, include, out, options.lines).await?;
    }

    Ok(())
}

async fn dump_operator(client: &Client, namespace: &str, out: &mut dyn Write, lines: i64) -> Result<()> {
    let operator_selector = format!("{}=operator", labels::COMPONENT);

    let instances: Api<Instance> = Api::namespaced(client.clone(), namespace);
    let list = instances.list(&ListParams::default()).await?;
    writeln!(out, "Found {} operator instance(s):", list.items.len())?;
    for instance in &list.items {
        print_object(instance, out)?;
        dump_pods(client, namespace, &operator_selector, out, lines).await?;
    }

    if list.items.is_empty() {
        if let Some(instance) = find_global_instance(client).await? {
            writeln!(out, "Found global operator instance:")?;
            print_object(&instance, out)?;
            let instance_namespace = instance.namespace().unwrap_or_default();
            dump_pods(client, &instance_namespace, &operator_selector, out, lines).await?;
        }
    }

    Ok(())
}

/// First operator instance across the cluster watching all namespaces.
/// A user without cluster-wide list rights simply sees none.
async fn find_global_instance(client: &Client) -> Result<Option<Instance>> {
    let instances: Api<Instance> = Api::all(client.clone());
    match instances.list(&ListParams::default()).await {
        Ok(list) => Ok(list.items.into_iter().find(Instance::is_global)),
        Err(e) if is_forbidden(&e) => {
            debug!("Not allowed to look up global operator instances: {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn dump_pods(
    client: &Client,
    namespace: &str,
    selector: &str,
    out: &mut dyn Write,
    lines: i64,
) -> Result<()> {
    let pods: Api<Pod> = Api::namespaced(client.clone(), namespace);
    let list = pods.list(&ListParams::default().labels(selector)).await?;

    write!(out, "\nFound {} pod(s):\n", list.items.len())?;
    for pod in &list.items {
        let name = pod.name_any();
        writeln!(out, "name={}", name)?;
        if let Some(conditions) = pod.status.as_ref().and_then(|s| s.conditions.as_ref()) {
            dump_conditions("  ", conditions, out)?;
        }
        writeln!(out, "  logs:")?;

        let spec = pod.spec.as_ref();
        let containers = spec
            .and_then(|s| s.init_containers.as_deref())
            .unwrap_or_default()
            .iter()
            .chain(spec.map(|s| s.containers.as_slice()).unwrap_or_default());
        for container in containers {
            writeln!(out, "{}{}", LOG_PAD, container.name)?;
            let prefix = format!("{}> ", LOG_PAD);
            if let Err(e) = dump_logs(&pods, &name, &container.name, &prefix, out, lines).await {
                writeln!(out, "{}ERROR while reading the logs: {}", LOG_PAD, e)?;
            }
        }
    }

    Ok(())
}

fn dump_conditions(prefix: &str, conditions: &[PodCondition], out: &mut dyn Write) -> Result<()> {
    for cond in conditions {
        writeln!(
            out,
            "{}condition type={}, status={}, reason={}, message={:?}",
            prefix,
            cond.type_,
            cond.status,
            cond.reason.as_deref().unwrap_or_default(),
            cond.message.as_deref().unwrap_or_default()
        )?;
    }
    Ok(())
}

async fn dump_logs(
    pods: &Api<Pod>,
    pod: &str,
    container: &str,
    prefix: &str,
    out: &mut dyn Write,
    lines: i64,
) -> Result<()> {
    let lp = LogParams {
        container: Some(container.to_string()),
        tail_lines: (lines > 0).then_some(lines),
        ..Default::default()
    };

    // Lines are decoded one by one so invalid UTF-8 only garbles its own line
    let mut reader = std::pin::pin!(pods.log_stream(pod, &lp).await?);
    let mut buf = Vec::new();
    let mut printed = false;
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        writeln!(out, "{}{}", prefix, String::from_utf8_lossy(line))?;
        printed = true;
        buf.clear();
    }
    if !printed {
        writeln!(out, "{}[no logs available]", prefix)?;
    }
    Ok(())
}

async fn print_list<K>(api: &Api<K>, lp: &ListParams, what: &str, out: &mut dyn Write) -> Result<()>
where
    K: Resource + Clone + DeserializeOwned + Serialize + Debug,
{
    let list = api.list(lp).await?;
    writeln!(out, "Found {} {}:", list.items.len(), what)?;
    for item in &list.items {
        print_object(item, out)?;
    }
    Ok(())
}

/// Write an object as a YAML document framed by separators
pub fn print_object<T: Serialize>(obj: &T, out: &mut dyn Write) -> Result<()> {
    let yaml = to_yaml(obj)?;
    write!(out, "---\n{}\n---\n", yaml)?;
    Ok(())
}
