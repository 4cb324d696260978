//! pgflow.kdl のパース

use crate::error::{ConfigError, Result};
use crate::model::{PRISMA_PROVIDER, PgflowConfig, ProviderSettings};
use kdl::{KdlDocument, KdlNode};
use pgflow_cloud::{ResourceConfig, ResourceRef};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// 親リソースの指定方法 (参照ノード名, ID直接指定ノード名, 親の型, 属性名)
struct Parent {
    reference: &'static str,
    literal: &'static str,
    resource_type: &'static str,
    attribute: &'static str,
}

const DATABASE_PARENT: Parent = Parent {
    reference: "project",
    literal: "project-id",
    resource_type: "project",
    attribute: "project_id",
};

const CONNECTION_PARENT: Parent = Parent {
    reference: "database",
    literal: "database-id",
    resource_type: "database",
    attribute: "database_id",
};

/// ファイルから設定を読み込む
pub fn load_config(path: &Path) -> Result<PgflowConfig> {
    debug!(config_path = %path.display(), "Loading config");
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// KDL文字列をパース
pub fn parse_config(content: &str) -> Result<PgflowConfig> {
    let doc: KdlDocument = content.parse()?;
    let mut config = PgflowConfig::default();
    let mut seen_provider = false;

    for node in doc.nodes() {
        match node.name().value() {
            "provider" => {
                if seen_provider {
                    return Err(invalid("provider が複数回宣言されています"));
                }
                seen_provider = true;
                config.provider = parse_provider(node)?;
            }
            "project" => add(&mut config, parse_project(node)?)?,
            "database" => add(&mut config, parse_database(node)?)?,
            "connection" => add(&mut config, parse_connection(node)?)?,
            other => {
                return Err(invalid(format!("不明なノードです: `{}`", other)));
            }
        }
    }

    // 参照先がすべて宣言済みか確認
    for resource in config.resources.iter() {
        for reference in resource.references.values() {
            if !config
                .resources
                .contains(&reference.resource_type, &reference.name)
            {
                return Err(invalid(format!(
                    "{} \"{}\" が未宣言の {} \"{}\" を参照しています",
                    resource.resource_type,
                    resource.name,
                    reference.resource_type,
                    reference.name
                )));
            }
        }
    }

    debug!(resources = config.resources.len(), "Parsed config");
    Ok(config)
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidConfig(message.into())
}

fn add(config: &mut PgflowConfig, resource: ResourceConfig) -> Result<()> {
    let (resource_type, name) = (resource.resource_type.clone(), resource.name.clone());
    if config.resources.add(resource).is_some() {
        return Err(invalid(format!(
            "{} \"{}\" が複数回宣言されています",
            resource_type, name
        )));
    }
    Ok(())
}

/// ノードの最初の引数 (ラベル)
fn label<'a>(node: &'a KdlNode, kind: &str) -> Result<&'a str> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid(format!("{} には名前が必要です", kind)))
}

/// 子ノードの文字列値
fn string_value(node: &KdlNode, owner: &str) -> Result<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            invalid(format!(
                "{}: `{}` には文字列を指定してください",
                owner,
                node.name().value()
            ))
        })
}

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

/// provider ノードをパース
fn parse_provider(node: &KdlNode) -> Result<ProviderSettings> {
    let name = label(node, "provider")?;
    if name != PRISMA_PROVIDER {
        return Err(invalid(format!(
            "不明なプロバイダーです: `{}` (対応: {})",
            name, PRISMA_PROVIDER
        )));
    }

    let mut settings = ProviderSettings::default();
    for child in children(node) {
        match child.name().value() {
            "service-token" => settings.service_token = Some(string_value(child, "provider")?),
            "base-url" => settings.base_url = Some(string_value(child, "provider")?),
            other => {
                return Err(invalid(format!("provider: 不明な設定です: `{}`", other)));
            }
        }
    }
    Ok(settings)
}

/// project ノードをパース
fn parse_project(node: &KdlNode) -> Result<ResourceConfig> {
    let logical = label(node, "project")?;
    let owner = format!("project \"{}\"", logical);
    let mut resource = ResourceConfig::new("project", logical, PRISMA_PROVIDER);

    for child in children(node) {
        match child.name().value() {
            "name" => {
                resource = resource.with_attribute("name", Value::String(string_value(child, &owner)?));
            }
            other => return Err(invalid(format!("{}: 不明な設定です: `{}`", owner, other))),
        }
    }

    require_name(&resource, &owner)?;
    Ok(resource)
}

/// database ノードをパース
fn parse_database(node: &KdlNode) -> Result<ResourceConfig> {
    let logical = label(node, "database")?;
    let owner = format!("database \"{}\"", logical);
    let mut resource = ResourceConfig::new("database", logical, PRISMA_PROVIDER);

    for child in children(node) {
        match child.name().value() {
            "name" | "region" => {
                let key = child.name().value().to_string();
                resource = resource.with_attribute(key, Value::String(string_value(child, &owner)?));
            }
            _ => resource = parse_parent(resource, child, &DATABASE_PARENT, &owner)?,
        }
    }

    require_name(&resource, &owner)?;
    require_parent(&resource, &DATABASE_PARENT, &owner)?;
    Ok(resource)
}

/// connection ノードをパース
fn parse_connection(node: &KdlNode) -> Result<ResourceConfig> {
    let logical = label(node, "connection")?;
    let owner = format!("connection \"{}\"", logical);
    let mut resource = ResourceConfig::new("connection", logical, PRISMA_PROVIDER);

    for child in children(node) {
        match child.name().value() {
            "name" => {
                resource = resource.with_attribute("name", Value::String(string_value(child, &owner)?));
            }
            _ => resource = parse_parent(resource, child, &CONNECTION_PARENT, &owner)?,
        }
    }

    require_name(&resource, &owner)?;
    require_parent(&resource, &CONNECTION_PARENT, &owner)?;
    Ok(resource)
}

/// 親リソースの参照 (`project "app"`) または ID直接指定 (`project-id "proj_1"`)
fn parse_parent(
    resource: ResourceConfig,
    child: &KdlNode,
    parent: &Parent,
    owner: &str,
) -> Result<ResourceConfig> {
    let key = child.name().value();
    if key != parent.reference && key != parent.literal {
        return Err(invalid(format!("{}: 不明な設定です: `{}`", owner, key)));
    }
    if resource.config.contains_key(parent.attribute)
        || resource.references.contains_key(parent.attribute)
    {
        return Err(invalid(format!(
            "{}: `{}` と `{}` はどちらか一方だけを指定してください",
            owner, parent.reference, parent.literal
        )));
    }

    let value = string_value(child, owner)?;
    Ok(if key == parent.reference {
        resource.with_reference(
            parent.attribute,
            ResourceRef::new(parent.resource_type, value, "id"),
        )
    } else {
        resource.with_attribute(parent.attribute, Value::String(value))
    })
}

fn require_name(resource: &ResourceConfig, owner: &str) -> Result<()> {
    match resource.config.get("name").and_then(|v| v.as_str()) {
        Some(name) if !name.is_empty() => Ok(()),
        _ => Err(invalid(format!("{}: `name` は必須です", owner))),
    }
}

fn require_parent(resource: &ResourceConfig, parent: &Parent, owner: &str) -> Result<()> {
    if resource.config.contains_key(parent.attribute)
        || resource.references.contains_key(parent.attribute)
    {
        Ok(())
    } else {
        Err(invalid(format!(
            "{}: `{}` または `{}` が必要です",
            owner, parent.reference, parent.literal
        )))
    }
}
