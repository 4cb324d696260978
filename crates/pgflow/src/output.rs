//! 計画・結果の表示

use colored::{ColoredString, Colorize};
use pgflow_cloud::{Action, ActionType, ApplyResult, Plan, REDACTED};
use pgflow_provider::PrismaProvider;
use serde_json::Value;

fn colored_symbol(action_type: ActionType) -> ColoredString {
    let symbol = action_type.symbol();
    match action_type {
        ActionType::Create => symbol.green().bold(),
        ActionType::Update => symbol.yellow().bold(),
        ActionType::Replace => symbol.magenta().bold(),
        ActionType::Delete => symbol.red().bold(),
        ActionType::NoOp => symbol.normal(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        Value::Null => "(未設定)".to_string(),
        other => other.to_string(),
    }
}

fn is_sensitive(provider: &PrismaProvider, action: &Action, attribute: &str) -> bool {
    provider
        .schema(&action.resource_type)
        .ok()
        .and_then(|schema| schema.get(attribute).map(|a| a.sensitive))
        .unwrap_or(false)
}

/// 実行計画を表示
pub fn print_plan(provider: &PrismaProvider, plan: &Plan) {
    if !plan.has_changes {
        println!("{}", "✓ 変更はありません".green().bold());
        return;
    }

    println!("{}", "実行計画:".bold());
    for action in plan.actions.iter().filter(|a| a.action_type != ActionType::NoOp) {
        println!(
            "  {} {}.{}  {}",
            colored_symbol(action.action_type),
            action.resource_type,
            action.name.cyan(),
            action.description.dimmed()
        );
        for change in &action.changes {
            let (old, new) = if is_sensitive(provider, action, &change.name) {
                (REDACTED.to_string(), REDACTED.to_string())
            } else {
                (
                    change
                        .old
                        .as_ref()
                        .map(display_value)
                        .unwrap_or_else(|| "(未設定)".to_string()),
                    display_value(&change.new),
                )
            };
            let marker = if change.requires_replace {
                " (再作成が必要)".red().to_string()
            } else {
                String::new()
            };
            println!("      {}: {} → {}{}", change.name, old, new, marker);
        }
    }
    println!();
    println!("計画: {}", plan.summary());
}

/// 適用結果を表示
pub fn print_apply_result(result: &ApplyResult) {
    for success in &result.succeeded {
        println!("  {} {} {}", "✓".green(), success.action_id, success.message.dimmed());
    }
    for failure in &result.failed {
        println!(
            "  {} {} {}",
            "✗".red(),
            failure.action_id,
            failure.error.as_deref().unwrap_or("").red()
        );
    }
    println!();
    println!(
        "完了: 成功 {}件, 失敗 {}件 ({}ms)",
        result.succeeded.len(),
        result.failed.len(),
        result.duration_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("us-east-1")), "\"us-east-1\"");
        assert_eq!(display_value(&json!(true)), "true");
        assert_eq!(display_value(&Value::Null), "(未設定)");
    }
}
