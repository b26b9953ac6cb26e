//! 配置校验模块
//!
//! 先执行字段规则 (`validator` derive)，再执行跨字段规则：
//! - 通道名为绝对路径 (以 `/` 开头)
//! - input_channel != output_channel
//! - sink 名称唯一
//! - network sink 需要 `addr` 参数
//! - 频率、回放倍率为有限值
//! - replay 源需要 replay_path

use std::collections::HashSet;

use ::validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};
use contracts::{ContractError, ProxyBlueprint, SinkType, SourceKind};

/// 校验 ProxyBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_channels(blueprint)?;
    validate_source(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// 字段规则
fn validate_fields(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let (field, message) = first_field_error(&errors, "")
            .unwrap_or_else(|| ("<root>".to_string(), errors.to_string()));
        ContractError::config_validation(field, message)
    })
}

/// Depth-first, keys sorted, so the reported error is stable
fn first_field_error(errors: &ValidationErrors, prefix: &str) -> Option<(String, String)> {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(errs) => {
                errs.first().map(|err| (path.clone(), describe(err)))
            }
            ValidationErrorsKind::Struct(inner) => first_field_error(inner, &path),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(idx, inner)| first_field_error(inner, &format!("{path}[{idx}]"))),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn describe(err: &ValidationError) -> String {
    match &err.message {
        Some(message) => message.to_string(),
        None => {
            let mut params: Vec<String> = err
                .params
                .iter()
                .filter(|(key, _)| **key != "value")
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            params.sort();
            format!("failed '{}' rule ({})", err.code, params.join(", "))
        }
    }
}

/// 校验通道名
fn validate_channels(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let component = &blueprint.component;

    for (field, channel) in [
        ("component.input_channel", &component.input_channel),
        ("component.output_channel", &component.output_channel),
    ] {
        if !channel.starts_with('/') {
            return Err(ContractError::config_validation(
                field,
                format!("channel name must start with '/', got '{channel}'"),
            ));
        }
    }

    if component.input_channel == component.output_channel {
        return Err(ContractError::config_validation(
            "component.output_channel",
            format!(
                "output_channel must differ from input_channel ('{}')",
                component.input_channel
            ),
        ));
    }

    Ok(())
}

/// 校验帧源
fn validate_source(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;
    if !source.frequency_hz.is_finite() {
        return Err(ContractError::config_validation(
            "source.frequency_hz",
            format!("frequency_hz must be finite, got {}", source.frequency_hz),
        ));
    }
    if !source.speed_multiplier.is_finite() {
        return Err(ContractError::config_validation(
            "source.speed_multiplier",
            format!("speed_multiplier must be finite, got {}", source.speed_multiplier),
        ));
    }
    if source.kind == SourceKind::Replay && source.replay_path.is_none() {
        return Err(ContractError::config_validation(
            "source.replay_path",
            "replay source requires replay_path",
        ));
    }
    Ok(())
}

/// 校验 sink 配置
fn validate_sinks(blueprint: &ProxyBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.sink_type == SinkType::Network && !sink.params.contains_key("addr") {
            return Err(ContractError::config_validation(
                format!("sinks[{}].params.addr", idx),
                "network sink requires 'addr'",
            ));
        }
    }
    Ok(())
}
