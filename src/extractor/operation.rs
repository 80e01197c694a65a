use super::{ApiInfo, CommentBlock, OperationInfo, ParameterInfo, ParameterLocation, ResponseInfo};
use crate::classifier::member_for;
use crate::definition::MemberInfo;
use log::{debug, warn};
use regex::Regex;
use std::sync::LazyLock;

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@Title\s+(.+)").expect("title regex must compile"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@Description\s+(.+)").expect("description regex must compile")
});
static ACCEPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@Accept\s+([\w/]+)").expect("accept regex must compile"));
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@Param\s+([\w-]+)\s+(\w+)\s+([\w\.:<>]+)\s+(\w+)\s+"(.+)""#)
        .expect("param regex must compile")
});
static RESPONSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(Success|Failure)\s+(\d+)\s+([{}\w]+)\s+([\w\.:<>]+)\s+"(.+)""#)
        .expect("response regex must compile")
});
static ROUTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@Router\s+([/\w{}-]+)\s+\[(\w+)\]").expect("router regex must compile")
});

/// Parses one operation block declared in `block.unit`.
///
/// Returns `None` when the block has no well-formed `@Router` line.
pub fn parse_operation(block: &CommentBlock) -> Option<OperationInfo> {
    let mut title = String::new();
    let mut description = String::new();
    let mut accepts = Vec::new();
    let mut parameters = Vec::new();
    let mut responses = Vec::new();
    let mut route = None;

    for line in block.text.lines() {
        if let Some(caps) = ACCEPT.captures(line) {
            accepts.push(content_type(&caps[1]));
        } else if let Some(caps) = DESCRIPTION.captures(line) {
            description = caps[1].trim().to_string();
        } else if let Some(caps) = PARAM.captures(line) {
            let Some(location) = ParameterLocation::parse(&caps[2]) else {
                warn!("Skipping parameter '{}' with unknown location '{}'", &caps[1], &caps[2]);
                continue;
            };
            let info = MemberInfo {
                name: caps[1].to_string(),
                origin: block.unit.clone(),
                ..MemberInfo::default()
            };
            parameters.push(ParameterInfo {
                name: caps[1].to_string(),
                location,
                required: caps[4].eq_ignore_ascii_case("true"),
                description: caps[5].to_string(),
                member: member_for(&normalize_type(&caps[3]), info),
            });
        } else if let Some(caps) = RESPONSE.captures(line) {
            let Ok(code) = caps[2].parse::<u16>() else {
                warn!("Skipping response with status code '{}'", &caps[2]);
                continue;
            };
            let mut type_text = normalize_type(&caps[4]);
            if &caps[3] == "{array}" {
                type_text = format!("[]{}", type_text);
            }
            let info = MemberInfo {
                name: format!("response {}", code),
                origin: block.unit.clone(),
                ..MemberInfo::default()
            };
            responses.push(ResponseInfo {
                success: caps[1].eq_ignore_ascii_case("success"),
                code,
                description: caps[5].to_string(),
                member: member_for(&type_text, info),
            });
        } else if let Some(caps) = ROUTER.captures(line) {
            route = Some((caps[1].to_string(), caps[2].to_string()));
        } else if let Some(caps) = TITLE.captures(line) {
            title = caps[1].trim().to_string();
        }
    }

    let Some((path, method)) = route else {
        warn!("Operation block in '{}' has no usable @Router line", block.unit);
        return None;
    };
    debug!("Operation {} {} in '{}'", method, path, block.unit);

    Some(OperationInfo {
        title,
        description,
        accepts,
        parameters,
        responses,
        path,
        method,
        unit: block.unit.clone(),
        tag: None,
    })
}

/// Tags each operation with the first sub-API whose path prefixes its own.
pub fn tag_operations(api: &ApiInfo, operations: &mut [OperationInfo]) {
    for operation in operations.iter_mut() {
        operation.tag = api
            .sub_apis
            .iter()
            .find(|sub| operation.path.starts_with(&sub.path))
            .map(|sub| sub.name.clone());
    }
}

/// Expands an `@Accept` shorthand into a MIME type.
pub fn content_type(value: &str) -> String {
    match value {
        "json" => "application/json",
        "xml" => "application/xml",
        "plain" => "text/plain",
        "html" => "text/html",
        "form" => "application/x-www-form-urlencoded",
        "multipart" => "multipart/form-data",
        other => {
            if !other.contains('/') {
                warn!("Unknown content type shorthand '{}'", other);
            }
            other
        }
    }
    .to_string()
}

/// Rewrites annotation type text into field type notation.
///
/// `::` separates like `.`, `Vec<T>` becomes `[]T`, and `Option<T>` or
/// `Box<T>` become `*T`. A `crate`, `self` or `super` path names a local
/// type and keeps only its last segment; any other path keeps its first
/// and last segments.
pub fn normalize_type(text: &str) -> String {
    let text = text.trim().replace("::", ".");

    if let Some(inner) = generic_argument(&text, "Vec") {
        return format!("[]{}", normalize_type(inner));
    }
    if let Some(inner) =
        generic_argument(&text, "Option").or_else(|| generic_argument(&text, "Box"))
    {
        return format!("*{}", normalize_type(inner));
    }

    let segments: Vec<&str> = text.split('.').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [] => String::new(),
        [name] => name.to_string(),
        [first, .., last] if matches!(*first, "crate" | "self" | "super") => last.to_string(),
        [first, .., last] => format!("{}.{}", first, last),
    }
}

fn generic_argument<'t>(text: &'t str, wrapper: &str) -> Option<&'t str> {
    text.strip_prefix(wrapper)?
        .strip_prefix('<')?
        .strip_suffix('>')
}
