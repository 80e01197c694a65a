use super::{ApiInfo, CommentBlock, SubApi};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static API_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@APIVersion\s+([\d\.]+)").expect("version regex must compile"));
static API_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@APITitle\s+(.+)").expect("title regex must compile"));
static API_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@APIDescription\s+(.+)").expect("description regex must compile")
});
static BASE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@BasePath\s+([/a-zA-Z0-9-]+)").expect("base path regex must compile")
});
static SUB_API: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@SubApi\s+([0-9a-zA-Z]+)\s+\[([/a-zA-Z0-9-]+)\]")
        .expect("sub-api regex must compile")
});

/// Merges every API block into one [`ApiInfo`].
///
/// Blocks are read line by line in order; a later value replaces an earlier
/// one, sub-APIs accumulate.
pub fn parse_api(blocks: &[&CommentBlock]) -> ApiInfo {
    let mut api = ApiInfo::default();

    for block in blocks {
        for line in block.text.lines() {
            if let Some(caps) = API_DESCRIPTION.captures(line) {
                api.description = caps[1].trim().to_string();
            } else if let Some(caps) = API_TITLE.captures(line) {
                api.title = caps[1].trim().to_string();
            } else if let Some(caps) = API_VERSION.captures(line) {
                api.version = caps[1].to_string();
            } else if let Some(caps) = BASE_PATH.captures(line) {
                api.base_path = caps[1].to_string();
            } else if let Some(caps) = SUB_API.captures(line) {
                api.sub_apis.push(SubApi {
                    name: caps[1].to_string(),
                    path: caps[2].to_string(),
                });
            }
        }
    }

    debug!(
        "API '{}' version '{}' with {} sub-APIs",
        api.title,
        api.version,
        api.sub_apis.len()
    );
    api
}
