//! Annotation extraction from doc-comment blocks.
//!
//! Two kinds of blocks carry annotations:
//!
//! - **API blocks** contain `@APITitle` and describe the document as a whole
//!   (see [`api::parse_api`]).
//! - **Operation blocks** contain `@Router` and describe one endpoint (see
//!   [`operation::parse_operation`]).
//!
//! ```text
//! /// @Title Get a pet
//! /// @Accept json
//! /// @Param id path i64 true "Pet id"
//! /// @Success 200 {object} models::Pet "The pet"
//! /// @Router /pets/{id} [get]
//! ```

pub mod api;
pub mod operation;

use crate::definition::Member;

const API_MARKER: &str = "@APITitle";
const OPERATION_MARKER: &str = "@Router";

/// A doc-comment block and the unit whose source declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Import path of the declaring unit
    pub unit: String,
    pub text: String,
}

/// Document-level metadata merged from every API block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiInfo {
    pub version: String,
    pub title: String,
    pub description: String,
    pub base_path: String,
    pub sub_apis: Vec<SubApi>,
}

/// A named group of operations sharing a path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubApi {
    pub name: String,
    pub path: String,
}

/// One annotated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationInfo {
    pub title: String,
    pub description: String,
    /// Accepted content types, already expanded to MIME types
    pub accepts: Vec<String>,
    pub parameters: Vec<ParameterInfo>,
    pub responses: Vec<ResponseInfo>,
    pub path: String,
    /// Method as written in the `@Router` line
    pub method: String,
    /// Import path of the unit that declared the operation
    pub unit: String,
    /// Name of the sub-API the operation belongs to
    pub tag: Option<String>,
}

/// HTTP methods an operation can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    /// Case-insensitive parse; `None` for anything outside the path-item slots.
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "patch" => Some(Self::Patch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: String,
    /// Type of the parameter, resolved like a struct field
    pub member: Member,
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    pub fn parse(location: &str) -> Option<Self> {
        match location {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "body" => Some(Self::Body),
            "formData" | "form" => Some(Self::FormData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
            Self::FormData => "formData",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseInfo {
    /// `@Success` rather than `@Failure`
    pub success: bool,
    pub code: u16,
    pub description: String,
    pub member: Member,
}

/// Blocks that describe the API as a whole.
pub fn api_blocks(blocks: &[CommentBlock]) -> Vec<&CommentBlock> {
    blocks_containing(blocks, API_MARKER)
}

/// Blocks that describe an operation.
pub fn operation_blocks(blocks: &[CommentBlock]) -> Vec<&CommentBlock> {
    blocks_containing(blocks, OPERATION_MARKER)
}

fn blocks_containing<'b>(blocks: &'b [CommentBlock], marker: &str) -> Vec<&'b CommentBlock> {
    blocks
        .iter()
        .filter(|block| block.text.contains(marker))
        .collect()
}
