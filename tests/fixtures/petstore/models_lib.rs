use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

mod order;

pub use order::{Line, Order, Status};

/// A pet in the store
#[derive(Serialize)]
pub struct Pet {
    #[serde(flatten)]
    pub record: common::Record,
    #[validate(required, range(min = 1))]
    pub id: i64,
    #[validate(required, length(min = 1, max = 64))]
    pub name: String,
    pub kind: Kind,
    pub color: Option<Color>,
    pub tags: Vec<Box<Tag>>,
    pub attributes: HashMap<String, String>,
    /// @deprecated use tags instead
    pub category: Option<String>,
    #[serde(skip)]
    pub cache: Vec<u8>,
    pub born: DateTime<Utc>,
    owner_token: String,
}

/// Kind of animal
#[derive(Serialize)]
pub enum Kind {
    Cat,
    Dog,
    #[serde(rename = "bird")]
    Parrot,
}

#[derive(Serialize)]
pub struct Color(pub &'static str);

pub const BLACK: Color = Color("black");
pub const WHITE: Color = Color("white");

#[derive(Serialize)]
pub struct Tag {
    pub label: String,
    pub weight: u8,
}

/// Error body returned by every failing call
#[derive(Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}
