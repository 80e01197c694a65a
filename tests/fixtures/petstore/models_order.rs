use super::Pet;
use serde::Serialize;
use std::collections::HashMap;

pub type Status = &'static str;

pub const PLACED: Status = "placed";
pub const DELIVERED: Status = "delivered";

#[derive(Serialize)]
pub struct Order {
    pub id: i64,
    pub pet: Pet,
    #[validate(range(exclusive_min = 0))]
    pub quantity: u32,
    pub status: Status,
    pub lines: HashMap<String, Vec<Line>>,
}

#[derive(Serialize)]
pub struct Line {
    pub sku: String,
    pub parent: Option<Box<Order>>,
}
